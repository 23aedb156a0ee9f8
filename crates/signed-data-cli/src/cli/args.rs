use clap::{Args, Parser, Subcommand};
use signed_data_verifier::Environment;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "signed-data",
    version,
    about = "Verify platform-signed JWS payloads against pinned root certificates"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify a signed transaction
    Transaction(VerifyArgs),
    /// Verify signed subscription renewal info
    RenewalInfo(VerifyArgs),
    /// Verify a signed server notification
    Notification(VerifyArgs),
    /// Verify a signed app transaction
    AppTransaction(VerifyArgs),
}

impl Command {
    pub fn args(&self) -> &VerifyArgs {
        match self {
            Self::Transaction(args)
            | Self::RenewalInfo(args)
            | Self::Notification(args)
            | Self::AppTransaction(args) => args,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub verifier: VerifierArgs,

    /// Compact JWS to verify; read from stdin when absent or `-`
    pub payload: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct VerifierArgs {
    /// Trusted root certificate (PEM or DER). Repeatable; searched in order.
    /// Falls back to the path list in SIGNED_DATA_ROOT_CERTS.
    #[arg(long = "root-cert", value_name = "PATH")]
    pub root_certs: Vec<PathBuf>,

    /// Expected environment
    #[arg(long, env = "SIGNED_DATA_ENVIRONMENT")]
    pub environment: Environment,

    /// Expected bundle identifier
    #[arg(long, env = "SIGNED_DATA_BUNDLE_ID")]
    pub bundle_id: String,

    /// Expected app apple id (required for Production)
    #[arg(long, env = "SIGNED_DATA_APP_APPLE_ID")]
    pub app_apple_id: Option<String>,
}
