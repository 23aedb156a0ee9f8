use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use signed_data_verifier::config::ENV_ROOT_CERTS;
use signed_data_verifier::{
    DecodedClaims, RootCertificate, SignedDataVerifier, VerifierConfig, VerifyResult,
};

use crate::cli::args::{VerifierArgs, VerifyArgs};
use crate::exit_codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadKind {
    Transaction,
    RenewalInfo,
    Notification,
    AppTransaction,
}

impl PayloadKind {
    fn verify(self, verifier: &SignedDataVerifier, token: &str) -> VerifyResult<DecodedClaims> {
        match self {
            Self::Transaction => verifier.verify_and_decode_transaction(token),
            Self::RenewalInfo => verifier.verify_and_decode_renewal_info(token),
            Self::Notification => verifier.verify_and_decode_notification(token),
            Self::AppTransaction => verifier.verify_and_decode_app_transaction(token),
        }
    }
}

pub(crate) fn run(kind: PayloadKind, args: &VerifyArgs) -> anyhow::Result<i32> {
    let verifier = build_verifier(&args.verifier)?;
    let token = read_payload(args.payload.as_deref())?;

    match kind.verify(&verifier, &token) {
        Ok(claims) => {
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("error [{}]: {}", e.status(), e);
            Ok(e.exit_code())
        }
    }
}

fn build_verifier(args: &VerifierArgs) -> anyhow::Result<SignedDataVerifier> {
    let paths = root_cert_paths(args);
    if paths.is_empty() {
        bail!(
            "no root certificates: pass --root-cert or set {}",
            ENV_ROOT_CERTS
        );
    }

    let mut roots = Vec::new();
    for path in &paths {
        let loaded = RootCertificate::load_file(path)
            .with_context(|| format!("failed to load root certificate {}", path.display()))?;
        for root in &loaded {
            tracing::debug!(
                fingerprint = %root.fingerprint(),
                subject = %root.subject(),
                "loaded root"
            );
        }
        roots.extend(loaded);
    }

    let config = VerifierConfig::new(
        roots,
        args.environment,
        args.bundle_id.clone(),
        args.app_apple_id.clone(),
    )?;
    Ok(SignedDataVerifier::from_config(config)?)
}

/// `--root-cert` values, else the path list in the environment.
fn root_cert_paths(args: &VerifierArgs) -> Vec<PathBuf> {
    if !args.root_certs.is_empty() {
        return args.root_certs.clone();
    }
    std::env::var_os(ENV_ROOT_CERTS)
        .map(|paths| {
            std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn read_payload(arg: Option<&str>) -> anyhow::Result<String> {
    let raw = match arg {
        Some(payload) if payload != "-" => payload.to_string(),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read payload from stdin")?;
            buf
        }
    };

    let token = raw.trim();
    if token.is_empty() {
        bail!("empty payload");
    }
    Ok(token.to_string())
}
