//! Error types for signed payload verification.

/// Verification errors.
///
/// A verify call fails with exactly one of the first four variants. `Config`
/// is only produced while building a verifier or its configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// The JWS is malformed, its signature does not verify, or the
    /// certificate chain does not lead to a trusted root.
    #[error("verification failure: {reason}")]
    VerificationFailure { reason: String, kind: FailureKind },

    /// A certificate in the chain is outside its validity window.
    #[error("invalid certificate: {reason}")]
    InvalidCertificate { reason: String },

    /// The bundle id (or, in Production, the app apple id) does not match.
    #[error("invalid app identifier")]
    InvalidAppIdentifier,

    /// The claimed environment does not match the configured environment.
    #[error("invalid environment")]
    InvalidEnvironment,

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// What a `VerificationFailure` was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Malformed JWS, bad signature or untrusted chain.
    Untrusted,
    /// The `x5c` header does not hold exactly three certificates.
    ChainLength,
}

/// Coarse verification status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Ok,
    VerificationFailure,
    InvalidAppIdentifier,
    InvalidEnvironment,
    InvalidChainLength,
    InvalidCertificate,
    Failure,
}

impl VerificationStatus {
    /// Stable snake_case name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::VerificationFailure => "verification_failure",
            Self::InvalidAppIdentifier => "invalid_app_identifier",
            Self::InvalidEnvironment => "invalid_environment",
            Self::InvalidChainLength => "invalid_chain_length",
            Self::InvalidCertificate => "invalid_certificate",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VerificationError {
    pub(crate) fn failure(reason: impl Into<String>) -> Self {
        Self::VerificationFailure {
            reason: reason.into(),
            kind: FailureKind::Untrusted,
        }
    }

    pub(crate) fn invalid_chain_length(reason: impl Into<String>) -> Self {
        Self::VerificationFailure {
            reason: reason.into(),
            kind: FailureKind::ChainLength,
        }
    }

    pub(crate) fn invalid_certificate(reason: impl Into<String>) -> Self {
        Self::InvalidCertificate {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Status code for this error.
    ///
    /// Chain length violations are `VerificationFailure`s of
    /// [`FailureKind::ChainLength`] and report `InvalidChainLength` here.
    pub fn status(&self) -> VerificationStatus {
        match self {
            Self::VerificationFailure {
                kind: FailureKind::ChainLength,
                ..
            } => VerificationStatus::InvalidChainLength,
            Self::VerificationFailure {
                kind: FailureKind::Untrusted,
                ..
            } => VerificationStatus::VerificationFailure,
            Self::InvalidCertificate { .. } => VerificationStatus::InvalidCertificate,
            Self::InvalidAppIdentifier => VerificationStatus::InvalidAppIdentifier,
            Self::InvalidEnvironment => VerificationStatus::InvalidEnvironment,
            Self::Config { .. } => VerificationStatus::Failure,
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Untrusted payload
            Self::VerificationFailure { .. } => 3,
            Self::InvalidCertificate { .. } => 4,

            // Trusted payload, wrong app or environment
            Self::InvalidAppIdentifier => 5,
            Self::InvalidEnvironment => 6,

            Self::Config { .. } => 2,
        }
    }

    /// Whether the payload itself was proven authentic before the error.
    ///
    /// Identity and environment mismatches happen after the signature and
    /// chain checks succeeded.
    pub fn is_authentic_payload(&self) -> bool {
        matches!(self, Self::InvalidAppIdentifier | Self::InvalidEnvironment)
    }
}

/// Result type for verification operations.
pub type VerifyResult<T> = Result<T, VerificationError>;
