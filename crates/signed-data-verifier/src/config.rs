//! Verifier configuration and trusted root certificates.
//!
//! Roots are parsed once when loaded; the resulting [`VerifierConfig`] is
//! handed to the verifier and never changes afterwards.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};
use x509_parser::pem::Pem;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::environment::Environment;
use crate::error::{VerificationError, VerifyResult};

/// Path list (platform path separator) of PEM or DER root certificate files.
pub const ENV_ROOT_CERTS: &str = "SIGNED_DATA_ROOT_CERTS";
/// Configured environment (`Sandbox`, `Production`, `Xcode`, `LocalTesting`).
pub const ENV_ENVIRONMENT: &str = "SIGNED_DATA_ENVIRONMENT";
/// Configured bundle identifier.
pub const ENV_BUNDLE_ID: &str = "SIGNED_DATA_BUNDLE_ID";
/// Configured app apple id (required for Production).
pub const ENV_APP_APPLE_ID: &str = "SIGNED_DATA_APP_APPLE_ID";

/// A trusted root certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct RootCertificate {
    der: Vec<u8>,
    fingerprint: String,
    subject: String,
}

impl RootCertificate {
    /// Load a root from DER bytes.
    pub fn from_der(der: impl Into<Vec<u8>>) -> VerifyResult<Self> {
        let der = der.into();
        let subject = {
            let (_, cert) = X509Certificate::from_der(&der).map_err(|e| {
                VerificationError::config(format!("invalid root certificate: {}", e))
            })?;
            cert.subject().to_string()
        };
        let fingerprint = sha256_fingerprint(&der);

        Ok(Self {
            der,
            fingerprint,
            subject,
        })
    }

    /// Load the first certificate of a PEM document.
    pub fn from_pem(pem: &[u8]) -> VerifyResult<Self> {
        let mut roots = Self::load_pem_bundle(pem)?;
        Ok(roots.remove(0))
    }

    /// Load a single root from PEM or DER bytes.
    pub fn load(bytes: &[u8]) -> VerifyResult<Self> {
        if looks_like_pem(bytes) {
            Self::from_pem(bytes)
        } else {
            Self::from_der(bytes)
        }
    }

    /// Load every root found in PEM or DER bytes.
    ///
    /// DER input always holds exactly one certificate.
    pub fn load_all(bytes: &[u8]) -> VerifyResult<Vec<Self>> {
        if looks_like_pem(bytes) {
            Self::load_pem_bundle(bytes)
        } else {
            Ok(vec![Self::from_der(bytes)?])
        }
    }

    /// Load every root stored in a file.
    pub fn load_file(path: &Path) -> VerifyResult<Vec<Self>> {
        let bytes = std::fs::read(path).map_err(|e| {
            VerificationError::config(format!(
                "failed to read root certificate {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::load_all(&bytes)
    }

    fn load_pem_bundle(pem: &[u8]) -> VerifyResult<Vec<Self>> {
        let mut roots = Vec::new();
        for block in Pem::iter_from_buffer(pem) {
            let block = block
                .map_err(|e| VerificationError::config(format!("invalid PEM data: {}", e)))?;
            if block.label == "CERTIFICATE" || block.label == "TRUSTED CERTIFICATE" {
                roots.push(Self::from_der(block.contents)?);
            }
        }

        if roots.is_empty() {
            return Err(VerificationError::config(
                "no certificates found in PEM input",
            ));
        }
        Ok(roots)
    }

    /// DER encoding of the certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 fingerprint of the DER encoding (`sha256:<hex>`).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Subject distinguished name, for display.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub(crate) fn parse(&self) -> Result<X509Certificate<'_>, String> {
        X509Certificate::from_der(&self.der)
            .map(|(_, cert)| cert)
            .map_err(|e| e.to_string())
    }
}

impl fmt::Debug for RootCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootCertificate")
            .field("subject", &self.subject)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

fn looks_like_pem(bytes: &[u8]) -> bool {
    bytes.trim_ascii_start().starts_with(b"-----BEGIN")
}

pub(crate) fn sha256_fingerprint(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

/// Immutable verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    root_certificates: Vec<RootCertificate>,
    bundle_id: String,
    environment: Environment,
    app_apple_id: Option<String>,
}

impl VerifierConfig {
    /// Create a configuration.
    ///
    /// Fails when `environment` is Production and no (non-empty) app apple id
    /// is given: Production identity checks compare it.
    pub fn new(
        root_certificates: Vec<RootCertificate>,
        environment: Environment,
        bundle_id: impl Into<String>,
        app_apple_id: Option<String>,
    ) -> VerifyResult<Self> {
        let config = Self {
            root_certificates,
            bundle_id: bundle_id.into(),
            environment,
            app_apple_id: app_apple_id.filter(|id| !id.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SIGNED_DATA_ROOT_CERTS` | Root certificate files (PEM or DER), path-list separated |
    /// | `SIGNED_DATA_ENVIRONMENT` | `Sandbox`, `Production`, `Xcode` or `LocalTesting` |
    /// | `SIGNED_DATA_BUNDLE_ID` | Bundle identifier |
    /// | `SIGNED_DATA_APP_APPLE_ID` | App apple id (required for Production) |
    pub fn from_env() -> VerifyResult<Self> {
        let environment: Environment = required_var(ENV_ENVIRONMENT)?.parse()?;
        let bundle_id = required_var(ENV_BUNDLE_ID)?;
        let app_apple_id = std::env::var(ENV_APP_APPLE_ID).ok();

        let paths = std::env::var_os(ENV_ROOT_CERTS).ok_or_else(|| {
            VerificationError::config(format!("{} is not set", ENV_ROOT_CERTS))
        })?;
        let mut root_certificates = Vec::new();
        for path in std::env::split_paths(&paths) {
            if path.as_os_str().is_empty() {
                continue;
            }
            root_certificates.extend(RootCertificate::load_file(&path)?);
        }
        if root_certificates.is_empty() {
            return Err(VerificationError::config(format!(
                "{} does not name any root certificate",
                ENV_ROOT_CERTS
            )));
        }

        Self::new(root_certificates, environment, bundle_id, app_apple_id)
    }

    /// Check the Production app apple id invariant.
    pub fn validate(&self) -> VerifyResult<()> {
        if self.environment.is_production() && self.app_apple_id.is_none() {
            return Err(VerificationError::config(
                "app_apple_id is required when the environment is Production",
            ));
        }
        Ok(())
    }

    /// Append a trusted root. Roots are searched in insertion order.
    pub fn with_root_certificate(mut self, root: RootCertificate) -> Self {
        self.root_certificates.push(root);
        self
    }

    /// Set the app apple id.
    pub fn with_app_apple_id(mut self, app_apple_id: impl Into<String>) -> Self {
        let app_apple_id = app_apple_id.into();
        if !app_apple_id.is_empty() {
            self.app_apple_id = Some(app_apple_id);
        }
        self
    }

    pub fn root_certificates(&self) -> &[RootCertificate] {
        &self.root_certificates
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn app_apple_id(&self) -> Option<&str> {
        self.app_apple_id.as_deref()
    }
}

fn required_var(name: &str) -> VerifyResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(VerificationError::config(format!("{} is not set", name))),
    }
}
