//! Verification of platform-signed JWS payloads.
//!
//! Signed transactions, subscription renewal info, server notifications and
//! app transactions arrive as compact JWS tokens carrying their certificate
//! chain in the `x5c` header. This crate provides:
//!
//! - Certificate chain validation against pinned root certificates
//! - ES256 signature verification with the chain's leaf key
//! - Bundle id, app apple id and environment checks per payload kind
//!
//! # Quick Start
//!
//! ```no_run
//! use signed_data_verifier::SignedDataVerifier;
//!
//! # fn example(signed_payload: &str) -> Result<(), signed_data_verifier::VerificationError> {
//! // Create verifier from environment
//! let verifier = SignedDataVerifier::from_env()?;
//!
//! match verifier.verify_and_decode_notification(signed_payload) {
//!     Ok(notification) => println!("type: {}", notification["notificationType"]),
//!     Err(e) => eprintln!("rejected ({}): {}", e.status(), e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SIGNED_DATA_ROOT_CERTS` | Root certificate files (PEM or DER), path-list separated |
//! | `SIGNED_DATA_ENVIRONMENT` | `Sandbox`, `Production`, `Xcode` or `LocalTesting` |
//! | `SIGNED_DATA_BUNDLE_ID` | Expected bundle identifier |
//! | `SIGNED_DATA_APP_APPLE_ID` | Expected app apple id (required for Production) |
//!
//! # Effective date
//!
//! Certificates are checked at the instant named by the payload itself
//! (`signedDate`, or `receiptCreationDate` for app transactions), read before
//! the signature is verified. Payloads without the claim are checked at the
//! current time.

pub mod chain;
pub mod claims;
pub mod config;
pub mod environment;
pub mod error;
pub mod jws;
pub mod verifier;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use chain::{
    verify_certificate_chain, CertificateChain, LeafPublicKey, BASIC_CONSTRAINTS_OID,
    CHAIN_LENGTH, INTERMEDIATE_MARKER_OID, LEAF_MARKER_OID, MAX_CLOCK_SKEW_MS,
};
pub use claims::{DecodedClaims, IdentitySource, NotificationIdentity};
pub use config::{RootCertificate, VerifierConfig};
pub use environment::Environment;
pub use error::{FailureKind, VerificationError, VerificationStatus, VerifyResult};
pub use verifier::{EffectiveDate, SignedDataVerifier};
