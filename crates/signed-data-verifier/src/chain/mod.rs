//! Certificate chain validation for signed payloads.
//!
//! Checks the two-hop chain leaf → intermediate → configured root:
//! signature linkage, issuer/subject linkage, the intermediate's CA flag,
//! the platform marker extensions and the validity windows. This is not a
//! general RFC 5280 path validator: there are no policy, name constraint or
//! revocation checks.

mod predicates;
mod validity;


use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use tracing::debug;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::config::{sha256_fingerprint, RootCertificate};
use crate::error::{VerificationError, VerifyResult};

pub use predicates::{BASIC_CONSTRAINTS_OID, INTERMEDIATE_MARKER_OID, LEAF_MARKER_OID};
pub use validity::MAX_CLOCK_SKEW_MS;

use predicates::{
    has_extension, is_certificate_authority, issued_by, signature_link, SignatureLink,
};
use validity::check_validity_window;

/// Number of entries the `x5c` header must carry: leaf, intermediate, root.
pub const CHAIN_LENGTH: usize = 3;

/// Leaf and intermediate certificates taken from a JWS `x5c` header.
///
/// The third entry (the signer's copy of the root) is never trusted and
/// therefore never decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateChain {
    leaf: Vec<u8>,
    intermediate: Vec<u8>,
}

impl CertificateChain {
    /// Decode the chain from the `x5c` header entries.
    ///
    /// Any length other than [`CHAIN_LENGTH`] is rejected before decoding.
    pub fn from_x5c(x5c: Option<&[String]>) -> VerifyResult<Self> {
        let entries = x5c.unwrap_or_default();
        if entries.len() != CHAIN_LENGTH {
            return Err(VerificationError::invalid_chain_length(format!(
                "invalid certificate chain length: expected {}, got {}",
                CHAIN_LENGTH,
                entries.len()
            )));
        }

        Ok(Self {
            leaf: decode_x5c_entry(&entries[0], "leaf")?,
            intermediate: decode_x5c_entry(&entries[1], "intermediate")?,
        })
    }

    pub fn leaf_der(&self) -> &[u8] {
        &self.leaf
    }

    pub fn intermediate_der(&self) -> &[u8] {
        &self.intermediate
    }
}

impl fmt::Debug for CertificateChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateChain")
            .field("leaf", &sha256_fingerprint(&self.leaf))
            .field("intermediate", &sha256_fingerprint(&self.intermediate))
            .finish()
    }
}

fn decode_x5c_entry(entry: &str, position: &str) -> VerifyResult<Vec<u8>> {
    BASE64.decode(entry).map_err(|e| {
        VerificationError::failure(format!("invalid base64 in x5c {} entry: {}", position, e))
    })
}

/// Public key of a verified leaf certificate (SEC1 encoded EC point).
#[derive(Clone, PartialEq, Eq)]
pub struct LeafPublicKey {
    sec1: Vec<u8>,
}

impl LeafPublicKey {
    fn from_certificate(cert: &X509Certificate<'_>) -> Self {
        Self {
            sec1: cert.public_key().subject_public_key.data.to_vec(),
        }
    }

    pub fn as_sec1(&self) -> &[u8] {
        &self.sec1
    }
}

impl fmt::Debug for LeafPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafPublicKey")
            .field("fingerprint", &sha256_fingerprint(&self.sec1))
            .finish()
    }
}

/// Validate leaf → intermediate → trusted root and return the leaf key.
///
/// # Verification Steps
///
/// 1. Find the first root that signed the intermediate and is named as its
///    issuer (roots that cannot be checked are skipped)
/// 2. Check leaf → intermediate signature and issuer linkage
/// 3. Check the intermediate is a CA and both platform markers are present
/// 4. Check validity windows of leaf, intermediate and root against
///    `effective_date`, tolerating [`MAX_CLOCK_SKEW_MS`]
///
/// Steps 1-3 fail with `VerificationFailure`, step 4 with `InvalidCertificate`.
pub fn verify_certificate_chain(
    trusted_roots: &[RootCertificate],
    leaf_der: &[u8],
    intermediate_der: &[u8],
    effective_date: DateTime<Utc>,
) -> VerifyResult<LeafPublicKey> {
    let leaf = parse_chain_certificate(leaf_der, "leaf")?;
    let intermediate = parse_chain_certificate(intermediate_der, "intermediate")?;

    let Some((root_entry, root)) = find_trusted_root(trusted_roots, &intermediate) else {
        return Err(VerificationError::failure(
            "intermediate certificate is not issued by a trusted root",
        ));
    };
    debug!(root = %root_entry.fingerprint(), "intermediate certificate anchored");

    if signature_link(&leaf, &intermediate) != SignatureLink::Verified
        || !issued_by(&leaf, &intermediate)
    {
        return Err(VerificationError::failure(
            "leaf certificate is not issued by the intermediate certificate",
        ));
    }
    if !is_certificate_authority(&intermediate) {
        return Err(VerificationError::failure(
            "intermediate certificate is not a certificate authority",
        ));
    }
    if !has_extension(&leaf, LEAF_MARKER_OID) {
        return Err(VerificationError::failure(
            "leaf certificate lacks the payload signing marker extension",
        ));
    }
    if !has_extension(&intermediate, INTERMEDIATE_MARKER_OID) {
        return Err(VerificationError::failure(
            "intermediate certificate lacks the intermediate marker extension",
        ));
    }

    check_validity_window(&leaf, effective_date)?;
    check_validity_window(&intermediate, effective_date)?;
    check_validity_window(&root, effective_date)?;

    Ok(LeafPublicKey::from_certificate(&leaf))
}

/// First root, in configuration order, that issued `intermediate`.
pub(crate) fn find_trusted_root<'r>(
    trusted_roots: &'r [RootCertificate],
    intermediate: &X509Certificate<'_>,
) -> Option<(&'r RootCertificate, X509Certificate<'r>)> {
    trusted_roots.iter().find_map(|entry| {
        let root = match entry.parse() {
            Ok(root) => root,
            Err(reason) => {
                debug!(root = %entry.fingerprint(), %reason, "skipping unparsable root");
                return None;
            }
        };

        match signature_link(intermediate, &root) {
            SignatureLink::Verified if issued_by(intermediate, &root) => Some((entry, root)),
            SignatureLink::Verified | SignatureLink::Rejected => None,
            SignatureLink::Malformed(reason) => {
                debug!(root = %entry.fingerprint(), %reason, "skipping root with unusable key");
                None
            }
        }
    })
}

fn parse_chain_certificate<'a>(
    der: &'a [u8],
    position: &str,
) -> VerifyResult<X509Certificate<'a>> {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert)
        .map_err(|e| {
            VerificationError::failure(format!("invalid {} certificate: {}", position, e))
        })
}
