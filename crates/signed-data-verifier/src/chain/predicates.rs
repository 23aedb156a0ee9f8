//! Pure predicates over certificate pairs.
//!
//! Contract target:
//! - each check looks at one or two parsed certificates and nothing else
//! - no policy decisions, no error construction

use x509_parser::error::X509Error;
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::X509Certificate;

/// Platform marker carried by every payload-signing leaf certificate.
pub const LEAF_MARKER_OID: &str = "1.2.840.113635.100.6.11.1";

/// Platform marker carried by the intermediate certificate authority.
pub const INTERMEDIATE_MARKER_OID: &str = "1.2.840.113635.100.6.2.1";

/// X.509 basic constraints extension.
pub const BASIC_CONSTRAINTS_OID: &str = "2.5.29.19";

/// Outcome of checking a certificate signature against a candidate issuer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SignatureLink {
    /// The signature verifies under the issuer's key.
    Verified,
    /// Well-formed inputs, but the signature does not verify.
    Rejected,
    /// The key or signature cannot be used for verification at all.
    Malformed(String),
}

pub(crate) fn signature_link(
    child: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
) -> SignatureLink {
    match child.verify_signature(Some(issuer.public_key())) {
        Ok(()) => SignatureLink::Verified,
        Err(X509Error::SignatureVerificationError) => SignatureLink::Rejected,
        Err(e) => SignatureLink::Malformed(e.to_string()),
    }
}

/// Raw DER comparison of the child's issuer name with the issuer's subject.
pub(crate) fn issued_by(child: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> bool {
    child.issuer().as_raw() == issuer.subject().as_raw()
}

/// A basic constraints extension with `CA:TRUE` is present.
pub(crate) fn is_certificate_authority(cert: &X509Certificate<'_>) -> bool {
    cert.extensions().iter().any(|ext| {
        ext.oid.to_id_string() == BASIC_CONSTRAINTS_OID
            && matches!(ext.parsed_extension(), ParsedExtension::BasicConstraints(bc) if bc.ca)
    })
}

pub(crate) fn has_extension(cert: &X509Certificate<'_>, oid: &str) -> bool {
    cert.extensions()
        .iter()
        .any(|ext| ext.oid.to_id_string() == oid)
}
