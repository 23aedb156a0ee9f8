//! JWS decoding boundary.
//!
//! Contract target:
//! - compact serialization parsing and ES256 signature verification only
//! - `jsonwebtoken` errors never leave this module; they become
//!   `VerificationFailure`

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use crate::chain::LeafPublicKey;
use crate::claims::DecodedClaims;
use crate::error::{VerificationError, VerifyResult};

/// The only accepted signature algorithm (ECDSA P-256 with SHA-256).
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::ES256;

/// Header certificate chain and payload of a JWS whose signature has not
/// been checked yet.
#[derive(Debug, Clone)]
pub struct UnverifiedJws {
    pub x5c: Option<Vec<String>>,
    pub claims: DecodedClaims,
}

/// Decode header and payload without verifying the signature.
pub fn decode_unverified(token: &str) -> VerifyResult<UnverifiedJws> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(VerificationError::failure(format!(
            "invalid JWS format: expected 3 segments, got {}",
            parts.len()
        )));
    }

    let header = decode_header(token)
        .map_err(|e| VerificationError::failure(format!("invalid JWS header: {}", e)))?;

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| VerificationError::failure(format!("invalid JWS payload encoding: {}", e)))?;
    let claims: DecodedClaims = serde_json::from_slice(&payload)
        .map_err(|e| VerificationError::failure(format!("invalid JWS payload: {}", e)))?;

    Ok(UnverifiedJws {
        x5c: header.x5c,
        claims,
    })
}

/// Verify the ES256 signature with `key` and return the payload.
///
/// No registered claims (`exp`, `nbf`, `aud`, ...) are required or checked:
/// the platform does not issue them.
pub fn decode_verified(token: &str, key: &LeafPublicKey) -> VerifyResult<DecodedClaims> {
    let decoding_key = DecodingKey::from_ec_der(key.as_sec1());

    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;

    decode::<DecodedClaims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| VerificationError::failure(format!("JWS verification failed: {}", e)))
}
