//! Certificate validity windows with clock skew tolerance.

use chrono::{DateTime, Utc};
use x509_parser::prelude::X509Certificate;

use crate::error::{VerificationError, VerifyResult};

/// Tolerated disagreement between signer and verifier clocks, in milliseconds.
pub const MAX_CLOCK_SKEW_MS: i64 = 60_000;

/// Whether `[not_before, not_after]` misses `effective` by more than the skew.
///
/// All values are epoch milliseconds.
pub(crate) fn is_outside_window(not_before_ms: i64, not_after_ms: i64, effective_ms: i64) -> bool {
    not_before_ms > effective_ms.saturating_add(MAX_CLOCK_SKEW_MS)
        || not_after_ms < effective_ms.saturating_sub(MAX_CLOCK_SKEW_MS)
}

pub(crate) fn check_validity_window(
    cert: &X509Certificate<'_>,
    effective_date: DateTime<Utc>,
) -> VerifyResult<()> {
    let validity = cert.validity();
    let not_before_ms = validity.not_before.timestamp().saturating_mul(1000);
    let not_after_ms = validity.not_after.timestamp().saturating_mul(1000);

    if is_outside_window(not_before_ms, not_after_ms, effective_date.timestamp_millis()) {
        return Err(VerificationError::invalid_certificate(format!(
            "certificate '{}' is not valid at {} (valid {} to {})",
            cert.subject(),
            effective_date.to_rfc3339(),
            validity.not_before,
            validity.not_after
        )));
    }
    Ok(())
}
