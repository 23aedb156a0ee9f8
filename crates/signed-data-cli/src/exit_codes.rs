//! Exit codes of the `signed-data` binary.
//! These codes are part of the public contract.
//!
//! Verification failures exit with `VerificationError::exit_code()`:
//! 3 untrusted payload, 4 certificate outside its validity window,
//! 5 wrong app identifier, 6 wrong environment.

pub const SUCCESS: i32 = 0;
pub const CONFIG_ERROR: i32 = 2; // Bad flags, unreadable roots or payload
