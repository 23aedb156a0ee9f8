//! Payload claim extraction and identity checks.
//!
//! Contract target:
//! - claim lookup is lenient about JSON shape (wrong types read as absent)
//! - date claims are strict: a present but unreadable date is an error
//! - identity checks run only on payloads whose signature already verified

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::environment::Environment;
use crate::error::{VerificationError, VerifyResult};

/// Decoded JWS payload, as a JSON object.
pub type DecodedClaims = serde_json::Map<String, Value>;

pub const BUNDLE_ID_CLAIM: &str = "bundleId";
pub const APP_APPLE_ID_CLAIM: &str = "appAppleId";
pub const ENVIRONMENT_CLAIM: &str = "environment";
pub const RECEIPT_TYPE_CLAIM: &str = "receiptType";
pub const SIGNED_DATE_CLAIM: &str = "signedDate";
pub const RECEIPT_CREATION_DATE_CLAIM: &str = "receiptCreationDate";
pub const EXTERNAL_PURCHASE_ID_CLAIM: &str = "externalPurchaseId";

/// Prefix of external purchase ids issued in the sandbox.
pub const SANDBOX_PURCHASE_ID_PREFIX: &str = "SANDBOX";

/// String claim, or `None` when missing or not a string.
pub fn claim_str<'a>(claims: &'a DecodedClaims, name: &str) -> Option<&'a str> {
    claims.get(name).and_then(Value::as_str)
}

/// Identifier claim in string form. Numbers are accepted and rendered in
/// decimal; empty strings read as absent.
pub fn claim_identifier(claims: &DecodedClaims, name: &str) -> Option<String> {
    match claims.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identity the verifier was configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedIdentity<'a> {
    pub bundle_id: &'a str,
    pub app_apple_id: Option<&'a str>,
    pub environment: Environment,
}

/// Identity a payload claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimedIdentity {
    pub bundle_id: Option<String>,
    pub app_apple_id: Option<String>,
    pub environment: Option<String>,
}

impl ClaimedIdentity {
    /// Read `bundleId`, `appAppleId` and the environment claim named
    /// `environment_claim` from one JSON object.
    pub fn from_object(claims: &DecodedClaims, environment_claim: &str) -> Self {
        Self {
            bundle_id: claim_str(claims, BUNDLE_ID_CLAIM).map(str::to_owned),
            app_apple_id: claim_identifier(claims, APP_APPLE_ID_CLAIM),
            environment: claim_str(claims, environment_claim).map(str::to_owned),
        }
    }
}

/// When the app apple id takes part in the identity comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAppleIdRule {
    /// Bundle id only.
    Never,
    /// When the payload claims Production.
    WhenClaimedProduction,
    /// When the verifier is configured for Production.
    WhenConfiguredProduction,
}

/// Compare claimed identity and environment with the expected ones.
///
/// Identity is checked first: a payload with the wrong bundle id and the
/// wrong environment fails with `InvalidAppIdentifier`.
pub fn check_identity(
    expected: &ExpectedIdentity<'_>,
    claimed: &ClaimedIdentity,
    rule: AppAppleIdRule,
) -> VerifyResult<()> {
    let compare_app_apple_id = match rule {
        AppAppleIdRule::Never => false,
        AppAppleIdRule::WhenClaimedProduction => {
            Environment::Production.matches_claim(claimed.environment.as_deref())
        }
        AppAppleIdRule::WhenConfiguredProduction => expected.environment.is_production(),
    };

    if claimed.bundle_id.as_deref() != Some(expected.bundle_id)
        || (compare_app_apple_id && claimed.app_apple_id.as_deref() != expected.app_apple_id)
    {
        return Err(VerificationError::InvalidAppIdentifier);
    }

    check_environment(expected.environment, claimed.environment.as_deref())
}

/// `InvalidEnvironment` unless `claimed` names `expected`.
pub fn check_environment(expected: Environment, claimed: Option<&str>) -> VerifyResult<()> {
    if expected.matches_claim(claimed) {
        Ok(())
    } else {
        Err(VerificationError::InvalidEnvironment)
    }
}

/// Sub-object of a notification that carries its app identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdentitySource<'a> {
    Data(&'a DecodedClaims),
    Summary(&'a DecodedClaims),
    ExternalPurchaseToken(&'a DecodedClaims),
}

impl<'a> IdentitySource<'a> {
    pub fn claim_name(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::Summary(_) => "summary",
            Self::ExternalPurchaseToken(_) => "externalPurchaseToken",
        }
    }

    pub fn object(&self) -> &'a DecodedClaims {
        match *self {
            Self::Data(obj) | Self::Summary(obj) | Self::ExternalPurchaseToken(obj) => obj,
        }
    }
}

/// First present identity sub-object, in priority order `data`, `summary`,
/// `externalPurchaseToken`. Members that are not JSON objects are skipped.
pub fn select_identity_source(claims: &DecodedClaims) -> Option<IdentitySource<'_>> {
    let object = |name: &str| claims.get(name).and_then(Value::as_object);

    object("data")
        .map(IdentitySource::Data)
        .or_else(|| object("summary").map(IdentitySource::Summary))
        .or_else(|| object("externalPurchaseToken").map(IdentitySource::ExternalPurchaseToken))
}

/// Identity of a notification payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationIdentity<'a> {
    pub source: Option<IdentitySource<'a>>,
    pub claimed: ClaimedIdentity,
}

impl<'a> NotificationIdentity<'a> {
    /// Extract the identity from the selected sub-object.
    ///
    /// A present `externalPurchaseId` decides the environment on its own:
    /// Sandbox when it starts with `SANDBOX`, Production otherwise. With no
    /// sub-object every field is absent.
    pub fn from_claims(claims: &'a DecodedClaims) -> Self {
        let Some(source) = select_identity_source(claims) else {
            return Self {
                source: None,
                claimed: ClaimedIdentity::default(),
            };
        };

        let object = source.object();
        let mut claimed = ClaimedIdentity::from_object(object, ENVIRONMENT_CLAIM);
        let purchase_id = object
            .get(EXTERNAL_PURCHASE_ID_CLAIM)
            .filter(|v| !v.is_null());
        if let Some(purchase_id) = purchase_id {
            claimed.environment = Some(external_purchase_environment(purchase_id).to_string());
        }

        Self {
            source: Some(source),
            claimed,
        }
    }
}

fn external_purchase_environment(purchase_id: &Value) -> Environment {
    match purchase_id.as_str() {
        Some(id) if id.starts_with(SANDBOX_PURCHASE_ID_PREFIX) => Environment::Sandbox,
        _ => Environment::Production,
    }
}

/// `signedDate` claim, if present.
pub fn signed_date(claims: &DecodedClaims) -> VerifyResult<Option<DateTime<Utc>>> {
    date_claim(claims, SIGNED_DATE_CLAIM)
}

/// `receiptCreationDate` claim, if present.
pub fn receipt_creation_date(claims: &DecodedClaims) -> VerifyResult<Option<DateTime<Utc>>> {
    date_claim(claims, RECEIPT_CREATION_DATE_CLAIM)
}

/// Date claim as epoch milliseconds (number or numeric string) or an
/// RFC 3339 timestamp. `null` reads as absent.
fn date_claim(claims: &DecodedClaims, name: &str) -> VerifyResult<Option<DateTime<Utc>>> {
    let invalid = || VerificationError::failure(format!("invalid {} claim", name));

    let millis = match claims.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(ms) => ms,
            None => n
                .as_f64()
                .filter(|ms| ms.is_finite() && ms.abs() < i64::MAX as f64)
                .map(|ms| ms.round() as i64)
                .ok_or_else(invalid)?,
        },
        Some(Value::String(s)) => {
            if let Ok(ms) = s.trim().parse::<i64>() {
                ms
            } else {
                let parsed = DateTime::parse_from_rfc3339(s.trim()).map_err(|_| invalid())?;
                return Ok(Some(parsed.with_timezone(&Utc)));
            }
        }
        Some(_) => return Err(invalid()),
    };

    DateTime::from_timestamp_millis(millis)
        .map(Some)
        .ok_or_else(invalid)
}
