//! Signed payload verifier.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::chain::{verify_certificate_chain, CertificateChain};
use crate::claims::{
    check_environment, check_identity, claim_str, receipt_creation_date, signed_date,
    AppAppleIdRule, ClaimedIdentity, DecodedClaims, ExpectedIdentity, NotificationIdentity,
    ENVIRONMENT_CLAIM, RECEIPT_CREATION_DATE_CLAIM, RECEIPT_TYPE_CLAIM, SIGNED_DATE_CLAIM,
};
use crate::config::{RootCertificate, VerifierConfig};
use crate::environment::Environment;
use crate::error::VerifyResult;
use crate::jws;

/// Which claim fixes the instant certificate validity is checked at.
///
/// The claim is read before the signature is verified. When it is absent the
/// current time is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveDate {
    SignedDate,
    ReceiptCreationDate,
}

impl EffectiveDate {
    pub fn claim_name(&self) -> &'static str {
        match self {
            Self::SignedDate => SIGNED_DATE_CLAIM,
            Self::ReceiptCreationDate => RECEIPT_CREATION_DATE_CLAIM,
        }
    }

    /// Resolve against a payload, falling back to now.
    pub fn resolve(&self, claims: &DecodedClaims) -> VerifyResult<DateTime<Utc>> {
        let claimed = match self {
            Self::SignedDate => signed_date(claims)?,
            Self::ReceiptCreationDate => receipt_creation_date(claims)?,
        };
        Ok(claimed.unwrap_or_else(Utc::now))
    }
}

/// Verifies signed payloads against a fixed configuration.
///
/// Immutable after construction; a single instance can be shared across
/// threads and every call is independent.
///
/// # Example
///
/// ```no_run
/// use signed_data_verifier::{Environment, SignedDataVerifier};
///
/// # fn example(root_der: Vec<u8>, signed_transaction: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = SignedDataVerifier::new(
///     [root_der],
///     Environment::Production,
///     "com.example.app",
///     Some("1234567890".to_string()),
/// )?;
/// let transaction = verifier.verify_and_decode_transaction(signed_transaction)?;
/// println!("{}", transaction["transactionId"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SignedDataVerifier {
    config: VerifierConfig,
}

impl SignedDataVerifier {
    /// Create a verifier from root certificate bytes (PEM or DER, PEM bundles
    /// contribute every certificate they hold).
    pub fn new<I, B>(
        root_certificates: I,
        environment: Environment,
        bundle_id: impl Into<String>,
        app_apple_id: Option<String>,
    ) -> VerifyResult<Self>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut roots = Vec::new();
        for bytes in root_certificates {
            roots.extend(RootCertificate::load_all(bytes.as_ref())?);
        }
        Self::from_config(VerifierConfig::new(
            roots,
            environment,
            bundle_id,
            app_apple_id,
        )?)
    }

    pub fn from_config(config: VerifierConfig) -> VerifyResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a verifier from environment variables.
    ///
    /// See [`VerifierConfig::from_env`].
    pub fn from_env() -> VerifyResult<Self> {
        Self::from_config(VerifierConfig::from_env()?)
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a signed transaction.
    ///
    /// Checks the bundle id, then the `environment` claim.
    pub fn verify_and_decode_transaction(
        &self,
        signed_transaction: &str,
    ) -> VerifyResult<DecodedClaims> {
        let claims = self.verify_jws(signed_transaction, EffectiveDate::SignedDate)?;
        let claimed = ClaimedIdentity::from_object(&claims, ENVIRONMENT_CLAIM);
        check_identity(&self.expected_identity(), &claimed, AppAppleIdRule::Never)?;
        Ok(claims)
    }

    /// Verify signed renewal info. Only the `environment` claim is checked.
    pub fn verify_and_decode_renewal_info(
        &self,
        signed_renewal_info: &str,
    ) -> VerifyResult<DecodedClaims> {
        let claims = self.verify_jws(signed_renewal_info, EffectiveDate::SignedDate)?;
        check_environment(
            self.config.environment(),
            claim_str(&claims, ENVIRONMENT_CLAIM),
        )?;
        Ok(claims)
    }

    /// Verify a server notification.
    ///
    /// Identity comes from the first present of `data`, `summary` and
    /// `externalPurchaseToken`. The app apple id is compared when the
    /// notification claims Production.
    pub fn verify_and_decode_notification(
        &self,
        signed_payload: &str,
    ) -> VerifyResult<DecodedClaims> {
        let claims = self.verify_jws(signed_payload, EffectiveDate::SignedDate)?;
        {
            let identity = NotificationIdentity::from_claims(&claims);
            debug!(
                source = identity.source.map(|s| s.claim_name()).unwrap_or("none"),
                "notification identity selected"
            );
            check_identity(
                &self.expected_identity(),
                &identity.claimed,
                AppAppleIdRule::WhenClaimedProduction,
            )?;
        }
        Ok(claims)
    }

    /// Verify a signed app transaction.
    ///
    /// Certificates are checked at `receiptCreationDate`, the environment is
    /// read from `receiptType`, and the app apple id is compared when the
    /// verifier is configured for Production.
    pub fn verify_and_decode_app_transaction(
        &self,
        signed_app_transaction: &str,
    ) -> VerifyResult<DecodedClaims> {
        let claims =
            self.verify_jws(signed_app_transaction, EffectiveDate::ReceiptCreationDate)?;
        let claimed = ClaimedIdentity::from_object(&claims, RECEIPT_TYPE_CLAIM);
        check_identity(
            &self.expected_identity(),
            &claimed,
            AppAppleIdRule::WhenConfiguredProduction,
        )?;
        Ok(claims)
    }

    fn expected_identity(&self) -> ExpectedIdentity<'_> {
        ExpectedIdentity {
            bundle_id: self.config.bundle_id(),
            app_apple_id: self.config.app_apple_id(),
            environment: self.config.environment(),
        }
    }

    /// Chain, then signature. Returns the payload only if both hold.
    fn verify_jws(&self, token: &str, basis: EffectiveDate) -> VerifyResult<DecodedClaims> {
        let unverified = jws::decode_unverified(token)?;
        let chain = CertificateChain::from_x5c(unverified.x5c.as_deref())?;
        let effective_date = basis.resolve(&unverified.claims)?;
        debug!(
            basis = basis.claim_name(),
            effective_date = %effective_date.to_rfc3339(),
            "checking certificate chain"
        );

        let leaf_key = verify_certificate_chain(
            self.config.root_certificates(),
            chain.leaf_der(),
            chain.intermediate_der(),
            effective_date,
        )?;
        jws::decode_verified(token, &leaf_key)
    }
}
