//! End-to-end verification of the four payload kinds.
//!
//! Chains are generated per test; payloads are signed with the fixture leaf
//! key and carry the chain in `x5c`.

mod support;

use std::sync::Arc;

use serde_json::{json, Value};
use signed_data_verifier::{
    Environment, SignedDataVerifier, VerificationError, VerificationStatus,
};
use support::{Fixture, APP_APPLE_ID, BUNDLE_ID, SIGNED_DATE_MS};

fn transaction(environment: &str) -> Value {
    json!({
        "transactionId": "2000000123456789",
        "bundleId": BUNDLE_ID,
        "environment": environment,
        "signedDate": SIGNED_DATE_MS,
    })
}

#[test]
fn test_transaction_round_trip() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Sandbox);
    let token = fixture.sign(&transaction("Sandbox"));

    let claims = verifier
        .verify_and_decode_transaction(&token)
        .expect("transaction verifies");
    assert_eq!(Value::Object(claims), transaction("Sandbox"));
}

#[test]
fn test_transaction_bundle_mismatch() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Sandbox);
    let token = fixture.sign(&json!({
        "bundleId": "com.example.other",
        "environment": "Sandbox",
        "signedDate": SIGNED_DATE_MS,
    }));

    let err = verifier.verify_and_decode_transaction(&token).unwrap_err();
    assert_eq!(err, VerificationError::InvalidAppIdentifier);
    assert!(err.is_authentic_payload());
}

#[test]
fn test_transaction_environment_mismatch() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Sandbox);
    let token = fixture.sign(&transaction("Production"));

    let err = verifier.verify_and_decode_transaction(&token).unwrap_err();
    assert_eq!(err, VerificationError::InvalidEnvironment);
}

#[test]
fn test_transaction_does_not_check_app_apple_id() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Production);
    let token = fixture.sign(&json!({
        "bundleId": BUNDLE_ID,
        "appAppleId": 999,
        "environment": "Production",
        "signedDate": SIGNED_DATE_MS,
    }));

    assert!(verifier.verify_and_decode_transaction(&token).is_ok());
}

#[test]
fn test_renewal_info_checks_environment_only() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Sandbox);

    let token = fixture.sign(&json!({
        "originalTransactionId": "2000000000000001",
        "environment": "Sandbox",
        "signedDate": SIGNED_DATE_MS,
    }));
    let claims = verifier.verify_and_decode_renewal_info(&token).unwrap();
    assert_eq!(claims["originalTransactionId"], "2000000000000001");

    let token = fixture.sign(&json!({"environment": "Xcode", "signedDate": SIGNED_DATE_MS}));
    assert_eq!(
        verifier.verify_and_decode_renewal_info(&token),
        Err(VerificationError::InvalidEnvironment)
    );

    let token = fixture.sign(&json!({"signedDate": SIGNED_DATE_MS}));
    assert_eq!(
        verifier.verify_and_decode_renewal_info(&token),
        Err(VerificationError::InvalidEnvironment)
    );
}

#[test]
fn test_notification_from_data() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Production);
    let notification = json!({
        "notificationType": "SUBSCRIBED",
        "signedDate": SIGNED_DATE_MS,
        "data": {
            "bundleId": BUNDLE_ID,
            "appAppleId": APP_APPLE_ID.parse::<u64>().unwrap(),
            "environment": "Production",
        },
    });
    let token = fixture.sign(&notification);

    let claims = verifier.verify_and_decode_notification(&token).unwrap();
    assert_eq!(Value::Object(claims), notification);
}

#[test]
fn test_notification_production_app_apple_id_mismatch() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Production);
    let token = fixture.sign(&json!({
        "data": {"bundleId": BUNDLE_ID, "appAppleId": "1", "environment": "Production"},
    }));

    assert_eq!(
        verifier.verify_and_decode_notification(&token),
        Err(VerificationError::InvalidAppIdentifier)
    );
}

#[test]
fn test_notification_source_priority() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Sandbox);

    // `data` wins over `summary` even when only `summary` matches.
    let token = fixture.sign(&json!({
        "data": {"bundleId": "com.example.other", "environment": "Sandbox"},
        "summary": {"bundleId": BUNDLE_ID, "environment": "Sandbox"},
    }));
    assert_eq!(
        verifier.verify_and_decode_notification(&token),
        Err(VerificationError::InvalidAppIdentifier)
    );

    let token = fixture.sign(&json!({
        "summary": {"bundleId": BUNDLE_ID, "environment": "Sandbox"},
        "externalPurchaseToken": {"bundleId": "com.example.other"},
    }));
    assert!(verifier.verify_and_decode_notification(&token).is_ok());
}

#[test]
fn test_notification_external_purchase_id_sets_environment() {
    let fixture = Fixture::new();

    let token = fixture.sign(&json!({
        "externalPurchaseToken": {
            "bundleId": BUNDLE_ID,
            "externalPurchaseId": "SANDBOX_b2f6a8e0",
        },
    }));
    assert!(fixture
        .verifier(Environment::Sandbox)
        .verify_and_decode_notification(&token)
        .is_ok());

    let token = fixture.sign(&json!({
        "externalPurchaseToken": {
            "bundleId": BUNDLE_ID,
            "appAppleId": APP_APPLE_ID,
            "externalPurchaseId": "b2f6a8e0",
        },
    }));
    assert!(fixture
        .verifier(Environment::Production)
        .verify_and_decode_notification(&token)
        .is_ok());

    // A Production claim compares the app apple id before the environment:
    // a Sandbox verifier without one stops at the identity check.
    assert_eq!(
        fixture
            .verifier(Environment::Sandbox)
            .verify_and_decode_notification(&token),
        Err(VerificationError::InvalidAppIdentifier)
    );

    // With a matching app apple id the environment check is reached.
    assert_eq!(
        fixture
            .verifier_with_app_apple_id(Environment::Sandbox, Some(APP_APPLE_ID.to_string()))
            .verify_and_decode_notification(&token),
        Err(VerificationError::InvalidEnvironment)
    );
}

#[test]
fn test_notification_without_identity_is_rejected() {
    let fixture = Fixture::new();
    let token = fixture.sign(&json!({"notificationType": "TEST"}));

    assert_eq!(
        fixture
            .verifier(Environment::Sandbox)
            .verify_and_decode_notification(&token),
        Err(VerificationError::InvalidAppIdentifier)
    );
}

#[test]
fn test_app_transaction_uses_receipt_creation_date() {
    // Leaf valid for one hour around the receipt creation date only.
    let created = SIGNED_DATE_MS / 1000;
    let fixture = Fixture::with_leaf_validity(created - 3600, created + 3600);
    let verifier = fixture.verifier(Environment::Production);

    let token = fixture.sign(&json!({
        "bundleId": BUNDLE_ID,
        "appAppleId": APP_APPLE_ID,
        "receiptType": "Production",
        "receiptCreationDate": SIGNED_DATE_MS,
    }));
    assert!(verifier.verify_and_decode_app_transaction(&token).is_ok());

    // A signedDate inside the window does not help app transactions.
    let token = fixture.sign(&json!({
        "bundleId": BUNDLE_ID,
        "appAppleId": APP_APPLE_ID,
        "receiptType": "Production",
        "signedDate": SIGNED_DATE_MS,
    }));
    let err = verifier.verify_and_decode_app_transaction(&token).unwrap_err();
    assert_eq!(err.status(), VerificationStatus::InvalidCertificate);
}

#[test]
fn test_app_transaction_identity_checks() {
    let fixture = Fixture::new();
    let production = fixture.verifier(Environment::Production);
    let sandbox = fixture.verifier(Environment::Sandbox);

    let wrong_app = fixture.sign(&json!({
        "bundleId": BUNDLE_ID,
        "appAppleId": "1",
        "receiptType": "Production",
    }));
    assert_eq!(
        production.verify_and_decode_app_transaction(&wrong_app),
        Err(VerificationError::InvalidAppIdentifier)
    );

    // Outside Production the app apple id is not compared.
    let sandbox_receipt = fixture.sign(&json!({
        "bundleId": BUNDLE_ID,
        "appAppleId": "1",
        "receiptType": "Sandbox",
    }));
    assert!(sandbox.verify_and_decode_app_transaction(&sandbox_receipt).is_ok());

    // The environment is read from receiptType, not environment.
    let mislabelled = fixture.sign(&json!({
        "bundleId": BUNDLE_ID,
        "environment": "Sandbox",
        "receiptType": "Xcode",
    }));
    assert_eq!(
        sandbox.verify_and_decode_app_transaction(&mislabelled),
        Err(VerificationError::InvalidEnvironment)
    );
}

#[test]
fn test_chain_length_must_be_three() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Sandbox);
    let full = fixture.x5c();

    let mut four = full.clone();
    four.push(full[2].clone());

    for x5c in [None, Some(full[..2].to_vec()), Some(four)] {
        let token = fixture.sign_with_x5c(x5c, &transaction("Sandbox"));
        let err = verifier.verify_and_decode_transaction(&token).unwrap_err();
        assert_eq!(err.status(), VerificationStatus::InvalidChainLength);
    }
}

#[test]
fn test_chain_to_unconfigured_root_fails() {
    let fixture = Fixture::new();
    let verifier = Fixture::new().verifier(Environment::Sandbox);
    let token = fixture.sign(&transaction("Sandbox"));

    let err = verifier.verify_and_decode_transaction(&token).unwrap_err();
    assert_eq!(err.status(), VerificationStatus::VerificationFailure);
}

#[test]
fn test_tampered_signature_fails() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Environment::Sandbox);
    let token = fixture.sign(&transaction("Sandbox"));

    // Signature of a different payload under the same chain.
    let other = fixture.sign(&transaction("Production"));
    let (head, _) = token.rsplit_once('.').unwrap();
    let (_, other_signature) = other.rsplit_once('.').unwrap();
    let forged = format!("{}.{}", head, other_signature);

    let err = verifier.verify_and_decode_transaction(&forged).unwrap_err();
    assert_eq!(err.status(), VerificationStatus::VerificationFailure);
}

#[test]
fn test_expired_leaf_at_signed_date() {
    let created = SIGNED_DATE_MS / 1000;
    let fixture = Fixture::with_leaf_validity(created - 7200, created - 3600);
    let verifier = fixture.verifier(Environment::Sandbox);
    let token = fixture.sign(&transaction("Sandbox"));

    let err = verifier.verify_and_decode_transaction(&token).unwrap_err();
    assert!(matches!(err, VerificationError::InvalidCertificate { .. }));
}

#[test]
fn test_garbage_input_is_verification_failure() {
    let verifier = Fixture::new().verifier(Environment::Sandbox);
    for token in ["", "abc", "a.b.c", "....."] {
        let err = verifier.verify_and_decode_transaction(token).unwrap_err();
        assert_eq!(err.status(), VerificationStatus::VerificationFailure);
    }
}

#[test]
fn test_verifier_is_shareable_and_idempotent() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SignedDataVerifier>();

    let fixture = Fixture::new();
    let verifier = Arc::new(fixture.verifier(Environment::Sandbox));
    let token = Arc::new(fixture.sign(&transaction("Sandbox")));
    let expected = verifier.verify_and_decode_transaction(&token).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let verifier = Arc::clone(&verifier);
            let token = Arc::clone(&token);
            std::thread::spawn(move || verifier.verify_and_decode_transaction(&token))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), expected);
    }
}
