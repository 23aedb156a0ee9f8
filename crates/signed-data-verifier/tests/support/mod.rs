//! Shared integration fixtures on top of `signed-data-testkit`.

#![allow(dead_code)]

use std::ops::Deref;

use signed_data_testkit::{ChainBuilder, TestChain, Window};
use signed_data_verifier::{Environment, SignedDataVerifier};

pub const BUNDLE_ID: &str = "com.example.app";
pub const APP_APPLE_ID: &str = "1234567890";

// 2023-11-14T22:13:20Z
pub const SIGNED_DATE_MS: i64 = 1_700_000_000_000;

pub struct Fixture {
    chain: TestChain,
}

impl Fixture {
    /// Chain valid from 2000 to 2100.
    pub fn new() -> Self {
        Self {
            chain: ChainBuilder::default().build(),
        }
    }

    /// Chain whose leaf is valid only in `[not_before, not_after]` (unix seconds).
    pub fn with_leaf_validity(not_before: i64, not_after: i64) -> Self {
        Self {
            chain: ChainBuilder::default()
                .leaf_window(Window {
                    not_before,
                    not_after,
                })
                .build(),
        }
    }

    /// Verifier trusting this chain's root. Production verifiers carry
    /// [`APP_APPLE_ID`], the others none.
    pub fn verifier(&self, environment: Environment) -> SignedDataVerifier {
        let app_apple_id = environment
            .is_production()
            .then(|| APP_APPLE_ID.to_string());
        self.verifier_with_app_apple_id(environment, app_apple_id)
    }

    pub fn verifier_with_app_apple_id(
        &self,
        environment: Environment,
        app_apple_id: Option<String>,
    ) -> SignedDataVerifier {
        SignedDataVerifier::new([self.root_pem()], environment, BUNDLE_ID, app_apple_id)
            .expect("verifier")
    }
}

impl Deref for Fixture {
    type Target = TestChain;

    fn deref(&self) -> &TestChain {
        &self.chain
    }
}
