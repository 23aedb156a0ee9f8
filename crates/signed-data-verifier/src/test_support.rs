//! Certificate chain fixtures for unit tests.

pub(crate) use signed_data_testkit::{sign_jws, ChainBuilder, TestChain, Window};

use crate::config::RootCertificate;

/// Fixture roots as configured trust anchors.
pub(crate) trait ChainRoots {
    fn trusted_root(&self) -> RootCertificate;

    /// A root sharing the chain's key but carrying a different subject.
    fn renamed_root(&self) -> RootCertificate;
}

impl ChainRoots for TestChain {
    fn trusted_root(&self) -> RootCertificate {
        RootCertificate::from_der(self.root_der()).expect("fixture root parses")
    }

    fn renamed_root(&self) -> RootCertificate {
        RootCertificate::from_der(self.renamed_root_der()).expect("renamed root parses")
    }
}

/// A self-signed root whose key type cannot check ECDSA signatures.
pub(crate) fn ed25519_root() -> RootCertificate {
    RootCertificate::from_der(signed_data_testkit::ed25519_root_der())
        .expect("ed25519 root parses")
}
