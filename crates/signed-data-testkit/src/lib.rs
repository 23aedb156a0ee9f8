//! Test fixtures for signed payload verification.
//!
//! Builds P-256 chains root → intermediate → leaf carrying the platform
//! marker extensions, and signs ES256 JWS payloads with the leaf key and the
//! chain in `x5c`. Certificates are handed out as DER/PEM so this crate does
//! not depend on the verifier.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rcgen::{BasicConstraints, CertificateParams, CustomExtension, DnType, IsCa};
use serde_json::Value;
use time::OffsetDateTime;

pub use rcgen::{Certificate, KeyPair};

/// Leaf marker `1.2.840.113635.100.6.11.1`.
pub const LEAF_MARKER: &[u64] = &[1, 2, 840, 113635, 100, 6, 11, 1];
/// Intermediate marker `1.2.840.113635.100.6.2.1`.
pub const INTERMEDIATE_MARKER: &[u64] = &[1, 2, 840, 113635, 100, 6, 2, 1];

/// ASN.1 NULL, the marker extensions carry no value.
fn marker(oid: &[u64]) -> CustomExtension {
    CustomExtension::from_oid_content(oid, vec![0x05, 0x00])
}

pub fn at(unix_secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(unix_secs).expect("valid unix timestamp")
}

/// Validity window in unix seconds.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub not_before: i64,
    pub not_after: i64,
}

impl Default for Window {
    fn default() -> Self {
        // 2000-01-01 .. 2100-01-01
        Self {
            not_before: 946_684_800,
            not_after: 4_102_444_800,
        }
    }
}

pub struct ChainBuilder {
    leaf_marker: bool,
    intermediate_marker: bool,
    intermediate_is_ca: bool,
    leaf: Window,
    intermediate: Window,
    root: Window,
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self {
            leaf_marker: true,
            intermediate_marker: true,
            intermediate_is_ca: true,
            leaf: Window::default(),
            intermediate: Window::default(),
            root: Window::default(),
        }
    }
}

impl ChainBuilder {
    pub fn without_leaf_marker(mut self) -> Self {
        self.leaf_marker = false;
        self
    }

    pub fn without_intermediate_marker(mut self) -> Self {
        self.intermediate_marker = false;
        self
    }

    /// Intermediate with basic constraints `CA:FALSE`.
    pub fn intermediate_not_ca(mut self) -> Self {
        self.intermediate_is_ca = false;
        self
    }

    pub fn leaf_window(mut self, window: Window) -> Self {
        self.leaf = window;
        self
    }

    pub fn intermediate_window(mut self, window: Window) -> Self {
        self.intermediate = window;
        self
    }

    pub fn root_window(mut self, window: Window) -> Self {
        self.root = window;
        self
    }

    pub fn build(self) -> TestChain {
        let root_key = KeyPair::generate().expect("root key");
        let root = root_params("Test Root CA", self.root)
            .self_signed(&root_key)
            .expect("root self-signed");

        let intermediate_key = KeyPair::generate().expect("intermediate key");
        let mut params = named_params("Test Intermediate CA", self.intermediate);
        params.is_ca = if self.intermediate_is_ca {
            IsCa::Ca(BasicConstraints::Constrained(0))
        } else {
            IsCa::ExplicitNoCa
        };
        if self.intermediate_marker {
            params.custom_extensions.push(marker(INTERMEDIATE_MARKER));
        }
        let intermediate = params
            .signed_by(&intermediate_key, &root, &root_key)
            .expect("intermediate signed");

        let leaf_key = KeyPair::generate().expect("leaf key");
        let mut params = named_params("Test Payload Signer", self.leaf);
        if self.leaf_marker {
            params.custom_extensions.push(marker(LEAF_MARKER));
        }
        let leaf = params
            .signed_by(&leaf_key, &intermediate, &intermediate_key)
            .expect("leaf signed");

        TestChain {
            root,
            root_key,
            intermediate,
            intermediate_key,
            leaf,
            leaf_key,
        }
    }
}

fn named_params(common_name: &str, window: Window) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.not_before = at(window.not_before);
    params.not_after = at(window.not_after);
    params
}

fn root_params(common_name: &str, window: Window) -> CertificateParams {
    let mut params = named_params(common_name, window);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
}

pub struct TestChain {
    pub root: Certificate,
    pub root_key: KeyPair,
    pub intermediate: Certificate,
    pub intermediate_key: KeyPair,
    pub leaf: Certificate,
    pub leaf_key: KeyPair,
}

impl TestChain {
    pub fn root_der(&self) -> Vec<u8> {
        self.root.der().to_vec()
    }

    pub fn root_pem(&self) -> String {
        self.root.pem()
    }

    pub fn intermediate_der(&self) -> Vec<u8> {
        self.intermediate.der().to_vec()
    }

    pub fn leaf_der(&self) -> Vec<u8> {
        self.leaf.der().to_vec()
    }

    /// The `x5c` header value: leaf, intermediate, root.
    pub fn x5c(&self) -> Vec<String> {
        vec![
            BASE64.encode(self.leaf.der()),
            BASE64.encode(self.intermediate.der()),
            BASE64.encode(self.root.der()),
        ]
    }

    /// Sign `claims` with the leaf key, carrying the full chain.
    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_x5c(Some(self.x5c()), claims)
    }

    /// Sign `claims` with the leaf key and an arbitrary `x5c` header.
    pub fn sign_with_x5c(&self, x5c: Option<Vec<String>>, claims: &Value) -> String {
        sign_jws(&self.leaf_key, x5c, claims)
    }

    /// DER of a root sharing this chain's key but carrying a different subject.
    pub fn renamed_root_der(&self) -> Vec<u8> {
        root_params("Impostor Root CA", Window::default())
            .self_signed(&self.root_key)
            .expect("renamed root")
            .der()
            .to_vec()
    }

    /// A leaf signed by the intermediate key under a different issuer name.
    pub fn leaf_with_wrong_issuer(&self) -> Vec<u8> {
        let mut issuer_params = named_params("Some Other Intermediate", Window::default());
        issuer_params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        let issuer = issuer_params
            .self_signed(&self.intermediate_key)
            .expect("renamed intermediate");

        let mut params = named_params("Test Payload Signer", Window::default());
        params.custom_extensions.push(marker(LEAF_MARKER));
        let leaf_key = KeyPair::generate().expect("leaf key");
        params
            .signed_by(&leaf_key, &issuer, &self.intermediate_key)
            .expect("leaf signed")
            .der()
            .to_vec()
    }
}

pub fn sign_jws(key: &KeyPair, x5c: Option<Vec<String>>, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::ES256);
    header.x5c = x5c;
    let key = EncodingKey::from_ec_der(&key.serialize_der());
    encode(&header, claims, &key).expect("sign test payload")
}

/// A self-signed CA certificate with the given common name.
pub fn self_signed_root(common_name: &str) -> Certificate {
    let key = KeyPair::generate().expect("root key");
    root_params(common_name, Window::default())
        .self_signed(&key)
        .expect("self-signed root")
}

/// DER of a self-signed root whose key type cannot check ECDSA signatures.
pub fn ed25519_root_der() -> Vec<u8> {
    let key = KeyPair::generate_for(&rcgen::PKCS_ED25519).expect("ed25519 key");
    root_params("Ed25519 Root", Window::default())
        .self_signed(&key)
        .expect("ed25519 root")
        .der()
        .to_vec()
}
