//! Deployment environments a signed payload can be issued for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VerificationError;

/// Environment a payload was issued for.
///
/// The string forms are the exact values carried by the `environment` and
/// `receiptType` claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Sandbox,
    Production,
    Xcode,
    LocalTesting,
}

impl Environment {
    /// All environments, in declaration order.
    pub const ALL: [Environment; 4] = [
        Environment::Sandbox,
        Environment::Production,
        Environment::Xcode,
        Environment::LocalTesting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "Sandbox",
            Self::Production => "Production",
            Self::Xcode => "Xcode",
            Self::LocalTesting => "LocalTesting",
        }
    }

    /// Whether a claimed environment string names this environment.
    ///
    /// An absent claim never matches.
    pub fn matches_claim(&self, claimed: Option<&str>) -> bool {
        claimed == Some(self.as_str())
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| {
                VerificationError::config(format!(
                    "unknown environment '{}' (expected one of Sandbox, Production, Xcode, LocalTesting)",
                    s
                ))
            })
    }
}
