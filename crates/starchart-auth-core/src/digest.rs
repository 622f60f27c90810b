//! Password digests.
//!
//! The store depends on the [`PasswordDigest`] capability only, so the
//! algorithm can be swapped without touching account logic:
//!
//! - `Sha256Digest`: hex SHA-256, the default
//! - `Argon2Digest`: salted Argon2id, recommended for real deployments
//! - `LegacyRollingDigest`: the old 32-bit rolling hash, readable but insecure

use std::str::FromStr;
use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{AuthError, Result};

pub trait PasswordDigest: Send + Sync {
    /// Produce the value stored in place of the plaintext password.
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a password against a previously stored digest.
    fn verify(&self, password: &str, stored: &str) -> Result<bool>;
}

/// Lowercase hex SHA-256 of the UTF-8 password.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl PasswordDigest for Sha256Digest {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(hex::encode(Sha256::digest(password.as_bytes())))
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        let computed = self.hash(password)?;
        Ok(constant_time_eq(computed.as_bytes(), stored.as_bytes()))
    }
}

/// Argon2id with a fresh random salt per hash, stored as a PHC string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Digest;

impl PasswordDigest for Argon2Digest {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Digest(e.to_string()))
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        // A digest written by another algorithm simply does not match.
        let Ok(parsed) = PasswordHash::new(stored) else {
            return Ok(false);
        };
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// `hash = hash * 31 + code_unit` over UTF-16 code units with 32-bit
/// wraparound, printed in signed base 36. Not a cryptographic hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyRollingDigest;

impl PasswordDigest for LegacyRollingDigest {
    fn hash(&self, password: &str) -> Result<String> {
        let hash = password
            .encode_utf16()
            .fold(0i32, |acc, unit| acc.wrapping_mul(31).wrapping_add(i32::from(unit)));
        Ok(to_base36(hash))
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        Ok(self.hash(password)? == stored)
    }
}

fn to_base36(value: i32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut n = i64::from(value).unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    if value < 0 {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Digest selection as it appears in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Argon2,
    Legacy,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Argon2 => "argon2",
            Self::Legacy => "legacy",
        }
    }

    pub fn build(&self) -> Arc<dyn PasswordDigest> {
        match self {
            Self::Sha256 => Arc::new(Sha256Digest),
            Self::Argon2 => Arc::new(Argon2Digest),
            Self::Legacy => {
                warn!("Legacy rolling-hash digest selected; do not use it for new deployments");
                Arc::new(LegacyRollingDigest)
            }
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "argon2" | "argon2id" => Ok(Self::Argon2),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("Unknown digest algorithm: {}", other)),
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
