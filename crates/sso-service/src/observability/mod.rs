//! Observability for the SSO service.
//!
//! # Privacy by Default
//!
//! Instrumented functions use `#[instrument(skip_all)]` and record only
//! explicitly allowed fields:
//! - **SAFE**: operation names, ticket kinds, outcomes, TTLs
//! - **HASHED**: subject identifiers, via [`hash_for_correlation`]
//! - **NEVER**: ticket strings (TGC, ST) and the store URL
//!
//! A ticket string is a bearer credential. Anyone who reads it from a log
//! can authenticate as its subject, so it never appears in any log field.

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars)
///
/// Used for subject identifiers, which need correlation across log entries
/// but should not be stored in plaintext.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(result.get(..4).unwrap_or_default())
}
