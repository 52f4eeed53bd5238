//! Ticket identifier generation.
//!
//! A ticket is `hex(SHA-256(seed || entropy))` where `entropy` is a fresh
//! 32-character alphanumeric string. Uniqueness comes from the entropy; the
//! seed (a subject identifier) only namespaces the input.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the random component mixed into every ticket.
pub const ENTROPY_LENGTH: usize = 32;

/// Length of a generated ticket string (hex-encoded SHA-256).
pub const TICKET_LENGTH: usize = 64;

/// Random `[A-Za-z0-9]` string of `len` characters.
pub fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Derive a new ticket string from `seed`.
///
/// Returns a different value on every call, including for the same seed.
pub fn generate_ticket(seed: &str) -> String {
    let entropy = random_alphanumeric(ENTROPY_LENGTH);

    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(entropy.as_bytes());
    hex::encode(hasher.finalize())
}
