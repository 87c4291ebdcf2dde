//! Prompt fingerprints for log correlation.

use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a system instruction.
///
/// Logged in place of the prompt text so replies can be tied back to a
/// persona revision.
pub fn hash_prompt(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}
