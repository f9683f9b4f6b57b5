//! Deterministic rendering seeds.

use sha2::{Digest, Sha256};

/// Exclusive upper bound of generated seeds.
pub const SEED_RANGE: u32 = 1 << 31;

/// Seed for a character name.
///
/// Pure function of the trimmed, lowercased name, so "Luna" and "luna " render
/// alike across runs and processes.
///
/// # Examples
///
/// ```
/// use storybooker_characters::seed_for_name;
///
/// assert_eq!(seed_for_name("Luna"), seed_for_name(" luna"));
/// assert!(seed_for_name("Luna") < 1 << 31);
/// ```
pub fn seed_for_name(name: &str) -> u32 {
    let digest = Sha256::digest(name.trim().to_lowercase().as_bytes());
    let head = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    head % SEED_RANGE
}
