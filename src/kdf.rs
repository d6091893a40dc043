//! Password-based key derivation.
//!
//! Argon2id turns the container password and the header salt into the master
//! key. The parameters are part of the format: changing them would make every
//! existing container undecryptable.

use crate::encryption::MasterKey;
use crate::error::{Result, VaultError};
use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

/// Argon2 memory cost in KiB (19 MiB).
pub const ARGON2_MEM_COST_KIB: u32 = 19 * 1024;

/// Argon2 time cost (number of iterations).
pub const ARGON2_TIME_COST: u32 = 2;

/// Argon2 parallelism (number of lanes).
pub const ARGON2_LANES: u32 = 1;

/// Derive the 32-byte master key from a password and salt.
///
/// Any password is accepted; a wrong one only shows up later as an
/// authentication failure.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<MasterKey> {
    let params = Params::new(
        ARGON2_MEM_COST_KIB,
        ARGON2_TIME_COST,
        ARGON2_LANES,
        Some(32),
    )
    .map_err(|e| VaultError::KeyDerivationFailed(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password, salt, &mut *key)
        .map_err(|e| VaultError::KeyDerivationFailed(e.to_string()))?;

    Ok(key)
}
