//! AES-256-GCM encryption for chunk and manifest blocks
//!
//! Every stored block is sealed on its own:
//! - Format: [nonce: 12 bytes][ciphertext][tag: 16 bytes]
//! - Fresh random nonce per block
//! - A wrong key and a modified byte both fail authentication

use crate::error::{Result, VaultError};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

/// Master key (32 bytes for AES-256), wiped on drop
pub type MasterKey = Zeroizing<[u8; 32]>;

/// Nonce size for AES-GCM (96 bits / 12 bytes)
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (128 bits / 16 bytes)
pub const TAG_SIZE: usize = 16;

/// Overhead added by encryption (nonce + tag)
pub const ENCRYPTION_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// Fill a buffer of `n` bytes from the OS random source
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; n];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Encrypt data using AES-256-GCM
///
/// Returns encrypted data with format: [nonce][ciphertext][tag]
pub fn encrypt(data: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, data)
        .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

    // Build output: nonce + ciphertext (which includes tag)
    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypt data using AES-256-GCM
///
/// Expects data in format: [nonce][ciphertext][tag]
pub fn decrypt(data: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    if data.len() < ENCRYPTION_OVERHEAD {
        return Err(VaultError::DecryptionFailed);
    }

    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);

    cipher
        .decrypt(nonce, &data[NONCE_SIZE..])
        .map_err(|_| VaultError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> [u8; 32] {
        let mut key = [0u8; 32];
        key.copy_from_slice(&random_bytes(32));
        key
    }

    #[test]
    fn test_random_bytes() {
        let a = random_bytes(16);
        let b = random_bytes(16);
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert!(random_bytes(0).is_empty());
    }

    #[test]
    fn test_encryption_decryption() {
        let key = key();
        let plaintext = b"Hello, World! This is a secret message.";

        let ciphertext = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&ciphertext, &key).unwrap();

        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
        assert_ne!(plaintext.as_slice(), &ciphertext[NONCE_SIZE..NONCE_SIZE + plaintext.len()]);
        assert_eq!(ciphertext.len(), plaintext.len() + ENCRYPTION_OVERHEAD);
    }

    #[test]
    fn test_wrong_key_fails() {
        let plaintext = b"Secret message";
        let ciphertext = encrypt(plaintext, &key()).unwrap();

        assert!(matches!(
            decrypt(&ciphertext, &key()),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_data_fails() {
        let key = key();
        let mut ciphertext = encrypt(b"Important data", &key).unwrap();

        ciphertext[NONCE_SIZE + 5] ^= 0xFF;

        assert!(matches!(
            decrypt(&ciphertext, &key),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = key();
        let mut ciphertext = encrypt(b"Important data", &key).unwrap();
        ciphertext[0] ^= 0x01;
        assert!(decrypt(&ciphertext, &key).is_err());
    }

    #[test]
    fn test_short_blob_fails() {
        let key = key();
        assert!(matches!(
            decrypt(&[0u8; ENCRYPTION_OVERHEAD - 1], &key),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_empty_data_encryption() {
        let key = key();
        let ciphertext = encrypt(b"", &key).unwrap();
        assert_eq!(ciphertext.len(), ENCRYPTION_OVERHEAD);
        assert!(decrypt(&ciphertext, &key).unwrap().is_empty());
    }

    #[test]
    fn test_nonce_uniqueness() {
        let key = key();
        let plaintext = b"Same message";

        let ciphertext1 = encrypt(plaintext, &key).unwrap();
        let ciphertext2 = encrypt(plaintext, &key).unwrap();

        assert_ne!(&ciphertext1[..NONCE_SIZE], &ciphertext2[..NONCE_SIZE]);
        assert_eq!(decrypt(&ciphertext1, &key).unwrap(), plaintext);
        assert_eq!(decrypt(&ciphertext2, &key).unwrap(), plaintext);
    }
}
