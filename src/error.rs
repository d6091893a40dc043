//! Error types for container operations
//!
//! The set of variants is closed: every failure inside the engine is mapped to
//! exactly one of these kinds and handed back to the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Container already exists: {0}")]
    FileExists(PathBuf),

    #[error("Container not found: {0}")]
    ContainerNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid container format: {0}")]
    InvalidContainerFormat(String),

    #[error("File not found in container: {0}")]
    FileNotFound(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication failed. During `open` this means either a wrong password
    /// or a corrupted manifest block; the format cannot tell them apart.
    #[error("Decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Out of memory: could not reserve {0} bytes")]
    OutOfMemory(usize),

    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl VaultError {
    /// Stable name of the error kind, independent of the attached context
    pub fn kind_name(&self) -> &'static str {
        match self {
            VaultError::FileExists(_) => "FileExists",
            VaultError::ContainerNotFound(_) => "ContainerNotFound",
            VaultError::Io(_) => "IOError",
            VaultError::InvalidContainerFormat(_) => "InvalidContainerFormat",
            VaultError::FileNotFound(_) => "FileNotFound",
            VaultError::KeyDerivationFailed(_) => "KeyDerivationFailed",
            VaultError::EncryptionFailed(_) => "EncryptionFailed",
            VaultError::DecryptionFailed => "DecryptionFailed",
            VaultError::InvalidPassword => "InvalidPassword",
            VaultError::OutOfMemory(_) => "OutOfMemory",
            VaultError::AccessDenied(_) => "AccessDenied",
            VaultError::Unknown(_) => "Unknown",
        }
    }

    /// Map an I/O error raised while opening or creating the container file itself
    pub(crate) fn from_open(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => VaultError::ContainerNotFound(path.to_path_buf()),
            std::io::ErrorKind::AlreadyExists => VaultError::FileExists(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => VaultError::AccessDenied(path.to_path_buf()),
            _ => VaultError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
