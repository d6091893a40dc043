//! Container configuration
//!
//! Settings that apply when a container is created. Nothing here is needed to
//! open an existing container: the compression method is recorded in the
//! header and chunk sizes are recorded per chunk in the manifest.
//!
//! ```toml
//! chunk_size = 4194304
//! compression = "zstd"
//! ```

use crate::compression::{compress_bound, CompressionMethod};
use crate::encryption::ENCRYPTION_OVERHEAD;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default chunk size (4 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Smallest accepted chunk size
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Largest accepted chunk size (1 GiB)
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("chunk_size {0} outside {min}..={max}", min = MIN_CHUNK_SIZE, max = MAX_CHUNK_SIZE)]
    ChunkSize(usize),
}

/// Container creation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    chunk_size: usize,
    compression: CompressionMethod,
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression: CompressionMethod::Lz4,
        }
    }
}

impl VaultConfig {
    /// Config using Zstd instead of LZ4
    pub fn zstd() -> Self {
        Self::default().with_compression(CompressionMethod::Zstd)
    }

    /// Set the chunk size, clamped to the accepted range
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
        self
    }

    /// Set the compression method
    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: VaultConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ConfigError::ChunkSize(self.chunk_size));
        }
        Ok(())
    }
}

/// Largest sealed block a chunk of `chunk_size` bytes can produce
pub(crate) fn max_stored_size(chunk_size: usize, method: CompressionMethod) -> usize {
    compress_bound(chunk_size, method) + ENCRYPTION_OVERHEAD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();
        assert_eq!(config.chunk_size(), 4 * 1024 * 1024);
        assert_eq!(config.compression(), CompressionMethod::Lz4);
    }

    #[test]
    fn test_builder_clamps() {
        assert_eq!(VaultConfig::default().with_chunk_size(0).chunk_size(), MIN_CHUNK_SIZE);
        assert_eq!(
            VaultConfig::default().with_chunk_size(usize::MAX).chunk_size(),
            MAX_CHUNK_SIZE
        );
        assert_eq!(VaultConfig::default().with_chunk_size(65536).chunk_size(), 65536);
    }

    #[test]
    fn test_from_toml() {
        let config = VaultConfig::from_toml_str(
            r#"
            chunk_size = 65536
            compression = "zstd"
            "#,
        )
        .unwrap();
        assert_eq!(config.chunk_size(), 65536);
        assert_eq!(config.compression(), CompressionMethod::Zstd);
    }

    #[test]
    fn test_from_toml_defaults() {
        let config = VaultConfig::from_toml_str("").unwrap();
        assert_eq!(config, VaultConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(matches!(
            VaultConfig::from_toml_str("chunk_size = 1"),
            Err(ConfigError::ChunkSize(1))
        ));
        assert!(matches!(
            VaultConfig::from_toml_str("compression = \"brotli\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            VaultConfig::from_toml_str("chunk_sz = 4096"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.toml");
        std::fs::write(&path, "compression = \"lz4\"\nchunk_size = 8192\n").unwrap();

        let config = VaultConfig::load(&path).unwrap();
        assert_eq!(config.chunk_size(), 8192);

        assert!(matches!(
            VaultConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_max_chunk_fits_stored_size_field() {
        for method in [CompressionMethod::Lz4, CompressionMethod::Zstd] {
            assert!(max_stored_size(MAX_CHUNK_SIZE, method) <= u32::MAX as usize);
        }
    }
}
