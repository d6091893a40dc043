//! Compression for chunk and manifest payloads
//!
//! Every payload is compressed before it is encrypted. Both methods produce
//! self-describing output so a manifest block can be decompressed without
//! knowing its original size up front:
//! - LZ4: `[original_size: u32 LE][lz4 block]`
//! - Zstd: a single frame with the content size recorded in the frame header

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};

/// Compression method, recorded in the low byte of the header flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CompressionMethod {
    /// LZ4 compression (fast, moderate ratio)
    #[default]
    Lz4 = 0,
    /// Zstd compression (slower, better ratio)
    Zstd = 1,
}

impl CompressionMethod {
    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CompressionMethod::Lz4),
            1 => Some(CompressionMethod::Zstd),
            _ => None,
        }
    }
}

const ZSTD_LEVEL: i32 = 3;
const LZ4_SIZE_PREFIX: usize = 4;

/// Compress data using the specified method
pub fn compress(data: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        CompressionMethod::Zstd => zstd::bulk::compress(data, ZSTD_LEVEL)
            .map_err(|e| VaultError::Unknown(format!("Zstd compression failed: {}", e))),
    }
}

/// Decompress data using the specified method
///
/// With `expected_size` the output must be exactly that long. Without it the
/// size is taken from the payload's own metadata.
pub fn decompress(
    data: &[u8],
    method: CompressionMethod,
    expected_size: Option<usize>,
) -> Result<Vec<u8>> {
    let decompressed = match method {
        CompressionMethod::Lz4 => lz4_flex::decompress_size_prepended(data).map_err(|e| {
            VaultError::InvalidContainerFormat(format!("LZ4 decompression failed: {}", e))
        })?,
        CompressionMethod::Zstd => {
            let capacity = match expected_size {
                Some(size) => size,
                None => zstd_content_size(data)?,
            };
            zstd::bulk::decompress(data, capacity).map_err(|e| {
                VaultError::InvalidContainerFormat(format!("Zstd decompression failed: {}", e))
            })?
        }
    };

    if let Some(expected) = expected_size {
        if decompressed.len() != expected {
            return Err(VaultError::InvalidContainerFormat(format!(
                "decompressed {} bytes, expected {}",
                decompressed.len(),
                expected
            )));
        }
    }

    Ok(decompressed)
}

/// Upper bound on the compressed size of `size` input bytes
pub fn compress_bound(size: usize, method: CompressionMethod) -> usize {
    match method {
        CompressionMethod::Lz4 => {
            lz4_flex::block::get_maximum_output_size(size) + LZ4_SIZE_PREFIX
        }
        CompressionMethod::Zstd => zstd::zstd_safe::compress_bound(size),
    }
}

fn zstd_content_size(data: &[u8]) -> Result<usize> {
    match zstd::zstd_safe::get_frame_content_size(data) {
        Ok(Some(size)) => usize::try_from(size).map_err(|_| {
            VaultError::InvalidContainerFormat(format!("Zstd content size {} too large", size))
        }),
        _ => Err(VaultError::InvalidContainerFormat(
            "Zstd frame does not record its content size".to_string(),
        )),
    }
}
