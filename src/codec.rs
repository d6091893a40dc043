//! Binary codec for the manifest
//!
//! Plaintext manifest layout, all integers little-endian:
//!
//! ```text
//! version      u32
//! file_count   u32
//! file_count × {
//!     path_len     u32
//!     path         [u8; path_len]   (UTF-8)
//!     size         u64
//!     created      u64
//!     modified     u64
//!     chunk_count  u32
//!     chunk_count × {
//!         offset         u64
//!         stored_size    u32
//!         original_size  u32
//!     }
//! }
//! ```
//!
//! Pure functions only: no I/O, no cryptography.

use crate::error::VaultError;
use crate::manifest::{DataChunk, FileEntry, Manifest, MANIFEST_VERSION};
use thiserror::Error;

/// Smallest possible encoded entry (empty path, no chunks)
const MIN_ENTRY_SIZE: usize = 4 + 8 + 8 + 8 + 4;
const CHUNK_SIZE: usize = 8 + 4 + 4;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated manifest: {field} needs {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("Unsupported manifest version: {0}")]
    UnsupportedVersion(u32),

    #[error("Path is not valid UTF-8")]
    InvalidPath,

    #[error("Chunk sizes of {path} do not add up to {size} bytes")]
    ChunkSizeMismatch { path: String, size: u64 },
}

impl From<DecodeError> for VaultError {
    fn from(err: DecodeError) -> Self {
        VaultError::InvalidContainerFormat(err.to_string())
    }
}

/// Encode a manifest
pub fn encode(manifest: &Manifest) -> Vec<u8> {
    encode_entries(manifest.version, manifest.entries.iter())
}

/// Encode a manifest directly from borrowed entries
pub fn encode_entries<'a, I>(version: u32, entries: I) -> Vec<u8>
where
    I: ExactSizeIterator<Item = &'a FileEntry>,
{
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&version.to_le_bytes());
    bytes.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    for entry in entries {
        bytes.extend_from_slice(&(entry.path.len() as u32).to_le_bytes());
        bytes.extend_from_slice(entry.path.as_bytes());
        bytes.extend_from_slice(&entry.size.to_le_bytes());
        bytes.extend_from_slice(&entry.created.to_le_bytes());
        bytes.extend_from_slice(&entry.modified.to_le_bytes());
        bytes.extend_from_slice(&(entry.chunks.len() as u32).to_le_bytes());

        for chunk in &entry.chunks {
            bytes.extend_from_slice(&chunk.offset.to_le_bytes());
            bytes.extend_from_slice(&chunk.stored_size.to_le_bytes());
            bytes.extend_from_slice(&chunk.original_size.to_le_bytes());
        }
    }

    bytes
}

/// Decode a manifest
///
/// Either the whole buffer decodes or an error is returned; nothing is
/// produced from a partial read. Bytes after the last entry are ignored.
pub fn decode(bytes: &[u8]) -> Result<Manifest, DecodeError> {
    let mut reader = Reader::new(bytes);

    let version = reader.u32("version")?;
    if version != MANIFEST_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let file_count = reader.u32("file count")? as usize;
    let mut entries = Vec::with_capacity(file_count.min(reader.remaining() / MIN_ENTRY_SIZE));

    for _ in 0..file_count {
        let path_len = reader.u32("path length")? as usize;
        let path = std::str::from_utf8(reader.take("path", path_len)?)
            .map_err(|_| DecodeError::InvalidPath)?
            .to_string();

        let size = reader.u64("file size")?;
        let created = reader.u64("creation time")?;
        let modified = reader.u64("last-write time")?;

        let chunk_count = reader.u32("chunk count")? as usize;
        let mut chunks = Vec::with_capacity(chunk_count.min(reader.remaining() / CHUNK_SIZE));
        for _ in 0..chunk_count {
            chunks.push(DataChunk {
                offset: reader.u64("chunk offset")?,
                stored_size: reader.u32("chunk stored size")?,
                original_size: reader.u32("chunk original size")?,
            });
        }

        let entry = FileEntry {
            path,
            size,
            created,
            modified,
            chunks,
        };
        if !entry.is_consistent() {
            return Err(DecodeError::ChunkSizeMismatch {
                path: entry.path,
                size: entry.size,
            });
        }
        entries.push(entry);
    }

    Ok(Manifest { version, entries })
}

/// Bounds-checked little-endian cursor
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, field: &'static str, needed: usize) -> Result<&'a [u8], DecodeError> {
        if needed > self.remaining() {
            return Err(DecodeError::Truncated {
                field,
                needed,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(field, 4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(field, 8)?);
        Ok(u64::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> Manifest {
        Manifest {
            version: MANIFEST_VERSION,
            entries: vec![
                FileEntry {
                    path: "/docs/readme.txt".to_string(),
                    size: 5,
                    created: 1_700_000_000_000_000,
                    modified: 1_700_000_000_000_001,
                    chunks: vec![DataChunk {
                        offset: 48,
                        stored_size: 37,
                        original_size: 5,
                    }],
                },
                FileEntry {
                    path: "/empty".to_string(),
                    size: 0,
                    created: 3,
                    modified: 4,
                    chunks: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_empty_manifest_layout() {
        let bytes = encode(&Manifest::new());
        assert_eq!(bytes, vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode(&bytes).unwrap(), Manifest::new());
    }

    #[test]
    fn test_round_trip() {
        let manifest = sample_manifest();
        let decoded = decode(&encode(&manifest)).unwrap();
        assert_eq!(decoded, manifest);
    }

    #[test]
    fn test_pinned_byte_order() {
        let manifest = Manifest {
            version: MANIFEST_VERSION,
            entries: vec![FileEntry {
                path: "/x".to_string(),
                size: 0x0102,
                created: 0,
                modified: 0,
                chunks: vec![DataChunk {
                    offset: 0x0A0B,
                    stored_size: 0x30,
                    original_size: 0x0102,
                }],
            }],
        };

        let bytes = encode(&manifest);
        let parts: [&[u8]; 11] = [
            &[1, 0, 0, 0],                 // version
            &[1, 0, 0, 0],                 // file count
            &[2, 0, 0, 0],                 // path length
            b"/x",                         // path
            &[0x02, 0x01, 0, 0, 0, 0, 0, 0], // size
            &[0; 8],                       // created
            &[0; 8],                       // modified
            &[1, 0, 0, 0],                 // chunk count
            &[0x0B, 0x0A, 0, 0, 0, 0, 0, 0], // offset
            &[0x30, 0, 0, 0],              // stored size
            &[0x02, 0x01, 0, 0],           // original size
        ];
        assert_eq!(bytes, parts.concat());
    }

    #[test]
    fn test_encode_entries_matches_encode() {
        let manifest = sample_manifest();
        assert_eq!(
            encode_entries(MANIFEST_VERSION, manifest.entries.iter()),
            encode(&manifest)
        );
    }

    #[test]
    fn test_every_truncation_fails() {
        let bytes = encode(&sample_manifest());
        for len in 0..bytes.len() {
            assert!(
                matches!(decode(&bytes[..len]), Err(DecodeError::Truncated { .. })),
                "prefix of {} bytes should not decode",
                len
            );
        }
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encode(&sample_manifest());
        bytes[0] = 2;
        assert_eq!(decode(&bytes), Err(DecodeError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_invalid_utf8_path() {
        let mut manifest = sample_manifest();
        manifest.entries.truncate(1);
        let mut bytes = encode(&manifest);
        // First path byte sits after version, count and path length
        bytes[12] = 0xFF;
        assert_eq!(decode(&bytes), Err(DecodeError::InvalidPath));
    }

    #[test]
    fn test_chunk_size_mismatch() {
        let mut manifest = sample_manifest();
        manifest.entries[0].size = 6;
        let bytes = encode(&manifest);
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::ChunkSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_huge_counts_do_not_preallocate() {
        // Claims u32::MAX files but carries none
        let bytes = [1u8, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let manifest = sample_manifest();
        let mut bytes = encode(&manifest);
        bytes.extend_from_slice(&[0xEE; 7]);
        assert_eq!(decode(&bytes).unwrap(), manifest);
    }

    #[test]
    fn test_decode_error_maps_to_invalid_format() {
        let err: VaultError = DecodeError::UnsupportedVersion(9).into();
        assert!(matches!(err, VaultError::InvalidContainerFormat(_)));
    }
}
