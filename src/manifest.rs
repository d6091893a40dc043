//! Container manifest
//!
//! The manifest is the complete directory of virtual files: for every path,
//! its size, timestamps and the list of chunks holding its content. It only
//! exists on disk as a compressed, encrypted block; see [`crate::codec`] for
//! the plaintext layout.

/// Manifest format version understood by [`crate::codec`]
pub const MANIFEST_VERSION: u32 = 1;

/// One independently compressed and encrypted slice of a virtual file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataChunk {
    /// Absolute byte offset of the sealed block in the container file
    pub offset: u64,

    /// Length of the sealed (compressed + encrypted) block on disk
    pub stored_size: u32,

    /// Length of the slice before compression
    pub original_size: u32,
}

/// One virtual file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Virtual path; unique key within the manifest
    pub path: String,

    /// Total uncompressed size; equals the sum of chunk `original_size`s
    pub size: u64,

    /// Creation time, microseconds since the Unix epoch
    pub created: u64,

    /// Last-write time, microseconds since the Unix epoch
    pub modified: u64,

    /// Chunks in content order
    pub chunks: Vec<DataChunk>,
}

impl FileEntry {
    /// Physical bytes occupied by this entry's chunks
    pub fn stored_size(&self) -> u64 {
        self.chunks.iter().map(|c| c.stored_size as u64).sum()
    }

    /// Whether chunk sizes add up to the recorded total
    pub fn is_consistent(&self) -> bool {
        self.chunks
            .iter()
            .map(|c| c.original_size as u64)
            .sum::<u64>()
            == self.size
    }
}

/// Decoded manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub version: u32,
    pub entries: Vec<FileEntry>,
}

impl Manifest {
    /// Create an empty manifest at the current version
    pub fn new() -> Self {
        Manifest {
            version: MANIFEST_VERSION,
            entries: Vec::new(),
        }
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_sizes() {
        let entry = FileEntry {
            path: "/a".to_string(),
            size: 30,
            created: 1,
            modified: 2,
            chunks: vec![
                DataChunk {
                    offset: 48,
                    stored_size: 40,
                    original_size: 20,
                },
                DataChunk {
                    offset: 88,
                    stored_size: 35,
                    original_size: 10,
                },
            ],
        };

        assert!(entry.is_consistent());
        assert_eq!(entry.stored_size(), 75);

        let broken = FileEntry { size: 31, ..entry };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::default();
        assert_eq!(manifest.version, MANIFEST_VERSION);
        assert!(manifest.entries.is_empty());
    }
}
