//! Main Vault API
//!
//! A [`Vault`] is an open handle on one container file. It owns the file, the
//! master key and the in-memory copy of the manifest. Every mutating call
//! appends new blocks and a complete new manifest before returning, so there
//! is nothing to flush when the handle is dropped.
//!
//! Access is single-writer: the handle does no locking, and two handles on the
//! same path must be serialized by the caller.

use crate::codec;
use crate::compression::{self, CompressionMethod};
use crate::config::{max_stored_size, VaultConfig};
use crate::encryption::{self, MasterKey};
use crate::error::{Result, VaultError};
use crate::header::{ContainerHeader, SALT_SIZE};
use crate::io::ContainerFile;
use crate::kdf;
use crate::manifest::{DataChunk, FileEntry, MANIFEST_VERSION};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Open container handle
pub struct Vault {
    /// Container file (header + appended blocks)
    file: ContainerFile,

    /// In-memory header, kept in step with the on-disk pointer
    header: ContainerHeader,

    /// Derived once per handle, never persisted
    key: MasterKey,

    /// Method recorded in the header flags
    compression: CompressionMethod,

    /// Slice size for new writes
    chunk_size: usize,

    /// Manifest cache keyed by virtual path
    entries: BTreeMap<String, FileEntry>,
}

impl Vault {
    /// Create a new container with default settings
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ocvault::Vault;
    ///
    /// let mut vault = Vault::create("data/a.ocv", "pw")?;
    /// vault.write_file("/x", b"hello")?;
    /// assert_eq!(vault.read_file("/x")?, b"hello");
    /// # Ok::<(), ocvault::VaultError>(())
    /// ```
    pub fn create<P: AsRef<Path>>(path: P, password: &str) -> Result<Self> {
        Self::create_with_config(path, password, VaultConfig::default())
    }

    /// Create a new container
    ///
    /// Fails with `FileExists` if anything is already at `path`. The empty
    /// manifest is persisted before returning, so the container can be opened
    /// straight away.
    pub fn create_with_config<P: AsRef<Path>>(
        path: P,
        password: &str,
        config: VaultConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(VaultError::FileExists(path.to_path_buf()));
        }

        info!(
            "Creating container at {:?} ({:?}, {} byte chunks)",
            path,
            config.compression(),
            config.chunk_size()
        );

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&encryption::random_bytes(SALT_SIZE));
        let key = kdf::derive_key(password.as_bytes(), &salt)?;

        let header = ContainerHeader::new(salt, config.compression());
        let file = ContainerFile::create(path, &header)?;

        let mut vault = Vault {
            file,
            header,
            key,
            compression: config.compression(),
            chunk_size: config.chunk_size(),
            entries: BTreeMap::new(),
        };
        vault.persist_manifest(|_| {})?;

        Ok(vault)
    }

    /// Open an existing container with default settings for new writes
    pub fn open<P: AsRef<Path>>(path: P, password: &str) -> Result<Self> {
        Self::open_with_config(path, password, VaultConfig::default())
    }

    /// Open an existing container
    ///
    /// Only the chunk size is taken from `config`; the compression method
    /// always comes from the header. A wrong password is reported as
    /// `DecryptionFailed`, same as a corrupted manifest block.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        password: &str,
        config: VaultConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VaultError::ContainerNotFound(path.to_path_buf()));
        }

        info!("Opening container at {:?}", path);

        let mut file = ContainerFile::open(path)?;
        let header = file.read_header()?;
        let compression = header.compression_method()?;
        let key = kdf::derive_key(password.as_bytes(), &header.salt)?;

        let mut vault = Vault {
            file,
            header,
            key,
            compression,
            chunk_size: config.chunk_size(),
            entries: BTreeMap::new(),
        };
        vault.load_manifest()?;

        Ok(vault)
    }

    /// Read a whole virtual file
    pub fn read_file(&mut self, virtual_path: &str) -> Result<Vec<u8>> {
        debug!("Reading {}", virtual_path);

        let entry = self
            .entries
            .get(virtual_path)
            .ok_or_else(|| VaultError::FileNotFound(virtual_path.to_string()))?;

        let total =
            usize::try_from(entry.size).map_err(|_| VaultError::OutOfMemory(usize::MAX))?;
        let mut output = Vec::new();
        output
            .try_reserve_exact(total)
            .map_err(|_| VaultError::OutOfMemory(total))?;

        for chunk in &entry.chunks {
            let original = chunk.original_size as usize;
            let stored = chunk.stored_size as usize;
            if stored > max_stored_size(original, self.compression) {
                return Err(VaultError::InvalidContainerFormat(format!(
                    "chunk at {} claims {} stored bytes for {} original",
                    chunk.offset, stored, original
                )));
            }

            let sealed = self.file.read_at(chunk.offset, stored)?;
            let compressed = encryption::decrypt(&sealed, &self.key)?;
            let plain = compression::decompress(&compressed, self.compression, Some(original))?;
            output.extend_from_slice(&plain);
        }

        Ok(output)
    }

    /// Write a whole virtual file, replacing any previous content at that path
    ///
    /// The replaced content stays in the container file; only the manifest
    /// stops referring to it.
    pub fn write_file(&mut self, virtual_path: &str, data: &[u8]) -> Result<()> {
        debug!("Writing {} bytes to {}", data.len(), virtual_path);

        let mut chunks = Vec::with_capacity(data.len().div_ceil(self.chunk_size));
        for piece in data.chunks(self.chunk_size) {
            let compressed = compression::compress(piece, self.compression)?;
            let sealed = encryption::encrypt(&compressed, &self.key)?;
            let stored_size = u32::try_from(sealed.len()).map_err(|_| {
                VaultError::Unknown(format!("sealed chunk of {} bytes too large", sealed.len()))
            })?;

            let offset = self.file.append(&sealed)?;
            chunks.push(DataChunk {
                offset,
                stored_size,
                original_size: piece.len() as u32,
            });
        }

        let now = now_micros();
        let entry = FileEntry {
            path: virtual_path.to_string(),
            size: data.len() as u64,
            created: now,
            modified: now,
            chunks,
        };

        let previous = self.entries.insert(virtual_path.to_string(), entry);
        self.persist_manifest(|entries| {
            match previous {
                Some(old) => entries.insert(virtual_path.to_string(), old),
                None => entries.remove(virtual_path),
            };
        })
    }

    /// Remove a virtual file from the manifest
    ///
    /// Its chunk bytes remain in the container file.
    pub fn delete_file(&mut self, virtual_path: &str) -> Result<()> {
        debug!("Deleting {}", virtual_path);

        let removed = self
            .entries
            .remove(virtual_path)
            .ok_or_else(|| VaultError::FileNotFound(virtual_path.to_string()))?;

        self.persist_manifest(|entries| {
            entries.insert(virtual_path.to_string(), removed);
        })
    }

    /// All virtual paths, sorted
    pub fn list_files(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Check whether a virtual path exists
    pub fn contains(&self, virtual_path: &str) -> bool {
        self.entries.contains_key(virtual_path)
    }

    /// Metadata for a virtual file
    pub fn entry(&self, virtual_path: &str) -> Option<&FileEntry> {
        self.entries.get(virtual_path)
    }

    /// Number of virtual files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the container file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Current header, including the live manifest pointer
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Physical size of the container file, including unreferenced blocks
    pub fn container_size(&self) -> Result<u64> {
        self.file.size()
    }

    /// Append the complete manifest and point the header at it
    ///
    /// The header is only touched after the block is fully written and synced.
    /// Until the pointer rewrite succeeds a failure runs `undo` on the cache,
    /// so cache and header both still describe the previous manifest. Once the
    /// pointer is written the change is committed: a failing final sync is
    /// reported, but the cache and header keep the new state because the
    /// on-disk pointer may already refer to it.
    fn persist_manifest<F>(&mut self, undo: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, FileEntry>),
    {
        let (offset, length) = match self.append_manifest() {
            Ok(extent) => extent,
            Err(e) => {
                undo(&mut self.entries);
                return Err(e);
            }
        };

        self.header.manifest_offset = offset;
        self.header.manifest_length = length;

        debug!(
            "Persisted manifest: {} entries, {} bytes at offset {}",
            self.entries.len(),
            length,
            offset
        );

        self.file.sync().map_err(|e| {
            warn!("Manifest pointer written but not synced: {}", e);
            e
        })
    }

    /// Write the manifest block and rewrite the pointer, returning the extent
    fn append_manifest(&mut self) -> Result<(u64, u64)> {
        let plain = codec::encode_entries(MANIFEST_VERSION, self.entries.values());
        let compressed = compression::compress(&plain, self.compression)?;
        let sealed = encryption::encrypt(&compressed, &self.key)?;

        let offset = self.file.append(&sealed)?;
        self.file.sync()?;

        let length = sealed.len() as u64;
        self.file.write_manifest_pointer(offset, length)?;

        Ok((offset, length))
    }

    /// Rebuild the cache from the block the header points at
    fn load_manifest(&mut self) -> Result<()> {
        self.header = self.file.read_header()?;
        if !self.header.has_manifest() {
            self.entries.clear();
            return Ok(());
        }

        let length = usize::try_from(self.header.manifest_length)
            .map_err(|_| VaultError::OutOfMemory(usize::MAX))?;
        let sealed = self.file.read_at(self.header.manifest_offset, length)?;
        let compressed = encryption::decrypt(&sealed, &self.key)?;
        let plain = compression::decompress(&compressed, self.compression, None)?;
        let manifest = codec::decode(&plain)?;

        let entries: BTreeMap<String, FileEntry> = manifest
            .entries
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();

        debug!(
            "Loaded manifest: {} entries from offset {}",
            entries.len(),
            self.header.manifest_offset
        );

        self.entries = entries;
        Ok(())
    }
}

fn now_micros() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_micros()).unwrap_or(0)
}
