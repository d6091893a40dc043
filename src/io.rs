//! Disk I/O operations for containers
//!
//! The file is only ever extended: blocks are appended at the end and read
//! back by offset. The single in-place write is the 16-byte manifest pointer
//! inside the header.

use crate::error::{Result, VaultError};
use crate::header::{ContainerHeader, HEADER_SIZE, MANIFEST_POINTER_POSITION};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Disk-backed container storage
pub struct ContainerFile {
    file: File,
    path: PathBuf,

    #[cfg(test)]
    pub(crate) faults: Faults,
}

/// Injected failures for exercising error paths
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Faults {
    /// Fail `sync` once the manifest pointer has been rewritten
    pub fail_sync_after_pointer: bool,
    pointer_written: bool,
}

impl ContainerFile {
    /// Create a new container file holding only `header`
    ///
    /// Fails with `FileExists` if anything already exists at `path`. Missing
    /// parent directories are created.
    pub fn create<P: AsRef<Path>>(path: P, header: &ContainerHeader) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| VaultError::from_open(e, parent))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| VaultError::from_open(e, path))?;

        file.write_all(&header.to_bytes())?;
        file.sync_all()?;

        Ok(ContainerFile {
            file,
            path: path.to_path_buf(),
            #[cfg(test)]
            faults: Faults::default(),
        })
    }

    /// Open an existing container file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| VaultError::from_open(e, path))?;

        Ok(ContainerFile {
            file,
            path: path.to_path_buf(),
            #[cfg(test)]
            faults: Faults::default(),
        })
    }

    /// Open without write access, so every write fails with `Io`
    #[cfg(test)]
    pub(crate) fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| VaultError::from_open(e, path))?;

        Ok(ContainerFile {
            file,
            path: path.to_path_buf(),
            faults: Faults::default(),
        })
    }

    /// Read and validate the header
    pub fn read_header(&mut self) -> Result<ContainerHeader> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut buffer = [0u8; HEADER_SIZE];
        self.file.read_exact(&mut buffer).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => {
                VaultError::InvalidContainerFormat("file shorter than header".to_string())
            }
            _ => VaultError::Io(e),
        })?;
        ContainerHeader::from_bytes(&buffer)
    }

    /// Rewrite only the manifest offset/length fields of the header
    pub fn write_manifest_pointer(&mut self, offset: u64, length: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(MANIFEST_POINTER_POSITION))?;
        self.file
            .write_all(&ContainerHeader::manifest_pointer_bytes(offset, length))?;
        self.file.flush()?;

        #[cfg(test)]
        {
            self.faults.pointer_written = true;
        }
        Ok(())
    }

    /// Append a block at the end of the file, returning its offset
    pub fn append(&mut self, data: &[u8]) -> Result<u64> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(offset)
    }

    /// Read exactly `len` bytes at `offset`
    ///
    /// The extent must lie inside the file; anything else means the
    /// manifest or header points at data that was never written.
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let file_len = self.size()?;
        let end = offset.checked_add(len as u64);
        if offset < HEADER_SIZE as u64 || end.map_or(true, |end| end > file_len) {
            return Err(VaultError::InvalidContainerFormat(format!(
                "block {}+{} outside container of {} bytes",
                offset, len, file_len
            )));
        }

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| VaultError::OutOfMemory(len))?;
        buffer.resize(len, 0);

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    /// Current physical size of the container
    pub fn size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync all writes to disk
    pub fn sync(&mut self) -> Result<()> {
        #[cfg(test)]
        if self.faults.fail_sync_after_pointer && self.faults.pointer_written {
            return Err(VaultError::Io(std::io::Error::other("injected sync failure")));
        }

        self.file.sync_all()?;

        #[cfg(test)]
        {
            self.faults.pointer_written = false;
        }
        Ok(())
    }
}
