use crate::compression::CompressionMethod;
use crate::error::{Result, VaultError};

pub const MAGIC: [u8; 4] = *b"OCV\x01";
pub const FORMAT_VERSION: u32 = 1;
pub const SALT_SIZE: usize = 16;

/// Size of the on-disk header record
pub const HEADER_SIZE: usize = 48;

/// Byte position of `manifest_offset`; `manifest_length` follows directly.
/// These 16 bytes are the only part of the header rewritten after creation.
pub const MANIFEST_POINTER_POSITION: u64 = 8;

/// Container header (byte offset 0)
///
/// ```text
/// 0..4    magic
/// 4..8    version          (u32 LE)
/// 8..16   manifest_offset  (u64 LE, 0 = none persisted yet)
/// 16..24  manifest_length  (u64 LE)
/// 24..32  flags            (u64 LE)
/// 32..48  salt
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub manifest_offset: u64,
    pub manifest_length: u64,

    /// Low byte carries the compression method; remaining bits are reserved
    /// and written as zero.
    pub flags: u64,

    /// Key-derivation salt (not secret)
    pub salt: [u8; SALT_SIZE],
}

impl ContainerHeader {
    /// Create a header for a fresh container, manifest pointer zeroed
    pub fn new(salt: [u8; SALT_SIZE], compression: CompressionMethod) -> Self {
        ContainerHeader {
            magic: MAGIC,
            version: FORMAT_VERSION,
            manifest_offset: 0,
            manifest_length: 0,
            flags: compression as u64,
            salt,
        }
    }

    /// Validate the header magic and version
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(VaultError::InvalidContainerFormat(
                "bad magic number".to_string(),
            ));
        }

        // Exact match: no migration between format versions
        if self.version != FORMAT_VERSION {
            return Err(VaultError::InvalidContainerFormat(format!(
                "unsupported format version {}",
                self.version
            )));
        }

        if self.manifest_offset == 0 && self.manifest_length != 0 {
            return Err(VaultError::InvalidContainerFormat(
                "manifest length without manifest offset".to_string(),
            ));
        }

        self.compression_method()?;

        Ok(())
    }

    /// True once at least one manifest block has been persisted
    pub fn has_manifest(&self) -> bool {
        self.manifest_offset != 0
    }

    /// Compression method recorded at creation
    pub fn compression_method(&self) -> Result<CompressionMethod> {
        let code = (self.flags & 0xFF) as u8;
        CompressionMethod::from_u8(code).ok_or_else(|| {
            VaultError::InvalidContainerFormat(format!("unknown compression method {}", code))
        })
    }

    /// Encode the manifest pointer as it sits at [`MANIFEST_POINTER_POSITION`]
    pub fn manifest_pointer_bytes(offset: u64, length: u64) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&offset.to_le_bytes());
        bytes[8..].copy_from_slice(&length.to_le_bytes());
        bytes
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];

        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..24].copy_from_slice(&Self::manifest_pointer_bytes(
            self.manifest_offset,
            self.manifest_length,
        ));
        bytes[24..32].copy_from_slice(&self.flags.to_le_bytes());
        bytes[32..48].copy_from_slice(&self.salt);

        bytes
    }

    /// Deserialize and validate header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(VaultError::InvalidContainerFormat(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let u32_at = |at: usize| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[at..at + 4]);
            u32::from_le_bytes(buf)
        };
        let u64_at = |at: usize| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[at..at + 8]);
            u64::from_le_bytes(buf)
        };

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[32..48]);

        let header = ContainerHeader {
            magic,
            version: u32_at(4),
            manifest_offset: u64_at(8),
            manifest_length: u64_at(16),
            flags: u64_at(24),
            salt,
        };

        header.validate()?;

        Ok(header)
    }
}
