//! # ocvault - Encrypted Single-File Containers
//!
//! `ocvault` stores a set of named byte blobs ("virtual files") inside one
//! password-protected file. Content is split into chunks, and every chunk is
//! compressed, then encrypted, then appended to the end of the container.
//! The directory of files (the manifest) is stored the same way.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocvault::{Vault, Result};
//!
//! # fn main() -> Result<()> {
//! let mut vault = Vault::create("secrets.ocv", "correct horse")?;
//!
//! vault.write_file("/notes/today.txt", b"Hello, World!")?;
//! let content = vault.read_file("/notes/today.txt")?;
//! assert_eq!(content, b"Hello, World!");
//!
//! for path in vault.list_files() {
//!     println!("{}", path);
//! }
//!
//! vault.delete_file("/notes/today.txt")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             Container File                  │
//! ├─────────────────────────────────────────────┤
//! │ Header (48 bytes)                           │
//! │  - Magic "OCV\x01", version 1               │
//! │  - Pointer to current manifest block        │
//! │  - Flags (compression method), KDF salt     │
//! ├─────────────────────────────────────────────┤
//! │ Appended blocks, in write order             │
//! │  - Chunk blocks:    AES-GCM(LZ4(slice))     │
//! │  - Manifest blocks: AES-GCM(LZ4(manifest))  │
//! │  Older manifests and replaced chunks stay   │
//! │  in place, unreferenced                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The container is append-only. Overwriting or deleting a file never shrinks
//! it, and there is no compaction.
//!
//! ## Concurrency
//!
//! A [`Vault`] is a single-threaded handle with no internal locking. Callers
//! must make sure only one handle writes to a given container at a time.

pub mod codec;
pub mod compression;
pub mod config;
pub mod encryption;
pub mod error;
pub mod header;
pub mod io;
pub mod kdf;
pub mod manifest;
pub mod vault;

// Re-export commonly used types
pub use compression::CompressionMethod;
pub use config::{ConfigError, VaultConfig, DEFAULT_CHUNK_SIZE};
pub use error::{Result, VaultError};
pub use header::{ContainerHeader, HEADER_SIZE};
pub use manifest::{DataChunk, FileEntry, Manifest};
pub use vault::Vault;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Container format magic number
pub const MAGIC: &[u8; 4] = &header::MAGIC;
