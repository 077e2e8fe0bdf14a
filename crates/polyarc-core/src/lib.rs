//! Format-agnostic archive creation, extraction and streaming.
//!
//! `polyarc-core` puts one API over tar, zip, jar, 7z, cpio and ar
//! archives (optionally wrapped in gzip, bzip2, xz or zstd) and maps each
//! container's permission encoding onto a single POSIX mode model.
//!
//! # Examples
//!
//! ```no_run
//! use polyarc_core::Archiver;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archiver = Archiver::for_path("release.tar.zst")?;
//! let archive = archiver.create("release", "/tmp", &["target/dist"])?;
//!
//! for entry in archiver.list(&archive)? {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! archiver.extract(&archive, "/tmp/unpacked")?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archiver;
pub mod attributes;
pub mod backend;
pub mod compressor;
pub mod config;
pub mod creation;
pub mod error;
pub mod formats;
pub mod mode;
pub mod stream;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use archiver::Archiver;
pub use backend::EntryLink;
pub use compressor::Compressor;
pub use config::ArchiverConfig;
pub use error::ArchiveError;
pub use error::Result;
pub use formats::ArchiveFormat;
pub use formats::CompressionType;
pub use formats::FileType;
pub use stream::ArchiveEntry;
pub use stream::ArchiveStream;
pub use stream::EntryInfo;
