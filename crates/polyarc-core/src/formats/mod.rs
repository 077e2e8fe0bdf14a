//! Archive formats, compression codecs and suffix resolution.

pub mod compression;
pub mod detect;
pub mod format;

pub use compression::CompressionType;
pub use detect::FileType;
pub use format::ArchiveFormat;
