//! Subcommand implementations.

pub mod create;
pub mod extract;
pub mod list;

use crate::error::add_archive_context;
use anyhow::Result;
use polyarc_core::Archiver;
use polyarc_core::formats::ArchiveFormat;
use polyarc_core::formats::CompressionType;
use std::path::Path;

/// Builds the archiver for `path`: from `--format`/`--compression` when
/// given, from the file suffix otherwise.
fn resolve_archiver(
    path: &Path,
    format: Option<ArchiveFormat>,
    compression: Option<CompressionType>,
) -> Result<Archiver> {
    let archiver = match format {
        Some(format) => Archiver::with_compression(format, compression),
        None => Archiver::for_path(path),
    };
    add_archive_context(archiver, path)
}
