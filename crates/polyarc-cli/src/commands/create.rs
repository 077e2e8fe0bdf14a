//! Create command implementation.

use super::resolve_archiver;
use crate::cli::CreateArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::output::Summary;
use anyhow::Context;
use anyhow::Result;
use polyarc_core::ArchiverConfig;
use std::fs;
use std::path::Path;

pub fn execute(args: &CreateArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let config = ArchiverConfig {
        compression_level: args.compression_level,
        include_hidden: !args.exclude_hidden,
        exclude_patterns: args.exclude.clone(),
        follow_symlinks: args.follow_symlinks,
        preserve_permissions: !args.no_permissions,
    };
    let archiver = resolve_archiver(&args.output, args.format, args.compression)?;
    let archiver = add_archive_context(archiver.with_config(config), &args.output)?;

    let name = args
        .output
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid output file name: {}", args.output.display()))?;
    let destination = match args.output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let created = add_archive_context(
        archiver.create(name, destination, args.sources.as_slice()),
        &args.output,
    )?;
    if created.file_name() != args.output.file_name() {
        formatter.format_warning(&format!(
            "suffix {} appended, archive written to {}",
            archiver.suffix(),
            created.display()
        ));
    }

    let entries = add_archive_context(archiver.list(&created), &created)?;
    let archive_size = fs::metadata(&created)
        .with_context(|| format!("failed to stat {}", created.display()))?
        .len();
    formatter.format_creation_result(&created, &Summary::from_entries(&entries), archive_size)
}
