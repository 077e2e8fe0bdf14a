//! Extract command implementation.

use super::resolve_archiver;
use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::output::Summary;
use anyhow::Context;
use anyhow::Result;
use polyarc_core::ArchiverConfig;
use std::env;

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    let config = ArchiverConfig::new().with_preserve_permissions(!args.no_permissions);
    let archiver = resolve_archiver(&args.archive, args.format, args.compression)?;
    let archiver = add_archive_context(archiver.with_config(config), &args.archive)?;

    // a corrupt archive fails here, before anything is written
    let entries = add_archive_context(archiver.list(&args.archive), &args.archive)?;
    add_archive_context(archiver.extract(&args.archive, &output_dir), &args.archive)?;

    formatter.format_extraction_result(&output_dir, &Summary::from_entries(&entries))
}
