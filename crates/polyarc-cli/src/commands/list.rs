//! List command implementation

use super::resolve_archiver;
use crate::cli::ListArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Result;

pub fn execute(args: &ListArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let archiver = resolve_archiver(&args.archive, args.format, args.compression)?;
    let entries = add_archive_context(archiver.list(&args.archive), &args.archive)?;
    formatter.format_listing(&entries, args.long, args.human_readable)
}
