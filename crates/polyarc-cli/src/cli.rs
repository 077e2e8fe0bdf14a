//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use polyarc_core::formats::ArchiveFormat;
use polyarc_core::formats::CompressionType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "polyarc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new archive
    Create(CreateArgs),
    /// Extract archive contents
    Extract(ExtractArgs),
    /// List archive contents without extraction
    List(ListArgs),
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Output archive file path; its suffix selects the format
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Source files or directories to archive
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<PathBuf>,

    /// Archive format, overriding the output suffix
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    pub format: Option<ArchiveFormat>,

    /// Compression codec, overriding the output suffix
    #[arg(long, value_name = "CODEC", value_parser = parse_compression, requires = "format")]
    pub compression: Option<CompressionType>,

    /// Compression level (1-9)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub compression_level: Option<u8>,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    pub exclude_hidden: bool,

    /// Exclude pattern (glob, can be repeated)
    #[arg(long = "exclude", short = 'x', value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Store default modes instead of the sources' permissions
    #[arg(long)]
    pub no_permissions: bool,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Archive format, overriding the archive suffix
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    pub format: Option<ArchiveFormat>,

    /// Compression codec, overriding the archive suffix
    #[arg(long, value_name = "CODEC", value_parser = parse_compression, requires = "format")]
    pub compression: Option<CompressionType>,

    /// Leave permissions at the process defaults instead of restoring them
    #[arg(long)]
    pub no_permissions: bool,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Archive format, overriding the archive suffix
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    pub format: Option<ArchiveFormat>,

    /// Compression codec, overriding the archive suffix
    #[arg(long, value_name = "CODEC", value_parser = parse_compression, requires = "format")]
    pub compression: Option<CompressionType>,

    /// Show detailed file information
    #[arg(short, long)]
    pub long: bool,

    /// Show sizes in human-readable format
    #[arg(short = 'H', long)]
    pub human_readable: bool,
}

fn parse_format(s: &str) -> Result<ArchiveFormat, String> {
    ArchiveFormat::from_name(&s.to_ascii_lowercase()).ok_or_else(|| {
        let known: Vec<_> = ArchiveFormat::ALL.iter().map(|f| f.name()).collect();
        format!("unknown format '{s}' (expected one of: {})", known.join(", "))
    })
}

fn parse_compression(s: &str) -> Result<CompressionType, String> {
    CompressionType::from_name(&s.to_ascii_lowercase()).ok_or_else(|| {
        let known: Vec<_> = CompressionType::ALL.iter().map(|c| c.name()).collect();
        format!("unknown compression '{s}' (expected one of: {})", known.join(", "))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("tar").unwrap(), ArchiveFormat::Tar);
        assert_eq!(parse_format("7z").unwrap(), ArchiveFormat::SevenZ);
        assert_eq!(parse_format("ZIP").unwrap(), ArchiveFormat::Zip);
        assert!(parse_format("rar").unwrap_err().contains("cpio"));
    }

    #[test]
    fn test_parse_compression() {
        assert_eq!(parse_compression("gzip").unwrap(), CompressionType::Gzip);
        assert_eq!(parse_compression("zst").unwrap(), CompressionType::Zstd);
        assert!(parse_compression("lz4").is_err());
    }

    #[test]
    fn test_compression_requires_format() {
        let result = Cli::try_parse_from(["polyarc", "create", "out", "src", "--compression", "gzip"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from([
            "polyarc", "create", "out", "src", "--format", "cpio", "--compression", "gzip",
        ]);
        assert!(result.is_ok());
    }
}
