//! Output formatter trait for CLI results.

use anyhow::Result;
use polyarc_core::EntryInfo;
use serde::Serialize;
use std::path::Path;

/// Entry counts of an archive, gathered from its listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

impl Summary {
    pub fn from_entries(entries: &[EntryInfo]) -> Self {
        entries.iter().fold(Self::default(), |mut summary, entry| {
            if entry.is_directory {
                summary.directories += 1;
            } else {
                summary.files += 1;
                summary.bytes += entry.size;
            }
            summary
        })
    }
}

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the result of `create`; `archive_size` is the size on disk.
    fn format_creation_result(&self, output: &Path, summary: &Summary, archive_size: u64) -> Result<()>;

    /// Format the result of `extract`
    fn format_extraction_result(&self, destination: &Path, summary: &Summary) -> Result<()>;

    /// Format an archive listing
    fn format_listing(&self, entries: &[EntryInfo], long: bool, human_readable: bool) -> Result<()>;

    /// Format error message
    fn format_error(&self, error: &anyhow::Error);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, is_directory: bool, size: u64) -> EntryInfo {
        EntryInfo {
            name: name.to_string(),
            is_directory,
            size,
            last_modified: None,
            mode: None,
            link: None,
        }
    }

    #[test]
    fn test_summary_from_entries() {
        let entries = [
            info("dir/", true, 0),
            info("dir/a.txt", false, 10),
            info("b.txt", false, 5),
        ];
        let summary = Summary::from_entries(&entries);
        assert_eq!(
            summary,
            Summary {
                files: 2,
                directories: 1,
                bytes: 15
            }
        );
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(Summary::from_entries(&[]), Summary::default());
    }
}
