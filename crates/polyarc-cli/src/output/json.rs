//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::Summary;
use anyhow::Result;
use polyarc_core::EntryInfo;
use polyarc_core::EntryLink;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use std::time::UNIX_EPOCH;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EntryOutput<'a> {
    name: &'a str,
    is_directory: bool,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symlink_target: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hardlink_target: Option<&'a str>,
}

impl<'a> From<&'a EntryInfo> for EntryOutput<'a> {
    fn from(entry: &'a EntryInfo) -> Self {
        Self {
            name: &entry.name,
            is_directory: entry.is_directory,
            size: entry.size,
            last_modified: entry
                .last_modified
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs()),
            mode: entry.mode.map(|m| format!("{m:04o}")),
            symlink_target: match &entry.link {
                Some(EntryLink::Symbolic(target)) => Some(target),
                _ => None,
            },
            hardlink_target: match &entry.link {
                Some(EntryLink::Hard(target)) => Some(target),
                _ => None,
            },
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_creation_result(&self, output: &Path, summary: &Summary, archive_size: u64) -> Result<()> {
        #[derive(Serialize)]
        struct CreationOutput<'a> {
            output_path: String,
            #[serde(flatten)]
            summary: &'a Summary,
            archive_size: u64,
        }

        let data = CreationOutput {
            output_path: output.display().to_string(),
            summary,
            archive_size,
        };
        Self::output(&JsonOutput::success("create", data))
    }

    fn format_extraction_result(&self, destination: &Path, summary: &Summary) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractionOutput<'a> {
            destination: String,
            #[serde(flatten)]
            summary: &'a Summary,
        }

        let data = ExtractionOutput {
            destination: destination.display().to_string(),
            summary,
        };
        Self::output(&JsonOutput::success("extract", data))
    }

    fn format_listing(&self, entries: &[EntryInfo], _long: bool, _human_readable: bool) -> Result<()> {
        #[derive(Serialize)]
        struct ListOutput<'a> {
            entries: Vec<EntryOutput<'a>>,
            #[serde(flatten)]
            summary: Summary,
        }

        let data = ListOutput {
            entries: entries.iter().map(EntryOutput::from).collect(),
            summary: Summary::from_entries(entries),
        };
        Self::output(&JsonOutput::success("list", data))
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::error("error", format!("{error:#}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData<'a> {
            message: &'a str,
        }

        let output = JsonOutput::success("warning", WarningData { message });
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_entry_output_fields() {
        let info = EntryInfo {
            name: "bin/run".to_string(),
            is_directory: false,
            size: 42,
            last_modified: Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
            mode: Some(0o755),
            link: None,
        };
        let json = serde_json::to_value(EntryOutput::from(&info)).unwrap();
        assert_eq!(json["name"], "bin/run");
        assert_eq!(json["size"], 42);
        assert_eq!(json["last_modified"], 1_700_000_000);
        assert_eq!(json["mode"], "0755");
    }

    #[test]
    fn test_entry_output_omits_missing_metadata() {
        let info = EntryInfo {
            name: "dir/".to_string(),
            is_directory: true,
            size: 0,
            last_modified: None,
            mode: None,
            link: None,
        };
        let json = serde_json::to_value(EntryOutput::from(&info)).unwrap();
        assert!(json.get("mode").is_none());
        assert!(json.get("last_modified").is_none());
        assert_eq!(json["is_directory"], true);
    }

    #[test]
    fn test_error_envelope() {
        let json = serde_json::to_value(JsonOutput::error("error", "boom")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_link_targets_serialized() {
        let info = EntryInfo {
            name: "sym.txt".to_string(),
            is_directory: false,
            size: 0,
            last_modified: None,
            mode: None,
            link: Some(EntryLink::Symbolic("orig.txt".to_string())),
        };
        let json = serde_json::to_value(EntryOutput::from(&info)).unwrap();
        assert_eq!(json["symlink_target"], "orig.txt");
        assert!(json.get("hardlink_target").is_none());
    }
}
