//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use super::formatter::Summary;
use anyhow::Result;
use console::Term;
use console::style;
use polyarc_core::EntryInfo;
use polyarc_core::EntryLink;
use polyarc_core::mode::to_permissions;
use polyarc_core::mode::PosixPermission;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        for (i, c) in s.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result.chars().rev().collect()
    }

    /// Renders a mode as `rwxr-x---`, or dashes when none is recorded.
    fn format_mode(mode: Option<u32>) -> String {
        let Some(mode) = mode else {
            return "-".repeat(9);
        };
        let granted = to_permissions(mode);
        PosixPermission::ALL
            .iter()
            .zip("rwxrwxrwx".chars())
            .map(|(perm, c)| if granted.contains(perm) { c } else { '-' })
            .collect()
    }

    fn headline(&self, text: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {text}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(text);
        }
    }

    fn summary_lines(&self, summary: &Summary) {
        let _ = self.term.write_line(&format!(
            "  Files:            {}",
            Self::format_number(summary.files)
        ));
        let _ = self.term.write_line(&format!(
            "  Directories:      {}",
            Self::format_number(summary.directories)
        ));
        let _ = self.term.write_line(&format!(
            "  Total size:       {}",
            Self::format_size(summary.bytes)
        ));
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_creation_result(&self, output: &Path, summary: &Summary, archive_size: u64) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline(&format!("Archive created: {}", output.display()));
        self.summary_lines(summary);
        let _ = self.term.write_line(&format!(
            "  Archive size:     {}",
            Self::format_size(archive_size)
        ));

        if self.verbose && summary.bytes > 0 {
            let _ = self.term.write_line(&format!(
                "  Ratio:            {:.1}%",
                archive_size as f64 * 100.0 / summary.bytes as f64
            ));
        }

        Ok(())
    }

    fn format_extraction_result(&self, destination: &Path, summary: &Summary) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline("Extraction complete");
        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Destination:      {}", destination.display()));
        }
        self.summary_lines(summary);

        Ok(())
    }

    fn format_listing(&self, entries: &[EntryInfo], long: bool, human_readable: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if !long {
            for entry in entries {
                let _ = self.term.write_line(&entry.name);
            }
            return Ok(());
        }

        for entry in entries {
            let size_str = if human_readable {
                Self::format_size(entry.size)
            } else {
                entry.size.to_string()
            };
            let type_char = match (&entry.link, entry.is_directory) {
                (Some(EntryLink::Symbolic(_)), _) => 'l',
                (_, true) => 'd',
                _ => '-',
            };
            let suffix = match &entry.link {
                Some(EntryLink::Symbolic(target)) => format!(" -> {target}"),
                Some(EntryLink::Hard(target)) => format!(" link to {target}"),
                None => String::new(),
            };

            let _ = self.term.write_line(&format!(
                "{type_char}{} {size_str:>10}  {}{suffix}",
                Self::format_mode(entry.mode),
                entry.name
            ));
        }

        let summary = Summary::from_entries(entries);
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "Total: {} files, {} directories, {}",
            Self::format_number(summary.files),
            Self::format_number(summary.directories),
            Self::format_size(summary.bytes)
        ));

        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // errors are shown even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(HumanFormatter::format_size(0), "0 B");
        assert_eq!(HumanFormatter::format_size(1023), "1023 B");
        assert_eq!(HumanFormatter::format_size(1536), "1.5 KB");
        assert_eq!(HumanFormatter::format_size(2 * 1024 * 1024), "2.0 MB");
        assert_eq!(HumanFormatter::format_size(1536 * 1024 * 1024), "1.5 GB");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(HumanFormatter::format_number(0), "0");
        assert_eq!(HumanFormatter::format_number(999), "999");
        assert_eq!(HumanFormatter::format_number(1000), "1,000");
        assert_eq!(HumanFormatter::format_number(1_234_567), "1,234,567");
        assert_eq!(HumanFormatter::format_number(123_456_789_012), "123,456,789,012");
    }

    #[test]
    fn test_format_mode() {
        assert_eq!(HumanFormatter::format_mode(Some(0o755)), "rwxr-xr-x");
        assert_eq!(HumanFormatter::format_mode(Some(0o640)), "rw-r-----");
        assert_eq!(HumanFormatter::format_mode(Some(0o100_644)), "rw-r--r--");
        assert_eq!(HumanFormatter::format_mode(None), "---------");
    }
}
