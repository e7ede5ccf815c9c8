//! Colored console output for scan results.

use crate::discovery::Manifest;
use crate::types::{Finding, FindingCategory, ScanReport};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    verbose: bool,
    json_mode: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new(verbose: bool, json_mode: bool) -> Self {
        Self { verbose, json_mode }
    }

    /// Print scan start message.
    pub fn print_scan_start(&self, target: &str, file_count: usize) {
        if self.json_mode {
            return;
        }

        println!(
            "{} Scanning {} files: {}",
            "[*]".bright_blue(),
            file_count,
            target.bright_white()
        );
    }

    /// Print scan progress (only in verbose mode).
    pub fn print_progress(&self, message: &str) {
        if self.json_mode || !self.verbose {
            return;
        }

        println!("{} {}", "[.]".dimmed(), message.dimmed());
    }

    /// Print operator hints derived from the manifest.
    pub fn print_manifest_hints(&self, manifest: &Manifest) {
        if self.json_mode {
            return;
        }

        if !manifest.found {
            println!(
                "{} {}",
                "[!]".yellow(),
                "No readable package.json: every reference counts as undeclared".yellow()
            );
        }

        if manifest.private {
            println!(
                "{} {}",
                "[*]".bright_blue(),
                "Project is marked private; internal package names may still be published publicly"
            );
        }

        match manifest.lockfile {
            Some(kind) => println!(
                "{} {}",
                "[.]".dimmed(),
                format!(
                    "{} detected; nested dependencies are not expanded by this scan",
                    kind.file_name()
                )
                .dimmed()
            ),
            None => println!(
                "{} {}",
                "[.]".dimmed(),
                "No lockfile detected; nested dependencies cannot be enumerated".dimmed()
            ),
        }
    }

    /// Print a finding.
    pub fn print_finding(&self, finding: &Finding) {
        if self.json_mode {
            return;
        }

        let label = format_category(finding.category);
        let specifier = finding.specifier.as_deref().unwrap_or("-");

        println!(
            "  {} {} {}",
            label,
            specifier.bright_white().bold(),
            finding.source.dimmed()
        );

        if let Some(ref note) = finding.note {
            println!("        {}", note.dimmed());
        }
    }

    /// Print every finding followed by a summary.
    pub fn print_summary(&self, report: &ScanReport) {
        if self.json_mode {
            return;
        }

        println!();
        if report.findings.is_empty() {
            println!("{}", "No issues found in scanned files.".green());
        } else {
            println!(
                "{}",
                format!("Found {} findings:", report.findings.len()).yellow()
            );
            for finding in &report.findings {
                self.print_finding(finding);
            }
        }

        let risks = report.count(FindingCategory::UndeclaredAndPublic);

        println!();
        println!("{}", "=== Scan Summary ===".bright_cyan());
        println!("  Sources:     {}", report.sources_scanned);
        println!("  References:  {}", report.candidates_checked);

        if risks > 0 {
            println!(
                "  {}",
                format!("POSSIBLE CONFUSION TARGETS: {}", risks).red().bold()
            );
        } else {
            println!("  {}", "No dependency confusion candidates found.".green());
        }

        let unreadable = report.count(FindingCategory::UnreadableSource);
        if unreadable > 0 {
            println!(
                "  {}",
                format!("{} sources could not be read", unreadable).yellow()
            );
        }

        println!();
    }

    /// Create a spinner for the preparation phase.
    pub fn create_spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.json_mode {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Category label with color.
fn format_category(category: FindingCategory) -> colored::ColoredString {
    let label = category.as_str();
    match category {
        FindingCategory::UndeclaredAndPublic => label.red().bold(),
        FindingCategory::RegistryUnresolved => label.magenta(),
        FindingCategory::UndeclaredPrivate => label.yellow(),
        FindingCategory::UnreadableSource => label.blue(),
        FindingCategory::DeclaredAndPublic => label.dimmed(),
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_output_creation() {
        let output = ConsoleOutput::new(true, false);
        assert!(output.verbose);
        assert!(!output.json_mode);
    }

    #[test]
    fn test_json_mode_has_no_spinner() {
        let output = ConsoleOutput::new(false, true);
        assert!(output.create_spinner("Preparing scan").is_none());
    }

    #[test]
    fn test_format_category_keeps_name() {
        colored::control::set_override(false);
        assert_eq!(
            format_category(FindingCategory::UndeclaredAndPublic).to_string(),
            "UNDECLARED_AND_PUBLIC"
        );
        colored::control::unset_override();
    }
}
