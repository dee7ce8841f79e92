//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use drs_hash::ChecksumAlgorithm;
use drs_net::SUPPORTED_SCHEMES;
use drs_types::{Outcome, Report, ResolutionIssue};
use std::io;

/// Output renderer for CLI results
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self {
            json_output,
            term: Term::stdout(),
        }
    }

    /// Render the download report summary
    pub fn render_report(&self, report: &Report) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        if report.entries.is_empty() {
            println!("No objects to download.");
        } else {
            println!("{}", self.report_table(report));
        }

        if !report.issues.is_empty() {
            println!();
            println!("Bundle issues ({}):", report.issues.len());
            for issue in &report.issues {
                println!("  • {}", self.style_issue(issue));
            }
        }

        println!();
        println!("{}", self.summary_line(report));
        Ok(())
    }

    /// Render the supported URL schemes and checksum algorithms
    pub fn render_schemes(&self) -> io::Result<()> {
        let algorithms: Vec<&str> = ChecksumAlgorithm::ALL
            .into_iter()
            .map(ChecksumAlgorithm::as_str)
            .collect();

        if self.json_output {
            let json = serde_json::json!({
                "url_schemes": SUPPORTED_SCHEMES,
                "checksum_algorithms": algorithms,
            });
            let json = serde_json::to_string_pretty(&json).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Kind").add_attribute(Attribute::Bold),
            Cell::new("Supported").add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("URL schemes"),
            Cell::new(SUPPORTED_SCHEMES.join(", ")),
        ]);
        table.add_row(vec![
            Cell::new("Checksum algorithms"),
            Cell::new(algorithms.join(", ")),
        ]);
        println!("{table}");
        Ok(())
    }

    fn report_table(&self, report: &Report) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Object").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Checksum").add_attribute(Attribute::Bold),
            Cell::new("Attempts").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

        for entry in &report.entries {
            table.add_row(vec![
                Cell::new(&entry.object_id),
                Cell::new(entry.name.as_deref().unwrap_or("-")),
                Cell::new(format_size(entry.bytes_written)),
                Cell::new(entry.checksum.to_string()),
                Cell::new(entry.attempts),
                format_outcome(&entry.outcome),
            ]);
        }
        table
    }

    fn summary_line(&self, report: &Report) -> String {
        let line = format!(
            "{} succeeded, {} failed",
            report.succeeded, report.failed
        );
        if !self.supports_color() {
            return line;
        }
        let style = if report.is_success() {
            Style::new().green().bold()
        } else {
            Style::new().red().bold()
        };
        style.apply_to(line).to_string()
    }

    fn style_issue(&self, issue: &ResolutionIssue) -> String {
        let text = issue.to_string();
        if !self.supports_color() {
            return text;
        }
        let style = if issue.is_error() {
            Style::new().red()
        } else {
            Style::new().yellow()
        };
        style.apply_to(text).to_string()
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

fn format_outcome(outcome: &Outcome) -> Cell {
    match outcome {
        Outcome::Succeeded => Cell::new("Succeeded").fg(Color::Green),
        Outcome::Failed { reason } => Cell::new(format!("Failed: {reason}")).fg(Color::Red),
        Outcome::Pending => Cell::new("Pending").fg(Color::Yellow),
    }
}

/// Format byte size in human readable format
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
