//! Output formatters for suite results
//!
//! Provides table, JSON, CSV and one-line summary output.

use anyhow::Context;
use std::io::Write;
use std::path::Path;

use crate::models::{TestOutcome, TestRecord};
use crate::results::ResultSnapshot;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn with_color(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Format a single test record
    pub fn format_record(&self, record: &TestRecord) -> String {
        match self.format {
            OutputFormat::Table => self.format_record_table(record),
            OutputFormat::Json => serde_json::to_string(record).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(record).unwrap_or_default(),
            OutputFormat::Csv => self.format_record_csv(record),
            OutputFormat::Summary => self.format_record_summary(record),
        }
    }

    fn outcome_label(&self, outcome: TestOutcome) -> String {
        let label = format!("{} {:7}", outcome.symbol(), outcome.to_string());
        if !self.colorize {
            return label;
        }
        let color = match outcome {
            TestOutcome::Passed => "32",
            TestOutcome::Failed | TestOutcome::Errored => "31",
            TestOutcome::TimedOut => "33",
        };
        format!("\x1b[{color}m{label}\x1b[0m")
    }

    fn format_record_table(&self, record: &TestRecord) -> String {
        let mut line = format!(
            "{:48} {} [{:>5}ms]",
            record.selector,
            self.outcome_label(record.outcome),
            record.elapsed_ms
        );
        if let Some(detail) = &record.detail {
            line.push_str(&format!(" {detail}"));
        }
        line
    }

    fn format_record_csv(&self, record: &TestRecord) -> String {
        format!(
            "{},{},{},\"{}\"",
            record.selector,
            record.outcome,
            record.elapsed_ms,
            record.detail.as_deref().unwrap_or("").replace('"', "\"\"")
        )
    }

    fn format_record_summary(&self, record: &TestRecord) -> String {
        format!(
            "{} {} ({}ms)",
            record.outcome.symbol(),
            record.selector,
            record.elapsed_ms
        )
    }

    /// Format a suite snapshot
    pub fn format_snapshot(&self, snapshot: &ResultSnapshot) -> String {
        match self.format {
            OutputFormat::Table => self.format_snapshot_table(snapshot),
            OutputFormat::Json => serde_json::to_string(snapshot).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(snapshot).unwrap_or_default(),
            OutputFormat::Csv => self.format_snapshot_csv(snapshot),
            OutputFormat::Summary => self.format_snapshot_brief(snapshot),
        }
    }

    fn format_snapshot_table(&self, snapshot: &ResultSnapshot) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!("║  Suite {:62}║\n", snapshot.suite));
        output.push_str("╠══════════════════════════════════════════════════════════════════════╣\n");

        for record in snapshot.sorted_records() {
            output.push_str(&format!("  {}\n", self.format_record_table(record)));
        }

        output.push_str("╠══════════════════════════════════════════════════════════════════════╣\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", snapshot.passed)
        } else {
            snapshot.passed.to_string()
        };
        let fail_str = if self.colorize && snapshot.failure_count() > 0 {
            format!("\x1b[31m{}\x1b[0m", snapshot.failure_count())
        } else {
            snapshot.failure_count().to_string()
        };

        output.push_str(&format!(
            "  Total: {} | Pass: {} | Fail: {} (timeouts: {}) | Error: {} | Pending: {}\n",
            snapshot.total, pass_str, fail_str, snapshot.timed_out, snapshot.errors, snapshot.pending
        ));
        output.push_str(&format!(
            "  Pass Rate: {:5.1}% | Duration: {}ms{}\n",
            snapshot.pass_rate(),
            snapshot.duration_ms,
            if snapshot.complete { "" } else { " | INCOMPLETE" }
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_snapshot_csv(&self, snapshot: &ResultSnapshot) -> String {
        let mut output = String::new();
        output.push_str("selector,outcome,elapsed_ms,detail\n");
        for record in snapshot.sorted_records() {
            output.push_str(&self.format_record_csv(record));
            output.push('\n');
        }
        output
    }

    fn format_snapshot_brief(&self, snapshot: &ResultSnapshot) -> String {
        format!(
            "{}: {}/{} passed, {} failures, {} errors ({:.1}%) in {}ms{}",
            snapshot.suite,
            snapshot.passed,
            snapshot.total,
            snapshot.failure_count(),
            snapshot.errors,
            snapshot.pass_rate(),
            snapshot.duration_ms,
            if snapshot.complete {
                String::new()
            } else {
                format!(", {} pending", snapshot.pending)
            }
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Write a snapshot to a file
pub fn write_results_to_file(
    path: impl AsRef<Path>,
    snapshot: &ResultSnapshot,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let formatter = ResultFormatter::new(format).no_color();
    let content = formatter.format_snapshot(snapshot);

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
