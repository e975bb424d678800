use crate::analysis::fragmentation;
use crate::models::{AnalysisResults, Severity};
use clap::ValueEnum;
use snafu::{ResultExt, Snafu};
use std::io::{self, IsTerminal, Write};

#[derive(Debug, Snafu)]
pub enum ReporterError {
    #[snafu(display("Failed to write output: {}", source))]
    OutputError { source: std::io::Error },
}

type Result<T, E = ReporterError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal
    Auto,
    /// Always emit color escapes
    Always,
    /// Never emit color escapes
    Never,
}

const SEPARATOR_WIDTH: usize = 121;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// ANSI prefix for a severity. Pure: the reporter applies it inline rather
/// than mutating any shared terminal state.
fn severity_style(severity: Severity) -> &'static str {
    match severity {
        Severity::High => RED,
        Severity::Medium => YELLOW,
        Severity::Low => "",
    }
}

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(mode: ColorMode) -> Self {
        let color = match mode {
            ColorMode::Auto => io::stdout().is_terminal(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        };
        Self { color }
    }

    pub fn report(&self, results: &AnalysisResults) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.write_report(&mut handle, results)
    }

    fn write_report<W: Write>(&self, out: &mut W, results: &AnalysisResults) -> Result<()> {
        self.write_table(out, results)?;
        self.write_summary(out, results)?;
        self.write_details(out, results)?;
        Ok(())
    }

    fn write_table<W: Write>(&self, out: &mut W, results: &AnalysisResults) -> Result<()> {
        writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH)).context(OutputSnafu)?;
        writeln!(
            out,
            "{:<30} {:<30} {:<15} {:>10} {:>8} {:>22}",
            "Table", "Index", "Type", "Frag %", "Pages", "Recommendation"
        )
        .context(OutputSnafu)?;
        writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH)).context(OutputSnafu)?;

        // Rows stay in database order (worst fragmentation first).
        for record in &results.records {
            let recommendation = fragmentation::classify(record);
            let style = self.apply(severity_style(fragmentation::severity(
                record.fragmentation_percent,
            )));
            writeln!(
                out,
                "{}{:<30} {:<30} {:<15} {:>10.2} {:>8} {:>22}{}",
                style,
                record.table_name,
                record.index_name,
                record.index_type,
                record.fragmentation_percent,
                record.page_count,
                recommendation.as_str(),
                self.reset_for(style),
            )
            .context(OutputSnafu)?;
        }

        writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH)).context(OutputSnafu)?;
        Ok(())
    }

    fn write_summary<W: Write>(&self, out: &mut W, results: &AnalysisResults) -> Result<()> {
        let summary = &results.summary;

        writeln!(out, "\nSummary:").context(OutputSnafu)?;
        writeln!(
            out,
            "  Indexes needing REBUILD: {}",
            summary.needs_rebuild.len()
        )
        .context(OutputSnafu)?;
        writeln!(
            out,
            "  Indexes needing REORGANIZE: {}",
            summary.needs_reorganize.len()
        )
        .context(OutputSnafu)?;
        writeln!(
            out,
            "  Heap tables needing attention: {}",
            summary.heap_tables.len()
        )
        .context(OutputSnafu)?;
        Ok(())
    }

    fn write_details<W: Write>(&self, out: &mut W, results: &AnalysisResults) -> Result<()> {
        let summary = &results.summary;

        if summary.is_empty() {
            let style = self.apply(GREEN);
            writeln!(
                out,
                "\n{}All indexes are healthy. No maintenance required.{}",
                style,
                self.reset_for(style)
            )
            .context(OutputSnafu)?;
            return Ok(());
        }

        writeln!(out, "\nMaintenance recommendations:").context(OutputSnafu)?;
        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH)).context(OutputSnafu)?;

        if !summary.heap_tables.is_empty() {
            let style = self.apply(RED);
            writeln!(
                out,
                "\n{}[HIGH PRIORITY] Heap tables need a clustered index:{}",
                style,
                self.reset_for(style)
            )
            .context(OutputSnafu)?;
            for record in &summary.heap_tables {
                writeln!(
                    out,
                    "  - {} (fragmentation: {:.2}%, pages: {})",
                    record.table_name, record.fragmentation_percent, record.page_count
                )
                .context(OutputSnafu)?;
                writeln!(
                    out,
                    "    Suggested: {}",
                    fragmentation::create_clustered_index_command(record)
                )
                .context(OutputSnafu)?;
            }
        }

        if !summary.needs_rebuild.is_empty() {
            let style = self.apply(YELLOW);
            writeln!(
                out,
                "\n{}[REBUILD] Fragmentation > 30% with more than 1000 pages:{}",
                style,
                self.reset_for(style)
            )
            .context(OutputSnafu)?;
            for record in &summary.needs_rebuild {
                writeln!(
                    out,
                    "  - {}.{} (fragmentation: {:.2}%, pages: {})",
                    record.table_name,
                    record.index_name,
                    record.fragmentation_percent,
                    record.page_count
                )
                .context(OutputSnafu)?;
                writeln!(out, "    Run: {}", fragmentation::rebuild_command(record))
                    .context(OutputSnafu)?;
            }
        }

        if !summary.needs_reorganize.is_empty() {
            let style = self.apply(CYAN);
            writeln!(
                out,
                "\n{}[REORGANIZE] Fragmentation 5-30% with more than 1000 pages:{}",
                style,
                self.reset_for(style)
            )
            .context(OutputSnafu)?;
            for record in &summary.needs_reorganize {
                writeln!(
                    out,
                    "  - {}.{} (fragmentation: {:.2}%, pages: {})",
                    record.table_name,
                    record.index_name,
                    record.fragmentation_percent,
                    record.page_count
                )
                .context(OutputSnafu)?;
                writeln!(
                    out,
                    "    Run: {}",
                    fragmentation::reorganize_command(record)
                )
                .context(OutputSnafu)?;
            }
        }

        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH)).context(OutputSnafu)?;
        Ok(())
    }

    fn apply(&self, style: &'static str) -> &'static str {
        if self.color {
            style
        } else {
            ""
        }
    }

    fn reset_for(&self, style: &str) -> &'static str {
        if style.is_empty() {
            ""
        } else {
            RESET
        }
    }
}
