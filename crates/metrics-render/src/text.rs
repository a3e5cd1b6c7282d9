//! Plain-text tables: one row per category, one column per series.

use std::io::Write;

use metrics_core::error::{MetricsError, Result};
use metrics_core::formatting::format_value;
use metrics_core::table::{MetricOutput, MetricTable};
use metrics_data::analysis::AnalysisSummary;
use metrics_data::registry::MetricId;
use unicode_width::UnicodeWidthStr;

use crate::MetricSink;

/// Shown where a series has no value for a category.
const MISSING: &str = "-";
const COLUMN_GAP: &str = "  ";

/// Writes aligned tables to any writer, typically standard output.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_table(&mut self, table: &MetricTable) -> Result<()> {
        writeln!(self.out, "{}", table.title)?;
        if table.is_empty() {
            writeln!(self.out, "  (no data)")?;
            return Ok(());
        }

        let header: Vec<String> = std::iter::once(table.x_label.clone())
            .chain(table.series.iter().map(|s| s.name.clone()))
            .collect();

        let rows: Vec<Vec<String>> = table
            .categories
            .iter()
            .enumerate()
            .map(|(i, category)| {
                std::iter::once(category.clone())
                    .chain(table.series.iter().map(|s| {
                        s.value_at(i)
                            .map(format_value)
                            .unwrap_or_else(|| MISSING.to_string())
                    }))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|col| {
                std::iter::once(&header[col])
                    .chain(rows.iter().map(|r| &r[col]))
                    .map(|cell| cell.width())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        writeln!(self.out, "{}", render_row(&header, &widths))?;
        let rule: usize = widths.iter().sum::<usize>() + COLUMN_GAP.len() * (widths.len() - 1);
        writeln!(self.out, "{}", "-".repeat(rule))?;
        for row in &rows {
            writeln!(self.out, "{}", render_row(row, &widths))?;
        }
        if !table.y_label.is_empty() {
            writeln!(self.out, "  ({})", table.y_label)?;
        }
        Ok(())
    }
}

/// First column left-aligned, value columns right-aligned.
fn render_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(col, (cell, &width))| {
            let fill = " ".repeat(width.saturating_sub(cell.width()));
            if col == 0 {
                format!("{}{}", cell, fill)
            } else {
                format!("{}{}", fill, cell)
            }
        })
        .collect();
    padded.join(COLUMN_GAP).trim_end().to_string()
}

impl<W: Write> MetricSink for TextSink<W> {
    fn publish(&mut self, id: MetricId, output: &MetricOutput) -> Result<()> {
        writeln!(self.out, "== {} ==", id)?;
        match output {
            MetricOutput::Table { table } => self.write_table(table)?,
            MetricOutput::Breakdown { tables } => {
                if tables.is_empty() {
                    writeln!(self.out, "  (no data)")?;
                }
                for entry in tables {
                    self.write_table(&entry.table)?;
                }
            }
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn unavailable(&mut self, id: MetricId, error: &MetricsError) -> Result<()> {
        writeln!(self.out, "== {} ==", id)?;
        writeln!(self.out, "  unavailable: {}", error)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self, summary: &AnalysisSummary) -> Result<()> {
        writeln!(
            self.out,
            "{} sprint(s), {} task(s), {} reclassified, {} rejected; {} metric(s) computed, {} unavailable",
            summary.sprints,
            summary.tasks,
            summary.reclassified,
            summary.rejected,
            summary.computed,
            summary.unavailable
        )?;
        self.out.flush()?;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
