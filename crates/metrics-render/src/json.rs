//! One JSON document for the whole run, keyed by metric id.

use std::io::Write;

use metrics_core::error::{MetricsError, Result};
use metrics_core::table::MetricOutput;
use metrics_data::analysis::AnalysisSummary;
use metrics_data::registry::MetricId;
use serde_json::{json, Map, Value};

use crate::MetricSink;

/// Collects every metric and writes the document on [`MetricSink::finish`].
///
/// Keys under `metrics` and `unavailable` keep publication order.
///
/// ```text
/// {
///   "metrics": { "<id>": { "kind": "table", "table": { ... } }, ... },
///   "unavailable": { "<id>": "<error>" },
///   "summary": { "sprints": 1, ... }
/// }
/// ```
pub struct JsonSink<W: Write> {
    out: W,
    metrics: Map<String, Value>,
    unavailable: Map<String, Value>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            metrics: Map::new(),
            unavailable: Map::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricSink for JsonSink<W> {
    fn publish(&mut self, id: MetricId, output: &MetricOutput) -> Result<()> {
        self.metrics
            .insert(id.as_str().to_string(), serde_json::to_value(output)?);
        Ok(())
    }

    fn unavailable(&mut self, id: MetricId, error: &MetricsError) -> Result<()> {
        self.unavailable
            .insert(id.as_str().to_string(), Value::String(error.to_string()));
        Ok(())
    }

    fn finish(&mut self, summary: &AnalysisSummary) -> Result<()> {
        let document = json!({
            "metrics": std::mem::take(&mut self.metrics),
            "unavailable": std::mem::take(&mut self.unavailable),
            "summary": summary,
        });
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
