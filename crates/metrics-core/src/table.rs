//! Uniform metric output handed to presentation sinks.

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// One named numeric series aligned with a table's categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    /// Index of the category that `values[0]` belongs to. Non-zero only for
    /// series that start part-way along the category axis.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub offset: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            offset: 0,
        }
    }

    /// A series whose first value belongs to category `offset`.
    pub fn starting_at(name: impl Into<String>, offset: usize, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            offset,
        }
    }

    /// Value for category `index`, `None` where the series has no point.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(self.offset)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Categories on the x-axis plus one or more aligned series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl MetricTable {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            categories: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Convenience lookup: the value of `series` at `category`.
    pub fn value(&self, series: &str, category: &str) -> Option<f64> {
        let index = self.categories.iter().position(|c| c == category)?;
        self.series_named(series)?.value_at(index)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Reject tables carrying NaN or infinite values.
    pub fn ensure_finite(&self, metric: &str) -> Result<()> {
        let all_finite = self
            .series
            .iter()
            .all(|s| s.values.iter().all(|v| v.is_finite()));
        if all_finite {
            Ok(())
        } else {
            Err(MetricsError::NonFiniteValue {
                metric: metric.to_string(),
            })
        }
    }
}

/// One table for a developer within a per-developer breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperTable {
    pub developer: String,
    pub table: MetricTable,
}

/// Result of a single metric computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricOutput {
    /// One table for the whole dataset.
    Table { table: MetricTable },
    /// One table per developer, in first-seen developer order.
    Breakdown { tables: Vec<DeveloperTable> },
}

impl MetricOutput {
    /// Iterate every table contained in this output.
    pub fn tables(&self) -> Box<dyn Iterator<Item = &MetricTable> + '_> {
        match self {
            MetricOutput::Table { table } => Box::new(std::iter::once(table)),
            MetricOutput::Breakdown { tables } => Box::new(tables.iter().map(|t| &t.table)),
        }
    }

    pub fn ensure_finite(&self, metric: &str) -> Result<()> {
        self.tables().try_for_each(|t| t.ensure_finite(metric))
    }

    /// The single table, if this is not a breakdown.
    pub fn as_table(&self) -> Option<&MetricTable> {
        match self {
            MetricOutput::Table { table } => Some(table),
            MetricOutput::Breakdown { .. } => None,
        }
    }
}

impl From<MetricTable> for MetricOutput {
    fn from(table: MetricTable) -> Self {
        MetricOutput::Table { table }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
