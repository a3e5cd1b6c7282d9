//! Dataset sources and record-level ingest.
//!
//! A [`DatasetSource`] yields the raw JSON document; [`ingest_value`] turns it
//! into a typed [`Dataset`], validating every sprint and task on its own so a
//! single bad record can be reported precisely.

use std::io::Read;
use std::path::PathBuf;

use metrics_core::error::{MetricsError, Result};
use metrics_core::models::{Dataset, Sprint, Task};
use serde_json::Value;
use tracing::{debug, warn};

// ── Sources ───────────────────────────────────────────────────────────────────

/// Anything that can hand over the raw dataset document.
///
/// `Ok(None)` means the source answered but had nothing to give.
pub trait DatasetSource {
    /// Short description for log and error messages.
    fn describe(&self) -> String;

    fn fetch(&mut self) -> Result<Option<Value>>;
}

/// Reads the dataset from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&mut self) -> Result<Option<Value>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| MetricsError::FileRead {
                path: self.path.clone(),
                source,
            })?;
        parse_document(&content)
    }
}

/// Reads the dataset from any byte stream, typically standard input.
pub struct ReaderSource<R> {
    label: String,
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(label: impl Into<String>, reader: R) -> Self {
        Self {
            label: label.into(),
            reader,
        }
    }
}

impl<R: Read> DatasetSource for ReaderSource<R> {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn fetch(&mut self) -> Result<Option<Value>> {
        let mut content = String::new();
        self.reader.read_to_string(&mut content)?;
        parse_document(&content)
    }
}

/// Blank documents and a bare `null` count as "no data".
fn parse_document(content: &str) -> Result<Option<Value>> {
    if content.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(content)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

// ── Ingest ────────────────────────────────────────────────────────────────────

/// How malformed records are treated during ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Skip the offending record, log it, and keep going.
    #[default]
    Lenient,
    /// Fail on the first offending record.
    Strict,
}

/// A typed dataset plus the records that had to be left out.
#[derive(Debug)]
pub struct IngestReport {
    pub dataset: Dataset,
    /// One [`MetricsError::MalformedRecord`] per rejected sprint or task.
    pub rejected: Vec<MetricsError>,
}

/// Fetch from `source` and ingest the result.
///
/// Any fetch failure, or a source with nothing to give, is reported as
/// [`MetricsError::DataUnavailable`].
pub fn load_dataset(source: &mut dyn DatasetSource, mode: IngestMode) -> Result<IngestReport> {
    let label = source.describe();
    let value = match source.fetch() {
        Ok(Some(value)) => value,
        Ok(None) => {
            return Err(MetricsError::DataUnavailable(format!(
                "{} returned no data",
                label
            )))
        }
        Err(e) => return Err(MetricsError::DataUnavailable(format!("{}: {}", label, e))),
    };
    debug!("fetched dataset from {}", label);
    ingest_value(value, mode)
}

/// Convert a raw JSON document into a [`Dataset`].
///
/// The top level must be an object with a `sprints` array; anything else
/// fails regardless of `mode`.
pub fn ingest_value(value: Value, mode: IngestMode) -> Result<IngestReport> {
    let Value::Object(mut root) = value else {
        return Err(MetricsError::malformed("dataset", "expected a JSON object"));
    };
    let sprints = match root.remove("sprints") {
        Some(Value::Array(sprints)) => sprints,
        Some(_) => return Err(MetricsError::malformed("dataset", "`sprints` is not an array")),
        None => return Err(MetricsError::malformed("dataset", "missing `sprints` array")),
    };

    let mut dataset = Dataset::default();
    let mut rejected = Vec::new();

    for (i, raw_sprint) in sprints.into_iter().enumerate() {
        let location = format!("sprints[{}]", i);
        match ingest_sprint(raw_sprint, &location, mode, &mut rejected) {
            Ok(sprint) => dataset.sprints.push(sprint),
            Err(e) => reject(e, mode, &mut rejected)?,
        }
    }

    debug!(
        "ingested {} sprint(s), {} task(s), {} rejected record(s)",
        dataset.sprints.len(),
        dataset.task_count(),
        rejected.len()
    );

    Ok(IngestReport { dataset, rejected })
}

/// Parse one sprint header and its tasks. A bad header rejects the sprint;
/// a bad task only rejects that task.
fn ingest_sprint(
    raw: Value,
    location: &str,
    mode: IngestMode,
    rejected: &mut Vec<MetricsError>,
) -> Result<Sprint> {
    let Value::Object(mut fields) = raw else {
        return Err(MetricsError::malformed(location, "expected a JSON object"));
    };
    let raw_tasks = match fields.remove("tasks") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(tasks)) => tasks,
        Some(_) => return Err(MetricsError::malformed(location, "`tasks` is not an array")),
    };

    let mut sprint: Sprint = serde_json::from_value(Value::Object(fields))
        .map_err(|e| MetricsError::malformed(location, e))?;

    for (j, raw_task) in raw_tasks.into_iter().enumerate() {
        let task_location = format!("{}.tasks[{}]", location, j);
        match parse_task(raw_task, &task_location) {
            Ok(task) => sprint.tasks.push(task),
            Err(e) => reject(e, mode, rejected)?,
        }
    }

    Ok(sprint)
}

fn parse_task(raw: Value, location: &str) -> Result<Task> {
    let task: Task =
        serde_json::from_value(raw).map_err(|e| MetricsError::malformed(location, e))?;
    task.validate()
        .map_err(|reason| MetricsError::malformed(location, reason))?;
    Ok(task)
}

/// Record a rejected record in lenient mode, propagate it in strict mode.
fn reject(error: MetricsError, mode: IngestMode, rejected: &mut Vec<MetricsError>) -> Result<()> {
    match mode {
        IngestMode::Strict => Err(error),
        IngestMode::Lenient => {
            warn!("skipping record: {}", error);
            rejected.push(error);
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
