use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::calendar::parse_timestamp;

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started.
    #[serde(rename = "To Do", alias = "ToDo", alias = "todo", alias = "to-do")]
    ToDo,
    /// Work has begun (or hours have been logged against it).
    #[serde(
        rename = "In Progress",
        alias = "InProgress",
        alias = "in-progress",
        alias = "in_progress"
    )]
    InProgress,
    /// Closed.
    #[serde(rename = "Done", alias = "done")]
    Done,
}

impl TaskStatus {
    /// All statuses in display order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    /// Human-readable label, identical to the wire spelling.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(alias = "bug")]
    Bug,
    #[serde(alias = "story")]
    Story,
    #[serde(alias = "task")]
    Task,
}

impl TaskType {
    /// All task types in display order.
    pub const ALL: [TaskType; 3] = [TaskType::Bug, TaskType::Story, TaskType::Task];

    pub fn label(self) -> &'static str {
        match self {
            TaskType::Bug => "Bug",
            TaskType::Story => "Story",
            TaskType::Task => "Task",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque task identifier. Source systems use either numbers or keys such as
/// `"PROJ-12"`; it is only ever used as a display label.
///
/// Whole-valued floats (`3.0`) read as numbers. Integers beyond `i64` and
/// fractional floats are kept as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Signed(i64),
            Unsigned(u64),
            Float(f64),
            Text(String),
        }

        // Largest float range in which every whole value maps onto an i64.
        const EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Signed(n) => TaskId::Number(n),
            RawId::Unsigned(n) => TaskId::Text(n.to_string()),
            RawId::Float(f) if f.fract() == 0.0 && f.abs() <= EXACT_FLOAT => {
                TaskId::Number(f as i64)
            }
            RawId::Float(f) => TaskId::Text(f.to_string()),
            RawId::Text(s) => TaskId::Text(s),
        })
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => f.write_str(s),
        }
    }
}

/// A single unit of tracked work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Display label for the task.
    pub id: TaskId,
    /// Developer the task is assigned to.
    pub assigned_to: String,
    /// Current workflow state. Only the normalizer changes it after ingest.
    pub status: TaskStatus,
    /// Bug, story or plain task.
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Planning estimate in hours.
    pub estimated_hours: f64,
    /// Hours logged against the task.
    pub actual_hours: f64,
    /// When the task was created.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// When the task was closed, if it has been.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// `true` when the logged hours stayed within the estimate.
    pub fn within_estimate(&self) -> bool {
        self.actual_hours <= self.estimated_hours
    }

    /// Check the invariants serde cannot express.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.assigned_to.trim().is_empty() {
            return Err("`assigned_to` is empty".to_string());
        }
        for (field, value) in [
            ("estimated_hours", self.estimated_hours),
            ("actual_hours", self.actual_hours),
        ] {
            if !value.is_finite() {
                return Err(format!("`{}` is not a finite number", field));
            }
            if value < 0.0 {
                return Err(format!("`{}` is negative ({})", field, value));
            }
        }
        Ok(())
    }
}

/// A bounded iteration containing tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    /// Display label, also used as a category key.
    pub name: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start_date: DateTime<Utc>,
    /// Lateness deadline for tasks closed in this sprint.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// The full tracked-work corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub sprints: Vec<Sprint>,
}

impl Dataset {
    pub fn new(sprints: Vec<Sprint>) -> Self {
        Self { sprints }
    }

    /// Every task of every sprint, in sprint then task order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.sprints.iter().flat_map(|s| s.tasks.iter())
    }

    pub fn task_count(&self) -> usize {
        self.sprints.iter().map(|s| s.tasks.len()).sum()
    }
}

// ── Timestamp deserialization ─────────────────────────────────────────────────

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp \"{}\"", raw)))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp \"{}\"", s))),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
