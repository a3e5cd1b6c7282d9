//! Dataset builders shared by the metric tests.

use metrics_core::calendar::parse_timestamp;
use metrics_core::models::{Dataset, Sprint, Task, TaskId, TaskStatus, TaskType};

pub(crate) struct TaskSpec {
    pub id: i64,
    pub dev: &'static str,
    pub status: TaskStatus,
    pub task_type: TaskType,
    pub estimated: f64,
    pub actual: f64,
    pub created: &'static str,
    pub closed: Option<&'static str>,
}

impl Default for TaskSpec {
    fn default() -> Self {
        Self {
            id: 1,
            dev: "Ana",
            status: TaskStatus::ToDo,
            task_type: TaskType::Task,
            estimated: 1.0,
            actual: 0.0,
            created: "2024-01-02T09:00:00Z",
            closed: None,
        }
    }
}

pub(crate) fn task(spec: TaskSpec) -> Task {
    Task {
        id: TaskId::Number(spec.id),
        assigned_to: spec.dev.to_string(),
        status: spec.status,
        task_type: spec.task_type,
        estimated_hours: spec.estimated,
        actual_hours: spec.actual,
        created_at: parse_timestamp(spec.created).unwrap(),
        closed_at: spec.closed.map(|c| parse_timestamp(c).unwrap()),
    }
}

/// A sprint running 2024-01-01 to 2024-01-14 (midnight UTC).
pub(crate) fn sprint(name: &str, tasks: Vec<Task>) -> Sprint {
    Sprint {
        name: name.to_string(),
        start_date: parse_timestamp("2024-01-01").unwrap(),
        end_date: parse_timestamp("2024-01-14").unwrap(),
        tasks,
    }
}

pub(crate) fn dataset(sprints: Vec<Sprint>) -> Dataset {
    Dataset::new(sprints)
}
