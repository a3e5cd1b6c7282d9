//! Per-developer metrics.
//!
//! Every function flattens all tasks of all sprints, keeps developers in
//! first-seen order (among the tasks that pass the metric's filter) and
//! returns one table with developers on the x-axis, except for the two hour
//! breakdowns which return one table per developer.

use metrics_core::calendar::day_span;
use metrics_core::grouping::{
    estimation_error, group_by, mean, percentage, round_to, OrderedMap, Precision,
};
use metrics_core::models::{Dataset, Task, TaskStatus, TaskType};
use metrics_core::table::{DeveloperTable, MetricOutput, MetricTable, Series};

const DEVELOPER_AXIS: &str = "Developer";

// ── Counters ──────────────────────────────────────────────────────────────────

/// Hit/total counter for a single ratio.
#[derive(Debug, Clone, Copy, Default)]
struct Ratio {
    hits: u32,
    total: u32,
}

impl Ratio {
    fn record(&mut self, hit: bool) {
        self.total += 1;
        if hit {
            self.hits += 1;
        }
    }

    fn percent(&self) -> f64 {
        percentage(f64::from(self.hits), f64::from(self.total), Precision::Ratio)
    }
}

/// Count tasks per developer and per label.
fn count_by<'a, L, const N: usize>(
    tasks: impl Iterator<Item = &'a Task>,
    labels: [L; N],
    label_of: impl Fn(&Task) -> L,
) -> OrderedMap<String, [u32; N]>
where
    L: PartialEq + Copy,
{
    let mut counts: OrderedMap<String, [u32; N]> = OrderedMap::new();
    for task in tasks {
        let slot = counts.entry_or_insert_with(task.assigned_to.clone(), || [0; N]);
        if let Some(pos) = labels.iter().position(|l| *l == label_of(task)) {
            slot[pos] += 1;
        }
    }
    counts
}

/// Turn a developer → value map into a single-series table.
fn developer_table<V>(
    title: &str,
    y_label: &str,
    series_name: &str,
    map: &OrderedMap<String, V>,
    value: impl Fn(&V) -> f64,
) -> MetricTable {
    MetricTable::new(title)
        .axes(DEVELOPER_AXIS, y_label)
        .categories(map.keys().cloned().collect())
        .with_series(Series::new(
            series_name,
            map.iter().map(|(_, v)| value(v)).collect(),
        ))
}

fn done_tasks(dataset: &Dataset) -> impl Iterator<Item = &Task> {
    dataset.tasks().filter(|t| t.is_done())
}

// ── Distributions ─────────────────────────────────────────────────────────────

/// Number of To Do / In Progress / Done tasks per developer.
pub fn status_distribution(dataset: &Dataset) -> MetricTable {
    let counts = count_by(dataset.tasks(), TaskStatus::ALL, |t| t.status);
    let mut table = MetricTable::new("Task Status by Developer")
        .axes(DEVELOPER_AXIS, "Tasks")
        .categories(counts.keys().cloned().collect());
    for (i, status) in TaskStatus::ALL.iter().enumerate() {
        table = table.with_series(Series::new(
            status.label(),
            counts.iter().map(|(_, c)| f64::from(c[i])).collect(),
        ));
    }
    table
}

/// Number of Bug / Story / Task items per developer.
pub fn type_distribution(dataset: &Dataset) -> MetricTable {
    let counts = count_by(dataset.tasks(), TaskType::ALL, |t| t.task_type);
    let mut table = MetricTable::new("Task Type by Developer")
        .axes(DEVELOPER_AXIS, "Tasks")
        .categories(counts.keys().cloned().collect());
    for (i, task_type) in TaskType::ALL.iter().enumerate() {
        table = table.with_series(Series::new(
            task_type.label(),
            counts.iter().map(|(_, c)| f64::from(c[i])).collect(),
        ));
    }
    table
}

// ── Estimation quality ────────────────────────────────────────────────────────

/// Share of Done tasks whose actual hours stayed within the estimate.
pub fn estimation_accuracy(dataset: &Dataset) -> MetricTable {
    let mut stats: OrderedMap<String, Ratio> = OrderedMap::new();
    for task in done_tasks(dataset) {
        stats
            .entry(task.assigned_to.clone())
            .record(task.within_estimate());
    }
    developer_table(
        "Estimation Accuracy (Actual ≤ Estimated)",
        "Accuracy (%)",
        "Accurate Estimates",
        &stats,
        Ratio::percent,
    )
}

/// Share of Done tasks whose actual hours exceeded the estimate.
pub fn underestimation_rate(dataset: &Dataset) -> MetricTable {
    let mut stats: OrderedMap<String, Ratio> = OrderedMap::new();
    for task in done_tasks(dataset) {
        stats
            .entry(task.assigned_to.clone())
            .record(!task.within_estimate());
    }
    developer_table(
        "Underestimated Tasks (Actual > Estimated)",
        "Underestimation (%)",
        "Underestimated (%)",
        &stats,
        Ratio::percent,
    )
}

/// Estimation errors of Done tasks with a positive estimate, per developer.
fn errors_by_developer(dataset: &Dataset) -> OrderedMap<String, Vec<f64>> {
    let mut errors: OrderedMap<String, Vec<f64>> = OrderedMap::new();
    for task in done_tasks(dataset) {
        if let Some(error) = estimation_error(task) {
            errors.entry(task.assigned_to.clone()).push(error);
        }
    }
    errors
}

/// Mean relative estimation error (%) of Done tasks per developer.
pub fn mean_estimation_error(dataset: &Dataset) -> MetricTable {
    developer_table(
        "Mean Estimation Error per Developer (%)",
        "Estimation Error (%)",
        "Mean Estimation Error",
        &errors_by_developer(dataset),
        |errors| round_to(mean(errors), 2),
    )
}

/// Mean estimation error per developer, split by task type.
///
/// One series per type; a developer with no qualifying task of a type gets 0.
pub fn error_by_type(dataset: &Dataset) -> MetricTable {
    let mut errors: OrderedMap<String, OrderedMap<TaskType, Vec<f64>>> = OrderedMap::new();
    for task in done_tasks(dataset) {
        if let Some(error) = estimation_error(task) {
            errors
                .entry(task.assigned_to.clone())
                .entry(task.task_type)
                .push(error);
        }
    }

    let mut table = MetricTable::new("Mean Estimation Error by Task Type (Done tasks only)")
        .axes(DEVELOPER_AXIS, "Estimation Error (%)")
        .categories(errors.keys().cloned().collect());
    for task_type in TaskType::ALL {
        let values = errors
            .iter()
            .map(|(_, by_type)| {
                by_type
                    .get(&task_type)
                    .map(|e| round_to(mean(e), 2))
                    .unwrap_or(0.0)
            })
            .collect();
        table = table.with_series(Series::new(task_type.label(), values));
    }
    table
}

/// For In Progress tasks: share still within estimate vs. share already over.
///
/// The two values for a developer sum to 100.
pub fn in_progress_risk(dataset: &Dataset) -> MetricTable {
    let mut stats: OrderedMap<String, Ratio> = OrderedMap::new();
    for task in dataset
        .tasks()
        .filter(|t| t.status == TaskStatus::InProgress)
    {
        stats
            .entry(task.assigned_to.clone())
            .record(task.within_estimate());
    }

    let on_time: Vec<f64> = stats.iter().map(|(_, r)| r.percent()).collect();
    // Derived from the rounded on-time share so each pair sums to exactly 100.
    let exceeded = stats
        .iter()
        .zip(&on_time)
        .map(|((_, r), on_time)| {
            if r.total == 0 {
                0.0
            } else {
                round_to(100.0 - on_time, 2)
            }
        })
        .collect();

    MetricTable::new("Estimation Accuracy for In Progress Tasks")
        .axes(DEVELOPER_AXIS, "Percentage of Tasks (%)")
        .categories(stats.keys().cloned().collect())
        .with_series(Series::new("On Time", on_time))
        .with_series(Series::new("Exceeded Estimate", exceeded))
}

// ── Timing ────────────────────────────────────────────────────────────────────

/// Mean days from creation to closure for Done tasks with a close date.
pub fn avg_closure_time(dataset: &Dataset) -> MetricTable {
    let mut spans: OrderedMap<String, Vec<f64>> = OrderedMap::new();
    for task in done_tasks(dataset) {
        if let Some(closed_at) = task.closed_at {
            spans
                .entry(task.assigned_to.clone())
                .push(day_span(task.created_at, closed_at));
        }
    }
    developer_table(
        "Average Closure Time (Done Tasks)",
        "Average Days to Close",
        "Average Days",
        &spans,
        |days| round_to(mean(days), 2),
    )
}

// ── Hour breakdowns ───────────────────────────────────────────────────────────

fn hours_breakdown(
    dataset: &Dataset,
    status: TaskStatus,
    title: &str,
    actual_label: &str,
) -> MetricOutput {
    let groups = group_by(dataset.tasks().filter(|t| t.status == status), |t| {
        t.assigned_to.clone()
    });

    let tables = groups
        .into_iter()
        .map(|(developer, tasks)| {
            let table = MetricTable::new(format!("{} - {}", title, developer))
                .axes("Task ID", "Hours")
                .categories(tasks.iter().map(|t| t.id.to_string()).collect())
                .with_series(Series::new(
                    "Estimated Hours",
                    tasks.iter().map(|t| t.estimated_hours).collect(),
                ))
                .with_series(Series::new(
                    actual_label,
                    tasks.iter().map(|t| t.actual_hours).collect(),
                ));
            DeveloperTable { developer, table }
        })
        .collect();

    MetricOutput::Breakdown { tables }
}

/// Estimated vs. actual hours of every Done task, one table per developer.
pub fn hours_done(dataset: &Dataset) -> MetricOutput {
    hours_breakdown(
        dataset,
        TaskStatus::Done,
        "Estimated vs Actual Hours (Done Tasks)",
        "Actual Hours",
    )
}

/// Estimated vs. logged hours of every In Progress task, one table per developer.
pub fn hours_in_progress(dataset: &Dataset) -> MetricOutput {
    hours_breakdown(
        dataset,
        TaskStatus::InProgress,
        "Estimated vs Logged Hours (In Progress Tasks)",
        "Logged Hours",
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
