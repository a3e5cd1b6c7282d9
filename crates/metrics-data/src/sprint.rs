//! Per-sprint metrics.
//!
//! Categories are sprint names in dataset order; sprints are never merged,
//! even when two share a name.

use metrics_core::grouping::{estimation_error, mean, percentage, round_to, OrderedMap, Precision};
use metrics_core::models::{Dataset, Sprint, Task};
use metrics_core::settings::WorkloadMode;
use metrics_core::table::{MetricTable, Series};

const SPRINT_AXIS: &str = "Sprint";

fn sprint_names(dataset: &Dataset) -> Vec<String> {
    dataset.sprints.iter().map(|s| s.name.clone()).collect()
}

/// Single-series table with one value per sprint.
fn per_sprint(
    dataset: &Dataset,
    title: &str,
    y_label: &str,
    series_name: &str,
    value: impl Fn(&Sprint) -> f64,
) -> MetricTable {
    MetricTable::new(title)
        .axes(SPRINT_AXIS, y_label)
        .categories(sprint_names(dataset))
        .with_series(Series::new(
            series_name,
            dataset.sprints.iter().map(value).collect(),
        ))
}

/// Whole-sprint rate of tasks matching `pred`, one decimal.
fn task_rate(sprint: &Sprint, pred: impl Fn(&Task) -> bool) -> f64 {
    let hits = sprint.tasks.iter().filter(|&t| pred(t)).count();
    percentage(hits as f64, sprint.tasks.len() as f64, Precision::Rate)
}

// ── Shares ────────────────────────────────────────────────────────────────────

/// Each developer's share of a sprint's task count.
///
/// One series per developer (first-seen order across the dataset); a
/// developer with no task in a sprint scores 0 there.
pub fn sprint_contribution(dataset: &Dataset) -> MetricTable {
    let mut developers: OrderedMap<String, Vec<f64>> = OrderedMap::new();
    for task in dataset.tasks() {
        developers.entry(task.assigned_to.clone());
    }

    for sprint in &dataset.sprints {
        let mut counts: OrderedMap<&str, u32> = OrderedMap::new();
        for task in &sprint.tasks {
            *counts.entry(task.assigned_to.as_str()) += 1;
        }
        let total = sprint.tasks.len() as f64;
        for (developer, values) in developers.iter_mut() {
            let count = counts.get(&developer.as_str()).copied().unwrap_or(0);
            values.push(percentage(f64::from(count), total, Precision::Ratio));
        }
    }

    let mut table = MetricTable::new("Member Contribution per Sprint")
        .axes(SPRINT_AXIS, "Share of Tasks (%)")
        .categories(sprint_names(dataset));
    for (developer, values) in developers {
        table = table.with_series(Series::new(developer, values));
    }
    table
}

/// Each developer's share of a sprint's logged hours.
///
/// The developer registry grows as sprints are visited. In
/// [`WorkloadMode::Cumulative`] a developer's series starts at the sprint in
/// which they first appear (`Series::offset`) and covers every sprint after
/// it, scoring 0 where they logged nothing. [`WorkloadMode::Padded`] fills
/// the earlier sprints with 0 so every series spans the whole axis.
pub fn sprint_workload(dataset: &Dataset, mode: WorkloadMode) -> MetricTable {
    // developer → (index of first sprint seen, shares from then on)
    let mut registry: OrderedMap<String, (usize, Vec<f64>)> = OrderedMap::new();

    for (index, sprint) in dataset.sprints.iter().enumerate() {
        let total_hours: f64 = sprint.tasks.iter().map(|t| t.actual_hours).sum();
        let mut hours: OrderedMap<&str, f64> = OrderedMap::new();

        for task in &sprint.tasks {
            registry.entry_or_insert_with(task.assigned_to.clone(), || (index, Vec::new()));
            *hours.entry(task.assigned_to.as_str()) += task.actual_hours;
        }

        for (developer, (_, shares)) in registry.iter_mut() {
            let logged = hours.get(&developer.as_str()).copied().unwrap_or(0.0);
            shares.push(percentage(logged, total_hours, Precision::Ratio));
        }
    }

    let mut table = MetricTable::new("Developer Workload Share per Sprint")
        .axes("Sprints", "Workload Share (%)")
        .categories(sprint_names(dataset));
    for (developer, (first, shares)) in registry {
        let series = match mode {
            WorkloadMode::Cumulative => Series::starting_at(developer, first, shares),
            WorkloadMode::Padded => {
                let mut values = vec![0.0; first];
                values.extend(shares);
                Series::new(developer, values)
            }
        };
        table = table.with_series(series);
    }
    table
}

// ── Estimation ────────────────────────────────────────────────────────────────

/// Mean estimation error of each sprint's Done tasks with a positive estimate.
pub fn sprint_mean_error(dataset: &Dataset) -> MetricTable {
    per_sprint(
        dataset,
        "Average Estimation Error per Sprint",
        "Error (%)",
        "Average Error (%)",
        |sprint| {
            let errors: Vec<f64> = sprint
                .tasks
                .iter()
                .filter(|t| t.is_done())
                .filter_map(estimation_error)
                .collect();
            round_to(mean(&errors), 2)
        },
    )
}

// ── Rates ─────────────────────────────────────────────────────────────────────

/// Share of each sprint's tasks that are not Done.
pub fn sprint_unfinished(dataset: &Dataset) -> MetricTable {
    per_sprint(
        dataset,
        "Unfinished Tasks per Sprint",
        "Percentage (%)",
        "Unfinished (%)",
        |sprint| task_rate(sprint, |t| !t.is_done()),
    )
}

/// Share of each sprint's tasks that are Done.
pub fn sprint_completion(dataset: &Dataset) -> MetricTable {
    per_sprint(
        dataset,
        "Completion Rate per Sprint",
        "Percentage (%)",
        "Completed (%)",
        |sprint| task_rate(sprint, Task::is_done),
    )
}

/// Share of each sprint's Done tasks closed after the sprint's end date.
///
/// Done tasks without a close date count towards the total but are never late.
pub fn sprint_late(dataset: &Dataset) -> MetricTable {
    per_sprint(
        dataset,
        "Tasks Closed After Deadline per Sprint",
        "Percentage (%)",
        "Closed Late (%)",
        |sprint| {
            let done: Vec<&Task> = sprint.tasks.iter().filter(|t| t.is_done()).collect();
            let late = done
                .iter()
                .filter(|t| t.closed_at.is_some_and(|closed| closed > sprint.end_date))
                .count();
            percentage(late as f64, done.len() as f64, Precision::Rate)
        },
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
