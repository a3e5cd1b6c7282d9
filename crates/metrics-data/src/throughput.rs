//! Weekly throughput of closed tasks.

use std::collections::BTreeMap;

use metrics_core::calendar::ReportingZone;
use metrics_core::models::Dataset;
use metrics_core::table::{MetricTable, Series};

/// Number of Done tasks closed in each ISO week.
///
/// Weeks are evaluated in `zone` and labelled `YYYY-Www`; categories are
/// sorted ascending by label, and weeks without closures are not listed.
pub fn throughput(dataset: &Dataset, zone: &ReportingZone) -> MetricTable {
    // BTreeMap keeps the labels sorted.
    let mut weekly: BTreeMap<String, u32> = BTreeMap::new();

    for task in dataset.tasks().filter(|t| t.is_done()) {
        if let Some(closed_at) = task.closed_at {
            *weekly.entry(zone.iso_week(closed_at).label()).or_default() += 1;
        }
    }

    let (weeks, counts): (Vec<String>, Vec<f64>) = weekly
        .into_iter()
        .map(|(week, count)| (week, f64::from(count)))
        .unzip();

    MetricTable::new("Task Throughput Over Time")
        .axes("Week", "Tasks Completed")
        .categories(weeks)
        .with_series(Series::new("Tasks", counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{dataset, sprint, task, TaskSpec};
    use metrics_core::models::TaskStatus;

    fn closed(at: &'static str) -> metrics_core::models::Task {
        task(TaskSpec {
            status: TaskStatus::Done,
            closed: Some(at),
            ..TaskSpec::default()
        })
    }

    #[test]
    fn test_throughput_counts_per_week_sorted() {
        let d = dataset(vec![
            sprint(
                "Sprint 1",
                vec![
                    closed("2024-12-31T10:00:00Z"),
                    closed("2024-01-10T10:00:00Z"),
                    closed("2024-01-11T10:00:00Z"),
                ],
            ),
            sprint("Sprint 2", vec![closed("2021-01-01T10:00:00Z")]),
        ]);
        let table = throughput(&d, &ReportingZone::default());
        assert_eq!(table.categories, vec!["2020-W53", "2024-W02", "2025-W01"]);
        assert_eq!(table.series[0].values, vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_throughput_ignores_open_and_undated_tasks() {
        let d = dataset(vec![sprint(
            "Sprint 1",
            vec![
                task(TaskSpec {
                    status: TaskStatus::Done,
                    closed: None,
                    ..TaskSpec::default()
                }),
                task(TaskSpec {
                    status: TaskStatus::InProgress,
                    closed: Some("2024-01-10T10:00:00Z"),
                    ..TaskSpec::default()
                }),
            ],
        )]);
        let table = throughput(&d, &ReportingZone::default());
        assert!(table.is_empty());
        assert!(table.series[0].values.is_empty());
    }

    #[test]
    fn test_throughput_respects_reporting_zone() {
        // Sunday night UTC is Monday morning in Tokyo.
        let d = dataset(vec![sprint("Sprint 1", vec![closed("2024-01-07T20:00:00Z")])]);
        let utc = throughput(&d, &ReportingZone::default());
        let tokyo = throughput(&d, &ReportingZone::resolve("Asia/Tokyo"));
        assert_eq!(utc.categories, vec!["2024-W01"]);
        assert_eq!(tokyo.categories, vec!["2024-W02"]);
    }
}
