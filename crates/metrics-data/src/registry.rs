//! Stable metric identifiers and dispatch to the computations.

use std::fmt;
use std::str::FromStr;

use metrics_core::calendar::ReportingZone;
use metrics_core::error::MetricsError;
use metrics_core::models::Dataset;
use metrics_core::settings::WorkloadMode;
use metrics_core::table::MetricOutput;

use crate::{developer, sprint, throughput};

/// Every metric the engine can compute, in publication order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricId {
    StatusDistribution,
    TypeDistribution,
    EstimationAccuracy,
    UnderestimationRate,
    MeanEstimationError,
    ErrorByType,
    InProgressRisk,
    AvgClosureTime,
    HoursDone,
    HoursInProgress,
    SprintContribution,
    SprintWorkload,
    SprintMeanError,
    SprintUnfinished,
    SprintCompletion,
    SprintLate,
    Throughput,
}

impl MetricId {
    pub const ALL: [MetricId; 17] = [
        MetricId::StatusDistribution,
        MetricId::TypeDistribution,
        MetricId::EstimationAccuracy,
        MetricId::UnderestimationRate,
        MetricId::MeanEstimationError,
        MetricId::ErrorByType,
        MetricId::InProgressRisk,
        MetricId::AvgClosureTime,
        MetricId::HoursDone,
        MetricId::HoursInProgress,
        MetricId::SprintContribution,
        MetricId::SprintWorkload,
        MetricId::SprintMeanError,
        MetricId::SprintUnfinished,
        MetricId::SprintCompletion,
        MetricId::SprintLate,
        MetricId::Throughput,
    ];

    /// Identifier used on the command line and as the JSON key.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricId::StatusDistribution => "status-distribution",
            MetricId::TypeDistribution => "type-distribution",
            MetricId::EstimationAccuracy => "estimation-accuracy",
            MetricId::UnderestimationRate => "underestimation-rate",
            MetricId::MeanEstimationError => "mean-estimation-error",
            MetricId::ErrorByType => "error-by-type",
            MetricId::InProgressRisk => "in-progress-risk",
            MetricId::AvgClosureTime => "avg-closure-time",
            MetricId::HoursDone => "hours-done",
            MetricId::HoursInProgress => "hours-in-progress",
            MetricId::SprintContribution => "sprint-contribution",
            MetricId::SprintWorkload => "sprint-workload",
            MetricId::SprintMeanError => "sprint-mean-error",
            MetricId::SprintUnfinished => "sprint-unfinished",
            MetricId::SprintCompletion => "sprint-completion",
            MetricId::SprintLate => "sprint-late",
            MetricId::Throughput => "throughput",
        }
    }

    /// Run the computation for this metric against a normalized dataset.
    pub fn compute(self, dataset: &Dataset, ctx: &MetricContext) -> MetricOutput {
        match self {
            MetricId::StatusDistribution => developer::status_distribution(dataset).into(),
            MetricId::TypeDistribution => developer::type_distribution(dataset).into(),
            MetricId::EstimationAccuracy => developer::estimation_accuracy(dataset).into(),
            MetricId::UnderestimationRate => developer::underestimation_rate(dataset).into(),
            MetricId::MeanEstimationError => developer::mean_estimation_error(dataset).into(),
            MetricId::ErrorByType => developer::error_by_type(dataset).into(),
            MetricId::InProgressRisk => developer::in_progress_risk(dataset).into(),
            MetricId::AvgClosureTime => developer::avg_closure_time(dataset).into(),
            MetricId::HoursDone => developer::hours_done(dataset),
            MetricId::HoursInProgress => developer::hours_in_progress(dataset),
            MetricId::SprintContribution => sprint::sprint_contribution(dataset).into(),
            MetricId::SprintWorkload => {
                sprint::sprint_workload(dataset, ctx.workload_mode).into()
            }
            MetricId::SprintMeanError => sprint::sprint_mean_error(dataset).into(),
            MetricId::SprintUnfinished => sprint::sprint_unfinished(dataset).into(),
            MetricId::SprintCompletion => sprint::sprint_completion(dataset).into(),
            MetricId::SprintLate => sprint::sprint_late(dataset).into(),
            MetricId::Throughput => throughput::throughput(dataset, &ctx.zone).into(),
        }
    }

    /// Parse a list of identifiers; an empty list selects every metric.
    pub fn parse_selection<S: AsRef<str>>(names: &[S]) -> Result<Vec<MetricId>, MetricsError> {
        if names.is_empty() {
            return Ok(MetricId::ALL.to_vec());
        }
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let id: MetricId = name.as_ref().parse()?;
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        Ok(selected)
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricId {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        MetricId::ALL
            .into_iter()
            .find(|id| id.as_str() == needle)
            .ok_or_else(|| MetricsError::Config(format!("unknown metric \"{}\"", s)))
    }
}

/// Settings that some computations need beyond the dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricContext {
    pub zone: ReportingZone,
    pub workload_mode: WorkloadMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_from_str() {
        for id in MetricId::ALL {
            assert_eq!(id.as_str().parse::<MetricId>().unwrap(), id);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let mut names: Vec<&str> = MetricId::ALL.iter().map(|id| id.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MetricId::ALL.len());
    }

    #[test]
    fn test_unknown_id_is_config_error() {
        let err = "velocity".parse::<MetricId>().unwrap_err();
        assert!(matches!(err, MetricsError::Config(_)));
        assert!(err.to_string().contains("velocity"));
    }

    #[test]
    fn test_parse_selection_empty_means_all() {
        let all = MetricId::parse_selection::<&str>(&[]).unwrap();
        assert_eq!(all.len(), 17);
    }

    #[test]
    fn test_parse_selection_dedups_and_keeps_order() {
        let ids = MetricId::parse_selection(&["throughput", "Sprint-Late", "throughput"]).unwrap();
        assert_eq!(ids, vec![MetricId::Throughput, MetricId::SprintLate]);
    }

    #[test]
    fn test_every_metric_computes_on_empty_dataset() {
        let dataset = Dataset::default();
        let ctx = MetricContext::default();
        for id in MetricId::ALL {
            let output = id.compute(&dataset, &ctx);
            assert!(output.ensure_finite(id.as_str()).is_ok(), "{id}");
        }
    }
}
