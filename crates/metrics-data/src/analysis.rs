//! One analysis run: load, normalize once, then compute each requested metric.

use metrics_core::calendar::ReportingZone;
use metrics_core::error::{MetricsError, Result};
use metrics_core::models::Dataset;
use metrics_core::normalizer::normalize;
use metrics_core::settings::WorkloadMode;
use metrics_core::table::MetricOutput;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::reader::{load_dataset, DatasetSource, IngestMode};
use crate::registry::{MetricContext, MetricId};

/// What to compute and how.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub ingest_mode: IngestMode,
    pub zone: ReportingZone,
    pub workload_mode: WorkloadMode,
    /// Metrics to compute; empty selects all of them.
    pub metrics: Vec<MetricId>,
}

impl AnalysisOptions {
    fn selected(&self) -> Vec<MetricId> {
        if self.metrics.is_empty() {
            MetricId::ALL.to_vec()
        } else {
            self.metrics.clone()
        }
    }
}

/// Outcome of one metric. An `Err` leaves the other metrics untouched.
#[derive(Debug)]
pub struct MetricResult {
    pub id: MetricId,
    pub outcome: Result<MetricOutput>,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub sprints: usize,
    pub tasks: usize,
    /// Tasks moved from To Do to In Progress by normalization.
    pub reclassified: usize,
    /// Sprints or tasks skipped during lenient ingest.
    pub rejected: usize,
    pub computed: usize,
    pub unavailable: usize,
}

#[derive(Debug)]
pub struct AnalysisResult {
    pub results: Vec<MetricResult>,
    pub summary: AnalysisSummary,
    pub rejected: Vec<MetricsError>,
}

/// Load the dataset from `source` and compute the selected metrics.
///
/// Returns [`MetricsError::DataUnavailable`] before computing anything when
/// the source has no data. In strict mode the first malformed record fails
/// the run.
pub fn analyze(source: &mut dyn DatasetSource, options: &AnalysisOptions) -> Result<AnalysisResult> {
    info!("loading dataset from {}", source.describe());
    let report = load_dataset(source, options.ingest_mode)?;

    let mut result = analyze_dataset(report.dataset, options);
    result.summary.rejected = report.rejected.len();
    result.rejected = report.rejected;
    Ok(result)
}

/// Compute the selected metrics for an already loaded dataset.
pub fn analyze_dataset(mut dataset: Dataset, options: &AnalysisOptions) -> AnalysisResult {
    let reclassified = normalize(&mut dataset);
    debug!(
        "dataset: {} sprints, {} tasks, {} reclassified",
        dataset.sprints.len(),
        dataset.task_count(),
        reclassified
    );

    let ctx = MetricContext {
        zone: options.zone,
        workload_mode: options.workload_mode,
    };

    let mut summary = AnalysisSummary {
        sprints: dataset.sprints.len(),
        tasks: dataset.task_count(),
        reclassified,
        ..AnalysisSummary::default()
    };

    let results: Vec<MetricResult> = options
        .selected()
        .into_iter()
        .map(|id| {
            let output = id.compute(&dataset, &ctx);
            let outcome = output.ensure_finite(id.as_str()).map(|()| output);
            match &outcome {
                Ok(_) => summary.computed += 1,
                Err(e) => {
                    warn!("metric {} unavailable: {}", id, e);
                    summary.unavailable += 1;
                }
            }
            MetricResult { id, outcome }
        })
        .collect();

    info!(
        "computed {} metrics ({} unavailable)",
        summary.computed, summary.unavailable
    );

    AnalysisResult {
        results,
        summary,
        rejected: Vec::new(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ReaderSource;
    use metrics_core::models::{TaskStatus, TaskType};
    use metrics_core::table::MetricTable;
    use serde_json::json;

    fn source(doc: serde_json::Value) -> ReaderSource<std::io::Cursor<Vec<u8>>> {
        ReaderSource::new("test", std::io::Cursor::new(doc.to_string().into_bytes()))
    }

    fn table<'a>(result: &'a AnalysisResult, id: MetricId) -> &'a MetricTable {
        let found = result.results.iter().find(|r| r.id == id).unwrap();
        found.outcome.as_ref().unwrap().as_table().unwrap()
    }

    fn ana_document() -> serde_json::Value {
        json!({
            "sprints": [{
                "name": "Sprint 1",
                "start_date": "2024-01-01",
                "end_date": "2024-01-14",
                "tasks": [
                    {"id": 1, "assigned_to": "Ana", "status": "Done", "type": "Bug",
                     "estimated_hours": 4, "actual_hours": 5,
                     "created_at": "2024-01-02T09:00:00Z", "closed_at": "2024-01-04T09:00:00Z"},
                    {"id": 2, "assigned_to": "Ana", "status": "To Do", "type": "Story",
                     "estimated_hours": 2, "actual_hours": 1,
                     "created_at": "2024-01-03T09:00:00Z"},
                ]
            }]
        })
    }

    #[test]
    fn test_analyze_ana_scenario() {
        let result = analyze(&mut source(ana_document()), &AnalysisOptions::default()).unwrap();

        assert_eq!(result.summary.sprints, 1);
        assert_eq!(result.summary.tasks, 2);
        assert_eq!(result.summary.reclassified, 1);
        assert_eq!(result.summary.computed, 17);
        assert_eq!(result.summary.unavailable, 0);

        let status = table(&result, MetricId::StatusDistribution);
        assert_eq!(status.value(TaskStatus::Done.label(), "Ana"), Some(1.0));
        assert_eq!(status.value(TaskStatus::InProgress.label(), "Ana"), Some(1.0));
        assert_eq!(status.value(TaskStatus::ToDo.label(), "Ana"), Some(0.0));

        let accuracy = table(&result, MetricId::EstimationAccuracy);
        assert_eq!(accuracy.value("Accurate Estimates", "Ana"), Some(0.0));

        let error = table(&result, MetricId::MeanEstimationError);
        assert_eq!(error.value("Mean Estimation Error", "Ana"), Some(25.0));

        let risk = table(&result, MetricId::InProgressRisk);
        assert_eq!(risk.value("On Time", "Ana"), Some(100.0));
        assert_eq!(risk.value("Exceeded Estimate", "Ana"), Some(0.0));

        let closure = table(&result, MetricId::AvgClosureTime);
        assert_eq!(closure.value("Average Days", "Ana"), Some(2.0));

        let by_type = table(&result, MetricId::ErrorByType);
        assert_eq!(by_type.value(TaskType::Bug.label(), "Ana"), Some(25.0));
        assert_eq!(by_type.value(TaskType::Story.label(), "Ana"), Some(0.0));
    }

    #[test]
    fn test_analyze_subset_keeps_requested_order() {
        let options = AnalysisOptions {
            metrics: vec![MetricId::Throughput, MetricId::SprintCompletion],
            ..AnalysisOptions::default()
        };
        let result = analyze(&mut source(ana_document()), &options).unwrap();
        let ids: Vec<MetricId> = result.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![MetricId::Throughput, MetricId::SprintCompletion]);
        assert_eq!(result.summary.computed, 2);

        let completion = table(&result, MetricId::SprintCompletion);
        assert_eq!(completion.value("Completed (%)", "Sprint 1"), Some(50.0));
    }

    #[test]
    fn test_analyze_isolates_non_finite_metrics() {
        // A subnormal estimate makes the relative error overflow to infinity.
        let mut doc = ana_document();
        doc["sprints"][0]["tasks"][0]["estimated_hours"] = json!(1e-310);

        let result = analyze(&mut source(doc), &AnalysisOptions::default()).unwrap();

        let failed: Vec<MetricId> = result
            .results
            .iter()
            .filter(|r| r.outcome.is_err())
            .map(|r| r.id)
            .collect();
        assert_eq!(
            failed,
            vec![
                MetricId::MeanEstimationError,
                MetricId::ErrorByType,
                MetricId::SprintMeanError,
            ]
        );
        for r in result.results.iter().filter(|r| r.outcome.is_err()) {
            assert!(matches!(
                r.outcome,
                Err(MetricsError::NonFiniteValue { .. })
            ));
        }
        assert_eq!(result.summary.computed, 14);
        assert_eq!(result.summary.unavailable, 3);

        let status = table(&result, MetricId::StatusDistribution);
        assert_eq!(status.value(TaskStatus::Done.label(), "Ana"), Some(1.0));
    }

    #[test]
    fn test_analyze_null_document_is_unavailable() {
        let err = analyze(&mut source(json!(null)), &AnalysisOptions::default()).unwrap_err();
        assert!(matches!(err, MetricsError::DataUnavailable(_)));
    }

    #[test]
    fn test_analyze_empty_sprint_list() {
        let result = analyze(&mut source(json!({"sprints": []})), &AnalysisOptions::default())
            .unwrap();
        assert_eq!(result.summary.tasks, 0);
        assert_eq!(result.summary.unavailable, 0);
        for r in &result.results {
            let output = r.outcome.as_ref().unwrap();
            assert!(output.tables().all(|t| t.is_empty()), "{}", r.id);
        }
    }

    #[test]
    fn test_analyze_lenient_counts_rejected_records() {
        let mut doc = ana_document();
        doc["sprints"][0]["tasks"]
            .as_array_mut()
            .unwrap()
            .push(json!({"id": 3, "assigned_to": "Bo", "status": "Done"}));

        let result = analyze(&mut source(doc), &AnalysisOptions::default()).unwrap();
        assert_eq!(result.summary.rejected, 1);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.summary.tasks, 2);
    }

    #[test]
    fn test_analyze_strict_fails_on_bad_record() {
        let mut doc = ana_document();
        doc["sprints"][0]["tasks"][0]["actual_hours"] = json!(-1);
        let options = AnalysisOptions {
            ingest_mode: IngestMode::Strict,
            ..AnalysisOptions::default()
        };
        let err = analyze(&mut source(doc), &options).unwrap_err();
        assert!(matches!(err, MetricsError::MalformedRecord { .. }));
    }
}
