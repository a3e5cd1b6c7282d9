//! Presentation sinks for computed metrics.
//!
//! A [`MetricSink`] receives each metric in publication order, then a final
//! [`MetricSink::finish`] call carrying the run summary.

pub mod json;
pub mod text;

use metrics_core::error::{MetricsError, Result};
use metrics_core::table::MetricOutput;
use metrics_data::analysis::{AnalysisResult, AnalysisSummary};
use metrics_data::registry::MetricId;

pub use json::JsonSink;
pub use text::TextSink;

/// Destination for computed metrics.
pub trait MetricSink {
    fn publish(&mut self, id: MetricId, output: &MetricOutput) -> Result<()>;

    /// Called instead of [`publish`](Self::publish) for a metric that failed.
    fn unavailable(&mut self, id: MetricId, error: &MetricsError) -> Result<()>;

    fn finish(&mut self, summary: &AnalysisSummary) -> Result<()>;
}

/// Hand every metric of `result` to `sink`, then finish it.
pub fn publish(result: &AnalysisResult, sink: &mut dyn MetricSink) -> Result<()> {
    for metric in &result.results {
        match &metric.outcome {
            Ok(output) => sink.publish(metric.id, output)?,
            Err(e) => sink.unavailable(metric.id, e)?,
        }
    }
    tracing::debug!("published {} metric(s)", result.results.len());
    sink.finish(&result.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_core::table::MetricTable;
    use metrics_data::analysis::MetricResult;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl MetricSink for Recorder {
        fn publish(&mut self, id: MetricId, _output: &MetricOutput) -> Result<()> {
            self.events.push(format!("publish {}", id));
            Ok(())
        }

        fn unavailable(&mut self, id: MetricId, _error: &MetricsError) -> Result<()> {
            self.events.push(format!("unavailable {}", id));
            Ok(())
        }

        fn finish(&mut self, summary: &AnalysisSummary) -> Result<()> {
            self.events.push(format!("finish {}", summary.computed));
            Ok(())
        }
    }

    #[test]
    fn test_publish_routes_outcomes_in_order() {
        let result = AnalysisResult {
            results: vec![
                MetricResult {
                    id: MetricId::Throughput,
                    outcome: Ok(MetricTable::new("t").into()),
                },
                MetricResult {
                    id: MetricId::SprintLate,
                    outcome: Err(MetricsError::NonFiniteValue {
                        metric: "sprint-late".to_string(),
                    }),
                },
            ],
            summary: AnalysisSummary {
                computed: 1,
                unavailable: 1,
                ..AnalysisSummary::default()
            },
            rejected: Vec::new(),
        };

        let mut sink = Recorder::default();
        publish(&result, &mut sink).unwrap();
        assert_eq!(
            sink.events,
            vec!["publish throughput", "unavailable sprint-late", "finish 1"]
        );
    }
}
