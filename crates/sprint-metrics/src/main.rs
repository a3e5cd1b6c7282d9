mod bootstrap;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use metrics_core::settings::{OutputFormat, Settings};
use metrics_data::analysis::{analyze, AnalysisOptions};
use metrics_data::reader::{FileSource, IngestMode, ReaderSource};
use metrics_data::registry::MetricId;
use metrics_render::{JsonSink, MetricSink, TextSink};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("sprint-metrics v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Format: {}, Timezone: {}, Workload: {}",
        settings.format,
        settings.timezone,
        settings.workload_mode
    );

    let options = AnalysisOptions {
        ingest_mode: if settings.strict {
            IngestMode::Strict
        } else {
            IngestMode::Lenient
        },
        zone: settings.reporting_zone(),
        workload_mode: settings.workload_mode,
        metrics: MetricId::parse_selection(&settings.metrics)?,
    };

    let result = if settings.reads_stdin() {
        let mut source = ReaderSource::new("standard input", io::stdin().lock());
        analyze(&mut source, &options)?
    } else {
        let mut source = FileSource::new(&settings.input);
        analyze(&mut source, &options)?
    };

    let out: Box<dyn Write> = match &settings.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut sink: Box<dyn MetricSink> = match settings.format {
        OutputFormat::Text => Box::new(TextSink::new(out)),
        OutputFormat::Json => Box::new(JsonSink::new(out)),
    };
    metrics_render::publish(&result, sink.as_mut())?;

    let summary = &result.summary;
    tracing::info!(
        "done: {} sprints, {} tasks, {} reclassified, {} rejected, {} computed, {} unavailable",
        summary.sprints,
        summary.tasks,
        summary.reclassified,
        summary.rejected,
        summary.computed,
        summary.unavailable
    );

    Ok(())
}
