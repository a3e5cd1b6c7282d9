use std::fmt;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::calendar::ReportingZone;

// ── Enumerated options ─────────────────────────────────────────────────────────

/// How computed metric tables are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text tables.
    Text,
    /// A single JSON document keyed by metric id.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        })
    }
}

/// Series layout for the sprint workload-share table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadMode {
    /// A developer's series starts at the first sprint they appear in.
    #[default]
    Cumulative,
    /// Every developer's series spans every sprint, zero-filled.
    Padded,
}

impl fmt::Display for WorkloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkloadMode::Cumulative => "cumulative",
            WorkloadMode::Padded => "padded",
        })
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Sprint and developer analytics from a project-tracking export
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sprint-metrics",
    about = "Sprint and developer analytics from a project-tracking export",
    version
)]
pub struct Settings {
    /// Dataset JSON file ("-" reads standard input)
    #[arg(long, short = 'i', default_value = "-", env = "SPRINT_METRICS_INPUT")]
    pub input: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to a file instead of standard output
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Only compute the given metric (repeatable)
    #[arg(long = "metric", short = 'm')]
    pub metrics: Vec<String>,

    /// Timezone used for weekly buckets ("auto" uses the system timezone)
    #[arg(long, default_value = "UTC", value_parser = parse_timezone)]
    pub timezone: String,

    /// Series layout for the workload-share table
    #[arg(long, value_enum, default_value_t = WorkloadMode::Cumulative)]
    pub workload_mode: WorkloadMode,

    /// Fail on the first malformed record instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.sprint-metrics/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_mode: Option<WorkloadMode>,
}

impl LastUsedParams {
    /// Default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".sprint-metrics").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("could not clear {}: {}", config_path.display(), e);
            }
            return settings.apply_debug();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone.filter(|tz| ReportingZone::is_valid(tz)) {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "workload_mode") {
            if let Some(v) = last.workload_mode {
                settings.workload_mode = v;
            }
        }

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("could not persist settings: {}", e);
        }

        settings.apply_debug()
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// `true` when the dataset should be read from standard input.
    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }

    /// Timezone used for calendar bucketing.
    pub fn reporting_zone(&self) -> ReportingZone {
        ReportingZone::resolve(&self.timezone)
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            format: Some(s.format),
            timezone: Some(s.timezone.clone()),
            workload_mode: Some(s.workload_mode),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
///
/// clap stores the arg id using the field name (underscores), not the
/// long-flag spelling.
/// Accept `"auto"` or a recognised IANA name so a typo never reaches
/// `last_used.json`.
fn parse_timezone(value: &str) -> Result<String, String> {
    if ReportingZone::is_valid(value) {
        Ok(value.to_string())
    } else {
        Err(format!("unrecognised timezone \"{}\"", value))
    }
}

fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
