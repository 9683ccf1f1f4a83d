//! TOML configuration for the bandwatch analysis pipeline.
//!
//! Layered model: compiled-in defaults, overridden by a config file found via
//! the `BANDWATCH_CONFIG` environment variable or the standard system
//! location. Every component takes its slice of this structure explicitly so
//! the scorer and classifier stay unit-testable in isolation.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Root configuration for the bandwatch process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub sink: SinkConfig,
    pub analysis: AnalysisConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `BANDWATCH_CONFIG` environment variable.
    /// 2. `/etc/bandwatch/bandwatch.toml`.
    /// 3. Fall back to compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var("BANDWATCH_CONFIG") {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "BANDWATCH_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let system_path = Path::new("/etc/bandwatch/bandwatch.toml");
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

/// Where raw throughput samples come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the measurement store.
    pub base_url: String,
    /// Index holding throughput test results.
    pub index: String,
    /// Sub-range length for piecewise window queries; the store caps
    /// aggregation cardinality per query.
    pub subwindow_hours: i64,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9200".to_string(),
            index: "ps_throughput".to_string(),
            subwindow_hours: 1,
            timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    pub fn subwindow(&self) -> Duration {
        Duration::hours(self.subwindow_hours)
    }
}

/// Where finished alarm documents go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Endpoint receiving one JSON alarm document per POST.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081/alarms".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Statistical tunables for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Length of the analysis window, ending now.
    pub window_days: i64,
    /// Width of the smoothing buckets inside the window.
    pub bucket_days: i64,
    /// Standard-deviation threshold for a bucket to count as anomalous.
    pub deviation_threshold: f64,
    /// Anomalous-pair appearances before a site is considered for a
    /// site-wide alarm.
    pub min_site_count: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: 21,
            bucket_days: 4,
            deviation_threshold: 2.0,
            min_site_count: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn bucket_width(&self) -> Duration {
        Duration::days(self.bucket_days)
    }
}

/// Cron trigger for `watch` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds-resolution cron expression; default fires daily at 03:00 UTC.
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: "0 0 3 * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
