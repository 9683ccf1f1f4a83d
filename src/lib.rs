//! bandwatch -- site-to-site throughput anomaly alarms.
//!
//! This crate periodically analyzes throughput time series collected between
//! pairs of measurement sites: raw samples are aggregated into time buckets,
//! each pair is scored against its own baseline over the window, and
//! significant deviations become alarm documents, grouped site-centrically so
//! one degraded site does not fan out into dozens of pair alarms.

pub mod alarm;
pub mod analysis;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod sched;
pub mod sink;
pub mod source;

pub use config::Config;
pub use pipeline::{Pipeline, RunReport};

use anyhow::Result;
use sink::{AlarmSink, HttpAlarmSink, StdoutSink};
use source::es::EsSampleSource;
use std::sync::Arc;

fn build_pipeline(cfg: &Config, window_days: Option<i64>, dry_run: bool) -> Result<Pipeline> {
    let source = Arc::new(EsSampleSource::new(&cfg.source)?);
    let sink: Arc<dyn AlarmSink> = if dry_run {
        Arc::new(StdoutSink)
    } else {
        Arc::new(HttpAlarmSink::new(&cfg.sink)?)
    };

    let mut analysis = cfg.analysis.clone();
    if let Some(days) = window_days {
        analysis.window_days = days;
    }

    Ok(Pipeline::new(source, sink, analysis, cfg.source.subwindow()))
}

/// Run one analysis pass over the most recent window.
pub async fn run_once(cfg: &Config, window_days: Option<i64>, dry_run: bool) -> Result<RunReport> {
    build_pipeline(cfg, window_days, dry_run)?.run().await
}

/// Run the pipeline continuously on the configured cron schedule.
pub async fn watch(cfg: &Config) -> Result<()> {
    let pipeline = build_pipeline(cfg, None, false)?;
    sched::run_watch_loop(&pipeline, &cfg.schedule.cron).await
}
