//! Run-to-completion analysis pipeline: fetch, aggregate, score, classify,
//! publish.

use crate::alarm::classify::classify;
use crate::analysis::aggregate::aggregate;
use crate::analysis::baseline::score;
use crate::analysis::select::{select, Direction};
use crate::config::AnalysisConfig;
use crate::model::AnalysisWindow;
use crate::sink::AlarmSink;
use crate::source::{fetch_window, SampleSource};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome summary of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub window: AnalysisWindow,
    pub samples: usize,
    pub buckets: usize,
    pub decrease_candidates: usize,
    pub increase_candidates: usize,
    pub published: usize,
    pub publish_failures: usize,
}

pub struct Pipeline {
    source: Arc<dyn SampleSource>,
    sink: Arc<dyn AlarmSink>,
    cfg: AnalysisConfig,
    subwindow: Duration,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn SampleSource>,
        sink: Arc<dyn AlarmSink>,
        cfg: AnalysisConfig,
        subwindow: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            cfg,
            subwindow,
        }
    }

    /// Analyze the most recent window, ending now.
    pub async fn run(&self) -> Result<RunReport> {
        let to = Utc::now();
        self.run_window(to - Duration::days(self.cfg.window_days), to)
            .await
    }

    /// Analyze a fixed window. Each run reads a fresh snapshot of raw samples
    /// and computes entirely from run-scoped structures; nothing persists
    /// between runs.
    pub async fn run_window(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let window = AnalysisWindow { from, to };
        info!(
            %run_id,
            from = %window.from_label(),
            to = %window.to_label(),
            "starting analysis run"
        );

        // Retrieval failure aborts the run: partial windows must not be
        // scored, since group statistics need the complete sample set.
        let samples = fetch_window(self.source.as_ref(), from, to, self.subwindow)
            .await
            .context("sample retrieval failed")?;
        info!(%run_id, samples = samples.len(), "retrieved raw samples");

        let buckets = aggregate(&samples, from, self.cfg.bucket_width());
        let scores = score(&buckets, self.cfg.deviation_threshold);

        let mut report = RunReport {
            window,
            samples: samples.len(),
            buckets: buckets.len(),
            decrease_candidates: 0,
            increase_candidates: 0,
            published: 0,
            publish_failures: 0,
        };

        for direction in Direction::ALL {
            let candidates = select(&scores, self.cfg.deviation_threshold, direction);
            info!(
                %run_id,
                event = direction.event(),
                candidates = candidates.len(),
                "classifying candidate set"
            );
            match direction {
                Direction::Decrease => report.decrease_candidates = candidates.len(),
                Direction::Increase => report.increase_candidates = candidates.len(),
            }

            let alarms = classify(&candidates, direction, &window, self.cfg.min_site_count);
            for alarm in &alarms {
                // A rejected document is logged and skipped, never retried
                // within the run; the batch always finishes.
                match self.sink.publish(alarm).await {
                    Ok(()) => report.published += 1,
                    Err(e) => {
                        warn!(
                            %run_id,
                            alarm_id = %alarm.alarm_id(),
                            event = %alarm.event,
                            error = %e,
                            "failed to publish alarm, continuing"
                        );
                        report.publish_failures += 1;
                    }
                }
            }
        }

        info!(
            %run_id,
            published = report.published,
            failures = report.publish_failures,
            "analysis run complete"
        );
        Ok(report)
    }
}
