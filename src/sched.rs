//! Cron-driven batch trigger for continuous operation.

use crate::pipeline::Pipeline;
use anyhow::{anyhow, Result};
use chrono::Utc;
use cron::Schedule as CronSchedule;
use std::str::FromStr;
use tracing::{error, info};

/// Run the pipeline on a cron schedule, forever.
///
/// An invalid expression is a startup error; a failed run is logged and the
/// loop keeps going, since the next window is computed fresh each time.
pub async fn run_watch_loop(pipeline: &Pipeline, cron_expr: &str) -> Result<()> {
    let schedule = CronSchedule::from_str(cron_expr)
        .map_err(|e| anyhow!("invalid cron expression '{}': {}", cron_expr, e))?;

    info!(%cron_expr, "watch loop started");
    loop {
        let now = Utc::now();
        let next = schedule
            .after(&now)
            .next()
            .ok_or_else(|| anyhow!("cron expression '{}' yields no future runs", cron_expr))?;

        info!(next = %next.to_rfc3339(), "sleeping until next scheduled run");
        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        match pipeline.run().await {
            Ok(report) => info!(
                published = report.published,
                failures = report.publish_failures,
                "scheduled run complete"
            ),
            Err(e) => error!(error = %e, "scheduled run failed"),
        }
    }
}
