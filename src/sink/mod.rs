//! Alarm publishing to the external alarm service.

use crate::alarm::Alarm;
use crate::config::SinkConfig;
use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

/// A destination for finished alarm documents. Delivery is at-least-once;
/// duplicate suppression by alarm id is the service's responsibility.
#[async_trait::async_trait]
pub trait AlarmSink: Send + Sync {
    async fn publish(&self, alarm: &Alarm) -> Result<()>;
}

/// Publishes one JSON alarm document per POST.
pub struct HttpAlarmSink {
    client: Client,
    endpoint: String,
}

impl HttpAlarmSink {
    pub fn new(cfg: &SinkConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: cfg.base_url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl AlarmSink for HttpAlarmSink {
    async fn publish(&self, alarm: &Alarm) -> Result<()> {
        let resp = self.client.post(&self.endpoint).json(alarm).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "alarm service returned status {}: {}",
                status.as_u16(),
                body.chars().take(256).collect::<String>()
            ));
        }
        Ok(())
    }
}

/// Prints alarms instead of publishing them; used by dry runs.
pub struct StdoutSink;

#[async_trait::async_trait]
impl AlarmSink for StdoutSink {
    async fn publish(&self, alarm: &Alarm) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(alarm)?);
        Ok(())
    }
}
