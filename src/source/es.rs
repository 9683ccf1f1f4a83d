//! Elasticsearch-style sample store client.
//!
//! The store holds one document per throughput test run; we let it do the
//! first averaging pass server-side with a composite aggregation over the
//! measured path identity, one bucket per (hosts, sites, IP version) key.

use crate::config::SourceConfig;
use crate::model::{format_ts, RawSample};
use crate::source::{SampleSource, SourceError};
use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct EsSampleSource {
    client: Client,
    base_url: String,
    index: String,
}

impl EsSampleSource {
    pub fn new(cfg: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            index: cfg.index.clone(),
        })
    }

    /// Search body for one sub-window: production-host paths only, grouped by
    /// path identity, averaging the throughput field per group.
    fn search_body(from: DateTime<Utc>, to: DateTime<Utc>) -> Value {
        json!({
            "size": 0,
            "query": {
                "bool": {
                    "must": [
                        { "range": { "timestamp": { "gt": format_ts(from), "lte": format_ts(to) } } },
                        { "term": { "src_production": true } },
                        { "term": { "dest_production": true } }
                    ]
                }
            },
            "aggregations": {
                "groupby": {
                    "composite": {
                        "size": 9999,
                        "sources": [
                            { "ipv6": { "terms": { "field": "ipv6" } } },
                            { "src": { "terms": { "field": "src" } } },
                            { "dest": { "terms": { "field": "dest" } } },
                            { "src_host": { "terms": { "field": "src_host" } } },
                            { "dest_host": { "terms": { "field": "dest_host" } } },
                            { "src_site": { "terms": { "field": "src_netsite" } } },
                            { "dest_site": { "terms": { "field": "dest_netsite" } } }
                        ]
                    },
                    "aggs": {
                        "throughput": { "avg": { "field": "throughput" } }
                    }
                }
            }
        })
    }

    /// Map a search response to raw samples, stamped with the sub-window start.
    fn parse_buckets(payload: &Value, from: DateTime<Utc>) -> Result<Vec<RawSample>, SourceError> {
        let buckets = payload
            .pointer("/aggregations/groupby/buckets")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SourceError::Payload("response has no groupby aggregation buckets".to_string())
            })?;

        let mut samples = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let key = bucket
                .get("key")
                .ok_or_else(|| SourceError::Payload("bucket without key".to_string()))?;

            let Some(value) = bucket.pointer("/throughput/value").and_then(Value::as_f64) else {
                // A group the store could not average; data-quality exclusion.
                tracing::debug!(?key, "skipping bucket with missing throughput value");
                continue;
            };

            samples.push(RawSample {
                timestamp: from,
                src_site: str_field(key, "src_site")?,
                dest_site: str_field(key, "dest_site")?,
                src_host: str_field(key, "src_host")?,
                dest_host: str_field(key, "dest_host")?,
                ipv6: key.get("ipv6").and_then(Value::as_bool).ok_or_else(|| {
                    SourceError::Payload("bucket key missing 'ipv6'".to_string())
                })?,
                throughput_bps: value,
            });
        }
        Ok(samples)
    }
}

fn str_field(key: &Value, name: &str) -> Result<String, SourceError> {
    key.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SourceError::Payload(format!("bucket key missing '{name}'")))
}

#[async_trait::async_trait]
impl SampleSource for EsSampleSource {
    async fn fetch(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RawSample>, SourceError> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let resp = self
            .client
            .post(&url)
            .json(&Self::search_body(from, to))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            });
        }

        let payload: Value = resp.json().await?;
        Self::parse_buckets(&payload, from)
    }
}
