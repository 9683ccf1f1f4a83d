//! Alarm document shapes and identity hashing.

pub mod classify;

use serde::Serialize;
use sha2::{Digest, Sha224};

/// Top-level category shared by every alarm this pipeline emits.
pub const CATEGORY: &str = "Networking";

/// Subcategory for individual pair alarms, regardless of direction.
pub const PAIR_SUBCATEGORY: &str = "Other";

/// One alarm handed to the publish sink: routing metadata plus the source
/// document the sink persists. Created once per run per qualifying anomaly
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Alarm {
    pub category: &'static str,
    pub subcategory: &'static str,
    pub event: String,
    pub body: String,
    pub tags: Vec<String>,
    pub source: AlarmSource,
}

impl Alarm {
    /// Identity hash of the underlying document; the sink deduplicates on this.
    pub fn alarm_id(&self) -> &str {
        match &self.source {
            AlarmSource::Pair(doc) => &doc.alarm_id,
            AlarmSource::Site(doc) => &doc.alarm_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AlarmSource {
    Pair(PairAlarmDoc),
    Site(SiteAlarmDoc),
}

/// Alarm document for one anomalous (source site, destination site, IP version).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAlarmDoc {
    pub src_site: String,
    pub dest_site: String,
    pub ipv: &'static str,
    pub ipv6: bool,
    pub last_window_avg: f64,
    pub change: f64,
    pub from: String,
    pub to: String,
    pub alarm_id: String,
}

/// Alarm document for one site implicated in many anomalous pairs. The peer
/// lists are split by which side of the pair the site was on; `src_sites[i]`
/// changed by `src_change[i]` when measured toward this site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteAlarmDoc {
    pub site: String,
    pub ipv: &'static str,
    pub ipv6: bool,
    pub src_sites: Vec<String>,
    pub src_change: Vec<f64>,
    pub dest_sites: Vec<String>,
    pub dest_change: Vec<f64>,
    pub from: String,
    pub to: String,
    pub alarm_id: String,
}

/// Content hash over an alarm's identity fields: SHA-224 of the comma-joined
/// parts, hex encoded. Re-running the pipeline over the same window and data
/// must reproduce the same id for the same logical event, so the external sink
/// can republish idempotently.
pub fn alarm_id(parts: &[&str]) -> String {
    let digest = Sha224::digest(parts.join(",").as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_id_deterministic() {
        let a = alarm_id(&["LRZ", "BUDAPEST", "ipv4", "2024-03-01", "2024-03-22"]);
        let b = alarm_id(&["LRZ", "BUDAPEST", "ipv4", "2024-03-01", "2024-03-22"]);
        assert_eq!(a, b);
        // SHA-224 hex digest.
        assert_eq!(a.len(), 56);
    }

    #[test]
    fn test_alarm_id_sensitive_to_fields() {
        let a = alarm_id(&["LRZ", "BUDAPEST", "ipv4", "f", "t"]);
        let b = alarm_id(&["LRZ", "BUDAPEST", "ipv6", "f", "t"]);
        let c = alarm_id(&["BUDAPEST", "LRZ", "ipv4", "f", "t"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
