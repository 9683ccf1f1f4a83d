//! Core data types shared across the analysis pipeline.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used in store queries, alarm documents, and identity hashes.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";

/// Format a UTC timestamp the way the measurement store and alarm service expect it.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TIME_FORMAT).to_string()
}

/// IP version of a measured path.
///
/// Alarm documents carry both the label (`ipv4`/`ipv6`) and the raw boolean flag
/// from the source records; the two alarm shapes hash different representations,
/// so both are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn from_flag(ipv6: bool) -> Self {
        if ipv6 {
            IpVersion::V6
        } else {
            IpVersion::V4
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IpVersion::V4 => "ipv4",
            IpVersion::V6 => "ipv6",
        }
    }

    pub fn is_v6(&self) -> bool {
        matches!(self, IpVersion::V6)
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One raw throughput measurement between two hosts, as returned by the
/// sample store. The timestamp is the start of the sub-window the store
/// averaged over; the value is in bits/sec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub src_site: String,
    pub dest_site: String,
    pub src_host: String,
    pub dest_host: String,
    pub ipv6: bool,
    pub throughput_bps: f64,
}

/// Grouping key for one measured direction: ordered site pair under one IP version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey {
    pub src_site: String,
    pub dest_site: String,
    pub ip_version: IpVersion,
}

/// Mean throughput (MB/s) for one pair within one time bucket.
/// Derived per run, never persisted; empty buckets are simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketAggregate {
    pub key: PairKey,
    pub bucket_start: DateTime<Utc>,
    pub value_mbs: f64,
}

/// A scored row for the most recent bucket of one pair group: the bucket value
/// against the group's window-wide baseline.
///
/// `z` is rounded to 2 decimal places and `percent_change` to the nearest
/// integer; both roundings are output contracts, not tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub key: PairKey,
    pub bucket_start: DateTime<Utc>,
    /// Mean MB/s of the bucket under evaluation (the last complete bucket).
    pub last_window_avg: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub z: f64,
    pub percent_change: f64,
}

/// The analysis window a run operates on. Bounds are half-open: [from, to).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl AnalysisWindow {
    /// Window of `days` length ending at `to`.
    pub fn ending_at(to: DateTime<Utc>, days: i64) -> Self {
        Self {
            from: to - Duration::days(days),
            to,
        }
    }

    pub fn from_label(&self) -> String {
        format_ts(self.from)
    }

    pub fn to_label(&self) -> String {
        format_ts(self.to)
    }
}
