//! Collapse raw per-sample throughput records into per-bucket means.

use crate::model::{BucketAggregate, IpVersion, PairKey, RawSample};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Aggregate raw samples over an analysis window into one mean value per
/// (source site, destination site, IP version, time bucket).
///
/// Bucket boundaries are fixed-width intervals anchored at `window_from`.
/// Per-sample values are converted to MB/s (bits/sec x 1e-6) and rounded to
/// the nearest integer before averaging. Site names are upper-cased so case
/// variance in upstream metadata never splits a logical site into two groups.
///
/// Pure transform: a bucket with zero samples is absent from the output.
pub fn aggregate(
    samples: &[RawSample],
    window_from: DateTime<Utc>,
    bucket_width: Duration,
) -> Vec<BucketAggregate> {
    let width_secs = bucket_width.num_seconds();
    debug_assert!(width_secs > 0);

    // Explicit grouping map: (pair, bucket start) -> (sum, count).
    let mut groups: HashMap<(PairKey, DateTime<Utc>), (f64, u64)> = HashMap::new();

    for s in samples {
        if s.timestamp < window_from {
            continue;
        }
        let idx = (s.timestamp - window_from).num_seconds() / width_secs;
        let bucket_start = window_from + Duration::seconds(idx * width_secs);

        let key = PairKey {
            src_site: s.src_site.to_uppercase(),
            dest_site: s.dest_site.to_uppercase(),
            ip_version: IpVersion::from_flag(s.ipv6),
        };

        let mbs = (s.throughput_bps * 1e-6).round();
        let entry = groups.entry((key, bucket_start)).or_insert((0.0, 0));
        entry.0 += mbs;
        entry.1 += 1;
    }

    let mut out: Vec<BucketAggregate> = groups
        .into_iter()
        .map(|((key, bucket_start), (sum, count))| BucketAggregate {
            key,
            bucket_start,
            value_mbs: sum / count as f64,
        })
        .collect();

    // HashMap iteration order is arbitrary; sort for reproducible output.
    out.sort_by(|a, b| (&a.key, a.bucket_start).cmp(&(&b.key, b.bucket_start)));
    out
}
