//! Per-group baseline statistics and deviation scoring.

use crate::model::{BucketAggregate, PairKey, PairScore};
use std::collections::HashMap;

/// Round to 2 decimal places; fixed output contract for z-scores.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Caller guarantees n >= 2.
fn sample_std(values: &[f64], mean: f64) -> f64 {
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Score each pair group's most recent bucket against the group's own baseline
/// over the whole window.
///
/// Per (source site, destination site, IP version) group: mean and sample
/// standard deviation over all bucket values, z = (value - mean) / std rounded
/// to 2 decimals, percent change = ((value - mean) / mean) * 100 rounded to the
/// nearest integer.
///
/// Sparse site pairs are expected, so undefined statistics drop the affected
/// group silently rather than failing the run:
/// - single-bucket groups (sample std undefined),
/// - constant groups (std = 0, z undefined),
/// - zero-mean groups (percent change undefined).
///
/// Only rows in the most recent bucket seen anywhere in the window are
/// returned, and only when |z| >= `threshold`.
pub fn score(buckets: &[BucketAggregate], threshold: f64) -> Vec<PairScore> {
    let mut groups: HashMap<&PairKey, Vec<&BucketAggregate>> = HashMap::new();
    for b in buckets {
        groups.entry(&b.key).or_default().push(b);
    }

    let mut scored: Vec<PairScore> = Vec::new();
    for (key, rows) in groups {
        if rows.len() < 2 {
            continue;
        }
        let values: Vec<f64> = rows.iter().map(|r| r.value_mbs).collect();
        let mu = mean(&values);
        let sigma = sample_std(&values, mu);
        if sigma == 0.0 || mu == 0.0 {
            continue;
        }

        for row in rows {
            scored.push(PairScore {
                key: key.clone(),
                bucket_start: row.bucket_start,
                last_window_avg: row.value_mbs,
                mean: mu,
                std_dev: sigma,
                z: round2((row.value_mbs - mu) / sigma),
                percent_change: (((row.value_mbs - mu) / mu) * 100.0).round(),
            });
        }
    }

    // The bucket under evaluation is the most recent one across the whole
    // window, not per group: pairs that stopped reporting early drop out here.
    let Some(latest) = scored.iter().map(|s| s.bucket_start).max() else {
        return Vec::new();
    };

    let mut out: Vec<PairScore> = scored
        .into_iter()
        .filter(|s| s.bucket_start == latest && s.z.abs() >= threshold)
        .collect();
    out.sort_by(|a, b| a.key.cmp(&b.key));
    out
}
