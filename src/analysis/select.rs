//! Split scored rows into directional candidate sets.

use crate::model::PairScore;

/// Direction of a throughput anomaly.
///
/// The two directions are processed independently and map to different alarm
/// severity buckets: drops are operationally more significant than increases,
/// so only decreases classify their multi-site events under `Network`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Decrease,
    Increase,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Decrease, Direction::Increase];

    /// Alarm event label for this direction.
    pub fn event(&self) -> &'static str {
        match self {
            Direction::Decrease => "bandwidth decreased",
            Direction::Increase => "bandwidth increased",
        }
    }

    /// Subcategory used when the direction escalates to a multi-site alarm.
    /// Pair alarms always stay under `Other`.
    pub fn multi_site_subcategory(&self) -> &'static str {
        match self {
            Direction::Decrease => "Network",
            Direction::Increase => "Other",
        }
    }

    fn matches(&self, z: f64, threshold: f64) -> bool {
        match self {
            Direction::Decrease => z <= -threshold,
            Direction::Increase => z >= threshold,
        }
    }
}

/// Pure filter: rows whose deviation exceeds `threshold` in the given direction.
pub fn select(scores: &[PairScore], threshold: f64, direction: Direction) -> Vec<PairScore> {
    scores
        .iter()
        .filter(|s| direction.matches(s.z, threshold))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IpVersion, PairKey};
    use chrono::{TimeZone, Utc};

    fn row(src: &str, z: f64) -> PairScore {
        PairScore {
            key: PairKey {
                src_site: src.to_string(),
                dest_site: "X".to_string(),
                ip_version: IpVersion::V4,
            },
            bucket_start: Utc.with_ymd_and_hms(2024, 3, 18, 0, 0, 0).unwrap(),
            last_window_avg: 10.0,
            mean: 100.0,
            std_dev: 20.0,
            z,
            percent_change: -90.0,
        }
    }

    #[test]
    fn test_split_by_sign() {
        let scores = vec![row("A", -2.5), row("B", 2.1), row("C", -3.0)];

        let drops = select(&scores, 2.0, Direction::Decrease);
        let rises = select(&scores, 2.0, Direction::Increase);

        assert_eq!(drops.len(), 2);
        assert_eq!(rises.len(), 1);
        assert_eq!(rises[0].key.src_site, "B");
    }

    #[test]
    fn test_threshold_boundary_included() {
        let scores = vec![row("A", -2.0), row("B", 2.0)];
        assert_eq!(select(&scores, 2.0, Direction::Decrease).len(), 1);
        assert_eq!(select(&scores, 2.0, Direction::Increase).len(), 1);
    }

    #[test]
    fn test_direction_policy_labels() {
        assert_eq!(Direction::Decrease.event(), "bandwidth decreased");
        assert_eq!(Direction::Decrease.multi_site_subcategory(), "Network");
        assert_eq!(Direction::Increase.multi_site_subcategory(), "Other");
    }
}
