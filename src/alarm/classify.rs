//! Two-phase alarm classification: site-wide events first, pair events for
//! whatever they did not absorb.

use crate::alarm::{
    alarm_id, Alarm, AlarmSource, PairAlarmDoc, SiteAlarmDoc, CATEGORY, PAIR_SUBCATEGORY,
};
use crate::analysis::select::Direction;
use crate::model::{AnalysisWindow, IpVersion, PairScore};
use std::collections::HashMap;

/// Percent-change magnitude an anomaly must reach to be worth alarming on.
/// Fixed policy, not configuration.
const SIGNIFICANT_CHANGE: f64 = 50.0;

/// Classify one directional candidate set into alarm documents.
///
/// Phase 1 counts, per (site, IP version), how many candidate rows implicate
/// the site on either side. A self-pair counts once per side as written; the
/// upstream semantics are ambiguous there and are preserved literally.
///
/// Phase 2 walks implicated sites with >= `min_count` appearances in a single
/// deterministic order (descending count, then site, then IP version). A site
/// whose gathered rows carry >= `min_count` significant changes becomes one
/// multi-site alarm, and those rows are marked consumed so a single
/// high-fan-out site event does not also produce dozens of pair alarms.
/// Gathering always reads the full candidate set: consumption only removes
/// rows from phase 3.
///
/// Phase 3 emits one pair alarm for every unconsumed row with a significant
/// percent change.
pub fn classify(
    candidates: &[PairScore],
    direction: Direction,
    window: &AnalysisWindow,
    min_count: usize,
) -> Vec<Alarm> {
    let from = window.from_label();
    let to = window.to_label();

    // Phase 1: appearance counts per (site, IP version).
    let mut counts: HashMap<(&str, IpVersion), usize> = HashMap::new();
    for row in candidates {
        *counts
            .entry((row.key.src_site.as_str(), row.key.ip_version))
            .or_default() += 1;
        *counts
            .entry((row.key.dest_site.as_str(), row.key.ip_version))
            .or_default() += 1;
    }

    let mut implicated: Vec<(&str, IpVersion, usize)> = counts
        .into_iter()
        .filter(|&(_, count)| count >= min_count)
        .map(|((site, ipv), count)| (site, ipv, count))
        .collect();
    implicated.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));

    let mut alarms = Vec::new();
    let mut consumed = vec![false; candidates.len()];

    // Phase 2: multi-site alarms.
    for (site, ipv, _count) in implicated {
        let subset: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.key.ip_version == ipv && (r.key.src_site == site || r.key.dest_site == site)
            })
            .map(|(i, _)| i)
            .collect();

        let mut src_sites = Vec::new();
        let mut src_change = Vec::new();
        let mut dest_sites = Vec::new();
        let mut dest_change = Vec::new();
        for &i in &subset {
            let row = &candidates[i];
            // Self-pairs contribute no counterpart entry.
            if row.key.src_site != site {
                src_sites.push(row.key.src_site.clone());
                src_change.push(row.percent_change);
            }
            if row.key.dest_site != site {
                dest_sites.push(row.key.dest_site.clone());
                dest_change.push(row.percent_change);
            }
        }

        let significant = src_change
            .iter()
            .chain(dest_change.iter())
            .filter(|c| c.abs() >= SIGNIFICANT_CHANGE)
            .count();
        if significant < min_count {
            continue;
        }

        let event = format!("{} from/to multiple sites", direction.event());
        let doc = SiteAlarmDoc {
            site: site.to_string(),
            ipv: ipv.label(),
            ipv6: ipv.is_v6(),
            src_sites,
            src_change,
            dest_sites,
            dest_change,
            from: from.clone(),
            to: to.clone(),
            alarm_id: alarm_id(&[site, &ipv.is_v6().to_string(), &from, &to]),
        };
        alarms.push(Alarm {
            category: CATEGORY,
            subcategory: direction.multi_site_subcategory(),
            body: event.clone(),
            event,
            tags: vec![site.to_string()],
            source: AlarmSource::Site(doc),
        });

        for &i in &subset {
            consumed[i] = true;
        }
    }

    // Phase 3: pair alarms for whatever survived.
    for (i, row) in candidates.iter().enumerate() {
        if consumed[i] || row.percent_change.abs() < SIGNIFICANT_CHANGE {
            continue;
        }
        let doc = PairAlarmDoc {
            src_site: row.key.src_site.clone(),
            dest_site: row.key.dest_site.clone(),
            ipv: row.key.ip_version.label(),
            ipv6: row.key.ip_version.is_v6(),
            last_window_avg: row.last_window_avg,
            change: row.percent_change,
            from: from.clone(),
            to: to.clone(),
            alarm_id: alarm_id(&[
                &row.key.src_site,
                &row.key.dest_site,
                row.key.ip_version.label(),
                &from,
                &to,
            ]),
        };
        alarms.push(Alarm {
            category: CATEGORY,
            subcategory: PAIR_SUBCATEGORY,
            event: direction.event().to_string(),
            body: direction.event().to_string(),
            tags: vec![row.key.src_site.clone(), row.key.dest_site.clone()],
            source: AlarmSource::Pair(doc),
        });
    }

    alarms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PairKey;
    use chrono::{TimeZone, Utc};

    fn window() -> AnalysisWindow {
        let to = Utc.with_ymd_and_hms(2024, 3, 22, 0, 0, 0).unwrap();
        AnalysisWindow::ending_at(to, 21)
    }

    fn row(src: &str, dest: &str, change: f64) -> PairScore {
        PairScore {
            key: PairKey {
                src_site: src.to_string(),
                dest_site: dest.to_string(),
                ip_version: IpVersion::V4,
            },
            bucket_start: Utc.with_ymd_and_hms(2024, 3, 18, 0, 0, 0).unwrap(),
            last_window_avg: 50.0,
            mean: 120.0,
            std_dev: 25.0,
            z: if change < 0.0 { -2.4 } else { 2.4 },
            percent_change: change,
        }
    }

    fn site_docs(alarms: &[Alarm]) -> Vec<&SiteAlarmDoc> {
        alarms
            .iter()
            .filter_map(|a| match &a.source {
                AlarmSource::Site(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    fn pair_docs(alarms: &[Alarm]) -> Vec<&PairAlarmDoc> {
        alarms
            .iter()
            .filter_map(|a| match &a.source {
                AlarmSource::Pair(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_high_fanout_site_absorbs_pairs() {
        // Six anomalous pairs all touching site A, three on each side.
        let candidates = vec![
            row("A", "P1", -60.0),
            row("A", "P2", -70.0),
            row("A", "P3", 55.0),
            row("P4", "A", 80.0),
            row("P5", "A", -90.0),
            row("P6", "A", 65.0),
        ];

        let alarms = classify(&candidates, Direction::Decrease, &window(), 5);

        let sites = site_docs(&alarms);
        assert_eq!(sites.len(), 1);
        assert!(pair_docs(&alarms).is_empty());

        let doc = sites[0];
        assert_eq!(doc.site, "A");
        // Counterparts where A was the source land in dest_sites and vice versa.
        assert_eq!(doc.dest_sites, vec!["P1", "P2", "P3"]);
        assert_eq!(doc.dest_change, vec![-60.0, -70.0, 55.0]);
        assert_eq!(doc.src_sites, vec!["P4", "P5", "P6"]);
        assert_eq!(doc.src_change, vec![80.0, -90.0, 65.0]);

        assert_eq!(alarms[0].event, "bandwidth decreased from/to multiple sites");
        assert_eq!(alarms[0].subcategory, "Network");
        assert_eq!(alarms[0].tags, vec!["A"]);
    }

    #[test]
    fn test_below_min_count_stays_pairwise() {
        // Four appearances: below the fan-out bar, so each significant row
        // alarms individually.
        let candidates = vec![
            row("A", "P1", -60.0),
            row("A", "P2", -70.0),
            row("P3", "A", -80.0),
            row("P4", "A", -90.0),
        ];

        let alarms = classify(&candidates, Direction::Decrease, &window(), 5);

        assert!(site_docs(&alarms).is_empty());
        assert_eq!(pair_docs(&alarms).len(), 4);
        assert_eq!(alarms[0].subcategory, "Other");
        assert_eq!(alarms[0].event, "bandwidth decreased");
    }

    #[test]
    fn test_insignificant_change_never_alarms() {
        // Deviation passed the z threshold upstream, but a 40% change is below
        // the significance bar.
        let candidates = vec![row("X", "Y", 40.0)];
        assert!(classify(&candidates, Direction::Increase, &window(), 5).is_empty());
    }

    #[test]
    fn test_fanout_without_significant_changes_stays_pairwise() {
        // Five appearances but only two changes reach 50%: no multi-site alarm,
        // and the two significant rows alarm individually.
        let candidates = vec![
            row("A", "P1", -60.0),
            row("A", "P2", -70.0),
            row("A", "P3", -20.0),
            row("P4", "A", -30.0),
            row("P5", "A", -10.0),
        ];

        let alarms = classify(&candidates, Direction::Decrease, &window(), 5);
        assert!(site_docs(&alarms).is_empty());
        assert_eq!(pair_docs(&alarms).len(), 2);
    }

    #[test]
    fn test_unrelated_pair_survives_consumption() {
        let mut candidates = vec![
            row("A", "P1", -60.0),
            row("A", "P2", -70.0),
            row("A", "P3", -55.0),
            row("P4", "A", -80.0),
            row("P5", "A", -90.0),
        ];
        candidates.push(row("X", "Y", -52.0));

        let alarms = classify(&candidates, Direction::Decrease, &window(), 5);

        assert_eq!(site_docs(&alarms).len(), 1);
        let pairs = pair_docs(&alarms);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].src_site, "X");
        assert_eq!(pairs[0].dest_site, "Y");
    }

    #[test]
    fn test_self_pairs_count_per_side_but_add_no_counterparts() {
        // Three self-pairs: six appearances for A, but no counterpart entries,
        // so the multi-site bar can never be met and the rows fall through to
        // pair alarms.
        let candidates = vec![
            row("A", "A", -60.0),
            row("A", "A", -70.0),
            row("A", "A", -80.0),
        ];

        let alarms = classify(&candidates, Direction::Decrease, &window(), 5);
        assert!(site_docs(&alarms).is_empty());
        assert_eq!(pair_docs(&alarms).len(), 3);
    }

    #[test]
    fn test_ip_versions_never_mix() {
        // Site A is busy on v4 and v6, but neither family alone reaches five
        // appearances.
        let mut candidates = vec![
            row("A", "P1", -60.0),
            row("A", "P2", -70.0),
            row("P3", "A", -80.0),
        ];
        for (src, dest) in [("A", "P4"), ("P5", "A"), ("P6", "A")] {
            let mut r = row(src, dest, -65.0);
            r.key.ip_version = IpVersion::V6;
            candidates.push(r);
        }

        let alarms = classify(&candidates, Direction::Decrease, &window(), 5);
        assert!(site_docs(&alarms).is_empty());
        assert_eq!(pair_docs(&alarms).len(), 6);
    }

    #[test]
    fn test_alarm_ids_stable_across_runs() {
        let candidates = vec![
            row("A", "P1", -60.0),
            row("A", "P2", -70.0),
            row("A", "P3", -55.0),
            row("P4", "A", -80.0),
            row("P5", "A", -90.0),
            row("X", "Y", -52.0),
        ];

        let first = classify(&candidates, Direction::Decrease, &window(), 5);
        let second = classify(&candidates, Direction::Decrease, &window(), 5);

        let a: Vec<&str> = first.iter().map(|a| a.alarm_id()).collect();
        let b: Vec<&str> = second.iter().map(|a| a.alarm_id()).collect();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_pair_and_site_hash_different_identity_fields() {
        let candidates = vec![
            row("A", "P1", -60.0),
            row("A", "P2", -70.0),
            row("A", "P3", -55.0),
            row("P4", "A", -80.0),
            row("P5", "A", -90.0),
            row("X", "Y", -52.0),
        ];
        let alarms = classify(&candidates, Direction::Decrease, &window(), 5);

        let w = window();
        let site = &site_docs(&alarms)[0];
        assert_eq!(
            site.alarm_id,
            alarm_id(&["A", "false", &w.from_label(), &w.to_label()])
        );
        let pair = &pair_docs(&alarms)[0];
        assert_eq!(
            pair.alarm_id,
            alarm_id(&["X", "Y", "ipv4", &w.from_label(), &w.to_label()])
        );
    }
}
