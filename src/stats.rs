use serde::Serialize;
use tracing::warn;

use crate::model::{RankingTable, TableKind};
use crate::numeric::{parse_score, to_number};
use crate::ordered::OrderedMap;

/// Admission statistics for one course in one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollStats {
    pub candidates: usize,
    pub allowed: usize,
    pub allowed_pct: String,
    /// Score of the last admitted candidate. `0` when that row has no score
    /// column, `NaN` when its score could not be parsed.
    pub min_score_to_pass: f64,
}

impl EnrollStats {
    fn none_admitted(candidates: usize) -> Self {
        EnrollStats {
            candidates,
            allowed: 0,
            allowed_pct: "0%".into(),
            min_score_to_pass: 0.0,
        }
    }

    /// Threshold score, or `None` when it is unknown.
    pub fn min_score(&self) -> Option<f64> {
        if self.min_score_to_pass.is_nan() {
            None
        } else {
            Some(self.min_score_to_pass)
        }
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }
}

/// Computes admission statistics in a single pass over rows already sorted
/// by merit, admitted candidates first.
///
/// Returns `None` for the all-courses table, for empty tables, and for tables
/// too narrow to carry a status column.
pub fn compute_stats(table: &RankingTable) -> Option<EnrollStats> {
    if let TableKind::AllCourses = table.kind {
        return None;
    }

    let first = table.rows.first()?;
    if !first.has_stats_columns() {
        return None;
    }

    let candidates = table.rows.len();
    let first_not_admitted = table.rows.iter().position(|row| !row.is_admitted());

    let stats = match first_not_admitted {
        Some(0) => EnrollStats::none_admitted(candidates),
        None => EnrollStats {
            candidates,
            allowed: candidates,
            allowed_pct: "100%".into(),
            min_score_to_pass: score_or_zero(table, candidates - 1),
        },
        Some(allowed) => EnrollStats {
            candidates,
            allowed,
            allowed_pct: format!(
                "{:.1}%",
                round_half_up(EnrollStats::pct(allowed, candidates))
            ),
            min_score_to_pass: score_or_zero(table, allowed - 1),
        },
    };

    Some(stats)
}

fn score_or_zero(table: &RankingTable, idx: usize) -> f64 {
    table.rows[idx].score.as_ref().map(to_number).unwrap_or(0.0)
}

/// Rounds to one decimal with ties away from zero; `{:.1}` alone rounds
/// exact ties to even.
fn round_half_up(pct: f64) -> f64 {
    (pct * 10.0).round() / 10.0
}

/// Reports whether every admitted row sits above every non-admitted one.
///
/// [`compute_stats`] trusts this ordering without checking it; callers that
/// want to flag suspicious data can run this first.
pub fn check_merit_order(table: &RankingTable) -> bool {
    let mut seen_rejected = false;
    for (idx, row) in table.rows.iter().enumerate() {
        if !row.is_admitted() {
            seen_rejected = true;
        } else if seen_rejected {
            warn!(
                table = table.kind.name(),
                row = idx,
                "Admitted candidate ranked below a rejected one"
            );
            return false;
        }
    }
    true
}

/// Candidate counts falling into one score bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBucket {
    pub admitted: usize,
    pub not_admitted: usize,
}

/// Buckets candidates by score, keyed by bucket floor ascending.
///
/// Keys carry as many decimals as `bucket_width` needs. Rows without a
/// usable score are left out.
pub fn score_distribution(
    table: &RankingTable,
    bucket_width: f64,
) -> OrderedMap<String, ScoreBucket> {
    let width = if bucket_width > 0.0 { bucket_width } else { 1.0 };
    let decimals = width_decimals(width);

    let mut slots: Vec<(i64, bool)> = table
        .rows
        .iter()
        .filter_map(|row| {
            let score = row.score.as_ref().and_then(parse_score)?;
            Some((bucket_index(score, width), row.is_admitted()))
        })
        .collect();
    slots.sort_by_key(|(idx, _)| *idx);

    let mut buckets: OrderedMap<String, ScoreBucket> = OrderedMap::new();
    for (idx, admitted) in slots {
        let key = format!("{:.*}", decimals, idx as f64 * width);
        if !buckets.contains_key(&key) {
            buckets.set(key.clone(), ScoreBucket::default());
        }
        if let Some(bucket) = buckets.get_mut(&key) {
            if admitted {
                bucket.admitted += 1;
            } else {
                bucket.not_admitted += 1;
            }
        }
    }
    buckets
}

const BUCKET_EPSILON: f64 = 1e-9;

/// Index of the bucket holding `score`, tolerant of `85.3 / 0.1` landing a
/// hair under `853`.
fn bucket_index(score: f64, width: f64) -> i64 {
    (score / width + BUCKET_EPSILON).floor() as i64
}

fn width_decimals(width: f64) -> usize {
    (0..6)
        .find(|&d| {
            let scaled = width * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() < BUCKET_EPSILON * scaled.max(1.0)
        })
        .unwrap_or(6)
}
