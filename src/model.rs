//! Data types shared by the builder, the statistics calculator and the
//! aggregator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display label of the synthetic table holding every course.
pub const ALL_COURSES: &str = "Tutti i corsi";

/// Status prefix marking a candidate as not admitted.
pub const NOT_ADMITTED_MARKER: &str = "No";

/// Column count below which a row cannot carry admission statistics.
pub const MIN_STATS_COLUMNS: usize = 6;

/// A single cell as published: sometimes a number, sometimes pre-formatted
/// text with a comma decimal separator, sometimes null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// How the rows of a document relate to the global merit order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeritOrder {
    /// Rows are already listed in unified ranking order.
    #[default]
    Document,
    /// Rows must be re-sorted by score (highest first) for the merit table.
    Score,
}

/// One published row before course grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    pub course: String,
    #[serde(default)]
    pub fields: Vec<RawValue>,
}

/// A ranking as published for one school, year and phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingDocument {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub merit_order: MeritOrder,
    pub rows: Vec<RawRow>,
}

/// A candidate row with named positional columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentResult {
    pub course: String,
    pub position: Option<RawValue>,
    pub label: Option<RawValue>,
    pub status: Option<RawValue>,
    pub score: Option<RawValue>,
    pub extra: Vec<RawValue>,
}

impl StudentResult {
    /// Splits positional fields `[position, label, status, score, ..extra]`.
    pub fn from_fields(course: impl Into<String>, fields: &[RawValue]) -> Self {
        let mut it = fields.iter().cloned();
        Self {
            course: course.into(),
            position: it.next(),
            label: it.next(),
            status: it.next(),
            score: it.next(),
            extra: it.collect(),
        }
    }

    /// Number of positional columns the source supplied.
    pub fn width(&self) -> usize {
        if !self.extra.is_empty() {
            return 4 + self.extra.len();
        }
        [&self.position, &self.label, &self.status, &self.score]
            .iter()
            .take_while(|c| c.is_some())
            .count()
    }

    /// Whether the row is wide enough to take part in statistics.
    pub fn has_stats_columns(&self) -> bool {
        self.width() >= MIN_STATS_COLUMNS
    }

    /// A row without a status column counts as admitted.
    pub fn is_admitted(&self) -> bool {
        match &self.status {
            Some(status) => !status.to_string().starts_with(NOT_ADMITTED_MARKER),
            None => true,
        }
    }

    /// Positional cells rendered as published text.
    pub fn fields(&self) -> Vec<String> {
        [&self.position, &self.label, &self.status, &self.score]
            .into_iter()
            .flatten()
            .chain(self.extra.iter())
            .map(|v| v.to_string())
            .collect()
    }
}

/// Selects either one course or the synthetic all-courses view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TableKind {
    Course(String),
    AllCourses,
}

impl TableKind {
    pub fn name(&self) -> &str {
        match self {
            TableKind::Course(name) => name,
            TableKind::AllCourses => ALL_COURSES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingTable {
    pub kind: TableKind,
    pub rows: Vec<StudentResult>,
}

impl RankingTable {
    pub fn is_merit(&self) -> bool {
        matches!(self.kind, TableKind::AllCourses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[RawValue]) -> StudentResult {
        StudentResult::from_fields("Design", fields)
    }

    #[test]
    fn test_raw_value_deserializes_mixed_cells() {
        let cells: Vec<RawValue> = serde_json::from_str(r#"[1, "12,5", null]"#).unwrap();
        assert_eq!(
            cells,
            vec![RawValue::Number(1.0), "12,5".into(), RawValue::Missing]
        );
    }

    #[test]
    fn test_width_counts_positional_columns() {
        assert_eq!(row(&["1".into(), "abc".into()]).width(), 2);
        let wide: Vec<RawValue> = (0..7).map(|i| RawValue::Number(i as f64)).collect();
        assert_eq!(row(&wide).width(), 7);
        assert!(row(&wide).has_stats_columns());
    }

    #[test]
    fn test_status_marker() {
        let admitted = row(&["1".into(), "a".into(), "Sì".into()]);
        let rejected = row(&["2".into(), "b".into(), "No - OFA".into()]);
        let no_status = row(&["3".into(), "c".into()]);

        assert!(admitted.is_admitted());
        assert!(!rejected.is_admitted());
        assert!(no_status.is_admitted());
    }

    #[test]
    fn test_fields_render_published_text() {
        let r = row(&[RawValue::Number(3.0), "xy".into(), "Sì".into(), "71,25".into()]);
        assert_eq!(r.fields(), vec!["3", "xy", "Sì", "71,25"]);
    }

    #[test]
    fn test_document_defaults() {
        let doc: RankingDocument =
            serde_json::from_str(r#"{"rows":[{"course":"DESIGN"}]}"#).unwrap();
        assert_eq!(doc.merit_order, MeritOrder::Document);
        assert!(doc.rows[0].fields.is_empty());
    }
}
