//! Builds per-course tables and the all-courses merit table from a raw
//! ranking document.

use crate::model::{
    ALL_COURSES, MeritOrder, RankingDocument, RankingTable, StudentResult, TableKind,
};
use crate::numeric::parse_score;
use crate::ordered::OrderedMap;
use std::cmp::Ordering;
use tracing::debug;

/// Every table derived from one ranking document.
#[derive(Debug, Clone)]
pub struct RankingTables {
    pub course_tables: Vec<RankingTable>,
    pub merit_table: RankingTable,
}

/// Title-cases each whitespace-separated word.
///
/// Idempotent, and stable across input casing.
pub fn normalize_course_name(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Groups rows by normalized course name and assembles the merit table.
///
/// Course order follows first appearance in the document; rows keep their
/// relative order. The document itself is left untouched.
pub fn build(document: &RankingDocument) -> RankingTables {
    let mut groups: OrderedMap<String, Vec<StudentResult>> = OrderedMap::new();
    let mut merit_rows = Vec::with_capacity(document.rows.len());

    for raw in &document.rows {
        let course = normalize_course_name(&raw.course);
        let row = StudentResult::from_fields(course.clone(), &raw.fields);
        merit_rows.push(row.clone());

        match groups.get_mut(&course) {
            Some(rows) => rows.push(row),
            None => {
                groups.set(course, vec![row]);
            }
        }
    }

    if document.merit_order == MeritOrder::Score {
        merit_rows.sort_by(compare_by_score);
    }

    let course_tables: Vec<RankingTable> = groups
        .into_iter()
        .map(|(name, rows)| RankingTable {
            kind: TableKind::Course(name),
            rows,
        })
        .collect();

    debug!(
        courses = course_tables.len(),
        rows = merit_rows.len(),
        "Ranking tables built"
    );

    RankingTables {
        course_tables,
        merit_table: RankingTable {
            kind: TableKind::AllCourses,
            rows: merit_rows,
        },
    }
}

/// Highest score first; rows without a usable score sink to the bottom.
/// `sort_by` is stable, so ties keep document order.
fn compare_by_score(a: &StudentResult, b: &StudentResult) -> Ordering {
    let sa = a.score.as_ref().and_then(parse_score);
    let sb = b.score.as_ref().and_then(parse_score);
    match (sa, sb) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl RankingTables {
    pub fn course_names(&self) -> Vec<&str> {
        self.course_tables.iter().map(|t| t.kind.name()).collect()
    }

    /// Course names preceded by the all-courses entry, as offered for selection.
    pub fn selectable_names(&self) -> Vec<&str> {
        std::iter::once(ALL_COURSES)
            .chain(self.course_names())
            .collect()
    }

    /// Finds a course table, matching names after normalization.
    pub fn course(&self, name: &str) -> Option<&RankingTable> {
        let wanted = normalize_course_name(name);
        self.course_tables
            .iter()
            .find(|t| matches!(&t.kind, TableKind::Course(n) if *n == wanted))
    }

    pub fn table(&self, kind: &TableKind) -> Option<&RankingTable> {
        match kind {
            TableKind::AllCourses => Some(&self.merit_table),
            TableKind::Course(name) => self.course(name),
        }
    }

    /// Resolves a user-supplied selector, where the all-courses label picks the
    /// merit table.
    pub fn select(&self, name: &str) -> Option<&RankingTable> {
        if normalize_course_name(name) == normalize_course_name(ALL_COURSES) {
            Some(&self.merit_table)
        } else {
            self.course(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawRow, RawValue};
    use std::collections::HashSet;

    fn raw(course: &str, position: f64, label: &str, score: &str) -> RawRow {
        RawRow {
            course: course.to_string(),
            fields: vec![
                RawValue::Number(position),
                label.into(),
                "Sì".into(),
                score.into(),
                "-".into(),
                "-".into(),
            ],
        }
    }

    fn document(order: MeritOrder) -> RankingDocument {
        RankingDocument {
            school: Some("Design".into()),
            year: Some(2023),
            phase: Some("Prima".into()),
            merit_order: order,
            rows: vec![
                raw("DESIGN DEL PRODOTTO", 1.0, "a", "90,1"),
                raw("design della moda", 2.0, "b", "88"),
                raw("Design del prodotto", 3.0, "c", "70,5"),
                raw("DESIGN DELLA MODA", 4.0, "d", "abc"),
                raw("design del prodotto", 5.0, "e", "95"),
            ],
        }
    }

    #[test]
    fn test_normalize_course_name_stable() {
        let a = normalize_course_name("DESIGN");
        assert_eq!(a, "Design");
        assert_eq!(normalize_course_name("design"), a);
        assert_eq!(normalize_course_name("Design"), a);
        assert_eq!(normalize_course_name(&a), a);
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_course_name("  ingegneria   INFORMATICA "),
            "Ingegneria Informatica"
        );
    }

    #[test]
    fn test_groups_by_course_in_first_appearance_order() {
        let tables = build(&document(MeritOrder::Document));
        assert_eq!(
            tables.course_names(),
            vec!["Design Del Prodotto", "Design Della Moda"]
        );

        let prodotto = tables.course("design del prodotto").unwrap();
        let labels: Vec<_> = prodotto.rows.iter().map(|r| r.fields()[1].clone()).collect();
        assert_eq!(labels, vec!["a", "c", "e"]);
    }

    #[test]
    fn test_partition_covers_merit_table() {
        let tables = build(&document(MeritOrder::Document));
        let from_courses: usize = tables.course_tables.iter().map(|t| t.rows.len()).sum();
        assert_eq!(from_courses, tables.merit_table.rows.len());

        let merit: HashSet<String> = tables
            .merit_table
            .rows
            .iter()
            .map(|r| r.fields()[1].clone())
            .collect();
        let courses: HashSet<String> = tables
            .course_tables
            .iter()
            .flat_map(|t| t.rows.iter().map(|r| r.fields()[1].clone()))
            .collect();
        assert_eq!(merit, courses);
    }

    #[test]
    fn test_document_merit_order_kept() {
        let tables = build(&document(MeritOrder::Document));
        let labels: Vec<_> = tables
            .merit_table
            .rows
            .iter()
            .map(|r| r.fields()[1].clone())
            .collect();
        assert_eq!(labels, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_score_merit_order_sorts_descending() {
        let tables = build(&document(MeritOrder::Score));
        let labels: Vec<_> = tables
            .merit_table
            .rows
            .iter()
            .map(|r| r.fields()[1].clone())
            .collect();
        assert_eq!(labels, vec!["e", "a", "b", "c", "d"]);
    }

    #[test]
    fn test_build_leaves_document_untouched() {
        let doc = document(MeritOrder::Score);
        let before = serde_json::to_string(&doc).unwrap();
        let _ = build(&doc);
        assert_eq!(serde_json::to_string(&doc).unwrap(), before);
    }

    #[test]
    fn test_select_all_courses() {
        let tables = build(&document(MeritOrder::Document));
        assert!(tables.select("tutti i corsi").unwrap().is_merit());
        assert_eq!(tables.selectable_names()[0], ALL_COURSES);
        assert!(tables.table(&TableKind::Course("Nope".into())).is_none());
    }
}
