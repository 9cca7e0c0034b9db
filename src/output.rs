//! Export and display of ranking tables.
//!
//! The text export is `;`-separated with commas rewritten to periods and one
//! `\n`-terminated line per row.

use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::model::RankingTable;

/// Renders rows (and an optional header) in the export text format.
///
/// Output is byte-for-byte identical for identical input.
pub fn rows_to_text(rows: &[Vec<String>], header: Option<&[&str]>) -> Result<String> {
    let builder = {
        let mut b = WriterBuilder::new();
        b.delimiter(b';')
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .has_headers(false);
        b
    };

    let mut out = Vec::new();
    if let Some(header) = header {
        write_line(&builder, &mut out, header.iter().map(|h| h.replace(',', ".")))?;
    }
    for row in rows {
        write_line(&builder, &mut out, row.iter().map(|f| f.replace(',', ".")))?;
    }
    Ok(String::from_utf8(out)?)
}

/// Appends one record to `out`. A record that is empty or a lone empty field
/// becomes a bare `\n`; csv would write it as `""`.
fn write_line(
    builder: &WriterBuilder,
    out: &mut Vec<u8>,
    fields: impl Iterator<Item = String>,
) -> Result<()> {
    let fields: Vec<String> = fields.collect();
    if fields.iter().all(String::is_empty) && fields.len() <= 1 {
        out.push(b'\n');
        return Ok(());
    }

    let mut writer = builder.from_writer(out);
    writer.write_record(&fields)?;
    writer.flush()?;
    Ok(())
}

/// Export rows of a table. The all-courses table leads with the course name.
pub fn table_rows(table: &RankingTable) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| {
            if table.is_merit() {
                std::iter::once(row.course.clone()).chain(row.fields()).collect()
            } else {
                row.fields()
            }
        })
        .collect()
}

pub fn table_to_text(table: &RankingTable, header: Option<&[&str]>) -> Result<String> {
    rows_to_text(&table_rows(table), header)
}

/// File name used when saving an export of `course`.
pub fn export_file_name(course: Option<&str>) -> String {
    format!("{}.csv", course.unwrap_or("data"))
}

/// Writes the export of `table` to `path`, replacing any existing file.
pub fn write_table(path: &Path, table: &RankingTable, header: Option<&[&str]>) -> Result<()> {
    let text = table_to_text(table, header)?;
    std::fs::write(path, &text)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;
    info!(path = %path.display(), rows = table.rows.len(), "Table exported");
    Ok(())
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON to `path`.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    debug!(path = %path.display(), bytes = body.len(), "Writing JSON");
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawValue, StudentResult, TableKind};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn table(kind: TableKind) -> RankingTable {
        let rows = vec![
            StudentResult::from_fields(
                "Design",
                &[RawValue::Number(1.0), "ab".into(), "Sì".into(), "80,5".into()],
            ),
            StudentResult::from_fields(
                "Design",
                &[RawValue::Number(2.0), "cd".into(), "No".into(), "70,25".into()],
            ),
        ];
        RankingTable { kind, rows }
    }

    #[test]
    fn test_text_format() {
        let text = table_to_text(&table(TableKind::Course("Design".into())), None).unwrap();
        assert_eq!(text, "1;ab;Sì;80.5\n2;cd;No;70.25\n");
    }

    #[test]
    fn test_header_comes_first() {
        let header = ["Posizione", "Matricola", "Esito", "Voto"];
        let text = table_to_text(&table(TableKind::Course("Design".into())), Some(&header)).unwrap();
        assert!(text.starts_with("Posizione;Matricola;Esito;Voto\n"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_every_comma_rewritten() {
        let rows = vec![vec!["1,2,3".to_string(), "x".to_string()]];
        assert_eq!(rows_to_text(&rows, None).unwrap(), "1.2.3;x\n");
    }

    #[test]
    fn test_blank_rows_are_bare_newlines() {
        let rows = vec![vec![String::new()], vec![], vec!["1".to_string(), String::new()]];
        assert_eq!(rows_to_text(&rows, None).unwrap(), "\n\n1;\n");
    }

    #[test]
    fn test_blank_rows_from_document() {
        let t = RankingTable {
            kind: TableKind::Course("X".into()),
            rows: vec![
                StudentResult::from_fields("X", &[RawValue::Missing]),
                StudentResult::from_fields("X", &[]),
            ],
        };
        assert_eq!(table_to_text(&t, None).unwrap(), "\n\n");
    }

    #[test]
    fn test_split_reconstructs_rows() {
        let t = table(TableKind::Course("Design".into()));
        let text = table_to_text(&t, None).unwrap();

        let parsed: Vec<Vec<String>> = text
            .lines()
            .map(|l| l.split(';').map(str::to_string).collect())
            .collect();
        let expected: Vec<Vec<String>> = table_rows(&t)
            .into_iter()
            .map(|r| r.into_iter().map(|f| f.replace(',', ".")).collect())
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_deterministic() {
        let t = table(TableKind::AllCourses);
        assert_eq!(
            table_to_text(&t, None).unwrap(),
            table_to_text(&t, None).unwrap()
        );
        assert!(table_to_text(&t, None).unwrap().starts_with("Design;1;ab"));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(Some("Design")), "Design.csv");
        assert_eq!(export_file_name(None), "data.csv");
    }

    #[test]
    fn test_write_table_creates_file() {
        let path = temp_path("ranking_stats_test_export.csv");
        let _ = fs::remove_file(&path);

        write_table(&path, &table(TableKind::Course("Design".into())), None).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&table(TableKind::AllCourses)).unwrap();
    }
}
