//! Output writing for converted tables.
//!
//! Serializes a [`RecordTable`] to CSV and owns the naming rules for
//! produced files, including the sanitization shared with the download
//! route. Coordinate values are written at full precision; the writer
//! never rounds.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;

use crate::error::ExportResult;
use crate::models::RecordTable;

/// Suffix appended to every produced output file.
const OUTPUT_SUFFIX: &str = "_converted_Northing_Easting.csv";

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").expect("valid filename regex"));

/// Serialize a table to CSV bytes, headers first, rows in order.
pub fn table_to_csv(table: &RecordTable) -> ExportResult<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(table.headers())?;

        for row in table.rows() {
            let record: Vec<String> = table
                .headers()
                .iter()
                .map(|h| field_text(row.get(h).unwrap_or(&Value::Null)))
                .collect();
            writer.write_record(&record)?;
        }

        writer.flush()?;
    }
    Ok(buf)
}

/// Write a table to a CSV file.
pub fn write_csv_file<P: AsRef<Path>>(table: &RecordTable, path: P) -> ExportResult<()> {
    let bytes = table_to_csv(table)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Reduce a user-supplied name to a safe file stem.
///
/// Keeps ASCII letters, digits, `_`, `.` and `-`; collapses everything
/// else (including path separators) to `_` and strips leading/trailing
/// dots, so traversal sequences cannot survive. Falls back to `upload`
/// when nothing usable remains.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_' || c == '-');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Build the output file name for a project.
pub fn output_filename(project_name: &str) -> String {
    format!("{}{}", sanitize_file_stem(project_name), OUTPUT_SUFFIX)
}

/// Render a cell for CSV output. Nulls become empty fields; numbers keep
/// their full shortest-round-trip representation.
fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn sample_table() -> RecordTable {
        let mut table =
            RecordTable::new(vec!["name".into(), "Easting".into(), "Northing".into()]);
        let mut row = Map::new();
        row.insert("name".into(), json!("Raleigh"));
        row.insert("Easting".into(), json!(2107312.4299));
        row.insert("Northing".into(), json!(738866.6072));
        table.push_row(row);
        table
    }

    #[test]
    fn test_table_to_csv() {
        let bytes = table_to_csv(&sample_table()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("name,Easting,Northing"));
        assert_eq!(lines.next(), Some("Raleigh,2107312.4299,738866.6072"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_null_cells_become_empty_fields() {
        let mut table = RecordTable::new(vec!["a".into(), "b".into()]);
        let mut row = Map::new();
        row.insert("a".into(), Value::Null);
        row.insert("b".into(), json!("v"));
        table.push_row(row);

        let text = String::from_utf8(table_to_csv(&table).unwrap()).unwrap();
        assert!(text.contains("\n,v"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut table = RecordTable::new(vec!["name".into()]);
        let mut row = Map::new();
        row.insert("name".into(), json!("Raleigh, NC"));
        table.push_row(row);

        let text = String::from_utf8(table_to_csv(&table).unwrap()).unwrap();
        assert!(text.contains("\"Raleigh, NC\""));
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv_file(&sample_table(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("name,Easting,Northing"));
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("survey 2024"), "survey_2024");
        assert_eq!(sanitize_file_stem("Site-A_rev.2"), "Site-A_rev.2");
        assert_eq!(sanitize_file_stem("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_file_stem("..\\..\\secrets"), "secrets");
        assert_eq!(sanitize_file_stem("///"), "upload");
        assert_eq!(sanitize_file_stem(""), "upload");
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename("greenway survey"),
            "greenway_survey_converted_Northing_Easting.csv"
        );
    }
}
