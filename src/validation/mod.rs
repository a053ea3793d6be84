//! Structural validation of coordinate tables.
//!
//! The validator guarantees the transformer only ever receives a table
//! whose coordinate columns exist and are populated. Checks run in order
//! and short-circuit at the first violation:
//!
//! 1. Both named coordinate columns exist ([`ValidationError::MissingColumns`]).
//! 2. No coordinate cell is null or empty
//!    ([`ValidationError::MissingCoordinateValues`]).
//!
//! A violation rejects the whole table — offending rows are never dropped,
//! so the user sees the anomaly instead of silently losing records. The
//! validator performs no type coercion; non-numeric values surface later
//! from the transformer.

use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::models::RecordTable;

/// Validate that `x_field` and `y_field` are present and populated.
///
/// Pure inspection: the table is not modified. Row numbers in errors are
/// zero-based data row indices (header excluded).
pub fn validate_coordinate_columns(
    table: &RecordTable,
    x_field: &str,
    y_field: &str,
) -> ValidationResult<()> {
    let missing: Vec<String> = [x_field, y_field]
        .iter()
        .filter(|field| !table.has_column(field))
        .map(|field| field.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns { columns: missing });
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        for field in [x_field, y_field] {
            if is_missing(row.get(field)) {
                return Err(ValidationError::MissingCoordinateValues {
                    column: field.to_string(),
                    row: row_idx,
                });
            }
        }
    }

    Ok(())
}

/// A coordinate cell counts as missing when absent, null, or blank.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn table_from(rows: Vec<Vec<(&str, Value)>>) -> RecordTable {
        let headers: Vec<String> = rows
            .first()
            .map(|r| r.iter().map(|(k, _)| k.to_string()).collect())
            .unwrap_or_else(|| vec!["x".into(), "y".into()]);
        let mut table = RecordTable::new(headers);
        for row in rows {
            let mut map = Map::new();
            for (k, v) in row {
                map.insert(k.to_string(), v);
            }
            table.push_row(map);
        }
        table
    }

    #[test]
    fn test_valid_table_passes() {
        let table = table_from(vec![
            vec![("x", json!("-78.6382")), ("y", json!("35.7796"))],
            vec![("x", json!(-80.8431)), ("y", json!(35.2271))],
        ]);
        assert!(validate_coordinate_columns(&table, "x", "y").is_ok());
    }

    #[test]
    fn test_missing_x_column() {
        let table = table_from(vec![vec![("lon", json!("-78.6")), ("y", json!("35.8"))]]);
        let err = validate_coordinate_columns(&table, "x", "y").unwrap_err();
        match err {
            ValidationError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["x".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_both_columns_named() {
        let table = table_from(vec![vec![("lon", json!("1")), ("lat", json!("2"))]]);
        let err = validate_coordinate_columns(&table, "x", "y").unwrap_err();
        match err {
            ValidationError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["x".to_string(), "y".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_coordinate_rejects_whole_table() {
        let table = table_from(vec![
            vec![("x", json!("-78.6")), ("y", json!("35.8"))],
            vec![("x", json!(Value::Null)), ("y", json!("35.2"))],
        ]);
        let err = validate_coordinate_columns(&table, "x", "y").unwrap_err();
        match err {
            ValidationError::MissingCoordinateValues { column, row } => {
                assert_eq!(column, "x");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_string_counts_as_missing() {
        let table = table_from(vec![vec![("x", json!("-78.6")), ("y", json!("  "))]]);
        let err = validate_coordinate_columns(&table, "x", "y").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingCoordinateValues { ref column, row: 0 } if column == "y"
        ));
    }

    #[test]
    fn test_column_check_runs_before_value_check() {
        // A table with nulls AND a missing column reports the missing column.
        let table = table_from(vec![vec![("x", json!(Value::Null))]]);
        let err = validate_coordinate_columns(&table, "x", "y").unwrap_err();
        assert!(matches!(err, ValidationError::MissingColumns { .. }));
    }

    #[test]
    fn test_empty_table_with_columns_passes() {
        let table = RecordTable::new(vec!["x".into(), "y".into()]);
        assert!(validate_coordinate_columns(&table, "x", "y").is_ok());
    }

    #[test]
    fn test_non_numeric_values_pass_validation() {
        // Type checking is the transformer's job.
        let table = table_from(vec![vec![("x", json!("abc")), ("y", json!("35.8"))]]);
        assert!(validate_coordinate_columns(&table, "x", "y").is_ok());
    }
}
