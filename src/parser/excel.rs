//! Excel workbook parsing via calamine.
//!
//! Reads the first worksheet of an `.xlsx`/`.xls` upload into a
//! [`RecordTable`]. The first row is the header row. Empty cells become
//! JSON nulls so that missing coordinate values are visible to the
//! validator, and numeric cells stay numeric.

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use serde_json::{json, Map, Value};
use std::io::Cursor;

use super::{ParseError, ParseResult, TableFormat};
use crate::models::RecordTable;

/// Parse workbook bytes (first worksheet) into a table.
pub fn parse_workbook_bytes(bytes: &[u8]) -> Result<ParseResult, ParseError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| ParseError::new(0, format!("Cannot open workbook: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ParseError::new(0, "Workbook has no worksheets"))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::new(0, "Workbook has no worksheets"))?
        .map_err(|e| ParseError::new(0, format!("Cannot read worksheet: {e}")))?;

    let mut rows = range.rows();

    let header_cells = rows
        .next()
        .ok_or_else(|| ParseError::new(1, "Empty worksheet"))?;

    let headers: Vec<String> = header_cells.iter().map(header_text).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::new(1, "No headers found"));
    }

    let mut table = RecordTable::new(headers.clone());

    for cells in rows {
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        let mut row = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = cells.get(i).map(cell_value).unwrap_or(Value::Null);
            row.insert(header.clone(), value);
        }
        table.push_row(row);
    }

    Ok(ParseResult {
        table,
        format: TableFormat::Excel,
        encoding: None,
        delimiter: None,
        sheet: Some(sheet_name),
    })
}

fn header_text(cell: &Data) -> String {
    cell.as_string()
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| format!("{cell}").trim().to_string())
}

/// Convert a worksheet cell to a JSON value.
///
/// Empty cells map to null, not to an empty string: the validator treats
/// null as a missing coordinate value.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => json!(s.trim()),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Int(i) => json!(i),
        Data::Bool(b) => json!(b),
        other => json!(format!("{other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_mapping() {
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::String(" Raleigh ".into())), json!("Raleigh"));
        assert_eq!(cell_value(&Data::Float(-78.6382)), json!(-78.6382));
        assert_eq!(cell_value(&Data::Int(42)), json!(42));
        assert_eq!(cell_value(&Data::Bool(true)), json!(true));
    }

    #[test]
    fn test_header_text() {
        assert_eq!(header_text(&Data::String("  x ".into())), "x");
        assert_eq!(header_text(&Data::Float(1.0)), "1");
    }

    #[test]
    fn test_invalid_workbook_bytes_rejected() {
        let result = parse_workbook_bytes(b"x,y\n1,2\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("Cannot open workbook"));
    }
}
