//! Tabular input parsing with encoding and delimiter auto-detection.
//!
//! Converts uploaded CSV or Excel bytes into a [`RecordTable`]. No
//! geodetic logic here: the parser only produces rows, the validator and
//! transformer decide what the values mean.

use serde_json::{json, Map};
use std::path::Path;

use crate::models::RecordTable;

pub mod excel;

/// Table parsing error with context
#[derive(Debug, Clone)]
pub struct ParseError {
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(
                    f,
                    "Line {}, column '{}' (value '{}'): {}",
                    self.line, col, val, self.message
                )
            }
            (Some(col), None) => {
                write!(f, "Line {}, column '{}': {}", self.line, col, self.message)
            }
            _ => {
                write!(f, "Line {}: {}", self.line, self.message)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Input table format, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Excel,
}

impl TableFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Excel => "excel",
        }
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: RecordTable,
    /// Input format
    pub format: TableFormat,
    /// Detected encoding (CSV only)
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only)
    pub delimiter: Option<char>,
    /// Worksheet name (Excel only)
    pub sheet: Option<String>,
}

/// Map a file name to a supported table format, if any.
///
/// Accepted extensions: `csv`, `xlsx`, `xls`.
pub fn supported_format(file_name: &str) -> Option<TableFormat> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(TableFormat::Csv),
        "xlsx" | "xls" => Some(TableFormat::Excel),
        _ => None,
    }
}

/// Parse uploaded bytes, dispatching on the file extension.
pub fn parse_upload(file_name: &str, bytes: &[u8]) -> Result<ParseResult, ParseError> {
    match supported_format(file_name) {
        Some(TableFormat::Csv) => parse_csv_bytes_auto(bytes),
        Some(TableFormat::Excel) => excel::parse_workbook_bytes(bytes),
        None => Err(ParseError::new(
            0,
            format!("Unsupported file type: '{file_name}' (expected .csv, .xlsx or .xls)"),
        )),
    }
}

/// Parse a table file from disk, dispatching on the extension.
pub fn parse_table_file<P: AsRef<Path>>(path: P) -> Result<ParseResult, ParseError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| ParseError::new(0, format!("Cannot read file '{}': {}", path.display(), e)))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input.csv");
    parse_upload(name, &bytes)
}

// =============================================================================
// CSV
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> Result<String, ParseError> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string())),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        _ => {
            // Fallback: UTF-8 with lossy conversion
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes_auto(bytes: &[u8]) -> Result<ParseResult, ParseError> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        format: TableFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
        sheet: None,
    })
}

/// Parse CSV text with an explicit delimiter.
///
/// The first line is the header row; each following non-empty line becomes
/// one row keyed by the headers. Cell values stay strings; numeric
/// interpretation happens later, in the transformer.
pub fn parse_csv_str(content: &str, delimiter: char) -> Result<RecordTable, ParseError> {
    let mut lines = content.lines();

    let header_line = lines.next().ok_or_else(|| ParseError::new(1, "Empty file"))?;
    if header_line.trim().is_empty() {
        return Err(ParseError::new(1, "Empty file"));
    }

    let headers: Vec<String> = header_line
        .split(delimiter)
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::new(1, "No headers found"));
    }

    let mut table = RecordTable::new(headers.clone());

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let values: Vec<&str> = line.split(delimiter).collect();
        let mut row = Map::new();

        for (i, header) in headers.iter().enumerate() {
            let raw_value = values
                .get(i)
                .map(|s| s.trim().trim_matches('"'))
                .unwrap_or("");

            row.insert(header.clone(), json!(raw_value));
        }

        table.push_row(row);
    }

    Ok(table)
}
