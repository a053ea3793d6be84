//! High-level pipeline API for coordinate conversion.
//!
//! Combines the collaborators into the one operation the outside world
//! calls: take a table (or the bytes of one), validate its coordinate
//! columns, project every point from the source CRS to the target CRS, and
//! return the augmented table.
//!
//! # Example
//!
//! ```rust,ignore
//! use pnzed::{convert_file, ConvertOptions};
//!
//! let outcome = convert_file("points.csv", &ConvertOptions::default())?;
//! println!("Converted {} rows", outcome.table.len());
//! ```

use serde::Serialize;
use std::path::Path;

use crate::api::logs::{log_info, log_success};
use crate::error::PipelineResult;
use crate::models::{CrsId, RecordTable};
use crate::parser::{parse_upload, ParseResult};
use crate::transform::projector::Projector;
use crate::validation::validate_coordinate_columns;

/// Options for a conversion run.
///
/// Field names and the CRS pair are explicit parameters, never ambient
/// configuration: the pipeline is testable with nothing but a table.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Column holding the longitude (horizontal) coordinate.
    pub x_field: String,
    /// Column holding the latitude (vertical) coordinate.
    pub y_field: String,
    /// Geographic source CRS the input coordinates are expressed in.
    pub source_crs: CrsId,
    /// Projected target CRS for the Easting/Northing output.
    pub target_crs: CrsId,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            x_field: "x".to_string(),
            y_field: "y".to_string(),
            source_crs: CrsId::new("EPSG:4326"),
            target_crs: CrsId::new("EPSG:6543"),
        }
    }
}

/// Metadata about the parsed input, carried through to API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub format: String,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub sheet: Option<String>,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl SourceInfo {
    fn from_parse(parse: &ParseResult) -> Self {
        Self {
            format: parse.format.as_str().to_string(),
            encoding: parse.encoding.clone(),
            delimiter: parse.delimiter,
            sheet: parse.sheet.clone(),
            row_count: parse.table.len(),
            columns: parse.table.headers().to_vec(),
        }
    }
}

/// Result of a complete conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    /// The augmented table (original columns plus Easting/Northing).
    pub table: RecordTable,
    /// Input metadata.
    pub source: SourceInfo,
}

/// Convert an in-memory table.
///
/// This is the core operation: validator first, then the projector. The
/// whole table succeeds or the whole operation fails; no partial output.
pub fn convert_table(table: RecordTable, options: &ConvertOptions) -> PipelineResult<RecordTable> {
    validate_coordinate_columns(&table, &options.x_field, &options.y_field)?;

    let projector = Projector::new(&options.source_crs, &options.target_crs)?;
    let augmented = projector.project_table(table, &options.x_field, &options.y_field)?;

    Ok(augmented)
}

/// Convert uploaded bytes, dispatching the parser on the file name.
pub fn convert_upload(
    file_name: &str,
    bytes: &[u8],
    options: &ConvertOptions,
) -> PipelineResult<ConvertOutcome> {
    log_info(format!("Reading table from '{file_name}'..."));
    let parse = parse_upload(file_name, bytes)?;
    let source = SourceInfo::from_parse(&parse);

    match (&source.encoding, source.delimiter) {
        (Some(enc), Some(delim)) => {
            log_success(format!("Detected encoding: {enc}"));
            log_success(format!("Detected delimiter: '{}'", format_delimiter(delim)));
        }
        _ => {
            if let Some(sheet) = &source.sheet {
                log_success(format!("Read worksheet: {sheet}"));
            }
        }
    }
    log_success(format!(
        "Read {} rows, {} columns",
        source.row_count,
        source.columns.len()
    ));

    log_info(format!(
        "Validating coordinate columns '{}' and '{}'...",
        options.x_field, options.y_field
    ));
    log_info(format!(
        "Projecting {} -> {}...",
        options.source_crs, options.target_crs
    ));

    let table = convert_table(parse.table, options)?;
    log_success(format!(
        "Projected {} points, appended Easting/Northing",
        table.len()
    ));

    Ok(ConvertOutcome { table, source })
}

/// Convert a table file from disk.
pub fn convert_file<P: AsRef<Path>>(
    path: P,
    options: &ConvertOptions,
) -> PipelineResult<ConvertOutcome> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input.csv");
    convert_upload(name, &bytes, options)
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, ValidationError};
    use crate::transform::projector::{EASTING_FIELD, NORTHING_FIELD};

    fn nad83_options() -> ConvertOptions {
        ConvertOptions {
            x_field: "x".into(),
            y_field: "y".into(),
            source_crs: CrsId::new("EPSG:4269"),
            target_crs: CrsId::new("EPSG:2264"),
        }
    }

    #[test]
    fn test_default_options() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.x_field, "x");
        assert_eq!(opts.y_field, "y");
        assert_eq!(opts.source_crs, CrsId::new("EPSG:4326"));
        assert_eq!(opts.target_crs, CrsId::new("EPSG:6543"));
    }

    #[test]
    fn test_convert_upload_csv_end_to_end() {
        let csv = b"name,x,y\nRaleigh,-78.6382,35.7796\nCharlotte,-80.8431,35.2271\n";
        let outcome = convert_upload("points.csv", csv, &nad83_options()).unwrap();

        assert_eq!(outcome.source.format, "csv");
        assert_eq!(outcome.source.row_count, 2);
        assert_eq!(outcome.table.len(), 2);
        assert_eq!(
            outcome.table.headers(),
            ["name", "x", "y", EASTING_FIELD, NORTHING_FIELD]
        );
        assert_eq!(outcome.table.rows()[0]["name"], "Raleigh");

        let easting = outcome.table.rows()[0][EASTING_FIELD].as_f64().unwrap();
        assert!((easting - 2_107_312.43).abs() < 0.05);
    }

    #[test]
    fn test_missing_column_short_circuits_before_projection() {
        // An invalid CRS pair would fail at the projector, but the missing
        // column must surface first — the projector is never reached.
        let csv = b"lon,lat\n-78.6,35.8\n";
        let options = ConvertOptions {
            source_crs: CrsId::new("EPSG:999999"),
            ..nad83_options()
        };
        let err = convert_upload("points.csv", csv, &options).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::MissingColumns { .. })
        ));
        assert_eq!(err.kind(), "missing_columns");
    }

    #[test]
    fn test_null_value_rejects_table() {
        let csv = b"x,y\n-78.6,35.8\n,35.2\n";
        let err = convert_upload("points.csv", csv, &nad83_options()).unwrap_err();
        assert_eq!(err.kind(), "missing_coordinate_values");
    }

    #[test]
    fn test_invalid_target_crs_yields_typed_failure() {
        let csv = b"x,y\n-78.6,35.8\n";
        let options = ConvertOptions {
            target_crs: CrsId::new("EPSG:999999"),
            ..nad83_options()
        };
        let err = convert_upload("points.csv", csv, &options).unwrap_err();
        assert_eq!(err.kind(), "invalid_crs_identifier");
    }

    #[test]
    fn test_empty_table_succeeds_with_schema() {
        let csv = b"x,y\n";
        let outcome = convert_upload("points.csv", csv, &nad83_options()).unwrap();

        assert!(outcome.table.is_empty());
        assert_eq!(
            outcome.table.headers(),
            ["x", "y", EASTING_FIELD, NORTHING_FIELD]
        );
    }

    #[test]
    fn test_convert_file_roundtrip() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "x,y").unwrap();
        writeln!(file, "-78.6382,35.7796").unwrap();

        let outcome = convert_file(&path, &nad83_options()).unwrap();
        assert_eq!(outcome.table.len(), 1);
    }
}
