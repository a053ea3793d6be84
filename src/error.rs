//! Error types for the PNZED conversion pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ValidationError`] - structural table validation failures
//! - [`ProjectionError`] - coordinate transformation failures
//! - [`ExportError`] - output writing failures
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP boundary errors
//!
//! Error conversion is automatic via `From` implementations, allowing `?`
//! to work across error boundaries. Every [`PipelineError`] also exposes a
//! stable machine-readable [`PipelineError::kind`] string so the HTTP layer
//! can translate failures without parsing display text.
//!
//! All pipeline failures are deterministic and input-caused: none are
//! transient, none are retried, and a failure anywhere aborts the whole
//! conversion with no partial output.

use thiserror::Error;

use crate::parser::ParseError;

// =============================================================================
// Validation Errors
// =============================================================================

/// Structural failures found by the table validator.
///
/// The validator rejects the whole table; it never drops offending rows.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or both named coordinate columns are absent from the table.
    #[error("Missing coordinate column(s): {}", columns.join(", "))]
    MissingColumns {
        /// The absent column names, in check order.
        columns: Vec<String>,
    },

    /// A coordinate cell is null or empty.
    #[error("Missing coordinate value in column '{column}' at row {row}")]
    MissingCoordinateValues { column: String, row: usize },
}

// =============================================================================
// Projection Errors
// =============================================================================

/// Failures while transforming coordinates between reference systems.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A CRS code was not recognized by the projection engine.
    #[error("Invalid CRS identifier '{crs}': {message}")]
    InvalidCrsIdentifier { crs: String, message: String },

    /// A coordinate value is non-numeric, non-finite, or outside the
    /// geographic range.
    #[error("Malformed coordinate in column '{column}' at row {row} (value '{value}'): {message}")]
    MalformedCoordinate {
        row: usize,
        column: String,
        value: String,
        message: String,
    },

    /// The engine could not compute the transform for a point.
    #[error("Projection failed at row {row} for point ({x}, {y}): {message}")]
    ProjectionFailure {
        row: usize,
        x: f64,
        y: f64,
        message: String,
    },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Failures while writing the converted table.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to write output.
    #[error("Failed to write output: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by the
/// [`crate::transform::pipeline`] entry points. It wraps all lower-level
/// errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input table parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Table validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Coordinate transformation error.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Output writing error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO error outside parse/export (e.g. reading the input file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable failure kind for API consumers.
    ///
    /// These strings are part of the HTTP contract; display text is not.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Parse(_) => "parse_error",
            PipelineError::Validation(ValidationError::MissingColumns { .. }) => "missing_columns",
            PipelineError::Validation(ValidationError::MissingCoordinateValues { .. }) => {
                "missing_coordinate_values"
            }
            PipelineError::Projection(ProjectionError::InvalidCrsIdentifier { .. }) => {
                "invalid_crs_identifier"
            }
            PipelineError::Projection(ProjectionError::MalformedCoordinate { .. }) => {
                "malformed_coordinate"
            }
            PipelineError::Projection(ProjectionError::ProjectionFailure { .. }) => {
                "projection_failure"
            }
            PipelineError::Export(_) => "export_error",
            PipelineError::Io(_) => "io_error",
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ValidationError -> PipelineError
        let validation_err = ValidationError::MissingColumns {
            columns: vec!["x".into(), "y".into()],
        };
        let pipeline_err: PipelineError = validation_err.into();
        assert!(pipeline_err.to_string().contains("x, y"));

        // ProjectionError -> PipelineError
        let projection_err = ProjectionError::InvalidCrsIdentifier {
            crs: "EPSG:999999".into(),
            message: "crs not found".into(),
        };
        let pipeline_err: PipelineError = projection_err.into();
        assert!(pipeline_err.to_string().contains("EPSG:999999"));
    }

    #[test]
    fn test_malformed_coordinate_format() {
        let err = ProjectionError::MalformedCoordinate {
            row: 3,
            column: "x".into(),
            value: "abc".into(),
            message: "not a number".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("'x'"));
        assert!(msg.contains("'abc'"));
    }

    #[test]
    fn test_pipeline_error_kinds_are_stable() {
        let err: PipelineError = ValidationError::MissingColumns {
            columns: vec!["x".into()],
        }
        .into();
        assert_eq!(err.kind(), "missing_columns");

        let err: PipelineError = ValidationError::MissingCoordinateValues {
            column: "y".into(),
            row: 0,
        }
        .into();
        assert_eq!(err.kind(), "missing_coordinate_values");

        let err: PipelineError = ProjectionError::ProjectionFailure {
            row: 0,
            x: 0.0,
            y: 0.0,
            message: "out of domain".into(),
        }
        .into();
        assert_eq!(err.kind(), "projection_failure");
    }
}
