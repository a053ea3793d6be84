//! # PNZED - longitude/latitude to State Plane conversion
//!
//! PNZED takes tabular point data (CSV or Excel) with geographic
//! coordinates and appends projected `Easting`/`Northing` columns in a
//! regional State Plane system.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / Excel │────▶│  Validator  │────▶│  Projector  │────▶│ CSV download│
//! │  (auto-enc) │     │ (structure) │     │ (CRS → CRS) │     │ (East/North)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pnzed::{convert_file, ConvertOptions};
//!
//! let outcome = convert_file("points.csv", &ConvertOptions::default())?;
//! println!("Converted {} rows", outcome.table.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (RecordTable, CrsId)
//! - [`parser`] - CSV/Excel parsing with auto-detection
//! - [`validation`] - Coordinate column validation
//! - [`transform`] - Projection and pipeline
//! - [`export`] - CSV output and file naming
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Conversion
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExportError, PipelineError, ProjectionError, ServerError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CrsId, RecordTable};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    detect_delimiter, detect_encoding, parse_csv_bytes_auto, parse_csv_str, parse_table_file,
    parse_upload, supported_format, ParseError, ParseResult, TableFormat,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::validate_coordinate_columns;

// =============================================================================
// Re-exports - Conversion
// =============================================================================

pub use transform::pipeline::{
    convert_file, convert_table, convert_upload, ConvertOptions, ConvertOutcome, SourceInfo,
};
pub use transform::projector::{Projector, EASTING_FIELD, NORTHING_FIELD};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{output_filename, sanitize_file_stem, table_to_csv, write_csv_file};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::config::ServerConfig;
pub use api::types::{ConvertResponse, ResponseMetadata, SourceMetadata};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
