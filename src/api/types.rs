//! REST API types for the conversion service.
//!
//! Responses are camelCase JSON; failure bodies carry the pipeline's
//! stable failure kind so clients can branch without parsing messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::models::CrsId;
use crate::transform::pipeline::{ConvertOutcome, SourceInfo};

/// Response sent after a successful upload conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: always "ready" on the success path
    pub status: String,

    /// Name of the produced output file
    pub filename: String,

    /// Download path for the produced file
    pub download_url: String,

    /// Size of the produced file in bytes
    pub file_size_bytes: u64,

    /// Metadata about the conversion
    pub metadata: ResponseMetadata,
}

/// Metadata about the conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Number of converted rows
    pub row_count: usize,

    /// Output column set (original columns plus Easting/Northing)
    pub columns: Vec<String>,

    /// Source CRS used for the conversion
    pub source_crs: CrsId,

    /// Target CRS used for the conversion
    pub target_crs: CrsId,

    /// Input file info
    pub source: SourceMetadata,

    /// Completion time
    pub completed_at: DateTime<Utc>,
}

/// Input file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub format: String,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub sheet: Option<String>,
}

impl From<&SourceInfo> for SourceMetadata {
    fn from(info: &SourceInfo) -> Self {
        Self {
            format: info.format.clone(),
            encoding: info.encoding.clone(),
            delimiter: info.delimiter.map(|d| d.to_string()),
            sheet: info.sheet.clone(),
        }
    }
}

impl ConvertResponse {
    /// Assemble the success response for a finished conversion.
    pub fn from_outcome(
        outcome: &ConvertOutcome,
        filename: String,
        file_size_bytes: u64,
        source_crs: CrsId,
        target_crs: CrsId,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            download_url: format!("/api/download/{filename}"),
            filename,
            file_size_bytes,
            metadata: ResponseMetadata {
                row_count: outcome.table.len(),
                columns: outcome.table.headers().to_vec(),
                source_crs,
                target_crs,
                source: SourceMetadata::from(&outcome.source),
                completed_at: Utc::now(),
            },
        }
    }
}

/// Create an error response body.
pub fn error_response(kind: &str, detail: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "errorKind": kind,
        "error": detail,
    })
}

/// Error body for a failed pipeline run.
pub fn pipeline_error_response(err: &PipelineError) -> Value {
    error_response(err.kind(), &err.to_string())
}
