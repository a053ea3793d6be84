//! HTTP server for the PNZED conversion API.
//!
//! Serves the upload form, accepts coordinate tables for conversion and
//! hands the converted files back as downloads.
//!
//! # API Endpoints
//!
//! | Method | Path                       | Description                        |
//! |--------|----------------------------|------------------------------------|
//! | GET    | `/`                        | Upload form                        |
//! | GET    | `/health`                  | Health check                       |
//! | POST   | `/api/convert`             | Upload a table for conversion      |
//! | GET    | `/api/download/{filename}` | Download a converted file          |
//! | GET    | `/api/logs`                | SSE stream for real-time logs      |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Html, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::config::ServerConfig;
use super::logs::LOG_BROADCASTER;
use super::types::{error_response, pipeline_error_response, ConvertResponse};
use crate::error::PipelineError;
use crate::export::{output_filename, sanitize_file_stem, table_to_csv};
use crate::models::CrsId;
use crate::parser::supported_format;
use crate::transform::pipeline::{convert_upload, ConvertOptions};

type ApiError = (StatusCode, Json<Value>);

/// Start the HTTP server
pub async fn start_server(
    port: u16,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    config.ensure_dirs()?;
    let state = Arc::new(config);

    // Permissive CORS so the form page can be served from anywhere in dev
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/convert", post(convert))
        .route("/api/download/{filename}", get(download))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🌍 PNZED coordinate converter running on http://localhost:{port}");
    println!("   GET  /                       - Upload form");
    println!("   POST /api/convert            - Convert a coordinate table");
    println!("   GET  /api/download/{{file}}    - Download a converted file");
    println!("   GET  /api/logs               - SSE log stream");
    println!("   GET  /health                 - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Upload form page
async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pnzed",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "convert": "POST /api/convert",
            "download": "GET /api/download/{filename}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Convert endpoint: multipart upload of a coordinate table.
///
/// Fields: `project_name` (required), `file` (required, .csv/.xlsx/.xls),
/// plus optional `x_field`, `y_field`, `source_crs`, `target_crs`
/// overriding the configured defaults.
async fn convert(
    State(config): State<Arc<ServerConfig>>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut project_name: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;
    let mut overrides = FieldOverrides::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "project_name" => {
                project_name = Some(read_text(field, &name).await?);
            }
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(&format!("Read error: {e}")))?
                        .to_vec(),
                );
            }
            "x_field" => overrides.x_field = non_empty(read_text(field, &name).await?),
            "y_field" => overrides.y_field = non_empty(read_text(field, &name).await?),
            "source_crs" => overrides.source_crs = non_empty(read_text(field, &name).await?),
            "target_crs" => overrides.target_crs = non_empty(read_text(field, &name).await?),
            _ => {}
        }
    }

    let project_name = project_name
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| bad_request("Please provide a project name"))?;

    let bytes = file_data.ok_or_else(|| bad_request("No file uploaded"))?;
    let file_name = file_name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| bad_request("No file selected"))?;

    if supported_format(&file_name).is_none() {
        return Err(bad_request(
            "Invalid file type. Please upload a CSV or Excel file",
        ));
    }

    let options = overrides.into_options(&config);

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: {} ({} bytes) project '{}'",
        file_name,
        bytes.len(),
        project_name
    );
    println!("{}\n", "=".repeat(70));

    // Keep the upload on disk while the conversion runs, and clean it up
    // afterwards on every path.
    let upload_path = config
        .upload_dir
        .join(format!("{}_{}", Uuid::new_v4(), sanitize_file_stem(&file_name)));
    tokio::fs::write(&upload_path, &bytes)
        .await
        .map_err(|e| internal(&format!("Cannot store upload: {e}")))?;

    let result = convert_upload(&file_name, &bytes, &options);
    let _ = tokio::fs::remove_file(&upload_path).await;

    let outcome = result.map_err(|e| {
        eprintln!("❌ Conversion error: {e}");
        (pipeline_status(&e), Json(pipeline_error_response(&e)))
    })?;

    let filename = output_filename(&project_name);
    let output_path = config.output_dir.join(&filename);
    let csv_bytes =
        table_to_csv(&outcome.table).map_err(|e| internal(&format!("Export error: {e}")))?;
    let file_size_bytes = csv_bytes.len() as u64;
    tokio::fs::write(&output_path, csv_bytes)
        .await
        .map_err(|e| internal(&format!("Cannot write output: {e}")))?;

    println!("\n{}", "=".repeat(70));
    println!("📊 SUMMARY");
    println!("{}", "=".repeat(70));
    println!("   Rows converted: {}", outcome.table.len());
    println!("   CRS:            {} -> {}", options.source_crs, options.target_crs);
    println!("   Output:         {}", output_path.display());
    println!("{}\n", "=".repeat(70));

    Ok(Json(ConvertResponse::from_outcome(
        &outcome,
        filename,
        file_size_bytes,
        options.source_crs,
        options.target_crs,
    )))
}

/// Download a converted file as an attachment.
async fn download(
    State(config): State<Arc<ServerConfig>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Only names the sanitizer would itself produce are servable; anything
    // with separators or traversal sequences fails the comparison.
    let safe = sanitize_file_stem(&filename);
    if safe != filename {
        return Err(not_found());
    }

    let path = config.output_dir.join(&safe);
    let bytes = tokio::fs::read(&path).await.map_err(|_| not_found())?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{safe}\""),
            ),
        ],
        bytes,
    ))
}

// =============================================================================
// Request plumbing
// =============================================================================

/// Optional per-request overrides of the configured conversion defaults.
#[derive(Debug, Default)]
struct FieldOverrides {
    x_field: Option<String>,
    y_field: Option<String>,
    source_crs: Option<String>,
    target_crs: Option<String>,
}

impl FieldOverrides {
    fn into_options(self, config: &ServerConfig) -> ConvertOptions {
        ConvertOptions {
            x_field: self.x_field.unwrap_or_else(|| "x".to_string()),
            y_field: self.y_field.unwrap_or_else(|| "y".to_string()),
            source_crs: self
                .source_crs
                .map(CrsId::new)
                .unwrap_or_else(|| config.default_source_crs.clone()),
            target_crs: self
                .target_crs
                .map(CrsId::new)
                .unwrap_or_else(|| config.default_target_crs.clone()),
        }
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| bad_request(&format!("Cannot read field '{name}': {e}")))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Io(_) | PipelineError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(error_response("bad_request", message)),
    )
}

fn internal(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(error_response("internal_error", message)),
    )
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(error_response("not_found", "File not found")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_overrides_fall_back_to_config() {
        let config = ServerConfig::default();
        let options = FieldOverrides::default().into_options(&config);

        assert_eq!(options.x_field, "x");
        assert_eq!(options.y_field, "y");
        assert_eq!(options.source_crs, config.default_source_crs);
        assert_eq!(options.target_crs, config.default_target_crs);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = ServerConfig::default();
        let overrides = FieldOverrides {
            x_field: Some("lon".into()),
            y_field: Some("lat".into()),
            source_crs: Some("4269".into()),
            target_crs: Some("EPSG:2264".into()),
        };
        let options = overrides.into_options(&config);

        assert_eq!(options.x_field, "lon");
        assert_eq!(options.y_field, "lat");
        assert_eq!(options.source_crs, CrsId::new("EPSG:4269"));
        assert_eq!(options.target_crs, CrsId::new("EPSG:2264"));
    }

    #[test]
    fn test_pipeline_status_mapping() {
        let input_err: PipelineError = ValidationError::MissingColumns {
            columns: vec!["x".into()],
        }
        .into();
        assert_eq!(pipeline_status(&input_err), StatusCode::BAD_REQUEST);

        let io_err: PipelineError =
            std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(pipeline_status(&io_err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  ".into()), None);
        assert_eq!(non_empty(" lon ".into()), Some("lon".into()));
    }
}
