//! HTTP front end: upload a PDF, download page images.
//!
//! | Method | Path       | Body                                   | Response |
//! |--------|------------|----------------------------------------|----------|
//! | GET    | `/health`  |                                        | JSON status |
//! | POST   | `/convert` | multipart `file`, `dpi`, `format`, `zip`, `password` | artifact bytes |
//! | POST   | `/inspect` | multipart `file`, `password`           | metadata JSON |
//!
//! Errors are JSON `{"error": "..."}` with a 4xx status for bad uploads and
//! 5xx for failures on our side.

use crate::config::{ConversionConfig, ConversionRequest, OutputFormat, DEFAULT_DPI};
use crate::convert::{convert_source, inspect_source};
use crate::error::Pdf2ImgError;
use crate::output::DocumentMetadata;
use crate::pipeline::input;
use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};

/// Response header carrying the number of pages in the artifact.
pub const PAGE_COUNT_HEADER: &str = "x-page-count";

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// DPI used when the form omits `dpi`.
    pub default_dpi: u32,
    /// Format used when the form omits `format`.
    pub default_format: OutputFormat,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    pub conversion: ConversionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            default_dpi: DEFAULT_DPI,
            default_format: OutputFormat::Png,
            max_upload_bytes: 50 * 1024 * 1024,
            conversion: ConversionConfig::default(),
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
}

// ── Errors ───────────────────────────────────────────────────────────────

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Conversion(#[from] Pdf2ImgError),

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Multipart(e) => e.status(),
            ApiError::Conversion(e) => match e {
                Pdf2ImgError::CorruptPdf { .. }
                | Pdf2ImgError::PasswordRequired { .. }
                | Pdf2ImgError::WrongPassword { .. }
                | Pdf2ImgError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
                e if e.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Multipart(e) => e.body_text(),
            ApiError::Conversion(e) => e.to_string(),
        };

        if status.is_server_error() {
            error!(status = %status, "{}", message);
        } else {
            warn!(status = %status, "{}", message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// ── Router ───────────────────────────────────────────────────────────────

/// Build the router with all routes and middleware.
pub fn app(config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = AppState {
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            header::CONTENT_DISPOSITION,
            HeaderName::from_static(PAGE_COUNT_HEADER),
        ]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/convert", post(convert_handler))
        .route("/inspect", post(inspect_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    info!("Server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /health   - Health check");
    info!("  POST /convert  - PDF to PNG/JPEG/SVG (single image or ZIP)");
    info!("  POST /inspect  - PDF metadata");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app(config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "active",
        service: "PDF to Image Converter",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Fields read from the upload form.
#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    dpi: Option<String>,
    format: Option<String>,
    zip: Option<String>,
    password: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or("").to_string();
                    let bytes = field.bytes().await?.to_vec();
                    form.file = Some((filename, bytes));
                }
                "dpi" => form.dpi = Some(field.text().await?),
                "format" => form.format = Some(field.text().await?),
                "zip" => form.zip = Some(field.text().await?),
                "password" => form.password = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }

    /// Validate the uploaded file, consuming it.
    fn take_source(&mut self) -> Result<input::PdfSource, Pdf2ImgError> {
        let (filename, bytes) = self
            .file
            .take()
            .ok_or_else(|| Pdf2ImgError::invalid_input("No file part"))?;
        input::validate_upload(&filename, bytes)
    }

    fn request(
        &self,
        source_name: &str,
        config: &ServerConfig,
    ) -> Result<ConversionRequest, Pdf2ImgError> {
        let format = match non_blank(&self.format) {
            Some(f) => f.parse::<OutputFormat>()?,
            None => config.default_format,
        };
        let dpi = match non_blank(&self.dpi) {
            Some(d) => d.parse::<u32>().map_err(|_| {
                Pdf2ImgError::InvalidConfig(format!("DPI must be a positive integer, got '{d}'"))
            })?,
            None => config.default_dpi,
        };

        let mut builder = ConversionRequest::builder(source_name)
            .format(format)
            .dpi(dpi)
            .force_zip(self.zip.as_deref().is_some_and(parse_flag));
        if let Some(pwd) = non_blank(&self.password) {
            builder = builder.password(pwd);
        }
        builder.build()
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// HTML-form style boolean.
fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

async fn convert_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let span = info_span!("convert", request_id = %uuid::Uuid::new_v4());
    handle_convert(state, multipart).instrument(span).await
}

async fn handle_convert(state: AppState, multipart: Multipart) -> Result<Response, ApiError> {
    let start = Instant::now();

    let mut form = UploadForm::read(multipart).await?;
    let source = form.take_source()?;
    let request = form.request(&source.name, &state.config)?;

    info!(
        file = %source.name,
        bytes = source.bytes.len(),
        format = %request.format,
        dpi = request.dpi,
        force_zip = request.force_zip,
        "Processing conversion request"
    );

    let output = convert_source(source, &request, &state.config.conversion).await?;
    let artifact = output.artifact;

    info!(
        artifact = %artifact.name,
        pages = output.stats.page_count,
        bytes = artifact.bytes.len(),
        total_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Conversion completed"
    );

    let disposition = HeaderValue::from_str(&content_disposition(&artifact.name))
        .map_err(|e| Pdf2ImgError::Internal(format!("Invalid Content-Disposition: {e}")))?;
    let content_type = HeaderValue::from_str(&artifact.mime)
        .map_err(|e| Pdf2ImgError::Internal(format!("Invalid Content-Type: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (
                HeaderName::from_static(PAGE_COUNT_HEADER),
                HeaderValue::from(output.stats.page_count),
            ),
        ],
        Body::from(artifact.bytes),
    )
        .into_response())
}

async fn inspect_handler(multipart: Multipart) -> Result<Json<DocumentMetadata>, ApiError> {
    let span = info_span!("inspect", request_id = %uuid::Uuid::new_v4());
    handle_inspect(multipart).instrument(span).await
}

async fn handle_inspect(multipart: Multipart) -> Result<Json<DocumentMetadata>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let source = form.take_source()?;
    let password = non_blank(&form.password).map(str::to_string);

    info!(file = %source.name, "Inspecting PDF");
    let meta = inspect_source(source, password.as_deref()).await?;
    Ok(Json(meta))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    let mut encoded = String::with_capacity(filename.len() * 3);
    for b in filename.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }

    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
