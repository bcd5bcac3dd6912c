//! HTTP integration tests for the upload service.
//!
//! Every request here is rejected before pdfium is touched, so these run
//! without a pdfium library. Rendering paths live in `tests/e2e.rs`.

#![cfg(feature = "server")]

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use pdf2img::server::{app, ServerConfig};
use serde_json::Value;

fn server() -> TestServer {
    TestServer::new(app(ServerConfig::default())).unwrap()
}

fn pdf_part(name: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(name)
        .mime_type("application/pdf")
}

async fn error_message(
    server: &TestServer,
    path: &str,
    form: MultipartForm,
) -> (StatusCode, String) {
    let response = server.post(path).multipart(form).await;
    let status = response.status_code();
    let body: Value = response.json();
    let message = body["error"].as_str().unwrap_or_default().to_string();
    (status, message)
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_active() {
    let response = server().get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "active");
    assert_eq!(body["service"], "PDF to Image Converter");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// ── Upload validation ────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_without_file_part() {
    let form = MultipartForm::new().add_text("dpi", "200");
    let (status, msg) = error_message(&server(), "/convert", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg, "No file part");
}

#[tokio::test]
async fn convert_with_empty_filename() {
    let form = MultipartForm::new().add_part("file", pdf_part("", b"%PDF-1.4\n"));
    let (status, msg) = error_message(&server(), "/convert", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg, "No selected file");
}

#[tokio::test]
async fn convert_rejects_non_pdf_name() {
    let form = MultipartForm::new().add_part("file", pdf_part("photo.png", b"%PDF-1.4\n"));
    let (status, msg) = error_message(&server(), "/convert", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg, "File must be a PDF");
}

#[tokio::test]
async fn convert_rejects_non_pdf_bytes() {
    let form = MultipartForm::new().add_part("file", pdf_part("invoice.pdf", b"PK\x03\x04zip"));
    let (status, msg) = error_message(&server(), "/convert", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(msg.contains("invoice.pdf"), "got: {msg}");
    assert!(msg.contains("not a valid PDF"), "got: {msg}");
}

#[tokio::test]
async fn convert_rejects_out_of_range_dpi() {
    let form = MultipartForm::new()
        .add_part("file", pdf_part("report.pdf", b"%PDF-1.4\n"))
        .add_text("dpi", "5000");
    let (status, msg) = error_message(&server(), "/convert", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(msg.contains("5000"), "got: {msg}");
}

#[tokio::test]
async fn convert_rejects_non_numeric_dpi() {
    let form = MultipartForm::new()
        .add_part("file", pdf_part("report.pdf", b"%PDF-1.4\n"))
        .add_text("dpi", "high");
    let (status, _) = error_message(&server(), "/convert", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn convert_rejects_unknown_format() {
    let form = MultipartForm::new()
        .add_part("file", pdf_part("report.pdf", b"%PDF-1.4\n"))
        .add_text("format", "tiff");
    let (status, msg) = error_message(&server(), "/convert", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(msg.contains("tiff"), "got: {msg}");
}

#[tokio::test]
async fn convert_rejects_oversized_upload() {
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..ServerConfig::default()
    };
    let server = TestServer::new(app(config)).unwrap();

    let mut payload = b"%PDF-1.4\n".to_vec();
    payload.resize(16 * 1024, b' ');
    let form = MultipartForm::new().add_part("file", pdf_part("big.pdf", &payload));

    let response = server.post("/convert").multipart(form).await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn inspect_without_file_part() {
    let form = MultipartForm::new().add_text("password", "x");
    let (status, msg) = error_message(&server(), "/inspect", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg, "No file part");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = server().get("/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
}
