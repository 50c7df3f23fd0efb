//! HTTP boundary: a single upload-and-analyze endpoint.
//!
//! `POST /analyze-report` accepts one multipart file field and returns the
//! wire shape from [`crate::report::AnalysisResponse`]. Status codes encode
//! the error taxonomy:
//!
//! * `400` — no file in the body, or an unsupported file type
//! * `502` — the model service stayed down through every retry
//! * `500` — provider misconfiguration or internal failure
//! * `200` — the pipeline completed, **including** when the model's answer
//!   failed to validate; the invalid-content record travels in the body.
//!   Transport success and content validity are deliberately separate.
//!
//! The provider is resolved once at startup and shared read-only through the
//! router state; request handling holds no other shared resource.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::analyze::analyze;
use crate::config::AnalysisConfig;
use crate::error::CarscanError;

/// Upload cap. Inspection PDFs and phone photos sit well under this; the cap
/// exists so a stray upload cannot balloon memory.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build the application router around a fully-resolved config.
///
/// Callers should set `config.provider` before passing the config in, so
/// credentials are read once at startup rather than per request.
pub fn router(config: AnalysisConfig) -> Router {
    Router::new()
        .route("/analyze-report", post(analyze_report))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}

async fn analyze_report(
    State(config): State<AnalysisConfig>,
    mut multipart: Multipart,
) -> Response {
    let (filename, bytes) = match read_upload(&mut multipart).await {
        Ok(pair) => pair,
        Err(detail) => return error_response(StatusCode::BAD_REQUEST, &detail),
    };

    match analyze(&filename, bytes, &config).await {
        Ok(output) => (StatusCode::OK, Json(output.into_response())).into_response(),
        Err(e @ CarscanError::UnsupportedDocument { .. }) => {
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e @ CarscanError::ServiceExhausted { .. }) => {
            error_response(StatusCode::BAD_GATEWAY, &e.to_string())
        }
        Err(e) => {
            error!(error = %e, "analysis failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Pull the first field that carries a filename out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("reading multipart body: {e}"))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("reading upload '{filename}': {e}"))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err("multipart body contained no file field".to_string())
}

fn error_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}
