//! Top-level analysis entry points.
//!
//! [`analyze`] runs the whole pipeline for an in-memory upload; the file
//! variants wrap it for callers holding a path. All of them return
//! `Ok(AnalysisOutput)` even when the model's answer fails to validate —
//! transport success and content validity are separate concerns, and a
//! malformed reply is content the caller receives as data. Only unsupported
//! uploads, provider misconfiguration, and an exhausted model service are
//! `Err`.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::CarscanError;
use crate::pipeline::classify::{MediaKind, UploadedDocument};
use crate::pipeline::dispatch;
use crate::pipeline::extract;
use crate::pipeline::normalize;
use crate::provider::{InferenceProvider, OpenAiProvider};
use crate::report::{AnalysisOutput, AnalysisStats, NormalizationOutcome};

/// Analyze one uploaded document.
///
/// # Arguments
/// * `filename` — declared name of the upload; classification uses only its
///   extension
/// * `bytes` — the raw payload
/// * `config` — analysis configuration
///
/// # Errors
/// Returns `Err(CarscanError)` only for fatal conditions: an unsupported
/// file type, no resolvable provider, or a model service that stayed down
/// through every retry. A reply that fails normalization is an `Ok` carrying
/// [`NormalizationOutcome::Malformed`].
pub async fn analyze(
    filename: &str,
    bytes: Vec<u8>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, CarscanError> {
    let total_start = Instant::now();

    let document = UploadedDocument::new(filename, bytes);
    info!(
        file = %document.filename,
        kind = ?document.kind,
        size = document.bytes.len(),
        "received document"
    );

    if document.kind == MediaKind::Unsupported {
        warn!(file = %document.filename, "rejecting unsupported file type");
        return Err(CarscanError::UnsupportedDocument {
            filename: document.filename,
        });
    }

    let provider = resolve_provider(config)?;

    // Extraction is attempted for PDFs only; images go straight to vision.
    let extraction = match document.kind {
        MediaKind::Pdf => {
            let result = extract::extract(&document.bytes);
            info!(outcome = ?result.kind(), "pdf text extraction");
            Some(result)
        }
        _ => None,
    };

    let request = dispatch::dispatch(&document, extraction.as_ref())?;
    let path = request.path();
    info!(path = ?path, "analysis path selected");

    let model_start = Instant::now();
    let (reply, retries) = dispatch::invoke(&provider, &request, config).await?;
    let model_duration_ms = model_start.elapsed().as_millis() as u64;

    let outcome = normalize::normalize(&reply.content);
    match &outcome {
        NormalizationOutcome::Valid(report) => {
            info!(risk_level = %report.risk_level, "report validated");
        }
        NormalizationOutcome::Malformed { diagnostic, .. } => {
            warn!(%diagnostic, "model reply failed normalization");
        }
    }

    Ok(AnalysisOutput {
        file: document.filename,
        outcome,
        stats: AnalysisStats {
            media_kind: document.kind,
            extraction: extraction.map(|e| e.kind()),
            path,
            retries,
            model_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        },
    })
}

/// Analyze a document read from the local filesystem.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, CarscanError> {
    let path = path.as_ref();

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CarscanError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => CarscanError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => CarscanError::Internal(format!("reading '{}': {e}", path.display())),
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    analyze(&filename, bytes, config).await
}

/// Analyze a document and write the response JSON to `out_path`.
///
/// The artifact is the wire shape, pretty-printed, UTF-8 with non-ASCII
/// preserved unescaped. Uses atomic write (temp file + rename) to prevent
/// partial files.
pub async fn analyze_to_file(
    path: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, CarscanError> {
    let output = analyze_file(path, config).await?;
    let out_path = out_path.as_ref();

    let json = serde_json::to_string_pretty(&output.response())
        .map_err(|e| CarscanError::Internal(format!("serializing response: {e}")))?;

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CarscanError::OutputWriteFailed {
                    path: out_path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = out_path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| CarscanError::OutputWriteFailed {
            path: out_path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, out_path)
        .await
        .map_err(|e| CarscanError::OutputWriteFailed {
            path: out_path.to_path_buf(),
            source: e,
        })?;

    info!(path = %out_path.display(), "report written");
    Ok(output)
}

/// Resolve the inference provider, most-specific first.
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed it
///    entirely; used as-is. This is how tests inject a scripted provider.
/// 2. **Environment** — `OPENAI_API_KEY`, with the model taken from
///    `config.model`, then `CARSCAN_MODEL`, then the built-in default.
///
/// The resolved handle is cheap to clone and shared read-only; nothing
/// mutates provider state after this point.
fn resolve_provider(
    config: &AnalysisConfig,
) -> Result<Arc<dyn InferenceProvider>, CarscanError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let provider = OpenAiProvider::from_env(config.model.as_deref(), config.api_timeout_secs)?;
    Ok(Arc::new(provider))
}
