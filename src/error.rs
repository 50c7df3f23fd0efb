//! Error types for the carscan library.
//!
//! Only genuinely fatal conditions surface as [`CarscanError`]: an unsupported
//! upload, a missing provider, an exhausted model service. Frequent, expected
//! branches are values instead of errors —
//! [`crate::pipeline::extract::ExtractionResult`] for PDFs with no text layer
//! and [`crate::report::NormalizationOutcome`] for model replies that fail to
//! validate. A scanned PDF or a prose-wrapped reply is data the pipeline
//! handles, not a fault it propagates.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the carscan library.
#[derive(Debug, Error)]
pub enum CarscanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The uploaded file's extension is neither PDF nor a supported image.
    #[error("Unsupported file type: '{filename}'. Upload a PDF, JPG, JPEG, or PNG.")]
    UnsupportedDocument { filename: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Model service errors ──────────────────────────────────────────────
    /// No inference provider could be resolved (missing API key etc.).
    #[error("No inference provider is configured.\n{hint}")]
    ProviderNotConfigured { hint: String },

    /// The model service returned a non-retryable error.
    #[error("Model service error: {message}")]
    ServiceError { message: String },

    /// Every retry attempt against the model service failed.
    #[error("Model service unavailable after {attempts} attempts.\nLast error: {last_error}")]
    ServiceExhausted { attempts: u32, last_error: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the report artifact.
    #[error("Failed to write report file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
