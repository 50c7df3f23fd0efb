//! # carscan
//!
//! Analyze vehicle-inspection documents (PDF or image) into structured
//! condition reports using a large-language-model service.
//!
//! ## Why this crate?
//!
//! Inspection reports arrive as whatever the workshop produced: a native-text
//! PDF export, a phone photo of a paper form, or a scanned PDF with no text
//! layer at all. This crate classifies the upload, extracts text when the
//! document has any, picks the right analysis path (text vs. vision), and —
//! the part that actually needs care — coerces the model's free-text answer
//! into a strict, validated report schema without ever crashing on the
//! malformed output models routinely produce.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (filename + bytes)
//!  │
//!  ├─ 1. Classify   extension → pdf / jpeg / png / unsupported
//!  ├─ 2. Extract    PDF text layer via pdf-extract (pdf only)
//!  ├─ 3. Dispatch   text prompt, or vision prompt with the raw bytes
//!  ├─ 4. Invoke     model call with bounded exponential-backoff retry
//!  ├─ 5. Normalize  bracket-scan JSON recovery from the raw reply
//!  └─ 6. Validate   schema check → InspectionReport | Malformed record
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carscan::{analyze_file, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider resolved from OPENAI_API_KEY.
//!     let config = AnalysisConfig::default();
//!     let output = analyze_file("inspection.pdf", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.response())?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `carscan` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | off     | Enables the `carscan-server` binary (axum upload endpoint) |
//!
//! Disable both when using only the library:
//! ```toml
//! carscan = { version = "0.1", default-features = false }
//! ```
//!
//! ## Malformed model output is data
//!
//! A reply that cannot be parsed or fails schema validation is returned as a
//! structured `{"error": "Invalid JSON", "raw_response": …}` record inside a
//! successful result — the pipeline completed; the content failed. Callers
//! should branch on [`report::NormalizationOutcome`], not catch errors.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod report;
pub mod retry;

#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_file, analyze_to_file};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::CarscanError;
pub use pipeline::classify::{classify, MediaKind, UploadedDocument};
pub use pipeline::dispatch::{dispatch, invoke, AnalysisRequest};
pub use pipeline::extract::{extract, ExtractionKind, ExtractionResult};
pub use pipeline::normalize::normalize;
pub use pipeline::validate::validate;
pub use provider::{
    CompletionRequest, ImageAttachment, InferenceProvider, ModelReply, OpenAiProvider,
    ProviderError,
};
pub use report::{
    AnalysisOutput, AnalysisPath, AnalysisResponse, AnalysisStats, InspectionReport,
    NormalizationOutcome, ReportBody, RiskLevel,
};
pub use retry::{with_backoff, BackoffPolicy};
