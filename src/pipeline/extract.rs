//! Text extraction: obtain machine-readable text from PDF bytes.
//!
//! ## Why three outcomes instead of two?
//!
//! A scanned PDF (no text layer) and a corrupt PDF both end the text path,
//! and the dispatcher treats them identically — from the standpoint of "no
//! extractable text was obtained" they are the same. They are still reported
//! as distinct variants because they mean different things operationally: a
//! fleet of `Empty` results says customers upload scans, a fleet of `Failed`
//! says something is mangling files in transit.
//!
//! Extraction is delegated to the pdf-extract crate. That crate (via its
//! font-parsing dependencies) is known to panic on certain malformed
//! fonts/glyphs, so the call is wrapped in `catch_unwind` and a panic is
//! reported as `Failed` like any other parse error.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of attempting text extraction from a PDF payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    /// The document has a text layer; `content` is the concatenated page
    /// text in page order.
    Text(String),
    /// The document parsed but yielded only whitespace — a scanned PDF.
    Empty,
    /// The payload could not be opened or parsed as a PDF at all.
    Failed(String),
}

impl ExtractionResult {
    /// Lightweight tag for logging and stats.
    pub fn kind(&self) -> ExtractionKind {
        match self {
            ExtractionResult::Text(_) => ExtractionKind::Text,
            ExtractionResult::Empty => ExtractionKind::Empty,
            ExtractionResult::Failed(_) => ExtractionKind::Failed,
        }
    }

    pub fn has_text(&self) -> bool {
        matches!(self, ExtractionResult::Text(_))
    }
}

/// [`ExtractionResult`] without its payload, for stats and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionKind {
    Text,
    Empty,
    Failed,
}

/// Extract text from a PDF byte payload.
///
/// Never errors: failure is an [`ExtractionResult::Failed`] value the caller
/// routes to the vision fallback.
pub fn extract(pdf_bytes: &[u8]) -> ExtractionResult {
    let attempt = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(pdf_bytes)
    }));

    match attempt {
        Ok(Ok(text)) => {
            debug!(chars = text.len(), "pdf text extraction completed");
            classify_text(text)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "pdf text extraction failed");
            ExtractionResult::Failed(e.to_string())
        }
        Err(_) => {
            warn!("pdf text extraction panicked, document likely has malformed fonts");
            ExtractionResult::Failed(
                "text extraction panicked, document likely has malformed fonts".to_string(),
            )
        }
    }
}

/// Apply the emptiness policy to extracted text.
///
/// The whitespace-trimmed result decides the outcome, but `Text` carries the
/// extraction as-is — callers get the document's own spacing, not a trimmed
/// rendition of it.
fn classify_text(text: String) -> ExtractionResult {
    if text.trim().is_empty() {
        ExtractionResult::Empty
    } else {
        ExtractionResult::Text(text)
    }
}
