//! Analysis dispatch: choose the text or vision path and drive the model
//! call.
//!
//! ## Routing policy
//!
//! A deterministic, total function of classifier and extractor outcome:
//!
//! | Document kind | Extraction outcome  | Chosen path          |
//! |---------------|---------------------|----------------------|
//! | Pdf           | `Text(content)`     | text prompt          |
//! | Pdf           | `Empty` or `Failed` | vision, raw PDF bytes|
//! | Jpeg / Png    | n/a                 | vision, image bytes  |
//! | Unsupported   | n/a                 | rejected             |
//!
//! `Empty` and `Failed` are policy-equivalent here: a scanned PDF and a
//! malformed PDF are indistinguishable from the standpoint of "no extractable
//! text was obtained", so both fall back to vision.
//!
//! Prompt construction happens at dispatch time, not in the normalizer — the
//! instruction text is part of choosing a path. Both variants instruct the
//! model to return exactly one JSON object matching the report shape.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::CarscanError;
use crate::pipeline::classify::{MediaKind, UploadedDocument};
use crate::pipeline::extract::ExtractionResult;
use crate::prompts;
use crate::provider::{
    CompletionRequest, ImageAttachment, InferenceProvider, ModelReply, ProviderError,
};
use crate::report::AnalysisPath;
use crate::retry::{with_backoff, BackoffPolicy};

/// The prompt payload for one document — exactly one variant per request,
/// immutable once built.
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    /// Extracted report text for the text path.
    Text(String),
    /// Encoded document bytes for the vision path.
    Vision(ImageAttachment),
}

impl AnalysisRequest {
    pub fn path(&self) -> AnalysisPath {
        match self {
            AnalysisRequest::Text(_) => AnalysisPath::Text,
            AnalysisRequest::Vision(_) => AnalysisPath::Vision,
        }
    }
}

/// Select the analysis path for a classified document.
///
/// `extraction` carries the extractor outcome for PDFs; image uploads never
/// attempt extraction and pass `None`. Unsupported documents are rejected
/// here, before any prompt is built.
pub fn dispatch(
    document: &UploadedDocument,
    extraction: Option<&ExtractionResult>,
) -> Result<AnalysisRequest, CarscanError> {
    let Some(mime) = document.kind.vision_mime() else {
        return Err(CarscanError::UnsupportedDocument {
            filename: document.filename.clone(),
        });
    };

    if document.kind == MediaKind::Pdf {
        if let Some(ExtractionResult::Text(content)) = extraction {
            debug!(chars = content.len(), "dispatching extracted text");
            return Ok(AnalysisRequest::Text(content.clone()));
        }
        // Empty, Failed, or never attempted: no text was obtained.
        debug!("no extractable text, dispatching raw pdf to vision");
    }

    Ok(AnalysisRequest::Vision(ImageAttachment::from_bytes(
        &document.bytes,
        mime,
    )))
}

/// Send the request to the model collaborator and return its reply verbatim.
///
/// The call is wrapped in the exponential-backoff policy from the config;
/// retries are spent only on transient failures. Returns the reply together
/// with the retry count for the caller's stats.
pub async fn invoke(
    provider: &Arc<dyn InferenceProvider>,
    request: &AnalysisRequest,
    config: &AnalysisConfig,
) -> Result<(ModelReply, u32), CarscanError> {
    let completion = build_completion(request, config);
    let policy = BackoffPolicy {
        max_retries: config.max_retries,
        base_delay_ms: config.retry_backoff_ms,
    };

    let start = Instant::now();
    let result = with_backoff(&policy, ProviderError::is_transient, || {
        provider.complete(&completion)
    })
    .await;

    match result {
        Ok((reply, retries)) => {
            info!(
                provider = provider.name(),
                path = ?request.path(),
                retries,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "model call completed"
            );
            Ok((reply, retries))
        }
        Err(e) if e.is_transient() => Err(CarscanError::ServiceExhausted {
            attempts: policy.max_attempts(),
            last_error: e.to_string(),
        }),
        Err(e) => Err(CarscanError::ServiceError {
            message: e.to_string(),
        }),
    }
}

/// Map an [`AnalysisRequest`] onto a concrete completion request.
fn build_completion(request: &AnalysisRequest, config: &AnalysisConfig) -> CompletionRequest {
    let system = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| prompts::DEFAULT_SYSTEM_PROMPT.to_string());

    match request {
        AnalysisRequest::Text(content) => CompletionRequest {
            system: Some(system),
            user_text: prompts::text_instruction(content),
            image: None,
            // Provider-side JSON mode is available for plain text requests.
            force_json: true,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        },
        AnalysisRequest::Vision(image) => CompletionRequest {
            system: Some(system),
            user_text: prompts::vision_instruction(),
            image: Some(image.clone()),
            force_json: false,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_doc() -> UploadedDocument {
        UploadedDocument::new("inspection.pdf", b"%PDF-1.4 fake".to_vec())
    }

    #[test]
    fn pdf_with_text_takes_text_path() {
        let extraction = ExtractionResult::Text("Brakes at 30%".into());
        let request = dispatch(&pdf_doc(), Some(&extraction)).unwrap();
        match request {
            AnalysisRequest::Text(content) => assert_eq!(content, "Brakes at 30%"),
            other => panic!("expected text path, got {other:?}"),
        }
    }

    #[test]
    fn empty_and_failed_are_dispatch_equivalent() {
        let empty = dispatch(&pdf_doc(), Some(&ExtractionResult::Empty)).unwrap();
        let failed =
            dispatch(&pdf_doc(), Some(&ExtractionResult::Failed("corrupt".into()))).unwrap();

        assert_eq!(empty.path(), AnalysisPath::Vision);
        assert_eq!(failed.path(), AnalysisPath::Vision);

        // Both carry the raw PDF bytes under the same mime.
        for request in [empty, failed] {
            match request {
                AnalysisRequest::Vision(att) => assert_eq!(att.mime, "image/jpeg"),
                other => panic!("expected vision path, got {other:?}"),
            }
        }
    }

    #[test]
    fn images_go_straight_to_vision() {
        let jpeg = UploadedDocument::new("photo.JPG", vec![0xFF, 0xD8]);
        let png = UploadedDocument::new("photo.png", vec![0x89, 0x50]);

        match dispatch(&jpeg, None).unwrap() {
            AnalysisRequest::Vision(att) => assert_eq!(att.mime, "image/jpeg"),
            other => panic!("expected vision path, got {other:?}"),
        }
        match dispatch(&png, None).unwrap() {
            AnalysisRequest::Vision(att) => assert_eq!(att.mime, "image/png"),
            other => panic!("expected vision path, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_is_rejected_before_dispatch() {
        let doc = UploadedDocument::new("notes.txt", b"hello".to_vec());
        let err = dispatch(&doc, None).unwrap_err();
        assert!(matches!(err, CarscanError::UnsupportedDocument { .. }));
    }

    #[test]
    fn text_completion_uses_json_mode() {
        let config = AnalysisConfig::default();
        let request = AnalysisRequest::Text("engine fine".into());
        let completion = build_completion(&request, &config);

        assert!(completion.force_json);
        assert!(completion.image.is_none());
        assert!(completion.user_text.contains("engine fine"));
        assert!(completion.system.as_deref().unwrap().contains("Carscan"));
    }

    #[test]
    fn vision_completion_carries_the_image() {
        let config = AnalysisConfig::default();
        let request =
            AnalysisRequest::Vision(ImageAttachment::from_bytes(b"bytes", "image/jpeg"));
        let completion = build_completion(&request, &config);

        assert!(!completion.force_json);
        assert_eq!(completion.image.as_ref().unwrap().mime, "image/jpeg");
        assert!(completion.user_text.contains("ONLY valid JSON"));
    }

    #[test]
    fn system_prompt_override_applies_to_both_paths() {
        let config = AnalysisConfig::builder()
            .system_prompt("You are a forklift auditor.")
            .build()
            .unwrap();

        for request in [
            AnalysisRequest::Text("t".into()),
            AnalysisRequest::Vision(ImageAttachment::from_bytes(b"i", "image/png")),
        ] {
            let completion = build_completion(&request, &config);
            assert_eq!(
                completion.system.as_deref(),
                Some("You are a forklift auditor.")
            );
        }
    }
}
