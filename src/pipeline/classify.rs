//! Document classification: decide which extraction path applies.
//!
//! Classification is by declared filename extension only, case-insensitive.
//! The byte payload is carried along untouched — a PDF with no text layer is
//! indistinguishable from one with text until the extractor has run, so the
//! classifier makes no attempt to sniff content.

use serde::Serialize;

/// Media kind inferred from the uploaded filename.
///
/// `Unsupported` is a valid classification result, not an error; the caller
/// decides whether it is fatal (at the analysis boundary it is).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    Jpeg,
    Png,
    Unsupported,
}

impl MediaKind {
    /// Mime type used when the document is sent down the vision path.
    ///
    /// Raw PDF bytes travel under `image/jpeg`, matching the wire behavior
    /// the model service actually accepts for scanned-document fallback.
    pub fn vision_mime(&self) -> Option<&'static str> {
        match self {
            MediaKind::Pdf | MediaKind::Jpeg => Some("image/jpeg"),
            MediaKind::Png => Some("image/png"),
            MediaKind::Unsupported => None,
        }
    }
}

/// An uploaded document: raw bytes, declared filename, inferred kind.
///
/// Immutable once constructed; created once per request and discarded when
/// the pipeline completes.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let kind = classify(&filename);
        Self {
            filename,
            bytes,
            kind,
        }
    }
}

/// Classify a filename by its extension. Pure; never fails.
pub fn classify(filename: &str) -> MediaKind {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        MediaKind::Pdf
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        MediaKind::Jpeg
    } else if lower.ends_with(".png") {
        MediaKind::Png
    } else {
        MediaKind::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_any_case() {
        assert_eq!(classify("report.pdf"), MediaKind::Pdf);
        assert_eq!(classify("report.PDF"), MediaKind::Pdf);
        assert_eq!(classify("report.Pdf"), MediaKind::Pdf);
    }

    #[test]
    fn images_any_case() {
        assert_eq!(classify("scan.jpg"), MediaKind::Jpeg);
        assert_eq!(classify("scan.JPEG"), MediaKind::Jpeg);
        assert_eq!(classify("scan.png"), MediaKind::Png);
        assert_eq!(classify("scan.PNG"), MediaKind::Png);
    }

    #[test]
    fn everything_else_is_unsupported() {
        assert_eq!(classify("report.docx"), MediaKind::Unsupported);
        assert_eq!(classify("report.pdf.txt"), MediaKind::Unsupported);
        assert_eq!(classify("report"), MediaKind::Unsupported);
        assert_eq!(classify(""), MediaKind::Unsupported);
    }

    #[test]
    fn classification_ignores_payload() {
        // Empty bytes are fine at this stage; emptiness is the extractor's
        // concern, not the classifier's.
        let doc = UploadedDocument::new("empty.pdf", Vec::new());
        assert_eq!(doc.kind, MediaKind::Pdf);
    }

    #[test]
    fn vision_mime_per_kind() {
        assert_eq!(MediaKind::Pdf.vision_mime(), Some("image/jpeg"));
        assert_eq!(MediaKind::Jpeg.vision_mime(), Some("image/jpeg"));
        assert_eq!(MediaKind::Png.vision_mime(), Some("image/png"));
        assert_eq!(MediaKind::Unsupported.vision_mime(), None);
    }
}
