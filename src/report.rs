//! Report types: the validated schema, the normalization outcome, and the
//! wire shape returned to callers.
//!
//! The key distinction preserved here is transport success vs. content
//! validity. A model reply that fails to parse or validate is still a
//! completed analysis — it serializes as `{"error": "Invalid JSON",
//! "raw_response": …}` inside an otherwise successful response, never as a
//! crash or an `Err`. Downstream consumers can therefore trust a
//! [`NormalizationOutcome::Valid`] unconditionally: no coercion or repair is
//! ever applied to get there.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pipeline::classify::MediaKind;
use crate::pipeline::extract::ExtractionKind;

/// Severity of the vehicle's overall condition.
///
/// Matching is case-sensitive: the model must answer with exactly one of
/// `Low`, `Medium`, `High`, or `Critical`. A near-miss like `"low"` or
/// `"Extreme"` is a schema violation, reported rather than silently fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// The four permitted wire values, in severity order.
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            "Critical" => Ok(RiskLevel::Critical),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The validated condition report.
///
/// All fields are present and non-null once this type exists; the schema
/// validator refuses to construct it otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    /// One-line description of the vehicle's condition.
    pub summary: String,
    /// Overall severity, one of the four enumerated values.
    pub risk_level: RiskLevel,
    /// Observed problems, in the order the model listed them.
    pub issues: Vec<String>,
    /// Suggested maintenance actions, in the order the model listed them.
    pub maintenance: Vec<String>,
    /// Final advice to the owner.
    pub recommendation: String,
}

/// Terminal value of the normalization pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizationOutcome {
    /// The reply parsed and validated against the report schema.
    Valid(InspectionReport),
    /// The reply could not be coerced into a valid report.
    ///
    /// `raw` preserves the model's reply verbatim; `diagnostic` names the
    /// parse error or the violated field(s).
    Malformed { raw: String, diagnostic: String },
}

impl NormalizationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, NormalizationOutcome::Valid(_))
    }
}

/// The JSON shape returned to the boundary.
///
/// Serializes as `{"file": …, "report": …}` where `report` is either the
/// validated [`InspectionReport`] or the invalid-content object.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub file: String,
    pub report: ReportBody,
}

/// Either a validated report or the structured invalid-content record.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportBody {
    Report(InspectionReport),
    Invalid { error: String, raw_response: String },
}

/// Which analysis route the dispatcher chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPath {
    /// Extracted report text was sent to the model.
    Text,
    /// Raw document bytes were sent to the model as an image.
    Vision,
}

/// Timings and routing facts for one analysis, for logging and callers
/// that want to understand why a request took the path it did.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisStats {
    /// Media kind inferred from the uploaded filename.
    pub media_kind: MediaKind,
    /// Extraction outcome; `None` for image uploads (never attempted).
    pub extraction: Option<ExtractionKind>,
    /// Route taken to the model.
    pub path: AnalysisPath,
    /// Retries spent inside the backoff wrapper (0 = first attempt worked).
    pub retries: u32,
    /// Wall-clock time of the model call, retries included.
    pub model_duration_ms: u64,
    /// Wall-clock time of the whole pipeline.
    pub total_duration_ms: u64,
}

/// Full result of one analysis: the outcome plus routing stats.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Declared filename of the analyzed document.
    pub file: String,
    /// Normalized and validated (or not) model output.
    pub outcome: NormalizationOutcome,
    pub stats: AnalysisStats,
}

impl AnalysisOutput {
    /// Build the wire shape, consuming the output.
    pub fn into_response(self) -> AnalysisResponse {
        let report = match self.outcome {
            NormalizationOutcome::Valid(report) => ReportBody::Report(report),
            NormalizationOutcome::Malformed { raw, .. } => ReportBody::Invalid {
                error: "Invalid JSON".to_string(),
                raw_response: raw,
            },
        };
        AnalysisResponse {
            file: self.file,
            report,
        }
    }

    /// Build the wire shape without consuming the output.
    pub fn response(&self) -> AnalysisResponse {
        self.clone().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn risk_level_parse_is_case_sensitive() {
        assert_eq!("High".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert!("high".parse::<RiskLevel>().is_err());
        assert!("HIGH".parse::<RiskLevel>().is_err());
        assert!("Extreme".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn risk_level_serde_round_trip() {
        let json = serde_json::to_string(&RiskLevel::Critical).unwrap();
        assert_eq!(json, "\"Critical\"");
        let back: RiskLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RiskLevel::Critical);
    }

    #[test]
    fn risk_level_rejects_lowercase_on_deserialize() {
        assert!(serde_json::from_str::<RiskLevel>("\"critical\"").is_err());
    }

    fn sample_report() -> InspectionReport {
        InspectionReport {
            summary: "Engine in good shape".into(),
            risk_level: RiskLevel::Low,
            issues: vec!["worn wiper blades".into()],
            maintenance: vec!["replace wipers".into()],
            recommendation: "Safe to drive".into(),
        }
    }

    #[test]
    fn valid_response_wire_shape() {
        let output = AnalysisOutput {
            file: "report.pdf".into(),
            outcome: NormalizationOutcome::Valid(sample_report()),
            stats: AnalysisStats {
                media_kind: MediaKind::Pdf,
                extraction: None,
                path: AnalysisPath::Text,
                retries: 0,
                model_duration_ms: 10,
                total_duration_ms: 12,
            },
        };

        let value = serde_json::to_value(output.into_response()).unwrap();
        assert_eq!(value["file"], "report.pdf");
        assert_eq!(value["report"]["risk_level"], "Low");
        assert_eq!(value["report"]["issues"], json!(["worn wiper blades"]));
    }

    #[test]
    fn malformed_response_wire_shape() {
        let output = AnalysisOutput {
            file: "report.pdf".into(),
            outcome: NormalizationOutcome::Malformed {
                raw: "I could not read the document".into(),
                diagnostic: "no JSON object found".into(),
            },
            stats: AnalysisStats {
                media_kind: MediaKind::Pdf,
                extraction: None,
                path: AnalysisPath::Vision,
                retries: 0,
                model_duration_ms: 10,
                total_duration_ms: 12,
            },
        };

        let value = serde_json::to_value(output.into_response()).unwrap();
        assert_eq!(value["report"]["error"], "Invalid JSON");
        assert_eq!(
            value["report"]["raw_response"],
            "I could not read the document"
        );
    }

    #[test]
    fn non_ascii_survives_serialization_unescaped() {
        let mut report = sample_report();
        report.summary = "حالة السيارة جيدة".into();
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("حالة السيارة جيدة"), "got: {json}");
        assert!(!json.contains("\\u"), "non-ASCII must not be escaped");
    }
}
