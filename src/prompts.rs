//! Instruction text for the two analysis paths.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the report shape the model is asked for is
//!    written exactly once, so the text path and the vision path can never
//!    drift apart.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without
//!    calling a real model, making prompt regressions easy to catch.
//!
//! Callers can override the persona via
//! [`crate::config::AnalysisConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

/// Default persona for both analysis paths.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are Carscan, a senior vehicle inspection engineer. \
     Use English or Arabic based on user preference.";

/// The exact JSON shape both prompts demand from the model.
///
/// `risk_level` must be one of the four values verbatim; the schema validator
/// rejects anything else without repair.
pub const REPORT_SHAPE: &str = r#"{
  "summary": "1-line car condition",
  "risk_level": "Low|Medium|High|Critical",
  "issues": ["bullet points"],
  "maintenance": ["action items"],
  "recommendation": "final advice"
}"#;

/// Build the user message for the text path.
///
/// `report_text` is the extracted PDF text, appended verbatim after the
/// instruction block.
pub fn text_instruction(report_text: &str) -> String {
    format!(
        "Analyze this vehicle inspection report and return ONLY valid JSON:\n\n\
         {REPORT_SHAPE}\n\n\
         Report:\n{report_text}"
    )
}

/// Build the user message for the vision path.
///
/// The document travels as an image attachment in the same message; this text
/// carries the instruction.
pub fn vision_instruction() -> String {
    format!(
        "Analyze the vehicle inspection report in the image and return ONLY valid JSON:\n\n\
         {REPORT_SHAPE}"
    )
}
