//! Report schema validation: confirm a parsed JSON object matches the
//! expected report shape.
//!
//! Every violation is collected and named so the diagnostic reads
//! "risk_level: …; issues[2]: …" rather than stopping at the first problem.
//! No coercion or repair is attempted — an invalid risk level is not
//! fuzzy-matched to a valid one — so a `Valid` outcome can be trusted
//! unconditionally downstream.

use serde_json::{Map, Value};

use crate::report::{InspectionReport, NormalizationOutcome, RiskLevel};

/// Validate a parsed JSON value against the report schema.
///
/// `raw` is the original model reply, carried into `Malformed` so callers
/// always get the text that produced the violation.
pub fn validate(value: &Value, raw: &str) -> NormalizationOutcome {
    let Some(obj) = value.as_object() else {
        return NormalizationOutcome::Malformed {
            raw: raw.to_string(),
            diagnostic: "reply is not a JSON object".to_string(),
        };
    };

    let mut violations: Vec<String> = Vec::new();

    let summary = require_string(obj, "summary", &mut violations);
    let risk_level = require_risk_level(obj, &mut violations);
    let issues = require_string_array(obj, "issues", &mut violations);
    let maintenance = require_string_array(obj, "maintenance", &mut violations);
    let recommendation = require_string(obj, "recommendation", &mut violations);

    // Every require_* that returns None also records a violation, so the
    // two arms below cannot disagree.
    match (summary, risk_level, issues, maintenance, recommendation) {
        (
            Some(summary),
            Some(risk_level),
            Some(issues),
            Some(maintenance),
            Some(recommendation),
        ) if violations.is_empty() => NormalizationOutcome::Valid(InspectionReport {
            summary,
            risk_level,
            issues,
            maintenance,
            recommendation,
        }),
        _ => NormalizationOutcome::Malformed {
            raw: raw.to_string(),
            diagnostic: violations.join("; "),
        },
    }
}

fn require_string(
    obj: &Map<String, Value>,
    field: &str,
    violations: &mut Vec<String>,
) -> Option<String> {
    match obj.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            violations.push(format!("{field}: expected a string, got {}", type_name(other)));
            None
        }
        None => {
            violations.push(format!("{field}: missing"));
            None
        }
    }
}

fn require_risk_level(
    obj: &Map<String, Value>,
    violations: &mut Vec<String>,
) -> Option<RiskLevel> {
    match obj.get("risk_level") {
        Some(Value::String(s)) => match s.parse::<RiskLevel>() {
            Ok(level) => Some(level),
            Err(()) => {
                violations.push(format!(
                    "risk_level: \"{s}\" is not one of Low, Medium, High, Critical"
                ));
                None
            }
        },
        Some(other) => {
            violations.push(format!(
                "risk_level: expected a string, got {}",
                type_name(other)
            ));
            None
        }
        None => {
            violations.push("risk_level: missing".to_string());
            None
        }
    }
}

fn require_string_array(
    obj: &Map<String, Value>,
    field: &str,
    violations: &mut Vec<String>,
) -> Option<Vec<String>> {
    match obj.get(field) {
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    other => {
                        violations.push(format!(
                            "{field}[{i}]: expected a string, got {}",
                            type_name(other)
                        ));
                        ok = false;
                    }
                }
            }
            ok.then_some(out)
        }
        Some(other) => {
            violations.push(format!("{field}: expected an array, got {}", type_name(other)));
            None
        }
        None => {
            violations.push(format!("{field}: missing"));
            None
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_value() -> Value {
        json!({
            "summary": "Front brakes near end of life",
            "risk_level": "Medium",
            "issues": ["brake pads at 15%", "left headlight misaligned"],
            "maintenance": ["replace brake pads"],
            "recommendation": "Service within two weeks"
        })
    }

    #[test]
    fn valid_object_builds_a_report() {
        match validate(&valid_value(), "raw") {
            NormalizationOutcome::Valid(report) => {
                assert_eq!(report.risk_level, RiskLevel::Medium);
                assert_eq!(report.issues.len(), 2);
                assert_eq!(report.maintenance, vec!["replace brake pads".to_string()]);
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn empty_sequences_are_permitted() {
        let mut value = valid_value();
        value["issues"] = json!([]);
        value["maintenance"] = json!([]);
        assert!(validate(&value, "raw").is_valid());
    }

    #[test]
    fn unknown_extra_fields_are_ignored() {
        let mut value = valid_value();
        value["confidence"] = json!(0.93);
        assert!(validate(&value, "raw").is_valid());
    }

    #[test]
    fn out_of_enum_risk_level_cites_the_field() {
        let mut value = valid_value();
        value["risk_level"] = json!("Extreme");
        match validate(&value, "raw text") {
            NormalizationOutcome::Malformed { raw, diagnostic } => {
                assert_eq!(raw, "raw text");
                assert!(diagnostic.contains("risk_level"), "got: {diagnostic}");
                assert!(diagnostic.contains("Extreme"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn lowercase_risk_level_is_rejected_not_repaired() {
        let mut value = valid_value();
        value["risk_level"] = json!("low");
        assert!(!validate(&value, "raw").is_valid());
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let value = json!({ "summary": "only this" });
        match validate(&value, "raw") {
            NormalizationOutcome::Malformed { diagnostic, .. } => {
                for field in ["risk_level", "issues", "maintenance", "recommendation"] {
                    assert!(
                        diagnostic.contains(field),
                        "diagnostic should cite {field}: {diagnostic}"
                    );
                }
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn wrong_shapes_are_named() {
        let mut value = valid_value();
        value["summary"] = json!(42);
        value["issues"] = json!("not a list");
        match validate(&value, "raw") {
            NormalizationOutcome::Malformed { diagnostic, .. } => {
                assert!(diagnostic.contains("summary: expected a string, got a number"));
                assert!(diagnostic.contains("issues: expected an array, got a string"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn non_string_array_item_is_located() {
        let mut value = valid_value();
        value["issues"] = json!(["fine", 7, "also fine"]);
        match validate(&value, "raw") {
            NormalizationOutcome::Malformed { diagnostic, .. } => {
                assert!(diagnostic.contains("issues[1]"), "got: {diagnostic}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn null_fields_are_violations() {
        let mut value = valid_value();
        value["recommendation"] = json!(null);
        match validate(&value, "raw") {
            NormalizationOutcome::Malformed { diagnostic, .. } => {
                assert!(diagnostic.contains("recommendation: expected a string, got null"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }
}
