//! Response normalization: recover one JSON object from a free-text model
//! reply.
//!
//! ## The bracket-scan heuristic
//!
//! Models routinely wrap their JSON in prose ("Here is the report:") or
//! markdown fences despite being told not to. The recovery strategy is the
//! minimal robust one: take the substring from the first `{` to the last `}`
//! (inclusive) as the JSON candidate, or the whole reply when no such span
//! exists, and hand it to the parser.
//!
//! Known imprecision, preserved deliberately: prose containing stray braces
//! outside the JSON block can widen the candidate and defeat the parse. That
//! failure mode lands in `Malformed` with the reply preserved verbatim — an
//! expected outcome the caller handles as data, never a crash.

use tracing::debug;

use crate::pipeline::validate;
use crate::report::NormalizationOutcome;

/// Normalize a raw model reply into a validated report or a `Malformed`
/// record.
pub fn normalize(raw_reply: &str) -> NormalizationOutcome {
    let candidate = json_candidate(raw_reply);
    if candidate.len() != raw_reply.len() {
        debug!(
            reply_len = raw_reply.len(),
            candidate_len = candidate.len(),
            "trimmed prose around JSON candidate"
        );
    }

    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(value) => validate::validate(&value, raw_reply),
        Err(e) => NormalizationOutcome::Malformed {
            raw: raw_reply.to_string(),
            diagnostic: format!("reply is not parseable as JSON: {e}"),
        },
    }
}

/// The substring between the first `{` and the last `}`, inclusive, when
/// both exist in that order; the whole reply otherwise.
fn json_candidate(reply: &str) -> &str {
    match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => reply,
    }
}
