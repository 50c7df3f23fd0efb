//! Pipeline stages for document analysis.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap an
//! implementation (e.g. a different extraction backend) without touching the
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! classify ──▶ extract ──▶ dispatch ──▶ model ──▶ normalize ──▶ validate
//! (extension)  (pdf text)  (text|vision) (LLM)    (bracket scan) (schema)
//! ```
//!
//! 1. [`classify`]  — infer the media kind from the declared filename
//! 2. [`extract`]   — attempt native text extraction from PDF bytes
//! 3. [`dispatch`]  — choose the text or vision path, build the prompt, and
//!    drive the model call with retry/backoff; the only stage with network I/O
//! 4. [`normalize`] — recover one JSON object from the free-text reply
//! 5. [`validate`]  — enforce the report schema, naming every violation
//!
//! The flow is strictly sequential per request and shares nothing across
//! requests; the model call is the sole suspension point.

pub mod classify;
pub mod dispatch;
pub mod extract;
pub mod normalize;
pub mod validate;
