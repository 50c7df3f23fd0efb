//! Configuration for document analysis.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across the CLI, the server, and tests, and to
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use std::fmt;
use std::sync::Arc;

use crate::error::CarscanError;
use crate::provider::InferenceProvider;

/// Configuration for one or many analyses.
///
/// # Example
/// ```rust
/// use carscan::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gpt-4o")
///     .temperature(0.2)
///     .max_retries(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Model identifier. If `None`, resolution falls back to the
    /// `CARSCAN_MODEL` environment variable, then the provider default.
    pub model: Option<String>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to what the inspection
    /// document actually says — exactly what you want when the output is
    /// parsed into a fixed schema.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 800.
    ///
    /// A condition report is a handful of short fields; 800 covers even
    /// issue-heavy reports while keeping per-request cost predictable.
    pub max_tokens: u32,

    /// Maximum retry attempts on a transient model-service failure.
    /// Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles per retry).
    /// Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call HTTP timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom persona/system prompt. If `None`, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Pre-constructed inference provider. Takes precedence over
    /// environment-based resolution.
    pub provider: Option<Arc<dyn InferenceProvider>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.2,
            max_tokens: 800,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            system_prompt: None,
            provider: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt)
            .field(
                "provider",
                &self.provider.as_ref().map(|_| "<dyn InferenceProvider>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn InferenceProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, CarscanError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(CarscanError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(CarscanError::InvalidConfig(format!(
                "temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 800);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_backoff_ms, 500);
        assert!(config.model.is_none());
        assert!(config.provider.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let config = AnalysisConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let result = AnalysisConfig::builder().max_tokens(0).build();
        assert!(matches!(result, Err(CarscanError::InvalidConfig(_))));
    }

    #[test]
    fn debug_does_not_require_provider_debug() {
        let config = AnalysisConfig::default();
        let repr = format!("{config:?}");
        assert!(repr.contains("max_tokens: 800"));
    }
}
