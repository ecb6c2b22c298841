//! Structured-generation plumbing: prompts, typed payloads, and the
//! validate-and-retry client shared by the LLM-backed stages.

pub mod payloads;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use retain_core::config::ReasoningConfig;
use retain_core::errors::{LlmError, RetainError, RetainResult};
use retain_core::traits::{ILanguageModel, StructuredRequest};
use serde_json::Value;
use tracing::warn;

/// Wraps the injected model with schema validation and the corrective
/// retry loop. Schema violations and timeouts are retried up to the
/// configured budget; transport errors propagate immediately.
pub struct StructuredClient {
    model: Arc<dyn ILanguageModel>,
    config: ReasoningConfig,
}

impl StructuredClient {
    pub fn new(model: Arc<dyn ILanguageModel>, config: ReasoningConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    /// Request a structured object and validate it with `parse`.
    /// On validation failure the model is re-prompted with the validator's
    /// error text, up to `retry_budget` times.
    pub fn request<T>(
        &self,
        system: &str,
        prompt: &str,
        schema_name: &str,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> RetainResult<T> {
        let mut attempts: u32 = 0;
        let mut current_prompt = prompt.to_string();
        let mut last_error = String::new();

        loop {
            attempts += 1;
            let request = StructuredRequest {
                system: system.to_string(),
                prompt: current_prompt.clone(),
                schema_name: schema_name.to_string(),
                temperature: self.config.llm_temperature,
                timeout: Duration::from_secs(self.config.llm_timeout_secs),
            };

            match self.model.complete_structured(&request) {
                Ok(value) => match parse(&value) {
                    Ok(parsed) => return Ok(parsed),
                    Err(detail) => {
                        warn!(schema_name, attempts, %detail, "schema validation failed");
                        last_error = detail;
                    }
                },
                Err(RetainError::LlmError(LlmError::Timeout { budget_secs })) => {
                    warn!(schema_name, attempts, budget_secs, "model call timed out");
                    last_error = format!("call exceeded the {budget_secs}s timeout");
                }
                Err(other) => return Err(other),
            }

            if attempts > self.config.retry_budget {
                return Err(LlmError::SchemaViolation {
                    attempts,
                    detail: last_error,
                }
                .into());
            }
            current_prompt = format!(
                "{prompt}\n\nYour previous output failed validation because: \
                 {last_error}\nReturn ONLY a corrected JSON object matching the schema."
            );
        }
    }
}
