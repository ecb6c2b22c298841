use std::time::Duration;

use crate::errors::RetainResult;

/// A structured-generation request: system + user prompt with an embedded
/// JSON-schema excerpt, expecting a single JSON object back.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system: String,
    pub prompt: String,
    /// Name of the schema the response must match (for logs and errors).
    pub schema_name: String,
    pub temperature: f64,
    /// Hard deadline for the call.
    pub timeout: Duration,
}

/// The single capability the engine requires from an LLM provider:
/// given a structured prompt, return an object matching the schema.
///
/// No function-calling, vision, or streaming output is assumed.
pub trait ILanguageModel: Send + Sync {
    fn complete_structured(&self, request: &StructuredRequest) -> RetainResult<serde_json::Value>;
}
