/// Language-model call errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model output failed schema validation after {attempts} attempts: {detail}")]
    SchemaViolation { attempts: u32, detail: String },

    #[error("model call exceeded the {budget_secs}s timeout")]
    Timeout { budget_secs: u64 },

    #[error("model transport error: {message}")]
    Transport { message: String },
}
