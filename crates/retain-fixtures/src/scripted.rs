//! A scripted language model: canned responses keyed by schema name,
//! with call accounting for retry assertions.

use std::collections::HashMap;
use std::sync::Mutex;

use retain_core::errors::{LlmError, RetainResult};
use retain_core::traits::{ILanguageModel, StructuredRequest};
use serde_json::Value;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Returned as-is; may deliberately violate the expected schema.
    Value(Value),
    /// Simulated transport failure.
    TransportError(String),
}

/// Deterministic stand-in for a real model.
///
/// Per-schema queues are drained first; when a queue is empty the schema's
/// default response is repeated. Every call is recorded.
#[derive(Default)]
pub struct ScriptedModel {
    queues: Mutex<HashMap<String, Vec<ScriptedResponse>>>,
    defaults: Mutex<HashMap<String, Value>>,
    call_log: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot response for a schema (drained in push order).
    pub fn enqueue(&self, schema: &str, response: ScriptedResponse) {
        self.queues
            .lock()
            .unwrap()
            .entry(schema.to_string())
            .or_default()
            .push(response);
    }

    /// Set the response repeated once the schema's queue is empty.
    pub fn set_default(&self, schema: &str, value: Value) {
        self.defaults
            .lock()
            .unwrap()
            .insert(schema.to_string(), value);
    }

    /// Total calls made, across all schemas.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Calls made for one schema.
    pub fn calls_for(&self, schema: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_str() == schema)
            .count()
    }
}

impl ILanguageModel for ScriptedModel {
    fn complete_structured(&self, request: &StructuredRequest) -> RetainResult<Value> {
        self.call_log
            .lock()
            .unwrap()
            .push(request.schema_name.clone());

        let queued = {
            let mut queues = self.queues.lock().unwrap();
            queues
                .get_mut(&request.schema_name)
                .filter(|q| !q.is_empty())
                .map(|q| q.remove(0))
        };
        if let Some(response) = queued {
            return match response {
                ScriptedResponse::Value(value) => Ok(value),
                ScriptedResponse::TransportError(message) => {
                    Err(LlmError::Transport { message }.into())
                }
            };
        }

        if let Some(value) = self.defaults.lock().unwrap().get(&request.schema_name) {
            return Ok(value.clone());
        }

        Err(LlmError::Transport {
            message: format!("no scripted response for schema '{}'", request.schema_name),
        }
        .into())
    }
}
