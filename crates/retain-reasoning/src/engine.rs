//! ReasoningEngine — the public entry point wired by the HTTP/chat layer.

use std::sync::Arc;

use retain_core::config::RetainConfig;
use retain_core::models::{ErrorEnvelope, Opportunity, ReasoningSession};
use retain_core::traits::{ILanguageModel, ISnapshotObserver, NullObserver};
use retain_data::{Dataset, FeatureCatalog};

use crate::cancel::CancelToken;
use crate::pipeline::Pipeline;
use crate::sessions::SessionRegistry;

/// One engine serves many independent sessions. The language model,
/// dataset, and catalog are injected; there is no global state.
pub struct ReasoningEngine {
    pipeline: Pipeline,
    registry: SessionRegistry,
}

impl ReasoningEngine {
    pub fn new(model: Arc<dyn ILanguageModel>, config: RetainConfig) -> Self {
        Self {
            pipeline: Pipeline::new(model, &config),
            registry: SessionRegistry::new(),
        }
    }

    /// Run a full analysis to a terminal session.
    pub fn analyze(
        &self,
        opportunity: &Opportunity,
        dataset: &Dataset,
        catalog: &FeatureCatalog,
        business_context: Option<&str>,
    ) -> ReasoningSession {
        self.analyze_with_observer(
            opportunity,
            dataset,
            catalog,
            business_context,
            &CancelToken::new(),
            &NullObserver,
        )
    }

    /// Streaming variant: snapshots are pushed to the observer after each
    /// stage; the final event has stage `complete`. The cancel token is
    /// checked between stages.
    pub fn analyze_with_observer(
        &self,
        opportunity: &Opportunity,
        dataset: &Dataset,
        catalog: &FeatureCatalog,
        business_context: Option<&str>,
        cancel: &CancelToken,
        observer: &dyn ISnapshotObserver,
    ) -> ReasoningSession {
        let session = self.pipeline.run(
            opportunity,
            dataset,
            catalog,
            business_context,
            cancel,
            observer,
        );
        self.registry.upsert(session.clone());
        session
    }

    /// Failed-session envelope for UI display, if the session failed.
    pub fn error_envelope(session: &ReasoningSession) -> Option<ErrorEnvelope> {
        ErrorEnvelope::from_session(session)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}
