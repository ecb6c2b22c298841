//! Stage orchestration: the five stages run strictly in order over one
//! session. Stage errors are tagged onto the session and stop the run;
//! the cancel flag is checked between stages; a snapshot is emitted after
//! every stage and a final `complete` event carries the terminal session.

use std::sync::Arc;

use retain_core::config::RetainConfig;
use retain_core::models::{Opportunity, ReasoningSession, Stage, StageSnapshot};
use retain_core::traits::{ILanguageModel, ISnapshotObserver};
use retain_data::{profile, DataProfile, Dataset, FeatureCatalog};
use retain_stats::StatKernel;
use tracing::{error, info};

use crate::analyzer::ConfounderAnalyzer;
use crate::cancel::CancelToken;
use crate::explain::ExplanationGenerator;
use crate::generator::HypothesisGenerator;
use crate::levers::LeverEstimator;
use crate::llm::StructuredClient;
use crate::tester::CausalTester;

/// The five-stage pipeline. One instance serves many sessions; all
/// per-session state lives on the `ReasoningSession` record.
pub struct Pipeline {
    client: StructuredClient,
    kernel: StatKernel,
}

impl Pipeline {
    pub fn new(model: Arc<dyn ILanguageModel>, config: &RetainConfig) -> Self {
        Self {
            client: StructuredClient::new(model, config.reasoning.clone()),
            kernel: StatKernel::new(config.stats.clone()),
        }
    }

    /// Run one session to a terminal status.
    pub fn run(
        &self,
        opportunity: &Opportunity,
        dataset: &Dataset,
        catalog: &FeatureCatalog,
        business_context: Option<&str>,
        cancel: &CancelToken,
        observer: &dyn ISnapshotObserver,
    ) -> ReasoningSession {
        let mut session = ReasoningSession::new(&opportunity.id);
        info!(session_id = %session.id, opportunity_id = %opportunity.id, "session started");

        // Data quality gate, before any hypothesis generation.
        let profile = match profile(dataset, catalog, &opportunity.metric_name) {
            Ok(profile) => profile,
            Err(e) => {
                return self.fail(session, Stage::HypothesisGeneration, e.to_string(), observer)
            }
        };

        if cancel.is_cancelled() {
            return self.cancelled(session, observer);
        }

        // Stage 1: hypothesis generation.
        let generator = HypothesisGenerator::new(&self.client);
        match generator.generate(
            &session.id,
            opportunity,
            &profile,
            dataset,
            business_context,
        ) {
            Ok(hypotheses) => {
                for hypothesis in hypotheses {
                    session.add_hypothesis(hypothesis);
                }
            }
            Err(e) => {
                return self.fail(session, Stage::HypothesisGeneration, e.to_string(), observer)
            }
        }
        emit(observer, Stage::HypothesisGeneration, &session);
        if cancel.is_cancelled() {
            return self.cancelled(session, observer);
        }

        // Stage 2: confounder analysis.
        if let Err(e) = self.analyze_all(&mut session, dataset, &profile) {
            return self.fail(session, Stage::ConfounderAnalysis, e, observer);
        }
        emit(observer, Stage::ConfounderAnalysis, &session);
        if cancel.is_cancelled() {
            return self.cancelled(session, observer);
        }

        // Stage 3: causal testing.
        let tester = CausalTester::new(self.kernel.clone());
        if let Err(e) = tester.test_all(&mut session, dataset, &profile) {
            return self.fail(session, Stage::CausalTesting, e.to_string(), observer);
        }
        emit(observer, Stage::CausalTesting, &session);
        if cancel.is_cancelled() {
            return self.cancelled(session, observer);
        }

        // Stage 4: lever estimation.
        session.recommended_levers = LeverEstimator::new().estimate(&session);
        emit(observer, Stage::LeverEstimation, &session);
        if cancel.is_cancelled() {
            return self.cancelled(session, observer);
        }

        // Stage 5: explanation. Always completes (deterministic fallback).
        let explainer = ExplanationGenerator::new(&self.client);
        session.reasoning_chain = Some(explainer.generate(&session, opportunity, &profile));
        emit(observer, Stage::Explanation, &session);

        session.mark_completed();
        emit(observer, Stage::Complete, &session);
        info!(
            session_id = %session.id,
            validated = session.validated_hypotheses_count,
            "session completed"
        );
        session
    }

    fn analyze_all(
        &self,
        session: &mut ReasoningSession,
        dataset: &Dataset,
        profile: &DataProfile,
    ) -> Result<(), String> {
        let analyzer = ConfounderAnalyzer::new(&self.client);
        for hypothesis in session.hypotheses.iter_mut() {
            analyzer
                .analyze(hypothesis, dataset, profile)
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn fail(
        &self,
        mut session: ReasoningSession,
        stage: Stage,
        message: String,
        observer: &dyn ISnapshotObserver,
    ) -> ReasoningSession {
        error!(session_id = %session.id, stage = stage.as_str(), %message, "stage failed");
        session.mark_failed(stage, message);
        emit(observer, Stage::Complete, &session);
        session
    }

    fn cancelled(
        &self,
        mut session: ReasoningSession,
        observer: &dyn ISnapshotObserver,
    ) -> ReasoningSession {
        info!(session_id = %session.id, "session cancelled");
        session.mark_cancelled();
        emit(observer, Stage::Complete, &session);
        session
    }
}

fn emit(observer: &dyn ISnapshotObserver, stage: Stage, session: &ReasoningSession) {
    observer.on_snapshot(&StageSnapshot {
        stage,
        session: session.clone(),
    });
}
