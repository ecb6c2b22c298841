//! Stage 2: confounder analysis. Augments each hypothesis with classified
//! confounders and mediators and attaches a preliminary causal DAG.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use retain_core::errors::RetainResult;
use retain_core::models::{CausalStructure, DagEdge, DagNode, Hypothesis, NodeRole};
use retain_data::{corr, DataProfile, Dataset};
use tracing::{debug, warn};

use crate::llm::payloads;
use crate::llm::{prompts, StructuredClient};
use crate::util::humanize;

/// Size-vs-strength mix for the preliminary structure confidence.
const SIZE_CONFIDENCE_WEIGHT: f64 = 0.6;
const STRENGTH_CONFIDENCE_WEIGHT: f64 = 0.4;
const SIZE_CONFIDENCE_CEILING: f64 = 500.0;

/// Classifies confounder candidates and builds each hypothesis's DAG.
pub struct ConfounderAnalyzer<'a> {
    client: &'a StructuredClient,
}

impl<'a> ConfounderAnalyzer<'a> {
    pub fn new(client: &'a StructuredClient) -> Self {
        Self { client }
    }

    /// Analyze one hypothesis in place: reclassified variable lists plus a
    /// preliminary `CausalStructure` whose effect fields the tester fills.
    pub fn analyze(
        &self,
        hypothesis: &mut Hypothesis,
        dataset: &Dataset,
        profile: &DataProfile,
    ) -> RetainResult<()> {
        let candidates = self.candidate_set(hypothesis, dataset, profile);

        let (confounders, mediators, colliders) = if candidates.is_empty() {
            (Vec::new(), hypothesis.mediators.clone(), Vec::new())
        } else {
            let prompt = prompts::classification_prompt(hypothesis, &candidates, profile);
            let payload = self.client.request(
                prompts::CLASSIFICATION_SYSTEM_PROMPT,
                &prompt,
                prompts::CLASSIFICATION_SCHEMA_NAME,
                payloads::parse_classification,
            )?;

            let mut confounders = Vec::new();
            let mut mediators = hypothesis.mediators.clone();
            let mut colliders = Vec::new();
            for classification in payload.classifications {
                if !candidates.contains(&classification.variable) {
                    warn!(
                        variable = %classification.variable,
                        "classification for unknown candidate ignored"
                    );
                    continue;
                }
                match classification.role.as_str() {
                    "confounder" => confounders.push(classification.variable),
                    "mediator" => {
                        if !mediators.contains(&classification.variable) {
                            mediators.push(classification.variable);
                        }
                    }
                    "collider" => colliders.push(classification.variable),
                    _ => {}
                }
            }
            (confounders, mediators, colliders)
        };

        // Variable lists never include the endpoints themselves.
        let cause = hypothesis.cause.clone();
        let effect = hypothesis.effect.clone();
        let endpoint = move |name: &String| *name == cause || *name == effect;
        hypothesis.confounders = confounders.into_iter().filter(|c| !endpoint(c)).collect();
        hypothesis.mediators = mediators.into_iter().filter(|m| !endpoint(m)).collect();
        let colliders: Vec<String> = colliders.into_iter().filter(|c| !endpoint(c)).collect();

        let (nodes, edges) = self.build_dag(hypothesis, &colliders, dataset);
        let structure_confidence = structure_confidence(dataset.row_count(), &edges);

        hypothesis.causal_structure = Some(CausalStructure {
            hypothesis_id: hypothesis.id.clone(),
            direct_effect: 0.0,
            indirect_effect: 0.0,
            total_effect: 0.0,
            mediators: hypothesis.mediators.clone(),
            confounders: hypothesis.confounders.clone(),
            colliders,
            true_cause: hypothesis.cause.clone(),
            proximate_cause: hypothesis.cause.clone(),
            actionable_lever: humanize(&hypothesis.cause),
            nodes,
            edges,
            structure_confidence,
        });

        debug!(
            hypothesis_id = %hypothesis.id,
            confounders = hypothesis.confounders.len(),
            mediators = hypothesis.mediators.len(),
            "confounder analysis complete"
        );
        Ok(())
    }

    /// LLM-suggested confounders unioned with columns correlated (beyond
    /// the scan threshold) with both cause and effect.
    fn candidate_set(
        &self,
        hypothesis: &Hypothesis,
        dataset: &Dataset,
        profile: &DataProfile,
    ) -> Vec<String> {
        let threshold = self.client.config().correlation_scan_threshold;
        let mut candidates: Vec<String> = hypothesis
            .confounders
            .iter()
            .filter(|c| dataset.has_column(c))
            .cloned()
            .collect();

        for column in &profile.columns {
            if column.name == hypothesis.cause || column.name == hypothesis.effect {
                continue;
            }
            if candidates.contains(&column.name) {
                continue;
            }
            let with_cause = corr::column_correlation(dataset, &column.name, &hypothesis.cause);
            let with_effect = corr::column_correlation(dataset, &column.name, &hypothesis.effect);
            if let (Some(rc), Some(re)) = (with_cause, with_effect) {
                if rc.abs() > threshold && re.abs() > threshold {
                    candidates.push(column.name.clone());
                }
            }
        }
        candidates
    }

    /// Assemble the typed DAG and export it as id-referencing nodes/edges.
    fn build_dag(
        &self,
        hypothesis: &Hypothesis,
        colliders: &[String],
        dataset: &Dataset,
    ) -> (Vec<DagNode>, Vec<DagEdge>) {
        let mut graph: DiGraph<(String, NodeRole), f64> = DiGraph::new();
        let find_or_add = |graph: &mut DiGraph<(String, NodeRole), f64>,
                           name: &str,
                           role: NodeRole| {
            graph
                .node_indices()
                .find(|&i| graph[i].0 == name)
                .unwrap_or_else(|| graph.add_node((name.to_string(), role)))
        };

        let strength = |a: &str, b: &str| corr::column_correlation(dataset, a, b).unwrap_or(0.0);

        let cause = find_or_add(&mut graph, &hypothesis.cause, NodeRole::Treatment);
        let effect = find_or_add(&mut graph, &hypothesis.effect, NodeRole::Outcome);
        graph.add_edge(cause, effect, strength(&hypothesis.cause, &hypothesis.effect));

        for name in &hypothesis.confounders {
            let node = find_or_add(&mut graph, name, NodeRole::Confounder);
            graph.add_edge(node, cause, strength(name, &hypothesis.cause));
            graph.add_edge(node, effect, strength(name, &hypothesis.effect));
        }
        for name in &hypothesis.mediators {
            let node = find_or_add(&mut graph, name, NodeRole::Mediator);
            graph.add_edge(cause, node, strength(&hypothesis.cause, name));
            graph.add_edge(node, effect, strength(name, &hypothesis.effect));
        }
        for name in colliders {
            let node = find_or_add(&mut graph, name, NodeRole::Collider);
            graph.add_edge(cause, node, strength(&hypothesis.cause, name));
            graph.add_edge(effect, node, strength(&hypothesis.effect, name));
        }

        if is_cyclic_directed(&graph) {
            warn!(hypothesis_id = %hypothesis.id, "classified structure contains a cycle");
        }

        let nodes = graph
            .node_indices()
            .map(|i| DagNode {
                id: graph[i].0.clone(),
                label: humanize(&graph[i].0),
                role: graph[i].1,
            })
            .collect();
        let edges = graph
            .edge_indices()
            .filter_map(|e| {
                let (source, target) = graph.edge_endpoints(e)?;
                Some(DagEdge {
                    source: graph[source].0.clone(),
                    target: graph[target].0.clone(),
                    strength: graph[e],
                })
            })
            .collect();
        (nodes, edges)
    }
}

/// Sample size and mean edge strength blended into a [0, 1] score.
fn structure_confidence(row_count: usize, edges: &[DagEdge]) -> f64 {
    let size_confidence = (row_count as f64 / SIZE_CONFIDENCE_CEILING).min(1.0);
    let mean_strength = if edges.is_empty() {
        0.0
    } else {
        edges.iter().map(|e| e.strength.abs()).sum::<f64>() / edges.len() as f64
    };
    let strength_confidence = (mean_strength * 2.0).min(1.0);
    SIZE_CONFIDENCE_WEIGHT * size_confidence + STRENGTH_CONFIDENCE_WEIGHT * strength_confidence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_confidence_grows_with_sample_and_strength() {
        let weak = structure_confidence(50, &[]);
        let strong = structure_confidence(
            1000,
            &[DagEdge {
                source: "a".into(),
                target: "b".into(),
                strength: 0.6,
            }],
        );
        assert!(strong > weak);
        assert!(strong <= 1.0);
    }
}
