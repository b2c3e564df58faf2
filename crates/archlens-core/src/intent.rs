//! Architectural-intent scorers: separation of concerns, information hiding
//! and dependency inversion. Each is a pure reader of the frozen graph.
//!
//! Every sub-ratio with an empty denominator takes the neutral value
//! [`NEUTRAL_SCORE`] and marks the result `insufficient_data`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{HealthWeights, HidingWeights, InversionWeights, SeparationWeights};
use crate::graph::ArchGraph;
use crate::layer::LayerClassifier;
use crate::types::{ArchLayer, ComponentId};

/// Substituted for any ratio that has nothing to measure.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Metric holding the score over measured sub-ratios when some were not.
pub const MEASURED_SCORE: &str = "measured_score";

/// A component counts as well encapsulated at or above this private ratio.
pub const ENCAPSULATED_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    SeparationOfConcerns,
    InformationHiding,
    DependencyInversion,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntentKind::SeparationOfConcerns => "separation of concerns",
            IntentKind::InformationHiding => "information hiding",
            IntentKind::DependencyInversion => "dependency inversion",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSignal {
    Supports,
    Weakens,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub components: Vec<ComponentId>,
    pub justification: String,
    pub signal: EvidenceSignal,
}

impl Evidence {
    fn supports(components: Vec<ComponentId>, justification: String) -> Self {
        Self {
            components,
            justification,
            signal: EvidenceSignal::Supports,
        }
    }

    fn weakens(components: Vec<ComponentId>, justification: String) -> Self {
        Self {
            components,
            justification,
            signal: EvidenceSignal::Weakens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub kind: IntentKind,
    pub score: f64,
    pub evidence: Vec<Evidence>,
    pub insufficient_data: bool,
    /// Named sub-ratios the score was combined from.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl IntentResult {
    /// Neutral result for graphs too small to say anything.
    pub fn insufficient(kind: IntentKind) -> Self {
        Self {
            kind,
            score: NEUTRAL_SCORE,
            evidence: Vec::new(),
            insufficient_data: true,
            metrics: BTreeMap::new(),
        }
    }

    /// The score over sub-ratios that had data: the full score when every
    /// part was measured, otherwise the `measured_score` metric if any part was.
    pub fn measured_score(&self) -> Option<f64> {
        if !self.insufficient_data {
            return Some(self.score);
        }
        self.metrics.get(MEASURED_SCORE).copied()
    }

    /// True if some supporting evidence item names `id`.
    pub fn supports(&self, id: &ComponentId) -> bool {
        self.evidence
            .iter()
            .any(|e| e.signal == EvidenceSignal::Supports && e.components.contains(id))
    }
}

/// Find one intent's result in a result list.
pub fn intent_of(intents: &[IntentResult], kind: IntentKind) -> Option<&IntentResult> {
    intents.iter().find(|r| r.kind == kind)
}

/// Capability contract shared by the intent scorers.
pub trait IntentDetector: Send + Sync {
    fn kind(&self) -> IntentKind;

    fn detect(&self, graph: &ArchGraph) -> IntentResult;
}

#[derive(Debug, Clone, Copy)]
struct Ratio {
    value: f64,
    insufficient: bool,
}

fn ratio(numerator: usize, denominator: usize) -> Ratio {
    if denominator == 0 {
        Ratio {
            value: NEUTRAL_SCORE,
            insufficient: true,
        }
    } else {
        Ratio {
            value: numerator as f64 / denominator as f64,
            insufficient: false,
        }
    }
}

fn mean(values: &[f64]) -> Ratio {
    if values.is_empty() {
        Ratio {
            value: NEUTRAL_SCORE,
            insufficient: true,
        }
    } else {
        Ratio {
            value: values.iter().sum::<f64>() / values.len() as f64,
            insufficient: false,
        }
    }
}

struct Combined {
    score: f64,
    insufficient: bool,
    /// Weighted average over the sub-ratios that had data.
    measured: Option<f64>,
}

impl Combined {
    fn into_result(
        self,
        kind: IntentKind,
        evidence: Vec<Evidence>,
        mut metrics: BTreeMap<String, f64>,
    ) -> IntentResult {
        if let (true, Some(measured)) = (self.insufficient, self.measured) {
            metrics.insert(MEASURED_SCORE.to_string(), measured);
        }
        IntentResult {
            kind,
            score: self.score,
            evidence,
            insufficient_data: self.insufficient,
            metrics,
        }
    }
}

fn weighted(parts: &[(f64, Ratio)]) -> Option<f64> {
    let total: f64 = parts.iter().map(|(w, _)| w).sum();
    if total <= 0.0 {
        return None;
    }
    let score = parts.iter().map(|(w, r)| w * r.value).sum::<f64>() / total;
    Some(score.clamp(0.0, 1.0))
}

/// Weighted average of sub-ratios, normalized by the weight sum.
fn combine(parts: &[(f64, Ratio)]) -> Combined {
    let Some(score) = weighted(parts) else {
        return Combined {
            score: NEUTRAL_SCORE,
            insufficient: true,
            measured: None,
        };
    };
    let known: Vec<(f64, Ratio)> = parts.iter().copied().filter(|(_, r)| !r.insufficient).collect();
    Combined {
        score,
        insufficient: known.len() < parts.len(),
        measured: weighted(&known),
    }
}

fn layers_of(graph: &ArchGraph, classifier: &LayerClassifier) -> HashMap<ComponentId, ArchLayer> {
    graph
        .components()
        .filter_map(|c| classifier.classify(&c.file_path).map(|l| (c.id.clone(), l)))
        .collect()
}

/// Scores how well layers and feature domains stay apart.
pub struct SeparationOfConcerns {
    classifier: LayerClassifier,
    weights: SeparationWeights,
}

impl SeparationOfConcerns {
    pub fn new(classifier: LayerClassifier, weights: SeparationWeights) -> Self {
        Self {
            classifier,
            weights,
        }
    }
}

impl IntentDetector for SeparationOfConcerns {
    fn kind(&self) -> IntentKind {
        IntentKind::SeparationOfConcerns
    }

    fn detect(&self, graph: &ArchGraph) -> IntentResult {
        if graph.node_count() < 2 {
            return IntentResult::insufficient(self.kind());
        }

        let layers = layers_of(graph, &self.classifier);
        let domains: HashMap<&ComponentId, String> = graph
            .components()
            .filter_map(|c| self.classifier.domain_key(&c.file_path).map(|d| (&c.id, d)))
            .collect();

        let mut evidence = Vec::new();
        let mut cross_layer = 0usize;
        let mut respecting = 0usize;
        let mut with_domains = 0usize;
        let mut cross_domain_edges = 0usize;
        let mut cross_domain: BTreeMap<(String, String), Vec<ComponentId>> = BTreeMap::new();

        for edge in graph.dependency_edges() {
            if let (Some(from), Some(to)) = (layers.get(&edge.source), layers.get(&edge.target)) {
                if from != to {
                    cross_layer += 1;
                    if from.violates_dependency_on(to) {
                        evidence.push(Evidence::weakens(
                            vec![edge.source.clone(), edge.target.clone()],
                            format!(
                                "{} ({from}) depends outward on {} ({to})",
                                edge.source, edge.target
                            ),
                        ));
                    } else {
                        respecting += 1;
                    }
                }
            }

            if let (Some(from), Some(to)) = (domains.get(&edge.source), domains.get(&edge.target)) {
                with_domains += 1;
                if from != to {
                    cross_domain_edges += 1;
                    let members = cross_domain.entry((from.clone(), to.clone())).or_default();
                    for id in [&edge.source, &edge.target] {
                        if !members.contains(id) {
                            members.push(id.clone());
                        }
                    }
                }
            }
        }

        for ((from, to), mut members) in cross_domain {
            members.sort();
            evidence.push(Evidence::weakens(
                members,
                format!("domain '{from}' reaches into domain '{to}'"),
            ));
        }

        let layered = layers.len();
        if layered > 0 {
            let mut ids: Vec<ComponentId> = layers.keys().cloned().collect();
            ids.sort();
            evidence.push(Evidence::supports(
                ids,
                format!(
                    "{layered} of {} components sit in a recognizable layer",
                    graph.node_count()
                ),
            ));
        }

        let layer_respect = ratio(respecting, cross_layer);
        let cross = ratio(cross_domain_edges, with_domains);
        let isolation = Ratio {
            value: 1.0 - cross.value,
            insufficient: cross.insufficient,
        };
        let combined = combine(&[
            (self.weights.layer_respect, layer_respect),
            (self.weights.domain_isolation, isolation),
        ]);

        let mut metrics = BTreeMap::new();
        metrics.insert("layer_respect_ratio".to_string(), layer_respect.value);
        metrics.insert("cross_domain_ratio".to_string(), cross.value);
        metrics.insert(
            "layered_fraction".to_string(),
            layered as f64 / graph.node_count() as f64,
        );

        combined.into_result(self.kind(), evidence, metrics)
    }
}

/// Scores how much of each component stays behind its public surface.
pub struct InformationHiding {
    weights: HidingWeights,
}

impl InformationHiding {
    pub fn new(weights: HidingWeights) -> Self {
        Self { weights }
    }
}

impl IntentDetector for InformationHiding {
    fn kind(&self) -> IntentKind {
        IntentKind::InformationHiding
    }

    fn detect(&self, graph: &ArchGraph) -> IntentResult {
        if graph.node_count() < 2 {
            return IntentResult::insufficient(self.kind());
        }

        let mut evidence = Vec::new();
        let mut ratios = Vec::new();
        for component in graph.components() {
            let Some(private) = component.private_ratio() else {
                continue;
            };
            ratios.push(private);
            if private >= ENCAPSULATED_RATIO {
                evidence.push(Evidence::supports(
                    vec![component.id.clone()],
                    format!(
                        "keeps {} of {} symbols private",
                        component.private_symbols.len(),
                        component.private_symbols.len() + component.exported_symbols.len()
                    ),
                ));
            } else if component.private_symbols.is_empty() {
                evidence.push(Evidence::weakens(
                    vec![component.id.clone()],
                    format!(
                        "exposes all {} of its symbols",
                        component.exported_symbols.len()
                    ),
                ));
            }
        }

        let abstractions = graph.components().filter(|c| c.declares_abstraction).count();

        let mut with_symbols = 0usize;
        let mut clear = 0usize;
        for edge in graph.dependency_edges() {
            if edge.symbols.is_empty() {
                continue;
            }
            let Some(target) = graph.component(&edge.target) else {
                continue;
            };
            with_symbols += 1;
            let leaked: Vec<&str> = edge
                .symbols
                .iter()
                .filter(|s| !target.exported_symbols.contains(*s))
                .map(String::as_str)
                .collect();
            if leaked.is_empty() {
                clear += 1;
            } else {
                evidence.push(Evidence::weakens(
                    vec![edge.source.clone(), edge.target.clone()],
                    format!(
                        "{} uses non-exported symbols of {}: {}",
                        edge.source,
                        edge.target,
                        leaked.join(", ")
                    ),
                ));
            }
        }

        let private_ratio = mean(&ratios);
        let abstraction = ratio(abstractions, graph.node_count());
        let boundary = ratio(clear, with_symbols);
        let combined = combine(&[
            (self.weights.private_ratio, private_ratio),
            (self.weights.abstraction, abstraction),
            (self.weights.boundary_clarity, boundary),
        ]);

        let mut metrics = BTreeMap::new();
        metrics.insert("private_symbol_ratio".to_string(), private_ratio.value);
        metrics.insert("abstraction_fraction".to_string(), abstraction.value);
        metrics.insert("boundary_clarity".to_string(), boundary.value);

        combined.into_result(self.kind(), evidence, metrics)
    }
}

/// Scores whether high-level policy reaches low-level detail through
/// abstractions rather than concrete components.
pub struct DependencyInversion {
    classifier: LayerClassifier,
    weights: InversionWeights,
}

impl DependencyInversion {
    pub fn new(classifier: LayerClassifier, weights: InversionWeights) -> Self {
        Self {
            classifier,
            weights,
        }
    }
}

impl IntentDetector for DependencyInversion {
    fn kind(&self) -> IntentKind {
        IntentKind::DependencyInversion
    }

    fn detect(&self, graph: &ArchGraph) -> IntentResult {
        if graph.node_count() < 2 {
            return IntentResult::insufficient(self.kind());
        }

        let depended_upon: Vec<_> = graph
            .components()
            .filter(|c| c.metrics.afferent > 0)
            .collect();
        let depending: Vec<_> = graph
            .components()
            .filter(|c| c.metrics.efferent > 0)
            .collect();
        let abstraction = ratio(
            depended_upon.iter().filter(|c| c.declares_abstraction).count(),
            depended_upon.len(),
        );
        let injection = ratio(
            depending.iter().filter(|c| c.uses_dependency_injection).count(),
            depending.len(),
        );

        let layers = layers_of(graph, &self.classifier);
        let mut evidence = Vec::new();
        let mut high_to_low = 0usize;
        let mut inverted = 0usize;
        for edge in graph.dependency_edges() {
            let (Some(from), Some(to)) = (layers.get(&edge.source), layers.get(&edge.target))
            else {
                continue;
            };
            if from.policy_level() <= to.policy_level() {
                continue;
            }
            let Some(target) = graph.component(&edge.target) else {
                continue;
            };
            high_to_low += 1;
            let participants = vec![edge.source.clone(), edge.target.clone()];
            if target.declares_abstraction {
                inverted += 1;
                evidence.push(Evidence::supports(
                    participants,
                    format!(
                        "{} ({from}) reaches {to} through the abstraction {}",
                        edge.source, edge.target
                    ),
                ));
            } else {
                evidence.push(Evidence::weakens(
                    participants,
                    format!(
                        "{} ({from}) depends on concrete {to} component {}",
                        edge.source, edge.target
                    ),
                ));
            }
        }

        let inversion = ratio(inverted, high_to_low);
        let combined = combine(&[
            (self.weights.abstraction, abstraction),
            (self.weights.injection, injection),
            (self.weights.inversion_ratio, inversion),
        ]);

        let mut metrics = BTreeMap::new();
        metrics.insert("abstraction_fraction".to_string(), abstraction.value);
        metrics.insert("injection_fraction".to_string(), injection.value);
        metrics.insert("inversion_ratio".to_string(), inversion.value);

        combined.into_result(self.kind(), evidence, metrics)
    }
}

/// Overall architectural health: weighted average of the three intent scores.
/// Missing intents count as neutral.
pub fn overall_health(intents: &[IntentResult], weights: &HealthWeights) -> f64 {
    let score_of = |kind| intent_of(intents, kind).map_or(NEUTRAL_SCORE, |r| r.score);
    let parts = [
        (
            weights.separation_of_concerns,
            score_of(IntentKind::SeparationOfConcerns),
        ),
        (
            weights.information_hiding,
            score_of(IntentKind::InformationHiding),
        ),
        (
            weights.dependency_inversion,
            score_of(IntentKind::DependencyInversion),
        ),
    ];
    let total: f64 = parts.iter().map(|(w, _)| w).sum();
    if total <= 0.0 {
        return NEUTRAL_SCORE;
    }
    (parts.iter().map(|(w, s)| w * s).sum::<f64>() / total).clamp(0.0, 1.0)
}
