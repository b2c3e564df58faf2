//! Turns violations and weak intent scores into refactoring suggestions.
//! Findings of one kind are aggregated into a single recommendation.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::intent::{EvidenceSignal, IntentKind, IntentResult};
use crate::types::{ComponentId, SeverityBand, Violation, ViolationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefactoringCategory {
    BreakCycle,
    ReduceCoupling,
    DecoupleBidirectional,
    ExtractClass,
    RealignArchitecture,
    EnforceLayering,
    Encapsulate,
    IntroduceAbstraction,
    SeparateConcerns,
}

impl fmt::Display for RefactoringCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefactoringCategory::BreakCycle => "break-cycle",
            RefactoringCategory::ReduceCoupling => "reduce-coupling",
            RefactoringCategory::DecoupleBidirectional => "decouple-bidirectional",
            RefactoringCategory::ExtractClass => "extract-class",
            RefactoringCategory::RealignArchitecture => "realign-architecture",
            RefactoringCategory::EnforceLayering => "enforce-layering",
            RefactoringCategory::Encapsulate => "encapsulate",
            RefactoringCategory::IntroduceAbstraction => "introduce-abstraction",
            RefactoringCategory::SeparateConcerns => "separate-concerns",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl From<SeverityBand> for Priority {
    fn from(band: SeverityBand) -> Self {
        match band {
            SeverityBand::Minor => Priority::Low,
            SeverityBand::Moderate => Priority::Medium,
            SeverityBand::Severe => Priority::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub related_violations: Vec<String>,
    pub category: RefactoringCategory,
    pub priority: Priority,
    pub affected_components: Vec<ComponentId>,
}

struct Template {
    category: RefactoringCategory,
    text: fn(usize, &str) -> String,
}

fn template_for(kind: ViolationKind) -> Template {
    match kind {
        ViolationKind::Cycle => Template {
            category: RefactoringCategory::BreakCycle,
            text: |n, who| {
                format!(
                    "Break {n} dependency cycle(s) among {who} by extracting the shared contract \
                     into its own component or inverting one dependency."
                )
            },
        },
        ViolationKind::TightCoupling => Template {
            category: RefactoringCategory::ReduceCoupling,
            text: |n, who| {
                format!(
                    "Reduce coupling of {n} highly connected component(s) ({who}) by splitting \
                     responsibilities or routing callers through a narrower interface."
                )
            },
        },
        ViolationKind::BidirectionalCoupling => Template {
            category: RefactoringCategory::DecoupleBidirectional,
            text: |n, who| {
                format!(
                    "Make {n} mutually dependent pair(s) one-directional ({who}); move the shared \
                     part into a component both can depend on."
                )
            },
        },
        ViolationKind::GodComponent => Template {
            category: RefactoringCategory::ExtractClass,
            text: |n, who| {
                format!(
                    "Split {n} oversized component(s) ({who}) into cohesive units with smaller \
                     public surfaces."
                )
            },
        },
        ViolationKind::Erosion => Template {
            category: RefactoringCategory::RealignArchitecture,
            text: |n, who| {
                format!(
                    "Realign {n} eroded architectural style(s): dependencies between {who} no \
                     longer follow the intended structure."
                )
            },
        },
        ViolationKind::LayerViolation => Template {
            category: RefactoringCategory::EnforceLayering,
            text: |n, who| {
                format!(
                    "Fix {n} dependency rule violation(s) involving {who} so that each edge \
                     follows the allowed direction between roles."
                )
            },
        },
    }
}

fn gap_template(kind: IntentKind) -> (RefactoringCategory, &'static str) {
    match kind {
        IntentKind::SeparationOfConcerns => (
            RefactoringCategory::SeparateConcerns,
            "Separate concerns: keep layers and feature domains from reaching into each other",
        ),
        IntentKind::InformationHiding => (
            RefactoringCategory::Encapsulate,
            "Encapsulate internals: export fewer symbols and depend only on public surfaces",
        ),
        IntentKind::DependencyInversion => (
            RefactoringCategory::IntroduceAbstraction,
            "Introduce abstractions: have high-level policy depend on interfaces and inject \
             concrete implementations",
        ),
    }
}

fn list(ids: &BTreeSet<ComponentId>) -> String {
    ids.iter().map(ComponentId::as_str).collect::<Vec<_>>().join(", ")
}

pub struct RecommendationEngine {
    gap_threshold: f64,
}

impl RecommendationEngine {
    pub fn new(gap_threshold: f64) -> Self {
        Self { gap_threshold }
    }

    /// One recommendation per violation kind plus one per weak intent,
    /// ordered by priority (highest first) then category.
    pub fn recommend(
        &self,
        violations: &[Violation],
        intents: &[IntentResult],
    ) -> Vec<Recommendation> {
        let mut by_kind: BTreeMap<ViolationKind, Vec<&Violation>> = BTreeMap::new();
        for v in violations {
            by_kind.entry(v.kind).or_default().push(v);
        }

        let mut recommendations: Vec<Recommendation> = by_kind
            .into_iter()
            .map(|(kind, group)| {
                let template = template_for(kind);
                let affected: BTreeSet<ComponentId> = group
                    .iter()
                    .flat_map(|v| v.participants.iter().cloned())
                    .collect();
                let band = group
                    .iter()
                    .map(|v| v.band)
                    .max()
                    .unwrap_or(SeverityBand::Minor);
                Recommendation {
                    text: (template.text)(group.len(), &list(&affected)),
                    related_violations: group.iter().map(|v| v.id.clone()).collect(),
                    category: template.category,
                    priority: band.into(),
                    affected_components: affected.into_iter().collect(),
                }
            })
            .collect();

        recommendations.extend(self.intent_gaps(intents));
        recommendations.sort_by_key(|r| (Reverse(r.priority), r.category));
        recommendations
    }

    /// Intents whose measured parts fall short of the gap threshold. An
    /// intent with no measured part at all is never a gap.
    fn intent_gaps(&self, intents: &[IntentResult]) -> Vec<Recommendation> {
        intents
            .iter()
            .filter_map(|r| r.measured_score().map(|score| (r, score)))
            .filter(|&(_, score)| score < self.gap_threshold)
            .map(|(r, score)| {
                let (category, advice) = gap_template(r.kind);
                let affected: BTreeSet<ComponentId> = r
                    .evidence
                    .iter()
                    .filter(|e| e.signal == EvidenceSignal::Weakens)
                    .flat_map(|e| e.components.iter().cloned())
                    .collect();
                // how far below the threshold, rescaled to [0, 1]
                let shortfall = 1.0 - score / self.gap_threshold;
                Recommendation {
                    text: format!("{advice} ({} scored {:.2}).", r.kind, score),
                    related_violations: Vec::new(),
                    category,
                    priority: SeverityBand::from_score(shortfall).into(),
                    affected_components: affected.into_iter().collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Evidence, MEASURED_SCORE};

    fn make_violation(id: &str, kind: ViolationKind, severity: f64, who: &[&str]) -> Violation {
        Violation::new(
            id.to_string(),
            kind,
            severity,
            who.iter().map(|s| ComponentId::from(*s)).collect(),
            String::new(),
        )
    }

    fn make_intent(kind: IntentKind, score: f64, insufficient: bool) -> IntentResult {
        IntentResult {
            kind,
            score,
            evidence: vec![Evidence {
                components: vec![ComponentId::from("x")],
                justification: String::new(),
                signal: EvidenceSignal::Weakens,
            }],
            insufficient_data: insufficient,
            metrics: Default::default(),
        }
    }

    #[test]
    fn test_violations_of_one_kind_aggregate() {
        let violations = vec![
            make_violation("cycle-1", ViolationKind::Cycle, 0.4, &["a", "b"]),
            make_violation("cycle-2", ViolationKind::Cycle, 0.7, &["c", "b"]),
        ];
        let recs = RecommendationEngine::new(0.5).recommend(&violations, &[]);
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.category, RefactoringCategory::BreakCycle);
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(rec.related_violations, vec!["cycle-1", "cycle-2"]);
        assert_eq!(
            rec.affected_components,
            vec![ComponentId::from("a"), ComponentId::from("b"), ComponentId::from("c")]
        );
        assert!(rec.text.contains("a, b, c"));
    }

    #[test]
    fn test_ordering_by_priority_then_kind() {
        let violations = vec![
            make_violation("god-component-1", ViolationKind::GodComponent, 0.35, &["g"]),
            make_violation("tight-coupling-1", ViolationKind::TightCoupling, 0.1, &["t"]),
            make_violation("cycle-1", ViolationKind::Cycle, 0.45, &["a", "b"]),
        ];
        let recs = RecommendationEngine::new(0.5).recommend(&violations, &[]);
        let categories: Vec<_> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                RefactoringCategory::BreakCycle,
                RefactoringCategory::ExtractClass,
                RefactoringCategory::ReduceCoupling,
            ]
        );
    }

    #[test]
    fn test_intent_gap_recommendation() {
        let intents = vec![
            make_intent(IntentKind::DependencyInversion, 0.1, false),
            make_intent(IntentKind::InformationHiding, 0.9, false),
            make_intent(IntentKind::SeparationOfConcerns, 0.2, true),
        ];
        let recs = RecommendationEngine::new(0.5).recommend(&[], &intents);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, RefactoringCategory::IntroduceAbstraction);
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].related_violations.is_empty());
        assert_eq!(recs[0].affected_components, vec![ComponentId::from("x")]);
    }

    #[test]
    fn test_partially_measured_intent_can_be_a_gap() {
        let mut hiding = make_intent(IntentKind::InformationHiding, 0.15, true);
        hiding.metrics.insert(MEASURED_SCORE.to_string(), 0.0);
        let unmeasured = make_intent(IntentKind::SeparationOfConcerns, 0.5, true);

        let recs = RecommendationEngine::new(0.5).recommend(&[], &[hiding, unmeasured]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, RefactoringCategory::Encapsulate);
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].text.contains("scored 0.00"));
    }

    #[test]
    fn test_nothing_to_recommend() {
        assert!(RecommendationEngine::new(0.5).recommend(&[], &[]).is_empty());
    }
}
