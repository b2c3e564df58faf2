//! Structural anti-patterns: cycles, tight and bidirectional coupling, god
//! components, and erosion of the detected architectural style.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::AntiPatternConfig;
use crate::graph::{ArchGraph, CycleGroup};
use crate::style::{Classification, StyleResult};
use crate::types::{ComponentId, Violation, ViolationKind};

/// Severity of a cycle: grows with member count and intra-cycle weight,
/// approaching but never reaching 1.
pub fn cycle_severity(group: &CycleGroup) -> f64 {
    let x = 0.25 * group.members.len() as f64 + 0.05 * group.internal_weight as f64;
    x / (1.0 + x)
}

/// Tight-coupling severity added per unit of normalized betweenness, so hubs
/// on many shortest paths rank above equally connected leaves.
pub const BOTTLENECK_WEIGHT: f64 = 0.3;

/// Nearest-rank percentile of `values` (`p` in (0, 1]). Zero for no values.
pub fn nearest_rank(values: &[usize], p: f64) -> usize {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

pub struct AntiPatternDetector {
    config: AntiPatternConfig,
}

impl AntiPatternDetector {
    pub fn new(config: AntiPatternConfig) -> Self {
        Self { config }
    }

    /// All findings, grouped by kind in a fixed order.
    pub fn detect(
        &self,
        graph: &ArchGraph,
        styles: &[StyleResult],
        classification: &Classification,
    ) -> Vec<Violation> {
        let mut violations = self.cycles(graph);
        violations.extend(self.tight_coupling(graph));
        violations.extend(self.bidirectional_coupling(graph));
        violations.extend(self.god_components(graph));
        violations.extend(self.erosion(styles, classification));
        debug!(count = violations.len(), "anti-patterns detected");
        violations
    }

    fn cycles(&self, graph: &ArchGraph) -> Vec<Violation> {
        graph
            .cycles()
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let names: Vec<&str> = group.members.iter().map(ComponentId::as_str).collect();
                let description = if group.is_self_loop() {
                    format!("{} depends on itself", names[0])
                } else {
                    format!(
                        "dependency cycle through {} components: {}",
                        names.len(),
                        names.join(", ")
                    )
                };
                Violation::new(
                    format!("cycle-{}", i + 1),
                    ViolationKind::Cycle,
                    cycle_severity(group),
                    group.members.clone(),
                    description,
                )
            })
            .collect()
    }

    fn tight_coupling(&self, graph: &ArchGraph) -> Vec<Violation> {
        let degrees: Vec<usize> = graph
            .components()
            .map(|c| c.metrics.total_coupling())
            .collect();
        let reference = nearest_rank(&degrees, self.config.coupling_percentile);
        let cap = self.config.coupling_cap;

        graph
            .components()
            .filter(|c| {
                let degree = c.metrics.total_coupling();
                (degree > reference && degree >= self.config.coupling_floor) || degree > cap
            })
            .enumerate()
            .map(|(i, c)| {
                let degree = c.metrics.total_coupling();
                let baseline = reference.min(cap) as f64;
                let betweenness = c.metrics.betweenness_centrality;
                let severity = (1.0 - baseline / degree as f64 + BOTTLENECK_WEIGHT * betweenness)
                    .clamp(0.05, 1.0);
                let mut description = format!(
                    "{} has {} dependencies ({} in, {} out); the {:.0}th percentile is {}",
                    c.id,
                    degree,
                    c.metrics.afferent,
                    c.metrics.efferent,
                    self.config.coupling_percentile * 100.0,
                    reference
                );
                if betweenness > 0.0 {
                    description.push_str(&format!(
                        "; it lies on {:.0}% of shortest paths",
                        betweenness * 100.0
                    ));
                }
                Violation::new(
                    format!("tight-coupling-{}", i + 1),
                    ViolationKind::TightCoupling,
                    severity,
                    vec![c.id.clone()],
                    description,
                )
            })
            .collect()
    }

    fn bidirectional_coupling(&self, graph: &ArchGraph) -> Vec<Violation> {
        let pairs: BTreeSet<(&ComponentId, &ComponentId)> = graph
            .dependency_edges()
            .filter(|e| e.source < e.target && graph.has_edge(&e.target, &e.source))
            .map(|e| (&e.source, &e.target))
            .collect();

        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (a, b))| {
                let weight = graph.weight_between(a, b) + graph.weight_between(b, a);
                let x = weight as f64;
                Violation::new(
                    format!("bidirectional-coupling-{}", i + 1),
                    ViolationKind::BidirectionalCoupling,
                    0.3 + 0.4 * x / (x + 4.0),
                    vec![a.clone(), b.clone()],
                    format!("{a} and {b} depend on each other ({weight} references)"),
                )
            })
            .collect()
    }

    fn god_components(&self, graph: &ArchGraph) -> Vec<Violation> {
        let limits = &self.config.god_component;
        graph
            .components()
            .filter(|c| {
                c.loc > limits.loc
                    && c.metrics.efferent > limits.efferent
                    && c.exported_symbols.len() > limits.exported_symbols
            })
            .enumerate()
            .map(|(i, c)| {
                let excess = |value: usize, limit: usize| 1.0 - limit as f64 / value as f64;
                let mean = (excess(c.loc, limits.loc)
                    + excess(c.metrics.efferent, limits.efferent)
                    + excess(c.exported_symbols.len(), limits.exported_symbols))
                    / 3.0;
                Violation::new(
                    format!("god-component-{}", i + 1),
                    ViolationKind::GodComponent,
                    0.3 + 0.7 * mean,
                    vec![c.id.clone()],
                    format!(
                        "{} has {} lines, {} outgoing dependencies and {} exported symbols",
                        c.id,
                        c.loc,
                        c.metrics.efferent,
                        c.exported_symbols.len()
                    ),
                )
            })
            .collect()
    }

    fn erosion(&self, styles: &[StyleResult], classification: &Classification) -> Vec<Violation> {
        classification
            .styles()
            .into_iter()
            .filter_map(|kind| styles.iter().find(|r| r.style == kind))
            .filter(|r| r.metrics.violating_edges > 0 && r.metrics.in_scope_edges > 0)
            .enumerate()
            .map(|(i, result)| {
                let participants: BTreeSet<ComponentId> = result
                    .violations
                    .iter()
                    .flat_map(|v| v.participants.iter().cloned())
                    .collect();
                let m = &result.metrics;
                Violation::new(
                    format!("erosion-{}", i + 1),
                    ViolationKind::Erosion,
                    m.violating_edges as f64 / m.in_scope_edges as f64,
                    participants.into_iter().collect(),
                    format!(
                        "{} of {} classified dependencies break the {} style",
                        m.violating_edges, m.in_scope_edges, result.style
                    ),
                )
                .with_style(result.style)
            })
            .collect()
    }
}
