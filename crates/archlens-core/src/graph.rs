use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::centrality;
use crate::error::InputError;
use crate::resolve::{Diagnostic, DiagnosticKind, ReferenceResolver, Resolution};
use crate::types::{Component, ComponentId, ComponentRecord, Edge, EdgeKind};

/// A strongly connected group of components (a dependency cycle).
/// Single-member groups are self-loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleGroup {
    pub members: Vec<ComponentId>,
    /// Total weight of edges with both endpoints inside the group.
    pub internal_weight: usize,
}

impl CycleGroup {
    pub fn is_self_loop(&self) -> bool {
        self.members.len() == 1
    }
}

/// Serializable `{components, edges}` view of a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub components: Vec<Component>,
    pub edges: Vec<Edge>,
}

/// Output of building a graph: the frozen graph and any non-fatal diagnostics.
#[derive(Debug)]
pub struct GraphBuild {
    pub graph: ArchGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Directed dependency graph of architectural components.
///
/// Immutable once built. Nodes are stored in id order and edges in
/// (source, target, kind) order, so iteration is deterministic regardless of
/// the order records arrived in.
#[derive(Debug)]
pub struct ArchGraph {
    graph: DiGraph<Component, Edge>,
    index: HashMap<ComponentId, NodeIndex>,
    cycles: Vec<CycleGroup>,
}

fn validate_records(records: &[ComponentRecord]) -> Result<(), InputError> {
    let mut seen = HashSet::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let required = [
            ("component_id", record.component_id.0.trim()),
            ("display_name", record.display_name.trim()),
            ("file_path", record.file_path.trim()),
        ];
        if let Some(&(field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(InputError::MissingField { index, field });
        }
        if !seen.insert(&record.component_id) {
            return Err(InputError::DuplicateComponent(record.component_id.clone()));
        }
    }
    Ok(())
}

impl ArchGraph {
    /// Resolve references and build the graph, computing coupling,
    /// centrality, and cycles before returning.
    pub fn build(records: &[ComponentRecord]) -> Result<GraphBuild, InputError> {
        validate_records(records)?;

        let mut sorted: Vec<&ComponentRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.component_id.cmp(&b.component_id));

        let components: Vec<Component> = sorted.iter().map(|r| Component::from(*r)).collect();
        let resolver = ReferenceResolver::new(&components);

        let mut diagnostics = Vec::new();
        let mut collapsed: BTreeMap<(ComponentId, ComponentId, EdgeKind), (usize, BTreeSet<String>)> =
            BTreeMap::new();

        for record in &sorted {
            for reference in &record.raw_dependency_references {
                let resolution = resolver.resolve(&record.component_id, &reference.target);
                let target = match &resolution {
                    Resolution::Resolved { target, .. } => target.clone(),
                    Resolution::Ambiguous {
                        target, candidates, ..
                    } => {
                        debug!(
                            component = %record.component_id,
                            reference = %reference.target,
                            candidates = candidates.len(),
                            "ambiguous reference"
                        );
                        diagnostics.push(Diagnostic {
                            kind: DiagnosticKind::AmbiguousReference,
                            component: record.component_id.clone(),
                            reference: reference.target.clone(),
                            message: format!(
                                "'{}' matches {} components; resolved to '{}'",
                                reference.target,
                                candidates.len(),
                                target
                            ),
                        });
                        target.clone()
                    }
                    Resolution::Unresolved => {
                        warn!(
                            component = %record.component_id,
                            reference = %reference.target,
                            "dangling reference dropped"
                        );
                        diagnostics.push(Diagnostic {
                            kind: DiagnosticKind::DanglingReference,
                            component: record.component_id.clone(),
                            reference: reference.target.clone(),
                            message: format!(
                                "'{}' does not match any component",
                                reference.target
                            ),
                        });
                        continue;
                    }
                };

                let entry = collapsed
                    .entry((record.component_id.clone(), target, reference.kind))
                    .or_default();
                entry.0 += 1;
                entry.1.extend(reference.symbols.iter().cloned());
            }
        }

        let mut graph = DiGraph::with_capacity(components.len(), collapsed.len());
        let mut index = HashMap::with_capacity(components.len());
        for component in components {
            let id = component.id.clone();
            let idx = graph.add_node(component);
            index.insert(id, idx);
        }
        for ((source, target, kind), (weight, symbols)) in collapsed {
            let (from, to) = (index[&source], index[&target]);
            graph.add_edge(
                from,
                to,
                Edge {
                    source,
                    target,
                    kind,
                    weight,
                    symbols,
                },
            );
        }

        let mut built = Self {
            graph,
            index,
            cycles: Vec::new(),
        };
        built.compute_metrics();
        built.cycles = built.find_cycles();

        debug!(
            components = built.node_count(),
            edges = built.edge_count(),
            cycles = built.cycles.len(),
            diagnostics = diagnostics.len(),
            "dependency graph built"
        );

        Ok(GraphBuild {
            graph: built,
            diagnostics,
        })
    }

    fn compute_metrics(&mut self) {
        let n = self.graph.node_count();
        let adjacency = self.simple_adjacency();
        let degree = centrality::degree_centrality(&adjacency);
        let betweenness = centrality::betweenness_centrality(&adjacency);

        for i in 0..n {
            let idx = NodeIndex::new(i);
            let efferent = self
                .graph
                .edges_directed(idx, Direction::Outgoing)
                .filter(|e| e.target() != idx)
                .count();
            let afferent = self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .filter(|e| e.source() != idx)
                .count();
            let metrics = &mut self.graph[idx].metrics;
            metrics.afferent = afferent;
            metrics.efferent = efferent;
            metrics.degree_centrality = degree[i];
            metrics.betweenness_centrality = betweenness[i];
            metrics.instability = if afferent + efferent == 0 {
                0.5
            } else {
                efferent as f64 / (afferent + efferent) as f64
            };
        }
    }

    /// Distinct out-neighbours per node, self-loops removed.
    fn simple_adjacency(&self) -> Vec<Vec<usize>> {
        self.graph
            .node_indices()
            .map(|idx| {
                let targets: BTreeSet<usize> = self
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .filter(|&t| t != idx)
                    .map(|t| t.index())
                    .collect();
                targets.into_iter().collect()
            })
            .collect()
    }

    /// Find cycles via strongly connected components. Groups of size > 1 and
    /// self-loops are returned, members sorted by id, groups sorted by members.
    pub fn find_cycles(&self) -> Vec<CycleGroup> {
        let mut groups: Vec<CycleGroup> = petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some()
            })
            .map(|scc| {
                let members_idx: HashSet<NodeIndex> = scc.iter().copied().collect();
                let internal_weight = self
                    .graph
                    .edge_references()
                    .filter(|e| members_idx.contains(&e.source()) && members_idx.contains(&e.target()))
                    .map(|e| e.weight().weight)
                    .sum();
                let mut members: Vec<ComponentId> =
                    scc.iter().map(|&idx| self.graph[idx].id.clone()).collect();
                members.sort();
                CycleGroup {
                    members,
                    internal_weight,
                }
            })
            .collect();
        groups.sort_by(|a, b| a.members.cmp(&b.members));
        groups
    }

    /// Cycle groups computed at build time.
    pub fn cycles(&self) -> &[CycleGroup] {
        &self.cycles
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Components in id order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.graph.node_weights()
    }

    /// Edges in (source, target, kind) order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    /// Edges that connect two distinct components.
    pub fn dependency_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges().filter(|e| !e.is_self_loop())
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn outgoing(&self, id: &ComponentId) -> Vec<&Edge> {
        self.directed(id, Direction::Outgoing)
    }

    pub fn incoming(&self, id: &ComponentId) -> Vec<&Edge> {
        self.directed(id, Direction::Incoming)
    }

    fn directed(&self, id: &ComponentId, direction: Direction) -> Vec<&Edge> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<&Edge> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| e.weight())
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target, a.kind).cmp(&(&b.source, &b.target, b.kind)));
        edges
    }

    /// True if any edge of any kind runs from `source` to `target`.
    pub fn has_edge(&self, source: &ComponentId, target: &ComponentId) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Total weight of all edges from `source` to `target`.
    pub fn weight_between(&self, source: &ComponentId, target: &ComponentId) -> usize {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => self
                .graph
                .edges_connecting(a, b)
                .map(|e| e.weight().weight)
                .sum(),
            _ => 0,
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            components: self.components().cloned().collect(),
            edges: self.edges().cloned().collect(),
        }
    }
}
