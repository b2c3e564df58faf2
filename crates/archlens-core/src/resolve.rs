use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Component, ComponentId};

/// Which resolution step matched a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    ExactPath,
    ExactName,
    CommonPrefix,
}

/// Result of resolving one raw reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        target: ComponentId,
        strategy: MatchStrategy,
    },
    /// Several components matched equally well; the lowest id was chosen.
    Ambiguous {
        target: ComponentId,
        strategy: MatchStrategy,
        candidates: Vec<ComponentId>,
    },
    Unresolved,
}

impl Resolution {
    pub fn target(&self) -> Option<&ComponentId> {
        match self {
            Resolution::Resolved { target, .. } | Resolution::Ambiguous { target, .. } => {
                Some(target)
            }
            Resolution::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    DanglingReference,
    AmbiguousReference,
}

/// Non-fatal finding recorded while building the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub component: ComponentId,
    pub reference: String,
    pub message: String,
}

fn normalize(reference: &str) -> String {
    let normalized = reference.trim().replace('\\', "/");
    normalized
        .strip_prefix("./")
        .map(str::to_string)
        .unwrap_or(normalized)
}

fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..file_start + dot],
        _ => path,
    }
}

/// Split a module/path reference into lowercase segments on `/`, `::` and `.`.
fn segments(path: &str) -> Vec<String> {
    path.replace("::", "/")
        .split(['/', '.'])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn last_segment(reference: &str) -> &str {
    reference
        .rsplit(['/', ':', '.'])
        .find(|s| !s.is_empty())
        .unwrap_or(reference)
}

/// Resolves raw dependency references against the set of known components.
///
/// Strategies apply in order: exact path (file path, path without extension,
/// or component id), exact display name, then longest common path prefix.
pub struct ReferenceResolver {
    by_path: HashMap<String, Vec<ComponentId>>,
    by_name: HashMap<String, Vec<ComponentId>>,
    modules: Vec<(Vec<String>, ComponentId)>,
}

impl ReferenceResolver {
    /// `components` must be sorted by id so that ties resolve to the lowest id.
    pub fn new(components: &[Component]) -> Self {
        let mut by_path: HashMap<String, Vec<ComponentId>> = HashMap::new();
        let mut by_name: HashMap<String, Vec<ComponentId>> = HashMap::new();
        let mut modules = Vec::with_capacity(components.len());

        for component in components {
            let path = normalize(&component.file_path);
            let keys = [
                path.clone(),
                strip_extension(&path).to_string(),
                component.id.0.clone(),
            ];
            for (i, key) in keys.iter().enumerate() {
                // the same component may produce identical keys
                if keys[..i].contains(key) {
                    continue;
                }
                by_path.entry(key.clone()).or_default().push(component.id.clone());
            }
            by_name
                .entry(component.name.clone())
                .or_default()
                .push(component.id.clone());
            modules.push((segments(strip_extension(&path)), component.id.clone()));
        }

        Self {
            by_path,
            by_name,
            modules,
        }
    }

    pub fn resolve(&self, source: &ComponentId, reference: &str) -> Resolution {
        let normalized = normalize(reference);
        if normalized.is_empty() {
            return Resolution::Unresolved;
        }

        if let Some(hit) = self.by_path.get(&normalized) {
            return Self::pick(hit, MatchStrategy::ExactPath);
        }
        let hit = Self::others(self.by_path.get(strip_extension(&normalized)), source);
        if !hit.is_empty() {
            return Self::pick(&hit, MatchStrategy::ExactPath);
        }

        if let Some(hit) = self.by_name.get(&normalized) {
            return Self::pick(hit, MatchStrategy::ExactName);
        }
        let hit = Self::others(self.by_name.get(last_segment(&normalized)), source);
        if !hit.is_empty() {
            return Self::pick(&hit, MatchStrategy::ExactName);
        }

        self.resolve_by_prefix(source, &normalized)
    }

    /// Fallback candidates minus the referring component; only a full-string
    /// match may produce a self-loop.
    fn others(hit: Option<&Vec<ComponentId>>, source: &ComponentId) -> Vec<ComponentId> {
        hit.map(|ids| ids.iter().filter(|id| *id != source).cloned().collect())
            .unwrap_or_default()
    }

    fn resolve_by_prefix(&self, source: &ComponentId, reference: &str) -> Resolution {
        let wanted = segments(reference);
        if wanted.is_empty() {
            return Resolution::Unresolved;
        }

        let mut best_len = 0usize;
        let mut best: Vec<ComponentId> = Vec::new();
        for (module, id) in &self.modules {
            // a fuzzy match never points a component at itself
            if id == source {
                continue;
            }
            let common = wanted
                .iter()
                .zip(module.iter())
                .take_while(|(a, b)| a == b)
                .count();
            if common == 0 || common < wanted.len().min(module.len()) {
                continue;
            }
            if common > best_len {
                best_len = common;
                best.clear();
                best.push(id.clone());
            } else if common == best_len {
                best.push(id.clone());
            }
        }

        if best.is_empty() {
            Resolution::Unresolved
        } else {
            Self::pick(&best, MatchStrategy::CommonPrefix)
        }
    }

    fn pick(candidates: &[ComponentId], strategy: MatchStrategy) -> Resolution {
        match candidates {
            [] => Resolution::Unresolved,
            [only] => Resolution::Resolved {
                target: only.clone(),
                strategy,
            },
            [first, ..] => Resolution::Ambiguous {
                target: first.clone(),
                strategy,
                candidates: candidates.to_vec(),
            },
        }
    }
}
