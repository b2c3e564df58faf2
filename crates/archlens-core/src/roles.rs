//! Role classification: pure scoring of one component against a style's
//! role table.
//!
//! A keyword found in the component's name (display name or file stem)
//! scores [`NAME_MATCH`], one found only in its directories scores
//! [`DIRECTORY_MATCH`]. Structural hints add to that, capped at 1. The best
//! role wins if it reaches [`MIN_ROLE_SCORE`]; ties go to the role listed
//! first.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Component, Role};

pub const NAME_MATCH: f64 = 1.0;
pub const DIRECTORY_MATCH: f64 = 0.8;
pub const MIN_ROLE_SCORE: f64 = 0.5;

/// Graph-shape evidence that nudges a component toward a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralHint {
    /// Declares an abstraction, is well encapsulated and has at least two
    /// dependents.
    Abstraction,
    /// Depends on nothing and has at least two dependents.
    Stable,
    /// Nothing depends on it but it depends on something.
    EntryPoint,
    /// Lives inside a recognizable service directory.
    ServiceMember,
}

impl StructuralHint {
    fn bonus(&self, component: &Component, signals: &RoleSignals) -> f64 {
        let m = &component.metrics;
        let holds = match self {
            StructuralHint::Abstraction => {
                component.declares_abstraction && m.afferent >= 2 && signals.well_encapsulated
            }
            StructuralHint::Stable => m.efferent == 0 && m.afferent >= 2,
            StructuralHint::EntryPoint => m.afferent == 0 && m.efferent >= 1,
            StructuralHint::ServiceMember => signals.in_service,
        };
        match (holds, self) {
            (false, _) => 0.0,
            (true, StructuralHint::Abstraction | StructuralHint::ServiceMember) => 0.6,
            (true, _) => 0.3,
        }
    }
}

/// One row of a style's role table.
#[derive(Debug, Clone, Copy)]
pub struct RoleRule {
    pub role: Role,
    pub keywords: &'static [&'static str],
    pub hints: &'static [StructuralHint],
}

/// Per-component signals computed outside the graph node itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleSignals {
    /// Information hiding produced supporting evidence for the component.
    pub well_encapsulated: bool,
    /// The component sits under a service directory.
    pub in_service: bool,
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Z]+[a-z0-9]*|[a-z0-9]+").expect("word pattern is valid"))
}

/// Split an identifier or path segment into lowercase words, plus adjacent
/// pairs joined (`UseCase` yields `use`, `case`, `usecase`).
pub fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = word_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    let pairs: Vec<String> = words.windows(2).map(|w| format!("{}{}", w[0], w[1])).collect();
    words.into_iter().chain(pairs).collect()
}

#[derive(Debug, Default)]
struct ComponentTokens {
    name: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl ComponentTokens {
    fn of(component: &Component) -> Self {
        let mut tokens = Self::default();
        tokens.name.extend(tokenize(&component.name));

        let mut parts: Vec<&str> = component
            .file_path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(file) = parts.pop() {
            let stem = file.split('.').next().unwrap_or(file);
            tokens.name.extend(tokenize(stem));
        }
        for dir in parts {
            tokens.dirs.extend(tokenize(dir));
        }
        tokens
    }
}

fn matches_keyword(tokens: &BTreeSet<String>, keyword: &str) -> bool {
    tokens.contains(keyword)
        || tokens.contains(&format!("{keyword}s"))
        || tokens.contains(&format!("{keyword}es"))
}

fn keyword_score(tokens: &ComponentTokens, keywords: &[&str]) -> f64 {
    if keywords.iter().any(|k| matches_keyword(&tokens.name, k)) {
        NAME_MATCH
    } else if keywords.iter().any(|k| matches_keyword(&tokens.dirs, k)) {
        DIRECTORY_MATCH
    } else {
        0.0
    }
}

/// Best role for `component` under `rules`, with its score in [0, 1].
pub fn classify_role(
    component: &Component,
    rules: &[RoleRule],
    signals: &RoleSignals,
) -> Option<(Role, f64)> {
    let tokens = ComponentTokens::of(component);
    let mut best: Option<(Role, f64)> = None;

    for rule in rules {
        let score = (keyword_score(&tokens, rule.keywords)
            + rule
                .hints
                .iter()
                .map(|h| h.bonus(component, signals))
                .sum::<f64>())
        .min(1.0);
        if score < MIN_ROLE_SCORE {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((rule.role, score));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentId, ComponentMetrics};

    fn make_component(name: &str, path: &str) -> Component {
        Component {
            id: ComponentId::from(name),
            name: name.to_string(),
            file_path: path.to_string(),
            loc: 10,
            exported_symbols: Default::default(),
            private_symbols: Default::default(),
            declares_abstraction: false,
            uses_dependency_injection: false,
            metrics: ComponentMetrics::default(),
        }
    }

    const RULES: &[RoleRule] = &[
        RoleRule {
            role: Role::Controller,
            keywords: &["controller", "handler"],
            hints: &[StructuralHint::EntryPoint],
        },
        RoleRule {
            role: Role::Service,
            keywords: &["service"],
            hints: &[],
        },
        RoleRule {
            role: Role::Port,
            keywords: &["port"],
            hints: &[StructuralHint::Abstraction],
        },
    ];

    #[test]
    fn test_tokenize_splits_case_and_separators() {
        assert_eq!(
            tokenize("CreateUserUseCase"),
            vec!["create", "user", "use", "case", "createuser", "useruse", "usecase"]
        );
        assert_eq!(tokenize("order_repo"), vec!["order", "repo", "orderrepo"]);
        assert_eq!(tokenize("HTTPServer"), vec!["httpserver"]);
    }

    #[test]
    fn test_name_beats_directory() {
        let c = make_component("UserService", "src/controllers/user_service.rs");
        assert_eq!(
            classify_role(&c, RULES, &RoleSignals::default()),
            Some((Role::Service, NAME_MATCH))
        );
    }

    #[test]
    fn test_directory_plural_match() {
        let c = make_component("User", "src/handlers/user.rs");
        assert_eq!(
            classify_role(&c, RULES, &RoleSignals::default()),
            Some((Role::Controller, DIRECTORY_MATCH))
        );
    }

    #[test]
    fn test_tie_goes_to_table_order() {
        let c = make_component("ServiceHandler", "src/x.rs");
        assert_eq!(
            classify_role(&c, RULES, &RoleSignals::default()).map(|(r, _)| r),
            Some(Role::Controller)
        );
    }

    #[test]
    fn test_structural_hint_alone_can_assign_port() {
        let mut c = make_component("Storage", "src/x/storage.rs");
        c.declares_abstraction = true;
        c.metrics.afferent = 3;
        let signals = RoleSignals {
            well_encapsulated: true,
            in_service: false,
        };
        assert_eq!(
            classify_role(&c, RULES, &signals).map(|(r, _)| r),
            Some(Role::Port)
        );
        // not well encapsulated: no hint, no role
        assert_eq!(classify_role(&c, RULES, &RoleSignals::default()), None);
    }

    #[test]
    fn test_weak_hint_below_minimum() {
        let mut c = make_component("Main", "main.rs");
        c.metrics.efferent = 2;
        assert_eq!(classify_role(&c, RULES, &RoleSignals::default()), None);
    }
}
