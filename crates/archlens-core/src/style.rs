//! Architectural style detection.
//!
//! Every style is a [`StyleTable`]: a role table for classification plus an
//! [`EdgeRule`] saying which role-to-role edges are allowed. One generic
//! detector, [`TableDrivenStyle`], evaluates any table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StyleConfig;
use crate::graph::ArchGraph;
use crate::intent::{intent_of, IntentKind, IntentResult};
use crate::roles::StructuralHint::{Abstraction, EntryPoint, ServiceMember, Stable};
use crate::roles::{classify_role, RoleRule, RoleSignals};
use crate::types::{ComponentId, Role, StyleKind, Violation, ViolationKind};

/// Directory names whose child directory names a service.
const SERVICE_MARKERS: &[&str] = &["services", "service", "svc", "apps", "microservices"];

/// Service a path belongs to: the directory right under a service marker.
/// `services/orders/api/handler.rs` → `orders`; `services/orders.rs` → none.
pub fn service_key(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (_file, dirs) = segments.split_last()?;
    dirs.iter()
        .position(|d| SERVICE_MARKERS.contains(&d.to_lowercase().as_str()))
        .and_then(|i| dirs.get(i + 1))
        .map(|d| d.to_lowercase())
}

/// Outcome of checking one edge against a style's rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Allowed,
    Violates { severity: f64 },
}

/// How a style decides whether an edge between two roles is allowed.
/// Edges between components of the same role are always allowed.
#[derive(Debug, Clone, Copy)]
pub enum EdgeRule {
    /// Roles listed top to bottom; only a single step downward is allowed.
    AdjacentDownward(&'static [Role]),
    /// Roles listed outermost first; any strictly inward edge is allowed.
    Inward(&'static [Role]),
    /// Explicit allowed pairs; `forbidden` pairs are always severe.
    Pairs {
        allowed: &'static [(Role, Role)],
        forbidden: &'static [(Role, Role)],
    },
    /// Anything goes inside one service; across services only through a
    /// gateway, and never into another service's data store. Components
    /// outside every service directory do not count as a service.
    ServiceBoundary,
}

/// One endpoint of an edge as seen by the rule checker.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    pub role: Role,
    pub service: Option<&'a str>,
}

fn position(chain: &[Role], role: Role) -> Option<usize> {
    chain.iter().position(|r| *r == role)
}

impl EdgeRule {
    pub fn check(&self, from: Endpoint<'_>, to: Endpoint<'_>) -> Verdict {
        if let EdgeRule::ServiceBoundary = self {
            return Self::check_service_boundary(from, to);
        }
        if from.role == to.role {
            return Verdict::Allowed;
        }
        match self {
            EdgeRule::AdjacentDownward(chain) => {
                match (position(chain, from.role), position(chain, to.role)) {
                    (Some(a), Some(b)) if b == a + 1 => Verdict::Allowed,
                    // skipping a layer
                    (Some(a), Some(b)) if b > a => Verdict::Violates { severity: 0.4 },
                    _ => Verdict::Violates { severity: 0.7 },
                }
            }
            EdgeRule::Inward(chain) => {
                match (position(chain, from.role), position(chain, to.role)) {
                    (Some(a), Some(b)) if b > a => Verdict::Allowed,
                    (Some(a), Some(b)) => Verdict::Violates {
                        severity: 0.4 + 0.15 * (a - b) as f64,
                    },
                    _ => Verdict::Violates { severity: 0.5 },
                }
            }
            EdgeRule::Pairs { allowed, forbidden } => {
                let pair = (from.role, to.role);
                if allowed.contains(&pair) {
                    Verdict::Allowed
                } else if forbidden.contains(&pair) {
                    Verdict::Violates { severity: 0.8 }
                } else {
                    Verdict::Violates { severity: 0.4 }
                }
            }
            EdgeRule::ServiceBoundary => Verdict::Allowed,
        }
    }

    fn check_service_boundary(from: Endpoint<'_>, to: Endpoint<'_>) -> Verdict {
        let through_gateway = from.role == Role::ApiGateway || to.role == Role::ApiGateway;
        match (from.service, to.service) {
            (Some(a), Some(b)) if a == b => Verdict::Allowed,
            _ if to.role == Role::DataStore => Verdict::Violates { severity: 0.8 },
            _ if through_gateway => Verdict::Allowed,
            // neither side belongs to a service
            (None, None) => Verdict::Violates { severity: 0.3 },
            _ => Verdict::Violates { severity: 0.6 },
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            EdgeRule::AdjacentDownward(_) => "layers may only call the layer directly below",
            EdgeRule::Inward(_) => "dependencies must point inward",
            EdgeRule::Pairs { .. } => "edge is not an allowed role pairing",
            EdgeRule::ServiceBoundary => "services must communicate through a gateway",
        }
    }
}

/// Data describing one architectural style.
#[derive(Debug, Clone, Copy)]
pub struct StyleTable {
    pub style: StyleKind,
    /// Role rules in priority order.
    pub roles: &'static [RoleRule],
    pub rule: EdgeRule,
}

pub static LAYERED: StyleTable = StyleTable {
    style: StyleKind::Layered,
    roles: &[
        RoleRule {
            role: Role::Controller,
            keywords: &[
                "controller", "handler", "endpoint", "route", "router", "view", "resource",
                "presentation", "web", "rest", "http", "ui",
            ],
            hints: &[EntryPoint],
        },
        RoleRule {
            role: Role::Service,
            keywords: &["service", "manager", "application", "logic", "business", "workflow"],
            hints: &[],
        },
        RoleRule {
            role: Role::Repository,
            keywords: &[
                "repository", "repo", "dao", "store", "persistence", "storage", "database", "db",
                "mapper",
            ],
            hints: &[],
        },
    ],
    rule: EdgeRule::AdjacentDownward(&[Role::Controller, Role::Service, Role::Repository]),
};

pub static HEXAGONAL: StyleTable = StyleTable {
    style: StyleKind::Hexagonal,
    roles: &[
        RoleRule {
            role: Role::Domain,
            keywords: &["domain", "model", "entity", "core", "aggregate"],
            hints: &[Stable],
        },
        RoleRule {
            role: Role::Port,
            keywords: &["port", "contract", "spi"],
            hints: &[Abstraction],
        },
        RoleRule {
            role: Role::Adapter,
            keywords: &[
                "adapter", "controller", "handler", "cli", "rest", "http", "grpc", "web",
                "presenter",
            ],
            hints: &[],
        },
        RoleRule {
            role: Role::Infrastructure,
            keywords: &[
                "infrastructure", "infra", "persistence", "database", "db", "postgres", "mysql",
                "sqlite", "redis", "client", "driver", "config",
            ],
            hints: &[],
        },
    ],
    rule: EdgeRule::Pairs {
        allowed: &[
            (Role::Adapter, Role::Port),
            (Role::Port, Role::Domain),
            (Role::Adapter, Role::Domain),
            (Role::Adapter, Role::Infrastructure),
        ],
        forbidden: &[
            (Role::Domain, Role::Adapter),
            (Role::Domain, Role::Infrastructure),
        ],
    },
};

pub static CLEAN: StyleTable = StyleTable {
    style: StyleKind::Clean,
    roles: &[
        RoleRule {
            role: Role::Entity,
            keywords: &["entity", "domain", "model", "aggregate"],
            hints: &[Stable],
        },
        RoleRule {
            role: Role::UseCase,
            keywords: &["usecase", "interactor", "application", "command", "query", "service"],
            hints: &[],
        },
        RoleRule {
            role: Role::InterfaceAdapter,
            keywords: &[
                "controller", "presenter", "gateway", "adapter", "repository", "handler", "view",
            ],
            hints: &[],
        },
        RoleRule {
            role: Role::Framework,
            keywords: &[
                "framework", "infrastructure", "infra", "db", "database", "web", "driver",
                "server", "main", "config",
            ],
            hints: &[EntryPoint],
        },
    ],
    rule: EdgeRule::Inward(&[
        Role::Framework,
        Role::InterfaceAdapter,
        Role::UseCase,
        Role::Entity,
    ]),
};

pub static MICROSERVICES: StyleTable = StyleTable {
    style: StyleKind::Microservices,
    roles: &[
        RoleRule {
            role: Role::ApiGateway,
            keywords: &["gateway", "apigateway", "bff", "proxy", "edge"],
            hints: &[],
        },
        RoleRule {
            role: Role::DataStore,
            keywords: &[
                "database", "db", "datastore", "store", "storage", "repository", "repo", "cache",
                "persistence", "schema", "migration",
            ],
            hints: &[],
        },
        RoleRule {
            role: Role::Microservice,
            keywords: &["microservice", "service", "svc", "server", "api"],
            hints: &[ServiceMember],
        },
    ],
    rule: EdgeRule::ServiceBoundary,
};

pub static EVENT_DRIVEN: StyleTable = StyleTable {
    style: StyleKind::EventDriven,
    roles: &[
        RoleRule {
            role: Role::Producer,
            keywords: &["producer", "publisher", "emitter", "sender", "dispatcher", "notifier"],
            hints: &[],
        },
        RoleRule {
            role: Role::Broker,
            keywords: &[
                "broker", "bus", "eventbus", "messagebus", "queue", "topic", "channel", "kafka",
                "rabbitmq", "nats", "exchange", "stream",
            ],
            hints: &[],
        },
        RoleRule {
            role: Role::Consumer,
            keywords: &[
                "consumer", "subscriber", "listener", "handler", "worker", "processor", "sink",
            ],
            hints: &[],
        },
    ],
    rule: EdgeRule::Pairs {
        allowed: &[(Role::Producer, Role::Broker), (Role::Broker, Role::Consumer)],
        forbidden: &[(Role::Producer, Role::Consumer)],
    },
};

/// All built-in style tables, in style order.
pub fn builtin_tables() -> [&'static StyleTable; 5] {
    [&LAYERED, &HEXAGONAL, &CLEAN, &MICROSERVICES, &EVENT_DRIVEN]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleMetrics {
    /// Fraction of components assigned a role.
    pub role_coverage: f64,
    /// Compliant over in-scope edges; 0.5 when there are none.
    pub compliance_ratio: f64,
    pub classified_components: usize,
    pub in_scope_edges: usize,
    pub compliant_edges: usize,
    pub violating_edges: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleResult {
    pub style: StyleKind,
    pub confidence: f64,
    pub role_assignment: BTreeMap<ComponentId, Role>,
    pub violations: Vec<Violation>,
    pub metrics: StyleMetrics,
    pub insufficient_data: bool,
}

impl StyleResult {
    fn empty(style: StyleKind) -> Self {
        Self {
            style,
            confidence: 0.0,
            role_assignment: BTreeMap::new(),
            violations: Vec::new(),
            metrics: StyleMetrics {
                compliance_ratio: 0.5,
                ..StyleMetrics::default()
            },
            insufficient_data: true,
        }
    }
}

/// Capability contract shared by the style classifiers.
pub trait StyleDetector: Send + Sync {
    fn style(&self) -> StyleKind;

    fn detect(&self, graph: &ArchGraph, intents: &[IntentResult]) -> StyleResult;
}

/// Style detector driven entirely by a [`StyleTable`].
pub struct TableDrivenStyle {
    table: &'static StyleTable,
    config: StyleConfig,
}

impl TableDrivenStyle {
    pub fn new(table: &'static StyleTable, config: StyleConfig) -> Self {
        Self { table, config }
    }

    fn assign_roles(
        &self,
        graph: &ArchGraph,
        intents: &[IntentResult],
    ) -> BTreeMap<ComponentId, Role> {
        let hiding = intent_of(intents, IntentKind::InformationHiding);
        graph
            .components()
            .filter_map(|component| {
                let signals = RoleSignals {
                    well_encapsulated: hiding.is_some_and(|h| h.supports(&component.id)),
                    in_service: service_key(&component.file_path).is_some(),
                };
                classify_role(component, self.table.roles, &signals)
                    .map(|(role, _)| (component.id.clone(), role))
            })
            .collect()
    }
}

impl StyleDetector for TableDrivenStyle {
    fn style(&self) -> StyleKind {
        self.table.style
    }

    fn detect(&self, graph: &ArchGraph, intents: &[IntentResult]) -> StyleResult {
        let style = self.table.style;
        if graph.node_count() < 2 {
            return StyleResult::empty(style);
        }

        let roles = self.assign_roles(graph, intents);
        let services: BTreeMap<&ComponentId, String> = graph
            .components()
            .filter_map(|c| service_key(&c.file_path).map(|s| (&c.id, s)))
            .collect();
        let endpoint = |id: &ComponentId| {
            roles.get(id).map(|&role| Endpoint {
                role,
                service: services.get(id).map(String::as_str),
            })
        };

        // judge each ordered pair once, whatever the edge kinds
        let pairs: BTreeSet<(&ComponentId, &ComponentId)> = graph
            .dependency_edges()
            .map(|e| (&e.source, &e.target))
            .collect();

        let mut in_scope = 0usize;
        let mut compliant = 0usize;
        let mut violations = Vec::new();
        for (source, target) in pairs {
            let (Some(from), Some(to)) = (endpoint(source), endpoint(target)) else {
                continue;
            };
            in_scope += 1;
            match self.table.rule.check(from, to) {
                Verdict::Allowed => compliant += 1,
                Verdict::Violates { severity } => {
                    violations.push(
                        Violation::new(
                            format!("{style}-layer-violation-{}", violations.len() + 1),
                            ViolationKind::LayerViolation,
                            severity,
                            vec![source.clone(), target.clone()],
                            format!(
                                "{source} ({}) depends on {target} ({}): {}",
                                from.role,
                                to.role,
                                self.table.rule.describe()
                            ),
                        )
                        .with_style(style),
                    );
                }
            }
        }

        let n = graph.node_count();
        let classified = roles.len();
        let coverage = classified as f64 / n as f64;
        let compliance_ratio = if in_scope == 0 {
            0.5
        } else {
            compliant as f64 / in_scope as f64
        };
        let insufficient_data = in_scope == 0;
        let confidence = if classified < self.config.min_classified_components || in_scope == 0 {
            0.0
        } else {
            let coverage_factor = (coverage / self.config.full_coverage).min(1.0);
            (compliance_ratio * coverage_factor).clamp(0.0, 1.0)
        };

        debug!(
            style = %style,
            confidence,
            classified,
            in_scope,
            violations = violations.len(),
            "style evaluated"
        );

        StyleResult {
            style,
            confidence,
            role_assignment: roles,
            metrics: StyleMetrics {
                role_coverage: coverage,
                compliance_ratio,
                classified_components: classified,
                in_scope_edges: in_scope,
                compliant_edges: compliant,
                violating_edges: violations.len(),
            },
            violations,
            insufficient_data,
        }
    }
}

/// Which style, or blend of styles, best describes the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Classification {
    Single { style: StyleKind },
    Hybrid { styles: Vec<StyleKind> },
    Undetermined,
}

impl Classification {
    /// Styles that define the system's architecture, strongest first.
    pub fn styles(&self) -> Vec<StyleKind> {
        match self {
            Classification::Single { style } => vec![*style],
            Classification::Hybrid { styles } => styles.clone(),
            Classification::Undetermined => Vec::new(),
        }
    }
}

/// Decide between a single dominant style and a hybrid. A style qualifies
/// only with confidence strictly above the threshold.
pub fn classify_styles(results: &[StyleResult], config: &StyleConfig) -> Classification {
    let mut qualifying: Vec<(StyleKind, f64)> = results
        .iter()
        .filter(|r| r.confidence > config.confidence_threshold)
        .map(|r| (r.style, r.confidence))
        .collect();
    qualifying.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    match qualifying.as_slice() {
        [] => Classification::Undetermined,
        [(style, _)] => Classification::Single { style: *style },
        [(top, top_conf), (_, second), ..] => {
            if top_conf - second < config.hybrid_margin {
                Classification::Hybrid {
                    styles: qualifying
                        .iter()
                        .filter(|(_, c)| top_conf - c < config.hybrid_margin)
                        .map(|(s, _)| *s)
                        .collect(),
                }
            } else {
                Classification::Single { style: *top }
            }
        }
    }
}
