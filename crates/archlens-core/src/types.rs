use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a component, as supplied by the extractor.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Architectural layer used for separation-of-concerns grouping.
/// Ordered from innermost (Domain=0) to outermost (Presentation=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchLayer {
    Domain,
    Application,
    Infrastructure,
    Presentation,
}

impl ArchLayer {
    /// Numeric depth: 0 = innermost, 3 = outermost.
    pub fn depth(&self) -> u8 {
        match self {
            ArchLayer::Domain => 0,
            ArchLayer::Application => 1,
            ArchLayer::Infrastructure => 2,
            ArchLayer::Presentation => 3,
        }
    }

    /// Returns true if `self` depending on `other` is a violation
    /// (inner layer depending on outer layer).
    pub fn violates_dependency_on(&self, other: &ArchLayer) -> bool {
        self.depth() < other.depth()
    }

    /// Policy level for dependency inversion: how far the layer sits from
    /// low-level detail. Domain policy is highest, infrastructure lowest.
    pub fn policy_level(&self) -> u8 {
        match self {
            ArchLayer::Domain => 3,
            ArchLayer::Application => 2,
            ArchLayer::Presentation => 1,
            ArchLayer::Infrastructure => 0,
        }
    }
}

impl fmt::Display for ArchLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchLayer::Domain => write!(f, "domain"),
            ArchLayer::Application => write!(f, "application"),
            ArchLayer::Infrastructure => write!(f, "infrastructure"),
            ArchLayer::Presentation => write!(f, "presentation"),
        }
    }
}

/// Kind of dependency relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Import,
    Call,
    Inherit,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Import => write!(f, "import"),
            EdgeKind::Call => write!(f, "call"),
            EdgeKind::Inherit => write!(f, "inherit"),
        }
    }
}

/// A raw dependency reference emitted by the extractor.
///
/// On the wire this is either a bare string (an import of that module) or an
/// object naming the edge kind and the symbols referenced through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawReferenceRepr")]
pub struct DependencyReference {
    pub target: String,
    pub kind: EdgeKind,
    pub symbols: Vec<String>,
}

impl DependencyReference {
    pub fn import(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: EdgeKind::Import,
            symbols: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReferenceRepr {
    Plain(String),
    Detailed {
        target: String,
        #[serde(default = "default_edge_kind")]
        kind: EdgeKind,
        #[serde(default)]
        symbols: Vec<String>,
    },
}

fn default_edge_kind() -> EdgeKind {
    EdgeKind::Import
}

impl From<RawReferenceRepr> for DependencyReference {
    fn from(repr: RawReferenceRepr) -> Self {
        match repr {
            RawReferenceRepr::Plain(target) => DependencyReference::import(target),
            RawReferenceRepr::Detailed {
                target,
                kind,
                symbols,
            } => DependencyReference {
                target,
                kind,
                symbols,
            },
        }
    }
}

/// One component as delivered by the extraction collaborator.
/// Every field is required; a missing field fails the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub component_id: ComponentId,
    pub display_name: String,
    pub file_path: String,
    pub loc: usize,
    pub exported_symbols: BTreeSet<String>,
    pub private_symbols: BTreeSet<String>,
    pub raw_dependency_references: Vec<DependencyReference>,
    pub declares_abstraction: bool,
    pub uses_dependency_injection: bool,
}

/// Metrics derived while building the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetrics {
    pub afferent: usize,
    pub efferent: usize,
    pub degree_centrality: f64,
    pub betweenness_centrality: f64,
    /// Ce / (Ca + Ce); 0.5 when the component has no edges.
    pub instability: f64,
}

impl ComponentMetrics {
    pub fn total_coupling(&self) -> usize {
        self.afferent + self.efferent
    }
}

/// A node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    pub file_path: String,
    pub loc: usize,
    pub exported_symbols: BTreeSet<String>,
    pub private_symbols: BTreeSet<String>,
    pub declares_abstraction: bool,
    pub uses_dependency_injection: bool,
    pub metrics: ComponentMetrics,
}

impl Component {
    /// Share of declared symbols that are private, if the component declares any.
    pub fn private_ratio(&self) -> Option<f64> {
        let total = self.exported_symbols.len() + self.private_symbols.len();
        if total == 0 {
            return None;
        }
        Some(self.private_symbols.len() as f64 / total as f64)
    }
}

impl From<&ComponentRecord> for Component {
    fn from(record: &ComponentRecord) -> Self {
        Self {
            id: record.component_id.clone(),
            name: record.display_name.clone(),
            file_path: record.file_path.replace('\\', "/"),
            loc: record.loc,
            exported_symbols: record.exported_symbols.clone(),
            private_symbols: record.private_symbols.clone(),
            declares_abstraction: record.declares_abstraction,
            uses_dependency_injection: record.uses_dependency_injection,
            metrics: ComponentMetrics::default(),
        }
    }
}

/// A resolved, collapsed dependency between two components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: ComponentId,
    pub target: ComponentId,
    pub kind: EdgeKind,
    pub weight: usize,
    #[serde(default)]
    pub symbols: BTreeSet<String>,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Severity band. Scores in [0, 0.3) are minor, [0.3, 0.6) moderate,
/// [0.6, 1.0] severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBand {
    Minor,
    Moderate,
    Severe,
}

impl SeverityBand {
    pub const MODERATE_FLOOR: f64 = 0.3;
    pub const SEVERE_FLOOR: f64 = 0.6;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::SEVERE_FLOOR {
            SeverityBand::Severe
        } else if score >= Self::MODERATE_FLOOR {
            SeverityBand::Moderate
        } else {
            SeverityBand::Minor
        }
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityBand::Minor => write!(f, "minor"),
            SeverityBand::Moderate => write!(f, "moderate"),
            SeverityBand::Severe => write!(f, "severe"),
        }
    }
}

impl std::str::FromStr for SeverityBand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minor" => Ok(SeverityBand::Minor),
            "moderate" => Ok(SeverityBand::Moderate),
            "severe" => Ok(SeverityBand::Severe),
            _ => Err(anyhow::anyhow!("unknown severity band: {s}")),
        }
    }
}

/// Kind of architectural violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    Cycle,
    TightCoupling,
    BidirectionalCoupling,
    GodComponent,
    Erosion,
    LayerViolation,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::Cycle => "cycle",
            ViolationKind::TightCoupling => "tight-coupling",
            ViolationKind::BidirectionalCoupling => "bidirectional-coupling",
            ViolationKind::GodComponent => "god-component",
            ViolationKind::Erosion => "erosion",
            ViolationKind::LayerViolation => "layer-violation",
        };
        f.write_str(s)
    }
}

/// An architectural violation or structural anti-pattern finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub kind: ViolationKind,
    pub severity: f64,
    pub band: SeverityBand,
    pub participants: Vec<ComponentId>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleKind>,
}

impl Violation {
    /// Build a violation, clamping severity into [0, 1] and deriving its band.
    pub fn new(
        id: String,
        kind: ViolationKind,
        severity: f64,
        participants: Vec<ComponentId>,
        description: String,
    ) -> Self {
        let severity = if severity.is_finite() {
            severity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            id,
            kind,
            severity,
            band: SeverityBand::from_score(severity),
            participants,
            description,
            style: None,
        }
    }

    pub fn with_style(mut self, style: StyleKind) -> Self {
        self.style = Some(style);
        self
    }
}

/// A named architectural style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKind {
    Layered,
    Hexagonal,
    Clean,
    Microservices,
    EventDriven,
}

impl StyleKind {
    pub const ALL: [StyleKind; 5] = [
        StyleKind::Layered,
        StyleKind::Hexagonal,
        StyleKind::Clean,
        StyleKind::Microservices,
        StyleKind::EventDriven,
    ];
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StyleKind::Layered => "layered",
            StyleKind::Hexagonal => "hexagonal",
            StyleKind::Clean => "clean",
            StyleKind::Microservices => "microservices",
            StyleKind::EventDriven => "event-driven",
        };
        f.write_str(s)
    }
}

/// Role a component plays within one architectural style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    // layered
    Controller,
    Service,
    Repository,
    // hexagonal
    Domain,
    Port,
    Adapter,
    Infrastructure,
    // clean
    Entity,
    UseCase,
    InterfaceAdapter,
    Framework,
    // microservices
    ApiGateway,
    Microservice,
    DataStore,
    // event-driven
    Producer,
    Broker,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Controller => "controller",
            Role::Service => "service",
            Role::Repository => "repository",
            Role::Domain => "domain",
            Role::Port => "port",
            Role::Adapter => "adapter",
            Role::Infrastructure => "infrastructure",
            Role::Entity => "entity",
            Role::UseCase => "use-case",
            Role::InterfaceAdapter => "interface-adapter",
            Role::Framework => "framework",
            Role::ApiGateway => "api-gateway",
            Role::Microservice => "microservice",
            Role::DataStore => "data-store",
            Role::Producer => "producer",
            Role::Broker => "broker",
            Role::Consumer => "consumer",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_layer_depth() {
        assert_eq!(ArchLayer::Domain.depth(), 0);
        assert_eq!(ArchLayer::Application.depth(), 1);
        assert_eq!(ArchLayer::Infrastructure.depth(), 2);
        assert_eq!(ArchLayer::Presentation.depth(), 3);
    }

    #[test]
    fn test_violates_dependency_on_truth_table() {
        use ArchLayer::*;

        assert!(Domain.violates_dependency_on(&Application));
        assert!(Domain.violates_dependency_on(&Infrastructure));
        assert!(Application.violates_dependency_on(&Presentation));

        assert!(!Domain.violates_dependency_on(&Domain));
        assert!(!Infrastructure.violates_dependency_on(&Domain));
        assert!(!Presentation.violates_dependency_on(&Application));
    }

    #[test]
    fn test_policy_level_orders_domain_highest() {
        assert!(ArchLayer::Domain.policy_level() > ArchLayer::Application.policy_level());
        assert!(
            ArchLayer::Presentation.policy_level() > ArchLayer::Infrastructure.policy_level()
        );
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(SeverityBand::from_score(0.0), SeverityBand::Minor);
        assert_eq!(SeverityBand::from_score(0.29), SeverityBand::Minor);
        assert_eq!(SeverityBand::from_score(0.3), SeverityBand::Moderate);
        assert_eq!(SeverityBand::from_score(0.59), SeverityBand::Moderate);
        assert_eq!(SeverityBand::from_score(0.6), SeverityBand::Severe);
        assert_eq!(SeverityBand::from_score(1.0), SeverityBand::Severe);
        assert!(SeverityBand::Minor < SeverityBand::Severe);
    }

    #[test]
    fn test_severity_band_parse() {
        assert_eq!("severe".parse::<SeverityBand>().unwrap(), SeverityBand::Severe);
        assert_eq!("Minor".parse::<SeverityBand>().unwrap(), SeverityBand::Minor);
        assert!("critical".parse::<SeverityBand>().is_err());
    }

    #[test]
    fn test_violation_clamps_severity() {
        let v = Violation::new(
            "cycle-1".to_string(),
            ViolationKind::Cycle,
            f64::NAN,
            vec![],
            String::new(),
        );
        assert_eq!(v.severity, 0.0);
        let v = Violation::new(
            "cycle-2".to_string(),
            ViolationKind::Cycle,
            3.0,
            vec![],
            String::new(),
        );
        assert_eq!(v.severity, 1.0);
        assert_eq!(v.band, SeverityBand::Severe);
    }

    #[test]
    fn test_reference_accepts_plain_and_detailed_forms() {
        let plain: DependencyReference = serde_json::from_str("\"app/services\"").unwrap();
        assert_eq!(plain, DependencyReference::import("app/services"));

        let detailed: DependencyReference =
            serde_json::from_str(r#"{"target":"Repo","kind":"call","symbols":["save"]}"#)
                .unwrap();
        assert_eq!(detailed.kind, EdgeKind::Call);
        assert_eq!(detailed.symbols, vec!["save".to_string()]);

        let bare: DependencyReference = serde_json::from_str(r#"{"target":"Repo"}"#).unwrap();
        assert_eq!(bare, DependencyReference::import("Repo"));
    }

    #[test]
    fn test_private_ratio() {
        let record = ComponentRecord {
            component_id: ComponentId::from("a"),
            display_name: "A".to_string(),
            file_path: "src\\a.rs".to_string(),
            loc: 10,
            exported_symbols: ["x".to_string()].into_iter().collect(),
            private_symbols: ["y".to_string(), "z".to_string(), "w".to_string()]
                .into_iter()
                .collect(),
            raw_dependency_references: vec![],
            declares_abstraction: false,
            uses_dependency_injection: false,
        };
        let component = Component::from(&record);
        assert_eq!(component.file_path, "src/a.rs");
        assert_eq!(component.private_ratio(), Some(0.75));
    }

    #[test]
    fn test_component_id_display() {
        let id = ComponentId::new("pkg::Name");
        assert_eq!(id.to_string(), "pkg::Name");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"pkg::Name\"");
    }
}
