use serde::{Deserialize, Serialize};

use crate::graph::GraphSnapshot;
use crate::intent::{IntentKind, IntentResult};
use crate::recommend::Recommendation;
use crate::resolve::Diagnostic;
use crate::style::{Classification, StyleResult};
use crate::types::{StyleKind, Violation, ViolationKind};

/// Everything one analysis run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub graph: GraphSnapshot,
    pub intents: Vec<IntentResult>,
    pub styles: Vec<StyleResult>,
    pub violations: Vec<Violation>,
    pub recommendations: Vec<Recommendation>,
    pub overall_health_score: f64,
    pub classification: Classification,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn intent(&self, kind: IntentKind) -> Option<&IntentResult> {
        self.intents.iter().find(|r| r.kind == kind)
    }

    pub fn style(&self, kind: StyleKind) -> Option<&StyleResult> {
        self.styles.iter().find(|r| r.style == kind)
    }

    pub fn violations_of(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}
