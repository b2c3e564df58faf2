use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::antipattern::AntiPatternDetector;
use crate::config::Config;
use crate::error::{AnalysisError, ConfigError};
use crate::graph::ArchGraph;
use crate::intent::{
    overall_health, DependencyInversion, InformationHiding, IntentDetector, IntentKind,
    SeparationOfConcerns,
};
use crate::layer::LayerClassifier;
use crate::recommend::RecommendationEngine;
use crate::report::AnalysisReport;
use crate::source::ComponentSource;
use crate::style::{builtin_tables, classify_styles, StyleDetector, TableDrivenStyle};
use crate::types::{ComponentRecord, StyleKind};

/// Cooperative cancellation flag, checked between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self, stage: &'static str) -> Result<(), AnalysisError> {
        if self.is_cancelled() {
            warn!(stage, "analysis cancelled");
            return Err(AnalysisError::Cancelled { stage });
        }
        Ok(())
    }
}

/// The detectors a pipeline runs, kept sorted by kind.
pub struct DetectorRegistry {
    intents: Vec<Box<dyn IntentDetector>>,
    styles: Vec<Box<dyn StyleDetector>>,
}

impl DetectorRegistry {
    pub fn empty() -> Self {
        Self {
            intents: Vec::new(),
            styles: Vec::new(),
        }
    }

    /// The three intent scorers and five style tables, configured from `config`.
    pub fn builtin(config: &Config) -> Result<Self, ConfigError> {
        let classifier = LayerClassifier::new(&config.layers)?;
        let intents = &config.intents;

        let mut registry = Self::empty()
            .with_intent(Box::new(SeparationOfConcerns::new(
                classifier.clone(),
                intents.separation.clone(),
            )))
            .with_intent(Box::new(InformationHiding::new(intents.hiding.clone())))
            .with_intent(Box::new(DependencyInversion::new(
                classifier,
                intents.inversion.clone(),
            )));
        for table in builtin_tables() {
            registry = registry.with_style(Box::new(TableDrivenStyle::new(
                table,
                config.styles.clone(),
            )));
        }
        Ok(registry)
    }

    /// Add an intent detector, replacing any registered for the same kind.
    pub fn with_intent(mut self, detector: Box<dyn IntentDetector>) -> Self {
        self.intents.retain(|d| d.kind() != detector.kind());
        self.intents.push(detector);
        self.intents.sort_by_key(|d| d.kind());
        self
    }

    /// Add a style detector, replacing any registered for the same style.
    pub fn with_style(mut self, detector: Box<dyn StyleDetector>) -> Self {
        self.styles.retain(|d| d.style() != detector.style());
        self.styles.push(detector);
        self.styles.sort_by_key(|d| d.style());
        self
    }

    pub fn intent_kinds(&self) -> Vec<IntentKind> {
        self.intents.iter().map(|d| d.kind()).collect()
    }

    pub fn style_kinds(&self) -> Vec<StyleKind> {
        self.styles.iter().map(|d| d.style()).collect()
    }
}

/// Runs graph building, intent scoring, style detection, anti-pattern
/// detection and recommendation over one set of component records.
pub struct AnalysisPipeline {
    config: Config,
    registry: DetectorRegistry,
}

impl AnalysisPipeline {
    /// Validate `config` and build the default detector registry.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = DetectorRegistry::builtin(&config)?;
        Ok(Self { config, registry })
    }

    pub fn with_registry(config: Config, registry: DetectorRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    pub fn analyze(&self, records: &[ComponentRecord]) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_with_token(records, &CancellationToken::new())
    }

    /// Load records from `source` and analyze them.
    pub fn analyze_source(
        &self,
        source: &dyn ComponentSource,
        token: &CancellationToken,
    ) -> Result<AnalysisReport, AnalysisError> {
        token.check("load")?;
        let records = source.load()?;
        info!(source = source.name(), records = records.len(), "component records loaded");
        self.analyze_with_token(&records, token)
    }

    pub fn analyze_with_token(
        &self,
        records: &[ComponentRecord],
        token: &CancellationToken,
    ) -> Result<AnalysisReport, AnalysisError> {
        token.check("graph")?;
        let build = ArchGraph::build(records)?;
        let graph = build.graph;
        info!(
            components = graph.node_count(),
            edges = graph.edge_count(),
            cycles = graph.cycles().len(),
            diagnostics = build.diagnostics.len(),
            "graph built"
        );

        token.check("intents")?;
        let intents: Vec<_> = self
            .registry
            .intents
            .par_iter()
            .map(|detector| detector.detect(&graph))
            .collect();
        for result in &intents {
            debug!(
                intent = %result.kind,
                score = result.score,
                insufficient = result.insufficient_data,
                "intent scored"
            );
        }
        let health = overall_health(&intents, &self.config.intents.health);
        info!(health, "intents scored");

        token.check("styles")?;
        let styles: Vec<_> = self
            .registry
            .styles
            .par_iter()
            .map(|detector| detector.detect(&graph, &intents))
            .collect();
        let classification = classify_styles(&styles, &self.config.styles);
        info!(classification = ?classification, "styles classified");

        token.check("anti-patterns")?;
        let detected = classification.styles();
        let mut violations = AntiPatternDetector::new(self.config.anti_patterns.clone())
            .detect(&graph, &styles, &classification);
        violations.extend(
            styles
                .iter()
                .filter(|r| detected.contains(&r.style))
                .flat_map(|r| r.violations.iter().cloned()),
        );
        info!(violations = violations.len(), "violations collected");

        token.check("recommendations")?;
        let recommendations = RecommendationEngine::new(self.config.intents.gap_threshold)
            .recommend(&violations, &intents);
        info!(recommendations = recommendations.len(), "analysis complete");

        Ok(AnalysisReport {
            graph: graph.snapshot(),
            intents,
            styles,
            violations,
            recommendations,
            overall_health_score: health,
            classification,
            diagnostics: build.diagnostics,
        })
    }
}
