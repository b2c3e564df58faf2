use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::LayersConfig;
use crate::error::ConfigError;
use crate::types::ArchLayer;

/// Directory names that carry no feature/domain meaning.
const NEUTRAL_DIRS: &[&str] = &["src", "lib", "app", "internal", "pkg", "main", "java", "kotlin"];

/// Classifies file paths into architectural layers using glob patterns.
#[derive(Debug, Clone)]
pub struct LayerClassifier {
    domain: GlobSet,
    application: GlobSet,
    infrastructure: GlobSet,
    presentation: GlobSet,
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Pattern {
        pattern: patterns.join(", "),
        source,
    })
}

impl LayerClassifier {
    pub fn new(config: &LayersConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            domain: build_globset(&config.domain)?,
            application: build_globset(&config.application)?,
            infrastructure: build_globset(&config.infrastructure)?,
            presentation: build_globset(&config.presentation)?,
        })
    }

    /// Classify a file path into an architectural layer.
    pub fn classify(&self, path: &str) -> Option<ArchLayer> {
        let normalized = path.replace('\\', "/");
        if self.domain.is_match(&normalized) {
            Some(ArchLayer::Domain)
        } else if self.application.is_match(&normalized) {
            Some(ArchLayer::Application)
        } else if self.infrastructure.is_match(&normalized) {
            Some(ArchLayer::Infrastructure)
        } else if self.presentation.is_match(&normalized) {
            Some(ArchLayer::Presentation)
        } else {
            None
        }
    }

    /// Feature/domain key of a path: the first directory that is neither a
    /// neutral source root nor itself a layer directory.
    ///
    /// `src/billing/domain/invoice.rs` → `billing`; `src/domain/user.rs` → none.
    pub fn domain_key(&self, path: &str) -> Option<String> {
        let normalized = path.replace('\\', "/");
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        let (_file, dirs) = segments.split_last()?;

        dirs.iter()
            .find(|dir| {
                let lower = dir.to_lowercase();
                !NEUTRAL_DIRS.contains(&lower.as_str()) && !self.is_layer_dir(&lower)
            })
            .map(|dir| dir.to_lowercase())
    }

    fn is_layer_dir(&self, dir: &str) -> bool {
        self.classify(&format!("{dir}/x")).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> LayerClassifier {
        LayerClassifier::new(&LayersConfig::default()).unwrap()
    }

    #[test]
    fn test_classify_default_patterns() {
        let classifier = classifier();

        assert_eq!(
            classifier.classify("internal/domain/user/entity.go"),
            Some(ArchLayer::Domain)
        );
        assert_eq!(
            classifier.classify("internal/application/user/service.go"),
            Some(ArchLayer::Application)
        );
        assert_eq!(
            classifier.classify("internal/infrastructure/postgres/repo.go"),
            Some(ArchLayer::Infrastructure)
        );
        assert_eq!(
            classifier.classify("src/controllers/user_controller.rs"),
            Some(ArchLayer::Presentation)
        );
        assert_eq!(classifier.classify("main.go"), None);
    }

    #[test]
    fn test_classify_normalizes_backslashes() {
        assert_eq!(
            classifier().classify("src\\services\\billing.rs"),
            Some(ArchLayer::Application)
        );
    }

    #[test]
    fn test_custom_patterns() {
        let config = LayersConfig {
            domain: vec!["**/core/**".to_string()],
            application: vec![],
            infrastructure: vec!["**/infra/**".to_string()],
            presentation: vec![],
        };
        let classifier = LayerClassifier::new(&config).unwrap();
        assert_eq!(classifier.classify("src/core/user.rs"), Some(ArchLayer::Domain));
        assert_eq!(classifier.classify("src/domain/user.rs"), None);
    }

    #[test]
    fn test_domain_key() {
        let classifier = classifier();
        assert_eq!(
            classifier.domain_key("src/billing/domain/invoice.rs"),
            Some("billing".to_string())
        );
        assert_eq!(
            classifier.domain_key("src/orders/services/checkout.rs"),
            Some("orders".to_string())
        );
        assert_eq!(classifier.domain_key("src/domain/user.rs"), None);
        assert_eq!(classifier.domain_key("main.rs"), None);
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let config = LayersConfig {
            domain: vec!["[".to_string()],
            ..LayersConfig::default()
        };
        assert!(LayerClassifier::new(&config).is_err());
    }
}
