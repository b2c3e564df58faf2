use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::layer::LayerClassifier;

/// Top-level configuration, usually read from `archlens.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layers: LayersConfig,
    #[serde(default)]
    pub intents: IntentConfig,
    #[serde(default)]
    pub styles: StyleConfig,
    #[serde(default)]
    pub anti_patterns: AntiPatternConfig,
}

/// Glob patterns mapping file paths to architectural layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayersConfig {
    #[serde(default = "default_domain_patterns")]
    pub domain: Vec<String>,
    #[serde(default = "default_application_patterns")]
    pub application: Vec<String>,
    #[serde(default = "default_infrastructure_patterns")]
    pub infrastructure: Vec<String>,
    #[serde(default = "default_presentation_patterns")]
    pub presentation: Vec<String>,
}

fn default_domain_patterns() -> Vec<String> {
    vec![
        "**/domain/**".to_string(),
        "**/entity/**".to_string(),
        "**/entities/**".to_string(),
        "**/model/**".to_string(),
        "**/models/**".to_string(),
    ]
}

fn default_application_patterns() -> Vec<String> {
    vec![
        "**/application/**".to_string(),
        "**/usecase/**".to_string(),
        "**/usecases/**".to_string(),
        "**/service/**".to_string(),
        "**/services/**".to_string(),
    ]
}

fn default_infrastructure_patterns() -> Vec<String> {
    vec![
        "**/infrastructure/**".to_string(),
        "**/adapter/**".to_string(),
        "**/adapters/**".to_string(),
        "**/repository/**".to_string(),
        "**/repositories/**".to_string(),
        "**/persistence/**".to_string(),
    ]
}

fn default_presentation_patterns() -> Vec<String> {
    vec![
        "**/presentation/**".to_string(),
        "**/handler/**".to_string(),
        "**/handlers/**".to_string(),
        "**/controller/**".to_string(),
        "**/controllers/**".to_string(),
        "**/api/**".to_string(),
        "**/cmd/**".to_string(),
    ]
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            domain: default_domain_patterns(),
            application: default_application_patterns(),
            infrastructure: default_infrastructure_patterns(),
            presentation: default_presentation_patterns(),
        }
    }
}

/// Weights for the separation-of-concerns sub-ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationWeights {
    #[serde(default = "half")]
    pub layer_respect: f64,
    #[serde(default = "half")]
    pub domain_isolation: f64,
}

fn half() -> f64 {
    0.5
}

impl Default for SeparationWeights {
    fn default() -> Self {
        Self {
            layer_respect: half(),
            domain_isolation: half(),
        }
    }
}

/// Weights for the information-hiding sub-ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HidingWeights {
    #[serde(default = "default_private_weight")]
    pub private_ratio: f64,
    #[serde(default = "default_hiding_abstraction_weight")]
    pub abstraction: f64,
    #[serde(default = "default_boundary_weight")]
    pub boundary_clarity: f64,
}

fn default_private_weight() -> f64 {
    0.4
}
fn default_hiding_abstraction_weight() -> f64 {
    0.3
}
fn default_boundary_weight() -> f64 {
    0.3
}

impl Default for HidingWeights {
    fn default() -> Self {
        Self {
            private_ratio: default_private_weight(),
            abstraction: default_hiding_abstraction_weight(),
            boundary_clarity: default_boundary_weight(),
        }
    }
}

/// Weights for the dependency-inversion sub-ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InversionWeights {
    #[serde(default = "default_di_abstraction_weight")]
    pub abstraction: f64,
    #[serde(default = "default_injection_weight")]
    pub injection: f64,
    #[serde(default = "default_inversion_weight")]
    pub inversion_ratio: f64,
}

fn default_di_abstraction_weight() -> f64 {
    0.3
}
fn default_injection_weight() -> f64 {
    0.3
}
fn default_inversion_weight() -> f64 {
    0.4
}

impl Default for InversionWeights {
    fn default() -> Self {
        Self {
            abstraction: default_di_abstraction_weight(),
            injection: default_injection_weight(),
            inversion_ratio: default_inversion_weight(),
        }
    }
}

/// Weights for combining the three intents into the overall health score.
/// Normalized by their sum, so only the proportions matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthWeights {
    #[serde(default = "one")]
    pub separation_of_concerns: f64,
    #[serde(default = "one")]
    pub information_hiding: f64,
    #[serde(default = "one")]
    pub dependency_inversion: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            separation_of_concerns: one(),
            information_hiding: one(),
            dependency_inversion: one(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentConfig {
    #[serde(default)]
    pub separation: SeparationWeights,
    #[serde(default)]
    pub hiding: HidingWeights,
    #[serde(default)]
    pub inversion: InversionWeights,
    #[serde(default)]
    pub health: HealthWeights,
    /// Intents scoring below this produce a recommendation.
    #[serde(default = "half")]
    pub gap_threshold: f64,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            separation: SeparationWeights::default(),
            hiding: HidingWeights::default(),
            inversion: InversionWeights::default(),
            health: HealthWeights::default(),
            gap_threshold: half(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_hybrid_margin")]
    pub hybrid_margin: f64,
    /// Below this many classified components a style scores 0.
    #[serde(default = "default_min_classified")]
    pub min_classified_components: usize,
    /// Role coverage at which confidence is no longer scaled down.
    #[serde(default = "default_full_coverage")]
    pub full_coverage: f64,
}

fn default_confidence_threshold() -> f64 {
    0.4
}
fn default_hybrid_margin() -> f64 {
    0.15
}
fn default_min_classified() -> usize {
    2
}
fn default_full_coverage() -> f64 {
    0.6
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            hybrid_margin: default_hybrid_margin(),
            min_classified_components: default_min_classified(),
            full_coverage: default_full_coverage(),
        }
    }
}

/// Thresholds for god-component detection. All three must be exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GodComponentThresholds {
    #[serde(default = "default_god_loc")]
    pub loc: usize,
    #[serde(default = "default_god_efferent")]
    pub efferent: usize,
    #[serde(default = "default_god_symbols")]
    pub exported_symbols: usize,
}

fn default_god_loc() -> usize {
    500
}
fn default_god_efferent() -> usize {
    15
}
fn default_god_symbols() -> usize {
    20
}

impl Default for GodComponentThresholds {
    fn default() -> Self {
        Self {
            loc: default_god_loc(),
            efferent: default_god_efferent(),
            exported_symbols: default_god_symbols(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntiPatternConfig {
    /// Percentile of total coupling above which a component is tightly coupled.
    #[serde(default = "default_coupling_percentile")]
    pub coupling_percentile: f64,
    /// Percentile-based flags also require at least this much coupling.
    #[serde(default = "default_coupling_floor")]
    pub coupling_floor: usize,
    /// Coupling above this is always flagged.
    #[serde(default = "default_coupling_cap")]
    pub coupling_cap: usize,
    #[serde(default)]
    pub god_component: GodComponentThresholds,
}

fn default_coupling_percentile() -> f64 {
    0.9
}
fn default_coupling_floor() -> usize {
    3
}
fn default_coupling_cap() -> usize {
    20
}

impl Default for AntiPatternConfig {
    fn default() -> Self {
        Self {
            coupling_percentile: default_coupling_percentile(),
            coupling_floor: default_coupling_floor(),
            coupling_cap: default_coupling_cap(),
            god_component: GodComponentThresholds::default(),
        }
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "a value in [0, 1]",
        })
    }
}

fn check_weights(group: &'static str, weights: &[(&'static str, f64)]) -> Result<(), ConfigError> {
    for &(field, value) in weights {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::OutOfRange {
                field,
                value,
                expected: "a finite, non-negative weight",
            });
        }
    }
    if weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
        return Err(ConfigError::ZeroWeights { group });
    }
    Ok(())
}

impl Config {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("invalid configuration in '{}'", path.display()))?;
        Ok(config)
    }

    /// Reject out-of-range parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.styles;
        check_unit("styles.confidence_threshold", s.confidence_threshold)?;
        check_unit("styles.hybrid_margin", s.hybrid_margin)?;
        if !s.full_coverage.is_finite() || s.full_coverage <= 0.0 || s.full_coverage > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "styles.full_coverage",
                value: s.full_coverage,
                expected: "a value in (0, 1]",
            });
        }

        let a = &self.anti_patterns;
        let p = a.coupling_percentile;
        if !p.is_finite() || p <= 0.0 || p > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "anti_patterns.coupling_percentile",
                value: p,
                expected: "a value in (0, 1]",
            });
        }

        let i = &self.intents;
        check_unit("intents.gap_threshold", i.gap_threshold)?;
        check_weights(
            "intents.separation",
            &[
                ("intents.separation.layer_respect", i.separation.layer_respect),
                (
                    "intents.separation.domain_isolation",
                    i.separation.domain_isolation,
                ),
            ],
        )?;
        check_weights(
            "intents.hiding",
            &[
                ("intents.hiding.private_ratio", i.hiding.private_ratio),
                ("intents.hiding.abstraction", i.hiding.abstraction),
                ("intents.hiding.boundary_clarity", i.hiding.boundary_clarity),
            ],
        )?;
        check_weights(
            "intents.inversion",
            &[
                ("intents.inversion.abstraction", i.inversion.abstraction),
                ("intents.inversion.injection", i.inversion.injection),
                ("intents.inversion.inversion_ratio", i.inversion.inversion_ratio),
            ],
        )?;
        check_weights(
            "intents.health",
            &[
                (
                    "intents.health.separation_of_concerns",
                    i.health.separation_of_concerns,
                ),
                ("intents.health.information_hiding", i.health.information_hiding),
                (
                    "intents.health.dependency_inversion",
                    i.health.dependency_inversion,
                ),
            ],
        )?;
        LayerClassifier::new(&self.layers)?;
        Ok(())
    }

    /// Generate default TOML content documenting every parameter.
    pub fn default_toml() -> String {
        r#"# archlens - architectural graph analysis configuration

[layers]
# Glob patterns used to group components into layers for separation of concerns
domain = ["**/domain/**", "**/entity/**", "**/entities/**", "**/model/**", "**/models/**"]
application = ["**/application/**", "**/usecase/**", "**/usecases/**", "**/service/**", "**/services/**"]
infrastructure = ["**/infrastructure/**", "**/adapter/**", "**/adapters/**", "**/repository/**", "**/repositories/**", "**/persistence/**"]
presentation = ["**/presentation/**", "**/handler/**", "**/handlers/**", "**/controller/**", "**/controllers/**", "**/api/**", "**/cmd/**"]

[intents]
# Intents scoring below this produce a recommendation
gap_threshold = 0.5

[intents.separation]
layer_respect = 0.5
domain_isolation = 0.5

[intents.hiding]
private_ratio = 0.4
abstraction = 0.3
boundary_clarity = 0.3

[intents.inversion]
abstraction = 0.3
injection = 0.3
inversion_ratio = 0.4

[intents.health]
# Normalized by their sum; equal weights by default
separation_of_concerns = 1.0
information_hiding = 1.0
dependency_inversion = 1.0

[styles]
confidence_threshold = 0.4
hybrid_margin = 0.15
min_classified_components = 2
full_coverage = 0.6

[anti_patterns]
coupling_percentile = 0.9
coupling_floor = 3
coupling_cap = 20

[anti_patterns.god_component]
loc = 500
efferent = 15
exported_symbols = 20
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert!((config.styles.confidence_threshold - 0.4).abs() < f64::EPSILON);
        assert!((config.styles.hybrid_margin - 0.15).abs() < f64::EPSILON);
        assert!((config.anti_patterns.coupling_percentile - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_toml_matches_default_config() {
        let config = Config::from_toml_str(&Config::default_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
[styles]
hybrid_margin = 0.2

[anti_patterns.god_component]
loc = 800
"#,
        )
        .unwrap();
        assert!((config.styles.hybrid_margin - 0.2).abs() < f64::EPSILON);
        assert!((config.styles.confidence_threshold - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.anti_patterns.god_component.loc, 800);
        assert_eq!(config.anti_patterns.god_component.efferent, 15);
        assert!(!config.layers.domain.is_empty());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = Config::from_toml_str(
            r#"
[styles]
confidence_threshold = -0.1
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "styles.confidence_threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_percentile_rejected() {
        let mut config = Config::default();
        config.anti_patterns.coupling_percentile = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_all_zero_health_weights_rejected() {
        let mut config = Config::default();
        config.intents.health = HealthWeights {
            separation_of_concerns: 0.0,
            information_hiding: 0.0,
            dependency_inversion: 0.0,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroWeights {
                group: "intents.health"
            })
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = Config::default();
        config.intents.hiding.private_ratio = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_layer_glob_rejected() {
        let mut config = Config::default();
        config.layers.domain = vec!["**/[domain/**".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Pattern { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_toml_str("[styles\nthreshold = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archlens.toml");
        std::fs::write(&path, "[styles]\nconfidence_threshold = 0.5\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert!((config.styles.confidence_threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_rejects_out_of_range_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archlens.toml");
        std::fs::write(&path, "[styles]\nhybrid_margin = 1.5\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("styles.hybrid_margin"));
    }
}
