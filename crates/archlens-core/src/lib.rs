pub mod antipattern;
pub mod centrality;
pub mod config;
pub mod error;
pub mod graph;
pub mod intent;
pub mod layer;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod resolve;
pub mod roles;
pub mod source;
pub mod style;
pub mod types;

pub use config::Config;
pub use error::{AnalysisError, ConfigError, InputError};
pub use graph::{ArchGraph, CycleGroup, GraphBuild, GraphSnapshot};
pub use intent::{Evidence, EvidenceSignal, IntentDetector, IntentKind, IntentResult};
pub use layer::LayerClassifier;
pub use pipeline::{AnalysisPipeline, CancellationToken, DetectorRegistry};
pub use recommend::{Priority, Recommendation, RefactoringCategory};
pub use report::AnalysisReport;
pub use resolve::{Diagnostic, DiagnosticKind};
pub use source::{parse_records, ComponentSource, JsonFileSource, JsonRecords};
pub use style::{Classification, StyleDetector, StyleResult};
pub use types::*;
