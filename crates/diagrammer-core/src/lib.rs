pub mod architecture;
pub mod codebase;
pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod layer;
pub mod patterns;
pub mod pipeline;
pub mod relationship;
pub mod scanner;
pub mod sources;
pub mod types;

pub use architecture::ArchitecturalAnalyzer;
pub use codebase::CodebaseAnalyzer;
pub use config::{Config, DiagramConfig};
pub use discovery::discover_files;
pub use error::ScanError;
pub use graph::DependencyGraph;
pub use layer::LayerClassifier;
pub use patterns::{MatchGroups, PatternSet};
pub use pipeline::AnalysisPipeline;
pub use relationship::{categorize_relationships, RelationshipAnalyzer};
pub use scanner::{LanguageScanner, ScanResult, ScannerRegistry};
pub use sources::{load_sources, SourceSet};
pub use types::*;
