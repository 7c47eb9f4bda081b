use std::collections::BTreeMap;

use anyhow::Result;

use crate::architecture::ArchitecturalAnalyzer;
use crate::codebase::CodebaseAnalyzer;
use crate::config::Config;
use crate::relationship::{categorize_relationships, RelationshipAnalyzer};
use crate::scanner::ScannerRegistry;
use crate::sources::SourceSet;
use crate::types::{deduplicate_relationships, Analysis, ArchLayer, ArchPattern, PatternSummary};

/// Scan, enrich and relate: the whole analysis in one call.
pub struct AnalysisPipeline {
    codebase: CodebaseAnalyzer,
    architecture: ArchitecturalAnalyzer,
    relationships: RelationshipAnalyzer,
}

impl AnalysisPipeline {
    pub fn new(registry: ScannerRegistry, config: &Config) -> Result<Self> {
        Ok(Self {
            codebase: CodebaseAnalyzer::new(registry),
            architecture: ArchitecturalAnalyzer::new(&config.layers)?,
            relationships: RelationshipAnalyzer::new()?,
        })
    }

    pub fn registry(&self) -> &ScannerRegistry {
        self.codebase.registry()
    }

    /// Run every stage over already-loaded sources.
    pub fn run(&self, sources: &SourceSet, languages: &[String]) -> Analysis {
        let mut analysis = self.codebase.analyze_codebase(sources, languages);
        tracing::info!(
            components = analysis.components.len(),
            dependencies = analysis.dependencies.len(),
            modules = analysis.modules.len(),
            "codebase scanned"
        );

        analysis.components = analysis
            .components
            .iter()
            .map(|c| {
                let content = sources.get(&c.path).unwrap_or_default();
                self.architecture.analyze_component(c, content, &c.path)
            })
            .collect();

        let mut layers: BTreeMap<ArchLayer, Vec<String>> = BTreeMap::new();
        let mut patterns: BTreeMap<ArchPattern, PatternSummary> = BTreeMap::new();
        for component in &analysis.components {
            layers
                .entry(component.layer())
                .or_default()
                .push(component.name.clone());
            for matched in &component.patterns {
                let summary = patterns.entry(matched.pattern).or_default();
                summary.count += 1;
                summary.components.push(component.name.clone());
            }
        }
        analysis.architectural_layers = layers;
        analysis.patterns = patterns;

        let structural = analysis
            .components
            .iter()
            .flat_map(|c| c.relationships.iter().cloned());
        let mined = self
            .relationships
            .analyze_relationships(&analysis.components, sources);
        analysis.relationships = deduplicate_relationships(structural.chain(mined).collect());
        analysis.relationship_categories = categorize_relationships(&analysis.relationships);

        tracing::info!(
            relationships = analysis.relationships.len(),
            patterns = analysis.patterns.len(),
            "architecture analyzed"
        );
        analysis
    }
}
