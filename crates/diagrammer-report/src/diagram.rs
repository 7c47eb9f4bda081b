use std::collections::BTreeMap;

use tracing::debug;

use diagrammer_core::config::DiagramConfig;
use diagrammer_core::graph::{module_id, DependencyGraph};
use diagrammer_core::types::{Analysis, ArchPattern};

use crate::architecture::{architecture_view, View};
use crate::circular::circular_view;
use crate::filter;
use crate::flows::{flow_view, Flow};
use crate::focus::{layer_views, module_views};
use crate::markdown::{self, Document};
use crate::mermaid::{sanitize_id, EdgeStyle, RenderContext, Shape};
use crate::style;
use crate::views::{layered_view, microservices_view, mvc_view};

/// Import edges from each source string to the name it brings in.
pub fn dependency_view(analysis: &Analysis, config: &DiagramConfig) -> View {
    let mut ctx = RenderContext::new("LR").with_placeholder("No dependencies found");
    let mut omitted = 0;

    for dep in &analysis.dependencies {
        if dep.from.trim().is_empty() || dep.name.trim().is_empty() {
            continue;
        }
        if !config.include_tests && filter::is_test_path(&dep.path) {
            continue;
        }
        if ctx.edge_count() >= config.max_edges {
            omitted += 1;
            continue;
        }

        let from = if dep.is_external() {
            let id = ctx.node(&dep.from, &dep.from, Shape::Stadium);
            style::apply_external(&mut ctx, &id);
            id
        } else {
            let id = ctx.node(&dep.from, &dep.from, Shape::Rounded);
            ctx.class_def("source", "fill:#e8f5e9,stroke:#2e7d32,stroke-width:1px");
            ctx.assign_class(&id, "source");
            id
        };
        let to = ctx.node(&dep.name, &dep.name, Shape::Box);
        if from != to {
            style::apply(&mut ctx, &to, &dep.name);
        }
        ctx.edge(&from, &to, None, EdgeStyle::Solid);
    }

    let mut notes = Vec::new();
    if omitted > 0 {
        notes.push(format!(
            "{omitted} imports were left out to stay within {} edges.",
            config.max_edges
        ));
    }
    View {
        mermaid: ctx.render(),
        notes,
    }
}

/// Every scanned file grouped by directory, with module-level import edges.
pub fn module_view(analysis: &Analysis, config: &DiagramConfig) -> View {
    let mut ctx = RenderContext::new("TB").with_placeholder("No modules found");

    let mut by_dir: BTreeMap<String, Vec<_>> = BTreeMap::new();
    for module in &analysis.modules {
        if !config.include_tests && filter::is_test_path(&module.path) {
            continue;
        }
        by_dir
            .entry(filter::directory_of(&module.path))
            .or_default()
            .push(module);
    }

    for (dir, modules) in &by_dir {
        ctx.open_group(dir, dir);
        for module in modules {
            let label = match module.exports.len() {
                0 => module.name.clone(),
                1 => format!("{} (1 export)", module.name),
                n => format!("{} ({n} exports)", module.name),
            };
            let id = ctx.node(&module_id(&module.path), &label, Shape::Box);
            ctx.class_def("module", "fill:#e3f2fd,stroke:#1976d2,stroke-width:1px");
            ctx.assign_class(&id, "module");
        }
        ctx.close_group();
    }

    let graph = DependencyGraph::from_dependencies(&analysis.dependencies);
    for edge in graph.edges() {
        if ctx.edge_count() >= config.max_edges {
            break;
        }
        if !ctx.has_node(&edge.from) || !ctx.has_node(&edge.to) {
            continue;
        }
        let label = (edge.imports > 1).then(|| format!("{} imports", edge.imports));
        ctx.edge(
            &sanitize_id(&edge.from),
            &sanitize_id(&edge.to),
            label.as_deref(),
            EdgeStyle::Solid,
        );
    }

    View {
        mermaid: ctx.render(),
        notes: Vec::new(),
    }
}

/// Turns an [`Analysis`] into named Markdown documents.
pub struct DiagramGenerator {
    config: DiagramConfig,
}

impl DiagramGenerator {
    pub fn new(config: DiagramConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    /// Generate every diagram for the analysis, keyed by diagram name.
    ///
    /// `architecture`, `dependencies` and `modules` are always present, even
    /// for an empty analysis.
    pub fn generate_diagrams(&self, analysis: &Analysis) -> BTreeMap<String, String> {
        let config = &self.config;
        let pairs = DependencyGraph::from_import_names(&analysis.dependencies).circular_pairs();
        let shared = markdown::insights(analysis, pairs.len());
        let document = |title: &str, description: &str, view: View| {
            Document::new(title, description, analysis, config, view.mermaid)
                .insights(shared.iter().cloned().chain(view.notes))
        };

        let mut diagrams = BTreeMap::new();
        diagrams.insert(
            "architecture".to_string(),
            document(
                "Architecture Overview",
                "The most important components grouped by directory, with their imports, relationships and external packages.",
                architecture_view(analysis, config, false),
            )
            .render(),
        );
        diagrams.insert(
            "architecture-interactive".to_string(),
            document(
                "Architecture Overview (Interactive)",
                "The architecture overview with each component linked to its source file.",
                architecture_view(analysis, config, true),
            )
            .render(),
        );
        diagrams.insert(
            "dependencies".to_string(),
            document(
                "Dependency Graph",
                "Each import source and the names imported from it.",
                dependency_view(analysis, config),
            )
            .render(),
        );
        diagrams.insert(
            "modules".to_string(),
            document(
                "Module Structure",
                "Every analyzed file grouped by directory, with imports between them.",
                module_view(analysis, config),
            )
            .render(),
        );
        diagrams.insert(
            "layered-architecture".to_string(),
            document(
                "Layered Architecture",
                "Components stacked by architectural layer.",
                layered_view(analysis, config),
            )
            .render(),
        );

        let detected = analysis.detected_patterns();
        if detected.contains(&ArchPattern::Mvc) {
            diagrams.insert(
                "mvc-pattern".to_string(),
                document(
                    "MVC Pattern",
                    ArchPattern::Mvc.description(),
                    mvc_view(analysis, config),
                )
                .render(),
            );
        }
        if detected.contains(&ArchPattern::Microservices) {
            diagrams.insert(
                "microservices".to_string(),
                document(
                    "Microservices",
                    ArchPattern::Microservices.description(),
                    microservices_view(analysis, config),
                )
                .render(),
            );
        }

        for flow in Flow::ALL {
            let view = flow_view(flow, analysis, config).unwrap_or_else(|| View {
                mermaid: RenderContext::new("LR")
                    .with_placeholder("No relationships detected")
                    .render(),
                notes: vec![format!(
                    "No relationships detected for the {} view.",
                    flow.name()
                )],
            });
            diagrams.insert(
                flow.name().to_string(),
                document(flow.title(), flow.description(), view).render(),
            );
        }

        diagrams.insert(
            "circular-dependencies".to_string(),
            document(
                "Circular Dependencies",
                "Import sources and imported names that depend on each other.",
                circular_view(&pairs, config),
            )
            .render(),
        );

        for focus in layer_views(analysis, config)
            .into_iter()
            .chain(module_views(analysis, config))
        {
            diagrams.insert(
                focus.name,
                document(&focus.title, &focus.description, focus.view).render(),
            );
        }

        debug!(count = diagrams.len(), "generated diagrams");
        diagrams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagrammer_core::types::{
        Component, ComponentKind, Dependency, Locality, Module, PatternSummary,
    };

    fn dep(name: &str, from: &str, path: &str, locality: Locality) -> Dependency {
        Dependency {
            name: name.to_string(),
            from: from.to_string(),
            path: path.to_string(),
            is_default: false,
            locality,
        }
    }

    fn generate(analysis: &Analysis) -> BTreeMap<String, String> {
        DiagramGenerator::new(DiagramConfig::default()).generate_diagrams(analysis)
    }

    #[test]
    fn test_empty_analysis_produces_baseline_diagrams() {
        let diagrams = generate(&Analysis::default());
        for name in ["architecture", "dependencies", "modules"] {
            let doc = diagrams.get(name).unwrap();
            assert!(doc.contains("```mermaid\ngraph "), "{name} has no graph");
            assert!(doc.contains("empty[\""), "{name} has no placeholder");
        }
        assert!(!diagrams.contains_key("mvc-pattern"));
        assert!(!diagrams.contains_key("microservices"));
        assert!(!diagrams.keys().any(|k| k.starts_with("layer-")));
    }

    #[test]
    fn test_missing_relationships_get_placeholder_documents() {
        let diagrams = generate(&Analysis::default());
        for flow in Flow::ALL {
            let doc = diagrams.get(flow.name()).unwrap();
            assert!(doc.contains("No relationships detected"));
        }
        assert!(diagrams["circular-dependencies"].contains("No circular dependencies detected"));
    }

    #[test]
    fn test_self_dependency_never_drawn() {
        let analysis = Analysis {
            dependencies: vec![
                dep("os", "os", "app.py", Locality::External),
                dep("helper", "./utils", "app.py", Locality::Local),
            ],
            ..Analysis::default()
        };
        let view = dependency_view(&analysis, &DiagramConfig::default());
        assert!(!view.mermaid.contains("os --> os"));
        assert!(view.mermaid.contains("os([\"os\"])"));
        assert!(view.mermaid.contains("__utils --> helper"));
    }

    #[test]
    fn test_module_view_edges() {
        let analysis = Analysis {
            modules: vec![
                Module::for_file("src/index.ts", "typescript", vec!["App".into()]),
                Module::for_file("src/services/UserService.ts", "typescript", vec![]),
            ],
            dependencies: vec![
                dep("UserService", "./services/UserService", "src/index.ts", Locality::Local),
                dep("React", "react", "src/index.ts", Locality::External),
            ],
            ..Analysis::default()
        };
        let view = module_view(&analysis, &DiagramConfig::default());
        assert!(view.mermaid.contains("src[\"index (1 export)\"]"));
        assert!(view.mermaid.contains("src --> src_services_UserService"));
        assert!(!view.mermaid.contains("react"));
    }

    #[test]
    fn test_mutual_imports_reach_circular_document() {
        let analysis = Analysis {
            dependencies: vec![
                dep("B", "A", "src/x.ts", Locality::External),
                dep("A", "B", "src/y.ts", Locality::External),
            ],
            ..Analysis::default()
        };
        let diagrams = generate(&analysis);
        let doc = &diagrams["circular-dependencies"];
        assert_eq!(doc.matches("<-->").count(), 2, "one edge plus the legend row:\n{doc}");
        assert!(doc.contains("A <-->|circular| B"));
        assert!(doc.contains("1 circular dependency pair(s) detected"));
    }

    #[test]
    fn test_every_document_carries_summary_tables() {
        let analysis = Analysis {
            components: vec![Component::new(
                "UserService",
                "src/services/UserService.ts",
                ComponentKind::Class,
                "typescript",
            )],
            modules: vec![Module::for_file(
                "src/services/UserService.ts",
                "typescript",
                vec!["UserService".into()],
            )],
            dependencies: vec![dep("React", "react", "src/services/UserService.ts", Locality::External)],
            ..Analysis::default()
        };
        for (name, doc) in generate(&analysis) {
            for section in ["## Top Components", "## Dependencies", "## Patterns", "## Languages"] {
                assert!(doc.contains(section), "{name} is missing {section}");
            }
        }
    }

    #[test]
    fn test_pattern_views_only_when_detected() {
        let mut analysis = Analysis {
            components: vec![Component::new(
                "UserController",
                "src/controllers/UserController.ts",
                ComponentKind::Class,
                "typescript",
            )],
            ..Analysis::default()
        };
        analysis.patterns.insert(
            ArchPattern::Mvc,
            PatternSummary {
                count: 1,
                components: vec!["UserController".into()],
            },
        );
        let diagrams = generate(&analysis);
        assert!(diagrams.contains_key("mvc-pattern"));
        assert!(!diagrams.contains_key("microservices"));
        assert!(diagrams.contains_key("module-src-controllers"));
    }
}
