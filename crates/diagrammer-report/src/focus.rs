use diagrammer_core::config::DiagramConfig;
use diagrammer_core::types::{Analysis, ArchLayer, Component};

use crate::architecture::{
    anchor, draw_component, draw_groups, link_externals, link_imports, link_relationships, View,
};
use crate::filter::{self, Selection};
use crate::mermaid::{sanitize_id, EdgeStyle, RenderContext};

/// A diagram scoped to one layer or one directory.
#[derive(Debug)]
pub struct FocusView {
    pub name: String,
    pub title: String,
    pub description: String,
    pub view: View,
}

/// Lowercase, dash-separated form of a directory for diagram names.
fn slug(directory: &str) -> String {
    let mut out = String::new();
    for c in directory.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let out = out.trim_end_matches('-').to_string();
    if out.is_empty() {
        "root".to_string()
    } else {
        out
    }
}

/// Components imported by the focused set but drawn outside it.
fn link_neighbours(
    ctx: &mut RenderContext,
    analysis: &Analysis,
    rendered: &[&Component],
    config: &DiagramConfig,
) {
    for dep in analysis.dependencies.iter().filter(|d| d.is_local()) {
        if ctx.edge_count() >= config.max_edges {
            break;
        }
        let Some(from) = anchor(rendered, &dep.path) else {
            continue;
        };
        let Some(target) = analysis
            .components
            .iter()
            .find(|c| c.name == dep.name && !rendered.iter().any(|r| r.name == c.name))
        else {
            continue;
        };
        let crowded = ctx.node_count() >= config.max_nodes.saturating_mul(2);
        if crowded && !ctx.has_node(&target.name) {
            continue;
        }
        let to = draw_component(ctx, target);
        ctx.edge(&sanitize_id(&from.name), &to, Some("imports"), EdgeStyle::Solid);
    }
}

fn render_focus(analysis: &Analysis, selection: &Selection<'_>, config: &DiagramConfig) -> View {
    let groups =
        filter::group_by_directory(&selection.components, config.max_groups, config.max_nodes);
    let mut ctx = RenderContext::new(config.direction());
    let rendered = draw_groups(&mut ctx, &groups);

    let dependencies =
        filter::filter_dependencies(&analysis.dependencies, &rendered, config.max_edges);
    link_imports(&mut ctx, &dependencies, &rendered, config.max_edges);
    link_relationships(&mut ctx, &analysis.relationships, &rendered, config.max_edges);
    link_neighbours(&mut ctx, analysis, &rendered, config);
    link_externals(&mut ctx, &dependencies, &rendered, config);

    let mut notes = Vec::new();
    if selection.truncated() {
        notes.push(format!(
            "Showing {} of {} components.",
            selection.components.len(),
            selection.candidates
        ));
    }
    View {
        mermaid: ctx.render(),
        notes,
    }
}

/// One view per known layer that has at least one eligible component.
pub fn layer_views(analysis: &Analysis, config: &DiagramConfig) -> Vec<FocusView> {
    let focused = config.focused();
    ArchLayer::ALL
        .iter()
        .filter(|layer| **layer != ArchLayer::Unknown)
        .filter_map(|layer| {
            let members = analysis.components.iter().filter(|c| c.layer() == *layer);
            let selection = filter::filter_components(members, &focused);
            if selection.is_empty() {
                return None;
            }
            Some(FocusView {
                name: format!("layer-{layer}"),
                title: format!("{} Layer", layer.title()),
                description: format!(
                    "Components classified in the {layer} layer and their direct dependencies."
                ),
                view: render_focus(analysis, &selection, &focused),
            })
        })
        .collect()
}

/// One view for each of the `focus_modules` directories holding the most eligible components.
pub fn module_views(analysis: &Analysis, config: &DiagramConfig) -> Vec<FocusView> {
    let focused = config.focused();
    let unlimited = DiagramConfig {
        max_nodes: usize::MAX,
        ..focused.clone()
    };
    let all = filter::filter_components(&analysis.components, &unlimited);
    let groups = filter::group_by_directory(&all.components, config.focus_modules, usize::MAX);

    groups
        .into_iter()
        .map(|group| {
            let candidates = group.members.len();
            let mut components = group.members;
            components.truncate(focused.max_nodes);
            let selection = Selection {
                components,
                candidates,
            };
            FocusView {
                name: format!("module-{}", slug(&group.directory)),
                title: format!("Module: {}", group.directory),
                description: format!(
                    "Components declared in `{}` and what they import.",
                    group.directory
                ),
                view: render_focus(analysis, &selection, &focused),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagrammer_core::types::{ComponentKind, Dependency, Locality};

    fn component(name: &str, path: &str, layer: ArchLayer) -> Component {
        let mut c = Component::new(name, path, ComponentKind::Class, "typescript");
        c.architectural_layer = Some(layer);
        c
    }

    fn sample() -> Analysis {
        Analysis {
            components: vec![
                component("UserPage", "src/pages/UserPage.tsx", ArchLayer::Frontend),
                component("UserService", "src/services/UserService.ts", ArchLayer::Backend),
                component("OrderService", "src/services/OrderService.ts", ArchLayer::Backend),
            ],
            dependencies: vec![Dependency {
                name: "UserService".into(),
                from: "../services/UserService".into(),
                path: "src/pages/UserPage.tsx".into(),
                is_default: false,
                locality: Locality::Local,
            }],
            ..Analysis::default()
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("src/services"), "src-services");
        assert_eq!(slug("./src/Api_v2/"), "src-api-v2");
        assert_eq!(slug("."), "root");
    }

    #[test]
    fn test_layer_views_only_for_populated_layers() {
        let views = layer_views(&sample(), &DiagramConfig::default());
        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["layer-frontend", "layer-backend"]);
        assert_eq!(views[0].title, "Frontend Layer");
    }

    #[test]
    fn test_layer_view_shows_neighbours() {
        let views = layer_views(&sample(), &DiagramConfig::default());
        let frontend = &views[0].view.mermaid;
        assert!(frontend.contains("UserPage -->|imports| UserService"));
        assert!(!frontend.contains("OrderService"));
    }

    #[test]
    fn test_module_views_ranked_by_size() {
        let config = DiagramConfig {
            focus_modules: 1,
            ..DiagramConfig::default()
        };
        let views = module_views(&sample(), &config);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "module-src-services");
        assert!(views[0].view.mermaid.contains("OrderService"));
    }

    #[test]
    fn test_focus_limits_applied() {
        let config = DiagramConfig {
            focus_max_nodes: 1,
            ..DiagramConfig::default()
        };
        let views = module_views(&sample(), &config);
        let services = views.iter().find(|v| v.name == "module-src-services").unwrap();
        assert_eq!(services.view.notes, vec!["Showing 1 of 2 components.".to_string()]);
    }

    #[test]
    fn test_empty_analysis_has_no_focus_views() {
        assert!(layer_views(&Analysis::default(), &DiagramConfig::default()).is_empty());
        assert!(module_views(&Analysis::default(), &DiagramConfig::default()).is_empty());
    }
}
