use std::cmp::Reverse;
use std::collections::BTreeMap;

use diagrammer_core::config::DiagramConfig;
use diagrammer_core::types::{Analysis, Component, Dependency, Relationship, RelationshipKind};

use crate::filter::{self, importance, ComponentGroup};
use crate::mermaid::{escape_label, sanitize_id, EdgeStyle, RenderContext, Shape};
use crate::style::{self, NodeRole};

const FRAMEWORK_PACKAGES: &[&str] = &[
    "react",
    "react-dom",
    "vue",
    "@angular",
    "svelte",
    "next",
    "nuxt",
    "express",
    "koa",
    "fastify",
    "@nestjs",
    "django",
    "flask",
    "fastapi",
    "mongoose",
    "sequelize",
    "typeorm",
    "prisma",
    "sqlalchemy",
];

/// Coarse bucket used to cap external dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExternalGroup {
    Framework,
    NpmScoped,
    Generic,
}

impl ExternalGroup {
    pub fn of(source: &str) -> Self {
        let root = source.split(['/', '.']).next().unwrap_or_default();
        if FRAMEWORK_PACKAGES.contains(&root) {
            ExternalGroup::Framework
        } else if source.starts_with('@') {
            ExternalGroup::NpmScoped
        } else {
            ExternalGroup::Generic
        }
    }

    fn key(&self) -> &'static str {
        match self {
            ExternalGroup::Framework => "external-frameworks",
            ExternalGroup::NpmScoped => "external-scoped",
            ExternalGroup::Generic => "external-libraries",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ExternalGroup::Framework => "Frameworks",
            ExternalGroup::NpmScoped => "Scoped packages",
            ExternalGroup::Generic => "External libraries",
        }
    }
}

fn external_key(package: &str) -> String {
    format!("ext:{package}")
}

pub(crate) fn draw_component(ctx: &mut RenderContext, component: &Component) -> String {
    let id = ctx.node(&component.name, &component.name, Shape::Box);
    style::apply(ctx, &id, &component.name);
    id
}

/// Render each group as a subgraph and return the components drawn, in order.
pub(crate) fn draw_groups<'a>(
    ctx: &mut RenderContext,
    groups: &[ComponentGroup<'a>],
) -> Vec<&'a Component> {
    let mut rendered = Vec::new();
    for group in groups {
        ctx.open_group(&group.directory, &group.directory);
        for component in &group.members {
            draw_component(ctx, component);
            rendered.push(*component);
        }
        ctx.close_group();
    }
    rendered
}

pub(crate) fn named<'a>(rendered: &[&'a Component], name: &str) -> Option<&'a Component> {
    rendered.iter().find(|c| c.name == name).copied()
}

/// The most important rendered component declared in `path`.
pub(crate) fn anchor<'a>(rendered: &[&'a Component], path: &str) -> Option<&'a Component> {
    rendered
        .iter()
        .filter(|c| c.path == path)
        .min_by_key(|c| Reverse(importance(c)))
        .copied()
}

/// `imports` edges from the importing file's anchor to the imported component.
pub(crate) fn link_imports(
    ctx: &mut RenderContext,
    dependencies: &[&Dependency],
    rendered: &[&Component],
    max_edges: usize,
) {
    for dep in dependencies.iter().filter(|d| d.is_local()) {
        if ctx.edge_count() >= max_edges {
            break;
        }
        let (Some(from), Some(to)) = (anchor(rendered, &dep.path), named(rendered, &dep.name))
        else {
            continue;
        };
        ctx.edge(
            &sanitize_id(&from.name),
            &sanitize_id(&to.name),
            Some("imports"),
            EdgeStyle::Solid,
        );
    }
}

/// Relationship edges whose endpoints both match a rendered component by name or path.
pub(crate) fn link_relationships(
    ctx: &mut RenderContext,
    relationships: &[Relationship],
    rendered: &[&Component],
    max_edges: usize,
) {
    for rel in relationships {
        if ctx.edge_count() >= max_edges {
            break;
        }
        let from = named(rendered, &rel.from).or_else(|| anchor(rendered, &rel.from_path));
        let to = named(rendered, &rel.to).or_else(|| anchor(rendered, &rel.to));
        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };
        let style = match rel.kind {
            RelationshipKind::EventEmission
            | RelationshipKind::EventSubscription
            | RelationshipKind::DataFlow => EdgeStyle::Dotted,
            _ => EdgeStyle::Solid,
        };
        ctx.edge(
            &sanitize_id(&from.name),
            &sanitize_id(&to.name),
            Some(rel.kind.as_str()),
            style,
        );
    }
}

/// External packages grouped by [`ExternalGroup`], at most
/// `max_external_per_group` packages per group.
pub(crate) fn link_externals(
    ctx: &mut RenderContext,
    dependencies: &[&Dependency],
    rendered: &[&Component],
    config: &DiagramConfig,
) {
    let mut buckets: BTreeMap<ExternalGroup, Vec<(String, Vec<String>)>> = BTreeMap::new();
    for dep in dependencies.iter().filter(|d| d.is_external()) {
        let Some(source) = anchor(rendered, &dep.path) else {
            continue;
        };
        let packages = buckets.entry(ExternalGroup::of(&dep.from)).or_default();
        match packages.iter().position(|(p, _)| *p == dep.from) {
            Some(idx) => {
                let sources = &mut packages[idx].1;
                if !sources.contains(&source.name) {
                    sources.push(source.name.clone());
                }
            }
            None if packages.len() < config.max_external_per_group => {
                packages.push((dep.from.clone(), vec![source.name.clone()]));
            }
            None => {}
        }
    }

    for (group, packages) in &buckets {
        if packages.is_empty() {
            continue;
        }
        ctx.open_group(group.key(), group.label());
        for (package, _) in packages {
            let id = ctx.node(&external_key(package), package, Shape::Stadium);
            style::apply_external(ctx, &id);
        }
        ctx.close_group();
    }

    for (package, sources) in buckets.values().flatten() {
        let to = sanitize_id(&external_key(package));
        for source in sources {
            if ctx.edge_count() >= config.max_edges {
                return;
            }
            ctx.edge(&sanitize_id(source), &to, Some("uses"), EdgeStyle::Dotted);
        }
    }
}

/// Naming-convention edges for sparse graphs: analyzers feed a generator,
/// managers and services support the entry point.
pub(crate) fn link_conventions(
    ctx: &mut RenderContext,
    rendered: &[&Component],
    max_edges: usize,
) {
    if ctx.edge_count() >= rendered.len() / 2 {
        return;
    }
    let generator = rendered
        .iter()
        .find(|c| NodeRole::of(&c.name) == NodeRole::Generator);
    let entry = rendered.iter().find(|c| filter::is_entry_point(c));

    for component in rendered {
        if ctx.edge_count() >= max_edges {
            break;
        }
        let name = component.name.to_ascii_lowercase();
        let target = if NodeRole::of(&component.name) == NodeRole::Analyzer {
            generator.map(|g| (g, "feeds"))
        } else if name.contains("manager") || name.contains("service") {
            entry.map(|e| (e, "supports"))
        } else {
            None
        };
        if let Some((target, label)) = target {
            ctx.edge(
                &sanitize_id(&component.name),
                &sanitize_id(&target.name),
                Some(label),
                EdgeStyle::Dotted,
            );
        }
    }
}

/// Mermaid source plus notes about what was left out.
#[derive(Debug)]
pub struct View {
    pub mermaid: String,
    pub notes: Vec<String>,
}

/// The main architecture overview.
///
/// With `interactive` set, every component node gets a `click` directive
/// pointing at its source file.
pub fn architecture_view(analysis: &Analysis, config: &DiagramConfig, interactive: bool) -> View {
    let selection = filter::filter_components(&analysis.components, config);
    let groups =
        filter::group_by_directory(&selection.components, config.max_groups, config.max_per_group);

    let mut ctx = RenderContext::new(config.direction());
    let rendered = draw_groups(&mut ctx, &groups);

    let dependencies =
        filter::filter_dependencies(&analysis.dependencies, &rendered, config.max_edges);
    link_imports(&mut ctx, &dependencies, &rendered, config.max_edges);
    link_relationships(&mut ctx, &analysis.relationships, &rendered, config.max_edges);
    link_externals(&mut ctx, &dependencies, &rendered, config);
    link_conventions(&mut ctx, &rendered, config.max_edges);

    if interactive {
        for component in &rendered {
            let tooltip = format!("{} ({})", component.name, component.path);
            ctx.line(format!(
                "  click {} \"{}\" \"{}\"",
                sanitize_id(&component.name),
                escape_label(&component.path),
                escape_label(&tooltip),
            ));
        }
    }

    let mut notes = Vec::new();
    if selection.truncated() {
        notes.push(format!(
            "Showing the {} most important of {} eligible components.",
            selection.components.len(),
            selection.candidates
        ));
    }
    if rendered.len() < selection.components.len() {
        notes.push(format!(
            "Directory grouping limited the view to {} components in {} directories.",
            rendered.len(),
            groups.len()
        ));
    }

    View {
        mermaid: ctx.render(),
        notes,
    }
}
