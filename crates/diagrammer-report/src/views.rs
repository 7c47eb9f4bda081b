use diagrammer_core::config::DiagramConfig;
use diagrammer_core::types::{Analysis, ArchLayer, Component};

use crate::architecture::{draw_component, link_imports, link_relationships, View};
use crate::filter;
use crate::mermaid::{EdgeStyle, RenderContext};

/// Components bucketed by a view-specific key, one subgraph per bucket.
struct Bucketed<'a, K> {
    buckets: Vec<(K, Vec<&'a Component>)>,
}

impl<'a, K: Copy + PartialEq> Bucketed<'a, K> {
    fn new(order: &[K]) -> Self {
        Self {
            buckets: order.iter().map(|k| (*k, Vec::new())).collect(),
        }
    }

    fn push(&mut self, key: K, component: &'a Component) {
        if let Some((_, members)) = self.buckets.iter_mut().find(|(k, _)| *k == key) {
            members.push(component);
        }
    }

    /// Draw non-empty buckets as subgraphs. Returns the group id of each
    /// drawn key and the components rendered.
    fn draw(
        &self,
        ctx: &mut RenderContext,
        max_per_group: usize,
        label: impl Fn(K) -> (&'static str, &'static str),
    ) -> (Vec<(K, String)>, Vec<&'a Component>) {
        let mut groups = Vec::new();
        let mut rendered = Vec::new();
        for (key, members) in &self.buckets {
            if members.is_empty() {
                continue;
            }
            let (group_key, title) = label(*key);
            let id = ctx.open_group(group_key, title);
            for component in members.iter().take(max_per_group) {
                draw_component(ctx, component);
                rendered.push(*component);
            }
            ctx.close_group();
            groups.push((*key, id));
        }
        (groups, rendered)
    }
}

fn connect<K: PartialEq>(
    ctx: &mut RenderContext,
    groups: &[(K, String)],
    topology: &[(K, K, &str, EdgeStyle)],
) {
    for (from, to, label, style) in topology {
        let from = groups.iter().find(|(k, _)| k == from);
        let to = groups.iter().find(|(k, _)| k == to);
        if let (Some((_, from)), Some((_, to))) = (from, to) {
            ctx.edge(from, to, Some(*label), *style);
        }
    }
}

fn link_data(
    ctx: &mut RenderContext,
    analysis: &Analysis,
    rendered: &[&Component],
    config: &DiagramConfig,
) {
    let dependencies =
        filter::filter_dependencies(&analysis.dependencies, rendered, config.max_edges);
    link_imports(ctx, &dependencies, rendered, config.max_edges);
    link_relationships(ctx, &analysis.relationships, rendered, config.max_edges);
}

fn layer_key(layer: ArchLayer) -> (&'static str, &'static str) {
    let key = match layer {
        ArchLayer::Frontend => "layer-frontend",
        ArchLayer::Backend => "layer-backend",
        ArchLayer::Data => "layer-data",
        ArchLayer::Infrastructure => "layer-infrastructure",
        ArchLayer::Unknown => "layer-unknown",
    };
    (key, layer.title())
}

/// Components grouped by architectural layer, stacked top to bottom.
pub fn layered_view(analysis: &Analysis, config: &DiagramConfig) -> View {
    let selection = filter::filter_components(&analysis.components, config);
    let mut bucketed = Bucketed::new(&ArchLayer::ALL);
    for component in &selection.components {
        bucketed.push(component.layer(), *component);
    }

    let mut ctx = RenderContext::new("TB");
    let (groups, rendered) = bucketed.draw(&mut ctx, config.max_per_group, layer_key);
    connect(
        &mut ctx,
        &groups,
        &[
            (ArchLayer::Frontend, ArchLayer::Backend, "requests", EdgeStyle::Solid),
            (ArchLayer::Backend, ArchLayer::Data, "persists", EdgeStyle::Solid),
            (ArchLayer::Infrastructure, ArchLayer::Backend, "supports", EdgeStyle::Dotted),
        ],
    );
    link_data(&mut ctx, analysis, &rendered, config);

    View {
        mermaid: ctx.render(),
        notes: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MvcRole {
    Model,
    View,
    Controller,
}

impl MvcRole {
    pub fn of(path: &str) -> Option<Self> {
        let path = path.to_ascii_lowercase();
        if ["model", "entity", "schema"].iter().any(|k| path.contains(k)) {
            Some(MvcRole::Model)
        } else if ["controller", "route", "handler"].iter().any(|k| path.contains(k)) {
            Some(MvcRole::Controller)
        } else if ["view", "component", "page", "template"].iter().any(|k| path.contains(k)) {
            Some(MvcRole::View)
        } else {
            None
        }
    }

    fn key(self) -> (&'static str, &'static str) {
        match self {
            MvcRole::Model => ("mvc-model", "Models"),
            MvcRole::View => ("mvc-view", "Views"),
            MvcRole::Controller => ("mvc-controller", "Controllers"),
        }
    }
}

/// Model/view/controller buckets inferred from path substrings.
pub fn mvc_view(analysis: &Analysis, config: &DiagramConfig) -> View {
    let selection = filter::filter_components(&analysis.components, config);
    let mut bucketed = Bucketed::new(&[MvcRole::Controller, MvcRole::Model, MvcRole::View]);
    for component in &selection.components {
        if let Some(role) = MvcRole::of(&component.path) {
            bucketed.push(role, *component);
        }
    }

    let mut ctx = RenderContext::new(config.direction())
        .with_placeholder("No model, view or controller components found");
    let (groups, rendered) = bucketed.draw(&mut ctx, config.max_per_group, MvcRole::key);
    connect(
        &mut ctx,
        &groups,
        &[
            (MvcRole::Controller, MvcRole::Model, "updates", EdgeStyle::Solid),
            (MvcRole::Controller, MvcRole::View, "renders", EdgeStyle::Solid),
            (MvcRole::View, MvcRole::Controller, "user input", EdgeStyle::Dotted),
        ],
    );
    link_data(&mut ctx, analysis, &rendered, config);

    View {
        mermaid: ctx.render(),
        notes: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    Gateway,
    Api,
    Service,
}

impl ServiceRole {
    pub fn of(path: &str) -> Option<Self> {
        let path = path.to_ascii_lowercase();
        if path.contains("gateway") || path.contains("proxy") {
            Some(ServiceRole::Gateway)
        } else if path.contains("api") || path.contains("route") {
            Some(ServiceRole::Api)
        } else if path.contains("service") {
            Some(ServiceRole::Service)
        } else {
            None
        }
    }

    fn key(self) -> (&'static str, &'static str) {
        match self {
            ServiceRole::Gateway => ("svc-gateway", "Gateway"),
            ServiceRole::Api => ("svc-api", "APIs"),
            ServiceRole::Service => ("svc-services", "Services"),
        }
    }
}

/// Gateway, API and service buckets inferred from path substrings.
pub fn microservices_view(analysis: &Analysis, config: &DiagramConfig) -> View {
    let selection = filter::filter_components(&analysis.components, config);
    let mut bucketed =
        Bucketed::new(&[ServiceRole::Gateway, ServiceRole::Api, ServiceRole::Service]);
    for component in &selection.components {
        if let Some(role) = ServiceRole::of(&component.path) {
            bucketed.push(role, *component);
        }
    }

    let mut ctx = RenderContext::new(config.direction())
        .with_placeholder("No gateway, API or service components found");
    let (groups, rendered) = bucketed.draw(&mut ctx, config.max_per_group, ServiceRole::key);
    connect(
        &mut ctx,
        &groups,
        &[
            (ServiceRole::Gateway, ServiceRole::Api, "routes", EdgeStyle::Solid),
            (ServiceRole::Api, ServiceRole::Service, "invokes", EdgeStyle::Solid),
            (ServiceRole::Gateway, ServiceRole::Service, "proxies", EdgeStyle::Dotted),
        ],
    );
    link_data(&mut ctx, analysis, &rendered, config);

    View {
        mermaid: ctx.render(),
        notes: Vec::new(),
    }
}
