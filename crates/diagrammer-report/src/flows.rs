use diagrammer_core::config::DiagramConfig;
use diagrammer_core::types::{
    Analysis, Relationship, RelationshipCategories, RelationshipDetail, RelationshipKind,
};

use crate::architecture::{draw_component, View};
use crate::filter;
use crate::mermaid::{EdgeStyle, RenderContext, Shape};
use crate::style;

/// Relationship-focused diagram kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Api,
    Data,
    Event,
    Service,
}

impl Flow {
    pub const ALL: [Flow; 4] = [Flow::Api, Flow::Data, Flow::Event, Flow::Service];

    /// Key of the generated diagram.
    pub fn name(&self) -> &'static str {
        match self {
            Flow::Api => "api-flow",
            Flow::Data => "data-flow",
            Flow::Event => "event-flow",
            Flow::Service => "service-communication",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Flow::Api => "API Flow",
            Flow::Data => "Data Flow",
            Flow::Event => "Event Flow",
            Flow::Service => "Service Communication",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Flow::Api => "HTTP calls made by components, grouped by endpoint.",
            Flow::Data => "Data moving between components, state and persistence.",
            Flow::Event => "Events emitted and listened for by components.",
            Flow::Service => "Calls between components and the services they use.",
        }
    }

    /// Relationships shown by this flow. Data flow includes database operations.
    pub fn relationships<'a>(
        &self,
        categories: &'a RelationshipCategories,
    ) -> Vec<&'a Relationship> {
        match self {
            Flow::Api => categories.api.iter().collect(),
            Flow::Data => categories
                .data
                .iter()
                .chain(categories.database.iter())
                .collect(),
            Flow::Event => categories.events.iter().collect(),
            Flow::Service => categories.services.iter().collect(),
        }
    }
}

fn source_node(ctx: &mut RenderContext, analysis: &Analysis, rel: &Relationship) -> String {
    match analysis.components.iter().find(|c| c.name == rel.from) {
        Some(component) => draw_component(ctx, component),
        None => {
            let id = ctx.node(&rel.from, &rel.from, Shape::Box);
            style::apply(ctx, &id, &rel.from);
            id
        }
    }
}

/// Target node for a relationship; targets that are not components become placeholders.
fn target_node(ctx: &mut RenderContext, analysis: &Analysis, rel: &Relationship) -> String {
    if let RelationshipDetail::Event { event_name } = &rel.detail {
        let id = ctx.node(&format!("event:{event_name}"), event_name, Shape::Circle);
        style::apply_placeholder(ctx, &id);
        return id;
    }
    if let Some(component) = analysis.components.iter().find(|c| c.name == rel.to) {
        return draw_component(ctx, component);
    }
    let (prefix, shape) = match rel.kind {
        RelationshipKind::ApiCall => ("api", Shape::Hexagon),
        RelationshipKind::DatabaseOperation => ("db", Shape::Cylinder),
        RelationshipKind::ServiceCommunication => ("svc", Shape::Stadium),
        _ => ("data", Shape::Rounded),
    };
    let id = ctx.node(&format!("{prefix}:{}", rel.to), &rel.to, shape);
    style::apply_placeholder(ctx, &id);
    id
}

/// Render one relationship flow, or `None` when the category is empty.
pub fn flow_view(flow: Flow, analysis: &Analysis, config: &DiagramConfig) -> Option<View> {
    let relationships: Vec<&Relationship> = flow
        .relationships(&analysis.relationship_categories)
        .into_iter()
        .filter(|r| config.include_tests || !filter::is_test_path(&r.from_path))
        .collect();
    if relationships.is_empty() {
        return None;
    }

    let mut ctx = RenderContext::new("LR");
    let mut omitted = 0;
    for rel in &relationships {
        if ctx.edge_count() >= config.max_edges {
            omitted += 1;
            continue;
        }
        let from = source_node(&mut ctx, analysis, rel);
        let to = target_node(&mut ctx, analysis, rel);
        match rel.kind {
            RelationshipKind::EventEmission => {
                ctx.edge(&from, &to, Some("emits"), EdgeStyle::Solid);
            }
            RelationshipKind::EventSubscription => {
                ctx.edge(&to, &from, Some("notifies"), EdgeStyle::Dotted);
            }
            RelationshipKind::DataFlow => {
                ctx.edge(&from, &to, Some(&rel.label()), EdgeStyle::Dotted);
            }
            _ => {
                ctx.edge(&from, &to, Some(&rel.label()), EdgeStyle::Solid);
            }
        }
    }

    let mut notes = Vec::new();
    if omitted > 0 {
        notes.push(format!(
            "{omitted} relationships were left out to stay within {} edges.",
            config.max_edges
        ));
    }
    Some(View {
        mermaid: ctx.render(),
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagrammer_core::types::{Component, ComponentKind};

    fn rel(
        from: &str,
        to: &str,
        kind: RelationshipKind,
        detail: RelationshipDetail,
    ) -> Relationship {
        Relationship {
            from: from.to_string(),
            from_path: format!("src/{from}.ts"),
            to: to.to_string(),
            kind,
            confidence: 70,
            description: String::new(),
            detail,
        }
    }

    fn analysis_with(categories: RelationshipCategories) -> Analysis {
        Analysis {
            components: vec![Component::new(
                "UserService",
                "src/UserService.ts",
                ComponentKind::Class,
                "typescript",
            )],
            relationship_categories: categories,
            ..Analysis::default()
        }
    }

    #[test]
    fn test_empty_category_yields_none() {
        let analysis = analysis_with(RelationshipCategories::default());
        for flow in Flow::ALL {
            assert!(flow_view(flow, &analysis, &DiagramConfig::default()).is_none());
        }
    }

    #[test]
    fn test_api_flow_targets_placeholder_nodes() {
        let api = rel(
            "UserService",
            "users",
            RelationshipKind::ApiCall,
            RelationshipDetail::Api {
                endpoint: Some("/users".into()),
                method: "GET".into(),
            },
        );
        let analysis = analysis_with(RelationshipCategories {
            api: vec![api.clone(), api],
            ..RelationshipCategories::default()
        });
        let view = flow_view(Flow::Api, &analysis, &DiagramConfig::default()).unwrap();
        assert!(view.mermaid.contains("api_users{{\"users\"}}"));
        assert!(view
            .mermaid
            .contains("UserService -->|\"GET /users (2x)\"| api_users"));
        assert!(view.mermaid.contains("class api_users placeholder"));
    }

    #[test]
    fn test_event_flow_directions() {
        let analysis = analysis_with(RelationshipCategories {
            events: vec![
                rel(
                    "UserService",
                    "event-system",
                    RelationshipKind::EventEmission,
                    RelationshipDetail::Event {
                        event_name: "user-created".into(),
                    },
                ),
                rel(
                    "Mailer",
                    "event-system",
                    RelationshipKind::EventSubscription,
                    RelationshipDetail::Event {
                        event_name: "user-created".into(),
                    },
                ),
            ],
            ..RelationshipCategories::default()
        });
        let view = flow_view(Flow::Event, &analysis, &DiagramConfig::default()).unwrap();
        assert!(view.mermaid.contains("UserService -->|emits| event_user_created"));
        assert!(view.mermaid.contains("event_user_created -.->|notifies| Mailer"));
    }

    #[test]
    fn test_data_flow_includes_database() {
        let analysis = analysis_with(RelationshipCategories {
            database: vec![rel(
                "UserService",
                "users-table",
                RelationshipKind::DatabaseOperation,
                RelationshipDetail::Database {
                    operation: "SELECT".into(),
                    table: Some("users".into()),
                },
            )],
            ..RelationshipCategories::default()
        });
        let view = flow_view(Flow::Data, &analysis, &DiagramConfig::default()).unwrap();
        assert!(view.mermaid.contains("db_users_table[(\"users-table\")]"));
        assert!(view.mermaid.contains("UserService -->|SELECT| db_users_table"));
    }

    #[test]
    fn test_edge_limit_noted() {
        let events = (0..3)
            .map(|i| {
                rel(
                    "UserService",
                    "event-system",
                    RelationshipKind::EventEmission,
                    RelationshipDetail::Event {
                        event_name: format!("e{i}"),
                    },
                )
            })
            .collect();
        let analysis = analysis_with(RelationshipCategories {
            events,
            ..RelationshipCategories::default()
        });
        let config = DiagramConfig {
            max_edges: 2,
            ..DiagramConfig::default()
        };
        let view = flow_view(Flow::Event, &analysis, &config).unwrap();
        assert_eq!(view.notes.len(), 1);
        assert!(view.notes[0].starts_with("1 relationships"));
    }
}
