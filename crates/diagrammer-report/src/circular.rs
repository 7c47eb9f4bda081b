use diagrammer_core::config::DiagramConfig;

use crate::architecture::View;
use crate::mermaid::{EdgeStyle, RenderContext, Shape};

/// Import edges running both ways, one `<-->` edge per unordered pair.
pub fn circular_view(pairs: &[(String, String)], config: &DiagramConfig) -> View {
    let mut ctx = RenderContext::new(config.direction())
        .with_placeholder("No circular dependencies detected");

    for (a, b) in pairs {
        let a = ctx.node(a, a, Shape::Box);
        let b = ctx.node(b, b, Shape::Box);
        ctx.edge(&a, &b, Some("circular"), EdgeStyle::Mutual);
        ctx.assign_class(&a, "cycle");
        ctx.assign_class(&b, "cycle");
    }
    if !pairs.is_empty() {
        ctx.class_def("cycle", "fill:#ffebee,stroke:#c62828,stroke-width:2px");
    }

    let notes = match pairs.len() {
        0 => Vec::new(),
        1 => vec!["1 pair of names import each other.".to_string()],
        n => vec![format!("{n} pairs of names import each other.")],
    };
    View {
        mermaid: ctx.render(),
        notes,
    }
}
