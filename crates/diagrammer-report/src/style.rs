use std::fmt;

use crate::mermaid::RenderContext;

/// Semantic role inferred from a component name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Analyzer,
    Generator,
    Manager,
    Service,
    Component,
}

impl NodeRole {
    /// First matching role wins; controllers, handlers, models and entities render as services.
    pub fn of(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("analyzer") {
            NodeRole::Analyzer
        } else if name.contains("generator") {
            NodeRole::Generator
        } else if name.contains("manager") {
            NodeRole::Manager
        } else if ["service", "controller", "handler", "model", "entity"]
            .iter()
            .any(|k| name.contains(k))
        {
            NodeRole::Service
        } else {
            NodeRole::Component
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Analyzer => "analyzer",
            NodeRole::Generator => "generator",
            NodeRole::Manager => "manager",
            NodeRole::Service => "service",
            NodeRole::Component => "component",
        }
    }

    fn palette(&self) -> (&'static str, &'static str) {
        match self {
            NodeRole::Analyzer => ("#e8f5e9", "#2e7d32"),
            NodeRole::Generator => ("#f3e5f5", "#6a1b9a"),
            NodeRole::Manager => ("#fff8e1", "#f57f17"),
            NodeRole::Service => ("#e3f2fd", "#1565c0"),
            NodeRole::Component => ("#eceff1", "#455a64"),
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSize {
    Large,
    Medium,
    Small,
}

impl NodeSize {
    /// Bucket a component by its estimated line count.
    pub fn of(name: &str) -> Self {
        match estimated_lines(name) {
            n if n > 250 => NodeSize::Large,
            n if n > 120 => NodeSize::Medium,
            _ => NodeSize::Small,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            NodeSize::Large => "Large",
            NodeSize::Medium => "Medium",
            NodeSize::Small => "Small",
        }
    }

    fn stroke_width(&self) -> &'static str {
        match self {
            NodeSize::Large => "3px",
            NodeSize::Medium => "2px",
            NodeSize::Small => "1px",
        }
    }
}

/// Rough size estimate: name length times ten, plus a bonus for analyzers and generators.
pub fn estimated_lines(name: &str) -> usize {
    let base = name.len() * 10;
    match NodeRole::of(name) {
        NodeRole::Analyzer | NodeRole::Generator => base + 200,
        _ => base,
    }
}

/// Mermaid class name combining role and size, e.g. `serviceMedium`.
pub fn class_name(role: NodeRole, size: NodeSize) -> String {
    format!("{role}{}", size.suffix())
}

/// Assign the combined role/size class to a component node, defining it on first use.
pub fn apply(ctx: &mut RenderContext, id: &str, name: &str) {
    let role = NodeRole::of(name);
    let size = NodeSize::of(name);
    let (fill, stroke) = role.palette();
    let class = class_name(role, size);
    ctx.class_def(
        &class,
        &format!("fill:{fill},stroke:{stroke},stroke-width:{}", size.stroke_width()),
    );
    ctx.assign_class(id, &class);
}

pub fn apply_external(ctx: &mut RenderContext, id: &str) {
    ctx.class_def(
        "external",
        "fill:#fff3e0,stroke:#e65100,stroke-width:1px,stroke-dasharray:3 3",
    );
    ctx.assign_class(id, "external");
}

/// Style for nodes standing in for targets that are not scanned components.
pub fn apply_placeholder(ctx: &mut RenderContext, id: &str) {
    ctx.class_def(
        "placeholder",
        "fill:#fafafa,stroke:#9e9e9e,stroke-width:1px,stroke-dasharray:5 5",
    );
    ctx.assign_class(id, "placeholder");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mermaid::Shape;

    #[test]
    fn test_role_precedence() {
        assert_eq!(NodeRole::of("CodeAnalyzer"), NodeRole::Analyzer);
        assert_eq!(NodeRole::of("AnalyzerGenerator"), NodeRole::Analyzer);
        assert_eq!(NodeRole::of("DiagramGenerator"), NodeRole::Generator);
        assert_eq!(NodeRole::of("GitManager"), NodeRole::Manager);
        assert_eq!(NodeRole::of("ServiceManager"), NodeRole::Manager);
        assert_eq!(NodeRole::of("UserService"), NodeRole::Service);
        assert_eq!(NodeRole::of("UserController"), NodeRole::Service);
        assert_eq!(NodeRole::of("OrderEntity"), NodeRole::Service);
        assert_eq!(NodeRole::of("App"), NodeRole::Component);
    }

    #[test]
    fn test_size_buckets() {
        assert_eq!(estimated_lines("App"), 30);
        assert_eq!(NodeSize::of("App"), NodeSize::Small);
        assert_eq!(NodeSize::of("UserService"), NodeSize::Small);
        assert_eq!(NodeSize::of("UserRepository"), NodeSize::Medium);
        assert_eq!(estimated_lines("CodeAnalyzer"), 320);
        assert_eq!(NodeSize::of("CodeAnalyzer"), NodeSize::Large);
    }

    #[test]
    fn test_apply_defines_only_used_classes() {
        let mut ctx = RenderContext::new("TD");
        let id = ctx.node("UserService", "UserService", Shape::Box);
        apply(&mut ctx, &id, "UserService");
        let out = ctx.render();
        assert!(out.contains("classDef serviceSmall"));
        assert!(out.contains("class UserService serviceSmall"));
        assert!(!out.contains("classDef analyzer"));
    }
}
