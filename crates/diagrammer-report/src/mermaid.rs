use std::collections::{HashMap, HashSet};

/// Words Mermaid treats as keywords when used as bare node ids.
const RESERVED_IDS: &[&str] = &[
    "end",
    "graph",
    "flowchart",
    "subgraph",
    "class",
    "classdef",
    "click",
    "style",
    "linkstyle",
    "direction",
    "default",
];

/// Sanitize a string for use as a Mermaid node ID.
pub fn sanitize_id(name: &str) -> String {
    let id: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if id.is_empty() {
        return "n_".to_string();
    }
    let reserved = RESERVED_IDS.contains(&id.to_ascii_lowercase().as_str());
    if reserved || id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n_{id}")
    } else {
        id
    }
}

/// Escape text placed inside a quoted node or edge label.
pub fn escape_label(label: &str) -> String {
    label
        .replace('"', "#quot;")
        .replace('<', "#lt;")
        .replace('>', "#gt;")
        .replace('|', "/")
        .replace(['\n', '\r'], " ")
}

fn edge_text(label: &str) -> String {
    let plain = label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'));
    if plain {
        label.to_string()
    } else {
        format!("\"{}\"", escape_label(label))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyle {
    Solid,
    Dotted,
    Mutual,
}

impl EdgeStyle {
    fn arrow(self) -> &'static str {
        match self {
            EdgeStyle::Solid => "-->",
            EdgeStyle::Dotted => "-.->",
            EdgeStyle::Mutual => "<-->",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Box,
    Rounded,
    Stadium,
    Cylinder,
    Hexagon,
    Circle,
}

impl Shape {
    fn wrap(self, label: &str) -> String {
        match self {
            Shape::Box => format!("[\"{label}\"]"),
            Shape::Rounded => format!("(\"{label}\")"),
            Shape::Stadium => format!("([\"{label}\"])"),
            Shape::Cylinder => format!("[(\"{label}\")]"),
            Shape::Hexagon => format!("{{{{\"{label}\"}}}}"),
            Shape::Circle => format!("((\"{label}\"))"),
        }
    }
}

#[derive(Debug)]
struct Edge {
    from: String,
    to: String,
    label: Option<String>,
    style: EdgeStyle,
    count: usize,
}

impl Edge {
    fn render(&self) -> String {
        let label = match (&self.label, self.count) {
            (Some(label), 1) => Some(label.clone()),
            (Some(label), n) => Some(format!("{label} ({n}x)")),
            (None, 1) => None,
            (None, n) => Some(format!("{n}x")),
        };
        match label {
            Some(label) => format!(
                "  {} {}|{}| {}",
                self.from,
                self.style.arrow(),
                edge_text(&label),
                self.to
            ),
            None => format!("  {} {} {}", self.from, self.style.arrow(), self.to),
        }
    }
}

/// State for building a single Mermaid graph.
///
/// One context is created per diagram and consumed by [`RenderContext::render`].
/// Node declarations are idempotent; edges between the same ordered pair are
/// merged into one edge carrying a duplicate count, and self-loops are dropped.
#[derive(Debug)]
pub struct RenderContext {
    direction: String,
    body: Vec<String>,
    depth: usize,
    declared: HashSet<String>,
    edges: Vec<Edge>,
    edge_index: HashMap<(String, String), usize>,
    class_defs: Vec<(String, String)>,
    classes: Vec<(String, Vec<String>)>,
    footer: Vec<String>,
    placeholder: String,
}

impl RenderContext {
    pub fn new(direction: &str) -> Self {
        Self {
            direction: direction.to_string(),
            body: Vec::new(),
            depth: 0,
            declared: HashSet::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
            class_defs: Vec::new(),
            classes: Vec::new(),
            footer: Vec::new(),
            placeholder: "No components to display".to_string(),
        }
    }

    /// Text of the node rendered when the graph would otherwise be empty.
    pub fn with_placeholder(mut self, text: &str) -> Self {
        self.placeholder = text.to_string();
        self
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth + 1)
    }

    /// Declare a node keyed by `key` and return its id.
    pub fn node(&mut self, key: &str, label: &str, shape: Shape) -> String {
        let id = sanitize_id(key);
        if self.declared.insert(id.clone()) {
            let line = format!("{}{id}{}", self.indent(), shape.wrap(&escape_label(label)));
            self.body.push(line);
        }
        id
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.declared.contains(&sanitize_id(key))
    }

    /// Open a subgraph and return its id. Must be paired with [`close_group`](Self::close_group).
    pub fn open_group(&mut self, key: &str, label: &str) -> String {
        let id = sanitize_id(&format!("group_{key}"));
        let line = format!("{}subgraph {id}[\"{}\"]", self.indent(), escape_label(label));
        self.body.push(line);
        self.depth += 1;
        id
    }

    pub fn close_group(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        let line = format!("{}end", self.indent());
        self.body.push(line);
    }

    /// Add an edge between two ids. Returns `true` when a new edge was created.
    pub fn edge(&mut self, from: &str, to: &str, label: Option<&str>, style: EdgeStyle) -> bool {
        if from.is_empty() || to.is_empty() || from == to {
            return false;
        }
        let key = (from.to_string(), to.to_string());
        if let Some(&i) = self.edge_index.get(&key) {
            self.edges[i].count += 1;
            return false;
        }
        self.edge_index.insert(key, self.edges.len());
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            label: label.filter(|l| !l.is_empty()).map(str::to_string),
            style,
            count: 1,
        });
        true
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_count(&self) -> usize {
        self.declared.len()
    }

    /// Register a `classDef`; repeated names keep the first style.
    pub fn class_def(&mut self, name: &str, style: &str) {
        if !self.class_defs.iter().any(|(n, _)| n == name) {
            self.class_defs.push((name.to_string(), style.to_string()));
        }
    }

    pub fn assign_class(&mut self, id: &str, class: &str) {
        match self.classes.iter_mut().find(|(c, _)| c == class) {
            Some((_, ids)) => {
                if !ids.iter().any(|i| i == id) {
                    ids.push(id.to_string());
                }
            }
            None => self.classes.push((class.to_string(), vec![id.to_string()])),
        }
    }

    /// Append a raw line after the edges, e.g. a `click` directive.
    pub fn line(&mut self, line: String) {
        self.footer.push(line);
    }

    pub fn render(self) -> String {
        let mut out = String::new();
        out.push_str(&format!("graph {}\n", self.direction));

        if self.declared.is_empty() {
            out.push_str(&format!("  empty[\"{}\"]\n", escape_label(&self.placeholder)));
            return out;
        }

        for line in &self.body {
            out.push_str(line);
            out.push('\n');
        }
        for edge in &self.edges {
            out.push_str(&edge.render());
            out.push('\n');
        }
        if !self.class_defs.is_empty() {
            out.push('\n');
        }
        for (name, style) in &self.class_defs {
            out.push_str(&format!("  classDef {name} {style}\n"));
        }
        for (class, ids) in &self.classes {
            out.push_str(&format!("  class {} {class}\n", ids.join(",")));
        }
        for line in &self.footer {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
