use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::types::Dependency;

/// Node in the module graph: a project file or an external package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    pub id: String,
    pub external: bool,
}

/// Edge in the module graph with the number of imports it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEdge {
    pub from: String,
    pub to: String,
    pub imports: usize,
}

/// Directed module-level import graph.
pub struct DependencyGraph {
    graph: DiGraph<ModuleNode, usize>,
    index: HashMap<String, NodeIndex>,
}

/// File path without its extension, with `index`/`__init__` collapsed to the directory.
pub fn module_id(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let (dir, file) = match normalized.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, normalized.as_str()),
    };
    let stem = match file.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    match (dir, stem) {
        (Some(dir), "index" | "__init__") => dir.to_string(),
        (Some(dir), stem) => format!("{dir}/{stem}"),
        (None, stem) => stem.to_string(),
    }
}

fn normalize(segments: impl IntoIterator<Item = String>) -> String {
    let mut out: Vec<String> = Vec::new();
    for segment in segments {
        match segment.as_str() {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            _ => out.push(segment),
        }
    }
    out.join("/")
}

/// Resolve an import source against the importing file.
///
/// `./x` and `../x` are joined to the importer's directory; Python `.x`/`..x`
/// climb one package per extra dot; other local names are dotted paths from
/// the root. External sources are returned unchanged.
pub fn resolve_import(importer: &str, dep: &Dependency) -> String {
    let source = dep.from.trim();
    if dep.is_external() {
        return source.to_string();
    }
    let importer = importer.replace('\\', "/");
    let dir: Vec<String> = match importer.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').map(str::to_string).collect(),
        None => Vec::new(),
    };

    if source.starts_with("./") || source.starts_with("../") || source == "." || source == ".." {
        let joined = dir
            .into_iter()
            .chain(source.split('/').map(str::to_string));
        return module_id(&normalize(joined));
    }

    if let Some(rest) = source.strip_prefix('.') {
        let extra_dots = rest.chars().take_while(|c| *c == '.').count();
        let rest = &rest[extra_dots..];
        let mut base = dir;
        for _ in 0..extra_dots {
            base.pop();
        }
        let joined = base
            .into_iter()
            .chain(rest.split('.').map(str::to_string));
        return normalize(joined);
    }

    source.replace('.', "/")
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build the graph from raw, unfiltered dependencies.
    pub fn from_dependencies(dependencies: &[Dependency]) -> Self {
        let mut graph = Self::new();
        for dep in dependencies {
            graph.add_dependency(dep);
        }
        graph
    }

    /// Build the graph over raw `from -> name` import edges, as the dependency
    /// diagram draws them. Records with an empty source or name are skipped.
    pub fn from_import_names(dependencies: &[Dependency]) -> Self {
        let mut graph = Self::new();
        for dep in dependencies {
            let (from, name) = (dep.from.trim(), dep.name.trim());
            if from.is_empty() || name.is_empty() {
                continue;
            }
            graph.add_edge(from, name, dep.is_external());
        }
        graph
    }

    pub fn ensure_node(&mut self, id: &str, external: bool) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(ModuleNode {
            id: id.to_string(),
            external,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add the import edge `dep` implies. Incomplete records and self-imports are ignored.
    pub fn add_dependency(&mut self, dep: &Dependency) {
        if dep.path.trim().is_empty() || dep.from.trim().is_empty() {
            return;
        }
        let from = module_id(&dep.path);
        let to = resolve_import(&dep.path, dep);
        if to.is_empty() {
            return;
        }
        self.add_edge(&from, &to, dep.is_external());
    }

    /// Add or reinforce `from -> to`. Self-edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str, external: bool) {
        if from == to {
            return;
        }
        let from_idx = self.ensure_node(from, false);
        let to_idx = self.ensure_node(to, external);
        match self.graph.find_edge(from_idx, to_idx) {
            Some(edge) => self.graph[edge] += 1,
            None => {
                self.graph.add_edge(from_idx, to_idx, 1);
            }
        }
    }

    /// Unordered node pairs with edges both ways, each pair once, sorted.
    pub fn circular_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = BTreeSet::new();
        for edge in self.graph.edge_references() {
            let (a, b) = (edge.source(), edge.target());
            if a != b && self.graph.find_edge(b, a).is_some() {
                let (x, y) = (&self.graph[a].id, &self.graph[b].id);
                if x <= y {
                    pairs.insert((x.clone(), y.clone()));
                } else {
                    pairs.insert((y.clone(), x.clone()));
                }
            }
        }
        pairs.into_iter().collect()
    }

    pub fn edges(&self) -> Vec<ModuleEdge> {
        self.graph
            .edge_references()
            .map(|e| ModuleEdge {
                from: self.graph[e.source()].id.clone(),
                to: self.graph[e.target()].id.clone(),
                imports: *e.weight(),
            })
            .collect()
    }

    pub fn nodes(&self) -> Vec<&ModuleNode> {
        self.graph.node_weights().collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
