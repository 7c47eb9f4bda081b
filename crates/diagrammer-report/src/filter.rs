use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use diagrammer_core::config::DiagramConfig;
use diagrammer_core::types::{Component, Dependency};

const TEST_MARKERS: &[&str] = &["/test/", "/tests/", "__tests__", ".test.", ".spec.", "/spec/"];

const VENDOR_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "third_party",
    "bower_components",
    "site-packages",
    "venv",
    ".venv",
];

const UTILITY_DIRS: &[&str] = &[
    "utils",
    "helpers",
    "constants",
    "config",
    "types",
    "interfaces",
    "enums",
    "validators",
    "formatters",
];

const ENTRY_POINTS: &[&str] = &["index", "main", "app"];

fn normalized(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

/// Directory segments of a path, lowercased, without the file name.
fn dir_segments(path: &str) -> Vec<String> {
    let path = normalized(path);
    let mut segments: Vec<String> = path.split('/').map(str::to_string).collect();
    segments.pop();
    segments
}

fn file_stem(path: &str) -> String {
    let path = normalized(path);
    let file = path.rsplit('/').next().unwrap_or_default();
    match file.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

/// Directory containing `path`, or `.` for top-level files.
pub fn directory_of(path: &str) -> String {
    match path.replace('\\', "/").rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ".".to_string(),
    }
}

pub fn is_test_path(path: &str) -> bool {
    let path = format!("/{}", normalized(path));
    if TEST_MARKERS.iter().any(|m| path.contains(m)) {
        return true;
    }
    let stem = file_stem(&path);
    stem.starts_with("test_") || stem.ends_with("_test")
}

pub fn is_vendor_path(path: &str) -> bool {
    dir_segments(path)
        .iter()
        .any(|s| VENDOR_DIRS.contains(&s.as_str()))
}

pub fn is_utility_path(path: &str) -> bool {
    dir_segments(path)
        .iter()
        .any(|s| UTILITY_DIRS.contains(&s.as_str()))
}

pub fn is_entry_point(component: &Component) -> bool {
    let name = component.name.to_ascii_lowercase();
    ENTRY_POINTS.contains(&name.as_str()) || ENTRY_POINTS.contains(&file_stem(&component.path).as_str())
}

/// Names that look like implementation details rather than architecture.
///
/// Dunder names, leading underscores, single lowercase words and single
/// capitalised words all count; entry-point names never do.
pub fn is_likely_internal(name: &str) -> bool {
    if ENTRY_POINTS.contains(&name.to_ascii_lowercase().as_str()) {
        return false;
    }
    if name.starts_with('_') {
        return true;
    }
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    let rest: Vec<char> = chars.collect();
    if first.is_ascii_lowercase() && rest.iter().all(|c| c.is_ascii_lowercase()) {
        return true;
    }
    first.is_ascii_uppercase() && !rest.is_empty() && rest.iter().all(|c| c.is_ascii_lowercase())
}

/// Heuristic rank used to order and truncate diagram nodes. Higher is more important.
pub fn importance(component: &Component) -> i64 {
    let path = normalized(&component.path);
    let mut segments = dir_segments(&component.path);
    segments.push(file_stem(&component.path));
    let has = |keywords: &[&str]| {
        segments.iter().any(|segment| {
            keywords
                .iter()
                .any(|k| segment.starts_with(k) || segment.ends_with(k))
        })
    };

    let mut score = 0;
    if is_entry_point(component) {
        score += 100;
    }
    if has(&["service", "api"]) {
        score += 50;
    }
    if has(&["controller", "handler"]) {
        score += 40;
    }
    if has(&["model", "entity"]) {
        score += 30;
    }
    if has(&["core", "business"]) {
        score += 20;
    }
    let depth = path.matches('/').count() as i64;
    score - 5 * depth
}

fn is_eligible(component: &Component, config: &DiagramConfig) -> bool {
    (config.include_tests || !is_test_path(&component.path))
        && !is_vendor_path(&component.path)
        && !is_likely_internal(&component.name)
        && !is_utility_path(&component.path)
}

/// Components chosen for a diagram, most important first.
#[derive(Debug)]
pub struct Selection<'a> {
    pub components: Vec<&'a Component>,
    /// Eligible components before the node limit was applied.
    pub candidates: usize,
}

impl Selection<'_> {
    pub fn truncated(&self) -> bool {
        self.candidates > self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Filter, rank and truncate components to `config.max_nodes`.
///
/// Components sharing a name collapse to the most important one, since they
/// would render as the same node.
pub fn filter_components<'a, I>(components: I, config: &DiagramConfig) -> Selection<'a>
where
    I: IntoIterator<Item = &'a Component>,
{
    let mut ranked: Vec<&'a Component> = components
        .into_iter()
        .filter(|c| is_eligible(c, config))
        .collect();
    ranked.sort_by_key(|c| Reverse(importance(c)));

    let mut names: HashSet<&'a str> = HashSet::new();
    ranked.retain(|c| {
        let c: &'a Component = *c;
        names.insert(c.name.as_str())
    });

    let candidates = ranked.len();
    ranked.truncate(config.max_nodes);
    Selection {
        components: ranked,
        candidates,
    }
}

/// Dependencies with at least one endpoint among `kept`, truncated to `max_edges`.
pub fn filter_dependencies<'a>(
    dependencies: &'a [Dependency],
    kept: &[&Component],
    max_edges: usize,
) -> Vec<&'a Dependency> {
    let paths: HashSet<&str> = kept.iter().map(|c| c.path.as_str()).collect();
    let names: HashSet<&str> = kept.iter().map(|c| c.name.as_str()).collect();
    dependencies
        .iter()
        .filter(|d| !d.name.is_empty() && !d.from.is_empty())
        .filter(|d| paths.contains(d.path.as_str()) || names.contains(d.name.as_str()))
        .take(max_edges)
        .collect()
}

#[derive(Debug)]
pub struct ComponentGroup<'a> {
    pub directory: String,
    pub members: Vec<&'a Component>,
}

/// Group by directory, keep the `max_groups` largest groups and the
/// `max_per_group` most important members of each.
pub fn group_by_directory<'a>(
    components: &[&'a Component],
    max_groups: usize,
    max_per_group: usize,
) -> Vec<ComponentGroup<'a>> {
    let mut by_dir: BTreeMap<String, Vec<&'a Component>> = BTreeMap::new();
    for component in components {
        by_dir
            .entry(directory_of(&component.path))
            .or_default()
            .push(*component);
    }

    let mut groups: Vec<ComponentGroup<'a>> = by_dir
        .into_iter()
        .map(|(directory, members)| ComponentGroup { directory, members })
        .collect();
    groups.sort_by_key(|g| Reverse(g.members.len()));
    groups.truncate(max_groups);

    for group in &mut groups {
        group.members.sort_by_key(|c| Reverse(importance(c)));
        group.members.truncate(max_per_group);
    }
    groups
}
