use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Declaration category of a scanned component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Class,
    Interface,
    Function,
    Variable,
    ArrowFunction,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Class => "class",
            ComponentKind::Interface => "interface",
            ComponentKind::Function => "function",
            ComponentKind::Variable => "variable",
            ComponentKind::ArrowFunction => "arrow-function",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse architectural layer assigned to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchLayer {
    Frontend,
    Backend,
    Data,
    Infrastructure,
    Unknown,
}

impl ArchLayer {
    /// All layers in rendering order, outermost first.
    pub const ALL: [ArchLayer; 5] = [
        ArchLayer::Frontend,
        ArchLayer::Backend,
        ArchLayer::Data,
        ArchLayer::Infrastructure,
        ArchLayer::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchLayer::Frontend => "frontend",
            ArchLayer::Backend => "backend",
            ArchLayer::Data => "data",
            ArchLayer::Infrastructure => "infrastructure",
            ArchLayer::Unknown => "unknown",
        }
    }

    /// Capitalised name used for diagram titles and subgraph labels.
    pub fn title(&self) -> &'static str {
        match self {
            ArchLayer::Frontend => "Frontend",
            ArchLayer::Backend => "Backend",
            ArchLayer::Data => "Data",
            ArchLayer::Infrastructure => "Infrastructure",
            ArchLayer::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ArchLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known framework or data technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Vue,
    Angular,
    Express,
    Django,
    Flask,
    Mongodb,
    Postgresql,
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Framework::React => "react",
            Framework::Vue => "vue",
            Framework::Angular => "angular",
            Framework::Express => "express",
            Framework::Django => "django",
            Framework::Flask => "flask",
            Framework::Mongodb => "mongodb",
            Framework::Postgresql => "postgresql",
        };
        f.write_str(name)
    }
}

/// A framework detected in a component's file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkMatch {
    pub name: Framework,
    pub layer: ArchLayer,
    /// Share of the framework's content patterns that matched, 0-100.
    pub confidence: u8,
}

/// Architectural pattern a component appears to participate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchPattern {
    Mvc,
    Microservices,
    EventDriven,
    Layered,
}

impl ArchPattern {
    pub const ALL: [ArchPattern; 4] = [
        ArchPattern::Mvc,
        ArchPattern::Microservices,
        ArchPattern::EventDriven,
        ArchPattern::Layered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchPattern::Mvc => "mvc",
            ArchPattern::Microservices => "microservices",
            ArchPattern::EventDriven => "event-driven",
            ArchPattern::Layered => "layered",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ArchPattern::Mvc => "Model-View-Controller pattern",
            ArchPattern::Microservices => "Microservices architecture",
            ArchPattern::EventDriven => "Event-driven architecture",
            ArchPattern::Layered => "Layered architecture",
        }
    }
}

impl fmt::Display for ArchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: ArchPattern,
    pub confidence: u8,
}

/// Responsibility inferred from a component's file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Responsibility {
    UiRendering,
    StateManagement,
    ApiCommunication,
    BusinessLogic,
    DataPersistence,
    Routing,
}

impl fmt::Display for Responsibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Responsibility::UiRendering => "ui-rendering",
            Responsibility::StateManagement => "state-management",
            Responsibility::ApiCommunication => "api-communication",
            Responsibility::BusinessLogic => "business-logic",
            Responsibility::DataPersistence => "data-persistence",
            Responsibility::Routing => "routing",
        };
        f.write_str(name)
    }
}

/// A named code unit discovered by a scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    /// Path of the scanned file, relative to the project root.
    pub path: String,
    pub kind: ComponentKind,
    pub language: String,
    #[serde(default)]
    pub is_exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architectural_layer: Option<ArchLayer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<FrameworkMatch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternMatch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responsibilities: Vec<Responsibility>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
}

impl Component {
    pub fn new(name: &str, path: &str, kind: ComponentKind, language: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            language: language.to_string(),
            is_exported: false,
            architectural_layer: None,
            frameworks: Vec::new(),
            patterns: Vec::new(),
            responsibilities: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn exported(mut self, is_exported: bool) -> Self {
        self.is_exported = is_exported;
        self
    }

    /// Layer assigned during enrichment, `Unknown` before it.
    pub fn layer(&self) -> ArchLayer {
        self.architectural_layer.unwrap_or(ArchLayer::Unknown)
    }
}

/// Whether an import target lives inside the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locality {
    Local,
    External,
}

impl Locality {
    /// Local when the source starts with a relative-path marker.
    pub fn of_relative(source: &str) -> Self {
        if source.starts_with('.') {
            Locality::Local
        } else {
            Locality::External
        }
    }
}

/// A directed reference from a file to an imported name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Imported symbol (or module, for bare imports).
    pub name: String,
    /// Source module as written in the import statement.
    pub from: String,
    /// File containing the import.
    pub path: String,
    #[serde(default)]
    pub is_default: bool,
    pub locality: Locality,
}

impl Dependency {
    pub fn is_local(&self) -> bool {
        self.locality == Locality::Local
    }

    pub fn is_external(&self) -> bool {
        self.locality == Locality::External
    }
}

/// Per-file summary of exported symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub path: String,
    pub language: String,
    pub exports: Vec<String>,
}

impl Module {
    /// Module record named after the file stem.
    pub fn for_file(path: &str, language: &str, exports: Vec<String>) -> Self {
        let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let name = match file.split_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file,
        };
        Self {
            name: name.to_string(),
            path: path.to_string(),
            language: language.to_string(),
            exports,
        }
    }
}

/// Deduplication identity shared by every producer and consumer: `(type, name, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: String,
    pub name: String,
    pub path: String,
}

pub trait Keyed {
    fn key(&self) -> EntityKey;
}

impl Keyed for Component {
    fn key(&self) -> EntityKey {
        EntityKey {
            kind: self.kind.as_str().to_string(),
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

impl Keyed for Dependency {
    fn key(&self) -> EntityKey {
        EntityKey {
            kind: "import".to_string(),
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

impl Keyed for Module {
    fn key(&self) -> EntityKey {
        EntityKey {
            kind: "module".to_string(),
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

/// Drop items whose key was already seen, keeping first-seen order.
pub fn deduplicate<T: Keyed>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.key()))
        .collect()
}

/// Type of an inferred relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    ApiCall,
    EventEmission,
    EventSubscription,
    DataFlow,
    ServiceCommunication,
    DatabaseOperation,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 6] = [
        RelationshipKind::ApiCall,
        RelationshipKind::EventEmission,
        RelationshipKind::EventSubscription,
        RelationshipKind::DataFlow,
        RelationshipKind::ServiceCommunication,
        RelationshipKind::DatabaseOperation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::ApiCall => "api-call",
            RelationshipKind::EventEmission => "event-emission",
            RelationshipKind::EventSubscription => "event-subscription",
            RelationshipKind::DataFlow => "data-flow",
            RelationshipKind::ServiceCommunication => "service-communication",
            RelationshipKind::DatabaseOperation => "database-operation",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific metadata carried by a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipDetail {
    Api {
        endpoint: Option<String>,
        method: String,
    },
    Event {
        event_name: String,
    },
    Data {
        data_type: String,
    },
    Service {
        service_method: Option<String>,
    },
    Database {
        operation: String,
        table: Option<String>,
    },
}

/// A directed, typed, confidence-scored edge between a component and a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub from_path: String,
    /// Target component, endpoint group, event hub, service or table. May dangle.
    pub to: String,
    pub kind: RelationshipKind,
    pub confidence: u8,
    pub description: String,
    pub detail: RelationshipDetail,
}

impl Relationship {
    /// Endpoint, event name or service method, whichever the detail carries.
    pub fn distinguishing_field(&self) -> Option<&str> {
        match &self.detail {
            RelationshipDetail::Api { endpoint, .. } => endpoint.as_deref(),
            RelationshipDetail::Event { event_name } => Some(event_name),
            RelationshipDetail::Service { service_method } => service_method.as_deref(),
            RelationshipDetail::Data { .. } | RelationshipDetail::Database { .. } => None,
        }
    }

    /// Short edge label used by relationship-focused diagrams.
    pub fn label(&self) -> String {
        match &self.detail {
            RelationshipDetail::Api { endpoint, method } => match endpoint {
                Some(endpoint) => format!("{method} {endpoint}"),
                None => method.clone(),
            },
            RelationshipDetail::Event { event_name } => event_name.clone(),
            RelationshipDetail::Data { data_type } => data_type.clone(),
            RelationshipDetail::Service { service_method } => {
                service_method.clone().unwrap_or_else(|| "calls".to_string())
            }
            RelationshipDetail::Database { operation, .. } => operation.clone(),
        }
    }
}

/// Drop relationships sharing `(from, to, type, endpoint|eventName|serviceMethod)`.
pub fn deduplicate_relationships(relationships: Vec<Relationship>) -> Vec<Relationship> {
    let mut seen = HashSet::new();
    relationships
        .into_iter()
        .filter(|r| {
            seen.insert((
                r.from.clone(),
                r.to.clone(),
                r.kind,
                r.distinguishing_field().map(str::to_string),
            ))
        })
        .collect()
}

/// Relationships bucketed for downstream views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipCategories {
    pub api: Vec<Relationship>,
    pub events: Vec<Relationship>,
    pub data: Vec<Relationship>,
    pub services: Vec<Relationship>,
    pub database: Vec<Relationship>,
}

impl RelationshipCategories {
    pub fn total(&self) -> usize {
        self.api.len()
            + self.events.len()
            + self.data.len()
            + self.services.len()
            + self.database.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub count: usize,
    pub components: Vec<String>,
}

/// The sole handoff between analysis and diagram generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub components: Vec<Component>,
    pub dependencies: Vec<Dependency>,
    pub modules: Vec<Module>,
    #[serde(default)]
    pub architectural_layers: BTreeMap<ArchLayer, Vec<String>>,
    #[serde(default)]
    pub patterns: BTreeMap<ArchPattern, PatternSummary>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub relationship_categories: RelationshipCategories,
}

impl Analysis {
    /// Distinct languages seen in components and modules, sorted.
    pub fn languages(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .components
            .iter()
            .map(|c| c.language.as_str())
            .chain(self.modules.iter().map(|m| m.language.as_str()))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn external_dependency_count(&self) -> usize {
        self.dependencies.iter().filter(|d| d.is_external()).count()
    }

    /// Patterns with at least one participating component.
    pub fn detected_patterns(&self) -> Vec<ArchPattern> {
        self.patterns
            .iter()
            .filter(|(_, summary)| summary.count > 0)
            .map(|(pattern, _)| *pattern)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(name: &str, from: &str, path: &str) -> Dependency {
        Dependency {
            name: name.to_string(),
            from: from.to_string(),
            path: path.to_string(),
            is_default: false,
            locality: Locality::Local,
        }
    }

    fn api(from: &str, endpoint: &str) -> Relationship {
        Relationship {
            from: from.to_string(),
            from_path: "src/a.ts".to_string(),
            to: "api".to_string(),
            kind: RelationshipKind::ApiCall,
            confidence: 85,
            description: format!("API call to {endpoint}"),
            detail: RelationshipDetail::Api {
                endpoint: Some(endpoint.to_string()),
                method: "GET".to_string(),
            },
        }
    }

    #[test]
    fn test_deduplicate_collapses_identical_key() {
        let a = Component::new("App", "src/index.ts", ComponentKind::Class, "typescript");
        let b = Component::new("App", "src/index.ts", ComponentKind::Class, "typescript");
        let merged = deduplicate(vec![a, b]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_deduplicate_keeps_distinct_paths_and_kinds() {
        let items = vec![
            Component::new("helper", "utils.js", ComponentKind::Function, "javascript"),
            Component::new("helper", "utils.py", ComponentKind::Function, "python"),
            Component::new("helper", "utils.js", ComponentKind::Variable, "javascript"),
        ];
        assert_eq!(deduplicate(items).len(), 3);
    }

    #[test]
    fn test_deduplicate_preserves_first_seen_order() {
        let deps = vec![
            dep("b", "./b", "src/x.ts"),
            dep("a", "./a", "src/x.ts"),
            dep("b", "./other", "src/x.ts"),
        ];
        let merged = deduplicate(deps);
        let names: Vec<_> = merged.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(merged[0].from, "./b");
    }

    #[test]
    fn test_relationship_dedup_uses_distinguishing_field() {
        let rels = vec![
            api("App", "/api/users"),
            api("App", "/api/users"),
            api("App", "/api/orders"),
        ];
        assert_eq!(deduplicate_relationships(rels).len(), 2);
    }

    #[test]
    fn test_module_named_after_stem() {
        let module = Module::for_file("src/services/UserService.ts", "typescript", vec![]);
        assert_eq!(module.name, "UserService");
        assert_eq!(Module::for_file("main.py", "python", vec![]).name, "main");
    }

    #[test]
    fn test_relative_locality() {
        assert_eq!(Locality::of_relative("./utils"), Locality::Local);
        assert_eq!(Locality::of_relative("../a/b"), Locality::Local);
        assert_eq!(Locality::of_relative("react"), Locality::External);
        assert_eq!(Locality::of_relative("@scope/pkg"), Locality::External);
    }

    #[test]
    fn test_relationship_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&RelationshipKind::EventSubscription).unwrap();
        assert_eq!(json, "\"event-subscription\"");
    }

    #[test]
    fn test_analysis_languages_sorted_unique() {
        let analysis = Analysis {
            components: vec![
                Component::new("A", "a.ts", ComponentKind::Class, "typescript"),
                Component::new("b", "b.py", ComponentKind::Function, "python"),
            ],
            modules: vec![Module {
                name: "a".to_string(),
                path: "a.ts".to_string(),
                language: "typescript".to_string(),
                exports: vec![],
            }],
            ..Analysis::default()
        };
        assert_eq!(analysis.languages(), vec!["python", "typescript"]);
    }

    #[test]
    fn test_layer_map_key_serializes_as_string() {
        let mut analysis = Analysis::default();
        analysis
            .architectural_layers
            .insert(ArchLayer::Backend, vec!["UserService".to_string()]);
        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json["architectural_layers"].get("backend").is_some());
    }
}
