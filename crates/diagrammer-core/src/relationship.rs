use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::patterns::{MatchGroups, PatternSet};
use crate::sources::SourceSet;
use crate::types::{
    deduplicate_relationships, Component, Relationship, RelationshipCategories,
    RelationshipDetail, RelationshipKind,
};

const API_CALL_PATTERNS: &[&str] = &[
    r#"fetch\(['"`]([^'"`]+)['"`]"#,
    r#"fetch\(['"`]([^'"`]+)['"`]\s*,\s*\{\s*method:\s*['"`]([^'"`]+)['"`]"#,
    r#"axios\.(get|post|put|delete|patch)\(['"`]([^'"`]+)['"`]"#,
    r#"axios\(\{\s*method:\s*['"`]([^'"`]+)['"`]\s*,\s*url:\s*['"`]([^'"`]+)['"`]"#,
    r#"\.(get|post|put|delete|patch)\(['"`]([^'"`]+)['"`]"#,
    r#"router\.(get|post|put|delete|patch)\(['"`]([^'"`]+)['"`]"#,
    r#"request\(['"`]([^'"`]+)['"`]"#,
    r#"http\.(get|post|put|delete)\(['"`]([^'"`]+)['"`]"#,
    r#"path\(['"`]([^'"`]+)['"`]"#,
    r#"url\(['"`]([^'"`]+)['"`]"#,
    r#"@app\.route\(['"`]([^'"`]+)['"`]"#,
    r#"@bp\.route\(['"`]([^'"`]+)['"`]"#,
];

const EVENT_EMISSION_PATTERNS: &[&str] = &[
    r#"emit\(['"`]([^'"`]+)['"`]"#,
    r#"dispatch\(['"`]([^'"`]+)['"`]"#,
    r#"publish\(['"`]([^'"`]+)['"`]"#,
    r#"trigger\(['"`]([^'"`]+)['"`]"#,
    r"onClick|onChange|onSubmit|onLoad",
    r#"\.emit\(['"`]([^'"`]+)['"`]"#,
    r"EventEmitter\.prototype\.emit",
    r#"CustomEvent\(['"`]([^'"`]+)['"`]"#,
    r#"new Event\(['"`]([^'"`]+)['"`]"#,
];

const EVENT_SUBSCRIPTION_PATTERNS: &[&str] = &[
    r#"addEventListener\(['"`]([^'"`]+)['"`]"#,
    r#"on\(['"`]([^'"`]+)['"`]"#,
    r#"listen\(['"`]([^'"`]+)['"`]"#,
    r#"subscribe\(['"`]([^'"`]+)['"`]"#,
    r"useEffect.*\[.*\]",
    r"useCallback",
    r"useMemo",
    r#"\.on\(['"`]([^'"`]+)['"`]"#,
    r"EventEmitter\.prototype\.on",
];

const DATA_FLOW_PATTERNS: &[&str] = &[
    r"props\.(\w+)",
    r"\.(\w+)\s*=\s*props",
    r"setState\(",
    r"useState\(",
    r"set\w+\(",
    r"\.map\(",
    r"\.filter\(",
    r"\.reduce\(",
    r"\.transform\(",
    r"\.find\(",
    r"\.save\(",
    r"\.update\(",
    r"\.create\(",
    r"\.delete\(",
    r"\.query\(",
];

const SERVICE_PATTERNS: &[&str] = &[
    r"\.service\.(\w+)",
    r"Service\.(\w+)",
    r"(\w+)Service\.(\w+)",
    r"@Inject",
    r"@Injectable",
    r"inject\(",
    r"\.(\w+)\(",
    r"this\.(\w+)\(",
    r#"import.*from\s+['"`]\./(\w+)['"`]"#,
    r#"require\(['"`]\./(\w+)['"`]"#,
];

const DATABASE_PATTERNS: &[&str] = &[
    r"(?i)SELECT.*FROM\s+(\w+)",
    r"(?i)INSERT\s+INTO\s+(\w+)",
    r"(?i)UPDATE\s+(\w+)",
    r"(?i)DELETE\s+FROM\s+(\w+)",
    r"\.find\(",
    r"\.findOne\(",
    r"\.findAll\(",
    r"\.create\(",
    r"\.update\(",
    r"\.destroy\(",
    r"\.save\(",
    r"Model\.(\w+)",
    r#"\.model\(['"`]([^'"`]+)['"`]"#,
    r"sequelize\.define\(",
    r"mongoose\.model\(",
];

const HTTP_VERBS: &[&str] = &["get", "post", "put", "delete", "patch"];

fn patterns_for(kind: RelationshipKind) -> &'static [&'static str] {
    match kind {
        RelationshipKind::ApiCall => API_CALL_PATTERNS,
        RelationshipKind::EventEmission => EVENT_EMISSION_PATTERNS,
        RelationshipKind::EventSubscription => EVENT_SUBSCRIPTION_PATTERNS,
        RelationshipKind::DataFlow => DATA_FLOW_PATTERNS,
        RelationshipKind::ServiceCommunication => SERVICE_PATTERNS,
        RelationshipKind::DatabaseOperation => DATABASE_PATTERNS,
    }
}

/// Heuristic confidence for one match, always within `0..=100`.
///
/// Base 50, +20 for a first group, +10 for a second, +15 for API calls and
/// +10 for database operations.
pub fn relationship_confidence(kind: RelationshipKind, m: &MatchGroups) -> u8 {
    let mut score: u32 = 50;
    if m.group(1).is_some() {
        score += 20;
    }
    if m.group(2).is_some() {
        score += 10;
    }
    score += match kind {
        RelationshipKind::ApiCall => 15,
        RelationshipKind::DatabaseOperation => 10,
        _ => 0,
    };
    score.min(100) as u8
}

/// Endpoint from the first group that is not a bare HTTP verb.
pub(crate) fn api_endpoint(m: &MatchGroups) -> Option<&str> {
    [1, 2, 3]
        .into_iter()
        .filter_map(|i| m.group(i))
        .find(|g| !HTTP_VERBS.contains(&g.to_ascii_lowercase().as_str()))
}

/// First path segment of the endpoint, `api` if there is none.
pub(crate) fn api_target(endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => endpoint
            .split('/')
            .nth(1)
            .filter(|s| !s.is_empty())
            .unwrap_or("api")
            .to_string(),
        None => "external-api".to_string(),
    }
}

/// Leftmost HTTP verb in the matched text, uppercased; `GET` when absent.
pub(crate) fn http_method(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    HTTP_VERBS
        .iter()
        .filter_map(|verb| lower.find(verb).map(|pos| (pos, verb)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, verb)| verb.to_ascii_uppercase())
        .unwrap_or_else(|| "GET".to_string())
}

fn database_operation(text: &str) -> &'static str {
    let lower = text.to_ascii_lowercase();
    [
        ("select", "SELECT"),
        ("insert", "INSERT"),
        ("update", "UPDATE"),
        ("delete", "DELETE"),
        ("find", "FIND"),
        ("create", "CREATE"),
        ("save", "SAVE"),
    ]
    .into_iter()
    .find(|(needle, _)| lower.contains(needle))
    .map(|(_, op)| op)
    .unwrap_or("QUERY")
}

fn data_type(text: &str) -> &'static str {
    if text.contains("props") {
        "props"
    } else if text.contains("state") {
        "state"
    } else if text.contains("map") || text.contains("filter") {
        "array"
    } else {
        "data"
    }
}

fn data_description(text: &str) -> &'static str {
    if text.contains("props") {
        "props passing"
    } else if text.contains("state") {
        "state update"
    } else if text.contains("map") {
        "array transformation"
    } else if text.contains("filter") {
        "array filtering"
    } else {
        "data processing"
    }
}

/// Build the relationship one match of `kind` implies for `component`.
pub fn build_relationship(
    component: &Component,
    kind: RelationshipKind,
    m: &MatchGroups,
) -> Relationship {
    let (to, description, detail) = match kind {
        RelationshipKind::ApiCall => {
            let endpoint = api_endpoint(m);
            (
                api_target(endpoint),
                format!("API call to {}", endpoint.unwrap_or("external API")),
                RelationshipDetail::Api {
                    endpoint: endpoint.map(str::to_string),
                    method: http_method(&m.text),
                },
            )
        }
        RelationshipKind::EventEmission | RelationshipKind::EventSubscription => {
            let verb = if kind == RelationshipKind::EventEmission {
                "Emits"
            } else {
                "Listens for"
            };
            (
                "event-system".to_string(),
                format!("{verb} {}", m.group(1).unwrap_or("event")),
                RelationshipDetail::Event {
                    event_name: m.group(1).unwrap_or("user-interaction").to_string(),
                },
            )
        }
        RelationshipKind::DataFlow => {
            let to = match m.group(1) {
                Some(target) => target.to_string(),
                None if m.text.contains("props") => "parent-component".to_string(),
                None if m.text.contains("state") => "state-manager".to_string(),
                None => "data-store".to_string(),
            };
            (
                to,
                format!("Data flow: {}", data_description(&m.text)),
                RelationshipDetail::Data {
                    data_type: data_type(&m.text).to_string(),
                },
            )
        }
        RelationshipKind::ServiceCommunication => {
            let method = m.first_of(&[1, 2]);
            (
                method
                    .map(|s| format!("{s}-service"))
                    .unwrap_or_else(|| "service".to_string()),
                match method {
                    Some(s) => format!("Calls {s} service"),
                    None => "Calls service".to_string(),
                },
                RelationshipDetail::Service {
                    service_method: method.map(str::to_string),
                },
            )
        }
        RelationshipKind::DatabaseOperation => {
            let table = m.group(1);
            (
                table
                    .map(|t| format!("{t}-table"))
                    .unwrap_or_else(|| "database".to_string()),
                format!("Database operation on {}", table.unwrap_or("table")),
                RelationshipDetail::Database {
                    operation: database_operation(&m.text).to_string(),
                    table: table.map(str::to_string),
                },
            )
        }
    };

    Relationship {
        from: component.name.clone(),
        from_path: component.path.clone(),
        to,
        kind,
        confidence: relationship_confidence(kind, m),
        description,
        detail,
    }
}

/// Mines typed, confidence-scored relationships from file content.
pub struct RelationshipAnalyzer {
    detectors: Vec<(RelationshipKind, PatternSet<MatchGroups>)>,
}

impl RelationshipAnalyzer {
    pub fn new() -> Result<Self> {
        let detectors = RelationshipKind::ALL
            .into_iter()
            .map(|kind| {
                PatternSet::from_patterns(patterns_for(kind))
                    .map(|set| (kind, set))
                    .with_context(|| format!("failed to compile {kind} patterns"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { detectors })
    }

    fn scan_content(&self, content: &str) -> Vec<(RelationshipKind, Vec<MatchGroups>)> {
        self.detectors
            .iter()
            .map(|(kind, set)| (*kind, set.scan(content)))
            .collect()
    }

    /// Relationships for every component whose file has content, deduplicated.
    ///
    /// Each file is scanned once; every component declared in it shares the
    /// matches.
    pub fn analyze_relationships(
        &self,
        components: &[Component],
        sources: &SourceSet,
    ) -> Vec<Relationship> {
        let mut matches_by_path: HashMap<&str, Vec<(RelationshipKind, Vec<MatchGroups>)>> =
            HashMap::new();
        let mut relationships = Vec::new();

        for component in components {
            let Some(content) = sources.get(&component.path).filter(|c| !c.is_empty()) else {
                continue;
            };
            let matches = matches_by_path
                .entry(component.path.as_str())
                .or_insert_with(|| self.scan_content(content));
            for (kind, found) in matches.iter() {
                relationships.extend(found.iter().map(|m| build_relationship(component, *kind, m)));
            }
        }

        let relationships = deduplicate_relationships(relationships);
        tracing::debug!(count = relationships.len(), "relationships detected");
        relationships
    }
}

/// Partition relationships into the api/events/data/services/database buckets.
pub fn categorize_relationships(relationships: &[Relationship]) -> RelationshipCategories {
    let mut categories = RelationshipCategories::default();
    for r in relationships {
        let bucket = match r.kind {
            RelationshipKind::ApiCall => &mut categories.api,
            RelationshipKind::EventEmission | RelationshipKind::EventSubscription => {
                &mut categories.events
            }
            RelationshipKind::DataFlow => &mut categories.data,
            RelationshipKind::ServiceCommunication => &mut categories.services,
            RelationshipKind::DatabaseOperation => &mut categories.database,
        };
        bucket.push(r.clone());
    }
    categories
}
