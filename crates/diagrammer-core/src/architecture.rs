use anyhow::{Context, Result};
use regex::Regex;

use crate::config::LayersConfig;
use crate::layer::LayerClassifier;
use crate::patterns::{MatchGroups, PatternSet};
use crate::relationship::{api_endpoint, api_target, http_method, relationship_confidence};
use crate::types::{
    ArchLayer, ArchPattern, Component, Framework, FrameworkMatch, PatternMatch, Relationship,
    RelationshipDetail, RelationshipKind, Responsibility,
};

struct FrameworkRule {
    framework: Framework,
    layer: ArchLayer,
    patterns: Vec<Regex>,
    indicators: &'static [&'static str],
}

const FRAMEWORKS: &[(Framework, ArchLayer, &[&str], &[&str])] = &[
    (
        Framework::React,
        ArchLayer::Frontend,
        &[
            r"(?i)import\s+React",
            r#"(?i)from\s+['"]react['"]"#,
            r"(?i)useState|useEffect|useContext",
            r"(?i)React\.Component",
            r"(?i)\.jsx?$",
        ],
        &["jsx", "tsx", "react", "hooks"],
    ),
    (
        Framework::Vue,
        ArchLayer::Frontend,
        &[
            r#"(?i)import\s+.*\s+from\s+['"]vue['"]"#,
            r"(?i)Vue\.component",
            r"(?i)<template>",
            r"(?i)\.vue$",
        ],
        &["vue", "template", "script"],
    ),
    (
        Framework::Angular,
        ArchLayer::Frontend,
        &[
            r"(?i)@Component",
            r"(?i)@Injectable",
            r"(?i)import.*@angular",
            r"(?i)ngOnInit|ngOnDestroy",
        ],
        &["angular", "component", "service"],
    ),
    (
        Framework::Express,
        ArchLayer::Backend,
        &[
            r"(?i)express",
            r"(?i)app\.get|app\.post|app\.put|app\.delete",
            r"(?i)router\.|Router\(\)",
            r"(?i)middleware",
        ],
        &["express", "router", "middleware", "api"],
    ),
    (
        Framework::Django,
        ArchLayer::Backend,
        &[
            r"(?i)from\s+django",
            r"(?i)@csrf_exempt",
            r"(?i)class\s+\w+View",
            r"(?i)urls\.py",
        ],
        &["django", "view", "model", "url"],
    ),
    (
        Framework::Flask,
        ArchLayer::Backend,
        &[
            r"(?i)from\s+flask",
            r"(?i)@app\.route",
            r"(?i)Flask\(",
            r"(?i)render_template",
        ],
        &["flask", "route", "template"],
    ),
    (
        Framework::Mongodb,
        ArchLayer::Data,
        &[
            r"(?i)mongoose",
            r"(?i)mongodb",
            r"(?i)\.find\(|\.save\(|\.update\(",
            r"(?i)Schema\(",
        ],
        &["mongo", "schema", "collection"],
    ),
    (
        Framework::Postgresql,
        ArchLayer::Data,
        &[r"(?i)pg|postgres", r"(?i)sequelize", r"(?i)prisma", r"(?i)\.query\("],
        &["postgres", "sql", "query"],
    ),
];

fn pattern_indicators(pattern: ArchPattern) -> &'static [&'static str] {
    match pattern {
        ArchPattern::Mvc => &["controller", "model", "view", "service"],
        ArchPattern::Microservices => &["service", "api", "gateway", "registry"],
        ArchPattern::EventDriven => &["event", "emit", "listener", "pubsub", "message"],
        ArchPattern::Layered => &["presentation", "business", "data", "infrastructure"],
    }
}

const API_PATTERNS: &[&str] = &[
    r#"fetch\(['"`]([^'"`]+)['"`]"#,
    r#"axios\.(get|post|put|delete)\(['"`]([^'"`]+)['"`]"#,
    r#"\.get\(['"`]([^'"`]+)['"`]"#,
    r#"\.post\(['"`]([^'"`]+)['"`]"#,
];

const EVENT_PATTERNS: &[&str] = &[
    r#"emit\(['"`]([^'"`]+)['"`]"#,
    r#"dispatch\(['"`]([^'"`]+)['"`]"#,
    r#"publish\(['"`]([^'"`]+)['"`]"#,
];

const PERSISTENCE_CALLS: &[&str] = &["find", "save", "update", "delete", "create"];

/// `matched / total` as a rounded percentage.
fn percentage(matched: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((matched as f64 / total as f64) * 100.0).round() as u8
}

/// Enriches components with frameworks, layer, patterns, responsibilities and
/// coarse relationships, all from pattern matches over the file content.
pub struct ArchitecturalAnalyzer {
    frameworks: Vec<FrameworkRule>,
    classifier: LayerClassifier,
    api_calls: PatternSet<MatchGroups>,
    events: PatternSet<MatchGroups>,
}

impl ArchitecturalAnalyzer {
    pub fn new(layers: &LayersConfig) -> Result<Self> {
        let frameworks = FRAMEWORKS
            .iter()
            .map(|(framework, layer, patterns, indicators)| -> Result<FrameworkRule> {
                let patterns = patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("failed to compile {framework} patterns"))?;
                Ok(FrameworkRule {
                    framework: *framework,
                    layer: *layer,
                    patterns,
                    indicators: *indicators,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            frameworks,
            classifier: LayerClassifier::new(layers),
            api_calls: PatternSet::from_patterns(API_PATTERNS)
                .context("failed to compile API call patterns")?,
            events: PatternSet::from_patterns(EVENT_PATTERNS)
                .context("failed to compile event patterns")?,
        })
    }

    /// Return a copy of `component` with enrichment fields added.
    ///
    /// Existing enrichment is kept: a layer already set stays, and detected
    /// items are appended only when not already present.
    pub fn analyze_component(&self, component: &Component, content: &str, file_path: &str) -> Component {
        let mut enriched = component.clone();

        if enriched.architectural_layer.is_none() {
            enriched.architectural_layer = Some(self.detect_layer(file_path, content));
        }
        for framework in self.detect_frameworks(content, file_path) {
            if !enriched.frameworks.iter().any(|f| f.name == framework.name) {
                enriched.frameworks.push(framework);
            }
        }
        for pattern in detect_patterns(content, file_path) {
            if !enriched.patterns.iter().any(|p| p.pattern == pattern.pattern) {
                enriched.patterns.push(pattern);
            }
        }
        for responsibility in infer_responsibilities(content) {
            if !enriched.responsibilities.contains(&responsibility) {
                enriched.responsibilities.push(responsibility);
            }
        }
        for relationship in self.extract_relationships(component, content) {
            if !enriched.relationships.contains(&relationship) {
                enriched.relationships.push(relationship);
            }
        }
        enriched
    }

    /// Frameworks whose content patterns or path indicators match.
    pub fn detect_frameworks(&self, content: &str, file_path: &str) -> Vec<FrameworkMatch> {
        let lower_path = file_path.to_ascii_lowercase();
        self.frameworks
            .iter()
            .filter_map(|rule| {
                let matched = rule.patterns.iter().filter(|p| p.is_match(content)).count();
                let in_path = rule.indicators.iter().any(|i| lower_path.contains(i));
                (matched > 0 || in_path).then(|| FrameworkMatch {
                    name: rule.framework,
                    layer: rule.layer,
                    confidence: percentage(matched, rule.patterns.len()),
                })
            })
            .collect()
    }

    pub fn detect_layer(&self, file_path: &str, content: &str) -> ArchLayer {
        self.classifier.classify(file_path, content)
    }

    /// API calls, emitted events and persistence calls found in `content`.
    pub fn extract_relationships(&self, component: &Component, content: &str) -> Vec<Relationship> {
        let relationship = |kind, to: String, description: String, detail, m: Option<&MatchGroups>| {
            Relationship {
                from: component.name.clone(),
                from_path: component.path.clone(),
                to,
                kind,
                confidence: m
                    .map(|m| relationship_confidence(kind, m))
                    .unwrap_or(50),
                description,
                detail,
            }
        };

        let mut out = Vec::new();
        for m in self.api_calls.scan(content) {
            let endpoint = api_endpoint(&m);
            out.push(relationship(
                RelationshipKind::ApiCall,
                api_target(endpoint),
                format!("calls {}", endpoint.unwrap_or("external API")),
                RelationshipDetail::Api {
                    endpoint: endpoint.map(str::to_string),
                    method: http_method(&m.text),
                },
                Some(&m),
            ));
        }
        for m in self.events.scan(content) {
            let name = m.group(1).unwrap_or("event").to_string();
            out.push(relationship(
                RelationshipKind::EventEmission,
                "event-system".to_string(),
                format!("emits {name}"),
                RelationshipDetail::Event { event_name: name },
                Some(&m),
            ));
        }
        for call in PERSISTENCE_CALLS {
            if content.contains(&format!(".{call}(")) {
                out.push(relationship(
                    RelationshipKind::DatabaseOperation,
                    "database".to_string(),
                    format!("persists via {call}"),
                    RelationshipDetail::Database {
                        operation: call.to_ascii_uppercase(),
                        table: None,
                    },
                    None,
                ));
            }
        }
        out
    }
}

/// Patterns whose indicators occur in the content or path.
///
/// Confidence counts content hits only.
pub fn detect_patterns(content: &str, file_path: &str) -> Vec<PatternMatch> {
    let lower_content = content.to_lowercase();
    let lower_path = file_path.to_ascii_lowercase();
    ArchPattern::ALL
        .into_iter()
        .filter_map(|pattern| {
            let indicators = pattern_indicators(pattern);
            let detected = indicators
                .iter()
                .any(|i| lower_content.contains(i) || lower_path.contains(i));
            detected.then(|| PatternMatch {
                pattern,
                confidence: percentage(
                    indicators.iter().filter(|i| lower_content.contains(*i)).count(),
                    indicators.len(),
                ),
            })
        })
        .collect()
}

/// Fixed ordered checklist of content substrings.
pub fn infer_responsibilities(content: &str) -> Vec<Responsibility> {
    let has = |needles: &[&str]| needles.iter().any(|n| content.contains(n));
    let mut out = Vec::new();
    if content.contains("render") || (content.contains("return") && content.contains('<')) {
        out.push(Responsibility::UiRendering);
    }
    if has(&["state", "useState", "setState"]) {
        out.push(Responsibility::StateManagement);
    }
    if has(&["fetch", "axios", "api"]) {
        out.push(Responsibility::ApiCommunication);
    }
    if has(&["calculate", "process", "validate"]) {
        out.push(Responsibility::BusinessLogic);
    }
    if has(&["save", "create", "update"]) {
        out.push(Responsibility::DataPersistence);
    }
    if has(&["route", "navigate", "router"]) {
        out.push(Responsibility::Routing);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentKind;

    fn analyzer() -> ArchitecturalAnalyzer {
        ArchitecturalAnalyzer::new(&LayersConfig::default()).unwrap()
    }

    fn component(path: &str) -> Component {
        Component::new("Widget", path, ComponentKind::Class, "javascript")
    }

    #[test]
    fn test_detects_react_from_content() {
        let content = "import React, { useState } from 'react';";
        let found = analyzer().detect_frameworks(content, "src/widget.js");
        let react = found.iter().find(|f| f.name == Framework::React).unwrap();
        assert_eq!(react.layer, ArchLayer::Frontend);
        assert_eq!(react.confidence, 60);
    }

    #[test]
    fn test_detects_framework_from_path_indicator() {
        let found = analyzer().detect_frameworks("", "src/mongo/conn.js");
        let mongo = found.iter().find(|f| f.name == Framework::Mongodb).unwrap();
        assert_eq!(mongo.confidence, 0);
    }

    #[test]
    fn test_framework_confidence_is_monotonic() {
        let a = analyzer();
        let conf = |content: &str| {
            a.detect_frameworks(content, "x.js")
                .into_iter()
                .find(|f| f.name == Framework::Express)
                .map(|f| f.confidence)
                .unwrap_or(0)
        };
        let one = conf("const express = require('express')");
        let two = conf("const express = require('express'); app.get('/', h)");
        assert!(one <= two && two <= 100);
    }

    #[test]
    fn test_patterns_from_content_and_path() {
        let found = detect_patterns("", "src/controllers/user.js");
        let mvc = found.iter().find(|p| p.pattern == ArchPattern::Mvc).unwrap();
        assert_eq!(mvc.confidence, 0);

        let found = detect_patterns("emit an event to the listener", "x.js");
        assert!(found.iter().any(|p| p.pattern == ArchPattern::EventDriven));
    }

    #[test]
    fn test_responsibilities_order() {
        let content = "function render() { const [s] = useState(); fetch('/x'); route() }";
        assert_eq!(
            infer_responsibilities(content),
            vec![
                Responsibility::UiRendering,
                Responsibility::StateManagement,
                Responsibility::ApiCommunication,
                Responsibility::Routing,
            ]
        );
    }

    #[test]
    fn test_analyze_component_is_additive() {
        let mut original = component("src/components/widget.js");
        original.architectural_layer = Some(ArchLayer::Data);
        let enriched = analyzer().analyze_component(
            &original,
            "fetch('/api/items'); emit('changed'); repo.save(x)",
            "src/components/widget.js",
        );
        assert_eq!(enriched.architectural_layer, Some(ArchLayer::Data));
        assert_eq!(enriched.name, original.name);
        assert!(enriched
            .relationships
            .iter()
            .any(|r| r.kind == RelationshipKind::ApiCall && r.to == "api"));
        assert!(enriched
            .relationships
            .iter()
            .any(|r| r.kind == RelationshipKind::DatabaseOperation));

        let again = analyzer().analyze_component(&enriched, "fetch('/api/items')", "x.js");
        assert_eq!(again.relationships.len(), enriched.relationships.len());
    }

    #[test]
    fn test_layer_assigned_when_missing() {
        let enriched = analyzer().analyze_component(&component("src/api/users.js"), "", "src/api/users.js");
        assert_eq!(enriched.layer(), ArchLayer::Backend);
    }
}
