use serde::Serialize;

use diagrammer_core::types::Analysis;

use crate::organize::OrganizedDiagram;

fn to_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

/// Format the full analysis as JSON.
pub fn format_analysis(analysis: &Analysis, compact: bool) -> serde_json::Result<String> {
    to_json(analysis, compact)
}

/// Index of the written diagram files, consumed by exporters.
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub generated: String,
    pub diagrams: &'a [OrganizedDiagram],
}

pub fn format_manifest(
    diagrams: &[OrganizedDiagram],
    generated: chrono::NaiveDate,
) -> serde_json::Result<String> {
    let manifest = Manifest {
        generated: generated.format("%Y-%m-%d").to_string(),
        diagrams,
    };
    to_json(&manifest, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use diagrammer_core::types::{Component, ComponentKind, Dependency, Locality};

    use crate::organize::organize_diagrams;

    #[test]
    fn test_analysis_json_uses_kebab_case() {
        let analysis = Analysis {
            components: vec![Component::new(
                "handler",
                "src/api.js",
                ComponentKind::ArrowFunction,
                "javascript",
            )],
            dependencies: vec![Dependency {
                name: "express".into(),
                from: "express".into(),
                path: "src/api.js".into(),
                is_default: true,
                locality: Locality::External,
            }],
            ..Analysis::default()
        };
        let json = format_analysis(&analysis, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["components"][0]["kind"], "arrow-function");
        assert_eq!(value["dependencies"][0]["from"], "express");
        assert!(!json.contains('\n'));

        let pretty = format_analysis(&analysis, false).unwrap();
        assert!(pretty.contains('\n'));
        let back: Analysis = serde_json::from_str(&pretty).unwrap();
        assert_eq!(back.components.len(), 1);
    }

    #[test]
    fn test_manifest_omits_content() {
        let diagrams: BTreeMap<String, String> = [(
            "architecture-interactive".to_string(),
            "graph TD".to_string(),
        )]
        .into();
        let organized = organize_diagrams(&diagrams);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let json = format_manifest(&organized, date).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["generated"], "2024-01-02");
        let entry = &value["diagrams"][0];
        assert_eq!(entry["bucket"], "interactive");
        assert_eq!(entry["exportable"], false);
        assert!(entry.get("content").is_none());
    }
}
