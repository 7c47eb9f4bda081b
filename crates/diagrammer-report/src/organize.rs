use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use diagrammer_core::types::Analysis;

/// Output folder a diagram is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    Overview,
    Focus,
    Interactive,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Overview, Bucket::Focus, Bucket::Interactive];

    pub fn of(name: &str) -> Self {
        if name.ends_with("-interactive") {
            Bucket::Interactive
        } else if name.starts_with("layer-") || name.starts_with("module-") {
            Bucket::Focus
        } else {
            Bucket::Overview
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            Bucket::Overview => "overview",
            Bucket::Focus => "focus",
            Bucket::Interactive => "interactive",
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            Bucket::Overview => "Overview",
            Bucket::Focus => "Focus Views",
            Bucket::Interactive => "Interactive",
        }
    }
}

/// Diagrams carrying `click` directives cannot be rendered to static images.
pub fn is_exportable(name: &str) -> bool {
    Bucket::of(name) != Bucket::Interactive
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizedDiagram {
    pub name: String,
    pub bucket: Bucket,
    /// Path relative to the output directory, always `/`-separated.
    pub relative_path: String,
    pub exportable: bool,
    #[serde(skip)]
    pub content: String,
}

pub fn organize_diagrams(diagrams: &BTreeMap<String, String>) -> Vec<OrganizedDiagram> {
    let mut out: Vec<OrganizedDiagram> = diagrams
        .iter()
        .map(|(name, content)| {
            let bucket = Bucket::of(name);
            OrganizedDiagram {
                name: name.clone(),
                bucket,
                relative_path: format!("diagrams/{}/{name}.md", bucket.dir_name()),
                exportable: is_exportable(name),
                content: content.clone(),
            }
        })
        .collect();
    out.sort_by(|a, b| a.bucket.cmp(&b.bucket).then_with(|| a.name.cmp(&b.name)));
    out
}

fn title_of(name: &str) -> String {
    name.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// README listing every diagram by bucket, followed by an analysis summary.
pub fn render_index(diagrams: &[OrganizedDiagram], analysis: &Analysis, date: NaiveDate) -> String {
    let mut out = String::from("# Architecture Diagrams\n\n");
    out.push_str("Generated from static analysis of the source tree.\n");

    for bucket in Bucket::ALL {
        let entries: Vec<_> = diagrams.iter().filter(|d| d.bucket == bucket).collect();
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {}\n\n", bucket.heading()));
        for d in entries {
            out.push_str(&format!("- [{}]({})\n", title_of(&d.name), d.relative_path));
        }
    }

    let languages = analysis.languages();
    out.push_str("\n## Summary\n\n");
    out.push_str(&format!("- **Components:** {}\n", analysis.components.len()));
    out.push_str(&format!(
        "- **Dependencies:** {} ({} external)\n",
        analysis.dependencies.len(),
        analysis.external_dependency_count()
    ));
    out.push_str(&format!(
        "- **Languages:** {}\n",
        if languages.is_empty() {
            "none".to_string()
        } else {
            languages.join(", ")
        }
    ));
    out.push_str(&format!(
        "- **Patterns detected:** {}\n",
        analysis.detected_patterns().len()
    ));
    out.push_str(&format!("- **Generated:** {}\n", date.format("%Y-%m-%d")));
    out
}
