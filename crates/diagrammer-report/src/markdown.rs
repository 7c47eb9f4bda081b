use std::collections::BTreeMap;

use diagrammer_core::config::DiagramConfig;
use diagrammer_core::types::Analysis;

use crate::filter;

const TOP_COMPONENTS: usize = 10;
const DEPENDENCY_SAMPLE: usize = 10;
const HIGH_EXTERNAL_RATIO: f64 = 0.7;

const LEGEND: &str = "\
| Shape / Line | Meaning |
|--------------|---------|
| Rectangle | Component (class, function, interface) |
| Stadium | External package or service |
| Hexagon | API endpoint group |
| Cylinder | Database table or store |
| Circle | Event |
| Subgraph | Directory, layer or role grouping |
| `-->` | Import, call or data dependency |
| `-.->` | Event, data flow or inferred relationship |
| `<-->` | Circular dependency |
";

/// Analysis-wide observations shared by every generated document.
pub fn insights(analysis: &Analysis, circular_pairs: usize) -> Vec<String> {
    let mut out = Vec::new();
    let total = analysis.dependencies.len();
    let external = analysis.external_dependency_count();
    if total > 0 && external as f64 / total as f64 > HIGH_EXTERNAL_RATIO {
        out.push(format!(
            "High external dependency ratio: {external} of {total} imports ({:.0}%) come from outside the project.",
            external as f64 * 100.0 / total as f64
        ));
    }
    if !analysis.components.is_empty() && analysis.relationships.is_empty() {
        out.push("No cross-component relationships were detected.".to_string());
    }
    if circular_pairs > 0 {
        out.push(format!(
            "{circular_pairs} circular dependency pair(s) detected; see the circular-dependencies diagram."
        ));
    }
    out
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// A Markdown document wrapping one Mermaid diagram.
#[derive(Debug)]
pub struct Document<'a> {
    title: String,
    description: String,
    analysis: &'a Analysis,
    config: &'a DiagramConfig,
    mermaid: String,
    insights: Vec<String>,
}

impl<'a> Document<'a> {
    pub fn new(
        title: &str,
        description: &str,
        analysis: &'a Analysis,
        config: &'a DiagramConfig,
        mermaid: String,
    ) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            analysis,
            config,
            mermaid,
            insights: Vec::new(),
        }
    }

    pub fn insights(mut self, insights: impl IntoIterator<Item = String>) -> Self {
        self.insights.extend(insights);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n{}\n\n", self.title, self.description));
        out.push_str(&self.metadata());

        if !self.insights.is_empty() {
            out.push_str("\n## Insights\n\n");
            for insight in &self.insights {
                out.push_str(&format!("- {insight}\n"));
            }
        }

        out.push_str("\n## Diagram\n\n```mermaid\n");
        out.push_str(&self.mermaid);
        if !self.mermaid.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n");

        out.push_str("\n## Legend\n\n");
        out.push_str(LEGEND);

        out.push_str(&self.top_components());
        out.push_str(&self.dependency_sample());
        out.push_str(&self.pattern_counts());
        out.push_str(&self.language_distribution());

        out.push_str("\n---\n*Generated by [diagrammer](https://github.com/samjhill/diagrammer)*\n");
        out
    }

    fn metadata(&self) -> String {
        let a = self.analysis;
        let languages = a.languages();
        let patterns: Vec<String> = a
            .detected_patterns()
            .iter()
            .map(|p| p.to_string())
            .collect();
        let mut out = String::from("## Metadata\n\n");
        out.push_str(&format!("- **Components:** {}\n", a.components.len()));
        out.push_str(&format!(
            "- **Dependencies:** {} ({} external)\n",
            a.dependencies.len(),
            a.external_dependency_count()
        ));
        out.push_str(&format!("- **Modules:** {}\n", a.modules.len()));
        out.push_str(&format!("- **Relationships:** {}\n", a.relationships.len()));
        out.push_str(&format!(
            "- **Languages:** {}\n",
            if languages.is_empty() {
                "none".to_string()
            } else {
                languages.join(", ")
            }
        ));
        out.push_str(&format!(
            "- **Patterns:** {}\n",
            if patterns.is_empty() {
                "none detected".to_string()
            } else {
                patterns.join(", ")
            }
        ));
        out
    }

    fn top_components(&self) -> String {
        let config = DiagramConfig {
            max_nodes: TOP_COMPONENTS,
            ..self.config.clone()
        };
        let selection = filter::filter_components(&self.analysis.components, &config);
        let mut out = String::from("\n## Top Components\n\n");
        if selection.is_empty() {
            out.push_str("No components found.\n");
            return out;
        }
        out.push_str("| Component | Kind | Layer | Path |\n");
        out.push_str("|-----------|------|-------|------|\n");
        for c in &selection.components {
            out.push_str(&format!(
                "| {} | {} | {} | `{}` |\n",
                cell(&c.name),
                c.kind,
                c.layer(),
                cell(&c.path)
            ));
        }
        out
    }

    fn dependency_sample(&self) -> String {
        let mut out = String::from("\n## Dependencies\n\n");
        if self.analysis.dependencies.is_empty() {
            out.push_str("No dependencies found.\n");
            return out;
        }
        out.push_str("| Name | From | File | Kind |\n");
        out.push_str("|------|------|------|------|\n");
        for d in self.analysis.dependencies.iter().take(DEPENDENCY_SAMPLE) {
            out.push_str(&format!(
                "| {} | `{}` | `{}` | {} |\n",
                cell(&d.name),
                cell(&d.from),
                cell(&d.path),
                if d.is_external() { "external" } else { "local" }
            ));
        }
        let rest = self.analysis.dependencies.len().saturating_sub(DEPENDENCY_SAMPLE);
        if rest > 0 {
            out.push_str(&format!("\n...and {rest} more.\n"));
        }
        out
    }

    fn pattern_counts(&self) -> String {
        let mut out = String::from("\n## Patterns\n\n");
        let detected: Vec<_> = self
            .analysis
            .patterns
            .iter()
            .filter(|(_, s)| s.count > 0)
            .collect();
        if detected.is_empty() {
            out.push_str("No architectural patterns detected.\n");
            return out;
        }
        out.push_str("| Pattern | Components |\n");
        out.push_str("|---------|------------|\n");
        for (pattern, summary) in detected {
            out.push_str(&format!("| {pattern} | {} |\n", summary.count));
        }
        out
    }

    fn language_distribution(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for module in &self.analysis.modules {
            *counts.entry(module.language.as_str()).or_default() += 1;
        }
        let total = self.analysis.modules.len();

        let mut out = String::from("\n## Languages\n\n");
        if counts.is_empty() {
            out.push_str("No source files analyzed.\n");
            return out;
        }
        out.push_str("| Language | Files | Share |\n");
        out.push_str("|----------|-------|-------|\n");
        for (language, count) in counts {
            out.push_str(&format!(
                "| {language} | {count} | {:.1}% |\n",
                percent(count, total)
            ));
        }
        out
    }
}
