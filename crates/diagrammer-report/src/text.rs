use std::collections::BTreeMap;

use colored::Colorize;

use diagrammer_core::types::{Analysis, ArchLayer};

use crate::organize::{Bucket, OrganizedDiagram};

/// Format an analysis summary for terminal output.
pub fn format_summary(analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "Diagrammer - Analysis Summary".bold()));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    let languages = analysis.languages();
    out.push_str(&format!(
        "{}: {} components, {} dependencies ({} external), {} modules\n",
        "Summary".bold(),
        analysis.components.len(),
        analysis.dependencies.len(),
        analysis.external_dependency_count(),
        analysis.modules.len(),
    ));
    out.push_str(&format!(
        "{}: {}\n",
        "Languages".bold(),
        if languages.is_empty() {
            "none".dimmed().to_string()
        } else {
            languages.join(", ")
        }
    ));

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for c in &analysis.components {
        *by_kind.entry(c.kind.as_str()).or_default() += 1;
    }
    if !by_kind.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", "Components".bold(), "-".repeat(40)));
        for (kind, count) in by_kind {
            out.push_str(&format!("  {kind}: {count}\n"));
        }
    }

    let layers: Vec<_> = ArchLayer::ALL
        .iter()
        .filter_map(|layer| {
            let n = analysis.components.iter().filter(|c| c.layer() == *layer).count();
            (n > 0).then_some((layer, n))
        })
        .collect();
    if !layers.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", "Layers".bold(), "-".repeat(40)));
        for (layer, count) in layers {
            out.push_str(&format!("  {layer}: {count}\n"));
        }
    }

    let patterns = analysis.detected_patterns();
    if patterns.is_empty() {
        out.push_str(&format!("\n{}\n", "No architectural patterns detected.".dimmed()));
    } else {
        out.push_str(&format!("\n{}\n{}\n", "Patterns".bold(), "-".repeat(40)));
        for pattern in patterns {
            let count = analysis.patterns.get(&pattern).map_or(0, |s| s.count);
            out.push_str(&format!("  {}: {count}\n", pattern.to_string().green()));
        }
    }

    let categories = &analysis.relationship_categories;
    out.push_str(&format!(
        "\n{}: {} total (api {}, events {}, data {}, services {}, database {})\n",
        "Relationships".bold(),
        analysis.relationships.len(),
        categories.api.len(),
        categories.events.len(),
        categories.data.len(),
        categories.services.len(),
        categories.database.len(),
    ));

    out.push('\n');
    out
}

/// List the files written by `generate`, grouped by bucket.
pub fn format_written(output_dir: &str, diagrams: &[OrganizedDiagram]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} diagrams to {}\n",
        "Wrote".green().bold(),
        diagrams.len(),
        output_dir.bold()
    ));
    for bucket in Bucket::ALL {
        let count = diagrams.iter().filter(|d| d.bucket == bucket).count();
        if count > 0 {
            out.push_str(&format!("  {}: {count}\n", bucket.dir_name()));
        }
    }
    let skipped = diagrams.iter().filter(|d| !d.exportable).count();
    if skipped > 0 {
        out.push_str(&format!(
            "  {}\n",
            format!("{skipped} interactive diagram(s) excluded from image export").dimmed()
        ));
    }
    out
}
