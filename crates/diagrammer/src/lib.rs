use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use diagrammer_core::{discover_files, load_sources, Analysis, AnalysisPipeline, Config, ScannerRegistry};
use diagrammer_javascript::JavaScriptScanner;
use diagrammer_python::PythonScanner;
use diagrammer_report::json;
use diagrammer_report::OrganizedDiagram;
use diagrammer_typescript::TypeScriptScanner;

/// Registry with every built-in language scanner.
pub fn default_registry() -> Result<ScannerRegistry> {
    Ok(ScannerRegistry::new()
        .with(Box::new(
            TypeScriptScanner::new().context("failed to initialize TypeScript scanner")?,
        ))
        .with(Box::new(
            JavaScriptScanner::new().context("failed to initialize JavaScript scanner")?,
        ))
        .with(Box::new(
            PythonScanner::new().context("failed to initialize Python scanner")?,
        )))
}

/// Expand short language names (`ts`, `js`, `py`) to scanner identifiers.
pub fn normalize_language(language: &str) -> String {
    let language = language.trim().to_ascii_lowercase();
    match language.as_str() {
        "ts" | "tsx" => "typescript".to_string(),
        "js" | "jsx" | "node" => "javascript".to_string(),
        "py" => "python".to_string(),
        _ => language,
    }
}

/// Discover, load and analyze every source file under `root`.
pub async fn analyze_project(root: &Path, languages: &[String], config: &Config) -> Result<Analysis> {
    let pipeline = AnalysisPipeline::new(default_registry()?, config)?;
    let files = discover_files(root, &pipeline.registry().select(languages), config);
    info!(files = files.len(), root = %root.display(), "loading sources");

    let sources = load_sources(root, files).await;
    Ok(pipeline.run(&sources, languages))
}

/// Write each diagram at its bucketed path, plus the README index and a JSON manifest.
pub fn write_output(
    output: &Path,
    diagrams: &[OrganizedDiagram],
    index: &str,
    generated: chrono::NaiveDate,
) -> Result<()> {
    for diagram in diagrams {
        let target = output.join(&diagram.relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        fs::write(&target, &diagram.content)
            .with_context(|| format!("failed to write '{}'", target.display()))?;
    }

    fs::create_dir_all(output).with_context(|| format!("failed to create '{}'", output.display()))?;
    let readme = output.join("README.md");
    fs::write(&readme, index).with_context(|| format!("failed to write '{}'", readme.display()))?;

    let manifest = output.join("manifest.json");
    let body = json::format_manifest(diagrams, generated).context("failed to serialize manifest")?;
    fs::write(&manifest, body).with_context(|| format!("failed to write '{}'", manifest.display()))?;

    info!(count = diagrams.len(), output = %output.display(), "diagrams written");
    Ok(())
}
