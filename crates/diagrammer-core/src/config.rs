use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::ArchLayer;

pub const CONFIG_FILE_NAME: &str = ".diagrammer.toml";

/// Top-level configuration from `.diagrammer.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub layers: LayersConfig,
    #[serde(default)]
    pub diagram: DiagramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Extra globs excluded from discovery, on top of the fixed directory list.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_languages() -> Vec<String> {
    vec!["javascript".to_string(), "typescript".to_string()]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            exclude_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Keep test files in diagrams.
    #[serde(default)]
    pub include_tests: bool,
    /// Maximum directory depth for discovery; 0 means unlimited.
    #[serde(default)]
    pub max_depth: usize,
}

/// Path-segment keywords mapping files to architectural layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayersConfig {
    #[serde(default = "default_frontend")]
    pub frontend: Vec<String>,
    #[serde(default = "default_backend")]
    pub backend: Vec<String>,
    #[serde(default = "default_data")]
    pub data: Vec<String>,
    #[serde(default = "default_infrastructure")]
    pub infrastructure: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_frontend() -> Vec<String> {
    words(&["components", "pages", "views", "ui", "frontend", "client"])
}

fn default_backend() -> Vec<String> {
    words(&["api", "routes", "controllers", "services", "backend", "server"])
}

fn default_data() -> Vec<String> {
    words(&["models", "schemas", "database", "db", "data", "entities"])
}

fn default_infrastructure() -> Vec<String> {
    words(&["config", "utils", "helpers", "middleware", "infrastructure"])
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            frontend: default_frontend(),
            backend: default_backend(),
            data: default_data(),
            infrastructure: default_infrastructure(),
        }
    }
}

impl LayersConfig {
    /// Keyword groups in precedence order.
    pub fn groups(&self) -> [(ArchLayer, &[String]); 4] {
        [
            (ArchLayer::Frontend, self.frontend.as_slice()),
            (ArchLayer::Backend, self.backend.as_slice()),
            (ArchLayer::Data, self.data.as_slice()),
            (ArchLayer::Infrastructure, self.infrastructure.as_slice()),
        ]
    }
}

/// Limits and layout for generated diagrams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramConfig {
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default = "default_max_edges")]
    pub max_edges: usize,
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,
    #[serde(default = "default_max_per_group")]
    pub max_per_group: usize,
    #[serde(default = "default_max_external_per_group")]
    pub max_external_per_group: usize,
    #[serde(default = "default_focus_max_nodes")]
    pub focus_max_nodes: usize,
    #[serde(default = "default_focus_max_edges")]
    pub focus_max_edges: usize,
    #[serde(default = "default_focus_modules")]
    pub focus_modules: usize,
    /// Keep test files in diagrams; mirrors `analysis.include_tests`.
    #[serde(skip)]
    pub include_tests: bool,
}

fn default_direction() -> String {
    "TD".to_string()
}
fn default_max_nodes() -> usize {
    25
}
fn default_max_edges() -> usize {
    60
}
fn default_max_groups() -> usize {
    8
}
fn default_max_per_group() -> usize {
    6
}
fn default_max_external_per_group() -> usize {
    5
}
fn default_focus_max_nodes() -> usize {
    15
}
fn default_focus_max_edges() -> usize {
    30
}
fn default_focus_modules() -> usize {
    5
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            direction: default_direction(),
            max_nodes: default_max_nodes(),
            max_edges: default_max_edges(),
            max_groups: default_max_groups(),
            max_per_group: default_max_per_group(),
            max_external_per_group: default_max_external_per_group(),
            focus_max_nodes: default_focus_max_nodes(),
            focus_max_edges: default_focus_max_edges(),
            focus_modules: default_focus_modules(),
            include_tests: false,
        }
    }
}

impl DiagramConfig {
    /// Mermaid flow direction, falling back to `TD` for anything unrecognised.
    pub fn direction(&self) -> &str {
        match self.direction.trim().to_ascii_uppercase().as_str() {
            "TB" => "TB",
            "BT" => "BT",
            "LR" => "LR",
            "RL" => "RL",
            _ => "TD",
        }
    }

    /// The same settings with the tighter focus-view limits applied.
    pub fn focused(&self) -> DiagramConfig {
        DiagramConfig {
            max_nodes: self.focus_max_nodes,
            max_edges: self.focus_max_edges,
            ..self.clone()
        }
    }
}

impl Config {
    /// Load configuration from a `.diagrammer.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `diagrammer init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.diagrammer.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        for current in start.ancestors() {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            "failed to load config: {e:#}. Using defaults."
                        );
                        Self::default()
                    }
                };
            }
        }
        Self::default()
    }

    /// Diagram settings with analysis-level switches folded in.
    pub fn diagram_settings(&self) -> DiagramConfig {
        DiagramConfig {
            include_tests: self.analysis.include_tests,
            ..self.diagram.clone()
        }
    }

    /// Generate default TOML content for `diagrammer init`.
    pub fn default_toml() -> String {
        r#"# Diagrammer - Architecture Diagram Configuration

[project]
# Languages to scan: "typescript", "javascript", "python"
languages = ["javascript", "typescript"]
# Extra glob patterns to skip, on top of node_modules, dist, build, .git and coverage
exclude_patterns = []

[analysis]
include_tests = false
# Directory depth for discovery (0 = unlimited)
max_depth = 0

[layers]
# Path segments that place a file in a layer, first group wins
frontend = ["components", "pages", "views", "ui", "frontend", "client"]
backend = ["api", "routes", "controllers", "services", "backend", "server"]
data = ["models", "schemas", "database", "db", "data", "entities"]
infrastructure = ["config", "utils", "helpers", "middleware", "infrastructure"]

[diagram]
# Mermaid direction: TD, TB, BT, LR or RL
direction = "TD"
max_nodes = 25
max_edges = 60
max_groups = 8
max_per_group = 6
max_external_per_group = 5
focus_max_nodes = 15
focus_max_edges = 30
focus_modules = 5
"#
        .to_string()
    }
}
