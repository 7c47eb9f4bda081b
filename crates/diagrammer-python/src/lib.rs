use anyhow::{Context, Result};
use regex::Captures;

use diagrammer_core::error::ScanError;
use diagrammer_core::patterns::{group, PatternSet};
use diagrammer_core::scanner::{LanguageScanner, ScanResult, DEFAULT_EXCLUDED_DIRS};
use diagrammer_core::types::{Component, ComponentKind, Dependency, Locality, Module};

const LANGUAGE: &str = "python";

/// Well-known standard-library and third-party modules treated as external.
const KNOWN_EXTERNAL_MODULES: &[&str] = &[
    "os", "sys", "json", "datetime", "typing", "collections", "itertools", "functools",
    "operator", "math", "random", "string", "re", "urllib", "http", "socket", "threading",
    "multiprocessing", "subprocess", "pandas", "numpy", "requests", "django", "flask", "fastapi",
    "sqlalchemy", "pytest", "unittest", "asyncio", "aiohttp",
];

const PYTHON_EXCLUDED_DIRS: &[&str] = &["__pycache__", "venv", "env", ".venv", ".env"];

/// Relative sources are local; so are bare names outside the known-external list.
///
/// Unknown third-party packages therefore come out local.
pub fn classify_module(module: &str) -> Locality {
    if module.starts_with('.')
        || (!module.contains('.') && !KNOWN_EXTERNAL_MODULES.contains(&module))
    {
        Locality::Local
    } else {
        Locality::External
    }
}

/// `(imported name, source module)`.
type Import = (String, String);

/// Names listed after `import`, with aliases, comments and parentheses stripped.
fn imported_items(list: &str) -> Vec<String> {
    list.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(|line| line.split(','))
        .map(|item| {
            item.trim()
                .trim_matches(|c: char| c == '(' || c == ')' || c == '\\')
                .split(" as ")
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

fn plain_import(caps: &Captures<'_>) -> Vec<Import> {
    group(caps, 1)
        .map(imported_items)
        .unwrap_or_default()
        .into_iter()
        .map(|module| (module.clone(), module))
        .collect()
}

fn from_import(caps: &Captures<'_>) -> Vec<Import> {
    let Some(module) = group(caps, 1) else {
        return Vec::new();
    };
    let list = group(caps, 2).or_else(|| group(caps, 3)).unwrap_or_default();
    imported_items(list)
        .into_iter()
        .map(|name| (name, module.to_string()))
        .collect()
}

fn name(caps: &Captures<'_>) -> Vec<String> {
    group(caps, 1).map(str::to_string).into_iter().collect()
}

/// Python scanner built from anchored, multi-line regex passes.
pub struct PythonScanner {
    imports: PatternSet<Import>,
    classes: PatternSet<String>,
    functions: PatternSet<String>,
    excluded_dirs: Vec<&'static str>,
}

impl PythonScanner {
    pub fn new() -> Result<Self> {
        let imports = PatternSet::new()
            .rule(r"(?m)^[ \t]*import[ \t]+([A-Za-z_][\w.]*(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*[A-Za-z_][\w.]*(?:[ \t]+as[ \t]+\w+)?)*)", plain_import)?
            .rule(
                r"(?m)^[ \t]*from[ \t]+(\.+[\w.]*|[A-Za-z_][\w.]*)[ \t]+import[ \t]+(?:\(([^)]*)\)|([^\n]+))",
                from_import,
            )
            .context("failed to compile import patterns")?;

        let classes = PatternSet::new()
            .rule(r"(?m)^[ \t]*class[ \t]+([A-Za-z_]\w*)", name)
            .context("failed to compile class pattern")?;

        let functions = PatternSet::new()
            .rule(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)", name)
            .context("failed to compile function pattern")?;

        let excluded_dirs = DEFAULT_EXCLUDED_DIRS
            .iter()
            .chain(PYTHON_EXCLUDED_DIRS)
            .copied()
            .collect();

        Ok(Self {
            imports,
            classes,
            functions,
            excluded_dirs,
        })
    }
}

impl LanguageScanner for PythonScanner {
    fn language(&self) -> &'static str {
        LANGUAGE
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn excluded_dirs(&self) -> &[&str] {
        &self.excluded_dirs
    }

    fn scan(&self, path: &str, content: &str) -> Result<ScanResult, ScanError> {
        let dependencies = self
            .imports
            .scan(content)
            .into_iter()
            .map(|(name, module)| Dependency {
                locality: classify_module(&module),
                name,
                from: module,
                path: path.to_string(),
                is_default: false,
            })
            .collect();

        let classes = self.classes.scan(content);
        let functions = self.functions.scan(content);

        let components = classes
            .iter()
            .map(|n| (n, ComponentKind::Class))
            .chain(functions.iter().map(|n| (n, ComponentKind::Function)))
            .map(|(n, kind)| Component::new(n, path, kind, LANGUAGE).exported(!n.starts_with('_')))
            .collect();

        let exports = classes.into_iter().chain(functions).collect();

        Ok(ScanResult {
            components,
            dependencies,
            modules: vec![Module::for_file(path, LANGUAGE, exports)],
        }
        .without_repeats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(path: &str, content: &str) -> ScanResult {
        PythonScanner::new().unwrap().scan(path, content).unwrap()
    }

    fn locality_of(result: &ScanResult, name: &str) -> Locality {
        result
            .dependencies
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.locality)
            .unwrap()
    }

    #[test]
    fn test_os_external_relative_local() {
        let result = scan("app/views.py", "import os\nfrom .utils import helper\n");
        assert_eq!(locality_of(&result, "os"), Locality::External);
        assert_eq!(locality_of(&result, "helper"), Locality::Local);
        let os = result.dependencies.iter().find(|d| d.name == "os").unwrap();
        assert_eq!(os.from, "os");
    }

    #[test]
    fn test_classification_rule() {
        assert_eq!(classify_module("numpy"), Locality::External);
        assert_eq!(classify_module(".models"), Locality::Local);
        assert_eq!(classify_module("..core.db"), Locality::Local);
        assert_eq!(classify_module("os.path"), Locality::External);
        // Unknown packages are treated as local.
        assert_eq!(classify_module("mylib"), Locality::Local);
    }

    #[test]
    fn test_from_import_items() {
        let content = "from typing import List, Dict as D  # types\nfrom .models import (\n    User,\n    Order,\n)\n";
        let result = scan("app/service.py", content);
        let deps: Vec<(&str, &str)> = result
            .dependencies
            .iter()
            .map(|d| (d.name.as_str(), d.from.as_str()))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("List", "typing"),
                ("Dict", "typing"),
                ("User", ".models"),
                ("Order", ".models"),
            ]
        );
    }

    #[test]
    fn test_plain_import_list() {
        let result = scan("main.py", "import os, sys as system\nimport numpy as np\n");
        let names: Vec<_> = result.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["os", "sys", "numpy"]);
        assert!(result.dependencies.iter().all(|d| d.is_external()));
    }

    #[test]
    fn test_classes_and_functions() {
        let content = r#"
@dataclass
class UserService:
    async def load(self):
        pass

    def _cache(self):
        pass

def main():
    pass
"#;
        let result = scan("app/services/user_service.py", content);
        let found: Vec<(&str, ComponentKind)> = result
            .components
            .iter()
            .map(|c| (c.name.as_str(), c.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                ("UserService", ComponentKind::Class),
                ("load", ComponentKind::Function),
                ("_cache", ComponentKind::Function),
                ("main", ComponentKind::Function),
            ]
        );
        let module = &result.modules[0];
        assert_eq!(module.name, "user_service");
        assert_eq!(module.exports, vec!["UserService", "load", "_cache", "main"]);
    }

    #[test]
    fn test_excludes_virtualenvs() {
        let scanner = PythonScanner::new().unwrap();
        assert!(scanner.accepts("app/models.py"));
        assert!(!scanner.accepts("venv/lib/site.py"));
        assert!(!scanner.accepts("app/__pycache__/x.py"));
        assert!(!scanner.accepts("node_modules/x.py"));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let content = "import os\nclass A:\n    pass\n";
        assert_eq!(scan("a.py", content), scan("a.py", content));
    }
}
