use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::types::{Component, Dependency, Module};

/// Directories never scanned for any language.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["node_modules", "dist", "build", ".git", "coverage"];

/// Everything one scanner extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub components: Vec<Component>,
    pub dependencies: Vec<Dependency>,
    pub modules: Vec<Module>,
}

impl ScanResult {
    pub fn extend(&mut self, other: ScanResult) {
        self.components.extend(other.components);
        self.dependencies.extend(other.dependencies);
        self.modules.extend(other.modules);
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.dependencies.is_empty() && self.modules.is_empty()
    }

    /// Drop exact repeats from one file's extraction, keeping first-seen order.
    pub fn without_repeats(mut self) -> Self {
        drop_repeats(&mut self.components);
        drop_repeats(&mut self.dependencies);
        drop_repeats(&mut self.modules);
        self
    }
}

fn drop_repeats<T: PartialEq>(items: &mut Vec<T>) {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !kept.contains(&item) {
            kept.push(item);
        }
    }
    *items = kept;
}

/// Capability each supported language provides.
pub trait LanguageScanner: Send + Sync {
    /// Language identifier (e.g., "typescript", "python")
    fn language(&self) -> &'static str;

    /// File extensions this scanner handles, without the dot.
    fn file_extensions(&self) -> &[&str];

    /// Directory names whose contents are never scanned.
    fn excluded_dirs(&self) -> &[&str] {
        DEFAULT_EXCLUDED_DIRS
    }

    /// Whether a repo-relative path belongs to this scanner.
    fn accepts(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        let mut segments: Vec<&str> = normalized.split('/').collect();
        let Some(file_name) = segments.pop() else {
            return false;
        };
        if segments.iter().any(|s| self.excluded_dirs().contains(s)) {
            return false;
        }
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self.file_extensions().contains(&ext),
            _ => false,
        }
    }

    /// Extract components, dependencies and the module record from one file.
    fn scan(&self, path: &str, content: &str) -> Result<ScanResult, ScanError>;
}

/// Scanners keyed by language identifier.
#[derive(Default)]
pub struct ScannerRegistry {
    scanners: BTreeMap<&'static str, Box<dyn LanguageScanner>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scanner: Box<dyn LanguageScanner>) {
        self.scanners.insert(scanner.language(), scanner);
    }

    pub fn with(mut self, scanner: Box<dyn LanguageScanner>) -> Self {
        self.register(scanner);
        self
    }

    /// Look up a scanner; the identifier is trimmed and lowercased first.
    pub fn get(&self, language: &str) -> Option<&dyn LanguageScanner> {
        let key = language.trim().to_ascii_lowercase();
        self.scanners.get(key.as_str()).map(|s| s.as_ref())
    }

    pub fn languages(&self) -> Vec<&'static str> {
        self.scanners.keys().copied().collect()
    }

    /// Scanners for the requested languages, unknown identifiers skipped.
    pub fn select(&self, languages: &[String]) -> Vec<&dyn LanguageScanner> {
        let mut selected: Vec<&dyn LanguageScanner> = Vec::new();
        for language in languages {
            match self.get(language) {
                Some(scanner) => {
                    if !selected.iter().any(|s| s.language() == scanner.language()) {
                        selected.push(scanner);
                    }
                }
                None => tracing::debug!(language = %language, "no scanner registered, skipping"),
            }
        }
        selected
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}
