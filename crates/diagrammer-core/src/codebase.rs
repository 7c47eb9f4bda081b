use crate::scanner::{ScanResult, ScannerRegistry};
use crate::sources::SourceSet;
use crate::types::{deduplicate, Analysis};

/// Fans sources out to the registered scanners and merges what they find.
pub struct CodebaseAnalyzer {
    registry: ScannerRegistry,
}

impl CodebaseAnalyzer {
    pub fn new(registry: ScannerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ScannerRegistry {
        &self.registry
    }

    /// Scan every source accepted by a requested language's scanner.
    ///
    /// Unknown languages are skipped. A file whose scan fails is logged and
    /// contributes nothing. Components, dependencies and modules are
    /// deduplicated by `(type, name, path)` keeping first-seen order.
    pub fn analyze_codebase(&self, sources: &SourceSet, languages: &[String]) -> Analysis {
        let mut merged = ScanResult::default();

        for scanner in self.registry.select(languages) {
            let mut scanned = 0usize;
            for (path, content) in sources.iter().filter(|(p, _)| scanner.accepts(p)) {
                match scanner.scan(path, content) {
                    Ok(result) => merged.extend(result),
                    Err(e) => tracing::warn!(language = scanner.language(), "{e}"),
                }
                scanned += 1;
            }
            tracing::debug!(language = scanner.language(), files = scanned, "scanned language");
        }

        Analysis {
            components: deduplicate(merged.components),
            dependencies: deduplicate(merged.dependencies),
            modules: deduplicate(merged.modules),
            ..Analysis::default()
        }
    }
}
