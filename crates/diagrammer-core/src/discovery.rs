use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::scanner::{LanguageScanner, DEFAULT_EXCLUDED_DIRS};

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(pattern = %pattern, "ignoring invalid exclude pattern: {e}"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("failed to compile exclude patterns: {e}");
        GlobSet::empty()
    })
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| DEFAULT_EXCLUDED_DIRS.contains(&name))
}

/// Repo-relative path with `/` separators.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Find every file under `root` that one of `scanners` accepts.
///
/// Walks in sorted order, prunes the fixed exclusion directories and skips
/// anything matching `project.exclude_patterns`. Paths come back relative to
/// `root`, sorted, each listed once.
pub fn discover_files(root: &Path, scanners: &[&dyn LanguageScanner], config: &Config) -> Vec<String> {
    let excluded = build_globset(&config.project.exclude_patterns);
    let mut walker = WalkDir::new(root).sort_by_file_name();
    if config.analysis.max_depth > 0 {
        walker = walker.max_depth(config.analysis.max_depth);
    }

    let mut files: Vec<String> = walker
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| relative_path(root, e.path()))
        .filter(|rel| !excluded.is_match(rel))
        .filter(|rel| scanners.iter().any(|s| s.accepts(rel)))
        .collect();

    files.sort();
    files.dedup();
    tracing::debug!(count = files.len(), root = %root.display(), "discovered source files");
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::tests::LineScanner;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "class A").unwrap();
    }

    #[test]
    fn test_discovers_accepted_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/b.fk");
        touch(dir.path(), "src/a.fk");
        touch(dir.path(), "src/readme.md");
        let scanner = LineScanner;
        let files = discover_files(dir.path(), &[&scanner], &Config::default());
        assert_eq!(files, vec!["src/a.fk", "src/b.fk"]);
    }

    #[test]
    fn test_prunes_fixed_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "node_modules/lib/index.fk");
        touch(dir.path(), "dist/out.fk");
        touch(dir.path(), "src/keep.fk");
        let scanner = LineScanner;
        let files = discover_files(dir.path(), &[&scanner], &Config::default());
        assert_eq!(files, vec!["src/keep.fk"]);
    }

    #[test]
    fn test_config_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/keep.fk");
        touch(dir.path(), "src/generated/skip.fk");
        let mut config = Config::default();
        config.project.exclude_patterns = vec!["**/generated/**".to_string(), "[".to_string()];
        let scanner = LineScanner;
        let files = discover_files(dir.path(), &[&scanner], &config);
        assert_eq!(files, vec!["src/keep.fk"]);
    }

    #[test]
    fn test_max_depth_limits_walk() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "top.fk");
        touch(dir.path(), "a/b/c/deep.fk");
        let mut config = Config::default();
        config.analysis.max_depth = 2;
        let scanner = LineScanner;
        let files = discover_files(dir.path(), &[&scanner], &config);
        assert_eq!(files, vec!["top.fk"]);
    }
}
