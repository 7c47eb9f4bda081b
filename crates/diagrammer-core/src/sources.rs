use std::collections::BTreeMap;
use std::path::Path;

use tokio::task::JoinSet;

use crate::error::ScanError;

/// File contents keyed by repo-relative path, iterated in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    files: BTreeMap<String, String>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for SourceSet {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut set = SourceSet::new();
        for (path, content) in iter {
            set.insert(path, content);
        }
        set
    }
}

/// Read every file concurrently and wait for all of them.
///
/// Each read is its own task on a `JoinSet`; results are merged by this
/// function alone once every task has finished. A file that cannot be read is
/// logged and left out.
pub async fn load_sources(root: &Path, paths: Vec<String>) -> SourceSet {
    let mut reads = JoinSet::new();
    for rel in paths {
        let full = root.join(&rel);
        reads.spawn(async move {
            let result = tokio::fs::read_to_string(&full)
                .await
                .map_err(|source| ScanError::Read { path: full, source });
            (rel, result)
        });
    }

    let mut sources = SourceSet::new();
    while let Some(joined) = reads.join_next().await {
        match joined {
            Ok((rel, Ok(content))) => sources.insert(rel, content),
            Ok((_, Err(e))) => tracing::warn!("{e}"),
            Err(e) => tracing::warn!("source read task failed: {e}"),
        }
    }
    tracing::debug!(count = sources.len(), "loaded sources");
    sources
}
