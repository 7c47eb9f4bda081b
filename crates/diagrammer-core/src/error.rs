use std::path::PathBuf;

use thiserror::Error;

/// Failure while scanning a single source file.
///
/// Scan errors never abort a batch: the codebase analyzer logs them and treats
/// the file as contributing nothing.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid scanner pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    pub fn parse(path: &str, message: impl Into<String>) -> Self {
        ScanError::Parse {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
