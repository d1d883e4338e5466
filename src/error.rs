use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("input not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pattern document {} is not valid JSON: {source}", path.display())]
    PatternFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid ISO week '{0}', expected YYYY-Www")]
    InvalidWeek(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl InsightError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            InsightError::NotFound(path)
        } else {
            InsightError::Io { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
