use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, writing or validating message catalogs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file or directory could not be read or written.
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but does not contain valid JSON.
    #[error("failed to parse JSON from '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The JSON document parsed, but its root is not an object.
    #[error("invalid message file '{}': root must be an object", path.display())]
    NotAnObject { path: PathBuf },
    /// A locale code failed BCP 47 validation.
    #[error("invalid locale code '{0}'")]
    InvalidLocale(String),
    /// A locale code is not part of the registry.
    #[error("unknown locale '{0}'")]
    UnknownLocale(String),
    /// Serializing a tree back to JSON failed.
    #[error("failed to serialize messages: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
