//! Error types produced by the data loading and accessor machinery.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used by every fallible operation in this crate.
pub type DataResult<T> = Result<T, DataError>;

/// Errors that can occur while resolving sources or reading through
/// accessors.
///
/// All failures are synchronous and surface to the immediate caller; no
/// operation is retried internally, and no error leaves a container
/// partially mutated.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataError {
    /// The source descriptor (or an inline value standing in for one) is not
    /// a kind the resolver recognises as mapping-shaped data.
    #[error("invalid data source: expected a mapping, found {found}")]
    InvalidSourceKind {
        /// Kind of the offending value, e.g. `"string"` or `"sequence"`.
        found: String,
    },

    /// A namespace key was requested but is absent from the resolved source.
    #[error("namespace '{namespace}' not present in resolved source")]
    MissingNamespace {
        /// The namespace key that was requested.
        namespace: String,
    },

    /// A named source was used before the resolver was given a base
    /// directory to resolve names against.
    #[error("cannot resolve named source '{name}': no base directory configured")]
    MissingBasePath {
        /// Name of the source that could not be resolved.
        name: String,
    },

    /// Reading a source file failed.
    #[error("failed to read '{path}': {source}")]
    FileRead {
        /// Path that triggered the read failure.
        path: Utf8PathBuf,
        /// Underlying I/O error, propagated untranslated.
        #[source]
        source: std::io::Error,
    },

    /// Rendering or parsing a source document failed.
    #[error("failed to parse '{path}': {source}")]
    Parse {
        /// Path of the document that failed to render or parse.
        path: Utf8PathBuf,
        /// Underlying error reported by the templating or YAML collaborator.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A strict accessor read found its key no longer present (or its host
    /// tree no longer alive).
    #[error("key '{key}' is not bound in the backing tree")]
    KeyNotBound {
        /// The key the accessor was bound to.
        key: String,
    },
}

impl DataError {
    /// Construct a [`DataError::Parse`] for a document path.
    #[must_use]
    pub fn parse(
        path: impl Into<Utf8PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Construct a [`DataError::KeyNotBound`] for a key name.
    #[must_use]
    pub fn key_not_bound(key: impl Into<String>) -> Self {
        Self::KeyNotBound { key: key.into() }
    }
}
