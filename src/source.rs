//! Source descriptors and the resolver that turns them into raw trees.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use handlebars::Handlebars;
use serde_saphyr::Options;
use tracing::debug;

use crate::error::{DataError, DataResult};
use crate::tree::Tree;
use crate::value::Value;

/// File extension appended when resolving a named source against the base
/// directory.
const NAMED_SOURCE_EXTENSION: &str = "yml";

/// Describes where a tree of data comes from.
#[derive(Debug, Clone)]
pub enum Source {
    /// A literal value supplied by the caller. Only mapping-shaped values
    /// resolve; anything else fails with [`DataError::InvalidSourceKind`].
    Inline(Value),
    /// A file to read, render and parse.
    Path(Utf8PathBuf),
    /// A name resolved to `<base_dir>/<name>.yml` and then treated as a
    /// file path.
    Named(String),
}

impl Source {
    /// A literal in-memory source.
    #[must_use]
    pub fn inline(value: impl Into<Value>) -> Self {
        Self::Inline(value.into())
    }

    /// A file-path source.
    #[must_use]
    pub fn path(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// A named source, looked up under the resolver's base directory.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl From<Tree> for Source {
    fn from(tree: Tree) -> Self {
        Self::Inline(Value::Tree(tree))
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Self::Inline(value)
    }
}

impl From<&str> for Source {
    /// Strings are file paths, matching the descriptor contract.
    fn from(path: &str) -> Self {
        Self::Path(Utf8PathBuf::from(path))
    }
}

impl From<String> for Source {
    fn from(path: String) -> Self {
        Self::Path(Utf8PathBuf::from(path))
    }
}

impl From<Utf8PathBuf> for Source {
    fn from(path: Utf8PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Resolves [`Source`] descriptors into raw (accessor-free) trees.
///
/// File contents are rendered through handlebars against the resolver's
/// template context before being parsed as YAML, so documents may embed
/// `{{…}}` expressions. The base directory used by named sources is
/// explicit per-resolver state rather than a process-wide setting.
pub struct SourceResolver {
    base_dir: Option<Utf8PathBuf>,
    context: serde_json::Value,
    renderer: Handlebars<'static>,
}

impl SourceResolver {
    /// Creates a resolver with no base directory and an empty template
    /// context.
    #[must_use]
    pub fn new() -> Self {
        let mut renderer = Handlebars::new();
        // Rendered output is YAML, not HTML: context values must land in the
        // document verbatim.
        renderer.register_escape_fn(handlebars::no_escape);
        Self {
            base_dir: None,
            context: serde_json::Value::Null,
            renderer,
        }
    }

    /// Sets the base directory used to resolve [`Source::Named`]
    /// descriptors.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<Utf8PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Sets the data rendered into `{{…}}` template expressions.
    #[must_use]
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }

    /// Sets the base directory on an existing resolver, e.g. through
    /// [`crate::DataContainer::resolver_mut`].
    pub fn set_base_dir(&mut self, base_dir: impl Into<Utf8PathBuf>) {
        self.base_dir = Some(base_dir.into());
    }

    /// The configured base directory, when one has been set.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Utf8Path> {
        self.base_dir.as_deref()
    }

    /// Resolves a descriptor into a raw tree.
    ///
    /// # Errors
    ///
    /// - [`DataError::InvalidSourceKind`] for an inline value that is not a
    ///   mapping, or a document whose top level is not a mapping.
    /// - [`DataError::MissingBasePath`] for a named source without a
    ///   configured base directory.
    /// - [`DataError::FileRead`] when reading the file fails.
    /// - [`DataError::Parse`] when rendering or parsing fails.
    pub fn resolve(&self, source: &Source) -> DataResult<Tree> {
        match source {
            Source::Inline(Value::Tree(tree)) => Ok(tree.clone()),
            Source::Inline(other) => Err(DataError::InvalidSourceKind {
                found: other.kind().to_owned(),
            }),
            Source::Path(path) => self.load_file(path),
            Source::Named(name) => {
                let base = self
                    .base_dir
                    .as_ref()
                    .ok_or_else(|| DataError::MissingBasePath { name: name.clone() })?;
                let path = base.join(format!("{name}.{NAMED_SOURCE_EXTENSION}"));
                self.load_file(&path)
            }
        }
    }

    /// Resolves a descriptor and, when a namespace is given, extracts the
    /// sub-tree stored under that key.
    ///
    /// # Errors
    ///
    /// Everything [`SourceResolver::resolve`] reports, plus
    /// [`DataError::MissingNamespace`] when the namespace key is absent and
    /// [`DataError::InvalidSourceKind`] when it holds a non-mapping value.
    pub fn resolve_with_namespace(
        &self,
        source: &Source,
        namespace: Option<&str>,
    ) -> DataResult<Tree> {
        let resolved = self.resolve(source)?;
        match namespace {
            None => Ok(resolved),
            Some(key) => extract_namespace(&resolved, key),
        }
    }

    fn load_file(&self, path: &Utf8Path) -> DataResult<Tree> {
        debug!(%path, "loading data source file");
        let contents = std::fs::read_to_string(path).map_err(|source| DataError::FileRead {
            path: path.to_owned(),
            source,
        })?;
        let rendered = self
            .renderer
            .render_template(&contents, &self.context)
            .map_err(|err| DataError::parse(path, err))?;
        parse_document(path, &rendered)
    }
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SourceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceResolver")
            .field("base_dir", &self.base_dir)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Parses a rendered document into a tree.
///
/// Empty, whitespace-only and bare-null documents (including a lone `---`
/// document marker) all yield an empty tree rather than an error; any other
/// non-mapping top level is rejected.
fn parse_document(path: &Utf8Path, rendered: &str) -> DataResult<Tree> {
    let body = rendered.trim();
    if body.is_empty() || body == "---" {
        return Ok(Tree::new());
    }
    let mut options = Options::default();
    options.strict_booleans = true;
    let value: Value = serde_saphyr::from_str_with_options(body, options)
        .map_err(|err| DataError::parse(path, err.to_string()))?;
    match value {
        Value::Tree(tree) => Ok(tree),
        Value::Null => Ok(Tree::new()),
        // Parsers bridge an explicit empty document as an empty string.
        Value::String(text) if text.trim().is_empty() => Ok(Tree::new()),
        other => Err(DataError::parse(
            path,
            format!("top-level document is not a mapping, found {}", other.kind()),
        )),
    }
}

/// Returns the sub-tree stored under `namespace` in `resolved`.
///
/// # Errors
///
/// [`DataError::MissingNamespace`] when the key is absent;
/// [`DataError::InvalidSourceKind`] when the key holds a non-mapping value.
pub fn extract_namespace(resolved: &Tree, namespace: &str) -> DataResult<Tree> {
    match resolved.get(namespace) {
        Some(Value::Tree(sub)) => Ok(sub),
        Some(other) => Err(DataError::InvalidSourceKind {
            found: other.kind().to_owned(),
        }),
        None => Err(DataError::MissingNamespace {
            namespace: namespace.to_owned(),
        }),
    }
}
