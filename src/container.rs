//! The stateful facade that owns a tree and keeps it accessor-addressable.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::accessors::{Accessor, synthesize, synthesize_value};
use crate::error::DataResult;
use crate::merge::deep_merge;
use crate::source::{Source, SourceResolver};
use crate::tree::Tree;
use crate::value::Value;

/// Owns one backing [`Tree`] and the container-level accessor table over
/// its top-level keys.
///
/// Every `load`/`merge` resolves its source fully before touching container
/// state, deep-merges the result with the current tree (or an empty tree
/// for `load`), re-synthesizes accessors over the whole result and over the
/// container itself, and only then adopts the new tree. A failure therefore
/// never leaves the container partially mutated.
///
/// The container is single-owner by construction: the `Rc`-based tree
/// handles make it `!Send`/`!Sync`, so concurrent mutation must be
/// serialised by the caller.
pub struct DataContainer {
    resolver: SourceResolver,
    data: Tree,
    accessors: BTreeMap<String, Accessor>,
}

impl DataContainer {
    /// Creates an empty container with a default resolver (no base
    /// directory, empty template context).
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(SourceResolver::new())
    }

    /// Creates an empty container using `resolver` for source resolution.
    #[must_use]
    pub fn with_resolver(resolver: SourceResolver) -> Self {
        Self {
            resolver,
            data: Tree::new(),
            accessors: BTreeMap::new(),
        }
    }

    /// The resolver used for `load` and `merge`.
    #[must_use]
    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    /// Mutable access to the resolver, e.g. to configure a base directory
    /// after construction.
    pub fn resolver_mut(&mut self) -> &mut SourceResolver {
        &mut self.resolver
    }

    /// Clears the backing tree, then merges `source` into the now-empty
    /// tree. Returns a handle to the resulting tree.
    ///
    /// Resolution happens before the clear, so a failing source leaves the
    /// previous contents intact.
    ///
    /// # Errors
    ///
    /// Propagates every [`SourceResolver::resolve_with_namespace`] failure.
    pub fn load(
        &mut self,
        source: impl Into<Source>,
        namespace: Option<&str>,
    ) -> DataResult<Tree> {
        let incoming = self
            .resolver
            .resolve_with_namespace(&source.into(), namespace)?;
        self.adopt(deep_merge(&Tree::new(), &incoming));
        Ok(self.data.clone())
    }

    /// Deep-merges `source` into the current tree without clearing it.
    /// Returns a handle to the resulting tree.
    ///
    /// # Errors
    ///
    /// Propagates every [`SourceResolver::resolve_with_namespace`] failure.
    pub fn merge(
        &mut self,
        source: impl Into<Source>,
        namespace: Option<&str>,
    ) -> DataResult<Tree> {
        let incoming = self
            .resolver
            .resolve_with_namespace(&source.into(), namespace)?;
        self.adopt(deep_merge(&self.data, &incoming));
        Ok(self.data.clone())
    }

    /// Permissive index-style read of a top-level key.
    ///
    /// Returns `None` for an absent key; the strict counterpart is the
    /// synthesized accessor pair (see [`DataContainer::accessor`]) or
    /// [`DataContainer::fetch`]. The asymmetry is deliberate.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.get(key)
    }

    /// Strict read of a top-level key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DataError::KeyNotBound`] when the key is absent.
    pub fn fetch(&self, key: &str) -> DataResult<Value> {
        self.data.fetch(key)
    }

    /// Stores `value` under `key`.
    ///
    /// The value is first passed through the synthesizer so any mappings
    /// nested inside it (including inside sequences) become
    /// accessor-bearing, then a fresh accessor pair for `key` is bound onto
    /// both the container and the backing tree before the value is stored.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        synthesize_value(&value);
        self.data.bind_accessor(&key);
        self.accessors
            .insert(key.clone(), Accessor::bind(self.data.downgrade(), key.as_str()));
        self.data.insert(key, value);
    }

    /// The synthesized read/write pair for a top-level key, when one has
    /// been bound by a prior `load`/`merge`/`set`.
    #[must_use]
    pub fn accessor(&self, key: &str) -> Option<Accessor> {
        self.accessors.get(key).cloned()
    }

    /// The backing tree as a shared handle.
    ///
    /// Mutating the tree through this handle bypasses accessor synthesis;
    /// callers who do so re-run [`crate::synthesize`] themselves.
    #[must_use]
    pub fn tree(&self) -> Tree {
        self.data.clone()
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the backing tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Adopts a freshly merged tree: synthesizes accessors over all of it,
    /// rebuilds the container-level accessor table, and installs it as the
    /// backing tree. Accessors minted against the previous tree keep
    /// reading their orphaned snapshot and never observe the new one.
    fn adopt(&mut self, merged: Tree) {
        synthesize(&merged);
        self.accessors = merged
            .keys()
            .into_iter()
            .map(|key| {
                let accessor = Accessor::bind(merged.downgrade(), key.as_str());
                (key, accessor)
            })
            .collect();
        debug!(keys = merged.len(), "adopted merged tree");
        self.data = merged;
    }
}

impl Default for DataContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataContainer")
            .field("data", &self.data)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
