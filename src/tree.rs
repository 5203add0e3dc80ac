//! The shared-handle `Tree` type backing every mapping node.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::accessors::{Accessor, synthesize_value};
use crate::error::{DataError, DataResult};
use crate::value::Value;

/// Backing storage for one mapping node: its entries plus the accessor
/// table synthesized over them.
pub(crate) struct TreeNode {
    pub(crate) entries: BTreeMap<String, Value>,
    pub(crate) accessors: BTreeMap<String, Accessor>,
}

/// A mapping from string keys to [`Value`]s, held behind a shared handle.
///
/// Cloning a `Tree` clones the handle, not the node: clones alias the same
/// storage, so a write through any handle (or through a synthesized
/// [`Accessor`]) is immediately visible through every other handle. Use
/// [`Tree::deep_clone`] for an independent copy.
///
/// Reads come in two flavours, mirroring the container API: [`Tree::get`]
/// is a permissive index-style lookup returning `Option`, while
/// [`Tree::fetch`] is strict and fails with [`DataError::KeyNotBound`].
pub struct Tree {
    node: Rc<RefCell<TreeNode>>,
}

impl Tree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            node: Rc::new(RefCell::new(TreeNode {
                entries: BTreeMap::new(),
                accessors: BTreeMap::new(),
            })),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<TreeNode>> {
        Rc::downgrade(&self.node)
    }

    /// Permissive index-style read: `None` when the key is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.node.borrow().entries.get(key).cloned()
    }

    /// Strict read: fails with [`DataError::KeyNotBound`] when the key is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::KeyNotBound`] if `key` is not present.
    pub fn fetch(&self, key: &str) -> DataResult<Value> {
        self.get(key).ok_or_else(|| DataError::key_not_bound(key))
    }

    /// Stores `value` under `key` without synthesizing accessors.
    ///
    /// This is the raw mutation path; callers who want the invariant that
    /// every reachable mapping is accessor-bearing should use [`Tree::set`]
    /// or re-run [`crate::synthesize`] afterwards.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.node.borrow_mut().entries.insert(key.into(), value.into());
    }

    /// Stores `value` under `key`, first synthesizing accessors onto the
    /// value (recursively, including mappings inside sequences) and binding
    /// the read/write pair for `key` onto this tree.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        synthesize_value(&value);
        self.bind_accessor(&key);
        self.node.borrow_mut().entries.insert(key, value);
    }

    /// Removes `key`, returning its value when present.
    ///
    /// Like [`Tree::insert`] this bypasses accessor maintenance; an accessor
    /// previously bound to the key stays bound and will report
    /// [`DataError::KeyNotBound`] on its next read.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.node.borrow_mut().entries.remove(key)
    }

    /// Returns `true` when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.node.borrow().entries.contains_key(key)
    }

    /// The keys currently present, in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.node.borrow().entries.keys().cloned().collect()
    }

    /// Snapshot of the current entries as `(key, value)` pairs.
    ///
    /// Values are handle clones: tree-valued entries still alias their
    /// nodes.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.node
            .borrow()
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Number of keys in this mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.node.borrow().entries.len()
    }

    /// Returns `true` when the mapping has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node.borrow().entries.is_empty()
    }

    /// The synthesized read/write pair for `key`, when one has been bound.
    #[must_use]
    pub fn accessor(&self, key: &str) -> Option<Accessor> {
        self.node.borrow().accessors.get(key).cloned()
    }

    /// Binds (or rebinds) the accessor pair for `key` onto this tree.
    pub(crate) fn bind_accessor(&self, key: &str) {
        let accessor = Accessor::bind(self.downgrade(), key);
        self.node
            .borrow_mut()
            .accessors
            .insert(key.to_owned(), accessor);
    }

    /// Produces a structurally independent copy of this tree.
    ///
    /// The copy is built from fresh nodes with empty accessor tables;
    /// callers re-synthesize when accessors are needed.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        let copy = Self::new();
        for (key, value) in self.entries() {
            copy.insert(key, value.deep_clone());
        }
        copy
    }

    /// Converts this tree into a [`serde_json::Value::Object`], deep-copying
    /// nested nodes.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries()
            .into_iter()
            .map(|(key, value)| (key, value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Tree {
    /// Clones the handle: the clone aliases the same node.
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl PartialEq for Tree {
    /// Structural equality over entries; accessor tables are ignored.
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.node, &other.node) {
            return true;
        }
        self.node.borrow().entries == other.node.borrow().entries
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.node.borrow().entries.iter())
            .finish()
    }
}

impl FromIterator<(String, Value)> for Tree {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let tree = Self::new();
        for (key, value) in iter {
            tree.insert(key, value);
        }
        tree
    }
}

impl TryFrom<serde_json::Value> for Tree {
    type Error = DataError;

    /// Converts a JSON document into a tree; only objects qualify.
    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match Value::from(json) {
            Value::Tree(tree) => Ok(tree),
            other => Err(DataError::InvalidSourceKind {
                found: other.kind().to_owned(),
            }),
        }
    }
}

impl Serialize for Tree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.node.borrow().entries.iter())
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::try_from(json).map_err(serde::de::Error::custom)
    }
}
