//! Per-key read/write accessor pairs and the recursive synthesizer that
//! binds them over a tree.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use tracing::trace;

use crate::error::{DataError, DataResult};
use crate::tree::{Tree, TreeNode};
use crate::value::Value;

/// A read/write capability pair bound to one `(host tree, key)`.
///
/// The accessor holds a weak handle to its host node, so reads always
/// reflect the backing tree at read time rather than a cached value.
/// [`Accessor::get`] is strict: it fails with [`DataError::KeyNotBound`]
/// when the key has since been removed, and likewise when the host node
/// itself has been dropped or replaced by a merge (accessors never read
/// through to a replacement tree).
#[derive(Clone)]
pub struct Accessor {
    host: Weak<RefCell<TreeNode>>,
    key: String,
}

impl Accessor {
    pub(crate) fn bind(host: Weak<RefCell<TreeNode>>, key: impl Into<String>) -> Self {
        Self {
            host,
            key: key.into(),
        }
    }

    /// The key this pair is bound to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Strict read of the bound key from the host tree.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::KeyNotBound`] when the key is no longer present
    /// or the host tree no longer exists.
    pub fn get(&self) -> DataResult<Value> {
        let node = self
            .host
            .upgrade()
            .ok_or_else(|| DataError::key_not_bound(&self.key))?;
        let value = node.borrow().entries.get(&self.key).cloned();
        value.ok_or_else(|| DataError::key_not_bound(&self.key))
    }

    /// Writes a new value under the bound key.
    ///
    /// The value is first passed through the synthesizer, so any mappings
    /// nested inside it (including inside sequences) become accessor-bearing
    /// before they are stored.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::KeyNotBound`] when the host tree no longer
    /// exists.
    pub fn set(&self, value: impl Into<Value>) -> DataResult<()> {
        let value = value.into();
        synthesize_value(&value);
        let node = self
            .host
            .upgrade()
            .ok_or_else(|| DataError::key_not_bound(&self.key))?;
        node.borrow_mut().entries.insert(self.key.clone(), value);
        Ok(())
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("key", &self.key)
            .field("host_alive", &(self.host.strong_count() > 0))
            .finish()
    }
}

/// Binds an accessor pair for every key of `tree`, then recurses into every
/// reachable mapping: tree-valued entries, and tree elements found inside
/// sequence-valued entries (at any nesting depth).
///
/// Scalars and the sequences themselves are inspected but receive no
/// accessors; only mapping nodes carry accessor tables. Terminates on any
/// finite acyclic tree.
pub fn synthesize(tree: &Tree) {
    trace!(keys = tree.len(), "synthesizing accessors");
    for (key, value) in tree.entries() {
        tree.bind_accessor(&key);
        synthesize_value(&value);
    }
}

/// Applies [`synthesize`] to every mapping reachable from `value`,
/// recursing through nested sequences.
pub fn synthesize_value(value: &Value) {
    match value {
        Value::Tree(tree) => synthesize(tree),
        Value::Sequence(elements) => {
            for element in elements {
                synthesize_value(element);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::synthesize;
    use crate::error::DataError;
    use crate::tree::Tree;
    use crate::value::Value;
    use anyhow::{Result, bail, ensure};
    use rstest::rstest;
    use serde_json::json;

    fn tree_from(json: serde_json::Value) -> Result<Tree> {
        Tree::try_from(json).map_err(anyhow::Error::from)
    }

    #[rstest]
    fn reads_reflect_the_tree_at_read_time() -> Result<()> {
        let tree = tree_from(json!({"a": 1}))?;
        synthesize(&tree);
        let accessor = tree.accessor("a").ok_or_else(|| anyhow::anyhow!("unbound"))?;
        ensure!(accessor.key() == "a", "accessor bound to the wrong key");

        ensure!(accessor.get()? == Value::from(1i64), "initial read wrong");
        tree.insert("a", 2i64);
        ensure!(accessor.get()? == Value::from(2i64), "read was cached, not live");
        Ok(())
    }

    #[rstest]
    fn strict_read_fails_after_removal() -> Result<()> {
        let tree = tree_from(json!({"a": 1}))?;
        synthesize(&tree);
        let accessor = tree.accessor("a").ok_or_else(|| anyhow::anyhow!("unbound"))?;

        tree.remove("a");
        let err = accessor.get().err();
        ensure!(
            matches!(err, Some(DataError::KeyNotBound { ref key }) if key == "a"),
            "expected KeyNotBound, got {err:?}"
        );
        Ok(())
    }

    #[rstest]
    fn dropped_host_fails_without_panicking() -> Result<()> {
        let accessor = {
            let tree = tree_from(json!({"a": 1}))?;
            synthesize(&tree);
            tree.accessor("a").ok_or_else(|| anyhow::anyhow!("unbound"))?
        };
        ensure!(
            matches!(accessor.get(), Err(DataError::KeyNotBound { .. })),
            "expected KeyNotBound after the host was dropped"
        );
        Ok(())
    }

    #[rstest]
    fn writes_synthesize_onto_the_new_value() -> Result<()> {
        let tree = tree_from(json!({"items": null}))?;
        synthesize(&tree);
        let accessor = tree
            .accessor("items")
            .ok_or_else(|| anyhow::anyhow!("unbound"))?;

        let nested = Value::from(json!([{"name": "x"}]));
        accessor.set(nested)?;

        let Some(Value::Sequence(elements)) = tree.get("items") else {
            bail!("expected a sequence under 'items'");
        };
        let Some(Value::Tree(element)) = elements.first().cloned() else {
            bail!("expected a mapping element");
        };
        let name = element
            .accessor("name")
            .ok_or_else(|| anyhow::anyhow!("nested mapping not synthesized"))?;
        ensure!(name.get()? == Value::from("x"), "nested accessor read wrong");
        Ok(())
    }

    #[rstest]
    fn synthesis_recurses_through_nested_sequences() -> Result<()> {
        let tree = tree_from(json!({"grid": [[{"cell": 1}]]}))?;
        synthesize(&tree);

        let Some(Value::Sequence(rows)) = tree.get("grid") else {
            bail!("expected a sequence under 'grid'");
        };
        let Some(Value::Sequence(row)) = rows.first().cloned() else {
            bail!("expected a nested sequence");
        };
        let Some(Value::Tree(cell)) = row.first().cloned() else {
            bail!("expected a mapping element");
        };
        ensure!(
            cell.accessor("cell").is_some(),
            "mapping inside nested sequence was not synthesized"
        );
        Ok(())
    }
}
