//! Deep structural merging of two trees.

use crate::tree::Tree;
use crate::value::Value;

/// Combines `incoming` over `original` key-wise, returning a new tree.
///
/// When a key holds a mapping in both inputs the mappings are merged
/// recursively; in every other case (scalars, sequences, and
/// mapping-versus-non-mapping conflicts) the incoming value wins outright,
/// with no recursion into sequences. Keys present only in `original`
/// are preserved unchanged.
///
/// Both inputs are treated as immutable: the result is built from fresh
/// nodes and shares no storage with either argument, so trees aliased
/// elsewhere are never disturbed. The result carries no accessors; callers
/// re-run [`crate::synthesize`] after adopting it.
#[must_use]
pub fn deep_merge(original: &Tree, incoming: &Tree) -> Tree {
    let merged = original.deep_clone();
    for (key, value) in incoming.entries() {
        let combined = match (merged.get(&key), &value) {
            (Some(Value::Tree(existing)), Value::Tree(overlay)) => {
                Value::Tree(deep_merge(&existing, overlay))
            }
            _ => value.deep_clone(),
        };
        merged.insert(key, combined);
    }
    merged
}
