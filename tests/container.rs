//! Container behaviour: merge semantics, load-clears-state, accessor and
//! index equivalence, and failure ordering.

use anyhow::{Result, anyhow, bail, ensure};
use data_accessible::{DataContainer, DataError, Source, Tree, Value};
use rstest::rstest;
use serde_json::json;

mod common;
use common::tree_from;

#[rstest]
fn disjoint_merges_commute() -> Result<()> {
    let first = tree_from(json!({"a": 1}))?;
    let second = tree_from(json!({"b": 2}))?;

    let mut forward = DataContainer::new();
    forward.merge(first.clone(), None)?;
    forward.merge(second.clone(), None)?;

    let mut reverse = DataContainer::new();
    reverse.merge(second, None)?;
    reverse.merge(first, None)?;

    let expected = json!({"a": 1, "b": 2});
    ensure!(forward.tree().to_json() == expected, "forward order wrong");
    ensure!(reverse.tree().to_json() == expected, "reverse order wrong");
    Ok(())
}

#[rstest]
fn nested_merge_overrides_without_discarding_siblings() -> Result<()> {
    let mut container = DataContainer::new();
    container.load(tree_from(json!({"a": {"x": 1, "y": 2}}))?, None)?;
    container.merge(tree_from(json!({"a": {"y": 9, "z": 3}}))?, None)?;

    ensure!(
        container.tree().to_json() == json!({"a": {"x": 1, "y": 9, "z": 3}}),
        "got {:?}",
        container.tree().to_json()
    );
    Ok(())
}

#[rstest]
fn load_clears_prior_state() -> Result<()> {
    let mut container = DataContainer::new();
    container.load(tree_from(json!({"a": 1}))?, None)?;
    container.load(tree_from(json!({"b": 2}))?, None)?;

    ensure!(
        container.tree().to_json() == json!({"b": 2}),
        "load did not clear prior contents: {:?}",
        container.tree().to_json()
    );
    Ok(())
}

#[rstest]
fn empty_source_load_yields_an_empty_tree() -> Result<()> {
    let mut container = DataContainer::new();
    let result = container.load(Tree::new(), None)?;
    ensure!(result.is_empty(), "expected an empty tree");
    Ok(())
}

#[rstest]
fn namespace_selects_a_sub_tree_before_merging() -> Result<()> {
    let mut container = DataContainer::new();
    container.merge(tree_from(json!({"config": {"data": "x"}}))?, Some("config"))?;
    ensure!(
        container.tree().to_json() == json!({"data": "x"}),
        "namespace extraction failed: {:?}",
        container.tree().to_json()
    );
    Ok(())
}

#[rstest]
fn accessor_and_index_reads_agree_after_set() -> Result<()> {
    let mut container = DataContainer::new();
    let value = Value::from(json!({"n": 1}));
    container.set("k", value.deep_clone());

    let indexed = container
        .get("k")
        .ok_or_else(|| anyhow!("index read missed the key"))?;
    let accessor = container
        .accessor("k")
        .ok_or_else(|| anyhow!("no accessor bound for 'k'"))?;
    ensure!(indexed == value, "index read returned a different value");
    ensure!(accessor.get()? == value, "accessor read returned a different value");
    Ok(())
}

#[rstest]
fn accessor_writes_are_visible_to_index_reads_and_vice_versa() -> Result<()> {
    let mut container = DataContainer::new();
    container.set("k", 1i64);
    let accessor = container
        .accessor("k")
        .ok_or_else(|| anyhow!("no accessor bound for 'k'"))?;

    accessor.set(5i64)?;
    ensure!(
        container.get("k") == Some(Value::from(5i64)),
        "index read missed an accessor write"
    );

    container.set("k", 7i64);
    ensure!(
        accessor.get()? == Value::from(7i64),
        "accessor read missed an index write"
    );
    Ok(())
}

#[rstest]
fn set_synthesizes_through_sequences() -> Result<()> {
    let mut container = DataContainer::new();
    container.set("items", Value::from(json!([{"name": "x"}])));

    let Some(Value::Sequence(elements)) = container.get("items") else {
        bail!("expected a sequence under 'items'");
    };
    let Some(Value::Tree(element)) = elements.first().cloned() else {
        bail!("expected a mapping element");
    };
    let name = element
        .accessor("name")
        .ok_or_else(|| anyhow!("nested mapping has no accessor for 'name'"))?;
    ensure!(name.get()? == Value::from("x"), "nested accessor read wrong");
    Ok(())
}

#[rstest]
fn merge_synthesizes_over_the_entire_resulting_tree() -> Result<()> {
    let mut container = DataContainer::new();
    container.load(tree_from(json!({"a": {"x": 1}}))?, None)?;
    container.merge(tree_from(json!({"a": {"y": 2}, "b": [{"c": 3}]}))?, None)?;

    let Some(Value::Tree(nested)) = container.get("a") else {
        bail!("expected a mapping under 'a'");
    };
    ensure!(nested.accessor("x").is_some(), "preserved key lost its accessor");
    ensure!(nested.accessor("y").is_some(), "merged key got no accessor");

    let Some(Value::Sequence(elements)) = container.get("b") else {
        bail!("expected a sequence under 'b'");
    };
    let Some(Value::Tree(element)) = elements.first().cloned() else {
        bail!("expected a mapping element");
    };
    ensure!(
        element.accessor("c").is_some(),
        "mapping inside a merged sequence got no accessor"
    );
    Ok(())
}

#[rstest]
fn failed_resolution_leaves_state_unmodified() -> Result<()> {
    let mut container = DataContainer::new();
    container.load(tree_from(json!({"a": 1}))?, None)?;

    let err = container.merge(Source::inline(Value::from(100i64)), None).err();
    ensure!(
        matches!(err, Some(DataError::InvalidSourceKind { .. })),
        "expected InvalidSourceKind, got {err:?}"
    );
    ensure!(
        container.tree().to_json() == json!({"a": 1}),
        "failed merge mutated the container"
    );

    let missing = container
        .merge(tree_from(json!({"other": {}}))?, Some("config"))
        .err();
    ensure!(
        matches!(missing, Some(DataError::MissingNamespace { ref namespace }) if namespace == "config"),
        "expected MissingNamespace, got {missing:?}"
    );
    ensure!(
        container.tree().to_json() == json!({"a": 1}),
        "failed namespace merge mutated the container"
    );
    Ok(())
}

#[rstest]
fn fetch_is_strict_where_get_is_permissive() -> Result<()> {
    let container = DataContainer::new();
    ensure!(container.get("missing").is_none(), "get should be permissive");
    ensure!(
        matches!(container.fetch("missing"), Err(DataError::KeyNotBound { .. })),
        "fetch should fail strictly"
    );
    Ok(())
}

#[rstest]
fn merges_replace_cleanly_leaving_old_accessors_on_the_snapshot() -> Result<()> {
    let mut container = DataContainer::new();
    container.load(tree_from(json!({"a": 1}))?, None)?;

    let snapshot = container.tree();
    let old_accessor = container
        .accessor("a")
        .ok_or_else(|| anyhow!("no accessor bound for 'a'"))?;

    container.merge(tree_from(json!({"a": 2}))?, None)?;

    // The old accessor still reads the orphaned snapshot, never the new tree.
    ensure!(
        old_accessor.get()? == Value::from(1i64),
        "old accessor read through to the new tree"
    );
    ensure!(
        container.fetch("a")? == Value::from(2i64),
        "container did not adopt the merged value"
    );

    // Once the snapshot is gone the accessor fails strictly instead of
    // returning stale data.
    drop(snapshot);
    ensure!(
        matches!(old_accessor.get(), Err(DataError::KeyNotBound { .. })),
        "dangling accessor should fail with KeyNotBound"
    );
    Ok(())
}

#[rstest]
fn direct_tree_mutation_bypasses_synthesis_until_rerun() -> Result<()> {
    let mut container = DataContainer::new();
    container.load(tree_from(json!({"a": 1}))?, None)?;

    let tree = container.tree();
    tree.insert("b", 2i64);
    ensure!(tree.accessor("b").is_none(), "raw insert should not synthesize");

    data_accessible::synthesize(&tree);
    let accessor = tree
        .accessor("b")
        .ok_or_else(|| anyhow!("re-synthesis did not bind 'b'"))?;
    ensure!(accessor.get()? == Value::from(2i64), "re-bound accessor read wrong");
    Ok(())
}
