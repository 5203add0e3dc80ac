//! Shared fixtures for integration tests.

use anyhow::{Result, anyhow};
use camino::Utf8PathBuf;
use data_accessible::Tree;
use tempfile::TempDir;

/// Builds a [`Tree`] from a JSON literal, mapping conversion failures into
/// `anyhow` errors for use with `?`.
pub fn tree_from(json: serde_json::Value) -> Result<Tree> {
    Tree::try_from(json).map_err(anyhow::Error::from)
}

/// A temporary directory that stays alive for the duration of a test,
/// exposed through a UTF-8 root path.
pub struct TempData {
    _dir: TempDir,
    pub root: Utf8PathBuf,
}

pub fn temp_data() -> Result<TempData> {
    let dir = TempDir::new()?;
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| anyhow!("temp dir is not UTF-8: {}", path.display()))?;
    Ok(TempData { _dir: dir, root })
}

/// Writes a source document under the temp root and returns its path.
pub fn write_source(data: &TempData, name: &str, contents: &str) -> Result<Utf8PathBuf> {
    let path = data.root.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}
