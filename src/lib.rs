//! Merges hierarchical data from heterogeneous sources into one live,
//! accessor-addressable tree.
//!
//! A [`DataContainer`] holds a single [`Tree`] and accepts successive
//! [`Source`]s: inline values, template-rendered YAML files, or named
//! lookups against a base directory. Each `load`/`merge` deep-merges the
//! resolved source into the backing tree (nested mappings combine key-wise,
//! incoming values win on conflict, sibling keys survive) and then
//! re-synthesizes a read/write [`Accessor`] pair for every key of every
//! reachable mapping, including mappings nested inside sequences.
//!
//! ```no_run
//! use data_accessible::{DataContainer, Source};
//!
//! # fn run() -> data_accessible::DataResult<()> {
//! let mut container = DataContainer::new();
//! container.load(Source::path("config/base.yml"), None)?;
//! container.merge(Source::path("config/overrides.yml"), Some("production"))?;
//!
//! let accessor = container.accessor("database").ok_or_else(|| {
//!     data_accessible::DataError::key_not_bound("database")
//! })?;
//! let database = accessor.get()?;
//! # let _ = database;
//! # Ok(())
//! # }
//! ```
//!
//! Reads come in two deliberate flavours: index-style lookups
//! ([`DataContainer::get`], [`Tree::get`]) are permissive and return
//! `Option`, while accessor reads and [`DataContainer::fetch`] are strict
//! and fail with [`DataError::KeyNotBound`].

mod accessors;
mod container;
mod error;
mod merge;
mod source;
mod tree;
mod value;

pub use accessors::{Accessor, synthesize, synthesize_value};
pub use container::DataContainer;
pub use error::{DataError, DataResult};
pub use merge::deep_merge;
pub use source::{Source, SourceResolver, extract_namespace};
pub use tree::Tree;
pub use value::Value;
