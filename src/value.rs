//! The recursive `Value` sum type stored at every node of a data tree.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Number;

use crate::tree::Tree;

/// A single value held in a [`Tree`].
///
/// The definition is recursive: a value may itself be a tree or an ordered
/// sequence whose elements are values. Cloning is cheap; tree-valued
/// variants clone the shared handle, not the underlying node. Use
/// [`Value::deep_clone`] for a structurally independent copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or explicit-null scalar.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar (integer or float, as parsed).
    Number(Number),
    /// Textual scalar.
    String(String),
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
    /// Nested mapping, shared by handle.
    Tree(Tree),
}

impl Value {
    /// Human-readable name of this value's kind, used in error reporting.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Tree(_) => "mapping",
        }
    }

    /// Returns `true` for the null scalar.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrows the nested tree when this value is a mapping.
    #[must_use]
    pub const fn as_tree(&self) -> Option<&Tree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Borrows the string slice when this value is a textual scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the boolean when this value is a boolean scalar.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the value as an `i64` when it is an integral number.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    /// Borrows the element slice when this value is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(elements) => Some(elements),
            _ => None,
        }
    }

    /// Produces a structurally independent copy of this value.
    ///
    /// Nested trees are copied into fresh nodes with no accessors attached;
    /// sequences are copied element-wise. Scalars are plain clones.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Tree(tree) => Self::Tree(tree.deep_clone()),
            Self::Sequence(elements) => {
                Self::Sequence(elements.iter().map(Self::deep_clone).collect())
            }
            other => other.clone(),
        }
    }

    /// Converts this value into a [`serde_json::Value`], deep-copying any
    /// nested trees.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(flag) => serde_json::Value::Bool(*flag),
            Self::Number(number) => serde_json::Value::Number(number.clone()),
            Self::String(text) => serde_json::Value::String(text.clone()),
            Self::Sequence(elements) => {
                serde_json::Value::Array(elements.iter().map(Self::to_json).collect())
            }
            Self::Tree(tree) => tree.to_json(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::Number(number) => Self::Number(number),
            serde_json::Value::String(text) => Self::String(text),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                let tree = Tree::new();
                for (key, item) in map {
                    tree.insert(key, Self::from(item));
                }
                Self::Tree(tree)
            }
        }
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        Self::Tree(tree)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Number(Number::from(number))
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Self {
        Self::Number(Number::from(number))
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no YAML/JSON number representation and map to
    /// [`Value::Null`], matching `serde_json`.
    fn from(number: f64) -> Self {
        Number::from_f64(number).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::String(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(elements: Vec<Value>) -> Self {
        Self::Sequence(elements)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Number(number) => number.serialize(serializer),
            Self::String(text) => serializer.serialize_str(text),
            Self::Sequence(elements) => elements.serialize(serializer),
            Self::Tree(tree) => tree.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from(json))
    }
}
