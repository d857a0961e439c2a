//! Structure types exchanged with callers
//!
//! A decoded document is a [`Mapping`] of tag name to [`Value`]. Repeated
//! sibling tags become a [`Sequence`]. [`LabeledSequence`] only appears on
//! the encoding side, where it controls how a list becomes repeated elements.

use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use std::ops::Index;

use crate::labeled::LabeledSequence;

/// A decoded or to-be-encoded XML value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Character data of a leaf element
    Text(String),
    /// Child elements keyed by tag name, in document order
    Mapping(Mapping),
    /// Repeated sibling elements sharing one tag name
    Sequence(Sequence),
    /// Sequence carrying an element label and wrapped flag, encode only
    Labeled(LabeledSequence),
}

impl Default for Value {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Value {
    /// Coerce any [`Stringable`] into a text value
    pub fn stringable<T: Stringable + ?Sized>(value: &T) -> Self {
        Self::Text(value.to_text())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_labeled(&self) -> Option<&LabeledSequence> {
        match self {
            Self::Labeled(l) => Some(l),
            _ => None,
        }
    }

    /// Look up a key if this value is a mapping
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_mapping().and_then(|m| m.get(key))
    }
}

/// Capability to render a value as element text
///
/// Anything implementing this can be placed in a [`Mapping`] through
/// [`Value::stringable`] and is encoded exactly like the string it renders.
pub trait Stringable {
    fn to_text(&self) -> String;
}

macro_rules! stringable_via_to_string {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Stringable for $ty {
                fn to_text(&self) -> String {
                    self.to_string()
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_text())
                }
            }
        )*
    };
}

stringable_via_to_string!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String);

impl Stringable for str {
    fn to_text(&self) -> String {
        self.to_owned()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

impl From<Sequence> for Value {
    fn from(value: Sequence) -> Self {
        Self::Sequence(value)
    }
}

impl From<LabeledSequence> for Value {
    fn from(value: LabeledSequence) -> Self {
        Self::Labeled(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Sequence(Sequence(values))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Mapping(Mapping(map))
    }
}

/// An order-preserving mapping of tag names to values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping(pub(crate) IndexMap<String, Value>);

impl Mapping {
    /// Creates a new empty mapping
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Inserts a key-value pair, keeping the position of an existing key.
    /// Returns the previous value if the key already existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Removes a key, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> Values<'_, String, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl Index<&str> for Mapping {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, key: &str) -> &Self::Output {
        &self.0[key]
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<IndexMap<String, Value>> for Mapping {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// An ordered list of values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence(pub(crate) Vec<Value>);

impl Sequence {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// Attach an element label, producing a [`LabeledSequence`]
    pub fn labeled(self, label: impl Into<String>) -> LabeledSequence {
        LabeledSequence::new(self).with_label(label)
    }
}

impl Index<usize> for Sequence {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Sequence {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<Value>> for Sequence {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<V: Into<Value>> FromIterator<V> for Sequence {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(feature = "serde")]
mod serialize {
    use serde::ser::{SerializeMap, SerializeSeq};
    use serde::{Serialize, Serializer};

    use super::{Mapping, Sequence, Value};

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Text(text) => serializer.serialize_str(text),
                Self::Mapping(mapping) => mapping.serialize(serializer),
                Self::Sequence(sequence) => sequence.serialize(serializer),
                Self::Labeled(labeled) => labeled.items().serialize(serializer),
            }
        }
    }

    impl Serialize for Mapping {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }

    impl Serialize for Sequence {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for value in self {
                seq.serialize_element(value)?;
            }
            seq.end()
        }
    }
}
