//! Labeled sequence marker

use crate::value::{Sequence, Value};

/// Default element name for sequence entries
pub const DEFAULT_LABEL: &str = "item";

/// A sequence annotated with the element name used for each entry and
/// whether the entries are enclosed in a container element when encoded.
///
/// Unwrapped, the entries become siblings named by the label directly
/// under the parent element and the mapping key is not emitted. Wrapped,
/// the mapping key becomes the container:
///
/// ```
/// use xmlfold::{encode, EncodeOptions, Mapping, Sequence};
///
/// let articles: Sequence = ["first", "second"].into_iter().collect();
/// let data = Mapping::new().with("Articles", articles.labeled("item").wrapped(true));
/// assert_eq!(
///     encode(&data, &EncodeOptions::default()),
///     "<xml><Articles><item>first</item><item>second</item></Articles></xml>"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSequence {
    items: Sequence,
    label: String,
    wrapped: bool,
}

impl LabeledSequence {
    /// Marker with the default `item` label, unwrapped
    pub fn new(items: impl Into<Sequence>) -> Self {
        Self {
            items: items.into(),
            label: DEFAULT_LABEL.to_string(),
            wrapped: false,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn wrapped(mut self, wrapped: bool) -> Self {
        self.wrapped = wrapped;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn items(&self) -> &Sequence {
        &self.items
    }

    pub fn into_items(self) -> Sequence {
        self.items
    }
}

/// Attach a label and wrapped flag to a sequence for encoding
pub fn label_sequence(seq: impl Into<Sequence>, label: impl Into<String>, wrapped: bool) -> Value {
    Value::Labeled(LabeledSequence::new(seq).with_label(label).wrapped(wrapped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let labeled = LabeledSequence::new(Sequence::new());
        assert_eq!(labeled.label(), "item");
        assert!(!labeled.is_wrapped());
        assert!(labeled.items().is_empty());
    }

    #[test]
    fn test_builder() {
        let seq: Sequence = ["a", "b"].into_iter().collect();
        let labeled = seq.labeled("Article").wrapped(true);
        assert_eq!(labeled.label(), "Article");
        assert!(labeled.is_wrapped());
        assert_eq!(labeled.into_items().len(), 2);
    }

    #[test]
    fn test_label_sequence() {
        let value = label_sequence(vec![Value::from("x")], "Bucket", false);
        let labeled = value.as_labeled();
        assert_eq!(labeled.map(LabeledSequence::label), Some("Bucket"));
        assert_eq!(labeled.map(LabeledSequence::is_wrapped), Some(false));
    }
}
