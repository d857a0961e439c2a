//! XML data model

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// XML element
///
/// Attributes are checked for well-formedness by the parser and then
/// discarded, so they have no place in the model.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub children: Vec<Content>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<Content>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            _ => None,
        })
    }
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    /// Entity-decoded character data
    Text(String),
    /// Raw content of a CDATA section, without its delimiters
    CData(String),
}
