//! XML to structure decoding

use std::borrow::Cow;

use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::diagnostics;
use crate::error::Result;
use crate::value::{Mapping, Sequence, Value};
use crate::xml::model::{Content, Element};
use crate::xml::parser::{is_xml_char, Config, Parser};

/// Decode untrusted XML, returning the root element's children.
///
/// Never fails. On a parse failure the diagnostic is recorded in the
/// last-error slot (see [`crate::last_error`]) and an empty mapping is
/// returned.
pub fn decode(xml: &str) -> Mapping {
    decode_with_config(xml, Config::default())
}

/// [`decode`] with a custom parser configuration
pub fn decode_with_config(xml: &str, config: Config) -> Mapping {
    match try_decode_with_config(xml, config) {
        Ok(mapping) => mapping,
        Err(err) => {
            warn!(error = %err, "xml payload rejected");
            diagnostics::record(&err);
            Mapping::new()
        }
    }
}

/// Decode untrusted XML, returning parse failures as errors
///
/// ```
/// let data = xmlfold::try_decode("<xml><appid>wx123</appid></xml>")?;
/// assert_eq!(data["appid"].as_text(), Some("wx123"));
/// # Ok::<(), xmlfold::Error>(())
/// ```
pub fn try_decode(xml: &str) -> Result<Mapping> {
    try_decode_with_config(xml, Config::default())
}

/// [`try_decode`] with a custom parser configuration
#[instrument(level = "debug", skip(xml), fields(len = xml.len()))]
pub fn try_decode_with_config(xml: &str, config: Config) -> Result<Mapping> {
    let input = sanitize(xml);
    let doc = Parser::with_config(input.as_bytes(), config).parse()?;
    debug!(root = %doc.root.name, "parsed document");

    match XmlNode::from_element(&doc.root).fold() {
        Value::Mapping(mapping) => Ok(mapping),
        _ => {
            debug!("root element has no child elements");
            Ok(Mapping::new())
        }
    }
}

/// Strip characters outside the XML `Char` production
fn sanitize(xml: &str) -> Cow<'_, str> {
    if xml.chars().all(is_xml_char) {
        Cow::Borrowed(xml)
    } else {
        debug!("stripping characters not allowed in xml");
        Cow::Owned(xml.chars().filter(|ch| is_xml_char(*ch)).collect())
    }
}

/// An element with its children grouped by tag name
#[derive(Debug)]
struct XmlNode<'a> {
    children: IndexMap<&'a str, Vec<XmlNode<'a>>>,
    text: String,
}

impl<'a> XmlNode<'a> {
    fn from_element(element: &'a Element) -> Self {
        let mut children: IndexMap<&'a str, Vec<XmlNode<'a>>> = IndexMap::new();
        let mut text = String::new();
        for child in &element.children {
            match child {
                Content::Element(child) => children
                    .entry(child.name.as_str())
                    .or_default()
                    .push(Self::from_element(child)),
                Content::Text(chunk) | Content::CData(chunk) => text.push_str(chunk),
            }
        }
        Self { children, text }
    }

    /// Text for leaves, a mapping otherwise; repeated tags become sequences
    fn fold(self) -> Value {
        if self.children.is_empty() {
            return Value::Text(self.text.trim().to_string());
        }

        let mut mapping = Mapping::with_capacity(self.children.len());
        for (name, mut nodes) in self.children {
            let value = match nodes.pop() {
                Some(only) if nodes.is_empty() => only.fold(),
                Some(last) => {
                    nodes.push(last);
                    Value::Sequence(nodes.into_iter().map(Self::fold).collect::<Sequence>())
                }
                None => continue,
            };
            mapping.insert(name, value);
        }
        Value::Mapping(mapping)
    }
}
