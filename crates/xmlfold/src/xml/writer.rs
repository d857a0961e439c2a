//! XML text writer

use crate::xml::model::{Content, Document, Element};

/// The declaration emitted for non-headless documents
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const INDENT: &str = " ";

/// Serializes a [`Document`] to UTF-8 text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Writer {
    headless: bool,
    indent: bool,
}

impl Writer {
    pub const fn new(headless: bool, indent: bool) -> Self {
        Self { headless, indent }
    }

    pub fn write(&self, doc: &Document) -> String {
        let mut output = String::new();
        if !self.headless {
            output.push_str(DECLARATION);
            if self.indent {
                output.push('\n');
            }
        }
        self.write_element(&doc.root, 0, &mut output);
        if self.indent {
            output.push('\n');
        }
        output
    }

    fn write_element(&self, element: &Element, depth: usize, output: &mut String) {
        output.push('<');
        output.push_str(&element.name);

        if element.children.is_empty() {
            output.push_str("/>");
            return;
        }

        output.push('>');
        let block = self.indent && element.elements().next().is_some();
        for child in &element.children {
            if block {
                output.push('\n');
                push_indent(output, depth + 1);
            }
            match child {
                Content::Element(child) => self.write_element(child, depth + 1, output),
                Content::Text(text) => output.push_str(&escape_xml(text)),
                Content::CData(text) => {
                    output.push_str("<![CDATA[");
                    output.push_str(text);
                    output.push_str("]]>");
                }
            }
        }
        if block {
            output.push('\n');
            push_indent(output, depth);
        }
        output.push_str("</");
        output.push_str(&element.name);
        output.push('>');
    }
}

fn push_indent(output: &mut String, depth: usize) {
    for _ in 0..depth {
        output.push_str(INDENT);
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
