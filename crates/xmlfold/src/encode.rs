//! Structure to XML encoding

use std::borrow::Cow;

use tracing::instrument;

use crate::labeled::DEFAULT_LABEL;
use crate::value::{Mapping, Sequence, Value};
use crate::xml::model::{Content, Document, Element};
use crate::xml::parser::{is_name, is_xml_char};
use crate::xml::writer::Writer;

/// Encoding options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Omit the `<?xml ...?>` declaration
    pub headless: bool,
    /// Pretty-print with line breaks and indentation
    pub indent: bool,
    /// Name of the document element
    pub root: String,
    /// Element name for unlabeled sequence entries
    pub item: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            indent: false,
            root: "xml".to_string(),
            item: DEFAULT_LABEL.to_string(),
        }
    }
}

impl EncodeOptions {
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    #[must_use]
    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.item = item.into();
        self
    }
}

/// Encode a mapping as an XML document
///
/// ```
/// use xmlfold::{encode, EncodeOptions, Mapping, Value};
///
/// let data = Mapping::new()
///     .with("appid", "wx123")
///     .with("detail", vec![Value::from(Mapping::new().with("goods_detail", "华为手机"))]);
/// assert_eq!(
///     encode(&data, &EncodeOptions::default()),
///     "<xml><appid>wx123</appid><detail><item><goods_detail>华为手机</goods_detail></item></detail></xml>"
/// );
/// ```
#[instrument(level = "debug", skip(data), fields(entries = data.len()))]
pub fn encode(data: &Mapping, options: &EncodeOptions) -> String {
    let encoder = Encoder {
        item: &options.item,
    };
    let mut children = Vec::with_capacity(data.len());
    encoder.mapping(data, &mut children);

    let doc = Document {
        root: Element::with_children(options.root.as_str(), children),
    };
    Writer::new(options.headless, options.indent).write(&doc)
}

/// Positional form of [`encode`]
pub fn to_xml(data: &Mapping, headless: bool, indent: bool, root: &str, item: &str) -> String {
    let options = EncodeOptions::default()
        .headless(headless)
        .indent(indent)
        .root(root)
        .item(item);
    encode(data, &options)
}

struct Encoder<'o> {
    item: &'o str,
}

impl Encoder<'_> {
    fn mapping(&self, mapping: &Mapping, out: &mut Vec<Content>) {
        for (key, value) in mapping {
            let tag = if is_name(key) { key.as_str() } else { self.item };
            self.entry(tag, value, out);
        }
    }

    fn sequence(&self, sequence: &Sequence, label: &str, out: &mut Vec<Content>) {
        for value in sequence {
            self.entry(label, value, out);
        }
    }

    fn entry(&self, tag: &str, value: &Value, out: &mut Vec<Content>) {
        let children = match value {
            Value::Text(text) => text_content(text),
            Value::Mapping(mapping) => {
                let mut children = Vec::with_capacity(mapping.len());
                self.mapping(mapping, &mut children);
                children
            }
            Value::Sequence(sequence) => {
                let mut children = Vec::with_capacity(sequence.len());
                self.sequence(sequence, self.item, &mut children);
                children
            }
            Value::Labeled(labeled) if labeled.is_wrapped() => {
                let mut children = Vec::with_capacity(labeled.items().len());
                self.sequence(labeled.items(), labeled.label(), &mut children);
                children
            }
            Value::Labeled(labeled) => {
                self.sequence(labeled.items(), labeled.label(), out);
                return;
            }
        };
        out.push(Content::Element(Element::with_children(tag, children)));
    }
}

/// Text that would need escaping goes into CDATA so its bytes survive as-is
fn text_content(text: &str) -> Vec<Content> {
    let text = xml_chars(text);
    let text = text.as_ref();
    if !needs_cdata(text) {
        return vec![Content::Text(text.to_string())];
    }
    // `]]>` cannot appear inside a CDATA section, split it across two
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(end) = rest.find("]]>") {
        sections.push(Content::CData(rest.get(..end + 2).unwrap_or_default().to_string()));
        rest = rest.get(end + 2..).unwrap_or_default();
    }
    sections.push(Content::CData(rest.to_string()));
    sections
}

/// Characters outside the XML `Char` production cannot be written at all
fn xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|ch| is_xml_char(*ch)).collect())
    }
}

fn needs_cdata(text: &str) -> bool {
    text.contains(['<', '>', '&', '"', '\''])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeled::label_sequence;
    use crate::value::Stringable;

    fn goods() -> Value {
        Value::from(
            Mapping::new()
                .with("goods_detail", "华为手机")
                .with("url", "https://huawei.com"),
        )
    }

    #[test]
    fn test_defaults() {
        let data = Mapping::new().with("appid", "wx123").with("body", "dummybot");
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><appid>wx123</appid><body>dummybot</body></xml>"
        );
    }

    #[test]
    fn test_plain_sequence_uses_item_label() {
        let data = Mapping::new().with("detail", vec![goods(), goods()]);
        let xml = to_xml(&data, true, false, "xml", "row");
        assert_eq!(
            xml,
            "<xml><detail>\
             <row><goods_detail>华为手机</goods_detail><url>https://huawei.com</url></row>\
             <row><goods_detail>华为手机</goods_detail><url>https://huawei.com</url></row>\
             </detail></xml>"
        );
    }

    #[test]
    fn test_labeled_unwrapped_emits_siblings() {
        let data = Mapping::new()
            .with("ArticleCount", 2)
            .with("Articles", label_sequence(vec![Value::from("a"), Value::from("b")], "Article", false));
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><ArticleCount>2</ArticleCount><Article>a</Article><Article>b</Article></xml>"
        );
    }

    #[test]
    fn test_labeled_wrapped_uses_key_as_container() {
        let data = Mapping::new().with("Articles", label_sequence(vec![goods()], "item", true));
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><Articles><item><goods_detail>华为手机</goods_detail><url>https://huawei.com</url></item></Articles></xml>"
        );
    }

    #[test]
    fn test_nested_labeled_inside_sequence() {
        let inner = label_sequence(vec![Value::from("1"), Value::from("2")], "n", false);
        let data = Mapping::new().with("list", vec![inner]);
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><list><n>1</n><n>2</n></list></xml>"
        );
    }

    #[test]
    fn test_unsafe_text_is_cdata_wrapped() {
        let json = r#"[{"goods_detail":"华为手机","url":"https://huawei.com"}]"#;
        let data = Mapping::new().with("detail", json);
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            format!("<xml><detail><![CDATA[{json}]]></detail></xml>")
        );
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let data = Mapping::new().with("a", "x]]>y");
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><a><![CDATA[x]]]]><![CDATA[>y]]></a></xml>"
        );
    }

    #[test]
    fn test_invalid_key_falls_back_to_item() {
        let data = Mapping::new().with("0", "zero").with("bad key", "x");
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><item>zero</item><item>x</item></xml>"
        );
    }

    #[test]
    fn test_empty_values() {
        let data = Mapping::new()
            .with("a", "")
            .with("b", Mapping::new())
            .with("c", Sequence::new());
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><a></a><b/><c/></xml>"
        );
        assert_eq!(encode(&Mapping::new(), &EncodeOptions::default()), "<xml/>");
    }

    #[test]
    fn test_stringable_matches_rendered_string() {
        struct Receiver;
        impl Stringable for Receiver {
            fn to_text(&self) -> String {
                r#"{"type":"MERCHANT_ID","account":"190001001"}"#.to_string()
            }
        }

        let via_trait = Mapping::new().with("receiver", Value::stringable(&Receiver));
        let via_string = Mapping::new().with("receiver", Receiver.to_text());
        let options = EncodeOptions::default();
        assert_eq!(encode(&via_trait, &options), encode(&via_string, &options));
    }

    #[test]
    fn test_scalars() {
        let data = Mapping::new().with("finished", true).with("amount", 100u32);
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><finished>true</finished><amount>100</amount></xml>"
        );
    }

    #[test]
    fn test_non_xml_characters_are_dropped() {
        let data = Mapping::new().with("a", "x\u{1}y\u{FFFF}").with("b", "<\u{0}>");
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><a>xy</a><b><![CDATA[<>]]></b></xml>"
        );
    }

    #[test]
    fn test_key_with_non_name_character_uses_item() {
        let data = Mapping::new().with("名\u{3000}", "z").with("名字", "w");
        assert_eq!(
            encode(&data, &EncodeOptions::default()),
            "<xml><item>z</item><名字>w</名字></xml>"
        );
    }
}
