//! Hardened XML parser
//!
//! The parser never resolves external entities, never loads an external DTD
//! and never expands parameter entities. A document type declaration is
//! scanned only to learn which general entity names it declares; references
//! to those names are dropped from the character data instead of expanded.
//! Any other non-predefined entity reference fails the parse.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::cursor::Cursor;
use crate::xml::model::{Content, Document, Element};

/// Parser configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl Config {
    /// Create a config with unlimited nesting depth
    pub const fn unlimited() -> Self {
        Self { max_depth: 0 }
    }

    /// Create a config with a specific depth limit
    pub const fn new(max_depth: u16) -> Self {
        Self { max_depth }
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    declared_entities: HashSet<String>,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            declared_entities: HashSet::new(),
            depth: 0,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        self.cursor.consume_bytes(UTF8_BOM);
        self.parse_prolog()?;
        let root = self.parse_element()?;
        self.parse_epilog()?;
        Ok(Document { root })
    }

    fn parse_prolog(&mut self) -> Result<()> {
        let mut seen_doctype = false;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                return Err(Error::at(ErrorKind::EmptyDocument, self.cursor.position()));
            }
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<!DOCTYPE") {
                if seen_doctype {
                    return Err(self.error_here("more than one document type declaration"));
                }
                seen_doctype = true;
                self.parse_doctype()?;
            } else if self.cursor.current() == Some(b'<') {
                return Ok(());
            } else {
                return Err(self.error_here("start tag expected"));
            }
        }
    }

    fn parse_epilog(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                return Ok(());
            }
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else {
                return Err(Error::at(
                    ErrorKind::TrailingContent,
                    self.cursor.position(),
                ));
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.enter()?;
        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            self.depth = self.depth.saturating_sub(1);
            return Ok(Element::new(name));
        }
        self.expect_byte(b'>')?;

        let mut children = Vec::new();
        loop {
            if self.cursor.starts_with(b"</") {
                let pos = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: name,
                            found: close_name,
                        },
                        pos,
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                children.push(Content::CData(self.parse_cdata()?));
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!") {
                return Err(self.error_here("markup declaration inside element"));
            } else if self.cursor.current() == Some(b'<') {
                children.push(Content::Element(self.parse_element()?));
            } else if self.cursor.is_eof() {
                return Err(Error::with_message(
                    ErrorKind::UnexpectedEof,
                    Span::at(self.cursor.position()),
                    format!("premature end of data in tag {name}"),
                ));
            } else {
                children.push(Content::Text(self.parse_text()?));
            }
        }

        self.depth = self.depth.saturating_sub(1);
        Ok(Element { name, children })
    }

    fn enter(&mut self) -> Result<()> {
        self.depth = self.depth.saturating_add(1);
        let max = self.config.max_depth;
        if max != 0 && self.depth > max {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded { max },
                self.cursor.position(),
            ));
        }
        Ok(())
    }

    /// Attributes are validated and discarded
    fn parse_attributes(&mut self) -> Result<()> {
        let mut seen = HashSet::new();

        loop {
            let had_space = matches!(
                self.cursor.current(),
                Some(b' ' | b'\t' | b'\r' | b'\n')
            );
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) if !had_space => {
                    return Err(self.error_here("attributes construct error"));
                }
                Some(_) => {}
                None => return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position())),
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            self.parse_attribute_value()?;

            if !seen.insert(name.clone()) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, pos));
            }
        }

        Ok(())
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_string(raw, pos)?;
                return self.decode_entities(&text, pos);
            }
            if b == b'<' {
                return Err(self.error_here("unescaped '<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    /// Character data up to the next markup, whitespace-only chunks included
    fn parse_text(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            if self.cursor.starts_with(b"]]>") {
                return Err(self.error_here("sequence ']]>' not allowed in content"));
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        let text = normalize_line_breaks(bytes_to_string(raw, pos)?);
        self.decode_entities(&text, pos)
    }

    fn parse_cdata(&mut self) -> Result<String> {
        self.cursor.advance_by(b"<![CDATA[".len());
        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(3);
                return bytes_to_string(raw, pos).map(normalize_line_breaks);
            }
            self.cursor.advance();
        }
        Err(Error::with_message(
            ErrorKind::UnexpectedEof,
            Span::at(pos),
            "CDATA section not terminated",
        ))
    }

    fn parse_name(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();

        if self.cursor.is_eof() {
            return Err(Error::at(ErrorKind::UnexpectedEof, pos));
        }

        // non-ASCII bytes are taken whole and checked once decoded
        while let Some(b) = self.cursor.current() {
            if b >= 0x80 || is_name_char(char::from(b)) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let name = bytes_to_string(self.cursor.slice_from(start), pos)?;
        if is_name(&name) {
            Ok(name)
        } else {
            Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::at(pos),
                "invalid name",
            ))
        }
    }

    /// Scan `<!DOCTYPE ...>` and remember declared general entity names.
    ///
    /// External identifiers are skipped without being fetched, parameter
    /// entity references are skipped without being expanded.
    fn parse_doctype(&mut self) -> Result<()> {
        self.cursor.advance_by(b"<!DOCTYPE".len());
        if !matches!(self.cursor.current(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            return Err(self.error_here("space required after '<!DOCTYPE'"));
        }
        self.cursor.skip_whitespace();
        self.parse_name()?;

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'>') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some(b'[') => {
                    self.cursor.advance();
                    self.parse_internal_subset()?;
                }
                Some(b'"' | b'\'') => self.skip_quoted()?,
                Some(b) if b.is_ascii_alphabetic() => {
                    self.parse_name()?;
                }
                Some(_) => return Err(self.error_here("malformed document type declaration")),
                None => return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position())),
            }
        }
    }

    fn parse_internal_subset(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.consume(b']') {
                return Ok(());
            }
            if self.cursor.starts_with(b"<!ENTITY") {
                self.cursor.advance_by(b"<!ENTITY".len());
                self.cursor.skip_whitespace();
                let parameter = self.cursor.consume(b'%');
                self.cursor.skip_whitespace();
                let name = self.parse_name()?;
                if !parameter {
                    debug!(entity = %name, "entity declared in document type, will not be expanded");
                    self.declared_entities.insert(name);
                }
                self.skip_markup_declaration()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!") {
                self.skip_markup_declaration()?;
            } else if self.cursor.consume(b'%') {
                self.parse_name()?;
                self.expect_byte(b';')?;
            } else if self.cursor.is_eof() {
                return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()));
            } else {
                return Err(self.error_here("malformed internal subset"));
            }
        }
    }

    /// Skip to the closing `>` of a markup declaration, honoring quoted literals
    fn skip_markup_declaration(&mut self) -> Result<()> {
        while let Some(b) = self.cursor.current() {
            match b {
                b'>' => {
                    self.cursor.advance();
                    return Ok(());
                }
                b'"' | b'\'' => self.skip_quoted()?,
                _ => self.cursor.advance(),
            }
        }
        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    fn skip_quoted(&mut self) -> Result<()> {
        let Some(quote) = self.cursor.current() else {
            return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()));
        };
        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            if b == quote {
                return Ok(());
            }
        }
        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.cursor.advance_by(b"<!--".len());
        self.skip_until(b"-->")
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        self.cursor.advance_by(b"<?".len());
        self.skip_until(b"?>")
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.consume_bytes(pattern) {
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(Error::with_message(
            ErrorKind::UnexpectedEof,
            Span::at(self.cursor.position()),
            "unterminated markup",
        ))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else if self.cursor.is_eof() {
            Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
        } else {
            Err(self.error_here(&format!("expected '{}'", char::from(expected))))
        }
    }

    fn error_here(&self, message: &str) -> Error {
        Error::with_message(
            ErrorKind::InvalidToken,
            Span::at(self.cursor.position()),
            message,
        )
    }

    fn decode_entities(&self, input: &str, pos: Pos) -> Result<String> {
        let mut result = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(amp) = rest.find('&') {
            result.push_str(rest.get(..amp).unwrap_or_default());
            let after = rest.get(amp + 1..).unwrap_or_default();
            let Some(semi) = after.find(';') else {
                return Err(Error::at(ErrorKind::InvalidEntity, pos));
            };
            let entity = after.get(..semi).unwrap_or_default();
            rest = after.get(semi + 1..).unwrap_or_default();

            match predefined_entity(entity) {
                Some(ch) => result.push(ch),
                None if entity.starts_with('#') => match decode_numeric_entity(entity) {
                    Some(ch) => result.push(ch),
                    None => return Err(Error::at(ErrorKind::InvalidEntity, pos)),
                },
                None if !is_name(entity) => {
                    return Err(Error::at(ErrorKind::InvalidEntity, pos));
                }
                None if self.declared_entities.contains(entity) => {
                    debug!(entity, "dropping reference to declared entity");
                }
                None => {
                    return Err(Error::at(
                        ErrorKind::UndefinedEntity {
                            name: entity.to_string(),
                        },
                        pos,
                    ));
                }
            }
        }

        result.push_str(rest);
        Ok(result)
    }
}

fn bytes_to_string(bytes: &[u8], pos: Pos) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::at(ErrorKind::InvalidUtf8, pos))
}

/// The XML 1.0 `NameStartChar` production
fn is_name_start(ch: char) -> bool {
    matches!(ch,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

/// The XML 1.0 `NameChar` production
fn is_name_char(ch: char) -> bool {
    is_name_start(ch)
        || matches!(ch, '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// True if `name` is a well-formed XML name
pub(crate) fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// End-of-line handling: `\r\n` and lone `\r` become `\n`
fn normalize_line_breaks(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

fn predefined_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).filter(|ch| is_xml_char(*ch))
}

/// The XML 1.0 `Char` production
pub(crate) fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
