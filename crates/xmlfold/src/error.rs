//! Error types for xmlfold

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input ended inside markup
    UnexpectedEof,
    /// Byte sequence that is not valid at this point of the document
    InvalidToken,
    /// Closing tag does not match the open element
    MismatchedTag { expected: String, found: String },
    /// Reference to an entity that is neither predefined nor declared
    UndefinedEntity { name: String },
    /// Malformed character or entity reference
    InvalidEntity,
    /// Input is not valid UTF-8
    InvalidUtf8,
    /// No root element in the input
    EmptyDocument,
    /// Markup after the root element closed
    TrailingContent,
    /// Element nesting deeper than the configured limit
    MaxDepthExceeded { max: u16 },
    /// Same attribute repeated on one element
    DuplicateAttribute { name: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::InvalidToken => write!(f, "invalid token"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::UndefinedEntity { name } => write!(f, "entity '{name}' not defined"),
            Self::InvalidEntity => write!(f, "invalid entity reference"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::EmptyDocument => write!(f, "document is empty"),
            Self::TrailingContent => write!(f, "extra content at the end of the document"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
        }
    }
}

/// Main error type for xmlfold
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at {}: {}", self.span.start, self.message)
    }
}

/// Result type alias for xmlfold
pub type Result<T> = std::result::Result<T, Error>;
