//! XML document model, hardened parser and writer

pub mod cursor;
pub mod model;
pub mod parser;
pub mod writer;

pub use cursor::Cursor;
pub use model::{Content, Document, Element};
pub use parser::{Config, Parser};
pub use writer::Writer;
