//! xmlfold - hardened XML <-> structure transformer for webhook payloads
//!
//! # Quick Start
//!
//! ```
//! use xmlfold::{decode, encode, EncodeOptions, Mapping};
//!
//! let data = decode("<xml><appid>wx123</appid><total_fee>1</total_fee></xml>");
//! assert_eq!(data["appid"].as_text(), Some("wx123"));
//!
//! let reply = Mapping::new().with("return_code", "SUCCESS");
//! let xml = encode(&reply, &EncodeOptions::default());
//! assert_eq!(xml, "<xml><return_code>SUCCESS</return_code></xml>");
//! ```
//!
//! Decoding never resolves external entities or expands DTD-declared ones.
//! [`decode`] is fail-soft and records failures for [`last_error`];
//! [`try_decode`] returns them.

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod value;
pub use value::{Mapping, Sequence, Stringable, Value};

pub mod labeled;
pub use labeled::{label_sequence, LabeledSequence, DEFAULT_LABEL};

pub mod diagnostics;
pub use diagnostics::{clear_last_error, last_error, PARSE_FAILURE_PREFIX};

pub mod decode;
pub use decode::{decode, decode_with_config, try_decode, try_decode_with_config};

pub mod encode;
pub use encode::{encode, to_xml, EncodeOptions};

pub mod xml;
pub use xml::{Config as ParserConfig, Parser as XmlParser};
