//! Process-global last-error slot for fail-soft decoding
//!
//! [`crate::decode`] never returns an error. Callers that need to tell an
//! invalid payload apart from a valid one without fields inspect this slot.
//! Successful decodes leave it untouched; clear it before decoding if the
//! distinction matters.

use parking_lot::{const_mutex, Mutex};

use crate::error::Error;

/// Prefix of every message recorded for a parse failure
pub const PARSE_FAILURE_PREFIX: &str = "Parsing the input failed with the last error";

static LAST_ERROR: Mutex<Option<String>> = const_mutex(None);

pub(crate) fn record(err: &Error) {
    *LAST_ERROR.lock() = Some(format!("{PARSE_FAILURE_PREFIX}: {err}"));
}

/// The diagnostic recorded by the most recent failed [`crate::decode`]
pub fn last_error() -> Option<String> {
    LAST_ERROR.lock().clone()
}

/// Reset the last-error slot
pub fn clear_last_error() {
    *LAST_ERROR.lock() = None;
}
