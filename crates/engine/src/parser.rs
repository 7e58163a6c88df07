//! Response Parser: locate and decode the first JSON object in oracle text.
//!
//! The oracle often wraps its answer in prose or code fences. Only the first
//! balanced `{...}` span is decoded; anything before or after it is ignored.

use serde_json::{Map, Value};
use tracing::debug;

/// Result of parsing raw oracle text.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Object(Map<String, Value>),
    NoObjectFound,
}

impl Parsed {
    pub fn into_object(self) -> Option<Map<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            Self::NoObjectFound => None,
        }
    }
}

/// Parse the first JSON object embedded in `raw`.
///
/// The first `{` that opens a balanced span decides the result: that span
/// is decoded and nothing after it is considered. An opening brace that is
/// never closed is skipped.
pub fn parse(raw: &str) -> Parsed {
    let mut from = 0;
    while let Some(offset) = raw[from..].find('{') {
        let start = from + offset;
        let Some(end) = balanced_end(raw, start) else {
            from = start + 1;
            continue;
        };
        return match serde_json::from_str::<Value>(&raw[start..end]) {
            Ok(Value::Object(map)) => Parsed::Object(map),
            Ok(_) => Parsed::NoObjectFound,
            Err(e) => {
                debug!(error = %e, "First balanced span is not valid JSON");
                Parsed::NoObjectFound
            }
        };
    }
    Parsed::NoObjectFound
}

/// Byte index one past the `}` closing the brace at `start`, if any.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count toward nesting.
fn balanced_end(raw: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in raw[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
