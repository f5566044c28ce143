//! Literal values used for field defaults, constants and annotation arguments.

use serde::{Deserialize, Serialize};

use crate::error::ConstantError;

/// A literal value, arbitrarily nested.
///
/// `Text` holds the literal exactly as it is written in IDL source: either a
/// double-quoted string literal (`"abc"`) or a bare identifier such as an enum
/// member reference. Build string literals with [`ConstantValue::quoted`] so the
/// recorded text is the text that gets printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// Quoted string literal or bare identifier, stored verbatim.
    Text(String),
    /// Ordered list literal.
    List(Vec<ConstantValue>),
    /// Ordered key/value literal. Serialized as `{"entries": [...]}` so an
    /// empty map does not read back as an empty list.
    Map {
        /// Entries in source order.
        entries: Vec<ConstantEntry>,
    },
}

/// One entry of a map literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantEntry {
    /// Entry key.
    pub key: ConstantValue,
    /// Entry value.
    pub value: ConstantValue,
}

impl ConstantValue {
    /// A double-quoted string literal for `raw`, escaping as needed.
    pub fn quoted(raw: &str) -> Self {
        Self::Text(quote(raw))
    }

    /// The unquoted content of a string literal.
    pub fn string_value(&self) -> Result<String, ConstantError> {
        match self {
            Self::Text(text) if is_quoted_literal(text) => Ok(unquote(text)),
            other => Err(ConstantError::NotQuoted(format!("{other:?}"))),
        }
    }
}

fn is_quoted_literal(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

/// Wrap `raw` in double quotes, escaping backslashes, quotes and control characters.
pub(crate) fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Inverse of [`quote`]. Expects a literal that starts and ends with `"`.
fn unquote(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
