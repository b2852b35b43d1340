//! XML loading on top of quick-xml.
//!
//! [`XmlParser`] builds the read-only node tree the difference engine walks,
//! [`XmlNodeReader`] hands out one node at a time for the streaming legacy
//! comparison.

mod parser;
mod reader;

pub use parser::{parse_file, parse_str, XmlParser};
pub use reader::{ReaderAttribute, ReaderNode, WhitespaceHandling, XmlNodeReader, XmlNodeType};

use quick_xml::escape::resolve_predefined_entity;

use crate::error::{Error, Result};

/// Resolves the body of an entity or character reference (`amp`, `#38`,
/// `#x26`) to its replacement text.
pub(crate) fn resolve_reference(name: &str) -> Result<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => num.parse::<u32>(),
        }
        .map_err(|e| Error::Parse(format!("invalid character reference &{};: {}", name, e)))?;
        return char::from_u32(code)
            .map(String::from)
            .ok_or_else(|| Error::Parse(format!("invalid character reference &{};", name)));
    }
    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| Error::Parse(format!("unknown entity reference &{};", name)))
}

/// DOCTYPE name, public id and system id.
pub(crate) type DoctypeIds = (String, Option<String>, Option<String>);

/// Splits the body of a `<!DOCTYPE ...>` declaration into name, public id
/// and system id. The internal subset, if any, is ignored.
pub(crate) fn parse_doctype(raw: &str) -> DoctypeIds {
    let raw = raw.trim();
    let name_end = raw
        .find(|c: char| c.is_whitespace() || c == '[')
        .unwrap_or(raw.len());
    let name = raw[..name_end].to_string();
    let rest = raw[name_end..].trim_start();

    if let Some(rest) = rest.strip_prefix("PUBLIC") {
        let (public_id, rest) = take_quoted(rest);
        let (system_id, _) = take_quoted(rest);
        (name, public_id, system_id)
    } else if let Some(rest) = rest.strip_prefix("SYSTEM") {
        let (system_id, _) = take_quoted(rest);
        (name, None, system_id)
    } else {
        (name, None, None)
    }
}

/// Reads one single- or double-quoted literal from the start of `s`.
fn take_quoted(s: &str) -> (Option<String>, &str) {
    let s = s.trim_start();
    let Some(quote) = s.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return (None, s);
    };
    let body = &s[1..];
    match body.find(quote) {
        Some(end) => (Some(body[..end].to_string()), &body[end + 1..]),
        None => (None, s),
    }
}
