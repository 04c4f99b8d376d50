//! Property parsing: turn one VEVENT block body into a [`RawEvent`].
//!
//! Parsing is a two-register state machine over the block's lines: the
//! accumulated property map, and the key of the last property line seen.
//!
//! - A line starting with `[A-Z0-9_-]+:` opens a new property. The line is
//!   trimmed, C-style un-escaped, and everything after the first `:` becomes
//!   the value, overwriting any earlier value under the same key.
//! - Any other line is a folded continuation. It is trimmed, un-escaped and
//!   appended to the current key's value with no separator. With no current
//!   key it is dropped.
//!
//! After the block is consumed, `DESCRIPTION` is cleaned of the generator's
//! `(Exported ...)` note and of blank-line pairs (`"\n\n"`).

use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const DESCRIPTION: &str = "DESCRIPTION";
pub const SUMMARY: &str = "SUMMARY";
pub const DTSTART: &str = "DTSTART";
pub const DTEND: &str = "DTEND";
pub const LOCATION: &str = "LOCATION";

const BLANK_LINE_PAIR: &str = "\n\n";

// Greedy to the last `)` on the line, like the generator's own note.
static RE_EXPORT_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Exported.*\)").expect("valid export note regex"));

// ── RawEvent ────────────────────────────────────────────────────────────────

/// The properties of one VEVENT, keyed by property name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    properties: Vec<(String, String)>,
}

impl RawEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Store `value` under `key`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((key, value)),
        }
    }

    /// Append `tail` to an existing value; an unset key is left unset.
    fn append(&mut self, key: &str, tail: &str) {
        if let Some(value) = self.get_mut(key) {
            value.push_str(tail);
        }
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.properties
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawEvent {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut event = RawEvent::new();
        for (k, v) in iter {
            event.insert(k, v);
        }
        event
    }
}

impl Serialize for RawEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len()))?;
        for (k, v) in &self.properties {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────────

/// Parse every block body into a raw event, preserving order.
pub fn parse_blocks<'a, I>(blocks: I) -> Vec<RawEvent>
where
    I: IntoIterator<Item = &'a str>,
{
    blocks.into_iter().map(parse_block).collect()
}

/// Parse one block body (the text between `BEGIN:VEVENT` and `END:VEVENT`).
pub fn parse_block(block: &str) -> RawEvent {
    let mut event = RawEvent::new();
    let mut current: Option<String> = None;

    for line in block.split('\n') {
        match property_key(line) {
            Some(key) => {
                let unescaped = unescape(line.trim());
                let value = unescaped
                    .split_once(':')
                    .map(|(_, value)| value)
                    .unwrap_or_default();
                event.insert(key, value);
                current = Some(key.to_string());
            }
            None => {
                if let Some(key) = current.as_deref() {
                    event.append(key, &unescape(line.trim()));
                }
            }
        }
    }

    if let Some(description) = event.get_mut(DESCRIPTION) {
        clean_description(description);
    }

    event
}

/// The property name if `line` starts with `[A-Z0-9_-]+` immediately followed by `:`.
pub fn property_key(line: &str) -> Option<&str> {
    let end = line
        .find(|c: char| !is_key_char(c))
        .filter(|&end| end > 0)?;
    line[end..].starts_with(':').then(|| &line[..end])
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

fn clean_description(description: &mut String) {
    if RE_EXPORT_NOTE.is_match(description) {
        *description = RE_EXPORT_NOTE.replace_all(description, "").into_owned();
    }
    if description.contains(BLANK_LINE_PAIR) {
        *description = description.replace(BLANK_LINE_PAIR, "");
    }
}

/// Resolve C-style backslash escapes.
///
/// Recognised: `\a \b \f \n \r \t \v`, `\xH` / `\xHH` (hex), `\o` to `\ooo`
/// (octal, wrapped to one byte). Any other escaped character stands for
/// itself, so `\,` becomes `,` and `\\` becomes `\`. A trailing lone
/// backslash is kept. Byte values map to the Latin-1 code point.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0B}'),
            'x' if chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) => {
                let mut value = 0u32;
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(digit) => {
                            value = value * 16 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(byte_char(value));
            }
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(byte_char(value));
            }
            other => out.push(other),
        }
    }

    out
}

fn byte_char(value: u32) -> char {
    char::from((value & 0xFF) as u8)
}

// ── Tests ───────────────────────────────────────────────────────────────────
