// Line-oriented record text codec: parse into events, render raw sections, list syntax.
// Parsing never fails; malformed lines are dropped at this layer.
use std::borrow::Cow;
use std::iter::Enumerate;
use std::str::Lines;

use bstr::ByteSlice;

use crate::core::format::{
    self, KEY_SEPARATOR, LIST_CLOSE, LIST_JOIN, LIST_OPEN, LIST_SEPARATOR, UTF8_BOM,
};

/// One parse step. Line numbers are 1-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event<'a> {
    Section { tag: &'a str, line: usize },
    Field { key: &'a str, value: &'a str, line: usize },
}

/// Represents an on-going parse over a full text buffer.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Enumerate<Lines<'a>>,
    in_section: bool,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            in_section: false,
        }
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, raw) in self.lines.by_ref() {
            let line = raw.trim();
            if line.is_empty() || format::is_comment(line) {
                continue;
            }

            if format::is_section_marker(line) {
                self.in_section = true;
                return Some(Event::Section {
                    tag: &line[1..line.len() - 1],
                    line: index + 1,
                });
            }

            // Field lines before the first marker have no record to attach to.
            if !self.in_section {
                continue;
            }

            if let Some((key, value)) = line.split_once(KEY_SEPARATOR) {
                return Some(Event::Field {
                    key: key.trim(),
                    value: value.trim(),
                    line: index + 1,
                });
            }
        }
        None
    }
}

/// Decode backing bytes as UTF-8, replacing invalid sequences and dropping a leading BOM.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    bytes.to_str_lossy()
}

/// Split a bracketed list value into trimmed elements. `None` when the value is not bracketed.
pub fn split_list(raw: &str) -> Option<Vec<&str>> {
    let inner = raw
        .strip_prefix(LIST_OPEN)
        .and_then(|rest| rest.strip_suffix(LIST_CLOSE))?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(LIST_SEPARATOR).map(str::trim).collect())
}

pub fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    out.push(LIST_OPEN);
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(LIST_JOIN);
        }
        out.push_str(item.as_ref());
    }
    out.push(LIST_CLOSE);
    out
}

/// Append one section: marker line, `key: value` lines with lowercased keys, blank separator.
pub fn write_section(out: &mut String, fields: &[(String, String)]) {
    out.push_str(&format::section_marker());
    out.push('\n');
    for (key, value) in fields {
        out.push_str(&key.to_lowercase());
        out.push(KEY_SEPARATOR);
        out.push(' ');
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
}

pub fn render<'a, I>(sections: I) -> String
where
    I: IntoIterator<Item = &'a [(String, String)]>,
{
    let mut out = String::with_capacity(1024);
    for fields in sections {
        write_section(&mut out, fields);
    }
    out
}
