//! Purpose: Centralize the record file grammar tokens.
//! Exports: `SECTION_TAG`, `COMMENT_PREFIX`, `KEY_SEPARATOR`, list delimiters, `section_marker`.
//! Role: Shared constants for the parser, renderer, and list helpers.
//! Invariants: Output always uses the literal `[user]` marker; input accepts any `[...]` line.
//! Invariants: Keys split on the first `:` only, so values may contain colons.

pub const SECTION_TAG: &str = "user";
pub const SECTION_OPEN: char = '[';
pub const SECTION_CLOSE: char = ']';
pub const COMMENT_PREFIX: char = '#';
pub const KEY_SEPARATOR: char = ':';
pub const LIST_OPEN: char = '[';
pub const LIST_CLOSE: char = ']';
pub const LIST_SEPARATOR: char = ',';
pub const LIST_JOIN: &str = ", ";

/// UTF-8 encoded byte order mark; stripped before parsing.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub fn section_marker() -> String {
    format!("{SECTION_OPEN}{SECTION_TAG}{SECTION_CLOSE}")
}

pub fn is_section_marker(line: &str) -> bool {
    line.starts_with(SECTION_OPEN) && line.ends_with(SECTION_CLOSE)
}

pub fn is_comment(line: &str) -> bool {
    line.starts_with(COMMENT_PREFIX)
}
