//! WikiLink syntax: finding the `[[...]]` token around a cursor and splitting
//! it into a target and an optional alias.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;
use tower_lsp::lsp_types::Position;

use crate::error::{Result, VaultError};
use crate::vault::{MyRange, Rangeable};

const OPEN: [char; 2] = ['[', '['];
const CLOSE: [char; 2] = [']', ']'];

/// A link token `[[target]]` or `[[target|alias]]`.
///
/// `target` never contains brackets. Whitespace is kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedLink {
    pub target: String,
    pub alias: Option<String>,
}

impl ParsedLink {
    pub fn parse(token: &str) -> Result<ParsedLink> {
        static WIKI_LINK_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^\[\[(?<inner>[^\[\]]+)\]\]$").unwrap());

        let malformed = || VaultError::MalformedLink(token.to_string());

        let inner = WIKI_LINK_RE
            .captures(token)
            .and_then(|captures| captures.name("inner"))
            .ok_or_else(malformed)?
            .as_str();

        let mut segments = inner.split('|');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(target), None, _) => Ok(ParsedLink {
                target: target.to_string(),
                alias: None,
            }),
            (Some(target), Some(alias), None) => Ok(ParsedLink {
                target: target.to_string(),
                alias: Some(alias.to_string()),
            }),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for ParsedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "[[{}|{}]]", self.target, alias),
            None => write!(f, "[[{}]]", self.target),
        }
    }
}

/// The full `[[...]]` token under a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkSpan {
    pub range: MyRange,
    /// Token text, brackets included.
    pub text: String,
}

impl Rangeable for LinkSpan {
    fn range(&self) -> &MyRange {
        &self.range
    }
}

/// Finds the `[[...]]` token enclosing `position`.
///
/// The opening `[[` must be on the cursor's line; the closing `]]` may be on
/// the same or the next line. A cursor on a bracket counts as inside the token.
/// No nesting: a `]]` between the opening pair and the cursor, or a `[[`
/// before the closing pair, means there is no enclosing token.
pub fn locate_link_span(rope: &Rope, position: Position) -> Option<LinkSpan> {
    let line_nr = position.line as usize;
    let line = line_chars(rope, line_nr)?;
    let mut cursor = (position.character as usize).min(line.len());

    // on `[` move right past the opening pair, on the second `]` move back onto the first
    match line.get(cursor) {
        Some('[') => {
            cursor += 1;
            if line.get(cursor) == Some(&'[') {
                cursor += 1;
            }
        }
        Some(']') if cursor > 0 && line[cursor - 1] == ']' => cursor -= 1,
        _ => {}
    }

    let start = rfind_pair(&line[..cursor], OPEN)?;
    if find_pair(&line[start + 2..cursor], CLOSE).is_some() {
        return None;
    }

    let line_start = rope.line_to_char(line_nr);
    let from = line_start + cursor;
    let to = rope.line_to_char((line_nr + 2).min(rope.len_lines()));
    let rest = rope.slice(from..to).chars().collect::<Vec<_>>();

    let close = find_pair(&rest, CLOSE)?;
    if find_pair(&rest[..close], OPEN).is_some() {
        return None;
    }

    let span = (line_start + start)..(from + close + 2);
    Some(LinkSpan {
        range: MyRange::from_char_range(rope, span.clone()),
        text: rope.slice(span).to_string(),
    })
}

/// A link that is still being typed: `[[` left of the cursor, maybe not closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialLink {
    /// From the opening `[[` through the cursor and up to two `]` right after it.
    pub range: MyRange,
    /// Text typed between `[[` and the cursor.
    pub query: String,
}

/// Locates the link being typed at `position`, for completion.
pub fn locate_partial_link(rope: &Rope, position: Position) -> Option<PartialLink> {
    let line_nr = position.line as usize;
    let line = line_chars(rope, line_nr)?;
    let cursor = (position.character as usize).min(line.len());

    let start = rfind_pair(&line[..cursor], OPEN)?;
    let typed = &line[start + 2..cursor];
    if find_pair(typed, CLOSE).is_some() {
        return None;
    }

    let closing = line[cursor..]
        .iter()
        .take(2)
        .take_while(|c| **c == ']')
        .count();

    let line_start = rope.line_to_char(line_nr);
    Some(PartialLink {
        range: MyRange::from_char_range(
            rope,
            (line_start + start)..(line_start + cursor + closing),
        ),
        query: typed.iter().collect(),
    })
}

/// Chars of one line without its line ending.
fn line_chars(rope: &Rope, line_nr: usize) -> Option<Vec<char>> {
    let line = rope.get_line(line_nr)?;
    Some(
        line.chars()
            .take_while(|c| *c != '\n' && *c != '\r')
            .collect(),
    )
}

fn find_pair(chars: &[char], pair: [char; 2]) -> Option<usize> {
    chars.windows(2).position(|window| window == pair)
}

fn rfind_pair(chars: &[char], pair: [char; 2]) -> Option<usize> {
    chars.windows(2).rposition(|window| window == pair)
}
