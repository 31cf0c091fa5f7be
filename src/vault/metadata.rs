//! The leading metadata block (frontmatter) of a note.
//!
//! ```markdown
//! ---
//! title: Some title
//! aliases: [one, two]
//! ---
//! body
//! ```
//!
//! The block is kept verbatim next to its parsed fields so that an unmodified
//! block serializes back to exactly the bytes it was read from.

use serde_yaml::{Mapping, Value};

use crate::error::{Result, VaultError};

const DELIMITER: &str = "---";

pub const TITLE_KEY: &str = "title";
pub const ALIASES_KEY: &str = "aliases";

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataBlock {
    fields: Mapping,
    /// The block as it appeared in the note, delimiters and line ending included.
    raw: String,
    /// Line ending after the closing delimiter ("\n", "\r\n" or "" at end of text).
    terminator: String,
    /// Line ending used for the lines of a rewritten block.
    line_ending: &'static str,
    present: bool,
    modified: bool,
}

impl MetadataBlock {
    /// Parses the block at the start of `text`.
    ///
    /// Text that does not open with a `---` line, or never closes the block,
    /// has an empty, absent block and `body_offset() == 0`.
    pub fn parse(text: &str) -> Result<MetadataBlock> {
        let line_ending = line_ending(text);
        let Some((yaml, raw, terminator)) = split_block(text) else {
            return Ok(MetadataBlock::absent(line_ending));
        };

        let fields = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(yaml) {
                Ok(Value::Mapping(fields)) => fields,
                Ok(Value::Null) => Mapping::new(),
                Ok(_) => {
                    return Err(VaultError::InvalidMetadata(
                        "metadata block is not a key/value mapping".to_string(),
                    ))
                }
                Err(err) => return Err(VaultError::InvalidMetadata(err.to_string())),
            }
        };

        Ok(MetadataBlock {
            fields,
            raw: raw.to_string(),
            terminator: terminator.to_string(),
            line_ending,
            present: true,
            modified: false,
        })
    }

    /// Parses the block and returns it together with the untouched body.
    pub fn split(text: &str) -> Result<(MetadataBlock, &str)> {
        let block = MetadataBlock::parse(text)?;
        let body = &text[block.body_offset()..];
        Ok((block, body))
    }

    fn absent(line_ending: &'static str) -> MetadataBlock {
        MetadataBlock {
            fields: Mapping::new(),
            raw: String::new(),
            terminator: line_ending.to_string(),
            line_ending,
            present: false,
            modified: false,
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Byte offset where the body starts in the text this block was parsed from.
    pub fn body_offset(&self) -> usize {
        self.raw.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().filter_map(Value::as_str)
    }

    /// Inserts or replaces `key`. New keys are appended after the existing ones.
    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(Value::String(key.to_string()), value);
        self.modified = true;
    }

    pub fn title(&self) -> Option<String> {
        self.get(TITLE_KEY).and_then(scalar_to_string)
    }

    /// Declared aliases. A single scalar counts as a one-element list.
    pub fn aliases(&self) -> Vec<String> {
        match self.get(ALIASES_KEY) {
            Some(Value::Sequence(values)) => values.iter().filter_map(scalar_to_string).collect(),
            Some(value) => scalar_to_string(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// The block text to put in front of the body.
    ///
    /// Unmodified blocks return their original text byte for byte.
    pub fn serialize(&self) -> String {
        if !self.modified {
            return self.raw.clone();
        }

        let yaml = if self.fields.is_empty() {
            String::new()
        } else {
            // Serializing a mapping of plain YAML values cannot fail.
            serde_yaml::to_string(&self.fields).unwrap_or_default()
        };
        let yaml = match self.line_ending {
            "\n" => yaml,
            line_ending => yaml.replace('\n', line_ending),
        };

        format!(
            "{DELIMITER}{}{yaml}{DELIMITER}{}",
            self.line_ending, self.terminator
        )
    }
}

/// Returns `(yaml, whole block, terminator)` when `text` opens with a closed block.
fn split_block(text: &str) -> Option<(&str, &str, &str)> {
    let opening = [("---\n", 4), ("---\r\n", 5)]
        .into_iter()
        .find(|(prefix, _)| text.starts_with(prefix))
        .map(|(_, len)| len)?;

    let mut offset = opening;
    for line in text[opening..].split_inclusive('\n') {
        let content = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if content == DELIMITER {
            let yaml = &text[opening..offset];
            let end = offset + line.len();
            return Some((yaml, &text[..end], &line[DELIMITER.len()..]));
        }
        offset += line.len();
    }

    None
}

/// The ending of the first line of `text`, "\n" when it has none.
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(end) if text[..end].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
