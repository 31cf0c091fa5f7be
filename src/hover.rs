//! Hover provider for wikilinks.
//!
//! Hovering a `[[target]]` or `[[target|alias]]` token shows the linked
//! note's text as markdown. An open, unsaved buffer of the note wins over the
//! file on disk.
//!
//! # Configuration
//!
//! Hover can be disabled via [`Settings::hover`](crate::config::Settings::hover):
//!
//! ```toml
//! hover = false
//! ```

use ropey::Rope;
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::documents::DocumentSource;
use crate::error::Result;
use crate::vault::Vault;
use crate::wikilink::{locate_link_span, ParsedLink};

/// Preview of the note linked at `position`.
///
/// `Ok(None)` when hover is disabled or the cursor is not on a link.
/// A malformed link or a missing note is an error so the caller can tell the
/// user about it.
pub fn hover(
    vault: &Vault,
    documents: &dyn DocumentSource,
    rope: &Rope,
    position: Position,
) -> Result<Option<Hover>> {
    if !vault.settings().hover {
        return Ok(None);
    }

    let Some(span) = locate_link_span(rope, position) else {
        return Ok(None);
    };

    let link = ParsedLink::parse(&span.text)?;
    let content = vault.fetch_content(&vault.resolve(&link), documents)?;

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: content,
        }),
        range: Some(*span.range),
    }))
}
