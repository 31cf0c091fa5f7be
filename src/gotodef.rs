use ropey::Rope;
use tower_lsp::lsp_types::{Location, Position, Range};

use crate::documents::DocumentSource;
use crate::error::{Result, VaultError};
use crate::vault::Vault;
use crate::wikilink::{locate_link_span, ParsedLink};

/// The start of the note linked at `position`.
pub fn goto_definition(
    vault: &Vault,
    documents: &dyn DocumentSource,
    rope: &Rope,
    position: Position,
) -> Result<Option<Location>> {
    let Some(span) = locate_link_span(rope, position) else {
        return Ok(None);
    };

    let link = ParsedLink::parse(&span.text)?;
    let location = vault.resolve(&link);

    let not_found = || VaultError::NoteNotFound(location.path().to_path_buf());
    if !vault.note_exists(&location, documents) {
        return Err(not_found());
    }
    let uri = location.uri().ok_or_else(not_found)?;

    Ok(Some(Location {
        uri,
        range: Range {
            start: Position::new(0, 0),
            end: Position::new(0, 0),
        },
    }))
}
