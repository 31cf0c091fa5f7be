use std::collections::{BTreeSet, HashMap};

use ropey::Rope;
use serde_yaml::Value;
use tower_lsp::lsp_types::{RenameParams, TextEdit, WorkspaceEdit};
use tracing::debug;

use crate::documents::DocumentSource;
use crate::error::{Result, VaultError};
use crate::vault::metadata::{ALIASES_KEY, TITLE_KEY};
use crate::vault::{MetadataBlock, MyRange, NoteLocation, Vault};

/// Replacement for the metadata block of a note; the body is never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEdit {
    /// `[0, body_offset)` of the original text.
    pub range: MyRange,
    pub new_text: String,
}

impl From<AliasEdit> for TextEdit {
    fn from(edit: AliasEdit) -> TextEdit {
        TextEdit {
            range: *edit.range,
            new_text: edit.new_text,
        }
    }
}

/// Computes the metadata block that makes `alias` a name of the note.
///
/// Without a `title` the alias becomes the title. Otherwise it joins the
/// `aliases` list, which is kept sorted and free of duplicates. An alias equal
/// to the title, or one already listed, leaves the block unchanged.
pub fn add_alias(note_text: &str, alias: &str) -> Result<AliasEdit> {
    let mut metadata = MetadataBlock::parse(note_text)?;

    match metadata.title() {
        None if !metadata.contains_key(TITLE_KEY) => {
            metadata.set(TITLE_KEY, Value::String(alias.to_string()));
        }
        Some(title) if title == alias => {}
        _ => {
            let existing = metadata.aliases();
            if !existing.iter().any(|known| known == alias) {
                let merged = existing
                    .into_iter()
                    .chain([alias.to_string()])
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .map(Value::String)
                    .collect();
                metadata.set(ALIASES_KEY, Value::Sequence(merged));
            }
        }
    }

    let rope = Rope::from_str(note_text);
    Ok(AliasEdit {
        range: MyRange::from_range(&rope, 0..metadata.body_offset()),
        new_text: metadata.serialize(),
    })
}

/// A workspace edit adding `alias` to the note at `location`.
///
/// The note text comes from the live buffer when the editor has it open.
pub fn alias_workspace_edit(
    vault: &Vault,
    documents: &dyn DocumentSource,
    location: &NoteLocation,
    alias: &str,
) -> Result<WorkspaceEdit> {
    let text = vault.fetch_content(location, documents)?;
    let edit = add_alias(&text, alias)?;
    let uri = location
        .uri()
        .ok_or_else(|| VaultError::NoteNotFound(location.path().to_path_buf()))?;

    debug!(note = %location.refname(), alias, "adding alias");

    Ok(WorkspaceEdit {
        changes: Some(HashMap::from([(uri, vec![edit.into()])])),
        ..Default::default()
    })
}

/// Renaming a note adds the new name as its title or alias.
pub fn rename(
    vault: &Vault,
    documents: &dyn DocumentSource,
    params: &RenameParams,
) -> Result<Option<WorkspaceEdit>> {
    let Some(location) = vault.location_for_uri(&params.text_document_position.text_document.uri)
    else {
        return Ok(None);
    };

    alias_workspace_edit(vault, documents, &location, &params.new_name).map(Some)
}
