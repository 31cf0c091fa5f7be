use ropey::Rope;
use tower_lsp::lsp_types::{CodeAction, CodeActionKind, CodeActionOrCommand, Range};
use tracing::debug;

use crate::documents::DocumentSource;
use crate::rename::alias_workspace_edit;
use crate::vault::Vault;
use crate::wikilink::{locate_link_span, ParsedLink};

/// Quick fixes for the link at the start of `range`.
///
/// A link written with an alias offers to record that alias in the target note.
pub fn code_actions(
    vault: &Vault,
    documents: &dyn DocumentSource,
    rope: &Rope,
    range: Range,
) -> Vec<CodeActionOrCommand> {
    if !vault.settings().code_actions {
        return Vec::new();
    }

    let Some(link) = locate_link_span(rope, range.start)
        .and_then(|span| ParsedLink::parse(&span.text).ok())
    else {
        return Vec::new();
    };
    let Some(alias) = link.alias.as_deref() else {
        return Vec::new();
    };

    let location = vault.resolve(&link);
    let edit = match alias_workspace_edit(vault, documents, &location, alias) {
        Ok(edit) => edit,
        Err(err) => {
            debug!(%err, "no alias action for link");
            return Vec::new();
        }
    };

    vec![CodeActionOrCommand::CodeAction(CodeAction {
        title: format!(
            "Add \"{alias}\" as title (or alias) into {}",
            location.path().display()
        ),
        kind: Some(CodeActionKind::QUICKFIX),
        edit: Some(edit),
        ..Default::default()
    })]
}
