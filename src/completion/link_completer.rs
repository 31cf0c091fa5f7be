use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Position, TextEdit,
};
use tracing::debug;

use crate::{
    vault::{CompletionCandidate, MyRange, Vault},
    wikilink::locate_partial_link,
};

use super::{Completable, Completer, CompletionData, Context};

/// Completes the `[[...` being typed with every name of every indexed note.
pub struct WikiLinkCompleter<'a> {
    /// The typed link including `[[` and any closing brackets right after the cursor.
    pub full_range: MyRange,
    /// Text between `[[` and the cursor.
    pub query: String,
    pub vault: &'a Vault,
}

impl<'a> Completer<'a> for WikiLinkCompleter<'a> {
    fn construct(context: Context<'a>, line: usize, character: usize) -> Option<Self> {
        let position = Position {
            line: line as u32,
            character: character as u32,
        };
        let partial = locate_partial_link(context.rope, position)?;

        Some(WikiLinkCompleter {
            full_range: partial.range,
            query: partial.query,
            vault: context.vault,
        })
    }

    fn completions(&self) -> Vec<impl Completable<'a, Self>> {
        debug!(query = %self.query, "completing wikilink");
        // candidates are taken from the current snapshot on every request
        self.vault.completion_candidates()
    }

    type FilterParams = String;
    fn completion_filter_text(&self, label: String) -> String {
        label
    }
}

impl<'a> Completable<'a, WikiLinkCompleter<'a>> for CompletionCandidate {
    fn completions(&self, completer: &WikiLinkCompleter<'a>) -> Option<CompletionItem> {
        let data = serde_json::to_value(CompletionData {
            path: self.location.path().to_path_buf(),
        })
        .ok()?;

        Some(CompletionItem {
            label: self.label.clone(),
            kind: Some(CompletionItemKind::REFERENCE),
            detail: self.alias.as_ref().map(|_| self.location.refname().to_string()),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range: *completer.full_range,
                new_text: self.label.clone(),
            })),
            filter_text: Some(completer.completion_filter_text(self.label.clone())),
            data: Some(data),
            ..Default::default()
        })
    }
}
