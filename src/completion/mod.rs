use ropey::Rope;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionList, CompletionResponse, Documentation, MarkupContent, MarkupKind,
    Position,
};
use tracing::debug;

use crate::{documents::DocumentSource, vault::Vault};

use self::link_completer::WikiLinkCompleter;

mod link_completer;

#[derive(Clone, Copy)]
pub struct Context<'a> {
    vault: &'a Vault,
    rope: &'a Rope,
}

pub trait Completer<'a>: Sized {
    fn construct(context: Context<'a>, line: usize, character: usize) -> Option<Self>
    where
        Self: Sized + Completer<'a>;

    fn completions(&self) -> Vec<impl Completable<'a, Self>>
    where
        Self: Sized;

    type FilterParams;
    /// Completers like nvim-cmp filter on the typed text, so define the filter text explicitly
    fn completion_filter_text(&self, params: Self::FilterParams) -> String;
}

pub trait Completable<'a, T: Completer<'a>>: Sized {
    fn completions(&self, completer: &T) -> Option<CompletionItem>;
}

/// Payload carried by a completion item until it is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionData {
    pub path: PathBuf,
}

pub fn get_completions(
    vault: &Vault,
    rope: &Rope,
    position: Position,
) -> Option<CompletionResponse> {
    let context = Context { vault, rope };

    run_completer::<WikiLinkCompleter>(context, position.line, position.character)
}

fn run_completer<'a, T: Completer<'a>>(
    context: Context<'a>,
    line: u32,
    character: u32,
) -> Option<CompletionResponse> {
    let completer = T::construct(context, line as usize, character as usize)?;

    let items = completer
        .completions()
        .iter()
        .filter_map(|completable| completable.completions(&completer))
        .collect::<Vec<CompletionItem>>();

    Some(CompletionResponse::List(CompletionList {
        is_incomplete: false,
        items,
    }))
}

/// Fills in the note text as documentation for an item produced by [`get_completions`].
pub fn resolve_completion(
    vault: &Vault,
    documents: &dyn DocumentSource,
    mut item: CompletionItem,
) -> CompletionItem {
    if !vault.settings().hover {
        return item;
    }

    let Some(data) = item
        .data
        .clone()
        .and_then(|data| serde_json::from_value::<CompletionData>(data).ok())
    else {
        return item;
    };

    let location = vault.location_for_path(&data.path);
    match vault.fetch_content(&location, documents) {
        Ok(content) => {
            item.documentation = Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: content,
            }))
        }
        Err(err) => debug!(%err, "no documentation for completion item"),
    }

    item
}
