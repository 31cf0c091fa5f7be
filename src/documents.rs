//! Live in-memory buffers reported by the editor.
//!
//! The engine asks a [`DocumentSource`] first and falls back to the file on
//! disk when it has nothing for a note.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use ropey::Rope;
use tower_lsp::lsp_types::Url;

pub trait DocumentSource {
    /// Text of the open buffer for `uri`, if the editor has one.
    fn live_text(&self, uri: &Url) -> Option<String>;
}

/// No open buffers; every lookup goes to disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskOnly;

impl DocumentSource for DiskOnly {
    fn live_text(&self, _uri: &Url) -> Option<String> {
        None
    }
}

impl DocumentSource for HashMap<Url, String> {
    fn live_text(&self, uri: &Url) -> Option<String> {
        self.get(&document_key(uri)).cloned()
    }
}

/// Open documents keyed by canonical file URI.
#[derive(Debug, Default)]
pub struct OpenDocuments {
    ropes: RwLock<HashMap<Url, Rope>>,
}

impl OpenDocuments {
    pub fn new() -> OpenDocuments {
        OpenDocuments::default()
    }

    /// Stores the full text of a document (open or full-sync change).
    pub fn open(&self, uri: &Url, text: &str) {
        self.ropes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document_key(uri), Rope::from_str(text));
    }

    pub fn close(&self, uri: &Url) {
        self.ropes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&document_key(uri));
    }

    pub fn rope(&self, uri: &Url) -> Option<Rope> {
        self.ropes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&document_key(uri))
            .cloned()
    }

    pub fn uris(&self) -> Vec<Url> {
        self.ropes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl DocumentSource for OpenDocuments {
    fn live_text(&self, uri: &Url) -> Option<String> {
        self.rope(uri).map(|rope| rope.to_string())
    }
}

/// File URIs are canonicalized so that the editor's URI and the one derived
/// from a resolved note agree; other schemes are kept as they are.
pub fn document_key(uri: &Url) -> Url {
    uri.to_file_path()
        .ok()
        .and_then(|path| std::fs::canonicalize(path).ok())
        .and_then(|path| Url::from_file_path(path).ok())
        .unwrap_or_else(|| uri.clone())
}
