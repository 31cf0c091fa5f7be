//! Catalogue of the notes in the vault and the names they can be linked by.
//!
//! The index is published as immutable snapshots. Writers build a new
//! snapshot and swap it in; readers clone the current `Arc` and never observe
//! a half-built index.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::documents::DocumentSource;
use crate::error::{Result, VaultError};

use super::helpers::{is_note_path, normalize_path};
use super::metadata::MetadataBlock;
use super::{NoteLocation, NoteResolver};

/// One completion entry: a note under one of its names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionCandidate {
    /// `[[refname]]` or `[[refname|alias]]`.
    pub label: String,
    pub alias: Option<String>,
    pub location: NoteLocation,
}

impl CompletionCandidate {
    /// Note text for documentation previews, fetched on demand.
    pub fn content(&self, resolver: &NoteResolver, documents: &dyn DocumentSource) -> Result<String> {
        resolver.fetch_content(&self.location, documents)
    }
}

/// A note and its names at the time it was last indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub location: NoteLocation,
    /// Always contains `None` (the bare filename), then the declared title and aliases.
    pub aliases: BTreeSet<Option<String>>,
    candidates: Vec<CompletionCandidate>,
}

impl IndexEntry {
    pub fn from_text(location: NoteLocation, text: &str) -> IndexEntry {
        let mut aliases = BTreeSet::from([None]);

        match MetadataBlock::parse(text) {
            Ok(metadata) => aliases.extend(
                metadata
                    .title()
                    .into_iter()
                    .chain(metadata.aliases())
                    .map(Some),
            ),
            Err(err) => debug!(path = %location.path().display(), %err, "ignoring metadata block"),
        }

        let candidates = aliases
            .iter()
            .map(|alias| CompletionCandidate {
                label: location.wikilink(alias.as_deref()),
                alias: alias.clone(),
                location: location.clone(),
            })
            .collect();

        IndexEntry {
            location,
            aliases,
            candidates,
        }
    }

    pub fn candidates(&self) -> &[CompletionCandidate] {
        &self.candidates
    }
}

/// An immutable, complete view of the index.
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    entries: BTreeMap<NoteLocation, Arc<IndexEntry>>,
}

impl IndexSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, location: &NoteLocation) -> Option<&IndexEntry> {
        self.entries.get(location).map(Arc::as_ref)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values().map(Arc::as_ref)
    }

    /// One candidate per (note, alias) pair, ordered by path then alias.
    pub fn completion_candidates(&self) -> impl Iterator<Item = &CompletionCandidate> {
        self.entries().flat_map(IndexEntry::candidates)
    }
}

#[derive(Debug)]
pub struct NoteIndex {
    root_dir: PathBuf,
    ignore_hidden: bool,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    /// Serializes rebuild/update so a concurrent update cannot be lost.
    writer: Mutex<()>,
}

impl NoteIndex {
    /// An empty index for `root_dir`, which must be canonical.
    pub fn new(root_dir: &Path, ignore_hidden: bool) -> NoteIndex {
        NoteIndex {
            root_dir: root_dir.to_path_buf(),
            ignore_hidden,
            snapshot: RwLock::new(Arc::default()),
            writer: Mutex::new(()),
        }
    }

    /// The current snapshot. Hold on to it for one request only.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rescans the whole vault and publishes the result. Returns the note count.
    pub fn rebuild(&self) -> Result<usize> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let paths = self.walk()?;

        let entries: BTreeMap<NoteLocation, Arc<IndexEntry>> = paths
            .par_iter()
            .filter_map(|path| {
                let text = std::fs::read_to_string(path)
                    .map_err(|err| warn!(path = %path.display(), %err, "skipping unreadable note"))
                    .ok()?;
                let location = NoteLocation::new(&self.root_dir, path);
                let entry = IndexEntry::from_text(location.clone(), &text);
                Some((location, Arc::new(entry)))
            })
            .collect();

        let count = entries.len();
        self.publish(IndexSnapshot { entries });
        info!(root = %self.root_dir.display(), notes = count, "vault index rebuilt");

        Ok(count)
    }

    /// Re-indexes one file: inserts, replaces, or removes it if it is gone.
    ///
    /// Returns false when `path` is not a note a rebuild would index: not a
    /// `.md` file, outside the root, or hidden while hidden entries are skipped.
    pub fn update(&self, path: &Path) -> bool {
        if !is_note_path(path) || !self.in_scope(path) {
            debug!(path = %path.display(), "not indexing path");
            return false;
        }

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let location = NoteLocation::new(&self.root_dir, path);
        let mut entries = self.snapshot().entries.clone();

        match std::fs::read_to_string(location.path()) {
            Ok(text) => {
                debug!(path = %location.path().display(), "re-indexing note");
                let entry = IndexEntry::from_text(location.clone(), &text);
                entries.insert(location, Arc::new(entry));
            }
            Err(_) => {
                debug!(path = %location.path().display(), "removing vanished note");
                entries.remove(&location);
            }
        }

        self.publish(IndexSnapshot { entries });
        true
    }

    fn in_scope(&self, path: &Path) -> bool {
        match self.vault_relative(path) {
            Some(relative) => !(self.ignore_hidden && has_hidden_component(&relative)),
            None => false,
        }
    }

    /// `path` below the root, lexically first so symlinked directories keep their in-vault path.
    fn vault_relative(&self, path: &Path) -> Option<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        };

        if let Ok(relative) = normalize_path(&absolute).strip_prefix(&self.root_dir) {
            return Some(relative.to_path_buf());
        }

        // a removed note can only be canonicalized through its parent
        let canonical = std::fs::canonicalize(&absolute).ok().or_else(|| {
            let parent = std::fs::canonicalize(absolute.parent()?).ok()?;
            Some(parent.join(absolute.file_name()?))
        })?;
        canonical
            .strip_prefix(&self.root_dir)
            .ok()
            .map(Path::to_path_buf)
    }

    fn publish(&self, snapshot: IndexSnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }

    /// Every note file under the root. A symbolic link cycle is a configuration error.
    fn walk(&self) -> Result<Vec<PathBuf>> {
        let ignore_hidden = self.ignore_hidden;
        let mut paths = Vec::new();

        for entry in WalkDir::new(&self.root_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| !(ignore_hidden && is_hidden(entry)))
        {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_note_path(entry.path()) {
                        paths.push(entry.into_path());
                    }
                }
                Err(err) => match err.loop_ancestor() {
                    Some(ancestor) => {
                        return Err(VaultError::Configuration(format!(
                            "symbolic link cycle in vault: {} points back to {}",
                            err.path().map(|p| p.display().to_string()).unwrap_or_default(),
                            ancestor.display()
                        )))
                    }
                    None => warn!(%err, "skipping unreadable vault entry"),
                },
            }
        }

        Ok(paths)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    // the root itself may live under a hidden directory
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn has_hidden_component(relative: &Path) -> bool {
    relative
        .components()
        .any(|component| component.as_os_str().to_str().is_some_and(|name| name.starts_with('.')))
}
