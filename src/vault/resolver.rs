use std::path::{Path, PathBuf};

use crate::documents::DocumentSource;
use crate::error::{Result, VaultError};
use crate::wikilink::ParsedLink;

use super::helpers::NOTE_EXTENSION;
use super::NoteLocation;

/// Maps link targets to note locations and fetches note text.
///
/// Resolution is purely lexical and never consults the index: an unindexed
/// note that exists is still resolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteResolver {
    root_dir: PathBuf,
}

impl NoteResolver {
    /// `root_dir` must be canonical.
    pub fn new(root_dir: &Path) -> NoteResolver {
        NoteResolver {
            root_dir: root_dir.to_path_buf(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// `<root>/<target>.md`, canonicalized.
    pub fn resolve(&self, link: &ParsedLink) -> NoteLocation {
        let target = link.target.trim_start_matches('/');
        let relative = format!("{target}.{NOTE_EXTENSION}");
        NoteLocation::new(&self.root_dir, Path::new(&relative))
    }

    /// Live buffer text if the editor has the note open, else the file contents.
    pub fn fetch_content(
        &self,
        location: &NoteLocation,
        documents: &dyn DocumentSource,
    ) -> Result<String> {
        if let Some(text) = location.uri().and_then(|uri| documents.live_text(&uri)) {
            return Ok(text);
        }

        std::fs::read_to_string(location.path())
            .map_err(|_| VaultError::NoteNotFound(location.path().to_path_buf()))
    }

    pub fn exists(&self, location: &NoteLocation, documents: &dyn DocumentSource) -> bool {
        location
            .uri()
            .is_some_and(|uri| documents.live_text(&uri).is_some())
            || location.path().is_file()
    }
}
