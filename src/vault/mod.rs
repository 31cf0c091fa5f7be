mod helpers;
mod index;
mod location;
pub mod metadata;
mod resolver;
mod types;

#[cfg(test)]
mod tests;

pub use helpers::{get_vault_ref_path, is_note_path, NOTE_EXTENSION};
pub use index::{CompletionCandidate, IndexEntry, IndexSnapshot, NoteIndex};
pub use location::NoteLocation;
pub use metadata::MetadataBlock;
pub use resolver::NoteResolver;
pub use types::{MyRange, Rangeable};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use itertools::Itertools;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::config::Settings;
use crate::documents::DocumentSource;
use crate::error::{Result, VaultError};
use crate::wikilink::ParsedLink;

/// The vault: one canonical root directory, its note index and the resolver.
///
/// Created once per root. The index inside is the only mutable part and is
/// refreshed through [`Vault::rebuild`] and [`Vault::update`].
#[derive(Debug)]
pub struct Vault {
    root_dir: PathBuf,
    settings: Settings,
    index: NoteIndex,
    resolver: NoteResolver,
}

impl Vault {
    /// Picks the single vault root. Zero or several roots are a configuration error.
    pub fn from_roots(roots: &[PathBuf], settings: Settings) -> Result<Vault> {
        match roots {
            [root] => Vault::new(root, settings),
            [] => Err(VaultError::Configuration(
                "no vault root was supplied".to_string(),
            )),
            _ => Err(VaultError::Configuration(format!(
                "multiple vault roots are not supported: {}",
                roots.iter().map(|root| root.display()).join(", ")
            ))),
        }
    }

    /// A vault with an empty index. Call [`Vault::rebuild`] to populate it.
    pub fn new(root_dir: &Path, settings: Settings) -> Result<Vault> {
        let root_dir = std::fs::canonicalize(root_dir)
            .ok()
            .filter(|root| root.is_dir())
            .ok_or_else(|| {
                VaultError::Configuration(format!(
                    "vault root {} is not a directory",
                    root_dir.display()
                ))
            })?;

        Ok(Vault {
            index: NoteIndex::new(&root_dir, settings.ignore_hidden),
            resolver: NoteResolver::new(&root_dir),
            root_dir,
            settings,
        })
    }

    /// A vault with a fully built index.
    pub fn construct_vault(settings: &Settings, root_dir: &Path) -> Result<Vault> {
        let vault = Vault::new(root_dir, settings.clone())?;
        vault.rebuild()?;
        Ok(vault)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> &NoteIndex {
        &self.index
    }

    pub fn resolver(&self) -> &NoteResolver {
        &self.resolver
    }

    pub fn rebuild(&self) -> Result<usize> {
        self.index.rebuild()
    }

    pub fn update(&self, path: &Path) -> bool {
        self.index.update(path)
    }

    pub fn document_count(&self) -> usize {
        self.index.snapshot().len()
    }

    /// A fresh candidate list built from the current snapshot.
    pub fn completion_candidates(&self) -> Vec<CompletionCandidate> {
        self.index
            .snapshot()
            .completion_candidates()
            .cloned()
            .collect()
    }

    pub fn resolve(&self, link: &ParsedLink) -> NoteLocation {
        self.resolver.resolve(link)
    }

    pub fn fetch_content(
        &self,
        location: &NoteLocation,
        documents: &dyn DocumentSource,
    ) -> Result<String> {
        self.resolver.fetch_content(location, documents)
    }

    pub fn note_exists(&self, location: &NoteLocation, documents: &dyn DocumentSource) -> bool {
        self.resolver.exists(location, documents)
    }

    pub fn location_for_path(&self, path: &Path) -> NoteLocation {
        NoteLocation::new(&self.root_dir, path)
    }

    pub fn location_for_uri(&self, uri: &Url) -> Option<NoteLocation> {
        NoteLocation::from_uri(&self.root_dir, uri)
    }
}

/// Holds the vault once initialization has finished.
///
/// Saves reported before that are kept and replayed into the index when the
/// vault is set, so a rebuild that read a file before it was saved does not
/// leave a stale entry behind.
#[derive(Debug, Default)]
pub struct SharedVault {
    vault: RwLock<Option<Arc<Vault>>>,
    /// Lock order: `deferred_saves` before `vault`.
    deferred_saves: Mutex<Vec<PathBuf>>,
}

impl SharedVault {
    pub fn new() -> SharedVault {
        SharedVault::default()
    }

    /// The vault, or `VaultNotReady` until [`SharedVault::set`] was called.
    pub fn get(&self) -> Result<Arc<Vault>> {
        self.vault
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(VaultError::VaultNotReady)
    }

    /// Publishes `vault` after replaying the saves deferred while it was built.
    pub fn set(&self, vault: Vault) -> Arc<Vault> {
        let mut deferred = self
            .deferred_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for path in deferred.drain(..) {
            debug!(path = %path.display(), "replaying save");
            vault.update(&path);
        }

        let vault = Arc::new(vault);
        *self.vault.write().unwrap_or_else(PoisonError::into_inner) = Some(vault.clone());
        vault
    }

    /// Re-indexes a saved file. Before the vault is set the path is deferred
    /// and `VaultNotReady` is returned.
    pub fn note_saved(&self, path: &Path) -> Result<Arc<Vault>> {
        let mut deferred = self
            .deferred_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match self.get() {
            Ok(vault) => {
                drop(deferred);
                vault.update(path);
                Ok(vault)
            }
            Err(err) => {
                deferred.push(path.to_path_buf());
                Err(err)
            }
        }
    }
}
