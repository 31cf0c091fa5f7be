use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::Url;

use super::helpers::{get_vault_ref_path, normalize_path};

/// Absolute, canonical location of a note plus its vault-relative display name.
///
/// Two locations are equal iff their canonical paths are equal.
#[derive(Debug, Clone)]
pub struct NoteLocation {
    path: PathBuf,
    refname: String,
}

impl NoteLocation {
    /// `root_dir` must already be canonical. Relative `path`s are joined under it.
    ///
    /// Existing files are canonicalized (symlinks resolved); paths that do not
    /// exist yet are normalized lexically.
    pub fn new(root_dir: &Path, path: &Path) -> NoteLocation {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root_dir.join(path)
        };
        let lexical = normalize_path(&absolute);
        let path = std::fs::canonicalize(&absolute).unwrap_or_else(|_| lexical.clone());

        // a note reached through a symlinked directory keeps its in-vault name
        let named = if lexical.starts_with(root_dir) {
            &lexical
        } else {
            &path
        };
        let refname = get_vault_ref_path(root_dir, named).unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        NoteLocation { path, refname }
    }

    pub fn from_uri(root_dir: &Path, uri: &Url) -> Option<NoteLocation> {
        let path = uri.to_file_path().ok()?;
        Some(NoteLocation::new(root_dir, &path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Vault-relative stem, the default link target.
    pub fn refname(&self) -> &str {
        &self.refname
    }

    pub fn uri(&self) -> Option<Url> {
        Url::from_file_path(&self.path).ok()
    }

    /// `[[refname]]` or `[[refname|alias]]`.
    pub fn wikilink(&self, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => format!("[[{}|{}]]", self.refname, alias),
            None => format!("[[{}]]", self.refname),
        }
    }
}

impl PartialEq for NoteLocation {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for NoteLocation {}

impl Hash for NoteLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state)
    }
}

impl PartialOrd for NoteLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NoteLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}
