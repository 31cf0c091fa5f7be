//! Path helpers for the vault module.

use std::path::{Component, Path, PathBuf};

use pathdiff::diff_paths;

/// Extension of files that count as notes.
pub const NOTE_EXTENSION: &str = "md";

/// Vault-relative path without the note extension, e.g. `folder/Note`.
///
/// This is the default link target and wikilink label of a note.
pub fn get_vault_ref_path(root_dir: &Path, path: &Path) -> Option<String> {
    diff_paths(path, root_dir).and_then(|diff| {
        diff.with_extension("")
            .to_str()
            .map(|refname| refname.replace('\\', "/"))
    })
}

pub fn is_note_path(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(NOTE_EXTENSION)
}

/// Lexically resolves `.` and `..` components.
///
/// Used for paths that do not exist yet and therefore cannot be canonicalized.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_path_is_relative_stem() {
        let root = Path::new("/vault");

        assert_eq!(
            get_vault_ref_path(root, Path::new("/vault/Foo.md")),
            Some("Foo".to_string())
        );
        assert_eq!(
            get_vault_ref_path(root, Path::new("/vault/daily/2024-01-01.md")),
            Some("daily/2024-01-01".to_string())
        );
    }

    #[test]
    fn ref_path_keeps_inner_dots() {
        assert_eq!(
            get_vault_ref_path(Path::new("/vault"), Path::new("/vault/v1.2 notes.md")),
            Some("v1.2 notes".to_string())
        );
    }

    #[test]
    fn note_paths() {
        assert!(is_note_path(Path::new("a/b.md")));
        assert!(!is_note_path(Path::new("a/b.txt")));
        assert!(!is_note_path(Path::new("a/md")));
    }

    #[test]
    fn normalize_removes_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("/vault/./sub/../Note.md")),
            PathBuf::from("/vault/Note.md")
        );
    }
}
