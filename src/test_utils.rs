//! Shared test helpers. Only compiled for tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::Settings;
use crate::vault::Vault;

/// Creates a temporary vault directory for testing.
///
/// The vault lives in a `vault` subdirectory: temp directories can sit under
/// hidden paths like `/tmp/.tmpXXXXX`, and the returned path must not be one.
/// Keep the `TempDir` alive for the duration of the test.
pub fn create_test_vault_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let vault_dir = temp_dir.path().join("vault");
    fs::create_dir(&vault_dir).expect("Failed to create vault subdirectory");
    (temp_dir, vault_dir)
}

/// Creates a vault, lets `setup_fn` write notes into it, then builds the index
/// with default settings.
///
/// ```ignore
/// let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
///     std::fs::write(dir.join("Foo.md"), "foo").unwrap();
/// });
/// ```
pub fn create_test_vault<F>(setup_fn: F) -> (TempDir, PathBuf, Vault)
where
    F: FnOnce(&PathBuf),
{
    create_test_vault_with(Settings::default(), setup_fn)
}

pub fn create_test_vault_with<F>(settings: Settings, setup_fn: F) -> (TempDir, PathBuf, Vault)
where
    F: FnOnce(&PathBuf),
{
    let (temp_dir, vault_dir) = create_test_vault_dir();
    setup_fn(&vault_dir);
    let vault =
        Vault::construct_vault(&settings, &vault_dir).expect("Failed to construct test vault");
    (temp_dir, vault_dir, vault)
}

/// Writes `text` to `relative` inside the vault, creating parent directories.
pub fn write_note(vault_dir: &PathBuf, relative: &str, text: &str) -> PathBuf {
    let path = vault_dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create note directory");
    }
    fs::write(&path, text).expect("Failed to write note");
    path
}
