use std::fs;

use crate::config::Settings;
use crate::documents::DiskOnly;
use crate::error::VaultError;
use crate::test_utils::{create_test_vault, create_test_vault_dir, write_note};
use crate::vault::{SharedVault, Vault};
use crate::wikilink::ParsedLink;

#[test]
fn no_root_is_fatal() {
    let err = Vault::from_roots(&[], Settings::default()).unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, VaultError::Configuration(_)));
}

#[test]
fn several_roots_are_fatal() {
    let (_temp_a, a) = create_test_vault_dir();
    let (_temp_b, b) = create_test_vault_dir();

    let err = Vault::from_roots(&[a, b], Settings::default()).unwrap_err();

    assert!(err.is_fatal());
    assert!(err.to_string().contains("multiple vault roots"));
}

#[test]
fn single_root_is_canonicalized() {
    let (_temp_dir, vault_dir) = create_test_vault_dir();
    fs::create_dir(vault_dir.join("sub")).unwrap();

    let vault = Vault::from_roots(&[vault_dir.join("sub/..")], Settings::default()).unwrap();

    assert_eq!(vault.root_dir(), fs::canonicalize(&vault_dir).unwrap());
    assert_eq!(vault.document_count(), 0);
}

#[test]
fn missing_root_is_fatal() {
    let (_temp_dir, vault_dir) = create_test_vault_dir();

    let err = Vault::new(&vault_dir.join("absent"), Settings::default()).unwrap_err();
    assert!(err.is_fatal());

    let file = write_note(&vault_dir, "file.md", "");
    assert!(Vault::new(&file, Settings::default()).unwrap_err().is_fatal());
}

#[test]
fn resolution_does_not_need_the_index() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|_| {});
    write_note(&vault_dir, "Later.md", "written after indexing");

    let location = vault.resolve(&ParsedLink::parse("[[Later]]").unwrap());

    assert!(vault.index().snapshot().is_empty());
    assert!(vault.note_exists(&location, &DiskOnly));
    assert_eq!(
        vault.fetch_content(&location, &DiskOnly).unwrap(),
        "written after indexing"
    );
}

#[test]
fn location_for_uri_round_trips() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "dir/Note.md", "");
    });
    let location = vault.location_for_path(&vault_dir.join("dir/Note.md"));

    let from_uri = vault.location_for_uri(&location.uri().unwrap()).unwrap();

    assert_eq!(from_uri, location);
    assert_eq!(from_uri.refname(), "dir/Note");
}

#[test]
fn candidates_are_regenerated_after_update() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "A.md", "");
    });
    let before = vault.completion_candidates();

    let b = write_note(&vault_dir, "B.md", "---\ntitle: Bee\n---\n");
    vault.update(&b);
    let after = vault.completion_candidates();

    assert_eq!(before.len(), 1);
    assert_eq!(
        after.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(),
        vec!["[[A]]", "[[B]]", "[[B|Bee]]"]
    );
}

#[test]
fn candidate_content_is_fetched_lazily() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "A.md", "first");
    });
    let candidate = vault.completion_candidates().remove(0);

    write_note(&vault_dir, "A.md", "second");

    assert_eq!(
        candidate.content(vault.resolver(), &DiskOnly).unwrap(),
        "second"
    );
}

#[test]
fn shared_vault_is_not_ready_until_set() {
    let shared = SharedVault::new();
    assert_eq!(shared.get().unwrap_err(), VaultError::VaultNotReady);
    assert!(!VaultError::VaultNotReady.is_fatal());

    let (_temp_dir, vault_dir, vault) = create_test_vault(|_| {});
    shared.set(vault);

    assert_eq!(
        shared.get().unwrap().root_dir(),
        fs::canonicalize(vault_dir).unwrap()
    );
}

#[test]
fn settings_travel_with_the_vault() {
    let (_temp_dir, vault_dir) = create_test_vault_dir();
    let settings = Settings {
        max_diagnostics: 7,
        ..Settings::default()
    };

    let vault = Vault::construct_vault(&settings, &vault_dir).unwrap();

    assert_eq!(vault.settings().max_diagnostics, 7);
}

#[test]
fn saves_before_ready_are_replayed() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "A.md", "first");
    });
    let shared = SharedVault::new();

    // saved after the initial build read it
    let a = write_note(&vault_dir, "A.md", "---\ntitle: Saved\n---\n");
    assert_eq!(shared.note_saved(&a).unwrap_err(), VaultError::VaultNotReady);

    let vault = shared.set(vault);

    assert_eq!(
        vault
            .completion_candidates()
            .iter()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>(),
        vec!["[[A]]", "[[A|Saved]]"]
    );
}

#[test]
fn saves_after_ready_update_immediately() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|_| {});
    let shared = SharedVault::new();
    shared.set(vault);

    let b = write_note(&vault_dir, "B.md", "");
    let vault = shared.note_saved(&b).unwrap();

    assert_eq!(vault.document_count(), 1);
}
