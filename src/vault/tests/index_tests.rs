use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::VaultError;
use crate::test_utils::{create_test_vault, create_test_vault_dir, write_note};
use crate::vault::{IndexEntry, NoteIndex, NoteLocation};

fn labels(index: &NoteIndex) -> Vec<String> {
    index
        .snapshot()
        .completion_candidates()
        .map(|candidate| candidate.label.clone())
        .collect()
}

fn canonical(path: &Path) -> std::path::PathBuf {
    fs::canonicalize(path).unwrap()
}

#[test]
fn scenario_filename_and_title_candidates() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "Foo.md", "just text");
        write_note(dir, "Bar.md", "---\ntitle: B\n---\nbar");
    });

    let labels = labels(vault.index());

    assert!(labels.contains(&"[[Foo]]".to_string()));
    assert!(labels.contains(&"[[Bar]]".to_string()));
    assert!(labels.contains(&"[[Bar|B]]".to_string()));
    assert_eq!(labels.len(), 3);

    let foo = vault.resolve(&crate::wikilink::ParsedLink::parse("[[Foo]]").unwrap());
    assert_eq!(foo.path(), canonical(&vault_dir.join("Foo.md")));
}

#[test]
fn rebuild_covers_every_note_recursively() {
    let (_temp_dir, _vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "top.md", "");
        write_note(dir, "a/b/deep.md", "---\naliases: [d1, d2]\n---\n");
        write_note(dir, "a/notes.txt", "[[not a note]]");
        write_note(dir, "a/image.png", "");
        write_note(dir, "a/README.MD", "upper-case extension is not a note");
    });

    assert_eq!(
        labels(vault.index()),
        vec!["[[a/b/deep]]", "[[a/b/deep|d1]]", "[[a/b/deep|d2]]", "[[top]]"]
    );
    assert_eq!(vault.document_count(), 2);
}

#[test]
fn one_candidate_per_distinct_name() {
    let (_temp_dir, _vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "N.md", "---\ntitle: Same\naliases: [Same, Other]\n---\n");
    });

    assert_eq!(
        labels(vault.index()),
        vec!["[[N]]", "[[N|Other]]", "[[N|Same]]"]
    );
}

#[test]
fn invalid_metadata_still_indexes_filename() {
    let (_temp_dir, _vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "Broken.md", "---\ntitle: [unclosed\n---\nbody");
    });

    assert_eq!(labels(vault.index()), vec!["[[Broken]]"]);
}

#[test]
fn hidden_directories_are_skipped() {
    let (_temp_dir, _vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "visible.md", "");
        write_note(dir, ".obsidian/workspace.md", "");
        write_note(dir, ".trash/old.md", "");
        write_note(dir, ".hidden.md", "");
    });

    assert_eq!(labels(vault.index()), vec!["[[visible]]"]);
}

#[test]
fn hidden_directories_can_be_included() {
    let (_temp_dir, vault_dir) = create_test_vault_dir();
    write_note(&vault_dir, ".drafts/idea.md", "");
    let index = NoteIndex::new(&canonical(&vault_dir), false);

    assert_eq!(index.rebuild(), Ok(1));
    assert_eq!(labels(&index), vec!["[[.drafts/idea]]"]);
}

#[test]
fn update_inserts_replaces_and_removes() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "Old.md", "");
    });

    let new = write_note(&vault_dir, "New.md", "---\ntitle: Fresh\n---\n");
    assert!(vault.update(&new));
    assert_eq!(
        labels(vault.index()),
        vec!["[[New]]", "[[New|Fresh]]", "[[Old]]"]
    );

    write_note(&vault_dir, "New.md", "---\ntitle: Renamed\n---\n");
    assert!(vault.update(&new));
    assert_eq!(
        labels(vault.index()),
        vec!["[[New]]", "[[New|Renamed]]", "[[Old]]"]
    );

    fs::remove_file(&new).unwrap();
    assert!(vault.update(&new));
    assert_eq!(labels(vault.index()), vec!["[[Old]]"]);
}

#[test]
fn update_ignores_non_notes() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|_| {});
    let text = write_note(&vault_dir, "notes.txt", "");

    assert!(!vault.update(&text));
    assert!(vault.index().snapshot().is_empty());
}

#[test]
fn update_matches_rebuild() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "A.md", "");
    });

    let b = write_note(&vault_dir, "sub/B.md", "---\naliases: bee\n---\n");
    vault.update(&b);
    let trashed = write_note(&vault_dir, ".trash/Old.md", "");
    vault.update(&trashed);
    let outside = write_note(&vault_dir.join("../elsewhere"), "X.md", "");
    vault.update(&outside);
    let incremental = labels(vault.index());
    assert_eq!(incremental, vec!["[[A]]", "[[sub/B]]", "[[sub/B|bee]]"]);

    vault.rebuild().unwrap();
    assert_eq!(labels(vault.index()), incremental);
}

#[test]
fn update_skips_paths_a_rebuild_would_skip() {
    let (temp_dir, vault_dir, vault) = create_test_vault(|_| {});

    let hidden = write_note(&vault_dir, ".trash/Old.md", "");
    let hidden_file = write_note(&vault_dir, "sub/.draft.md", "");
    let outside = write_note(&temp_dir.path().to_path_buf(), "elsewhere/X.md", "");

    assert!(!vault.update(&hidden));
    assert!(!vault.update(&hidden_file));
    assert!(!vault.update(&outside));
    assert!(vault.index().snapshot().is_empty());
}

#[test]
fn update_indexes_hidden_paths_when_they_are_included() {
    let (_temp_dir, vault_dir) = create_test_vault_dir();
    let index = NoteIndex::new(&canonical(&vault_dir), false);

    let hidden = write_note(&vault_dir, ".drafts/idea.md", "");

    assert!(index.update(&hidden));
    assert_eq!(labels(&index), vec!["[[.drafts/idea]]"]);
}

#[test]
fn snapshots_are_isolated_from_later_updates() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "A.md", "");
    });

    let before = vault.index().snapshot();
    let b = write_note(&vault_dir, "B.md", "");
    vault.update(&b);

    assert_eq!(before.len(), 1);
    assert_eq!(vault.index().snapshot().len(), 2);
}

#[test]
fn unchanged_entries_are_shared_between_snapshots() {
    let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
        write_note(dir, "A.md", "");
    });
    let location = vault.location_for_path(&vault_dir.join("A.md"));

    let before = vault.index().snapshot();
    let b = write_note(&vault_dir, "B.md", "");
    vault.update(&b);
    let after = vault.index().snapshot();

    assert!(std::ptr::eq(
        before.get(&location).unwrap(),
        after.get(&location).unwrap()
    ));
}

#[test]
fn entry_aliases_include_default_name() {
    let location = NoteLocation::new(Path::new("/vault"), Path::new("/vault/N.md"));
    let entry = IndexEntry::from_text(location, "---\ntitle: T\naliases: [x]\n---\n");

    assert_eq!(
        entry.aliases,
        BTreeSet::from([None, Some("T".to_string()), Some("x".to_string())])
    );
    assert_eq!(entry.candidates().len(), 3);
    assert_eq!(entry.candidates()[0].label, "[[N]]");
}

#[cfg(unix)]
#[test]
fn symlink_cycle_is_a_configuration_error() {
    let (_temp_dir, vault_dir) = create_test_vault_dir();
    write_note(&vault_dir, "a/note.md", "");
    std::os::unix::fs::symlink(&vault_dir, vault_dir.join("a/loop")).unwrap();

    let index = NoteIndex::new(&canonical(&vault_dir), true);

    assert!(matches!(index.rebuild(), Err(VaultError::Configuration(_))));
}

#[cfg(unix)]
#[test]
fn symlinked_directory_is_followed() {
    let (temp_dir, vault_dir) = create_test_vault_dir();
    let outside = temp_dir.path().join("outside");
    fs::create_dir(&outside).unwrap();
    fs::write(outside.join("linked.md"), "").unwrap();
    std::os::unix::fs::symlink(&outside, vault_dir.join("shared")).unwrap();

    let index = NoteIndex::new(&canonical(&vault_dir), true);

    assert_eq!(index.rebuild(), Ok(1));
}

#[cfg(unix)]
#[test]
fn symlinked_note_keeps_in_vault_name() {
    let (temp_dir, vault_dir) = create_test_vault_dir();
    let outside = temp_dir.path().join("outside");
    fs::create_dir(&outside).unwrap();
    fs::write(outside.join("linked.md"), "").unwrap();
    std::os::unix::fs::symlink(&outside, vault_dir.join("shared")).unwrap();

    let index = NoteIndex::new(&canonical(&vault_dir), true);
    index.rebuild().unwrap();

    assert_eq!(labels(&index), vec!["[[shared/linked]]"]);
}
