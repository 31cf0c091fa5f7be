//! Offline vault check: validates every note without an editor attached.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use rayon::prelude::*;
use tracing::info;

use crate::config::Settings;
use crate::diagnostics::{validate, LinkDiagnostic};
use crate::documents::DiskOnly;
use crate::vault::{NoteLocation, Vault};

/// Builds the index for `root_dir` and validates the links of every note.
///
/// Findings are ordered by note path, then by position.
pub fn check_vault(root_dir: &Path) -> anyhow::Result<Vec<(NoteLocation, LinkDiagnostic)>> {
    let settings = Settings::load_or_default(root_dir);
    let vault = Vault::construct_vault(&settings, root_dir)
        .with_context(|| format!("Failed to index vault {}", root_dir.display()))?;

    let snapshot = vault.index().snapshot();
    let locations = snapshot
        .entries()
        .map(|entry| &entry.location)
        .collect::<Vec<_>>();

    let findings = locations
        .par_iter()
        .flat_map_iter(|location| {
            let text = vault.fetch_content(location, &DiskOnly).unwrap_or_default();
            validate(&vault, &DiskOnly, &text)
                .into_iter()
                .map(|diagnostic| ((*location).clone(), diagnostic))
        })
        .collect::<Vec<_>>();

    info!(notes = locations.len(), findings = findings.len(), "vault checked");
    Ok(findings)
}

/// `path:line:col: severity: message`, with a vault-relative path and 1-based line and column.
pub fn format_finding(root_dir: &Path, location: &NoteLocation, diagnostic: &LinkDiagnostic) -> String {
    let path = pathdiff::diff_paths(location.path(), root_dir)
        .unwrap_or_else(|| location.path().to_path_buf());

    format!(
        "{}:{}:{}: {}: {}",
        path.display(),
        diagnostic.range.start.line + 1,
        diagnostic.range.start.character + 1,
        diagnostic.severity,
        diagnostic.message
    )
}

/// Prints every finding to `out`. Returns whether anything was found.
pub fn run_check(root_dir: &Path, out: &mut impl Write) -> anyhow::Result<bool> {
    let root_dir = std::fs::canonicalize(root_dir)
        .with_context(|| format!("Vault root {} does not exist", root_dir.display()))?;

    let findings = check_vault(&root_dir)?;
    for (location, diagnostic) in &findings {
        writeln!(out, "{}", format_finding(&root_dir, location, diagnostic))?;
    }

    Ok(!findings.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_vault_dir;
    use std::fs;

    #[test]
    fn reports_findings_per_note() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("Good.md"), "[[Other]]").unwrap();
        fs::write(vault_dir.join("Other.md"), "nothing").unwrap();
        fs::create_dir(vault_dir.join("sub")).unwrap();
        fs::write(vault_dir.join("sub/Bad.md"), "first\n  [[x|y|z]] and [[Gone]]").unwrap();

        let mut out = Vec::new();
        let found = run_check(&vault_dir, &mut out).unwrap();

        assert!(found);
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "sub/Bad.md:2:3: error: `[[x|y|z]]` is an invalid link"
        );
        assert!(lines[1].starts_with("sub/Bad.md:2:17: warning: File not found: "));
    }

    #[test]
    fn clean_vault() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("A.md"), "[[B]]").unwrap();
        fs::write(vault_dir.join("B.md"), "[[A|back]]").unwrap();

        let mut out = Vec::new();
        assert!(!run_check(&vault_dir, &mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn missing_root() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        let mut out = Vec::new();

        assert!(run_check(&vault_dir.join("nope"), &mut out).is_err());
    }
}
