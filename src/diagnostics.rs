use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Url};

use crate::documents::DocumentSource;
use crate::vault::{MyRange, Rangeable, Vault};
use crate::wikilink::ParsedLink;

static WIKI_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[[^\]\[]+?\]\]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSeverity {
    Error,
    Warning,
}

impl fmt::Display for LinkSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkSeverity::Error => write!(f, "error"),
            LinkSeverity::Warning => write!(f, "warning"),
        }
    }
}

impl From<LinkSeverity> for DiagnosticSeverity {
    fn from(severity: LinkSeverity) -> DiagnosticSeverity {
        match severity {
            LinkSeverity::Error => DiagnosticSeverity::ERROR,
            LinkSeverity::Warning => DiagnosticSeverity::WARNING,
        }
    }
}

/// A problem with one link occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDiagnostic {
    pub range: MyRange,
    pub severity: LinkSeverity,
    pub message: String,
}

impl Rangeable for LinkDiagnostic {
    fn range(&self) -> &MyRange {
        &self.range
    }
}

impl From<LinkDiagnostic> for Diagnostic {
    fn from(diagnostic: LinkDiagnostic) -> Diagnostic {
        Diagnostic {
            range: *diagnostic.range,
            severity: Some(diagnostic.severity.into()),
            message: diagnostic.message,
            source: Some("wikivault".into()),
            ..Default::default()
        }
    }
}

/// Checks every `[[...]]` occurrence in `text`, in document order.
///
/// Malformed links are errors; links whose note exists neither as an open
/// buffer nor on disk are warnings. At most `max_diagnostics` findings are
/// produced and scanning stops once that many were found.
pub fn validate(vault: &Vault, documents: &dyn DocumentSource, text: &str) -> Vec<LinkDiagnostic> {
    let rope = Rope::from_str(text);

    WIKI_LINK_RE
        .find_iter(text)
        .filter_map(|found| {
            let range = MyRange::from_range(&rope, found.range());

            match ParsedLink::parse(found.as_str()) {
                Ok(link) => {
                    let location = vault.resolve(&link);
                    (!vault.note_exists(&location, documents)).then(|| LinkDiagnostic {
                        range,
                        severity: LinkSeverity::Warning,
                        message: format!("File not found: {}", location.path().display()),
                    })
                }
                Err(err) => Some(LinkDiagnostic {
                    range,
                    severity: LinkSeverity::Error,
                    message: err.to_string(),
                }),
            }
        })
        .take(vault.settings().max_diagnostics)
        .collect()
}

/// Diagnostics for an open document, or `None` when they are disabled or the
/// document is not open.
pub fn diagnostics(
    vault: &Vault,
    documents: &dyn DocumentSource,
    uri: &Url,
) -> Option<Vec<Diagnostic>> {
    if !vault.settings().diagnostics {
        return None;
    }

    let text = documents.live_text(uri)?;

    Some(
        validate(vault, documents, &text)
            .into_iter()
            .map(Diagnostic::from)
            .collect(),
    )
}
