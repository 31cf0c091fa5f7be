//! wikivault: a language server engine for vaults of wikilinked markdown notes
//!
//! Notes link to each other with `[[target]]` or `[[target|alias]]`. This crate
//! keeps an index of the notes in a vault and the names they can be linked by,
//! and answers editor requests about the links in a document.
//!
//! # Overview
//!
//! - **Vault index**: every `.md` file under the root, with its `title` and
//!   `aliases` from the metadata block, published as immutable snapshots
//! - **Link resolution**: locating the link under a cursor, parsing it and
//!   mapping it to a note, preferring unsaved editor buffers over the disk
//! - **Completion, hover and go to definition** over wikilinks
//! - **Diagnostics**: malformed links and links to missing notes
//! - **Aliases**: rename and a quick fix that record a new name in a note's
//!   metadata block without touching its body
//!
//! # Architecture
//!
//! - [`vault`]: the vault root, note index, resolver and metadata codec
//! - [`wikilink`]: link syntax around a cursor
//! - [`documents`]: open editor buffers
//! - [`completion`], [`hover`], [`gotodef`], [`diagnostics`], [`rename`],
//!   [`codeactions`]: protocol adapters
//! - [`config`]: settings
//!
//! # Usage
//!
//! The `wikivault` binary runs the language server; the library can be used
//! directly:
//!
//! ```ignore
//! use wikivault::config::Settings;
//! use wikivault::vault::Vault;
//!
//! let vault = Vault::construct_vault(&Settings::default(), &vault_path)?;
//! let names = vault.completion_candidates();
//! ```

// Core modules
pub mod documents;
pub mod error;
pub mod vault;
pub mod wikilink;

// LSP feature modules
pub mod codeactions;
pub mod completion;
pub mod diagnostics;
pub mod gotodef;
pub mod hover;
pub mod rename;

// Configuration
pub mod config;

// Utilities
pub mod cli;
pub mod logging;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
