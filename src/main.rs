use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use clap::{Parser, Subcommand};
use ropey::Rope;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, error, info, warn};

use wikivault::config::Settings;
use wikivault::documents::OpenDocuments;
use wikivault::error::VaultError;
use wikivault::vault::{SharedVault, Vault};
use wikivault::{cli, codeactions, completion, diagnostics, gotodef, hover, logging, rename};

#[derive(Debug, Parser)]
#[command(name = "wikivault", version, about = "Language server for wikilinked markdown vaults")]
struct Cli {
    /// Vault root; overrides the workspace reported by the editor.
    #[arg(long, env = "WIKIVAULT_VAULT", global = true)]
    vault: Option<PathBuf>,

    /// error, warn, info, debug or trace. `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the language server on stdio (default).
    Serve,
    /// Validate every note in the vault and print the findings.
    Check,
}

/// Notifications are only queued by the client; the server's output task
/// writes them. Waited for before a fatal exit.
const FATAL_EXIT_GRACE: Duration = Duration::from_millis(200);

type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

struct Backend {
    client: Client,
    vault: SharedVault,
    documents: OpenDocuments,
    vault_override: Option<PathBuf>,
    roots: Mutex<Vec<PathBuf>>,
    exit: ExitHook,
}

impl Backend {
    fn new(client: Client, vault_override: Option<PathBuf>, exit: ExitHook) -> Backend {
        Backend {
            client,
            vault: SharedVault::new(),
            documents: OpenDocuments::new(),
            vault_override,
            roots: Mutex::new(Vec::new()),
            exit,
        }
    }

    fn ready_vault(&self) -> Option<Arc<Vault>> {
        self.vault
            .get()
            .map_err(|err| debug!(%err, "request before initialization"))
            .ok()
    }

    /// The vault and the open buffer for `uri`, if both are available.
    fn context(&self, uri: &Url) -> Option<(Arc<Vault>, Rope)> {
        let vault = self.ready_vault()?;
        let rope = self.documents.rope(uri)?;
        Some((vault, rope))
    }

    async fn publish_diagnostics(&self, vault: &Vault, uri: Url) {
        let diagnostics =
            diagnostics::diagnostics(vault, &self.documents, &uri).unwrap_or_default();
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    async fn publish_all(&self, vault: &Vault) {
        for uri in self.documents.uris() {
            self.publish_diagnostics(vault, uri).await;
        }
    }

    /// Tells the user about a failed lookup.
    async fn notify(&self, err: VaultError) {
        let (typ, message) = match &err {
            VaultError::MalformedLink(_) => (MessageType::ERROR, "Wikilink is broken.".to_string()),
            VaultError::NoteNotFound(path) => (
                MessageType::WARNING,
                format!("file:`{}` is not available yet.", path.display()),
            ),
            VaultError::VaultNotReady => {
                debug!(%err, "request before initialization");
                return;
            }
            VaultError::Configuration(_) => (MessageType::ERROR, err.to_string()),
            VaultError::InvalidMetadata(_) => (MessageType::WARNING, err.to_string()),
        };

        self.client.show_message(typ, message).await;
    }

    fn roots_from(&self, params: &InitializeParams) -> Vec<PathBuf> {
        if let Some(root) = &self.vault_override {
            return vec![root.clone()];
        }

        match &params.workspace_folders {
            Some(folders) if !folders.is_empty() => folders
                .iter()
                .filter_map(|folder| folder.uri.to_file_path().ok())
                .collect(),
            _ => {
                #[allow(deprecated)]
                let root_uri = params.root_uri.as_ref();
                root_uri
                    .and_then(|uri| uri.to_file_path().ok())
                    .into_iter()
                    .collect()
            }
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let roots = self.roots_from(&params);
        info!(?roots, "initializing");
        *self.roots.lock().unwrap_or_else(PoisonError::into_inner) = roots;

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "wikivault".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..Default::default()
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["[".to_string()]),
                    resolve_provider: Some(true),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                rename_provider: Some(OneOf::Left(true)),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: None,
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let roots = self
            .roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let built = tokio::task::spawn_blocking(move || {
            let settings = roots
                .first()
                .map(|root| Settings::load_or_default(root))
                .unwrap_or_default();
            let vault = Vault::from_roots(&roots, settings)?;
            vault.rebuild()?;
            Ok::<_, VaultError>(vault)
        })
        .await
        .unwrap_or_else(|err| Err(VaultError::Configuration(err.to_string())));

        match built {
            Ok(vault) => {
                let vault = self.vault.set(vault);
                self.client
                    .log_message(
                        MessageType::INFO,
                        format!(
                            "wikivault indexed {} notes in {}",
                            vault.document_count(),
                            vault.root_dir().display()
                        ),
                    )
                    .await;
                self.publish_all(&vault).await;
            }
            Err(err) if err.is_fatal() => {
                error!(%err, "cannot start");
                self.client
                    .show_message(MessageType::ERROR, err.to_string())
                    .await;
                tokio::time::sleep(FATAL_EXIT_GRACE).await;
                (self.exit)(1);
            }
            Err(err) => warn!(%err, "vault initialization failed"),
        }
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.open(&uri, &params.text_document.text);

        if let Some(vault) = self.ready_vault() {
            self.publish_diagnostics(&vault, uri).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.documents.open(&uri, &change.text);

        if let Some(vault) = self.ready_vault() {
            self.publish_diagnostics(&vault, uri).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let saved = match params.text_document.uri.to_file_path() {
            Ok(path) => self.vault.note_saved(&path),
            Err(()) => self.vault.get(),
        };

        match saved {
            Ok(vault) => self.publish_all(&vault).await,
            Err(err) => debug!(%err, "save deferred until the vault is ready"),
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position.position;
        let Some((vault, rope)) = self.context(&params.text_document_position.text_document.uri)
        else {
            return Ok(None);
        };

        Ok(completion::get_completions(&vault, &rope, position))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        match self.ready_vault() {
            Some(vault) => Ok(completion::resolve_completion(&vault, &self.documents, item)),
            None => Ok(item),
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params.position;
        let Some((vault, rope)) =
            self.context(&params.text_document_position_params.text_document.uri)
        else {
            return Ok(None);
        };

        match hover::hover(&vault, &self.documents, &rope, position) {
            Ok(hover) => Ok(hover),
            Err(err) => {
                self.notify(err).await;
                Ok(None)
            }
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params.position;
        let Some((vault, rope)) =
            self.context(&params.text_document_position_params.text_document.uri)
        else {
            return Ok(None);
        };

        match gotodef::goto_definition(&vault, &self.documents, &rope, position) {
            Ok(location) => Ok(location.map(GotoDefinitionResponse::Scalar)),
            Err(err) => {
                self.notify(err).await;
                Ok(None)
            }
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let Some((vault, rope)) = self.context(&params.text_document.uri) else {
            return Ok(None);
        };

        Ok(Some(codeactions::code_actions(
            &vault,
            &self.documents,
            &rope,
            params.range,
        )))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let Some(vault) = self.ready_vault() else {
            return Ok(None);
        };

        match rename::rename(&vault, &self.documents, &params) {
            Ok(edit) => Ok(edit),
            Err(err) => {
                self.notify(err).await;
                Ok(None)
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!("shutting down");
        Ok(())
    }
}

async fn serve(vault_override: Option<PathBuf>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let exit: ExitHook = Arc::new(|code| {
        std::process::exit(code);
    });
    let (service, socket) = LspService::new(|client| Backend::new(client, vault_override, exit));
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.vault).await,
        Command::Check => {
            let root = match cli.vault {
                Some(root) => root,
                None => std::env::current_dir()?,
            };
            if cli::run_check(&root, &mut std::io::stdout().lock())? {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
