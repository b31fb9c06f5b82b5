//! LSP server
//!
//! A thin tower-lsp adapter: definition and reference requests are turned
//! into workspace queries on a blocking task, and file events mark the
//! workspace for reload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ffi_navigator_core::{
    split_lines, Location as FactLocation, Position as FactPosition, Range as FactRange,
};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, GotoDefinitionParams,
    GotoDefinitionResponse, InitializeParams, InitializeResult, InitializedParams, Location,
    MessageType, OneOf, Position, PositionEncodingKind, Range, ReferenceParams,
    ServerCapabilities, ServerInfo,
    TextDocumentPositionParams, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use crate::workspace::Workspace;

/// Which cursor query to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    Definitions,
    References,
}

/// LSP Backend state
pub struct Backend {
    /// LSP client for sending notifications
    client: Client,
    /// The indexed source tree
    workspace: Arc<Workspace>,
    /// Text of open documents, which may differ from disk
    documents: Arc<RwLock<HashMap<Url, String>>>,
    /// Client columns count UTF-16 code units rather than characters
    utf16: Arc<AtomicBool>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            workspace: Arc::new(Workspace::new()),
            documents: Arc::new(RwLock::new(HashMap::new())),
            utf16: Arc::new(AtomicBool::new(true)),
        }
    }

    async fn store_document(&self, uri: Url, text: String) {
        let mut docs = self.documents.write().await;
        docs.insert(uri, text);
    }

    async fn remove_document(&self, uri: &Url) {
        let mut docs = self.documents.write().await;
        docs.remove(uri);
    }

    /// Open buffer text, falling back to the file on disk
    async fn document_text(&self, uri: &Url, path: &Path) -> Option<String> {
        if let Some(text) = self.documents.read().await.get(uri) {
            return Some(text.clone());
        }
        match tokio::fs::read(path).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn query(&self, params: TextDocumentPositionParams, query: Query) -> Vec<Location> {
        let uri = params.text_document.uri;
        let Ok(path) = uri.to_file_path() else {
            debug!("Ignoring non-file document {}", uri);
            return Vec::new();
        };
        let Some(text) = self.document_text(&uri, &path).await else {
            return Vec::new();
        };
        let utf16 = self.utf16.load(Ordering::SeqCst);

        let workspace = Arc::clone(&self.workspace);
        let documents = Arc::clone(&self.documents);
        let position = params.position;
        let task = tokio::task::spawn_blocking(move || {
            let lines = split_lines(&text);
            let mut pos = FactPosition::new(position.line, position.character);
            if utf16 {
                if let Some(line) = lines.get(pos.line as usize) {
                    pos.character = utf16_to_char(line, pos.character);
                }
            }
            let locations = match query {
                Query::Definitions => workspace.definitions_at(&path, &lines, pos),
                Query::References => workspace.references_at(&path, &lines, pos),
            };
            if utf16 {
                encode_utf16(locations, &documents.blocking_read())
            } else {
                locations
            }
        });
        match task.await {
            Ok(locations) => locations.iter().filter_map(to_lsp_location).collect(),
            Err(e) => {
                warn!("{:?} query failed: {}", query, e);
                Vec::new()
            }
        }
    }
}

/// Workspace root named by the client, preferring the first workspace folder
#[allow(deprecated)]
fn root_from_params(params: &InitializeParams) -> Option<PathBuf> {
    let folder = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri);
    folder
        .or(params.root_uri.as_ref())
        .and_then(|uri| uri.to_file_path().ok())
}

/// Whether the client can take character columns directly
fn client_supports_utf32(params: &InitializeParams) -> bool {
    params
        .capabilities
        .general
        .as_ref()
        .and_then(|general| general.position_encodings.as_ref())
        .is_some_and(|encodings| encodings.contains(&PositionEncodingKind::UTF32))
}

/// Character column of a UTF-16 column within `line`
fn utf16_to_char(line: &str, column: u32) -> u32 {
    let mut units = 0;
    for (idx, ch) in line.chars().enumerate() {
        if units >= column {
            return idx as u32;
        }
        units += ch.len_utf16() as u32;
    }
    line.chars().count() as u32
}

/// UTF-16 column of a character column within `line`
fn char_to_utf16(line: &str, column: u32) -> u32 {
    line.chars()
        .take(column as usize)
        .map(|ch| ch.len_utf16() as u32)
        .sum()
}

/// Rewrite result ranges in UTF-16 columns, reading each target file once.
///
/// Open documents are preferred over the file on disk. A file that cannot
/// be read keeps its character columns.
fn encode_utf16(
    locations: Vec<FactLocation>,
    documents: &HashMap<Url, String>,
) -> Vec<FactLocation> {
    let mut sources: HashMap<PathBuf, Option<String>> = HashMap::new();
    locations
        .into_iter()
        .map(|location| {
            let source = sources.entry(location.path.clone()).or_insert_with(|| {
                let open = Url::from_file_path(&location.path)
                    .ok()
                    .and_then(|uri| documents.get(&uri).cloned());
                open.or_else(|| {
                    std::fs::read(&location.path)
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                        .ok()
                })
            });
            let Some(text) = source.as_deref() else {
                return location;
            };
            let lines = split_lines(text);
            let encode = |pos: FactPosition| {
                let character = lines
                    .get(pos.line as usize)
                    .map_or(pos.character, |line| char_to_utf16(line, pos.character));
                FactPosition::new(pos.line, character)
            };
            FactLocation {
                range: FactRange::new(encode(location.range.start), encode(location.range.end)),
                path: location.path,
            }
        })
        .collect()
}

fn to_lsp_location(location: &FactLocation) -> Option<Location> {
    let uri = Url::from_file_path(&location.path).ok()?;
    let range = Range::new(
        Position::new(location.range.start.line, location.range.start.character),
        Position::new(location.range.end.line, location.range.end.character),
    );
    Some(Location::new(uri, range))
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("ffi-navigator LSP server initializing");

        let utf32 = client_supports_utf32(&params);
        self.utf16.store(!utf32, Ordering::SeqCst);
        let position_encoding = if utf32 {
            PositionEncodingKind::UTF32
        } else {
            PositionEncodingKind::UTF16
        };

        match root_from_params(&params) {
            Some(root) => {
                let workspace = Arc::clone(&self.workspace);
                let task =
                    tokio::task::spawn_blocking(move || workspace.initialize(&root).map(|_| root));
                match task.await {
                    Ok(Ok(root)) => info!("Workspace ready at {}", root.display()),
                    Ok(Err(e)) => warn!("Workspace initialization failed: {}", e),
                    Err(e) => warn!("Workspace initialization panicked: {}", e),
                }
            }
            None => warn!("Client sent no root; definitions will be unavailable"),
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                position_encoding: Some(position_encoding),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "ffi-navigator-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("ffi-navigator LSP server initialized");
        let message = match self.workspace.stats() {
            Some(stats) => format!(
                "ffi-navigator indexed {} files ({})",
                stats.files,
                stats.dialects.join(", ")
            ),
            None => "ffi-navigator started without a workspace".to_string(),
        };
        self.client.log_message(MessageType::INFO, message).await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("ffi-navigator LSP server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("Document opened: {}", params.text_document.uri);
        self.store_document(params.text_document.uri, params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!("Document changed: {}", params.text_document.uri);
        // Full sync: the whole text is in the first change
        if let Some(change) = params.content_changes.into_iter().next() {
            self.store_document(params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("Document saved: {}", params.text_document.uri);
        if let Some(text) = params.text {
            self.store_document(params.text_document.uri, text).await;
        }
        self.workspace.mark_needs_reload();
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);
        self.remove_document(&params.text_document.uri).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        debug!("{} watched files changed", params.changes.len());
        self.workspace.mark_needs_reload();
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let locations = self
            .query(params.text_document_position_params, Query::Definitions)
            .await;
        debug!("Found {} definitions", locations.len());
        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(GotoDefinitionResponse::Array(locations)))
        }
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let locations = self
            .query(params.text_document_position, Query::References)
            .await;
        debug!("Found {} references", locations.len());
        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(locations))
        }
    }
}

/// Serve LSP over stdin/stdout until the client exits
pub async fn run_server() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting ffi-navigator Language Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
