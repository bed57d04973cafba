//! LSP server implementation
//!
//! Besides the standard lifecycle and change notifications, the server
//! answers these custom requests:
//!
//! | method | params | result |
//! |---|---|---|
//! | `spellcfg/registerConfigurationFile` | `{ path }` | `null` |
//! | `spellcfg/getConfigForDocument` | `{ uri }` | [`ConfigForDocument`] |
//! | `spellcfg/addWordsToConfigFile` | `{ uri, words }` | updated settings |

use crate::host::LspHost;
use serde::{Deserialize, Serialize};
use spellcfg_core::settings_file::{
    CONFIG_FILE_LOCATIONS, NESTED_CONFIG_LOCATIONS, add_word_to_settings_and_update,
    default_settings, is_config_file_to_watch,
};
use spellcfg_core::uri::uri_to_path;
use spellcfg_core::{
    CSpellSettings, ConfigDiagnostic, DocumentSettings, ErrorKind, ExcludedByMatch, SettingsError,
};
use std::sync::Arc;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

const WATCHER_REGISTRATION_ID: &str = "spellcfg-config-files";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterConfigurationFileParams {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigForDocumentParams {
    pub uri: Url,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWordsToConfigFileParams {
    pub uri: Url,
    pub words: Vec<String>,
}

/// Everything the editor needs to explain how a document is configured
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigForDocument {
    pub uri: Url,
    /// `false` for schemes that are never checked
    pub checkable: bool,
    pub include: bool,
    pub exclude: bool,
    pub excluded_by: Vec<ExcludedByMatch>,
    pub config_files: Vec<Url>,
    pub settings: Option<Arc<CSpellSettings>>,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

/// spellcfg Language Server
pub struct SpellConfigServer {
    client: Client,
    settings: Arc<DocumentSettings>,
}

impl SpellConfigServer {
    pub fn new(client: Client) -> Self {
        let host = LspHost::new(client.clone());
        let settings = DocumentSettings::new(Arc::new(host), default_settings());
        Self {
            client,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &Arc<DocumentSettings> {
        &self.settings
    }

    pub async fn register_configuration_file(
        &self,
        params: RegisterConfigurationFileParams,
    ) -> Result<()> {
        self.settings.register_configuration_file(&params.path);
        Ok(())
    }

    pub async fn get_config_for_document(
        &self,
        params: GetConfigForDocumentParams,
    ) -> Result<ConfigForDocument> {
        let uri = params.uri;
        if !self.settings.is_uri_checkable(uri.as_str()) {
            debug!("Skipping unchecked document {}", uri);
            return Ok(ConfigForDocument {
                uri,
                checkable: false,
                include: false,
                exclude: false,
                excluded_by: Vec::new(),
                config_files: Vec::new(),
                settings: None,
                diagnostics: Vec::new(),
            });
        }

        let settings = self.settings.get_settings(uri.as_str()).await.map_err(to_rpc_error)?;
        let flags = self
            .settings
            .calc_include_exclude(uri.as_str())
            .await
            .map_err(to_rpc_error)?;
        let excluded_by = self
            .settings
            .calc_excluded_by(uri.as_str())
            .await
            .map_err(to_rpc_error)?;
        let config_files = self
            .settings
            .find_cspell_configuration_files_for_uri(uri.as_str())
            .await
            .map_err(to_rpc_error)?;
        let diagnostics = self
            .settings
            .get_diagnostics(uri.as_str())
            .await
            .map_err(to_rpc_error)?;

        Ok(ConfigForDocument {
            uri,
            checkable: true,
            include: flags.include,
            exclude: flags.exclude,
            excluded_by,
            config_files,
            settings: Some(settings),
            diagnostics,
        })
    }

    pub async fn add_words_to_config_file(
        &self,
        params: AddWordsToConfigFileParams,
    ) -> Result<CSpellSettings> {
        let fs = self.settings.fs();
        let mut updated = None;
        for word in &params.words {
            updated = Some(
                add_word_to_settings_and_update(fs.as_ref(), &params.uri, word)
                    .await
                    .map_err(to_rpc_error)?,
            );
        }
        self.settings.reset_settings();
        Ok(updated.unwrap_or_default())
    }

    async fn register_config_watchers(&self) {
        let watchers = CONFIG_FILE_LOCATIONS
            .iter()
            .chain(NESTED_CONFIG_LOCATIONS)
            .map(|name| FileSystemWatcher {
                glob_pattern: GlobPattern::String(format!("**/{name}")),
                kind: None,
            })
            .collect();
        let options = match serde_json::to_value(DidChangeWatchedFilesRegistrationOptions {
            watchers,
        }) {
            Ok(options) => options,
            Err(e) => {
                warn!("Failed to encode file watcher options: {}", e);
                return;
            }
        };
        let registration = Registration {
            id: WATCHER_REGISTRATION_ID.to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: Some(options),
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            warn!("Client refused config file watchers: {}", e);
        }
    }

    fn reset(&self, reason: &str) {
        info!("Resetting settings: {}", reason);
        self.settings.reset_settings();
    }
}

/// `true` if any of `changes` touches a config file
pub fn touches_config_file(changes: &[FileEvent]) -> bool {
    changes.iter().any(|change| {
        uri_to_path(&change.uri).is_some_and(|path| is_config_file_to_watch(&path))
    })
}

fn to_rpc_error(err: SettingsError) -> Error {
    let code = match err.kind() {
        ErrorKind::InvalidUri | ErrorKind::UnsupportedUpdateFormat => ErrorCode::InvalidParams,
        _ => ErrorCode::InternalError,
    };
    Error {
        code,
        message: err.to_string().into(),
        data: None,
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for SpellConfigServer {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "spellcfg-lsp".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::NONE,
                )),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.register_config_watchers().await;
        self.client
            .log_message(MessageType::INFO, "spellcfg LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_change_configuration(&self, _: DidChangeConfigurationParams) {
        self.reset("configuration changed");
    }

    async fn did_change_workspace_folders(&self, _: DidChangeWorkspaceFoldersParams) {
        self.reset("workspace folders changed");
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        if touches_config_file(&params.changes) {
            self.reset("config file changed");
        }
    }
}
