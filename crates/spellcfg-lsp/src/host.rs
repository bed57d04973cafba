//! Editor-backed [`WorkspaceHost`]

use async_trait::async_trait;
use serde_json::Value;
use spellcfg_core::{
    CSpellSettings, HostConfiguration, Result, SettingsError, WorkspaceFolder, WorkspaceHost,
};
use tower_lsp::Client;
use tower_lsp::lsp_types::{ConfigurationItem, Url};
use tracing::debug;

/// Settings section requested from the editor
pub const SETTINGS_SECTION: &str = "cSpell";

/// Asks the connected editor for settings and workspace folders
pub struct LspHost {
    client: Client,
}

impl LspHost {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkspaceHost for LspHost {
    async fn get_configuration(&self, scope: Option<&Url>) -> Result<HostConfiguration> {
        let items = vec![
            ConfigurationItem {
                scope_uri: scope.cloned(),
                section: Some(SETTINGS_SECTION.to_string()),
            },
            ConfigurationItem {
                scope_uri: None,
                section: Some(SETTINGS_SECTION.to_string()),
            },
        ];
        debug!("Requesting configuration for {:?}", scope.map(Url::as_str));
        let values = self
            .client
            .configuration(items)
            .await
            .map_err(|e| SettingsError::host_error(format!("workspace/configuration failed: {e}")))?;
        host_configuration_from_values(values)
    }

    async fn get_workspace_folders(&self) -> Result<Option<Vec<WorkspaceFolder>>> {
        let folders = self.client.workspace_folders().await.map_err(|e| {
            SettingsError::host_error(format!("workspace/workspaceFolders failed: {e}"))
        })?;
        Ok(folders.map(|folders| {
            folders
                .into_iter()
                .map(|folder| WorkspaceFolder::new(folder.uri, folder.name))
                .collect()
        }))
    }
}

/// Build a [`HostConfiguration`] from the `[scoped, global]` reply of a
/// `workspace/configuration` request
///
/// Missing or `null` entries count as empty settings.
pub fn host_configuration_from_values(values: Vec<Value>) -> Result<HostConfiguration> {
    let mut values = values.into_iter();
    let scoped = settings_from_value(values.next())?;
    let global = settings_from_value(values.next())?;
    Ok(HostConfiguration { scoped, global })
}

fn settings_from_value(value: Option<Value>) -> Result<CSpellSettings> {
    match value {
        None | Some(Value::Null) => Ok(CSpellSettings::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| SettingsError::host_error(format!("invalid {SETTINGS_SECTION} settings: {e}"))),
    }
}
