//! The editor host the resolver asks for settings and workspace folders

use crate::settings::CSpellSettings;
use crate::uri::{path_to_uri, uri_to_path};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// An open workspace root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceFolder {
    pub uri: Url,
    pub name: String,
}

impl WorkspaceFolder {
    pub fn new(uri: Url, name: impl Into<String>) -> Self {
        Self {
            uri,
            name: name.into(),
        }
    }

    /// Folder for a local directory, named after its last component unless
    /// `name` is given
    pub fn from_path(path: &Path, name: Option<&str>) -> Result<Self> {
        let uri = path_to_uri(path)?;
        let name = name
            .map(str::to_string)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { uri, name })
    }

    /// Local path of the folder, if it is a `file:` folder
    pub fn path(&self) -> Option<PathBuf> {
        uri_to_path(&self.uri)
    }
}

/// Settings the host holds for one scope, plus its global settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostConfiguration {
    pub scoped: CSpellSettings,
    pub global: CSpellSettings,
}

/// The editor side of the protocol
///
/// Both calls may suspend; their failures become
/// [`SettingsError::HostCommunication`](crate::SettingsError::HostCommunication).
#[async_trait]
pub trait WorkspaceHost: Send + Sync {
    /// Settings for `scope` (a folder or document URI), or only the global
    /// settings when `scope` is `None`
    async fn get_configuration(&self, scope: Option<&Url>) -> Result<HostConfiguration>;

    /// Open workspace folders; `None` when no workspace is open
    async fn get_workspace_folders(&self) -> Result<Option<Vec<WorkspaceFolder>>>;
}

/// A host with fixed answers, for command-line use and tests
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    pub folders: Option<Vec<WorkspaceFolder>>,
    pub global: CSpellSettings,
    /// Scoped settings keyed by folder URI
    pub scoped: Vec<(Url, CSpellSettings)>,
}

impl StaticHost {
    pub fn new(folders: Vec<WorkspaceFolder>) -> Self {
        Self {
            folders: Some(folders),
            ..Default::default()
        }
    }

    pub fn with_global(mut self, global: CSpellSettings) -> Self {
        self.global = global;
        self
    }

    pub fn with_scoped(mut self, folder: Url, settings: CSpellSettings) -> Self {
        self.scoped.push((folder, settings));
        self
    }
}

#[async_trait]
impl WorkspaceHost for StaticHost {
    async fn get_configuration(&self, scope: Option<&Url>) -> Result<HostConfiguration> {
        let scoped = scope
            .and_then(|scope| self.scoped.iter().find(|(uri, _)| uri == scope))
            .map(|(_, settings)| settings.clone())
            .unwrap_or_default();
        Ok(HostConfiguration {
            scoped,
            global: self.global.clone(),
        })
    }

    async fn get_workspace_folders(&self) -> Result<Option<Vec<WorkspaceFolder>>> {
        Ok(self.folders.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_from_path() {
        let folder = WorkspaceFolder::from_path(Path::new("/work/client"), None).unwrap();
        assert_eq!(folder.name, "client");
        assert_eq!(folder.uri.as_str(), "file:///work/client");
        assert_eq!(folder.path(), Some(PathBuf::from("/work/client")));

        let named = WorkspaceFolder::from_path(Path::new("/work/client"), Some("app")).unwrap();
        assert_eq!(named.name, "app");
    }

    #[tokio::test]
    async fn test_static_host_scopes() {
        let folder = WorkspaceFolder::from_path(Path::new("/work/client"), None).unwrap();
        let host = StaticHost::new(vec![folder.clone()])
            .with_global(CSpellSettings {
                language: Some("en".to_string()),
                ..Default::default()
            })
            .with_scoped(
                folder.uri.clone(),
                CSpellSettings {
                    language: Some("fr".to_string()),
                    ..Default::default()
                },
            );

        let config = host.get_configuration(Some(&folder.uri)).await.unwrap();
        assert_eq!(config.scoped.language.as_deref(), Some("fr"));
        assert_eq!(config.global.language.as_deref(), Some("en"));

        let config = host.get_configuration(None).await.unwrap();
        assert_eq!(config.scoped, CSpellSettings::default());
        assert_eq!(host.get_workspace_folders().await.unwrap().unwrap().len(), 1);
    }
}
