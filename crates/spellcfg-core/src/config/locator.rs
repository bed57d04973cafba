//! Config file discovery by directory ancestry

use crate::fs::ConfigFs;
use crate::settings_file::{CONFIG_FILE_LOCATIONS, NESTED_CONFIG_LOCATIONS, NESTED_CONFIG_KEY};
use crate::uri::{is_ancestor_or_equal, normalize_path, path_to_uri, same_path, uri_to_path};
use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// A config file together with the directory its relative globs resolve
/// against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFileReference {
    pub path: PathBuf,
    pub root: PathBuf,
    /// File whose `import` list referenced this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl ConfigFileReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = normalize_path(&path.into());
        let root = config_root(&path);
        Self {
            path,
            root,
            source: None,
        }
    }

    pub fn imported_by(path: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(path)
        }
    }

    pub fn uri(&self) -> Result<Url> {
        path_to_uri(&self.path)
    }
}

/// Directory a config file governs: its parent, or the grandparent for files
/// inside `.vscode`
pub fn config_root(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(path);
    let is_vscode = parent
        .file_name()
        .is_some_and(|name| name.eq_ignore_ascii_case(".vscode"));
    match parent.parent() {
        Some(grandparent) if is_vscode => grandparent.to_path_buf(),
        _ => parent.to_path_buf(),
    }
}

/// Keep the configs that govern `file`: those whose root is the file's
/// directory or one of its ancestors
pub fn filter_config_files_to_match_inherited_path_of_file(configs: &[Url], file: &Url) -> Vec<Url> {
    let Some(dir) = uri_to_path(file).and_then(|p| p.parent().map(Path::to_path_buf)) else {
        return Vec::new();
    };
    configs
        .iter()
        .filter(|config| {
            uri_to_path(config).is_some_and(|path| is_ancestor_or_equal(&config_root(&path), &dir))
        })
        .cloned()
        .collect()
}

/// Config files that apply to one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSearch {
    /// Found by the ancestry walk, nearest first
    pub discovered: Vec<ConfigFileReference>,
    /// Registered files not already discovered, in registration order
    pub registered: Vec<ConfigFileReference>,
}

impl ConfigSearch {
    /// Discovered files then registered ones
    pub fn all(&self) -> impl Iterator<Item = &ConfigFileReference> {
        self.discovered.iter().chain(self.registered.iter())
    }
}

/// Walks directories looking for config files
#[derive(Clone)]
pub struct ConfigLocator {
    fs: Arc<dyn ConfigFs>,
}

impl ConfigLocator {
    pub fn new(fs: Arc<dyn ConfigFs>) -> Self {
        Self { fs }
    }

    /// The config file for `dir`, if any
    ///
    /// Candidates are tried in [`CONFIG_FILE_LOCATIONS`] order and then the
    /// nested forms; the first one present wins. Failures are logged and
    /// treated as "no config here".
    pub async fn find_config_file_in_dir(&self, dir: &Path) -> Option<PathBuf> {
        for name in CONFIG_FILE_LOCATIONS {
            let candidate = dir.join(name);
            match self.fs.is_file(&candidate).await {
                Ok(true) => {
                    debug!("Found config: {}", candidate.display());
                    return Some(candidate);
                }
                Ok(false) => {}
                Err(e) => warn!("Skipping {}: {}", candidate.display(), e),
            }
        }
        for name in NESTED_CONFIG_LOCATIONS {
            let candidate = dir.join(name);
            if self.has_nested_config(&candidate).await {
                debug!("Found nested config: {}", candidate.display());
                return Some(candidate);
            }
        }
        None
    }

    async fn has_nested_config(&self, path: &Path) -> bool {
        let text = match self.fs.read_to_string(path).await {
            Ok(Some(text)) => text,
            Ok(None) => return false,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                return false;
            }
        };
        serde_json::from_str::<serde_json::Value>(&text)
            .map(|value| value.get(NESTED_CONFIG_KEY).is_some_and(|v| v.is_object()))
            .unwrap_or(false)
    }

    /// Config files governing a document in `dir`, nearest first
    ///
    /// The walk starts at `dir` and climbs until it has checked a directory
    /// that is one of `folder_roots`, or the file system root.
    pub async fn find_config_files(
        &self,
        dir: &Path,
        folder_roots: &[PathBuf],
    ) -> Vec<ConfigFileReference> {
        let mut found = Vec::new();
        let mut current = Some(normalize_path(dir));
        while let Some(dir) = current {
            if let Some(path) = self.find_config_file_in_dir(&dir).await {
                found.push(ConfigFileReference::new(path));
            }
            if folder_roots.iter().any(|root| same_path(root, &dir)) {
                break;
            }
            current = dir.parent().map(Path::to_path_buf);
        }
        found
    }

    /// Ancestry search for `uri`, plus the `explicit` config files
    ///
    /// Documents without a file path are searched from `fallback_dir`.
    /// Explicit files are kept regardless of ancestry, once.
    pub async fn find_config_files_for_uri(
        &self,
        uri: &Url,
        fallback_dir: Option<&Path>,
        folder_roots: &[PathBuf],
        explicit: &[PathBuf],
    ) -> ConfigSearch {
        let path = uri_to_path(uri);
        let discovered = match path.as_deref().and_then(Path::parent).or(fallback_dir) {
            Some(dir) => self.find_config_files(dir, folder_roots).await,
            None => Vec::new(),
        };
        let discovered = match path {
            Some(_) => retain_inherited(discovered, uri),
            None => discovered,
        };

        let mut registered: Vec<ConfigFileReference> = Vec::new();
        for reference in explicit.iter().map(ConfigFileReference::new) {
            let seen = discovered
                .iter()
                .chain(registered.iter())
                .any(|other| same_path(&other.path, &reference.path));
            if seen {
                debug!("Registered config already applies: {}", reference.path.display());
            } else {
                registered.push(reference);
            }
        }
        ConfigSearch {
            discovered,
            registered,
        }
    }
}

fn retain_inherited(references: Vec<ConfigFileReference>, file: &Url) -> Vec<ConfigFileReference> {
    let uris: Vec<Url> = references
        .iter()
        .filter_map(|reference| reference.uri().ok())
        .collect();
    let kept = filter_config_files_to_match_inherited_path_of_file(&uris, file);
    references
        .into_iter()
        .filter(|reference| reference.uri().is_ok_and(|uri| kept.contains(&uri)))
        .collect()
}
