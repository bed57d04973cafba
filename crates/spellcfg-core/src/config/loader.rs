//! Config file loading and import-chain merging

use super::locator::ConfigFileReference;
use super::variables::VariableResolver;
use crate::diagnostics::{ConfigDiagnostic, DiagnosticCollector};
use crate::error::{ErrorKind, SettingsError};
use crate::fs::ConfigFs;
use crate::settings::CSpellSettings;
use crate::settings_file::NESTED_CONFIG_KEY;
use crate::uri::{normalize_path, resolve_path};
use crate::Result;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Loads executable config files (`cspell.config.js`, ...)
///
/// The evaluator must produce the same settings shape as the declarative
/// formats.
#[async_trait]
pub trait DynamicConfigEvaluator: Send + Sync {
    async fn evaluate(&self, path: &Path) -> Result<CSpellSettings>;
}

/// On-disk config format, derived from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json` / `.jsonc`, read leniently (comments, trailing commas)
    Json,
    Yaml,
    /// The `cspell` member of a `package.json`
    PackageJson,
    /// `.js` / `.cjs` / `.mjs`
    Dynamic,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name == "package.json" {
            return ConfigFormat::PackageJson;
        }
        match path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("yaml" | "yml") => ConfigFormat::Yaml,
            Some("js" | "cjs" | "mjs") => ConfigFormat::Dynamic,
            _ => ConfigFormat::Json,
        }
    }
}

/// Parse config text; `Ok(None)` for a `package.json` without a `cspell`
/// section
pub fn parse_settings(format: ConfigFormat, path: &Path, text: &str) -> Result<Option<CSpellSettings>> {
    let parse_error = |e: &dyn std::fmt::Display| SettingsError::config_parse_error(path, e.to_string());
    match format {
        ConfigFormat::Json => json5::from_str(text).map(Some).map_err(|e| parse_error(&e)),
        ConfigFormat::Yaml => {
            if text.trim().is_empty() {
                return Ok(Some(CSpellSettings::default()));
            }
            serde_yaml::from_str(text).map(Some).map_err(|e| parse_error(&e))
        }
        ConfigFormat::PackageJson => {
            let mut value: serde_json::Value = serde_json::from_str(text).map_err(|e| parse_error(&e))?;
            match value.get_mut(NESTED_CONFIG_KEY).map(serde_json::Value::take) {
                Some(section) => serde_json::from_value(section).map(Some).map_err(|e| parse_error(&e)),
                None => Ok(None),
            }
        }
        ConfigFormat::Dynamic => Err(SettingsError::config_parse_error(
            path,
            "executable config files need an evaluator",
        )),
    }
}

/// One file of a chain with its own (variable-resolved) settings
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub reference: ConfigFileReference,
    pub settings: Arc<CSpellSettings>,
}

/// A config file merged with everything it imports
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
    pub settings: CSpellSettings,
    /// Files that contributed, imports before their importer
    pub sources: Vec<LoadedConfig>,
    pub diagnostics: Vec<ConfigDiagnostic>,
    /// The top-level file existed and could be read
    pub found: bool,
}

/// Files already applied during one resolution
///
/// Shared by every chain loaded for the same document, so that a file reached
/// both as an import and by discovery is applied once.
#[derive(Debug, Clone, Default)]
pub struct LoadSession {
    visited: HashSet<PathBuf>,
}

impl LoadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.visited.contains(&normalize_path(path))
    }
}

#[derive(Default)]
struct ChainState {
    visited: HashSet<PathBuf>,
    sources: Vec<LoadedConfig>,
    diagnostics: DiagnosticCollector,
}

/// Reads config files and flattens their import chains
#[derive(Clone)]
pub struct ConfigLoader {
    fs: Arc<dyn ConfigFs>,
    evaluator: Option<Arc<dyn DynamicConfigEvaluator>>,
}

impl ConfigLoader {
    pub fn new(fs: Arc<dyn ConfigFs>) -> Self {
        Self { fs, evaluator: None }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn DynamicConfigEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Read one file; `Ok(None)` if it does not exist
    pub async fn load_file(&self, path: &Path) -> Result<Option<CSpellSettings>> {
        let format = ConfigFormat::from_path(path);
        if format == ConfigFormat::Dynamic {
            if !self
                .fs
                .is_file(path)
                .await
                .map_err(|e| SettingsError::config_read_error(path, e))?
            {
                return Ok(None);
            }
            return match &self.evaluator {
                Some(evaluator) => evaluator.evaluate(path).await.map(Some),
                None => parse_settings(format, path, ""),
            };
        }
        let text = self
            .fs
            .read_to_string(path)
            .await
            .map_err(|e| SettingsError::config_read_error(path, e))?;
        match text {
            Some(text) => parse_settings(format, path, &text),
            None => Ok(None),
        }
    }

    /// Load `reference` and its imports, depth first and left to right
    ///
    /// A file's own settings are applied after everything it imports. Files
    /// already visited in this chain are skipped. Missing files contribute
    /// nothing; unreadable or malformed ones contribute nothing and leave a
    /// diagnostic.
    pub async fn load_and_merge(
        &self,
        reference: ConfigFileReference,
        vars: &VariableResolver,
    ) -> MergedConfig {
        self.load_and_merge_in(reference, vars, &mut LoadSession::new())
            .await
    }

    /// Like [`Self::load_and_merge`], but also skips files `session` has
    /// already applied, and records the files of this chain in it
    pub async fn load_and_merge_in(
        &self,
        reference: ConfigFileReference,
        vars: &VariableResolver,
        session: &mut LoadSession,
    ) -> MergedConfig {
        let mut state = ChainState {
            visited: std::mem::take(&mut session.visited),
            ..Default::default()
        };
        let (settings, found) = self.load_recursive(reference, vars, &mut state).await;
        session.visited = state.visited;
        MergedConfig {
            settings,
            sources: state.sources,
            diagnostics: state.diagnostics.into_vec(),
            found,
        }
    }

    fn load_recursive<'a>(
        &'a self,
        reference: ConfigFileReference,
        vars: &'a VariableResolver,
        state: &'a mut ChainState,
    ) -> BoxFuture<'a, (CSpellSettings, bool)> {
        async move {
            let key = normalize_path(&reference.path);
            if !state.visited.insert(key) {
                debug!("Skipping already visited config: {}", reference.path.display());
                return (CSpellSettings::default(), true);
            }

            let raw = match self.load_file(&reference.path).await {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    debug!("Config not found: {}", reference.path.display());
                    return (CSpellSettings::default(), false);
                }
                Err(err) => {
                    let found = err.kind() != ErrorKind::ConfigFileRead;
                    state.diagnostics.push(&err, Some(reference.path.as_path()));
                    return (CSpellSettings::default(), found);
                }
            };
            debug!("Loaded config: {}", reference.path.display());

            let vars = vars.for_source(&reference.path);
            let own = vars.resolve_settings(&raw, &mut state.diagnostics, Some(reference.path.as_path()));
            let base_dir = reference.path.parent().unwrap_or(Path::new("/")).to_path_buf();

            let mut merged = CSpellSettings::default();
            for import in own.imports() {
                let child = ConfigFileReference::imported_by(
                    resolve_path(&base_dir, &import),
                    reference.path.clone(),
                );
                let (child_settings, _) = self.load_recursive(child, &vars, state).await;
                merged.merge_with(&child_settings);
            }
            merged.merge_with(&own);
            merged.import = None;

            state.sources.push(LoadedConfig {
                reference,
                settings: Arc::new(own),
            });
            (merged, true)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::TokioFs;
    use std::fs;
    use tempfile::TempDir;

    fn loader() -> ConfigLoader {
        ConfigLoader::new(Arc::new(TokioFs))
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("cspell.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("cspell.jsonc")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("cspell.config.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("cspell.config.cjs")), ConfigFormat::Dynamic);
        assert_eq!(ConfigFormat::from_path(Path::new("a/package.json")), ConfigFormat::PackageJson);
    }

    #[test]
    fn test_parse_jsonc() {
        let text = r#"{
            // comment
            "words": ["one", "two",],
        }"#;
        let settings = parse_settings(ConfigFormat::Json, Path::new("cspell.jsonc"), text)
            .unwrap()
            .unwrap();
        assert_eq!(settings.words(), ["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_parse_package_json() {
        let text = r#"{ "name": "pkg", "cspell": { "language": "fr" } }"#;
        let settings = parse_settings(ConfigFormat::PackageJson, Path::new("package.json"), text)
            .unwrap()
            .unwrap();
        assert_eq!(settings.language.as_deref(), Some("fr"));

        let none = parse_settings(ConfigFormat::PackageJson, Path::new("package.json"), "{}").unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_importer_overrides_imports() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shared/base.json", r#"{ "language": "en", "words": ["base"] }"#);
        let main = write(
            temp.path(),
            "cspell.json",
            r#"{ "import": ["./shared/base.json"], "language": "fr", "words": ["main"] }"#,
        );

        let merged = loader()
            .load_and_merge(ConfigFileReference::new(main.clone()), &VariableResolver::default())
            .await;

        assert!(merged.found);
        assert_eq!(merged.settings.language.as_deref(), Some("fr"));
        assert_eq!(merged.settings.words(), ["base".to_string(), "main".to_string()]);
        assert!(merged.settings.import.is_none());
        assert_eq!(merged.sources.len(), 2);
        assert_eq!(merged.sources[1].reference.path, main);
        assert_eq!(merged.sources[0].reference.source.as_deref(), Some(main.as_path()));
    }

    #[tokio::test]
    async fn test_import_cycle_is_skipped() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a.json", r#"{ "import": "b.json", "words": ["a"] }"#);
        write(temp.path(), "b.json", r#"{ "import": "a.json", "words": ["b"] }"#);

        let merged = loader()
            .load_and_merge(ConfigFileReference::new(a), &VariableResolver::default())
            .await;

        assert_eq!(merged.settings.words(), ["b".to_string(), "a".to_string()]);
        assert_eq!(merged.sources.len(), 2);
        assert!(merged.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_bad_import_does_not_abort_chain() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "broken.json", "{ not json");
        let main = write(
            temp.path(),
            "cspell.json",
            r#"{ "import": ["broken.json", "missing.json"], "words": ["ok"] }"#,
        );

        let merged = loader()
            .load_and_merge(ConfigFileReference::new(main), &VariableResolver::default())
            .await;

        assert_eq!(merged.settings.words(), ["ok".to_string()]);
        assert_eq!(merged.diagnostics.len(), 1);
        assert_eq!(merged.diagnostics[0].kind, ErrorKind::ConfigFileParse);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let merged = loader()
            .load_and_merge(
                ConfigFileReference::new(temp.path().join("cspell.json")),
                &VariableResolver::default(),
            )
            .await;
        assert!(!merged.found);
        assert_eq!(merged.settings, CSpellSettings::default());
        assert!(merged.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_shared_session_applies_file_once() {
        let temp = TempDir::new().unwrap();
        let root = write(temp.path(), "cspell.json", r#"{ "ignorePaths": ["node_modules"] }"#);
        let client = write(
            temp.path(),
            "client/cspell.json",
            r#"{ "import": ["../cspell.json"], "words": ["client"] }"#,
        );
        let vars = VariableResolver::default();
        let mut session = LoadSession::new();

        let first = loader()
            .load_and_merge_in(ConfigFileReference::new(root.clone()), &vars, &mut session)
            .await;
        assert_eq!(first.sources.len(), 1);
        assert!(session.contains(&root));

        let second = loader()
            .load_and_merge_in(ConfigFileReference::new(client.clone()), &vars, &mut session)
            .await;
        assert!(second.found);
        assert_eq!(second.sources.len(), 1);
        assert_eq!(second.sources[0].reference.path, normalize_path(&client));
        assert!(second.settings.ignore_paths.is_none());
        assert_eq!(second.settings.words(), ["client".to_string()]);

        // a fresh session still follows the import
        let alone = loader()
            .load_and_merge(ConfigFileReference::new(client), &vars)
            .await;
        assert_eq!(alone.sources.len(), 2);
    }

    struct FixedEvaluator;

    #[async_trait]
    impl DynamicConfigEvaluator for FixedEvaluator {
        async fn evaluate(&self, _path: &Path) -> Result<CSpellSettings> {
            Ok(CSpellSettings {
                words: Some(vec!["dynamic".to_string()]),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_dynamic_config() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "cspell.config.js", "module.exports = {}");

        let merged = loader()
            .load_and_merge(ConfigFileReference::new(path.clone()), &VariableResolver::default())
            .await;
        assert_eq!(merged.diagnostics.len(), 1);

        let merged = loader()
            .with_evaluator(Arc::new(FixedEvaluator))
            .load_and_merge(ConfigFileReference::new(path), &VariableResolver::default())
            .await;
        assert_eq!(merged.settings.words(), ["dynamic".to_string()]);
    }
}
