//! Document settings resolution
//!
//! [`DocumentSettings`] combines, for one document, the layers below
//! (lowest precedence first) into a single settings value:
//!
//! 1. built-in defaults
//! 2. host global settings, after the configs they import
//! 3. host folder settings, after the configs they import
//! 4. on-disk config chains, farthest ancestor first
//! 5. explicitly registered config files
//!
//! Results are cached per scope (owning folder plus document directory)
//! and stamped with the resolver version. Any mutating
//! call bumps the version, which turns every cached entry stale; stale
//! entries are recomputed on their next access.

mod cache;

pub use cache::{VersionedCache, VersionedCell};

use crate::config::{
    ConfigFileReference, ConfigLoader, ConfigLocator, DynamicConfigEvaluator, LoadSession,
    LoadedConfig, MergedConfig, VariableResolver,
};
use crate::diagnostics::{ConfigDiagnostic, DiagnosticCollector};
use crate::fs::{ConfigFs, TokioFs};
use crate::host::{WorkspaceFolder, WorkspaceHost};
use crate::matcher::{self, GlobMatcher, GlobPatternWithRoot};
use crate::result::ResultExt;
use crate::settings::{
    correct_bad_settings, merge_settings, normalize_enabled_language_ids, CSpellSettings, GlobDef,
};
use crate::uri::{
    is_ancestor_or_equal, is_uri_allowed, is_uri_blocked, normalize_path, parse_uri, resolve_path,
    uri_to_path, DEFAULT_ALLOWED_SCHEMES, DEFAULT_BLOCKED_SCHEMES,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};
use url::Url;

/// Which `workspaceRootPath` wins when both the host and a config file set
/// one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkspaceRootPrecedence {
    /// The host's value wins
    #[default]
    HostOverride,
    /// The value from the highest-precedence config file wins
    ConfigChain,
}

/// Resolver behaviour knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    pub workspace_root_precedence: WorkspaceRootPrecedence,
    pub allowed_schemes: Vec<String>,
    pub blocked_schemes: Vec<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            workspace_root_precedence: WorkspaceRootPrecedence::default(),
            allowed_schemes: DEFAULT_ALLOWED_SCHEMES.iter().map(|s| s.to_string()).collect(),
            blocked_schemes: DEFAULT_BLOCKED_SCHEMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// An exclusion rule that matched a document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedByMatch {
    pub glob: String,
    pub root: PathBuf,
    /// Config file that declared the rule; `None` for host or default rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ConfigFileReference>,
    /// Settings of the layer that declared the rule
    pub settings: Arc<CSpellSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncludeExcludeFlags {
    pub include: bool,
    pub exclude: bool,
}

/// Cache key: documents sharing a folder and a directory share settings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DocumentScope {
    folder: Option<Url>,
    directory: Option<PathBuf>,
}

impl DocumentScope {
    fn new(uri: &Url, folders: &[WorkspaceFolder]) -> Self {
        Self {
            folder: matching_folders(folders, uri).into_iter().next().map(|f| f.uri),
            directory: uri_to_path(uri).and_then(|p| p.parent().map(Path::to_path_buf)),
        }
    }
}

#[derive(Debug, Clone)]
struct ExclusionRule {
    glob: GlobPatternWithRoot,
    source: Option<ConfigFileReference>,
    settings: Arc<CSpellSettings>,
}

/// Everything resolved for one scope
#[derive(Debug)]
struct ExtSettings {
    settings: Arc<CSpellSettings>,
    config_files: Vec<Url>,
    diagnostics: Vec<ConfigDiagnostic>,
    /// Root for relative host globs and `overrides`
    glob_root: Option<PathBuf>,
    exclusions: Vec<ExclusionRule>,
    excluder: GlobMatcher,
    includer: GlobMatcher,
}

#[derive(Debug, Default)]
struct SessionState {
    version: u64,
    configs_to_import: BTreeSet<PathBuf>,
}

/// Session state as seen by one resolution
struct Snapshot {
    version: u64,
    configs_to_import: Vec<PathBuf>,
}

/// Resolves effective settings for documents of one host session
pub struct DocumentSettings {
    host: Arc<dyn WorkspaceHost>,
    fs: Arc<dyn ConfigFs>,
    evaluator: Option<Arc<dyn DynamicConfigEvaluator>>,
    defaults: Arc<CSpellSettings>,
    options: ResolverOptions,
    locator: ConfigLocator,
    loader: ConfigLoader,
    state: RwLock<SessionState>,
    folders: VersionedCell<Arc<[WorkspaceFolder]>>,
    scopes: VersionedCache<DocumentScope, Arc<ExtSettings>>,
}

impl DocumentSettings {
    pub fn new(host: Arc<dyn WorkspaceHost>, defaults: CSpellSettings) -> Self {
        let fs: Arc<dyn ConfigFs> = Arc::new(TokioFs);
        Self {
            host,
            locator: ConfigLocator::new(Arc::clone(&fs)),
            loader: ConfigLoader::new(Arc::clone(&fs)),
            fs,
            evaluator: None,
            defaults: Arc::new(defaults),
            options: ResolverOptions::default(),
            state: RwLock::new(SessionState::default()),
            folders: VersionedCell::new(),
            scopes: VersionedCache::new(),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn ConfigFs>) -> Self {
        self.fs = fs;
        self.rebuild_io();
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn DynamicConfigEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self.rebuild_io();
        self
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    fn rebuild_io(&mut self) {
        self.locator = ConfigLocator::new(Arc::clone(&self.fs));
        let loader = ConfigLoader::new(Arc::clone(&self.fs));
        self.loader = match &self.evaluator {
            Some(evaluator) => loader.with_evaluator(Arc::clone(evaluator)),
            None => loader,
        };
    }

    pub fn fs(&self) -> &Arc<dyn ConfigFs> {
        &self.fs
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn version(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).version
    }

    /// Explicitly registered config files, sorted
    pub fn configs_to_import(&self) -> Vec<PathBuf> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.configs_to_import.iter().cloned().collect()
    }

    fn snapshot(&self) -> Snapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Snapshot {
            version: state.version,
            configs_to_import: state.configs_to_import.iter().cloned().collect(),
        }
    }

    fn bump_version(&self, register: Option<PathBuf>) -> u64 {
        let version = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(path) = register {
                state.configs_to_import.insert(path);
            }
            state.version += 1;
            state.version
        };
        self.scopes.clear();
        self.folders.clear();
        version
    }

    /// Add a config file applied to every document, above all discovered
    /// ones
    pub fn register_configuration_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        let absolute = normalize_path(&absolute);
        let version = self.bump_version(Some(absolute.clone()));
        info!("Registered config file {} (version {})", absolute.display(), version);
    }

    /// Drop all cached state
    pub fn reset_settings(&self) {
        let version = self.bump_version(None);
        info!("Settings reset (version {})", version);
    }

    /// `true` if documents with this URI's scheme should be checked at all
    pub fn is_uri_checkable(&self, uri: &str) -> bool {
        let allowed: Vec<&str> = self.options.allowed_schemes.iter().map(String::as_str).collect();
        let blocked: Vec<&str> = self.options.blocked_schemes.iter().map(String::as_str).collect();
        is_uri_allowed(uri, Some(allowed.as_slice()))
            && !is_uri_blocked(uri, Some(blocked.as_slice()))
    }

    /// Workspace folders, fetched from the host once per version
    pub async fn folders(&self) -> Result<Arc<[WorkspaceFolder]>> {
        self.folders_at(self.version()).await
    }

    async fn folders_at(&self, version: u64) -> Result<Arc<[WorkspaceFolder]>> {
        if let Some(folders) = self.folders.get(version) {
            return Ok(folders);
        }
        debug!("Fetching workspace folders (version {})", version);
        let folders: Arc<[WorkspaceFolder]> =
            self.host.get_workspace_folders().await?.unwrap_or_default().into();
        self.folders.set(version, Arc::clone(&folders));
        Ok(folders)
    }

    /// Effective settings for the document at `uri`
    pub async fn get_settings(&self, uri: &str) -> Result<Arc<CSpellSettings>> {
        let uri = parse_uri(uri)?;
        let ext = self.ext_settings(&uri).await?;
        Ok(apply_overrides(&ext, uri_to_path(&uri).as_deref()))
    }

    /// Problems found while resolving the settings for `uri`
    pub async fn get_diagnostics(&self, uri: &str) -> Result<Vec<ConfigDiagnostic>> {
        let uri = parse_uri(uri)?;
        Ok(self.ext_settings(&uri).await?.diagnostics.clone())
    }

    pub async fn is_excluded(&self, uri: &str) -> Result<bool> {
        let uri = parse_uri(uri)?;
        let Some(path) = uri_to_path(&uri) else {
            return Ok(false);
        };
        Ok(self.ext_settings(&uri).await?.excluder.matches(&path))
    }

    /// Every exclusion rule matching `uri`; empty when it is not excluded
    pub async fn calc_excluded_by(&self, uri: &str) -> Result<Vec<ExcludedByMatch>> {
        let uri = parse_uri(uri)?;
        let Some(path) = uri_to_path(&uri) else {
            return Ok(Vec::new());
        };
        let ext = self.ext_settings(&uri).await?;
        Ok(ext
            .excluder
            .match_indices(&path)
            .into_iter()
            .map(|index| {
                let rule = &ext.exclusions[index];
                ExcludedByMatch {
                    glob: rule.glob.glob.clone(),
                    root: rule.glob.root.clone(),
                    source: rule.source.clone(),
                    settings: Arc::clone(&rule.settings),
                }
            })
            .collect())
    }

    /// Whether `uri` is selected by `files` (everything when there are none)
    /// and whether it is excluded by `ignorePaths`
    pub async fn calc_include_exclude(&self, uri: &str) -> Result<IncludeExcludeFlags> {
        let uri = parse_uri(uri)?;
        let Some(path) = uri_to_path(&uri) else {
            return Ok(IncludeExcludeFlags {
                include: true,
                exclude: false,
            });
        };
        let ext = self.ext_settings(&uri).await?;
        Ok(IncludeExcludeFlags {
            include: ext.includer.is_empty() || ext.includer.matches(&path),
            exclude: ext.excluder.matches(&path),
        })
    }

    /// Config files that apply to `uri` and could be read, nearest first,
    /// followed by the registered ones
    pub async fn find_cspell_configuration_files_for_uri(&self, uri: &str) -> Result<Vec<Url>> {
        let uri = parse_uri(uri)?;
        Ok(self.ext_settings(&uri).await?.config_files.clone())
    }

    /// The deepest workspace folder containing `uri`
    pub async fn find_matching_folder(&self, uri: &str) -> Result<Option<WorkspaceFolder>> {
        Ok(self.matching_folders_for_uri(uri).await?.into_iter().next())
    }

    /// Workspace folders containing `uri`, deepest first
    pub async fn matching_folders_for_uri(&self, uri: &str) -> Result<Vec<WorkspaceFolder>> {
        let uri = parse_uri(uri)?;
        let folders = self.folders().await?;
        Ok(matching_folders(&folders, &uri))
    }

    async fn ext_settings(&self, uri: &Url) -> Result<Arc<ExtSettings>> {
        let snapshot = self.snapshot();
        let folders = self.folders_at(snapshot.version).await?;
        let scope = DocumentScope::new(uri, &folders);
        if let Some(cached) = self.scopes.get(&scope, snapshot.version) {
            debug!("Settings cache hit for {}", uri);
            return Ok(cached);
        }
        debug!("Settings cache miss for {} (version {})", uri, snapshot.version);
        let ext = Arc::new(self.resolve_scope(uri, &scope, &folders, &snapshot).await?);
        self.scopes.insert(scope, snapshot.version, Arc::clone(&ext));
        Ok(ext)
    }

    async fn resolve_scope(
        &self,
        uri: &Url,
        scope: &DocumentScope,
        folders: &Arc<[WorkspaceFolder]>,
        snapshot: &Snapshot,
    ) -> Result<ExtSettings> {
        let mut diagnostics = DiagnosticCollector::new();
        let owner = scope
            .folder
            .as_ref()
            .and_then(|folder| folders.iter().find(|f| &f.uri == folder))
            .cloned();
        let host_scope = owner
            .as_ref()
            .or_else(|| folders.first())
            .map(|f| f.uri.clone())
            .unwrap_or_else(|| uri.clone());
        debug!("Fetching host configuration for {}", host_scope);
        let host = self.host.get_configuration(Some(&host_scope)).await?;

        let folder_root = owner.as_ref().and_then(WorkspaceFolder::path);
        // documents outside any folder fall back to their own directory, and
        // non-file documents to the first folder
        let base_dir = folder_root
            .clone()
            .or_else(|| scope.directory.clone())
            .or_else(|| folders.first().and_then(WorkspaceFolder::path));
        let vars = VariableResolver::new(Arc::clone(folders)).with_current(owner.clone());

        let defaults = vars.resolve_settings(&self.defaults, &mut diagnostics, None);
        let global = vars.resolve_settings(&host.global, &mut diagnostics, None);
        let scoped = vars.resolve_settings(&host.scoped, &mut diagnostics, None);

        let host_root = scoped
            .workspace_root_path
            .as_deref()
            .or(global.workspace_root_path.as_deref())
            .and_then(|root| resolve_against(base_dir.as_deref(), root));
        let vars = vars.with_workspace_root(host_root.clone());

        // Layers load in precedence order and share one session: a file
        // applies at the lowest layer that reaches it.
        let mut session = LoadSession::new();
        let global_imports = self
            .load_host_imports(&global, base_dir.as_deref(), &vars, &mut session)
            .await;
        let scoped_imports = self
            .load_host_imports(&scoped, base_dir.as_deref(), &vars, &mut session)
            .await;

        let folder_roots: Vec<PathBuf> = folders.iter().filter_map(WorkspaceFolder::path).collect();
        let search = self
            .locator
            .find_config_files_for_uri(
                uri,
                base_dir.as_deref(),
                &folder_roots,
                &snapshot.configs_to_import,
            )
            .await;
        // farthest first, so that nearer files are merged last
        let mut chains: Vec<(&ConfigFileReference, MergedConfig)> = Vec::new();
        for reference in search.discovered.iter().rev().chain(search.registered.iter()) {
            let merged = self
                .loader
                .load_and_merge_in(reference.clone(), &vars, &mut session)
                .await;
            chains.push((reference, merged));
        }

        let (discovered, registered) = chains.split_at(search.discovered.len());
        let mut listed = HashSet::new();
        let config_files: Vec<Url> = discovered
            .iter()
            .rev()
            .chain(registered.iter())
            .filter(|(_, merged)| merged.found)
            .filter(|(reference, _)| listed.insert(reference.path.clone()))
            .filter_map(|(reference, _)| reference.uri().log_and_continue())
            .collect();

        let file_layers: Vec<&MergedConfig> = chains.iter().map(|(_, merged)| merged).collect();
        let chain_root = file_layers
            .iter()
            .flat_map(|merged| merged.sources.iter())
            .filter_map(|source| {
                let root = source.settings.workspace_root_path.as_deref()?;
                resolve_against(Some(source.reference.root.as_path()), root)
            })
            .last();
        let workspace_root = match self.options.workspace_root_precedence {
            WorkspaceRootPrecedence::HostOverride => host_root.or(chain_root),
            WorkspaceRootPrecedence::ConfigChain => chain_root.or(host_root),
        }
        .or_else(|| folder_root.clone());
        let glob_root = workspace_root.clone().or_else(|| base_dir.clone());

        let defaults = Arc::new(defaults);
        let global = Arc::new(global);
        let scoped = Arc::new(scoped);

        let mut globs = GlobCollector::default();
        globs.add_layer(&defaults, None, glob_root.as_deref());
        globs.add_merged(&global_imports);
        globs.add_layer(&global, None, glob_root.as_deref());
        globs.add_merged(&scoped_imports);
        globs.add_layer(&scoped, None, glob_root.as_deref());
        globs.add_merged(file_layers.iter().copied());

        let mut layers: Vec<&CSpellSettings> = vec![&*defaults];
        layers.extend(global_imports.iter().map(|m| &m.settings));
        layers.push(&*global);
        layers.extend(scoped_imports.iter().map(|m| &m.settings));
        layers.push(&*scoped);
        layers.extend(file_layers.iter().copied().map(|m| &m.settings));

        let mut merged = merge_settings(layers);
        merged.ignore_paths = rooted_globs(globs.exclusions.iter().map(|rule| &rule.glob));
        merged.files = rooted_globs(globs.includes.iter());
        merged.workspace_root_path = workspace_root
            .as_ref()
            .map(|root| root.to_string_lossy().into_owned());
        normalize_enabled_language_ids(&mut merged);
        let merged = correct_bad_settings(&merged);

        for chain in global_imports
            .iter()
            .chain(scoped_imports.iter())
            .chain(file_layers.iter().copied())
        {
            diagnostics.extend(chain.diagnostics.iter().cloned());
        }
        let excluder = GlobMatcher::new(
            globs.exclusions.iter().map(|rule| rule.glob.clone()),
            &mut diagnostics,
        );
        let includer = GlobMatcher::new(globs.includes.iter().cloned(), &mut diagnostics);

        Ok(ExtSettings {
            settings: Arc::new(merged),
            config_files,
            diagnostics: diagnostics.into_vec(),
            glob_root,
            exclusions: globs.exclusions,
            excluder,
            includer,
        })
    }

    /// Load the configs listed in a host layer's `import`
    async fn load_host_imports(
        &self,
        settings: &CSpellSettings,
        base_dir: Option<&Path>,
        vars: &VariableResolver,
        session: &mut LoadSession,
    ) -> Vec<MergedConfig> {
        let references: Vec<ConfigFileReference> = settings
            .imports()
            .iter()
            .filter_map(|import| {
                let path = resolve_against(base_dir, import);
                if path.is_none() {
                    debug!("Skipping host import without a base directory: {}", import);
                }
                path
            })
            .map(ConfigFileReference::new)
            .collect();
        let mut loaded = Vec::with_capacity(references.len());
        for reference in references {
            loaded.push(self.loader.load_and_merge_in(reference, vars, session).await);
        }
        loaded
    }
}

/// Exclusion and inclusion globs of every layer, with their roots
#[derive(Default)]
struct GlobCollector {
    exclusions: Vec<ExclusionRule>,
    includes: Vec<GlobPatternWithRoot>,
}

impl GlobCollector {
    fn add_layer(
        &mut self,
        settings: &Arc<CSpellSettings>,
        source: Option<&ConfigFileReference>,
        default_root: Option<&Path>,
    ) {
        let pattern = |glob: &GlobDef| {
            let root = match glob.root() {
                Some(root) => resolve_against(default_root, root),
                None => default_root.map(Path::to_path_buf),
            };
            let Some(root) = root else {
                debug!("No root for glob {}", glob.glob());
                return None;
            };
            let pattern = GlobPatternWithRoot::new(glob.glob(), root);
            Some(match source {
                Some(source) => pattern.with_source(&source.path),
                None => pattern,
            })
        };
        for glob in settings.ignore_paths() {
            if let Some(glob) = pattern(glob) {
                self.exclusions.push(ExclusionRule {
                    glob,
                    source: source.cloned(),
                    settings: Arc::clone(settings),
                });
            }
        }
        self.includes.extend(settings.files().iter().filter_map(pattern));
    }

    fn add_loaded(&mut self, loaded: &LoadedConfig) {
        let root = loaded
            .settings
            .glob_root
            .as_deref()
            .and_then(|glob_root| resolve_against(Some(loaded.reference.root.as_path()), glob_root))
            .unwrap_or_else(|| loaded.reference.root.clone());
        self.add_layer(&loaded.settings, Some(&loaded.reference), Some(root.as_path()));
    }

    fn add_merged<'a>(&mut self, merged: impl IntoIterator<Item = &'a MergedConfig>) {
        for merged in merged {
            for loaded in &merged.sources {
                self.add_loaded(loaded);
            }
        }
    }
}

/// `part` resolved against `base`; `None` if that does not yield an
/// absolute path
fn resolve_against(base: Option<&Path>, part: &str) -> Option<PathBuf> {
    let resolved = resolve_path(base.unwrap_or(Path::new("")), part);
    resolved.is_absolute().then_some(resolved)
}

fn rooted_globs<'a>(globs: impl Iterator<Item = &'a GlobPatternWithRoot>) -> Option<Vec<GlobDef>> {
    let mut seen = HashSet::new();
    let list: Vec<GlobDef> = globs
        .filter(|g| seen.insert((g.glob.to_lowercase(), g.root.to_string_lossy().to_lowercase())))
        .map(|g| GlobDef::Rooted {
            glob: g.glob.clone(),
            root: g.root.to_string_lossy().into_owned(),
        })
        .collect();
    (!list.is_empty()).then_some(list)
}

/// Folders containing `uri`, deepest first
fn matching_folders(folders: &[WorkspaceFolder], uri: &Url) -> Vec<WorkspaceFolder> {
    let path = uri_to_path(uri);
    let mut matching: Vec<WorkspaceFolder> = folders
        .iter()
        .filter(|folder| match (&path, folder.path()) {
            (Some(path), Some(root)) => is_ancestor_or_equal(&root, path),
            _ => {
                let prefix = folder.uri.as_str().trim_end_matches('/');
                let uri = uri.as_str();
                uri == prefix || uri.starts_with(&format!("{prefix}/"))
            }
        })
        .cloned()
        .collect();
    matching.sort_by_key(|folder| std::cmp::Reverse(folder.uri.as_str().trim_end_matches('/').len()));
    matching
}

/// Merge the `overrides` whose `filename` globs match `path`
fn apply_overrides(ext: &ExtSettings, path: Option<&Path>) -> Arc<CSpellSettings> {
    let (Some(path), Some(overrides)) = (path, ext.settings.overrides.as_deref()) else {
        return Arc::clone(&ext.settings);
    };
    let root = ext
        .glob_root
        .clone()
        .or_else(|| path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let mut applied = false;
    let mut settings = CSpellSettings::clone(&ext.settings);
    for entry in overrides {
        let is_match = entry.filename.to_vec().iter().any(|glob| {
            matcher::matches(path, glob, &root)
                .log_and_continue()
                .unwrap_or(false)
        });
        if is_match {
            settings.merge_with(&entry.settings);
            applied = true;
        }
    }
    if !applied {
        return Arc::clone(&ext.settings);
    }
    normalize_enabled_language_ids(&mut settings);
    Arc::new(correct_bad_settings(&settings))
}
