//! `${workspaceFolder}` substitution in path-bearing settings

use crate::diagnostics::DiagnosticCollector;
use crate::error::SettingsError;
use crate::host::WorkspaceFolder;
use crate::settings::{CSpellSettings, GlobDef, OneOrMany};
use crate::uri::is_ancestor_or_equal;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

/// `${workspaceFolder}`, `${workspaceFolder:NAME}` and the `workspaceRoot`
/// aliases
static VARIABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(workspaceFolder|workspaceRoot)(?::([^}]*))?\}").unwrap()
});

/// Expands workspace variables against the known folders
#[derive(Debug, Clone, Default)]
pub struct VariableResolver {
    folders: Arc<[WorkspaceFolder]>,
    current: Option<WorkspaceFolder>,
    workspace_root: Option<PathBuf>,
}

impl VariableResolver {
    pub fn new(folders: impl Into<Arc<[WorkspaceFolder]>>) -> Self {
        Self {
            folders: folders.into(),
            current: None,
            workspace_root: None,
        }
    }

    /// Folder substituted for a bare `${workspaceFolder}`
    pub fn with_current(mut self, folder: Option<WorkspaceFolder>) -> Self {
        self.current = folder;
        self
    }

    /// Directory substituted for a bare `${workspaceRoot}`
    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root = root;
        self
    }

    /// Resolver for settings read from `source`: a bare `${workspaceFolder}`
    /// refers to the first registered folder containing that file
    pub fn for_source(&self, source: &Path) -> Self {
        let owner = self
            .folders
            .iter()
            .find(|folder| folder.path().is_some_and(|root| is_ancestor_or_equal(&root, source)))
            .cloned();
        Self {
            folders: Arc::clone(&self.folders),
            current: owner.or_else(|| self.current.clone()),
            workspace_root: self.workspace_root.clone(),
        }
    }

    pub fn folders(&self) -> &[WorkspaceFolder] {
        &self.folders
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    fn lookup(&self, kind: &str, name: Option<&str>) -> Option<PathBuf> {
        match name {
            Some(name) => self.folders.iter().find(|f| f.name == name)?.path(),
            None if kind == "workspaceRoot" => self
                .workspace_root
                .clone()
                .or_else(|| self.folders.first()?.path()),
            None => self
                .current
                .as_ref()
                .or_else(|| self.folders.first())?
                .path(),
        }
    }

    fn lookup_captures(&self, caps: &Captures<'_>) -> Option<PathBuf> {
        self.lookup(&caps[1], caps.get(2).map(|m| m.as_str()))
    }

    /// Substitute every token in `value`
    ///
    /// Tokens that cannot be resolved are left as written and reported.
    pub fn resolve_value(
        &self,
        value: &str,
        diagnostics: &mut DiagnosticCollector,
        source: Option<&Path>,
    ) -> String {
        if !value.contains("${") {
            return value.to_string();
        }
        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for caps in VARIABLE_REGEX.captures_iter(value) {
            let Some(token) = caps.get(0) else {
                continue;
            };
            out.push_str(&value[last..token.start()]);
            match self.lookup_captures(&caps) {
                Some(path) => out.push_str(&path_to_slash(&path)),
                None => {
                    diagnostics.push(
                        &SettingsError::unresolved_variable(token.as_str(), value),
                        source,
                    );
                    out.push_str(token.as_str());
                }
            }
            last = token.end();
        }
        out.push_str(&value[last..]);
        out
    }

    /// Resolve a glob; a glob starting with a variable becomes a rooted glob
    /// relative to the variable's directory
    pub fn resolve_glob(
        &self,
        glob: &GlobDef,
        diagnostics: &mut DiagnosticCollector,
        source: Option<&Path>,
    ) -> GlobDef {
        match glob {
            GlobDef::Pattern(pattern) => {
                let trimmed = pattern.trim_start();
                if let Some(caps) = VARIABLE_REGEX.captures(trimmed)
                    && let Some(token) = caps.get(0)
                    && token.start() == 0
                    && let Some(root) = self.lookup_captures(&caps)
                {
                    let rest = self.resolve_value(&trimmed[token.end()..], diagnostics, source);
                    let rest = rest.trim_start_matches(['/', '\\']);
                    let glob = if rest.is_empty() {
                        "/**".to_string()
                    } else {
                        format!("/{rest}")
                    };
                    return GlobDef::Rooted {
                        glob,
                        root: path_to_slash(&root),
                    };
                }
                GlobDef::Pattern(self.resolve_value(pattern, diagnostics, source))
            }
            GlobDef::Rooted { glob, root } => GlobDef::Rooted {
                glob: self.resolve_value(glob, diagnostics, source),
                root: self.resolve_value(root, diagnostics, source),
            },
        }
    }

    /// Expand variables in `ignorePaths`, `files`, `import`,
    /// `workspaceRootPath` and `globRoot` (including those of `overrides`)
    pub fn resolve_settings(
        &self,
        settings: &CSpellSettings,
        diagnostics: &mut DiagnosticCollector,
        source: Option<&Path>,
    ) -> CSpellSettings {
        let mut resolved = settings.clone();
        let globs = |list: &Option<Vec<GlobDef>>, diagnostics: &mut DiagnosticCollector| {
            list.as_ref().map(|globs| {
                globs
                    .iter()
                    .map(|glob| self.resolve_glob(glob, diagnostics, source))
                    .collect::<Vec<_>>()
            })
        };
        resolved.ignore_paths = globs(&settings.ignore_paths, diagnostics);
        resolved.files = globs(&settings.files, diagnostics);

        resolved.import = settings.import.as_ref().map(|import| match import {
            OneOrMany::One(path) => OneOrMany::One(self.resolve_value(path, diagnostics, source)),
            OneOrMany::Many(paths) => OneOrMany::Many(
                paths
                    .iter()
                    .map(|path| self.resolve_value(path, diagnostics, source))
                    .collect(),
            ),
        });
        resolved.workspace_root_path = settings
            .workspace_root_path
            .as_ref()
            .map(|path| self.resolve_value(path, diagnostics, source));
        resolved.glob_root = settings
            .glob_root
            .as_ref()
            .map(|path| self.resolve_value(path, diagnostics, source));

        if let Some(overrides) = &mut resolved.overrides {
            for entry in overrides.iter_mut() {
                entry.settings = self.resolve_settings(&entry.settings, diagnostics, source);
            }
        }
        resolved
    }
}

fn path_to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
