//! Settings model
//!
//! [`CSpellSettings`] is the shape shared by every layer the resolver works
//! with: built-in defaults, host-supplied settings, on-disk config files and
//! the final per-document result. Fields the resolver interprets are typed;
//! everything else is carried through untouched in [`CSpellSettings::extra`].
//!
//! ## Example (cspell.json)
//!
//! ```jsonc
//! {
//!   "version": "0.2",
//!   "language": "en-gb",
//!   "import": ["../shared/cspell.json"],
//!   "ignorePaths": ["node_modules", "${workspaceFolder:client}/dist/**"],
//!   "enabledLanguageIds": ["markdown", "!typescript"],
//!   "words": ["rustc"]
//! }
//! ```

mod correct;
mod merge;

pub use correct::{correct_bad_settings, fix_pattern, fix_reg_ex};
pub use merge::{merge_settings, normalize_enabled_language_ids};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A value written either as a single item or as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value.clone()],
            OneOrMany::Many(values) => values.clone(),
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

/// A glob entry in `ignorePaths` or `files`
///
/// Plain strings are relative to the root of the settings they came from.
/// The rooted form is produced when a glob starts with a workspace variable
/// and can also be written directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobDef {
    Pattern(String),
    Rooted { glob: String, root: String },
}

impl GlobDef {
    pub fn glob(&self) -> &str {
        match self {
            GlobDef::Pattern(glob) => glob,
            GlobDef::Rooted { glob, .. } => glob,
        }
    }

    pub fn root(&self) -> Option<&str> {
        match self {
            GlobDef::Pattern(_) => None,
            GlobDef::Rooted { root, .. } => Some(root),
        }
    }
}

impl From<&str> for GlobDef {
    fn from(glob: &str) -> Self {
        GlobDef::Pattern(glob.to_string())
    }
}

/// Named regular expression definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDefinition {
    pub name: String,
    pub pattern: OneOrMany<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Settings applied only to files whose name matches `filename`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSettings {
    pub filename: OneOrMany<String>,
    #[serde(flatten)]
    pub settings: CSpellSettings,
}

/// Spell checker settings as read from a config file or the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CSpellSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current active spelling language, e.g. `en-gb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Further config files to load; relative entries resolve against the
    /// directory of the importing file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<OneOrMany<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_words: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_words: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionaries: Option<Vec<String>>,

    /// Globs of files to exclude from spell checking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_paths: Option<Vec<GlobDef>>,

    /// Globs of files to include; empty means everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<GlobDef>>,

    /// Language ids to check; `!id` removes an id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_language_ids: Option<Vec<String>>,

    /// Host-side spelling of `enabledLanguageIds` adjustments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_filetypes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root_path: Option<String>,

    /// Root used for relative globs instead of the config file directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<PatternDefinition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_reg_exp_list: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_reg_exp_list: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Vec<OverrideSettings>>,

    /// Engine options passed through without interpretation
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CSpellSettings {
    pub fn imports(&self) -> Vec<String> {
        self.import.as_ref().map(OneOrMany::to_vec).unwrap_or_default()
    }

    pub fn words(&self) -> &[String] {
        self.words.as_deref().unwrap_or_default()
    }

    pub fn ignore_paths(&self) -> &[GlobDef] {
        self.ignore_paths.as_deref().unwrap_or_default()
    }

    pub fn files(&self) -> &[GlobDef] {
        self.files.as_deref().unwrap_or_default()
    }

    pub fn enabled_language_ids(&self) -> &[String] {
        self.enabled_language_ids.as_deref().unwrap_or_default()
    }
}
