//! Reading, writing and updating individual config files
//!
//! Updates (adding words, enabling languages, ...) read the file, apply a
//! pure transform and write the result back. Only `.json` / `.jsonc` files
//! other than `package.json` can be updated; anything else is rejected
//! before any I/O takes place.

use crate::config::{parse_settings, ConfigFormat};
use crate::error::SettingsError;
use crate::fs::ConfigFs;
use crate::settings::CSpellSettings;
use crate::uri::uri_to_path;
use crate::Result;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

pub const CURRENT_SETTINGS_FILE_VERSION: &str = "0.2";

pub const DEFAULT_FILE_NAME: &str = "cspell.json";

/// Config file names searched in each directory, in priority order
pub const CONFIG_FILE_LOCATIONS: &[&str] = &[
    // legacy names
    ".cspell.json",
    ".cSpell.json",
    "cspell.json",
    "cSpell.json",
    ".cspell.jsonc",
    "cspell.jsonc",
    // editor folder
    ".vscode/cspell.json",
    ".vscode/cSpell.json",
    ".vscode/.cspell.json",
    // standard names
    "cspell.config.json",
    "cspell.config.jsonc",
    "cspell.config.yaml",
    "cspell.config.yml",
    "cspell.yaml",
    "cspell.yml",
    // executable configs last
    "cspell.config.js",
    "cspell.config.cjs",
];

/// Files that may carry a config in a nested section
pub const NESTED_CONFIG_LOCATIONS: &[&str] = &["package.json"];

/// Member of a nested config carrier holding the settings
pub const NESTED_CONFIG_KEY: &str = "cspell";

/// `true` if a change to `path` may change resolved settings
pub fn is_config_file_to_watch(path: &Path) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");
    CONFIG_FILE_LOCATIONS
        .iter()
        .chain(NESTED_CONFIG_LOCATIONS)
        .any(|name| normalized == *name || normalized.ends_with(&format!("/{name}")))
}

pub fn default_settings() -> CSpellSettings {
    CSpellSettings {
        version: Some(CURRENT_SETTINGS_FILE_VERSION.to_string()),
        ..Default::default()
    }
}

fn file_path(uri: &Url) -> Result<PathBuf> {
    uri_to_path(uri).ok_or_else(|| SettingsError::invalid_uri(uri.as_str(), "not a file URI"))
}

/// Text of the file at `uri`; `None` when it does not exist
pub async fn read_raw_settings_file(fs: &dyn ConfigFs, uri: &Url) -> Result<Option<String>> {
    let path = file_path(uri)?;
    fs.read_to_string(&path)
        .await
        .map_err(|e| SettingsError::config_read_error(&path, e))
}

/// Settings stored at `uri`, or `defaults_if_not_found` (the default
/// settings when `None`) if the file does not exist
pub async fn read_settings(
    fs: &dyn ConfigFs,
    uri: &Url,
    defaults_if_not_found: Option<&CSpellSettings>,
) -> Result<CSpellSettings> {
    let path = file_path(uri)?;
    let parsed = match read_raw_settings_file(fs, uri).await? {
        Some(text) => parse_settings(ConfigFormat::from_path(&path), &path, &text)?,
        None => None,
    };
    Ok(parsed.unwrap_or_else(|| defaults_if_not_found.cloned().unwrap_or_else(default_settings)))
}

/// Write `settings` as JSON indented with four spaces
pub async fn write_settings(
    fs: &dyn ConfigFs,
    uri: &Url,
    settings: &CSpellSettings,
) -> Result<CSpellSettings> {
    let path = file_path(uri)?;
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    settings
        .serialize(&mut serializer)
        .map_err(|e| SettingsError::internal_error(format!("failed to serialize settings: {e}")))?;
    let text = String::from_utf8(buf)
        .map_err(|e| SettingsError::internal_error(format!("settings are not UTF-8: {e}")))?;
    fs.write(&path, &text)
        .await
        .map_err(|e| SettingsError::io_error(&path, e))?;
    debug!("Wrote settings to {}", path.display());
    Ok(settings.clone())
}

/// Trimmed word, or nothing for a blank word
pub fn normalize_word(word: &str) -> Vec<String> {
    let word = word.trim();
    if word.is_empty() {
        Vec::new()
    } else {
        vec![word.to_string()]
    }
}

fn merge_words(existing: Option<&[String]>, to_add: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut words: Vec<String> = existing
        .unwrap_or_default()
        .iter()
        .chain(to_add)
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(w.clone()))
        .collect();
    words.sort_by_cached_key(|w| w.to_lowercase());
    words
}

pub fn add_words_to_settings(settings: &CSpellSettings, words: &[String]) -> CSpellSettings {
    CSpellSettings {
        words: Some(merge_words(settings.words.as_deref(), words)),
        ..settings.clone()
    }
}

pub fn add_ignore_words_to_settings(settings: &CSpellSettings, words: &[String]) -> CSpellSettings {
    CSpellSettings {
        ignore_words: Some(merge_words(settings.ignore_words.as_deref(), words)),
        ..settings.clone()
    }
}

/// `words` without any of `to_remove`, compared ignoring case
pub fn filter_out_words(words: &[String], to_remove: &[String]) -> Vec<String> {
    let to_remove: HashSet<String> = to_remove.iter().map(|w| w.to_lowercase()).collect();
    words
        .iter()
        .filter(|w| !to_remove.contains(&w.to_lowercase()))
        .cloned()
        .collect()
}

pub fn remove_words_from_settings(settings: &CSpellSettings, to_remove: &[String]) -> CSpellSettings {
    CSpellSettings {
        words: Some(filter_out_words(settings.words(), to_remove)),
        ..settings.clone()
    }
}

/// Add language ids; with `only_if_exists` nothing changes unless the
/// settings already list language ids
pub fn add_language_ids_to_settings(
    settings: &CSpellSettings,
    language_ids: &[String],
    only_if_exists: bool,
) -> CSpellSettings {
    if settings.enabled_language_ids.is_none() && only_if_exists {
        return settings.clone();
    }
    let mut ids: Vec<String> = Vec::new();
    for id in settings.enabled_language_ids().iter().chain(language_ids) {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    CSpellSettings {
        enabled_language_ids: Some(ids),
        ..settings.clone()
    }
}

/// Remove language ids; the field is dropped once it is empty
pub fn remove_language_ids_from_settings(
    settings: &CSpellSettings,
    language_ids: &[String],
) -> CSpellSettings {
    let Some(current) = &settings.enabled_language_ids else {
        return settings.clone();
    };
    let remaining: Vec<String> = current
        .iter()
        .filter(|id| !language_ids.contains(id))
        .cloned()
        .collect();
    CSpellSettings {
        enabled_language_ids: (!remaining.is_empty()).then_some(remaining),
        ..settings.clone()
    }
}

/// `true` for `.json` / `.jsonc` files other than `package.json`; query and
/// fragment are ignored
pub fn is_update_supported_for_config_file_format(uri: &Url) -> bool {
    let mut stripped = uri.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    let path = stripped.path().to_lowercase();
    let name = path.rsplit('/').next().unwrap_or_default();
    (name.ends_with(".json") || name.ends_with(".jsonc")) && name != "package.json"
}

/// Read the file at `uri`, apply `action` and write the result
///
/// The file is rewritten as plain pretty-printed JSON, so comments and
/// trailing commas in a `.jsonc` file are not preserved.
pub async fn read_settings_file_and_apply_update<F>(
    fs: &dyn ConfigFs,
    uri: &Url,
    action: F,
) -> Result<CSpellSettings>
where
    F: FnOnce(CSpellSettings) -> CSpellSettings + Send,
{
    if !is_update_supported_for_config_file_format(uri) {
        return Err(SettingsError::unsupported_update_format(uri.as_str()));
    }
    let settings = read_settings(fs, uri, None).await?;
    let updated = action(settings);
    info!("Updating {}", uri);
    write_settings(fs, uri, &updated).await
}

pub async fn add_word_to_settings_and_update(
    fs: &dyn ConfigFs,
    uri: &Url,
    word: &str,
) -> Result<CSpellSettings> {
    let words = normalize_word(word);
    read_settings_file_and_apply_update(fs, uri, |s| add_words_to_settings(&s, &words)).await
}

pub async fn add_ignore_word_to_settings_and_update(
    fs: &dyn ConfigFs,
    uri: &Url,
    word: &str,
) -> Result<CSpellSettings> {
    let words = normalize_word(word);
    read_settings_file_and_apply_update(fs, uri, |s| add_ignore_words_to_settings(&s, &words)).await
}

pub async fn remove_word_from_settings_and_update(
    fs: &dyn ConfigFs,
    uri: &Url,
    word: &str,
) -> Result<CSpellSettings> {
    let words = normalize_word(word);
    read_settings_file_and_apply_update(fs, uri, |s| remove_words_from_settings(&s, &words)).await
}

pub async fn write_add_language_ids_to_settings(
    fs: &dyn ConfigFs,
    uri: &Url,
    language_ids: &[String],
    only_if_exists: bool,
) -> Result<CSpellSettings> {
    read_settings_file_and_apply_update(fs, uri, |s| {
        add_language_ids_to_settings(&s, language_ids, only_if_exists)
    })
    .await
}

pub async fn remove_language_ids_from_settings_and_update(
    fs: &dyn ConfigFs,
    uri: &Url,
    language_ids: &[String],
) -> Result<CSpellSettings> {
    read_settings_file_and_apply_update(fs, uri, |s| {
        remove_language_ids_from_settings(&s, language_ids)
    })
    .await
}
