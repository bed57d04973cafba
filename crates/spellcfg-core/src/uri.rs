//! URI and path helpers shared by the locator, loader and resolver

use crate::{Result, SettingsError};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Schemes a document may have and still be spell checked
pub const DEFAULT_ALLOWED_SCHEMES: &[&str] = &[
    "file",
    "gist",
    "sftp",
    "untitled",
    "vscode-notebook-cell",
];

/// Schemes that are never spell checked
pub const DEFAULT_BLOCKED_SCHEMES: &[&str] = &["git", "output", "debug", "vscode"];

pub fn parse_uri(uri: &str) -> Result<Url> {
    Url::parse(uri).map_err(|e| SettingsError::invalid_uri(uri, e.to_string()))
}

/// File system path of a `file:` URI, lexically normalized
pub fn uri_to_path(uri: &Url) -> Option<PathBuf> {
    if uri.scheme() != "file" {
        return None;
    }
    uri.to_file_path().ok().map(|p| normalize_path(&p))
}

pub fn path_to_uri(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|_| {
        SettingsError::invalid_uri(path.display().to_string(), "path is not absolute")
    })
}

pub fn does_uri_match_any_scheme(uri: &str, schemes: &[&str]) -> bool {
    Url::parse(uri)
        .map(|u| schemes.contains(&u.scheme()))
        .unwrap_or(false)
}

pub fn is_uri_allowed(uri: &str, schemes: Option<&[&str]>) -> bool {
    does_uri_match_any_scheme(uri, schemes.unwrap_or(DEFAULT_ALLOWED_SCHEMES))
}

pub fn is_uri_blocked(uri: &str, schemes: Option<&[&str]>) -> bool {
    does_uri_match_any_scheme(uri, schemes.unwrap_or(DEFAULT_BLOCKED_SCHEMES))
}

/// Removes `.` components and folds `..` without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_relative_start =
                    matches!(out.components().next_back(), None | Some(Component::ParentDir));
                if at_relative_start && !out.has_root() {
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolves `part` against `base`.
///
/// A leading `~` is replaced with the user's home directory. Absolute parts
/// ignore `base`. The result is normalized.
pub fn resolve_path(base: &Path, part: &str) -> PathBuf {
    let expanded = expand_home(part);
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };
    normalize_path(&joined)
}

fn expand_home(part: &str) -> PathBuf {
    if let Some(rest) = part.strip_prefix('~')
        && (rest.is_empty() || rest.starts_with(['/', '\\']))
        && let Some(home) = dirs::home_dir()
    {
        let rest = rest.trim_start_matches(['/', '\\']);
        return if rest.is_empty() { home } else { home.join(rest) };
    }
    PathBuf::from(part)
}

/// `/`-joined path of `path` relative to `root`.
///
/// Components are compared ignoring case so that config files written on one
/// platform keep working on another. Returns `None` when `root` is not an
/// ancestor of (or equal to) `path`.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let root: Vec<Component<'_>> = root.components().collect();
    let path: Vec<Component<'_>> = path.components().collect();
    if root.len() > path.len() {
        return None;
    }
    let same_prefix = root
        .iter()
        .zip(&path)
        .all(|(a, b)| component_eq(a.as_os_str(), b.as_os_str()));
    if !same_prefix {
        return None;
    }
    let rest: Vec<String> = path[root.len()..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(rest.join("/"))
}

/// `true` if `dir` is `path` or one of its ancestors (case-insensitive)
pub fn is_ancestor_or_equal(dir: &Path, path: &Path) -> bool {
    relative_path(dir, path).is_some()
}

/// Case-insensitive path equality
pub fn same_path(a: &Path, b: &Path) -> bool {
    relative_path(a, b).is_some_and(|rest| rest.is_empty())
}

fn component_eq(a: &OsStr, b: &OsStr) -> bool {
    a == b || a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}
