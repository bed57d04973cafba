//! Glob and exclusion matching
//!
//! Globs follow the usual extended syntax (`*`, `**`, `?`, `[...]`, `{a,b}`)
//! and are always evaluated against the path relative to the root recorded
//! with them. Matching ignores case.
//!
//! Placement rules, borrowed from `.gitignore`:
//! - a glob without a `/` (other than a trailing one) matches at any depth
//!   below the root: `node_modules` ≡ `**/node_modules`
//! - a glob with a leading or inner `/` is anchored at the root
//! - a glob matching a directory also matches everything below it

use crate::diagnostics::DiagnosticCollector;
use crate::error::SettingsError;
use crate::uri::relative_path;
use crate::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A glob together with the directory it is relative to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobPatternWithRoot {
    pub glob: String,
    pub root: PathBuf,
    /// Config file that declared the glob
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl GlobPatternWithRoot {
    pub fn new(glob: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            glob: glob.into(),
            root: root.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone)]
struct CompiledGlob {
    /// Position of the pattern in the list it was built from
    index: usize,
    pattern: GlobPatternWithRoot,
    set: GlobSet,
}

impl CompiledGlob {
    fn compile(index: usize, pattern: GlobPatternWithRoot) -> Result<Self> {
        let body = normalize_glob(&pattern.glob, &pattern.root);
        if body.is_empty() {
            return Err(SettingsError::invalid_glob(&pattern.glob, "empty pattern"));
        }
        let mut candidates = vec![body.clone()];
        if !body.ends_with("**") {
            candidates.push(format!("{body}/**"));
        }
        let mut builder = GlobSetBuilder::new();
        for candidate in candidates {
            let glob = GlobBuilder::new(&candidate)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .map_err(|e| SettingsError::invalid_glob(&pattern.glob, e.to_string()))?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| SettingsError::invalid_glob(&pattern.glob, e.to_string()))?;
        Ok(Self {
            index,
            pattern,
            set,
        })
    }

    fn is_match(&self, path: &Path) -> bool {
        match relative_path(&self.pattern.root, path) {
            Some(relative) if !relative.is_empty() => self.set.is_match(&relative),
            _ => false,
        }
    }
}

/// Rewrites a user glob into the form matched against root-relative paths
fn normalize_glob(glob: &str, root: &Path) -> String {
    let mut glob = glob.trim().replace('\\', "/");

    // Globs written as absolute paths below the root become anchored globs.
    if let Some(relative) = absolute_glob_below_root(&glob, root) {
        glob = format!("/{relative}");
    }

    let trimmed_end = glob.trim_end_matches('/');
    let anchored = trimmed_end.starts_with('/') || trimmed_end.contains('/');
    let mut body = trimmed_end.trim_start_matches('/');
    while let Some(rest) = body.strip_prefix("./") {
        body = rest;
    }
    if body.is_empty() {
        return String::new();
    }
    if anchored || body.starts_with("**") {
        body.to_string()
    } else {
        format!("**/{body}")
    }
}

fn absolute_glob_below_root(glob: &str, root: &Path) -> Option<String> {
    let literal_prefix: String = glob
        .split('/')
        .take_while(|part| !part.contains(['*', '?', '[', '{']))
        .collect::<Vec<_>>()
        .join("/");
    let prefix = Path::new(&literal_prefix);
    if !prefix.is_absolute() || prefix.components().count() <= 1 {
        return None;
    }
    let relative_prefix = relative_path(root, prefix)?;
    let remainder = glob[literal_prefix.len()..].trim_start_matches('/');
    Some(
        [relative_prefix.as_str(), remainder]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// A list of compiled globs, each with its own root
#[derive(Debug, Clone, Default)]
pub struct GlobMatcher {
    globs: Vec<CompiledGlob>,
}

impl GlobMatcher {
    /// Compile `patterns`; invalid globs are reported and skipped
    pub fn new(
        patterns: impl IntoIterator<Item = GlobPatternWithRoot>,
        diagnostics: &mut DiagnosticCollector,
    ) -> Self {
        let mut globs = Vec::new();
        for (index, pattern) in patterns.into_iter().enumerate() {
            let source = pattern.source.clone();
            match CompiledGlob::compile(index, pattern) {
                Ok(glob) => globs.push(glob),
                Err(err) => diagnostics.push(&err, source.as_deref()),
            }
        }
        Self { globs }
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.globs.len()
    }

    /// `true` if any glob matches `path`
    pub fn matches(&self, path: &Path) -> bool {
        self.globs.iter().any(|glob| glob.is_match(path))
    }

    /// Input positions of every matching glob
    pub fn match_indices(&self, path: &Path) -> Vec<usize> {
        self.globs
            .iter()
            .filter(|glob| glob.is_match(path))
            .map(|glob| glob.index)
            .collect()
    }

}

/// Does `path` match `glob` evaluated relative to `root`
pub fn matches(path: &Path, glob: &str, root: &Path) -> Result<bool> {
    let compiled = CompiledGlob::compile(0, GlobPatternWithRoot::new(glob, root))?;
    Ok(compiled.is_match(path))
}

/// Apply language id entries: additions accumulate, `!id` removes `id`
/// no matter where it appears
pub fn resolve_enabled_language_ids<'a>(entries: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut added: Vec<String> = Vec::new();
    let mut removed: HashSet<String> = HashSet::new();
    for entry in entries {
        let entry = entry.trim();
        if let Some(id) = entry.strip_prefix('!') {
            removed.insert(id.trim().to_string());
        } else if !entry.is_empty() && !added.iter().any(|a| a == entry) {
            added.push(entry.to_string());
        }
    }
    added.retain(|id| !removed.contains(id));
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_match(path: &str, glob: &str, root: &str) -> bool {
        matches(Path::new(path), glob, Path::new(root)).unwrap()
    }

    #[test]
    fn test_bare_name_matches_at_any_depth() {
        assert!(is_match("/w/node_modules/cspell-lib/index.js", "node_modules", "/w"));
        assert!(is_match("/w/packages/a/node_modules/x.js", "node_modules", "/w"));
        assert!(is_match("/w/packages/_server/package-lock.json", "package-lock.json", "/w"));
        assert!(!is_match("/w/packages/a/README.md", "node_modules", "/w"));
    }

    #[test]
    fn test_anchored_globs() {
        assert!(is_match("/w/samples/x/README.md", "/samples", "/w"));
        assert!(!is_match("/w/packages/samples/README.md", "/samples", "/w"));
        assert!(is_match("/w/src/gen/a.ts", "src/gen/**", "/w"));
        assert!(!is_match("/w/lib/src/gen/a.ts", "src/gen/**", "/w"));
    }

    #[test]
    fn test_globs_are_relative_to_root() {
        assert!(!is_match("/other/node_modules/x.js", "node_modules", "/w"));
        assert!(is_match("/w/client/dist/a.js", "/dist/**", "/w/client"));
        assert!(!is_match("/w/server/dist/a.js", "/dist/**", "/w/client"));
    }

    #[test]
    fn test_extended_syntax_and_case() {
        assert!(is_match("/w/a/B.JSON", "**/*.json", "/w"));
        assert!(is_match("/w/a/b.yaml", "*.{yml,yaml}", "/w"));
        assert!(is_match("/w/a/file1.txt", "file?.txt", "/w"));
        assert!(is_match("/w/a/file3.txt", "file[0-9].txt", "/w"));
        assert!(!is_match("/w/a/filex.txt", "file[0-9].txt", "/w"));
        assert!(is_match("/W/Client/.ESLintRC.js", ".eslintrc.js", "/w/client"));
    }

    #[test]
    fn test_absolute_glob_below_root() {
        assert!(is_match("/w/server/src/x.json", "/w/server/**/*.json", "/w/server"));
        assert!(is_match("/w/server/src/x.json", "/w/server/**/*.json", "/w"));
    }

    #[test]
    fn test_root_itself_does_not_match() {
        assert!(!is_match("/w", "**", "/w"));
    }

    #[test]
    fn test_invalid_glob_reported() {
        let mut diagnostics = DiagnosticCollector::new();
        let matcher = GlobMatcher::new(
            vec![
                GlobPatternWithRoot::new("a[", "/w").with_source("/w/cspell.json"),
                GlobPatternWithRoot::new("*.md", "/w"),
            ],
            &mut diagnostics,
        );
        assert_eq!(matcher.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert!(matcher.matches(Path::new("/w/README.md")));
        assert_eq!(matcher.match_indices(Path::new("/w/README.md")), vec![1]);
    }

    #[test]
    fn test_match_indices_report_every_rule() {
        let mut diagnostics = DiagnosticCollector::new();
        let matcher = GlobMatcher::new(
            vec![
                GlobPatternWithRoot::new("package-lock.json", "/w"),
                GlobPatternWithRoot::new("*.md", "/w"),
                GlobPatternWithRoot::new("packages/**", "/w"),
            ],
            &mut diagnostics,
        );
        let path = Path::new("/w/packages/_server/package-lock.json");
        assert_eq!(matcher.match_indices(path), vec![0, 2]);
        assert!(matcher.match_indices(Path::new("/w/src/main.rs")).is_empty());
    }

    #[test]
    fn test_language_ids_negation_is_order_independent() {
        let before = resolve_enabled_language_ids(["!typescript", "typescript", "php"]);
        let after = resolve_enabled_language_ids(["typescript", "php", "!typescript"]);
        assert_eq!(before, vec!["php".to_string()]);
        assert_eq!(before, after);
    }

    #[test]
    fn test_language_ids_dedupe() {
        let ids = resolve_enabled_language_ids(["cpp", "cs", "cpp", " json "]);
        assert_eq!(ids, vec!["cpp", "cs", "json"]);
    }
}
