//! Settings merging logic
//!
//! Layers are folded lowest precedence first. For each field:
//! - scalars from the overlay replace the base value
//! - word, dictionary, regexp and glob lists concatenate and de-duplicate
//!   case-insensitively
//! - `enabledLanguageIds` / `enableFiletypes` entries are kept verbatim
//!   (including `!id` removals) and collapsed once at the end by
//!   [`normalize_enabled_language_ids`]
//! - `import` is not merged; imports are consumed by the loader

use super::{CSpellSettings, GlobDef, PatternDefinition};
use crate::matcher::resolve_enabled_language_ids;
use std::collections::HashSet;

impl CSpellSettings {
    /// Merge `other` on top of this config (`other` takes precedence)
    pub fn merge_with(&mut self, other: &CSpellSettings) {
        overwrite(&mut self.version, &other.version);
        overwrite(&mut self.id, &other.id);
        overwrite(&mut self.name, &other.name);
        overwrite(&mut self.description, &other.description);
        overwrite(&mut self.language, &other.language);
        overwrite(&mut self.enabled, &other.enabled);
        overwrite(&mut self.workspace_root_path, &other.workspace_root_path);
        overwrite(&mut self.glob_root, &other.glob_root);

        append_unique(&mut self.words, &other.words);
        append_unique(&mut self.ignore_words, &other.ignore_words);
        append_unique(&mut self.flag_words, &other.flag_words);
        append_unique(&mut self.dictionaries, &other.dictionaries);
        append_unique(&mut self.ignore_reg_exp_list, &other.ignore_reg_exp_list);
        append_unique(&mut self.include_reg_exp_list, &other.include_reg_exp_list);
        append_unique_globs(&mut self.ignore_paths, &other.ignore_paths);
        append_unique_globs(&mut self.files, &other.files);

        append_exact(&mut self.enabled_language_ids, &other.enabled_language_ids);
        append_exact(&mut self.enable_filetypes, &other.enable_filetypes);

        merge_patterns(&mut self.patterns, &other.patterns);

        if let Some(other_overrides) = &other.overrides {
            self.overrides
                .get_or_insert_with(Vec::new)
                .extend(other_overrides.iter().cloned());
        }

        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Fold `layers` (lowest precedence first) into one settings value
pub fn merge_settings<'a>(layers: impl IntoIterator<Item = &'a CSpellSettings>) -> CSpellSettings {
    let mut merged = CSpellSettings::default();
    for layer in layers {
        merged.merge_with(layer);
    }
    merged.import = None;
    merged
}

/// Collapse `enabledLanguageIds` and `enableFiletypes` into the final
/// `enabledLanguageIds` set
///
/// Additions accumulate, `!id` entries remove. The field stays unset when
/// neither list was present.
pub fn normalize_enabled_language_ids(settings: &mut CSpellSettings) {
    let enable_filetypes = settings.enable_filetypes.take();
    if settings.enabled_language_ids.is_none() && enable_filetypes.is_none() {
        return;
    }
    let entries = settings
        .enabled_language_ids()
        .iter()
        .chain(enable_filetypes.iter().flatten())
        .map(String::as_str);
    settings.enabled_language_ids = Some(resolve_enabled_language_ids(entries));
}

fn overwrite<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if source.is_some() {
        target.clone_from(source);
    }
}

fn append_unique(target: &mut Option<Vec<String>>, source: &Option<Vec<String>>) {
    let Some(source) = source else {
        return;
    };
    let target = target.get_or_insert_with(Vec::new);
    let mut seen: HashSet<String> = target.iter().map(|w| w.to_lowercase()).collect();
    for item in source {
        if seen.insert(item.to_lowercase()) {
            target.push(item.clone());
        }
    }
}

fn glob_key(glob: &GlobDef) -> (String, Option<String>) {
    (glob.glob().to_lowercase(), glob.root().map(str::to_lowercase))
}

fn append_unique_globs(target: &mut Option<Vec<GlobDef>>, source: &Option<Vec<GlobDef>>) {
    let Some(source) = source else {
        return;
    };
    let target = target.get_or_insert_with(Vec::new);
    let mut seen: HashSet<_> = target.iter().map(glob_key).collect();
    for glob in source {
        if seen.insert(glob_key(glob)) {
            target.push(glob.clone());
        }
    }
}

fn append_exact(target: &mut Option<Vec<String>>, source: &Option<Vec<String>>) {
    let Some(source) = source else {
        return;
    };
    let target = target.get_or_insert_with(Vec::new);
    for item in source {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// Patterns are keyed by name; a later definition replaces an earlier one
fn merge_patterns(
    target: &mut Option<Vec<PatternDefinition>>,
    source: &Option<Vec<PatternDefinition>>,
) {
    let Some(source) = source else {
        return;
    };
    let target = target.get_or_insert_with(Vec::new);
    for pattern in source {
        match target.iter_mut().find(|p| p.name == pattern.name) {
            Some(existing) => *existing = pattern.clone(),
            None => target.push(pattern.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::OneOrMany;

    fn words(list: &[&str]) -> Option<Vec<String>> {
        Some(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_scalars_overwrite() {
        let mut base = CSpellSettings {
            language: Some("en".to_string()),
            enabled: Some(true),
            name: Some("base".to_string()),
            ..Default::default()
        };
        let overlay = CSpellSettings {
            language: Some("en-gb".to_string()),
            enabled: None,
            ..Default::default()
        };

        base.merge_with(&overlay);

        assert_eq!(base.language.as_deref(), Some("en-gb"));
        assert_eq!(base.enabled, Some(true)); // untouched when overlay is unset
        assert_eq!(base.name.as_deref(), Some("base"));
    }

    #[test]
    fn test_word_lists_concatenate_case_insensitively() {
        let mut base = CSpellSettings {
            words: words(&["Apple", "banana"]),
            ..Default::default()
        };
        let overlay = CSpellSettings {
            words: words(&["apple", "cherry"]),
            ..Default::default()
        };

        base.merge_with(&overlay);

        assert_eq!(base.words, words(&["Apple", "banana", "cherry"]));
    }

    #[test]
    fn test_glob_lists_keep_roots_apart() {
        let mut base = CSpellSettings {
            ignore_paths: Some(vec![GlobDef::from("node_modules")]),
            ..Default::default()
        };
        let overlay = CSpellSettings {
            ignore_paths: Some(vec![
                GlobDef::from("Node_Modules"),
                GlobDef::Rooted {
                    glob: "node_modules".to_string(),
                    root: "/w/client".to_string(),
                },
            ]),
            ..Default::default()
        };

        base.merge_with(&overlay);

        assert_eq!(base.ignore_paths().len(), 2);
    }

    #[test]
    fn test_merge_settings_drops_import() {
        let a = CSpellSettings {
            import: Some(OneOrMany::One("x.json".to_string())),
            ..Default::default()
        };
        let merged = merge_settings([&a]);
        assert!(merged.import.is_none());
    }

    #[test]
    fn test_patterns_replace_by_name() {
        let mut base = CSpellSettings {
            patterns: Some(vec![PatternDefinition {
                name: "strings".to_string(),
                pattern: OneOrMany::One("/'.*'/".to_string()),
                description: None,
            }]),
            ..Default::default()
        };
        let overlay = CSpellSettings {
            patterns: Some(vec![PatternDefinition {
                name: "strings".to_string(),
                pattern: OneOrMany::One("/\".*\"/".to_string()),
                description: None,
            }]),
            ..Default::default()
        };

        base.merge_with(&overlay);

        let patterns = base.patterns.unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern, OneOrMany::One("/\".*\"/".to_string()));
    }

    #[test]
    fn test_negated_language_id_wins_over_farther_layer() {
        let far = CSpellSettings {
            enabled_language_ids: words(&["typescript", "markdown"]),
            ..Default::default()
        };
        let near = CSpellSettings {
            enabled_language_ids: words(&["!typescript", "json"]),
            ..Default::default()
        };

        let mut merged = merge_settings([&far, &near]);
        normalize_enabled_language_ids(&mut merged);

        let ids = merged.enabled_language_ids.unwrap();
        assert!(!ids.contains(&"typescript".to_string()));
        assert_eq!(ids, vec!["markdown".to_string(), "json".to_string()]);
    }

    #[test]
    fn test_enable_filetypes_folded_into_language_ids() {
        let mut settings = CSpellSettings {
            enabled_language_ids: words(&["php", "typescript"]),
            enable_filetypes: words(&["!typescript", "pug"]),
            ..Default::default()
        };

        normalize_enabled_language_ids(&mut settings);

        assert!(settings.enable_filetypes.is_none());
        assert_eq!(settings.enabled_language_ids, words(&["php", "pug"]));
    }

    #[test]
    fn test_language_ids_unset_stay_unset() {
        let mut settings = CSpellSettings::default();
        normalize_enabled_language_ids(&mut settings);
        assert!(settings.enabled_language_ids.is_none());
    }
}
