//! Repairs known pathological regular expressions found in older settings

use super::{CSpellSettings, OneOrMany, PatternDefinition};
use regex::Regex;
use std::sync::LazyLock;

/// Matches `/X(.*?\n?)+?X/flags`, a pattern with exponential backtracking
static NESTED_LAZY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(.+?)\(\.\*\?\\n\?\)\+\?(.+?)/([a-z]*)$").unwrap()
});

/// Rewrite a delimited block regexp into its linear equivalent
///
/// `/"""(.*?\n?)+?"""/g` becomes `/(""")[^\1]*?\1/g`. Anything else is
/// returned unchanged.
pub fn fix_reg_ex(pattern: &str) -> String {
    if let Some(caps) = NESTED_LAZY_REGEX.captures(pattern)
        && caps[1] == caps[2]
    {
        return format!("/({})[^\\1]*?\\1/{}", &caps[1], &caps[3]);
    }
    pattern.to_string()
}

pub fn fix_pattern(pattern: &PatternDefinition) -> PatternDefinition {
    let fixed = match &pattern.pattern {
        OneOrMany::One(p) => OneOrMany::One(fix_reg_ex(p)),
        OneOrMany::Many(list) => OneOrMany::Many(list.iter().map(|p| fix_reg_ex(p)).collect()),
    };
    PatternDefinition {
        pattern: fixed,
        ..pattern.clone()
    }
}

/// Returns a copy of `settings` with bad regular expressions corrected
pub fn correct_bad_settings(settings: &CSpellSettings) -> CSpellSettings {
    let mut corrected = settings.clone();
    corrected.patterns = settings
        .patterns
        .as_ref()
        .map(|patterns| patterns.iter().map(fix_pattern).collect());
    corrected.ignore_reg_exp_list = settings
        .ignore_reg_exp_list
        .as_ref()
        .map(|list| list.iter().map(|p| fix_reg_ex(p)).collect());
    corrected.include_reg_exp_list = settings
        .include_reg_exp_list
        .as_ref()
        .map(|list| list.iter().map(|p| fix_reg_ex(p)).collect());
    corrected
}
