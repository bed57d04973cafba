//! Output formatting
//!
//! Human output is colored and meant for terminals; JSON output is stable
//! and meant for scripts.

use crate::OutputFormat;
use anyhow::Result;
use colored::*;
use serde::Serialize;
use spellcfg_core::uri::uri_to_path;
use spellcfg_core::{
    CSpellSettings, ConfigDiagnostic, ExcludedByMatch, IncludeExcludeFlags, Severity,
};
use std::path::{Path, PathBuf};
use url::Url;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn display_uri(uri: &Url) -> String {
    uri_to_path(uri)
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| uri.to_string())
}

#[derive(Serialize)]
struct SettingsReport<'a> {
    settings: &'a CSpellSettings,
    diagnostics: &'a [ConfigDiagnostic],
}

pub fn print_settings(
    format: OutputFormat,
    settings: &CSpellSettings,
    diagnostics: &[ConfigDiagnostic],
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&SettingsReport {
            settings,
            diagnostics,
        });
    }

    print_json(settings)?;
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        match &diagnostic.source {
            Some(source) => eprintln!("{}: {} ({})", label, diagnostic.message, source.display()),
            None => eprintln!("{}: {}", label, diagnostic.message),
        }
    }
    Ok(())
}

pub fn print_excluded_by(
    format: OutputFormat,
    file: &Path,
    matches: &[ExcludedByMatch],
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(matches);
    }

    if matches.is_empty() {
        println!("{} {}", file.display(), "is not excluded".green());
        return Ok(());
    }
    println!("{} {}", file.display(), "is excluded by:".yellow());
    for m in matches {
        let source = m
            .source
            .as_ref()
            .map(|s| s.path.display().to_string())
            .unwrap_or_else(|| "host settings".to_string());
        println!(
            "  {} {} {}",
            m.glob.bold(),
            format!("(root {})", m.root.display()).dimmed(),
            format!("from {}", source).dimmed()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct CheckRow<'a> {
    file: &'a Path,
    include: bool,
    exclude: bool,
}

pub fn print_check(format: OutputFormat, rows: &[(PathBuf, IncludeExcludeFlags)]) -> Result<()> {
    if format == OutputFormat::Json {
        let rows: Vec<CheckRow<'_>> = rows
            .iter()
            .map(|(file, flags)| CheckRow {
                file,
                include: flags.include,
                exclude: flags.exclude,
            })
            .collect();
        return print_json(&rows);
    }

    for (file, flags) in rows {
        let status = match (flags.include, flags.exclude) {
            (true, false) => "checked".green(),
            (_, true) => "excluded".yellow(),
            (false, false) => "not included".dimmed(),
        };
        println!("{}: {}", file.display(), status);
    }
    Ok(())
}

pub fn print_config_files(format: OutputFormat, files: &[Url]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(files);
    }

    if files.is_empty() {
        println!("{}", "No config files found".dimmed());
    }
    for file in files {
        println!("{}", display_uri(file));
    }
    Ok(())
}

pub fn print_updated(format: OutputFormat, config: &Path, settings: &CSpellSettings) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(settings);
    }
    println!("{} {}", "Updated".green().bold(), config.display());
    Ok(())
}
