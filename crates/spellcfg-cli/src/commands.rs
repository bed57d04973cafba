//! CLI command implementations

use crate::output;
use crate::{Cli, Commands};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use spellcfg_core::settings_file::{
    add_ignore_word_to_settings_and_update, add_word_to_settings_and_update, default_settings,
    read_settings, remove_language_ids_from_settings_and_update,
    remove_word_from_settings_and_update, write_add_language_ids_to_settings,
};
use spellcfg_core::uri::{normalize_path, path_to_uri};
use spellcfg_core::{
    CSpellSettings, DocumentSettings, ResolverOptions, StaticHost, TokioFs, WorkspaceFolder,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Host-side settings as accepted by `--host-settings`
///
/// ```json
/// { "global": { "words": ["acme"] }, "folders": { "client": { "language": "en-GB" } } }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HostSettingsFile {
    global: CSpellSettings,
    /// Scoped settings keyed by workspace folder name
    folders: BTreeMap<String, CSpellSettings>,
}

pub async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;

    match &cli.command {
        Commands::Settings { file } => {
            let resolver = build_resolver(&cli, &cwd).await?;
            let uri = file_uri(&cwd, file)?;
            let settings = resolver.get_settings(uri.as_str()).await?;
            let diagnostics = resolver.get_diagnostics(uri.as_str()).await?;
            output::print_settings(cli.format, &settings, &diagnostics)
        }

        Commands::ExcludedBy { file } => {
            let resolver = build_resolver(&cli, &cwd).await?;
            let uri = file_uri(&cwd, file)?;
            let matches = resolver.calc_excluded_by(uri.as_str()).await?;
            output::print_excluded_by(cli.format, file, &matches)
        }

        Commands::Check { files } => {
            let resolver = build_resolver(&cli, &cwd).await?;
            let mut rows = Vec::with_capacity(files.len());
            for file in files {
                let uri = file_uri(&cwd, file)?;
                rows.push((file.clone(), resolver.calc_include_exclude(uri.as_str()).await?));
            }
            output::print_check(cli.format, &rows)
        }

        Commands::ConfigFiles { file } => {
            let resolver = build_resolver(&cli, &cwd).await?;
            let uri = file_uri(&cwd, file)?;
            let files = resolver
                .find_cspell_configuration_files_for_uri(uri.as_str())
                .await?;
            output::print_config_files(cli.format, &files)
        }

        Commands::AddWord { config, words } => {
            let uri = file_uri(&cwd, config)?;
            for word in words {
                add_word_to_settings_and_update(&TokioFs, &uri, word).await?;
            }
            report_update(&cli, config, &uri).await
        }

        Commands::IgnoreWord { config, words } => {
            let uri = file_uri(&cwd, config)?;
            for word in words {
                add_ignore_word_to_settings_and_update(&TokioFs, &uri, word).await?;
            }
            report_update(&cli, config, &uri).await
        }

        Commands::RemoveWord { config, words } => {
            let uri = file_uri(&cwd, config)?;
            for word in words {
                remove_word_from_settings_and_update(&TokioFs, &uri, word).await?;
            }
            report_update(&cli, config, &uri).await
        }

        Commands::EnableLanguage {
            config,
            only_if_exists,
            language_ids,
        } => {
            let uri = file_uri(&cwd, config)?;
            write_add_language_ids_to_settings(&TokioFs, &uri, language_ids, *only_if_exists)
                .await?;
            report_update(&cli, config, &uri).await
        }

        Commands::DisableLanguage {
            config,
            language_ids,
        } => {
            let uri = file_uri(&cwd, config)?;
            remove_language_ids_from_settings_and_update(&TokioFs, &uri, language_ids).await?;
            report_update(&cli, config, &uri).await
        }
    }
}

async fn report_update(cli: &Cli, config: &Path, uri: &Url) -> Result<()> {
    let settings = read_settings(&TokioFs, uri, None).await?;
    output::print_updated(cli.format, config, &settings)
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    normalize_path(&cwd.join(path))
}

fn file_uri(cwd: &Path, path: &Path) -> Result<Url> {
    Ok(path_to_uri(&absolute(cwd, path))?)
}

async fn build_resolver(cli: &Cli, cwd: &Path) -> Result<DocumentSettings> {
    let folders = if cli.folders.is_empty() {
        vec![WorkspaceFolder::from_path(cwd, None)?]
    } else {
        cli.folders
            .iter()
            .map(|(name, path)| WorkspaceFolder::from_path(&absolute(cwd, path), Some(name)))
            .collect::<spellcfg_core::Result<Vec<_>>>()?
    };
    debug!("Workspace folders: {:?}", folders);

    let mut host = StaticHost::new(folders);
    if let Some(path) = &cli.host_settings {
        let path = absolute(cwd, path);
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read host settings {}", path.display()))?;
        let file: HostSettingsFile = serde_json::from_str(&text)
            .with_context(|| format!("invalid host settings {}", path.display()))?;
        host = apply_host_settings(host, file)?;
    }

    let options = ResolverOptions {
        workspace_root_precedence: cli.precedence.into(),
        ..Default::default()
    };
    let resolver =
        DocumentSettings::new(Arc::new(host), default_settings()).with_options(options);
    for path in &cli.registered {
        resolver.register_configuration_file(absolute(cwd, path));
    }
    Ok(resolver)
}

fn apply_host_settings(host: StaticHost, file: HostSettingsFile) -> Result<StaticHost> {
    let mut host = host.with_global(file.global);
    for (name, settings) in file.folders {
        let Some(folder) = host
            .folders
            .iter()
            .flatten()
            .find(|folder| folder.name == name)
            .cloned()
        else {
            bail!("host settings name unknown workspace folder '{}'", name);
        };
        host = host.with_scoped(folder.uri, settings);
    }
    Ok(host)
}
