//! spellcfg CLI
//!
//! Inspect the spell checker settings that apply to a file, and edit
//! config files the way the editor integration does.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use spellcfg_core::settings_file::DEFAULT_FILE_NAME;
use spellcfg_core::{WorkspaceRootPrecedence, init_tracing};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "spellcfg")]
#[command(about = "Resolve and edit spell checker configuration")]
#[command(version = spellcfg_core::VERSION)]
#[command(
    long_about = "spellcfg shows which spell checker settings apply to a file in a workspace.\n\
Settings are merged from built-in defaults, host settings, config files found\n\
between the file and its workspace folder, and registered config files.\n\
\n\
Examples:\n  \
spellcfg settings src/main.rs                 # Effective settings for a file\n  \
spellcfg excluded-by node_modules/x/index.js  # Which ignorePaths match\n  \
spellcfg --folder app=./app config-files app/src/lib.rs\n  \
spellcfg add-word --config cspell.json tokio  # Add a word to a config file"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace folders as NAME=PATH (default: the current directory)
    #[arg(long = "folder", global = true, value_parser = parse_folder)]
    folders: Vec<(String, PathBuf)>,

    /// Config files applied to every document
    #[arg(long = "register", global = true)]
    registered: Vec<PathBuf>,

    /// JSON file holding host-side settings
    #[arg(long, global = true)]
    host_settings: Option<PathBuf>,

    /// Which workspaceRootPath wins when host and config files both set one
    #[arg(long, global = true, default_value = "host")]
    precedence: Precedence,

    /// Output format
    #[arg(short, long, global = true, default_value = "human")]
    format: OutputFormat,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective settings for a file
    Settings {
        #[arg(help = "File to resolve settings for")]
        file: PathBuf,
    },

    /// List the ignorePaths rules that exclude a file
    ExcludedBy {
        #[arg(help = "File to check")]
        file: PathBuf,
    },

    /// Report whether files are included and whether they are excluded
    Check {
        #[arg(required = true, help = "Files to check")]
        files: Vec<PathBuf>,
    },

    /// List the config files that apply to a file, nearest first
    ConfigFiles {
        #[arg(help = "File to look up")]
        file: PathBuf,
    },

    /// Add words to a config file
    AddWord {
        #[arg(long, default_value = DEFAULT_FILE_NAME, help = "Config file to update")]
        config: PathBuf,

        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Add words to the ignoreWords list of a config file
    IgnoreWord {
        #[arg(long, default_value = DEFAULT_FILE_NAME, help = "Config file to update")]
        config: PathBuf,

        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Remove words from a config file
    RemoveWord {
        #[arg(long, default_value = DEFAULT_FILE_NAME, help = "Config file to update")]
        config: PathBuf,

        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Add language ids to enabledLanguageIds
    EnableLanguage {
        #[arg(long, default_value = DEFAULT_FILE_NAME, help = "Config file to update")]
        config: PathBuf,

        #[arg(long, help = "Only update files that already list language ids")]
        only_if_exists: bool,

        #[arg(required = true)]
        language_ids: Vec<String>,
    },

    /// Remove language ids from enabledLanguageIds
    DisableLanguage {
        #[arg(long, default_value = DEFAULT_FILE_NAME, help = "Config file to update")]
        config: PathBuf,

        #[arg(required = true)]
        language_ids: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Precedence {
    Host,
    Config,
}

impl From<Precedence> for WorkspaceRootPrecedence {
    fn from(value: Precedence) -> Self {
        match value {
            Precedence::Host => WorkspaceRootPrecedence::HostOverride,
            Precedence::Config => WorkspaceRootPrecedence::ConfigChain,
        }
    }
}

fn parse_folder(s: &str) -> std::result::Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!(
            "Invalid folder '{}'. Expected 'NAME=PATH'",
            s
        )),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    let log_level = match cli.verbose {
        0 => "spellcfg=error",
        1 => "spellcfg=warn",
        2 => "spellcfg=info",
        3 => "spellcfg=debug",
        _ => "spellcfg=trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    if let Err(e) = commands::run(cli).await {
        error!("spellcfg failed: {:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_folder() {
        assert_eq!(
            parse_folder("client=packages/client").unwrap(),
            ("client".to_string(), PathBuf::from("packages/client"))
        );
        assert!(parse_folder("client").is_err());
        assert!(parse_folder("=path").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
