//! Spell checker configuration resolution
//!
//! Resolves the effective spell-checker settings for any document in a
//! multi-root editor workspace. Settings come from built-in defaults, the
//! host's global and per-folder configuration, config files discovered on
//! disk (with their imports) and explicitly registered config files.
//! Results are cached per document scope and invalidated by version.
//!
//! ```no_run
//! use spellcfg_core::{CSpellSettings, DocumentSettings, StaticHost, WorkspaceFolder};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn demo() -> spellcfg_core::Result<()> {
//! let folder = WorkspaceFolder::from_path(Path::new("/work/project"), None)?;
//! let host = Arc::new(StaticHost::new(vec![folder]));
//! let resolver = DocumentSettings::new(host, CSpellSettings::default());
//!
//! let settings = resolver.get_settings("file:///work/project/src/main.rs").await?;
//! println!("{:?}", settings.words);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fs;
pub mod host;
pub mod matcher;
pub mod resolver;
pub mod result;
pub mod settings;
pub mod settings_file;
pub mod uri;

pub use config::{
    ConfigFileReference, ConfigFormat, ConfigLoader, ConfigLocator, ConfigSearch,
    DynamicConfigEvaluator, LoadSession, LoadedConfig, MergedConfig, VariableResolver,
};
pub use diagnostics::{ConfigDiagnostic, DiagnosticCollector, Severity};
pub use error::{ErrorKind, SettingsError};
pub use fs::{ConfigFs, TokioFs};
pub use host::{HostConfiguration, StaticHost, WorkspaceFolder, WorkspaceHost};
pub use matcher::{GlobMatcher, GlobPatternWithRoot};
pub use resolver::{
    DocumentSettings, ExcludedByMatch, IncludeExcludeFlags, ResolverOptions,
    WorkspaceRootPrecedence,
};
pub use result::{Result, ResultExt};
pub use settings::{CSpellSettings, GlobDef, OneOrMany, OverrideSettings, PatternDefinition};

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so that stdout stays free for command output and the
/// language server protocol.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spellcfg=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
