//! spellcfg Language Server Protocol (LSP)
//!
//! Serves resolved spell checker configuration to an editor:
//! - host settings are pulled with `workspace/configuration` (section `cSpell`)
//! - workspace folders are pulled with `workspace/workspaceFolders`
//! - configuration, folder and config file changes reset cached settings
//! - custom requests expose per-document settings and exclusion details

pub mod host;
pub mod server;

pub use host::{LspHost, host_configuration_from_values};
pub use server::SpellConfigServer;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
