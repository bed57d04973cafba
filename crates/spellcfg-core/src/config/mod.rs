//! On-disk configuration: discovery, loading and variable expansion
//!
//! ## Discovery
//!
//! Starting at a document's directory, each directory up to the owning
//! workspace folder (or the file system root) is checked for one config
//! file, in the priority order of
//! [`CONFIG_FILE_LOCATIONS`](crate::settings_file::CONFIG_FILE_LOCATIONS).
//! A `package.json` counts only when it has a `cspell` section.
//!
//! ## Imports
//!
//! A config may `import` further configs. Relative entries resolve against
//! the importing file's directory; every file is loaded at most once per
//! resolution, so import cycles terminate and a file reached both as an
//! import and by discovery is applied once.
//!
//! ```jsonc
//! {
//!   "import": ["../shared/cspell.json", "${workspaceFolder:server}/words.json"],
//!   "ignorePaths": ["node_modules", "/dist/**"]
//! }
//! ```

mod loader;
mod locator;
mod variables;

pub use loader::{
    parse_settings, ConfigFormat, ConfigLoader, DynamicConfigEvaluator, LoadSession, LoadedConfig,
    MergedConfig,
};
pub use locator::{
    config_root, filter_config_files_to_match_inherited_path_of_file, ConfigFileReference,
    ConfigLocator, ConfigSearch,
};
pub use variables::VariableResolver;
