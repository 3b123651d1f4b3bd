//! Configuration loading and merging
//!
//! Layers, lowest precedence first:
//! 1. Built-in deployment defaults
//! 2. Overrides passed to [`ConfigStore::new`]
//! 3. File-level defaults from each loaded file
//! 4. The loaded environment's section of each file

mod defaults;
mod error;
mod loader;
mod merge;
mod store;
mod value;

pub use defaults::{BuiltinDefaults, PackageConfig};
pub use error::ConfigError;
pub use loader::{
    interpolate_env, parse_document, read_document, select_environment, SourceDocument,
    KNOWN_ENVIRONMENTS,
};
pub use merge::{deep_merge, merge_into, merge_layers};
pub use store::{ConfigStore, LoadedSource};
pub use value::{ConfigMap, ConfigValue, Scalar};
