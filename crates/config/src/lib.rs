//! Configuration loading, validation, and env substitution.
//!
//! Config files: `sitegate.toml`, `sitegate.yaml`, or `sitegate.json`
//! Searched in `./` then `~/.config/sitegate/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        config_dir, data_dir, database_path, find_or_default_config_path, load_config,
        load_discovered, set_config_dir, set_data_dir,
    },
    schema::{
        AuthConfig, HashAlgorithm, HtpasswdConfig, PathsConfig, ReloadConfig, SiteConfig,
        SitegateConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
