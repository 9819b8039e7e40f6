use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::SitegateConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "sitegate.toml",
    "sitegate.yaml",
    "sitegate.yml",
    "sitegate.json",
];

/// Record store file name inside the data directory.
pub const DATABASE_FILENAME: &str = "sitegate.db";

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);
static DATA_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Override the config directory (from `--config-dir`).
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

/// Override the data directory (from `--data-dir`).
pub fn set_data_dir(dir: PathBuf) {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

fn overridden(slot: &Mutex<Option<PathBuf>>) -> Option<PathBuf> {
    slot.lock().ok().and_then(|guard| guard.clone())
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<SitegateConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load the discovered config file, or defaults when there is none.
///
/// A file that exists but does not parse is an error rather than a silent
/// fallback, since the defaults point artifacts at different directories.
pub fn load_discovered() -> Result<(Option<PathBuf>, SitegateConfig)> {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return Ok((None, SitegateConfig::default()));
    };
    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((Some(path), config))
}

/// First existing config file: `--config-dir` alone when set, otherwise
/// the working directory and then the user config directory.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    let search: Vec<PathBuf> = match overridden(&CONFIG_DIR_OVERRIDE) {
        Some(dir) => vec![dir],
        None => std::iter::once(PathBuf::new()).chain(config_dir()).collect(),
    };
    search
        .iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Returns the config directory (`~/.config/sitegate/` unless overridden).
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = overridden(&CONFIG_DIR_OVERRIDE) {
        return Some(dir);
    }
    directories::ProjectDirs::from("", "", "sitegate").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the record store.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = overridden(&DATA_DIR_OVERRIDE) {
        return dir;
    }
    directories::ProjectDirs::from("", "", "sitegate")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".sitegate"))
}

/// Path of the record store for `config`.
pub fn database_path(config: &SitegateConfig) -> PathBuf {
    config
        .paths
        .database
        .clone()
        .unwrap_or_else(|| data_dir().join(DATABASE_FILENAME))
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    find_config_file().unwrap_or_else(|| {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILENAMES[0])
    })
}

fn parse_config(raw: &str, path: &Path) -> Result<SitegateConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::message(format!("unsupported config format: .{ext}"))),
    }
}
