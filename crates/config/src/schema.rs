/// Config schema types (artifact paths, helper commands, auth defaults, sites).
use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SitegateConfig {
    pub paths: PathsConfig,
    pub htpasswd: HtpasswdConfig,
    pub reload: ReloadConfig,
    pub auth: AuthConfig,
    /// Site registry keyed by site URL (e.g. `example.com`).
    pub sites: BTreeMap<String, SiteConfig>,
}

/// Where the proxy artifacts and the record store live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one credential file per site and scope.
    pub htpasswd_dir: PathBuf,
    /// Directory holding the `<site>_acl` allow-list snippets.
    pub vhost_dir: PathBuf,
    /// Record store location. Defaults to `<data_dir>/sitegate.db`.
    pub database: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            htpasswd_dir: PathBuf::from("/etc/nginx/htpasswd"),
            vhost_dir: PathBuf::from("/etc/nginx/vhost.d"),
            database: None,
        }
    }
}

/// Hash algorithm requested from the `htpasswd` helper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Bcrypt,
    Md5,
    Sha,
}

impl HashAlgorithm {
    /// The `htpasswd` flag selecting this algorithm.
    pub fn flag(&self) -> char {
        match self {
            Self::Bcrypt => 'B',
            Self::Md5 => 'm',
            Self::Sha => 's',
        }
    }
}

/// External credential-hashing helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtpasswdConfig {
    /// Argv prefix used to invoke `htpasswd`, e.g.
    /// `["docker", "exec", "-i", "nginx-proxy", "htpasswd"]`.
    pub command: Vec<String>,
    /// When the helper runs inside a container, the directory under which it
    /// sees `paths.htpasswd_dir`.
    pub container_dir: Option<PathBuf>,
    pub algorithm: HashAlgorithm,
}

impl Default for HtpasswdConfig {
    fn default() -> Self {
        Self {
            command: vec!["htpasswd".into()],
            container_dir: None,
            algorithm: HashAlgorithm::default(),
        }
    }
}

/// Reverse proxy reload trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Argv of the reload command.
    pub command: Vec<String>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            command: vec!["nginx".into(), "-s".into(), "reload".into()],
        }
    }
}

/// Defaults applied when creating or updating credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Username used by `auth create` when `--user` is omitted.
    pub default_username: String,
    /// Length of generated passwords when `--pass` is omitted.
    pub generated_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_username: "sitegate".into(),
            generated_password_length: 18,
        }
    }
}

/// A registered site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Disabled sites cannot be targeted.
    pub enabled: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
