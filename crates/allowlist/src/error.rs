use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no ip allow-list configured for site {site_url}")]
    EmptyAllowList { site_url: String },

    #[error("none of the requested ips ({}) are allowed on site {site_url}", requested.join(", "))]
    NoMatchingIps {
        site_url: String,
        requested: Vec<String>,
    },

    #[error("invalid ip entry '{value}': {reason}")]
    InvalidIp { value: String, reason: String },

    #[error("failed to read ip allow-list {} for site {site_url}: {detail}", path.display())]
    ArtifactReadFailure {
        path: PathBuf,
        site_url: String,
        detail: String,
    },

    #[error("failed to write ip allow-list {} for site {site_url}: {detail}", path.display())]
    ArtifactWriteFailure {
        path: PathBuf,
        site_url: String,
        detail: String,
    },

    #[error(
        "{source} (site {site_url}); the allow-list is up to date, reload the proxy to apply it"
    )]
    Reload {
        site_url: String,
        #[source]
        source: sitegate_proxy::Error,
    },

    #[error(transparent)]
    Sites(#[from] sitegate_sites::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Validation errors are raised before the allow-list is touched.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::EmptyAllowList { .. } | Self::NoMatchingIps { .. } | Self::InvalidIp { .. } => {
                true
            },
            Self::Sites(e) => e.is_site_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
