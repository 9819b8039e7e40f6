#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("site not found: {site}")]
    SiteNotFound { site: String },
    #[error("site not found: {site} is disabled")]
    SiteDisabled { site: String },
    #[error("unknown scope '{scope}' (expected site or admin-tools)")]
    UnknownScope { scope: String },
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

    /// Whether this error means the target site cannot be used.
    #[must_use]
    pub fn is_site_not_found(&self) -> bool {
        matches!(self, Self::SiteNotFound { .. } | Self::SiteDisabled { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
