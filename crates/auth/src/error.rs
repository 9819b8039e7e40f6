use std::path::PathBuf;

use sitegate_sites::{Scope, ScopeSet};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid username '{username}': {reason}")]
    InvalidUsername {
        username: String,
        reason: &'static str,
    },

    #[error("http auth for user '{username}' already exists on site {site_url}")]
    CredentialAlreadyExists { username: String, site_url: String },

    #[error("{}", no_match_message(site_url, *scopes, username.as_deref()))]
    NoMatchingCredential {
        site_url: String,
        scopes: ScopeSet,
        username: Option<String>,
    },

    #[error("credential for user '{username}' already stored on site {site_url} (scope {scope})")]
    DuplicateCredential {
        site_url: String,
        username: String,
        scope: Scope,
    },

    #[error("credential record {id} no longer exists")]
    NotFound { id: i64 },

    #[error(
        "failed to read credential file {} for site {site_url} (scope {scope}): {detail}",
        path.display()
    )]
    ArtifactReadFailure {
        path: PathBuf,
        site_url: String,
        scope: Scope,
        detail: String,
    },

    #[error(
        "failed to write credential file {} for site {site_url} (scope {scope}): {detail}; \
         the record store is ahead of this file; re-run the command (or an update after a \
         failed create) to converge",
        path.display()
    )]
    ArtifactWriteFailure {
        path: PathBuf,
        site_url: String,
        scope: Scope,
        detail: String,
    },

    #[error("{source} (site {site_url}, scope {scopes})")]
    Tool {
        site_url: String,
        scopes: ScopeSet,
        #[source]
        source: sitegate_proxy::Error,
    },

    #[error(
        "{source} (site {site_url}, scope {scopes}); credential files are up to date, \
         reload the proxy to apply them"
    )]
    Reload {
        site_url: String,
        scopes: ScopeSet,
        #[source]
        source: sitegate_proxy::Error,
    },

    #[error(transparent)]
    Sites(#[from] sitegate_sites::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{message}")]
    Message { message: String },
}

fn no_match_message(site_url: &str, scopes: ScopeSet, username: Option<&str>) -> String {
    match username {
        Some(user) => {
            format!("no http auth found for user '{user}' on site {site_url} (scope {scopes})")
        },
        None => format!("no http auth found on site {site_url} (scope {scopes})"),
    }
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Validation errors are raised before any state is mutated.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::InvalidUsername { .. }
            | Self::CredentialAlreadyExists { .. }
            | Self::NoMatchingCredential { .. } => true,
            Self::Sites(e) => e.is_site_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
