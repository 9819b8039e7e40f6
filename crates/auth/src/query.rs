//! Tagged credential queries.
//!
//! Each query knows which filter it runs and which error an unexpected
//! result maps to, so the "empty result means which error" decision lives in
//! one place.

use sitegate_sites::ResolvedScope;

use crate::{
    Error, Result,
    record::{CredentialFilter, CredentialRecord},
    store::CredentialStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialQuery {
    /// Create-time existence check: any record for `username` on the site,
    /// regardless of scope. A non-empty result is a conflict.
    Existing { site_url: String, username: String },
    /// Records an update, delete or list acts on. An empty result is an
    /// error.
    Matching {
        resolved: ResolvedScope,
        username: Option<String>,
    },
}

impl CredentialQuery {
    pub fn existing(site_url: impl Into<String>, username: impl Into<String>) -> Self {
        Self::Existing {
            site_url: site_url.into(),
            username: username.into(),
        }
    }

    pub fn matching(resolved: &ResolvedScope, username: Option<&str>) -> Self {
        Self::Matching {
            resolved: resolved.clone(),
            username: username.map(str::to_string),
        }
    }

    pub fn filter(&self) -> CredentialFilter {
        match self {
            Self::Existing { site_url, username } => CredentialFilter::new()
                .site_url(site_url.as_str())
                .username(username.as_str()),
            Self::Matching { resolved, username } => {
                let mut filter = CredentialFilter::new().site_url(resolved.site_url.as_str());
                if let Some(username) = username {
                    filter = filter.username(username.as_str());
                }
                if let Some(scope) = resolved.scopes.single() {
                    filter = filter.scope(scope);
                }
                filter
            },
        }
    }

    /// Map a query result to the outcome the caller sees.
    pub fn check(&self, records: Vec<CredentialRecord>) -> Result<Vec<CredentialRecord>> {
        match self {
            Self::Existing { site_url, username } if !records.is_empty() => {
                Err(Error::CredentialAlreadyExists {
                    username: username.clone(),
                    site_url: site_url.clone(),
                })
            },
            Self::Matching { resolved, username } if records.is_empty() => {
                Err(Error::NoMatchingCredential {
                    site_url: resolved.site_url.clone(),
                    scopes: resolved.scopes,
                    username: username.clone(),
                })
            },
            _ => Ok(records),
        }
    }

    pub async fn run(&self, store: &CredentialStore) -> Result<Vec<CredentialRecord>> {
        let records = store.find(&self.filter()).await?;
        self.check(records)
    }
}
