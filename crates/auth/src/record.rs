//! Credential records and the filters used to select them.

use {
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    sitegate_sites::Scope,
};

use crate::{Error, Result};

/// Longest username the hashing helper accepts.
const MAX_USERNAME_LEN: usize = 255;

/// Reject usernames that cannot be written as a single `username:hash` line.
pub fn validate_username(username: &str) -> Result<()> {
    let reason = if username.is_empty() {
        "must not be empty"
    } else if username.contains(':') {
        "must not contain ':'"
    } else if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "must not contain whitespace or control characters"
    } else if username.len() > MAX_USERNAME_LEN {
        "is longer than 255 bytes"
    } else {
        return Ok(());
    };
    Err(Error::InvalidUsername {
        username: username.to_string(),
        reason,
    })
}

/// One stored credential: a username/password pair valid for one scope of
/// one site. The password is kept in plaintext so credential files can be
/// regenerated from the store at any time.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: i64,
    pub site_url: String,
    pub username: String,
    pub password: Secret<String>,
    pub scope: Scope,
}

impl CredentialRecord {
    /// Serializable listing view; the password is included only when asked.
    pub fn view(&self, show_password: bool) -> CredentialView {
        CredentialView {
            site_url: self.site_url.clone(),
            username: self.username.clone(),
            scope: self.scope,
            password: show_password.then(|| self.password.expose_secret().clone()),
        }
    }
}

/// A record about to be inserted.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub site_url: String,
    pub username: String,
    pub password: Secret<String>,
    pub scope: Scope,
}

impl NewCredential {
    pub fn new(
        site_url: impl Into<String>,
        username: impl Into<String>,
        password: &Secret<String>,
        scope: Scope,
    ) -> Self {
        Self {
            site_url: site_url.into(),
            username: username.into(),
            password: password.clone(),
            scope,
        }
    }
}

/// Listing view of a record.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialView {
    pub site_url: String,
    pub username: String,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Partial match on `(site_url, username, scope)`; omitted fields are
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialFilter {
    pub site_url: Option<String>,
    pub username: Option<String>,
    pub scope: Option<Scope>,
}

impl CredentialFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = Some(site_url.into());
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Whether `record` satisfies every constrained field.
    pub fn matches(&self, record: &CredentialRecord) -> bool {
        self.site_url.as_ref().is_none_or(|s| *s == record.site_url)
            && self.username.as_ref().is_none_or(|u| *u == record.username)
            && self.scope.is_none_or(|s| s == record.scope)
    }
}
