//! Credential operations: create, bootstrap, update, delete and list.
//!
//! Every mutating call validates first (site, existence, helper
//! availability), then mutates the store, then projects the change onto the
//! credential files, and finally reloads the proxy once.
//!
//! There is no rollback. If a file write fails after the store has changed,
//! the store is ahead of the file system. Re-running an update converges,
//! since each file write replaces a single user's line; after a failed
//! create the records already exist, so an update is the way forward.

use std::sync::Arc;

use {
    rand::{Rng, distr::Alphanumeric},
    secrecy::Secret,
    sitegate_proxy::ProxyReloader,
    sitegate_sites::{ResolvedScope, Scope, ScopeSet},
    tracing::info,
};

use crate::{
    Error, Result,
    artifact::CredentialFileSync,
    query::CredentialQuery,
    record::{CredentialFilter, CredentialRecord, NewCredential, validate_username},
    store::CredentialStore,
};

/// Default password length when none is configured.
pub const DEFAULT_PASSWORD_LENGTH: usize = 18;

/// Generate a random alphanumeric password.
pub fn generate_password(length: usize) -> Secret<String> {
    let password: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    Secret::new(password)
}

/// Fallbacks used when a caller omits the username or password.
#[derive(Debug, Clone)]
pub struct AuthDefaults {
    pub username: String,
    pub password_length: usize,
}

impl Default for AuthDefaults {
    fn default() -> Self {
        Self {
            username: "sitegate".into(),
            password_length: DEFAULT_PASSWORD_LENGTH,
        }
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────────────

/// Result of a create or bootstrap.
#[derive(Debug)]
pub struct CreateOutcome {
    pub site_url: String,
    pub username: String,
    pub password: Secret<String>,
    /// The password was generated and must be shown to the caller once.
    pub generated: bool,
    pub records: Vec<CredentialRecord>,
}

/// Result of an update.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub password: Secret<String>,
    pub generated: bool,
    pub records: Vec<CredentialRecord>,
}

/// Result of a delete.
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    pub records: Vec<CredentialRecord>,
    /// Scopes whose credential file was removed because no user remained.
    pub cleared: Vec<Scope>,
}

// ── Service ──────────────────────────────────────────────────────────────────

pub struct AuthService {
    store: CredentialStore,
    files: CredentialFileSync,
    reloader: Arc<dyn ProxyReloader>,
    defaults: AuthDefaults,
}

impl AuthService {
    pub fn new(
        store: CredentialStore,
        files: CredentialFileSync,
        reloader: Arc<dyn ProxyReloader>,
    ) -> Self {
        Self {
            store,
            files,
            reloader,
            defaults: AuthDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: AuthDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn files(&self) -> &CredentialFileSync {
        &self.files
    }

    /// Records on the resolved site and scope set, optionally narrowed to one
    /// user. Fails with `NoMatchingCredential` when nothing matches.
    pub async fn get_auths(
        &self,
        resolved: &ResolvedScope,
        username: Option<&str>,
    ) -> Result<Vec<CredentialRecord>> {
        CredentialQuery::matching(resolved, username)
            .run(&self.store)
            .await
    }

    /// Create a user on both scopes of the resolved site with one shared
    /// password. Scope flags on `resolved` are ignored.
    pub async fn create(
        &self,
        resolved: &ResolvedScope,
        username: Option<&str>,
        password: Option<Secret<String>>,
    ) -> Result<CreateOutcome> {
        self.provision(&resolved.with_scopes(ScopeSet::All), username, password)
            .await
    }

    /// Create the global `admin-tools` user, the only single-scope create.
    pub async fn bootstrap_admin_tools(
        &self,
        username: Option<&str>,
        password: Option<Secret<String>>,
    ) -> Result<CreateOutcome> {
        self.provision(&ResolvedScope::global(ScopeSet::AdminTools), username, password)
            .await
    }

    async fn provision(
        &self,
        resolved: &ResolvedScope,
        username: Option<&str>,
        password: Option<Secret<String>>,
    ) -> Result<CreateOutcome> {
        let username = username
            .unwrap_or(self.defaults.username.as_str())
            .to_string();
        validate_username(&username)?;
        CredentialQuery::existing(&resolved.site_url, &username)
            .run(&self.store)
            .await?;
        self.ensure_tool(resolved)?;
        let (password, generated) = self.password_or_generate(password);

        let mut records = Vec::with_capacity(resolved.scopes.scopes().len());
        for &scope in resolved.scopes.scopes() {
            let record = NewCredential::new(&resolved.site_url, &username, &password, scope);
            let id = self.store.insert(&record).await?;
            records.push(CredentialRecord {
                id,
                site_url: record.site_url,
                username: record.username,
                password: record.password,
                scope,
            });
        }
        for record in &records {
            self.files
                .put(&record.site_url, record.scope, &record.username, &password)
                .await?;
        }
        info!(site_url = %resolved.site_url, scope = %resolved.scopes, %username, generated, "http auth created");

        self.reload(resolved).await?;
        Ok(CreateOutcome {
            site_url: resolved.site_url.clone(),
            username,
            password,
            generated,
            records,
        })
    }

    /// Change the password of every matching record.
    pub async fn update(
        &self,
        resolved: &ResolvedScope,
        username: Option<&str>,
        password: Option<Secret<String>>,
    ) -> Result<UpdateOutcome> {
        if let Some(username) = username {
            validate_username(username)?;
        }
        let records = self.get_auths(resolved, username).await?;
        self.ensure_tool(resolved)?;
        let (password, generated) = self.password_or_generate(password);

        for record in &records {
            self.store.update(record.id, &password).await?;
        }
        for record in &records {
            self.files
                .put(&record.site_url, record.scope, &record.username, &password)
                .await?;
        }
        info!(site_url = %resolved.site_url, scope = %resolved.scopes, count = records.len(), "http auth updated");

        self.reload(resolved).await?;
        Ok(UpdateOutcome {
            password,
            generated,
            records,
        })
    }

    /// Delete every matching record and its credential line. A scope left
    /// without users loses its credential file entirely.
    ///
    /// Files are updated before the records are removed, so a failed write
    /// leaves the records in place and the same delete can be re-run.
    pub async fn delete(
        &self,
        resolved: &ResolvedScope,
        username: Option<&str>,
    ) -> Result<DeleteOutcome> {
        if let Some(username) = username {
            validate_username(username)?;
        }
        let records = self.get_auths(resolved, username).await?;
        self.ensure_tool(resolved)?;

        let mut cleared = Vec::new();
        for &scope in resolved.scopes.scopes() {
            let doomed: Vec<&CredentialRecord> =
                records.iter().filter(|r| r.scope == scope).collect();
            let remaining = self
                .store
                .find(
                    &CredentialFilter::new()
                        .site_url(resolved.site_url.as_str())
                        .scope(scope),
                )
                .await?
                .into_iter()
                .filter(|r| !doomed.iter().any(|d| d.id == r.id))
                .count();
            if remaining == 0 {
                if self.files.remove_artifact(&resolved.site_url, scope)? {
                    cleared.push(scope);
                }
                continue;
            }
            for record in doomed {
                self.files
                    .delete_user(&record.site_url, scope, &record.username)
                    .await?;
            }
        }

        for record in &records {
            self.store.delete(record.id).await?;
        }
        info!(site_url = %resolved.site_url, scope = %resolved.scopes, count = records.len(), "http auth deleted");

        self.reload(resolved).await?;
        Ok(DeleteOutcome { records, cleared })
    }

    /// Read-only listing; does not reload the proxy.
    pub async fn list(
        &self,
        resolved: &ResolvedScope,
        username: Option<&str>,
    ) -> Result<Vec<CredentialRecord>> {
        self.get_auths(resolved, username).await
    }

    fn password_or_generate(&self, password: Option<Secret<String>>) -> (Secret<String>, bool) {
        match password {
            Some(password) => (password, false),
            None => (generate_password(self.defaults.password_length), true),
        }
    }

    fn ensure_tool(&self, resolved: &ResolvedScope) -> Result<()> {
        self.files.ensure_tool().map_err(|source| Error::Tool {
            site_url: resolved.site_url.clone(),
            scopes: resolved.scopes,
            source,
        })
    }

    async fn reload(&self, resolved: &ResolvedScope) -> Result<()> {
        self.reloader.reload().await.map_err(|source| Error::Reload {
            site_url: resolved.site_url.clone(),
            scopes: resolved.scopes,
            source,
        })
    }
}
