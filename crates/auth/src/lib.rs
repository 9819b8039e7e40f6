//! Basic-auth credentials for sites behind the proxy.
//!
//! This crate provides:
//! - `CredentialStore`: SQLite-backed credential records, one per `(site_url, username, scope)`
//! - `CredentialFileSync`: projection of records onto the proxy's credential files
//! - `AuthService`: create, bootstrap, update, delete and list operations

pub mod artifact;
pub mod error;
pub mod query;
pub mod record;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

pub use {
    artifact::CredentialFileSync,
    error::{Error, Result},
    query::CredentialQuery,
    record::{
        CredentialFilter, CredentialRecord, CredentialView, NewCredential, validate_username,
    },
    service::{
        AuthDefaults, AuthService, CreateOutcome, DEFAULT_PASSWORD_LENGTH, DeleteOutcome,
        UpdateOutcome, generate_password,
    },
    store::CredentialStore,
};

/// Run database migrations for the auth crate.
///
/// This creates the `auth_credentials` table. Should be called at startup
/// before constructing [`CredentialStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
