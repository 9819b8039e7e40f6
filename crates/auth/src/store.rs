//! SQLite-backed credential store using sqlx.

use {
    secrecy::{ExposeSecret, Secret},
    sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, sqlite::SqliteRow},
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    record::{CredentialFilter, CredentialRecord, NewCredential},
};

/// Persisted credential records keyed by `(site_url, username, scope)`.
///
/// The store owns record identity; credential files are projections of it.
#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    /// Create a store using an existing pool (migrations must already be run).
    ///
    /// Call [`crate::run_migrations`] before using this constructor.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Records matching every field the filter constrains, oldest first.
    pub async fn find(&self, filter: &CredentialFilter) -> Result<Vec<CredentialRecord>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, site_url, username, password, scope FROM auth_credentials WHERE 1 = 1",
        );
        if let Some(site_url) = &filter.site_url {
            query.push(" AND site_url = ").push_bind(site_url.as_str());
        }
        if let Some(username) = &filter.username {
            query.push(" AND username = ").push_bind(username.as_str());
        }
        if let Some(scope) = filter.scope {
            query.push(" AND scope = ").push_bind(scope.as_str());
        }
        query.push(" ORDER BY id");

        let rows = query.build().fetch_all(&self.pool).await?;
        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>>>()?;
        debug!(
            site_url = ?filter.site_url,
            username = ?filter.username,
            scope = ?filter.scope,
            count = records.len(),
            "credential lookup"
        );
        Ok(records)
    }

    /// Insert a record, returning its id.
    pub async fn insert(&self, record: &NewCredential) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO auth_credentials (site_url, username, password, scope) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.site_url)
        .bind(&record.username)
        .bind(record.password.expose_secret())
        .bind(record.scope.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::DuplicateCredential {
                site_url: record.site_url.clone(),
                username: record.username.clone(),
                scope: record.scope,
            },
            other => Error::Database(other),
        })?;

        let id = result.last_insert_rowid();
        info!(
            id,
            site_url = %record.site_url,
            username = %record.username,
            scope = %record.scope,
            "credential record inserted"
        );
        Ok(id)
    }

    /// Replace the password of record `id`.
    pub async fn update(&self, id: i64, password: &Secret<String>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE auth_credentials SET password = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(password.expose_secret())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound { id });
        }
        info!(id, "credential password updated");
        Ok(())
    }

    /// Remove record `id`. Removing an absent record is not an error.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM auth_credentials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            debug!(id, "credential record already absent");
        } else {
            info!(id, "credential record deleted");
        }
        Ok(())
    }
}

fn record_from_row(row: &SqliteRow) -> Result<CredentialRecord> {
    let scope: String = row.try_get("scope")?;
    Ok(CredentialRecord {
        id: row.try_get("id")?,
        site_url: row.try_get("site_url")?,
        username: row.try_get("username")?,
        password: Secret::new(row.try_get("password")?),
        scope: scope.parse()?,
    })
}
