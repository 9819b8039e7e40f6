//! Allow-list operations over `<dir>/<site_url>_acl`.
//!
//! The file is the source of truth: it is read fresh before every operation
//! and rewritten atomically. Each mutating call reloads the proxy once.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    serde::Serialize,
    sitegate_common::fs as artifact_fs,
    sitegate_proxy::ProxyReloader,
    sitegate_sites::ResolvedScope,
    tracing::{debug, info, warn},
};

use crate::{Error, Result, codec, ips};

const ACL_SUFFIX: &str = "_acl";

/// What a remove call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoveOutcome {
    pub removed: Vec<String>,
    /// Requested IPs that were not on the list; reported as a warning.
    pub not_found: Vec<String>,
    pub remaining: Vec<String>,
    /// The allow-list file no longer exists.
    pub artifact_deleted: bool,
}

pub struct AllowListSync {
    dir: PathBuf,
    reloader: Arc<dyn ProxyReloader>,
}

impl AllowListSync {
    pub fn new(dir: impl Into<PathBuf>, reloader: Arc<dyn ProxyReloader>) -> Self {
        Self {
            dir: dir.into(),
            reloader,
        }
    }

    pub fn artifact_path(&self, site_url: &str) -> PathBuf {
        self.dir.join(format!("{site_url}{ACL_SUFFIX}"))
    }

    /// Current IPs, empty when no allow-list exists.
    pub fn read(&self, site_url: &str) -> Result<Vec<String>> {
        let path = self.artifact_path(site_url);
        let content = artifact_fs::read_optional(&path).map_err(|e| Error::ArtifactReadFailure {
            path: path.clone(),
            site_url: site_url.to_string(),
            detail: e.to_string(),
        })?;
        let allowed = content.as_deref().map(codec::parse).unwrap_or_default();
        debug!(site_url, count = allowed.len(), path = %path.display(), "read allow-list");
        Ok(allowed)
    }

    /// Replace the allow-list with exactly `requested`.
    pub async fn create(
        &self,
        target: &ResolvedScope,
        requested: &[String],
    ) -> Result<Vec<String>> {
        ips::reject_sentinel(requested)?;
        let allowed = ips::dedup(requested);
        self.write(&target.site_url, &allowed)?;
        info!(site_url = %target.site_url, count = allowed.len(), "allow-list created");
        self.reload(target).await?;
        Ok(allowed)
    }

    /// Add `requested` in front of the existing IPs.
    pub async fn append(
        &self,
        target: &ResolvedScope,
        requested: &[String],
    ) -> Result<Vec<String>> {
        ips::reject_sentinel(requested)?;
        let existing = self.read(&target.site_url)?;
        let allowed = ips::union(requested, &existing);
        self.write(&target.site_url, &allowed)?;
        info!(
            site_url = %target.site_url,
            added = allowed.len().saturating_sub(existing.len()),
            count = allowed.len(),
            "allow-list appended"
        );
        self.reload(target).await?;
        Ok(allowed)
    }

    /// Read-only; fails with `EmptyAllowList` when nothing is allowed.
    pub fn list(&self, target: &ResolvedScope) -> Result<Vec<String>> {
        let allowed = self.read(&target.site_url)?;
        if allowed.is_empty() {
            return Err(Error::EmptyAllowList {
                site_url: target.site_url.clone(),
            });
        }
        Ok(allowed)
    }

    /// Remove `requested`, or the whole allow-list when `requested` is empty
    /// or contains `all`.
    ///
    /// Fails with `NoMatchingIps`, leaving the file untouched, when none of
    /// the requested IPs is present.
    pub async fn remove(
        &self,
        target: &ResolvedScope,
        requested: &[String],
    ) -> Result<RemoveOutcome> {
        let site_url = target.site_url.as_str();
        let existing = self.read(site_url)?;

        let remove_all =
            requested.is_empty() || requested.iter().any(|ip| ips::is_all_sentinel(ip));
        let outcome = if remove_all {
            self.delete(site_url)?;
            info!(site_url, removed = existing.len(), "allow-list removed");
            RemoveOutcome {
                removed: existing,
                artifact_deleted: true,
                ..RemoveOutcome::default()
            }
        } else {
            let diff = ips::difference(&existing, requested);
            if diff.removed.is_empty() {
                return Err(Error::NoMatchingIps {
                    site_url: site_url.to_string(),
                    requested: ips::dedup(requested),
                });
            }
            if !diff.not_found.is_empty() {
                warn!(site_url, not_found = ?diff.not_found, "ips not on the allow-list");
            }

            let artifact_deleted = diff.remaining.is_empty();
            if artifact_deleted {
                self.delete(site_url)?;
            } else {
                self.write(site_url, &diff.remaining)?;
            }
            info!(
                site_url,
                removed = diff.removed.len(),
                remaining = diff.remaining.len(),
                "allow-list ips removed"
            );
            RemoveOutcome {
                removed: diff.removed,
                not_found: diff.not_found,
                remaining: diff.remaining,
                artifact_deleted,
            }
        };

        self.reload(target).await?;
        Ok(outcome)
    }

    fn write(&self, site_url: &str, allowed: &[String]) -> Result<()> {
        let path = self.artifact_path(site_url);
        artifact_fs::atomic_write(&path, &codec::render(allowed))
            .map_err(|e| write_failure(&path, site_url, e))
    }

    fn delete(&self, site_url: &str) -> Result<()> {
        let path = self.artifact_path(site_url);
        let existed = artifact_fs::remove_if_exists(&path)
            .map_err(|e| write_failure(&path, site_url, e))?;
        if !existed {
            debug!(site_url, path = %path.display(), "allow-list already absent");
        }
        Ok(())
    }

    async fn reload(&self, target: &ResolvedScope) -> Result<()> {
        self.reloader.reload().await.map_err(|source| Error::Reload {
            site_url: target.site_url.clone(),
            source,
        })
    }
}

fn write_failure(path: &Path, site_url: &str, detail: impl std::fmt::Display) -> Error {
    Error::ArtifactWriteFailure {
        path: path.to_path_buf(),
        site_url: site_url.to_string(),
        detail: detail.to_string(),
    }
}
