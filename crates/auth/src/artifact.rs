//! Credential files consumed by the proxy's basic-auth module.
//!
//! One file per `(site_url, scope)`: `<dir>/<site_url>` for the `site` scope
//! and `<dir>/<site_url>_admin_tools` for `admin-tools`. Each line is
//! `username:hash`. Every change is applied to a staged copy beside the file
//! and renamed over it once the helper succeeds.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    secrecy::{ExposeSecret, Secret},
    sitegate_common::fs::{self as artifact_fs, StagedArtifact},
    sitegate_proxy::CredentialTool,
    sitegate_sites::Scope,
    tracing::{debug, info, warn},
};

use crate::{Error, Result};

const ADMIN_TOOLS_SUFFIX: &str = "_admin_tools";

/// Projects credential records onto credential files.
#[derive(Clone)]
pub struct CredentialFileSync {
    dir: PathBuf,
    tool: Arc<dyn CredentialTool>,
}

impl CredentialFileSync {
    pub fn new(dir: impl Into<PathBuf>, tool: Arc<dyn CredentialTool>) -> Self {
        Self {
            dir: dir.into(),
            tool,
        }
    }

    pub fn artifact_path(&self, site_url: &str, scope: Scope) -> PathBuf {
        match scope {
            Scope::Site => self.dir.join(site_url),
            Scope::AdminTools => self.dir.join(format!("{site_url}{ADMIN_TOOLS_SUFFIX}")),
        }
    }

    /// Check that the hashing helper can run before anything is mutated.
    pub fn ensure_tool(&self) -> sitegate_proxy::Result<()> {
        self.tool.ensure_available()
    }

    /// Usernames present in the artifact, in file order. A missing artifact
    /// has no users.
    pub fn users(&self, site_url: &str, scope: Scope) -> Result<Vec<String>> {
        let path = self.artifact_path(site_url, scope);
        let content = artifact_fs::read_optional(&path).map_err(|e| Error::ArtifactReadFailure {
            path: path.clone(),
            site_url: site_url.to_string(),
            scope,
            detail: e.to_string(),
        })?;
        Ok(content.as_deref().map(parse_users).unwrap_or_default())
    }

    /// Create the artifact if absent, otherwise add or replace `username`'s
    /// line. Other lines are left untouched.
    pub async fn put(
        &self,
        site_url: &str,
        scope: Scope,
        username: &str,
        password: &Secret<String>,
    ) -> Result<()> {
        let path = self.artifact_path(site_url, scope);
        let staged =
            StagedArtifact::stage(&path).map_err(|e| write_failure(&path, site_url, scope, e))?;
        self.tool
            .hash_and_store(staged.path(), username, password.expose_secret())
            .await
            .map_err(|e| write_failure(&path, site_url, scope, e))?;
        staged
            .commit()
            .map_err(|e| write_failure(&path, site_url, scope, e))?;
        info!(site_url, %scope, username, path = %path.display(), "credential file updated");
        Ok(())
    }

    /// Remove `username`'s line. Returns `false` when the user was already
    /// absent, which is not an error.
    pub async fn delete_user(&self, site_url: &str, scope: Scope, username: &str) -> Result<bool> {
        let path = self.artifact_path(site_url, scope);
        if !self.users(site_url, scope)?.iter().any(|u| u == username) {
            warn!(site_url, %scope, username, path = %path.display(), "user already absent from credential file");
            return Ok(false);
        }
        let staged =
            StagedArtifact::stage(&path).map_err(|e| write_failure(&path, site_url, scope, e))?;
        self.tool
            .remove_entry(staged.path(), username)
            .await
            .map_err(|e| write_failure(&path, site_url, scope, e))?;
        staged
            .commit()
            .map_err(|e| write_failure(&path, site_url, scope, e))?;
        info!(site_url, %scope, username, path = %path.display(), "credential line removed");
        Ok(true)
    }

    /// Remove the whole artifact, stripping basic auth from that scope.
    pub fn remove_artifact(&self, site_url: &str, scope: Scope) -> Result<bool> {
        let path = self.artifact_path(site_url, scope);
        let removed = artifact_fs::remove_if_exists(&path)
            .map_err(|e| write_failure(&path, site_url, scope, e))?;
        if removed {
            info!(site_url, %scope, path = %path.display(), "credential file removed");
        } else {
            debug!(site_url, %scope, path = %path.display(), "credential file already absent");
        }
        Ok(removed)
    }
}

fn parse_users(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':').map(|(user, _)| user.to_string()))
        .collect()
}

fn write_failure(
    path: &Path,
    site_url: &str,
    scope: Scope,
    detail: impl std::fmt::Display,
) -> Error {
    Error::ArtifactWriteFailure {
        path: path.to_path_buf(),
        site_url: site_url.to_string(),
        scope,
        detail: detail.to_string(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::test_support::PlainTool};

    fn sync(dir: &Path) -> (CredentialFileSync, Arc<PlainTool>) {
        let tool = Arc::new(PlainTool::default());
        (CredentialFileSync::new(dir, tool.clone()), tool)
    }

    fn pw(value: &str) -> Secret<String> {
        Secret::new(value.to_string())
    }

    #[test]
    fn artifact_names_distinguish_scopes() {
        let (files, _) = sync(Path::new("/etc/nginx/htpasswd"));
        assert_eq!(
            files.artifact_path("example.com", Scope::Site),
            PathBuf::from("/etc/nginx/htpasswd/example.com")
        );
        assert_eq!(
            files.artifact_path("default", Scope::AdminTools),
            PathBuf::from("/etc/nginx/htpasswd/default_admin_tools")
        );
    }

    #[test]
    fn parse_users_skips_blank_and_comment_lines() {
        let users = parse_users("alice:$2y$05$abc\n\n# note\nbob:{SHA}xyz\n");
        assert_eq!(users, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn put_creates_then_replaces_single_line() {
        let tmp = tempfile::tempdir().unwrap();
        let (files, _) = sync(tmp.path());

        files.put("example.com", Scope::Site, "alice", &pw("one")).await.unwrap();
        files.put("example.com", Scope::Site, "bob", &pw("two")).await.unwrap();
        files.put("example.com", Scope::Site, "alice", &pw("three")).await.unwrap();

        let content =
            std::fs::read_to_string(files.artifact_path("example.com", Scope::Site)).unwrap();
        assert_eq!(content, "bob:two\nalice:three\n");
        assert!(!files.artifact_path("example.com", Scope::AdminTools).exists());
    }

    #[tokio::test]
    async fn delete_user_is_noop_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let (files, tool) = sync(tmp.path());
        assert!(!files.delete_user("example.com", Scope::Site, "ghost").await.unwrap());
        assert_eq!(tool.calls(), 0);

        files.put("example.com", Scope::Site, "alice", &pw("a")).await.unwrap();
        assert!(files.delete_user("example.com", Scope::Site, "alice").await.unwrap());
        assert!(files.users("example.com", Scope::Site).unwrap().is_empty());
    }

    #[tokio::test]
    async fn helper_failure_leaves_artifact_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let (files, tool) = sync(tmp.path());
        files.put("example.com", Scope::Site, "alice", &pw("a")).await.unwrap();

        tool.fail_next();
        let err = files
            .put("example.com", Scope::Site, "bob", &pw("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ArtifactWriteFailure { scope: Scope::Site, .. }));
        assert_eq!(files.users("example.com", Scope::Site).unwrap(), vec!["alice"]);
        // No staged copies left behind.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn unreadable_artifact_is_a_read_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let (files, _) = sync(tmp.path());
        std::fs::create_dir(files.artifact_path("example.com", Scope::Site)).unwrap();
        let err = files.users("example.com", Scope::Site).unwrap_err();
        assert!(matches!(err, Error::ArtifactReadFailure { scope: Scope::Site, .. }));
        assert!(err.to_string().starts_with("failed to read credential file"));
    }

    #[test]
    fn remove_artifact_reports_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let (files, _) = sync(tmp.path());
        std::fs::write(files.artifact_path("default", Scope::AdminTools), "ops:x\n").unwrap();
        assert!(files.remove_artifact("default", Scope::AdminTools).unwrap());
        assert!(!files.remove_artifact("default", Scope::AdminTools).unwrap());
    }
}
