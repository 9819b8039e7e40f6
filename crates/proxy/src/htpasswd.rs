//! Credential hashing helper (`htpasswd`).

use std::path::{Path, PathBuf};

use {async_trait::async_trait, sitegate_config::HashAlgorithm, tracing::info};

use crate::{Error, Result, process};

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Writes and removes `username:hash` lines in a credential file.
#[async_trait]
pub trait CredentialTool: Send + Sync {
    /// Create the file if absent, otherwise add or replace `username`'s line.
    async fn hash_and_store(&self, artifact: &Path, username: &str, password: &str)
    -> Result<()>;
    /// Remove `username`'s line from the file.
    async fn remove_entry(&self, artifact: &Path, username: &str) -> Result<()>;

    /// Fail with `ExternalToolUnavailable` when the helper cannot run at all.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }
}

// ── CLI-based implementation ─────────────────────────────────────────────────

/// Shells out to `htpasswd`, possibly through a container exec prefix.
///
/// The password is passed on stdin (`-i`) so it never shows up in the
/// process list.
#[derive(Debug, Clone)]
pub struct HtpasswdCli {
    command: Vec<String>,
    algorithm: HashAlgorithm,
    /// `(host_dir, container_dir)` used to translate artifact paths when the
    /// helper runs inside the proxy container.
    path_map: Option<(PathBuf, PathBuf)>,
}

impl HtpasswdCli {
    pub fn new(command: Vec<String>, algorithm: HashAlgorithm) -> Self {
        Self {
            command,
            algorithm,
            path_map: None,
        }
    }

    /// Translate paths under `host_dir` to `container_dir` before invoking
    /// the helper.
    #[must_use]
    pub fn with_path_map(mut self, host_dir: PathBuf, container_dir: PathBuf) -> Self {
        self.path_map = Some((host_dir, container_dir));
        self
    }

    pub fn from_config(config: &sitegate_config::SitegateConfig) -> Self {
        let tool = Self::new(config.htpasswd.command.clone(), config.htpasswd.algorithm);
        match &config.htpasswd.container_dir {
            Some(container_dir) => {
                tool.with_path_map(config.paths.htpasswd_dir.clone(), container_dir.clone())
            },
            None => tool,
        }
    }

    fn helper_path(&self, artifact: &Path) -> Result<PathBuf> {
        let Some((host_dir, container_dir)) = &self.path_map else {
            return Ok(artifact.to_path_buf());
        };
        let relative = artifact.strip_prefix(host_dir).map_err(|_| {
            Error::message(format!(
                "{} is outside the mapped htpasswd directory {}",
                artifact.display(),
                host_dir.display()
            ))
        })?;
        Ok(container_dir.join(relative))
    }

    /// Flags for a store call. `-c` is only passed when there is nothing to
    /// preserve, since it truncates the file.
    fn store_flags(&self, create: bool) -> String {
        let mut flags = String::from("-i");
        if create {
            flags.push('c');
        }
        flags.push(self.algorithm.flag());
        flags
    }

    async fn invoke(&self, extra: Vec<String>, stdin: Option<&str>) -> Result<()> {
        let (program, prefix) = process::split_command(&self.command)?;
        let mut args = prefix.to_vec();
        args.extend(extra);
        process::run(program, &args, stdin).await?;
        Ok(())
    }
}

fn is_empty_or_missing(path: &Path) -> bool {
    std::fs::metadata(path).map_or(true, |m| m.len() == 0)
}

#[async_trait]
impl CredentialTool for HtpasswdCli {
    async fn hash_and_store(
        &self,
        artifact: &Path,
        username: &str,
        password: &str,
    ) -> Result<()> {
        let create = is_empty_or_missing(artifact);
        let target = self.helper_path(artifact)?;
        self.invoke(
            vec![
                self.store_flags(create),
                target.to_string_lossy().into_owned(),
                username.to_string(),
            ],
            Some(password),
        )
        .await?;
        info!(path = %artifact.display(), username, create, "stored credential line");
        Ok(())
    }

    async fn remove_entry(&self, artifact: &Path, username: &str) -> Result<()> {
        let target = self.helper_path(artifact)?;
        self.invoke(
            vec![
                "-D".to_string(),
                target.to_string_lossy().into_owned(),
                username.to_string(),
            ],
            None,
        )
        .await?;
        info!(path = %artifact.display(), username, "removed credential line");
        Ok(())
    }

    fn ensure_available(&self) -> Result<()> {
        let (program, _) = process::split_command(&self.command)?;
        process::ensure_available(program)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_flags_follow_algorithm_and_create() {
        let tool = HtpasswdCli::new(vec!["htpasswd".into()], HashAlgorithm::Bcrypt);
        assert_eq!(tool.store_flags(true), "-icB");
        assert_eq!(tool.store_flags(false), "-iB");

        let md5 = HtpasswdCli::new(vec!["htpasswd".into()], HashAlgorithm::Md5);
        assert_eq!(md5.store_flags(false), "-im");
    }

    #[test]
    fn container_path_translation() {
        let tool = HtpasswdCli::new(vec!["docker".into()], HashAlgorithm::Bcrypt).with_path_map(
            PathBuf::from("/opt/proxy/htpasswd"),
            PathBuf::from("/etc/nginx/htpasswd"),
        );
        assert_eq!(
            tool.helper_path(Path::new("/opt/proxy/htpasswd/.example.com.x1.tmp"))
                .unwrap(),
            PathBuf::from("/etc/nginx/htpasswd/.example.com.x1.tmp")
        );
        assert!(tool.helper_path(Path::new("/tmp/elsewhere")).is_err());
    }

    #[test]
    fn unmapped_paths_pass_through() {
        let tool = HtpasswdCli::new(vec!["htpasswd".into()], HashAlgorithm::Sha);
        assert_eq!(
            tool.helper_path(Path::new("/etc/nginx/htpasswd/default")).unwrap(),
            PathBuf::from("/etc/nginx/htpasswd/default")
        );
    }

    #[test]
    fn empty_files_count_as_new() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("example.com");
        assert!(is_empty_or_missing(&path));
        std::fs::write(&path, "").unwrap();
        assert!(is_empty_or_missing(&path));
        std::fs::write(&path, "alice:x\n").unwrap();
        assert!(!is_empty_or_missing(&path));
    }

    #[test]
    fn missing_helper_is_unavailable() {
        let tool = HtpasswdCli::new(vec!["sitegate-no-such-htpasswd".into()], HashAlgorithm::Bcrypt);
        assert!(matches!(
            tool.ensure_available(),
            Err(Error::ExternalToolUnavailable { .. })
        ));
    }

    /// Drives the real helper through a shell stand-in that records its argv
    /// and stdin.
    #[cfg(unix)]
    #[tokio::test]
    async fn invokes_helper_with_stdin_password() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("calls.log");
        let script = format!(
            "read pw; echo \"$@|$pw\" >> {}",
            log.display()
        );
        let tool = HtpasswdCli::new(
            vec!["sh".into(), "-c".into(), script, "htpasswd".into()],
            HashAlgorithm::Bcrypt,
        );
        let artifact = tmp.path().join("example.com");
        tool.hash_and_store(&artifact, "alice", "hunter2").await.unwrap();

        let logged = std::fs::read_to_string(&log).unwrap();
        assert_eq!(
            logged.trim(),
            format!("-icB {} alice|hunter2", artifact.display())
        );
    }
}
