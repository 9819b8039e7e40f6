//! Atomic replacement of proxy artifacts.
//!
//! Every artifact write goes through a temp file created next to the
//! destination and is renamed over it, so the proxy never observes a
//! partially written file.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use {tempfile::NamedTempFile, tracing::debug};

use crate::{Error, Result};

/// Permissions applied to committed artifacts (read by proxy workers).
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

fn parent_dir(path: &Path) -> Result<&Path> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent),
        Some(_) => Ok(Path::new(".")),
        None => Err(Error::message(format!(
            "artifact path has no parent directory: {}",
            path.display()
        ))),
    }
}

fn temp_for(path: &Path) -> Result<NamedTempFile> {
    let dir = parent_dir(path)?;
    std::fs::create_dir_all(dir)?;
    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    Ok(tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?)
}

/// Replace `path` with `contents` atomically, creating parent directories.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let mut tmp = temp_for(path)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    commit(tmp, path)
}

/// A staged copy of an artifact that an external helper may mutate in place
/// before it is committed over the original.
pub struct StagedArtifact {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl StagedArtifact {
    /// Copy the current artifact (if any) into a temp file beside it.
    pub fn stage(target: &Path) -> Result<Self> {
        let tmp = temp_for(target)?;
        match std::fs::copy(target, tmp.path()) {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(e.into()),
        }
        debug!(target = %target.display(), staged = %tmp.path().display(), "staged artifact");
        Ok(Self {
            tmp,
            target: target.to_path_buf(),
        })
    }

    /// Path of the staged copy.
    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    /// Atomically move the staged copy over the original artifact.
    pub fn commit(self) -> Result<()> {
        commit(self.tmp, &self.target)
    }
}

fn commit(tmp: NamedTempFile, path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(ARTIFACT_MODE))?;
    }
    tmp.persist(path).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    debug!(path = %path.display(), "committed artifact");
    Ok(())
}

/// Remove an artifact. Returns `false` when it was already absent.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Read an artifact, treating a missing file as absent rather than an error.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vhost.d").join("example.com_acl");
        atomic_write(&path, "satisfy any;\ndeny all;\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "satisfy any;\ndeny all;\n"
        );
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("default_acl");
        atomic_write(&path, "old").unwrap();
        atomic_write(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn staged_artifact_copies_existing_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("example.com");
        std::fs::write(&path, "alice:hash\n").unwrap();

        let staged = StagedArtifact::stage(&path).unwrap();
        assert_eq!(
            std::fs::read_to_string(staged.path()).unwrap(),
            "alice:hash\n"
        );
        std::fs::write(staged.path(), "alice:hash\nbob:hash\n").unwrap();
        // Original untouched until commit.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "alice:hash\n");

        staged.commit().unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "alice:hash\nbob:hash\n"
        );
    }

    #[test]
    fn staged_artifact_for_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("htpasswd").join("new.site");
        let staged = StagedArtifact::stage(&path).unwrap();
        assert_eq!(std::fs::read_to_string(staged.path()).unwrap(), "");
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn remove_if_exists_reports_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gone");
        assert!(!remove_if_exists(&path).unwrap());
        std::fs::write(&path, "x").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(read_optional(&path).unwrap().is_none());
    }
}
