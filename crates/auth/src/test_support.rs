//! In-process stand-ins for the hashing helper and the proxy reload.

use std::{
    path::Path,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    sitegate_proxy::{CredentialTool, ProxyReloader},
};

/// Writes `username:password` lines without hashing.
#[derive(Default)]
pub struct PlainTool {
    calls: AtomicUsize,
    /// 1-based call number that fails; 0 disables.
    fail_at: AtomicUsize,
    unavailable: AtomicBool,
}

impl PlainTool {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self) {
        self.fail_at(self.calls() + 1);
    }

    pub fn fail_at(&self, call: usize) {
        self.fail_at.store(call, Ordering::SeqCst);
    }

    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn begin(&self) -> sitegate_proxy::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at.load(Ordering::SeqCst) == call {
            return Err(sitegate_proxy::Error::ToolFailed {
                tool: "htpasswd".into(),
                code: Some(1),
                stderr: "simulated failure".into(),
            });
        }
        Ok(())
    }
}

fn rewrite(artifact: &Path, username: &str, line: Option<String>) -> sitegate_proxy::Result<()> {
    let existing = std::fs::read_to_string(artifact).unwrap_or_default();
    let prefix = format!("{username}:");
    let mut out: String = existing
        .lines()
        .filter(|l| !l.starts_with(&prefix))
        .map(|l| format!("{l}\n"))
        .collect();
    if let Some(line) = line {
        out.push_str(&line);
        out.push('\n');
    }
    std::fs::write(artifact, out)?;
    Ok(())
}

#[async_trait]
impl CredentialTool for PlainTool {
    async fn hash_and_store(
        &self,
        artifact: &Path,
        username: &str,
        password: &str,
    ) -> sitegate_proxy::Result<()> {
        self.begin()?;
        rewrite(artifact, username, Some(format!("{username}:{password}")))
    }

    async fn remove_entry(&self, artifact: &Path, username: &str) -> sitegate_proxy::Result<()> {
        self.begin()?;
        rewrite(artifact, username, None)
    }

    fn ensure_available(&self) -> sitegate_proxy::Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(sitegate_proxy::Error::ExternalToolUnavailable {
                tool: "htpasswd".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingReloader {
    count: AtomicUsize,
    fail: AtomicBool,
}

impl CountingReloader {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProxyReloader for CountingReloader {
    async fn reload(&self) -> sitegate_proxy::Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(sitegate_proxy::Error::ReloadFailure {
                command: "nginx -s reload".into(),
                detail: "simulated failure".into(),
            });
        }
        Ok(())
    }
}
