//! Proxy reload trigger.

use {async_trait::async_trait, tracing::info};

use crate::{Error, Result, process};

/// Makes the reverse proxy re-read all credential and allow-list files.
/// Reloading is idempotent.
#[async_trait]
pub trait ProxyReloader: Send + Sync {
    async fn reload(&self) -> Result<()>;
}

/// Runs the configured reload command.
#[derive(Debug, Clone)]
pub struct CommandReloader {
    command: Vec<String>,
}

impl CommandReloader {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_config(config: &sitegate_config::SitegateConfig) -> Self {
        Self::new(config.reload.command.clone())
    }

    fn display(&self) -> String {
        self.command.join(" ")
    }
}

#[async_trait]
impl ProxyReloader for CommandReloader {
    async fn reload(&self) -> Result<()> {
        let command = self.display();
        let failure = |detail: String| Error::ReloadFailure {
            command: command.clone(),
            detail,
        };

        let (program, args) =
            process::split_command(&self.command).map_err(|e| failure(e.to_string()))?;
        process::run(program, args, None)
            .await
            .map_err(|e| failure(e.to_string()))?;
        info!(cmd = %command, "proxy reloaded");
        Ok(())
    }
}
