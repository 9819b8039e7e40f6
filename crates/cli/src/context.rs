//! Wiring shared by every command: configuration, the record store, and the
//! external collaborators built from configuration.

use std::sync::Arc;

use {
    anyhow::{Context as _, Result},
    clap::Args,
    sitegate_allowlist::AllowListSync,
    sitegate_auth::{AuthDefaults, AuthService, CredentialFileSync, CredentialStore},
    sitegate_config::SitegateConfig,
    sitegate_proxy::{CommandReloader, CredentialTool, HtpasswdCli, ProxyReloader},
    sitegate_sites::{ConfigSiteLookup, ResolvedScope, ScopeFlags},
    tracing::debug,
};

/// `--site` / `--admin-tools`; neither or both select every scope.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ScopeArgs {
    /// Only the site scope.
    #[arg(long)]
    pub site: bool,
    /// Only the admin-tools scope.
    #[arg(long)]
    pub admin_tools: bool,
}

impl From<ScopeArgs> for ScopeFlags {
    fn from(args: ScopeArgs) -> Self {
        Self {
            site: args.site,
            admin_tools: args.admin_tools,
        }
    }
}

pub struct Context {
    pub config: SitegateConfig,
}

impl Context {
    pub fn load() -> Result<Self> {
        let (path, config) =
            sitegate_config::load_discovered().context("failed to load configuration")?;
        if let Some(path) = path {
            debug!(path = %path.display(), "configuration loaded");
        }
        Ok(Self { config })
    }

    pub async fn resolve(&self, target: &str, scope: ScopeArgs) -> Result<ResolvedScope> {
        let lookup = ConfigSiteLookup::from_config(&self.config);
        Ok(sitegate_sites::resolve(target, scope.into(), &lookup).await?)
    }

    pub fn reloader(&self) -> Arc<dyn ProxyReloader> {
        Arc::new(CommandReloader::from_config(&self.config))
    }

    pub fn credential_tool(&self) -> Arc<dyn CredentialTool> {
        Arc::new(HtpasswdCli::from_config(&self.config))
    }

    pub async fn credential_store(&self) -> Result<CredentialStore> {
        let db_path = sitegate_config::database_path(&self.config);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        CredentialStore::connect(&db_url)
            .await
            .with_context(|| format!("failed to open {}", db_path.display()))
    }

    pub async fn auth_service(&self) -> Result<AuthService> {
        let files = CredentialFileSync::new(
            self.config.paths.htpasswd_dir.clone(),
            self.credential_tool(),
        );
        let defaults = AuthDefaults {
            username: self.config.auth.default_username.clone(),
            password_length: self.config.auth.generated_password_length,
        };
        Ok(
            AuthService::new(self.credential_store().await?, files, self.reloader())
                .with_defaults(defaults),
        )
    }

    pub fn allow_lists(&self) -> AllowListSync {
        AllowListSync::new(self.config.paths.vhost_dir.clone(), self.reloader())
    }
}
