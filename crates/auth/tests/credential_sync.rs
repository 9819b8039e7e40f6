#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    sitegate_auth::{AuthService, CredentialFileSync, CredentialStore, Error},
    sitegate_proxy::{CredentialTool, ProxyReloader},
    sitegate_sites::{ConfigSiteLookup, ResolvedScope, Scope, ScopeFlags, ScopeSet, resolve},
    sqlx::SqlitePool,
};

/// Keeps `user:password` lines so tests can inspect the files directly.
struct PlainTool;

#[async_trait]
impl CredentialTool for PlainTool {
    async fn hash_and_store(
        &self,
        artifact: &Path,
        username: &str,
        password: &str,
    ) -> sitegate_proxy::Result<()> {
        let mut lines = retain_others(artifact, username);
        lines.push(format!("{username}:{password}"));
        std::fs::write(artifact, lines.join("\n") + "\n")?;
        Ok(())
    }

    async fn remove_entry(&self, artifact: &Path, username: &str) -> sitegate_proxy::Result<()> {
        let lines = retain_others(artifact, username);
        std::fs::write(artifact, lines.join("\n") + "\n")?;
        Ok(())
    }
}

fn retain_others(artifact: &Path, username: &str) -> Vec<String> {
    let prefix = format!("{username}:");
    std::fs::read_to_string(artifact)
        .unwrap_or_default()
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

#[derive(Default)]
struct Reloads(AtomicUsize);

#[async_trait]
impl ProxyReloader for Reloads {
    async fn reload(&self) -> sitegate_proxy::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn service(dir: &Path) -> (AuthService, Arc<Reloads>) {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sitegate_auth::run_migrations(&pool).await.unwrap();
    let reloads = Arc::new(Reloads::default());
    let service = AuthService::new(
        CredentialStore::with_pool(pool),
        CredentialFileSync::new(dir, Arc::new(PlainTool)),
        reloads.clone(),
    );
    (service, reloads)
}

fn lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn lookup() -> ConfigSiteLookup {
    let config: sitegate_config::SitegateConfig = toml::from_str(
        r#"
        [sites."shop.example.com"]
        [sites."old.example.com"]
        enabled = false
        "#,
    )
    .unwrap();
    ConfigSiteLookup::from_config(&config)
}

#[tokio::test]
async fn create_then_list_all_returns_both_scopes_with_equal_passwords() {
    let tmp = tempfile::tempdir().unwrap();
    let (auth, reloads) = service(tmp.path()).await;
    let site = resolve("https://Shop.example.com/", ScopeFlags::default(), &lookup())
        .await
        .unwrap();

    auth.create(&site, Some("alice"), Some(Secret::new("pw1".into())))
        .await
        .unwrap();

    let records = auth.list(&site, Some("alice")).await.unwrap();
    assert_eq!(records.len(), 2);
    let scopes: Vec<Scope> = records.iter().map(|r| r.scope).collect();
    assert!(scopes.contains(&Scope::Site) && scopes.contains(&Scope::AdminTools));
    assert_eq!(
        records[0].password.expose_secret(),
        records[1].password.expose_secret()
    );
    assert_eq!(reloads.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn duplicate_create_leaves_no_new_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let (auth, _) = service(tmp.path()).await;
    let site = ResolvedScope::new("shop.example.com", ScopeSet::All);

    auth.create(&site, Some("alice"), Some(Secret::new("pw1".into())))
        .await
        .unwrap();
    let site_file = tmp.path().join("shop.example.com");
    let admin_file = tmp.path().join("shop.example.com_admin_tools");
    let before = (lines(&site_file), lines(&admin_file));

    let err = auth
        .create(&site, Some("alice"), Some(Secret::new("pw2".into())))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CredentialAlreadyExists { .. }));
    assert_eq!((lines(&site_file), lines(&admin_file)), before);
    assert_eq!(lines(&site_file), vec!["alice:pw1"]);
}

#[tokio::test]
async fn deleting_site_scope_keeps_admin_tools() {
    let tmp = tempfile::tempdir().unwrap();
    let (auth, _) = service(tmp.path()).await;
    let all = ResolvedScope::new("shop.example.com", ScopeSet::All);
    auth.create(&all, Some("alice"), Some(Secret::new("pw".into())))
        .await
        .unwrap();
    auth.create(&all, Some("bob"), Some(Secret::new("pw".into())))
        .await
        .unwrap();

    auth.delete(&all.with_scopes(ScopeSet::Site), Some("alice"))
        .await
        .unwrap();

    let remaining = auth
        .list(&all.with_scopes(ScopeSet::AdminTools), Some("alice"))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        lines(&tmp.path().join("shop.example.com_admin_tools")),
        vec!["alice:pw", "bob:pw"]
    );
    assert_eq!(lines(&tmp.path().join("shop.example.com")), vec!["bob:pw"]);

    let err = auth
        .list(&all.with_scopes(ScopeSet::Site), Some("alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoMatchingCredential { .. }));
}

#[tokio::test]
async fn global_target_uses_default_site_key() {
    let tmp = tempfile::tempdir().unwrap();
    let (auth, _) = service(tmp.path()).await;
    let global = resolve("GLOBAL", ScopeFlags::default(), &lookup())
        .await
        .unwrap();
    assert!(global.is_global());

    auth.create(&global, Some("ops"), Some(Secret::new("pw".into())))
        .await
        .unwrap();
    assert_eq!(lines(&tmp.path().join("default")), vec!["ops:pw"]);
    assert_eq!(lines(&tmp.path().join("default_admin_tools")), vec!["ops:pw"]);
}

#[tokio::test]
async fn unknown_and_disabled_sites_fail_before_any_write() {
    let lookup = lookup();
    for target in ["nowhere.example.com", "old.example.com"] {
        let err = resolve(target, ScopeFlags::default(), &lookup)
            .await
            .unwrap_err();
        let err = Error::from(err);
        assert!(err.to_string().contains(target));
    }
}
