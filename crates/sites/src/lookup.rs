//! Site registry lookup.

use std::collections::BTreeMap;

use {async_trait::async_trait, tracing::debug};

use crate::Result;

/// What the resolver needs to know about a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub site_url: String,
    pub enabled: bool,
}

/// Source of site metadata. `Ok(None)` means the site is unknown.
#[async_trait]
pub trait SiteLookup: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<SiteInfo>>;
}

/// Reduce a user-supplied site name to the bare host used as `site_url`:
/// trims whitespace, drops an `http(s)://` scheme and trailing slashes, and
/// lower-cases the rest.
pub fn normalize_site_name(name: &str) -> String {
    let name = name.trim();
    let lower = name.to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    without_scheme.trim_end_matches('/').to_string()
}

/// Site registry backed by the `[sites]` table of the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigSiteLookup {
    sites: BTreeMap<String, bool>,
}

impl ConfigSiteLookup {
    pub fn new(sites: &BTreeMap<String, sitegate_config::SiteConfig>) -> Self {
        Self {
            sites: sites
                .iter()
                .map(|(name, site)| (normalize_site_name(name), site.enabled))
                .collect(),
        }
    }

    pub fn from_config(config: &sitegate_config::SitegateConfig) -> Self {
        Self::new(&config.sites)
    }

    /// Number of registered sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[async_trait]
impl SiteLookup for ConfigSiteLookup {
    async fn lookup(&self, name: &str) -> Result<Option<SiteInfo>> {
        let site_url = normalize_site_name(name);
        let found = self.sites.get(&site_url).map(|&enabled| SiteInfo {
            site_url: site_url.clone(),
            enabled,
        });
        debug!(site = %site_url, found = found.is_some(), "site lookup");
        Ok(found)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, sitegate_config::SiteConfig};

    #[rstest]
    #[case("example.com", "example.com")]
    #[case("  Example.COM ", "example.com")]
    #[case("https://example.com/", "example.com")]
    #[case("http://blog.example.com//", "blog.example.com")]
    fn normalizes_site_names(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_site_name(input), expected);
    }

    #[tokio::test]
    async fn config_lookup_finds_normalised_keys() {
        let mut sites = BTreeMap::new();
        sites.insert("Example.com".to_string(), SiteConfig { enabled: true });
        sites.insert("old.example.com".to_string(), SiteConfig { enabled: false });
        let lookup = ConfigSiteLookup::new(&sites);
        assert_eq!(lookup.len(), 2);

        let info = lookup.lookup("https://example.com").await.unwrap().unwrap();
        assert_eq!(info.site_url, "example.com");
        assert!(info.enabled);

        let old = lookup.lookup("old.example.com").await.unwrap().unwrap();
        assert!(!old.enabled);

        assert!(lookup.lookup("missing.example.com").await.unwrap().is_none());
    }
}
