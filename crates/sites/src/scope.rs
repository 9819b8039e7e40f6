//! Scope resolution: which site key and which auth scopes a command acts on.

use {
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{Error, Result, lookup::SiteLookup, normalize_site_name};

/// Target name that selects the global pseudo-site.
pub const GLOBAL_TARGET: &str = "global";

/// `site_url` under which global credentials and allow-lists are stored.
pub const GLOBAL_SITE_URL: &str = "default";

// ── Types ────────────────────────────────────────────────────────────────────

/// One of the two independent auth contexts of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Site,
    AdminTools,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Site, Scope::AdminTools];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::AdminTools => "admin-tools",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "site" => Ok(Self::Site),
            "admin-tools" => Ok(Self::AdminTools),
            other => Err(Error::UnknownScope {
                scope: other.to_string(),
            }),
        }
    }
}

/// Scope selection flags as given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeFlags {
    pub site: bool,
    pub admin_tools: bool,
}

/// The effective set of scopes an operation fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeSet {
    Site,
    AdminTools,
    All,
}

impl ScopeSet {
    /// Exactly one flag selects that scope; none or both select `All`.
    pub fn from_flags(flags: ScopeFlags) -> Self {
        match (flags.site, flags.admin_tools) {
            (true, false) => Self::Site,
            (false, true) => Self::AdminTools,
            _ => Self::All,
        }
    }

    pub fn scopes(&self) -> &'static [Scope] {
        match self {
            Self::Site => &[Scope::Site],
            Self::AdminTools => &[Scope::AdminTools],
            Self::All => &Scope::ALL,
        }
    }

    /// The single scope to filter on, or `None` for `All`.
    pub fn single(&self) -> Option<Scope> {
        match self {
            Self::Site => Some(Scope::Site),
            Self::AdminTools => Some(Scope::AdminTools),
            Self::All => None,
        }
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.scopes().contains(&scope)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::AdminTools => "admin-tools",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit context threaded through every credential and allow-list
/// operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    pub site_url: String,
    pub scopes: ScopeSet,
}

impl ResolvedScope {
    pub fn new(site_url: impl Into<String>, scopes: ScopeSet) -> Self {
        Self {
            site_url: site_url.into(),
            scopes,
        }
    }

    /// The global pseudo-site with the given scope set.
    pub fn global(scopes: ScopeSet) -> Self {
        Self::new(GLOBAL_SITE_URL, scopes)
    }

    pub fn is_global(&self) -> bool {
        self.site_url == GLOBAL_SITE_URL
    }

    /// Same site, different scope set.
    #[must_use]
    pub fn with_scopes(&self, scopes: ScopeSet) -> Self {
        Self::new(self.site_url.clone(), scopes)
    }
}

impl std::fmt::Display for ResolvedScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "site {} (scope {})", self.site_url, self.scopes)
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Resolve a command target and scope flags into a [`ResolvedScope`].
///
/// `global` short-circuits to the `default` site key without a lookup; any
/// other target must name an enabled site.
pub async fn resolve(
    target: &str,
    flags: ScopeFlags,
    lookup: &dyn SiteLookup,
) -> Result<ResolvedScope> {
    let scopes = ScopeSet::from_flags(flags);

    if target.trim().eq_ignore_ascii_case(GLOBAL_TARGET) {
        debug!(%scopes, "resolved global target");
        return Ok(ResolvedScope::global(scopes));
    }

    let name = normalize_site_name(target);
    let site = match lookup.lookup(&name).await? {
        Some(site) => site,
        None => return Err(Error::SiteNotFound { site: name }),
    };
    if !site.enabled {
        return Err(Error::SiteDisabled {
            site: site.site_url,
        });
    }

    debug!(site_url = %site.site_url, %scopes, "resolved site target");
    Ok(ResolvedScope::new(site.site_url, scopes))
}
