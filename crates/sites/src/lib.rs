//! Site lookup and scope resolution.
//!
//! Every command targets either a registered site or the `global`
//! pseudo-site (persisted as `default`), and one or both auth scopes:
//! - `site`: traffic to the site itself
//! - `admin-tools`: traffic to the admin tooling paths of the site

pub mod error;
pub mod lookup;
pub mod scope;

pub use {
    error::{Error, Result},
    lookup::{ConfigSiteLookup, SiteInfo, SiteLookup, normalize_site_name},
    scope::{GLOBAL_SITE_URL, GLOBAL_TARGET, ResolvedScope, Scope, ScopeFlags, ScopeSet, resolve},
};
