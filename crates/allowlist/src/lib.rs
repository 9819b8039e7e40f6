//! IP allow-lists for sites behind the proxy.
//!
//! One file per site (`<vhost_dir>/<site_url>_acl`, global key `default`).
//! There is no record store behind it: the file itself is the state.

pub mod codec;
pub mod error;
pub mod ips;
pub mod sync;

pub use {
    error::{Error, Result},
    ips::{ALL_SENTINEL, parse_ips},
    sync::{AllowListSync, RemoveOutcome},
};
