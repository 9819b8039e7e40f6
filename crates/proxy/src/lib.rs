//! External collaborators of the reverse proxy.
//!
//! Shells out to:
//! - **htpasswd**: hashes a password into a credential file, or removes a user
//!   line from it (optionally inside the proxy container).
//! - **reload**: makes the proxy re-read every credential and allow-list file.

pub mod error;
pub mod htpasswd;
pub mod process;
pub mod reload;

pub use {
    error::{Error, Result},
    htpasswd::{CredentialTool, HtpasswdCli},
    reload::{CommandReloader, ProxyReloader},
};
