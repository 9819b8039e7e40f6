//! IP argument parsing and the set arithmetic behind each operation.
//!
//! Sets are kept as vectors so order stays observable: union puts the
//! requested IPs first, then existing ones not already present.

use crate::{Error, Result};

/// Remove-everything sentinel.
pub const ALL_SENTINEL: &str = "all";

const FORBIDDEN: &[char] = &[';', '{', '}', '#', '"', '\''];

/// Split comma or whitespace separated arguments into IP entries.
///
/// Empty entries (`"10.0.0.1,,10.0.0.2"`) and characters that would break
/// out of an `allow` directive are rejected.
pub fn parse_ips<S: AsRef<str>>(args: &[S]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if arg.trim().is_empty() {
            return Err(invalid(arg, "empty entry"));
        }
        for part in arg.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid(arg, "empty entry"));
            }
            for entry in part.split_whitespace() {
                if let Some(c) = entry.chars().find(|c| FORBIDDEN.contains(c)) {
                    return Err(invalid(entry, &format!("character '{c}' is not allowed")));
                }
                out.push(entry.to_string());
            }
        }
    }
    Ok(out)
}

fn invalid(value: &str, reason: &str) -> Error {
    Error::InvalidIp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn is_all_sentinel(ip: &str) -> bool {
    ip.eq_ignore_ascii_case(ALL_SENTINEL)
}

/// Reject the remove sentinel where a real IP is required.
pub fn reject_sentinel(ips: &[String]) -> Result<()> {
    match ips.iter().find(|ip| is_all_sentinel(ip)) {
        Some(ip) => Err(invalid(ip, "'all' is only meaningful for remove")),
        None => Ok(()),
    }
}

/// First occurrence wins.
pub fn dedup(ips: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ips.len());
    for ip in ips {
        if !out.contains(ip) {
            out.push(ip.clone());
        }
    }
    out
}

/// Requested IPs first, then existing ones not already present.
pub fn union(requested: &[String], existing: &[String]) -> Vec<String> {
    let mut out = dedup(requested);
    for ip in existing {
        if !out.contains(ip) {
            out.push(ip.clone());
        }
    }
    out
}

/// Outcome of subtracting `requested` from `existing`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Difference {
    pub removed: Vec<String>,
    pub not_found: Vec<String>,
    pub remaining: Vec<String>,
}

pub fn difference(existing: &[String], requested: &[String]) -> Difference {
    let requested = dedup(requested);
    let (removed, not_found): (Vec<String>, Vec<String>) =
        requested.into_iter().partition(|ip| existing.contains(ip));
    let remaining = existing
        .iter()
        .filter(|ip| !removed.contains(ip))
        .cloned()
        .collect();
    Difference {
        removed,
        not_found,
        remaining,
    }
}
