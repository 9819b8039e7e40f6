//! Allow-list file format.
//!
//! ```text
//! satisfy any;
//! allow 10.0.0.1;
//! allow 10.0.0.2;
//! deny all;
//! ```
//!
//! The first and last non-empty lines are structural. An absent file means
//! no IP restriction, not "deny all".

use tracing::debug;

use crate::ips;

pub const HEADER: &str = "satisfy any;";
pub const TRAILER: &str = "deny all;";

/// Render `ips` in order between the header and the trailer.
pub fn render(ips: &[String]) -> String {
    let mut out = String::with_capacity(HEADER.len() + TRAILER.len() + ips.len() * 24);
    out.push_str(HEADER);
    out.push('\n');
    for ip in ips {
        out.push_str("allow ");
        out.push_str(ip);
        out.push_str(";\n");
    }
    out.push_str(TRAILER);
    out.push('\n');
    out
}

/// Extract the allowed IPs in file order. Repeated entries in a hand-edited
/// file are kept once, at their first position.
pub fn parse(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() <= 2 {
        return Vec::new();
    }

    let entries: Vec<String> = lines[1..lines.len() - 1]
        .iter()
        .filter_map(|line| {
            let ip = line
                .strip_prefix("allow")
                .filter(|rest| rest.starts_with(char::is_whitespace))
                .and_then(|rest| rest.strip_suffix(';'))
                .map(str::trim)
                .filter(|ip| !ip.is_empty());
            if ip.is_none() {
                debug!(line, "skipping unrecognised allow-list line");
            }
            ip.map(str::to_string)
        })
        .collect();
    ips::dedup(&entries)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_list_is_header_and_trailer() {
        assert_eq!(render(&[]), "satisfy any;\ndeny all;\n");
    }

    #[test]
    fn render_then_parse_keeps_order() {
        let ips = vec!["10.0.0.2".to_string(), "10.0.0.1".to_string()];
        let rendered = render(&ips);
        assert_eq!(
            rendered,
            "satisfy any;\nallow 10.0.0.2;\nallow 10.0.0.1;\ndeny all;\n"
        );
        assert_eq!(parse(&rendered), ips);
    }

    #[test]
    fn parse_strips_structural_lines_only_by_position() {
        let content =
            "\n  satisfy any;\nallow 192.168.1.0/24;\n\nallow  2001:db8::1 ;\ndeny all;\n\n";
        assert_eq!(parse(content), vec!["192.168.1.0/24", "2001:db8::1"]);
    }

    #[test]
    fn parse_ignores_foreign_lines() {
        let content =
            "satisfy any;\n# managed\nallow 10.0.0.1;\nallowed;\ndeny 10.0.0.9;\ndeny all;\n";
        assert_eq!(parse(content), vec!["10.0.0.1"]);
    }

    #[test]
    fn parse_keeps_repeated_entries_once() {
        let content = "satisfy any;\nallow A;\nallow B;\nallow A;\ndeny all;\n";
        assert_eq!(parse(content), vec!["A", "B"]);
    }

    #[test]
    fn parse_degenerate_files() {
        assert!(parse("").is_empty());
        assert!(parse("satisfy any;\ndeny all;\n").is_empty());
    }
}
