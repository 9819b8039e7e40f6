//! Configuration validation engine.
//!
//! Walks the raw config document against the known schema to catch
//! misspelled fields, then runs semantic checks on the parsed config.

use std::{collections::HashMap, path::Path};

use crate::schema::SitegateConfig;

/// Site keys that collide with the global pseudo-site.
const RESERVED_SITE_KEYS: &[&str] = &["default", "global"];

/// Generated passwords shorter than this trigger a security warning.
const MIN_GENERATED_PASSWORD_LENGTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One finding about the config file.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// One of `syntax`, `unknown-field`, `command`, `site`, `security`, `file-ref`.
    pub category: &'static str,
    /// Dotted key path such as `reload.command`; empty for whole-file findings.
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            category,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(category, path, message)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    fn single(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
            config_path: None,
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    /// Dynamic keys (site names) whose values share one shape.
    Map(Box<KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Map, Struct};

    Struct(HashMap::from([
        (
            "paths",
            Struct(HashMap::from([
                ("htpasswd_dir", Leaf),
                ("vhost_dir", Leaf),
                ("database", Leaf),
            ])),
        ),
        (
            "htpasswd",
            Struct(HashMap::from([
                ("command", Leaf),
                ("container_dir", Leaf),
                ("algorithm", Leaf),
            ])),
        ),
        ("reload", Struct(HashMap::from([("command", Leaf)]))),
        (
            "auth",
            Struct(HashMap::from([
                ("default_username", Leaf),
                ("generated_password_length", Leaf),
            ])),
        ),
        (
            "sites",
            Map(Box::new(Struct(HashMap::from([("enabled", Leaf)])))),
        ),
    ]))
}

/// Edit distance over chars, kept to a single row.
fn edit_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=target.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in target.iter().enumerate() {
            let substitute = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitute.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[target.len()]
}

/// Known key closest to a misspelled one.
fn closest_key<'a>(key: &str, known: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for &candidate in known {
        let distance = edit_distance(key, candidate);
        if distance == 0 || distance > 3 {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let serde_json::Value::Object(table) = value else {
        return;
    };
    match schema {
        KnownKeys::Struct(fields) => {
            let mut known_keys: Vec<&str> = fields.keys().copied().collect();
            known_keys.sort_unstable();
            for (key, child) in table {
                let path = join_path(prefix, key);
                match fields.get(key.as_str()) {
                    Some(child_schema) => {
                        check_unknown_fields(child, child_schema, &path, diagnostics);
                    },
                    None => {
                        let hint = closest_key(key, &known_keys)
                            .map(|k| format!("; did you mean `{k}`?"))
                            .unwrap_or_default();
                        diagnostics.push(Diagnostic::error(
                            "unknown-field",
                            path,
                            format!("`{key}` is not a recognised key{hint}"),
                        ));
                    },
                }
            }
        },
        KnownKeys::Map(value_schema) => {
            for (key, child) in table {
                check_unknown_fields(child, value_schema, &join_path(prefix, key), diagnostics);
            }
        },
        KnownKeys::Leaf => {},
    }
}

fn check_semantics(config: &SitegateConfig, diagnostics: &mut Vec<Diagnostic>) {
    let mut push = |d: Diagnostic| diagnostics.push(d);

    if config.htpasswd.command.is_empty() {
        push(Diagnostic::error(
            "command",
            "htpasswd.command",
            "credential hashing helper command is empty",
        ));
    }
    if config.reload.command.is_empty() {
        push(Diagnostic::error(
            "command",
            "reload.command",
            "proxy reload command is empty",
        ));
    }
    if config.auth.default_username.trim().is_empty() {
        push(Diagnostic::error(
            "security",
            "auth.default_username",
            "default username must not be empty",
        ));
    }
    if config.auth.generated_password_length < MIN_GENERATED_PASSWORD_LENGTH {
        push(Diagnostic::warning(
            "security",
            "auth.generated_password_length",
            format!(
                "generated passwords shorter than {MIN_GENERATED_PASSWORD_LENGTH} characters are weak"
            ),
        ));
    }

    for name in config.sites.keys() {
        let path = format!("sites.{name}");
        let lowered = name.to_lowercase();
        if RESERVED_SITE_KEYS.contains(&lowered.as_str()) {
            push(Diagnostic::error(
                "site",
                path,
                format!("`{name}` is reserved for the global scope"),
            ));
        } else if name.contains("://") || name.ends_with('/') || *name != lowered {
            push(Diagnostic::warning(
                "site",
                path,
                "site keys should be bare lower-case host names",
            ));
        }
    }
}

fn parse_document(raw: &str, format: &str) -> Result<serde_json::Value, String> {
    match format {
        "toml" => {
            let table: toml::Value = toml::from_str(raw).map_err(|e| e.to_string())?;
            serde_json::to_value(table).map_err(|e| e.to_string())
        },
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(raw).map_err(|e| e.to_string()),
        other => Err(format!("unsupported config format: .{other}")),
    }
}

/// Validate raw config text of the given format (`toml`, `yaml`, `yml`, `json`).
#[must_use]
pub fn validate_str(raw: &str, format: &str) -> ValidationResult {
    let value = match parse_document(raw, format) {
        Ok(value) => value,
        Err(message) => return ValidationResult::single(Diagnostic::error("syntax", "", message)),
    };

    let mut result = ValidationResult::default();
    check_unknown_fields(&value, &build_schema_map(), "", &mut result.diagnostics);
    match serde_json::from_value::<SitegateConfig>(value) {
        Ok(config) => check_semantics(&config, &mut result.diagnostics),
        Err(e) => result
            .diagnostics
            .push(Diagnostic::error("syntax", "", format!("type error: {e}"))),
    }
    result
}

/// Validate the file at `path`, or the discovered config file when `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let Some(config_path) = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file)
    else {
        return ValidationResult::single(Diagnostic {
            severity: Severity::Info,
            ..Diagnostic::error("file-ref", "", "no config file found; using defaults")
        });
    };

    let format = config_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("toml");
    let mut result = match std::fs::read_to_string(&config_path) {
        Ok(raw) => validate_str(&crate::env_subst::substitute_env(&raw), format),
        Err(e) => ValidationResult::single(Diagnostic::error(
            "file-ref",
            "",
            format!("cannot read {}: {e}", config_path.display()),
        )),
    };
    result.config_path = Some(config_path);
    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance_counts_single_edits() {
        assert_eq!(edit_distance("reload", "reload"), 0);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("relaod", "reload"), 2);
        assert_eq!(edit_distance("paths", "path"), 1);
    }

    #[test]
    fn closest_key_ignores_distant_candidates() {
        assert_eq!(closest_key("htpaswd", &["auth", "htpasswd"]), Some("htpasswd"));
        assert_eq!(closest_key("zzzzzzzz", &["auth", "htpasswd"]), None);
    }

    #[test]
    fn default_config_is_clean() {
        let result = validate_str("", "toml");
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.count(Severity::Warning), 0);
    }

    #[test]
    fn unknown_field_gets_suggestion() {
        let result = validate_str("[relaod]\ncommand = [\"nginx\"]\n", "toml");
        let d = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(d.path, "relaod");
        assert!(d.message.contains("reload"));
    }

    #[test]
    fn unknown_site_field_reported_with_path() {
        let result = validate_str("[sites.\"example.com\"]\nenabeld = true\n", "toml");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "sites.example.com.enabeld")
        );
    }

    #[test]
    fn empty_commands_are_errors() {
        let result = validate_str("[reload]\ncommand = []\n[htpasswd]\ncommand = []\n", "toml");
        assert_eq!(result.count(Severity::Error), 2);
    }

    #[test]
    fn reserved_and_unnormalised_site_keys() {
        let result = validate_str(
            "{\"sites\": {\"default\": {}, \"https://Example.com/\": {}}}",
            "json",
        );
        assert!(result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn short_generated_password_is_warning() {
        let result = validate_str("auth:\n  generated_password_length: 6\n", "yaml");
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn syntax_error_short_circuits() {
        let result = validate_str("[paths", "toml");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }
}
