//! Default configuration template with all options documented.

use std::path::Path;

use crate::error::{Error, Result};

/// The commented default config written by `sitegate config init`.
pub fn default_config_template() -> &'static str {
    r##"# Sitegate Configuration
# ======================
# Environment variable substitution is supported: ${ENV_VAR} or ${ENV_VAR:-fallback}

# ══════════════════════════════════════════════════════════════════════════════
# ARTIFACT PATHS
# ══════════════════════════════════════════════════════════════════════════════

[paths]
htpasswd_dir = "/etc/nginx/htpasswd"    # one credential file per site (+ "<site>_admin_tools")
vhost_dir = "/etc/nginx/vhost.d"        # allow-lists are written to "<site>_acl"
# database = "/var/lib/sitegate/sitegate.db"   # defaults to <data dir>/sitegate.db

# ══════════════════════════════════════════════════════════════════════════════
# CREDENTIAL HASHING HELPER
# ══════════════════════════════════════════════════════════════════════════════

[htpasswd]
command = ["htpasswd"]
# Run the helper inside the proxy container instead:
# command = ["docker", "exec", "-i", "nginx-proxy", "htpasswd"]
# container_dir = "/etc/nginx/htpasswd"  # where the container sees paths.htpasswd_dir
algorithm = "bcrypt"                      # bcrypt | md5 | sha

# ══════════════════════════════════════════════════════════════════════════════
# PROXY RELOAD
# ══════════════════════════════════════════════════════════════════════════════

[reload]
command = ["nginx", "-s", "reload"]
# command = ["docker", "exec", "nginx-proxy", "nginx", "-s", "reload"]

# ══════════════════════════════════════════════════════════════════════════════
# CREDENTIAL DEFAULTS
# ══════════════════════════════════════════════════════════════════════════════

[auth]
default_username = "sitegate"             # used when --user is omitted
generated_password_length = 18            # used when --pass is omitted

# ══════════════════════════════════════════════════════════════════════════════
# SITES
# ══════════════════════════════════════════════════════════════════════════════

# [sites."example.com"]
# enabled = true
"##
}

/// Write the default template to `path`. Refuses to overwrite an existing file.
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::message(format!(
            "config file already exists: {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, default_config_template())?;
    Ok(())
}
