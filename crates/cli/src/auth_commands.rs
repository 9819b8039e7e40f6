use {
    anyhow::Result,
    clap::Subcommand,
    secrecy::{ExposeSecret, Secret},
    sitegate_auth::{CreateOutcome, CredentialRecord},
};

use crate::context::{Context, ScopeArgs};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create a user on both scopes of a site (or `global`).
    Create {
        /// Site name, or `global` for every site.
        target: String,
        /// Username (defaults to `auth.default_username`).
        #[arg(long)]
        user: Option<String>,
        /// Password; generated when omitted.
        #[arg(long, env = "SITEGATE_PASSWORD", hide_env_values = true)]
        pass: Option<String>,
    },
    /// Create the global admin-tools user.
    Bootstrap {
        #[arg(long)]
        user: Option<String>,
        #[arg(long, env = "SITEGATE_PASSWORD", hide_env_values = true)]
        pass: Option<String>,
    },
    /// Change the password of matching users.
    Update {
        target: String,
        /// Only this user (default: every user on the site).
        #[arg(long)]
        user: Option<String>,
        #[arg(long, env = "SITEGATE_PASSWORD", hide_env_values = true)]
        pass: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Delete matching users.
    Delete {
        target: String,
        #[arg(long)]
        user: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// List users.
    List {
        target: String,
        #[arg(long)]
        user: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
        /// Include plaintext passwords.
        #[arg(long)]
        show_password: bool,
    },
}

pub async fn handle_auth(action: AuthAction) -> Result<()> {
    let ctx = Context::load()?;
    match action {
        AuthAction::Create { target, user, pass } => {
            let resolved = ctx.resolve(&target, ScopeArgs::default()).await?;
            let service = ctx.auth_service().await?;
            let outcome = service
                .create(&resolved, user.as_deref(), pass.map(Secret::new))
                .await?;
            print_created(&outcome);
        },
        AuthAction::Bootstrap { user, pass } => {
            let service = ctx.auth_service().await?;
            let outcome = service
                .bootstrap_admin_tools(user.as_deref(), pass.map(Secret::new))
                .await?;
            print_created(&outcome);
        },
        AuthAction::Update {
            target,
            user,
            pass,
            scope,
        } => {
            let resolved = ctx.resolve(&target, scope).await?;
            let service = ctx.auth_service().await?;
            let outcome = service
                .update(&resolved, user.as_deref(), pass.map(Secret::new))
                .await?;
            for record in &outcome.records {
                println!(
                    "Updated password for '{}' on {} ({})",
                    record.username, record.site_url, record.scope
                );
            }
            if outcome.generated {
                println!("Generated password: {}", outcome.password.expose_secret());
            }
        },
        AuthAction::Delete {
            target,
            user,
            scope,
        } => {
            let resolved = ctx.resolve(&target, scope).await?;
            let service = ctx.auth_service().await?;
            let outcome = service.delete(&resolved, user.as_deref()).await?;
            for record in &outcome.records {
                println!(
                    "Deleted '{}' from {} ({})",
                    record.username, record.site_url, record.scope
                );
            }
            for scope in &outcome.cleared {
                println!("No users left in scope {scope}; credential file removed");
            }
        },
        AuthAction::List {
            target,
            user,
            scope,
            json,
            show_password,
        } => {
            let resolved = ctx.resolve(&target, scope).await?;
            let service = ctx.auth_service().await?;
            let records = service.list(&resolved, user.as_deref()).await?;
            if json {
                let views: Vec<_> = records.iter().map(|r| r.view(show_password)).collect();
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                print_table(&records, show_password);
            }
        },
    }
    Ok(())
}

fn print_created(outcome: &CreateOutcome) {
    let scopes: Vec<&str> = outcome.records.iter().map(|r| r.scope.as_str()).collect();
    println!(
        "Created http auth for '{}' on {} ({})",
        outcome.username,
        outcome.site_url,
        scopes.join(", ")
    );
    if outcome.generated {
        println!("Generated password: {}", outcome.password.expose_secret());
    }
}

fn print_table(records: &[CredentialRecord], show_password: bool) {
    let site_w = column_width("SITE", records.iter().map(|r| r.site_url.len()));
    let user_w = column_width("USER", records.iter().map(|r| r.username.len()));
    let mut header = format!("{:<site_w$}  {:<user_w$}  {:<11}", "SITE", "USER", "SCOPE");
    if show_password {
        header.push_str("  PASSWORD");
    }
    println!("{}", header.trim_end());
    for r in records {
        let mut line = format!(
            "{:<site_w$}  {:<user_w$}  {:<11}",
            r.site_url,
            r.username,
            r.scope.as_str()
        );
        if show_password {
            line.push_str("  ");
            line.push_str(r.password.expose_secret());
        }
        println!("{}", line.trim_end());
    }
}

fn column_width(header: &str, values: impl Iterator<Item = usize>) -> usize {
    values.fold(header.len(), usize::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_width_covers_header_and_values() {
        assert_eq!(column_width("SITE", [3usize, 11, 7].into_iter()), 11);
        assert_eq!(column_width("SITE", std::iter::empty()), 4);
    }
}
