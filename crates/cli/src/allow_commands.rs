use {
    anyhow::Result,
    clap::Subcommand,
    sitegate_allowlist::{RemoveOutcome, parse_ips},
};

use crate::context::{Context, ScopeArgs};

#[derive(Subcommand)]
pub enum AllowAction {
    /// Replace the allow-list of a site (or `global`).
    Create {
        target: String,
        /// IPs, comma or space separated; may be repeated.
        #[arg(long = "ip", num_args = 1..)]
        ips: Vec<String>,
    },
    /// Add IPs to the allow-list.
    Append {
        target: String,
        #[arg(long = "ip", num_args = 1.., required = true)]
        ips: Vec<String>,
    },
    /// Show the allowed IPs.
    List {
        target: String,
        /// Print JSON instead of one IP per line.
        #[arg(long)]
        json: bool,
    },
    /// Remove IPs, or the whole allow-list with `--ip all` or no `--ip`.
    Remove {
        target: String,
        #[arg(long = "ip", num_args = 1..)]
        ips: Vec<String>,
    },
}

pub async fn handle_allow(action: AllowAction) -> Result<()> {
    let ctx = Context::load()?;
    let allow_lists = ctx.allow_lists();
    match action {
        AllowAction::Create { target, ips } => {
            let requested = parse_ips(&ips)?;
            let resolved = ctx.resolve(&target, ScopeArgs::default()).await?;
            let allowed = allow_lists.create(&resolved, &requested).await?;
            println!(
                "Allow-list for {} set to {} ip(s)",
                resolved.site_url,
                allowed.len()
            );
        },
        AllowAction::Append { target, ips } => {
            let requested = parse_ips(&ips)?;
            let resolved = ctx.resolve(&target, ScopeArgs::default()).await?;
            let allowed = allow_lists.append(&resolved, &requested).await?;
            println!(
                "Allow-list for {} now has {} ip(s)",
                resolved.site_url,
                allowed.len()
            );
        },
        AllowAction::List { target, json } => {
            let resolved = ctx.resolve(&target, ScopeArgs::default()).await?;
            let allowed = allow_lists.list(&resolved)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&allowed)?);
            } else {
                for ip in &allowed {
                    println!("{ip}");
                }
            }
        },
        AllowAction::Remove { target, ips } => {
            let requested = parse_ips(&ips)?;
            let resolved = ctx.resolve(&target, ScopeArgs::default()).await?;
            let outcome = allow_lists.remove(&resolved, &requested).await?;
            print_removed(&resolved.site_url, &outcome);
        },
    }
    Ok(())
}

fn print_removed(site_url: &str, outcome: &RemoveOutcome) {
    if !outcome.not_found.is_empty() {
        eprintln!(
            "warning: not on the allow-list of {site_url}: {}",
            outcome.not_found.join(", ")
        );
    }
    if !outcome.removed.is_empty() {
        println!("Removed from {site_url}: {}", outcome.removed.join(", "));
    }
    if outcome.artifact_deleted {
        println!("Allow-list for {site_url} removed; no ip restriction is configured");
    }
}
