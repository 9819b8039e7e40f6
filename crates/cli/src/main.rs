mod allow_commands;
mod auth_commands;
mod config_commands;
mod context;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "sitegate",
    version,
    about = "Basic-auth credentials and IP allow-lists for sites behind a reverse proxy"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/sitegate/).
    #[arg(long, global = true, env = "SITEGATE_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
    /// Custom data directory holding the record store.
    #[arg(long, global = true, env = "SITEGATE_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Basic-auth users per site and scope.
    Auth {
        #[command(subcommand)]
        action: auth_commands::AuthAction,
    },
    /// IP allow-lists per site.
    Allow {
        #[command(subcommand)]
        action: allow_commands::AllowAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output on stdout stays pipeable.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "sitegate starting");

    if let Some(ref dir) = cli.config_dir {
        sitegate_config::set_config_dir(dir.clone());
    }
    if let Some(ref dir) = cli.data_dir {
        sitegate_config::set_data_dir(dir.clone());
    }

    match cli.command {
        Commands::Auth { action } => auth_commands::handle_auth(action).await,
        Commands::Allow { action } => allow_commands::handle_allow(action).await,
        Commands::Config { action } => config_commands::handle_config(action).await,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scope_flags_parse() {
        let cli = Cli::try_parse_from(["sitegate", "auth", "delete", "example.com", "--site"])
            .unwrap();
        match cli.command {
            Commands::Auth {
                action: auth_commands::AuthAction::Delete { scope, user, .. },
            } => {
                assert!(scope.site);
                assert!(!scope.admin_tools);
                assert!(user.is_none());
            },
            _ => panic!("expected auth delete"),
        }
    }

    #[test]
    fn allow_remove_accepts_all_and_no_ips() {
        let cli =
            Cli::try_parse_from(["sitegate", "allow", "remove", "global", "--ip", "all"]).unwrap();
        match cli.command {
            Commands::Allow {
                action: allow_commands::AllowAction::Remove { ips, .. },
            } => assert_eq!(ips, vec!["all"]),
            _ => panic!("expected allow remove"),
        }
        assert!(Cli::try_parse_from(["sitegate", "allow", "remove", "example.com"]).is_ok());
    }

    #[test]
    fn append_requires_ips() {
        assert!(Cli::try_parse_from(["sitegate", "allow", "append", "example.com"]).is_err());
    }
}
