use {anyhow::Result, clap::Subcommand};

use sitegate_config::validate::{self, Diagnostic, Severity};

use crate::context::Context;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show {
        /// Print JSON instead of TOML.
        #[arg(long)]
        json: bool,
    },
    /// Validate the config file; fails when it has errors.
    Check {
        /// Include informational diagnostics.
        #[arg(long)]
        verbose: bool,
    },
    /// Write a commented default config file.
    Init,
}

pub async fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { json } => show(json),
        ConfigAction::Check { verbose } => check(verbose),
        ConfigAction::Init => init(),
    }
}

fn show(json: bool) -> Result<()> {
    let ctx = Context::load()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    } else {
        print!("{}", toml::to_string_pretty(&ctx.config)?);
    }
    eprintln!(
        "\nrecord store: {}",
        sitegate_config::database_path(&ctx.config).display()
    );
    Ok(())
}

fn init() -> Result<()> {
    let path = sitegate_config::find_or_default_config_path();
    sitegate_config::template::write_default_config(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn check(verbose: bool) -> Result<()> {
    let result = validate::validate(None);
    match &result.config_path {
        Some(path) => eprintln!("config: {}", path.display()),
        None => eprintln!("config: no file found, defaults apply"),
    }

    result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .for_each(|d| eprintln!("{}", render(d)));

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if result.has_errors() {
        anyhow::bail!("configuration has {errors} error(s), {warnings} warning(s)");
    }
    if warnings > 0 {
        eprintln!("{warnings} warning(s)");
    } else {
        eprintln!("configuration ok");
    }
    Ok(())
}

fn render(d: &Diagnostic) -> String {
    if d.path.is_empty() {
        format!("  {:<7} [{}] {}", d.severity, d.category, d.message)
    } else {
        format!(
            "  {:<7} [{}] {}: {}",
            d.severity, d.category, d.path, d.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_path_when_present() {
        let d = Diagnostic {
            severity: Severity::Warning,
            category: "security",
            path: "auth.generated_password_length".into(),
            message: "short generated passwords".into(),
        };
        assert_eq!(
            render(&d),
            "  warning [security] auth.generated_password_length: short generated passwords"
        );
    }

    #[test]
    fn render_without_path() {
        let d = Diagnostic {
            severity: Severity::Error,
            category: "syntax",
            path: String::new(),
            message: "expected `=`".into(),
        };
        assert_eq!(render(&d), "  error   [syntax] expected `=`");
    }
}
