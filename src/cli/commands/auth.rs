//! `reqtrack login`, `logout` and `whoami`

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::context::Context;
use crate::cli::helpers::is_interactive;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::session;

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Your F-number
    pub fnumber: String,

    /// Password (prompted for when omitted)
    #[arg(long, env = "REQTRACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

pub async fn run_login(args: LoginArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;

    let password = match args.password {
        Some(p) => p,
        None if is_interactive() => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .into_diagnostic()?,
        None => return Err(miette::miette!("Password required (use --password or a terminal)")),
    };

    let session = session::login(&ctx.api(), &args.fnumber, &password).await?;
    ctx.session_store().save(&session)?;

    if !ctx.quiet() {
        println!(
            "{} Logged in as {} ({})",
            style("✓").green(),
            style(&session.user.f_number).cyan(),
            session.user.role
        );
    }
    Ok(())
}

/// Clears the stored session; the shown-notification set is kept for this device
pub fn run_logout(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let store = ctx.session_store();
    let was_logged_in = store.load()?.is_some();
    store.clear()?;

    if !ctx.quiet() {
        if was_logged_in {
            println!("{} Logged out", style("✓").green());
        } else {
            println!("Not logged in");
        }
    }
    Ok(())
}

pub fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let session = ctx.require_session()?;

    match ctx.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&session.user).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", session.user.f_number),
        _ => {
            println!("{} {}", style("User:").bold(), style(&session.user.f_number).cyan());
            println!("{} {}", style("Role:").bold(), session.user.role);
            println!("{} {}", style("Server:").bold(), ctx.config.server_url());
        }
    }
    Ok(())
}
