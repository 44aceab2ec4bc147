//! `reqtrack user` command - User administration

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::context::Context;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::error::TrackerError;
use crate::core::policy;
use crate::core::tracker::Tracker;
use crate::entities::{Role, User};

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List user accounts
    List,

    /// Create a user account
    New(NewArgs),

    /// Change a user's role
    Role(RoleArgs),

    /// Suspend an active administrator, or reactivate a suspended one
    Suspend(TargetArgs),

    /// Delete a user account
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// F-number for the new account
    pub fnumber: String,

    #[arg(long, short = 'r', default_value = "normal-user")]
    pub role: Role,
}

#[derive(clap::Args, Debug)]
pub struct RoleArgs {
    /// F-number of the user
    pub fnumber: String,

    /// New role
    pub role: Role,
}

#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// F-number of the user
    pub fnumber: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// F-number of the user
    pub fnumber: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const USER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("fnumber", "F-NUMBER", 14),
    ColumnDef::new("role", "ROLE", 12),
    ColumnDef::new("active", "STATE", 10),
];

pub async fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    policy::require(policy::can_manage_users(tracker.identity()), "manage users")?;

    match cmd {
        UserCommands::List => run_list(&ctx, &tracker).await,
        UserCommands::New(args) => run_new(&ctx, &tracker, args).await,
        UserCommands::Role(args) => run_role(&ctx, &tracker, args).await,
        UserCommands::Suspend(args) => run_suspend(&ctx, &tracker, args).await,
        UserCommands::Delete(args) => run_delete(&ctx, &tracker, args).await,
    }
}

async fn find_user(tracker: &Tracker, f_number: &str) -> Result<User> {
    let mut store = tracker.store().lock().await;
    store.refresh_users().await?;
    let user = store
        .user_by_f_number(f_number)
        .cloned()
        .ok_or_else(|| TrackerError::NotFound {
            message: format!("No user with F-number {}", f_number.trim()),
        })?;
    Ok(user)
}

async fn run_list(ctx: &Context, tracker: &Tracker) -> Result<()> {
    let mut store = tracker.store().lock().await;
    store.refresh_users().await?;
    let users = store.users();

    let format = ctx.format();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(users).into_diagnostic()?);
        return Ok(());
    }

    let rows = users.iter().map(|u| {
        TableRow::new(u.f_number.clone())
            .cell("id", CellValue::Number(u.id))
            .cell("fnumber", CellValue::Id(u.f_number.clone()))
            .cell("role", CellValue::Role(u.role))
            .cell("active", CellValue::Active(u.is_active))
    });
    TableFormatter::new(USER_COLUMNS, "user").output(rows, format);
    Ok(())
}

async fn run_new(ctx: &Context, tracker: &Tracker, args: NewArgs) -> Result<()> {
    let user = tracker.create_user(&args.fnumber, args.role).await?;
    if ctx.format() == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&user).into_diagnostic()?);
    } else if !ctx.quiet() {
        println!(
            "{} Created {} ({})",
            style("✓").green(),
            style(&user.f_number).cyan(),
            user.role
        );
    }
    Ok(())
}

async fn run_role(ctx: &Context, tracker: &Tracker, args: RoleArgs) -> Result<()> {
    let user = find_user(tracker, &args.fnumber).await?;
    let updated = tracker.set_role(&user, args.role).await?;
    if !ctx.quiet() {
        println!(
            "{} {} is now {}",
            style("✓").green(),
            style(&updated.f_number).cyan(),
            updated.role
        );
    }
    Ok(())
}

async fn run_suspend(ctx: &Context, tracker: &Tracker, args: TargetArgs) -> Result<()> {
    let user = find_user(tracker, &args.fnumber).await?;
    let updated = tracker.toggle_suspend(&user).await?;
    if !ctx.quiet() {
        let state = if updated.is_active { "reactivated" } else { "suspended" };
        println!(
            "{} {} {}",
            style("✓").green(),
            style(&updated.f_number).cyan(),
            state
        );
    }
    Ok(())
}

async fn run_delete(ctx: &Context, tracker: &Tracker, args: DeleteArgs) -> Result<()> {
    let user = find_user(tracker, &args.fnumber).await?;

    if !args.yes {
        if !crate::cli::helpers::is_interactive() {
            return Err(miette::miette!(
                help = "Re-run with --yes to confirm",
                "Refusing to delete {} without confirmation",
                user.f_number
            ));
        }
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete user {}?", user.f_number))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !proceed {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    tracker.delete_user(&user).await?;
    if !ctx.quiet() {
        println!("{} Deleted {}", style("✓").green(), style(&user.f_number).cyan());
    }
    Ok(())
}
