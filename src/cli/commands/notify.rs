//! `reqtrack notify` command - Notifications

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::context::Context;
use crate::cli::helpers::{format_timestamp, is_interactive};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::error::TrackerError;
use crate::core::notify::{self, NotificationSurface};
use crate::entities::Notification;

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// Show unread notifications not yet shown on this device
    Check(CheckArgs),

    /// List all notifications
    List(ListArgs),

    /// Mark a notification as read
    Read(ReadArgs),

    /// Print the unread count
    Count,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Mark everything shown as read without asking
    #[arg(long)]
    pub read: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only unread notifications
    #[arg(long, short = 'u')]
    pub unread: bool,
}

#[derive(clap::Args, Debug)]
pub struct ReadArgs {
    /// Notification id
    pub id: i64,
}

const NOTIFICATION_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("unread", "", 2),
    ColumnDef::new("title", "TYPE", 24),
    ColumnDef::new("message", "MESSAGE", 50),
    ColumnDef::new("created", "RECEIVED", 18),
];

fn notification_row(n: &Notification) -> TableRow {
    TableRow::new(n.id.to_string())
        .cell("id", CellValue::Number(n.id))
        .cell("unread", CellValue::Unread(!n.is_read))
        .cell("title", CellValue::Text(n.title().to_string()))
        .cell("message", CellValue::Text(n.message.clone()))
        .cell("created", CellValue::Timestamp(n.created_at.clone()))
}

pub async fn run(cmd: NotifyCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        NotifyCommands::Check(args) => run_check(args, global).await,
        NotifyCommands::List(args) => run_list(args, global).await,
        NotifyCommands::Read(args) => run_read(args, global).await,
        NotifyCommands::Count => run_count(global).await,
    }
}

/// Prints surfaced notifications and asks which ones to mark read
struct TerminalSurface {
    format: OutputFormat,
    quiet: bool,
    read_all: bool,
}

impl TerminalSurface {
    fn print(&self, fresh: &[Notification]) -> Result<(), TrackerError> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(fresh)?),
            OutputFormat::Id => {
                for n in fresh {
                    println!("{}", n.id);
                }
            }
            _ if fresh.is_empty() => {
                if !self.quiet {
                    println!("No new notifications.");
                }
            }
            _ => {
                for n in fresh {
                    println!(
                        "{} {} {}",
                        style("●").blue(),
                        style(n.title()).bold(),
                        style(format_timestamp(n.created_at.as_deref())).dim()
                    );
                    println!("  {}", n.message);
                }
            }
        }
        Ok(())
    }

    fn prompt(&self, fresh: &[Notification]) -> Result<Vec<i64>, TrackerError> {
        let labels: Vec<String> = fresh
            .iter()
            .map(|n| format!("{}: {}", n.title(), n.message))
            .collect();
        let picked = dialoguer::MultiSelect::new()
            .with_prompt("Mark as read (space to select, enter to confirm)")
            .items(&labels)
            .interact()
            .map_err(|e| TrackerError::Storage(std::io::Error::other(e.to_string())))?;
        Ok(picked.into_iter().map(|i| fresh[i].id).collect())
    }
}

impl NotificationSurface for TerminalSurface {
    fn show(&mut self, fresh: &[Notification]) -> Result<Vec<i64>, TrackerError> {
        self.print(fresh)?;
        if fresh.is_empty() {
            return Ok(Vec::new());
        }
        if self.read_all {
            return Ok(fresh.iter().map(|n| n.id).collect());
        }
        if self.format == OutputFormat::Table && is_interactive() {
            return self.prompt(fresh);
        }
        Ok(Vec::new())
    }
}

async fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let (api, _) = ctx.authed()?;
    let mut surface = TerminalSurface {
        format: ctx.format(),
        quiet: ctx.quiet(),
        read_all: args.read,
    };
    let outcome = notify::surface_notifications(&api, &ctx.shown_ids(), &mut surface).await?;

    if !outcome.acknowledged.is_empty() && !ctx.quiet() {
        eprintln!(
            "{} Marked {} notification(s) as read",
            style("✓").green(),
            outcome.acknowledged.len()
        );
    }
    Ok(())
}

async fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let mut store = tracker.store().lock().await;
    store.refresh_notifications().await?;

    let notifications: Vec<Notification> = store
        .notifications()
        .iter()
        .filter(|n| !args.unread || !n.is_read)
        .cloned()
        .collect();

    let format = ctx.format();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&notifications).into_diagnostic()?);
        }
        OutputFormat::Table if notifications.is_empty() => println!("No notifications."),
        _ => TableFormatter::new(NOTIFICATION_COLUMNS, "notification")
            .output(notifications.iter().map(notification_row), format),
    }
    Ok(())
}

async fn run_read(args: ReadArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let notification = {
        let mut store = tracker.store().lock().await;
        store.refresh_notifications().await?;
        store
            .notifications()
            .iter()
            .find(|n| n.id == args.id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound {
                message: format!("Notification {} not found", args.id),
            })?
    };

    notify::mark_read(tracker.api(), &notification).await?;
    if !ctx.quiet() {
        println!("{} Marked notification {} as read", style("✓").green(), args.id);
    }
    Ok(())
}

async fn run_count(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let (api, _) = ctx.authed()?;
    let count = api.unread_count().await?;
    println!("{}", count);
    Ok(())
}
