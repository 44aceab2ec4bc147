//! `reqtrack cr` command - Change requests

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::commands::utils::{confirm_deletion, print_upload_note};
use crate::cli::context::Context;
use crate::cli::helpers::{format_timestamp, read_attachments, value_or_prompt};
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Status;
use crate::core::store::parse_change_request_ref;
use crate::core::tracker::Tracker;
use crate::core::workflow::StatusChange;
use crate::entities::{ChangeRequest, ChangeRequestDraft};

#[derive(Subcommand, Debug)]
pub enum CrCommands {
    /// List change requests
    List(ListArgs),

    /// Show a change request's details
    Show(ShowArgs),

    /// Log a change request against an existing project
    New(NewArgs),

    /// Move a change request to another status (administrators only)
    Status(StatusArgs),

    /// Delete a change request (administrators only)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only change requests for this project (id or code)
    #[arg(long, short = 'P')]
    pub project: Option<String>,

    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// Only change requests you logged
    #[arg(long)]
    pub mine: bool,

    /// Wrap long text at this width instead of truncating
    #[arg(long, value_name = "WIDTH")]
    pub wrap: Option<usize>,

    /// Limit output to N items
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Change request id (`12` or `CR-12`)
    pub cr: String,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Project id or code the change applies to
    pub project: String,

    /// What should change
    #[arg(long)]
    pub feature: Option<String>,

    /// Why the change is needed
    #[arg(long)]
    pub reason: Option<String>,

    /// Expected impact (e.g. Low, Medium, High)
    #[arg(long)]
    pub impact: Option<String>,

    /// Files to attach (repeatable)
    #[arg(long = "attach", short = 'a')]
    pub attachments: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Change request id (`12` or `CR-12`)
    pub cr: String,

    /// Target status
    #[arg(long, short = 's')]
    pub status: Status,

    /// Rejection reason (required for `rejected`)
    #[arg(long, short = 'r')]
    pub reason: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Change request id (`12` or `CR-12`)
    pub cr: String,

    /// Confirm that you have read the deletion warning
    #[arg(long)]
    pub acknowledge: bool,

    /// Reason for deletion
    #[arg(long, short = 'r')]
    pub reason: Option<String>,
}

const CR_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("code", "CR", 8),
    ColumnDef::new("project", "PROJECT", 14),
    ColumnDef::new("feature", "REQUESTED FEATURE", 40),
    ColumnDef::new("impact", "IMPACT", 8),
    ColumnDef::new("status", "STATUS", 26),
    ColumnDef::new("logged_by", "LOGGED BY", 12),
    ColumnDef::new("created", "CREATED", 18),
];

fn cr_row(cr: &ChangeRequest) -> TableRow {
    let project = cr
        .project_project_id
        .clone()
        .unwrap_or_else(|| cr.project_id.to_string());
    TableRow::new(cr.display_code())
        .cell("code", CellValue::Id(cr.display_code()))
        .cell("project", CellValue::Text(project))
        .cell("feature", CellValue::Text(cr.requested_feature.clone()))
        .cell(
            "impact",
            cr.impact_level
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
        .cell("status", CellValue::Status(cr.status))
        .cell("logged_by", CellValue::Text(cr.logged_by.clone()))
        .cell("created", CellValue::Timestamp(cr.created_at.clone()))
}

pub async fn run(cmd: CrCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CrCommands::List(args) => run_list(args, global).await,
        CrCommands::Show(args) => run_show(args, global).await,
        CrCommands::New(args) => run_new(args, global).await,
        CrCommands::Status(args) => run_status(args, global).await,
        CrCommands::Delete(args) => run_delete(args, global).await,
    }
}

async fn resolve(tracker: &Tracker, reference: &str) -> Result<ChangeRequest> {
    let mut store = tracker.store().lock().await;
    store.refresh_change_requests().await?;
    Ok(store.resolve_change_request(reference)?)
}

async fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;

    let mut crs = match &args.project {
        Some(reference) => {
            let store = tracker.store().lock().await;
            let project = store.resolve_project(reference).await?;
            tracker.api().change_requests_for_project(project.id).await?
        }
        None => {
            let mut store = tracker.store().lock().await;
            store.refresh_change_requests().await?;
            store.change_requests().to_vec()
        }
    };

    crs.retain(|cr| args.status.is_none_or(|s| cr.status == s));
    if args.mine {
        crs.retain(|cr| cr.logged_by == tracker.identity().f_number);
    }
    if let Some(limit) = args.limit {
        crs.truncate(limit);
    }

    if args.count {
        println!("{}", crs.len());
        return Ok(());
    }

    let format = ctx.format();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&crs).into_diagnostic()?);
        }
        OutputFormat::Table if crs.is_empty() => println!("No change requests found."),
        _ => {
            let config = match args.wrap {
                Some(width) => TableConfig::with_wrap(width),
                None => TableConfig::default(),
            };
            TableFormatter::new(CR_COLUMNS, "change request")
                .with_config(config)
                .output(crs.iter().map(cr_row), format);
        }
    }
    Ok(())
}

async fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let cr = resolve(&tracker, &args.cr).await?;

    match ctx.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cr).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Id => {
            println!("{}", cr.display_code());
            return Ok(());
        }
        _ => {}
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Change Request").bold(), style(cr.display_code()).cyan());
    println!(
        "{}: {} {}",
        style("Project").bold(),
        cr.project_project_id.as_deref().unwrap_or("-"),
        cr.project_name.as_deref().unwrap_or("")
    );
    println!("{}: {}", style("Requested Feature").bold(), cr.requested_feature);
    println!(
        "{}: {}",
        style("Reason").bold(),
        cr.reason_for_change.as_deref().unwrap_or("-")
    );
    println!(
        "{}: {}",
        style("Impact").bold(),
        cr.impact_level.as_deref().unwrap_or("-")
    );
    println!("{}: {}", style("Status").bold(), cr.status.label());
    println!("{}: {}", style("Logged By").bold(), cr.logged_by);
    println!(
        "{}: {}",
        style("Created").bold(),
        format_timestamp(cr.created_at.as_deref())
    );
    if let Some(by) = &cr.updated_by {
        println!(
            "{}: {} ({})",
            style("Updated").bold(),
            format_timestamp(cr.updated_at.as_deref()),
            by
        );
    }
    println!("{}", style("─".repeat(60)).dim());

    if !cr.attachments.is_empty() {
        println!();
        println!("{}", style("Attachments").bold());
        for a in &cr.attachments {
            println!("  [{}] {} ({})", a.id, a.file_name, a.size_display());
        }
    }
    Ok(())
}

async fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let files = read_attachments(&args.attachments)?;
    let tracker = ctx.tracker()?;

    let project = {
        let store = tracker.store().lock().await;
        store.resolve_project(&args.project).await?
    };

    let draft = ChangeRequestDraft {
        project_id: project.id,
        requested_feature: value_or_prompt(args.feature, "Requested feature")?.unwrap_or_default(),
        reason_for_change: value_or_prompt(args.reason, "Reason for change")?.unwrap_or_default(),
        impact_level: args.impact.unwrap_or_default(),
    };

    let created = tracker.create_change_request(&draft, files).await?;
    print_upload_note(created.upload_note.as_deref());

    let cr = created.entity;
    match ctx.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cr).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", cr.display_code()),
        _ if ctx.quiet() => println!("{}", cr.display_code()),
        _ => println!(
            "{} Logged {} against {}",
            style("✓").green(),
            style(cr.display_code()).cyan(),
            style(&project.code).cyan()
        ),
    }
    Ok(())
}

async fn run_status(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let change = StatusChange::new(args.status, args.reason.as_deref())?;
    let id = parse_change_request_ref(&args.cr)?;

    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let updated: ChangeRequest = tracker.change_status(id, &change).await?;

    if !ctx.quiet() {
        println!(
            "{} {} is now {}",
            style("✓").green(),
            style(updated.display_code()).cyan(),
            style(updated.status.label()).bold()
        );
    }
    Ok(())
}

async fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let cr = resolve(&tracker, &args.cr).await?;

    let Some(request) = confirm_deletion(&tracker, &cr, args.acknowledge, args.reason)? else {
        return Ok(());
    };
    tracker.delete(&request).await?;

    if !ctx.quiet() {
        println!(
            "{} Deleted change request {}",
            style("✓").green(),
            style(request.code()).cyan()
        );
    }
    Ok(())
}
