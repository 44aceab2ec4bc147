//! `reqtrack project` command - Project requests

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::commands::utils::{confirm_deletion, print_upload_note};
use crate::cli::context::Context;
use crate::cli::helpers::{format_timestamp, read_attachments};
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{Priority, Status};
use crate::core::policy;
use crate::core::tracker::Tracker;
use crate::core::workflow::StatusChange;
use crate::entities::{Project, ProjectDraft};

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List active projects
    List(ListArgs),

    /// Show a project's details
    Show(ShowArgs),

    /// Look up a project by its code on the server
    Search(SearchArgs),

    /// Log a new project request
    New(NewArgs),

    /// Edit a project (creator only, within 15 minutes of creation)
    Edit(EditArgs),

    /// Move a project to another status (administrators only)
    Status(StatusArgs),

    /// Delete a project (administrators only)
    Delete(DeleteArgs),

    /// List deleted projects
    Deleted(DeletedArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// Filter by priority
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,

    /// Only projects you logged
    #[arg(long)]
    pub mine: bool,

    /// Search in code, name and department (case-insensitive substring)
    #[arg(long)]
    pub search: Option<String>,

    /// Wrap long names at this width instead of truncating
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
    /// Project id or code
    pub project: String,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Project code (e.g. PRJ-0001)
    pub code: String,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Project name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, short = 'd')]
    pub department: Option<String>,

    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Priority level
    #[arg(long, short = 'p', default_value = "medium")]
    pub priority: Priority,

    /// Files to attach (repeatable)
    #[arg(long = "attach", short = 'a')]
    pub attachments: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Project id or code
    pub project: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, short = 'd')]
    pub department: Option<String>,

    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Project id or code
    pub project: String,

    /// Target status
    #[arg(long, short = 's')]
    pub status: Status,

    /// Rejection reason (required for `rejected`)
    #[arg(long, short = 'r')]
    pub reason: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Project id or code
    pub project: String,

    /// Confirm that you have read the deletion warning
    #[arg(long)]
    pub acknowledge: bool,

    /// Reason for deletion (sent to the creator)
    #[arg(long, short = 'r')]
    pub reason: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeletedArgs {
    /// Limit output to N items
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub(crate) const PROJECT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("code", "PROJECT ID", 14),
    ColumnDef::new("name", "NAME", 36),
    ColumnDef::new("department", "DEPARTMENT", 18),
    ColumnDef::new("priority", "PRIORITY", 10),
    ColumnDef::new("status", "STATUS", 26),
    ColumnDef::new("logged_by", "LOGGED BY", 12),
    ColumnDef::new("created", "CREATED", 18),
];

pub(crate) fn project_row(p: &Project) -> TableRow {
    TableRow::new(p.code.clone())
        .cell("code", CellValue::Id(p.code.clone()))
        .cell("name", CellValue::Text(p.name.clone()))
        .cell(
            "department",
            p.department
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
        .cell("priority", CellValue::Priority(p.priority))
        .cell("status", CellValue::Status(p.status))
        .cell("logged_by", CellValue::Text(p.logged_by.clone()))
        .cell("created", CellValue::Timestamp(p.created_at.clone()))
}

pub(crate) fn print_projects(
    projects: &[Project],
    format: OutputFormat,
    config: TableConfig,
) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(projects).into_diagnostic()?);
        return Ok(());
    }
    TableFormatter::new(PROJECT_COLUMNS, "project")
        .with_config(config)
        .output(projects.iter().map(project_row), format);
    Ok(())
}

pub async fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProjectCommands::List(args) => run_list(args, global).await,
        ProjectCommands::Show(args) => run_show(args, global).await,
        ProjectCommands::Search(args) => run_search(args, global).await,
        ProjectCommands::New(args) => run_new(args, global).await,
        ProjectCommands::Edit(args) => run_edit(args, global).await,
        ProjectCommands::Status(args) => run_status(args, global).await,
        ProjectCommands::Delete(args) => run_delete(args, global).await,
        ProjectCommands::Deleted(args) => run_deleted(args, global).await,
    }
}

async fn resolve(tracker: &Tracker, reference: &str) -> Result<Project> {
    let store = tracker.store().lock().await;
    Ok(store.resolve_project(reference).await?)
}

async fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let mut store = tracker.store().lock().await;
    store.refresh_projects().await?;

    let needle = args.search.as_deref().map(str::to_lowercase);
    let mut projects: Vec<Project> = store
        .projects()
        .iter()
        .filter(|p| args.status.is_none_or(|s| p.status == s))
        .filter(|p| args.priority.is_none_or(|pr| p.priority == pr))
        .filter(|p| !args.mine || p.logged_by == tracker.identity().f_number)
        .filter(|p| match &needle {
            Some(n) => {
                p.code.to_lowercase().contains(n)
                    || p.name.to_lowercase().contains(n)
                    || p.department
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(n))
            }
            None => true,
        })
        .cloned()
        .collect();

    if let Some(limit) = args.limit {
        projects.truncate(limit);
    }

    if args.count {
        println!("{}", projects.len());
        return Ok(());
    }

    let format = ctx.format();
    if projects.is_empty() && format == OutputFormat::Table {
        println!("No projects found.");
        return Ok(());
    }

    let config = match args.wrap {
        Some(width) => TableConfig::with_wrap(width),
        None if ctx.quiet() => TableConfig::for_pipe(),
        None => TableConfig::default(),
    };
    print_projects(&projects, format, config)
}

fn print_details(project: &Project, viewer: &crate::core::session::Identity) {
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Project ID").bold(), style(&project.code).cyan());
    println!("{}: {}", style("Name").bold(), project.name);
    println!(
        "{}: {}",
        style("Department").bold(),
        project.department.as_deref().unwrap_or("-")
    );
    println!("{}: {}", style("Branch").bold(), project.branch.as_deref().unwrap_or("-"));
    println!("{}: {}", style("Priority").bold(), project.priority);
    println!("{}: {}", style("Status").bold(), project.status.label());
    if let Some(reason) = project.rejection_reason() {
        println!("{}: {}", style("Rejection Reason").bold().red(), reason);
    }
    println!("{}: {}", style("Logged By").bold(), project.logged_by);
    println!(
        "{}: {}",
        style("Created").bold(),
        format_timestamp(project.created_at.as_deref())
    );
    if let Some(by) = &project.updated_by {
        println!(
            "{}: {} ({})",
            style("Updated").bold(),
            format_timestamp(project.updated_at.as_deref()),
            by
        );
    }
    if let Some(deletion) = project.deletion() {
        println!(
            "{}: {} by {}",
            style("Deleted").bold().red(),
            format_timestamp(deletion.deleted_at.as_deref()),
            deletion.deleted_by.as_deref().unwrap_or("-")
        );
        if let Some(reason) = &deletion.reason {
            println!("{}: {}", style("Deletion Reason").bold(), reason);
        }
    }
    println!("{}", style("─".repeat(60)).dim());

    if let Some(description) = project.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!();
        println!("{}", description);
    }

    if !project.attachments.is_empty() {
        println!();
        println!("{}", style("Attachments").bold());
        for a in &project.attachments {
            println!("  [{}] {} ({})", a.id, a.file_name, a.size_display());
        }
    }

    if policy::can_edit(project, viewer, Utc::now()) {
        if let Some(left) = policy::edit_time_remaining(project, Utc::now()) {
            println!();
            println!(
                "{} Editable for another {} min",
                style("✎").green(),
                policy::minutes_left(left)
            );
        }
    }
}

async fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let project = resolve(&tracker, &args.project).await?;

    match ctx.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&project).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", project.code),
        _ => print_details(&project, tracker.identity()),
    }
    Ok(())
}

async fn run_search(args: SearchArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let project = tracker.api().search_project(&args.code).await?;

    match ctx.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&project).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", project.id),
        _ => print_details(&project, tracker.identity()),
    }
    Ok(())
}

async fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let files = read_attachments(&args.attachments)?;
    let tracker = ctx.tracker()?;

    let name = crate::cli::helpers::value_or_prompt(args.name, "Project name")?;
    let draft = ProjectDraft {
        department: args.department.unwrap_or_default(),
        branch: args.branch.unwrap_or_default(),
        description: args.description.unwrap_or_default(),
        priority_level: args.priority,
        ..ProjectDraft::new(name.unwrap_or_default())
    };

    let created = tracker.create_project(&draft, files).await?;
    print_upload_note(created.upload_note.as_deref());

    let project = created.entity;
    match ctx.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&project).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", project.code),
        _ if ctx.quiet() => println!("{}", project.code),
        _ => println!(
            "{} Logged project {} - {}",
            style("✓").green(),
            style(&project.code).cyan(),
            project.name
        ),
    }
    Ok(())
}

async fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let project = resolve(&tracker, &args.project).await?;

    let mut draft = ProjectDraft::from_project(&project);
    if let Some(name) = args.name {
        draft.project_name = name;
    }
    if let Some(department) = args.department {
        draft.department = department;
    }
    if let Some(branch) = args.branch {
        draft.branch = branch;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if let Some(priority) = args.priority {
        draft.priority_level = priority;
    }

    let updated = tracker.edit_project(&project, &draft).await?;
    if !ctx.quiet() {
        println!(
            "{} Updated project {}",
            style("✓").green(),
            style(&updated.code).cyan()
        );
    }
    Ok(())
}

async fn run_status(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    // Validate before touching the session or the network
    let change = StatusChange::new(args.status, args.reason.as_deref())?;

    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let id = match args.project.trim().parse::<i64>() {
        Ok(id) => id,
        Err(_) => resolve(&tracker, &args.project).await?.id,
    };

    let updated: Project = tracker.change_status(id, &change).await?;
    if !ctx.quiet() {
        println!(
            "{} {} is now {}",
            style("✓").green(),
            style(&updated.code).cyan(),
            style(updated.status.label()).bold()
        );
    }
    Ok(())
}

async fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let project = resolve(&tracker, &args.project).await?;

    let Some(request) = confirm_deletion(&tracker, &project, args.acknowledge, args.reason)? else {
        return Ok(());
    };
    tracker.delete(&request).await?;

    if !ctx.quiet() {
        println!(
            "{} Deleted project {}",
            style("✓").green(),
            style(request.code()).cyan()
        );
    }
    Ok(())
}

async fn run_deleted(args: DeletedArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;
    let mut store = tracker.store().lock().await;
    store.refresh_deleted_projects().await?;

    let mut projects = store.deleted_projects().to_vec();
    if let Some(limit) = args.limit {
        projects.truncate(limit);
    }

    let format = ctx.format();
    if projects.is_empty() && format == OutputFormat::Table {
        println!("No deleted projects.");
        return Ok(());
    }
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&projects).into_diagnostic()?);
        return Ok(());
    }

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("code", "PROJECT ID", 14),
        ColumnDef::new("name", "NAME", 32),
        ColumnDef::new("deleted_by", "DELETED BY", 12),
        ColumnDef::new("deleted_at", "DELETED", 18),
        ColumnDef::new("reason", "REASON", 40),
    ];
    let rows = projects.iter().map(|p| {
        let deletion = p.deletion();
        TableRow::new(p.code.clone())
            .cell("code", CellValue::Id(p.code.clone()))
            .cell("name", CellValue::Text(p.name.clone()))
            .cell(
                "deleted_by",
                CellValue::Text(
                    deletion
                        .and_then(|d| d.deleted_by.clone())
                        .unwrap_or_default(),
                ),
            )
            .cell(
                "deleted_at",
                CellValue::Timestamp(deletion.and_then(|d| d.deleted_at.clone())),
            )
            .cell(
                "reason",
                CellValue::Text(deletion.and_then(|d| d.reason.clone()).unwrap_or_default()),
            )
    });
    TableFormatter::new(COLUMNS, "deleted project").output(rows, format);
    Ok(())
}
