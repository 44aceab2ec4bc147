//! `reqtrack file` command - Attachments

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::context::Context;
use crate::cli::helpers::{read_attachments, write_output};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::api::UploadTarget;
use crate::core::store::parse_change_request_ref;

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// Attach files to a project or change request
    Upload(UploadArgs),

    /// Download an attachment
    Download(FetchArgs),

    /// Fetch an attachment for viewing (written to stdout unless -o is given)
    View(FetchArgs),
}

#[derive(clap::Args, Debug)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["project", "cr"])))]
pub struct UploadArgs {
    /// Project id or code
    #[arg(long, short = 'P')]
    pub project: Option<String>,

    /// Change request id (`12` or `CR-12`)
    #[arg(long)]
    pub cr: Option<String>,

    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Attachment id
    pub id: i64,

    /// Output file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub async fn run(cmd: FileCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FileCommands::Upload(args) => run_upload(args, global).await,
        FileCommands::Download(args) => run_fetch(args, global, false).await,
        FileCommands::View(args) => run_fetch(args, global, true).await,
    }
}

async fn run_upload(args: UploadArgs, global: &GlobalOpts) -> Result<()> {
    let files = read_attachments(&args.files)?;
    let ctx = Context::new(global)?;
    let tracker = ctx.tracker()?;

    let target = match (&args.project, &args.cr) {
        (Some(reference), _) => {
            let store = tracker.store().lock().await;
            UploadTarget::Project(store.resolve_project(reference).await?.id)
        }
        (None, Some(reference)) => UploadTarget::ChangeRequest(parse_change_request_ref(reference)?),
        (None, None) => return Err(miette::miette!("Either --project or --cr is required")),
    };

    let uploaded = tracker.api().upload_files(target, files).await?;

    match ctx.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&uploaded).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for a in &uploaded {
                println!("{}", a.id);
            }
        }
        _ if ctx.quiet() => {}
        _ => {
            for a in &uploaded {
                println!(
                    "{} Uploaded {} [{}] ({})",
                    style("✓").green(),
                    a.file_name,
                    a.id,
                    a.size_display()
                );
            }
        }
    }
    Ok(())
}

async fn run_fetch(args: FetchArgs, global: &GlobalOpts, inline: bool) -> Result<()> {
    let ctx = Context::new(global)?;
    let (api, _) = ctx.authed()?;

    let bytes = if inline {
        api.view_file(args.id).await?
    } else {
        api.download_file(args.id).await?
    };

    let output = match (&args.output, inline) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => None,
        (None, false) => Some(PathBuf::from(format!("attachment-{}", args.id))),
    };
    write_output(&bytes, output.as_deref())
}
