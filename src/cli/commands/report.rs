//! `reqtrack report` command - Generate and export reports

use chrono::Local;
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::context::Context;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{EntityKind, Status};
use crate::core::export::{self, CsvReport, MarkdownReport, ReportGenerator};
use crate::core::report::{GeneratedReport, ReportFilters, ReportSession};

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Generate a report, optionally exporting it to a file
    Generate(GenerateArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Spreadsheet-friendly CSV
    Csv,
    /// Printable Markdown document
    Md,
}

impl ExportFormat {
    fn generator(self) -> &'static dyn ReportGenerator {
        match self {
            ExportFormat::Csv => &CsvReport,
            ExportFormat::Md => &MarkdownReport,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Start date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// End date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Only requests in this status
    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// Only requests logged by this F-number
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// Only projects or only change requests
    #[arg(long = "type", short = 't')]
    pub project_type: Option<EntityKind>,

    /// Export the report in this format
    #[arg(long, short = 'e')]
    pub export: Option<ExportFormat>,

    /// Export file (default: Project_Report_<date>.<ext>)
    #[arg(long, short = 'o', requires = "export")]
    pub output: Option<PathBuf>,
}

pub async fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Generate(args) => run_generate(args, global).await,
    }
}

async fn run_generate(args: GenerateArgs, global: &GlobalOpts) -> Result<()> {
    let filters = ReportFilters {
        date_from: args.from,
        date_to: args.to,
        status: args.status,
        user: args.user,
        project_type: args.project_type,
    };
    filters.validate()?;

    let ctx = Context::new(global)?;
    let (api, _) = ctx.authed()?;

    let mut session = ReportSession::new();
    session.generate(&api, filters, ctx.min_latency()).await?;
    let report = session.current()?;

    match ctx.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report.data).into_diagnostic()?);
        }
        OutputFormat::Csv => print!("{}", render_utf8(&CsvReport, report)?),
        OutputFormat::Md => print!("{}", render_utf8(&MarkdownReport, report)?),
        _ => print_summary(report),
    }

    if let Some(format) = args.export {
        let generator = format.generator();
        let path = args.output.unwrap_or_else(|| {
            PathBuf::from(export::default_file_name(generator, Local::now().date_naive()))
        });
        let written = export::export_report(&session, generator, &path)?;
        eprintln!(
            "{} Exported report to {}",
            style("✓").green(),
            style(written.display()).cyan()
        );
    }
    Ok(())
}

fn render_utf8(generator: &dyn ReportGenerator, report: &GeneratedReport) -> Result<String> {
    let bytes = generator.render(report)?;
    String::from_utf8(bytes).into_diagnostic()
}

fn print_summary(report: &GeneratedReport) {
    println!("{}", style("Project Report").bold());
    println!(
        "{}",
        style(format!(
            "Generated {}",
            report.generated_at.format("%Y-%m-%d %H:%M")
        ))
        .dim()
    );
    for (label, value) in report.filters.describe() {
        println!("  {}: {}", label, value);
    }
    println!();

    let tables = export::report_tables(report);
    if tables.is_empty() {
        println!("No records match the selected filters.");
    }
    for table in tables {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(table.headers.clone());
        for row in table.rows {
            builder.push_record(row);
        }
        println!("{}", style(table.title).bold());
        println!(
            "{}",
            builder.build().with(tabled::settings::Style::rounded())
        );
        println!();
    }

    if let Some(total) = report.data.total {
        println!("{} {}", style("Total:").bold(), total);
    }
}
