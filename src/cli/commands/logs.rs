//! `reqtrack logs` command - Activity log

use chrono::NaiveDate;
use miette::{IntoDiagnostic, Result};

use crate::cli::context::Context;
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::error::TrackerError;

#[derive(clap::Args, Debug)]
pub struct LogsArgs {
    /// Day to show (YYYY-MM-DD); latest entries when omitted
    #[arg(long, short = 'd')]
    pub date: Option<String>,

    /// Wrap descriptions at this width instead of truncating
    #[arg(long, value_name = "WIDTH")]
    pub wrap: Option<usize>,
}

const LOG_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("when", "WHEN", 18),
    ColumnDef::new("user", "USER", 12),
    ColumnDef::new("action", "ACTION", 22),
    ColumnDef::new("entity", "ENTITY", 18),
    ColumnDef::new("description", "DESCRIPTION", 50),
];

pub async fn run(args: LogsArgs, global: &GlobalOpts) -> Result<()> {
    if let Some(date) = args.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            TrackerError::validation("date", format!("Invalid date '{}', expected YYYY-MM-DD", date))
        })?;
    }

    let ctx = Context::new(global)?;
    let (api, _) = ctx.authed()?;
    let logs = api.logs(args.date.as_deref()).await?;

    let format = ctx.format();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&logs).into_diagnostic()?);
        }
        OutputFormat::Table if logs.is_empty() => println!("No activity recorded."),
        _ => {
            let rows = logs.iter().map(|log| {
                let entity = match (&log.entity_type, log.entity_id) {
                    (Some(t), Some(id)) => format!("{} {}", t, id),
                    (Some(t), None) => t.clone(),
                    _ => String::new(),
                };
                TableRow::new(log.id.to_string())
                    .cell("when", CellValue::Timestamp(log.created_at.clone()))
                    .cell("user", CellValue::Text(log.actor().to_string()))
                    .cell(
                        "action",
                        CellValue::Text(log.action_type.clone().unwrap_or_default()),
                    )
                    .cell("entity", CellValue::Text(entity))
                    .cell(
                        "description",
                        CellValue::Text(log.description.clone().unwrap_or_default()),
                    )
            });
            let config = args.wrap.map(TableConfig::with_wrap).unwrap_or_default();
            TableFormatter::new(LOG_COLUMNS, "log entry")
                .with_config(config)
                .output(rows, format);
        }
    }
    Ok(())
}
