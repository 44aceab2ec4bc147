//! `reqtrack dashboard` command - Totals and breakdowns

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::commands::project::print_projects;
use crate::cli::context::Context;
use crate::cli::table::TableConfig;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dashboard::{Breakdown, DashboardStats};

#[derive(clap::Args, Debug)]
pub struct DashboardArgs {
    /// Also list the projects behind the totals
    #[arg(long, short = 'l')]
    pub list: bool,
}

pub async fn run(args: DashboardArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::new(global)?;
    let (api, session) = ctx.authed()?;
    let stats = api.dashboard().await?;

    let format = ctx.format();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
        return Ok(());
    }

    let scope = if session.user.is_admin() {
        "all users"
    } else {
        "your requests"
    };
    println!("{} ({})", style("Dashboard").bold(), style(scope).dim());
    println!();
    print_totals(&stats, format);

    for (title, breakdown) in [
        ("By Status", &stats.projects_by_status_map),
        ("By Department", &stats.projects_by_department_map),
        ("By Priority", &stats.projects_by_priority_map),
    ] {
        if breakdown.is_empty() {
            continue;
        }
        println!();
        println!("{}", style(title).bold());
        print_breakdown(breakdown);
    }

    if args.list && !stats.new_project_requests_list.is_empty() {
        println!();
        println!("{}", style("Projects").bold());
        print_projects(&stats.new_project_requests_list, format, TableConfig::default())?;
    }
    Ok(())
}

fn print_totals(stats: &DashboardStats, format: OutputFormat) {
    let mut builder = Builder::default();
    builder.push_record(["Metric", "Count"]);
    builder.push_record(["Total Projects".to_string(), stats.total_projects.to_string()]);
    builder.push_record([
        "New Project Requests".to_string(),
        stats.new_project_requests.to_string(),
    ]);
    builder.push_record(["Change Requests".to_string(), stats.change_requests.to_string()]);
    builder.push_record(["Total Requests".to_string(), stats.total_requests().to_string()]);

    let mut table = builder.build();
    match format {
        OutputFormat::Md => table.with(Style::markdown()),
        _ => table.with(Style::rounded()),
    };
    println!("{}", table);
}

fn print_breakdown(breakdown: &Breakdown) {
    let max = breakdown.values().copied().max().unwrap_or(0).max(1);
    let label_width = breakdown.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    for (label, count) in breakdown {
        let bar = bar_length(*count, max, 30);
        println!(
            "  {:<width$}  {} {}",
            label.replace('_', " "),
            style("█".repeat(bar)).cyan(),
            count,
            width = label_width
        );
    }
}

/// Scale `count` against `max` into a bar of at most `width` cells; non-zero counts get at least one
fn bar_length(count: u64, max: u64, width: usize) -> usize {
    if count == 0 || max == 0 {
        return 0;
    }
    let scaled = (count as f64 / max as f64 * width as f64).round() as usize;
    scaled.clamp(1, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_length() {
        assert_eq!(bar_length(0, 10, 30), 0);
        assert_eq!(bar_length(10, 10, 30), 30);
        assert_eq!(bar_length(5, 10, 30), 15);
        assert_eq!(bar_length(1, 1000, 30), 1);
    }
}
