//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    auth::LoginArgs, completions::CompletionsArgs, config::ConfigCommands, cr::CrCommands,
    dashboard::DashboardArgs, file::FileCommands, logs::LogsArgs, notify::NotifyCommands,
    project::ProjectCommands, report::ReportCommands, user::UserCommands,
};

#[derive(Parser)]
#[command(name = "reqtrack")]
#[command(author, version, about = "Project and change request tracking client")]
#[command(long_about = "Log project and change requests, move them through the status workflow, and generate reports from the tracking backend.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Backend base URL (overrides config and REQTRACK_SERVER)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with your F-number
    Login(LoginArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Project requests
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Change requests
    #[command(subcommand)]
    Cr(CrCommands),

    /// User administration (administrators only)
    #[command(subcommand)]
    User(UserCommands),

    /// Notifications
    #[command(subcommand)]
    Notify(NotifyCommands),

    /// Generate and export reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Totals and breakdowns for your projects
    Dashboard(DashboardArgs),

    /// Activity log
    Logs(LogsArgs),

    /// Attachments
    #[command(subcommand)]
    File(FileCommands),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal, details for single records
    #[default]
    Auto,
    /// Aligned columns
    Table,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Resolve `Auto`, consulting the configured default first
    pub fn resolve(self, configured: Option<&str>) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|name| OutputFormat::from_str(name, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(OutputFormat::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_resolution() {
        assert_eq!(OutputFormat::Auto.resolve(None), OutputFormat::Table);
        assert_eq!(OutputFormat::Auto.resolve(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::Auto.resolve(Some("nonsense")), OutputFormat::Table);
        assert_eq!(OutputFormat::Csv.resolve(Some("json")), OutputFormat::Csv);
    }
}
