//! Table formatting utilities for CLI list commands
//!
//! Lists of projects, change requests, users, notifications and log entries
//! all go through [`TableFormatter`]. Long text columns can either be
//! truncated or word-wrapped (`TableConfig::with_wrap`); CSV and ID output
//! stay single-line for piping.

use console::style;

use crate::cli::helpers::{escape_csv, format_timestamp, truncate_str};
use crate::cli::OutputFormat;
use crate::core::entity::{Priority, Status};
use crate::entities::Role;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum width for text columns before wrapping (None = truncate instead)
    pub wrap_width: Option<usize>,
    /// Show summary line after table (e.g., "5 project(s) found")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            wrap_width: None,
            show_summary: true,
        }
    }
}

impl TableConfig {
    /// Create config with text wrapping enabled at the specified width
    pub fn with_wrap(width: usize) -> Self {
        Self {
            wrap_width: Some(width),
            show_summary: true,
        }
    }

    /// Create config optimized for piping (no wrapping, no summary)
    pub fn for_pipe() -> Self {
        Self {
            wrap_width: None,
            show_summary: false,
        }
    }
}

/// Wrap text to fit within a maximum width, breaking at word boundaries
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width || max_width < 5 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();
        if !current.is_empty() && current_len + 1 + word_len <= max_width {
            current.push(' ');
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        // Words longer than the line are split hard
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(max_width).peekable();
        while let Some(chunk) = chunks.next() {
            let piece: String = chunk.iter().collect();
            if chunks.peek().is_some() {
                lines.push(piece);
            } else {
                current = piece;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Entity code (cyan)
    Id(String),
    /// Plain text, optionally truncated or wrapped
    Text(String),
    /// Workflow status with color coding
    Status(Status),
    /// Priority with color coding
    Priority(Priority),
    Role(Role),
    /// Account state (active/suspended)
    Active(bool),
    /// Read flag of a notification
    Unread(bool),
    /// Raw backend timestamp, shown in local time
    Timestamp(Option<String>),
    /// Numeric value
    Number(i64),
    /// Empty/placeholder
    Empty,
}

fn status_style(status: Status) -> console::StyledObject<String> {
    let s = status.to_string();
    match status {
        Status::Pending => style(s).yellow(),
        Status::Accepted => style(s).green(),
        Status::Rejected => style(s).red().bold(),
        Status::ReleasedToProduction => style(s).cyan().bold(),
        Status::QaSignOffComplete | Status::ReleaseNotesPrepared => style(s).green(),
        _ => style(s).blue(),
    }
}

impl CellValue {
    /// Format for terminal table output (with colors if terminal)
    pub fn format_table(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Status(status) => {
                format!("{:<width$}", status_style(*status), width = width)
            }
            CellValue::Priority(priority) => {
                let s = priority.to_string();
                let styled = match priority {
                    Priority::Low => style(s).dim(),
                    Priority::Medium => style(s).white(),
                    Priority::High => style(s).red().bold(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Role(role) => {
                let s = role.to_string();
                let styled = match role {
                    Role::Admin => style(s).magenta(),
                    Role::NormalUser => style(s).white(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Active(active) => {
                let styled = if *active {
                    style("active").green()
                } else {
                    style("suspended").red()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Unread(unread) => {
                let styled = if *unread {
                    style("●").yellow().bold()
                } else {
                    style(" ").dim()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Timestamp(_) | CellValue::Empty => {
                format!("{:<width$}", self.raw_or_dash(), width = width)
            }
        }
    }

    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => escape_csv(s),
            CellValue::Unread(unread) => (if *unread { "unread" } else { "read" }).to_string(),
            CellValue::Timestamp(None) | CellValue::Empty => String::new(),
            other => other.raw(),
        }
    }

    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Unread(unread) => (if *unread { "**unread**" } else { "read" }).to_string(),
            other => other.raw_or_dash(),
        };
        raw.replace('|', "\\|")
    }

    fn raw_or_dash(&self) -> String {
        let raw = self.raw();
        if raw.is_empty() {
            "-".to_string()
        } else {
            raw
        }
    }

    /// Unstyled value
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Priority(priority) => priority.to_string(),
            CellValue::Role(role) => role.to_string(),
            CellValue::Active(true) => "active".to_string(),
            CellValue::Active(false) => "suspended".to_string(),
            CellValue::Unread(true) => "●".to_string(),
            CellValue::Unread(false) => String::new(),
            CellValue::Timestamp(None) => String::new(),
            CellValue::Timestamp(Some(raw)) => format_timestamp(Some(raw)),
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Unread(_) => 1,
            CellValue::Empty => 1,
            other => other.raw().chars().count().max(1),
        }
    }
}

/// A column the formatter knows about
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    /// Maximum width
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// One row: the identifier plus keyed cells
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            config: TableConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    fn visible(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter()
    }

    /// Render rows in `format`; `Json` is handled by callers, which own the data
    pub fn render<I>(&self, rows: I, format: OutputFormat) -> String
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();
        match format {
            OutputFormat::Csv => self.render_csv(&rows),
            OutputFormat::Md => self.render_md(&rows),
            OutputFormat::Id => rows.iter().map(|r| format!("{}\n", r.id)).collect(),
            _ => self.render_table(&rows),
        }
    }

    pub fn output<I>(&self, rows: I, format: OutputFormat)
    where
        I: IntoIterator<Item = TableRow>,
    {
        print!("{}", self.render(rows, format));
    }

    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.visible()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                col.header
                    .len()
                    .max(max_content.saturating_add(2))
                    .min(col.width)
            })
            .collect()
    }

    fn render_table(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .visible()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            match self.config.wrap_width {
                Some(wrap) => self.render_row_wrapped(&mut out, row, &widths, wrap),
                None => {
                    let parts: Vec<String> = self
                        .visible()
                        .zip(&widths)
                        .map(|(col, w)| match row.get(col.key) {
                            Some(value) => value.format_table(*w),
                            None => format!("{:<width$}", "-", width = *w),
                        })
                        .collect();
                    out.push_str(parts.join(" ").trim_end());
                    out.push('\n');
                }
            }
        }

        if self.config.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found\n",
                style(rows.len()).cyan(),
                self.entity_name
            ));
        }
        out
    }

    fn render_row_wrapped(&self, out: &mut String, row: &TableRow, widths: &[usize], wrap: usize) {
        let cells: Vec<Vec<String>> = self
            .visible()
            .map(|col| match row.get(col.key) {
                Some(CellValue::Text(s)) => wrap_text(s, wrap),
                Some(value) => vec![value.raw_or_dash()],
                None => vec!["-".to_string()],
            })
            .collect();
        let max_lines = cells.iter().map(Vec::len).max().unwrap_or(1);

        for line in 0..max_lines {
            let parts: Vec<String> = cells
                .iter()
                .zip(widths)
                .map(|(lines, w)| {
                    let content = lines.get(line).map(String::as_str).unwrap_or("");
                    // Wrapped text may exceed the truncation width
                    format!("{:<width$}", content, width = (*w).max(wrap))
                })
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }
        if max_lines > 1 {
            out.push('\n');
        }
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = self.visible().map(|c| c.key).collect();
        out.push_str(&headers.join(","));
        out.push('\n');

        for row in rows {
            let values: Vec<String> = self
                .visible()
                .map(|col| row.get(col.key).map(CellValue::format_csv).unwrap_or_default())
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = self.visible().map(|c| c.header).collect();
        out.push_str(&format!("| {} |\n", headers.join(" | ")));
        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        out.push_str(&format!("|{}|\n", separators.join("|")));

        for row in rows {
            let values: Vec<String> = self
                .visible()
                .map(|col| {
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("id", "ID", 12),
        ColumnDef::new("name", "NAME", 30),
        ColumnDef::new("status", "STATUS", 24),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new("PRJ-0001")
                .cell("id", CellValue::Id("PRJ-0001".into()))
                .cell("name", CellValue::Text("Card limits, phase 2".into()))
                .cell("status", CellValue::Status(Status::QaSignOffInProgress)),
            TableRow::new("PRJ-0002")
                .cell("id", CellValue::Id("PRJ-0002".into()))
                .cell("status", CellValue::Status(Status::Pending)),
        ]
    }

    #[test]
    fn test_cell_value_text_format() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_table(20).contains("Hello World"));
        assert_eq!(cell.format_csv(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_cell_value_status_and_priority() {
        assert_eq!(CellValue::Status(Status::Uat).format_csv(), "UAT");
        assert_eq!(CellValue::Priority(Priority::High).format_md(), "HIGH");
    }

    #[test]
    fn test_cell_value_active_and_unread() {
        assert_eq!(CellValue::Active(false).raw(), "suspended");
        assert_eq!(CellValue::Unread(true).format_csv(), "unread");
        assert_eq!(CellValue::Unread(false).format_md(), "read");
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("a|b|c".to_string());
        assert_eq!(cell.format_md(), "a\\|b\\|c");
    }

    #[test]
    fn test_missing_timestamp() {
        assert_eq!(CellValue::Timestamp(None).format_md(), "-");
        assert_eq!(CellValue::Timestamp(None).format_csv(), "");
    }

    #[test]
    fn test_render_csv() {
        let out = TableFormatter::new(COLUMNS, "project").render(rows(), OutputFormat::Csv);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id,name,status");
        assert_eq!(lines[1], "PRJ-0001,\"Card limits, phase 2\",QA_SIGN_OFF_IN_PROGRESS");
        assert_eq!(lines[2], "PRJ-0002,,PENDING");
    }

    #[test]
    fn test_render_md_and_ids() {
        let formatter = TableFormatter::new(COLUMNS, "project");
        let md = formatter.render(rows(), OutputFormat::Md);
        assert!(md.starts_with("| ID | NAME | STATUS |\n|---|---|---|\n"));
        assert!(md.contains("| PRJ-0002 | - | PENDING |"));

        let ids = formatter.render(rows(), OutputFormat::Id);
        assert_eq!(ids, "PRJ-0001\nPRJ-0002\n");
    }

    #[test]
    fn test_render_table_summary() {
        let out = TableFormatter::new(COLUMNS, "project").render(rows(), OutputFormat::Table);
        assert!(out.contains("PRJ-0001"));
        assert!(out.contains("project(s) found"));

        let piped = TableFormatter::new(COLUMNS, "project")
            .with_config(TableConfig::for_pipe())
            .render(rows(), OutputFormat::Table);
        assert!(!piped.contains("found"));
    }

    #[test]
    fn test_wrap_text_word_boundary() {
        assert_eq!(wrap_text("hello", 20), vec!["hello"]);
        assert_eq!(wrap_text("hello world foo bar", 11), vec!["hello world", "foo bar"]);
    }

    #[test]
    fn test_wrap_text_long_word() {
        let result = wrap_text("supercalifragilisticexpialidocious", 10);
        assert_eq!(result, vec!["supercalif", "ragilistic", "expialidoc", "ious"]);
    }

    #[test]
    fn test_table_config() {
        assert!(TableConfig::default().show_summary);
        assert_eq!(TableConfig::with_wrap(40).wrap_width, Some(40));
        assert!(!TableConfig::for_pipe().show_summary);
    }
}
