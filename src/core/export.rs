//! Report generators
//!
//! Generators only read an already-generated report. Each table is described
//! by column-name/value-extractor pairs; a generator decides how to lay them
//! out. Generator errors are returned as-is and never retried.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::info;

use crate::core::entity::parse_timestamp;
use crate::core::error::TrackerError;
use crate::core::report::{GeneratedReport, ReportSession};
use crate::entities::{ChangeRequest, Project};

/// One column: header plus value extractor
pub struct Column<T> {
    pub name: &'static str,
    pub value: fn(&T) -> String,
}

fn or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

fn created_date(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Columns of the projects table
pub fn project_columns() -> Vec<Column<Project>> {
    vec![
        Column { name: "Project ID", value: |p: &Project| p.code.clone() },
        Column { name: "Project Name", value: |p: &Project| p.name.clone() },
        Column { name: "Department", value: |p: &Project| or_na(p.department.as_deref()) },
        Column { name: "Branch", value: |p: &Project| or_na(p.branch.as_deref()) },
        Column { name: "Priority", value: |p: &Project| p.priority.to_string() },
        Column { name: "Status", value: |p: &Project| p.status.to_string() },
        Column { name: "Logged By", value: |p: &Project| or_na(Some(p.logged_by.as_str())) },
        Column { name: "Created Date", value: |p: &Project| created_date(p.created_at.as_deref()) },
    ]
}

/// Columns of the change requests table
pub fn change_request_columns() -> Vec<Column<ChangeRequest>> {
    vec![
        Column { name: "Project ID", value: |c: &ChangeRequest| or_na(c.project_project_id.as_deref()) },
        Column { name: "Requested Feature", value: |c: &ChangeRequest| c.requested_feature.clone() },
        Column { name: "Impact Level", value: |c: &ChangeRequest| or_na(c.impact_level.as_deref()) },
        Column { name: "Status", value: |c: &ChangeRequest| c.status.to_string() },
        Column { name: "Logged By", value: |c: &ChangeRequest| or_na(Some(c.logged_by.as_str())) },
        Column { name: "Created Date", value: |c: &ChangeRequest| created_date(c.created_at.as_deref()) },
    ]
}

/// A titled table of string cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub title: &'static str,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    fn build<T>(title: &'static str, columns: &[Column<T>], items: &[T]) -> Self {
        Self {
            title,
            headers: columns.iter().map(|c| c.name.to_string()).collect(),
            rows: items
                .iter()
                .map(|item| columns.iter().map(|c| (c.value)(item)).collect())
                .collect(),
        }
    }
}

/// Tables of a report; empty sections are left out
pub fn report_tables(report: &GeneratedReport) -> Vec<ReportTable> {
    let mut tables = Vec::new();
    if !report.data.projects.is_empty() {
        tables.push(ReportTable::build(
            "Projects",
            &project_columns(),
            &report.data.projects,
        ));
    }
    if !report.data.change_requests.is_empty() {
        tables.push(ReportTable::build(
            "Change Requests",
            &change_request_columns(),
            &report.data.change_requests,
        ));
    }
    tables
}

/// Something that turns a generated report into a downloadable file
pub trait ReportGenerator {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn render(&self, report: &GeneratedReport) -> Result<Vec<u8>, TrackerError>;
}

/// Spreadsheet output: one CSV section per table, separated by a blank line
pub struct CsvReport;

impl ReportGenerator for CsvReport {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, report: &GeneratedReport) -> Result<Vec<u8>, TrackerError> {
        let mut out = Vec::new();
        for (i, table) in report_tables(report).iter().enumerate() {
            if i > 0 {
                out.push(b'\n');
            }
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(Vec::new());
            let export_err = |e: csv::Error| TrackerError::Export {
                message: e.to_string(),
            };

            writer.write_record([table.title]).map_err(export_err)?;
            writer.write_record(&table.headers).map_err(export_err)?;
            for row in &table.rows {
                writer.write_record(row).map_err(export_err)?;
            }
            let bytes = writer.into_inner().map_err(|e| TrackerError::Export {
                message: e.to_string(),
            })?;
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }
}

/// Printable output: a Markdown document with a header and one table per section
pub struct MarkdownReport;

impl ReportGenerator for MarkdownReport {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, report: &GeneratedReport) -> Result<Vec<u8>, TrackerError> {
        let mut output = String::new();
        output.push_str("# Project Report\n\n");
        output.push_str(&format!(
            "Generated on: {}\n\n",
            report.generated_at.format("%Y-%m-%d %H:%M")
        ));

        for (label, value) in report.filters.describe() {
            output.push_str(&format!("- **{}:** {}\n", label, value));
        }
        if !report.filters.describe().is_empty() {
            output.push('\n');
        }

        let tables = report_tables(report);
        if tables.is_empty() {
            output.push_str("_No records match the selected filters._\n");
        }

        for table in tables {
            output.push_str(&format!("## {}\n\n", table.title));
            let mut builder = Builder::default();
            builder.push_record(table.headers.clone());
            for row in table.rows {
                builder.push_record(row);
            }
            output.push_str(&builder.build().with(Style::markdown()).to_string());
            output.push_str("\n\n");
        }

        if let Some(total) = report.data.total {
            output.push_str(&format!("**Total:** {}\n", total));
        }

        Ok(output.into_bytes())
    }
}

/// Default file name for an export made on `date`
pub fn default_file_name(generator: &dyn ReportGenerator, date: NaiveDate) -> String {
    format!("Project_Report_{}.{}", date.format("%Y-%m-%d"), generator.extension())
}

/// Render the session's current report and write it to `path`
///
/// Fails with [`TrackerError::NoReport`] when nothing has been generated;
/// no request is ever made from here.
pub fn export_report(
    session: &ReportSession,
    generator: &dyn ReportGenerator,
    path: &Path,
) -> Result<PathBuf, TrackerError> {
    let report = session.current()?;
    let bytes = generator.render(report)?;
    fs::write(path, bytes).map_err(|e| TrackerError::Export {
        message: format!("Could not write {}: {}", path.display(), e),
    })?;
    info!(path = %path.display(), format = generator.extension(), "report exported");
    Ok(path.to_path_buf())
}
