//! Report Assembler
//!
//! Normalizes report filters into a query, fetches the report and keeps the
//! last result around for export. The backend does all aggregation; the
//! report body is passed through as received.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::core::api::ApiClient;
use crate::core::entity::{EntityKind, Status};
use crate::core::error::TrackerError;
use crate::core::latency::with_min_latency;
use crate::entities::{ChangeRequest, Project};

/// User-selected report filters; `None` or empty means "no filter"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    /// Inclusive lower bound, ISO date (`2024-01-01`)
    pub date_from: Option<String>,
    /// Inclusive upper bound, ISO date
    pub date_to: Option<String>,
    pub status: Option<Status>,
    /// Creator F-number
    pub user: Option<String>,
    pub project_type: Option<EntityKind>,
}

impl ReportFilters {
    /// Check date formats and ordering
    pub fn validate(&self) -> Result<(), TrackerError> {
        let from = parse_date("dateFrom", self.date_from.as_deref())?;
        let to = parse_date("dateTo", self.date_to.as_deref())?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(TrackerError::validation(
                    "dateTo",
                    "End date must not be before start date",
                ));
            }
        }
        Ok(())
    }

    /// Human-readable summary of the active filters
    pub fn describe(&self) -> Vec<(String, String)> {
        build_report_request(self)
            .params()
            .iter()
            .map(|(k, v)| (filter_label(k).to_string(), v.clone()))
            .collect()
    }
}

fn filter_label(key: &str) -> &str {
    match key {
        "dateFrom" => "Date From",
        "dateTo" => "Date To",
        "status" => "Status",
        "user" => "User",
        "projectType" => "Type",
        other => other,
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, TrackerError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| TrackerError::validation(field, format!("Invalid date '{}', expected YYYY-MM-DD", raw))),
    }
}

/// Normalized report query: only the filters that carry a value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    params: Vec<(String, String)>,
}

impl ReportQuery {
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Turn filters into a query, dropping every unset or empty entry
pub fn build_report_request(filters: &ReportFilters) -> ReportQuery {
    let candidates = [
        ("dateFrom", filters.date_from.clone()),
        ("dateTo", filters.date_to.clone()),
        ("status", filters.status.map(|s| s.as_str().to_string())),
        ("user", filters.user.clone()),
        ("projectType", filters.project_type.map(|k| k.as_str().to_string())),
    ];

    let params = candidates
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value?.trim().to_string();
            (!value.is_empty()).then(|| (key.to_string(), value))
        })
        .collect();

    ReportQuery { params }
}

/// Report body as computed by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportData {
    pub projects: Vec<Project>,
    pub project_count: Option<u64>,
    pub change_requests: Vec<ChangeRequest>,
    pub change_request_count: Option<u64>,
    pub total: Option<u64>,
}

/// A fetched report together with the filters that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReport {
    pub filters: ReportFilters,
    pub data: ReportData,
    pub generated_at: DateTime<Local>,
}

/// Holds the most recent report; exports read from here only
#[derive(Debug, Default)]
pub struct ReportSession {
    current: Option<GeneratedReport>,
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a report for `filters`, replacing any previous one
    ///
    /// The previous report is discarded before the request goes out, so a
    /// failed generation leaves nothing to export.
    pub async fn generate(
        &mut self,
        api: &ApiClient,
        filters: ReportFilters,
        min_latency: Duration,
    ) -> Result<&GeneratedReport, TrackerError> {
        filters.validate()?;
        self.current = None;

        let query = build_report_request(&filters);
        let data = with_min_latency(api.report(&query), min_latency).await?;
        info!(
            projects = data.projects.len(),
            change_requests = data.change_requests.len(),
            "report generated"
        );

        Ok(self.current.insert(GeneratedReport {
            filters,
            data,
            generated_at: Local::now(),
        }))
    }

    /// The last generated report, or [`TrackerError::NoReport`]
    pub fn current(&self) -> Result<&GeneratedReport, TrackerError> {
        self.current.as_ref().ok_or(TrackerError::NoReport)
    }

    /// Seed the session with an already-fetched report
    pub fn load(&mut self, report: GeneratedReport) {
        self.current = Some(report);
    }
}
