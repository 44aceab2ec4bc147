//! Dashboard totals and chart breakdowns
//!
//! The backend scopes the numbers to the caller's role. Older servers leave
//! the breakdown maps out, in which case they are counted from the project
//! list that came back with the totals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{ChangeRequest, Project};

/// Label -> number of projects
pub type Breakdown = BTreeMap<String, u64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_projects: u64,
    pub new_project_requests: u64,
    pub change_requests: u64,
    pub new_project_requests_list: Vec<Project>,
    pub change_requests_list: Vec<ChangeRequest>,
    pub projects_by_status_map: Breakdown,
    pub projects_by_department_map: Breakdown,
    pub projects_by_priority_map: Breakdown,
}

impl DashboardStats {
    /// Requests of both kinds
    pub fn total_requests(&self) -> u64 {
        self.new_project_requests + self.change_requests
    }

    /// Fill in any breakdown the server did not send
    pub fn with_derived_breakdowns(mut self) -> Self {
        let projects = &self.new_project_requests_list;
        if self.projects_by_status_map.is_empty() {
            self.projects_by_status_map = count_by(projects, |p| Some(p.status.to_string()));
        }
        if self.projects_by_department_map.is_empty() {
            self.projects_by_department_map = count_by(projects, |p| p.department.clone());
        }
        if self.projects_by_priority_map.is_empty() {
            self.projects_by_priority_map = count_by(projects, |p| Some(p.priority.to_string()));
        }
        self
    }
}

/// Count projects per label; blank labels are skipped
fn count_by(projects: &[Project], label: impl Fn(&Project) -> Option<String>) -> Breakdown {
    let mut counts = Breakdown::new();
    for project in projects {
        match label(project) {
            Some(l) if !l.trim().is_empty() => *counts.entry(l.trim().to_string()).or_default() += 1,
            _ => {}
        }
    }
    counts
}
