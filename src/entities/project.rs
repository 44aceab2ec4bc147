//! Project entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::{lenient_wire_enum, EntityKind, Priority, Status, TrackedEntity};
use crate::entities::attachment::Attachment;

/// Deletion metadata carried by soft-deleted projects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deletion {
    pub deleted_by: Option<String>,
    pub deleted_at: Option<String>,
    pub reason: Option<String>,
}

/// A tracked project request
///
/// Rejection reason and deletion metadata are normalized on the way in:
/// a project that is not `REJECTED` never exposes a rejection reason, and a
/// project that is not deleted never exposes deletion metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProjectRecord", into = "ProjectRecord")]
pub struct Project {
    /// Server-assigned numeric id
    pub id: i64,
    /// Human-readable code (e.g. "PRJ-0001")
    pub code: String,
    pub name: String,
    pub department: Option<String>,
    pub branch: Option<String>,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    /// Creator F-number
    pub logged_by: String,
    pub logged_by_id: Option<i64>,
    pub updated_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub attachments: Vec<Attachment>,
    rejection_reason: Option<String>,
    deletion: Option<Deletion>,
}

impl Project {
    /// Create a pending project owned by `logged_by`
    pub fn new(id: i64, code: impl Into<String>, name: impl Into<String>, logged_by: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            department: None,
            branch: None,
            description: None,
            priority: Priority::default(),
            status: Status::Pending,
            logged_by: logged_by.into(),
            logged_by_id: None,
            updated_by: None,
            created_at: None,
            updated_at: None,
            attachments: Vec::new(),
            rejection_reason: None,
            deletion: None,
        }
    }

    /// Rejection reason, only present while the project is `REJECTED`
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Deletion metadata, only present on soft-deleted projects
    pub fn deletion(&self) -> Option<&Deletion> {
        self.deletion.as_ref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deletion.is_some()
    }

    /// Move to `REJECTED` with a reason (used when echoing backend state in tests and fixtures)
    pub fn rejected(mut self, reason: impl Into<String>) -> Self {
        self.status = Status::Rejected;
        self.rejection_reason = Some(reason.into());
        self
    }

    /// Mark as soft-deleted
    pub fn deleted(mut self, deletion: Deletion) -> Self {
        self.deletion = Some(deletion);
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }
}

impl TrackedEntity for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> i64 {
        self.id
    }

    fn code(&self) -> String {
        self.code.clone()
    }

    fn status(&self) -> Status {
        self.status
    }

    fn logged_by(&self) -> &str {
        &self.logged_by
    }

    fn created_at_raw(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

/// Wire shape of a project as exchanged with the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProjectRecord {
    id: i64,
    project_id: Option<String>,
    project_name: Option<String>,
    department: Option<String>,
    branch: Option<String>,
    description: Option<String>,
    #[serde(deserialize_with = "lenient_wire_enum")]
    priority_level: Priority,
    #[serde(deserialize_with = "lenient_wire_enum")]
    status: Status,
    logged_by: Option<String>,
    logged_by_id: Option<i64>,
    updated_by: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    rejection_reason: Option<String>,
    is_deleted: Option<bool>,
    deleted_at: Option<String>,
    deleted_by: Option<String>,
    deletion_reason: Option<String>,
    attachments: Option<Vec<Attachment>>,
}

impl From<ProjectRecord> for Project {
    fn from(record: ProjectRecord) -> Self {
        let status = record.status;

        let rejection_reason = match status {
            Status::Rejected => record.rejection_reason.filter(|r| !r.trim().is_empty()),
            _ => None,
        };

        let deletion = match record.is_deleted {
            Some(true) => Some(Deletion {
                deleted_by: record.deleted_by,
                deleted_at: record.deleted_at,
                reason: record.deletion_reason,
            }),
            _ => None,
        };

        Project {
            id: record.id,
            code: record.project_id.unwrap_or_else(|| record.id.to_string()),
            name: record.project_name.unwrap_or_default(),
            department: record.department.filter(|d| !d.is_empty()),
            branch: record.branch.filter(|b| !b.is_empty()),
            description: record.description.filter(|d| !d.is_empty()),
            priority: record.priority_level,
            status,
            logged_by: record.logged_by.unwrap_or_default(),
            logged_by_id: record.logged_by_id,
            updated_by: record.updated_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
            attachments: record.attachments.unwrap_or_default(),
            rejection_reason,
            deletion,
        }
    }
}

impl From<Project> for ProjectRecord {
    fn from(project: Project) -> Self {
        let is_deleted = project.deletion.is_some();
        let deletion = project.deletion.unwrap_or(Deletion {
            deleted_by: None,
            deleted_at: None,
            reason: None,
        });

        ProjectRecord {
            id: project.id,
            project_id: Some(project.code),
            project_name: Some(project.name),
            department: project.department,
            branch: project.branch,
            description: project.description,
            priority_level: project.priority,
            status: project.status,
            logged_by: Some(project.logged_by),
            logged_by_id: project.logged_by_id,
            updated_by: project.updated_by,
            created_at: project.created_at,
            updated_at: project.updated_at,
            rejection_reason: project.rejection_reason,
            is_deleted: Some(is_deleted),
            deleted_at: deletion.deleted_at,
            deleted_by: deletion.deleted_by,
            deletion_reason: deletion.reason,
            attachments: Some(project.attachments),
        }
    }
}

/// Payload for creating or editing a project
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub project_name: String,
    pub department: String,
    pub branch: String,
    pub description: String,
    pub priority_level: Priority,
}

impl ProjectDraft {
    /// A draft with the given name; priority defaults to `MEDIUM`
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            department: String::new(),
            branch: String::new(),
            description: String::new(),
            priority_level: Priority::default(),
        }
    }

    /// Start an edit from the project's current values
    pub fn from_project(project: &Project) -> Self {
        Self {
            project_name: project.name.clone(),
            department: project.department.clone().unwrap_or_default(),
            branch: project.branch.clone().unwrap_or_default(),
            description: project.description.clone().unwrap_or_default(),
            priority_level: project.priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_from_backend_json() {
        let project: Project = serde_json::from_value(json!({
            "id": 12,
            "projectId": "FNBPJ07",
            "projectName": "Card limits",
            "department": "Retail",
            "branch": "",
            "priorityLevel": "HIGH",
            "status": "DISCUSSION",
            "loggedBy": "F1234",
            "createdAt": "2024-05-01T09:30:00",
            "isDeleted": false,
            "attachments": [{"id": 3, "fileName": "spec.pdf", "fileSize": 2048}]
        }))
        .unwrap();

        assert_eq!(project.code, "FNBPJ07");
        assert_eq!(project.name, "Card limits");
        assert_eq!(project.priority, Priority::High);
        assert_eq!(project.status, Status::Discussion);
        assert_eq!(project.branch, None);
        assert_eq!(project.attachments.len(), 1);
        assert!(!project.is_deleted());
    }

    #[test]
    fn test_unrecognized_status_keeps_rest_of_list() {
        let projects: Vec<Project> = serde_json::from_value(json!([
            {"id": 1, "projectId": "P1", "projectName": "a", "status": "ON_HOLD", "priorityLevel": "URGENT"},
            {"id": 2, "projectId": "P2", "projectName": "b", "status": "QA", "priorityLevel": "HIGH"},
            {"id": 3, "projectId": "P3", "projectName": "c", "status": null}
        ]))
        .unwrap();
        assert_eq!(projects.len(), 3);
        assert_eq!(projects[0].status, Status::Pending);
        assert_eq!(projects[0].priority, Priority::Medium);
        assert_eq!(projects[1].status, Status::Qa);
        assert_eq!(projects[1].priority, Priority::High);
        assert_eq!(projects[2].status, Status::Pending);
    }

    #[test]
    fn test_missing_priority_defaults_to_medium() {
        let project: Project = serde_json::from_value(json!({
            "id": 1, "projectId": "P1", "projectName": "x", "status": "PENDING", "loggedBy": "F1"
        }))
        .unwrap();
        assert_eq!(project.priority, Priority::Medium);
    }

    #[test]
    fn test_rejection_reason_dropped_unless_rejected() {
        let accepted: Project = serde_json::from_value(json!({
            "id": 1, "status": "ACCEPTED", "rejectionReason": "stale reason"
        }))
        .unwrap();
        assert_eq!(accepted.rejection_reason(), None);

        let rejected: Project = serde_json::from_value(json!({
            "id": 2, "status": "REJECTED", "rejectionReason": "Out of scope"
        }))
        .unwrap();
        assert_eq!(rejected.rejection_reason(), Some("Out of scope"));
    }

    #[test]
    fn test_deletion_metadata_only_when_deleted() {
        let live: Project = serde_json::from_value(json!({
            "id": 1, "status": "PENDING", "isDeleted": false, "deletionReason": "leftover"
        }))
        .unwrap();
        assert!(live.deletion().is_none());

        let gone: Project = serde_json::from_value(json!({
            "id": 2, "status": "PENDING", "isDeleted": true,
            "deletedBy": "F0001", "deletionReason": "Duplicate"
        }))
        .unwrap();
        let deletion = gone.deletion().unwrap();
        assert_eq!(deletion.deleted_by.as_deref(), Some("F0001"));
        assert_eq!(deletion.reason.as_deref(), Some("Duplicate"));
    }

    #[test]
    fn test_serializes_back_to_wire_names() {
        let project = Project::new(5, "P5", "Name", "F9").rejected("No budget");
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["projectId"], "P5");
        assert_eq!(value["status"], "REJECTED");
        assert_eq!(value["rejectionReason"], "No budget");
        assert_eq!(value["isDeleted"], false);
    }

    #[test]
    fn test_draft_payload() {
        let draft = ProjectDraft::new("Mobile app");
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["projectName"], "Mobile app");
        assert_eq!(value["priorityLevel"], "MEDIUM");
    }
}
