//! Server-pushed notifications

use serde::{Deserialize, Serialize};

/// Notification category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    ProjectDeleted,
    ProjectUpdated,
    ChangeRequestUpdated,
    StatusUpdate,
    /// Any type this client does not know about yet
    Other(String),
}

impl From<String> for NotificationType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PROJECT_DELETED" => NotificationType::ProjectDeleted,
            "PROJECT_UPDATED" => NotificationType::ProjectUpdated,
            "CHANGE_REQUEST_UPDATED" => NotificationType::ChangeRequestUpdated,
            "STATUS_UPDATE" => NotificationType::StatusUpdate,
            _ => NotificationType::Other(s),
        }
    }
}

impl From<NotificationType> for String {
    fn from(t: NotificationType) -> Self {
        t.to_string()
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::ProjectDeleted => write!(f, "PROJECT_DELETED"),
            NotificationType::ProjectUpdated => write!(f, "PROJECT_UPDATED"),
            NotificationType::ChangeRequestUpdated => write!(f, "CHANGE_REQUEST_UPDATED"),
            NotificationType::StatusUpdate => write!(f, "STATUS_UPDATE"),
            NotificationType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A notification addressed to the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,

    #[serde(default)]
    pub project_id: Option<i64>,

    #[serde(default)]
    pub project_project_id: Option<String>,

    #[serde(default)]
    pub change_request_id: Option<i64>,

    #[serde(default = "unknown_type")]
    pub notification_type: NotificationType,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub is_read: bool,

    #[serde(default)]
    pub created_at: Option<String>,
}

fn unknown_type() -> NotificationType {
    NotificationType::Other(String::new())
}

impl Notification {
    /// Short title for display
    pub fn title(&self) -> &str {
        match self.notification_type {
            NotificationType::ProjectDeleted => "Project deleted",
            NotificationType::ProjectUpdated => "Project updated",
            NotificationType::ChangeRequestUpdated => "Change request updated",
            NotificationType::StatusUpdate => "Status update",
            NotificationType::Other(_) => "Notification",
        }
    }
}
