//! Change request entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::{lenient_wire_enum, EntityKind, Status, TrackedEntity};
use crate::entities::attachment::Attachment;

/// A modification request scoped to one existing project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub id: i64,

    /// Numeric id of the owning project
    pub project_id: i64,

    /// Name of the owning project
    #[serde(default)]
    pub project_name: Option<String>,

    /// Human-readable code of the owning project
    #[serde(default)]
    pub project_project_id: Option<String>,

    #[serde(default)]
    pub requested_feature: String,

    #[serde(default)]
    pub reason_for_change: Option<String>,

    #[serde(default)]
    pub impact_level: Option<String>,

    #[serde(default, deserialize_with = "lenient_wire_enum")]
    pub status: Status,

    #[serde(default)]
    pub logged_by: String,

    #[serde(default)]
    pub logged_by_id: Option<i64>,

    #[serde(default)]
    pub updated_by: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub attachments: Vec<Attachment>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Attachment>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Attachment>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChangeRequest {
    /// Display code ("CR-12")
    pub fn display_code(&self) -> String {
        format!("CR-{}", self.id)
    }
}

impl TrackedEntity for ChangeRequest {
    const KIND: EntityKind = EntityKind::ChangeRequest;

    fn id(&self) -> i64 {
        self.id
    }

    fn code(&self) -> String {
        self.display_code()
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

/// Payload for creating a change request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestDraft {
    pub project_id: i64,
    pub requested_feature: String,
    pub reason_for_change: String,
    pub impact_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_request_from_backend_json() {
        let cr: ChangeRequest = serde_json::from_value(json!({
            "id": 4,
            "projectId": 12,
            "projectName": "Card limits",
            "projectProjectId": "FNBPJ07",
            "requestedFeature": "Raise daily limit",
            "reasonForChange": "Customer demand",
            "impactLevel": "Medium",
            "status": "UAT",
            "loggedBy": "F1234",
            "createdAt": "2024-05-02T11:00:00",
            "attachments": null
        }))
        .unwrap();

        assert_eq!(cr.project_id, 12);
        assert_eq!(cr.status, Status::Uat);
        assert_eq!(cr.code(), "CR-4");
        assert!(cr.attachments.is_empty());
        assert!(cr.created_at().is_some());
    }

    #[test]
    fn test_unrecognized_status_keeps_rest_of_list() {
        let crs: Vec<ChangeRequest> = serde_json::from_value(json!([
            {"id": 1, "projectId": 12, "status": "PARKED"},
            {"id": 2, "projectId": 12, "status": "released to production"}
        ]))
        .unwrap();
        assert_eq!(crs[0].status, Status::Pending);
        assert_eq!(crs[1].status, Status::ReleasedToProduction);
    }

    #[test]
    fn test_draft_payload_names() {
        let draft = ChangeRequestDraft {
            project_id: 12,
            requested_feature: "Export".into(),
            reason_for_change: String::new(),
            impact_level: "Low".into(),
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["projectId"], 12);
        assert_eq!(value["requestedFeature"], "Export");
        assert_eq!(value["impactLevel"], "Low");
    }
}
