//! Typed client for the tracking backend's REST surface

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::core::dashboard::DashboardStats;
use crate::core::entity::{EntityKind, Status};
use crate::core::error::TrackerError;
use crate::core::report::{ReportData, ReportQuery};
use crate::core::transport::{ApiRequest, ApiResponse, FilePart, Transport};
use crate::entities::{
    ActivityLog, Attachment, ChangeRequest, ChangeRequestDraft, Notification, Project, ProjectDraft,
    User, UserDraft,
};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const PROJECTS_PATH: &str = "/api/projects";
pub const DELETED_PROJECTS_PATH: &str = "/api/projects/deleted";
pub const CHANGE_REQUESTS_PATH: &str = "/api/change-requests";
pub const USERS_PATH: &str = "/api/users";
pub const UPLOAD_PATH: &str = "/api/files/upload";
pub const NOTIFICATIONS_PATH: &str = "/api/notifications";
pub const UNREAD_COUNT_PATH: &str = "/api/notifications/unread-count";
pub const DASHBOARD_PATH: &str = "/api/dashboard";
pub const REPORTS_PATH: &str = "/api/reports";
pub const LOGS_PATH: &str = "/api/logs";

/// Body of a status update: `{status, rejectionReason}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub status: Status,
    pub rejection_reason: Option<String>,
}

/// Which entity an upload is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    Project(i64),
    ChangeRequest(i64),
}

impl UploadTarget {
    fn field(&self) -> (String, String) {
        match self {
            UploadTarget::Project(id) => ("projectId".to_string(), id.to_string()),
            UploadTarget::ChangeRequest(id) => ("changeRequestId".to_string(), id.to_string()),
        }
    }
}

/// REST client bound to a transport and (optionally) a bearer token
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: None,
        }
    }

    /// Same client, authenticated with `token`
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            token,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    async fn call(&self, request: ApiRequest) -> Result<ApiResponse, TrackerError> {
        let request = request.bearer(self.token.clone());
        self.transport.send(request).await?.into_result()
    }

    async fn get_json<T: DeserializeOwned>(&self, path: impl Into<String>) -> Result<T, TrackerError> {
        self.call(ApiRequest::get(path)).await?.json()
    }

    fn to_body<T: Serialize>(payload: &T) -> Result<serde_json::Value, TrackerError> {
        Ok(serde_json::to_value(payload)?)
    }

    // Authentication

    /// Raw login exchange; the session interprets the status code
    pub async fn login(&self, username: &str, password: &str) -> Result<ApiResponse, TrackerError> {
        let request = ApiRequest::post(LOGIN_PATH).json(json!({
            "username": username,
            "password": password,
        }));
        self.transport.send(request).await
    }

    // Projects

    pub async fn projects(&self) -> Result<Vec<Project>, TrackerError> {
        self.get_json(PROJECTS_PATH).await
    }

    pub async fn project(&self, id: i64) -> Result<Project, TrackerError> {
        self.get_json(format!("{}/{}", PROJECTS_PATH, id)).await
    }

    pub async fn deleted_projects(&self) -> Result<Vec<Project>, TrackerError> {
        self.get_json(DELETED_PROJECTS_PATH).await
    }

    /// Look up a project by its human-readable code
    pub async fn search_project(&self, code: &str) -> Result<Project, TrackerError> {
        self.get_json(format!("{}/search/{}", PROJECTS_PATH, code.trim()))
            .await
            .map_err(|e| match e {
                TrackerError::NotFound { .. } => TrackerError::NotFound {
                    message: format!("No project with id {}", code.trim()),
                },
                other => other,
            })
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, TrackerError> {
        let request = ApiRequest::post(PROJECTS_PATH).json(Self::to_body(draft)?);
        self.call(request).await?.json()
    }

    pub async fn update_project(&self, id: i64, draft: &ProjectDraft) -> Result<Project, TrackerError> {
        let request = ApiRequest::put(format!("{}/{}", PROJECTS_PATH, id)).json(Self::to_body(draft)?);
        self.call(request).await?.json()
    }

    /// Soft-delete a project with a reason
    pub async fn delete_project(&self, id: i64, reason: &str) -> Result<(), TrackerError> {
        let request = ApiRequest::delete(format!("{}/{}", PROJECTS_PATH, id))
            .json(json!({ "deletionReason": reason }));
        self.call(request).await.map(|_| ())
    }

    // Status

    /// `PUT /api/{projects|change-requests}/{id}/status`
    pub async fn update_status<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: i64,
        payload: &StatusPayload,
    ) -> Result<T, TrackerError> {
        let path = format!("{}/{}/status", kind.collection_path(), id);
        let request = ApiRequest::put(path).json(Self::to_body(payload)?);
        self.call(request).await?.json()
    }

    // Change requests

    pub async fn change_requests(&self) -> Result<Vec<ChangeRequest>, TrackerError> {
        self.get_json(CHANGE_REQUESTS_PATH).await
    }

    pub async fn change_requests_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<ChangeRequest>, TrackerError> {
        self.get_json(format!("{}/project/{}", CHANGE_REQUESTS_PATH, project_id))
            .await
    }

    pub async fn create_change_request(
        &self,
        draft: &ChangeRequestDraft,
    ) -> Result<ChangeRequest, TrackerError> {
        let request = ApiRequest::post(CHANGE_REQUESTS_PATH).json(Self::to_body(draft)?);
        self.call(request).await?.json()
    }

    /// Hard-delete a change request
    pub async fn delete_change_request(&self, id: i64, reason: &str) -> Result<(), TrackerError> {
        let request = ApiRequest::delete(format!("{}/{}", CHANGE_REQUESTS_PATH, id))
            .json(json!({ "deletionReason": reason }));
        self.call(request).await.map(|_| ())
    }

    // Users

    pub async fn users(&self) -> Result<Vec<User>, TrackerError> {
        self.get_json(USERS_PATH).await
    }

    pub async fn create_user(&self, draft: &UserDraft) -> Result<User, TrackerError> {
        let request = ApiRequest::post(USERS_PATH).json(Self::to_body(draft)?);
        self.call(request).await?.json()
    }

    pub async fn update_user(&self, id: i64, draft: &UserDraft) -> Result<User, TrackerError> {
        let request = ApiRequest::put(format!("{}/{}", USERS_PATH, id)).json(Self::to_body(draft)?);
        self.call(request).await?.json()
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), TrackerError> {
        self.call(ApiRequest::delete(format!("{}/{}", USERS_PATH, id)))
            .await
            .map(|_| ())
    }

    // Files

    pub async fn upload_files(
        &self,
        target: UploadTarget,
        files: Vec<FilePart>,
    ) -> Result<Vec<Attachment>, TrackerError> {
        let request = ApiRequest::post(UPLOAD_PATH).multipart(files, vec![target.field()]);
        self.call(request).await?.json()
    }

    pub async fn download_file(&self, id: i64) -> Result<Vec<u8>, TrackerError> {
        Ok(self
            .call(ApiRequest::get(format!("/api/files/download/{}", id)))
            .await?
            .body)
    }

    pub async fn view_file(&self, id: i64) -> Result<Vec<u8>, TrackerError> {
        Ok(self
            .call(ApiRequest::get(format!("/api/files/view/{}", id)))
            .await?
            .body)
    }

    // Notifications

    pub async fn notifications(&self) -> Result<Vec<Notification>, TrackerError> {
        self.get_json(NOTIFICATIONS_PATH).await
    }

    pub async fn unread_count(&self) -> Result<u64, TrackerError> {
        self.get_json(UNREAD_COUNT_PATH).await
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<(), TrackerError> {
        self.call(ApiRequest::put(format!("{}/{}/read", NOTIFICATIONS_PATH, id)))
            .await
            .map(|_| ())
    }

    // Dashboard, reports, logs

    pub async fn dashboard(&self) -> Result<DashboardStats, TrackerError> {
        let stats: DashboardStats = self.get_json(DASHBOARD_PATH).await?;
        Ok(stats.with_derived_breakdowns())
    }

    pub async fn report(&self, query: &ReportQuery) -> Result<ReportData, TrackerError> {
        let request = ApiRequest::get(REPORTS_PATH).query(query.params().to_vec());
        self.call(request).await?.json()
    }

    /// Activity log for one day, or the latest entries when `date` is empty
    pub async fn logs(&self, date: Option<&str>) -> Result<Vec<ActivityLog>, TrackerError> {
        let query = match date.map(str::trim) {
            Some(d) if !d.is_empty() => vec![("date".to_string(), d.to_string())],
            _ => Vec::new(),
        };
        self.call(ApiRequest::get(LOGS_PATH).query(query)).await?.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::testing::RecordingTransport;
    use crate::core::transport::{Method, RequestBody};

    fn client(transport: &Arc<RecordingTransport>) -> ApiClient {
        ApiClient::new(transport.clone()).with_token(Some("tok".to_string()))
    }

    #[tokio::test]
    async fn test_status_payload_shape() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(
            Method::Put,
            "/api/change-requests/4/status",
            200,
            json!({"id": 4, "projectId": 1, "status": "REJECTED"}),
        );

        let payload = StatusPayload {
            status: Status::Rejected,
            rejection_reason: Some("Not feasible".to_string()),
        };
        let updated: ChangeRequest = client(&transport)
            .update_status(EntityKind::ChangeRequest, 4, &payload)
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Rejected);

        let sent = transport.requests_to(Method::Put, "/api/change-requests/4/status");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].bearer.as_deref(), Some("tok"));
        assert_eq!(
            sent[0].body,
            RequestBody::Json(json!({"status": "REJECTED", "rejectionReason": "Not feasible"}))
        );
    }

    #[tokio::test]
    async fn test_non_reject_status_sends_null_reason() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Put, "/api/projects/9/status", 200, json!({"id": 9, "status": "QA"}));

        let payload = StatusPayload {
            status: Status::Qa,
            rejection_reason: None,
        };
        let _: Project = client(&transport)
            .update_status(EntityKind::Project, 9, &payload)
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(
            sent[0].body,
            RequestBody::Json(json!({"status": "QA", "rejectionReason": null}))
        );
    }

    #[tokio::test]
    async fn test_search_not_found_message() {
        let transport = Arc::new(RecordingTransport::new());
        let err = client(&transport).search_project("PRJ-404").await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { ref message } if message.contains("PRJ-404")));
        assert_eq!(transport.requests()[0].path, "/api/projects/search/PRJ-404");
    }

    #[tokio::test]
    async fn test_delete_project_sends_reason_body() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Delete, "/api/projects/3", 200, json!({"id": 3}));

        client(&transport).delete_project(3, "Duplicate").await.unwrap();
        let sent = transport.requests_to(Method::Delete, "/api/projects/3");
        assert_eq!(sent[0].body, RequestBody::Json(json!({"deletionReason": "Duplicate"})));
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_access_denied() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Delete, "/api/projects/3", 403, json!({}));

        let err = client(&transport).delete_project(3, "x").await.unwrap_err();
        assert!(matches!(err, TrackerError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn test_upload_is_multipart_with_target_field() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Post, UPLOAD_PATH, 200, json!([{"id": 1, "fileName": "a.txt"}]));

        let files = vec![FilePart {
            file_name: "a.txt".into(),
            bytes: b"hello".to_vec(),
        }];
        let saved = client(&transport)
            .upload_files(UploadTarget::ChangeRequest(8), files)
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);

        match &transport.requests()[0].body {
            RequestBody::Multipart { files, fields } => {
                assert_eq!(files.len(), 1);
                assert_eq!(fields, &vec![("changeRequestId".to_string(), "8".to_string())]);
            }
            other => panic!("expected multipart body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_logs_omits_empty_date() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Get, LOGS_PATH, 200, json!([]));

        client(&transport).logs(Some("  ")).await.unwrap();
        client(&transport).logs(Some("2024-05-01")).await.unwrap();

        let sent = transport.requests();
        assert!(sent[0].query.is_empty());
        assert_eq!(sent[1].query, vec![("date".to_string(), "2024-05-01".to_string())]);
    }

    #[tokio::test]
    async fn test_download_returns_raw_bytes() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on_bytes(Method::Get, "/api/files/download/5", 200, vec![0, 159, 146, 150]);

        let bytes = client(&transport).download_file(5).await.unwrap();
        assert_eq!(bytes, vec![0, 159, 146, 150]);
    }
}
