//! Tracker - the operations a signed-in user can perform
//!
//! Every mutation checks the Lifecycle Policy first, goes through the latency
//! floor, and ends with a re-fetch of the affected collection.

use chrono::Utc;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::api::{ApiClient, UploadTarget};
use crate::core::entity::{EntityKind, TrackedEntity};
use crate::core::error::TrackerError;
use crate::core::latency::with_min_latency;
use crate::core::policy::{self, DeletionRequest, DeletionWarning};
use crate::core::session::Identity;
use crate::core::store::{EntityStore, SharedStore};
use crate::core::transport::FilePart;
use crate::core::workflow::{StatusChange, WorkflowEngine};
use crate::entities::{
    ChangeRequest, ChangeRequestDraft, Project, ProjectDraft, Role, User, UserDraft,
};

/// Result of a create: the new entity plus a note when attachments failed
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub entity: T,
    pub upload_note: Option<String>,
}

pub struct Tracker {
    api: ApiClient,
    identity: Identity,
    store: SharedStore,
    workflow: WorkflowEngine,
    min_latency: Duration,
}

impl Tracker {
    pub fn new(api: ApiClient, identity: Identity, min_latency: Duration) -> Self {
        let store = EntityStore::shared(api.clone());
        let workflow = WorkflowEngine::new(api.clone(), Arc::clone(&store), min_latency);
        Self {
            api,
            identity,
            store,
            workflow,
            min_latency,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    async fn refresh(&self, kind: EntityKind) {
        let mut store = self.store.lock().await;
        if let Err(e) = store.refresh(kind).await {
            warn!(kind = %kind, error = %e, "refresh after mutation failed");
        }
    }

    /// Upload after a create; failure is reported, never fatal
    async fn attach(&self, target: UploadTarget, files: Vec<FilePart>) -> Option<String> {
        if files.is_empty() {
            return None;
        }
        let count = files.len();
        match self.api.upload_files(target, files).await {
            Ok(_) => None,
            Err(e) => {
                warn!(?target, error = %e, "attachment upload failed");
                Some(format!("{} attachment(s) could not be uploaded: {}", count, e))
            }
        }
    }

    // Projects

    pub async fn create_project(
        &self,
        draft: &ProjectDraft,
        files: Vec<FilePart>,
    ) -> Result<Created<Project>, TrackerError> {
        if draft.project_name.trim().is_empty() {
            return Err(TrackerError::validation("projectName", "Project name is required"));
        }

        let project = with_min_latency(self.api.create_project(draft), self.min_latency).await?;
        info!(id = project.id, code = %project.code, "project created");

        let upload_note = self.attach(UploadTarget::Project(project.id), files).await;
        self.refresh(EntityKind::Project).await;
        Ok(Created {
            entity: project,
            upload_note,
        })
    }

    /// Edit a project inside its creator's edit window
    pub async fn edit_project(
        &self,
        project: &Project,
        draft: &ProjectDraft,
    ) -> Result<Project, TrackerError> {
        if project.logged_by != self.identity.f_number {
            return Err(TrackerError::AccessDenied {
                message: "Only the creator can edit a project".to_string(),
            });
        }
        if !policy::can_edit(project, &self.identity, Utc::now()) {
            return Err(TrackerError::validation(
                "createdAt",
                "Projects can only be edited within 15 minutes of creation",
            ));
        }
        if draft.project_name.trim().is_empty() {
            return Err(TrackerError::validation("projectName", "Project name is required"));
        }

        let updated = with_min_latency(
            self.api.update_project(project.id, draft),
            self.min_latency,
        )
        .await?;
        info!(id = updated.id, code = %updated.code, "project updated");
        self.refresh(EntityKind::Project).await;
        Ok(updated)
    }

    // Change requests

    pub async fn create_change_request(
        &self,
        draft: &ChangeRequestDraft,
        files: Vec<FilePart>,
    ) -> Result<Created<ChangeRequest>, TrackerError> {
        if draft.project_id <= 0 {
            return Err(TrackerError::validation("projectId", "Project is required"));
        }
        if draft.requested_feature.trim().is_empty() {
            return Err(TrackerError::validation(
                "requestedFeature",
                "Requested feature is required",
            ));
        }

        let cr = with_min_latency(self.api.create_change_request(draft), self.min_latency).await?;
        info!(id = cr.id, project = cr.project_id, "change request created");

        let upload_note = self.attach(UploadTarget::ChangeRequest(cr.id), files).await;
        self.refresh(EntityKind::ChangeRequest).await;
        Ok(Created {
            entity: cr,
            upload_note,
        })
    }

    // Workflow

    pub async fn change_status<E>(&self, id: i64, change: &StatusChange) -> Result<E, TrackerError>
    where
        E: TrackedEntity + DeserializeOwned,
    {
        policy::require(policy::can_change_status(&self.identity), "change status")?;
        self.workflow.apply_status_change(id, change).await
    }

    // Deletion

    pub fn begin_deletion<E: TrackedEntity>(&self, entity: &E) -> Result<DeletionWarning, TrackerError> {
        policy::begin_deletion(entity, &self.identity)
    }

    /// Send a deletion that went through warning, acknowledgement and reason
    pub async fn delete(&self, request: &DeletionRequest) -> Result<(), TrackerError> {
        policy::require(policy::can_delete(&self.identity), "delete records")?;

        let call = async {
            match request.kind() {
                EntityKind::Project => self.api.delete_project(request.id(), request.reason()).await,
                EntityKind::ChangeRequest => {
                    self.api
                        .delete_change_request(request.id(), request.reason())
                        .await
                }
            }
        };
        with_min_latency(call, self.min_latency).await?;
        info!(kind = %request.kind(), code = request.code(), "deleted");

        self.refresh(request.kind()).await;
        if request.kind() == EntityKind::Project {
            let mut store = self.store.lock().await;
            if let Err(e) = store.refresh_deleted_projects().await {
                warn!(error = %e, "deleted-projects refresh failed");
            }
        }
        Ok(())
    }

    // Users

    async fn refresh_users(&self) {
        let mut store = self.store.lock().await;
        if let Err(e) = store.refresh_users().await {
            warn!(error = %e, "user refresh failed");
        }
    }

    pub async fn create_user(&self, f_number: &str, role: Role) -> Result<User, TrackerError> {
        policy::require(policy::can_manage_users(&self.identity), "manage users")?;
        let f_number = f_number.trim();
        if f_number.is_empty() {
            return Err(TrackerError::validation("fNumber", "F-number is required"));
        }

        let draft = UserDraft {
            f_number: f_number.to_string(),
            role,
            is_active: true,
        };
        let user = with_min_latency(self.api.create_user(&draft), self.min_latency).await?;
        info!(user = %user.f_number, role = %user.role, "user created");
        self.refresh_users().await;
        Ok(user)
    }

    pub async fn set_role(&self, user: &User, role: Role) -> Result<User, TrackerError> {
        policy::require(policy::can_manage_users(&self.identity), "manage users")?;
        let updated = with_min_latency(
            self.api.update_user(user.id, &UserDraft::with_role(user, role)),
            self.min_latency,
        )
        .await?;
        info!(user = %updated.f_number, role = %updated.role, "role changed");
        self.refresh_users().await;
        Ok(updated)
    }

    /// Suspend an active administrator or reactivate a suspended one
    pub async fn toggle_suspend(&self, user: &User) -> Result<User, TrackerError> {
        if !policy::can_suspend(&self.identity, user) {
            return Err(TrackerError::AccessDenied {
                message: "Only administrator accounts can be suspended, and only by administrators"
                    .to_string(),
            });
        }
        let updated = with_min_latency(
            self.api.update_user(user.id, &UserDraft::toggled(user)),
            self.min_latency,
        )
        .await?;
        info!(user = %updated.f_number, active = updated.is_active, "account state changed");
        self.refresh_users().await;
        Ok(updated)
    }

    pub async fn delete_user(&self, user: &User) -> Result<(), TrackerError> {
        policy::require(policy::can_manage_users(&self.identity), "manage users")?;
        with_min_latency(self.api.delete_user(user.id), self.min_latency).await?;
        info!(user = %user.f_number, "user deleted");
        self.refresh_users().await;
        Ok(())
    }
}
