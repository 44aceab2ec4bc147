//! Entity Store - client-side cache of backend collections
//!
//! Collections are only ever replaced wholesale by a fresh fetch. A failed
//! fetch leaves the previous contents in place.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::api::ApiClient;
use crate::core::entity::EntityKind;
use crate::core::error::TrackerError;
use crate::entities::{ChangeRequest, Notification, Project, User};

/// Store shared between the workflow engine and the views
pub type SharedStore = Arc<Mutex<EntityStore>>;

/// Cached collections for the current view
pub struct EntityStore {
    api: ApiClient,
    projects: Vec<Project>,
    deleted_projects: Vec<Project>,
    change_requests: Vec<ChangeRequest>,
    users: Vec<User>,
    notifications: Vec<Notification>,
}

impl EntityStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            projects: Vec::new(),
            deleted_projects: Vec::new(),
            change_requests: Vec::new(),
            users: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn shared(api: ApiClient) -> SharedStore {
        Arc::new(Mutex::new(Self::new(api)))
    }

    /// Re-fetch the collection that holds entities of `kind`
    pub async fn refresh(&mut self, kind: EntityKind) -> Result<(), TrackerError> {
        match kind {
            EntityKind::Project => self.refresh_projects().await,
            EntityKind::ChangeRequest => self.refresh_change_requests().await,
        }
    }

    pub async fn refresh_projects(&mut self) -> Result<(), TrackerError> {
        let fresh = self.api.projects().await?;
        debug!(count = fresh.len(), "projects refreshed");
        self.projects = fresh;
        Ok(())
    }

    pub async fn refresh_deleted_projects(&mut self) -> Result<(), TrackerError> {
        let fresh = self.api.deleted_projects().await?;
        debug!(count = fresh.len(), "deleted projects refreshed");
        self.deleted_projects = fresh;
        Ok(())
    }

    pub async fn refresh_change_requests(&mut self) -> Result<(), TrackerError> {
        let fresh = self.api.change_requests().await?;
        debug!(count = fresh.len(), "change requests refreshed");
        self.change_requests = fresh;
        Ok(())
    }

    pub async fn refresh_users(&mut self) -> Result<(), TrackerError> {
        let fresh = self.api.users().await?;
        debug!(count = fresh.len(), "users refreshed");
        self.users = fresh;
        Ok(())
    }

    pub async fn refresh_notifications(&mut self) -> Result<(), TrackerError> {
        let fresh = self.api.notifications().await?;
        debug!(count = fresh.len(), "notifications refreshed");
        self.notifications = fresh;
        Ok(())
    }

    // Read access

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn deleted_projects(&self) -> &[Project] {
        &self.deleted_projects
    }

    pub fn change_requests(&self) -> &[ChangeRequest] {
        &self.change_requests
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn project(&self, id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Find a project by its human-readable code (case-insensitive)
    pub fn project_by_code(&self, code: &str) -> Option<&Project> {
        let code = code.trim();
        self.projects.iter().find(|p| p.code.eq_ignore_ascii_case(code))
    }

    pub fn change_request(&self, id: i64) -> Option<&ChangeRequest> {
        self.change_requests.iter().find(|c| c.id == id)
    }

    pub fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_by_f_number(&self, f_number: &str) -> Option<&User> {
        let f_number = f_number.trim();
        self.users
            .iter()
            .find(|u| u.f_number.eq_ignore_ascii_case(f_number))
    }

    /// Resolve a project reference: a numeric id or a project code
    ///
    /// The cache is consulted first; otherwise the backend is asked
    /// (`/api/projects/{id}` or `/api/projects/search/{code}`).
    pub async fn resolve_project(&self, reference: &str) -> Result<Project, TrackerError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(TrackerError::validation("project", "Project id is required"));
        }

        if let Ok(id) = reference.parse::<i64>() {
            if let Some(project) = self.project(id) {
                return Ok(project.clone());
            }
            return self.api.project(id).await;
        }

        if let Some(project) = self.project_by_code(reference) {
            return Ok(project.clone());
        }
        self.api.search_project(reference).await
    }

    /// Resolve a change request by numeric id or `CR-<id>`
    pub fn resolve_change_request(&self, reference: &str) -> Result<ChangeRequest, TrackerError> {
        let id = parse_change_request_ref(reference)?;
        self.change_request(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound {
                message: format!("Change request {} not found", reference.trim()),
            })
    }
}

/// Parse `12`, `CR-12` or `cr12` into a numeric id
pub fn parse_change_request_ref(reference: &str) -> Result<i64, TrackerError> {
    let trimmed = reference.trim();
    let digits = trimmed
        .strip_prefix("CR-")
        .or_else(|| trimmed.strip_prefix("cr-"))
        .or_else(|| trimmed.strip_prefix("CR"))
        .or_else(|| trimmed.strip_prefix("cr"))
        .unwrap_or(trimmed);

    digits.parse::<i64>().map_err(|_| {
        TrackerError::validation(
            "changeRequest",
            format!("Invalid change request reference: {}", reference),
        )
    })
}
