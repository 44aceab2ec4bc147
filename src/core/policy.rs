//! Lifecycle Policy - who may edit, delete, suspend and manage what
//!
//! Every decision here is a pure function of the entity, the acting user and
//! the current time. The deletion flow is a small state machine whose steps
//! can only be taken in order: warning, acknowledgement, reason, submission.

use chrono::{DateTime, Duration, Utc};

use crate::core::entity::{EntityKind, TrackedEntity};
use crate::core::error::TrackerError;
use crate::core::session::Identity;
use crate::entities::{Project, User};

/// How long after creation the creator may still edit a project
pub fn edit_window() -> Duration {
    Duration::minutes(15)
}

/// True iff `user` created `project` and it is at most 15 minutes old
///
/// Admins get no exemption. A missing or unparseable creation time means
/// the project cannot be edited.
pub fn can_edit(project: &Project, user: &Identity, now: DateTime<Utc>) -> bool {
    if project.logged_by != user.f_number {
        return false;
    }
    match project.created_at() {
        Some(created) => now - created <= edit_window(),
        None => false,
    }
}

/// Time left in the edit window, if it is still open
pub fn edit_time_remaining(project: &Project, now: DateTime<Utc>) -> Option<Duration> {
    let created = project.created_at()?;
    let remaining = created + edit_window() - now;
    (remaining >= Duration::zero()).then_some(remaining)
}

/// Whole minutes shown for a remaining edit window, rounded up
pub fn minutes_left(remaining: Duration) -> i64 {
    let millis = remaining.num_milliseconds().max(0);
    (millis + 59_999) / 60_000
}

/// Only administrators delete, whatever the entity
pub fn can_delete(user: &Identity) -> bool {
    user.is_admin()
}

/// Only administrators move entities through the workflow
pub fn can_change_status(user: &Identity) -> bool {
    user.is_admin()
}

pub fn can_manage_users(user: &Identity) -> bool {
    user.is_admin()
}

/// Administrators may suspend or reactivate other administrator accounts
pub fn can_suspend(actor: &Identity, target: &User) -> bool {
    actor.is_admin() && target.is_admin()
}

/// Fail with `AccessDenied` unless `allowed`
pub fn require(allowed: bool, action: &str) -> Result<(), TrackerError> {
    if allowed {
        Ok(())
    } else {
        Err(TrackerError::AccessDenied {
            message: format!("Only administrators can {}", action),
        })
    }
}

/// Irreversible effects of deleting an entity of `kind`
pub fn deletion_consequences(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Project => &[
            "The project is marked as deleted and hidden from all active lists",
            "The creator is notified with the deletion reason",
            "Change requests and attachments stay linked to the deleted project",
            "The project remains visible in the deleted projects list",
        ],
        EntityKind::ChangeRequest => &[
            "The change request is permanently removed",
            "All attachments of the change request are removed",
            "Its status history is removed",
            "The creator is not notified",
        ],
    }
}

/// Step 1: the warning listing what deletion will do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionWarning {
    kind: EntityKind,
    id: i64,
    code: String,
}

/// Start deleting `entity`; refused for non-administrators
pub fn begin_deletion<E: TrackedEntity>(entity: &E, user: &Identity) -> Result<DeletionWarning, TrackerError> {
    require(can_delete(user), "delete records")?;
    Ok(DeletionWarning {
        kind: E::KIND,
        id: entity.id(),
        code: entity.code(),
    })
}

impl DeletionWarning {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn consequences(&self) -> &'static [&'static str] {
        deletion_consequences(self.kind)
    }

    /// Step 2: the user has read the warning and wants to continue
    pub fn acknowledge(self) -> ReasonEntry {
        ReasonEntry {
            kind: self.kind,
            id: self.id,
            code: self.code,
            reason: String::new(),
        }
    }
}

/// Step 3: collecting the deletion reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonEntry {
    kind: EntityKind,
    id: i64,
    code: String,
    reason: String,
}

impl ReasonEntry {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = reason.into();
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Step 4: validate and produce the request to send
    ///
    /// An empty reason is a field-level error; the entry stays usable so the
    /// user can fill the reason in and try again.
    pub fn submit(&self) -> Result<DeletionRequest, TrackerError> {
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(TrackerError::validation(
                "deletionReason",
                "Deletion reason is required",
            ));
        }
        Ok(DeletionRequest {
            kind: self.kind,
            id: self.id,
            code: self.code.clone(),
            reason: reason.to_string(),
        })
    }
}

/// A validated deletion, only obtainable through the full flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRequest {
    kind: EntityKind,
    id: i64,
    code: String,
    reason: String,
}

impl DeletionRequest {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ChangeRequest, Role};
    use chrono::TimeZone;

    fn admin() -> Identity {
        Identity::new("F0001", Role::Admin)
    }

    fn regular(f: &str) -> Identity {
        Identity::new(f, Role::NormalUser)
    }

    fn created_at(t: DateTime<Utc>) -> Project {
        Project::new(1, "PRJ-0001", "Demo", "F1234").with_created_at(t.to_rfc3339())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_can_edit_inside_window() {
        let project = created_at(t0());
        let owner = regular("F1234");
        for secs in [0, 1, 60, 14 * 60 + 59, 15 * 60] {
            assert!(can_edit(&project, &owner, t0() + Duration::seconds(secs)), "at {}s", secs);
        }
    }

    #[test]
    fn test_can_edit_closes_one_second_after_window() {
        let project = created_at(t0());
        let owner = regular("F1234");
        assert!(!can_edit(&project, &owner, t0() + Duration::seconds(15 * 60 + 1)));
        assert!(!can_edit(&project, &owner, t0() + Duration::hours(3)));
    }

    #[test]
    fn test_can_edit_requires_ownership_even_for_admins() {
        let project = created_at(t0());
        assert!(!can_edit(&project, &regular("F9999"), t0()));
        assert!(!can_edit(&project, &admin(), t0()));

        let admin_owned = Project::new(2, "P2", "x", "F0001").with_created_at(t0().to_rfc3339());
        assert!(can_edit(&admin_owned, &admin(), t0() + Duration::minutes(5)));
        assert!(!can_edit(&admin_owned, &admin(), t0() + Duration::minutes(16)));
    }

    #[test]
    fn test_can_edit_false_without_timestamp() {
        let owner = regular("F1234");
        let missing = Project::new(1, "P", "x", "F1234");
        assert!(!can_edit(&missing, &owner, t0()));

        let garbage = Project::new(1, "P", "x", "F1234").with_created_at("not a date");
        assert!(!can_edit(&garbage, &owner, t0()));
    }

    #[test]
    fn test_minutes_left_rounds_up_partial_minutes() {
        assert_eq!(minutes_left(Duration::zero()), 0);
        assert_eq!(minutes_left(Duration::minutes(10)), 10);
        assert_eq!(minutes_left(Duration::seconds(61)), 2);
        assert_eq!(minutes_left(Duration::milliseconds(1)), 1);
        assert_eq!(minutes_left(Duration::seconds(-5)), 0);
        let project = created_at(t0());
        let left = edit_time_remaining(&project, t0() + Duration::minutes(5)).map(minutes_left);
        assert_eq!(left, Some(10));
    }

    #[test]
    fn test_edit_time_remaining() {
        let project = created_at(t0());
        assert_eq!(
            edit_time_remaining(&project, t0() + Duration::minutes(10)),
            Some(Duration::minutes(5))
        );
        assert_eq!(edit_time_remaining(&project, t0() + Duration::minutes(16)), None);
    }

    #[test]
    fn test_role_gates() {
        assert!(can_delete(&admin()));
        assert!(!can_delete(&regular("F1")));
        assert!(can_manage_users(&admin()));
        assert!(!can_manage_users(&regular("F1")));
        assert!(can_change_status(&admin()));
        assert!(!can_change_status(&regular("F1")));
    }

    #[test]
    fn test_can_suspend_requires_both_admin() {
        let admin_target = User {
            id: 2,
            f_number: "F2".into(),
            role: Role::Admin,
            is_active: true,
        };
        let regular_target = User {
            role: Role::NormalUser,
            ..admin_target.clone()
        };
        assert!(can_suspend(&admin(), &admin_target));
        assert!(!can_suspend(&admin(), &regular_target));
        assert!(!can_suspend(&regular("F3"), &admin_target));
    }

    #[test]
    fn test_deletion_flow_requires_acknowledgement_then_reason() {
        let project = created_at(t0());
        let warning = begin_deletion(&project, &admin()).unwrap();
        assert_eq!(warning.kind(), EntityKind::Project);
        assert!(warning
            .consequences()
            .iter()
            .any(|c| c.contains("notified")));

        let mut entry = warning.acknowledge();
        let err = entry.submit().unwrap_err();
        assert_eq!(err.field(), Some("deletionReason"));

        entry.set_reason("   ");
        assert!(entry.submit().is_err());

        entry.set_reason("  Duplicate of PRJ-0002 ");
        let request = entry.submit().unwrap();
        assert_eq!(request.reason(), "Duplicate of PRJ-0002");
        assert_eq!(request.id(), 1);
        assert_eq!(request.code(), "PRJ-0001");
    }

    #[test]
    fn test_deletion_refused_for_regular_users() {
        let project = created_at(t0());
        let err = begin_deletion(&project, &regular("F1234")).unwrap_err();
        assert!(matches!(err, TrackerError::AccessDenied { .. }));
    }

    #[test]
    fn test_change_request_consequences_differ() {
        let cr = ChangeRequest {
            id: 4,
            project_id: 1,
            project_name: None,
            project_project_id: None,
            requested_feature: "x".into(),
            reason_for_change: None,
            impact_level: None,
            status: Default::default(),
            logged_by: "F1".into(),
            logged_by_id: None,
            updated_by: None,
            created_at: None,
            updated_at: None,
            attachments: Vec::new(),
        };
        let warning = begin_deletion(&cr, &admin()).unwrap();
        assert_eq!(warning.kind(), EntityKind::ChangeRequest);
        assert!(warning
            .consequences()
            .iter()
            .any(|c| c.contains("permanently")));
        assert_ne!(
            deletion_consequences(EntityKind::Project),
            deletion_consequences(EntityKind::ChangeRequest)
        );
    }
}
