//! Status Workflow Engine
//!
//! Any status may move to any other. The one gate is `REJECTED`, which must
//! carry a non-empty reason; that is checked before anything is sent.

use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::core::api::{ApiClient, StatusPayload};
use crate::core::entity::{EntityKind, Status, TrackedEntity};
use crate::core::error::TrackerError;
use crate::core::latency::with_min_latency;
use crate::core::store::SharedStore;

/// A rejection reason that is known to be non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionReason(String);

impl RejectionReason {
    /// Validate a reason; whitespace-only input is treated as empty
    pub fn new(reason: &str) -> Result<Self, TrackerError> {
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::validation(
                "rejectionReason",
                "A rejection reason is required",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One attempted transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// Move to any status other than `REJECTED`
    Advance(Status),
    /// Move to `REJECTED` with its reason
    Reject(RejectionReason),
}

impl StatusChange {
    /// Build a transition from a target status and an optional reason
    ///
    /// The reason is required for `REJECTED` and ignored otherwise.
    pub fn new(target: Status, reason: Option<&str>) -> Result<Self, TrackerError> {
        match target {
            Status::Rejected => Ok(StatusChange::Reject(RejectionReason::new(
                reason.unwrap_or_default(),
            )?)),
            other => Ok(StatusChange::Advance(other)),
        }
    }

    pub fn target(&self) -> Status {
        match self {
            StatusChange::Advance(status) => *status,
            StatusChange::Reject(_) => Status::Rejected,
        }
    }

    /// Wire payload; an `Advance(Rejected)` without a reason is refused
    fn payload(&self) -> Result<StatusPayload, TrackerError> {
        match self {
            StatusChange::Advance(Status::Rejected) => Err(TrackerError::validation(
                "rejectionReason",
                "A rejection reason is required",
            )),
            StatusChange::Advance(status) => Ok(StatusPayload {
                status: *status,
                rejection_reason: None,
            }),
            StatusChange::Reject(reason) => Ok(StatusPayload {
                status: Status::Rejected,
                rejection_reason: Some(reason.as_str().to_string()),
            }),
        }
    }
}

/// Set of entities with a change in flight
#[derive(Default)]
struct InFlight(Mutex<HashSet<(EntityKind, i64)>>);

impl InFlight {
    fn acquire(this: &Arc<Self>, kind: EntityKind, id: i64) -> Option<InFlightGuard> {
        let mut set = this.0.lock().ok()?;
        if !set.insert((kind, id)) {
            return None;
        }
        Some(InFlightGuard {
            owner: Arc::clone(this),
            key: (kind, id),
        })
    }
}

/// Releases the entity when dropped, including when the caller abandons the future
struct InFlightGuard {
    owner: Arc<InFlight>,
    key: (EntityKind, i64),
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.owner.0.lock() {
            set.remove(&self.key);
        }
    }
}

/// Applies status transitions and keeps the Entity Store in step
pub struct WorkflowEngine {
    api: ApiClient,
    store: SharedStore,
    min_latency: Duration,
    in_flight: Arc<InFlight>,
}

impl WorkflowEngine {
    pub fn new(api: ApiClient, store: SharedStore, min_latency: Duration) -> Self {
        Self {
            api,
            store,
            min_latency,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Apply `change` to the entity with numeric id `id`
    ///
    /// On success the entity's collection is re-fetched and the updated
    /// entity is returned. On failure nothing in the store changes. A second
    /// change for the same entity while one is pending fails with
    /// [`TrackerError::OperationInProgress`].
    pub async fn apply_status_change<E>(&self, id: i64, change: &StatusChange) -> Result<E, TrackerError>
    where
        E: TrackedEntity + DeserializeOwned,
    {
        let payload = change.payload()?;

        let _guard = InFlight::acquire(&self.in_flight, E::KIND, id)
            .ok_or_else(|| TrackerError::OperationInProgress {
                entity: format!("{} {}", E::KIND.label(), id),
            })?;

        let updated: E = with_min_latency(
            self.api.update_status(E::KIND, id, &payload),
            self.min_latency,
        )
        .await?;

        info!(
            kind = %E::KIND,
            id,
            code = %updated.code(),
            status = %change.target(),
            "status updated"
        );

        let mut store = self.store.lock().await;
        if let Err(e) = store.refresh(E::KIND).await {
            warn!(kind = %E::KIND, error = %e, "status applied but refresh failed");
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::EntityStore;
    use crate::core::transport::testing::RecordingTransport;
    use crate::core::transport::{Method, RequestBody};
    use crate::entities::{ChangeRequest, Project};
    use serde_json::json;

    fn engine(transport: &Arc<RecordingTransport>) -> (WorkflowEngine, SharedStore) {
        let api = ApiClient::new(transport.clone()).with_token(Some("t".into()));
        let store = EntityStore::shared(api.clone());
        (
            WorkflowEngine::new(api, Arc::clone(&store), Duration::ZERO),
            store,
        )
    }

    #[test]
    fn test_reject_requires_reason() {
        assert!(StatusChange::new(Status::Rejected, None).is_err());
        assert!(StatusChange::new(Status::Rejected, Some("")).is_err());
        assert!(StatusChange::new(Status::Rejected, Some("   \t")).is_err());

        let err = StatusChange::new(Status::Rejected, Some(" ")).unwrap_err();
        assert_eq!(err.field(), Some("rejectionReason"));
    }

    #[test]
    fn test_reason_ignored_for_other_targets() {
        let change = StatusChange::new(Status::Testing, Some("irrelevant")).unwrap();
        assert_eq!(change, StatusChange::Advance(Status::Testing));
        assert_eq!(change.target(), Status::Testing);
    }

    #[test]
    fn test_any_status_may_follow_any_other() {
        for target in Status::ALL {
            let reason = (target == Status::Rejected).then_some("why");
            assert_eq!(StatusChange::new(target, reason).unwrap().target(), target);
        }
    }

    #[tokio::test]
    async fn test_advance_rejected_without_reason_never_hits_network() {
        let transport = Arc::new(RecordingTransport::new());
        let (engine, _) = engine(&transport);

        let err = engine
            .apply_status_change::<Project>(1, &StatusChange::Advance(Status::Rejected))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation { .. }));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_change_refreshes_collection() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(
            Method::Put,
            "/api/projects/5/status",
            200,
            json!({"id": 5, "projectId": "P5", "status": "REJECTED", "rejectionReason": "Too costly"}),
        );
        transport.on(
            Method::Get,
            "/api/projects",
            200,
            json!([{"id": 5, "projectId": "P5", "status": "REJECTED", "rejectionReason": "Too costly"}]),
        );
        let (engine, store) = engine(&transport);

        let change = StatusChange::new(Status::Rejected, Some("  Too costly ")).unwrap();
        let updated: Project = engine.apply_status_change(5, &change).await.unwrap();
        assert_eq!(updated.rejection_reason(), Some("Too costly"));

        let sent = transport.requests_to(Method::Put, "/api/projects/5/status");
        assert_eq!(
            sent[0].body,
            RequestBody::Json(json!({"status": "REJECTED", "rejectionReason": "Too costly"}))
        );
        assert_eq!(transport.requests_to(Method::Get, "/api/projects").len(), 1);
        assert_eq!(store.lock().await.project(5).unwrap().status, Status::Rejected);
    }

    #[tokio::test]
    async fn test_failed_change_leaves_store_untouched() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(
            Method::Get,
            "/api/change-requests",
            200,
            json!([{"id": 2, "projectId": 1, "status": "TESTING"}]),
        );
        transport.on(
            Method::Put,
            "/api/change-requests/2/status",
            500,
            json!({"message": "Database unavailable"}),
        );
        let (engine, store) = engine(&transport);
        store.lock().await.refresh_change_requests().await.unwrap();

        let change = StatusChange::new(Status::Uat, None).unwrap();
        let err = engine
            .apply_status_change::<ChangeRequest>(2, &change)
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Server { status: Some(500), .. }));
        assert_eq!(
            store.lock().await.change_request(2).unwrap().status,
            Status::Testing
        );
        assert_eq!(transport.requests_to(Method::Get, "/api/change-requests").len(), 1);
    }

    #[tokio::test]
    async fn test_second_change_while_in_flight_is_refused() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Put, "/api/projects/1/status", 200, json!({"id": 1, "status": "QA"}));
        transport.on(Method::Get, "/api/projects", 200, json!([]));
        let api = ApiClient::new(transport.clone());
        let store = EntityStore::shared(api.clone());
        let engine = WorkflowEngine::new(api, store, Duration::from_millis(200));

        let change = StatusChange::new(Status::Qa, None).unwrap();
        let (first, second) = tokio::join!(
            engine.apply_status_change::<Project>(1, &change),
            engine.apply_status_change::<Project>(1, &change),
        );
        let refused = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(TrackerError::OperationInProgress { .. })))
            .count();
        assert_eq!(refused, 1);
        assert!(first.is_ok() || second.is_ok());
        assert_eq!(transport.requests_to(Method::Put, "/api/projects/1/status").len(), 1);

        // released afterwards
        let again = engine.apply_status_change::<Project>(1, &change).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_different_entities_are_independent() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Put, "/api/projects/1/status", 200, json!({"id": 1, "status": "QA"}));
        transport.on(Method::Put, "/api/projects/2/status", 200, json!({"id": 2, "status": "QA"}));
        transport.on(Method::Get, "/api/projects", 200, json!([]));
        let api = ApiClient::new(transport.clone());
        let store = EntityStore::shared(api.clone());
        let engine = WorkflowEngine::new(api, store, Duration::from_millis(50));

        let change = StatusChange::new(Status::Qa, None).unwrap();
        let (a, b) = tokio::join!(
            engine.apply_status_change::<Project>(1, &change),
            engine.apply_status_change::<Project>(2, &change),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_future_releases_entity() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Put, "/api/projects/1/status", 200, json!({"id": 1, "status": "INT"}));
        transport.on(Method::Get, "/api/projects", 200, json!([]));
        let api = ApiClient::new(transport.clone());
        let store = EntityStore::shared(api.clone());
        let engine = WorkflowEngine::new(api, store, Duration::from_secs(60));

        let change = StatusChange::new(Status::Int, None).unwrap();
        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            engine.apply_status_change::<Project>(1, &change),
        )
        .await;
        assert!(abandoned.is_err());

        let fast = WorkflowEngine {
            min_latency: Duration::ZERO,
            ..engine
        };
        assert!(fast.apply_status_change::<Project>(1, &change).await.is_ok());
    }
}
