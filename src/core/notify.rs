//! Notification Deduplicator
//!
//! Decides which unread notifications are new to this device and remembers
//! every id it has surfaced. The shown-id set is stored per device in the
//! data directory and is never synced; membership is permanent.
//!
//! Display is left to a [`NotificationSurface`]. It answers with the items
//! the user acknowledged, and each of those is marked read on the server.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::api::ApiClient;
use crate::core::error::TrackerError;
use crate::entities::Notification;

/// Ids already surfaced on this device
pub type ShownIds = BTreeSet<i64>;

/// Pick the notifications to surface now and the updated shown-id set
///
/// Only unread notifications whose id has never been shown are returned.
/// When nothing is new the set comes back unchanged.
pub fn next_notifications_to_surface(
    all: &[Notification],
    previously_shown: &ShownIds,
) -> (Vec<Notification>, ShownIds) {
    let new_ones: Vec<Notification> = all
        .iter()
        .filter(|n| !n.is_read)
        .filter(|n| !previously_shown.contains(&n.id))
        .cloned()
        .collect();

    if new_ones.is_empty() {
        return (Vec::new(), previously_shown.clone());
    }

    let mut updated = previously_shown.clone();
    updated.extend(new_ones.iter().map(|n| n.id));
    (new_ones, updated)
}

/// Durable shown-id set (`shown_notifications.json`)
///
/// Concurrent processes may overwrite each other's additions; the last
/// writer wins.
#[derive(Debug, Clone)]
pub struct ShownIdStore {
    path: PathBuf,
}

impl ShownIdStore {
    pub const FILE_NAME: &'static str = "shown_notifications.json";

    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the set; a missing or corrupt file reads as empty
    pub fn load(&self) -> ShownIds {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return ShownIds::new();
        };
        match serde_json::from_str::<Vec<i64>>(&contents) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "ignoring corrupt shown-id file");
                ShownIds::new()
            }
        }
    }

    pub fn save(&self, ids: &ShownIds) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let list: Vec<i64> = ids.iter().copied().collect();
        fs::write(&self.path, serde_json::to_string(&list)?)?;
        Ok(())
    }
}

/// Fetch notifications, pick the new ones and persist the updated set
///
/// The set is only written when something new was surfaced.
pub async fn check_notifications(
    api: &ApiClient,
    shown: &ShownIdStore,
) -> Result<Vec<Notification>, TrackerError> {
    let all = api.notifications().await?;
    let previous = shown.load();
    let (to_show, updated) = next_notifications_to_surface(&all, &previous);

    if !to_show.is_empty() {
        shown.save(&updated)?;
        debug!(new = to_show.len(), known = updated.len(), "surfacing notifications");
    }
    Ok(to_show)
}

/// Acknowledge a notification
///
/// Marking an already-read notification again is a successful no-op.
pub async fn mark_read(api: &ApiClient, notification: &Notification) -> Result<(), TrackerError> {
    if notification.is_read {
        return Ok(());
    }
    api.mark_notification_read(notification.id).await
}

/// Display collaborator for newly surfaced notifications
pub trait NotificationSurface {
    /// Show `to_show` and return the ids the user acknowledged
    fn show(&mut self, to_show: &[Notification]) -> Result<Vec<i64>, TrackerError>;
}

/// What one surfacing pass did
#[derive(Debug, Clone, Default)]
pub struct Surfaced {
    pub shown: Vec<Notification>,
    /// Ids successfully marked read
    pub acknowledged: Vec<i64>,
}

/// Check for new notifications, hand them to `surface` and mark the
/// acknowledged ones read
///
/// Each acknowledged item gets exactly one mark-read call. Ids the surface
/// returns that were not part of this pass are ignored, and a failed
/// mark-read is logged without stopping the rest.
pub async fn surface_notifications<S>(
    api: &ApiClient,
    shown: &ShownIdStore,
    surface: &mut S,
) -> Result<Surfaced, TrackerError>
where
    S: NotificationSurface + ?Sized,
{
    let fresh = check_notifications(api, shown).await?;
    let picked = surface.show(&fresh)?;

    let mut acknowledged = Vec::new();
    for notification in fresh.iter().filter(|n| picked.contains(&n.id)) {
        match mark_read(api, notification).await {
            Ok(()) => acknowledged.push(notification.id),
            Err(e) => warn!(id = notification.id, error = %e, "could not mark notification read"),
        }
    }

    Ok(Surfaced {
        shown: fresh,
        acknowledged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::testing::RecordingTransport;
    use crate::core::transport::Method;
    use crate::entities::NotificationType;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn note(id: i64, is_read: bool) -> Notification {
        Notification {
            id,
            project_id: None,
            project_project_id: None,
            change_request_id: None,
            notification_type: NotificationType::StatusUpdate,
            message: format!("notification {}", id),
            is_read,
            created_at: None,
        }
    }

    fn ids(values: &[i64]) -> ShownIds {
        values.iter().copied().collect()
    }

    #[test]
    fn test_surfaces_only_new_unread() {
        let all = vec![note(1, false), note(3, false), note(4, true)];
        let (to_show, updated) = next_notifications_to_surface(&all, &ids(&[1, 2]));

        assert_eq!(to_show.iter().map(|n| n.id).collect::<Vec<_>>(), vec![3]);
        assert_eq!(updated, ids(&[1, 2, 3]));
    }

    #[test]
    fn test_second_call_is_idempotent() {
        let all = vec![note(1, false), note(3, false)];
        let (first, shown) = next_notifications_to_surface(&all, &ids(&[]));
        assert_eq!(first.len(), 2);

        let (second, shown_again) = next_notifications_to_surface(&all, &shown);
        assert!(second.is_empty());
        assert_eq!(shown_again, shown);
    }

    #[test]
    fn test_read_notifications_never_surface() {
        let all = vec![note(7, true)];
        let (to_show, updated) = next_notifications_to_surface(&all, &ids(&[]));
        assert!(to_show.is_empty());
        assert!(updated.is_empty());
    }

    #[test]
    fn test_shown_id_is_permanent_even_if_unread_again() {
        let (to_show, _) = next_notifications_to_surface(&[note(5, false)], &ids(&[5]));
        assert!(to_show.is_empty());
    }

    #[test]
    fn test_store_roundtrip_and_corrupt_file() {
        let tmp = tempdir().unwrap();
        let store = ShownIdStore::new(tmp.path());
        assert!(store.load().is_empty());

        store.save(&ids(&[3, 1, 2])).unwrap();
        assert_eq!(store.load(), ids(&[1, 2, 3]));

        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[tokio::test]
    async fn test_check_notifications_persists_new_ids() {
        let tmp = tempdir().unwrap();
        let shown = ShownIdStore::new(tmp.path());
        shown.save(&ids(&[1])).unwrap();

        let transport = Arc::new(RecordingTransport::new());
        transport.on(
            Method::Get,
            "/api/notifications",
            200,
            json!([
                {"id": 1, "notificationType": "STATUS_UPDATE", "message": "a", "isRead": false},
                {"id": 2, "notificationType": "PROJECT_DELETED", "message": "b", "isRead": false},
                {"id": 3, "notificationType": "PROJECT_UPDATED", "message": "c", "isRead": true}
            ]),
        );
        let api = ApiClient::new(transport.clone());

        let surfaced = check_notifications(&api, &shown).await.unwrap();
        assert_eq!(surfaced.len(), 1);
        assert_eq!(surfaced[0].id, 2);
        assert_eq!(shown.load(), ids(&[1, 2]));

        let again = check_notifications(&api, &shown).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let transport = Arc::new(RecordingTransport::new());
        transport.on(Method::Put, "/api/notifications/9/read", 200, json!(null));
        let api = ApiClient::new(transport.clone());

        mark_read(&api, &note(9, false)).await.unwrap();
        mark_read(&api, &note(9, true)).await.unwrap();
        assert_eq!(transport.request_count(), 1);
    }

    /// Surface that acknowledges a fixed set of ids
    struct ScriptedSurface {
        acknowledge: Vec<i64>,
        seen: Vec<i64>,
    }

    impl NotificationSurface for ScriptedSurface {
        fn show(&mut self, to_show: &[Notification]) -> Result<Vec<i64>, TrackerError> {
            self.seen.extend(to_show.iter().map(|n| n.id));
            Ok(self.acknowledge.clone())
        }
    }

    fn feed(transport: &RecordingTransport) {
        transport.on(
            Method::Get,
            "/api/notifications",
            200,
            json!([
                {"id": 1, "notificationType": "STATUS_UPDATE", "message": "a", "isRead": false},
                {"id": 2, "notificationType": "PROJECT_DELETED", "message": "b", "isRead": false},
                {"id": 3, "notificationType": "PROJECT_UPDATED", "message": "c", "isRead": false},
                {"id": 4, "notificationType": "PROJECT_UPDATED", "message": "d", "isRead": true}
            ]),
        );
    }

    #[tokio::test]
    async fn test_acknowledging_every_item_marks_each_read_once() {
        let tmp = tempdir().unwrap();
        let shown = ShownIdStore::new(tmp.path());
        let transport = Arc::new(RecordingTransport::new());
        feed(&transport);
        for id in 1..=4 {
            transport.on(Method::Put, &format!("/api/notifications/{}/read", id), 200, json!(null));
        }
        let api = ApiClient::new(transport.clone());

        let mut surface = ScriptedSurface {
            acknowledge: vec![1, 2, 3, 4],
            seen: Vec::new(),
        };
        let outcome = surface_notifications(&api, &shown, &mut surface).await.unwrap();

        assert_eq!(surface.seen, vec![1, 2, 3]);
        assert_eq!(outcome.acknowledged, vec![1, 2, 3]);
        for id in 1..=3 {
            let path = format!("/api/notifications/{}/read", id);
            assert_eq!(transport.requests_to(Method::Put, &path).len(), 1);
        }
        assert!(transport.requests_to(Method::Put, "/api/notifications/4/read").is_empty());
    }

    #[tokio::test]
    async fn test_only_acknowledged_items_are_marked() {
        let tmp = tempdir().unwrap();
        let shown = ShownIdStore::new(tmp.path());
        let transport = Arc::new(RecordingTransport::new());
        feed(&transport);
        transport.on(Method::Put, "/api/notifications/3/read", 200, json!(null));
        let api = ApiClient::new(transport.clone());

        let mut surface = ScriptedSurface {
            acknowledge: vec![3, 3, 99],
            seen: Vec::new(),
        };
        let outcome = surface_notifications(&api, &shown, &mut surface).await.unwrap();

        assert_eq!(outcome.shown.len(), 3);
        assert_eq!(outcome.acknowledged, vec![3]);
        let puts: Vec<_> = transport
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Put)
            .collect();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].path, "/api/notifications/3/read");
        assert_eq!(shown.load(), ids(&[1, 2, 3]));
    }

    #[tokio::test]
    async fn test_failed_acknowledge_does_not_stop_others() {
        let tmp = tempdir().unwrap();
        let shown = ShownIdStore::new(tmp.path());
        let transport = Arc::new(RecordingTransport::new());
        feed(&transport);
        transport.on(Method::Put, "/api/notifications/1/read", 500, json!({"message": "down"}));
        transport.on(Method::Put, "/api/notifications/2/read", 200, json!(null));
        let api = ApiClient::new(transport.clone());

        let mut surface = ScriptedSurface {
            acknowledge: vec![1, 2],
            seen: Vec::new(),
        };
        let outcome = surface_notifications(&api, &shown, &mut surface).await.unwrap();
        assert_eq!(outcome.acknowledged, vec![2]);
    }
}
