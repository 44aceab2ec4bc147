//! Activity log entries

use serde::{Deserialize, Serialize};

use super::user::FNumberKeys;

/// Actor recorded on a log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FNumberKeys")]
pub struct LogActor {
    #[serde(rename = "fNumber")]
    pub f_number: String,
}

impl From<FNumberKeys> for LogActor {
    fn from(keys: FNumberKeys) -> Self {
        Self {
            f_number: keys.resolve().unwrap_or_default(),
        }
    }
}

/// One audited action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: i64,
    #[serde(default)]
    pub user: Option<LogActor>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ActivityLog {
    pub fn actor(&self) -> &str {
        self.user.as_ref().map(|u| u.f_number.as_str()).unwrap_or("N/A")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_ignores_extra_user_fields() {
        let log: ActivityLog = serde_json::from_value(json!({
            "id": 9,
            "user": {"id": 1, "fnumber": "F1", "password": "hash", "role": "ADMIN"},
            "actionType": "STATUS_UPDATE",
            "entityType": "PROJECT",
            "entityId": 12,
            "description": "Moved to QA",
            "createdAt": "2024-05-03T08:00:00"
        }))
        .unwrap();
        assert_eq!(log.actor(), "F1");
        assert_eq!(log.action_type.as_deref(), Some("STATUS_UPDATE"));
        assert_eq!(log.ip_address, None);
    }

    #[test]
    fn test_log_actor_with_two_fnumber_spellings() {
        let log: ActivityLog = serde_json::from_value(json!({
            "id": 10,
            "user": {"fNumber": "F7", "fnumber": "F7"}
        }))
        .unwrap();
        assert_eq!(log.actor(), "F7");

        let log: ActivityLog = serde_json::from_value(json!({"id": 11})).unwrap();
        assert_eq!(log.actor(), "N/A");
    }
}
