//! Entity trait - common interface for tracked entities (projects and change requests)

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Common trait for entities that move through the status workflow
pub trait TrackedEntity {
    /// Which collection this entity lives in
    const KIND: EntityKind;

    /// Server-assigned numeric identifier (used in REST paths)
    fn id(&self) -> i64;

    /// Human-readable code shown to users (e.g. "PRJ-0001")
    fn code(&self) -> String;

    /// Current workflow status
    fn status(&self) -> Status;

    /// F-number of the creator
    fn logged_by(&self) -> &str;

    /// Raw creation timestamp as sent by the backend
    fn created_at_raw(&self) -> Option<&str>;

    /// Parsed creation timestamp (None if missing or unparseable)
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at_raw().and_then(parse_timestamp)
    }
}

/// The two kinds of tracked requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Project,
    ChangeRequest,
}

impl EntityKind {
    /// Wire value used by the report filter
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "PROJECT",
            EntityKind::ChangeRequest => "CHANGE_REQUEST",
        }
    }

    /// REST collection path
    pub fn collection_path(&self) -> &'static str {
        match self {
            EntityKind::Project => "/api/projects",
            EntityKind::ChangeRequest => "/api/change-requests",
        }
    }

    /// Human label
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::ChangeRequest => "change request",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "PROJECT" => Ok(EntityKind::Project),
            "CHANGE_REQUEST" | "CR" => Ok(EntityKind::ChangeRequest),
            _ => Err(format!("Unknown request type: {}", s)),
        }
    }
}

/// Workflow status shared by projects and change requests
///
/// Any status may move to any other; only `Rejected` carries extra data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Discussion,
    Documentation,
    DevelopersDiscussion,
    Testing,
    Int,
    Qa,
    Uat,
    QaSignOffInProgress,
    QaSignOffComplete,
    ReleaseNotesPrepared,
    ReleasedToProduction,
}

impl Status {
    /// Every status in workflow order
    pub const ALL: [Status; 14] = [
        Status::Pending,
        Status::Accepted,
        Status::Rejected,
        Status::Discussion,
        Status::Documentation,
        Status::DevelopersDiscussion,
        Status::Testing,
        Status::Int,
        Status::Qa,
        Status::Uat,
        Status::QaSignOffInProgress,
        Status::QaSignOffComplete,
        Status::ReleaseNotesPrepared,
        Status::ReleasedToProduction,
    ];

    /// Wire value sent to and received from the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Accepted => "ACCEPTED",
            Status::Rejected => "REJECTED",
            Status::Discussion => "DISCUSSION",
            Status::Documentation => "DOCUMENTATION",
            Status::DevelopersDiscussion => "DEVELOPERS_DISCUSSION",
            Status::Testing => "TESTING",
            Status::Int => "INT",
            Status::Qa => "QA",
            Status::Uat => "UAT",
            Status::QaSignOffInProgress => "QA_SIGN_OFF_IN_PROGRESS",
            Status::QaSignOffComplete => "QA_SIGN_OFF_COMPLETE",
            Status::ReleaseNotesPrepared => "RELEASE_NOTES_PREPARED",
            Status::ReleasedToProduction => "RELEASED_TO_PRODUCTION",
        }
    }

    /// Display label with underscores replaced by spaces
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Statuses an administrator can pick as a target (everything but the initial state)
    pub fn targets() -> impl Iterator<Item = Status> {
        Status::ALL.into_iter().filter(|s| *s != Status::Pending)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = normalize_token(s);
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == token)
            .ok_or_else(|| format!("Unknown status: {}", s))
    }
}

/// Project priority
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Uppercase and turn spaces/hyphens into underscores ("qa sign-off" -> "QA_SIGN_OFF")
fn normalize_token(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Decode a wire enum without failing the surrounding payload
///
/// A missing, null or unrecognized value decodes to `T::default()`. The
/// unrecognized case is logged at `warn`.
pub(crate) fn lenient_wire_enum<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(T::default());
    };
    Ok(raw.parse().unwrap_or_else(|_| {
        warn!(value = %raw, "unrecognized value from server, using default");
        T::default()
    }))
}

/// Parse a backend timestamp.
///
/// The backend sends zone-less local date-times (`2024-01-01T10:00:00.123`);
/// RFC 3339 strings with an offset are accepted as well.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_wire_names() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: Status = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_status_from_str_is_lenient() {
        assert_eq!("rejected".parse::<Status>().unwrap(), Status::Rejected);
        assert_eq!(
            "qa sign-off in progress".parse::<Status>().unwrap(),
            Status::QaSignOffInProgress
        );
        assert_eq!("INT".parse::<Status>().unwrap(), Status::Int);
        assert!("SHIPPED".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_label() {
        assert_eq!(Status::ReleasedToProduction.label(), "RELEASED TO PRODUCTION");
        assert_eq!(Status::Qa.label(), "QA");
    }

    #[test]
    fn test_targets_exclude_pending() {
        let targets: Vec<Status> = Status::targets().collect();
        assert_eq!(targets.len(), 13);
        assert!(!targets.contains(&Status::Pending));
        assert!(targets.contains(&Status::Rejected));
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
    }

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!("project".parse::<EntityKind>().unwrap(), EntityKind::Project);
        assert_eq!(
            "change-request".parse::<EntityKind>().unwrap(),
            EntityKind::ChangeRequest
        );
        assert_eq!(EntityKind::ChangeRequest.collection_path(), "/api/change-requests");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-01T10:00:00Z").unwrap();
        assert_eq!(rfc.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        assert!(parse_timestamp("2024-03-01T10:00:00.123456").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
