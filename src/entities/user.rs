//! User accounts and roles

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// User roles for authorization
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    NormalUser,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::NormalUser => write!(f, "NORMAL_USER"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "ADMIN" => Ok(Role::Admin),
            "NORMAL_USER" | "USER" => Ok(Role::NormalUser),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Every spelling of the F-number key the backend has been seen to send
///
/// Each spelling lands in its own field so a payload carrying more than one
/// still decodes; [`FNumberKeys::resolve`] folds them into one value.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FNumberKeys {
    #[serde(rename = "fNumber", default)]
    camel: Option<String>,
    #[serde(rename = "fnumber", default)]
    lower: Option<String>,
    #[serde(rename = "f_number", default)]
    snake: Option<String>,
    #[serde(rename = "FNumber", default)]
    pascal: Option<String>,
}

impl FNumberKeys {
    /// First non-blank spelling, canonical key first
    pub(crate) fn resolve(self) -> Option<String> {
        [self.camel, self.lower, self.snake, self.pascal]
            .into_iter()
            .flatten()
            .find(|f| !f.trim().is_empty())
    }
}

/// A user account
///
/// The backend is inconsistent about the casing of the F-number key; every
/// spelling is folded into `f_number` on the way in and written back as
/// `fNumber`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UserRecord")]
pub struct User {
    pub id: i64,

    /// Login and ownership identifier
    #[serde(rename = "fNumber")]
    pub f_number: String,

    pub role: Role,

    pub is_active: bool,
}

/// Raw user as the backend sends it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: i64,
    #[serde(flatten)]
    f_number: FNumberKeys,
    #[serde(default)]
    role: Role,
    #[serde(default = "default_active")]
    is_active: bool,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            f_number: record.f_number.resolve().unwrap_or_default(),
            role: record.role,
            is_active: record.is_active,
        }
    }
}

impl User {
    /// Check if user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Payload for creating or updating a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    #[serde(rename = "fNumber")]
    pub f_number: String,
    pub role: Role,
    pub is_active: bool,
}

impl UserDraft {
    /// Copy of an existing user with the active flag flipped
    pub fn toggled(user: &User) -> Self {
        Self {
            f_number: user.f_number.clone(),
            role: user.role,
            is_active: !user.is_active,
        }
    }

    pub fn with_role(user: &User, role: Role) -> Self {
        Self {
            f_number: user.f_number.clone(),
            role,
            is_active: user.is_active,
        }
    }
}
