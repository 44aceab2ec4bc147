//! Identity and session management
//!
//! A session is the bearer token plus the identity the backend returned at
//! login. It is persisted to `session.json` in the data directory so the CLI
//! stays logged in between invocations, and removed on logout.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::api::ApiClient;
use crate::core::error::TrackerError;
use crate::entities::user::FNumberKeys;
use crate::entities::Role;

/// The current user as far as the client is concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "fNumber")]
    pub f_number: String,
    pub role: Role,
}

impl Identity {
    pub fn new(f_number: impl Into<String>, role: Role) -> Self {
        Self {
            f_number: f_number.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Identity,
}

/// Login response; every spelling of the F-number key is accepted here
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(flatten)]
    f_number: FNumberKeys,
    #[serde(default)]
    role: Option<Role>,
}

/// Authenticate against the backend
///
/// HTTP 403 means the account exists but is suspended and yields
/// [`TrackerError::AccountSuspended`]; any other refusal is reported as
/// [`TrackerError::InvalidCredentials`] with the backend's message.
pub async fn login(api: &ApiClient, username: &str, password: &str) -> Result<Session, TrackerError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(TrackerError::validation("username", "F-number is required"));
    }
    if password.is_empty() {
        return Err(TrackerError::validation("password", "Password is required"));
    }

    let response = api.login(username, password).await?;

    if response.status == 403 {
        info!(user = username, "login refused: account suspended");
        return Err(TrackerError::AccountSuspended);
    }
    if !response.is_success() {
        let message = match response.error_message() {
            m if m.starts_with("Request failed with status") => "Login failed".to_string(),
            m => m,
        };
        return Err(TrackerError::InvalidCredentials { message });
    }

    let body: LoginResponse = response.json()?;
    let f_number = body.f_number.resolve().unwrap_or_else(|| username.to_string());

    info!(user = %f_number, "logged in");
    Ok(Session {
        token: body.token,
        user: Identity::new(f_number, body.role.unwrap_or_default()),
    })
}

/// Durable storage for the current session
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub const FILE_NAME: &'static str = "session.json";

    /// Store rooted in the given data directory
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session, if any
    ///
    /// A file that cannot be decoded (older layout, missing F-number) is
    /// discarded so the user is asked to log in again.
    pub fn load(&self) -> Result<Option<Session>, TrackerError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Session>(&contents) {
            Ok(session) if !session.user.f_number.trim().is_empty() => Ok(Some(session)),
            _ => {
                debug!(path = %self.path.display(), "discarding unreadable session file");
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Load the session or fail with [`TrackerError::NotLoggedIn`]
    pub fn require(&self) -> Result<Session, TrackerError> {
        self.load()?.ok_or(TrackerError::NotLoggedIn)
    }

    pub fn save(&self, session: &Session) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Remove the saved session (logout)
    pub fn clear(&self) -> Result<(), TrackerError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
