//! Per-invocation state shared by the commands

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::api::ApiClient;
use crate::core::config::Config;
use crate::core::error::TrackerError;
use crate::core::notify::ShownIdStore;
use crate::core::session::{Session, SessionStore};
use crate::core::tracker::Tracker;
use crate::core::transport::{HttpTransport, Transport};

pub struct Context {
    pub config: Config,
    pub global: GlobalOpts,
    transport: Arc<dyn Transport>,
}

impl Context {
    /// Load configuration and build the HTTP transport; nothing is sent yet
    pub fn new(global: &GlobalOpts) -> Result<Self, TrackerError> {
        let mut config = Config::load();
        if let Some(server) = &global.server {
            config.server_url = Some(server.clone());
        }
        let transport = HttpTransport::new(config.server_url(), config.request_timeout())?;
        debug!(server = %config.server_url(), "client configured");

        Ok(Self {
            config,
            global: global.clone(),
            transport: Arc::new(transport),
        })
    }

    /// Unauthenticated client
    pub fn api(&self) -> ApiClient {
        ApiClient::new(Arc::clone(&self.transport))
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(&self.config.data_dir())
    }

    pub fn shown_ids(&self) -> ShownIdStore {
        ShownIdStore::new(&self.config.data_dir())
    }

    pub fn require_session(&self) -> Result<Session, TrackerError> {
        self.session_store().require()
    }

    /// Client carrying the stored session's token
    pub fn authed(&self) -> Result<(ApiClient, Session), TrackerError> {
        let session = self.require_session()?;
        let api = self.api().with_token(Some(session.token.clone()));
        Ok((api, session))
    }

    pub fn tracker(&self) -> Result<Tracker, TrackerError> {
        let (api, session) = self.authed()?;
        Ok(Tracker::new(api, session.user, self.min_latency()))
    }

    pub fn min_latency(&self) -> Duration {
        self.config.min_latency()
    }

    /// Output format with `auto` resolved
    pub fn format(&self) -> OutputFormat {
        self.global
            .format
            .resolve(self.config.default_format.as_deref())
    }

    pub fn quiet(&self) -> bool {
        self.global.quiet
    }
}
