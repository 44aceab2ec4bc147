//! Core module - tracking rules, backend client and local state

pub mod api;
pub mod config;
pub mod dashboard;
pub mod entity;
pub mod error;
pub mod export;
pub mod latency;
pub mod notify;
pub mod policy;
pub mod report;
pub mod session;
pub mod store;
pub mod tracker;
pub mod transport;
pub mod workflow;

pub use api::{ApiClient, UploadTarget};
pub use config::Config;
pub use dashboard::DashboardStats;
pub use entity::{EntityKind, Priority, Status, TrackedEntity};
pub use error::{ErrorKind, TrackerError};
pub use export::{CsvReport, MarkdownReport, ReportGenerator};
pub use notify::{ShownIdStore, ShownIds};
pub use policy::{DeletionRequest, DeletionWarning, ReasonEntry};
pub use report::{GeneratedReport, ReportData, ReportFilters, ReportSession};
pub use session::{Identity, Session, SessionStore};
pub use store::{EntityStore, SharedStore};
pub use tracker::{Created, Tracker};
pub use transport::{FilePart, HttpTransport, Transport};
pub use workflow::{StatusChange, WorkflowEngine};
