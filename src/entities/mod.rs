//! Entity type definitions
//!
//! Wire types exchanged with the tracking backend:
//!
//! - [`Project`] - Project requests with workflow status and soft deletion
//! - [`ChangeRequest`] - Modification requests scoped to one project
//! - [`User`] - Accounts with role and active flag
//! - [`Notification`] - Server-pushed notifications
//! - [`Attachment`] - File references on projects and change requests
//! - [`ActivityLog`] - Audited actions of the current user

pub mod attachment;
pub mod change_request;
pub mod log;
pub mod notification;
pub mod project;
pub mod user;

pub use attachment::Attachment;
pub use change_request::{ChangeRequest, ChangeRequestDraft};
pub use log::ActivityLog;
pub use notification::{Notification, NotificationType};
pub use project::{Deletion, Project, ProjectDraft};
pub use user::{Role, User, UserDraft};
