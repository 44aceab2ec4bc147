//! CLI command implementations

pub mod utils;

pub mod auth;
pub mod completions;
pub mod config;
pub mod cr;
pub mod dashboard;
pub mod file;
pub mod logs;
pub mod notify;
pub mod project;
pub mod report;
pub mod user;
