//! reqtrack: project and change-request tracking client
//!
//! Talks to the tracking backend over REST: staff log project requests and
//! change requests, administrators move them through the status workflow,
//! and reports can be generated and exported from the command line.

pub mod cli;
pub mod core;
pub mod entities;
