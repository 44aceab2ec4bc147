//! Shared utilities for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{is_interactive, value_or_prompt};
use crate::core::entity::TrackedEntity;
use crate::core::policy::DeletionRequest;
use crate::core::tracker::Tracker;

/// Walk the deletion flow: warning, acknowledgement, reason
///
/// Returns `None` when the user declines at the confirmation prompt.
pub fn confirm_deletion<E: TrackedEntity>(
    tracker: &Tracker,
    entity: &E,
    acknowledged: bool,
    reason: Option<String>,
) -> Result<Option<DeletionRequest>> {
    let warning = tracker.begin_deletion(entity)?;

    eprintln!(
        "{} Deleting {} {}",
        style("!").red().bold(),
        warning.kind().label(),
        style(warning.code()).cyan()
    );
    for consequence in warning.consequences() {
        eprintln!("  - {}", consequence);
    }

    if !acknowledged {
        if !is_interactive() {
            return Err(miette::miette!(
                help = "Re-run with --acknowledge to confirm",
                "Deletion must be acknowledged"
            ));
        }
        let proceed = dialoguer::Confirm::new()
            .with_prompt("I understand the consequences. Continue?")
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !proceed {
            eprintln!("Aborted.");
            return Ok(None);
        }
    }

    let mut entry = warning.acknowledge();
    let reason = value_or_prompt(reason, "Reason for deletion")?;
    entry.set_reason(reason.unwrap_or_default());
    Ok(Some(entry.submit()?))
}

/// Print a non-fatal note from a create
pub fn print_upload_note(note: Option<&str>) {
    if let Some(note) = note {
        eprintln!("{} {}", style("!").yellow(), note);
    }
}
