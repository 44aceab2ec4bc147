//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::core::entity::parse_timestamp;
use crate::core::transport::FilePart;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Backend timestamp in local time, or "-" when absent or unparseable
pub fn format_timestamp(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}

/// Write to a file when a path is given, stdout otherwise
pub fn write_output(content: &[u8], output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content).into_diagnostic()?;
            eprintln!("{} Written to {}", style("✓").green(), path.display());
        }
        None => {
            std::io::stdout().write_all(content).into_diagnostic()?;
        }
    }
    Ok(())
}

/// Read local files into upload parts
pub fn read_attachments(paths: &[PathBuf]) -> Result<Vec<FilePart>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .map_err(|e| miette::miette!("Cannot read {}: {}", path.display(), e))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "attachment".to_string());
            Ok(FilePart { file_name, bytes })
        })
        .collect()
}

/// True when prompts can be shown
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Use the given value, or prompt for it when interactive
pub fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<Option<String>> {
    if value.is_some() || !is_interactive() {
        return Ok(value);
    }
    let input: String = dialoguer::Input::with_theme(&dialoguer::theme::ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;
    Ok(Some(input))
}
