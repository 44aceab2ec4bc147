//! File attachment reference

use serde::{Deserialize, Serialize};

/// Attachment metadata as listed on a project or change request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: i64,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
}

impl Attachment {
    /// File size formatted for display ("2.0 KB")
    pub fn size_display(&self) -> String {
        match self.file_size {
            None => "-".to_string(),
            Some(bytes) if bytes < 1024 => format!("{} B", bytes),
            Some(bytes) if bytes < 1024 * 1024 => format!("{:.1} KB", bytes as f64 / 1024.0),
            Some(bytes) => format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0)),
        }
    }
}
