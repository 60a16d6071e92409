use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two document kinds a user can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Cv,
    JobDescription,
}

impl DocumentType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cv" => Some(DocumentType::Cv),
            "job_description" => Some(DocumentType::JobDescription),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cv => "cv",
            DocumentType::JobDescription => "job_description",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one stored document. Rows are append-only; re-uploading the
/// same `(user, type, filename)` overwrites the blob and records a fresh row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_type: DocumentType,
    pub file_type: String,
    pub original_filename: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}
