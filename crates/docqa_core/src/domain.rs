//! crates/docqa_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs double as the persisted JSON form, so the serde field
//! names follow the storage contract (camelCase, `type` for the MIME).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a user-uploaded file. No content is ever stored; a
/// document is created only when a simulated upload runs to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub id: String,
    pub name: String,
    /// Size in bytes, copied from the incoming file descriptor.
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// A completed question-and-answer exchange tied to one document.
///
/// Only completed records exist in durable storage; while an answer is
/// being generated the exchange lives solely in the in-flight operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaItem {
    pub id: String,
    pub doc_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Terminal and non-terminal states of one simulated upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Done,
    Error,
}

/// Ephemeral progress tracking for one in-flight upload, keyed by the
/// document id the upload will produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub doc_id: String,
    /// 0..=100, monotonically non-decreasing until a terminal status.
    pub percent: u8,
    pub status: UploadStatus,
}

/// Which text field of a record a search query matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Question,
    Answer,
}

/// One search hit. Derived on demand, never stored. A single record can
/// contribute two results when both its question and answer match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub qa_item: QaItem,
    pub document: DocumentMeta,
    pub matched_text: String,
    #[serde(rename = "type")]
    pub field: MatchField,
}

/// The persisted color-scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    /// The next theme in the light -> dark -> system cycle.
    pub fn next(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::System,
            Theme::System => Theme::Light,
        }
    }
}

/// Discrete UI scale steps the client can persist.
pub const UI_SCALE_STEPS: [f64; 5] = [0.8, 0.85, 0.9, 0.95, 1.0];

/// Default UI scale.
pub const DEFAULT_UI_SCALE: f64 = 0.9;

/// The downloadable export of one document's Q&A history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub document: DocumentMeta,
    pub qa_items: Vec<QaItem>,
    pub exported_at: DateTime<Utc>,
    pub total_questions: usize,
}

/// The file descriptor an upload accepts: name, byte size and MIME type.
/// Content is never read, so any file simulates identically.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// Extensions advertised to the client as accepted. Not enforced.
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["pdf", "doc", "docx", "txt", "md"];
