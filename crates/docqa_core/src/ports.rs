//! crates/docqa_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like storage or the
//! answer generator.

use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external media (filesystem, etc.)
/// and carries the domain-level failure signals of the simulated flows.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("No document selected")]
    NoDocumentSelected,
    #[error("Upload failed")]
    UploadFailed,
    #[error("Upload canceled")]
    UploadCancelled,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable slot storage: one flat JSON payload per named slot.
///
/// This is a single-writer-per-process model. Multiple processes (or multiple
/// stores bound to the same slot) are not coordinated; that race is an
/// accepted non-goal, matching the one-tab browser storage it stands in for.
pub trait SlotStorage: Send + Sync {
    /// Reads the raw payload of a slot, `None` when the slot has never been written.
    fn read(&self, slot: &str) -> PortResult<Option<String>>;

    /// Writes the raw payload of a slot, replacing any previous value.
    fn write(&self, slot: &str, payload: &str) -> PortResult<()>;
}

#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Produces an answer for a question. Implementations must be
    /// deterministic for the same question text.
    async fn answer_question(&self, question: &str) -> PortResult<String>;
}

/// The pseudo-random source behind every randomized decision (tick
/// intervals, percent increments, failure injection, ask delays).
///
/// Kept behind a trait so tests can substitute a seeded implementation and
/// force either branch of the simulated control flow.
pub trait RandomSource: Send + Sync {
    /// A uniform draw from the inclusive range `lo..=hi`.
    fn pick(&self, lo: u64, hi: u64) -> u64;

    /// `true` with the given probability in `[0, 1]`.
    fn chance(&self, probability: f64) -> bool;
}
