//! services/api/src/web/qa_task.rs
//!
//! This module contains the asynchronous "worker" responsible for one
//! question-and-answer cycle: validate the target document, wait out the
//! simulated request delay, generate the answer, persist the completed
//! record.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use docqa_core::domain::QaItem;
use docqa_core::id;
use docqa_core::ports::{AnswerService, PortError, PortResult, RandomSource};
use tracing::info;

use crate::store::AppStore;

//=========================================================================================
// Timing Knobs
//=========================================================================================

/// Uniform delay range for the simulated answering request.
#[derive(Debug, Clone, Copy)]
pub struct AskTiming {
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
}

impl Default for AskTiming {
    fn default() -> Self {
        Self {
            delay_min_ms: 800,
            delay_max_ms: 1500,
        }
    }
}

//=========================================================================================
// AskFlow
//=========================================================================================

/// Sequences ask operations: idle -> asking -> idle.
///
/// Overlapping asks are counted rather than flagged, so two in-flight
/// questions cannot clobber each other's "asking" visibility; each holds
/// its own guard and the count drops as each one settles.
pub struct AskFlow {
    store: Arc<AppStore>,
    answerer: Arc<dyn AnswerService>,
    rng: Arc<dyn RandomSource>,
    timing: AskTiming,
    in_flight: AtomicUsize,
}

/// Keeps the flow in the "asking" state for as long as it lives. Dropping
/// the guard leaves the state regardless of how the ask ended.
struct AskGuard<'a>(&'a AtomicUsize);

impl Drop for AskGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AskFlow {
    pub fn new(
        store: Arc<AppStore>,
        answerer: Arc<dyn AnswerService>,
        rng: Arc<dyn RandomSource>,
        timing: AskTiming,
    ) -> Self {
        Self {
            store,
            answerer,
            rng,
            timing,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// How many asks are currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Runs one ask cycle against the selected document.
    ///
    /// Fails fast, without touching any state, when no document is
    /// selected, the document is unknown, or the question is blank. Only
    /// the completed record is ever written to durable storage; a crash
    /// mid-ask simply drops the in-flight question.
    pub async fn ask(&self, doc_id: Option<&str>, question: &str) -> PortResult<QaItem> {
        let doc_id = doc_id.ok_or(PortError::NoDocumentSelected)?;

        let question = question.trim();
        if question.is_empty() {
            return Err(PortError::Unexpected(
                "Question must not be empty".to_string(),
            ));
        }

        if self.store.document(doc_id).is_none() {
            return Err(PortError::NotFound(format!("Document {} not found", doc_id)));
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = AskGuard(&self.in_flight);

        // Simulated request latency before the (instant) generation step.
        let delay = self
            .rng
            .pick(self.timing.delay_min_ms, self.timing.delay_max_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let answer = self.answerer.answer_question(question).await?;

        let qa_item = QaItem {
            id: id::qa_id(),
            doc_id: doc_id.to_string(),
            question: question.to_string(),
            answer,
            created_at: chrono::Utc::now(),
        };
        self.store.add_qa_item(qa_item.clone())?;

        info!("Answered question {} for document {}.", qa_item.id, doc_id);
        Ok(qa_item)
    }
}

//=========================================================================================
// Tests
//=========================================================================================
