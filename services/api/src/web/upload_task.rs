//! services/api/src/web/upload_task.rs
//!
//! This module contains the simulated upload "worker": a randomized,
//! cancelable progress sequence that fabricates a document record on
//! completion. No bytes are transferred; the tick loop is the transfer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use docqa_core::domain::{DocumentMeta, IncomingFile, UploadProgress, UploadStatus};
use docqa_core::id;
use docqa_core::ports::{PortError, PortResult, RandomSource};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

//=========================================================================================
// Timing Knobs
//=========================================================================================

/// Tick cadence and failure-injection knobs for the simulation.
/// `Default` is the production behavior; tests compress the timings and
/// substitute the random source to force either branch.
#[derive(Debug, Clone)]
pub struct UploadTiming {
    /// Uniform per-tick interval range, in milliseconds.
    pub tick_min_ms: u64,
    pub tick_max_ms: u64,
    /// Uniform per-tick percent increment range.
    pub increment_min: u64,
    pub increment_max: u64,
    /// Inclusive percent band in which a tick may fail.
    pub failure_band: (u8, u8),
    /// Per-tick failure probability while inside the band.
    pub failure_probability: f64,
    /// How long a completed entry lingers in the live set, so a client
    /// can render the brief "complete" state before it disappears.
    pub done_linger_ms: u64,
}

impl Default for UploadTiming {
    fn default() -> Self {
        Self {
            tick_min_ms: 40,
            tick_max_ms: 80,
            increment_min: 5,
            increment_max: 12,
            failure_band: (20, 60),
            failure_probability: 0.05,
            done_linger_ms: 1000,
        }
    }
}

/// What a single applied tick concluded.
enum Tick {
    Progress,
    Done,
    Failed { at_percent: u8 },
}

struct UploadEntry {
    progress: UploadProgress,
    cancel: CancellationToken,
}

//=========================================================================================
// UploadManager
//=========================================================================================

/// Tracks every in-flight simulated upload, keyed by the document id the
/// upload will produce. Uploads run concurrently, each on its own timer;
/// every mutation is applied against the latest map snapshot under a
/// short-lived lock, so interleaving on the event loop cannot lose updates.
pub struct UploadManager {
    uploads: Arc<Mutex<HashMap<String, UploadEntry>>>,
    rng: Arc<dyn RandomSource>,
    timing: UploadTiming,
}

impl UploadManager {
    pub fn new(rng: Arc<dyn RandomSource>, timing: UploadTiming) -> Self {
        Self {
            uploads: Arc::new(Mutex::new(HashMap::new())),
            rng,
            timing,
        }
    }

    /// The live progress entries, ordered by document id for stable output.
    pub fn snapshot(&self) -> Vec<UploadProgress> {
        let mut entries: Vec<UploadProgress> = self
            .uploads
            .lock()
            .values()
            .map(|entry| entry.progress.clone())
            .collect();
        entries.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        entries
    }

    /// Uploads still ticking (terminal entries excluded).
    pub fn active_count(&self) -> usize {
        self.uploads
            .lock()
            .values()
            .filter(|entry| entry.progress.status == UploadStatus::Uploading)
            .count()
    }

    /// Cancels an in-flight upload, or dismisses a terminal entry.
    ///
    /// The entry leaves the live set immediately and the upload's token is
    /// triggered, so the in-flight `start` call settles with
    /// `UploadCancelled` instead of dangling forever. Returns `false` when
    /// the id is unknown.
    pub fn cancel(&self, doc_id: &str) -> bool {
        let entry = self.uploads.lock().remove(doc_id);
        match entry {
            Some(entry) => {
                entry.cancel.cancel();
                info!("Upload {} canceled.", doc_id);
                true
            }
            None => false,
        }
    }

    /// Runs one simulated upload to a terminal state.
    ///
    /// Resolves with the fabricated `DocumentMeta` when the transfer
    /// completes, or fails with `UploadFailed` (injected mid-transfer
    /// error) or `UploadCancelled`. The caller decides what to do with the
    /// document; the manager never touches durable storage.
    pub async fn start(&self, file: IncomingFile) -> PortResult<DocumentMeta> {
        let doc_id = id::doc_id();
        let cancel = CancellationToken::new();

        self.uploads.lock().insert(
            doc_id.clone(),
            UploadEntry {
                progress: UploadProgress {
                    doc_id: doc_id.clone(),
                    percent: 0,
                    status: UploadStatus::Uploading,
                },
                cancel: cancel.clone(),
            },
        );
        info!("Upload {} started for '{}' ({} bytes).", doc_id, file.name, file.size);

        loop {
            let interval =
                Duration::from_millis(self.rng.pick(self.timing.tick_min_ms, self.timing.tick_max_ms));

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(PortError::UploadCancelled);
                }
                _ = tokio::time::sleep(interval) => {}
            }

            match self.apply_tick(&doc_id)? {
                Tick::Progress => continue,
                Tick::Failed { at_percent } => {
                    warn!("Upload {} failed at {}%.", doc_id, at_percent);
                    return Err(PortError::UploadFailed);
                }
                Tick::Done => {
                    let document = DocumentMeta {
                        id: doc_id.clone(),
                        name: file.name,
                        size: file.size,
                        mime_type: file.mime_type,
                        created_at: chrono::Utc::now(),
                    };
                    self.schedule_linger_removal(doc_id.clone());
                    info!("Upload {} complete.", doc_id);
                    return Ok(document);
                }
            }
        }
    }

    /// Applies one tick against the latest snapshot of the entry.
    ///
    /// Percent never decreases, and a terminal entry is never touched
    /// again: the loop exits on the tick that produced the terminal state,
    /// and a cleared entry turns the tick into a cancellation.
    fn apply_tick(&self, doc_id: &str) -> PortResult<Tick> {
        let mut uploads = self.uploads.lock();
        let Some(entry) = uploads.get_mut(doc_id) else {
            // Entry was cleared between the timer firing and this tick.
            return Err(PortError::UploadCancelled);
        };

        let increment = self.rng.pick(self.timing.increment_min, self.timing.increment_max) as u8;
        let percent = entry.progress.percent.saturating_add(increment).min(100);

        let (band_lo, band_hi) = self.timing.failure_band;
        if (band_lo..=band_hi).contains(&percent)
            && self.rng.chance(self.timing.failure_probability)
        {
            // The failing tick does not advance percent; the bar freezes
            // where the client last saw it.
            entry.progress.status = UploadStatus::Error;
            return Ok(Tick::Failed {
                at_percent: entry.progress.percent,
            });
        }

        if percent >= 100 {
            entry.progress.percent = 100;
            entry.progress.status = UploadStatus::Done;
            return Ok(Tick::Done);
        }

        entry.progress.percent = percent;
        Ok(Tick::Progress)
    }

    /// Removes a completed entry after the linger delay. Failed entries
    /// are kept until dismissed, so a client can render the error.
    fn schedule_linger_removal(&self, doc_id: String) {
        let uploads = self.uploads.clone();
        let linger = Duration::from_millis(self.timing.done_linger_ms);
        tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            uploads.lock().remove(&doc_id);
        });
    }
}

//=========================================================================================
// Tests
//=========================================================================================
