//! services/api/src/web/search.rs
//!
//! Debounces the search query. The live value updates (and persists)
//! immediately for display; the settled value that drives recomputation
//! only changes once the query has been stable for the quiescence window.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use docqa_core::domain::SearchResult;
use docqa_core::ports::PortResult;
use parking_lot::Mutex;

use crate::store::AppStore;

/// The quiescence window used in production.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Classic trailing debounce over the persisted search query.
///
/// Every update bumps a generation counter and schedules a settle task;
/// a task whose generation is stale by the time its timer fires does
/// nothing, so only the last value of a burst ever settles.
pub struct SearchDebouncer {
    store: Arc<AppStore>,
    window: Duration,
    settled: Mutex<String>,
    generation: AtomicU64,
}

impl SearchDebouncer {
    /// Creates the debouncer. The settled value starts at the persisted
    /// query, so a restart resumes with the last search intact.
    pub fn new(store: Arc<AppStore>, window: Duration) -> Arc<Self> {
        let settled = store.search_query();
        Arc::new(Self {
            store,
            window,
            settled: Mutex::new(settled),
            generation: AtomicU64::new(0),
        })
    }

    /// The query as typed, updated on every keystroke.
    pub fn live(&self) -> String {
        self.store.search_query()
    }

    /// The query after the last quiescence window elapsed.
    pub fn settled(&self) -> String {
        self.settled.lock().clone()
    }

    /// Records a new live query and restarts the quiescence window.
    pub fn set_query(self: &Arc<Self>, query: &str) -> PortResult<()> {
        self.store.set_search_query(query)?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let this = self.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(this.window).await;
            if this.generation.load(Ordering::SeqCst) == generation {
                *this.settled.lock() = query;
            }
        });
        Ok(())
    }

    /// The results for the settled query against the current state.
    pub fn results(&self) -> Vec<SearchResult> {
        self.store.search(&self.settled())
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use docqa_core::domain::{DocumentMeta, QaItem};

    fn store() -> Arc<AppStore> {
        Arc::new(AppStore::open(Arc::new(MemoryStorage::new())))
    }

    fn window() -> Duration {
        Duration::from_millis(50)
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_value_of_a_burst_settles() {
        let debouncer = SearchDebouncer::new(store(), window());

        debouncer.set_query("value1").unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_ne!(debouncer.settled(), "value1");

        debouncer.set_query("value2").unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_ne!(debouncer.settled(), "value2");

        debouncer.set_query("value3").unwrap();
        // The live value tracks every keystroke immediately.
        assert_eq!(debouncer.live(), "value3");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(debouncer.settled(), "value3");

        // The earlier values were never observed as settled: their timers
        // fired against stale generations.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(debouncer.settled(), "value3");
    }

    #[tokio::test(start_paused = true)]
    async fn a_stable_value_settles_after_the_window() {
        let debouncer = SearchDebouncer::new(store(), window());

        debouncer.set_query("stable").unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(debouncer.settled(), "stable");
    }

    #[tokio::test(start_paused = true)]
    async fn settled_query_survives_a_restart() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let store = Arc::new(AppStore::open(storage.clone()));
            let debouncer = SearchDebouncer::new(store, window());
            debouncer.set_query("persisted").unwrap();
            tokio::time::sleep(Duration::from_millis(60)).await;
        }

        let store = Arc::new(AppStore::open(storage));
        let debouncer = SearchDebouncer::new(store, window());
        assert_eq!(debouncer.settled(), "persisted");
        assert_eq!(debouncer.live(), "persisted");
    }

    #[tokio::test(start_paused = true)]
    async fn results_follow_the_settled_query() {
        let store = store();
        let d = DocumentMeta {
            id: docqa_core::id::doc_id(),
            name: "notes.txt".to_string(),
            size: 10,
            mime_type: "text/plain".to_string(),
            created_at: chrono::Utc::now(),
        };
        store.add_document(d.clone()).unwrap();
        store
            .add_qa_item(QaItem {
                id: docqa_core::id::qa_id(),
                doc_id: d.id.clone(),
                question: "What is debouncing?".to_string(),
                answer: "Coalescing rapid changes.".to_string(),
                created_at: chrono::Utc::now(),
            })
            .unwrap();

        let debouncer = SearchDebouncer::new(store, window());
        debouncer.set_query("debouncing").unwrap();

        // Not settled yet: still searching with the old (empty) query.
        assert!(debouncer.results().is_empty());

        tokio::time::sleep(Duration::from_millis(60)).await;
        let results = debouncer.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].qa_item.question, "What is debouncing?");
    }
}
