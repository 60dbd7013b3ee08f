//! services/api/src/store.rs
//!
//! The persisted state of the application: a generic write-through slot
//! primitive plus the `AppStore` that aggregates the five durable slots
//! (documents, Q&A history, search query, theme, UI scale).

use std::sync::Arc;

use docqa_core::domain::{
    DocumentMeta, ExportBundle, MatchField, QaItem, SearchResult, Theme, DEFAULT_UI_SCALE,
    UI_SCALE_STEPS,
};
use docqa_core::ports::{PortError, PortResult, SlotStorage};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

//=========================================================================================
// Slot Names
//=========================================================================================

/// The named slots the application persists. One flat JSON payload each.
pub mod slots {
    pub const DOCUMENTS: &str = "docs";
    pub const QA: &str = "qa";
    pub const SEARCH: &str = "search";
    pub const THEME: &str = "theme";
    pub const SCALE: &str = "scale";
}

//=========================================================================================
// PersistedSlot
//=========================================================================================

/// Binds an in-memory value to a named slot in durable storage.
///
/// On open the slot is read and deserialized; a missing slot or an
/// unreadable payload falls back to the supplied default (logged, never
/// surfaced). Every mutation serializes and writes through to the slot
/// before the in-memory value is replaced, so state survives a restart.
pub struct PersistedSlot<T> {
    slot: String,
    storage: Arc<dyn SlotStorage>,
    value: Mutex<T>,
}

impl<T> PersistedSlot<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Opens the named slot, hydrating from storage or the default.
    pub fn open(storage: Arc<dyn SlotStorage>, slot: &str, default: T) -> Self {
        let value = match storage.read(slot) {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Slot '{}' held an unreadable payload, using the default: {}", slot, e);
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!("Slot '{}' could not be read, using the default: {}", slot, e);
                default
            }
        };

        Self {
            slot: slot.to_string(),
            storage,
            value: Mutex::new(value),
        }
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Replaces the value outright.
    pub fn set(&self, value: T) -> PortResult<()> {
        self.update(|_| value)?;
        Ok(())
    }

    /// Replaces the value with a function of the previous value, applied
    /// against the latest in-memory snapshot under the slot's lock.
    pub fn update<F>(&self, f: F) -> PortResult<T>
    where
        F: FnOnce(&T) -> T,
    {
        let mut guard = self.value.lock();
        let next = f(&guard);
        let payload =
            serde_json::to_string(&next).map_err(|e| PortError::Storage(e.to_string()))?;
        self.storage.write(&self.slot, &payload)?;
        *guard = next.clone();
        Ok(next)
    }
}

//=========================================================================================
// AppStore
//=========================================================================================

/// The durable application state and the operations against it.
///
/// Upload progress is deliberately absent: it is ephemeral and lives in the
/// upload manager, never in a slot.
pub struct AppStore {
    documents: PersistedSlot<Vec<DocumentMeta>>,
    qa_items: PersistedSlot<Vec<QaItem>>,
    search_query: PersistedSlot<String>,
    theme: PersistedSlot<Theme>,
    ui_scale: PersistedSlot<f64>,
}

impl AppStore {
    /// Opens every slot against the given storage backend.
    pub fn open(storage: Arc<dyn SlotStorage>) -> Self {
        Self {
            documents: PersistedSlot::open(storage.clone(), slots::DOCUMENTS, Vec::new()),
            qa_items: PersistedSlot::open(storage.clone(), slots::QA, Vec::new()),
            search_query: PersistedSlot::open(storage.clone(), slots::SEARCH, String::new()),
            theme: PersistedSlot::open(storage.clone(), slots::THEME, Theme::System),
            ui_scale: PersistedSlot::open(storage, slots::SCALE, DEFAULT_UI_SCALE),
        }
    }

    // --- Documents ---

    pub fn documents(&self) -> Vec<DocumentMeta> {
        self.documents.get()
    }

    pub fn document(&self, doc_id: &str) -> Option<DocumentMeta> {
        self.documents.get().into_iter().find(|d| d.id == doc_id)
    }

    /// Prepends a freshly uploaded document, newest first.
    pub fn add_document(&self, document: DocumentMeta) -> PortResult<()> {
        self.documents.update(|prev| {
            let mut next = Vec::with_capacity(prev.len() + 1);
            next.push(document.clone());
            next.extend(prev.iter().cloned());
            next
        })?;
        Ok(())
    }

    /// Removes a document and cascades to every Q&A record that references
    /// it. Both slots are updated as part of the same operation.
    pub fn remove_document(&self, doc_id: &str) -> PortResult<()> {
        if self.document(doc_id).is_none() {
            return Err(PortError::NotFound(format!("Document {} not found", doc_id)));
        }
        self.documents
            .update(|prev| prev.iter().filter(|d| d.id != doc_id).cloned().collect())?;
        self.qa_items
            .update(|prev| prev.iter().filter(|qa| qa.doc_id != doc_id).cloned().collect())?;
        Ok(())
    }

    // --- Q&A ---

    pub fn qa_items(&self) -> Vec<QaItem> {
        self.qa_items.get()
    }

    /// Prepends a completed Q&A record. Pending records never reach here.
    pub fn add_qa_item(&self, qa_item: QaItem) -> PortResult<()> {
        self.qa_items.update(|prev| {
            let mut next = Vec::with_capacity(prev.len() + 1);
            next.push(qa_item.clone());
            next.extend(prev.iter().cloned());
            next
        })?;
        Ok(())
    }

    pub fn qa_for_doc(&self, doc_id: &str) -> Vec<QaItem> {
        self.qa_items
            .get()
            .into_iter()
            .filter(|qa| qa.doc_id == doc_id)
            .collect()
    }

    // --- Export ---

    /// The downloadable export of one document's Q&A history.
    pub fn export(&self, doc_id: &str) -> PortResult<ExportBundle> {
        let document = self
            .document(doc_id)
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", doc_id)))?;
        let qa_items = self.qa_for_doc(doc_id);
        let total_questions = qa_items.len();

        Ok(ExportBundle {
            document,
            qa_items,
            exported_at: chrono::Utc::now(),
            total_questions,
        })
    }

    // --- Search ---

    /// Linear scan over the Q&A history: case-insensitive substring match,
    /// independently against question and answer text. A record whose
    /// owning document no longer exists is skipped. An empty or whitespace
    /// query yields no results.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let documents = self.documents.get();
        let mut results = Vec::new();

        for qa_item in self.qa_items.get() {
            let Some(document) = documents.iter().find(|d| d.id == qa_item.doc_id) else {
                continue;
            };

            if qa_item.question.to_lowercase().contains(&query) {
                results.push(SearchResult {
                    qa_item: qa_item.clone(),
                    document: document.clone(),
                    matched_text: qa_item.question.clone(),
                    field: MatchField::Question,
                });
            }

            if qa_item.answer.to_lowercase().contains(&query) {
                results.push(SearchResult {
                    qa_item: qa_item.clone(),
                    document: document.clone(),
                    matched_text: qa_item.answer.clone(),
                    field: MatchField::Answer,
                });
            }
        }

        results
    }

    // --- Settings ---

    pub fn search_query(&self) -> String {
        self.search_query.get()
    }

    pub fn set_search_query(&self, query: &str) -> PortResult<()> {
        self.search_query.set(query.to_string())
    }

    pub fn theme(&self) -> Theme {
        self.theme.get()
    }

    pub fn set_theme(&self, theme: Theme) -> PortResult<()> {
        self.theme.set(theme)
    }

    /// Advances the theme through the light -> dark -> system cycle.
    pub fn cycle_theme(&self) -> PortResult<Theme> {
        self.theme.update(|prev| prev.next())
    }

    pub fn ui_scale(&self) -> f64 {
        self.ui_scale.get()
    }

    /// Persists the UI scale, snapped to the nearest discrete step. The
    /// browser UI only produces the listed steps; an HTTP client can send
    /// anything.
    pub fn set_ui_scale(&self, scale: f64) -> PortResult<f64> {
        let snapped = UI_SCALE_STEPS
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - scale)
                    .abs()
                    .partial_cmp(&(b - scale).abs())
                    .expect("scale steps are finite")
            })
            .unwrap_or(DEFAULT_UI_SCALE);
        self.ui_scale.set(snapped)?;
        Ok(snapped)
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use docqa_core::id;

    fn test_store() -> (AppStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = AppStore::open(storage.clone());
        (store, storage)
    }

    fn doc(name: &str) -> DocumentMeta {
        DocumentMeta {
            id: id::doc_id(),
            name: name.to_string(),
            size: 1234,
            mime_type: "text/plain".to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    fn qa(doc_id: &str, question: &str, answer: &str) -> QaItem {
        QaItem {
            id: id::qa_id(),
            doc_id: doc_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn slot_value_survives_a_reopen() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let slot = PersistedSlot::open(
                storage.clone() as Arc<dyn SlotStorage>,
                "counter",
                0u32,
            );
            slot.set(7).unwrap();
        }
        let slot = PersistedSlot::open(storage as Arc<dyn SlotStorage>, "counter", 0u32);
        assert_eq!(slot.get(), 7);
    }

    #[test]
    fn corrupt_slot_payload_falls_back_to_default() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write("counter", "{not json").unwrap();
        let slot = PersistedSlot::open(storage as Arc<dyn SlotStorage>, "counter", 42u32);
        assert_eq!(slot.get(), 42);
    }

    #[test]
    fn update_sees_the_latest_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let slot = PersistedSlot::open(storage as Arc<dyn SlotStorage>, "counter", 0u32);
        for _ in 0..10 {
            slot.update(|prev| prev + 1).unwrap();
        }
        assert_eq!(slot.get(), 10);
    }

    #[test]
    fn documents_are_listed_newest_first() {
        let (store, _) = test_store();
        let first = doc("a.txt");
        let second = doc("b.txt");
        store.add_document(first.clone()).unwrap();
        store.add_document(second.clone()).unwrap();

        let docs = store.documents();
        assert_eq!(docs[0].id, second.id);
        assert_eq!(docs[1].id, first.id);
    }

    #[test]
    fn removing_a_document_cascades_to_its_qa_records_and_no_others() {
        let (store, _) = test_store();
        let keep = doc("keep.txt");
        let gone = doc("gone.txt");
        store.add_document(keep.clone()).unwrap();
        store.add_document(gone.clone()).unwrap();

        store.add_qa_item(qa(&keep.id, "kept?", "yes")).unwrap();
        store.add_qa_item(qa(&gone.id, "first?", "a")).unwrap();
        store.add_qa_item(qa(&gone.id, "second?", "b")).unwrap();

        store.remove_document(&gone.id).unwrap();

        assert!(store.document(&gone.id).is_none());
        assert!(store.qa_for_doc(&gone.id).is_empty());
        let remaining = store.qa_items();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].doc_id, keep.id);
    }

    #[test]
    fn removing_an_unknown_document_is_not_found() {
        let (store, _) = test_store();
        assert!(matches!(
            store.remove_document("doc_missing"),
            Err(PortError::NotFound(_))
        ));
    }

    #[test]
    fn search_matches_question_and_answer_independently() {
        let (store, _) = test_store();
        let d = doc("notes.md");
        store.add_document(d.clone()).unwrap();
        store
            .add_qa_item(qa(&d.id, "What is Rust?", "Rust is a systems language."))
            .unwrap();
        store
            .add_qa_item(qa(&d.id, "Why rust forms on iron?", "Oxidation."))
            .unwrap();

        // "rust" appears in both questions and one answer.
        let results = store.search("rust");
        assert_eq!(results.len(), 3);
        let question_hits = results
            .iter()
            .filter(|r| r.field == MatchField::Question)
            .count();
        assert_eq!(question_hits, 2);

        // Case-insensitive containment.
        let results = store.search("OXID");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].field, MatchField::Answer);
        assert_eq!(results[0].matched_text, "Oxidation.");
    }

    #[test]
    fn blank_queries_yield_no_results() {
        let (store, _) = test_store();
        let d = doc("notes.md");
        store.add_document(d.clone()).unwrap();
        store.add_qa_item(qa(&d.id, "anything", "at all")).unwrap();

        assert!(store.search("").is_empty());
        assert!(store.search("   ").is_empty());
    }

    #[test]
    fn search_skips_records_whose_document_is_missing() {
        let (store, _) = test_store();
        let d = doc("notes.md");
        store.add_document(d.clone()).unwrap();
        // Orphan record, e.g. left over from an interrupted cascade.
        store.add_qa_item(qa("doc_orphan", "match me", "match me")).unwrap();
        store.add_qa_item(qa(&d.id, "match me too", "ok")).unwrap();

        let results = store.search("match");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].qa_item.doc_id, d.id);
    }

    #[test]
    fn export_counts_exactly_the_documents_records() {
        let (store, _) = test_store();
        let d = doc("report.pdf");
        let other = doc("other.pdf");
        store.add_document(d.clone()).unwrap();
        store.add_document(other.clone()).unwrap();
        store.add_qa_item(qa(&d.id, "q1", "a1")).unwrap();
        store.add_qa_item(qa(&d.id, "q2", "a2")).unwrap();
        store.add_qa_item(qa(&other.id, "q3", "a3")).unwrap();

        let bundle = store.export(&d.id).unwrap();
        assert_eq!(bundle.total_questions, 2);
        assert_eq!(bundle.qa_items, store.qa_for_doc(&d.id));
        assert_eq!(bundle.document.id, d.id);

        assert!(matches!(
            store.export("doc_missing"),
            Err(PortError::NotFound(_))
        ));
    }

    #[test]
    fn theme_cycles_light_dark_system() {
        let (store, _) = test_store();
        store.set_theme(Theme::Light).unwrap();
        assert_eq!(store.cycle_theme().unwrap(), Theme::Dark);
        assert_eq!(store.cycle_theme().unwrap(), Theme::System);
        assert_eq!(store.cycle_theme().unwrap(), Theme::Light);
    }

    #[test]
    fn ui_scale_snaps_to_the_nearest_step() {
        let (store, _) = test_store();
        assert_eq!(store.set_ui_scale(0.84).unwrap(), 0.85);
        assert_eq!(store.set_ui_scale(0.2).unwrap(), 0.8);
        assert_eq!(store.set_ui_scale(3.0).unwrap(), 1.0);
        assert_eq!(store.ui_scale(), 1.0);
    }

    #[test]
    fn store_state_survives_a_reopen() {
        let storage = Arc::new(MemoryStorage::new());
        let d = doc("persisted.txt");
        {
            let store = AppStore::open(storage.clone());
            store.add_document(d.clone()).unwrap();
            store.set_search_query("carried over").unwrap();
        }
        let store = AppStore::open(storage);
        assert_eq!(store.document(&d.id).unwrap().name, "persisted.txt");
        assert_eq!(store.search_query(), "carried over");
    }
}
