//! services/api/tests/qa_flow.rs
//!
//! End-to-end flow over the wired engine: upload a document, ask against
//! it, search the history, export it, then delete and watch the cascade.

use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::{MemoryStorage, TemplateAnswerAdapter, ThreadRngSource};
use api_lib::config::Config;
use api_lib::web::{AppState, AskTiming, UploadTiming};
use docqa_core::domain::{IncomingFile, MatchField};
use docqa_core::ports::PortError;

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        data_dir: ".".into(),
        log_level: tracing::Level::INFO,
        allowed_origin: "http://localhost:3000".to_string(),
    })
}

fn state_with_upload_timing(upload_timing: UploadTiming) -> Arc<AppState> {
    let ask_timing = AskTiming {
        delay_min_ms: 1,
        delay_max_ms: 2,
    };

    Arc::new(AppState::with_timing(
        test_config(),
        Arc::new(MemoryStorage::new()),
        Arc::new(TemplateAnswerAdapter::new()),
        Arc::new(ThreadRngSource),
        upload_timing,
        ask_timing,
        Duration::from_millis(30),
    ))
}

fn test_state() -> Arc<AppState> {
    // Compressed timings and no injected failure: the flow is about the
    // state transitions, not the failure branch.
    state_with_upload_timing(UploadTiming {
        tick_min_ms: 1,
        tick_max_ms: 2,
        failure_probability: 0.0,
        done_linger_ms: 10,
        ..UploadTiming::default()
    })
}

fn file(name: &str) -> IncomingFile {
    IncomingFile {
        name: name.to_string(),
        size: 4096,
        mime_type: "application/pdf".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn upload_ask_search_export_delete() {
    let state = test_state();

    // --- Upload two documents through the simulated transfer ---
    let report = state.uploads.start(file("report.pdf")).await.unwrap();
    state.store.add_document(report.clone()).unwrap();
    let notes = state.uploads.start(file("notes.pdf")).await.unwrap();
    state.store.add_document(notes.clone()).unwrap();

    assert_eq!(state.store.documents().len(), 2);
    // Newest first.
    assert_eq!(state.store.documents()[0].id, notes.id);

    // --- Ask questions against one of them ---
    let first = state
        .asks
        .ask(Some(&report.id), "What is the executive summary?")
        .await
        .unwrap();
    let second = state
        .asks
        .ask(Some(&report.id), "Why does revenue matter?")
        .await
        .unwrap();
    state
        .asks
        .ask(Some(&notes.id), "How should we summarize this?")
        .await
        .unwrap();

    assert_eq!(state.store.qa_items().len(), 3);
    assert_eq!(state.store.qa_for_doc(&report.id).len(), 2);

    // Asking with no selection never mutates the history.
    let rejected = state.asks.ask(None, "Anything?").await;
    assert!(matches!(rejected, Err(PortError::NoDocumentSelected)));
    assert_eq!(state.store.qa_items().len(), 3);

    // --- Search settles after the debounce window ---
    state.search.set_query("revenue").unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    // "revenue" is both in the question and, as an extracted keyword, in
    // the templated answer: one result per matching field.
    let results = state.search.results();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.qa_item.id == second.id));
    assert_eq!(results[0].field, MatchField::Question);
    assert_eq!(results[1].field, MatchField::Answer);

    // --- Export carries exactly the document's records ---
    let bundle = state.store.export(&report.id).unwrap();
    assert_eq!(bundle.total_questions, 2);
    assert_eq!(bundle.qa_items, state.store.qa_for_doc(&report.id));
    assert!(bundle.qa_items.iter().any(|qa| qa.id == first.id));

    // --- Cascade delete removes the document's records and no others ---
    state.store.remove_document(&report.id).unwrap();
    assert!(state.store.document(&report.id).is_none());
    assert!(state.store.qa_for_doc(&report.id).is_empty());
    assert_eq!(state.store.qa_items().len(), 1);
    assert_eq!(state.store.qa_items()[0].doc_id, notes.id);

    // The deleted document's records are gone from search too.
    state.search.set_query("revenue").unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(state.search.results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn canceled_upload_never_creates_a_document() {
    // Slow ticks so the cancel lands mid-transfer.
    let slow = state_with_upload_timing(UploadTiming {
        tick_min_ms: 500,
        tick_max_ms: 500,
        failure_probability: 0.0,
        ..UploadTiming::default()
    });

    let task = {
        let slow = slow.clone();
        tokio::spawn(async move { slow.uploads.start(file("canceled.pdf")).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    let doc_id = slow.uploads.snapshot()[0].doc_id.clone();
    assert!(slow.uploads.cancel(&doc_id));

    let result = task.await.unwrap();
    assert!(matches!(result, Err(PortError::UploadCancelled)));
    assert!(slow.uploads.snapshot().is_empty());
    assert!(slow.store.documents().is_empty());
}
