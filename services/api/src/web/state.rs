//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use docqa_core::ports::{AnswerService, RandomSource, SlotStorage};

use crate::config::Config;
use crate::store::AppStore;
use crate::web::qa_task::{AskFlow, AskTiming};
use crate::web::search::{SearchDebouncer, DEBOUNCE_WINDOW};
use crate::web::upload_task::{UploadManager, UploadTiming};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AppStore>,
    pub uploads: Arc<UploadManager>,
    pub asks: Arc<AskFlow>,
    pub search: Arc<SearchDebouncer>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the engine together with production timings.
    pub fn new(
        config: Arc<Config>,
        storage: Arc<dyn SlotStorage>,
        answerer: Arc<dyn AnswerService>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self::with_timing(
            config,
            storage,
            answerer,
            rng,
            UploadTiming::default(),
            AskTiming::default(),
            DEBOUNCE_WINDOW,
        )
    }

    /// Wires the engine with explicit timing knobs. Tests use this to
    /// compress the simulated delays.
    pub fn with_timing(
        config: Arc<Config>,
        storage: Arc<dyn SlotStorage>,
        answerer: Arc<dyn AnswerService>,
        rng: Arc<dyn RandomSource>,
        upload_timing: UploadTiming,
        ask_timing: AskTiming,
        debounce_window: std::time::Duration,
    ) -> Self {
        let store = Arc::new(AppStore::open(storage));
        let uploads = Arc::new(UploadManager::new(rng.clone(), upload_timing));
        let asks = Arc::new(AskFlow::new(store.clone(), answerer, rng, ask_timing));
        let search = SearchDebouncer::new(store.clone(), debounce_window);

        Self {
            store,
            uploads,
            asks,
            search,
            config,
        }
    }
}
