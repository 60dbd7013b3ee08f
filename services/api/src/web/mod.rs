pub mod qa_task;
pub mod rest;
pub mod search;
pub mod state;
pub mod upload_task;

// Re-export the pieces the binaries wire together.
pub use qa_task::{AskFlow, AskTiming};
pub use search::{SearchDebouncer, DEBOUNCE_WINDOW};
pub use state::AppState;
pub use upload_task::{UploadManager, UploadTiming};
