pub mod answer;
pub mod random;
pub mod storage;

pub use answer::TemplateAnswerAdapter;
pub use random::{SeededSource, ThreadRngSource};
pub use storage::{JsonFileStorage, MemoryStorage};
