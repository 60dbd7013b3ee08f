pub mod domain;
pub mod id;
pub mod ports;

pub use domain::{
    DocumentMeta, ExportBundle, IncomingFile, MatchField, QaItem, SearchResult, Theme,
    UploadProgress, UploadStatus,
};
pub use ports::{AnswerService, PortError, PortResult, RandomSource, SlotStorage};
