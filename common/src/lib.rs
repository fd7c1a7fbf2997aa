//! Safety Detect Common Library
//!
//! CLIとWeb(WASM)で共有される型・検出履歴ストア・エクスポート整形

pub mod types;
pub mod error;
pub mod history;
pub mod feedback;
pub mod export;
pub mod parser;

pub use types::{ClassCounts, Detection, DetectionRecord, DetectResponse, RecordId};
pub use error::{Error, Result};
pub use history::{
    Clock, Confirm, DetectionHistory, Dispatched, HistoryAction, ManualClock, PendingUndo,
    PreviewEntry, StagedRecord, SystemClock, UndoKind, DEFAULT_UNDO_WINDOW,
};
pub use feedback::{FeedbackItem, FeedbackLog, DEFAULT_LOW_CONFIDENCE};
pub use export::{
    confidence_series, count_classes, decode_image, detections_to_csv, detections_to_json,
    format_box, format_class_counts, format_confidences, format_percent,
};
pub use parser::{extract_base64_from_data_url, extract_mime_type_from_data_url, parse_detect_response, to_data_url};
