//! エラー型定義

use crate::types::RecordId;
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Duplicate detection id: {0}")]
    DuplicateId(RecordId),

    #[error("Invalid detection response: {0}")]
    InvalidResponse(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
