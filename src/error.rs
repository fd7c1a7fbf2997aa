use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("検出に失敗しました。バックエンドへの接続を確認してください ({0})")]
    Transport(String),

    #[error("検出レスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("対話入力エラー: {0}")]
    Prompt(String),

    #[error(transparent)]
    Common(#[from] safety_detect_common::Error),
}

impl From<reqwest::Error> for DetectError {
    fn from(err: reqwest::Error) -> Self {
        DetectError::Transport(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for DetectError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        DetectError::ExcelGeneration(err.to_string())
    }
}

impl From<dialoguer::Error> for DetectError {
    fn from(err: dialoguer::Error) -> Self {
        DetectError::Prompt(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
