//! 検出エンドポイント連携
//!
//! 画像をmultipart/form-data（フィールド名 `file`）でPOSTし、
//! JSONレスポンスを `DetectResponse` に変換する。再試行はしない。

use crate::error::{DetectError, Result};
use crate::scanner::ImageInfo;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use safety_detect_common::{parse_detect_response, to_data_url, DetectResponse};
use std::time::Duration;

/// エラーメッセージに含めるレスポンス本文の最大長
const MAX_ERROR_BODY: usize = 200;

/// アップロードする画像
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn read(image: &ImageInfo) -> Result<Self> {
        if !image.path.exists() {
            return Err(DetectError::FileNotFound(image.path.display().to_string()));
        }
        let bytes = std::fs::read(&image.path)?;
        let mime_type = sniff_mime_type(&bytes)
            .map_err(|e| DetectError::ImageLoad(format!("{}: {}", image.file_name, e)))?;

        Ok(Self {
            file_name: image.file_name.clone(),
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    /// 入力プレビュー用のData URL
    pub fn data_url(&self) -> String {
        to_data_url(&self.mime_type, &self.bytes)
    }
}

/// 先頭バイトから画像形式を判定してMIMEタイプを返す
pub fn sniff_mime_type(bytes: &[u8]) -> std::result::Result<&'static str, String> {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .map_err(|e| e.to_string())
}

pub struct DetectClient {
    http: reqwest::Client,
    endpoint: String,
}

impl DetectClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn detect(&self, upload: &Upload) -> Result<DetectResponse> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;
        let form = Form::new().part("file", part);

        debug!(
            "POST {} ({}, {} bytes)",
            self.endpoint,
            upload.file_name,
            upload.bytes.len()
        );

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DetectError::Transport(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, MAX_ERROR_BODY)
            )));
        }

        let parsed = parse_detect_response(&body).map_err(|e| DetectError::ApiParse(e.to_string()))?;
        info!(
            "{}: {} detection(s)",
            upload.file_name,
            parsed.detections.len()
        );
        Ok(parsed)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_sniff_mime_type() {
        assert_eq!(sniff_mime_type(PNG_SIGNATURE), Ok("image/png"));
        assert_eq!(sniff_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), Ok("image/jpeg"));
        assert!(sniff_mime_type(b"hello world").is_err());
    }

    #[test]
    fn test_upload_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tank.png");
        std::fs::write(&path, PNG_SIGNATURE).unwrap();

        let upload = Upload::read(&ImageInfo::from_path(&path)).unwrap();
        assert_eq!(upload.file_name, "tank.png");
        assert_eq!(upload.mime_type, "image/png");
        assert!(upload.data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_upload_read_missing_file() {
        let info = ImageInfo::from_path(std::path::Path::new("/nonexistent/x.png"));
        assert!(matches!(Upload::read(&info), Err(DetectError::FileNotFound(_))));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("  short ", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
