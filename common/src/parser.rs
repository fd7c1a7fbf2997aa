//! 検出レスポンスのパースとData URLユーティリティ

use crate::error::{Error, Result};
use crate::types::DetectResponse;
use base64::Engine;
use serde_json::Value;

/// 検出エンドポイントのレスポンス本文をパース
///
/// `detections` を持たず `detail` / `error` だけを返すボディはサーバー側エラーとみなす。
pub fn parse_detect_response(body: &str) -> Result<DetectResponse> {
    let value: Value = serde_json::from_str(body.trim())?;

    let Some(object) = value.as_object() else {
        return Err(Error::InvalidResponse("JSON object expected".to_string()));
    };

    if !object.contains_key("detections") {
        let message = object
            .get("detail")
            .or_else(|| object.get("error"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "detections missing".to_string());
        return Err(Error::InvalidResponse(message));
    }

    Ok(serde_json::from_value(value)?)
}

/// Data URLからBase64データ部分を抽出
///
/// # Arguments
/// * `data_url` - "data:image/png;base64,iVBOR..." 形式のData URL
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    data_url.split(',').nth(1)
}

/// Data URLからMIMEタイプを抽出（取れなければ "image/png"）
pub fn extract_mime_type_from_data_url(data_url: &str) -> &str {
    data_url
        .strip_prefix("data:")
        .and_then(|s| s.split(';').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("image/png")
}

/// バイト列からData URLを作る
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detect_response() {
        let body = r#"{
            "detections": [{"class": "FireExtinguisher", "conf": 0.91, "box": [1.0, 2.0, 3.0, 4.0]}],
            "image": "AAAA",
            "class_counts": {"FireExtinguisher": 1, "ToolBox": 0, "OxygenTank": 0},
            "confidences": [0.91]
        }"#;

        let response = parse_detect_response(body).expect("パース失敗");
        assert_eq!(response.detections[0].class_name, "FireExtinguisher");
        assert_eq!(response.class_counts.len(), 3);
        assert_eq!(response.confidences, vec![0.91]);
    }

    #[test]
    fn test_parse_empty_detections() {
        let response = parse_detect_response(r#"{"detections": [], "image": ""}"#).unwrap();
        assert!(response.detections.is_empty());
    }

    #[test]
    fn test_parse_server_error_detail() {
        let err = parse_detect_response(r#"{"detail": "There was an error parsing the body"}"#)
            .unwrap_err();
        match err {
            Error::InvalidResponse(message) => assert!(message.contains("parsing the body")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_object() {
        assert!(matches!(
            parse_detect_response("[1, 2]"),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(parse_detect_response("<html>"), Err(Error::Json(_))));
    }

    #[test]
    fn test_parse_wrong_box_shape() {
        let body = r#"{"detections": [{"class": "ToolBox", "conf": 0.5, "box": [1, 2]}]}"#;
        assert!(matches!(parse_detect_response(body), Err(Error::Json(_))));
    }

    #[test]
    fn test_data_url_helpers() {
        let url = to_data_url("image/jpeg", b"abc");
        assert_eq!(url, "data:image/jpeg;base64,YWJj");
        assert_eq!(extract_base64_from_data_url(&url), Some("YWJj"));
        assert_eq!(extract_mime_type_from_data_url(&url), "image/jpeg");
        assert_eq!(extract_mime_type_from_data_url("blob:xyz"), "image/png");
        assert_eq!(extract_base64_from_data_url("no-comma"), None);
    }
}
