//! ダウンロード用の整形と表示用サマリ
//!
//! - detections.json / detections.csv の本文生成
//! - アノテーション画像（Base64 PNG）のデコード
//! - クラス数・信頼度の表示文字列

use crate::error::Result;
use crate::parser::extract_base64_from_data_url;
use crate::types::{ClassCounts, Detection};
use base64::Engine;

/// CSVヘッダ
pub const CSV_HEADER: &str = "class,confidence,box";

/// 検出リストからクラス数を数える
pub fn count_classes(detections: &[Detection]) -> ClassCounts {
    let mut counts = ClassCounts::new();
    for det in detections {
        *counts.entry(det.class_name.clone()).or_insert(0) += 1;
    }
    counts
}

/// CSVフィールド（区切り文字・引用符・改行を含む場合のみクォート）
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `[x1 y1 x2 y2]` 形式
pub fn format_box_brackets(bbox: &[f64; 4]) -> String {
    let coords: Vec<String> = bbox.iter().map(|v| v.to_string()).collect();
    format!("[{}]", coords.join(" "))
}

/// detections.csv の本文
pub fn detections_to_csv(detections: &[Detection]) -> String {
    let mut lines = vec![CSV_HEADER.to_string()];
    lines.extend(detections.iter().map(|d| {
        format!(
            "{},{},{}",
            csv_field(&d.class_name),
            d.conf,
            format_box_brackets(&d.bbox)
        )
    }));
    lines.join("\n")
}

/// detections.json の本文（整形済み）
pub fn detections_to_json(detections: &[Detection]) -> Result<String> {
    Ok(serde_json::to_string_pretty(detections)?)
}

/// Base64 PNGをバイト列に戻す（Data URLも可）
pub fn decode_image(image_base64: &str) -> Result<Vec<u8>> {
    let image_base64 = image_base64.trim();
    let data = if image_base64.starts_with("data:") {
        extract_base64_from_data_url(image_base64).unwrap_or_default()
    } else {
        image_base64
    };
    Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
}

/// 信頼度をパーセント表記（小数1桁）
pub fn format_percent(conf: f64) -> String {
    format!("{:.1}%", conf * 100.0)
}

/// "cls: n, cls: n"
pub fn format_class_counts(counts: &ClassCounts) -> String {
    counts
        .iter()
        .map(|(class_name, count)| format!("{}: {}", class_name, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// "83.0%, 52.1%"
pub fn format_confidences(confidences: &[f64]) -> String {
    confidences
        .iter()
        .map(|&c| format_percent(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 表示用の座標（整数に丸めてカンマ区切り）
pub fn format_box(bbox: &[f64; 4]) -> String {
    bbox.iter()
        .map(|v| format!("{:.0}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// グラフ用の ("Det 1", 信頼度) 列
pub fn confidence_series(confidences: &[f64]) -> Vec<(String, f64)> {
    confidences
        .iter()
        .enumerate()
        .map(|(i, &c)| (format!("Det {}", i + 1), c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_single_detection() {
        let detections = vec![Detection::new("Fire Extinguisher", 0.83, [10.0, 20.0, 30.0, 40.0])];

        assert_eq!(
            detections_to_csv(&detections),
            "class,confidence,box\nFire Extinguisher,0.83,[10 20 30 40]"
        );
    }

    #[test]
    fn test_csv_fractional_box_and_empty() {
        let detections = vec![Detection::new("ToolBox", 0.5, [1.5, 2.25, 300.0, 400.75])];
        assert_eq!(
            detections_to_csv(&detections),
            "class,confidence,box\nToolBox,0.5,[1.5 2.25 300 400.75]"
        );
        assert_eq!(detections_to_csv(&[]), "class,confidence,box");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("ToolBox"), "ToolBox");
        assert_eq!(csv_field("Tank, Oxygen"), "\"Tank, Oxygen\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_is_pretty_array() {
        let detections = vec![Detection::new("OxygenTank", 0.7, [0.0, 0.0, 1.0, 1.0])];
        let json = detections_to_json(&detections).unwrap();

        assert!(json.starts_with("[\n"));
        assert!(json.contains("\"class\": \"OxygenTank\""));
        let parsed: Vec<Detection> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, detections);
    }

    #[test]
    fn test_decode_image() {
        let bytes = decode_image("iVBORw0KGgo=").unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        assert!(decode_image("not base64!").is_err());
        assert_eq!(decode_image("data:image/png;base64,iVBORw0KGgo=").unwrap(), bytes);
    }

    #[test]
    fn test_count_classes() {
        let detections = vec![
            Detection::new("ToolBox", 0.9, [0.0; 4]),
            Detection::new("OxygenTank", 0.9, [0.0; 4]),
            Detection::new("ToolBox", 0.6, [0.0; 4]),
        ];
        let counts = count_classes(&detections);
        assert_eq!(counts.get("ToolBox"), Some(&2));
        assert_eq!(format_class_counts(&counts), "OxygenTank: 1, ToolBox: 2");
    }

    #[test]
    fn test_format_confidences_and_box() {
        assert_eq!(format_percent(0.8312), "83.1%");
        assert_eq!(format_confidences(&[0.83, 0.5]), "83.0%, 50.0%");
        assert_eq!(format_box(&[10.4, 20.6, 30.0, 40.49]), "10, 21, 30, 40");
    }

    #[test]
    fn test_confidence_series() {
        let series = confidence_series(&[0.9, 0.4]);
        assert_eq!(series, vec![("Det 1".to_string(), 0.9), ("Det 2".to_string(), 0.4)]);
    }
}
