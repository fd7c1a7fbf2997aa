//! 端末表示用の整形

use safety_detect_common::{
    extract_mime_type_from_data_url, format_box, format_class_counts, format_confidences,
    format_percent, Clock, DetectResponse, DetectionHistory, DetectionRecord,
};

/// 検出結果の表（Class / Confidence / Box）
pub fn detection_table(response: &DetectResponse) -> String {
    if response.detections.is_empty() {
        return "  No detections".to_string();
    }

    let width = response
        .detections
        .iter()
        .map(|d| d.class_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Class".len());

    let mut lines = vec![format!("  {:<width$}  {:>10}  {}", "Class", "Confidence", "Box [x1, y1, x2, y2]")];
    for det in &response.detections {
        lines.push(format!(
            "  {:<width$}  {:>10}  {}",
            det.class_name,
            format_percent(det.conf),
            format_box(&det.bbox)
        ));
    }
    lines.join("\n")
}

/// クラス数と信頼度の2行
pub fn stats_lines(record: &DetectionRecord) -> String {
    format!(
        "  Class Counts: {}\n  Confidences: {}",
        format_class_counts(&record.class_counts),
        format_confidences(&record.confidences)
    )
}

/// 履歴一覧の1行
pub fn record_line(record: &DetectionRecord) -> String {
    format!(
        "{}  {}  ({}件)",
        record.date,
        record.filename,
        record.detections.len()
    )
}

/// 詳細表示
pub fn record_detail<C: Clock>(history: &DetectionHistory<C>, record: &DetectionRecord) -> String {
    let preview = history.preview(record.id);
    let describe = |url: Option<&String>, label: &str, missing: &str| match url {
        Some(url) => format!("{} ({})", label, extract_mime_type_from_data_url(url)),
        None => missing.to_string(),
    };
    let input = describe(preview.and_then(|p| p.input.as_ref()), "input", "No input");
    let output = describe(preview.and_then(|p| p.output.as_ref()), "output", "No output");

    let mut lines = vec![
        format!("{} ({})", record.filename, record.id),
        format!("  {}", record.date),
        format!("  Preview: {} → {}", input, output),
        stats_lines(record),
        format!("  Detections: {}", record.detections.len()),
    ];
    lines.extend(record.detections.iter().map(|det| {
        format!(
            "    {} ({}) [ {} ]",
            det.class_name,
            format_percent(det.conf),
            format_box(&det.bbox)
        )
    }));
    lines.join("\n")
}
