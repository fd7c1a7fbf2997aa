//! Excel生成（CLI版）
//!
//! 検出履歴をシート2枚のブックにまとめる:
//! - Detections: 検出1件につき1行
//! - Summary: クラスごとの合計

use crate::error::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use safety_detect_common::{ClassCounts, DetectionRecord};
use std::path::Path;

const DETECTION_HEADERS: [&str; 8] = ["Date", "File", "Class", "Confidence", "x1", "y1", "x2", "y2"];

/// クラス別合計（全レコード）
pub fn total_class_counts(records: &[DetectionRecord]) -> ClassCounts {
    let mut totals = ClassCounts::new();
    for record in records {
        for (class_name, count) in &record.class_counts {
            *totals.entry(class_name.clone()).or_insert(0) += count;
        }
    }
    totals
}

pub fn generate_excel(records: &[DetectionRecord], output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0xFFFFFF))
        .set_background_color(Color::RGB(0x1B1A55))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let percent_format = Format::new().set_num_format("0.0%");

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Detections")?;

        for (col, header) in DETECTION_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        sheet.set_column_width(0, 22)?;
        sheet.set_column_width(1, 28)?;
        sheet.set_column_width(2, 20)?;
        sheet.set_column_width(3, 12)?;

        let mut row: u32 = 1;
        for record in records {
            for det in &record.detections {
                sheet.write_string(row, 0, record.date.as_str())?;
                sheet.write_string(row, 1, record.filename.as_str())?;
                sheet.write_string(row, 2, det.class_name.as_str())?;
                sheet.write_number_with_format(row, 3, det.conf, &percent_format)?;
                for (i, coord) in det.bbox.iter().enumerate() {
                    sheet.write_number(row, 4 + i as u16, *coord)?;
                }
                row += 1;
            }
        }
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        sheet.write_string_with_format(0, 0, "Class", &header_format)?;
        sheet.write_string_with_format(0, 1, "Count", &header_format)?;
        sheet.set_column_width(0, 24)?;

        let mut row: u32 = 1;
        for (class_name, count) in total_class_counts(records) {
            sheet.write_string(row, 0, class_name.as_str())?;
            sheet.write_number(row, 1, count)?;
            row += 1;
        }

        sheet.write_string_with_format(row + 1, 0, "Runs", &header_format)?;
        sheet.write_number(row + 1, 1, records.len() as f64)?;
    }

    workbook.save(output_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use safety_detect_common::Detection;

    #[test]
    fn test_total_class_counts() {
        let make = |id, counts: &[(&str, u32)]| DetectionRecord {
            id,
            detections: vec![Detection::new("ToolBox", 0.9, [0.0; 4])],
            class_counts: counts.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            confidences: vec![],
            date: String::new(),
            filename: String::new(),
        };
        let records = vec![
            make(1, &[("ToolBox", 2), ("OxygenTank", 0)]),
            make(2, &[("ToolBox", 1), ("FireExtinguisher", 3)]),
        ];

        let totals = total_class_counts(&records);
        assert_eq!(totals.get("ToolBox"), Some(&3));
        assert_eq!(totals.get("OxygenTank"), Some(&0));
        assert_eq!(totals.get("FireExtinguisher"), Some(&3));
    }
}
