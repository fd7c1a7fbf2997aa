pub mod excel;

use crate::cli::ExportFormat;
use crate::error::Result;
use log::warn;
use safety_detect_common::{decode_image, detections_to_csv, detections_to_json, DetectResponse};
use std::path::{Path, PathBuf};

pub const IMAGE_FILE_NAME: &str = "detection_result.png";
pub const JSON_FILE_NAME: &str = "detections.json";
pub const CSV_FILE_NAME: &str = "detections.csv";
pub const EXCEL_FILE_NAME: &str = "detections.xlsx";

/// 出力ファイル名（接頭辞があれば "<prefix>_<name>"）
fn output_path(output_dir: &Path, prefix: Option<&str>, name: &str) -> PathBuf {
    match prefix {
        Some(prefix) if !prefix.is_empty() => output_dir.join(format!("{}_{}", prefix, name)),
        _ => output_dir.join(name),
    }
}

pub fn excel_path(output_dir: &Path) -> PathBuf {
    output_dir.join(EXCEL_FILE_NAME)
}

/// 1回分の検出結果からダウンロードファイル（PNG/JSON/CSV）を書き出す
///
/// Excelは複数結果をまとめて `excel::generate_excel` で出力する。
pub fn write_downloads(
    response: &DetectResponse,
    format: ExportFormat,
    output_dir: &Path,
    prefix: Option<&str>,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    if format.includes(ExportFormat::Png) {
        if response.image.is_empty() {
            warn!("レスポンスに画像が含まれていないためPNGを出力しません");
        } else {
            let path = output_path(output_dir, prefix, IMAGE_FILE_NAME);
            std::fs::write(&path, decode_image(&response.image)?)?;
            written.push(path);
        }
    }

    if format.includes(ExportFormat::Json) {
        let path = output_path(output_dir, prefix, JSON_FILE_NAME);
        std::fs::write(&path, detections_to_json(&response.detections)?)?;
        written.push(path);
    }

    if format.includes(ExportFormat::Csv) {
        let path = output_path(output_dir, prefix, CSV_FILE_NAME);
        std::fs::write(&path, detections_to_csv(&response.detections))?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_prefix() {
        let dir = Path::new("/tmp/out");
        assert_eq!(
            output_path(dir, Some("site"), CSV_FILE_NAME),
            PathBuf::from("/tmp/out/site_detections.csv")
        );
        assert_eq!(output_path(dir, None, CSV_FILE_NAME), PathBuf::from("/tmp/out/detections.csv"));
        assert_eq!(output_path(dir, Some(""), JSON_FILE_NAME), PathBuf::from("/tmp/out/detections.json"));
    }
}
