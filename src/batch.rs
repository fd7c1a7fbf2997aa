//! 複数画像の一括検出
//!
//! 1枚ごとに読込・検出・ダウンロードファイル出力を行う。
//! 途中で失敗した画像は記録して次の画像へ進む。

use crate::cli::ExportFormat;
use crate::client::{DetectClient, Upload};
use crate::error::Result;
use crate::export;
use crate::report;
use crate::scanner::ImageInfo;
use crate::session;
use indicatif::ProgressBar;
use log::debug;
use safety_detect_common::DetectionRecord;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 失敗した画像
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub file_name: String,
    pub message: String,
}

/// 一括検出の結果
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<DetectionRecord>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

pub async fn detect_images(
    detector: &DetectClient,
    images: &[ImageInfo],
    format: ExportFormat,
    output_dir: &Path,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    // 複数枚のときは元ファイル名を出力ファイル名の接頭辞にする
    let use_prefix = images.len() > 1;

    for (i, image) in images.iter().enumerate() {
        let prefix = use_prefix.then(|| image.stem());
        match detect_one(detector, image, i as u64 + 1, format, output_dir, prefix.as_deref()).await {
            Ok((record, written)) => {
                for path in &written {
                    println!("  → {}", path.display());
                }
                outcome.records.push(record);
                outcome.written.extend(written);
            }
            Err(e) => {
                println!("✗ {}: {}", image.file_name, e);
                outcome.failures.push(BatchFailure {
                    file_name: image.file_name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    debug!(
        "batch: {} ok, {} failed",
        outcome.records.len(),
        outcome.failures.len()
    );
    outcome
}

async fn detect_one(
    detector: &DetectClient,
    image: &ImageInfo,
    id: u64,
    format: ExportFormat,
    output_dir: &Path,
    prefix: Option<&str>,
) -> Result<(DetectionRecord, Vec<PathBuf>)> {
    let upload = Upload::read(image)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("{} を検出中...", image.file_name));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = detector.detect(&upload).await;
    spinner.finish_and_clear();
    let response = result?;

    let record =
        DetectionRecord::from_response(id, &response, session::now_string(), &upload.file_name);
    println!("✔ {}", image.file_name);
    println!("{}", report::detection_table(&response));
    println!("{}", report::stats_lines(&record));

    let written = export::write_downloads(&response, format, output_dir, prefix)?;
    Ok((record, written))
}
