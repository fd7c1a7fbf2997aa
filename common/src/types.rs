//! 検出結果の型定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - Detection: モデルが返す1件のバウンディングボックス
//! - DetectResponse: 検出エンドポイントのレスポンス本体
//! - DetectionRecord: 履歴に積まれる1回分の検出結果（画像は含まない）

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 検出履歴のID（作成時刻ミリ秒ベース、単調増加）
pub type RecordId = u64;

/// クラス名 → 出現数
pub type ClassCounts = BTreeMap<String, u32>;

/// 1件の検出（クラス、信頼度、[x1, y1, x2, y2]）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_name: String,

    pub conf: f64,

    #[serde(rename = "box")]
    pub bbox: [f64; 4],
}

impl Detection {
    pub fn new(class_name: impl Into<String>, conf: f64, bbox: [f64; 4]) -> Self {
        Self {
            class_name: class_name.into(),
            conf,
            bbox,
        }
    }
}

/// 検出エンドポイントのレスポンス
///
/// `image` はData URLプレフィックスなしのBase64 PNG
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub detections: Vec<Detection>,

    #[serde(default)]
    pub class_counts: ClassCounts,

    #[serde(default)]
    pub confidences: Vec<f64>,

    #[serde(default)]
    pub image: String,
}

impl DetectResponse {
    /// アノテーション済み画像のData URL（画像が無ければNone）
    pub fn output_data_url(&self) -> Option<String> {
        if self.image.is_empty() {
            None
        } else {
            Some(format!("data:image/png;base64,{}", self.image))
        }
    }
}

/// 履歴に積まれる検出結果（メタデータのみ、プレビュー画像は別管理）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: RecordId,

    #[serde(default)]
    pub detections: Vec<Detection>,

    #[serde(default)]
    pub class_counts: ClassCounts,

    #[serde(default)]
    pub confidences: Vec<f64>,

    /// 作成日時（表示用、作成時に固定）
    #[serde(default)]
    pub date: String,

    /// アップロードした元ファイル名
    #[serde(default)]
    pub filename: String,
}

impl DetectionRecord {
    /// レスポンスから履歴レコードを作る
    ///
    /// `class_counts` / `confidences` が空なら `detections` から補完する
    pub fn from_response(
        id: RecordId,
        response: &DetectResponse,
        date: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let class_counts = if response.class_counts.is_empty() {
            crate::export::count_classes(&response.detections)
        } else {
            response.class_counts.clone()
        };

        let confidences = if response.confidences.is_empty() {
            response.detections.iter().map(|d| d.conf).collect()
        } else {
            response.confidences.clone()
        };

        Self {
            id,
            detections: response.detections.clone(),
            class_counts,
            confidences,
            date: date.into(),
            filename: filename.into(),
        }
    }

    /// 閾値未満の検出を (インデックス, 検出) で返す
    pub fn low_confidence(&self, threshold: f64) -> impl Iterator<Item = (usize, &Detection)> {
        self.detections
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.conf < threshold)
    }
}
