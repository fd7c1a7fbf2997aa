//! モデルフィードバック（低信頼度検出のフラグ付け）
//!
//! 履歴の中から信頼度が閾値未満の検出を集め、ユーザーがフラグを付けたものを
//! 再学習用のログ（CSV）として書き出す。

use crate::export::{csv_field, format_box_brackets};
use crate::history::{Clock, DetectionHistory};
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 低信頼度とみなすデフォルト閾値
pub const DEFAULT_LOW_CONFIDENCE: f64 = 0.6;

/// フラグ対象の検出1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// "<レコードID>-<検出インデックス>"
    pub id: String,
    pub record_id: RecordId,
    pub index: usize,
    pub filename: String,
    pub label: String,
    pub conf: f64,
    pub bbox: [f64; 4],
    pub flagged: bool,
}

impl FeedbackItem {
    pub fn item_id(record_id: RecordId, index: usize) -> String {
        format!("{}-{}", record_id, index)
    }
}

/// フィードバック一覧
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackLog {
    threshold: f64,
    items: Vec<FeedbackItem>,
    /// Undo待ちレコードのフラグ（項目ID → レコードID）
    #[serde(default)]
    parked: HashMap<String, RecordId>,
}

impl Default for FeedbackLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_CONFIDENCE)
    }
}

impl FeedbackLog {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            items: Vec::new(),
            parked: HashMap::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 履歴から一覧を作り直す
    ///
    /// 残った項目のフラグ状態は引き継ぐ。履歴から消えたレコードの項目は落とす。
    /// Undo待ちのレコードのフラグは保持し、Undoで戻ったときに復元する。
    pub fn sync<C: Clock>(&mut self, history: &DetectionHistory<C>) {
        let mut flagged = std::mem::take(&mut self.parked);
        flagged.extend(
            self.items
                .iter()
                .filter(|item| item.flagged)
                .map(|item| (item.id.clone(), item.record_id)),
        );
        let threshold = self.threshold;

        self.items = history
            .records()
            .iter()
            .flat_map(|record| {
                record
                    .low_confidence(threshold)
                    .map(move |(index, det)| (record, index, det))
            })
            .map(|(record, index, det)| {
                let id = FeedbackItem::item_id(record.id, index);
                FeedbackItem {
                    flagged: flagged.contains_key(&id),
                    id,
                    record_id: record.id,
                    index,
                    filename: record.filename.clone(),
                    label: det.class_name.clone(),
                    conf: det.conf,
                    bbox: det.bbox,
                }
            })
            .collect();

        // 削除・全消去で退避中のレコードはUndoに備えてフラグを残す
        let pending = history.pending_undo();
        flagged.retain(|id, record_id| {
            pending.is_some_and(|p| p.contains(*record_id))
                && !self.items.iter().any(|item| &item.id == id)
        });
        self.parked = flagged;
    }

    pub fn items(&self) -> &[FeedbackItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// フラグを反転して新しい状態を返す（該当なしはNone）
    pub fn toggle_flag(&mut self, id: &str) -> Option<bool> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        item.flagged = !item.flagged;
        Some(item.flagged)
    }

    pub fn flagged(&self) -> impl Iterator<Item = &FeedbackItem> {
        self.items.iter().filter(|item| item.flagged)
    }

    /// フラグ付き検出のCSV
    pub fn flagged_csv(&self) -> String {
        let mut lines = vec!["record_id,filename,class,confidence,box".to_string()];
        lines.extend(self.flagged().map(|item| {
            format!(
                "{},{},{},{},{}",
                item.record_id,
                csv_field(&item.filename),
                csv_field(&item.label),
                item.conf,
                format_box_brackets(&item.bbox)
            )
        }));
        lines.join("\n")
    }
}
