//! 検出履歴ストア
//!
//! 検出結果の履歴（新しい順）とプレビュー画像キャッシュを1つの値で管理し、
//! 削除・全消去を一定時間だけ取り消せるようにする。
//!
//! - 履歴とプレビューは常に同じ操作で更新される（片方だけ残らない）
//! - Undoウィンドウは同時に1つだけ（後の削除・全消去が上書き）
//! - 期限は注入された `Clock` で判定する

mod action;
mod clock;

pub use action::{Confirm, Dispatched, HistoryAction};
pub use clock::{Clock, ManualClock, SystemClock};

use crate::error::{Error, Result};
use crate::types::{DetectionRecord, RecordId};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Undoウィンドウのデフォルト長
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(5);

/// プレビュー画像（Data URL）の組
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewEntry {
    /// アップロードした元画像
    pub input: Option<String>,
    /// アノテーション済み画像
    pub output: Option<String>,
}

impl PreviewEntry {
    /// 両方とも無い場合はエントリを作らない
    pub fn new(input: Option<String>, output: Option<String>) -> Option<Self> {
        if input.is_none() && output.is_none() {
            None
        } else {
            Some(Self { input, output })
        }
    }
}

/// 取り消し可能な操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoKind {
    Delete,
    Clear,
}

/// Undo待ちで退避しているレコード
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord {
    pub record: DetectionRecord,
    pub preview: Option<PreviewEntry>,
    /// 操作前の履歴内の位置
    pub position: usize,
}

/// 直前の破壊的操作
#[derive(Debug, Clone)]
pub struct PendingUndo {
    kind: UndoKind,
    payload: Vec<StagedRecord>,
    expires_at: u64,
    /// 退避後に先頭へ追加されたレコード数
    added_since: usize,
}

impl PendingUndo {
    pub fn kind(&self) -> UndoKind {
        self.kind
    }

    /// 退避レコード（操作前の並び順）
    pub fn payload(&self) -> &[StagedRecord] {
        &self.payload
    }

    /// 期限（ミリ秒）
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn is_expired(&self, now_millis: u64) -> bool {
        now_millis >= self.expires_at
    }

    /// 退避中のレコードか
    pub fn contains(&self, id: RecordId) -> bool {
        self.payload.iter().any(|s| s.record.id == id)
    }
}

/// 検出履歴ストア
#[derive(Debug)]
pub struct DetectionHistory<C: Clock = SystemClock> {
    /// 新しい順
    records: Vec<DetectionRecord>,
    previews: HashMap<RecordId, PreviewEntry>,
    pending: Option<PendingUndo>,
    undo_window: Duration,
    clock: C,
    last_id: RecordId,
}

impl DetectionHistory<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock, DEFAULT_UNDO_WINDOW)
    }
}

impl Default for DetectionHistory<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> DetectionHistory<C> {
    pub fn with_clock(clock: C, undo_window: Duration) -> Self {
        Self {
            records: Vec::new(),
            previews: HashMap::new(),
            pending: None,
            undo_window,
            clock,
            last_id: 0,
        }
    }

    /// 新しいレコードIDを採番
    ///
    /// 作成時刻（ミリ秒）を使い、時計が進んでいなければ前回+1にする。
    /// 削除済みのIDは再利用されない。`u64::MAX` で頭打ち。
    pub fn next_id(&mut self) -> RecordId {
        let id = self.clock.now_millis().max(self.last_id.saturating_add(1));
        self.last_id = id;
        id
    }

    /// 履歴の先頭にレコードを追加
    ///
    /// 同じIDが履歴またはUndo待ちに存在する場合は `Error::DuplicateId`。
    /// プレビューは入力・出力それぞれ省略できる。
    pub fn add_detection(
        &mut self,
        record: DetectionRecord,
        input_preview: Option<String>,
        output_preview: Option<String>,
    ) -> Result<()> {
        if self.is_known(record.id) {
            return Err(Error::DuplicateId(record.id));
        }

        self.last_id = self.last_id.max(record.id);
        if let Some(pending) = self.pending.as_mut() {
            pending.added_since += 1;
        }

        debug!("history: add {} ({})", record.id, record.filename);
        self.insert_at(0, record, PreviewEntry::new(input_preview, output_preview));
        Ok(())
    }

    /// レコードを削除してUndo待ちに退避
    ///
    /// 存在しないIDは何もしない（Undoウィンドウも変えない）。削除したらtrue。
    pub fn delete_detection(&mut self, id: RecordId) -> bool {
        let Some(position) = self.records.iter().position(|r| r.id == id) else {
            debug!("history: delete {} ignored, not found", id);
            return false;
        };

        let record = self.records.remove(position);
        let preview = self.previews.remove(&id);
        self.arm(
            UndoKind::Delete,
            vec![StagedRecord {
                record,
                preview,
                position,
            }],
        );
        true
    }

    /// 履歴とプレビューを全消去してUndo待ちに退避
    ///
    /// 消去した件数を返す。空でもUndoウィンドウは張り直される。
    pub fn clear_history(&mut self) -> usize {
        let records = std::mem::take(&mut self.records);
        let mut previews = std::mem::take(&mut self.previews);

        let payload: Vec<StagedRecord> = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                let preview = previews.remove(&record.id);
                StagedRecord {
                    record,
                    preview,
                    position,
                }
            })
            .collect();

        let count = payload.len();
        self.arm(UndoKind::Clear, payload);
        count
    }

    /// 直前の削除・全消去を取り消す
    ///
    /// 期限内なら退避レコードを元の位置に戻して件数を返す。
    /// Undo待ちが無い、または期限切れなら0。
    pub fn undo(&mut self) -> usize {
        let Some(pending) = self.pending.take() else {
            return 0;
        };

        if pending.is_expired(self.clock.now_millis()) {
            debug!("history: undo window already expired");
            return 0;
        }

        let shift = pending.added_since;
        let mut restored = 0;
        for staged in pending.payload {
            if self.records.iter().any(|r| r.id == staged.record.id) {
                warn!("history: {} is live again, not restored", staged.record.id);
                continue;
            }
            self.insert_at(staged.position + shift, staged.record, staged.preview);
            restored += 1;
        }

        debug!("history: undo {:?} restored {}", pending.kind, restored);
        restored
    }

    /// Undoウィンドウを閉じる（何も戻さない）
    pub fn expire_pending_undo(&mut self) -> bool {
        let expired = self.pending.take().is_some();
        if expired {
            debug!("history: undo window closed");
        }
        expired
    }

    /// 期限を過ぎていればUndoウィンドウを閉じる（タイマー発火時に呼ぶ）
    pub fn expire_if_due(&mut self) -> bool {
        let now = self.clock.now_millis();
        match &self.pending {
            Some(pending) if pending.is_expired(now) => self.expire_pending_undo(),
            _ => false,
        }
    }

    /// 新しい順の履歴
    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&DetectionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn preview(&self, id: RecordId) -> Option<&PreviewEntry> {
        self.previews.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pending_undo(&self) -> Option<&PendingUndo> {
        self.pending.as_ref()
    }

    /// 期限内のUndo待ちがあるか
    pub fn can_undo(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.is_expired(self.clock.now_millis()))
    }

    /// Undoウィンドウの残り時間
    pub fn undo_remaining(&self) -> Option<Duration> {
        let now = self.clock.now_millis();
        self.pending
            .as_ref()
            .filter(|p| !p.is_expired(now))
            .map(|p| Duration::from_millis(p.expires_at - now))
    }

    pub fn undo_window(&self) -> Duration {
        self.undo_window
    }

    fn is_known(&self, id: RecordId) -> bool {
        self.records.iter().any(|r| r.id == id)
            || self.pending.as_ref().is_some_and(|p| p.contains(id))
    }

    fn insert_at(&mut self, position: usize, record: DetectionRecord, preview: Option<PreviewEntry>) {
        let position = position.min(self.records.len());
        if let Some(preview) = preview {
            self.previews.insert(record.id, preview);
        }
        self.records.insert(position, record);
    }

    fn arm(&mut self, kind: UndoKind, payload: Vec<StagedRecord>) {
        if let Some(previous) = self.pending.take() {
            debug!("history: {:?} undo superseded by {:?}", previous.kind, kind);
        }
        let window_ms = u64::try_from(self.undo_window.as_millis()).unwrap_or(u64::MAX);
        let expires_at = self.clock.now_millis().saturating_add(window_ms);
        debug!("history: {:?} staged {} record(s)", kind, payload.len());
        self.pending = Some(PendingUndo {
            kind,
            payload,
            expires_at,
            added_since: 0,
        });
    }
}
