//! 履歴ストアのディスパッチ面
//!
//! View側はユーザー操作を `HistoryAction` にしてストアへ渡す。
//! 削除・全消去の確認はストアではなく、注入された `Confirm` が行う。

use super::{Clock, DetectionHistory};
use crate::error::Result;
use crate::types::{DetectionRecord, RecordId};

/// 削除確認メッセージ
pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this detection?";
/// 全消去確認メッセージ
pub const CONFIRM_CLEAR: &str = "Are you sure you want to clear all detection history?";

/// ストアへの操作
#[derive(Debug, Clone)]
pub enum HistoryAction {
    Add {
        record: DetectionRecord,
        input_preview: Option<String>,
        output_preview: Option<String>,
    },
    Delete(RecordId),
    Clear,
    Undo,
    /// Undoウィンドウのタイマー発火
    Expire,
}

impl HistoryAction {
    /// ユーザー確認が必要な操作なら確認文を返す
    pub fn confirmation_prompt(&self) -> Option<&'static str> {
        match self {
            HistoryAction::Delete(_) => Some(CONFIRM_DELETE),
            HistoryAction::Clear => Some(CONFIRM_CLEAR),
            _ => None,
        }
    }
}

/// 確認ダイアログ（ブラウザの confirm、dialoguer など）
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// ディスパッチ結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// 状態が変わった
    Applied,
    /// 対象なし・期限切れなどで変化なし
    Unchanged,
    /// ユーザーが確認を拒否
    Declined,
}

impl<C: Clock> DetectionHistory<C> {
    /// 確認なしで操作を適用
    pub fn dispatch(&mut self, action: HistoryAction) -> Result<Dispatched> {
        let changed = match action {
            HistoryAction::Add {
                record,
                input_preview,
                output_preview,
            } => {
                self.add_detection(record, input_preview, output_preview)?;
                true
            }
            HistoryAction::Delete(id) => self.delete_detection(id),
            HistoryAction::Clear => {
                self.clear_history();
                true
            }
            HistoryAction::Undo => self.undo() > 0,
            HistoryAction::Expire => self.expire_pending_undo(),
        };

        Ok(if changed {
            Dispatched::Applied
        } else {
            Dispatched::Unchanged
        })
    }

    /// 破壊的操作は確認してから適用
    ///
    /// 存在しないIDの削除は確認を出さずに `Unchanged`。
    pub fn dispatch_confirmed<F>(&mut self, action: HistoryAction, confirm: &F) -> Result<Dispatched>
    where
        F: Confirm + ?Sized,
    {
        if let HistoryAction::Delete(id) = &action {
            if self.get(*id).is_none() {
                return Ok(Dispatched::Unchanged);
            }
        }

        if let Some(prompt) = action.confirmation_prompt() {
            if !confirm.confirm(prompt) {
                return Ok(Dispatched::Declined);
            }
        }

        self.dispatch(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ManualClock, DEFAULT_UNDO_WINDOW};
    use std::cell::RefCell;

    fn record(id: RecordId) -> DetectionRecord {
        DetectionRecord {
            id,
            detections: vec![],
            class_counts: Default::default(),
            confidences: vec![],
            date: String::new(),
            filename: format!("{}.jpg", id),
        }
    }

    fn history_with(ids: &[RecordId]) -> DetectionHistory<ManualClock> {
        let mut history = DetectionHistory::with_clock(ManualClock::new(0), DEFAULT_UNDO_WINDOW);
        for &id in ids {
            history
                .dispatch(HistoryAction::Add {
                    record: record(id),
                    input_preview: None,
                    output_preview: None,
                })
                .unwrap();
        }
        history
    }

    #[test]
    fn test_confirmation_prompt() {
        assert_eq!(HistoryAction::Delete(1).confirmation_prompt(), Some(CONFIRM_DELETE));
        assert_eq!(HistoryAction::Clear.confirmation_prompt(), Some(CONFIRM_CLEAR));
        assert_eq!(HistoryAction::Undo.confirmation_prompt(), None);
        assert_eq!(HistoryAction::Expire.confirmation_prompt(), None);
    }

    #[test]
    fn test_dispatch_delete_and_undo() {
        let mut history = history_with(&[1, 2]);

        assert_eq!(history.dispatch(HistoryAction::Delete(1)).unwrap(), Dispatched::Applied);
        assert_eq!(history.dispatch(HistoryAction::Delete(1)).unwrap(), Dispatched::Unchanged);
        assert_eq!(history.dispatch(HistoryAction::Undo).unwrap(), Dispatched::Applied);
        assert_eq!(history.len(), 2);
        assert_eq!(history.dispatch(HistoryAction::Undo).unwrap(), Dispatched::Unchanged);
    }

    #[test]
    fn test_dispatch_duplicate_add_is_error() {
        let mut history = history_with(&[1]);
        let result = history.dispatch(HistoryAction::Add {
            record: record(1),
            input_preview: None,
            output_preview: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_dispatch_confirmed_declined_leaves_state() {
        let mut history = history_with(&[1, 2]);

        let outcome = history
            .dispatch_confirmed(HistoryAction::Clear, &|_: &str| false)
            .unwrap();
        assert_eq!(outcome, Dispatched::Declined);
        assert_eq!(history.len(), 2);
        assert!(history.pending_undo().is_none());
    }

    #[test]
    fn test_dispatch_confirmed_asks_with_prompt() {
        let mut history = history_with(&[1, 2]);
        let asked = RefCell::new(Vec::new());
        let confirm = |prompt: &str| {
            asked.borrow_mut().push(prompt.to_string());
            true
        };

        history.dispatch_confirmed(HistoryAction::Delete(2), &confirm).unwrap();
        history.dispatch_confirmed(HistoryAction::Undo, &confirm).unwrap();
        history.dispatch_confirmed(HistoryAction::Clear, &confirm).unwrap();

        assert_eq!(*asked.borrow(), vec![CONFIRM_DELETE.to_string(), CONFIRM_CLEAR.to_string()]);
        assert!(history.is_empty());
    }

    #[test]
    fn test_dispatch_confirmed_missing_id_skips_prompt() {
        let mut history = history_with(&[1]);
        let outcome = history
            .dispatch_confirmed(HistoryAction::Delete(42), &|_: &str| -> bool {
                panic!("確認を出すべきではない")
            })
            .unwrap();
        assert_eq!(outcome, Dispatched::Unchanged);
    }

    #[test]
    fn test_dispatch_expire() {
        let mut history = history_with(&[1]);
        history.dispatch(HistoryAction::Delete(1)).unwrap();

        assert_eq!(history.dispatch(HistoryAction::Expire).unwrap(), Dispatched::Applied);
        assert_eq!(history.dispatch(HistoryAction::Undo).unwrap(), Dispatched::Unchanged);
    }
}
