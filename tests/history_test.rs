//! 検出履歴ストアの統合テスト
//!
//! 追加・削除・全消去・Undo・期限切れを時計を進めながら確認する。

use safety_detect_common::{
    detections_to_csv, Detection, DetectionHistory, DetectionRecord, DetectResponse, Dispatched,
    FeedbackLog, HistoryAction, ManualClock, UndoKind, DEFAULT_UNDO_WINDOW,
};
use std::time::Duration;

fn response(detections: Vec<Detection>) -> DetectResponse {
    DetectResponse {
        detections,
        image: "iVBORw0KGgo=".to_string(),
        ..Default::default()
    }
}

fn setup() -> (DetectionHistory<ManualClock>, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    (DetectionHistory::with_clock(clock.clone(), DEFAULT_UNDO_WINDOW), clock)
}

fn add(history: &mut DetectionHistory<ManualClock>, filename: &str, detections: Vec<Detection>) -> u64 {
    let id = history.next_id();
    let resp = response(detections);
    let record = DetectionRecord::from_response(id, &resp, "2026/10/17 09:00:00", filename);
    history
        .dispatch(HistoryAction::Add {
            record,
            input_preview: Some(format!("data:image/jpeg;base64,{}", filename)),
            output_preview: resp.output_data_url(),
        })
        .expect("追加に失敗");
    id
}

fn filenames(history: &DetectionHistory<ManualClock>) -> Vec<String> {
    history.records().iter().map(|r| r.filename.clone()).collect()
}

#[test]
fn test_session_flow_delete_undo_clear_expire() {
    let (mut history, clock) = setup();
    add(&mut history, "a.jpg", vec![Detection::new("ToolBox", 0.9, [0.0; 4])]);
    let b = add(&mut history, "b.jpg", vec![]);
    add(&mut history, "c.jpg", vec![]);
    assert_eq!(filenames(&history), vec!["c.jpg", "b.jpg", "a.jpg"]);

    // 削除して期限内にUndo
    assert_eq!(history.dispatch(HistoryAction::Delete(b)).unwrap(), Dispatched::Applied);
    assert_eq!(filenames(&history), vec!["c.jpg", "a.jpg"]);
    assert!(history.preview(b).is_none());
    clock.advance(Duration::from_millis(4_999));
    assert_eq!(history.dispatch(HistoryAction::Undo).unwrap(), Dispatched::Applied);
    assert_eq!(filenames(&history), vec!["c.jpg", "b.jpg", "a.jpg"]);
    assert!(history.preview(b).is_some());

    // 全消去してウィンドウ経過後はUndo不可
    assert_eq!(history.dispatch(HistoryAction::Clear).unwrap(), Dispatched::Applied);
    assert!(history.is_empty());
    clock.advance(DEFAULT_UNDO_WINDOW);
    assert!(!history.can_undo());
    assert_eq!(history.dispatch(HistoryAction::Undo).unwrap(), Dispatched::Unchanged);
    assert!(history.is_empty());
    assert!(history.pending_undo().is_none());
}

#[test]
fn test_confirm_declined_leaves_history() {
    let (mut history, _) = setup();
    let id = add(&mut history, "a.jpg", vec![]);

    let outcome = history
        .dispatch_confirmed(HistoryAction::Delete(id), &|_: &str| false)
        .unwrap();
    assert_eq!(outcome, Dispatched::Declined);
    assert_eq!(history.len(), 1);
    assert!(history.pending_undo().is_none());

    let outcome = history
        .dispatch_confirmed(HistoryAction::Clear, &|prompt: &str| prompt.contains("clear"))
        .unwrap();
    assert_eq!(outcome, Dispatched::Applied);
    assert_eq!(history.pending_undo().map(|p| p.kind()), Some(UndoKind::Clear));
}

#[test]
fn test_expire_action_drops_pending_undo() {
    let (mut history, _) = setup();
    let id = add(&mut history, "a.jpg", vec![]);
    history.delete_detection(id);

    assert_eq!(history.dispatch(HistoryAction::Expire).unwrap(), Dispatched::Applied);
    assert_eq!(history.undo(), 0);
    assert!(history.get(id).is_none());
}

#[test]
fn test_feedback_follows_history() {
    let (mut history, _) = setup();
    let id = add(
        &mut history,
        "site.jpg",
        vec![
            Detection::new("OxygenTank", 0.41, [1.0, 2.0, 3.0, 4.0]),
            Detection::new("FireExtinguisher", 0.97, [5.0, 6.0, 7.0, 8.0]),
        ],
    );

    let mut feedback = FeedbackLog::default();
    feedback.sync(&history);
    assert_eq!(feedback.len(), 1);
    let item_id = feedback.items()[0].id.clone();
    assert_eq!(feedback.toggle_flag(&item_id), Some(true));

    let csv = feedback.flagged_csv();
    assert!(csv.contains("site.jpg,OxygenTank,0.41,[1 2 3 4]"));

    // 削除でフラグ対象も消え、Undoでフラグごと戻る
    history.delete_detection(id);
    feedback.sync(&history);
    assert!(feedback.is_empty());
    assert_eq!(feedback.flagged_csv(), "record_id,filename,class,confidence,box");
    history.undo();
    feedback.sync(&history);
    assert_eq!(feedback.len(), 1);
    assert!(feedback.items()[0].flagged);
    assert!(feedback.flagged_csv().contains("site.jpg,OxygenTank,0.41,[1 2 3 4]"));
}

#[test]
fn test_record_csv_matches_download() {
    let (mut history, _) = setup();
    let id = add(
        &mut history,
        "a.jpg",
        vec![Detection::new("Fire Extinguisher", 0.83, [10.0, 20.0, 30.0, 40.0])],
    );

    let record = history.get(id).unwrap();
    assert_eq!(
        detections_to_csv(&record.detections),
        "class,confidence,box\nFire Extinguisher,0.83,[10 20 30 40]"
    );
    assert_eq!(record.class_counts.get("Fire Extinguisher"), Some(&1));
    assert_eq!(record.confidences, vec![0.83]);
}
