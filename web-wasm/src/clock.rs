//! ブラウザ時計

use safety_detect_common::Clock;

/// `Date.now()` を使う時計（wasm32では `SystemTime` が使えないため）
#[derive(Debug, Clone, Copy, Default)]
pub struct JsClock;

impl Clock for JsClock {
    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use safety_detect_common::{DetectionHistory, DetectionRecord, DetectResponse};
    use std::time::Duration;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn wasm_js_clock_follows_date_now() {
        let before = js_sys::Date::now() as u64;
        let now = JsClock.now_millis();
        assert!(now >= before);
        assert!(now > 1_600_000_000_000);
    }

    #[wasm_bindgen_test]
    fn wasm_history_arms_undo_from_js_clock() {
        let mut history = DetectionHistory::with_clock(JsClock, Duration::from_secs(5));
        let id = history.next_id();
        let record = DetectionRecord::from_response(id, &DetectResponse::default(), "", "a.png");
        history.add_detection(record, None, None).expect("追加失敗");

        let before = js_sys::Date::now() as u64;
        assert!(history.delete_detection(id));
        let expires_at = history.pending_undo().map(|p| p.expires_at()).unwrap_or_default();
        assert!(expires_at >= before + 5000);
        assert_eq!(history.undo(), 1);
    }
}
