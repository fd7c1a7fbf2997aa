//! 時刻ソース
//!
//! Undoウィンドウの期限判定とID採番に使う。
//! テストでは `ManualClock` を注入して時間を進める。

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 現在時刻（UNIXエポックからのミリ秒）を返す
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// OS時計
///
/// wasm32-unknown-unknown では `SystemTime` が使えないため、
/// Web版は `js_sys::Date` ベースの実装を別に持つ。
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// 手動で進める時計（クローン同士で時刻を共有）
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_millis)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by.as_millis() as u64);
    }

    pub fn set(&self, millis: u64) {
        self.now.set(millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }
}
