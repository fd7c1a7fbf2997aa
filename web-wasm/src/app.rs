//! メインアプリケーションコンポーネント

use crate::clock::JsClock;
use crate::components::{
    detect_panel::DetectPanel, feedback_panel::FeedbackPanel, history_panel::HistoryPanel,
    navbar::Navbar,
};
use leptos::prelude::*;
use safety_detect_common::{Confirm, DetectionHistory, FeedbackLog, DEFAULT_UNDO_WINDOW};

pub type History = DetectionHistory<JsClock>;

/// ページ
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Detect,
    History,
    Feedback,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Detect, Page::History, Page::Feedback];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Detect => "Detect",
            Page::History => "History",
            Page::Feedback => "Model Feedback",
        }
    }
}

/// 全ページで共有する検出履歴とフィードバック
///
/// 履歴はページ遷移では消えず、リロードで失われる。
#[derive(Clone, Copy)]
pub struct HistoryContext {
    pub history: RwSignal<History>,
    pub feedback: RwSignal<FeedbackLog>,
}

impl HistoryContext {
    fn new() -> Self {
        Self {
            history: RwSignal::new(DetectionHistory::with_clock(JsClock, DEFAULT_UNDO_WINDOW)),
            feedback: RwSignal::new(FeedbackLog::default()),
        }
    }

    /// フィードバック一覧を履歴に合わせる
    pub fn sync_feedback(&self) {
        let history = self.history;
        self.feedback
            .update(|feedback| history.with_untracked(|h| feedback.sync(h)));
    }
}

/// `window.confirm` による確認
pub struct WindowConfirm;

impl Confirm for WindowConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(prompt).ok())
            .unwrap_or(false)
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_context(HistoryContext::new());

    let (page, set_page) = signal(Page::Detect);

    view! {
        <div class="container">
            <Navbar page=page set_page=set_page />

            {move || match page.get() {
                Page::Detect => view! { <DetectPanel /> }.into_any(),
                Page::History => view! { <HistoryPanel /> }.into_any(),
                Page::Feedback => view! { <FeedbackPanel /> }.into_any(),
            }}
        </div>
    }
}
