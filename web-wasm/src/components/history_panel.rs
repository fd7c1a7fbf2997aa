//! 履歴ページ
//!
//! 新しい順にカードを並べ、削除・全消去・Undoを行う。

use crate::app::{HistoryContext, WindowConfirm};
use crate::components::undo_snackbar::UndoSnackbar;
use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use safety_detect_common::{
    format_box, format_class_counts, format_confidences, format_percent, DetectionRecord,
    Dispatched, HistoryAction, PreviewEntry, RecordId,
};

const TIMER_SLACK_MS: u32 = 50;

#[component]
pub fn HistoryPanel() -> impl IntoView {
    let ctx = expect_context::<HistoryContext>();
    let (expanded, set_expanded) = signal(None::<RecordId>);

    // 破壊的操作を確認つきで適用し、期限でUndoを閉じるタイマーを張る
    let run_destructive = move |action: HistoryAction| {
        let outcome = ctx
            .history
            .try_update(|history| history.dispatch_confirmed(action, &WindowConfirm));

        match outcome {
            Some(Ok(Dispatched::Applied)) => {
                ctx.sync_feedback();
                let window = ctx.history.with_untracked(|h| h.undo_window());
                let history = ctx.history;
                // Date.nowの誤差分だけ遅らせる
                Timeout::new(window.as_millis() as u32 + TIMER_SLACK_MS, move || {
                    // 後の操作で張り直された期限は閉じない
                    history.update(|h| {
                        h.expire_if_due();
                    });
                })
                .forget();
            }
            Some(Err(e)) => web_sys::console::error_1(&e.to_string().into()),
            _ => {}
        }
    };

    let on_undo = move || {
        let restored = ctx.history.try_update(|h| h.undo()).unwrap_or(0);
        if restored > 0 {
            ctx.sync_feedback();
        }
    };

    let on_delete = move |id: RecordId| {
        if expanded.get_untracked() == Some(id) {
            set_expanded.set(None);
        }
        run_destructive(HistoryAction::Delete(id));
    };

    let records = move || ctx.history.with(|h| h.records().to_vec());

    view! {
        <section class="page history-page">
            <div class="page-header">
                <h2>"Detection History"</h2>
                <button
                    class="btn btn-danger"
                    disabled=move || ctx.history.with(|h| h.is_empty())
                    on:click=move |_| run_destructive(HistoryAction::Clear)
                >
                    "Clear History"
                </button>
            </div>

            <Show
                when=move || !ctx.history.with(|h| h.is_empty())
                fallback=|| view! { <p class="text-muted">"No detection history yet."</p> }
            >
                <div class="history-grid">
                    <For
                        each=records
                        key=|record| record.id
                        children=move |record| {
                            let id = record.id;
                            let preview = ctx.history.with_untracked(|h| h.preview(id).cloned());
                            view! {
                                <HistoryCard
                                    record=record
                                    preview=preview
                                    expanded=Signal::derive(move || expanded.get() == Some(id))
                                    on_toggle=move || {
                                        set_expanded.update(|e| {
                                            *e = if *e == Some(id) { None } else { Some(id) };
                                        })
                                    }
                                    on_delete=move || on_delete(id)
                                />
                            }
                        }
                    />
                </div>
            </Show>

            <UndoSnackbar
                visible=Signal::derive(move || ctx.history.with(|h| h.pending_undo().is_some()))
                on_undo=on_undo
            />
        </section>
    }
}

#[component]
fn HistoryCard<FT, FD>(
    record: DetectionRecord,
    preview: Option<PreviewEntry>,
    expanded: Signal<bool>,
    on_toggle: FT,
    on_delete: FD,
) -> impl IntoView
where
    FT: Fn() + 'static + Clone,
    FD: Fn() + 'static + Clone,
{
    let input = preview.as_ref().and_then(|p| p.input.clone());
    let output = preview.and_then(|p| p.output);
    let count = record.detections.len();
    let class_counts = format_class_counts(&record.class_counts);
    let confidences = format_confidences(&record.confidences);
    let detections = record.detections.clone();

    view! {
        <div class="history-card">
            <div class="preview-pair" on:click=move |_| on_toggle()>
                {preview_image(input, "Input", "No input")}
                {preview_image(output, "Output", "No output")}
            </div>
            <div class="card-body">
                <div class="card-title">{record.filename.clone()}</div>
                <div class="text-muted">{record.date.clone()}</div>
                <div>{format!("{} detection(s)", count)}</div>
                <button class="btn btn-danger btn-small" on:click=move |_| on_delete()>
                    "Delete"
                </button>
            </div>
            <Show when=move || expanded.get()>
                <div class="card-detail">
                    <div>"Class Counts: " {class_counts.clone()}</div>
                    <div>"Confidences: " {confidences.clone()}</div>
                    <ul>
                        {detections
                            .iter()
                            .map(|det| {
                                view! {
                                    <li>
                                        {format!(
                                            "{} ({}) [ {} ]",
                                            det.class_name,
                                            format_percent(det.conf),
                                            format_box(&det.bbox),
                                        )}
                                    </li>
                                }
                            })
                            .collect_view()}
                    </ul>
                </div>
            </Show>
        </div>
    }
}

fn preview_image(url: Option<String>, alt: &'static str, missing: &'static str) -> AnyView {
    match url {
        Some(url) => view! { <img src=url alt=alt /> }.into_any(),
        None => view! { <div class="placeholder">{missing}</div> }.into_any(),
    }
}
