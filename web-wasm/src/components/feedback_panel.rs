//! モデルフィードバックページ
//!
//! 履歴中の低信頼度検出を一覧し、フラグを付けたものをCSVで保存する。

use crate::app::HistoryContext;
use crate::download::{download_text, report};
use leptos::prelude::*;
use safety_detect_common::{format_box, format_percent, FeedbackItem};

const FLAGGED_LOG_FILE_NAME: &str = "flagged_detections.csv";

#[component]
pub fn FeedbackPanel() -> impl IntoView {
    let ctx = expect_context::<HistoryContext>();
    ctx.sync_feedback();

    let threshold = ctx.feedback.with_untracked(|f| f.threshold());
    let items = move || ctx.feedback.with(|f| f.items().to_vec());
    let flagged_count = move || ctx.feedback.with(|f| f.flagged().count());

    let on_download = move |_| {
        let csv = ctx.feedback.with_untracked(|f| f.flagged_csv());
        report(download_text(FLAGGED_LOG_FILE_NAME, &csv, "text/csv"));
    };

    view! {
        <section class="page feedback-page">
            <div class="page-header">
                <h2>"Model Feedback"</h2>
                <button
                    class="btn btn-primary"
                    disabled=move || flagged_count() == 0
                    on:click=on_download
                >
                    {move || format!("Download Flagged ({})", flagged_count())}
                </button>
            </div>
            <p class="text-muted">
                {format!("Detections below {} confidence", format_percent(threshold))}
            </p>

            <Show
                when=move || !ctx.feedback.with(|f| f.is_empty())
                fallback=|| view! { <p class="text-muted">"No low-confidence detections."</p> }
            >
                <table>
                    <thead>
                        <tr>
                            <th>"File"</th>
                            <th>"Class"</th>
                            <th>"Confidence"</th>
                            <th>"Box"</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=items
                            key=|item| (item.id.clone(), item.flagged)
                            children=move |item: FeedbackItem| {
                                let id = item.id.clone();
                                view! {
                                    <tr class={if item.flagged { "flagged" } else { "" }}>
                                        <td>{item.filename.clone()}</td>
                                        <td>{item.label.clone()}</td>
                                        <td>{format_percent(item.conf)}</td>
                                        <td>{format_box(&item.bbox)}</td>
                                        <td>
                                            <button
                                                class="btn btn-small"
                                                on:click=move |_| {
                                                    ctx.feedback.update(|f| {
                                                        f.toggle_flag(&id);
                                                    })
                                                }
                                            >
                                                {if item.flagged { "Unflag" } else { "Flag" }}
                                            </button>
                                        </td>
                                    </tr>
                                }
                            }
                        />
                    </tbody>
                </table>
            </Show>
        </section>
    }
}
