//! 検出ページ
//!
//! 画像を1枚選んで検出し、結果を履歴に追加する。
//! ダウンロードはアノテーション画像・JSON・CSVの3種類。

use crate::api::detect::{detect, DETECT_ENDPOINT};
use crate::app::HistoryContext;
use crate::download::{download_data_url, download_text, report};
use leptos::prelude::*;
use safety_detect_common::{
    confidence_series, detections_to_csv, detections_to_json, format_box, format_class_counts,
    format_confidences, format_percent, DetectResponse, DetectionRecord,
};
use wasm_bindgen::prelude::*;
use web_sys::{File, FileReader, HtmlInputElement};

const DETECT_FAILED: &str = "Detection failed. Please check your backend connection.";

#[component]
pub fn DetectPanel() -> impl IntoView {
    let ctx = expect_context::<HistoryContext>();

    let file = RwSignal::new_local(None::<File>);
    let (input_url, set_input_url) = signal(None::<String>);
    let (loading, set_loading) = signal(false);
    let (result, set_result) = signal(None::<DetectResponse>);
    let (error, set_error) = signal(None::<String>);

    let on_file_change = move |ev: web_sys::Event| {
        let selected = ev
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));

        set_result.set(None);
        set_error.set(None);
        set_input_url.set(None);

        if let Some(selected) = &selected {
            if let Err(e) = read_as_data_url(selected, move |url| set_input_url.set(Some(url))) {
                web_sys::console::error_1(&e);
            }
        }
        file.set(selected);
    };

    let on_detect = move |_| {
        let Some(selected) = file.get_untracked() else {
            return;
        };
        set_loading.set(true);
        set_error.set(None);
        set_result.set(None);
        let input_preview = input_url.get_untracked();

        leptos::task::spawn_local(async move {
            match detect(DETECT_ENDPOINT, &selected).await {
                Ok(response) => {
                    let filename = selected.name();
                    let added = ctx.history.try_update(|history| {
                        let id = history.next_id();
                        let record =
                            DetectionRecord::from_response(id, &response, now_string(), filename);
                        history.add_detection(record, input_preview, response.output_data_url())
                    });
                    if let Some(Err(e)) = added {
                        web_sys::console::warn_1(&e.to_string().into());
                    }
                    ctx.sync_feedback();
                    set_result.set(Some(response));
                }
                Err(e) => {
                    web_sys::console::error_1(&e.into());
                    set_error.set(Some(DETECT_FAILED.to_string()));
                }
            }
            set_loading.set(false);
        });
    };

    let on_download_image = move |_| {
        result.with_untracked(|r| {
            if let Some(url) = r.as_ref().and_then(|r| r.output_data_url()) {
                report(download_data_url("detection_result.png", &url));
            }
        })
    };

    let on_download_json = move |_| {
        result.with_untracked(|r| {
            if let Some(r) = r {
                match detections_to_json(&r.detections) {
                    Ok(json) => report(download_text("detections.json", &json, "application/json")),
                    Err(e) => web_sys::console::error_1(&e.to_string().into()),
                }
            }
        })
    };

    let on_download_csv = move |_| {
        result.with_untracked(|r| {
            if let Some(r) = r {
                report(download_text("detections.csv", &detections_to_csv(&r.detections), "text/csv"));
            }
        })
    };

    view! {
        <section class="page detect-page">
            <h2>"Detect Safety Equipment"</h2>

            <div class="upload-area">
                <p>"Drag & drop images here or click to upload"</p>
                <input type="file" accept="image/*" on:change=on_file_change />
                <p class="text-muted">{move || file.with(|f| f.as_ref().map(|f| f.name()))}</p>
                <button
                    class="btn btn-primary"
                    disabled=move || loading.get() || file.with(|f| f.is_none())
                    on:click=on_detect
                >
                    {move || if loading.get() { "Detecting..." } else { "Detect" }}
                </button>
                {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
            </div>

            <div class="preview-grid">
                <div class="preview">
                    <h3>"Input Preview"</h3>
                    {move || match input_url.get() {
                        Some(url) => view! { <img src=url alt="Input Preview" /> }.into_any(),
                        None => view! { <div class="placeholder">"No input image"</div> }.into_any(),
                    }}
                </div>
                <div class="preview">
                    <h3>"Output Preview"</h3>
                    {move || match result.with(|r| r.as_ref().and_then(|r| r.output_data_url())) {
                        Some(url) => view! { <img src=url alt="Detection Result" /> }.into_any(),
                        None => view! { <div class="placeholder">"No output image"</div> }.into_any(),
                    }}
                </div>
            </div>

            <Show when=move || result.with(|r| r.is_some())>
                <div class="results">
                    <h3>"Detection Results"</h3>
                    {move || result.get().map(|r| view! { <ResultTable response=r /> })}
                </div>
                <div class="export-buttons">
                    <button class="btn btn-secondary" on:click=on_download_image>"Download Labeled Image"</button>
                    <button class="btn btn-secondary" on:click=on_download_json>"Download JSON"</button>
                    <button class="btn btn-secondary" on:click=on_download_csv>"Download CSV"</button>
                </div>
            </Show>
        </section>
    }
}

#[component]
fn ResultTable(response: DetectResponse) -> impl IntoView {
    let stats = DetectionRecord::from_response(0, &response, "", "");

    let table = if response.detections.is_empty() {
        view! { <p class="text-muted">"No detections"</p> }.into_any()
    } else {
        view! {
            <table>
                <thead>
                    <tr>
                        <th>"Class"</th>
                        <th>"Confidence"</th>
                        <th>"Box [x1, y1, x2, y2]"</th>
                    </tr>
                </thead>
                <tbody>
                    {response
                        .detections
                        .iter()
                        .map(|det| {
                            view! {
                                <tr>
                                    <td>{det.class_name.clone()}</td>
                                    <td>{format_percent(det.conf)}</td>
                                    <td>{format_box(&det.bbox)}</td>
                                </tr>
                            }
                        })
                        .collect_view()}
                </tbody>
            </table>
        }
        .into_any()
    };

    view! {
        {table}
        <div class="stats">
            <div>"Class Counts: " {format_class_counts(&stats.class_counts)}</div>
            <div>"Confidences: " {format_confidences(&stats.confidences)}</div>
        </div>
        <div class="confidence-chart">
            {confidence_series(&stats.confidences)
                .into_iter()
                .map(|(name, conf)| {
                    view! {
                        <div class="bar-row">
                            <span class="bar-label">{name}</span>
                            <div class="bar" style=format!("width: {:.1}%", conf * 100.0)></div>
                            <span>{format_percent(conf)}</span>
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}

/// 画像をData URLとして読み込む
fn read_as_data_url<F>(file: &File, on_load: F) -> Result<(), JsValue>
where
    F: Fn(String) + 'static,
{
    let reader = FileReader::new()?;

    let reader_clone = reader.clone();
    let closure = Closure::wrap(Box::new(move |_: web_sys::ProgressEvent| {
        if let Some(data_url) = reader_clone.result().ok().and_then(|r| r.as_string()) {
            on_load(data_url);
        }
    }) as Box<dyn FnMut(_)>);

    reader.set_onload(Some(closure.as_ref().unchecked_ref()));
    closure.forget();

    reader.read_as_data_url(file)
}

/// 表示用の作成日時（ブラウザのロケール）
fn now_string() -> String {
    js_sys::Date::new_0()
        .to_locale_string("default", &JsValue::UNDEFINED)
        .into()
}
