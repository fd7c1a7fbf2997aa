//! ブラウザでのファイルダウンロード
//!
//! テキストはBlob URL、アノテーション画像はData URLをそのままリンクにしてクリックする。

use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

/// テキストをファイルとして保存
pub fn download_text(filename: &str, content: &str, mime_type: &str) -> Result<(), JsValue> {
    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(content));

    let options = BlobPropertyBag::new();
    options.set_type(mime_type);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;

    let url = Url::create_object_url_with_blob(&blob)?;
    let result = click_link(&url, filename);
    Url::revoke_object_url(&url)?;
    result
}

/// Data URLをファイルとして保存
pub fn download_data_url(filename: &str, data_url: &str) -> Result<(), JsValue> {
    click_link(data_url, filename)
}

fn click_link(href: &str, filename: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document is not available"))?;

    let link: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    link.set_href(href);
    link.set_download(filename);
    link.click();
    Ok(())
}

/// 失敗をコンソールに出す
pub fn report(result: Result<(), JsValue>) {
    if let Err(e) = result {
        web_sys::console::error_1(&e);
    }
}
