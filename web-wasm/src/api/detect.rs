//! 検出エンドポイント連携（fetch + FormData）

use safety_detect_common::{parse_detect_response, DetectResponse};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, Request, RequestInit, RequestMode, Response};

pub const DETECT_ENDPOINT: &str = "http://localhost:8000/detect";

/// 画像を `file` フィールドでPOSTして結果を返す
pub async fn detect(endpoint: &str, file: &File) -> Result<DetectResponse, String> {
    let form = FormData::new().map_err(js_error)?;
    form.append_with_blob_and_filename("file", file, &file.name())
        .map_err(js_error)?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&form);

    let request = Request::new_with_str_and_init(endpoint, &opts).map_err(js_error)?;

    let window = web_sys::window().ok_or("window is not available")?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let resp: Response = resp_value.dyn_into().map_err(js_error)?;

    let text = JsFuture::from(resp.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    let body = text.as_string().unwrap_or_default();

    if !resp.ok() {
        return Err(format!("HTTP {}: {}", resp.status(), body));
    }

    parse_detect_response(&body).map_err(|e| e.to_string())
}

fn js_error(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
