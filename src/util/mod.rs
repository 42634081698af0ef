use wasm_bindgen::{JsCast, JsValue};

pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Current time as an ISO-8601 UTC string.
pub(crate) fn now_iso() -> String {
    String::from(js_sys::Date::new_0().to_iso_string())
}

/// `YYYY-MM-DD` prefix of an ISO timestamp, for file names.
pub(crate) fn date_stamp(iso: &str) -> &str {
    iso.get(..10).unwrap_or(iso)
}

pub(crate) fn js_error_message(e: &JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{e:?}"))
}

fn blob_url(text: &str, mime: &str) -> Result<String, JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(text));
    let opts = web_sys::BlobPropertyBag::new();
    opts.set_type(mime);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &opts)?;
    web_sys::Url::create_object_url_with_blob(&blob)
}

/// Save `text` as a file through a temporary anchor element.
pub(crate) fn download_text(file_name: &str, mime: &str, text: &str) -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "no document".to_string())?;

    let url = blob_url(text, mime).map_err(|e| js_error_message(&e))?;

    let anchor = document
        .create_element("a")
        .map_err(|e| js_error_message(&e))?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| "anchor element cast failed".to_string())?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    let _ = web_sys::Url::revoke_object_url(&url);
    tracing::info!(file_name, bytes = text.len(), "download started");
    Ok(())
}

/// Open `html` in a new browser window. The document is responsible for
/// calling `window.print()` itself.
pub(crate) fn open_html_window(html: &str) -> Result<(), String> {
    let win = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let url = blob_url(html, "text/html;charset=utf-8").map_err(|e| js_error_message(&e))?;

    // The blob URL stays valid for the lifetime of this page.
    match win.open_with_url_and_target(&url, "_blank") {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err("Pop-up blocked. Allow pop-ups to print.".to_string()),
        Err(e) => Err(js_error_message(&e)),
    }
}

/// Read a user-selected file as text.
pub(crate) async fn read_file_text(file: web_sys::File) -> Result<String, String> {
    let name = file.name();
    match wasm_bindgen_futures::JsFuture::from(file.text()).await {
        Ok(value) => Ok(value.as_string().unwrap_or_default()),
        Err(error) => {
            tracing::error!(error = ?error, file_name = %name, "failed reading selected file");
            Err(format!("Failed to read {name}."))
        }
    }
}

/// Keep ASCII letters, digits and `-`/`_`; everything else becomes `-`.
pub(crate) fn file_slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "garden".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_stamp() {
        assert_eq!(date_stamp("2024-05-01T10:00:00.000Z"), "2024-05-01");
        assert_eq!(date_stamp("short"), "short");
    }

    #[test]
    fn test_file_slug() {
        assert_eq!(file_slug("İş Notları 2024"), "notlar--2024");
        assert_eq!(file_slug("My Garden"), "my-garden");
        assert_eq!(file_slug("  ***  "), "garden");
    }
}
