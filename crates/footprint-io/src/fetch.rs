//! Boundary document fetching via the browser Fetch API.
//!
//! All functions in this module require a browser environment
//! (`wasm32-unknown-unknown` target).

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{RequestInit, RequestMode, Response};

use footprint_core::{LoadError, RegionCollection, ScopeDescriptor, parse_document};

fn network(value: JsValue) -> LoadError {
    LoadError::Network(format!("{value:?}"))
}

/// GET `url` and return the response body as text.
///
/// # Errors
///
/// Returns [`LoadError::Network`] if the request cannot be made or the
/// body cannot be read, and [`LoadError::Http`] for a non-2xx status.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Response is !Send
pub async fn fetch_text(url: &str) -> Result<String, LoadError> {
    let window = web_sys::window().ok_or_else(|| LoadError::Network("no global window".into()))?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let response = JsFuture::from(window.fetch_with_str_and_init(url, &opts))
        .await
        .map_err(network)?;
    let response: Response = response
        .dyn_into()
        .map_err(|e| LoadError::Network(format!("fetch did not return a Response: {e:?}")))?;
    if !response.ok() {
        return Err(LoadError::Http {
            status: response.status(),
        });
    }

    let body = JsFuture::from(response.text().map_err(network)?)
        .await
        .map_err(network)?;
    body.as_string()
        .ok_or_else(|| LoadError::Network("response body is not text".into()))
}

/// Fetch and parse the boundary document of `descriptor`'s scope.
///
/// # Errors
///
/// Returns any error of [`fetch_text`] or [`parse_document`].
#[allow(clippy::future_not_send)]
pub async fn load_scope(descriptor: &ScopeDescriptor) -> Result<RegionCollection, LoadError> {
    tracing::debug!(scope = %descriptor.id, url = descriptor.source.url, "requesting boundaries");
    let text = fetch_text(descriptor.source.url).await?;
    parse_document(&text, &descriptor.source, descriptor.id)
}
