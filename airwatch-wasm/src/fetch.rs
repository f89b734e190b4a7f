use airwatch_core::{DashboardError, Location};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

/// Fetch and decode the location feed. Single attempt, no retry.
pub async fn fetch_feed(url: &str) -> Result<Vec<Location>, DashboardError> {
    let window = web_sys::window().ok_or_else(|| fetch_error("no window"))?;

    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| fetch_error(&format!("{err:?}")))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| fetch_error("fetch did not return a Response"))?;

    if !response.ok() {
        return Err(fetch_error(&format!(
            "{url} answered {} {}",
            response.status(),
            response.status_text()
        )));
    }

    let body = response
        .text()
        .map_err(|err| fetch_error(&format!("{err:?}")))?;
    let body = JsFuture::from(body)
        .await
        .map_err(|err| fetch_error(&format!("{err:?}")))?
        .as_string()
        .ok_or_else(|| fetch_error("response body is not text"))?;

    let locations = airwatch_feed::parse_locations_str(&body)?;
    log::info!("fetched {} location(s) from {url}", locations.len());
    Ok(locations)
}

fn fetch_error(detail: &str) -> DashboardError {
    DashboardError::Fetch(detail.to_string())
}
