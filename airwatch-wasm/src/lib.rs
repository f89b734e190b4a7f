//! Framework-neutral WASM <-> JavaScript bridge for the dashboard.
//!
//! Every command returns the refreshed `DashboardView` so the host page can
//! re-render from a single value.

mod fetch;
mod logger;

use airwatch_core::{
    classify, Dashboard, DashboardConfig, DashboardError, MarkerStyle, Surfaces, TableFilters,
    Viewport,
};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

pub use fetch::fetch_feed;
pub use logger::ConsoleLogger;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct JsDashboardConfig {
    #[serde(default)]
    max_comparison: Option<usize>,
    #[serde(default)]
    mobile_breakpoint_px: Option<f64>,
    #[serde(default)]
    overlay_offset_ratio: Option<f64>,
    #[serde(default)]
    fly_duration_secs: Option<f64>,
    #[serde(default)]
    initial_center: Option<(f64, f64)>,
    #[serde(default)]
    initial_zoom: Option<u8>,
    #[serde(default)]
    marker: Option<MarkerStyle>,
    #[serde(default)]
    feed_url: Option<String>,
}

impl From<JsDashboardConfig> for DashboardConfig {
    fn from(cfg: JsDashboardConfig) -> Self {
        let mut base = DashboardConfig::default();
        if let Some(max) = cfg.max_comparison {
            base.max_comparison = max;
        }
        if let Some(px) = cfg.mobile_breakpoint_px {
            base.mobile_breakpoint_px = px;
        }
        if let Some(ratio) = cfg.overlay_offset_ratio {
            base.overlay_offset_ratio = ratio;
        }
        if let Some(secs) = cfg.fly_duration_secs {
            base.fly_duration_secs = secs;
        }
        if let Some(center) = cfg.initial_center {
            base.initial_center = center;
        }
        if let Some(zoom) = cfg.initial_zoom {
            base.initial_zoom = zoom;
        }
        if let Some(marker) = cfg.marker {
            base.marker = marker;
        }
        if let Some(url) = cfg.feed_url {
            base.feed_url = url;
        }
        base
    }
}

/// Parse an optional partial config coming from JavaScript.
pub fn config_from_js(config: Option<JsValue>) -> Result<DashboardConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsDashboardConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            Ok(DashboardConfig::from(cfg))
        }
        _ => Ok(DashboardConfig::default()),
    }
}

/// Install the console logger. `level` accepts `error` .. `trace`; default `info`.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    logger::init(logger::parse_level(level.as_deref()));
}

/// Classify a concentration: `{ color, band }`.
#[wasm_bindgen(js_name = classifyValue)]
pub fn classify_value(value: f64) -> Result<JsValue, JsValue> {
    to_js(&classify(value))
}

/// Fetch the feed from `url` and resolve to the decoded location array.
#[wasm_bindgen(js_name = fetchLocations)]
pub async fn fetch_locations(url: String) -> Result<JsValue, JsValue> {
    match fetch_feed(&url).await {
        Ok(locations) => to_js(&locations),
        Err(err) => {
            log::error!("Map loading failed: {err}");
            Err(format_dashboard_error(err))
        }
    }
}

/// Stateful dashboard owned by the JavaScript host.
#[wasm_bindgen]
pub struct DashboardHandle {
    inner: Dashboard,
}

#[wasm_bindgen]
impl DashboardHandle {
    /// `feed` is the raw `/api/locations` payload.
    #[wasm_bindgen(constructor)]
    pub fn new(
        feed: JsValue,
        config: Option<JsValue>,
        surfaces: Option<JsValue>,
    ) -> Result<DashboardHandle, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let feed_value = from_value::<serde_json::Value>(feed)
            .map_err(|err| JsValue::from_str(&format!("Could not read feed JSON: {err}")))?;
        let locations =
            airwatch_feed::parse_locations_value(&feed_value).map_err(format_dashboard_error)?;

        let config = config_from_js(config)?;
        let surfaces = match surfaces {
            Some(value) if !value.is_undefined() && !value.is_null() => from_value::<Surfaces>(
                value,
            )
            .map_err(|err| JsValue::from_str(&format!("Could not read surfaces: {err}")))?,
            _ => Surfaces::all(),
        };

        Ok(DashboardHandle {
            inner: Dashboard::new(locations, config, surfaces),
        })
    }

    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.view())
    }

    #[wasm_bindgen(js_name = selectIndex)]
    pub fn select_index(&mut self, index: usize) -> Result<JsValue, JsValue> {
        self.inner.select_index(index);
        self.view()
    }

    #[wasm_bindgen(js_name = selectPeriod)]
    pub fn select_period(&mut self, label: &str) -> Result<JsValue, JsValue> {
        self.inner
            .select_period(label)
            .map_err(format_dashboard_error)?;
        self.view()
    }

    #[wasm_bindgen(js_name = selectYear)]
    pub fn select_year(&mut self, year: &str) -> Result<JsValue, JsValue> {
        self.inner.select_year(year);
        self.view()
    }

    /// Rejections come back as the message to show in an alert.
    #[wasm_bindgen(js_name = toggleCompare)]
    pub fn toggle_compare(&mut self, location_id: &str) -> Result<JsValue, JsValue> {
        self.inner
            .toggle_compare(location_id)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.view()
    }

    #[wasm_bindgen(js_name = removeCompared)]
    pub fn remove_compared(&mut self, index: usize) -> Result<JsValue, JsValue> {
        self.inner.remove_compared(index);
        self.view()
    }

    #[wasm_bindgen(js_name = showComparison)]
    pub fn show_comparison(&mut self) -> Result<JsValue, JsValue> {
        self.inner.show_comparison();
        self.view()
    }

    #[wasm_bindgen(js_name = closeComparison)]
    pub fn close_comparison(&mut self) -> Result<JsValue, JsValue> {
        self.inner.close_comparison();
        self.view()
    }

    #[wasm_bindgen(js_name = clearComparison)]
    pub fn clear_comparison(&mut self) -> Result<JsValue, JsValue> {
        self.inner.clear_comparison();
        self.view()
    }

    /// Filters from raw form values; blank bounds are unset.
    #[wasm_bindgen(js_name = setFilterInputs)]
    pub fn set_filter_inputs(
        &mut self,
        text: &str,
        min: &str,
        max: &str,
        hide_no_data: bool,
    ) -> Result<JsValue, JsValue> {
        self.inner
            .set_filters(TableFilters::from_inputs(text, min, max, hide_no_data));
        self.view()
    }

    #[wasm_bindgen(js_name = setFilters)]
    pub fn set_filters(&mut self, filters: JsValue) -> Result<JsValue, JsValue> {
        let filters: TableFilters = from_value(filters)
            .map_err(|err| JsValue::from_str(&format!("Could not read filters: {err}")))?;
        self.inner.set_filters(filters);
        self.view()
    }

    #[wasm_bindgen(js_name = resetFilters)]
    pub fn reset_filters(&mut self) -> Result<JsValue, JsValue> {
        self.inner.reset_filters();
        self.view()
    }

    /// Returns the click outcome (`popup`, `overlay` with a fly-to, or `ignored`).
    #[wasm_bindgen(js_name = clickMarker)]
    pub fn click_marker(
        &mut self,
        location_id: &str,
        width: f64,
        height: f64,
        zoom: f64,
    ) -> Result<JsValue, JsValue> {
        let viewport = Viewport {
            width,
            height,
            zoom,
        };
        to_js(&self.inner.click_marker(location_id, &viewport))
    }

    #[wasm_bindgen(js_name = clickMapBackground)]
    pub fn click_map_background(&mut self) -> Result<JsValue, JsValue> {
        self.inner.click_map_background();
        self.view()
    }

    /// Popup markup for the live marker of `location_id`.
    #[wasm_bindgen(js_name = popupHtml)]
    pub fn popup_html(&self, location_id: &str) -> Option<String> {
        self.inner
            .map()?
            .markers()
            .iter()
            .find(|m| m.location_id == location_id)
            .map(|m| m.popup.to_html())
    }

    /// Comparison cards as markup, in selection order.
    #[wasm_bindgen(js_name = comparisonHtml)]
    pub fn comparison_html(&self) -> String {
        self.inner
            .comparison()
            .map(|c| c.cards(self.inner.locations()))
            .unwrap_or_default()
            .iter()
            .map(|card| card.to_html())
            .collect()
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|err| JsValue::from_str(&format!("Could not serialize view: {err}")))
}

fn format_dashboard_error(err: DashboardError) -> JsValue {
    JsValue::from_str(&format!("Dashboard error: {err}"))
}
