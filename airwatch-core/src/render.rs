//! Pure view model for one location at one period.
//!
//! [`render_location`] is free of side effects; markup targets (HTML string,
//! Yew, terminal) consume the resulting [`LocationView`].

use serde::Serialize;

use crate::classify::{classify_reading, Band};
use crate::model::Location;

pub const NO_DATA_TEXT: &str = "No data";
pub const CONCENTRATION_UNIT: &str = "µg/m³";
/// Label of the "add to compare" control, shared by every render target.
pub const COMPARE_ACTION_TEXT: &str = "+ Add to compare";
pub const REMARK_PREFIX: &str = "Note: ";
const NO_DESCRIPTION_TEXT: &str = "No description available.";
const NO_TUBE_TEXT: &str = "-";

/// Everything the renderer needs to know about a location at one period.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayData {
    pub period: String,
    pub value_text: String,
    pub color: String,
    pub band: Band,
    pub explanation: Option<String>,
    pub description: String,
    pub remarks: Option<String>,
    pub tube_id: String,
}

impl DisplayData {
    /// Resolve the first history entry for `period` and classify it.
    ///
    /// Missing entries and unusable values fall back to the "No data" defaults.
    pub fn resolve(location: &Location, period: &str) -> Self {
        let entry = location.measurement_for(period);
        let reading = entry.and_then(|m| m.reading());
        let class = classify_reading(reading);

        Self {
            period: period.to_string(),
            value_text: reading
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| NO_DATA_TEXT.to_string()),
            color: class.color.to_string(),
            band: class.band,
            explanation: class.band.explanation().map(str::to_string),
            description: capitalize_first(
                location
                    .description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .unwrap_or(NO_DESCRIPTION_TEXT),
            ),
            remarks: entry.and_then(|m| m.remark()).map(str::to_string),
            tube_id: entry
                .and_then(|m| m.tube_id.as_deref())
                .filter(|t| !t.is_empty())
                .unwrap_or(NO_TUBE_TEXT)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderMode {
    Popup,
    Overlay,
    /// Comparison card at `index` in the selection.
    Card { index: usize },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderControl {
    None,
    CloseOverlay,
    Remove { index: usize },
}

/// Rendered fragment for a popup, mobile overlay or comparison card.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    pub mode: RenderMode,
    pub title: String,
    pub location_id: String,
    pub header: HeaderControl,
    pub tube_id: String,
    pub coordinates: String,
    pub description: Option<String>,
    pub remark: Option<String>,
    pub period: String,
    pub value_text: String,
    pub unit: &'static str,
    pub color: String,
    pub explanation: Option<String>,
    /// Location id bound to the "add to compare" action.
    pub compare_action: Option<String>,
}

pub fn render_location(mode: RenderMode, location: &Location, data: &DisplayData) -> LocationView {
    let is_card = matches!(mode, RenderMode::Card { .. });
    let header = match mode {
        RenderMode::Popup => HeaderControl::None,
        RenderMode::Overlay => HeaderControl::CloseOverlay,
        RenderMode::Card { index } => HeaderControl::Remove { index },
    };

    LocationView {
        mode,
        title: location.name.clone(),
        location_id: location.location_id.clone(),
        header,
        tube_id: data.tube_id.clone(),
        coordinates: format_coordinates(location.lat, location.lon),
        description: (!is_card).then(|| data.description.clone()),
        remark: if is_card { None } else { data.remarks.clone() },
        period: data.period.clone(),
        value_text: data.value_text.clone(),
        unit: CONCENTRATION_UNIT,
        color: data.color.clone(),
        explanation: if is_card {
            None
        } else {
            data.explanation.clone()
        },
        compare_action: (!is_card).then(|| location.location_id.clone()),
    }
}

impl LocationView {
    /// HTML fragment using the dashboard's stylesheet classes.
    ///
    /// Controls carry `data-action` attributes; wiring them up is left to the host page.
    pub fn to_html(&self) -> String {
        let is_card = matches!(self.mode, RenderMode::Card { .. });
        let container = if is_card { "compare-card" } else { "custom-popup" };
        let title = html_escape(&self.title);

        let mut out = format!("<div class=\"{container}\">");
        out.push_str(&match self.header {
            HeaderControl::Remove { index } => format!(
                "<div class=\"comp-header-row\"><h4 class=\"comp-title\">{title}</h4>\
                 <span class=\"comp-remove-btn\" data-action=\"remove\" data-index=\"{index}\">&times;</span></div>"
            ),
            HeaderControl::CloseOverlay => format!(
                "<a href=\"#\" class=\"popup-close-button\" data-action=\"close-overlay\">&times;</a>\
                 <h3 class=\"popup-title\">{title}</h3>"
            ),
            HeaderControl::None => format!("<h3 class=\"popup-title\">{title}</h3>"),
        });

        let id_class = if is_card { "comp-id" } else { "popup-id" };
        out.push_str(&format!(
            "<div class=\"{id_class} tube-id-wrapper\">Tube ID: {}</div>\
             <div class=\"popup-coords\">{}</div>",
            html_escape(&self.tube_id),
            html_escape(&self.coordinates)
        ));

        if let Some(desc) = &self.description {
            out.push_str(&format!("<div class=\"popup-desc\">{}</div>", html_escape(desc)));
        }
        if let Some(remark) = &self.remark {
            out.push_str(&format!(
                "<div class=\"popup-remark\">{REMARK_PREFIX}{}</div>",
                html_escape(remark)
            ));
        }

        out.push_str(&format!(
            "<div class=\"data-period\">{}</div>\
             <div class=\"data-box\"><span class=\"data-label\">NO₂ Concentration</span>\
             <div class=\"data-value-row\"><span class=\"data-value\" style=\"color:{}\">{}</span>\
             <span class=\"data-unit\">{}</span></div>",
            html_escape(&self.period),
            html_escape(&self.color),
            html_escape(&self.value_text),
            self.unit
        ));
        if let Some(text) = &self.explanation {
            out.push_str(&format!(
                "<div class=\"data-explanation\">{}</div>",
                html_escape(text)
            ));
        }
        out.push_str("</div>");

        if let Some(id) = &self.compare_action {
            out.push_str(&format!(
                "<button class=\"action-btn\" data-action=\"compare\" data-location-id=\"{}\">{COMPARE_ACTION_TEXT}</button>",
                html_escape(id)
            ));
        }

        out.push_str("</div>");
        out
    }
}

fn format_coordinates(lat: Option<f64>, lon: Option<f64>) -> String {
    let axis = |v: Option<f64>| {
        v.filter(|v| v.is_finite())
            .map(|v| format!("{v:.6}"))
            .unwrap_or_else(|| "-".to_string())
    };
    format!("{}, {}", axis(lat), axis(lon))
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measurement;

    fn kejetia() -> Location {
        Location {
            location_id: "KS-01".to_string(),
            name: "Kejetia <Market>".to_string(),
            lat: Some(6.695123456),
            lon: Some(-1.6234),
            description: Some("busy roundabout".to_string()),
            history: vec![Measurement {
                date_str: Some("Oct 2025".to_string()),
                val: Some(52.456),
                tube_id: Some("T-118".to_string()),
                remarks: Some("  lid cracked ".to_string()),
                ..Measurement::default()
            }],
        }
    }

    #[test]
    fn resolves_reading_and_defaults() {
        let loc = kejetia();
        let data = DisplayData::resolve(&loc, "Oct 2025");
        assert_eq!(data.value_text, "52.46");
        assert_eq!(data.color, "#DA5634");
        assert_eq!(data.explanation.as_deref(), Some("Above EU annual limit"));
        assert_eq!(data.description, "Busy roundabout");
        assert_eq!(data.remarks.as_deref(), Some("lid cracked"));
        assert_eq!(data.tube_id, "T-118");

        let empty = DisplayData::resolve(&loc, "Nov 2025");
        assert_eq!(empty.value_text, NO_DATA_TEXT);
        assert_eq!(empty.color, crate::NO_DATA_COLOR);
        assert_eq!(empty.explanation, None);
        assert_eq!(empty.tube_id, "-");
    }

    #[test]
    fn missing_description_uses_placeholder() {
        let mut loc = kejetia();
        loc.description = None;
        let data = DisplayData::resolve(&loc, "Oct 2025");
        assert_eq!(data.description, "No description available.");
    }

    #[test]
    fn card_mode_drops_detail_and_binds_remove() {
        let loc = kejetia();
        let data = DisplayData::resolve(&loc, "Oct 2025");
        let card = render_location(RenderMode::Card { index: 1 }, &loc, &data);

        assert_eq!(card.header, HeaderControl::Remove { index: 1 });
        assert_eq!(card.description, None);
        assert_eq!(card.remark, None);
        assert_eq!(card.explanation, None);
        assert_eq!(card.compare_action, None);
        assert_eq!(card.coordinates, "6.695123, -1.623400");
        assert_eq!(card.value_text, "52.46");
    }

    #[test]
    fn popup_and_overlay_offer_compare() {
        let loc = kejetia();
        let data = DisplayData::resolve(&loc, "Oct 2025");

        let popup = render_location(RenderMode::Popup, &loc, &data);
        assert_eq!(popup.header, HeaderControl::None);
        assert_eq!(popup.compare_action.as_deref(), Some("KS-01"));
        assert_eq!(popup.remark.as_deref(), Some("lid cracked"));

        let overlay = render_location(RenderMode::Overlay, &loc, &data);
        assert_eq!(overlay.header, HeaderControl::CloseOverlay);
        assert_eq!(overlay.description.as_deref(), Some("Busy roundabout"));
    }

    #[test]
    fn html_is_escaped() {
        let loc = kejetia();
        let data = DisplayData::resolve(&loc, "Oct 2025");
        let html = render_location(RenderMode::Popup, &loc, &data).to_html();

        assert!(html.contains("Kejetia &lt;Market&gt;"));
        assert!(html.contains("data-action=\"compare\" data-location-id=\"KS-01\""));
        assert!(html.contains(&format!("{REMARK_PREFIX}lid cracked")));
        assert!(html.contains(&format!(">{COMPARE_ACTION_TEXT}</button>")));
        assert!(html.contains("color:#DA5634"));
        assert!(!html.contains("<Market>"));
    }
}
