use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::classify::Band;
use crate::model::Location;
use crate::render::{render_location, DisplayData, LocationView, RenderMode};
use crate::{DashboardConfig, MarkerStyle};

const TILE_SIZE: f64 = 256.0;
const MAX_SIN_LAT: f64 = 0.9999;

/// Visible map area in CSS pixels plus the current zoom level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopupOptions {
    pub max_width: u32,
    pub auto_pan_padding_top_left: (u32, u32),
    pub auto_pan_padding_bottom_right: (u32, u32),
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            max_width: 320,
            auto_pan_padding_top_left: (50, 50),
            auto_pan_padding_bottom_right: (50, 300),
        }
    }
}

/// One live circle marker.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSpec {
    pub location_id: String,
    pub lat: f64,
    pub lon: f64,
    pub fill_color: String,
    pub band: Band,
    pub style: MarkerStyle,
    pub popup: LocationView,
    pub popup_options: PopupOptions,
    pub display: DisplayData,
}

/// Animated recentering request.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlyTo {
    pub center: (f64, f64),
    pub zoom: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerClick {
    /// Desktop: let the map open the bound popup.
    Popup { location_id: String },
    /// Narrow viewport: popup suppressed, overlay revealed and map recentered.
    Overlay { view: LocationView, fly_to: FlyTo },
    /// No live marker for that location.
    Ignored,
}

/// Owns the live marker set for the selected period.
#[derive(Debug, Clone)]
pub struct MapController {
    style: MarkerStyle,
    popup_options: PopupOptions,
    mobile_breakpoint_px: f64,
    overlay_offset_ratio: f64,
    fly_duration_secs: f64,
    period: Option<String>,
    markers: Vec<MarkerSpec>,
    open_popup: Option<String>,
    overlay: Option<LocationView>,
}

impl MapController {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            style: config.marker.clone(),
            popup_options: PopupOptions::default(),
            mobile_breakpoint_px: config.mobile_breakpoint_px,
            overlay_offset_ratio: config.overlay_offset_ratio,
            fly_duration_secs: config.fly_duration_secs,
            period: None,
            markers: Vec::new(),
            open_popup: None,
            overlay: None,
        }
    }

    /// Tear down every marker and rebuild the set for `period`.
    ///
    /// Locations with invalid coordinates get no marker. An open overlay is
    /// re-rendered for the new period.
    pub fn rebuild(&mut self, locations: &[Location], period: &str) {
        self.markers.clear();
        self.open_popup = None;

        let mut skipped = 0usize;
        for location in locations {
            let Some((lat, lon)) = location.coordinates() else {
                skipped += 1;
                continue;
            };

            let display = DisplayData::resolve(location, period);
            self.markers.push(MarkerSpec {
                location_id: location.location_id.clone(),
                lat,
                lon,
                fill_color: display.color.clone(),
                band: display.band,
                style: self.style.clone(),
                popup: render_location(RenderMode::Popup, location, &display),
                popup_options: self.popup_options,
                display,
            });
        }

        if skipped > 0 {
            log::debug!("{skipped} location(s) without coordinates left off the map for {period}");
        }

        if let Some(open) = self.overlay.take() {
            self.overlay = locations
                .iter()
                .find(|loc| loc.location_id == open.location_id)
                .map(|loc| {
                    render_location(
                        RenderMode::Overlay,
                        loc,
                        &DisplayData::resolve(loc, period),
                    )
                });
        }

        self.period = Some(period.to_string());
    }

    pub fn markers(&self) -> &[MarkerSpec] {
        &self.markers
    }

    pub fn period(&self) -> Option<&str> {
        self.period.as_deref()
    }

    pub fn overlay(&self) -> Option<&LocationView> {
        self.overlay.as_ref()
    }

    pub fn open_popup(&self) -> Option<&str> {
        self.open_popup.as_deref()
    }

    pub fn is_mobile(&self, viewport: &Viewport) -> bool {
        viewport.width < self.mobile_breakpoint_px
    }

    pub fn click_marker(
        &mut self,
        locations: &[Location],
        location_id: &str,
        viewport: &Viewport,
    ) -> MarkerClick {
        let Some(marker) = self.markers.iter().find(|m| m.location_id == location_id) else {
            return MarkerClick::Ignored;
        };

        if !self.is_mobile(viewport) {
            self.open_popup = Some(location_id.to_string());
            return MarkerClick::Popup {
                location_id: location_id.to_string(),
            };
        }

        let Some(location) = locations.iter().find(|l| l.location_id == location_id) else {
            return MarkerClick::Ignored;
        };

        let view = render_location(RenderMode::Overlay, location, &marker.display);
        let (x, y) = project(marker.lat, marker.lon, viewport.zoom);
        let center = unproject(x, y + viewport.height * self.overlay_offset_ratio, viewport.zoom);

        self.open_popup = None;
        self.overlay = Some(view.clone());

        MarkerClick::Overlay {
            view,
            fly_to: FlyTo {
                center,
                zoom: viewport.zoom,
                duration_secs: self.fly_duration_secs,
            },
        }
    }

    /// Background click: dismiss the open popup and the mobile overlay.
    pub fn click_background(&mut self) {
        self.close_popups();
    }

    pub fn close_popups(&mut self) {
        self.open_popup = None;
        self.overlay = None;
    }
}

/// Spherical Web-Mercator projection to world pixels at `zoom`.
pub fn project(lat: f64, lon: f64, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let sin = lat.to_radians().sin().clamp(-MAX_SIN_LAT, MAX_SIN_LAT);
    let x = (lon + 180.0) / 360.0 * scale;
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * scale;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lon = x / scale * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / scale);
    let lat = n.sinh().atan().to_degrees();
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measurement;

    fn located(id: &str, lat: Option<f64>, lon: Option<f64>, val: Option<f64>) -> Location {
        Location {
            location_id: id.to_string(),
            name: format!("Site {id}"),
            lat,
            lon,
            history: vec![Measurement {
                date_str: Some("Oct 2025".to_string()),
                val,
                ..Measurement::default()
            }],
            ..Location::default()
        }
    }

    fn snapshot() -> Vec<Location> {
        vec![
            located("A", Some(6.69), Some(-1.62), Some(45.0)),
            located("B", Some(0.0), Some(-1.62), Some(12.0)),
            located("C", Some(6.70), None, Some(12.0)),
            located("D", Some(6.71), Some(-1.60), None),
        ]
    }

    #[test]
    fn rebuild_skips_invalid_coordinates() {
        let mut map = MapController::new(&DashboardConfig::default());
        map.rebuild(&snapshot(), "Oct 2025");

        let ids: Vec<&str> = map.markers().iter().map(|m| m.location_id.as_str()).collect();
        assert_eq!(ids, ["A", "D"]);
        assert_eq!(map.markers()[0].fill_color, "#EA8C34");
        assert_eq!(map.markers()[1].fill_color, crate::NO_DATA_COLOR);
        assert_eq!(map.markers()[1].popup.value_text, "No data");
        assert_eq!(map.period(), Some("Oct 2025"));
    }

    #[test]
    fn rebuild_replaces_previous_markers() {
        let locations = snapshot();
        let mut map = MapController::new(&DashboardConfig::default());
        map.rebuild(&locations, "Oct 2025");
        map.rebuild(&locations, "Nov 2025");

        assert_eq!(map.markers().len(), 2);
        assert!(map
            .markers()
            .iter()
            .all(|m| m.band == Band::NoData && m.popup.period == "Nov 2025"));
    }

    #[test]
    fn desktop_click_opens_popup() {
        let locations = snapshot();
        let mut map = MapController::new(&DashboardConfig::default());
        map.rebuild(&locations, "Oct 2025");

        let viewport = Viewport {
            width: 1280.0,
            height: 800.0,
            zoom: 12.0,
        };
        let click = map.click_marker(&locations, "A", &viewport);
        assert_eq!(
            click,
            MarkerClick::Popup {
                location_id: "A".to_string()
            }
        );
        assert!(map.overlay().is_none());
        assert_eq!(map.open_popup(), Some("A"));
        assert_eq!(map.click_marker(&locations, "B", &viewport), MarkerClick::Ignored);

        map.click_background();
        assert_eq!(map.open_popup(), None);
    }

    #[test]
    fn mobile_click_opens_overlay_and_offsets_center() {
        let locations = snapshot();
        let mut map = MapController::new(&DashboardConfig::default());
        map.rebuild(&locations, "Oct 2025");

        let viewport = Viewport {
            width: 390.0,
            height: 800.0,
            zoom: 12.0,
        };
        let MarkerClick::Overlay { view, fly_to } = map.click_marker(&locations, "A", &viewport)
        else {
            panic!("expected overlay");
        };

        assert_eq!(view.mode, RenderMode::Overlay);
        assert_eq!(fly_to.duration_secs, 0.2);
        // Center moves south so the marker sits above the panel.
        assert!(fly_to.center.0 < 6.69);
        assert!((fly_to.center.1 - -1.62).abs() < 1e-9);

        let (_, marker_y) = project(6.69, -1.62, 12.0);
        let (_, center_y) = project(fly_to.center.0, fly_to.center.1, 12.0);
        assert!((center_y - marker_y - 200.0).abs() < 1e-6);

        map.click_background();
        assert!(map.overlay().is_none());
    }

    #[test]
    fn open_overlay_follows_period_change() {
        let mut locations = snapshot();
        locations[0].history.push(Measurement {
            date_str: Some("Nov 2025".to_string()),
            val: Some(8.0),
            ..Measurement::default()
        });
        let mut map = MapController::new(&DashboardConfig::default());
        map.rebuild(&locations, "Oct 2025");
        let viewport = Viewport {
            width: 320.0,
            height: 640.0,
            zoom: 13.0,
        };
        map.click_marker(&locations, "A", &viewport);
        map.rebuild(&locations, "Nov 2025");

        let overlay = map.overlay().expect("overlay kept open");
        assert_eq!(overlay.period, "Nov 2025");
        assert_eq!(overlay.value_text, "8.00");
    }

    #[test]
    fn projection_round_trips() {
        let (x, y) = project(6.6596, -1.6063, 12.0);
        let (lat, lon) = unproject(x, y, 12.0);
        assert!((lat - 6.6596).abs() < 1e-9);
        assert!((lon - -1.6063).abs() < 1e-9);
    }
}
