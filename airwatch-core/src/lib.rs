//! Core logic for the period-indexed NO₂ dashboard: period index, colour
//! classification, view models and the controllers that keep map, table,
//! time control and comparison tray on the same period.

mod classify;
mod compare;
mod dashboard;
mod map;
mod model;
mod period;
mod render;
mod table;
mod time_control;

use serde::{Deserialize, Serialize};

pub use classify::{
    classify, classify_reading, legend, Band, Classification, LegendEntry, NO_DATA_COLOR,
};
pub use compare::{ComparisonController, DockState, RemoveOutcome, SelectionItem};
pub use dashboard::{Dashboard, DashboardView, Surfaces};
pub use map::{
    project, unproject, FlyTo, MapController, MarkerClick, MarkerSpec, PopupOptions, Viewport,
};
pub use model::{Location, Measurement};
pub use period::{split_label, PeriodIndex};
pub use render::{
    render_location, DisplayData, HeaderControl, LocationView, RenderMode, COMPARE_ACTION_TEXT,
    CONCENTRATION_UNIT, NO_DATA_TEXT, REMARK_PREFIX,
};
pub use table::{TableController, TableFilters, TableRow, TableView, NO_RESULTS_TEXT};
pub use time_control::{TimeControl, TimeState, NO_PERIODS_TEXT};

/// Tunables shared by every controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Maximum number of (location, period) pairs in the comparison tray.
    pub max_comparison: usize,
    /// Viewports narrower than this (px) use the mobile overlay instead of popups.
    pub mobile_breakpoint_px: f64,
    /// Fraction of the viewport height the map is shifted when the overlay opens.
    pub overlay_offset_ratio: f64,
    /// Duration of the recentering animation, in seconds.
    pub fly_duration_secs: f64,
    /// Map center `(lat, lon)` before any interaction.
    pub initial_center: (f64, f64),
    pub initial_zoom: u8,
    pub marker: MarkerStyle,
    /// Endpoint serving the location feed.
    pub feed_url: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            max_comparison: 2,
            mobile_breakpoint_px: 768.0,
            overlay_offset_ratio: 0.25,
            fly_duration_secs: 0.2,
            initial_center: (6.6596, -1.6063),
            initial_zoom: 12,
            marker: MarkerStyle::default(),
            feed_url: "/api/locations".to_string(),
        }
    }
}

/// Circle-marker styling; the fill colour comes from classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarkerStyle {
    pub radius: f64,
    pub weight: f64,
    pub stroke: String,
    pub fill_opacity: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 12.0,
            weight: 1.0,
            stroke: "#fff".to_string(),
            fill_opacity: 0.8,
        }
    }
}

/// Errors raised while loading the feed or handling user commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DashboardError {
    #[error("Feed is missing required data")]
    MissingData,
    #[error("Could not read feed: {0}")]
    Parse(String),
    #[error("Could not fetch feed: {0}")]
    Fetch(String),
    #[error("Unknown period: {0}")]
    UnknownPeriod(String),
    #[error("Unknown location: {0}")]
    UnknownLocation(String),
    #[error("No period is selected")]
    NoPeriodSelected,
    #[error("This location from this period is already in the comparison.")]
    AlreadyCompared { location_id: String, period: String },
    #[error("You can compare a maximum of {max} locations.")]
    ComparisonFull { max: usize },
}
