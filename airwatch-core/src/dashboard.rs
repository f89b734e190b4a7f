//! Application state that owns the snapshot, the selected period and every
//! sub-controller.

use serde::{Deserialize, Serialize};

use crate::compare::{ComparisonController, DockState, RemoveOutcome};
use crate::map::{MapController, MarkerClick, MarkerSpec, Viewport};
use crate::model::Location;
use crate::period::PeriodIndex;
use crate::render::LocationView;
use crate::table::{TableController, TableFilters, TableView};
use crate::time_control::{TimeControl, TimeState, NO_PERIODS_TEXT};
use crate::{DashboardConfig, DashboardError};

/// Which page containers exist. Controllers without a container are not created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Surfaces {
    pub map: bool,
    pub slider: bool,
    pub period_dropdown: bool,
    pub table: bool,
    pub comparison: bool,
}

impl Default for Surfaces {
    fn default() -> Self {
        Self::all()
    }
}

impl Surfaces {
    pub fn all() -> Self {
        Self {
            map: true,
            slider: true,
            period_dropdown: true,
            table: true,
            comparison: true,
        }
    }

    pub fn none() -> Self {
        Self {
            map: false,
            slider: false,
            period_dropdown: false,
            table: false,
            comparison: false,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub selected_period: Option<String>,
    pub time: Option<TimeState>,
    /// Shown in place of the slider when the feed has no dated entries.
    pub time_message: Option<&'static str>,
    pub markers: Vec<MarkerSpec>,
    pub open_popup: Option<String>,
    pub overlay: Option<LocationView>,
    pub table: Option<TableView>,
    pub dock: DockState,
    /// Cards, present only while the comparison view is open.
    pub comparison: Option<Vec<LocationView>>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashboardConfig,
    surfaces: Surfaces,
    locations: Vec<Location>,
    periods: PeriodIndex,
    selected_period: Option<String>,
    time: TimeControl,
    map: Option<MapController>,
    table: Option<TableController>,
    comparison: Option<ComparisonController>,
}

impl Dashboard {
    /// Wire the controllers around a loaded snapshot and select the latest period.
    pub fn new(locations: Vec<Location>, config: DashboardConfig, surfaces: Surfaces) -> Self {
        let periods = PeriodIndex::build(&locations);
        report_duplicate_entries(&locations, &periods);
        log::info!(
            "dashboard loaded {} location(s) across {} period(s)",
            locations.len(),
            periods.len()
        );

        let mut dashboard = Self {
            map: surfaces.map.then(|| MapController::new(&config)),
            table: surfaces.table.then(TableController::new),
            comparison: surfaces
                .comparison
                .then(|| ComparisonController::new(config.max_comparison)),
            config,
            surfaces,
            locations,
            periods,
            selected_period: None,
            time: TimeControl::new(),
        };

        if let Some(period) = dashboard.time.initial(&dashboard.periods) {
            dashboard.set_period(period);
        }
        dashboard
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn surfaces(&self) -> Surfaces {
        self.surfaces
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn periods(&self) -> &PeriodIndex {
        &self.periods
    }

    pub fn selected_period(&self) -> Option<&str> {
        self.selected_period.as_deref()
    }

    pub fn map(&self) -> Option<&MapController> {
        self.map.as_ref()
    }

    pub fn table(&self) -> Option<&TableController> {
        self.table.as_ref()
    }

    pub fn comparison(&self) -> Option<&ComparisonController> {
        self.comparison.as_ref()
    }

    pub fn time_state(&self) -> Option<TimeState> {
        self.time.state(&self.periods)
    }

    /// Slider input.
    pub fn select_index(&mut self, index: usize) -> Option<&str> {
        let period = self.time.sync_all(&self.periods, index)?;
        self.set_period(period);
        self.selected_period()
    }

    /// Period dropdown.
    pub fn select_period(&mut self, label: &str) -> Result<(), DashboardError> {
        let period = self
            .time
            .select_period(&self.periods, label)
            .ok_or_else(|| DashboardError::UnknownPeriod(label.to_string()))?;
        self.set_period(period);
        Ok(())
    }

    /// Year dropdown.
    pub fn select_year(&mut self, year: &str) -> Option<&str> {
        let period = self.time.select_year(&self.periods, year)?;
        self.set_period(period);
        self.selected_period()
    }

    fn set_period(&mut self, period: String) {
        log::debug!("selected period {period}");
        if let Some(table) = self.table.as_mut() {
            table.render_for_period(&self.locations, &period);
        }
        if let Some(map) = self.map.as_mut() {
            map.rebuild(&self.locations, &period);
        }
        self.selected_period = Some(period);
    }

    /// "Add to compare" for `location_id` at the selected period.
    pub fn toggle_compare(&mut self, location_id: &str) -> Result<DockState, DashboardError> {
        let Some(comparison) = self.comparison.as_mut() else {
            return Ok(DockState::default());
        };
        let period = self
            .selected_period
            .as_deref()
            .ok_or(DashboardError::NoPeriodSelected)?;
        if !self.locations.iter().any(|l| l.location_id == location_id) {
            return Err(DashboardError::UnknownLocation(location_id.to_string()));
        }

        if let Err(err) = comparison.toggle(location_id, period) {
            log::info!("comparison rejected {location_id} @ {period}: {err}");
            return Err(err);
        }

        if let Some(map) = self.map.as_mut() {
            map.close_popups();
        }
        Ok(comparison.dock())
    }

    pub fn remove_compared(&mut self, index: usize) -> RemoveOutcome {
        self.comparison
            .as_mut()
            .map(|c| c.remove(index))
            .unwrap_or(RemoveOutcome::Ignored)
    }

    pub fn show_comparison(&mut self) -> Vec<LocationView> {
        match self.comparison.as_mut() {
            Some(comparison) => comparison.show(&self.locations),
            None => Vec::new(),
        }
    }

    pub fn close_comparison(&mut self) {
        if let Some(comparison) = self.comparison.as_mut() {
            comparison.close();
        }
    }

    pub fn clear_comparison(&mut self) {
        if let Some(comparison) = self.comparison.as_mut() {
            comparison.clear();
        }
    }

    pub fn set_filters(&mut self, filters: TableFilters) {
        if let Some(table) = self.table.as_mut() {
            table.set_filters(filters);
        }
    }

    pub fn reset_filters(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.reset_filters();
        }
    }

    pub fn click_marker(&mut self, location_id: &str, viewport: &Viewport) -> MarkerClick {
        match self.map.as_mut() {
            Some(map) => map.click_marker(&self.locations, location_id, viewport),
            None => MarkerClick::Ignored,
        }
    }

    pub fn click_map_background(&mut self) {
        if let Some(map) = self.map.as_mut() {
            map.click_background();
        }
    }

    pub fn view(&self) -> DashboardView {
        let show_time = self.surfaces.slider || self.surfaces.period_dropdown;
        DashboardView {
            selected_period: self.selected_period.clone(),
            time: show_time.then(|| self.time_state()).flatten(),
            time_message: (show_time && self.periods.is_empty()).then_some(NO_PERIODS_TEXT),
            markers: self
                .map
                .as_ref()
                .map(|m| m.markers().to_vec())
                .unwrap_or_default(),
            open_popup: self
                .map
                .as_ref()
                .and_then(|m| m.open_popup())
                .map(str::to_string),
            overlay: self.map.as_ref().and_then(|m| m.overlay()).cloned(),
            table: self.table.as_ref().map(TableController::view),
            dock: self
                .comparison
                .as_ref()
                .map(ComparisonController::dock)
                .unwrap_or_default(),
            comparison: self
                .comparison
                .as_ref()
                .filter(|c| c.is_open())
                .map(|c| c.cards(&self.locations)),
        }
    }
}

fn report_duplicate_entries(locations: &[Location], periods: &PeriodIndex) {
    for location in locations {
        for period in periods.as_slice() {
            let count = location.entries_for(period);
            if count > 1 {
                log::debug!(
                    "{} has {count} entries for {period}; only the first is shown",
                    location.location_id
                );
            }
        }
    }
}
