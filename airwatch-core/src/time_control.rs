use serde::Serialize;

use crate::period::{split_label, PeriodIndex};

pub const NO_PERIODS_TEXT: &str = "No data available";

/// Slider, year dropdown, month display and period dropdown, as one value.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeState {
    pub slider_value: usize,
    pub slider_max: usize,
    pub period: String,
    pub month: String,
    pub year: String,
    pub years: Vec<String>,
    pub periods: Vec<String>,
}

/// Single source of truth for the selected period index.
#[derive(Debug, Clone, Default)]
pub struct TimeControl {
    index: Option<usize>,
    month: String,
    year: String,
}

impl TimeControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Move every control to `index` and return the period to propagate.
    ///
    /// Out-of-range indices leave the controls untouched.
    pub fn sync_all(&mut self, periods: &PeriodIndex, index: usize) -> Option<String> {
        let period = periods.get(index)?;
        let (month, year) = split_label(period);

        self.index = Some(index);
        if self.year != year {
            self.year = year.to_string();
        }
        self.month = month.to_string();

        Some(period.to_string())
    }

    /// Latest period, used on load.
    pub fn initial(&mut self, periods: &PeriodIndex) -> Option<String> {
        let latest = periods.latest_index()?;
        self.sync_all(periods, latest)
    }

    /// Year dropdown: jump to the first period of `year`.
    pub fn select_year(&mut self, periods: &PeriodIndex, year: &str) -> Option<String> {
        let index = periods.first_index_for_year(year)?;
        self.sync_all(periods, index)
    }

    /// Period dropdown: jump to `label`.
    pub fn select_period(&mut self, periods: &PeriodIndex, label: &str) -> Option<String> {
        let index = periods.position(label)?;
        self.sync_all(periods, index)
    }

    pub fn state(&self, periods: &PeriodIndex) -> Option<TimeState> {
        let index = self.index?;
        Some(TimeState {
            slider_value: index,
            slider_max: periods.latest_index()?,
            period: periods.get(index)?.to_string(),
            month: self.month.clone(),
            year: self.year.clone(),
            years: periods.years(),
            periods: periods.as_slice().to_vec(),
        })
    }
}
