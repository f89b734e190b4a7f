use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::Location;
use crate::render::NO_DATA_TEXT;

pub const NO_RESULTS_TEXT: &str = "No results";

/// One location projected onto the selected period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub location_id: String,
    pub name: String,
    pub period: String,
    pub no2: Option<f64>,
}

impl TableRow {
    /// Value if it is a number; NaN counts as missing.
    pub fn value(&self) -> Option<f64> {
        self.no2.filter(|v| !v.is_nan())
    }

    pub fn no2_text(&self) -> String {
        self.value()
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| NO_DATA_TEXT.to_string())
    }
}

/// User-controlled table filters. They survive period changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TableFilters {
    pub text: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub hide_no_data: bool,
}

impl TableFilters {
    /// Build filters from raw form inputs. Blank or non-numeric bounds are unset.
    pub fn from_inputs(text: &str, min: &str, max: &str, hide_no_data: bool) -> Self {
        let bound = |raw: &str| raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan());
        Self {
            text: text.to_string(),
            min: bound(min),
            max: bound(max),
            hide_no_data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.min.is_none() && self.max.is_none() && !self.hide_no_data
    }

    pub fn matches(&self, row: &TableRow) -> bool {
        let query = self.text.trim().to_lowercase();
        if !query.is_empty() {
            let haystack = format!("{} {}", row.location_id, row.name).to_lowercase();
            if !haystack.contains(&query) {
                return false;
            }
        }

        let value = row.value();
        if self.hide_no_data && value.is_none() {
            return false;
        }

        // A bound excludes rows without data even when hide_no_data is off.
        if let Some(min) = self.min {
            match value {
                Some(v) if v >= min => {}
                _ => return false,
            }
        }
        if let Some(max) = self.max {
            match value {
                Some(v) if v <= max => {}
                _ => return false,
            }
        }

        true
    }

    pub fn apply<'a>(&self, rows: &'a [TableRow]) -> Vec<&'a TableRow> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}

/// What the table body should show.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub period: Option<String>,
    pub rows: Vec<TableRow>,
    pub total: usize,
    /// Set when no row survives the filters.
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct TableController {
    period: Option<String>,
    rows: Vec<TableRow>,
    filters: TableFilters,
}

impl TableController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the row set for `period`: one row per location, sorted.
    pub fn render_for_period(&mut self, locations: &[Location], period: &str) {
        self.rows = locations
            .iter()
            .map(|loc| TableRow {
                location_id: loc.location_id.clone(),
                name: loc.name.clone(),
                period: period.to_string(),
                no2: loc.measurement_for(period).and_then(|m| m.val),
            })
            .collect();
        sort_rows(&mut self.rows);
        self.period = Some(period.to_string());
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn filters(&self) -> &TableFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: TableFilters) {
        self.filters = filters;
    }

    pub fn reset_filters(&mut self) {
        self.filters = TableFilters::default();
    }

    pub fn visible_rows(&self) -> Vec<&TableRow> {
        self.filters.apply(&self.rows)
    }

    pub fn view(&self) -> TableView {
        let rows: Vec<TableRow> = self.visible_rows().into_iter().cloned().collect();
        TableView {
            period: self.period.clone(),
            total: self.rows.len(),
            empty_message: rows.is_empty().then_some(NO_RESULTS_TEXT),
            rows,
        }
    }
}

/// Rows with data first, highest value first, ties by ascending location id.
pub(crate) fn sort_rows(rows: &mut [TableRow]) {
    rows.sort_by(|a, b| match (a.value(), b.value()) {
        (Some(x), Some(y)) => y
            .total_cmp(&x)
            .then_with(|| a.location_id.cmp(&b.location_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.location_id.cmp(&b.location_id),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measurement;
    use proptest::prelude::*;

    fn row(id: &str, no2: Option<f64>) -> TableRow {
        TableRow {
            location_id: id.to_string(),
            name: format!("Site {id}"),
            period: "Oct 2025".to_string(),
            no2,
        }
    }

    fn ids(rows: &[&TableRow]) -> Vec<String> {
        rows.iter().map(|r| r.location_id.clone()).collect()
    }

    #[test]
    fn filter_composition() {
        let rows = vec![row("A", Some(5.0)), row("B", None), row("C", Some(45.0))];

        let min = TableFilters {
            min: Some(10.0),
            ..TableFilters::default()
        };
        assert_eq!(ids(&min.apply(&rows)), ["C"]);

        let hide = TableFilters {
            hide_no_data: true,
            ..TableFilters::default()
        };
        assert_eq!(ids(&hide.apply(&rows)), ["A", "C"]);

        let max = TableFilters {
            max: Some(10.0),
            ..TableFilters::default()
        };
        assert_eq!(ids(&max.apply(&rows)), ["A"]);

        assert_eq!(TableFilters::default().apply(&rows).len(), 3);
    }

    #[test]
    fn text_filter_searches_id_and_name() {
        let rows = vec![row("KS-01", Some(5.0)), row("AC-02", None)];
        let filters = TableFilters::from_inputs("  kumasi ", "", "", false);
        assert!(filters.apply(&rows).is_empty());

        let filters = TableFilters::from_inputs("ks-01 SITE", "", "", false);
        assert_eq!(ids(&filters.apply(&rows)), ["KS-01"]);

        let filters = TableFilters::from_inputs("ac", "", "", false);
        assert_eq!(ids(&filters.apply(&rows)), ["AC-02"]);
    }

    #[test]
    fn raw_inputs_parse_bounds() {
        let filters = TableFilters::from_inputs("", " 12.5", "abc", true);
        assert_eq!(filters.min, Some(12.5));
        assert_eq!(filters.max, None);
        assert!(filters.hide_no_data);
        assert!(TableFilters::from_inputs(" ", "", "", false).is_empty());
    }

    #[test]
    fn rows_follow_period_and_sort() {
        let entry = |label: &str, val: Option<f64>| Measurement {
            date_str: Some(label.to_string()),
            val,
            ..Measurement::default()
        };
        let locations = vec![
            Location {
                location_id: "Z".to_string(),
                history: vec![entry("Oct 2025", Some(20.0))],
                ..Location::default()
            },
            Location {
                location_id: "B".to_string(),
                history: vec![entry("Sep 2025", Some(90.0))],
                ..Location::default()
            },
            Location {
                location_id: "A".to_string(),
                history: vec![entry("Oct 2025", Some(20.0))],
                ..Location::default()
            },
            Location {
                location_id: "M".to_string(),
                history: vec![entry("Oct 2025", Some(33.3))],
                ..Location::default()
            },
        ];

        let mut table = TableController::new();
        table.render_for_period(&locations, "Oct 2025");
        let order: Vec<&str> = table.rows().iter().map(|r| r.location_id.as_str()).collect();
        assert_eq!(order, ["M", "A", "Z", "B"]);
        assert_eq!(table.rows()[3].no2_text(), "No data");
        assert_eq!(table.rows()[0].no2_text(), "33.30");
    }

    #[test]
    fn filters_persist_across_periods() {
        let locations = vec![Location {
            location_id: "A".to_string(),
            history: vec![Measurement {
                date_str: Some("Oct 2025".to_string()),
                val: Some(3.0),
                ..Measurement::default()
            }],
            ..Location::default()
        }];

        let mut table = TableController::new();
        table.set_filters(TableFilters {
            hide_no_data: true,
            ..TableFilters::default()
        });
        table.render_for_period(&locations, "Oct 2025");
        assert_eq!(table.view().rows.len(), 1);

        table.render_for_period(&locations, "Nov 2025");
        let view = table.view();
        assert!(view.rows.is_empty());
        assert_eq!(view.total, 1);
        assert_eq!(view.empty_message, Some(NO_RESULTS_TEXT));

        table.reset_filters();
        assert_eq!(table.view().rows.len(), 1);
    }

    proptest! {
        #[test]
        fn sorted_rows_put_nulls_last_and_descend(
            values in proptest::collection::vec(proptest::option::of(0.0f64..150.0), 0..40)
        ) {
            let mut rows: Vec<TableRow> = values
                .iter()
                .enumerate()
                .map(|(i, v)| row(&format!("L{i:03}"), *v))
                .collect();
            sort_rows(&mut rows);

            prop_assert_eq!(rows.len(), values.len());
            let first_null = rows.iter().position(|r| r.no2.is_none()).unwrap_or(rows.len());
            prop_assert!(rows[first_null..].iter().all(|r| r.no2.is_none()));
            for pair in rows[..first_null].windows(2) {
                prop_assert!(pair[0].no2 >= pair[1].no2);
            }
        }
    }
}
