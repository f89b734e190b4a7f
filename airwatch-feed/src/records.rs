//! Raw location and measurement records as exported from the catalog store,
//! and the join that turns them into feed locations.

use std::collections::HashMap;

use airwatch_core::{DashboardError, Location, Measurement};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize_date;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    #[serde(alias = "Location ID", alias = "LocationID")]
    pub location_id: String,
    #[serde(default, alias = "Location")]
    pub name: String,
    #[serde(default, alias = "Latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "Longitude")]
    pub lon: Option<f64>,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    #[serde(default)]
    pub tube_id: Option<String>,
    #[serde(alias = "Location ID")]
    pub location_id: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, alias = "value", alias = "NO2 concentration")]
    pub no2: Option<f64>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Decode a JSON array of records (either kind).
pub fn parse_records_str<T>(json: &str) -> Result<Vec<T>, DashboardError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(json).map_err(|err| DashboardError::Parse(err.to_string()))
}

/// Attach each measurement to its location and build the period history.
///
/// Ids are compared after trimming. Histories are ordered by `start`
/// ascending; measurements without a start come last and carry no period.
pub fn assemble_locations(
    locations: &[LocationRecord],
    measurements: &[MeasurementRecord],
) -> Vec<Location> {
    let mut by_location: HashMap<&str, Vec<&MeasurementRecord>> = HashMap::new();
    for record in measurements {
        by_location
            .entry(record.location_id.trim())
            .or_default()
            .push(record);
    }

    let assembled: Vec<Location> = locations
        .iter()
        .map(|record| {
            let id = record.location_id.trim();
            let mut mine = by_location.remove(id).unwrap_or_default();
            mine.sort_by_key(|m| (m.start.is_none(), m.start));

            Location {
                location_id: id.to_string(),
                name: record.name.clone(),
                lat: record.lat,
                lon: record.lon,
                description: record.description.clone(),
                history: mine.into_iter().map(to_measurement).collect(),
            }
        })
        .collect();

    if !by_location.is_empty() {
        let orphans: usize = by_location.values().map(Vec::len).sum();
        log::warn!("{orphans} measurement(s) reference unknown locations and were dropped");
    }

    assembled
}

fn to_measurement(record: &MeasurementRecord) -> Measurement {
    let (date_str, raw_date) = match record.start {
        Some(start) => {
            // The served feed carries "YYYY-MM"; normalize it the way the client does.
            let month = start.format("%Y-%m").to_string();
            match normalize_date(&month) {
                Some((label, raw)) => (Some(label), Some(raw)),
                None => (Some(month), None),
            }
        }
        None => (None, None),
    };

    Measurement {
        date_str,
        raw_date,
        val: record.no2.filter(|v| v.is_finite()),
        tube_id: record.tube_id.clone().filter(|t| !t.trim().is_empty()),
        remarks: record.remarks.clone(),
    }
}
