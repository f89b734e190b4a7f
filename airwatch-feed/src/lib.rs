//! Decoding of the `/api/locations` feed into `airwatch_core` types.
//!
//! The feed is produced by hand-maintained spreadsheets, so decoding is
//! lenient: field aliases are accepted, numbers may arrive as strings and
//! malformed values degrade to "no data" instead of failing the whole load.

mod records;

use airwatch_core::{DashboardError, Location, Measurement};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

pub use records::{assemble_locations, parse_records_str, LocationRecord, MeasurementRecord};

/// Display format for period labels ("Oct 2025").
pub const PERIOD_LABEL_FORMAT: &str = "%b %Y";

const LOCATION_ID_KEYS: [&str; 3] = ["locationId", "Location ID", "LocationID"];
const NAME_KEYS: [&str; 2] = ["name", "Location"];
const LAT_KEYS: [&str; 2] = ["lat", "Latitude"];
const LON_KEYS: [&str; 2] = ["lon", "Longitude"];
const DESCRIPTION_KEYS: [&str; 2] = ["description", "Description"];
const VALUE_KEYS: [&str; 4] = ["val", "no2", "value", "NO2 concentration"];
const REMARK_KEYS: [&str; 2] = ["remarks", "remark"];

/// Decode the feed from a JSON string.
pub fn parse_locations_str(feed_json: &str) -> Result<Vec<Location>, DashboardError> {
    let value: Value =
        serde_json::from_str(feed_json).map_err(|err| DashboardError::Parse(err.to_string()))?;
    parse_locations_value(&value)
}

/// Decode the feed from a `serde_json::Value`.
///
/// `null` means the endpoint had nothing to serve and is reported as
/// [`DashboardError::MissingData`].
pub fn parse_locations_value(feed: &Value) -> Result<Vec<Location>, DashboardError> {
    if feed.is_null() {
        return Err(DashboardError::MissingData);
    }
    let entries = feed.as_array().ok_or_else(|| {
        DashboardError::Parse("expected a JSON array of locations".to_string())
    })?;

    let mut locations = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            log::warn!("feed entry {position} is not an object; skipped");
            continue;
        }
        locations.push(parse_location(entry));
    }

    let undated = locations
        .iter()
        .flat_map(|loc| loc.history.iter())
        .filter(|m| m.raw_date.is_none())
        .count();
    if undated > 0 {
        log::warn!("{undated} history entries without a parseable date; kept out of the period index");
    }

    Ok(locations)
}

fn parse_location(entry: &Value) -> Location {
    let history = entry
        .get("history")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_measurement).collect())
        .unwrap_or_default();

    Location {
        location_id: first_text(entry, &LOCATION_ID_KEYS)
            .map(|id| id.trim().to_string())
            .unwrap_or_default(),
        name: first_text(entry, &NAME_KEYS).unwrap_or_default(),
        lat: first_number(entry, &LAT_KEYS),
        lon: first_number(entry, &LON_KEYS),
        description: first_text(entry, &DESCRIPTION_KEYS),
        history,
    }
}

fn parse_measurement(entry: &Value) -> Measurement {
    let raw_label = entry
        .get("dateStr")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (date_str, raw_date) = match raw_label {
        Some(text) => match normalize_date(text) {
            Some((label, raw)) => (Some(label), Some(raw)),
            None => (Some(text.to_string()), None),
        },
        None => (None, None),
    };

    Measurement {
        date_str,
        raw_date,
        val: first_number(entry, &VALUE_KEYS),
        tube_id: first_text(entry, &["tubeId"]).filter(|t| !t.trim().is_empty()),
        remarks: first_text(entry, &REMARK_KEYS),
    }
}

/// Parse a date in any of the accepted textual forms.
///
/// Returns the "Mon YYYY" period label and the UTC instant used for ordering.
pub fn normalize_date(text: &str) -> Option<(String, DateTime<Utc>)> {
    let raw = parse_instant(text.trim())?;
    Some((raw.format(PERIOD_LABEL_FORMAT).to_string(), raw))
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    // Month-only forms: "2025-10", "Oct 2025", "October 2025".
    let candidates = [
        (format!("{text}-01"), "%Y-%m-%d"),
        (format!("1 {text}"), "%d %b %Y"),
        (format!("1 {text}"), "%d %B %Y"),
    ];
    candidates.iter().find_map(|(padded, format)| {
        NaiveDate::parse_from_str(padded, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    })
}

fn first_text(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find_map(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// First key holding a finite number or a numeric string.
fn first_number(entry: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find_map(number_value)
}

fn number_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use serde_json::json;

    #[test]
    fn normalizes_accepted_date_forms() {
        let oct = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        for text in [
            "2025-10",
            "2025-10-01",
            "2025-10-01T00:00:00Z",
            "2025-10-01T00:00:00.000",
            "Oct 2025",
            "October 2025",
        ] {
            assert_eq!(
                normalize_date(text),
                Some(("Oct 2025".to_string(), oct)),
                "input {text}"
            );
        }

        let (label, raw) = normalize_date("2024-02-29T23:30:00+02:00").unwrap();
        assert_eq!(label, "Feb 2024");
        assert_eq!(raw.day(), 29);

        assert_eq!(normalize_date("last autumn"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn accepts_field_aliases_and_string_numbers() {
        let feed = json!([{
            "Location ID": " KS-09 ",
            "Location": "Asafo",
            "Latitude": "6.6812",
            "Longitude": -1.6101,
            "Description": "lorry park",
            "history": [
                { "dateStr": "2025-03", "no2": "27.5", "tubeId": "T-9", "remark": "moved 2m" },
                { "dateStr": "2025-04", "val": "" },
                { "dateStr": "2025-05", "val": "n/a" }
            ]
        }]);

        let locations = parse_locations_value(&feed).unwrap();
        let loc = &locations[0];
        assert_eq!(loc.location_id, "KS-09");
        assert_eq!(loc.name, "Asafo");
        assert_eq!(loc.lat, Some(6.6812));
        assert_eq!(loc.lon, Some(-1.6101));
        assert_eq!(loc.description.as_deref(), Some("lorry park"));

        assert_eq!(loc.history[0].date_str.as_deref(), Some("Mar 2025"));
        assert_eq!(loc.history[0].val, Some(27.5));
        assert_eq!(loc.history[0].tube_id.as_deref(), Some("T-9"));
        assert_eq!(loc.history[0].remarks.as_deref(), Some("moved 2m"));
        assert_eq!(loc.history[1].val, None);
        assert_eq!(loc.history[2].val, None);
    }

    #[test]
    fn unparseable_dates_stay_in_history() {
        let feed = json!([{ "locationId": "A", "history": [{ "dateStr": "Q3", "val": 4 }] }]);
        let locations = parse_locations_value(&feed).unwrap();
        let entry = &locations[0].history[0];
        assert_eq!(entry.date_str.as_deref(), Some("Q3"));
        assert_eq!(entry.raw_date, None);
        assert_eq!(entry.val, Some(4.0));
    }

    #[test]
    fn missing_history_becomes_empty() {
        let feed = json!([{ "locationId": "A", "history": "oops" }, { "locationId": "B" }, 17]);
        let locations = parse_locations_value(&feed).unwrap();
        assert_eq!(locations.len(), 2);
        assert!(locations.iter().all(|l| l.history.is_empty()));
    }

    #[test]
    fn rejects_non_array_feed() {
        let err = parse_locations_str("{\"locations\": []}").unwrap_err();
        assert!(matches!(err, DashboardError::Parse(_)));
        assert!(matches!(
            parse_locations_str("not json"),
            Err(DashboardError::Parse(_))
        ));
        assert_eq!(parse_locations_str("null"), Err(DashboardError::MissingData));
    }
}
