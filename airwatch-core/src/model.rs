use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sampling location together with its measurement history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub history: Vec<Measurement>,
}

/// One NO₂ tube reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Normalized period label ("Oct 2025"), or the raw text when it did not parse.
    pub date_str: Option<String>,
    /// Only used to order periods.
    pub raw_date: Option<DateTime<Utc>>,
    /// Concentration in µg/m³.
    pub val: Option<f64>,
    pub tube_id: Option<String>,
    pub remarks: Option<String>,
}

impl Location {
    /// Map coordinates, or `None` when either axis is missing, zero or not finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.lat.filter(|v| v.is_finite() && *v != 0.0)?;
        let lon = self.lon.filter(|v| v.is_finite() && *v != 0.0)?;
        Some((lat, lon))
    }

    /// First history entry labelled `period`.
    ///
    /// Later entries sharing the label are ignored.
    pub fn measurement_for(&self, period: &str) -> Option<&Measurement> {
        self.history
            .iter()
            .find(|entry| entry.date_str.as_deref() == Some(period))
    }

    /// Number of history entries labelled `period`.
    pub fn entries_for(&self, period: &str) -> usize {
        self.history
            .iter()
            .filter(|entry| entry.date_str.as_deref() == Some(period))
            .count()
    }
}

impl Measurement {
    /// The value if it is a usable concentration (finite and above zero).
    pub fn reading(&self) -> Option<f64> {
        self.val.filter(|v| v.is_finite() && *v > 0.0)
    }

    /// Remark text, only when something is left after trimming.
    pub fn remark(&self) -> Option<&str> {
        self.remarks
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, val: Option<f64>) -> Measurement {
        Measurement {
            date_str: Some(label.to_string()),
            val,
            ..Measurement::default()
        }
    }

    #[test]
    fn zero_or_missing_coordinates_are_invalid() {
        let mut loc = Location {
            lat: Some(6.7),
            lon: Some(-1.6),
            ..Location::default()
        };
        assert_eq!(loc.coordinates(), Some((6.7, -1.6)));

        loc.lon = Some(0.0);
        assert_eq!(loc.coordinates(), None);

        loc.lon = None;
        assert_eq!(loc.coordinates(), None);

        loc.lon = Some(f64::NAN);
        assert_eq!(loc.coordinates(), None);
    }

    #[test]
    fn first_matching_entry_wins() {
        let loc = Location {
            history: vec![
                entry("Oct 2025", Some(12.0)),
                entry("Oct 2025", Some(99.0)),
            ],
            ..Location::default()
        };

        assert_eq!(loc.measurement_for("Oct 2025").and_then(|m| m.val), Some(12.0));
        assert_eq!(loc.entries_for("Oct 2025"), 2);
        assert!(loc.measurement_for("Nov 2025").is_none());
    }

    #[test]
    fn blank_remarks_are_dropped() {
        let mut m = entry("Oct 2025", None);
        m.remarks = Some("   ".to_string());
        assert_eq!(m.remark(), None);

        m.remarks = Some(" tube missing ".to_string());
        assert_eq!(m.remark(), Some("tube missing"));
    }

    #[test]
    fn non_positive_values_are_not_readings() {
        assert_eq!(entry("x", Some(0.0)).reading(), None);
        assert_eq!(entry("x", Some(-3.0)).reading(), None);
        assert_eq!(entry("x", Some(f64::NAN)).reading(), None);
        assert_eq!(entry("x", Some(4.5)).reading(), Some(4.5));
    }
}
