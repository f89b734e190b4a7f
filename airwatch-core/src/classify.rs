use serde::{Deserialize, Serialize};

/// Colour used for missing, non-numeric or non-positive readings.
pub const NO_DATA_COLOR: &str = "#ccc";

/// Severity band relative to the EU limit and WHO target for annual NO₂.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    EuExceedance,
    WhoExceedance,
    WhoOk,
    NoData,
}

impl Band {
    /// Explanation shown under the value; `None` when there is no reading.
    pub fn explanation(self) -> Option<&'static str> {
        match self {
            Band::EuExceedance => Some("Above EU annual limit"),
            Band::WhoExceedance => Some("Above WHO annual target"),
            Band::WhoOk => Some("Within WHO annual target"),
            Band::NoData => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Classification {
    pub color: &'static str,
    pub band: Band,
}

// Lower bounds (exclusive), highest first.
const THRESHOLDS: [(f64, &str, Band); 8] = [
    (80.0, "#7E0023", Band::EuExceedance),
    (70.0, "#8F3F97", Band::EuExceedance),
    (60.0, "#C92033", Band::EuExceedance),
    (50.0, "#DA5634", Band::EuExceedance),
    (40.0, "#EA8C34", Band::EuExceedance),
    (30.0, "#ECAA33", Band::WhoExceedance),
    (20.0, "#EEC732", Band::WhoExceedance),
    (10.0, "#A3BF29", Band::WhoExceedance),
];

const WHO_OK_COLOR: &str = "#59B61F";

/// Classify a concentration in µg/m³.
///
/// Total over `f64`: NaN and values `<= 0` come back as [`Band::NoData`].
pub fn classify(value: f64) -> Classification {
    if value.is_nan() || value <= 0.0 {
        return Classification {
            color: NO_DATA_COLOR,
            band: Band::NoData,
        };
    }

    THRESHOLDS
        .iter()
        .find(|(floor, _, _)| value > *floor)
        .map(|&(_, color, band)| Classification { color, band })
        .unwrap_or(Classification {
            color: WHO_OK_COLOR,
            band: Band::WhoOk,
        })
}

pub fn classify_reading(value: Option<f64>) -> Classification {
    classify(value.unwrap_or(f64::NAN))
}

/// One swatch of the map legend. `above` is exclusive, `up_to` inclusive.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub color: &'static str,
    pub band: Band,
    pub above: Option<f64>,
    pub up_to: Option<f64>,
    pub label: String,
}

/// The colour scale, most severe first, ending with the no-data swatch.
pub fn legend() -> Vec<LegendEntry> {
    let mut entries = Vec::with_capacity(THRESHOLDS.len() + 2);
    let mut ceiling: Option<f64> = None;

    for &(floor, color, band) in &THRESHOLDS {
        let label = match ceiling {
            Some(top) => format!("{floor:.0} - {top:.0}"),
            None => format!("> {floor:.0}"),
        };
        entries.push(LegendEntry {
            color,
            band,
            above: Some(floor),
            up_to: ceiling,
            label,
        });
        ceiling = Some(floor);
    }

    entries.push(LegendEntry {
        color: WHO_OK_COLOR,
        band: Band::WhoOk,
        above: Some(0.0),
        up_to: ceiling,
        label: format!("0 - {:.0}", ceiling.unwrap_or_default()),
    });
    entries.push(LegendEntry {
        color: NO_DATA_COLOR,
        band: Band::NoData,
        above: None,
        up_to: None,
        label: "No data".to_string(),
    });
    entries
}
