use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Location;

/// Distinct period labels of a snapshot, ordered by the earliest raw date seen
/// for each label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodIndex {
    periods: Vec<String>,
}

impl PeriodIndex {
    /// Build the index from a location snapshot.
    ///
    /// Entries without a label or without a parsed date are skipped. Labels
    /// sharing the same earliest date keep the order in which they were first
    /// encountered.
    pub fn build(locations: &[Location]) -> Self {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut earliest: Vec<(&str, DateTime<Utc>)> = Vec::new();

        for entry in locations.iter().flat_map(|loc| loc.history.iter()) {
            let (Some(label), Some(raw)) = (entry.date_str.as_deref(), entry.raw_date) else {
                continue;
            };
            if label.is_empty() {
                continue;
            }

            match seen.get(label) {
                Some(&slot) => {
                    if raw < earliest[slot].1 {
                        earliest[slot].1 = raw;
                    }
                }
                None => {
                    seen.insert(label, earliest.len());
                    earliest.push((label, raw));
                }
            }
        }

        earliest.sort_by_key(|(_, raw)| *raw);

        Self {
            periods: earliest
                .into_iter()
                .map(|(label, _)| label.to_string())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.periods.get(index).map(String::as_str)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.periods.iter().position(|p| p == label)
    }

    pub fn latest_index(&self) -> Option<usize> {
        self.periods.len().checked_sub(1)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.periods
    }

    /// Years present in the index, in chronological order of first appearance.
    pub fn years(&self) -> Vec<String> {
        let mut years: Vec<String> = Vec::new();
        for label in &self.periods {
            let (_, year) = split_label(label);
            if !year.is_empty() && !years.iter().any(|y| y == year) {
                years.push(year.to_string());
            }
        }
        years
    }

    /// First period whose label contains `year`.
    pub fn first_index_for_year(&self, year: &str) -> Option<usize> {
        if year.is_empty() {
            return None;
        }
        self.periods.iter().position(|p| p.contains(year))
    }
}

/// Split a "Mon YYYY" label into its month and year parts.
pub fn split_label(label: &str) -> (&str, &str) {
    let mut parts = label.split(' ');
    let month = parts.next().unwrap_or_default();
    let year = parts.next().unwrap_or_default();
    (month, year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measurement;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn entry(label: &str, raw: Option<DateTime<Utc>>) -> Measurement {
        Measurement {
            date_str: Some(label.to_string()),
            raw_date: raw,
            ..Measurement::default()
        }
    }

    fn location(id: &str, history: Vec<Measurement>) -> Location {
        Location {
            location_id: id.to_string(),
            history,
            ..Location::default()
        }
    }

    #[test]
    fn orders_by_earliest_raw_date_across_locations() {
        let snapshot = vec![
            location(
                "A",
                vec![
                    entry("Mar 2025", Some(at(2025, 3, 1))),
                    entry("Jan 2025", Some(at(2025, 1, 20))),
                ],
            ),
            location(
                "B",
                vec![
                    entry("Jan 2025", Some(at(2025, 1, 2))),
                    entry("Dec 2024", Some(at(2024, 12, 1))),
                ],
            ),
        ];

        let index = PeriodIndex::build(&snapshot);
        assert_eq!(index.as_slice(), ["Dec 2024", "Jan 2025", "Mar 2025"]);
        assert_eq!(index.latest_index(), Some(2));
        assert_eq!(index.position("Jan 2025"), Some(1));
    }

    #[test]
    fn skips_unlabelled_and_undated_entries() {
        let snapshot = vec![location(
            "A",
            vec![
                entry("", Some(at(2025, 1, 1))),
                entry("sometime", None),
                Measurement::default(),
                entry("Feb 2025", Some(at(2025, 2, 1))),
            ],
        )];

        let index = PeriodIndex::build(&snapshot);
        assert_eq!(index.as_slice(), ["Feb 2025"]);
    }

    #[test]
    fn building_twice_is_idempotent() {
        let snapshot = vec![
            location("A", vec![entry("May 2025", Some(at(2025, 5, 1)))]),
            location("B", vec![entry("Apr 2025", Some(at(2025, 5, 1)))]),
            location("C", vec![entry("Jan 2024", Some(at(2024, 1, 1)))]),
        ];

        let first = PeriodIndex::build(&snapshot);
        let second = PeriodIndex::build(&snapshot);
        assert_eq!(first, second);
        // Equal timestamps keep encounter order.
        assert_eq!(first.as_slice(), ["Jan 2024", "May 2025", "Apr 2025"]);
    }

    #[test]
    fn years_and_year_lookup() {
        let snapshot = vec![location(
            "A",
            vec![
                entry("Nov 2024", Some(at(2024, 11, 1))),
                entry("Dec 2024", Some(at(2024, 12, 1))),
                entry("Jan 2025", Some(at(2025, 1, 1))),
            ],
        )];

        let index = PeriodIndex::build(&snapshot);
        assert_eq!(index.years(), ["2024", "2025"]);
        assert_eq!(index.first_index_for_year("2025"), Some(2));
        assert_eq!(index.first_index_for_year("2024"), Some(0));
        assert_eq!(index.first_index_for_year("1999"), None);
        assert_eq!(split_label("Jan 2025"), ("Jan", "2025"));
        assert_eq!(split_label("garbage"), ("garbage", ""));
    }

    #[test]
    fn empty_snapshot_has_no_latest() {
        let index = PeriodIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.latest_index(), None);
        assert_eq!(index.get(0), None);
    }
}
