use serde::{Deserialize, Serialize};

use crate::model::Location;
use crate::render::{render_location, DisplayData, LocationView, RenderMode};
use crate::DashboardError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionItem {
    pub location_id: String,
    pub period: String,
}

/// The persistent "n location(s) selected" indicator.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DockState {
    pub visible: bool,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoveOutcome {
    /// Index out of range; nothing changed.
    Ignored,
    /// Selection emptied: dock hidden and view closed.
    Emptied,
    Remaining { count: usize },
}

/// Bounded selection of (location, period) pairs shown side by side.
#[derive(Debug, Clone)]
pub struct ComparisonController {
    max_items: usize,
    items: Vec<SelectionItem>,
    open: bool,
}

impl ComparisonController {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items,
            items: Vec::new(),
            open: false,
        }
    }

    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Add `(location_id, period)` to the selection.
    ///
    /// Duplicates and a full selection are rejected without touching state.
    pub fn toggle(&mut self, location_id: &str, period: &str) -> Result<usize, DashboardError> {
        if self
            .items
            .iter()
            .any(|item| item.location_id == location_id && item.period == period)
        {
            return Err(DashboardError::AlreadyCompared {
                location_id: location_id.to_string(),
                period: period.to_string(),
            });
        }

        if self.items.len() >= self.max_items {
            return Err(DashboardError::ComparisonFull {
                max: self.max_items,
            });
        }

        self.items.push(SelectionItem {
            location_id: location_id.to_string(),
            period: period.to_string(),
        });
        Ok(self.items.len())
    }

    pub fn remove(&mut self, index: usize) -> RemoveOutcome {
        if index >= self.items.len() {
            return RemoveOutcome::Ignored;
        }

        self.items.remove(index);
        if self.items.is_empty() {
            self.close();
            self.clear();
            RemoveOutcome::Emptied
        } else {
            RemoveOutcome::Remaining {
                count: self.items.len(),
            }
        }
    }

    /// Open the comparison view and render one card per selected item.
    pub fn show(&mut self, locations: &[Location]) -> Vec<LocationView> {
        self.open = true;
        self.cards(locations)
    }

    /// Cards re-resolved against the current snapshot.
    ///
    /// Items whose location vanished from the snapshot are skipped.
    pub fn cards(&self, locations: &[Location]) -> Vec<LocationView> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let location = locations
                    .iter()
                    .find(|loc| loc.location_id == item.location_id)?;
                let data = DisplayData::resolve(location, &item.period);
                Some(render_location(RenderMode::Card { index }, location, &data))
            })
            .collect()
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn dock(&self) -> DockState {
        if self.items.is_empty() {
            return DockState::default();
        }
        DockState {
            visible: true,
            label: format!("{} location(s) selected", self.items.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measurement;

    fn snapshot() -> Vec<Location> {
        ["A", "B", "C"]
            .iter()
            .map(|id| Location {
                location_id: id.to_string(),
                name: format!("Site {id}"),
                history: vec![Measurement {
                    date_str: Some("Oct 2025".to_string()),
                    val: Some(21.0),
                    ..Measurement::default()
                }],
                ..Location::default()
            })
            .collect()
    }

    #[test]
    fn rejects_duplicates_and_overflow() {
        let mut cmp = ComparisonController::new(2);
        assert_eq!(cmp.toggle("A", "Oct 2025"), Ok(1));

        let err = cmp.toggle("A", "Oct 2025").unwrap_err();
        assert_eq!(
            err.to_string(),
            "This location from this period is already in the comparison."
        );
        assert_eq!(cmp.len(), 1);

        // Same location, other period is a different pair.
        assert_eq!(cmp.toggle("A", "Nov 2025"), Ok(2));

        let err = cmp.toggle("B", "Oct 2025").unwrap_err();
        assert_eq!(err, DashboardError::ComparisonFull { max: 2 });
        assert_eq!(err.to_string(), "You can compare a maximum of 2 locations.");
        assert_eq!(cmp.len(), 2);
    }

    #[test]
    fn dock_tracks_selection() {
        let mut cmp = ComparisonController::new(2);
        assert!(!cmp.dock().visible);

        cmp.toggle("A", "Oct 2025").unwrap();
        assert_eq!(
            cmp.dock(),
            DockState {
                visible: true,
                label: "1 location(s) selected".to_string()
            }
        );

        cmp.clear();
        assert!(!cmp.dock().visible);
        assert!(cmp.is_empty());
    }

    #[test]
    fn removing_last_item_closes_everything() {
        let locations = snapshot();
        let mut cmp = ComparisonController::new(2);
        cmp.toggle("A", "Oct 2025").unwrap();
        cmp.toggle("B", "Oct 2025").unwrap();
        cmp.show(&locations);

        assert_eq!(cmp.remove(0), RemoveOutcome::Remaining { count: 1 });
        assert!(cmp.is_open());
        assert_eq!(cmp.items()[0].location_id, "B");

        assert_eq!(cmp.remove(0), RemoveOutcome::Emptied);
        assert!(!cmp.is_open());
        assert!(!cmp.dock().visible);

        assert_eq!(cmp.remove(0), RemoveOutcome::Ignored);
        assert!(cmp.is_empty());
    }

    #[test]
    fn cards_are_resolved_per_item_period() {
        let mut locations = snapshot();
        let mut cmp = ComparisonController::new(2);
        cmp.toggle("A", "Oct 2025").unwrap();
        cmp.toggle("C", "Sep 2025").unwrap();

        locations[0].history[0].val = Some(64.0);
        let cards = cmp.show(&locations);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].mode, RenderMode::Card { index: 0 });
        assert_eq!(cards[0].value_text, "64.00");
        assert_eq!(cards[0].color, "#C92033");
        assert_eq!(cards[1].value_text, "No data");
        assert_eq!(cards[1].period, "Sep 2025");
    }
}
