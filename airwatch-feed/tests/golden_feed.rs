use std::fs;

use airwatch_core::{Dashboard, DashboardConfig, Surfaces};
use airwatch_feed::parse_locations_str;
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn load_fixture() -> String {
    fs::read_to_string(fixture_path("locations.json")).expect("could not read feed fixture")
}

#[test]
fn feed_matches_golden() {
    let locations = parse_locations_str(&load_fixture()).expect("feed should decode");
    let actual = serde_json::to_value(&locations).expect("locations serialize");

    let expected = fs::read_to_string(fixture_path("locations_normalized.json"))
        .expect("could not read golden snapshot");
    let expected: Value = serde_json::from_str(&expected).expect("golden is valid JSON");

    assert_eq!(actual, expected);
}

#[test]
fn fixture_drives_dashboard() {
    let locations = parse_locations_str(&load_fixture()).expect("feed should decode");
    let dash = Dashboard::new(locations, DashboardConfig::default(), Surfaces::all());

    assert_eq!(
        dash.periods().as_slice(),
        ["Aug 2025", "Sep 2025", "Oct 2025"]
    );
    assert_eq!(dash.selected_period(), Some("Oct 2025"));

    let view = dash.view();
    let ids: Vec<&str> = view.markers.iter().map(|m| m.location_id.as_str()).collect();
    assert_eq!(ids, ["KS-01", "KS-02"]);
    assert_eq!(view.markers[0].popup.value_text, "51.50");
    assert_eq!(view.markers[0].popup.remark.as_deref(), Some("lid replaced"));
    assert_eq!(view.markers[1].popup.value_text, "No data");
}
