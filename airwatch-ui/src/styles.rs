#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-airwatch-ui]";

/// Default CSS; override the custom properties to restyle.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --airwatch-font-family: 'Inter', system-ui, -apple-system, 'Segoe UI', sans-serif;
  --airwatch-bg: #ffffff;
  --airwatch-text: #1f2933;
  --airwatch-muted: #52606d;
  --airwatch-border: rgba(148, 163, 184, 0.35);
  --airwatch-accent: #2563eb;
  --airwatch-radius: 12px;
}

.airwatch-root {
  font-family: var(--airwatch-font-family);
  background: var(--airwatch-bg);
  color: var(--airwatch-text);
  display: flex;
  flex-direction: column;
  gap: 18px;
  padding: 16px;
}

.airwatch-time {
  display: grid;
  gap: 8px;
}

.airwatch-time-display {
  display: flex;
  align-items: baseline;
  gap: 10px;
}

.airwatch-month {
  font-size: 1.6rem;
  font-weight: 700;
}

.airwatch-slider {
  width: 100%;
}

.airwatch-slider-labels {
  display: flex;
  justify-content: space-between;
  color: var(--airwatch-muted);
  font-size: 0.8rem;
}

.airwatch-map-section {
  position: relative;
}

.airwatch-map {
  position: relative;
  overflow: hidden;
  border: 1px solid var(--airwatch-border);
  border-radius: var(--airwatch-radius);
  background: #eef2f6;
}

.airwatch-marker {
  cursor: pointer;
}

.airwatch-zoom {
  position: absolute;
  top: 10px;
  left: 10px;
  display: flex;
  flex-direction: column;
  gap: 4px;
}

.airwatch-zoom button {
  width: 30px;
  height: 30px;
}

.airwatch-popup {
  position: absolute;
  transform: translate(-50%, -100%);
  background: #ffffff;
  border-radius: var(--airwatch-radius);
  box-shadow: 0 8px 24px rgba(15, 23, 42, 0.18);
  padding: 10px 12px;
}

.airwatch-overlay {
  position: absolute;
  left: 8px;
  right: 8px;
  bottom: 8px;
  max-height: 50%;
  overflow-y: auto;
  background: #ffffff;
  border-radius: var(--airwatch-radius);
  box-shadow: 0 -4px 20px rgba(15, 23, 42, 0.2);
  padding: 12px;
}

.airwatch-legend {
  position: absolute;
  right: 10px;
  bottom: 10px;
  background: #ffffff;
  border-radius: var(--airwatch-radius);
  box-shadow: 0 4px 14px rgba(15, 23, 42, 0.15);
  padding: 6px 10px;
  font-size: 0.8rem;
  cursor: pointer;
}

.airwatch-legend ul {
  list-style: none;
  margin: 6px 0 0;
  padding: 0;
  display: grid;
  gap: 4px;
}

.airwatch-legend li {
  display: flex;
  align-items: center;
  gap: 6px;
}

.airwatch-location header {
  display: flex;
  justify-content: space-between;
  align-items: center;
}

.airwatch-location dl {
  display: grid;
  grid-template-columns: auto 1fr;
  gap: 2px 10px;
  font-size: 0.85rem;
}

.airwatch-location dt {
  color: var(--airwatch-muted);
}

.airwatch-reading {
  display: flex;
  align-items: center;
  gap: 8px;
}

.airwatch-swatch {
  display: inline-block;
  width: 14px;
  height: 14px;
  border-radius: 50%;
}

.airwatch-unit,
.airwatch-explanation,
.airwatch-remark {
  color: var(--airwatch-muted);
  font-size: 0.85rem;
}

.airwatch-close {
  border: none;
  background: transparent;
  font-size: 1.2rem;
  cursor: pointer;
}

.airwatch-compare {
  margin-top: 8px;
  background: var(--airwatch-accent);
  color: #ffffff;
  border: none;
  border-radius: 999px;
  padding: 4px 14px;
  cursor: pointer;
}

.airwatch-dock {
  position: fixed;
  right: 16px;
  bottom: 16px;
  display: flex;
  align-items: center;
  gap: 10px;
  background: #ffffff;
  border: 1px solid var(--airwatch-border);
  border-radius: 999px;
  padding: 6px 14px;
  box-shadow: 0 8px 24px rgba(15, 23, 42, 0.15);
}

.airwatch-filters {
  display: flex;
  flex-wrap: wrap;
  gap: 8px;
  margin-bottom: 8px;
}

.airwatch-table table {
  width: 100%;
  border-collapse: collapse;
}

.airwatch-table th,
.airwatch-table td {
  border-bottom: 1px solid var(--airwatch-border);
  padding: 6px 8px;
  text-align: left;
}

.airwatch-num {
  font-variant-numeric: tabular-nums;
}

.airwatch-empty {
  color: var(--airwatch-muted);
  font-style: italic;
}

.airwatch-modal {
  position: fixed;
  inset: 0;
  background: rgba(15, 23, 42, 0.45);
  display: flex;
  align-items: center;
  justify-content: center;
}

.airwatch-modal-body {
  background: #ffffff;
  border-radius: var(--airwatch-radius);
  padding: 18px;
  max-width: 960px;
  width: 92%;
}

.airwatch-modal-body > header {
  display: flex;
  justify-content: space-between;
  align-items: center;
}

.airwatch-cards {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
  gap: 14px;
}

@media (max-width: 768px) {
  .airwatch-dock {
    left: 16px;
    justify-content: space-between;
  }
}
"#;

/// Inject the default stylesheet once per document.
pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-airwatch-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.dyn_into::<Node>()?)?;

    Ok(())
}
