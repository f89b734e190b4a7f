//! Yew front end for the air-quality dashboard.
//!
//! The component owns a `Dashboard` inside a reducer; every control
//! dispatches a command and re-renders from `Dashboard::view`.

#[cfg(target_arch = "wasm32")]
mod styles;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::rc::Rc;

    use crate::styles;
    use airwatch_core::{
        legend, project, Dashboard, DashboardConfig, DockState, HeaderControl, Location,
        LocationView, MarkerClick, MarkerSpec, Surfaces, TableFilters, TableView, TimeState,
        Viewport, COMPARE_ACTION_TEXT, REMARK_PREFIX,
    };
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Element, HtmlInputElement, HtmlSelectElement, Window};
    use yew::events::InputEvent;
    use yew::prelude::*;
    use yew::TargetCast;

    const MAP_HEIGHT: f64 = 520.0;
    const MAX_MAP_WIDTH: f64 = 1200.0;
    const MIN_ZOOM: f64 = 3.0;
    const MAX_ZOOM: f64 = 18.0;

    #[derive(Clone)]
    struct DashboardModel {
        dashboard: Dashboard,
        center: (f64, f64),
        zoom: f64,
        /// Sequence number and text; the number re-triggers identical alerts.
        alert: Option<(u32, String)>,
        alerts_shown: u32,
    }

    impl DashboardModel {
        fn new(locations: Vec<Location>, config: DashboardConfig) -> Self {
            let center = config.initial_center;
            let zoom = f64::from(config.initial_zoom);
            Self {
                dashboard: Dashboard::new(locations, config, Surfaces::all()),
                center,
                zoom,
                alert: None,
                alerts_shown: 0,
            }
        }
    }

    enum DashboardAction {
        SelectIndex(usize),
        SelectYear(String),
        SelectPeriod(String),
        ToggleCompare(String),
        RemoveCompared(usize),
        ShowComparison,
        CloseComparison,
        ClearComparison,
        SetFilters(TableFilters),
        ResetFilters,
        ClickMarker {
            location_id: String,
            viewport: Viewport,
        },
        ClickBackground,
        Zoom(f64),
    }

    impl Reducible for DashboardModel {
        type Action = DashboardAction;

        fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
            let mut next = (*self).clone();
            let dash = &mut next.dashboard;

            match action {
                DashboardAction::SelectIndex(index) => {
                    dash.select_index(index);
                }
                DashboardAction::SelectYear(year) => {
                    dash.select_year(&year);
                }
                DashboardAction::SelectPeriod(label) => {
                    if let Err(err) = dash.select_period(&label) {
                        log::warn!("{err}");
                    }
                }
                DashboardAction::ToggleCompare(location_id) => {
                    if let Err(err) = dash.toggle_compare(&location_id) {
                        next.alerts_shown += 1;
                        next.alert = Some((next.alerts_shown, err.to_string()));
                    }
                }
                DashboardAction::RemoveCompared(index) => {
                    dash.remove_compared(index);
                }
                DashboardAction::ShowComparison => {
                    dash.show_comparison();
                }
                DashboardAction::CloseComparison => dash.close_comparison(),
                DashboardAction::ClearComparison => dash.clear_comparison(),
                DashboardAction::SetFilters(filters) => dash.set_filters(filters),
                DashboardAction::ResetFilters => dash.reset_filters(),
                DashboardAction::ClickMarker {
                    location_id,
                    viewport,
                } => {
                    if let MarkerClick::Overlay { fly_to, .. } =
                        dash.click_marker(&location_id, &viewport)
                    {
                        next.center = fly_to.center;
                        next.zoom = fly_to.zoom;
                    }
                }
                DashboardAction::ClickBackground => dash.click_map_background(),
                DashboardAction::Zoom(delta) => {
                    next.zoom = (next.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
                }
            }

            Rc::new(next)
        }
    }

    #[derive(Clone, Default, PartialEq)]
    struct FilterInputs {
        text: String,
        min: String,
        max: String,
        hide_no_data: bool,
    }

    impl FilterInputs {
        fn to_filters(&self) -> TableFilters {
            TableFilters::from_inputs(&self.text, &self.min, &self.max, self.hide_no_data)
        }
    }

    #[derive(Properties, PartialEq)]
    pub struct DashboardAppProps {
        pub locations: Vec<Location>,
        pub config: DashboardConfig,
    }

    #[function_component(DashboardApp)]
    fn dashboard_app(props: &DashboardAppProps) -> Html {
        use_effect_with((), |_| {
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                if let Err(err) = styles::ensure_styles(&document) {
                    log::error!("could not install styles: {err:?}");
                }
            }
            || ()
        });

        let model = {
            let locations = props.locations.clone();
            let config = props.config.clone();
            use_reducer(move || DashboardModel::new(locations, config))
        };

        let alert = model.alert.clone();
        use_effect_with(alert, |alert| {
            if let Some((_, message)) = alert {
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(message);
                }
            }
            || ()
        });

        // Any click that reaches the document closes the legend.
        let legend_open = use_state(|| false);
        {
            let legend_open = legend_open.clone();
            use_effect_with((), move |_| {
                let listener = Closure::<dyn Fn()>::new(move || legend_open.set(false));
                let document = web_sys::window().and_then(|w| w.document());
                if let Some(document) = &document {
                    let _ = document
                        .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref());
                }
                move || {
                    if let Some(document) = &document {
                        let _ = document.remove_event_listener_with_callback(
                            "click",
                            listener.as_ref().unchecked_ref(),
                        );
                    }
                }
            });
        }

        let inputs = use_state(FilterInputs::default);
        let view = model.dashboard.view();
        let (map_width, viewport_width) = map_dimensions();

        html! {
            <div class="airwatch-root">
                { render_time_controls(view.time.as_ref(), view.time_message, &model) }
                <section class="airwatch-map-section">
                    { render_map(&view.markers, view.open_popup.as_deref(), &model, map_width, viewport_width) }
                    { render_legend(&legend_open) }
                    { view.overlay.as_ref().map(|overlay| html! {
                        <div class="airwatch-overlay">
                            { render_location_view(overlay, &model) }
                        </div>
                    }).unwrap_or_default() }
                </section>
                { render_dock(&view.dock, &model) }
                { view.table.as_ref().map(|table| render_table(table, &model, &inputs)).unwrap_or_default() }
                { view.comparison.as_ref().map(|cards| render_comparison(cards, &model)).unwrap_or_default() }
            </div>
        }
    }

    fn map_dimensions() -> (f64, f64) {
        let viewport_width = web_sys::window()
            .and_then(|w| w.inner_width().ok())
            .and_then(|v| v.as_f64())
            .unwrap_or(MAX_MAP_WIDTH);
        ((viewport_width - 32.0).clamp(240.0, MAX_MAP_WIDTH), viewport_width)
    }

    fn render_time_controls(
        time: Option<&TimeState>,
        message: Option<&'static str>,
        model: &UseReducerHandle<DashboardModel>,
    ) -> Html {
        if let Some(message) = message {
            return html! {
                <header class="airwatch-time">
                    <p class="airwatch-empty">{ message }</p>
                </header>
            };
        }
        let Some(time) = time else {
            return Html::default();
        };

        let on_slide = {
            let model = model.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                if let Ok(index) = input.value().parse::<usize>() {
                    model.dispatch(DashboardAction::SelectIndex(index));
                }
            })
        };
        let on_year = {
            let model = model.clone();
            Callback::from(move |event: Event| {
                let select: HtmlSelectElement = event.target_unchecked_into();
                model.dispatch(DashboardAction::SelectYear(select.value()));
            })
        };
        let on_period = {
            let model = model.clone();
            Callback::from(move |event: Event| {
                let select: HtmlSelectElement = event.target_unchecked_into();
                model.dispatch(DashboardAction::SelectPeriod(select.value()));
            })
        };

        html! {
            <header class="airwatch-time">
                <div class="airwatch-time-display">
                    <span class="airwatch-month">{ time.month.clone() }</span>
                    <select class="airwatch-year" onchange={on_year}>
                        { for time.years.iter().map(|year| html! {
                            <option value={year.clone()} selected={*year == time.year}>{ year.clone() }</option>
                        }) }
                    </select>
                </div>
                <input
                    class="airwatch-slider"
                    type="range"
                    min="0"
                    max={time.slider_max.to_string()}
                    value={time.slider_value.to_string()}
                    oninput={on_slide}
                />
                <div class="airwatch-slider-labels">
                    <span>{ "Oldest" }</span>
                    <span>{ "Newest" }</span>
                </div>
                <select class="airwatch-period" onchange={on_period}>
                    { for time.periods.iter().map(|period| html! {
                        <option value={period.clone()} selected={*period == time.period}>{ period.clone() }</option>
                    }) }
                </select>
            </header>
        }
    }

    fn render_map(
        markers: &[MarkerSpec],
        open_popup: Option<&str>,
        model: &UseReducerHandle<DashboardModel>,
        width: f64,
        viewport_width: f64,
    ) -> Html {
        let zoom = model.zoom;
        let (cx, cy) = project(model.center.0, model.center.1, zoom);
        let origin = (cx - width / 2.0, cy - MAP_HEIGHT / 2.0);
        let duration = model.dashboard.config().fly_duration_secs;

        let on_background = {
            let model = model.clone();
            Callback::from(move |_: MouseEvent| model.dispatch(DashboardAction::ClickBackground))
        };
        let on_zoom_in = {
            let model = model.clone();
            Callback::from(move |_: MouseEvent| model.dispatch(DashboardAction::Zoom(1.0)))
        };
        let on_zoom_out = {
            let model = model.clone();
            Callback::from(move |_: MouseEvent| model.dispatch(DashboardAction::Zoom(-1.0)))
        };

        let circles = markers.iter().map(|marker| {
            let (x, y) = project(marker.lat, marker.lon, zoom);
            let location_id = marker.location_id.clone();
            let viewport = Viewport {
                width: viewport_width,
                height: MAP_HEIGHT,
                zoom,
            };
            let onclick = {
                let model = model.clone();
                Callback::from(move |event: MouseEvent| {
                    event.stop_propagation();
                    model.dispatch(DashboardAction::ClickMarker {
                        location_id: location_id.clone(),
                        viewport,
                    });
                })
            };
            html! {
                <circle
                    key={marker.location_id.clone()}
                    class="airwatch-marker"
                    cx={x.to_string()}
                    cy={y.to_string()}
                    r={marker.style.radius.to_string()}
                    fill={marker.fill_color.clone()}
                    fill-opacity={marker.style.fill_opacity.to_string()}
                    stroke={marker.style.stroke.clone()}
                    stroke-width={marker.style.weight.to_string()}
                    {onclick}
                >
                    <title>{ marker.popup.title.clone() }</title>
                </circle>
            }
        });

        let popup = open_popup
            .and_then(|id| markers.iter().find(|m| m.location_id == id))
            .map(|marker| {
                let (x, y) = project(marker.lat, marker.lon, zoom);
                let style = format!(
                    "left:{}px;top:{}px;max-width:{}px",
                    x - origin.0,
                    y - origin.1 - marker.style.radius,
                    marker.popup_options.max_width
                );
                html! {
                    <div class="airwatch-popup" {style}>
                        { render_location_view(&marker.popup, model) }
                    </div>
                }
            })
            .unwrap_or_default();

        let pan = format!(
            "transform:translate({}px,{}px);transition:transform {duration}s ease-out",
            -origin.0, -origin.1
        );

        html! {
            <div class="airwatch-map" style={format!("width:{width}px;height:{MAP_HEIGHT}px")}>
                <svg width={width.to_string()} height={MAP_HEIGHT.to_string()} onclick={on_background}>
                    <g style={pan}>
                        { for circles }
                    </g>
                </svg>
                <div class="airwatch-zoom">
                    <button type="button" onclick={on_zoom_in}>{ "+" }</button>
                    <button type="button" onclick={on_zoom_out}>{ "-" }</button>
                </div>
                { popup }
            </div>
        }
    }

    fn render_legend(open: &UseStateHandle<bool>) -> Html {
        let is_open = **open;
        let onclick = {
            let open = open.clone();
            Callback::from(move |event: MouseEvent| {
                event.stop_propagation();
                open.set(!*open);
            })
        };

        html! {
            <div class={classes!("airwatch-legend", is_open.then_some("is-open"))} {onclick}>
                <span class="airwatch-legend-title">{ "NO₂ (µg/m³)" }</span>
                if is_open {
                    <ul>
                        { for legend().into_iter().map(|entry| html! {
                            <li>
                                <span class="airwatch-swatch" style={format!("background:{}", entry.color)}></span>
                                { entry.label }
                            </li>
                        }) }
                    </ul>
                }
            </div>
        }
    }

    fn render_location_view(view: &LocationView, model: &UseReducerHandle<DashboardModel>) -> Html {
        let header_control = match view.header {
            HeaderControl::None => Html::default(),
            HeaderControl::CloseOverlay => {
                let model = model.clone();
                let onclick =
                    Callback::from(move |_: MouseEvent| model.dispatch(DashboardAction::ClickBackground));
                html! { <button type="button" class="airwatch-close" {onclick}>{ "×" }</button> }
            }
            HeaderControl::Remove { index } => {
                let model = model.clone();
                let onclick = Callback::from(move |_: MouseEvent| {
                    model.dispatch(DashboardAction::RemoveCompared(index))
                });
                html! { <button type="button" class="airwatch-close" {onclick}>{ "×" }</button> }
            }
        };

        let compare_button = view
            .compare_action
            .as_ref()
            .map(|location_id| {
                let model = model.clone();
                let location_id = location_id.clone();
                let onclick = Callback::from(move |_: MouseEvent| {
                    model.dispatch(DashboardAction::ToggleCompare(location_id.clone()))
                });
                html! { <button type="button" class="airwatch-compare" {onclick}>{ COMPARE_ACTION_TEXT }</button> }
            })
            .unwrap_or_default();

        html! {
            <article class="airwatch-location">
                <header>
                    <h3>{ view.title.clone() }</h3>
                    { header_control }
                </header>
                <dl>
                    <dt>{ "Location ID" }</dt><dd>{ view.location_id.clone() }</dd>
                    <dt>{ "Tube ID" }</dt><dd>{ view.tube_id.clone() }</dd>
                    <dt>{ "Coordinates" }</dt><dd>{ view.coordinates.clone() }</dd>
                </dl>
                { view.description.as_ref().map(|text| html! {
                    <p class="airwatch-description">{ text.clone() }</p>
                }).unwrap_or_default() }
                { view.remark.as_ref().map(|text| html! {
                    <p class="airwatch-remark">{ format!("{REMARK_PREFIX}{text}") }</p>
                }).unwrap_or_default() }
                <div class="airwatch-reading">
                    <span class="airwatch-period-label">{ view.period.clone() }</span>
                    <span class="airwatch-swatch" style={format!("background:{}", view.color)}></span>
                    <strong>{ view.value_text.clone() }</strong>
                    <span class="airwatch-unit">{ view.unit }</span>
                </div>
                { view.explanation.as_ref().map(|text| html! {
                    <p class="airwatch-explanation">{ text.clone() }</p>
                }).unwrap_or_default() }
                { compare_button }
            </article>
        }
    }

    fn render_dock(dock: &DockState, model: &UseReducerHandle<DashboardModel>) -> Html {
        if !dock.visible {
            return Html::default();
        }
        let on_show = {
            let model = model.clone();
            Callback::from(move |_: MouseEvent| model.dispatch(DashboardAction::ShowComparison))
        };
        let on_clear = {
            let model = model.clone();
            Callback::from(move |_: MouseEvent| model.dispatch(DashboardAction::ClearComparison))
        };
        html! {
            <div class="airwatch-dock">
                <span>{ dock.label.clone() }</span>
                <button type="button" onclick={on_show}>{ "Compare" }</button>
                <button type="button" onclick={on_clear}>{ "Clear" }</button>
            </div>
        }
    }

    fn render_table(
        table: &TableView,
        model: &UseReducerHandle<DashboardModel>,
        inputs: &UseStateHandle<FilterInputs>,
    ) -> Html {
        let update = |edit: fn(&mut FilterInputs, &HtmlInputElement)| {
            let model = model.clone();
            let inputs = inputs.clone();
            move |input: HtmlInputElement| {
                let mut next = (*inputs).clone();
                edit(&mut next, &input);
                model.dispatch(DashboardAction::SetFilters(next.to_filters()));
                inputs.set(next);
            }
        };

        let on_text = {
            let apply = update(|f, input| f.text = input.value());
            Callback::from(move |event: InputEvent| apply(event.target_unchecked_into()))
        };
        let on_min = {
            let apply = update(|f, input| f.min = input.value());
            Callback::from(move |event: InputEvent| apply(event.target_unchecked_into()))
        };
        let on_max = {
            let apply = update(|f, input| f.max = input.value());
            Callback::from(move |event: InputEvent| apply(event.target_unchecked_into()))
        };
        let on_hide = {
            let apply = update(|f, input| f.hide_no_data = input.checked());
            Callback::from(move |event: Event| apply(event.target_unchecked_into()))
        };
        let on_reset = {
            let model = model.clone();
            let inputs = inputs.clone();
            Callback::from(move |_: MouseEvent| {
                inputs.set(FilterInputs::default());
                model.dispatch(DashboardAction::ResetFilters);
            })
        };

        let body = match table.empty_message {
            Some(message) => html! {
                <tr><td colspan="4" class="airwatch-empty">{ message }</td></tr>
            },
            None => html! {
                for table.rows.iter().map(|row| html! {
                    <tr key={row.location_id.clone()}>
                        <td>{ row.location_id.clone() }</td>
                        <td>{ row.name.clone() }</td>
                        <td>{ row.period.clone() }</td>
                        <td class="airwatch-num">{ row.no2_text() }</td>
                    </tr>
                })
            },
        };

        html! {
            <section class="airwatch-table">
                <div class="airwatch-filters">
                    <input type="search" placeholder="Search locations" value={inputs.text.clone()} oninput={on_text} />
                    <input type="number" placeholder="Min NO₂" value={inputs.min.clone()} oninput={on_min} />
                    <input type="number" placeholder="Max NO₂" value={inputs.max.clone()} oninput={on_max} />
                    <label>
                        <input type="checkbox" checked={inputs.hide_no_data} onchange={on_hide} />
                        { "Hide no data" }
                    </label>
                    <button type="button" onclick={on_reset}>{ "Reset" }</button>
                </div>
                <table>
                    <thead>
                        <tr>
                            <th>{ "Location ID" }</th>
                            <th>{ "Location" }</th>
                            <th>{ "Period" }</th>
                            <th>{ "NO₂ (µg/m³)" }</th>
                        </tr>
                    </thead>
                    <tbody>{ body }</tbody>
                </table>
            </section>
        }
    }

    fn render_comparison(cards: &[LocationView], model: &UseReducerHandle<DashboardModel>) -> Html {
        let on_close = {
            let model = model.clone();
            Callback::from(move |_: MouseEvent| model.dispatch(DashboardAction::CloseComparison))
        };
        html! {
            <div class="airwatch-modal" role="dialog">
                <div class="airwatch-modal-body">
                    <header>
                        <h2>{ "Comparison" }</h2>
                        <button type="button" class="airwatch-close" onclick={on_close}>{ "×" }</button>
                    </header>
                    <div class="airwatch-cards">
                        { for cards.iter().map(|card| render_location_view(card, model)) }
                    </div>
                </div>
            </div>
        }
    }

    fn mount_target(selector: &str) -> Result<Element, JsValue> {
        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("bad selector: {err:?}")))?
            .ok_or_else(|| JsValue::from_str(&format!("no element matches {selector}")))
    }

    fn render_into(target: Element, locations: Vec<Location>, config: DashboardConfig) {
        yew::Renderer::<DashboardApp>::with_root_and_props(
            target,
            DashboardAppProps { locations, config },
        )
        .render();
    }

    /// Mount with an already loaded feed payload.
    #[wasm_bindgen]
    pub fn mount_dashboard(
        selector: &str,
        feed: JsValue,
        config: Option<JsValue>,
    ) -> Result<(), JsValue> {
        let target = mount_target(selector)?;
        let config = airwatch_wasm::config_from_js(config)?;
        let feed: serde_json::Value = from_value(feed)?;
        let locations = airwatch_feed::parse_locations_value(&feed)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        render_into(target, locations, config);
        Ok(())
    }

    /// Fetch the feed from `config.feedUrl` and mount. On failure the error is
    /// logged and nothing is rendered.
    #[wasm_bindgen]
    pub async fn mount_dashboard_from_url(
        selector: String,
        config: Option<JsValue>,
    ) -> Result<(), JsValue> {
        airwatch_wasm::init_logging(None);
        let target = mount_target(&selector)?;
        let config = airwatch_wasm::config_from_js(config)?;

        match airwatch_wasm::fetch_feed(&config.feed_url).await {
            Ok(locations) => {
                render_into(target, locations, config);
                Ok(())
            }
            Err(err) => {
                log::error!("Map loading failed: {err}");
                Err(JsValue::from_str(&err.to_string()))
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::{mount_dashboard, mount_dashboard_from_url};

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_dashboard(
    _: &str,
    _: wasm_bindgen::JsValue,
    _: Option<wasm_bindgen::JsValue>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "airwatch-ui only builds for the wasm32 target",
    ))
}
