use std::path::{Path, PathBuf};

use airwatch_core::{Dashboard, DashboardConfig, Location, Surfaces, TableFilters};
use airwatch_feed::{assemble_locations, parse_records_str, LocationRecord, MeasurementRecord};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "airwatch-cli",
    about = "Inspect NO2 diffusion-tube data the way the dashboard shows it."
)]
struct Cli {
    /// Feed JSON as served by /api/locations.
    #[arg(short, long, global = true, conflicts_with_all = ["locations", "measurements"])]
    input: Option<PathBuf>,

    /// Raw location records (use together with --measurements).
    #[arg(long, global = true, requires = "measurements")]
    locations: Option<PathBuf>,

    /// Raw measurement records (use together with --locations).
    #[arg(long, global = true, requires = "locations")]
    measurements: Option<PathBuf>,

    /// Partial dashboard config as JSON; missing keys keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the chronological period index.
    Periods,
    /// Print the data table for a period.
    Table {
        #[command(flatten)]
        period: PeriodArg,
        /// Case-insensitive search over id and name.
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(long, default_value = "")]
        min: String,
        #[arg(long, default_value = "")]
        max: String,
        #[arg(long)]
        hide_no_data: bool,
    },
    /// Print the marker set for a period.
    Markers {
        #[command(flatten)]
        period: PeriodArg,
    },
    /// Compare locations side by side for a period.
    Compare {
        #[command(flatten)]
        period: PeriodArg,
        #[arg(long, num_args = 1.., required = true)]
        ids: Vec<String>,
        /// Print the card markup instead of plain text.
        #[arg(long)]
        html: bool,
    },
}

#[derive(Args, Debug)]
struct PeriodArg {
    /// Period label such as "Sep 2025", or "latest".
    #[arg(short, long, default_value = "latest")]
    period: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = load_config(cli.config.as_deref())?;
    let locations = load_locations(&cli)?;
    let mut dash = Dashboard::new(locations, config, Surfaces::all());

    match cli.command {
        Command::Periods => {
            if dash.periods().is_empty() {
                println!("{}", airwatch_core::NO_PERIODS_TEXT);
            }
            for (index, label) in dash.periods().as_slice().iter().enumerate() {
                println!("{index:>3}  {label}");
            }
        }
        Command::Table {
            period,
            query,
            min,
            max,
            hide_no_data,
        } => {
            select(&mut dash, &period.period)?;
            dash.set_filters(TableFilters::from_inputs(&query, &min, &max, hide_no_data));
            print_table(&dash);
        }
        Command::Markers { period } => {
            select(&mut dash, &period.period)?;
            print_markers(&dash);
        }
        Command::Compare { period, ids, html } => {
            select(&mut dash, &period.period)?;
            for id in &ids {
                let dock = dash
                    .toggle_compare(id)
                    .with_context(|| format!("could not add {id} to the comparison"))?;
                log::debug!("{}", dock.label);
            }
            for card in dash.show_comparison() {
                if html {
                    println!("{}", card.to_html());
                } else {
                    println!(
                        "[{}] {} ({})\n  {} {} {}\n  tube {}  at {}",
                        card.location_id,
                        card.title,
                        card.period,
                        card.value_text,
                        card.unit,
                        card.color,
                        card.tube_id,
                        card.coordinates
                    );
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DashboardConfig> {
    let Some(path) = path else {
        return Ok(DashboardConfig::default());
    };
    let text = read(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid config in {}", path.display()))
}

fn load_locations(cli: &Cli) -> anyhow::Result<Vec<Location>> {
    if let Some(input) = &cli.input {
        return Ok(airwatch_feed::parse_locations_str(&read(input)?)?);
    }

    match (&cli.locations, &cli.measurements) {
        (Some(locations), Some(measurements)) => {
            let locations: Vec<LocationRecord> = parse_records_str(&read(locations)?)?;
            let measurements: Vec<MeasurementRecord> = parse_records_str(&read(measurements)?)?;
            Ok(assemble_locations(&locations, &measurements))
        }
        _ => bail!("pass --input, or --locations together with --measurements"),
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

fn select(dash: &mut Dashboard, period: &str) -> anyhow::Result<()> {
    if period.eq_ignore_ascii_case("latest") {
        if dash.selected_period().is_none() {
            bail!("{}", airwatch_core::NO_PERIODS_TEXT);
        }
        return Ok(());
    }
    dash.select_period(period)?;
    Ok(())
}

fn print_table(dash: &Dashboard) {
    let Some(table) = dash.view().table else {
        return;
    };
    println!(
        "{} ({} of {} rows)",
        table.period.as_deref().unwrap_or("-"),
        table.rows.len(),
        table.total
    );
    if let Some(message) = table.empty_message {
        println!("{message}");
        return;
    }
    for row in &table.rows {
        println!("{:<10} {:<32} {:>8}", row.location_id, row.name, row.no2_text());
    }
}

fn print_markers(dash: &Dashboard) {
    let Some(map) = dash.map() else {
        return;
    };
    for marker in map.markers() {
        println!(
            "{:<10} {:>10.6} {:>11.6}  {:<8} {}",
            marker.location_id, marker.lat, marker.lon, marker.fill_color, marker.display.value_text
        );
    }
}
