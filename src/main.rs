use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use log::info;

use taxi_dash::data::loader::{load_sampled, parse_timestamp};
use taxi_dash::{Dashboard, PipelineConfig, TimePeriod};

#[derive(Parser)]
#[command(name = "taxi-dash")]
#[command(about = "Cluster taxi pickups and aggregate a filtered view", long_about = None)]
struct Cli {
    /// Trip table (.parquet, .csv or .json)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// JSON file with pipeline settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the sampling cap
    #[arg(long)]
    sample_size: Option<usize>,

    /// Override the sampling / coordinate seed
    #[arg(long)]
    seed: Option<u64>,

    /// Earliest pickup (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS), inclusive
    #[arg(long, value_parser = parse_cli_timestamp)]
    start: Option<NaiveDateTime>,

    /// Latest pickup (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS), inclusive
    #[arg(long, value_parser = parse_cli_timestamp)]
    end: Option<NaiveDateTime>,

    /// Minimum passenger count
    #[arg(long)]
    min_passengers: Option<u32>,

    /// Trip distance bounds in miles, inclusive
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], allow_negative_numbers = true)]
    distance: Option<Vec<f64>>,

    /// Comma-separated time-of-day buckets (morning,afternoon,evening,night)
    #[arg(long, value_delimiter = ',')]
    periods: Option<Vec<TimePeriod>>,

    /// Emit figure descriptions instead of raw projections
    #[arg(long)]
    figures: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn parse_cli_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).ok_or_else(|| format!("cannot parse '{s}' as a date or timestamp"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(n) = cli.sample_size {
        config.sample_size = n;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let trips = load_sampled(&cli.input, config.sample_size, config.seed)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    let dashboard = Dashboard::build(trips, config)?;

    let mut filter = dashboard.default_filter();
    if let Some(start) = cli.start {
        filter.date_start = start;
    }
    if let Some(end) = cli.end {
        filter.date_end = end;
    }
    if let Some(n) = cli.min_passengers {
        filter.min_passengers = n;
    }
    if let Some(bounds) = &cli.distance {
        filter.distance_range = (bounds[0], bounds[1]);
    }
    if let Some(periods) = cli.periods {
        filter.time_periods = periods.into_iter().collect::<BTreeSet<_>>();
    }

    let view = dashboard.update(filter)?;
    info!(
        "{} of {} trips visible",
        view.visible.len(),
        dashboard.dataset().len()
    );

    let json = if cli.figures {
        let figures = dashboard.render(&view);
        to_json(&figures, cli.pretty)?
    } else {
        to_json(&view.aggregates, cli.pretty)?
    };
    println!("{json}");
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    out.context("serializing output")
}
