//! shakesummary - Post-alert summaries for earthquake early-warning events.
//!
//! Reconciles the initial, peak-magnitude and final alert revisions of an
//! event against the authoritative origin and reports contour selections,
//! nearby cities, station coverage and shake-front timing.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

mod circles;
mod cities;
mod cli;
mod config;
mod contour;
mod errors;
mod geodesy;
mod intensity;
mod models;
mod output;
mod report;
mod selection;
mod stations;
mod timeline;

use cities::{ArrivalModel, CityCatalog, DEFAULT_CATEGORIES};
use cli::{Cli, Command};
use config::Settings;
use geodesy::{Coordinate, km_to_miles};
use models::EventRecord;
use report::SummaryReport;
use stations::StationCatalog;
use timeline::{elapsed_seconds, s_wave_radius};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Summarize(args) => cmd_summarize(args),
        Command::Cities(args) => cmd_cities(&args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `summarize` command - build and write one event summary.
fn cmd_summarize(args: cli::SummarizeArgs) -> Result<()> {
    let settings = Settings::load(args.config.as_deref()).context("failed to load configuration")?;

    let json = match (args.input.input_file, args.input.input_str) {
        (Some(path), _) => {
            fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?
        }
        (None, Some(json)) => json,
        (None, None) => anyhow::bail!("no event record given (use --input-file or --input-str)"),
    };

    let event = EventRecord::from_json(&json).context("invalid event record")?;
    info!(event_id = %event.event_id, "event record parsed");

    let cities = CityCatalog::load(&settings.general.city_file).context("failed to load city catalog")?;
    let stations = StationCatalog::load(&settings.general.station_file).context("failed to load station catalog")?;
    if cities.is_empty() {
        warn!(path = %settings.general.city_file.display(), "city catalog is empty");
    }
    if stations.is_empty() {
        warn!(path = %settings.general.station_file.display(), "station catalog is empty");
    }

    let report = SummaryReport::build(&event, &cities, &stations, &settings);

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    output::write_report(&mut writer, &report, args.format, args.pretty).context("failed to write summary")?;
    writer.flush()?;

    if let Some(path) = &args.output {
        info!("summary written to {}", path.display());
    }

    Ok(())
}

/// Execute the `cities` command - rank nearby cities for a point.
fn cmd_cities(args: &cli::CitiesArgs) -> Result<()> {
    let settings = Settings::load(args.config.as_deref()).context("failed to load configuration")?;
    let catalog = CityCatalog::load(&settings.general.city_file).context("failed to load city catalog")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_city_ranking(&mut handle, args, &catalog, settings.thresholds.s_wave_velocity)
}

/// Rank `catalog` around the requested point and print one line per city.
fn write_city_ranking<W: Write>(writer: &mut W, args: &cli::CitiesArgs, catalog: &CityCatalog, velocity: f64) -> Result<()> {
    let elapsed_s = match (&args.alert_time, &args.origin_time) {
        (Some(alert), Some(origin)) => elapsed_seconds(alert, origin).context("invalid alert or origin time")?,
        _ => args.elapsed,
    };

    let arrival = ArrivalModel {
        depth_km: args.depth,
        elapsed_s,
        s_wave_velocity: velocity,
    };
    let ranking = catalog.rank(Coordinate::new(args.lat, args.lon), &DEFAULT_CATEGORIES, &arrival);

    if let (Some(alert), Some(origin)) = (&args.alert_time, &args.origin_time) {
        let radius = s_wave_radius(alert, origin, velocity)?;
        writeln!(writer, "S-wave radius at alert: {radius:.1} km ({elapsed_s:.2} s after origin)")?;
    }
    if ranking.promoted {
        writeln!(writer, "(first slot promoted to category {})", DEFAULT_CATEGORIES[1])?;
    }
    for city in &ranking.cities {
        writeln!(
            writer,
            "{:<24} {:>2} {:>9} {:>6.1} km ({:>5.1} mi) {:>3} {:>4.0}° {:>6.1} sec",
            city.name,
            city.category,
            city.population,
            city.distance_km,
            km_to_miles(city.distance_km),
            city.octant,
            city.bearing_deg,
            city.time_to_alert_s
        )?;
    }
    for category in &ranking.unfilled {
        writeln!(writer, "(no city of category {category})")?;
    }

    Ok(())
}
