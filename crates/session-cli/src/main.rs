//! Imaging Session Planner CLI
//!
//! Ranks a catalog by current visibility above the local horizon and, for a
//! selected target, prints the full session report.
//!
//! Usage:
//!   astro-plan --config data/session.toml \
//!              --catalog data/catalog.json \
//!              --horizon data/horizon.csv \
//!              --target M31 --output report.json --export targets.csv

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use session_cli::{loader, render, DEFAULT_CATALOG};
use session_planner::{GeoPosition, SessionPlanner};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "astro-plan",
    about = "Plan an astrophotography session: what is up, when it sets, how to frame it"
)]
struct Args {
    /// Session file (observer, horizon, instrument, battery)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog JSON file
    #[arg(short = 'k', long, default_value = DEFAULT_CATALOG)]
    catalog: PathBuf,

    /// Horizon table to import (azimuth, altitude per row)
    #[arg(long)]
    horizon: Option<PathBuf>,

    /// Target to plan in detail
    #[arg(short, long)]
    target: Option<String>,

    /// Planning instant, RFC 3339 (defaults to now)
    #[arg(long)]
    at: Option<DateTime<Utc>>,

    /// Observer latitude in degrees, overrides the session file
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Observer longitude in degrees east, overrides the session file
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// UTC offset in minutes for displayed times
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// Write the JSON report (survey, plus drill-down with --target)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the mount hand-off CSV
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
        return Ok(());
    }
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut config = loader::load_session(args.config.as_deref())?;
    if args.lat.is_some() || args.lon.is_some() {
        let base = config.observer();
        let observer = GeoPosition::with_elevation(
            args.lat.unwrap_or(base.latitude),
            args.lon.unwrap_or(base.longitude),
            base.elevation_m,
        )?;
        config.observer = Some(observer);
    }
    if let Some(offset) = args.utc_offset {
        config.utc_offset_minutes = offset;
    }
    if let Some(path) = &args.horizon {
        loader::apply_horizon(&mut config, path);
    }

    let targets = loader::load_catalog(&args.catalog)?;
    let now = args.at.unwrap_or_else(Utc::now);
    let observer = config.observer();
    info!(
        "Planning at {} for {:.4}, {:.4}",
        now.to_rfc3339(),
        observer.latitude,
        observer.longitude
    );

    let planner = SessionPlanner::new(config);
    println!("Horizon: {}", render::horizon_profile(&planner.config().horizon.compass()));
    println!();

    let survey = planner.survey(&targets, now);
    print!("{}", render::survey_table(&survey));

    let report = match &args.target {
        Some(name) => {
            let target = loader::find_target(&targets, name)?;
            let report = planner.drill_down(target, now)?;
            println!();
            println!("{}", report);
            if let Some(power) = &report.power {
                for (item, rejected) in &power.rejected {
                    warn!("Power item '{}' ignored: {}", item, rejected);
                }
            }
            Some(report)
        }
        None => None,
    };

    if let Some(path) = &args.output {
        let document = serde_json::json!({
            "generated_at": now,
            "observer": observer,
            "survey": survey,
            "report": report,
        });
        loader::write_json(path, &document)?;
    }

    if let Some(path) = &args.export {
        let selected: Vec<_> = match &args.target {
            Some(name) => vec![loader::find_target(&targets, name)?.clone()],
            None => targets.clone(),
        };
        loader::write_handoff(path, &planner.handoff_rows(&selected, now))?;
    }

    Ok(())
}
