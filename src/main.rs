use std::process::ExitCode;
use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use log::{error, info};
use crate::built_up::compare_built_up;
use crate::config::{load_config, Config};
use crate::dates::validity_time;
use crate::logging::setup_logger;
use crate::manager_archive::{ForecastArchive, Gateway, SurfaceArchive};
use crate::models::forecast::FetchKey;
use crate::models::report::{BuiltUpReport, ComparisonReport, RunReport};
use crate::pipeline::RunContext;
use crate::region::Region;
use crate::report::{prune_reports, save_report};
use crate::run_overview::{point_values, run_diagnostic, run_series, snap_hour};

mod built_up;
mod config;
mod dates;
mod errors;
mod logging;
mod manager_archive;
mod models;
mod pipeline;
mod region;
mod report;
mod run_overview;
mod sampling;
mod series;
mod statistics;

#[derive(Parser, Debug)]
#[command(name = "leadcmp")]
#[command(about = "Compares forecasts of the same validity time issued at different lead times")]
struct Args {
    /// Path to the configuration file
    #[arg(long, env = "LEADCMP_CONFIG", default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lead time comparison over the configured validity dates (default)
    Compare,
    /// Region mean per forecast hour for one forecast run
    Run {
        /// Creation date of the run, e.g. 2025-05-29
        #[arg(long)]
        date: NaiveDate,
        /// Run time of day (UTC)
        #[arg(long, default_value = "12:00:00")]
        run_time: NaiveTime,
        /// Hour to report, snapped to the nearest published hour of the run
        #[arg(long)]
        hour: Option<f64>,
    },
    /// Built-up surface share of the configured cell for two epochs
    BuiltUp,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(c) => c,
        Err(e) => { eprintln!("{}", e); return ExitCode::FAILURE; }
    };
    if let Err(e) = setup_logger(&config.general) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    info!("leadcmp version: {}", env!("CARGO_PKG_VERSION"));

    let result = match args.command.unwrap_or(Command::Compare) {
        Command::Compare => compare(&config),
        Command::Run { date, run_time, hour } => forecast_run(&config, date, run_time, hour),
        Command::BuiltUp => built_up(&config),
    };

    if let Err(e) = result.and_then(|_| prune(&config)) {
        error!("{:#}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn compare(config: &Config) -> Result<()> {
    let archive = ForecastArchive::new(&config.archive, &config.region);
    let ctx = RunContext {
        source: &archive,
        comparison: &config.comparison,
        max_workers: config.archive.max_workers,
    };

    let run = ctx.run()?;
    for (i, column) in run.sample_series.columns.iter().enumerate() {
        info!("{}: {} gaps in {} samples", column, run.sample_series.gaps(i), run.samples.len());
    }
    info!("{} differences", run.differences.len());

    println!("{}", run.sample_series);
    println!("{}", run.difference_series);
    println!("{}", run.stats);

    let report = ComparisonReport {
        created: Utc::now(),
        minuend: &config.comparison.minuend,
        subtrahend: &config.comparison.subtrahend,
        stats: run.stats,
        counts: run.counts,
        samples: &run.sample_series,
        differences: &run.difference_series,
    };
    save_report(&config.files.report_dir, report.created, "compare", &report)?;

    Ok(())
}

fn forecast_run(config: &Config, date: NaiveDate, run_time: NaiveTime, hour: Option<f64>) -> Result<()> {
    let archive = ForecastArchive::new(&config.archive, &config.region);
    let creation_time = validity_time(date, run_time);

    let run = run_series(&archive, creation_time, archive.band())
        .with_context(|| format!("listing forecast hours for {}", creation_time))?;

    let mut selected = None;
    let mut points = Vec::new();
    let mut diagnostic = None;
    match run.overview {
        Some(o) => {
            info!("run {}: hours {} to {} step {}", creation_time, o.min, o.max, o.step);

            let h = hour.and_then(|x| snap_hour(&run.hours, x)).unwrap_or(o.min);
            match run.value_at(h) {
                Some(v) => println!("hour {}: {:.3}", h, v),
                None => println!("hour {}: n/a", h),
            }
            selected = Some(h);

            let detail = &config.run_detail;
            points = point_values(&archive, &FetchKey { creation_time, forecast_hours: h }, &detail.points, detail.point_scale);
            for p in &points {
                println!("{}", p);
            }

            diagnostic = run_diagnostic(&archive, &FetchKey { creation_time, forecast_hours: o.min }, detail.stats_scale);
            match diagnostic {
                Some(d) => println!("hour {} over region: {}", o.min, d),
                None => println!("hour {} over region: n/a", o.min),
            }
        },
        None => info!("no forecast found for run {}", creation_time),
    }
    println!("{}", run.series);

    let report = RunReport {
        created: Utc::now(),
        creation_time,
        min_hour: run.overview.map(|o| o.min),
        max_hour: run.overview.map(|o| o.max),
        step: run.overview.map(|o| o.step),
        hour: selected,
        value: selected.and_then(|h| run.value_at(h)),
        points: &points,
        diagnostic,
        series: &run.series,
    };
    save_report(&config.files.report_dir, report.created, "run", &report)?;

    Ok(())
}

fn built_up(config: &Config) -> Result<()> {
    let built_up = config.built_up.as_ref()
        .ok_or_else(|| anyhow!("MissingConfigError: [built_up] section is required"))?;

    let gateway = Gateway::new(&config.archive.base_url, config.archive.timeout_secs);
    let archive = SurfaceArchive::new(gateway, built_up);
    let cell = Region::cell(built_up.lon, built_up.lat, built_up.size_km)?;

    let comparison = compare_built_up(&archive, &cell, built_up.from_epoch, built_up.to_epoch);
    let fmt = |p: Option<f64>| p.map_or("n/a".to_string(), |p| format!("{:.2} %", p));
    println!("{} km cell, {}: {}", built_up.size_km, comparison.from_epoch, fmt(comparison.from_percent));
    println!("{} km cell, {}: {}", built_up.size_km, comparison.to_epoch, fmt(comparison.to_percent));

    let report = BuiltUpReport {
        created: Utc::now(),
        lon: built_up.lon,
        lat: built_up.lat,
        size_km: built_up.size_km,
        comparison: &comparison,
    };
    save_report(&config.files.report_dir, report.created, "built_up", &report)?;

    Ok(())
}

fn prune(config: &Config) -> Result<()> {
    prune_reports(&config.files.report_dir, Utc::now(), config.files.keep_hours)?;
    Ok(())
}
