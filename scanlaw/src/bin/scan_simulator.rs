//! Nominal scanning law simulator
//!
//! Integrates the precession/spin phases of a Sun-driven scanning law over a
//! multi-year horizon, computes the per-sample sky directions, persists the
//! time series, and renders a sky-coverage density map.
//!
//! Usage:
//! ```
//! cargo run --release --bin scan_simulator -- [OPTIONS]
//! ```
//!
//! See --help for detailed options.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ephemeris::{parse_datetime, ProviderKind};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use scanlaw::projection::{aitoff, mollweide};
use scanlaw::trajectory::{assemble_samples, SampleWriter};
use scanlaw::{
    ScanDirectionCalculator, ScanLawConstants, ScanningLaw, SimulationConfig, TimeGrid,
};
use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;
use std::time::Instant;
use time::PrimitiveDateTime;
use viz::{Scale, SkyHistogram, SkyMapConfig};

/// Samples per processing batch in the direction/persistence stage.
const BATCH: usize = 65_536;

/// Sky projection used for the density map.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Projection {
    Aitoff,
    Mollweide,
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Projection::Aitoff => write!(f, "aitoff"),
            Projection::Mollweide => write!(f, "mollweide"),
        }
    }
}

/// Ephemeris implementation driving the run.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Ephemeris {
    /// Closed-form Keplerian approximation.
    ClosedForm,
    /// Independent equation-of-center series, for cross-validation.
    EquationOfCenter,
}

impl std::fmt::Display for Ephemeris {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ephemeris::ClosedForm => write!(f, "closed-form"),
            Ephemeris::EquationOfCenter => write!(f, "equation-of-center"),
        }
    }
}

impl From<Ephemeris> for ProviderKind {
    fn from(e: Ephemeris) -> Self {
        match e {
            Ephemeris::ClosedForm => ProviderKind::ClosedForm,
            Ephemeris::EquationOfCenter => ProviderKind::EquationOfCenter,
        }
    }
}

/// Command line arguments for the scanning-law simulation
#[derive(Parser, Debug)]
#[command(
    name = "Scan Simulator",
    about = "Simulates a spinning, precessing survey instrument's scanning law",
    long_about = None
)]
struct Args {
    /// Simulation start epoch (ISO-8601 datetime or bare date)
    #[arg(long, default_value = "2000-01-01T00:00:00", value_parser = parse_datetime)]
    start: PrimitiveDateTime,

    /// Output grid step in days
    #[arg(long, default_value_t = 1e-4)]
    dt: f64,

    /// Integration horizon in days
    #[arg(long, default_value_t = 5.0 * 365.25)]
    tmax: f64,

    /// Precession speed constant K
    #[arg(long, default_value_t = 4.223)]
    precession_speed: f64,

    /// Solar aspect angle in degrees
    #[arg(long, default_value_t = 45.0)]
    solar_aspect_deg: f64,

    /// Inertial spin rate in arcseconds per second
    #[arg(long, default_value_t = 60.0)]
    spin_rate_arcsec: f64,

    /// Ephemeris implementation
    #[arg(long, value_enum, default_value_t = Ephemeris::ClosedForm)]
    ephemeris: Ephemeris,

    /// Sky projection for the density map
    #[arg(long, value_enum, default_value_t = Projection::Aitoff)]
    projection: Projection,

    /// Output CSV file for the scan time series
    #[arg(long, default_value = "scan_directions.csv")]
    output_csv: PathBuf,

    /// Output PNG file for the sky-coverage density map
    #[arg(long, default_value = "sky_coverage.png")]
    output_map: PathBuf,

    /// Density map width in bins
    #[arg(long, default_value_t = 1200)]
    map_width: usize,

    /// Density map height in bins
    #[arg(long, default_value_t = 600)]
    map_height: usize,

    /// Use logarithmic density scaling
    #[arg(long)]
    log_scale: bool,

    /// Print an ASCII preview of the density map
    #[arg(long)]
    preview: bool,
}

fn main() -> Result<()> {
    // Initialize logging from environment variables
    env_logger::init();

    let args = Args::parse();

    let config = SimulationConfig {
        start: args.start,
        grid: TimeGrid::new(args.dt, args.tmax),
        constants: ScanLawConstants::with_spin_rate_arcsec(
            args.precession_speed,
            args.solar_aspect_deg.to_radians(),
            args.spin_rate_arcsec,
        ),
        provider: ProviderKind::from(args.ephemeris),
    };
    let grid = config.grid;
    let constants = config.constants;
    let sun = config.provider.create();
    let epoch_offset = config.epoch_offset();

    println!("Scan Simulator");
    println!("==============");
    println!("  Start epoch: {} ({epoch_offset:+.3} days from J2000)", args.start);
    println!("  Grid: dt = {} days, horizon = {} days ({} samples)", grid.dt, grid.tmax, grid.len());
    println!(
        "  Constants: K = {}, xi = {}°, S = {} arcsec/s",
        args.precession_speed, args.solar_aspect_deg, args.spin_rate_arcsec
    );
    println!("  Ephemeris: {:?}", args.ephemeris);
    println!();

    // Phase integration: inherently sequential, reported per grid point.
    let law = ScanningLaw::new(constants, sun.as_ref(), epoch_offset);
    let bar = ProgressBar::new(grid.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("integrating {bar:40} {pos}/{len} [{elapsed_precise}]")?
            .progress_chars("=> "),
    );
    let started = Instant::now();
    let trajectory = law.integrate_with(&grid, None, |i| {
        if i % 16_384 == 0 {
            bar.set_position(i as u64);
        }
    })?;
    bar.finish_and_clear();
    info!(
        "integrated {} samples in {:.1} s",
        trajectory.len(),
        started.elapsed().as_secs_f64()
    );

    // Direction computation and persistence, batched so partial results
    // survive a late failure and memory stays bounded.
    let calculator = ScanDirectionCalculator::new(&constants);
    let map_config = match args.projection {
        Projection::Aitoff => SkyMapConfig::for_aitoff(args.map_width, args.map_height),
        Projection::Mollweide => SkyMapConfig::for_mollweide(args.map_width, args.map_height),
    };
    let scale = if args.log_scale { Scale::Log } else { Scale::Linear };
    let mut histogram = SkyHistogram::new(map_config.with_scale(scale))?;

    let mut writer = SampleWriter::create(&args.output_csv)
        .with_context(|| format!("creating {}", args.output_csv.display()))?;

    let bar = ProgressBar::new(trajectory.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("directions  {bar:40} {pos}/{len} [{elapsed_precise}]")?
            .progress_chars("=> "),
    );
    let started = Instant::now();
    let n = trajectory.len();
    let mut start = 0;
    while start < n {
        let end = (start + BATCH).min(n);
        let times = &trajectory.times[start..end];
        let nus = &trajectory.nu[start..end];
        let omegas = &trajectory.omega[start..end];

        let epoch_times: Vec<f64> = times.iter().map(|t| t + epoch_offset).collect();
        let longitudes: Vec<f64> = sun
            .states(&epoch_times)
            .iter()
            .map(|s| s.longitude)
            .collect();

        let directions = calculator.directions(&longitudes, nus, omegas);
        let samples = assemble_samples(times, &longitudes, nus, omegas, &directions);
        writer.write_batch(&samples)?;

        for i in 0..directions.len() {
            // Map latitude convention: colatitude − π/2.
            let latitude = directions.phi_scan[i] - FRAC_PI_2;
            let (x, y) = match args.projection {
                Projection::Aitoff => aitoff(directions.theta_scan[i], latitude, 0.0),
                Projection::Mollweide => mollweide(directions.theta_scan[i], latitude, 0.0, 1.0),
            };
            histogram.add(x, y);
        }

        bar.set_position(end as u64);
        start = end;
    }
    writer.flush()?;
    bar.finish_and_clear();
    info!(
        "computed and persisted {} samples in {:.1} s",
        n,
        started.elapsed().as_secs_f64()
    );

    histogram
        .render_png(&args.output_map)
        .with_context(|| format!("rendering {}", args.output_map.display()))?;

    if args.preview {
        println!("{}", histogram.to_ascii(100, 30, " .:-=+*#%@"));
    }

    println!("Wrote {} samples to {}", n, args.output_csv.display());
    println!(
        "Sky map: {} ({} binned, {} outside extents)",
        args.output_map.display(),
        histogram.total(),
        histogram.skipped()
    );

    Ok(())
}
