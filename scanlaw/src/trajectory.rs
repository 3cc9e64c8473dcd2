//! Integrated trajectory storage and the persisted sample format
//!
//! The integrator produces a [`Trajectory`] (structure-of-arrays phase
//! history); the full per-sample record, including solar longitude and both
//! sky directions, is a [`TimeSeriesSample`]. Samples persist as plain
//! comma-delimited text, one row per grid sample, eight numeric fields, no
//! header:
//!
//! ```text
//! t,solar_longitude,nu,omega,theta_precession,phi_precession,theta_scan,phi_scan
//! ```
//!
//! Fields are written with Rust's shortest round-trip `f64` formatting, so a
//! read-back reproduces every value exactly. Malformed rows on read are a
//! fatal error carrying the line number and raw content; rows are never
//! silently skipped.

use crate::scan::DirectionSet;
use crate::scanning_law::PhaseState;
use crate::{Result, ScanLawError};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Number of fields in a persisted row.
pub const SAMPLE_FIELDS: usize = 8;

/// Phase history on the integration grid. Structure-of-arrays so the
/// direction calculation can consume slices directly.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    /// Grid times in days from the start epoch.
    pub times: Vec<f64>,
    /// Precession phase ν per grid point, radians.
    pub nu: Vec<f64>,
    /// Spin phase ω per grid point, radians.
    pub omega: Vec<f64>,
}

impl Trajectory {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            times: Vec::with_capacity(n),
            nu: Vec::with_capacity(n),
            omega: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, t: f64, state: PhaseState) {
        self.times.push(t);
        self.nu.push(state.nu);
        self.omega.push(state.omega);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// One persisted row of the scan time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesSample {
    /// Days from the start epoch.
    pub t: f64,
    /// Apparent solar longitude at `t`, radians.
    pub solar_longitude: f64,
    /// Precession phase, radians.
    pub nu: f64,
    /// Spin phase, radians.
    pub omega: f64,
    pub theta_precession: f64,
    pub phi_precession: f64,
    pub theta_scan: f64,
    pub phi_scan: f64,
}

/// Assemble samples from a trajectory slice, solar longitudes and computed
/// directions over the same index range.
pub fn assemble_samples(
    times: &[f64],
    solar_longitudes: &[f64],
    nu: &[f64],
    omega: &[f64],
    directions: &DirectionSet,
) -> Vec<TimeSeriesSample> {
    assert_eq!(times.len(), solar_longitudes.len());
    assert_eq!(times.len(), directions.len());
    (0..times.len())
        .map(|i| TimeSeriesSample {
            t: times[i],
            solar_longitude: solar_longitudes[i],
            nu: nu[i],
            omega: omega[i],
            theta_precession: directions.theta_precession[i],
            phi_precession: directions.phi_precession[i],
            theta_scan: directions.theta_scan[i],
            phi_scan: directions.phi_scan[i],
        })
        .collect()
}

/// Streaming writer for the persisted format.
///
/// Batches may be appended incrementally so partial results survive a
/// failure late in a long run.
pub struct SampleWriter<W: Write> {
    out: W,
}

impl SampleWriter<BufWriter<File>> {
    /// Create a writer over a new file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> SampleWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_sample(&mut self, s: &TimeSeriesSample) -> Result<()> {
        writeln!(
            self.out,
            "{},{},{},{},{},{},{},{}",
            s.t,
            s.solar_longitude,
            s.nu,
            s.omega,
            s.theta_precession,
            s.phi_precession,
            s.theta_scan,
            s.phi_scan
        )?;
        Ok(())
    }

    pub fn write_batch(&mut self, samples: &[TimeSeriesSample]) -> Result<()> {
        for s in samples {
            self.write_sample(s)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Write all samples to `path` in one go.
pub fn write_samples(path: &Path, samples: &[TimeSeriesSample]) -> Result<()> {
    let mut writer = SampleWriter::create(path)?;
    writer.write_batch(samples)?;
    writer.flush()
}

/// Read a persisted time series back.
///
/// Fails fast on the first malformed row with its 1-based line number and
/// raw content.
pub fn read_samples(path: &Path) -> Result<Vec<TimeSeriesSample>> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        samples.push(parse_row(&line, idx + 1)?);
    }
    Ok(samples)
}

fn parse_row(line: &str, lineno: usize) -> Result<TimeSeriesSample> {
    let malformed = || ScanLawError::MalformedRow {
        line: lineno,
        content: line.to_string(),
    };

    let mut fields = [0.0_f64; SAMPLE_FIELDS];
    let mut count = 0;
    for token in line.split(',') {
        if count == SAMPLE_FIELDS {
            return Err(malformed());
        }
        fields[count] = token.trim().parse().map_err(|_| malformed())?;
        count += 1;
    }
    if count != SAMPLE_FIELDS {
        return Err(malformed());
    }

    Ok(TimeSeriesSample {
        t: fields[0],
        solar_longitude: fields[1],
        nu: fields[2],
        omega: fields[3],
        theta_precession: fields[4],
        phi_precession: fields[5],
        theta_scan: fields[6],
        phi_scan: fields[7],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tempfile::TempDir;

    fn random_sample(rng: &mut StdRng) -> TimeSeriesSample {
        TimeSeriesSample {
            t: rng.gen::<f64>() * 1826.25,
            solar_longitude: rng.gen::<f64>() * std::f64::consts::TAU,
            nu: rng.gen::<f64>() * 20.0,
            omega: rng.gen::<f64>() * 50_000.0,
            theta_precession: (rng.gen::<f64>() - 0.5) * std::f64::consts::TAU,
            phi_precession: rng.gen::<f64>() * std::f64::consts::PI,
            theta_scan: (rng.gen::<f64>() - 0.5) * std::f64::consts::TAU,
            phi_scan: rng.gen::<f64>() * std::f64::consts::PI,
        }
    }

    #[test]
    fn thousand_samples_round_trip_exactly() {
        let mut rng = StdRng::seed_from_u64(42);
        let samples: Vec<TimeSeriesSample> = (0..1000).map(|_| random_sample(&mut rng)).collect();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trajectory.csv");
        write_samples(&path, &samples).unwrap();

        let back = read_samples(&path).unwrap();
        assert_eq!(back.len(), samples.len());
        for (a, b) in samples.iter().zip(&back) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn incremental_batches_concatenate() {
        let mut rng = StdRng::seed_from_u64(5);
        let samples: Vec<TimeSeriesSample> = (0..30).map(|_| random_sample(&mut rng)).collect();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batched.csv");
        let mut writer = SampleWriter::create(&path).unwrap();
        for chunk in samples.chunks(7) {
            writer.write_batch(chunk).unwrap();
        }
        writer.flush().unwrap();

        assert_eq!(read_samples(&path).unwrap(), samples);
    }

    #[test]
    fn wrong_field_count_is_fatal_with_line_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "0,1,2,3,4,5,6,7\n0,1,2,3\n").unwrap();

        match read_samples(&path) {
            Err(ScanLawError::MalformedRow { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "0,1,2,3");
            }
            other => panic!("expected malformed row, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_token_is_fatal_with_line_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "0,1,2,spin,4,5,6,7\n").unwrap();

        match read_samples(&path) {
            Err(ScanLawError::MalformedRow { line, content }) => {
                assert_eq!(line, 1);
                assert!(content.contains("spin"));
            }
            other => panic!("expected malformed row, got {other:?}"),
        }
    }

    #[test]
    fn trajectory_push_keeps_lanes_aligned() {
        let mut traj = Trajectory::with_capacity(2);
        traj.push(0.0, PhaseState { nu: 0.1, omega: 0.2 });
        traj.push(1.0, PhaseState { nu: 0.3, omega: 0.4 });
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.times, vec![0.0, 1.0]);
        assert_eq!(traj.nu, vec![0.1, 0.3]);
        assert_eq!(traj.omega, vec![0.2, 0.4]);
    }
}
