//! Nominal scanning law simulation
//!
//! This crate models the pointing of a spinning, precessing survey
//! instrument driven by the apparent motion of the Sun: the precession and
//! spin phases are advanced by an ODE integrator, composed into attitude
//! quaternions, and emitted as spherical sky directions suitable for
//! coverage-density visualization.

use thiserror::Error;

pub mod algo;
pub mod config;
pub mod projection;
pub mod scan;
pub mod scanning_law;
pub mod trajectory;

// Re-exports for easier access
pub use algo::quaternion::{Quaternion, QuaternionBatch};
pub use config::SimulationConfig;
pub use projection::{aitoff, mollweide, SphericalDirection};
pub use scan::{DirectionSet, ScanDirectionCalculator};
pub use scanning_law::{PhaseState, ScanLawConstants, ScanningLaw, TimeGrid};
pub use trajectory::{SampleWriter, TimeSeriesSample, Trajectory};

/// Error types for scanning-law computation and trajectory I/O.
#[derive(Debug, Error)]
pub enum ScanLawError {
    /// The precession-rate square root argument went negative; the scan law
    /// is undefined there and integration aborts rather than producing NaN.
    #[error("precession rate undefined at t = {t} days (nu = {nu} rad): K² − cos²ν = {value}")]
    Domain { t: f64, nu: f64, value: f64 },

    /// Cooperative cancellation was requested between integration steps.
    #[error("integration cancelled at t = {t} days")]
    Cancelled { t: f64 },

    /// A persisted trajectory row failed to parse.
    #[error("malformed trajectory row at line {line}: {content:?}")]
    MalformedRow { line: usize, content: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanLawError>;
