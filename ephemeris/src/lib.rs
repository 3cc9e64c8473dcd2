//! Solar ephemeris providers for scanning-law simulation
//!
//! This crate provides the apparent motion of the Sun as seen from the
//! spacecraft: solar distance, apparent ecliptic longitude, and the time
//! derivative of the longitude, all as a function of days since J2000.
//!
//! Two interchangeable providers implement the [`SolarEphemeris`] contract:
//! a closed-form Keplerian approximation ([`ClosedFormSun`]) and an
//! independent equation-of-center series ([`EquationOfCenterSun`]) useful for
//! cross-validating the closed form. The provider is selected explicitly via
//! [`ProviderKind`].

pub mod closed_form;
pub mod equation_of_center;
pub mod time_utils;

pub use closed_form::ClosedFormSun;
pub use equation_of_center::EquationOfCenterSun;
pub use time_utils::{days_since_j2000, parse_datetime, J2000_EPOCH};

/// Solar state at a single instant.
///
/// Angles are radians, distances astronomical units, rates radians per day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarState {
    /// Distance from the observer to the Sun in AU.
    pub distance: f64,
    /// Apparent ecliptic longitude of the Sun, wrapped into [0, 2π).
    pub longitude: f64,
    /// Time derivative of the apparent longitude in rad/day.
    pub longitude_rate: f64,
}

/// A source of solar distance, apparent longitude, and longitude rate.
///
/// Time is measured in days since the J2000 epoch (2000-01-01 12:00). The
/// contract is pure arithmetic with no error path; batched evaluation must
/// produce exactly the same values as repeated scalar evaluation.
pub trait SolarEphemeris: Send + Sync {
    /// Evaluate the solar state at `t` days since J2000.
    fn state_at(&self, t: f64) -> SolarState;

    /// Evaluate the solar state at each time in `ts`.
    fn states(&self, ts: &[f64]) -> Vec<SolarState> {
        ts.iter().map(|&t| self.state_at(t)).collect()
    }
}

/// Explicit selection between the available ephemeris implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Second-order-in-eccentricity closed-form Keplerian approximation.
    ClosedForm,
    /// Independent equation-of-center series, for cross-validation.
    EquationOfCenter,
}

impl ProviderKind {
    /// Construct the selected provider.
    pub fn create(&self) -> Box<dyn SolarEphemeris> {
        match self {
            ProviderKind::ClosedForm => Box::new(ClosedFormSun::new()),
            ProviderKind::EquationOfCenter => Box::new(EquationOfCenterSun::new()),
        }
    }
}
