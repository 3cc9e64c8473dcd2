//! Closed-form solar ephemeris
//!
//! Second-order-in-eccentricity Keplerian approximation of the Sun's
//! apparent ecliptic longitude, its rate, and the solar distance
//! (Lindegren, SAG-LL-35). The constants are fixed at their J2000 values,
//! so the approximation is only meant for a multi-year horizon around the
//! epoch, not for arbitrary astronomical timescales.

use crate::{SolarEphemeris, SolarState};
use std::f64::consts::TAU;

/// Orbital eccentricity of the Earth.
const ECCENTRICITY: f64 = 0.016709;
/// Mean longitude at J2000 in degrees.
const MEAN_LONGITUDE_EPOCH_DEG: f64 = 280.458;
/// Mean longitude rate in degrees per day.
const MEAN_LONGITUDE_RATE_DEG: f64 = 0.985_609_11;
/// Mean anomaly at J2000 in degrees.
const MEAN_ANOMALY_EPOCH_DEG: f64 = 357.528;
/// Mean anomaly rate in degrees per day.
const MEAN_ANOMALY_RATE_DEG: f64 = 0.985_600_28;

/// Closed-form solar ephemeris, accurate to a few arcseconds over a
/// multi-year horizon around J2000.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosedFormSun;

impl ClosedFormSun {
    pub fn new() -> Self {
        Self
    }
}

impl SolarEphemeris for ClosedFormSun {
    fn state_at(&self, t: f64) -> SolarState {
        let e = ECCENTRICITY;
        let a = MEAN_LONGITUDE_EPOCH_DEG.to_radians() + MEAN_LONGITUDE_RATE_DEG.to_radians() * t;
        let g = MEAN_ANOMALY_EPOCH_DEG.to_radians() + MEAN_ANOMALY_RATE_DEG.to_radians() * t;

        let longitude = (a + 2.0 * e * g.sin() + 1.25 * e * e * (2.0 * g).sin()).rem_euclid(TAU);
        let longitude_rate = MEAN_LONGITUDE_RATE_DEG.to_radians()
            + (2.0 * e * g.cos() + 2.5 * e * e * (2.0 * g).cos()) * MEAN_ANOMALY_RATE_DEG.to_radians();
        let distance = 1.0 - e * (g + e * g.sin() + 0.5 * e * e * (2.0 * g).sin()).cos();

        SolarState {
            distance,
            longitude,
            longitude_rate,
        }
    }
}
