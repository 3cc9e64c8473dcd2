//! Equation-of-center solar ephemeris
//!
//! Independent low-precision series for the Sun's geometric longitude
//! (mean longitude plus equation of center, Meeus-style coefficients),
//! accurate to roughly 0.01°. It deliberately shares no constants with
//! the closed-form provider so the two can cross-validate each other.

use crate::{SolarEphemeris, SolarState};
use std::f64::consts::TAU;

const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Equation-of-center solar ephemeris.
#[derive(Debug, Clone, Copy, Default)]
pub struct EquationOfCenterSun;

impl EquationOfCenterSun {
    pub fn new() -> Self {
        Self
    }
}

impl SolarEphemeris for EquationOfCenterSun {
    fn state_at(&self, t: f64) -> SolarState {
        let cy = t / DAYS_PER_CENTURY;

        // Mean longitude and mean anomaly in degrees.
        let l0 = 280.46646 + 36_000.76983 * cy + 0.000_303_2 * cy * cy;
        let m_deg = 357.52911 + 35_999.05029 * cy - 0.000_153_7 * cy * cy;
        let m = m_deg.to_radians();

        // Equation of center in degrees.
        let c = 1.914_602 * m.sin() + 0.019_993 * (2.0 * m).sin() + 0.000_289 * (3.0 * m).sin();

        let longitude = (l0 + c).to_radians().rem_euclid(TAU);

        // Analytic derivative, degrees per day.
        let dm = (35_999.05029 - 2.0 * 0.000_153_7 * cy) / DAYS_PER_CENTURY;
        let dl0 = (36_000.76983 + 2.0 * 0.000_303_2 * cy) / DAYS_PER_CENTURY;
        let dc = (1.914_602 * m.cos()
            + 2.0 * 0.019_993 * (2.0 * m).cos()
            + 3.0 * 0.000_289 * (3.0 * m).cos())
            * dm.to_radians();
        let longitude_rate = dl0.to_radians() + dc;

        // Distance from the conic equation with a slowly varying eccentricity.
        let e = 0.016_708_634 - 0.000_042_037 * cy;
        let true_anomaly = m + c.to_radians();
        let distance = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * true_anomaly.cos());

        SolarState {
            distance,
            longitude,
            longitude_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn longitude_at_epoch() {
        let sun = EquationOfCenterSun::new();
        let state = sun.state_at(0.0);
        assert_relative_eq!(state.longitude, 280.382_f64.to_radians(), epsilon = 1e-4);
    }

    #[test]
    fn rate_matches_central_difference() {
        let sun = EquationOfCenterSun::new();
        let h = 1e-3;
        for &t in &[0.0, 91.3, 400.0, 1826.0] {
            let lo = sun.state_at(t - h).longitude;
            let hi = sun.state_at(t + h).longitude;
            let delta = (hi - lo).rem_euclid(TAU);
            let delta = if delta > std::f64::consts::PI {
                delta - TAU
            } else {
                delta
            };
            assert_relative_eq!(sun.state_at(t).longitude_rate, delta / (2.0 * h), epsilon = 1e-8);
        }
    }

    #[test]
    fn distance_spans_perihelion_to_aphelion() {
        let sun = EquationOfCenterSun::new();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for i in 0..=365 {
            let d = sun.state_at(i as f64).distance;
            min = min.min(d);
            max = max.max(d);
        }
        assert!(min > 0.982 && min < 0.984, "perihelion {min}");
        assert!(max > 1.016 && max < 1.018, "aphelion {max}");
    }
}
