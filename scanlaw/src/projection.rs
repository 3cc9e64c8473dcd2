//! Spherical conversion and whole-sky projections
//!
//! Cartesian-to-spherical conversion plus the Aitoff and Mollweide
//! projections used for coverage-density plots. Both projections take
//! (longitude, latitude) in radians and map into plane coordinates; the
//! Aitoff map fills an ellipse with semi-axes (π, π/2), the Mollweide map
//! one with semi-axes (2√2·radius, √2·radius).

use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, PI};

/// Newton-iteration tolerance for the Mollweide auxiliary angle.
pub const MOLLWEIDE_TOLERANCE: f64 = 1e-12;
/// Iteration cap for the Mollweide solve; convergence takes well under 10
/// iterations for |latitude| < π/2.
pub const MOLLWEIDE_MAX_ITER: usize = 16;

// Below this the Aitoff scale factor is treated as the antipodal singularity.
const AITOFF_SINGULAR_EPS: f64 = 1e-12;

/// A direction in spherical coordinates.
///
/// `theta` is the azimuth from atan2 in (−π, π], `phi` the colatitude from
/// arccos in [0, π]. For the unit vectors produced by the scan law `r` is
/// always 1; it is kept for completeness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalDirection {
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}

impl SphericalDirection {
    /// Convert a Cartesian vector to spherical coordinates.
    ///
    /// Returns `None` for the zero vector, where the direction is undefined.
    pub fn from_cartesian(v: &Vector3<f64>) -> Option<Self> {
        let r = v.norm();
        if r == 0.0 {
            return None;
        }
        Some(Self {
            r,
            theta: v.y.atan2(v.x),
            phi: (v.z / r).clamp(-1.0, 1.0).acos(),
        })
    }
}

/// sin(πx)/(πx), with the removable singularity at x = 0 filled in.
fn normalized_sinc(x: f64) -> f64 {
    let px = PI * x;
    if px.abs() < 1e-9 {
        1.0 - px * px / 6.0
    } else {
        px.sin() / px
    }
}

/// Aitoff projection of (longitude, latitude) in radians.
///
/// At the antipode of the central meridian (the only zero of the scale
/// factor) the limit depends on the approach direction; this returns the
/// along-equator rim value (±2π, 0) as a finite convention instead of
/// propagating NaN into downstream binning.
pub fn aitoff(longitude: f64, latitude: f64, central_meridian: f64) -> (f64, f64) {
    let l = (longitude - central_meridian) / 2.0;
    let alpha = (latitude.cos() * l.cos()).clamp(-1.0, 1.0).acos();
    let a = normalized_sinc(alpha / PI);
    if a.abs() < AITOFF_SINGULAR_EPS {
        return (2.0 * PI * l.signum(), 0.0);
    }
    let x = 2.0 * latitude.cos() * l.sin() / a;
    let y = latitude.sin() / a;
    (x, y)
}

/// Elementwise [`aitoff`] over parallel longitude/latitude slices.
pub fn aitoff_all(longitudes: &[f64], latitudes: &[f64], central_meridian: f64) -> Vec<(f64, f64)> {
    assert_eq!(longitudes.len(), latitudes.len(), "slice length mismatch");
    longitudes
        .iter()
        .zip(latitudes)
        .map(|(&lon, &lat)| aitoff(lon, lat, central_meridian))
        .collect()
}

/// Solve 2θ + sin 2θ = π·sin(latitude) for the Mollweide auxiliary angle.
///
/// Bounded Newton iteration seeded at the latitude itself; exact poles are
/// special-cased because the derivative 2 + 2cos 2θ vanishes there.
fn mollweide_theta(latitude: f64) -> f64 {
    if (latitude.abs() - FRAC_PI_2).abs() < 1e-12 {
        return FRAC_PI_2.copysign(latitude);
    }
    let target = PI * latitude.sin();
    let mut theta = latitude;
    for _ in 0..MOLLWEIDE_MAX_ITER {
        let two = 2.0 * theta;
        let df = 2.0 + 2.0 * two.cos();
        if df.abs() < 1e-15 {
            break;
        }
        let step = (two + two.sin() - target) / df;
        theta -= step;
        if step.abs() < MOLLWEIDE_TOLERANCE {
            break;
        }
    }
    theta
}

/// Mollweide projection of (longitude, latitude) in radians.
pub fn mollweide(longitude: f64, latitude: f64, central_meridian: f64, radius: f64) -> (f64, f64) {
    let theta = mollweide_theta(latitude);
    let x = radius * (2.0 * 2.0_f64.sqrt() / PI) * (longitude - central_meridian) * theta.cos();
    let y = radius * 2.0_f64.sqrt() * theta.sin();
    (x, y)
}

/// Elementwise [`mollweide`] over parallel longitude/latitude slices.
pub fn mollweide_all(
    longitudes: &[f64],
    latitudes: &[f64],
    central_meridian: f64,
    radius: f64,
) -> Vec<(f64, f64)> {
    assert_eq!(longitudes.len(), latitudes.len(), "slice length mismatch");
    longitudes
        .iter()
        .zip(latitudes)
        .map(|(&lon, &lat)| mollweide(lon, lat, central_meridian, radius))
        .collect()
}
