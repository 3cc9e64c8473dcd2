//! Scan-direction computation
//!
//! Composes the instantaneous attitude from four elementary rotations per
//! time sample and converts the pointing of the reference axis (1, 0, 0)
//! into spherical coordinates, for both the precession axis and the scan
//! direction:
//!
//! ```text
//! R1 = rot(z, solar_longitude)
//! R2 = rot(x, π/2 − ν)
//! R3 = rot(y, π/2 − ξ)
//! R4 = rot(z, ω)
//! Qp = R1·R2·R3      (precession-axis attitude)
//! Q  = Qp·R4         (scan attitude)
//! ```
//!
//! The batched path chunks the sample arrays across rayon workers and runs
//! the structure-of-arrays quaternion pipeline per chunk; element for
//! element it performs the same arithmetic as [`ScanDirectionCalculator::direction_at`].

use crate::algo::quaternion::{Quaternion, QuaternionBatch};
use crate::projection::SphericalDirection;
use crate::scanning_law::ScanLawConstants;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::f64::consts::FRAC_PI_2;

/// Samples per rayon work item in the batched path.
const CHUNK: usize = 8192;

/// Precession-axis and scan directions for a single sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanDirection {
    pub precession: SphericalDirection,
    pub scan: SphericalDirection,
}

/// Structure-of-arrays directions for a batch of samples.
#[derive(Debug, Clone, Default)]
pub struct DirectionSet {
    pub theta_precession: Vec<f64>,
    pub phi_precession: Vec<f64>,
    pub theta_scan: Vec<f64>,
    pub phi_scan: Vec<f64>,
}

impl DirectionSet {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            theta_precession: Vec::with_capacity(n),
            phi_precession: Vec::with_capacity(n),
            theta_scan: Vec::with_capacity(n),
            phi_scan: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.theta_precession.len()
    }

    pub fn is_empty(&self) -> bool {
        self.theta_precession.is_empty()
    }

    fn push(&mut self, d: ScanDirection) {
        self.theta_precession.push(d.precession.theta);
        self.phi_precession.push(d.precession.phi);
        self.theta_scan.push(d.scan.theta);
        self.phi_scan.push(d.scan.phi);
    }

    fn extend(&mut self, other: DirectionSet) {
        self.theta_precession.extend(other.theta_precession);
        self.phi_precession.extend(other.phi_precession);
        self.theta_scan.extend(other.theta_scan);
        self.phi_scan.extend(other.phi_scan);
    }
}

/// Computes sky directions from (solar longitude, ν, ω) triples.
pub struct ScanDirectionCalculator {
    solar_aspect: f64,
}

impl ScanDirectionCalculator {
    pub fn new(constants: &ScanLawConstants) -> Self {
        Self {
            solar_aspect: constants.solar_aspect,
        }
    }

    /// Directions for a single sample.
    pub fn direction_at(&self, solar_longitude: f64, nu: f64, omega: f64) -> ScanDirection {
        let z = Vector3::new(0.0, 0.0, 1.0);
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);

        let r1 = Quaternion::from_axis_angle(&z, solar_longitude);
        let r2 = Quaternion::from_axis_angle(&x, FRAC_PI_2 - nu);
        let r3 = Quaternion::from_axis_angle(&y, FRAC_PI_2 - self.solar_aspect);
        let r4 = Quaternion::from_axis_angle(&z, omega);

        let qp = r1 * r2 * r3;
        let q = qp * r4;

        let reference = Vector3::new(1.0, 0.0, 0.0);
        let precession = SphericalDirection::from_cartesian(&qp.rotate_vector(&reference))
            .expect("rotation of a unit vector is nonzero");
        let scan = SphericalDirection::from_cartesian(&q.rotate_vector(&reference))
            .expect("rotation of a unit vector is nonzero");

        ScanDirection { precession, scan }
    }

    /// Directions for a batch of samples, parallelized across chunks.
    ///
    /// All three slices must have the same length. Results are numerically
    /// identical to calling [`Self::direction_at`] per element.
    pub fn directions(
        &self,
        solar_longitudes: &[f64],
        nus: &[f64],
        omegas: &[f64],
    ) -> DirectionSet {
        assert_eq!(solar_longitudes.len(), nus.len(), "slice length mismatch");
        assert_eq!(solar_longitudes.len(), omegas.len(), "slice length mismatch");

        let n = solar_longitudes.len();
        let starts: Vec<usize> = (0..n).step_by(CHUNK).collect();
        let parts: Vec<DirectionSet> = starts
            .par_iter()
            .map(|&s| {
                let e = (s + CHUNK).min(n);
                self.directions_chunk(&solar_longitudes[s..e], &nus[s..e], &omegas[s..e])
            })
            .collect();

        let mut out = DirectionSet::with_capacity(n);
        for part in parts {
            out.extend(part);
        }
        out
    }

    /// One chunk of the batched path via the structure-of-arrays pipeline.
    fn directions_chunk(&self, solar_longitudes: &[f64], nus: &[f64], omegas: &[f64]) -> DirectionSet {
        let n = solar_longitudes.len();
        let z = Vector3::new(0.0, 0.0, 1.0);
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);

        let colat_angles: Vec<f64> = nus.iter().map(|&nu| FRAC_PI_2 - nu).collect();
        let r1 = QuaternionBatch::from_axis_angle(&z, solar_longitudes);
        let r2 = QuaternionBatch::from_axis_angle(&x, &colat_angles);
        let r3 = QuaternionBatch::repeat(
            Quaternion::from_axis_angle(&y, FRAC_PI_2 - self.solar_aspect),
            n,
        );
        let r4 = QuaternionBatch::from_axis_angle(&z, omegas);

        let qp = r1.hamilton(&r2).hamilton(&r3);
        let q = qp.hamilton(&r4);

        let reference = Vector3::new(1.0, 0.0, 0.0);
        let precession_vecs = qp.rotate_vector(&reference);
        let scan_vecs = q.rotate_vector(&reference);

        let mut out = DirectionSet::with_capacity(n);
        for i in 0..n {
            let precession = SphericalDirection::from_cartesian(&precession_vecs[i])
                .expect("rotation of a unit vector is nonzero");
            let scan = SphericalDirection::from_cartesian(&scan_vecs[i])
                .expect("rotation of a unit vector is nonzero");
            out.push(ScanDirection { precession, scan });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::{PI, TAU};

    #[test]
    fn precession_axis_tracks_the_sun_at_zero_phases() {
        // With ν = ω = 0 the precession axis lies in the ecliptic plane at
        // the solar longitude, offset by the aspect-angle geometry.
        let calc = ScanDirectionCalculator::new(&ScanLawConstants::default());
        let d = calc.direction_at(0.0, 0.0, 0.0);
        assert_relative_eq!(d.precession.r, 1.0, epsilon = 1e-12);
        assert_relative_eq!(d.scan.r, 1.0, epsilon = 1e-12);

        // Rotating the solar longitude by π/2 rotates the whole composition
        // around z by π/2.
        let quarter = calc.direction_at(FRAC_PI_2, 0.0, 0.0);
        assert_relative_eq!(
            (quarter.precession.theta - d.precession.theta).rem_euclid(TAU),
            FRAC_PI_2,
            epsilon = 1e-9
        );
        assert_relative_eq!(quarter.precession.phi, d.precession.phi, epsilon = 1e-12);
    }

    #[test]
    fn directions_are_unit_vectors_in_range() {
        let calc = ScanDirectionCalculator::new(&ScanLawConstants::default());
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let d = calc.direction_at(
                rng.gen::<f64>() * TAU,
                rng.gen::<f64>() * 20.0,
                rng.gen::<f64>() * 1000.0,
            );
            for s in [d.precession, d.scan] {
                assert_relative_eq!(s.r, 1.0, epsilon = 1e-9);
                assert!(s.theta > -PI && s.theta <= PI);
                assert!((0.0..=PI).contains(&s.phi));
            }
        }
    }

    #[test]
    fn batched_matches_scalar_across_chunk_boundaries() {
        let calc = ScanDirectionCalculator::new(&ScanLawConstants::default());
        let mut rng = StdRng::seed_from_u64(23);

        // More than one chunk so the rayon path and the concatenation order
        // are both exercised.
        for n in [1, 7, CHUNK, CHUNK + 13, 3 * CHUNK + 1] {
            let lons: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() * TAU).collect();
            let nus: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() * 20.0).collect();
            let omegas: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() * 50_000.0).collect();

            let batch = calc.directions(&lons, &nus, &omegas);
            assert_eq!(batch.len(), n);

            for i in (0..n).step_by((n / 17).max(1)) {
                let scalar = calc.direction_at(lons[i], nus[i], omegas[i]);
                assert_relative_eq!(batch.theta_precession[i], scalar.precession.theta, epsilon = 1e-13);
                assert_relative_eq!(batch.phi_precession[i], scalar.precession.phi, epsilon = 1e-13);
                assert_relative_eq!(batch.theta_scan[i], scalar.scan.theta, epsilon = 1e-13);
                assert_relative_eq!(batch.phi_scan[i], scalar.scan.phi, epsilon = 1e-13);
            }
        }
    }

    #[test]
    fn scan_direction_sweeps_with_spin_phase() {
        let calc = ScanDirectionCalculator::new(&ScanLawConstants::default());
        let a = calc.direction_at(1.0, 0.5, 0.0);
        let b = calc.direction_at(1.0, 0.5, PI / 3.0);
        // The precession axis ignores ω; the scan direction does not.
        assert_eq!(a.precession, b.precession);
        assert!((a.scan.theta - b.scan.theta).abs() > 1e-3 || (a.scan.phi - b.scan.phi).abs() > 1e-3);
    }
}
