//! Precession/spin phase integration
//!
//! The scanning law advances two phases: the precession phase ν of the spin
//! axis around the solar-aspect cone and the spin phase ω of the instrument
//! about its own axis. Their coupled ODE is driven by the apparent solar
//! longitude and its rate, re-evaluated from the ephemeris at every
//! derivative call.
//!
//! The integrator reports state on a caller-chosen uniform grid while
//! stepping adaptively inside each grid cell (classical RK4 with step
//! doubling and Richardson extrapolation for error control). The grid is
//! the output resolution, not the internal step.

use crate::trajectory::Trajectory;
use crate::{Result, ScanLawError};
use ephemeris::SolarEphemeris;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// Physical constants of the scanning law, injected rather than ambient so
/// tests can substitute alternates.
#[derive(Debug, Clone, Copy)]
pub struct ScanLawConstants {
    /// Precession speed constant K (dimensionless).
    pub precession_speed: f64,
    /// Solar aspect angle ξ between spin axis and Sun direction, radians.
    pub solar_aspect: f64,
    /// Inertial spin rate S in radians per day.
    pub spin_rate: f64,
}

impl Default for ScanLawConstants {
    fn default() -> Self {
        Self {
            precession_speed: 4.223,
            solar_aspect: 45.0_f64.to_radians(),
            // 60 arcsec/s expressed in rad/day (four revolutions per day).
            spin_rate: (60.0 / 3600.0_f64).to_radians() * 86_400.0,
        }
    }
}

impl ScanLawConstants {
    /// Constants with the spin rate given in arcseconds per second.
    pub fn with_spin_rate_arcsec(precession_speed: f64, solar_aspect: f64, arcsec_per_sec: f64) -> Self {
        Self {
            precession_speed,
            solar_aspect,
            spin_rate: (arcsec_per_sec / 3600.0).to_radians() * 86_400.0,
        }
    }
}

/// The ODE state vector: precession phase ν and spin phase ω, radians.
///
/// Also used for the phase rates dν/dt and dω/dt, in radians per day.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseState {
    pub nu: f64,
    pub omega: f64,
}

/// Uniform output grid: `len()` samples at t = 0, dt, 2·dt, …, tmax.
#[derive(Debug, Clone, Copy)]
pub struct TimeGrid {
    /// Grid step in days.
    pub dt: f64,
    /// Horizon in days.
    pub tmax: f64,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self {
            dt: 1e-4,
            tmax: 5.0 * 365.25,
        }
    }
}

impl TimeGrid {
    pub fn new(dt: f64, tmax: f64) -> Self {
        assert!(dt > 0.0 && tmax >= 0.0, "grid step and horizon must be positive");
        Self { dt, tmax }
    }

    /// Number of grid points, including the initial sample at t = 0.
    pub fn len(&self) -> usize {
        (self.tmax / self.dt).round() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Time of the i-th grid point in days.
    pub fn time_at(&self, i: usize) -> f64 {
        i as f64 * self.dt
    }
}

/// The nominal scanning law: the phase ODE plus its integrator.
pub struct ScanningLaw<'a> {
    constants: ScanLawConstants,
    sun: &'a dyn SolarEphemeris,
    /// Offset from integration time zero to the ephemeris time scale,
    /// in days since J2000.
    epoch_offset: f64,
    atol: f64,
    rtol: f64,
}

impl<'a> ScanningLaw<'a> {
    pub fn new(constants: ScanLawConstants, sun: &'a dyn SolarEphemeris, epoch_offset: f64) -> Self {
        Self {
            constants,
            sun,
            epoch_offset,
            atol: 1e-12,
            rtol: 1e-10,
        }
    }

    /// Override the adaptive-stepping error tolerances.
    pub fn with_tolerances(mut self, atol: f64, rtol: f64) -> Self {
        self.atol = atol;
        self.rtol = rtol;
        self
    }

    pub fn constants(&self) -> &ScanLawConstants {
        &self.constants
    }

    /// Phase rates at integration time `t` (days from the start epoch).
    ///
    /// The solar longitude and its rate are re-evaluated from the ephemeris
    /// at every call, including internal integrator stages. Fails with
    /// [`ScanLawError::Domain`] if K² − cos²ν goes negative; the square root
    /// is undefined there and must never silently become NaN.
    pub fn derivative(&self, t: f64, state: &PhaseState) -> Result<PhaseState> {
        let c = &self.constants;
        let sun = self.sun.state_at(self.epoch_offset + t);

        let arg = c.precession_speed * c.precession_speed - state.nu.cos().powi(2);
        if arg < 0.0 {
            return Err(ScanLawError::Domain {
                t,
                nu: state.nu,
                value: arg,
            });
        }

        let d_nu = sun.longitude_rate * (arg.sqrt() + c.solar_aspect.cos() * state.nu.sin())
            / c.solar_aspect.sin();
        let d_omega = c.spin_rate
            - c.solar_aspect.cos() * d_nu
            - c.solar_aspect.sin() * state.nu.sin() * sun.longitude;

        Ok(PhaseState {
            nu: d_nu,
            omega: d_omega,
        })
    }

    /// Integrate from (ν, ω) = (0, 0) over the grid.
    pub fn integrate(&self, grid: &TimeGrid) -> Result<Trajectory> {
        self.integrate_with(grid, None, |_| {})
    }

    /// Integrate with cooperative cancellation and a per-grid-step observer.
    ///
    /// `cancel` is checked between grid steps; the observer receives the
    /// index of each completed grid point and is meant for progress
    /// reporting, keeping any UI concern out of this crate.
    pub fn integrate_with(
        &self,
        grid: &TimeGrid,
        cancel: Option<&AtomicBool>,
        mut on_step: impl FnMut(usize),
    ) -> Result<Trajectory> {
        let n = grid.len();
        let mut trajectory = Trajectory::with_capacity(n);
        let mut state = PhaseState::default();
        trajectory.push(0.0, state);

        debug!(
            "integrating scanning law: {n} grid points, dt = {} days, horizon = {} days",
            grid.dt, grid.tmax
        );

        for i in 1..n {
            let t_start = grid.time_at(i - 1);
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(ScanLawError::Cancelled { t: t_start });
                }
            }
            state = self.advance_cell(t_start, grid.time_at(i), state)?;
            trajectory.push(grid.time_at(i), state);
            on_step(i);
        }

        Ok(trajectory)
    }

    /// Advance one grid cell [t_start, t_end] with adaptive sub-stepping.
    fn advance_cell(&self, t_start: f64, t_end: f64, state: PhaseState) -> Result<PhaseState> {
        let cell = t_end - t_start;
        // Floor on the sub-step: below this the error estimate is noise and
        // the step is accepted as-is.
        let h_min = cell * 1e-6;

        let mut t = t_start;
        let mut y = state;
        let mut h = cell;

        while t < t_end {
            let remaining = t_end - t;
            // Sub-ulp residue from accumulated rounding; nothing left to do.
            if remaining <= f64::EPSILON * t_end.abs().max(1.0) {
                break;
            }
            h = h.min(remaining);

            // Step doubling: one full step vs. two half steps.
            let full = self.rk4_step(t, &y, h)?;
            let half = self.rk4_step(t, &y, h / 2.0)?;
            let two_halves = self.rk4_step(t + h / 2.0, &half, h / 2.0)?;

            // Richardson extrapolation: fifth-order estimate and per-component
            // error from the fourth-order pair.
            let err_nu = (two_halves.nu - full.nu) / 15.0;
            let err_omega = (two_halves.omega - full.omega) / 15.0;
            let refined = PhaseState {
                nu: two_halves.nu + err_nu,
                omega: two_halves.omega + err_omega,
            };

            let scale_nu = self.atol + self.rtol * y.nu.abs().max(refined.nu.abs());
            let scale_omega = self.atol + self.rtol * y.omega.abs().max(refined.omega.abs());
            let err = (err_nu.abs() / scale_nu).max(err_omega.abs() / scale_omega);

            if err <= 1.0 || h <= h_min {
                t += h;
                y = refined;
                h = if err < 1e-10 {
                    h * 2.0
                } else {
                    h * (0.9 * err.powf(-0.2)).min(2.0)
                };
            } else {
                h = (h * (0.9 * err.powf(-0.25)).max(0.1)).max(h_min);
            }
        }

        Ok(y)
    }

    /// Classical RK4 step of size `h` from `t`.
    fn rk4_step(&self, t: f64, y: &PhaseState, h: f64) -> Result<PhaseState> {
        let k1 = self.derivative(t, y)?;
        let k2 = self.derivative(
            t + h / 2.0,
            &PhaseState {
                nu: y.nu + 0.5 * h * k1.nu,
                omega: y.omega + 0.5 * h * k1.omega,
            },
        )?;
        let k3 = self.derivative(
            t + h / 2.0,
            &PhaseState {
                nu: y.nu + 0.5 * h * k2.nu,
                omega: y.omega + 0.5 * h * k2.omega,
            },
        )?;
        let k4 = self.derivative(
            t + h,
            &PhaseState {
                nu: y.nu + h * k3.nu,
                omega: y.omega + h * k3.omega,
            },
        )?;

        Ok(PhaseState {
            nu: y.nu + h / 6.0 * (k1.nu + 2.0 * k2.nu + 2.0 * k3.nu + k4.nu),
            omega: y.omega + h / 6.0 * (k1.omega + 2.0 * k2.omega + 2.0 * k3.omega + k4.omega),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ephemeris::ClosedFormSun;

    #[test]
    fn first_derivative_pins_the_constants() {
        // Direct substitution at t = 0 with ν = ω = 0, using hard-coded
        // numbers rather than the constants struct.
        let sun = ClosedFormSun::new();
        let law = ScanningLaw::new(ScanLawConstants::default(), &sun, 0.0);
        let d = law.derivative(0.0, &PhaseState::default()).unwrap();

        let state = ephemeris::SolarEphemeris::state_at(&sun, 0.0);
        let xi = 45.0_f64.to_radians();
        let expected_nu = state.longitude_rate * (4.223_f64 * 4.223 - 1.0).sqrt() / xi.sin();
        let spin = (60.0 / 3600.0_f64).to_radians() * 86_400.0;
        let expected_omega = spin - xi.cos() * expected_nu;

        assert_relative_eq!(d.nu, expected_nu, epsilon = 1e-12);
        assert_relative_eq!(d.omega, expected_omega, epsilon = 1e-12);
    }

    #[test]
    fn grid_is_uniform_and_complete() {
        let grid = TimeGrid::new(0.5, 10.0);
        assert_eq!(grid.len(), 21);
        assert_relative_eq!(grid.time_at(20), 10.0, epsilon = 1e-12);

        let sun = ClosedFormSun::new();
        let law = ScanningLaw::new(ScanLawConstants::default(), &sun, 0.0);
        let traj = law.integrate(&grid).unwrap();
        assert_eq!(traj.len(), 21);
        for i in 1..traj.len() {
            assert!(traj.times[i] > traj.times[i - 1]);
        }
        assert_eq!(traj.nu[0], 0.0);
        assert_eq!(traj.omega[0], 0.0);
    }

    #[test]
    fn phases_advance_over_a_day() {
        let sun = ClosedFormSun::new();
        let law = ScanningLaw::new(ScanLawConstants::default(), &sun, 0.0);
        let traj = law.integrate(&TimeGrid::new(0.01, 1.0)).unwrap();

        let last = traj.len() - 1;
        // dν/dt ≈ L̇·√(K²−1)/sin ξ ≈ 0.1 rad/day at the start.
        assert!(traj.nu[last] > 0.05 && traj.nu[last] < 0.2, "nu = {}", traj.nu[last]);
        // The spin phase is dominated by S ≈ 8π rad/day.
        assert_relative_eq!(traj.omega[last], 8.0 * std::f64::consts::PI, epsilon = 0.5);
    }

    #[test]
    fn adaptive_stepping_matches_brute_force_fine_grid() {
        let sun = ClosedFormSun::new();
        let law = ScanningLaw::new(ScanLawConstants::default(), &sun, 0.0);

        let coarse = law.integrate(&TimeGrid::new(0.05, 2.0)).unwrap();
        let fine = law.integrate(&TimeGrid::new(0.001, 2.0)).unwrap();

        let c = coarse.len() - 1;
        let f = fine.len() - 1;
        assert_relative_eq!(coarse.nu[c], fine.nu[f], epsilon = 1e-8);
        assert_relative_eq!(coarse.omega[c], fine.omega[f], epsilon = 1e-6);
    }

    #[test]
    fn domain_guard_rejects_small_precession_speed() {
        // K < 1 makes K² − cos²ν negative at ν = 0.
        let sun = ClosedFormSun::new();
        let constants = ScanLawConstants {
            precession_speed: 0.5,
            ..Default::default()
        };
        let law = ScanningLaw::new(constants, &sun, 0.0);
        match law.integrate(&TimeGrid::new(0.01, 1.0)) {
            Err(ScanLawError::Domain { value, .. }) => assert!(value < 0.0),
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_stops_integration() {
        let sun = ClosedFormSun::new();
        let law = ScanningLaw::new(ScanLawConstants::default(), &sun, 0.0);
        let cancel = AtomicBool::new(true);
        match law.integrate_with(&TimeGrid::new(0.01, 1.0), Some(&cancel), |_| {}) {
            Err(ScanLawError::Cancelled { .. }) => {}
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[test]
    fn observer_sees_every_grid_step() {
        let sun = ClosedFormSun::new();
        let law = ScanningLaw::new(ScanLawConstants::default(), &sun, 0.0);
        let mut seen = Vec::new();
        let grid = TimeGrid::new(0.1, 1.0);
        law.integrate_with(&grid, None, |i| seen.push(i)).unwrap();
        assert_eq!(seen, (1..grid.len()).collect::<Vec<_>>());
    }
}
