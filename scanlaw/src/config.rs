//! Simulation configuration
//!
//! Run parameters are plain injected values with sensible defaults: the
//! calendar start epoch, the output grid, the physical constants, and the
//! ephemeris provider selection. Nothing here is read from ambient globals,
//! so tests can substitute any of it.

use crate::scanning_law::{ScanLawConstants, TimeGrid};
use ephemeris::ProviderKind;
use time::macros::datetime;
use time::PrimitiveDateTime;

/// Full configuration of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Calendar start of the integration (t = 0).
    pub start: PrimitiveDateTime,
    /// Output grid: step and horizon in days.
    pub grid: TimeGrid,
    /// Physical constants of the scanning law.
    pub constants: ScanLawConstants,
    /// Which ephemeris implementation drives the run.
    pub provider: ProviderKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: datetime!(2000-01-01 0:00),
            grid: TimeGrid::default(),
            constants: ScanLawConstants::default(),
            provider: ProviderKind::ClosedForm,
        }
    }
}

impl SimulationConfig {
    /// Days between J2000 and the configured start epoch.
    pub fn epoch_offset(&self) -> f64 {
        ephemeris::days_since_j2000(self.start)
    }
}
