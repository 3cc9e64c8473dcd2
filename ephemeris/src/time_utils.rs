//! Calendar time handling for ephemeris evaluation
//!
//! All ephemeris arithmetic runs on a single time scale: fractional days
//! since the J2000 epoch (2000-01-01 12:00). Calendar datetimes only appear
//! at the configuration boundary and are converted here.

use time::format_description::well_known::Iso8601;
use time::macros::datetime;
use time::{Date, PrimitiveDateTime};

/// The J2000 reference epoch, 2000 January 1 at 12:00.
pub const J2000_EPOCH: PrimitiveDateTime = datetime!(2000-01-01 12:00);

/// Fractional days elapsed between the J2000 epoch and `t`.
///
/// Negative for datetimes before the epoch.
pub fn days_since_j2000(t: PrimitiveDateTime) -> f64 {
    (t - J2000_EPOCH).as_seconds_f64() / 86_400.0
}

/// Parse an ISO-8601 datetime ("2000-01-01T00:00:00") or bare date
/// ("2000-01-01", taken as midnight).
///
/// Returns the error as a `String` so it can be used directly as a clap
/// `value_parser`.
pub fn parse_datetime(s: &str) -> Result<PrimitiveDateTime, String> {
    if let Ok(dt) = PrimitiveDateTime::parse(s, &Iso8601::DEFAULT) {
        return Ok(dt);
    }
    Date::parse(s, &Iso8601::DEFAULT)
        .map(Date::midnight)
        .map_err(|_| format!("invalid datetime {s:?}; expected e.g. 2000-01-01T00:00:00"))
}
