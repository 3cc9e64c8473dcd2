//! Sky-coverage density visualization.
//!
//! This crate bins projected sky directions into a fixed-resolution 2D
//! histogram and renders it, either as a PNG heat map for reports or as an
//! ASCII preview for terminal workflows and log files. It sits downstream
//! of the scanning-law simulation: the simulator projects its scan
//! directions into plane coordinates and feeds them here for aggregation.
//!
//! # Design
//!
//! The histogram is projection-agnostic: it only sees plane coordinates and
//! the extents of the chosen projection ellipse. Points outside the extents
//! are counted and skipped rather than clamped, so projection artifacts
//! never silently pile up on the map border.

use thiserror::Error;

/// Error types for visualization operations.
#[derive(Debug, Error)]
pub enum VizError {
    /// Invalid histogram configuration (zero-sized grid, empty extents).
    #[error("Histogram error: {0}")]
    HistogramError(String),

    /// Rendering backend failure.
    #[error("Render error: {0}")]
    RenderError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Standard Result type for all visualization operations.
pub type Result<T> = std::result::Result<T, VizError>;

pub mod sky_map;

pub use sky_map::{Scale, SkyHistogram, SkyMapConfig};
