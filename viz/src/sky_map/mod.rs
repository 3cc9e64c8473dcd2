//! Fixed-resolution 2D density histogram over a sky projection.
//!
//! Projected points are accumulated into a `width × height` count grid and
//! rendered either as a PNG heat map or as a downsampled ASCII preview.
//! Counts can be mapped linearly or logarithmically; survey coverage spans
//! several orders of magnitude between the ecliptic caps and the equatorial
//! band, so the log scale is usually the readable one.

use crate::{Result, VizError};
use ndarray::Array2;
use plotters::backend::DrawingBackend;
use plotters_backend::BackendColor;
use plotters::prelude::BitMapBackend;
use std::path::Path;

/// Count-to-intensity mapping for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    #[default]
    Linear,
    /// log(1 + count), for data with a large dynamic range.
    Log,
}

/// Histogram geometry and display options.
#[derive(Debug, Clone)]
pub struct SkyMapConfig {
    /// Grid width in bins (and PNG width in pixels).
    pub width: usize,
    /// Grid height in bins (and PNG height in pixels).
    pub height: usize,
    /// Horizontal extent of the projected plane, (min, max).
    pub x_range: (f64, f64),
    /// Vertical extent of the projected plane, (min, max).
    pub y_range: (f64, f64),
    pub scale: Scale,
}

impl Default for SkyMapConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            x_range: (-std::f64::consts::PI, std::f64::consts::PI),
            y_range: (-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2),
            scale: Scale::Linear,
        }
    }
}

impl SkyMapConfig {
    /// Extents of the Aitoff ellipse: semi-axes (π, π/2).
    pub fn for_aitoff(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Extents of the Mollweide ellipse at unit radius: semi-axes (2√2, √2).
    pub fn for_mollweide(width: usize, height: usize) -> Self {
        let sqrt2 = 2.0_f64.sqrt();
        Self {
            width,
            height,
            x_range: (-2.0 * sqrt2, 2.0 * sqrt2),
            y_range: (-sqrt2, sqrt2),
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }
}

/// 2D count grid over a projected sky plane.
#[derive(Debug, Clone)]
pub struct SkyHistogram {
    config: SkyMapConfig,
    /// Counts indexed [row, column] with row 0 at the top of the map.
    counts: Array2<u32>,
    total: u64,
    skipped: u64,
}

impl SkyHistogram {
    pub fn new(config: SkyMapConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(VizError::HistogramError(format!(
                "grid must be non-empty, got {}x{}",
                config.width, config.height
            )));
        }
        if config.x_range.1 <= config.x_range.0 || config.y_range.1 <= config.y_range.0 {
            return Err(VizError::HistogramError("empty plane extents".to_string()));
        }
        let counts = Array2::zeros((config.height, config.width));
        Ok(Self {
            config,
            counts,
            total: 0,
            skipped: 0,
        })
    }

    /// Accumulate one projected point. Points outside the extents are
    /// counted as skipped, not clamped onto the border.
    pub fn add(&mut self, x: f64, y: f64) {
        let (x0, x1) = self.config.x_range;
        let (y0, y1) = self.config.y_range;
        if !x.is_finite() || !y.is_finite() || x < x0 || x > x1 || y < y0 || y > y1 {
            self.skipped += 1;
            return;
        }
        let col = (((x - x0) / (x1 - x0)) * self.config.width as f64) as usize;
        let col = col.min(self.config.width - 1);
        // Row 0 renders at the top, which is the maximum y.
        let row = (((y1 - y) / (y1 - y0)) * self.config.height as f64) as usize;
        let row = row.min(self.config.height - 1);
        self.counts[[row, col]] += 1;
        self.total += 1;
    }

    pub fn add_all<I: IntoIterator<Item = (f64, f64)>>(&mut self, points: I) {
        for (x, y) in points {
            self.add(x, y);
        }
    }

    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }

    /// Points accumulated inside the extents.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Points rejected for falling outside the extents.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    fn intensity(&self, count: u32, max: u32) -> f64 {
        match self.config.scale {
            Scale::Linear => count as f64 / max as f64,
            Scale::Log => (1.0 + count as f64).ln() / (1.0 + max as f64).ln(),
        }
    }

    /// Render the histogram as a PNG heat map, one pixel per bin.
    pub fn render_png(&self, path: &Path) -> Result<()> {
        if self.total == 0 {
            return Err(VizError::HistogramError(
                "cannot render an empty histogram".to_string(),
            ));
        }
        let max = self.max_count();
        let mut backend = BitMapBackend::new(
            path,
            (self.config.width as u32, self.config.height as u32),
        );
        for row in 0..self.config.height {
            for col in 0..self.config.width {
                let v = self.intensity(self.counts[[row, col]], max);
                let (r, g, b) = heat_color(v);
                backend
                    .draw_pixel(
                        (col as i32, row as i32),
                        BackendColor {
                            alpha: 1.0,
                            rgb: (r, g, b),
                        },
                    )
                    .map_err(|e| VizError::RenderError(e.to_string()))?;
            }
        }
        backend
            .present()
            .map_err(|e| VizError::RenderError(e.to_string()))?;
        Ok(())
    }

    /// Downsampled ASCII preview, suitable for terminals and log files.
    ///
    /// `density_chars` maps low to high intensity, e.g. `" .:-=+*#%@"`.
    pub fn to_ascii(&self, width: usize, height: usize, density_chars: &str) -> String {
        let chars: Vec<char> = density_chars.chars().collect();
        if chars.is_empty() || width == 0 || height == 0 {
            return String::new();
        }

        // Aggregate the full-resolution grid into the preview cells.
        let mut cells = vec![0u64; width * height];
        for row in 0..self.config.height {
            let prow = row * height / self.config.height;
            for col in 0..self.config.width {
                let pcol = col * width / self.config.width;
                cells[prow * width + pcol] += u64::from(self.counts[[row, col]]);
            }
        }

        let max = cells.iter().copied().max().unwrap_or(0);
        let mut out = String::with_capacity(height * (width + 1));
        for row in 0..height {
            for col in 0..width {
                let c = cells[row * width + col];
                let idx = if max == 0 {
                    0
                } else {
                    let v = match self.config.scale {
                        Scale::Linear => c as f64 / max as f64,
                        Scale::Log => (1.0 + c as f64).ln() / (1.0 + max as f64).ln(),
                    };
                    ((v * (chars.len() - 1) as f64).round() as usize).min(chars.len() - 1)
                };
                out.push(chars[idx]);
            }
            out.push('\n');
        }
        out
    }
}

/// Dark-to-bright heat gradient for density rendering.
fn heat_color(v: f64) -> (u8, u8, u8) {
    const ANCHORS: [(f64, (u8, u8, u8)); 7] = [
        (0.0, (0, 0, 4)),
        (0.2, (40, 11, 84)),
        (0.4, (101, 21, 110)),
        (0.6, (159, 42, 99)),
        (0.8, (212, 72, 66)),
        (0.9, (245, 125, 21)),
        (1.0, (252, 255, 164)),
    ];

    let v = v.clamp(0.0, 1.0);
    for pair in ANCHORS.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if v <= p1 {
            let f = if p1 > p0 { (v - p0) / (p1 - p0) } else { 0.0 };
            let lerp = |a: u8, b: u8| (a as f64 + f * (b as f64 - a as f64)).round() as u8;
            return (lerp(c0.0, c1.0), lerp(c0.1, c1.1), lerp(c0.2, c1.2));
        }
    }
    ANCHORS[ANCHORS.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_config() -> SkyMapConfig {
        SkyMapConfig {
            width: 10,
            height: 5,
            x_range: (-1.0, 1.0),
            y_range: (-0.5, 0.5),
            scale: Scale::Linear,
        }
    }

    #[test]
    fn rejects_degenerate_configuration() {
        let mut config = small_config();
        config.width = 0;
        assert!(SkyHistogram::new(config).is_err());

        let mut config = small_config();
        config.x_range = (1.0, 1.0);
        assert!(SkyHistogram::new(config).is_err());
    }

    #[test]
    fn bins_points_deterministically() {
        let mut hist = SkyHistogram::new(small_config()).unwrap();
        hist.add(0.0, 0.0);
        hist.add(0.0, 0.0);
        hist.add(-1.0, -0.5); // bottom-left corner
        assert_eq!(hist.total(), 3);
        assert_eq!(hist.skipped(), 0);
        assert_eq!(hist.max_count(), 2);

        // Center of the extents lands in the middle of the grid.
        assert_eq!(hist.counts()[[2, 5]], 2);
        // Minimum x, minimum y is the leftmost column of the bottom row.
        assert_eq!(hist.counts()[[4, 0]], 1);
    }

    #[test]
    fn out_of_range_points_are_skipped_not_clamped() {
        let mut hist = SkyHistogram::new(small_config()).unwrap();
        hist.add(2.0, 0.0);
        hist.add(0.0, 0.9);
        hist.add(f64::NAN, 0.0);
        assert_eq!(hist.total(), 0);
        assert_eq!(hist.skipped(), 3);
        assert_eq!(hist.max_count(), 0);
    }

    #[test]
    fn right_edge_is_included() {
        let mut hist = SkyHistogram::new(small_config()).unwrap();
        hist.add(1.0, 0.5);
        assert_eq!(hist.total(), 1);
        assert_eq!(hist.counts()[[0, 9]], 1);
    }

    #[test]
    fn ascii_preview_has_requested_shape() {
        let mut hist = SkyHistogram::new(small_config()).unwrap();
        hist.add(0.0, 0.0);
        let ascii = hist.to_ascii(8, 4, " .*#");
        let lines: Vec<&str> = ascii.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.chars().count() == 8));
        assert!(ascii.contains('#'));
    }

    #[test]
    fn renders_png_file() {
        let mut hist = SkyHistogram::new(small_config()).unwrap();
        for i in 0..50 {
            hist.add((i as f64 / 50.0) * 2.0 - 1.0, 0.0);
        }
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.png");
        hist.render_png(&path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn empty_histogram_refuses_to_render() {
        let hist = SkyHistogram::new(small_config()).unwrap();
        let dir = TempDir::new().unwrap();
        assert!(hist.render_png(&dir.path().join("empty.png")).is_err());
    }

    #[test]
    fn log_scale_compresses_dynamic_range() {
        let mut config = small_config();
        config.scale = Scale::Log;
        let hist = SkyHistogram::new(config).unwrap();
        assert!(hist.intensity(10, 1000) > 10.0 / 1000.0);
        assert_eq!(hist.intensity(1000, 1000), 1.0);
    }

    #[test]
    fn heat_gradient_is_monotone_dark_to_bright() {
        let (r0, g0, b0) = heat_color(0.0);
        let (r1, g1, b1) = heat_color(1.0);
        assert!(u32::from(r0) + u32::from(g0) + u32::from(b0) < 20);
        assert!(u32::from(r1) + u32::from(g1) + u32::from(b1) > 500);
    }
}
