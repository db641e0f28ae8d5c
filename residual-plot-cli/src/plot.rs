//! Residual chart rendering
//!
//! Draws one line per tracked variable against simulation time on a
//! logarithmic y axis and writes the result as a PNG.

use crate::config::ChartConfig;
use anyhow::{Context, Result};
use plotters::prelude::*;
use residual_log_parser::{ResidualTable, TrackedVariable};
use std::path::Path;

/// Line colors, in `TrackedVariable::ALL` order
const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(31, 119, 180),  // Blue
    RGBColor(255, 127, 14),  // Orange
    RGBColor(44, 160, 44),   // Green
    RGBColor(214, 39, 40),   // Red
    RGBColor(148, 103, 189), // Purple
    RGBColor(140, 86, 75),   // Brown
];

/// y range used when no residual can be drawn on a log axis
const FALLBACK_Y_RANGE: (f64, f64) = (1e-10, 1.0);

/// Grid lines at decades
const MAJOR_GRID: RGBColor = RGBColor(190, 190, 190);
/// Grid lines between decades and at time ticks
const MINOR_GRID: RGBColor = RGBColor(225, 225, 225);
/// Dash and gap length of grid lines, in pixels
const GRID_DASH: (i32, i32) = (6, 4);
/// Approximate number of vertical grid lines
const X_GRID_LINES: usize = 10;

/// Axis ranges for a residual chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChartBounds {
    /// Span all time values and all drawable residuals
    ///
    /// The y range is widened to whole decades.
    pub fn from_table(table: &ResidualTable) -> Self {
        let times = table.time().iter().map(|&t| t as f64);
        let mut x_min = times.clone().fold(f64::INFINITY, f64::min);
        let mut x_max = times.fold(f64::NEG_INFINITY, f64::max);
        if !x_min.is_finite() || !x_max.is_finite() {
            x_min = 0.0;
            x_max = 1.0;
        } else if x_min == x_max {
            x_min -= 1.0;
            x_max += 1.0;
        }

        let residuals = TrackedVariable::ALL
            .iter()
            .flat_map(|v| table.series(*v).iter().copied())
            .filter(|v| is_drawable(*v));
        let (lo, hi) = residuals.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

        let (y_min, y_max) = if lo.is_finite() && hi.is_finite() {
            // Subnormal residuals would round the decade down to 0.0
            let y_min = 10f64.powf(lo.log10().floor()).max(f64::MIN_POSITIVE);
            let mut y_max = 10f64.powf(hi.log10().ceil());
            if y_max <= y_min {
                y_max = y_min * 10.0;
            }
            (y_min, y_max)
        } else {
            FALLBACK_Y_RANGE
        };

        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

fn is_drawable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Pair a variable's residuals with time steps positionally
///
/// Stops at the shorter of the two series. Values a log axis cannot show
/// (zero, negative, NaN, infinite) are dropped.
pub fn series_points(time: &[u64], values: &[f64]) -> Vec<(f64, f64)> {
    time.iter()
        .zip(values.iter())
        .filter(|(_, v)| is_drawable(**v))
        .map(|(t, v)| (*t as f64, *v))
        .collect()
}

/// Decade values (major) and 2..9 multiples of each decade (minor) inside `y_min..=y_max`
pub fn log_grid_values(y_min: f64, y_max: f64) -> (Vec<f64>, Vec<f64>) {
    let mut major = Vec::new();
    let mut minor = Vec::new();
    if !(y_min > 0.0 && y_max > y_min && y_max.is_finite()) {
        return (major, minor);
    }

    let in_range = |v: f64| v >= y_min * (1.0 - 1e-9) && v <= y_max * (1.0 + 1e-9);
    let first = y_min.log10().floor() as i32;
    let last = y_max.log10().ceil() as i32;
    for exp in first..=last {
        let decade = 10f64.powi(exp);
        if in_range(decade) {
            major.push(decade);
        }
        for k in 2..=9 {
            let value = k as f64 * decade;
            if in_range(value) {
                minor.push(value);
            }
        }
    }
    (major, minor)
}

/// Evenly spaced values on 1/2/5 steps covering `min..=max`
pub fn linear_grid_values(min: f64, max: f64, target: usize) -> Vec<f64> {
    let span = max - min;
    if !(span > 0.0 && span.is_finite()) || target == 0 {
        return Vec::new();
    }

    let raw = span / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude);

    let start = (min / step).ceil() * step;
    (0..)
        .map(|i| start + i as f64 * step)
        .take_while(|v| *v <= max + step * 1e-9)
        .collect()
}

/// Split a pixel-space line into dashes of `dash` pixels separated by `gap` pixels
pub fn dash_segments(
    from: (i32, i32),
    to: (i32, i32),
    dash: i32,
    gap: i32,
) -> Vec<[(i32, i32); 2]> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.abs().max(dy.abs());
    if length == 0 || dash <= 0 {
        return Vec::new();
    }

    let point_at = |d: i32| (from.0 + dx * d / length, from.1 + dy * d / length);
    let mut segments = Vec::new();
    let mut start = 0;
    while start < length {
        let end = (start + dash).min(length);
        segments.push([point_at(start), point_at(end)]);
        start = end + gap.max(0);
    }
    segments
}

/// Render the residual chart to a PNG file, overwriting it if present
pub fn render(table: &ResidualTable, path: &Path, config: &ChartConfig) -> Result<()> {
    log::info!("Rendering residual chart to {:?}", path);

    let bounds = ChartBounds::from_table(table);
    log::debug!("Chart bounds: {:?}", bounds);

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 32.0).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(
            bounds.x_min..bounds.x_max,
            (bounds.y_min..bounds.y_max).log_scale(),
        )?;

    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0e}", v))
        .disable_mesh()
        .draw()?;

    // Dashed grid at major and minor ticks, drawn in pixel space under the series
    let (major_y, minor_y) = log_grid_values(bounds.y_min, bounds.y_max);
    let mut grid = Vec::new();
    for (values, color) in [(major_y, MAJOR_GRID), (minor_y, MINOR_GRID)] {
        for y in values {
            grid.push((
                chart.backend_coord(&(bounds.x_min, y)),
                chart.backend_coord(&(bounds.x_max, y)),
                color,
            ));
        }
    }
    for x in linear_grid_values(bounds.x_min, bounds.x_max, X_GRID_LINES) {
        grid.push((
            chart.backend_coord(&(x, bounds.y_min)),
            chart.backend_coord(&(x, bounds.y_max)),
            MINOR_GRID,
        ));
    }
    for (from, to, color) in grid {
        for segment in dash_segments(from, to, GRID_DASH.0, GRID_DASH.1) {
            root.draw(&PathElement::new(segment.to_vec(), color.stroke_width(1)))?;
        }
    }

    for (variable, color) in TrackedVariable::ALL.iter().zip(SERIES_COLORS) {
        let points = series_points(table.time(), table.series(*variable));
        log::trace!("{}: {} point(s)", variable, points.len());

        let style = color.stroke_width(config.line_width);
        chart
            .draw_series(LineSeries::new(points, style))?
            .label(variable.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()
        .with_context(|| format!("Failed to write chart: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(times: &[u64], ux: &[f64]) -> ResidualTable {
        let mut table = ResidualTable::new();
        for &t in times {
            table.record_time(t);
        }
        for &v in ux {
            table.record_residual(TrackedVariable::Ux, v);
        }
        table
    }

    #[test]
    fn test_bounds_round_to_decades() {
        let mut table = table_with(&[1, 2, 3], &[0.5, 3e-3, 2e-6]);
        table.record_residual(TrackedVariable::P, 4e-7);

        let bounds = ChartBounds::from_table(&table);

        assert_eq!(bounds.x_min, 1.0);
        assert_eq!(bounds.x_max, 3.0);
        assert!((bounds.y_min - 1e-7).abs() < 1e-20);
        assert!((bounds.y_max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_single_time_step() {
        let table = table_with(&[10], &[1e-3]);

        let bounds = ChartBounds::from_table(&table);

        assert_eq!(bounds.x_min, 9.0);
        assert_eq!(bounds.x_max, 11.0);
        assert!(bounds.y_max > bounds.y_min);
    }

    #[test]
    fn test_bounds_without_drawable_residuals() {
        let table = table_with(&[1, 2], &[0.0, -1.0]);

        let bounds = ChartBounds::from_table(&table);

        assert_eq!((bounds.y_min, bounds.y_max), FALLBACK_Y_RANGE);
    }

    #[test]
    fn test_bounds_subnormal_residual_stays_positive() {
        let table = table_with(&[1, 2], &[5e-324, 1e-3]);

        let bounds = ChartBounds::from_table(&table);

        assert!(bounds.y_min > 0.0);
        assert!(bounds.y_max > bounds.y_min);

        let only_subnormal = table_with(&[1], &[5e-324]);
        let bounds = ChartBounds::from_table(&only_subnormal);
        assert!(bounds.y_min > 0.0);
        assert!(bounds.y_max > bounds.y_min);
    }

    #[test]
    fn test_log_grid_values() {
        let (major, minor) = log_grid_values(1e-3, 1.0);
        assert_eq!(major.len(), 4);
        assert!((major[0] - 1e-3).abs() < 1e-15);
        assert!((major[3] - 1.0).abs() < 1e-12);
        assert_eq!(minor.len(), 24);

        let (major, minor) = log_grid_values(0.0, 1.0);
        assert!(major.is_empty() && minor.is_empty());
    }

    #[test]
    fn test_linear_grid_values() {
        let values = linear_grid_values(0.0, 100.0, 10);
        assert_eq!(values.len(), 11);
        assert_eq!(values[0], 0.0);
        assert!((values[10] - 100.0).abs() < 1e-9);

        assert_eq!(linear_grid_values(9.0, 11.0, 10).len(), 11);
        assert!(linear_grid_values(5.0, 5.0, 10).is_empty());
    }

    #[test]
    fn test_dash_segments() {
        let dashes = dash_segments((0, 0), (20, 0), 6, 4);
        assert_eq!(dashes, vec![[(0, 0), (6, 0)], [(10, 0), (16, 0)]]);

        let vertical = dash_segments((5, 30), (5, 0), 10, 5);
        assert_eq!(vertical[0], [(5, 30), (5, 20)]);
        assert_eq!(vertical.len(), 2);

        assert!(dash_segments((3, 3), (3, 3), 6, 4).is_empty());
    }

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn six_series_table() -> ResidualTable {
        let mut table = ResidualTable::new();
        for (step, time) in [1u64, 2, 3, 4].into_iter().enumerate() {
            table.record_time(time);
            for (index, variable) in TrackedVariable::ALL.into_iter().enumerate() {
                let value = 10f64.powi(-(step as i32) - index as i32 - 1);
                table.record_residual(variable, value);
            }
        }
        table
    }

    #[test]
    fn test_render_overwrites_existing_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("residuals_plot.png");
        std::fs::write(&path, b"placeholder").unwrap();

        render(&six_series_table(), &path, &ChartConfig::default()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&PNG_MAGIC));
        assert!(!bytes.windows(11).any(|w| w == b"placeholder"));
    }

    #[test]
    fn test_series_points_drop_undrawable_values() {
        let points = series_points(&[1, 2, 3, 4], &[0.1, 0.0, f64::NAN, 0.01]);
        assert_eq!(points, vec![(1.0, 0.1), (4.0, 0.01)]);
    }

    #[test]
    fn test_series_points_truncate_to_shorter() {
        assert_eq!(series_points(&[1, 2, 3], &[0.1]), vec![(1.0, 0.1)]);
        assert_eq!(series_points(&[1], &[0.1, 0.2]), vec![(1.0, 0.1)]);
        assert!(series_points(&[1, 2], &[]).is_empty());
    }
}
