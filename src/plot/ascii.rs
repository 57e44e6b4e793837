//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curve: `-` line

use chrono::NaiveDate;

use crate::app::pipeline::{FittedSelection, date_at};
use crate::domain::FitFile;
use crate::models::predict;

pub const X_LABEL: &str = "Date";
pub const Y_LABEL: &str = "Mean Temperature Anomaly (C)";
pub const DATA_LABEL: &str = "Data";
pub const FIT_LABEL: &str = "Best fit model";

/// Plot the observed points of a fitted selection with its curve.
pub fn render_fit_plot(fitted: &FittedSelection, width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = fitted.t.iter().copied().zip(fitted.y.iter().copied()).collect();
    let t_range = fitted.t_range();
    let curve = sample_curve(fitted, t_range, curve_samples(width));
    render_plot(&points, &curve, t_range, fitted.origin, width, height)
}

/// Plot the curve grid stored in a fit JSON (no data points).
pub fn render_fit_file_plot(file: &FitFile, width: usize, height: usize) -> String {
    let curve: Vec<(f64, f64)> = file
        .grid
        .t_days
        .iter()
        .copied()
        .zip(file.grid.y.iter().copied())
        .collect();
    let t_range = range(curve.iter().map(|&(t, _)| t)).unwrap_or((0.0, 1.0));
    render_plot(&[], &curve, t_range, file.origin, width, height)
}

// The literal model oscillates once per day, so the curve is sampled far more
// densely than the grid can show.
fn curve_samples(width: usize) -> usize {
    width.max(2) * 8
}

fn sample_curve(fitted: &FittedSelection, (t0, t1): (f64, f64), n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let t = t0 + (t1 - t0) * i as f64 / (n as f64 - 1.0);
            (t, predict(fitted.fit.model, t, &fitted.fit.params))
        })
        .collect()
}

fn render_plot(
    points: &[(f64, f64)],
    curve: &[(f64, f64)],
    (t_min, t_max): (f64, f64),
    origin: NaiveDate,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let ys = points.iter().chain(curve).map(|&(_, y)| y);
    let (y_min, y_max) = range(ys).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so points overlay it.
    draw_curve(&mut grid, curve, t_min, t_max, y_min, y_max);
    for &(t, y) in points {
        let x = map_x(t, t_min, t_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!("{Y_LABEL}: [{y_min:.2}, {y_max:.2}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&format!(
        "{X_LABEL}: {} .. {}\n",
        date_at(origin, t_min),
        date_at(origin, t_max)
    ));
    if points.is_empty() {
        out.push_str(&format!("- {FIT_LABEL}\n"));
    } else {
        out.push_str(&format!("o {DATA_LABEL}   - {FIT_LABEL}\n"));
    }
    out
}

/// Finite min/max of the values, `None` when empty or degenerate.
fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo.is_finite() && hi.is_finite() && hi > lo {
        Some((lo, hi))
    } else if lo.is_finite() {
        Some((lo - 0.5, lo + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (largest y).
    (height as f64 - 1.0 - u * (height as f64 - 1.0)).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);

    let mut prev = None;
    for &(t, y) in curve.iter().filter(|(_, y)| y.is_finite()) {
        let x = map_x(t, t_min, t_max, width);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, row, '-'),
            None => grid[row][x] = '-',
        }
        prev = Some((x, row));
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x, mut y) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);

    let dx = (x1 - x).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let dy = -(y1 - y).abs();
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y as usize).and_then(|r| r.get_mut(x as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let origin = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let points = [(0.0, 0.0), (10.0, 1.0)];
        let curve = [(0.0, 0.0), (10.0, 0.0)];

        let txt = render_plot(&points, &curve, (0.0, 10.0), origin, 10, 5);
        let expected = concat!(
            "Mean Temperature Anomaly (C): [-0.05, 1.05]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
            "Date: 2000-01-01 .. 2000-01-11\n",
            "o Data   - Best fit model\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn curve_only_plot_has_fit_legend_only() {
        let origin = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let curve = [(0.0, 0.0), (5.0, 1.0), (10.0, 0.0)];
        let txt = render_plot(&[], &curve, (0.0, 10.0), origin, 20, 6);
        assert!(txt.ends_with("- Best fit model\n"));
        let grid_rows: Vec<&str> = txt.lines().skip(1).take(6).collect();
        assert!(grid_rows.iter().all(|row| !row.contains('o')));
        assert!(grid_rows.iter().any(|row| row.contains('-')));
    }

    #[test]
    fn flat_values_get_a_unit_range() {
        assert_eq!(range([0.5, 0.5].into_iter()), Some((0.0, 1.0)));
        assert_eq!(range(std::iter::empty()), None);
    }
}
