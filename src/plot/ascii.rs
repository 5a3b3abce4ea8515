//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - points: `o`
//! - fitted segments: `-` lines between each segment's first and last point

use crate::domain::{Point, Segment};

/// Render points with the fitted segments drawn over them.
pub fn render_segments_plot(
    points: &[Point],
    segments: &[Segment],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let lines = segment_lines(points, segments);
    let (x_min, x_max) = x_range(points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(points, &lines).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw segments first so points overlay them.
    for &(a, b) in &lines {
        let x0 = map_x(a.x, x_min, x_max, width);
        let y0 = map_y(a.y, y_min, y_max, height);
        let x1 = map_x(b.x, x_min, x_max, width);
        let y1 = map_y(b.y, y_min, y_max, height);
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }

    for p in points {
        let x = map_x(p.x, x_min, x_max, width);
        let y = map_y(p.y, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}] | segments={}\n",
        lines.len()
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

/// Segment endpoints on the fitted line, at the first and last covered point.
fn segment_lines(points: &[Point], segments: &[Segment]) -> Vec<(Point, Point)> {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            let first = points.get(s.start)?;
            let last = points.get(s.end - 1)?;
            Some((
                Point::new(first.x, s.fit.at(first.x)),
                Point::new(last.x, s.fit.at(last.x)),
            ))
        })
        .filter(|(a, b)| a.y.is_finite() && b.y.is_finite())
        .collect()
}

fn x_range(points: &[Point]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(points: &[Point], lines: &[(Point, Point)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let line_ends = lines.iter().flat_map(|(a, b)| [a, b]);
    for p in points.iter().chain(line_ends) {
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham), never overwriting non-blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x, mut y) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);

    let dx = (x1 - x).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let dy = -(y1 - y).abs();
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
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
