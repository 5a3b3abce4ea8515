//! Formatted terminal output for a finished run.
//!
//! We keep formatting code in one place so:
//! - the model/solver code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{Point, RunConfig, Segment};

/// Format the full run summary (dataset + objective + segment table).
pub fn format_run_summary(config: &RunConfig, output: &RunOutput) -> String {
    let solution = &output.solution;
    let mut out = String::new();

    out.push_str("=== sls - segmented least squares ===\n");
    out.push_str(&format!(
        "Points: {} ({}, noise {:.2}, seed {})\n",
        output.points.len(),
        config.shape.display_name(),
        config.noise,
        config.seed
    ));
    out.push_str(&format!("Penalty: {:.3}\n", solution.lambda));
    out.push_str(&format!("Segments: {}\n", solution.segment_count()));
    out.push_str(&format!(
        "Cost: {:.6} (sum mse {:.6} + {} x {:.3})\n",
        solution.cost,
        output.model.total_cost(),
        solution.segment_count(),
        solution.lambda
    ));
    out.push_str(&format!(
        "Fits computed: {} for {} prefixes\n",
        output.model.fit_evaluations(),
        output.points.len()
    ));
    out.push('\n');
    out.push_str(&format_segments(&output.points, &solution.segments));
    out
}

/// One row per segment: index range, x span, line coefficients and error.
pub fn format_segments(points: &[Point], segments: &[Segment]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>3}  {:<10} {:>9} {:>9} {:>10} {:>10} {:>10}\n",
        "#", "range", "x_from", "x_to", "alpha", "beta", "mse"
    ));
    for (k, seg) in segments.iter().enumerate() {
        let (x_from, x_to) = segment_x_span(points, seg).unwrap_or((f64::NAN, f64::NAN));
        out.push_str(&format!(
            "{:>3}  {:<10} {:>9.3} {:>9.3} {:>10.4} {:>10.4} {:>10.6}\n",
            k + 1,
            format!("[{}, {})", seg.start, seg.end),
            x_from,
            x_to,
            seg.fit.alpha,
            seg.fit.beta,
            seg.fit.mse
        ));
    }
    out
}

/// x of the first and last point covered by `seg`.
pub fn segment_x_span(points: &[Point], seg: &Segment) -> Option<(f64, f64)> {
    if seg.is_empty() {
        return None;
    }
    let first = points.get(seg.start)?;
    let last = points.get(seg.end - 1)?;
    Some((first.x, last.x))
}
