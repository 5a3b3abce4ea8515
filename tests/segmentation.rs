mod common;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use common::{brute_force_cost, init_logging, model_with, points_from_ys};
use seg_lines::app::pipeline;
use seg_lines::data::generate_sample;
use seg_lines::domain::{ModelEvent, Point, RunConfig, Shape};
use seg_lines::error::SolverError;
use seg_lines::math::best_fit;
use seg_lines::model::{EventLog, NdjsonWriter, Observer};
use seg_lines::solver::{segmented_least_squares, NoPause, Solver};

#[test]
fn straight_line_fit_recovers_coefficients() {
    let points: Vec<Point> = (0..6).map(|i| Point::new(i as f64, 2.0 * i as f64 + 1.0)).collect();
    let fit = best_fit(&points);
    assert_relative_eq!(fit.alpha, 1.0, epsilon = 1e-12);
    assert_relative_eq!(fit.beta, 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.mse, 0.0, epsilon = 1e-18);
}

#[test]
fn two_lines_split_into_two_exact_segments() {
    init_logging();
    let points = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(2.0, -5.0),
        Point::new(3.0, -6.0),
    ];
    let mut model = model_with(&points);
    let solution = segmented_least_squares(&mut model, 0.1, &mut NoPause).unwrap();

    assert_eq!(solution.splits, vec![0, 2, 4]);
    assert_eq!(model.active_count(), 2);
    for seg in model.active_segments() {
        assert_abs_diff_eq!(seg.fit.mse, 0.0, epsilon = 1e-12);
    }
    assert_relative_eq!(solution.cost, 0.2, epsilon = 1e-12);
}

#[test]
fn collinear_points_stay_one_segment() {
    let points = points_from_ys(&[1.0, 3.0, 5.0, 7.0]);
    for lambda in [0.01, 0.5, 3.0] {
        let mut model = model_with(&points);
        let solution = segmented_least_squares(&mut model, lambda, &mut NoPause).unwrap();
        assert_eq!(model.active_count(), 1, "lambda={lambda}");
        assert_eq!(solution.splits, vec![0, 4]);
    }
}

#[test]
fn objective_matches_dp_and_brute_force() {
    let points = points_from_ys(&[0.0, 2.0, 1.0, 5.0, 4.5, 4.0, -1.0]);
    for lambda in [0.0, 0.25, 1.0, 10.0] {
        let mut model = model_with(&points);
        let solution = segmented_least_squares(&mut model, lambda, &mut NoPause).unwrap();
        let n = points.len();
        assert_relative_eq!(model.objective(lambda), solution.opt[n], epsilon = 1e-9);
        assert_relative_eq!(solution.opt[n], brute_force_cost(&points, lambda), epsilon = 1e-9);
    }
}

#[test]
fn second_start_on_claimed_model_is_rejected() {
    let points = points_from_ys(&[0.0, 1.0, 0.0]);
    let mut model = model_with(&points);
    let solver = Solver::start(&mut model, 1.0).unwrap();
    assert_eq!(
        Solver::start(&mut model, 1.0).unwrap_err(),
        SolverError::ConcurrentRun
    );
    solver.cancel(&mut model);
    assert!(Solver::start(&mut model, 1.0).is_ok());
}

#[test]
fn replaying_events_reproduces_final_segmentation() {
    init_logging();
    let config = RunConfig {
        n: 20,
        lambda: 0.5,
        shape: Shape::Zigzag,
        noise: 0.2,
        ..RunConfig::default()
    };
    let log = Rc::new(RefCell::new(EventLog::new()));
    let observers: Vec<Box<dyn Observer>> = vec![Box::new(log.clone())];
    let output = pipeline::run(&config, observers, &mut NoPause).unwrap();

    let events = log.borrow().events().to_vec();
    let added = events
        .iter()
        .filter(|e| matches!(e, ModelEvent::PointAdded { .. }))
        .count();
    assert_eq!(added, config.n);

    let mut active = BTreeSet::new();
    for event in &events {
        match *event {
            ModelEvent::SegmentAdded { end, start, .. } => {
                assert!(active.insert((start, end)), "segment added twice");
            }
            ModelEvent::SegmentRemoved { end, start } => {
                assert!(active.remove(&(start, end)), "removed inactive segment");
            }
            _ => {}
        }
    }
    let expected: BTreeSet<(usize, usize)> = output
        .solution
        .segments
        .iter()
        .map(|s| (s.start, s.end))
        .collect();
    assert_eq!(active, expected);
    assert_relative_eq!(
        output.model.objective(config.lambda),
        output.solution.cost,
        epsilon = 1e-9
    );
}

#[test]
fn ndjson_stream_is_one_tagged_object_per_line() {
    let points = points_from_ys(&[0.0, 1.0, 5.0, 6.0]);
    let buf = Rc::new(RefCell::new(NdjsonWriter::new(Vec::<u8>::new())));
    let observers: Vec<Box<dyn Observer>> = vec![Box::new(buf.clone())];
    let model = pipeline::load_model(&points, observers);
    pipeline::solve(model, &points, 0.1, &mut NoPause).unwrap();

    let writer = Rc::try_unwrap(buf).ok().unwrap().into_inner();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines.len() > points.len());
    for line in &lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value.get("type").and_then(|t| t.as_str()).is_some(), "{line}");
    }
    assert!(lines[0].contains("\"point_added\""));
}

#[test]
fn generator_is_sorted_and_deterministic() {
    let config = RunConfig {
        n: 30,
        noise: 1.0,
        seed: 7,
        ..RunConfig::default()
    };
    let a = generate_sample(&config).unwrap();
    let b = generate_sample(&config).unwrap();
    assert_eq!(a, b);
    assert!(a.windows(2).all(|w| w[0].x <= w[1].x));

    let other = generate_sample(&RunConfig { seed: 8, ..config }).unwrap();
    assert_ne!(a, other);
}
