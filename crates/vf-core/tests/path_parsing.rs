//! Integration tests: path data as written by real authoring tools.
//!
//! Each sample is parsed, emitted, and re-parsed; the geometry must survive
//! and the control-point arrays must agree with the segment tags.

use pretty_assertions::assert_eq;
use vf_core::kurbo::{Point, Rect};
use vf_core::{
    ArcOutput, FormatConfig, PathConfig, PathSegment, PointKind, emit_path_data, format_path_data,
    parse_path_data, parse_path_data_with,
};

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Minified output: no separators where a sign or dot ends a number.
const MINIFIED: &str = "M10.5.5l-3.2-1.7.4.4c1-1-2.5.5.5.5s1 1 2 2zm20 20h5v-5H20z";

/// Inkscape style: relative commands, comma pairs, implicit repetition.
const INKSCAPE: &str = "m 48.5,12.25 c -2.1,0 -3.8,1.7 -3.8,3.8 0,2.1 1.7,3.8 3.8,3.8 \
    2.1,0 3.8,-1.7 3.8,-3.8 0,-2.1 -1.7,-3.8 -3.8,-3.8 z m 0,20 a 6,4 30 1 1 -0.01,0 z";

/// Illustrator style: absolute commands, compact arc flags.
const ILLUSTRATOR: &str = "M0,0h100v50H0V0z M10,25a15,15,0,0,0,30,0a15,15,0,1,1-30,0";

fn bbox_close(a: Rect, b: Rect, tol: f64) -> bool {
    (a.x0 - b.x0).abs() < tol
        && (a.y0 - b.y0).abs() < tol
        && (a.x1 - b.x1).abs() < tol
        && (a.y1 - b.y1).abs() < tol
}

fn assert_roundtrip_preserves(input: &str) {
    let first = parse_path_data(input);
    let emitted = emit_path_data(&first, 9);
    let second = parse_path_data(&emitted);

    assert_eq!(
        first.len(),
        second.len(),
        "segment count mismatch after round-trip.\nOriginal:\n{input}\nEmitted:\n{emitted}"
    );
    assert!(
        bbox_close(first.bounding_box(), second.bounding_box(), 1e-6),
        "bounds drifted: {:?} vs {:?}",
        first.bounding_box(),
        second.bounding_box()
    );
}

// ─── Tool output ─────────────────────────────────────────────────────────

#[test]
fn minified_numbers_split_correctly() {
    let geom = parse_path_data(MINIFIED);
    assert_eq!(geom.segments()[0], PathSegment::MoveTo(Point::new(10.5, 0.5)));
    let lines: Vec<Point> = geom.segments()[1..3]
        .iter()
        .filter_map(|s| match *s {
            PathSegment::LineTo(p) => Some(p),
            _ => None,
        })
        .collect();
    // `.4.4` is an implicit second l group.
    assert_eq!(lines.len(), 2);
    assert!((lines[0] - Point::new(7.3, -1.2)).hypot() < 1e-12);
    assert!((lines[1] - Point::new(7.7, -0.8)).hypot() < 1e-12);
    assert_roundtrip_preserves(MINIFIED);
}

#[test]
fn inkscape_relative_paths() {
    let geom = parse_path_data(INKSCAPE);
    let closes = geom.iter().filter(|s| matches!(s, PathSegment::Close)).count();
    assert_eq!(closes, 2);
    let circle = geom.segments()[..6].iter().filter(|s| matches!(s, PathSegment::CubicTo { .. })).count();
    assert_eq!(circle, 4);
    assert!(geom.iter().any(|s| matches!(s, PathSegment::ArcTo { .. })));
    assert_roundtrip_preserves(INKSCAPE);
}

#[test]
fn illustrator_compact_arcs() {
    let geom = parse_path_data(ILLUSTRATOR);
    let arcs: Vec<_> = geom
        .iter()
        .filter_map(|s| match s {
            PathSegment::ArcTo { arc, .. } => Some(*arc),
            _ => None,
        })
        .collect();
    assert_eq!(arcs.len(), 2);
    assert!(!arcs[0].large_arc());
    assert!(!arcs[0].sweep_flag());
    assert!(arcs[1].sweep_flag());
    let bbox = geom.bounding_box();
    assert!(bbox_close(bbox, Rect::new(0.0, 0.0, 100.0, 50.0), 1e-9));
    assert_roundtrip_preserves(ILLUSTRATOR);
}

#[test]
fn cubic_arc_output_matches_native_bounds() {
    let native = parse_path_data(ILLUSTRATOR);
    let config = PathConfig {
        arc_output: ArcOutput::Cubic,
        ..PathConfig::default()
    };
    let cubic = parse_path_data_with(ILLUSTRATOR, &config);
    assert!(!cubic.iter().any(|s| matches!(s, PathSegment::ArcTo { .. })));
    assert!(bbox_close(native.bounding_box(), cubic.bounding_box(), 0.05));
    assert_eq!(cubic.flatten_arcs(), cubic);
}

#[test]
fn control_point_arrays_follow_tags() {
    let geom = parse_path_data("M0 0 C1 1 2 1 3 0 S5 -1 6 0 Q7 1 8 0 T10 0 A1 1 0 0 1 12 0 Z");
    let cp = geom.control_points();
    assert_eq!(cp.points.len(), cp.kinds.len());
    let controls = cp.kinds.iter().filter(|k| **k == PointKind::Control).count();
    // C: 2, S: 2, Q: 1, T: 1 synthesized handle.
    assert_eq!(controls, 6);
    assert_eq!(cp.anchors().count(), 6);
    assert_eq!(cp.points.last(), Some(&Point::new(12.0, 0.0)));
}

#[test]
fn hand_edited_garbage_keeps_valid_geometry() {
    let geom = parse_path_data("M 0 0 L 10 10 ?? L 20 0 K 3 3 L 30 30 C 1 2 3");
    assert_eq!(
        geom.segments(),
        &[
            PathSegment::MoveTo(Point::new(0.0, 0.0)),
            PathSegment::LineTo(Point::new(10.0, 10.0)),
            PathSegment::LineTo(Point::new(20.0, 0.0)),
            PathSegment::LineTo(Point::new(30.0, 30.0)),
        ]
    );
}

#[test]
fn formatter_is_idempotent_on_tool_output() {
    for config in [
        FormatConfig::default(),
        FormatConfig {
            arcs_to_cubics: true,
            ..FormatConfig::default()
        },
        FormatConfig {
            relative: true,
            ..FormatConfig::default()
        },
    ] {
        for input in [MINIFIED, INKSCAPE, ILLUSTRATOR] {
            let once = format_path_data(input, &config);
            let twice = format_path_data(&once, &config);
            assert_eq!(once, twice, "not idempotent for {input:?} with {config:?}");
        }
    }
}
