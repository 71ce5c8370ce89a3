//! Path geometry: the primitive stream produced by the path-data parser.
//!
//! Every segment is an explicit tagged variant, so a control point is never
//! confused with an anchor: the flattened control-point arrays handed to
//! node-editing UI are derived from the tags, never from positional
//! lookahead.

use crate::arc::{ArcResult, EllipticalArc, arc_to};
use kurbo::{Affine, BezPath, CubicBez, Line, ParamCurveExtrema, PathSeg, Point, QuadBez, Rect};
use serde::{Deserialize, Serialize};

/// One emitted primitive. All coordinates are absolute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { ctrl: Point, to: Point },
    CubicTo { c1: Point, c2: Point, to: Point },
    /// A native rotated-ellipse arc. `to` is the exact endpoint written in
    /// the path data; `arc.end_point()` agrees with it up to rounding.
    ArcTo { arc: EllipticalArc, to: Point },
    Close,
}

impl PathSegment {
    /// The anchor this segment ends on (`None` for `Close`).
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some(p),
            PathSegment::QuadTo { to, .. }
            | PathSegment::CubicTo { to, .. }
            | PathSegment::ArcTo { to, .. } => Some(to),
            PathSegment::Close => None,
        }
    }
}

/// Role of a point in the flattened control-point arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    /// An on-curve point (segment endpoint).
    Anchor,
    /// An off-curve Bézier handle.
    Control,
}

/// Parallel point / kind arrays for node-editing UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlPoints {
    pub points: Vec<Point>,
    pub kinds: Vec<PointKind>,
}

impl ControlPoints {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, p: Point, kind: PointKind) {
        self.points.push(p);
        self.kinds.push(kind);
    }

    /// Indices of the anchors only.
    pub fn anchors(&self) -> impl Iterator<Item = usize> + '_ {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == PointKind::Anchor)
            .map(|(i, _)| i)
    }
}

/// Ordered, append-only sequence of emitted primitives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    segments: Vec<PathSegment>,
}

impl PathGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.segments.iter()
    }

    /// Current point before each segment, following SVG rules: a path
    /// starts at the origin and `Close` returns to the subpath start.
    fn start_points(&self) -> Vec<Point> {
        let mut out = Vec::with_capacity(self.segments.len());
        let mut current = Point::ZERO;
        let mut subpath_start = Point::ZERO;
        for seg in &self.segments {
            out.push(current);
            match *seg {
                PathSegment::MoveTo(p) => {
                    current = p;
                    subpath_start = p;
                }
                PathSegment::Close => current = subpath_start,
                _ => current = seg.end_point().unwrap_or(current),
            }
        }
        out
    }

    /// Flattened control points with their kinds.
    pub fn control_points(&self) -> ControlPoints {
        let mut cp = ControlPoints::default();
        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => cp.push(p, PointKind::Anchor),
                PathSegment::QuadTo { ctrl, to } => {
                    cp.push(ctrl, PointKind::Control);
                    cp.push(to, PointKind::Anchor);
                }
                PathSegment::CubicTo { c1, c2, to } => {
                    cp.push(c1, PointKind::Control);
                    cp.push(c2, PointKind::Control);
                    cp.push(to, PointKind::Anchor);
                }
                PathSegment::ArcTo { to, .. } => cp.push(to, PointKind::Anchor),
                PathSegment::Close => {}
            }
        }
        cp
    }

    /// Locate flattened point `index` as `(segment index, slot within segment)`.
    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut remaining = index;
        for (i, seg) in self.segments.iter().enumerate() {
            let count = match seg {
                PathSegment::MoveTo(_) | PathSegment::LineTo(_) | PathSegment::ArcTo { .. } => 1,
                PathSegment::QuadTo { .. } => 2,
                PathSegment::CubicTo { .. } => 3,
                PathSegment::Close => 0,
            };
            if remaining < count {
                return Some((i, remaining));
            }
            remaining -= count;
        }
        None
    }

    /// Move flattened point `index` to `p`.
    ///
    /// Arcs touching a moved anchor are re-solved with their radii, rotation
    /// and flags so they still run between their anchors. Returns `false` if
    /// `index` is out of range.
    pub fn set_control_point(&mut self, index: usize, p: Point) -> bool {
        let Some((seg_idx, slot)) = self.locate(index) else {
            return false;
        };

        let moved_anchor = match &mut self.segments[seg_idx] {
            PathSegment::MoveTo(q) | PathSegment::LineTo(q) => {
                *q = p;
                true
            }
            PathSegment::QuadTo { ctrl, to } => {
                if slot == 0 {
                    *ctrl = p;
                    false
                } else {
                    *to = p;
                    true
                }
            }
            PathSegment::CubicTo { c1, c2, to } => match slot {
                0 => {
                    *c1 = p;
                    false
                }
                1 => {
                    *c2 = p;
                    false
                }
                _ => {
                    *to = p;
                    true
                }
            },
            PathSegment::ArcTo { to, .. } => {
                *to = p;
                true
            }
            PathSegment::Close => false,
        };

        if moved_anchor {
            self.resolve_arc(seg_idx);
            if seg_idx + 1 < self.segments.len() {
                self.resolve_arc(seg_idx + 1);
            }
            // Every segment after a Close in this subpath starts at the MoveTo.
            if matches!(self.segments[seg_idx], PathSegment::MoveTo(_)) {
                for idx in seg_idx + 1..self.segments.len() - 1 {
                    match self.segments[idx] {
                        PathSegment::MoveTo(_) => break,
                        PathSegment::Close => self.resolve_arc(idx + 1),
                        _ => {}
                    }
                }
            }
        }
        true
    }

    /// Re-run the arc conversion for segment `idx` if it is an arc.
    fn resolve_arc(&mut self, idx: usize) {
        let PathSegment::ArcTo { arc, to } = self.segments[idx] else {
            return;
        };
        let from = self.start_points()[idx];
        self.segments[idx] = match arc_to(
            arc.radii.x,
            arc.radii.y,
            arc.x_rotation.to_degrees(),
            arc.large_arc(),
            arc.sweep_flag(),
            from,
            to,
        ) {
            ArcResult::Arc(arc) => PathSegment::ArcTo { arc, to },
            ArcResult::Line(_) | ArcResult::NoOp => PathSegment::LineTo(to),
        };
    }

    /// Kurbo segments for every drawing primitive, arcs subdivided.
    pub fn path_segs(&self) -> Vec<PathSeg> {
        let starts = self.start_points();
        let mut out = Vec::with_capacity(self.segments.len());
        let mut subpath_start = Point::ZERO;
        for (seg, &from) in self.segments.iter().zip(&starts) {
            match *seg {
                PathSegment::MoveTo(p) => subpath_start = p,
                PathSegment::LineTo(p) => out.push(PathSeg::Line(Line::new(from, p))),
                PathSegment::QuadTo { ctrl, to } => {
                    out.push(PathSeg::Quad(QuadBez::new(from, ctrl, to)));
                }
                PathSegment::CubicTo { c1, c2, to } => {
                    out.push(PathSeg::Cubic(CubicBez::new(from, c1, c2, to)));
                }
                PathSegment::ArcTo { arc, to } => {
                    out.extend(arc_cubics(&arc, from, to).into_iter().map(PathSeg::Cubic));
                }
                PathSegment::Close => {
                    if from != subpath_start {
                        out.push(PathSeg::Line(Line::new(from, subpath_start)));
                    }
                }
            }
        }
        out
    }

    /// Convert to a kurbo `BezPath`, subdividing arcs into cubics.
    ///
    /// A drawing segment with no open subpath (at the start, or after a
    /// close) gets an implicit move to the current point.
    pub fn to_bez_path(&self) -> BezPath {
        let starts = self.start_points();
        let mut bez = BezPath::new();
        let mut open = false;
        for (seg, &from) in self.segments.iter().zip(&starts) {
            if !open && !matches!(seg, PathSegment::MoveTo(_) | PathSegment::Close) {
                bez.move_to(from);
                open = true;
            }
            match *seg {
                PathSegment::MoveTo(p) => {
                    bez.move_to(p);
                    open = true;
                }
                PathSegment::LineTo(p) => bez.line_to(p),
                PathSegment::QuadTo { ctrl, to } => bez.quad_to(ctrl, to),
                PathSegment::CubicTo { c1, c2, to } => bez.curve_to(c1, c2, to),
                PathSegment::ArcTo { arc, to } => {
                    for c in arc_cubics(&arc, from, to) {
                        bez.curve_to(c.p1, c.p2, c.p3);
                    }
                }
                PathSegment::Close => {
                    if open {
                        bez.close_path();
                        open = false;
                    }
                }
            }
        }
        bez
    }

    /// Tight bounding box of the drawn geometry, including lone move-to
    /// points. `Rect::ZERO` for an empty path.
    pub fn bounding_box(&self) -> Rect {
        let mut bbox: Option<Rect> = None;
        let mut include = |r: Rect| {
            bbox = Some(match bbox {
                Some(b) => b.union(r),
                None => r,
            });
        };
        for seg in &self.segments {
            if let PathSegment::MoveTo(p) = *seg {
                include(Rect::from_points(p, p));
            }
        }
        for seg in self.path_segs() {
            include(seg.bounding_box());
        }
        bbox.unwrap_or(Rect::ZERO)
    }

    /// The same path with every arc replaced by at most four cubics.
    pub fn flatten_arcs(&self) -> PathGeometry {
        let starts = self.start_points();
        let mut out = PathGeometry::new();
        for (seg, &from) in self.segments.iter().zip(&starts) {
            match *seg {
                PathSegment::ArcTo { arc, to } => {
                    for c in arc_cubics(&arc, from, to) {
                        out.push(PathSegment::CubicTo {
                            c1: c.p1,
                            c2: c.p2,
                            to: c.p3,
                        });
                    }
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Map every point through `m`. Arcs stay arcs.
    pub fn transformed(&self, m: Affine) -> PathGeometry {
        let segments = self
            .segments
            .iter()
            .map(|seg| match *seg {
                PathSegment::MoveTo(p) => PathSegment::MoveTo(m * p),
                PathSegment::LineTo(p) => PathSegment::LineTo(m * p),
                PathSegment::QuadTo { ctrl, to } => PathSegment::QuadTo {
                    ctrl: m * ctrl,
                    to: m * to,
                },
                PathSegment::CubicTo { c1, c2, to } => PathSegment::CubicTo {
                    c1: m * c1,
                    c2: m * c2,
                    to: m * to,
                },
                PathSegment::ArcTo { arc, to } => match arc.transformed(m) {
                    ArcResult::Arc(arc) => PathSegment::ArcTo { arc, to: m * to },
                    ArcResult::Line(_) | ArcResult::NoOp => PathSegment::LineTo(m * to),
                },
                PathSegment::Close => PathSegment::Close,
            })
            .collect();
        PathGeometry { segments }
    }
}

impl<'a> IntoIterator for &'a PathGeometry {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Cubic subdivision pinned to the exact anchors on both ends.
pub(crate) fn arc_cubics(arc: &EllipticalArc, from: Point, to: Point) -> Vec<CubicBez> {
    let mut cubics: Vec<CubicBez> = arc.to_cubics().into_vec();
    if let Some(first) = cubics.first_mut() {
        first.p0 = from;
    }
    if let Some(last) = cubics.last_mut() {
        last.p3 = to;
    }
    cubics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_path_data;
    use pretty_assertions::assert_eq;

    #[test]
    fn control_points_follow_segment_tags() {
        let geom = parse_path_data("M0 0 Q5 5 10 0 C12 2 14 2 16 0 L20 0 Z");
        let cp = geom.control_points();
        assert_eq!(
            cp.kinds,
            vec![
                PointKind::Anchor,
                PointKind::Control,
                PointKind::Anchor,
                PointKind::Control,
                PointKind::Control,
                PointKind::Anchor,
                PointKind::Anchor,
            ]
        );
        assert_eq!(cp.points[3], Point::new(12.0, 2.0));
        assert_eq!(cp.anchors().collect::<Vec<_>>(), vec![0, 2, 5, 6]);
    }

    #[test]
    fn moving_a_handle_keeps_anchors() {
        let mut geom = parse_path_data("M0 0 C1 1 2 2 3 3");
        assert!(geom.set_control_point(2, Point::new(9.0, 9.0)));
        assert_eq!(
            geom.segments()[1],
            PathSegment::CubicTo {
                c1: Point::new(1.0, 1.0),
                c2: Point::new(9.0, 9.0),
                to: Point::new(3.0, 3.0),
            }
        );
        assert!(!geom.set_control_point(4, Point::ZERO));
    }

    #[test]
    fn moving_an_anchor_resolves_the_following_arc() {
        let mut geom = parse_path_data("M0 0 A10 10 0 0 1 20 0");
        assert!(geom.set_control_point(0, Point::new(-20.0, 0.0)));
        let PathSegment::ArcTo { arc, to } = geom.segments()[1] else {
            panic!("arc should survive the edit");
        };
        assert_eq!(to, Point::new(20.0, 0.0));
        assert!((arc.start_point() - Point::new(-20.0, 0.0)).hypot() < 1e-6);
        assert!((arc.end_point() - to).hypot() < 1e-6);
    }

    #[test]
    fn moving_a_move_to_resolves_arcs_after_close() {
        let mut geom = parse_path_data("M0 0 L10 0 Z A5 5 0 0 1 20 0 Z A8 8 0 0 0 -30 0 M50 50 A5 5 0 0 1 60 50");
        let untouched = geom.segments()[7];
        assert!(geom.set_control_point(0, Point::new(-20.0, 0.0)));
        for idx in [3, 5] {
            let PathSegment::ArcTo { arc, to } = geom.segments()[idx] else {
                panic!("segment {idx} should stay an arc");
            };
            assert!((arc.start_point() - Point::new(-20.0, 0.0)).hypot() < 1e-6, "segment {idx}");
            assert!((arc.end_point() - to).hypot() < 1e-6, "segment {idx}");
        }
        // The next subpath starts at its own MoveTo.
        assert_eq!(geom.segments()[7], untouched);
    }

    #[test]
    fn bounding_box_of_curves_is_tight() {
        let geom = parse_path_data("M0 0 C0 10 10 10 10 0");
        let bbox = geom.bounding_box();
        assert!((bbox.x0 - 0.0).abs() < 1e-9);
        assert!((bbox.x1 - 10.0).abs() < 1e-9);
        // Cubic with handles at y=10 peaks at y=7.5.
        assert!((bbox.y1 - 7.5).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_of_half_circle() {
        let geom = parse_path_data("M0 0 A10 10 0 0 1 20 0");
        let bbox = geom.bounding_box();
        assert!((bbox.width() - 20.0).abs() < 1e-6);
        assert!((bbox.height() - 10.0).abs() < 0.05);
    }

    #[test]
    fn empty_path_has_zero_bounds() {
        assert_eq!(PathGeometry::new().bounding_box(), Rect::ZERO);
    }

    #[test]
    fn bez_path_inserts_implicit_move() {
        let geom = parse_path_data("L 1,1 2,2");
        let bez = geom.to_bez_path();
        let elements: Vec<_> = bez.elements().to_vec();
        assert_eq!(elements[0], kurbo::PathEl::MoveTo(Point::ZERO));
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn flatten_arcs_keeps_the_endpoint_exact() {
        let geom = parse_path_data("M0 0 A5 5 0 1 1 3 4");
        let flat = geom.flatten_arcs();
        assert!(flat.iter().all(|s| !matches!(s, PathSegment::ArcTo { .. })));
        assert_eq!(flat.segments().last().and_then(|s| s.end_point()), Some(Point::new(3.0, 4.0)));
    }

    #[test]
    fn transformed_arc_stays_native() {
        let geom = parse_path_data("M0 0 A5 5 0 0 1 10 0");
        let moved = geom.transformed(Affine::translate((5.0, 5.0)));
        let PathSegment::ArcTo { arc, to } = moved.segments()[1] else {
            panic!("expected an arc");
        };
        assert_eq!(to, Point::new(15.0, 5.0));
        assert!((arc.center - Point::new(10.0, 5.0)).hypot() < 1e-9);
    }
}
