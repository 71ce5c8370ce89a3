//! Shape model: the closed set of shape kinds and their geometry capability.
//!
//! Every leaf kind implements `ShapeGeometry` in its own local coordinate
//! space; the scene places it with the node's local transform. Groups carry
//! no geometry of their own, only an ordered list of owned children.

use crate::id::ShapeId;
use crate::path::{ControlPoints, PathGeometry, PointKind};
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape, Size, Vec2};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stable arena key of a shape. Survives removal of other shapes.
pub type ShapeKey = NodeIndex;

/// Flattening tolerance for outlines of curved primitives.
const OUTLINE_TOLERANCE: f64 = 0.1;

// ─── Geometry capability ─────────────────────────────────────────────────

/// What every leaf shape can do with its local-space geometry.
pub trait ShapeGeometry {
    /// Tight bounds in local coordinates.
    fn local_bounds(&self) -> Rect;

    /// Outline as a Bézier path in local coordinates.
    fn outline(&self) -> BezPath;

    /// Editable points with their kinds.
    fn control_points(&self) -> ControlPoints;

    /// Move point `index` (as numbered by `control_points`). Returns `false`
    /// for an index out of range.
    fn set_control_point(&mut self, index: usize, p: Point) -> bool;

    /// Fold `m` into the geometry itself. Returns `false`, leaving the
    /// geometry untouched, when this kind cannot represent the result.
    fn bake_transform(&mut self, m: Affine) -> bool;
}

fn is_axis_aligned(m: Affine) -> bool {
    let [_, b, c, _, _, _] = m.as_coeffs();
    b.abs() < 1e-12 && c.abs() < 1e-12
}

fn points_bounds(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

fn polyline_path(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for p in iter {
            path.line_to(*p);
        }
        if closed {
            path.close_path();
        }
    }
    path
}

fn anchors(points: &[Point]) -> ControlPoints {
    let mut cp = ControlPoints::default();
    for p in points {
        cp.push(*p, PointKind::Anchor);
    }
    cp
}

// ─── Leaf kinds ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub rect: Rect,
    pub corner_radius: f64,
}

impl Rectangle {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect: rect.abs(),
            corner_radius: 0.0,
        }
    }

    /// Corners clockwise from top-left.
    fn corners(&self) -> [Point; 4] {
        let r = self.rect;
        [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ]
    }
}

impl ShapeGeometry for Rectangle {
    fn local_bounds(&self) -> Rect {
        self.rect
    }

    fn outline(&self) -> BezPath {
        if self.corner_radius > 0.0 {
            RoundedRect::from_rect(self.rect, self.corner_radius).to_path(OUTLINE_TOLERANCE)
        } else {
            self.rect.to_path(OUTLINE_TOLERANCE)
        }
    }

    fn control_points(&self) -> ControlPoints {
        anchors(&self.corners())
    }

    /// Dragging a corner keeps the opposite corner fixed.
    fn set_control_point(&mut self, index: usize, p: Point) -> bool {
        let corners = self.corners();
        if index >= corners.len() {
            return false;
        }
        self.rect = Rect::from_points(p, corners[(index + 2) % 4]);
        true
    }

    fn bake_transform(&mut self, m: Affine) -> bool {
        if !is_axis_aligned(m) {
            return false;
        }
        let [a, _, _, d, _, _] = m.as_coeffs();
        self.rect = m.transform_rect_bbox(self.rect);
        self.corner_radius *= a.abs().min(d.abs());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point,
    pub radii: Vec2,
}

impl Ellipse {
    pub fn new(center: Point, radii: Vec2) -> Self {
        Self {
            center,
            radii: Vec2::new(radii.x.abs(), radii.y.abs()),
        }
    }
}

impl ShapeGeometry for Ellipse {
    fn local_bounds(&self) -> Rect {
        Rect::from_center_size(self.center, (self.radii * 2.0).to_size())
    }

    fn outline(&self) -> BezPath {
        kurbo::Ellipse::new(self.center, self.radii, 0.0).to_path(OUTLINE_TOLERANCE)
    }

    /// Center, then the x-radius and y-radius handles.
    fn control_points(&self) -> ControlPoints {
        let mut cp = ControlPoints::default();
        cp.push(self.center, PointKind::Anchor);
        cp.push(self.center + Vec2::new(self.radii.x, 0.0), PointKind::Control);
        cp.push(self.center + Vec2::new(0.0, self.radii.y), PointKind::Control);
        cp
    }

    fn set_control_point(&mut self, index: usize, p: Point) -> bool {
        match index {
            0 => self.center = p,
            1 => self.radii.x = (p.x - self.center.x).abs(),
            2 => self.radii.y = (p.y - self.center.y).abs(),
            _ => return false,
        }
        true
    }

    fn bake_transform(&mut self, m: Affine) -> bool {
        if !is_axis_aligned(m) {
            return false;
        }
        let [a, _, _, d, _, _] = m.as_coeffs();
        self.center = m * self.center;
        self.radii = Vec2::new(self.radii.x * a.abs(), self.radii.y * d.abs());
        true
    }
}

impl ShapeGeometry for PathGeometry {
    fn local_bounds(&self) -> Rect {
        self.bounding_box()
    }

    fn outline(&self) -> BezPath {
        self.to_bez_path()
    }

    fn control_points(&self) -> ControlPoints {
        PathGeometry::control_points(self)
    }

    fn set_control_point(&mut self, index: usize, p: Point) -> bool {
        PathGeometry::set_control_point(self, index, p)
    }

    fn bake_transform(&mut self, m: Affine) -> bool {
        *self = self.transformed(m);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub from: Point,
    pub to: Point,
}

impl ShapeGeometry for Line {
    fn local_bounds(&self) -> Rect {
        Rect::from_points(self.from, self.to)
    }

    fn outline(&self) -> BezPath {
        polyline_path(&[self.from, self.to], false)
    }

    fn control_points(&self) -> ControlPoints {
        anchors(&[self.from, self.to])
    }

    fn set_control_point(&mut self, index: usize, p: Point) -> bool {
        match index {
            0 => self.from = p,
            1 => self.to = p,
            _ => return false,
        }
        true
    }

    fn bake_transform(&mut self, m: Affine) -> bool {
        self.from = m * self.from;
        self.to = m * self.to;
        true
    }
}

/// Open (`Polyline`) or closed (`Polygon`) vertex list.
macro_rules! vertex_shape {
    ($name:ident, $closed:expr) => {
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub points: Vec<Point>,
        }

        impl ShapeGeometry for $name {
            fn local_bounds(&self) -> Rect {
                points_bounds(&self.points)
            }

            fn outline(&self) -> BezPath {
                polyline_path(&self.points, $closed)
            }

            fn control_points(&self) -> ControlPoints {
                anchors(&self.points)
            }

            fn set_control_point(&mut self, index: usize, p: Point) -> bool {
                match self.points.get_mut(index) {
                    Some(slot) => {
                        *slot = p;
                        true
                    }
                    None => false,
                }
            }

            fn bake_transform(&mut self, m: Affine) -> bool {
                for p in &mut self.points {
                    *p = m * *p;
                }
                true
            }
        }
    };
}

vertex_shape!(Polyline, false);
vertex_shape!(Polygon, true);

/// A text run. Its box is measured by the host (fonts are not resolved here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub origin: Point,
    pub content: String,
    pub size: Size,
}

impl ShapeGeometry for Text {
    fn local_bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    fn outline(&self) -> BezPath {
        self.local_bounds().to_path(OUTLINE_TOLERANCE)
    }

    fn control_points(&self) -> ControlPoints {
        anchors(&[self.origin])
    }

    fn set_control_point(&mut self, index: usize, p: Point) -> bool {
        if index != 0 {
            return false;
        }
        self.origin = p;
        true
    }

    /// Only translations: glyph outlines are not owned here.
    fn bake_transform(&mut self, m: Affine) -> bool {
        let [a, _, _, d, e, f] = m.as_coeffs();
        if (a - 1.0).abs() > 1e-12 || (d - 1.0).abs() > 1e-12 || !is_axis_aligned(m) {
            return false;
        }
        self.origin += Vec2::new(e, f);
        true
    }
}

// ─── Groups ──────────────────────────────────────────────────────────────

/// Container state. Children are owned by the group in z-order; each
/// child's transform snapshot lives on the child's own `Membership`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    pub(crate) children: SmallVec<[ShapeKey; 8]>,
    /// Group-level transform applied since creation, for selection chrome.
    /// Never part of the children's world chain.
    pub(crate) decoration: Affine,
    pub(crate) decoration_initial: Affine,
}

impl GroupData {
    /// Owned child keys in z-order. May include stale entries after a
    /// child was destroyed; see `Scene::prune_stale`.
    pub fn children(&self) -> &[ShapeKey] {
        &self.children
    }

    pub fn decoration(&self) -> Affine {
        self.decoration
    }
}

// ─── Shape node ──────────────────────────────────────────────────────────

/// The closed set of shape kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Path(PathGeometry),
    Line(Line),
    Polyline(Polyline),
    Polygon(Polygon),
    Text(Text),
    Group(GroupData),
}

impl ShapeKind {
    /// Short lowercase name, also used as the prefix of generated ids.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle(_) => "rect",
            ShapeKind::Ellipse(_) => "ellipse",
            ShapeKind::Path(_) => "path",
            ShapeKind::Line(_) => "line",
            ShapeKind::Polyline(_) => "polyline",
            ShapeKind::Polygon(_) => "polygon",
            ShapeKind::Text(_) => "text",
            ShapeKind::Group(_) => "group",
        }
    }

    /// Geometry of a leaf; `None` for groups.
    pub fn geometry(&self) -> Option<&dyn ShapeGeometry> {
        let geometry: &dyn ShapeGeometry = match self {
            ShapeKind::Rectangle(s) => s,
            ShapeKind::Ellipse(s) => s,
            ShapeKind::Path(s) => s,
            ShapeKind::Line(s) => s,
            ShapeKind::Polyline(s) => s,
            ShapeKind::Polygon(s) => s,
            ShapeKind::Text(s) => s,
            ShapeKind::Group(_) => return None,
        };
        Some(geometry)
    }

    pub fn geometry_mut(&mut self) -> Option<&mut dyn ShapeGeometry> {
        let geometry: &mut dyn ShapeGeometry = match self {
            ShapeKind::Rectangle(s) => s,
            ShapeKind::Ellipse(s) => s,
            ShapeKind::Path(s) => s,
            ShapeKind::Line(s) => s,
            ShapeKind::Polyline(s) => s,
            ShapeKind::Polygon(s) => s,
            ShapeKind::Text(s) => s,
            ShapeKind::Group(_) => return None,
        };
        Some(geometry)
    }

    pub fn as_group(&self) -> Option<&GroupData> {
        match self {
            ShapeKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupData> {
        match self {
            ShapeKind::Group(g) => Some(g),
            _ => None,
        }
    }
}

/// Whether a shape belongs to a group.
///
/// `Unattached → Attached` captures `initial`, the child's transform in the
/// group's frame at attach time (re-captured by
/// `Scene::commit_group_transform`). `Attached → Attached` is not a legal
/// transition: moving between groups is a detach followed by an attach.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Membership {
    #[default]
    Unattached,
    Attached { group: ShapeKey, initial: Affine },
}

impl Membership {
    pub fn group(&self) -> Option<ShapeKey> {
        match *self {
            Membership::Unattached => None,
            Membership::Attached { group, .. } => Some(group),
        }
    }
}

/// One shape in the scene arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeNode {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Local transform into the parent frame (the scene for top-level shapes).
    pub(crate) transform: Affine,
    pub(crate) membership: Membership,
    /// Custom anchor in local coordinates.
    pub(crate) anchor: Option<Point>,
}

impl ShapeNode {
    pub fn new(id: ShapeId, kind: ShapeKind) -> Self {
        Self {
            id,
            kind,
            transform: Affine::IDENTITY,
            membership: Membership::Unattached,
            anchor: None,
        }
    }

    /// Node with a generated id such as `rect_0004`.
    pub fn anonymous(kind: ShapeKind) -> Self {
        let id = ShapeId::generate(kind.name());
        Self::new(id, kind)
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn membership(&self) -> Membership {
        self.membership
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ShapeKind::Group(_))
    }
}
