//! Affine helpers: anchored composition, box anchors, decomposition.
//!
//! Convention throughout the crate: `point' = M · point` with column
//! vectors, so `a * b` applies `b` first. kurbo's `Affine` coefficients
//! `[a b c d e f]` map `(x, y)` to `(a·x + c·y + e, b·x + d·y + f)`.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Determinant magnitude below which a matrix is treated as singular.
pub const SINGULAR_EPSILON: f64 = 1e-12;

// ─── Anchored composition ─────────────────────────────────────────────────

/// `Translate(anchor) · delta · Translate(-anchor)`: `delta` with `anchor`
/// held fixed.
#[must_use]
pub fn anchored(delta: Affine, anchor: Point) -> Affine {
    let a = anchor.to_vec2();
    Affine::translate(a) * delta * Affine::translate(-a)
}

/// Rotation by `degrees` (positive turns +x toward +y) around `anchor`.
#[must_use]
pub fn rotate_around(degrees: f64, anchor: Point) -> Affine {
    anchored(Affine::rotate(degrees.to_radians()), anchor)
}

#[must_use]
pub fn scale_around(sx: f64, sy: f64, anchor: Point) -> Affine {
    anchored(Affine::scale_non_uniform(sx, sy), anchor)
}

/// Shear by the given angles in degrees (`skewX`, `skewY`) around `anchor`.
#[must_use]
pub fn shear_around(x_degrees: f64, y_degrees: f64, anchor: Point) -> Affine {
    let skew = Affine::skew(x_degrees.to_radians().tan(), y_degrees.to_radians().tan());
    anchored(skew, anchor)
}

/// Whether every coefficient of `a` and `b` differs by at most `tol`.
#[must_use]
pub fn approx_eq(a: Affine, b: Affine, tol: f64) -> bool {
    a.as_coeffs()
        .iter()
        .zip(b.as_coeffs())
        .all(|(x, y)| (x - y).abs() <= tol)
}

#[must_use]
pub fn is_invertible(m: Affine) -> bool {
    let det = m.determinant();
    det.is_finite() && det.abs() > SINGULAR_EPSILON
}

// ─── Anchor points ────────────────────────────────────────────────────────

/// Where on a bounding box a transform is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AnchorPoint {
    TopLeft,
    Top,
    TopRight,
    Left,
    #[default]
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
    /// An explicit point in the caller's coordinate space.
    Custom(Point),
}

impl AnchorPoint {
    /// Resolve against a box (y grows downward, so "top" is `y0`).
    #[must_use]
    pub fn resolve(self, rect: Rect) -> Point {
        let (fx, fy) = match self {
            AnchorPoint::TopLeft => (0.0, 0.0),
            AnchorPoint::Top => (0.5, 0.0),
            AnchorPoint::TopRight => (1.0, 0.0),
            AnchorPoint::Left => (0.0, 0.5),
            AnchorPoint::Center => (0.5, 0.5),
            AnchorPoint::Right => (1.0, 0.5),
            AnchorPoint::BottomLeft => (0.0, 1.0),
            AnchorPoint::Bottom => (0.5, 1.0),
            AnchorPoint::BottomRight => (1.0, 1.0),
            AnchorPoint::Custom(p) => return p,
        };
        Point::new(
            rect.x0 + fx * rect.width(),
            rect.y0 + fy * rect.height(),
        )
    }
}

// ─── Decomposition ────────────────────────────────────────────────────────

/// `M = Translate(translation) · Rotate(rotation) · SkewX(shear) · Scale(scale)`.
///
/// `rotation` is in radians, `shear` is the skew factor (tangent of the
/// skew angle). A reflection is carried by a negative `scale.y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposed {
    pub translation: Vec2,
    pub rotation: f64,
    pub scale: Vec2,
    pub shear: f64,
}

impl Decomposed {
    #[must_use]
    pub fn recompose(&self) -> Affine {
        Affine::translate(self.translation)
            * Affine::rotate(self.rotation)
            * Affine::new([1.0, 0.0, self.shear, 1.0, 0.0, 0.0])
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

/// Split a matrix into translation, rotation, shear and scale.
#[must_use]
pub fn decompose(m: Affine) -> Decomposed {
    let [a, b, c, d, e, f] = m.as_coeffs();
    let sx = a.hypot(b);
    if sx <= SINGULAR_EPSILON {
        return Decomposed {
            translation: Vec2::new(e, f),
            rotation: 0.0,
            scale: Vec2::new(0.0, c.hypot(d)),
            shear: 0.0,
        };
    }
    let rotation = b.atan2(a);
    let (ux, uy) = (a / sx, b / sx);
    // Second column expressed in the rotated frame.
    let k = c * ux + d * uy;
    let sy = d * ux - c * uy;
    let shear = if sy.abs() > SINGULAR_EPSILON { k / sy } else { 0.0 };
    Decomposed {
        translation: Vec2::new(e, f),
        rotation,
        scale: Vec2::new(sx, sy),
        shear,
    }
}
