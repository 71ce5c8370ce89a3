//! Elliptical arc conversion: SVG endpoint parameterization → center form.
//!
//! Follows the endpoint-to-center procedure of the SVG implementation notes
//! (F.6.5/F.6.6). Degenerate input is resolved deterministically: a zero
//! radius becomes a straight line, coincident endpoints become a no-op, and
//! radii too small to span the chord are scaled up until they do. No
//! branch produces NaN.

use kurbo::{Affine, CubicBez, Point, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Default tolerance for treating two endpoints as the same point.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// A rotated elliptical arc in center parameterization.
///
/// A point on the ellipse at parameter `t` is
/// `center + rotate(x_rotation) · (radii.x · cos t, radii.y · sin t)`.
/// A positive `sweep_angle` runs in the direction of increasing `t`
/// (clockwise on a y-down canvas), which is what SVG's `sweep-flag = 1`
/// selects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipticalArc {
    pub center: Point,
    pub radii: Vec2,
    /// Rotation of the ellipse's x axis, radians.
    pub x_rotation: f64,
    pub start_angle: f64,
    pub sweep_angle: f64,
}

/// Outcome of resolving one arc command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcResult {
    /// A radius is zero: draw a straight line to the endpoint.
    Line(Point),
    /// Start and end coincide: nothing is drawn, the current point still
    /// moves to the endpoint.
    NoOp,
    Arc(EllipticalArc),
}

/// Resolve an SVG arc command from `start` to `end`.
///
/// Radii are taken by absolute value and `x_rotation_deg` is in degrees,
/// both as written in path data.
pub fn arc_to(
    rx: f64,
    ry: f64,
    x_rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
    start: Point,
    end: Point,
) -> ArcResult {
    arc_to_with_epsilon(rx, ry, x_rotation_deg, large_arc, sweep, start, end, DEFAULT_EPSILON)
}

/// [`arc_to`] with an explicit coincident-endpoint tolerance.
#[allow(clippy::too_many_arguments)]
pub fn arc_to_with_epsilon(
    rx: f64,
    ry: f64,
    x_rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
    start: Point,
    end: Point,
    epsilon: f64,
) -> ArcResult {
    let mut rx = rx.abs();
    let mut ry = ry.abs();

    // Zero (or underflowing) radii, and non-finite parameters, draw a line.
    if !(rx * rx).is_normal() || !(ry * ry).is_normal() || !x_rotation_deg.is_finite() {
        log::trace!("arc: degenerate radii ({rx}, {ry}) resolved to a line");
        return ArcResult::Line(end);
    }

    if (end - start).hypot() <= epsilon {
        log::trace!("arc: coincident endpoints at {start:?} resolved to a no-op");
        return ArcResult::NoOp;
    }

    let phi = (x_rotation_deg % 360.0).to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // Step 1: half the chord, rotated into the ellipse frame.
    let half = (start - end) * 0.5;
    let x1 = cos_phi * half.x + sin_phi * half.y;
    let y1 = -sin_phi * half.x + cos_phi * half.y;

    // Radii too small to reach both endpoints are scaled up uniformly.
    let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
    if !lambda.is_finite() {
        log::trace!("arc: feasibility ratio overflowed; resolved to a line");
        return ArcResult::Line(end);
    }
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
        if !(rx * rx * ry * ry).is_finite() {
            log::trace!("arc: rescaled radii ({rx}, {ry}) overflow; resolved to a line");
            return ArcResult::Line(end);
        }
    }

    // Step 2: center in the ellipse frame.
    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * y1 * y1 - ry2 * x1 * x1;
    let den = rx2 * y1 * y1 + ry2 * x1 * x1;
    let sign = if large_arc == sweep { -1.0 } else { 1.0 };
    let coef = if den > 0.0 { sign * (num / den).max(0.0).sqrt() } else { 0.0 };
    let cx1 = coef * (rx * y1 / ry);
    let cy1 = coef * -(ry * x1 / rx);

    // Step 3: back to user space.
    let mid = start.midpoint(end);
    let center = Point::new(
        cos_phi * cx1 - sin_phi * cy1 + mid.x,
        sin_phi * cx1 + cos_phi * cy1 + mid.y,
    );

    // Step 4: angles between the endpoint unit vectors.
    let u = Vec2::new((x1 - cx1) / rx, (y1 - cy1) / ry);
    let v = Vec2::new((-x1 - cx1) / rx, (-y1 - cy1) / ry);
    let start_angle = u.atan2();
    let mut sweep_angle = u.cross(v).atan2(u.dot(v));
    if sweep && sweep_angle < 0.0 {
        sweep_angle += TAU;
    } else if !sweep && sweep_angle > 0.0 {
        sweep_angle -= TAU;
    }

    if !(center.is_finite() && start_angle.is_finite() && sweep_angle.is_finite()) {
        log::trace!("arc: non-finite center parameters; resolved to a line");
        return ArcResult::Line(end);
    }

    ArcResult::Arc(EllipticalArc {
        center,
        radii: Vec2::new(rx, ry),
        x_rotation: phi,
        start_angle,
        sweep_angle,
    })
}

impl EllipticalArc {
    /// Maps the unit circle onto this ellipse.
    fn frame(&self) -> Affine {
        Affine::translate(self.center.to_vec2())
            * Affine::rotate(self.x_rotation)
            * Affine::scale_non_uniform(self.radii.x, self.radii.y)
    }

    /// Point on the ellipse at parameter `angle`.
    pub fn point_at(&self, angle: f64) -> Point {
        let (s, c) = angle.sin_cos();
        self.frame() * Point::new(c, s)
    }

    pub fn start_point(&self) -> Point {
        self.point_at(self.start_angle)
    }

    pub fn end_point(&self) -> Point {
        self.point_at(self.start_angle + self.sweep_angle)
    }

    /// Whether this is the larger of the two candidate arcs. A half turn
    /// (within rounding) counts as the smaller one.
    pub fn large_arc(&self) -> bool {
        self.sweep_angle.abs() > PI + 1e-9
    }

    /// The SVG sweep flag this arc corresponds to.
    pub fn sweep_flag(&self) -> bool {
        self.sweep_angle > 0.0
    }

    /// Subdivide into at most four cubic Béziers of at most 90° each.
    pub fn to_cubics(&self) -> SmallVec<[CubicBez; 4]> {
        let frame = self.frame();
        let n = ((self.sweep_angle.abs() / FRAC_PI_2 - 1e-9).ceil() as usize).clamp(1, 4);
        let step = self.sweep_angle / n as f64;
        let k = 4.0 / 3.0 * (step / 4.0).tan();

        let mut out = SmallVec::new();
        let mut a0 = self.start_angle;
        for _ in 0..n {
            let a1 = a0 + step;
            let (s0, c0) = a0.sin_cos();
            let (s1, c1) = a1.sin_cos();
            out.push(CubicBez::new(
                frame * Point::new(c0, s0),
                frame * Point::new(c0 - k * s0, s0 + k * c0),
                frame * Point::new(c1 + k * s1, s1 - k * c1),
                frame * Point::new(c1, s1),
            ));
            a0 = a1;
        }
        out
    }

    /// Apply an affine map. Rotated-ellipse arcs are closed under affine
    /// maps, so the result is exact; the returned arc is recovered from the
    /// mapped endpoints and flags.
    pub fn transformed(&self, m: Affine) -> ArcResult {
        let start = m * self.start_point();
        let end = m * self.end_point();
        let (rx, ry, rot) = transformed_radii(self.radii, self.x_rotation, m);
        // A mirroring map flips the traversal direction.
        let sweep = self.sweep_flag() != (m.determinant() < 0.0);
        arc_to(rx, ry, rot.to_degrees(), self.large_arc(), sweep, start, end)
    }
}

/// Radii and rotation of the ellipse obtained by mapping an ellipse with the
/// linear part of `m`.
fn transformed_radii(radii: Vec2, rotation: f64, m: Affine) -> (f64, f64, f64) {
    let [a, b, c, d, _, _] = m.as_coeffs();
    let (s, co) = rotation.sin_cos();
    // Columns of M · R(rotation) · diag(rx, ry).
    let ux = (a * co + c * s) * radii.x;
    let uy = (b * co + d * s) * radii.x;
    let vx = (a * -s + c * co) * radii.y;
    let vy = (b * -s + d * co) * radii.y;
    // Singular values of [[ux vx] [uy vy]] give the new semi-axes.
    let e = (ux + vy) * 0.5;
    let f = (ux - vy) * 0.5;
    let g = (uy + vx) * 0.5;
    let h = (uy - vx) * 0.5;
    let q = e.hypot(h);
    let r = f.hypot(g);
    let a1 = g.atan2(f);
    let a2 = h.atan2(e);
    let theta = (a2 + a1) * 0.5;
    (q + r, (q - r).abs(), theta)
}
