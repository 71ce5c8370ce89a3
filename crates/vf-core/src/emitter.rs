//! Emitter: `PathGeometry` → SVG path data.
//!
//! Produces compact text that re-parses to the same geometry, up to the
//! requested decimal precision.

use crate::path::{PathGeometry, PathSegment};
use kurbo::{Point, Vec2};

/// Emit geometry as absolute path data (`M L Q C A Z`).
#[must_use]
pub fn emit_path_data(geom: &PathGeometry, precision: usize) -> String {
    let mut out = Writer::new(precision);
    for seg in geom {
        match *seg {
            PathSegment::MoveTo(p) => out.command('M', &[p.x, p.y]),
            PathSegment::LineTo(p) => out.command('L', &[p.x, p.y]),
            PathSegment::QuadTo { ctrl, to } => out.command('Q', &[ctrl.x, ctrl.y, to.x, to.y]),
            PathSegment::CubicTo { c1, c2, to } => {
                out.command('C', &[c1.x, c1.y, c2.x, c2.y, to.x, to.y]);
            }
            PathSegment::ArcTo { arc, to } => out.arc('A', &arc, to.to_vec2()),
            PathSegment::Close => out.command('Z', &[]),
        }
    }
    out.finish()
}

/// Emit geometry as relative path data (`m l q c a z`).
///
/// Offsets are measured from the position the emitted text itself reaches,
/// so rounding never accumulates drift across a long path.
#[must_use]
pub fn emit_path_data_relative(geom: &PathGeometry, precision: usize) -> String {
    let mut out = Writer::new(precision);
    let mut pen = Point::ZERO;
    let mut start = Point::ZERO;

    for seg in geom {
        match *seg {
            PathSegment::MoveTo(p) => {
                let d = out.rounded(p - pen);
                out.command('m', &[d.x, d.y]);
                pen += d;
                start = pen;
            }
            PathSegment::LineTo(p) => {
                let d = out.rounded(p - pen);
                out.command('l', &[d.x, d.y]);
                pen += d;
            }
            PathSegment::QuadTo { ctrl, to } => {
                let c = ctrl - pen;
                let d = out.rounded(to - pen);
                out.command('q', &[c.x, c.y, d.x, d.y]);
                pen += d;
            }
            PathSegment::CubicTo { c1, c2, to } => {
                let (a, b) = (c1 - pen, c2 - pen);
                let d = out.rounded(to - pen);
                out.command('c', &[a.x, a.y, b.x, b.y, d.x, d.y]);
                pen += d;
            }
            PathSegment::ArcTo { arc, to } => {
                let d = out.rounded(to - pen);
                out.arc('a', &arc, d);
                pen += d;
            }
            PathSegment::Close => {
                out.command('z', &[]);
                pen = start;
            }
        }
    }
    out.finish()
}

struct Writer {
    buf: String,
    precision: usize,
}

impl Writer {
    fn new(precision: usize) -> Self {
        Self {
            buf: String::with_capacity(128),
            precision,
        }
    }

    fn command(&mut self, letter: char, args: &[f64]) {
        if !self.buf.is_empty() {
            self.buf.push(' ');
        }
        self.buf.push(letter);
        for (i, v) in args.iter().enumerate() {
            if i > 0 {
                self.buf.push(' ');
            }
            self.buf.push_str(&format_num(*v, self.precision));
        }
    }

    fn arc(&mut self, letter: char, arc: &crate::arc::EllipticalArc, end: Vec2) {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        self.command(
            letter,
            &[
                arc.radii.x,
                arc.radii.y,
                arc.x_rotation.to_degrees(),
                flag(arc.large_arc()),
                flag(arc.sweep_flag()),
                end.x,
                end.y,
            ],
        );
    }

    /// The value a reader of the emitted text will see.
    fn rounded(&self, v: Vec2) -> Vec2 {
        let round = |x: f64| format_num(x, self.precision).parse().unwrap_or(x);
        Vec2::new(round(v.x), round(v.y))
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Format a float with at most `precision` decimals and no trailing zeros.
pub(crate) fn format_num(n: f64, precision: usize) -> String {
    let s = format!("{n:.precision$}");
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s.as_str()
    };
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
