//! Path-data interpreter: SVG `d` attribute text → `PathGeometry`.
//!
//! Handles `M L H V C S Q T A Z` in absolute and relative form, implicit
//! command repetition (a repeated `M` group is a `L`), and reflection for
//! `S`/`T`. Parsing is total: unknown letters and garbage are skipped, an
//! argument group cut short is dropped without emitting anything, and the
//! parse always returns whatever geometry was valid.

use crate::arc::{ArcResult, DEFAULT_EPSILON, arc_to_with_epsilon};
use crate::path::{PathGeometry, PathSegment, arc_cubics};
use crate::tokenizer::{PathToken, Tokenizer};
use kurbo::{Point, Vec2};
use smallvec::SmallVec;

// ─── Config ───────────────────────────────────────────────────────────────

/// How arc commands are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcOutput {
    /// Emit `PathSegment::ArcTo` with the center parameterization.
    #[default]
    Native,
    /// Emit at most four `CubicTo` segments per arc, for consumers without
    /// rotated-ellipse arcs.
    Cubic,
}

/// Configuration for the interpreter.
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub arc_output: ArcOutput,
    /// Distance under which an arc's endpoints count as coincident.
    pub epsilon: f64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            arc_output: ArcOutput::Native,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

// ─── Commands ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    MoveTo,
    LineTo,
    HLine,
    VLine,
    CubicTo,
    SmoothCubic,
    QuadTo,
    SmoothQuad,
    ArcTo,
    Close,
}

impl CommandKind {
    /// Decode a command letter into its kind and relative flag.
    pub fn from_letter(c: char) -> Option<(CommandKind, bool)> {
        let kind = match c.to_ascii_uppercase() {
            'M' => CommandKind::MoveTo,
            'L' => CommandKind::LineTo,
            'H' => CommandKind::HLine,
            'V' => CommandKind::VLine,
            'C' => CommandKind::CubicTo,
            'S' => CommandKind::SmoothCubic,
            'Q' => CommandKind::QuadTo,
            'T' => CommandKind::SmoothQuad,
            'A' => CommandKind::ArcTo,
            'Z' => CommandKind::Close,
            _ => return None,
        };
        Some((kind, c.is_ascii_lowercase()))
    }

    /// Number of operands in one argument group.
    pub fn arity(self) -> usize {
        match self {
            CommandKind::Close => 0,
            CommandKind::HLine | CommandKind::VLine => 1,
            CommandKind::MoveTo | CommandKind::LineTo | CommandKind::SmoothQuad => 2,
            CommandKind::SmoothCubic | CommandKind::QuadTo => 4,
            CommandKind::CubicTo => 6,
            CommandKind::ArcTo => 7,
        }
    }
}

/// One command letter with one complete argument group.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCommand {
    pub kind: CommandKind,
    pub relative: bool,
    pub args: SmallVec<[f64; 7]>,
}

/// Which curve family last set the control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveFamily {
    #[default]
    None,
    Cubic,
    Quad,
}

/// Interpreter state carried between commands.
///
/// `last_control_point == current_point` after any non-curve command or a
/// close; only `C`/`S` (cubic family) and `Q`/`T` (quad family) move it
/// elsewhere, and `S`/`T` only reflect it when `last_curve` matches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParserState {
    pub current_point: Point,
    pub subpath_start: Point,
    pub last_control_point: Point,
    pub last_curve: CurveFamily,
}

impl ParserState {
    /// First control point of a smooth command of `family`.
    fn reflected_control(&self, family: CurveFamily) -> Point {
        if self.last_curve == family {
            (self.current_point.to_vec2() * 2.0 - self.last_control_point.to_vec2()).to_point()
        } else {
            self.current_point
        }
    }

    fn settle(&mut self, to: Point) {
        self.current_point = to;
        self.last_control_point = to;
        self.last_curve = CurveFamily::None;
    }
}

// ─── Interpreter ──────────────────────────────────────────────────────────

/// Stateful interpreter. Text can be fed in several chunks; state carries
/// over so a chunk may continue the previous one's path.
#[derive(Debug, Clone, Default)]
pub struct PathParser {
    config: PathConfig,
    state: ParserState,
    /// Command whose argument groups are currently being repeated.
    active: Option<(CommandKind, bool)>,
    geometry: PathGeometry,
}

impl PathParser {
    pub fn new(config: PathConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn geometry(&self) -> &PathGeometry {
        &self.geometry
    }

    pub fn finish(self) -> PathGeometry {
        self.geometry
    }

    /// Tokenize and interpret a chunk of path data.
    pub fn feed(&mut self, text: &str) {
        let mut tok = Tokenizer::new(text);

        while !tok.is_at_end() {
            if tok.at_number() {
                self.feed_group(&mut tok);
                continue;
            }

            if !tok.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                tok.skip_malformed();
                continue;
            }

            match tok.next() {
                Some(PathToken::Command(c)) => {
                    self.active = CommandKind::from_letter(c);
                    if let Some((CommandKind::Close, relative)) = self.active {
                        self.execute(&PathCommand {
                            kind: CommandKind::Close,
                            relative,
                            args: SmallVec::new(),
                        });
                    }
                }
                Some(PathToken::Unknown(c)) => {
                    log::debug!("path data: ignoring unknown command {c:?}");
                    self.active = None;
                }
                Some(PathToken::Number(_)) | None => {}
            }
        }
    }

    /// Read one argument group for the active command and run it.
    fn feed_group(&mut self, tok: &mut Tokenizer<'_>) {
        let before = tok.remaining().len();

        let Some((kind, relative)) = self.active.filter(|(k, _)| k.arity() > 0) else {
            if tok.next_number().is_some() {
                log::debug!("path data: dropping operand with no command");
            } else {
                tok.skip_malformed();
            }
            return;
        };

        let mut args: SmallVec<[f64; 7]> = SmallVec::new();
        for i in 0..kind.arity() {
            let value = if kind == CommandKind::ArcTo && (i == 3 || i == 4) {
                tok.next_flag().map(|f| if f { 1.0 } else { 0.0 })
            } else {
                tok.next_number()
            };
            match value {
                Some(v) => args.push(v),
                None => break,
            }
        }

        if args.len() < kind.arity() {
            log::debug!(
                "path data: dropping incomplete {kind:?} group ({} of {} operands)",
                args.len(),
                kind.arity()
            );
            if tok.remaining().len() == before {
                tok.skip_malformed();
            }
            return;
        }

        self.execute(&PathCommand { kind, relative, args });

        // Implicit repetition of a move-to draws lines.
        if kind == CommandKind::MoveTo {
            self.active = Some((CommandKind::LineTo, relative));
        }
    }

    /// Interpret one complete command, appending its primitives.
    pub fn execute(&mut self, cmd: &PathCommand) {
        if cmd.args.len() < cmd.kind.arity() {
            return;
        }
        let a = &cmd.args;
        let base = if cmd.relative {
            self.state.current_point.to_vec2()
        } else {
            Vec2::ZERO
        };
        let pt = |x: f64, y: f64| Point::new(x, y) + base;

        match cmd.kind {
            CommandKind::MoveTo => {
                let p = pt(a[0], a[1]);
                self.geometry.push(PathSegment::MoveTo(p));
                self.state.subpath_start = p;
                self.state.settle(p);
            }
            CommandKind::LineTo => {
                let p = pt(a[0], a[1]);
                self.line_to(p);
            }
            CommandKind::HLine => {
                let x = if cmd.relative { a[0] + base.x } else { a[0] };
                self.line_to(Point::new(x, self.state.current_point.y));
            }
            CommandKind::VLine => {
                let y = if cmd.relative { a[0] + base.y } else { a[0] };
                self.line_to(Point::new(self.state.current_point.x, y));
            }
            CommandKind::CubicTo => {
                let c1 = pt(a[0], a[1]);
                let c2 = pt(a[2], a[3]);
                self.cubic_to(c1, c2, pt(a[4], a[5]));
            }
            CommandKind::SmoothCubic => {
                let c1 = self.state.reflected_control(CurveFamily::Cubic);
                let c2 = pt(a[0], a[1]);
                self.cubic_to(c1, c2, pt(a[2], a[3]));
            }
            CommandKind::QuadTo => {
                let ctrl = pt(a[0], a[1]);
                self.quad_to(ctrl, pt(a[2], a[3]));
            }
            CommandKind::SmoothQuad => {
                let ctrl = self.state.reflected_control(CurveFamily::Quad);
                self.quad_to(ctrl, pt(a[0], a[1]));
            }
            CommandKind::ArcTo => {
                let end = pt(a[5], a[6]);
                self.arc_to(a[0], a[1], a[2], a[3] != 0.0, a[4] != 0.0, end);
            }
            CommandKind::Close => {
                self.geometry.push(PathSegment::Close);
                let start = self.state.subpath_start;
                self.state.settle(start);
            }
        }
    }

    fn line_to(&mut self, p: Point) {
        self.geometry.push(PathSegment::LineTo(p));
        self.state.settle(p);
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) {
        self.geometry.push(PathSegment::CubicTo { c1, c2, to });
        self.state.current_point = to;
        self.state.last_control_point = c2;
        self.state.last_curve = CurveFamily::Cubic;
    }

    fn quad_to(&mut self, ctrl: Point, to: Point) {
        self.geometry.push(PathSegment::QuadTo { ctrl, to });
        self.state.current_point = to;
        self.state.last_control_point = ctrl;
        self.state.last_curve = CurveFamily::Quad;
    }

    fn arc_to(&mut self, rx: f64, ry: f64, rotation: f64, large_arc: bool, sweep: bool, end: Point) {
        let start = self.state.current_point;
        match arc_to_with_epsilon(rx, ry, rotation, large_arc, sweep, start, end, self.config.epsilon) {
            ArcResult::Line(p) => self.geometry.push(PathSegment::LineTo(p)),
            ArcResult::NoOp => {}
            ArcResult::Arc(arc) => match self.config.arc_output {
                ArcOutput::Native => self.geometry.push(PathSegment::ArcTo { arc, to: end }),
                ArcOutput::Cubic => {
                    for c in arc_cubics(&arc, start, end) {
                        self.geometry.push(PathSegment::CubicTo {
                            c1: c.p1,
                            c2: c.p2,
                            to: c.p3,
                        });
                    }
                }
            },
        }
        self.state.settle(end);
    }
}

// ─── Entry points ─────────────────────────────────────────────────────────

/// Parse SVG path data with the default configuration (native arcs).
#[must_use]
pub fn parse_path_data(text: &str) -> PathGeometry {
    parse_path_data_with(text, &PathConfig::default())
}

/// Parse SVG path data with an explicit configuration.
#[must_use]
pub fn parse_path_data_with(text: &str, config: &PathConfig) -> PathGeometry {
    let mut parser = PathParser::new(config.clone());
    parser.feed(text);
    parser.finish()
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn parse_basic_path() {
        let mut parser = PathParser::default();
        parser.feed("M0,0 L10,10 C1,1 2,2 3,3 Z");
        assert_eq!(parser.state().current_point, p(0.0, 0.0));
        assert_eq!(parser.state().last_control_point, p(0.0, 0.0));
        assert_eq!(
            parser.finish().segments(),
            &[
                PathSegment::MoveTo(p(0.0, 0.0)),
                PathSegment::LineTo(p(10.0, 10.0)),
                PathSegment::CubicTo {
                    c1: p(1.0, 1.0),
                    c2: p(2.0, 2.0),
                    to: p(3.0, 3.0),
                },
                PathSegment::Close,
            ]
        );
    }

    #[test]
    fn implicit_repetition() {
        let geom = parse_path_data("L 1,1 2,2 3,3");
        assert_eq!(
            geom.segments(),
            &[
                PathSegment::LineTo(p(1.0, 1.0)),
                PathSegment::LineTo(p(2.0, 2.0)),
                PathSegment::LineTo(p(3.0, 3.0)),
            ]
        );
    }

    #[test]
    fn repeated_move_becomes_line() {
        let geom = parse_path_data("m 1 1 2 2 3 3");
        assert_eq!(
            geom.segments(),
            &[
                PathSegment::MoveTo(p(1.0, 1.0)),
                PathSegment::LineTo(p(3.0, 3.0)),
                PathSegment::LineTo(p(6.0, 6.0)),
            ]
        );
    }

    #[test]
    fn smooth_cubic_reflects_across_chunks() {
        let mut parser = PathParser::default();
        parser.feed("C 0,0 0,10 10,10");
        let before = *parser.state();
        parser.feed("S 20,0 20,10");
        let expected = (before.current_point.to_vec2() * 2.0 - before.last_control_point.to_vec2()).to_point();
        let geom = parser.finish();
        let PathSegment::CubicTo { c1, c2, to } = geom.segments()[1] else {
            panic!("S should emit a cubic");
        };
        assert_eq!(c1, expected);
        assert_eq!(c1, p(20.0, 10.0));
        assert_eq!(c2, p(20.0, 0.0));
        assert_eq!(to, p(20.0, 10.0));
    }

    #[test]
    fn smooth_cubic_after_line_uses_current_point() {
        let geom = parse_path_data("M0 0 L5 5 S10 0 15 5");
        let PathSegment::CubicTo { c1, .. } = geom.segments()[2] else {
            panic!("expected cubic");
        };
        assert_eq!(c1, p(5.0, 5.0));
    }

    #[test]
    fn smooth_quad_does_not_reflect_a_cubic_handle() {
        let geom = parse_path_data("M0 0 C0 5 5 5 10 0 T20 0");
        let PathSegment::QuadTo { ctrl, .. } = geom.segments()[2] else {
            panic!("expected quad");
        };
        assert_eq!(ctrl, p(10.0, 0.0));
    }

    #[test]
    fn smooth_quad_chain() {
        let geom = parse_path_data("M0 0 Q5 10 10 0 T20 0 T30 0");
        let ctrls: Vec<Point> = geom
            .iter()
            .filter_map(|s| match *s {
                PathSegment::QuadTo { ctrl, .. } => Some(ctrl),
                _ => None,
            })
            .collect();
        assert_eq!(ctrls, vec![p(5.0, 10.0), p(15.0, -10.0), p(25.0, 10.0)]);
    }

    #[test]
    fn relative_commands() {
        let geom = parse_path_data("m10 10 h5 v5 l-5 0 z l1 1");
        assert_eq!(
            geom.segments(),
            &[
                PathSegment::MoveTo(p(10.0, 10.0)),
                PathSegment::LineTo(p(15.0, 10.0)),
                PathSegment::LineTo(p(15.0, 15.0)),
                PathSegment::LineTo(p(10.0, 15.0)),
                PathSegment::Close,
                PathSegment::LineTo(p(11.0, 11.0)),
            ]
        );
    }

    #[test]
    fn separator_free_numbers() {
        let geom = parse_path_data("M1.5.5L-1-2");
        assert_eq!(
            geom.segments(),
            &[PathSegment::MoveTo(p(1.5, 0.5)), PathSegment::LineTo(p(-1.0, -2.0))]
        );
    }

    #[test]
    fn incomplete_group_is_dropped() {
        let geom = parse_path_data("M0 0 L10 10 20");
        assert_eq!(geom.len(), 2);
        let geom = parse_path_data("M0 0 C1 1 2 2");
        assert_eq!(geom.segments(), &[PathSegment::MoveTo(p(0.0, 0.0))]);
    }

    #[test]
    fn unknown_commands_and_garbage_are_skipped() {
        let geom = parse_path_data("M0 0 X 5 5 L1 1 # L2 2 ;");
        assert_eq!(
            geom.segments(),
            &[
                PathSegment::MoveTo(p(0.0, 0.0)),
                PathSegment::LineTo(p(1.0, 1.0)),
                PathSegment::LineTo(p(2.0, 2.0)),
            ]
        );
    }

    #[test]
    fn lone_sign_does_not_stall() {
        let geom = parse_path_data("M0 0 L - 5 5");
        assert_eq!(geom.segments().last(), Some(&PathSegment::LineTo(p(5.0, 5.0))));
    }

    #[test]
    fn compact_arc_flags() {
        let geom = parse_path_data("M0 0 a5 5 0 0110 0");
        let PathSegment::ArcTo { arc, to } = geom.segments()[1] else {
            panic!("expected arc, got {:?}", geom.segments());
        };
        assert_eq!(to, p(10.0, 0.0));
        assert!(arc.sweep_flag());
    }

    #[test]
    fn degenerate_arcs() {
        let geom = parse_path_data("M0 0 A0 5 0 0 1 10 0 A5 5 0 0 1 10 0");
        assert_eq!(
            geom.segments(),
            &[PathSegment::MoveTo(p(0.0, 0.0)), PathSegment::LineTo(p(10.0, 0.0))]
        );
    }

    #[test]
    fn near_coincident_arc_moves_the_current_point_to_its_end() {
        let mut parser = PathParser::default();
        parser.feed("M0 0 L10 0 A5 5 0 0 1 10.0000000001 0");
        assert_eq!(parser.state().current_point, p(10.0000000001, 0.0));
        assert_eq!(parser.state().last_control_point, p(10.0000000001, 0.0));
        parser.feed("l1 0");
        let geom = parser.finish();
        assert_eq!(geom.len(), 3);
        let end = geom.segments()[2].end_point().unwrap();
        assert!((end - p(11.0000000001, 0.0)).hypot() < 1e-12);
    }

    #[test]
    fn cubic_arc_output() {
        let config = PathConfig {
            arc_output: ArcOutput::Cubic,
            ..PathConfig::default()
        };
        let geom = parse_path_data_with("M0 0 A10 10 0 1 1 0 20", &config);
        let cubics = geom.iter().filter(|s| matches!(s, PathSegment::CubicTo { .. })).count();
        assert!((1..=4).contains(&cubics));
        assert_eq!(geom.segments().last().and_then(|s| s.end_point()), Some(p(0.0, 20.0)));
    }

    #[test]
    fn arc_leaves_control_point_on_current_point() {
        let mut parser = PathParser::default();
        parser.feed("M0 0 C5 5 5 5 10 0 A5 5 0 0 1 20 0 S 30 5 30 0");
        let geom = parser.finish();
        let PathSegment::CubicTo { c1, .. } = geom.segments()[3] else {
            panic!("expected cubic");
        };
        assert_eq!(c1, p(20.0, 0.0));
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(parse_path_data("").is_empty());
        assert!(parse_path_data("   ,  ").is_empty());
    }
}
