//! SVG `transform` attribute and `viewBox` mapping.
//!
//! `parse_transform` is lenient in the same way the path parser is: an
//! unknown function or a function with an unusable argument count is skipped
//! and the rest of the list still applies.

use crate::tokenizer::read_number;
use kurbo::{Affine, Rect, Size, Vec2};
use winnow::ascii::multispace0;
use winnow::combinator::{preceded, repeat};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

// ─── transform="…" ────────────────────────────────────────────────────────

fn separators<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(0.., |c: char| c.is_ascii_whitespace() || c == ',').parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f64> {
    read_number(input).ok_or_else(|| ErrMode::Backtrack(ContextError::new()))
}

/// `name ( n, n … )`
fn function<'a>(input: &mut &'a str) -> ModalResult<(&'a str, Vec<f64>)> {
    let name = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    (multispace0, '(').parse_next(input)?;
    let args: Vec<f64> = repeat(0.., preceded(separators, number)).parse_next(input)?;
    (separators, ')').parse_next(input)?;
    Ok((name, args))
}

/// Matrix for one transform function, or `None` if it cannot be applied.
fn function_matrix(name: &str, args: &[f64]) -> Option<Affine> {
    let m = match (name, args) {
        ("matrix", &[a, b, c, d, e, f]) => Affine::new([a, b, c, d, e, f]),
        ("translate", &[tx]) => Affine::translate((tx, 0.0)),
        ("translate", &[tx, ty]) => Affine::translate((tx, ty)),
        ("scale", &[s]) => Affine::scale(s),
        ("scale", &[sx, sy]) => Affine::scale_non_uniform(sx, sy),
        ("rotate", &[deg]) => Affine::rotate(deg.to_radians()),
        ("rotate", &[deg, cx, cy]) => {
            let c = Vec2::new(cx, cy);
            Affine::translate(c) * Affine::rotate(deg.to_radians()) * Affine::translate(-c)
        }
        ("skewX", &[deg]) => Affine::skew(deg.to_radians().tan(), 0.0),
        ("skewY", &[deg]) => Affine::skew(0.0, deg.to_radians().tan()),
        _ => return None,
    };
    Some(m)
}

/// Parse an SVG `transform` attribute into one matrix.
///
/// Functions compose left to right in authored order, so
/// `"translate(10) scale(2)"` scales first and then translates. Empty or
/// fully unusable input yields the identity.
#[must_use]
pub fn parse_transform(text: &str) -> Affine {
    let mut input = text;
    let mut result = Affine::IDENTITY;

    loop {
        let _ = separators(&mut input);
        if input.is_empty() {
            break;
        }
        let before = input;
        match function(&mut input) {
            Ok((name, args)) => match function_matrix(name, &args) {
                Some(m) => result *= m,
                None => log::debug!("transform: ignoring {name}() with {} arguments", args.len()),
            },
            Err(_) => {
                input = before;
                // Resynchronize after the next closing parenthesis.
                let skip = input.find(')').map_or(input.len(), |i| i + 1);
                log::debug!("transform: skipping malformed {:?}", &input[..skip]);
                input = &input[skip..];
            }
        }
    }
    result
}

// ─── viewBox + preserveAspectRatio ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Min,
    #[default]
    Mid,
    Max,
}

impl Align {
    fn factor(self) -> f64 {
        match self {
            Align::Min => 0.0,
            Align::Mid => 0.5,
            Align::Max => 1.0,
        }
    }

    fn from_keyword(s: &str) -> Option<Align> {
        match s {
            "Min" => Some(Align::Min),
            "Mid" => Some(Align::Mid),
            "Max" => Some(Align::Max),
            _ => None,
        }
    }
}

/// A parsed `preserveAspectRatio` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreserveAspectRatio {
    /// `None` stretches to fill (`none`); otherwise the x and y alignment.
    pub align: Option<(Align, Align)>,
    /// `slice` covers the viewport; `meet` (the default) fits inside it.
    pub slice: bool,
}

impl Default for PreserveAspectRatio {
    fn default() -> Self {
        Self {
            align: Some((Align::Mid, Align::Mid)),
            slice: false,
        }
    }
}

impl PreserveAspectRatio {
    /// Parse `"<align> [meet|slice]"`. Unrecognized parts keep their default.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut out = Self::default();
        let mut parts = text.split_ascii_whitespace();

        if let Some(align) = parts.next() {
            if align == "none" {
                out.align = None;
            } else if let Some(rest) = align.strip_prefix('x')
                && rest.len() == 7
                && rest.is_char_boundary(3)
                && let (Some(x), Some(y)) = (
                    Align::from_keyword(&rest[..3]),
                    rest[3..].strip_prefix('Y').and_then(Align::from_keyword),
                )
            {
                out.align = Some((x, y));
            } else {
                log::debug!("preserveAspectRatio: unknown alignment {align:?}");
            }
        }
        if let Some(mode) = parts.next() {
            out.slice = mode == "slice";
        }
        out
    }
}

/// Map `view_box` user space onto a viewport of `size`.
///
/// A view box with zero or negative extent yields the identity.
#[must_use]
pub fn view_box_transform(size: Size, view_box: Rect, par: PreserveAspectRatio) -> Affine {
    if view_box.width() <= 0.0 || view_box.height() <= 0.0 {
        log::debug!("viewBox {view_box:?} has no extent");
        return Affine::IDENTITY;
    }
    let sx = size.width / view_box.width();
    let sy = size.height / view_box.height();
    let origin = Vec2::new(-view_box.x0, -view_box.y0);

    let Some((ax, ay)) = par.align else {
        return Affine::scale_non_uniform(sx, sy) * Affine::translate(origin);
    };
    let s = if par.slice { sx.max(sy) } else { sx.min(sy) };
    let offset = Vec2::new(
        ax.factor() * (size.width - view_box.width() * s),
        ay.factor() * (size.height - view_box.height() * s),
    );
    Affine::translate(offset) * Affine::scale(s) * Affine::translate(origin)
}
