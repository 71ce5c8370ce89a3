//! Path-data normalization pipeline: parse → (flatten arcs) → emit.
//!
//! Used to canonicalize `d` attributes written by other tools before they
//! are stored or diffed.

use crate::emitter::{emit_path_data, emit_path_data_relative};
use crate::parser::{ArcOutput, PathConfig, parse_path_data_with};

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for `format_path_data`.
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Replace every arc with cubic Béziers. Default: **false**.
    pub arcs_to_cubics: bool,

    /// Decimal places kept on every operand. Default: **3**.
    pub precision: usize,

    /// Emit lowercase relative commands instead of absolute ones. Default: **false**.
    pub relative: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            arcs_to_cubics: false,
            precision: 3,
            relative: false,
        }
    }
}

// ─── Pipeline ─────────────────────────────────────────────────────────────

/// Parse path data and re-emit it in canonical form.
///
/// Malformed input never fails; whatever geometry was valid is kept.
/// The output is idempotent: `format_path_data(format_path_data(s, c), c) == format_path_data(s, c)`.
#[must_use]
pub fn format_path_data(text: &str, config: &FormatConfig) -> String {
    let path_config = PathConfig {
        arc_output: if config.arcs_to_cubics {
            ArcOutput::Cubic
        } else {
            ArcOutput::Native
        },
        ..PathConfig::default()
    };
    let geom = parse_path_data_with(text, &path_config);
    log::trace!("format_path_data: {} segments", geom.len());

    if config.relative {
        emit_path_data_relative(&geom, config.precision)
    } else {
        emit_path_data(&geom, config.precision)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
