pub mod arc;
pub mod diagnostic;
pub mod emitter;
pub mod format;
pub mod id;
pub mod model;
pub mod parser;
pub mod path;
pub mod scene;
pub mod tokenizer;
pub mod transform;
pub mod transform_attr;

pub use arc::{ArcResult, EllipticalArc, arc_to, arc_to_with_epsilon};
pub use diagnostic::{Diagnostic, DiagnosticKind, SceneError, TransformReport};
pub use emitter::{emit_path_data, emit_path_data_relative};
pub use format::{FormatConfig, format_path_data};
pub use id::ShapeId;
pub use model::*;
pub use parser::{ArcOutput, ParserState, PathConfig, PathParser, parse_path_data, parse_path_data_with};
pub use path::{ControlPoints, PathGeometry, PathSegment, PointKind};
pub use scene::Scene;
pub use transform::{AnchorPoint, Decomposed, anchored, approx_eq, decompose, rotate_around, scale_around, shear_around};
pub use transform_attr::{PreserveAspectRatio, parse_transform, view_box_transform};

// Re-export kurbo so downstream crates share the geometry types
pub use kurbo;
