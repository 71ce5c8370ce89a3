pub mod input;
pub mod tools;

pub use input::{InputEvent, Modifiers};
pub use tools::{MAX_SCALE, MIN_SCALE, Tool, ToolKind, TransformTool, gesture_delta};
