//! Transform tools for canvas interactions.
//!
//! A `TransformTool` turns one pointer drag into anchored deltas applied
//! through `Scene::apply_transform`. Every move computes the total delta
//! since pointer-down. Leaves receive the increment since the previous
//! move; groups receive the total, measured from the snapshot taken when
//! the gesture began. Pointer-up commits the group snapshots.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Move | Rotate | Scale | Shear |
//! |----------|------|--------|-------|-------|
//! | **Shift** | Axis-constrain drag | 15° steps | Uniform factor | — |

use crate::input::{InputEvent, Modifiers};
use smallvec::SmallVec;
use std::f64::consts::PI;
use vf_core::kurbo::{Affine, Point, Vec2};
use vf_core::transform::is_invertible;
use vf_core::{AnchorPoint, Scene, ShapeKey, TransformReport};

/// Smallest scale factor a drag can produce.
pub const MIN_SCALE: f64 = 0.01;
/// Largest scale factor a drag can produce.
pub const MAX_SCALE: f64 = 100.0;

const ROTATE_STEP: f64 = PI / 12.0;

/// Offsets from the anchor shorter than this give no rotation, scale or shear.
const DEAD_ZONE: f64 = 1e-6;

/// The active tool determines how a drag is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Move,
    Rotate,
    Scale,
    Shear,
}

/// Trait for tools that handle input by editing the scene.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event against the current selection.
    fn handle(&mut self, scene: &mut Scene, event: &InputEvent, selection: &[ShapeKey]) -> TransformReport;
}

// ─── Gesture delta ───────────────────────────────────────────────────────

/// The un-anchored delta a drag from `start` to `current` describes.
///
/// Rotation, scale and shear are measured relative to `anchor`; the caller
/// applies the result around that same anchor.
pub fn gesture_delta(kind: ToolKind, start: Point, current: Point, anchor: Point, modifiers: Modifiers) -> Affine {
    let from = start - anchor;
    let to = current - anchor;
    match kind {
        ToolKind::Move => {
            let mut d = current - start;
            if modifiers.shift {
                if d.x.abs() > d.y.abs() {
                    d.y = 0.0;
                } else {
                    d.x = 0.0;
                }
            }
            Affine::translate(d)
        }
        ToolKind::Rotate => {
            if from.hypot() < DEAD_ZONE || to.hypot() < DEAD_ZONE {
                return Affine::IDENTITY;
            }
            let mut angle = to.atan2() - from.atan2();
            if modifiers.shift {
                angle = (angle / ROTATE_STEP).round() * ROTATE_STEP;
            }
            Affine::rotate(angle)
        }
        ToolKind::Scale => {
            if modifiers.shift {
                let s = ratio(to.hypot(), from.hypot());
                Affine::scale(s)
            } else {
                Affine::scale_non_uniform(ratio(to.x, from.x), ratio(to.y, from.y))
            }
        }
        ToolKind::Shear => shear_delta(from, current - start),
    }
}

/// `to / from` clamped to the allowed scale range; 1 when `from` is ~0.
fn ratio(to: f64, from: f64) -> f64 {
    if from.abs() < DEAD_ZONE {
        return 1.0;
    }
    (to / from).clamp(MIN_SCALE, MAX_SCALE)
}

/// Shear along the dominant drag axis so the grabbed point follows the
/// pointer along that axis.
fn shear_delta(from: Vec2, drag: Vec2) -> Affine {
    if drag.x.abs() >= drag.y.abs() {
        if from.y.abs() < DEAD_ZONE {
            return Affine::IDENTITY;
        }
        Affine::skew(drag.x / from.y, 0.0)
    } else {
        if from.x.abs() < DEAD_ZONE {
            return Affine::IDENTITY;
        }
        Affine::skew(0.0, drag.y / from.x)
    }
}

// ─── Transform Tool ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Target {
    key: ShapeKey,
    is_group: bool,
}

#[derive(Debug, Clone)]
struct Gesture {
    start: Point,
    anchor: Point,
    targets: SmallVec<[Target; 4]>,
    /// Total delta already applied to the targets.
    applied: Affine,
}

/// Drag tool for move, rotate, scale and shear.
#[derive(Debug, Clone, Default)]
pub struct TransformTool {
    kind: ToolKind,
    /// Where on the selection bounds rotate, scale and shear are anchored.
    /// `Custom` is a scene-space point.
    pub anchor: AnchorPoint,
    gesture: Option<Gesture>,
}

impl TransformTool {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            anchor: AnchorPoint::Center,
            gesture: None,
        }
    }

    /// Switch tool kind. Ignored while a drag is in progress.
    pub fn set_kind(&mut self, kind: ToolKind) {
        if self.gesture.is_some() {
            log::debug!("tool: kind change to {kind:?} ignored mid-gesture");
            return;
        }
        self.kind = kind;
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Scene-space anchor captured at pointer-down.
    pub fn gesture_anchor(&self) -> Option<Point> {
        self.gesture.as_ref().map(|g| g.anchor)
    }

    /// Total delta applied so far in the current gesture.
    pub fn current_delta(&self) -> Option<Affine> {
        self.gesture.as_ref().map(|g| g.applied)
    }

    /// Shapes the gesture moves: each selected key lifted to its outermost
    /// owning group, deduplicated, unknown keys dropped.
    fn resolve_targets(scene: &Scene, selection: &[ShapeKey]) -> SmallVec<[Target; 4]> {
        let mut targets: SmallVec<[Target; 4]> = SmallVec::new();
        for &key in selection {
            if !scene.contains(key) {
                log::debug!("tool: selected {key:?} no longer exists");
                continue;
            }
            let mut top = key;
            let mut hops = 0;
            while let Some(parent) = scene.parent(top)
                && scene.contains(parent)
                && hops < scene.len()
            {
                top = parent;
                hops += 1;
            }
            if targets.iter().all(|t| t.key != top) {
                let is_group = scene.get(top).is_some_and(|n| n.is_group());
                targets.push(Target { key: top, is_group });
            }
        }
        targets
    }

    fn begin(&mut self, scene: &mut Scene, start: Point, selection: &[ShapeKey]) -> TransformReport {
        let mut report = TransformReport::default();
        let targets = Self::resolve_targets(scene, selection);
        if targets.is_empty() {
            self.gesture = None;
            return report;
        }
        // Groups measure their totals from here.
        for target in targets.iter().filter(|t| t.is_group) {
            report.merge(scene.commit_group_transform(target.key));
        }
        let keys: SmallVec<[ShapeKey; 4]> = targets.iter().map(|t| t.key).collect();
        let anchor = match self.anchor {
            AnchorPoint::Custom(p) => p,
            position => scene
                .selection_bounds(&keys)
                .map_or(start, |bounds| position.resolve(bounds)),
        };
        log::debug!("tool: {:?} gesture on {} targets around {anchor:?}", self.kind, targets.len());
        self.gesture = Some(Gesture {
            start,
            anchor,
            targets,
            applied: Affine::IDENTITY,
        });
        report
    }

    fn update(&mut self, scene: &mut Scene, current: Point, modifiers: Modifiers) -> TransformReport {
        let kind = self.kind;
        let Some(gesture) = self.gesture.as_mut() else {
            return TransformReport::default();
        };
        let total = gesture_delta(kind, gesture.start, current, gesture.anchor, modifiers);
        Self::apply_total(scene, gesture, total)
    }

    fn apply_total(scene: &mut Scene, gesture: &mut Gesture, total: Affine) -> TransformReport {
        let mut report = TransformReport::default();
        if !is_invertible(gesture.applied) {
            log::warn!("tool: applied delta is singular; move ignored");
            return report;
        }
        let step = total * gesture.applied.inverse();
        for target in &gesture.targets {
            let delta = if target.is_group { total } else { step };
            report.merge(scene.apply_transform(target.key, delta, Some(gesture.anchor)));
        }
        gesture.applied = total;
        report
    }

    fn finish(&mut self, scene: &mut Scene) -> TransformReport {
        let mut report = TransformReport::default();
        if let Some(gesture) = self.gesture.take() {
            for target in gesture.targets.iter().filter(|t| t.is_group) {
                report.merge(scene.commit_group_transform(target.key));
            }
        }
        report
    }

    /// Undo the in-progress drag and end the gesture.
    pub fn cancel(&mut self, scene: &mut Scene) -> TransformReport {
        let mut report = match self.gesture.as_mut() {
            Some(gesture) => Self::apply_total(scene, gesture, Affine::IDENTITY),
            None => return TransformReport::default(),
        };
        report.merge(self.finish(scene));
        report
    }
}

impl Tool for TransformTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn handle(&mut self, scene: &mut Scene, event: &InputEvent, selection: &[ShapeKey]) -> TransformReport {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                // A lost pointer-up leaves the old drag in place.
                let mut report = self.finish(scene);
                let start = Point::new(f64::from(*x), f64::from(*y));
                report.merge(self.begin(scene, start, selection));
                report
            }
            InputEvent::PointerMove { x, y, modifiers, .. } => {
                self.update(scene, Point::new(f64::from(*x), f64::from(*y)), *modifiers)
            }
            InputEvent::PointerUp { x, y, modifiers } => {
                let mut report = self.update(scene, Point::new(f64::from(*x), f64::from(*y)), *modifiers);
                report.merge(self.finish(scene));
                report
            }
            InputEvent::Key { key, .. } if key == "Escape" => self.cancel(scene),
            InputEvent::Key { .. } => TransformReport::default(),
        }
    }
}
