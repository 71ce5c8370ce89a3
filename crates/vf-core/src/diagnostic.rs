//! Diagnostics and errors for scene operations.
//!
//! Transform operations are total: anything they had to skip is reported as
//! a `Diagnostic` in the returned `TransformReport`. Structural membership
//! edits (attach, detach, grouping) return `SceneError` instead.

use crate::model::ShapeKey;
use thiserror::Error;

// ─── Diagnostic types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A group lists a child that was destroyed or now belongs elsewhere.
    StaleGroupMember,
    /// A direct transform was requested on a shape owned by a group.
    MembershipLocked,
    /// The key does not refer to a live shape.
    UnknownShape,
    /// A matrix in the shape's parent chain cannot be inverted.
    SingularTransform,
}

/// A single finding from a scene operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The shape this diagnostic refers to.
    pub shape: ShapeKey,
    pub kind: DiagnosticKind,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    pub fn new(shape: ShapeKey, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            shape,
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of `Scene::apply_transform` and friends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformReport {
    /// True when nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{:?} on {:?}: {}", diagnostic.kind, diagnostic.shape, diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    pub fn merge(&mut self, other: TransformReport) {
        self.diagnostics.extend(other.diagnostics);
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────

/// Failure of a membership edit. The scene is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("no shape with key {0:?}")]
    UnknownShape(ShapeKey),
    #[error("shape {0:?} is not a group")]
    NotAGroup(ShapeKey),
    #[error("shape {child:?} already belongs to group {group:?}; detach it first")]
    AlreadyAttached { child: ShapeKey, group: ShapeKey },
    #[error("shape {0:?} is not attached to a group")]
    NotAttached(ShapeKey),
    #[error("attaching {child:?} to {group:?} would make a group contain itself")]
    WouldCycle { child: ShapeKey, group: ShapeKey },
    #[error("shape {0:?} has a singular world transform")]
    SingularTransform(ShapeKey),
}
