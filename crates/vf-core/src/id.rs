//! Shape names.
//!
//! A `ShapeId` is what a document calls a shape: an imported SVG `id`, or a
//! generated `kind_NNNN` name. Ownership and membership never go through
//! names; the arena uses `ShapeKey` for that.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

static NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Process-wide sequence for generated names; starts at 1.
static NEXT_SERIAL: AtomicU32 = AtomicU32::new(1);

/// Interned shape name. `Copy`, 4 bytes, O(1) comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ShapeId(Spur);

impl ShapeId {
    pub fn intern(name: &str) -> Self {
        ShapeId(NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &str {
        NAMES.resolve(&self.0)
    }

    /// Fresh name `{kind}_{serial}` with a zero-padded serial, e.g.
    /// `rect_0007`. Serials are shared by all kinds.
    pub fn generate(kind: &str) -> Self {
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{kind}_{serial:04}"))
    }

    /// The serial of a generated name, `None` for imported names.
    pub fn serial(&self) -> Option<u32> {
        let (kind, digits) = self.as_str().rsplit_once('_')?;
        if kind.is_empty() || digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl From<&str> for ShapeId {
    fn from(name: &str) -> Self {
        Self::intern(name)
    }
}

impl From<String> for ShapeId {
    fn from(name: String) -> Self {
        Self::intern(&name)
    }
}

impl From<ShapeId> for String {
    fn from(id: ShapeId) -> Self {
        id.as_str().to_owned()
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
