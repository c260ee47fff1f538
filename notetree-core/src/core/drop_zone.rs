//! Turning pointer geometry into a drop position.
//!
//! The same function runs on every hover event and decides both the visual
//! indicator and, frozen at release time, the structural edit. The pointer
//! tracking itself belongs to the UI layer; it only has to feed
//! [`DropTracker::hover`] and call [`DropTracker::release`] when the button goes up.

use serde::{Deserialize, Serialize};

/// Half-height of the band around a leaf's vertical midpoint that resolves to
/// [`DropPosition::Bottom`].
pub const DEAD_ZONE_PX: f64 = 10.0;

/// A pointer position in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A layout bounding box in client coordinates. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Where a dropped item lands relative to the node under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Immediately before the target, under the target's parent.
    Top,
    /// Immediately after the target, under the target's parent.
    Bottom,
    /// As the last child of the target.
    Child,
}

/// Resolves a hover over `rect` to a drop position.
///
/// Returns `None` when the pointer is outside the box. Folders (targets
/// without a link) always take the drop as a child. For leaves the pointer's
/// offset from the top of the box is compared with half the box height:
/// more than [`DEAD_ZONE_PX`] above it is `Top`, anything else is `Bottom`.
#[must_use]
pub fn resolve_drop(pointer: Point, rect: Rect, target_is_leaf: bool) -> Option<DropPosition> {
    if !rect.contains(pointer) {
        return None;
    }
    if !target_is_leaf {
        return Some(DropPosition::Child);
    }

    let middle = rect.height() / 2.0;
    let offset = pointer.y - rect.top;
    if offset < middle - DEAD_ZONE_PX {
        Some(DropPosition::Top)
    } else {
        Some(DropPosition::Bottom)
    }
}

/// A frozen drop decision: the node under the pointer and where to put the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIntent {
    pub target_id: String,
    pub position: DropPosition,
}

/// Hover state for one drag gesture.
///
/// Each `hover` re-evaluates [`resolve_drop`]; `leave` clears the pending
/// position; `release` hands out whatever was last computed and resets.
#[derive(Debug, Default)]
pub struct DropTracker {
    pending: Option<DropIntent>,
}

impl DropTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-resolves the position for a pointer over `target_id` and returns it for highlighting.
    pub fn hover(
        &mut self,
        target_id: &str,
        pointer: Point,
        rect: Rect,
        target_is_leaf: bool,
    ) -> Option<DropPosition> {
        let position = resolve_drop(pointer, rect, target_is_leaf);
        self.pending = position.map(|position| DropIntent {
            target_id: target_id.to_string(),
            position,
        });
        position
    }

    /// The pointer left the target; nothing is highlighted any more.
    pub fn leave(&mut self) {
        self.pending = None;
    }

    /// The position currently highlighted, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&DropIntent> {
        self.pending.as_ref()
    }

    /// Consumes the last computed position.
    pub fn release(&mut self) -> Option<DropIntent> {
        let intent = self.pending.take();
        log::debug!("drop resolved to {intent:?}");
        intent
    }
}
