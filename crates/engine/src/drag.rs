//! Pointer drag tracking and proximity detection for placed instances.

use alchemy_protocol::{Bounds, Element, InstanceId, Position};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Two tiles closer than this (top-left to top-left, which equals
/// center-to-center for same-sized tiles) are fusion candidates.
pub const PROXIMITY_RADIUS: f64 = 60.0;
pub const PROXIMITY_RADIUS_SQUARED: f64 = PROXIMITY_RADIUS * PROXIMITY_RADIUS;

/// Minimum spacing between two hover-target recomputations.
pub const PROXIMITY_INTERVAL_MS: i64 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedInstance {
    pub id: InstanceId,
    pub element: Element,
    pub position: Position,
    pub pending_fusion: bool,
}

/// What the caller should do after feeding a pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    /// No drag is active.
    Ignored,
    /// First move since the last frame: schedule one.
    Schedule,
    /// A frame is already scheduled; it will pick up this pointer.
    Coalesced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub moved: bool,
    pub hover_changed: bool,
}

/// Held by a drag session for as long as the window-level pointer listeners
/// must stay attached. Dropping it detaches them.
#[derive(Debug)]
struct ListenerGuard {
    attached: Arc<AtomicBool>,
}

impl ListenerGuard {
    fn attach(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self {
            attached: Arc::clone(flag),
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.attached.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
struct DragSession {
    instance: InstanceId,
    offset: Position,
    hover: Option<InstanceId>,
    last_committed: Position,
    pending_pointer: Option<Position>,
    last_proximity_ms: Option<i64>,
    _listeners: ListenerGuard,
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
    listeners: Arc<AtomicBool>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<&InstanceId> {
        self.session.as_ref().map(|s| &s.instance)
    }

    pub fn hover_target(&self) -> Option<&InstanceId> {
        self.session.as_ref().and_then(|s| s.hover.as_ref())
    }

    pub fn frame_pending(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.pending_pointer.is_some())
    }

    pub fn listeners_attached(&self) -> bool {
        self.listeners.load(Ordering::Acquire)
    }

    /// Starts dragging `id`. Silently refuses when there is no surface, the
    /// instance is gone, or it is waiting on a fusion.
    pub fn begin(
        &mut self,
        instances: &[PlacedInstance],
        surface: Option<Bounds>,
        id: &InstanceId,
        pointer: Position,
    ) -> bool {
        if surface.is_none() {
            tracing::debug!(instance = %id, "drag ignored: canvas not mounted");
            return false;
        }
        let Some(inst) = instances.iter().find(|i| &i.id == id) else {
            tracing::debug!(instance = %id, "drag ignored: unknown instance");
            return false;
        };
        if inst.pending_fusion {
            tracing::debug!(instance = %id, "drag ignored: fusion pending");
            return false;
        }

        // Replacing a session drops its guard first, then re-attaches.
        self.session = None;
        self.session = Some(DragSession {
            instance: id.clone(),
            offset: pointer.offset_from(inst.position),
            hover: None,
            last_committed: inst.position,
            pending_pointer: None,
            last_proximity_ms: None,
            _listeners: ListenerGuard::attach(&self.listeners),
        });
        tracing::trace!(instance = %id, "drag started");
        true
    }

    pub fn update(&mut self, pointer: Position) -> FrameRequest {
        let Some(session) = self.session.as_mut() else {
            return FrameRequest::Ignored;
        };
        let already = session.pending_pointer.replace(pointer).is_some();
        if already {
            FrameRequest::Coalesced
        } else {
            FrameRequest::Schedule
        }
    }

    /// Applies the coalesced pointer move and, at most every
    /// [`PROXIMITY_INTERVAL_MS`], republishes the hover target.
    pub fn on_frame(
        &mut self,
        instances: &mut [PlacedInstance],
        surface: Bounds,
        now_ms: i64,
    ) -> FrameOutcome {
        let mut out = FrameOutcome::default();
        let Some(session) = self.session.as_mut() else {
            return out;
        };
        let Some(pointer) = session.pending_pointer.take() else {
            return out;
        };
        let Some(idx) = instances.iter().position(|i| i.id == session.instance) else {
            self.cancel();
            return out;
        };

        let next = surface.clamp_tile(pointer.offset_from(session.offset));
        if next != session.last_committed {
            instances[idx].position = next;
            session.last_committed = next;
            out.moved = true;
        }

        let due = session
            .last_proximity_ms
            .map_or(true, |last| now_ms - last >= PROXIMITY_INTERVAL_MS);
        if due {
            let hover = find_hover_target(instances, &session.instance, next);
            out.hover_changed = hover != session.hover;
            session.hover = hover;
            session.last_proximity_ms = Some(now_ms);
        }
        out
    }

    /// Ends the drag at `pointer`. Returns `(dragged, target)` when a valid
    /// hover target was published. The session is always torn down.
    pub fn end(
        &mut self,
        instances: &mut [PlacedInstance],
        surface: Option<Bounds>,
        pointer: Position,
    ) -> Option<(InstanceId, InstanceId)> {
        let session = self.session.take()?;

        if let Some(inst) = instances.iter_mut().find(|i| i.id == session.instance) {
            let released = pointer.offset_from(session.offset);
            inst.position = match surface {
                Some(b) => b.clamp_tile(released),
                None => released,
            };
        } else {
            return None;
        }

        let target = session.hover?;
        let eligible = instances
            .iter()
            .any(|i| i.id == target && !i.pending_fusion);
        eligible.then_some((session.instance, target))
    }

    /// Drops the session, its pending frame and its listeners.
    pub fn cancel(&mut self) {
        if let Some(s) = self.session.take() {
            tracing::trace!(instance = %s.instance, "drag cancelled");
        }
    }
}

/// Nearest other instance within [`PROXIMITY_RADIUS`] of `at`, skipping
/// instances already committed to a fusion. Equal distances keep the
/// earlier instance.
pub fn find_hover_target(
    instances: &[PlacedInstance],
    dragged: &InstanceId,
    at: Position,
) -> Option<InstanceId> {
    let mut best: Option<(&InstanceId, f64)> = None;
    for other in instances {
        if &other.id == dragged || other.pending_fusion {
            continue;
        }
        let d2 = at.distance_squared(other.position);
        if d2 >= PROXIMITY_RADIUS_SQUARED {
            continue;
        }
        if best.map_or(true, |(_, best_d2)| d2 < best_d2) {
            best = Some((&other.id, d2));
        }
    }
    best.map(|(id, _)| id.clone())
}
