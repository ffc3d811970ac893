// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer-driven move and resize of stage elements.
//!
//! A single controller serves the whole stage, so at most one element is ever
//! mid-interaction. Sessions are plain values: the drag offset or resize
//! origin and the preview geometry live inside the session and are handed
//! to the store exactly once, on release.

use crate::element::{ElementId, ElementPatch, Geometry, MediaElement};
use crate::store::ElementStore;

/// Part of an element under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// Anywhere on the element except the resize handle
    Body,
    /// Bottom-right resize hot-zone
    ResizeHandle,
}

/// Classify a pointer position against an element's geometry
pub fn hit_target(geometry: &Geometry, pointer: [f32; 2], handle_size: f32) -> Option<PointerTarget> {
    if !geometry.contains(pointer) {
        return None;
    }
    let [max_x, max_y] = geometry.max();
    if pointer[0] >= max_x - handle_size && pointer[1] >= max_y - handle_size {
        Some(PointerTarget::ResizeHandle)
    } else {
        Some(PointerTarget::Body)
    }
}

/// Active move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Element being moved
    pub element: ElementId,
    /// Pointer position minus element top-left at press time
    pub offset: [f32; 2],
    /// Uncommitted geometry
    pub preview: Geometry,
}

/// Active resize
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    /// Element being resized
    pub element: ElementId,
    /// Fixed top-left corner
    pub origin: [f32; 2],
    /// Uncommitted geometry
    pub preview: Geometry,
    /// Whether the clock was stopped when the resize began
    pub clock_was_stopped: bool,
}

/// Interaction state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    /// No session
    #[default]
    Idle,
    /// Moving an element
    Dragging(DragSession),
    /// Resizing an element
    Resizing(ResizeSession),
}

/// Result of releasing the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseOutcome {
    /// No session was active
    Idle,
    /// Target element was removed mid-session; nothing was written
    Abandoned(ElementId),
    /// Preview geometry was written to the store
    Committed {
        /// Element that changed
        element: ElementId,
        /// Geometry as stored after the commit
        geometry: Geometry,
        /// Whether the surface should start the clock
        resume_playback: bool,
    },
}

/// Drag/resize state machine
#[derive(Debug)]
pub struct InteractionController {
    state: InteractionState,
    min_size: f32,
    resume_after_resize: bool,
}

impl InteractionController {
    /// Create an idle controller
    pub fn new(min_size: f32, resume_after_resize: bool) -> Self {
        Self {
            state: InteractionState::Idle,
            min_size,
            resume_after_resize,
        }
    }

    /// Current state
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Whether a session is active
    pub fn is_active(&self) -> bool {
        self.state != InteractionState::Idle
    }

    /// Element in the active session
    pub fn active_element(&self) -> Option<ElementId> {
        match &self.state {
            InteractionState::Idle => None,
            InteractionState::Dragging(s) => Some(s.element),
            InteractionState::Resizing(s) => Some(s.element),
        }
    }

    /// Preview geometry for an element, if it is the one being manipulated
    pub fn preview_for(&self, id: ElementId) -> Option<Geometry> {
        match &self.state {
            InteractionState::Dragging(s) if s.element == id => Some(s.preview),
            InteractionState::Resizing(s) if s.element == id => Some(s.preview),
            _ => None,
        }
    }

    /// Begin moving an element. Ignored while another session is active.
    pub fn begin_drag(&mut self, element: &MediaElement, pointer: [f32; 2]) -> bool {
        if self.is_active() {
            tracing::debug!("Ignoring drag press, session already active");
            return false;
        }
        let geometry = element.geometry;
        self.state = InteractionState::Dragging(DragSession {
            element: element.id(),
            offset: [pointer[0] - geometry.x, pointer[1] - geometry.y],
            preview: geometry,
        });
        tracing::debug!("Started drag on '{}'", element.name);
        true
    }

    /// Begin resizing an element. Ignored while another session is active.
    pub fn begin_resize(&mut self, element: &MediaElement, clock_running: bool) -> bool {
        if self.is_active() {
            tracing::debug!("Ignoring resize press, session already active");
            return false;
        }
        let geometry = element.geometry;
        self.state = InteractionState::Resizing(ResizeSession {
            element: element.id(),
            origin: geometry.origin(),
            preview: geometry,
            clock_was_stopped: !clock_running,
        });
        tracing::debug!("Started resize on '{}'", element.name);
        true
    }

    /// Follow the pointer, updating the preview
    pub fn pointer_moved(&mut self, pointer: [f32; 2]) -> Option<Geometry> {
        if !(pointer[0].is_finite() && pointer[1].is_finite()) {
            return None;
        }
        let min_size = self.min_size;
        match &mut self.state {
            InteractionState::Idle => None,
            InteractionState::Dragging(session) => {
                session.preview.x = pointer[0] - session.offset[0];
                session.preview.y = pointer[1] - session.offset[1];
                Some(session.preview)
            }
            InteractionState::Resizing(session) => {
                session.preview.width = (pointer[0] - session.origin[0]).max(min_size);
                session.preview.height = (pointer[1] - session.origin[1]).max(min_size);
                Some(session.preview)
            }
        }
    }

    /// End the session, committing the preview if the element still exists
    pub fn release(&mut self, store: &mut ElementStore) -> ReleaseOutcome {
        let (element, patch, resume_playback) = match std::mem::take(&mut self.state) {
            InteractionState::Idle => return ReleaseOutcome::Idle,
            InteractionState::Dragging(s) => {
                (s.element, ElementPatch::position(s.preview.x, s.preview.y), false)
            }
            InteractionState::Resizing(s) => (
                s.element,
                ElementPatch::size(s.preview.width, s.preview.height),
                s.clock_was_stopped && self.resume_after_resize,
            ),
        };

        match store.update(element, &patch) {
            Ok(updated) => {
                tracing::debug!("Committed geometry for '{}'", updated.name);
                ReleaseOutcome::Committed {
                    element,
                    geometry: updated.geometry,
                    resume_playback,
                }
            }
            Err(_) => {
                tracing::debug!("Element {element:?} removed mid-session, abandoning");
                ReleaseOutcome::Abandoned(element)
            }
        }
    }

    /// Abandon the session without committing
    pub fn cancel(&mut self) -> Option<ElementId> {
        let element = self.active_element();
        self.state = InteractionState::Idle;
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{MediaKind, SourceHandle, TimeWindow};
    use crate::store::tests::RecordingBackend;
    use crate::store::StoreLimits;

    fn store_with_element() -> (ElementStore, ElementId) {
        let mut store = ElementStore::new(StoreLimits {
            min_size: 50.0,
            timeline_duration: 60.0,
        });
        let id = store.add(MediaElement::new(
            MediaKind::Image,
            SourceHandle(1),
            "photo",
            Geometry::new(100.0, 100.0, 200.0, 150.0),
            TimeWindow::new(0.0, 10.0),
        ));
        (store, id)
    }

    #[test]
    fn test_hit_target() {
        let geometry = Geometry::new(100.0, 100.0, 200.0, 150.0);
        assert_eq!(hit_target(&geometry, [150.0, 150.0], 16.0), Some(PointerTarget::Body));
        assert_eq!(
            hit_target(&geometry, [295.0, 245.0], 16.0),
            Some(PointerTarget::ResizeHandle)
        );
        assert_eq!(hit_target(&geometry, [295.0, 150.0], 16.0), Some(PointerTarget::Body));
        assert_eq!(hit_target(&geometry, [50.0, 50.0], 16.0), None);
    }

    #[test]
    fn test_drag_commits_on_release() {
        let (mut store, id) = store_with_element();
        let mut controller = InteractionController::new(50.0, true);

        let element = store.get(id).unwrap().clone();
        assert!(controller.begin_drag(&element, [150.0, 150.0]));
        controller.pointer_moved([200.0, 220.0]);
        controller.pointer_moved([300.0, 300.0]);

        // Store untouched until release
        assert_eq!(store.get(id).unwrap().geometry.x, 100.0);
        assert_eq!(controller.preview_for(id).unwrap().x, 250.0);

        let outcome = controller.release(&mut store);
        let ReleaseOutcome::Committed { geometry, resume_playback, .. } = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!((geometry.x, geometry.y), (250.0, 250.0));
        assert!(!resume_playback);
        assert_eq!(store.get(id).unwrap().geometry.x, 250.0);
        assert_eq!(store.get(id).unwrap().geometry.y, 250.0);
        assert!(!controller.is_active());
    }

    #[test]
    fn test_resize_clamps_to_floor() {
        let (mut store, id) = store_with_element();
        let mut controller = InteractionController::new(50.0, true);

        let element = store.get(id).unwrap().clone();
        controller.begin_resize(&element, true);
        controller.pointer_moved([120.0, 130.0]);

        let outcome = controller.release(&mut store);
        let ReleaseOutcome::Committed { geometry, .. } = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!((geometry.width, geometry.height), (50.0, 50.0));
        assert_eq!((geometry.x, geometry.y), (100.0, 100.0));
    }

    #[test]
    fn test_resize_negative_delta_clamps() {
        let (mut store, id) = store_with_element();
        let mut controller = InteractionController::new(50.0, true);

        let element = store.get(id).unwrap().clone();
        controller.begin_resize(&element, true);
        controller.pointer_moved([-500.0, 20.0]);
        controller.release(&mut store);

        let geometry = store.get(id).unwrap().geometry;
        assert!(geometry.width >= 50.0 && geometry.height >= 50.0);
    }

    #[test]
    fn test_resize_while_stopped_requests_resume() {
        let (mut store, id) = store_with_element();
        let mut controller = InteractionController::new(50.0, true);

        let element = store.get(id).unwrap().clone();
        controller.begin_resize(&element, false);
        controller.pointer_moved([400.0, 400.0]);

        let outcome = controller.release(&mut store);
        assert!(matches!(
            outcome,
            ReleaseOutcome::Committed { resume_playback: true, .. }
        ));
    }

    #[test]
    fn test_resume_policy_can_be_disabled() {
        let (mut store, id) = store_with_element();
        let mut controller = InteractionController::new(50.0, false);

        let element = store.get(id).unwrap().clone();
        controller.begin_resize(&element, false);
        let outcome = controller.release(&mut store);
        assert!(matches!(
            outcome,
            ReleaseOutcome::Committed { resume_playback: false, .. }
        ));
    }

    #[test]
    fn test_second_press_ignored() {
        let (store, id) = store_with_element();
        let mut controller = InteractionController::new(50.0, true);

        let element = store.get(id).unwrap().clone();
        assert!(controller.begin_drag(&element, [150.0, 150.0]));
        assert!(!controller.begin_resize(&element, true));
        assert!(matches!(controller.state(), InteractionState::Dragging(_)));
    }

    #[test]
    fn test_removed_element_abandons() {
        let (mut store, id) = store_with_element();
        let mut backend = RecordingBackend::default();
        let mut controller = InteractionController::new(50.0, true);

        let element = store.get(id).unwrap().clone();
        controller.begin_drag(&element, [150.0, 150.0]);
        controller.pointer_moved([300.0, 300.0]);
        store.remove(id, &mut backend);

        assert_eq!(controller.release(&mut store), ReleaseOutcome::Abandoned(id));
        assert!(store.is_empty());
        assert!(!controller.is_active());
    }

    #[test]
    fn test_release_when_idle() {
        let (mut store, _) = store_with_element();
        let mut controller = InteractionController::new(50.0, true);
        assert_eq!(controller.release(&mut store), ReleaseOutcome::Idle);
        assert_eq!(controller.pointer_moved([1.0, 1.0]), None);
    }

    #[test]
    fn test_cancel_discards_preview() {
        let (mut store, id) = store_with_element();
        let mut controller = InteractionController::new(50.0, true);

        let element = store.get(id).unwrap().clone();
        controller.begin_drag(&element, [150.0, 150.0]);
        controller.pointer_moved([400.0, 400.0]);
        assert_eq!(controller.cancel(), Some(id));
        assert_eq!(controller.release(&mut store), ReleaseOutcome::Idle);
        assert_eq!(store.get(id).unwrap().geometry.x, 100.0);
    }
}
