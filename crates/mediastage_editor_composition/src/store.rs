// SPDX-License-Identifier: MIT OR Apache-2.0
//! Element store: the single source of truth for media elements.

use crate::element::{ElementId, ElementPatch, MediaElement};
use crate::error::{CompositionError, Result};
use crate::media_sync::MediaBackend;
use indexmap::IndexMap;

/// Limits every stored element is held to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreLimits {
    /// Smallest allowed width/height
    pub min_size: f32,
    /// Upper bound for window times
    pub timeline_duration: f32,
}

/// Ordered collection of media elements. Insertion order is z-order.
#[derive(Debug)]
pub struct ElementStore {
    elements: IndexMap<ElementId, MediaElement>,
    limits: StoreLimits,
}

impl ElementStore {
    /// Create an empty store
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            elements: IndexMap::new(),
            limits,
        }
    }

    /// Limits applied on insert and update
    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Add an element on top of the stack, normalizing its fields
    pub fn add(&mut self, mut element: MediaElement) -> ElementId {
        let id = element.id();
        let patch = ElementPatch {
            x: Some(element.geometry.x),
            y: Some(element.geometry.y),
            width: Some(element.geometry.width),
            height: Some(element.geometry.height),
            start_time: Some(element.window.start_time),
            end_time: Some(element.window.end_time),
        };
        apply_patch(&mut element, &patch, self.limits);
        self.elements.insert(id, element);
        id
    }

    /// Apply a partial update.
    ///
    /// Sizes are clamped up to the floor and window times into the timeline;
    /// non-finite values are dropped. Window bounds are never reordered.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> Result<&MediaElement> {
        let limits = self.limits;
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(CompositionError::StaleReference(id))?;
        apply_patch(element, patch, limits);
        Ok(element)
    }

    /// Remove an element, releasing its source handle first
    pub fn remove(&mut self, id: ElementId, backend: &mut dyn MediaBackend) -> Option<MediaElement> {
        let source = self.elements.get(&id)?.source();
        backend.release(source);
        self.elements.shift_remove(&id)
    }

    /// Remove every element, releasing all handles in one pass
    pub fn drain_release(&mut self, backend: &mut dyn MediaBackend) -> usize {
        let count = self.elements.len();
        for (_, element) in self.elements.drain(..) {
            backend.release(element.source());
        }
        count
    }

    /// Get an element
    pub fn get(&self, id: ElementId) -> Option<&MediaElement> {
        self.elements.get(&id)
    }

    /// Whether an element exists
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// All elements, bottom to top
    pub fn all(&self) -> impl DoubleEndedIterator<Item = &MediaElement> {
        self.elements.values()
    }

    /// All element IDs, bottom to top
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys().copied()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn apply_patch(element: &mut MediaElement, patch: &ElementPatch, limits: StoreLimits) {
    let name = element.name.clone();
    let finite = |field: &str, value: Option<f32>| -> Option<f32> {
        match value {
            Some(v) if v.is_finite() => Some(v),
            Some(v) => {
                tracing::warn!("Ignoring non-finite {field} = {v} for '{name}'");
                None
            }
            None => None,
        }
    };

    if let Some(x) = finite("x", patch.x) {
        element.geometry.x = x;
    }
    if let Some(y) = finite("y", patch.y) {
        element.geometry.y = y;
    }
    if let Some(width) = finite("width", patch.width) {
        element.geometry.width = clamp_size(width, limits.min_size);
    }
    if let Some(height) = finite("height", patch.height) {
        element.geometry.height = clamp_size(height, limits.min_size);
    }
    if let Some(start) = finite("start_time", patch.start_time) {
        element.window.start_time = start.clamp(0.0, limits.timeline_duration);
    }
    if let Some(end) = finite("end_time", patch.end_time) {
        element.window.end_time = end.clamp(0.0, limits.timeline_duration);
    }
}

fn clamp_size(value: f32, min_size: f32) -> f32 {
    if value < min_size {
        tracing::debug!("Clamping size {value} to {min_size}");
    }
    value.max(min_size)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::element::{Geometry, MediaKind, SourceHandle, TimeWindow};
    use crate::media_sync::PlayerSurface;

    /// Backend double that records released handles
    #[derive(Debug, Default)]
    pub(crate) struct RecordingBackend {
        pub released: Vec<SourceHandle>,
    }

    impl MediaBackend for RecordingBackend {
        fn release(&mut self, handle: SourceHandle) {
            self.released.push(handle);
        }

        fn player(&mut self, _handle: SourceHandle) -> Option<&mut dyn PlayerSurface> {
            None
        }
    }

    fn limits() -> StoreLimits {
        StoreLimits {
            min_size: 50.0,
            timeline_duration: 60.0,
        }
    }

    fn element(source: u64) -> MediaElement {
        MediaElement::new(
            MediaKind::Image,
            SourceHandle(source),
            format!("element-{source}"),
            Geometry::default(),
            TimeWindow::new(0.0, 10.0),
        )
    }

    #[test]
    fn test_insertion_order_is_z_order() {
        let mut store = ElementStore::new(limits());
        let a = store.add(element(1));
        let b = store.add(element(2));
        let c = store.add(element(3));

        let ids: Vec<_> = store.ids().collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_update_clamps_size() {
        let mut store = ElementStore::new(limits());
        let id = store.add(element(1));

        let updated = store.update(id, &ElementPatch::size(10.0, -40.0)).unwrap();
        assert_eq!(updated.geometry.width, 50.0);
        assert_eq!(updated.geometry.height, 50.0);
    }

    #[test]
    fn test_update_ignores_non_finite() {
        let mut store = ElementStore::new(limits());
        let id = store.add(element(1));

        store
            .update(id, &ElementPatch::position(f32::NAN, 42.0))
            .unwrap();
        let e = store.get(id).unwrap();
        assert_eq!(e.geometry.x, 100.0);
        assert_eq!(e.geometry.y, 42.0);
    }

    #[test]
    fn test_window_not_reordered() {
        let mut store = ElementStore::new(limits());
        let id = store.add(element(1));

        store.update(id, &ElementPatch::window(20.0, 5.0)).unwrap();
        let e = store.get(id).unwrap();
        assert_eq!(e.window.start_time, 20.0);
        assert_eq!(e.window.end_time, 5.0);
        assert!(!e.is_visible_at(10.0));
    }

    #[test]
    fn test_window_clamped_to_timeline() {
        let mut store = ElementStore::new(limits());
        let id = store.add(element(1));

        store.update(id, &ElementPatch::window(-3.0, 500.0)).unwrap();
        let e = store.get(id).unwrap();
        assert_eq!(e.window, TimeWindow::new(0.0, 60.0));
    }

    #[test]
    fn test_add_normalizes_geometry() {
        let mut store = ElementStore::new(limits());
        let mut small = element(1);
        small.geometry = Geometry::new(0.0, 0.0, 5.0, 5.0);
        let id = store.add(small);
        assert_eq!(store.get(id).unwrap().geometry.width, 50.0);
    }

    #[test]
    fn test_update_missing_is_stale() {
        let mut store = ElementStore::new(limits());
        let missing = ElementId::new();
        let err = store.update(missing, &ElementPatch::position(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, CompositionError::StaleReference(id) if id == missing));
    }

    #[test]
    fn test_remove_releases_source() {
        let mut store = ElementStore::new(limits());
        let mut backend = RecordingBackend::default();
        let a = store.add(element(1));
        let b = store.add(element(2));
        let c = store.add(element(3));

        let removed = store.remove(b, &mut backend).unwrap();
        assert_eq!(removed.source(), SourceHandle(2));
        assert_eq!(backend.released, vec![SourceHandle(2)]);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![a, c]);

        assert!(store.remove(b, &mut backend).is_none());
        assert_eq!(backend.released.len(), 1);
    }

    #[test]
    fn test_drain_releases_everything() {
        let mut store = ElementStore::new(limits());
        let mut backend = RecordingBackend::default();
        store.add(element(1));
        store.add(element(2));

        assert_eq!(store.drain_release(&mut backend), 2);
        assert!(store.is_empty());
        assert_eq!(backend.released, vec![SourceHandle(1), SourceHandle(2)]);
    }
}
