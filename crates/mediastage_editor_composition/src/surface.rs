// SPDX-License-Identifier: MIT OR Apache-2.0
//! Composition surface: owns the stage state and wires its parts together.
//!
//! The surface holds:
//! - The element store and the current selection
//! - The playback clock and the tick task that drives it
//! - The interaction controller for drag/resize sessions
//! - The media sync adapter and the backend owning decoded media
//!
//! Everything runs on one thread; each public method is one discrete event.

use crate::clock::{PlaybackClock, TickOutcome};
use crate::element::{ElementId, ElementPatch, Geometry, MediaElement, MediaKind, SourceHandle};
use crate::error::{CompositionError, Result};
use crate::ingest::{classify_media, default_window};
use crate::interaction::{hit_target, InteractionController, PointerTarget, ReleaseOutcome};
use crate::media_sync::{MediaBackend, MediaSyncAdapter};
use crate::settings::CompositionSettings;
use crate::store::{ElementStore, StoreLimits};
use std::path::Path;
use std::time::{Duration, Instant};

/// Most ticks fired by one pump after a stall
const MAX_CATCH_UP_TICKS: u32 = 8;

/// Notification emitted by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionEvent {
    /// Selection changed (or was re-asserted by an interaction)
    SelectionChanged(Option<ElementId>),
    /// Element added
    ElementAdded(ElementId),
    /// Element removed and its media released
    ElementRemoved(ElementId),
    /// Drag or resize written to the store
    GeometryCommitted(ElementId),
    /// Clock started
    PlaybackStarted,
    /// Clock stopped by the user
    PlaybackStopped,
    /// Clock reached the end of the timeline and rewound
    PlaybackFinished,
}

/// One element as it should be drawn this frame
#[derive(Debug, Clone, Copy)]
pub struct RenderItem<'a> {
    /// Element being drawn
    pub element: &'a MediaElement,
    /// Geometry to draw, including any uncommitted preview
    pub geometry: Geometry,
    /// Whether the element is selected
    pub selected: bool,
    /// Whether a drag/resize session targets the element
    pub interacting: bool,
}

/// Periodic clock tick owned by the surface.
///
/// Once cancelled it never fires again.
#[derive(Debug)]
pub struct TickTask {
    interval: Duration,
    next_fire: Option<Instant>,
    cancelled: bool,
}

impl TickTask {
    /// Create an unarmed task
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_fire: None,
            cancelled: false,
        }
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Next fire time, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.next_fire
    }

    /// Whether the task was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn disarm(&mut self) {
        self.next_fire = None;
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.next_fire = None;
    }

    /// Number of ticks due at `now`, rescheduling the next one
    fn due(&mut self, now: Instant) -> u32 {
        if self.cancelled {
            return 0;
        }
        let Some(mut next) = self.next_fire else {
            self.next_fire = Some(now + self.interval);
            return 0;
        };

        let mut fires = 0;
        while next <= now {
            fires += 1;
            next += self.interval;
            if fires >= MAX_CATCH_UP_TICKS {
                next = now + self.interval;
                break;
            }
        }
        self.next_fire = Some(next);
        fires
    }
}

/// The editing session's stage
#[derive(Debug)]
pub struct CompositionSurface<B: MediaBackend> {
    settings: CompositionSettings,
    store: ElementStore,
    clock: PlaybackClock,
    controller: InteractionController,
    sync: MediaSyncAdapter,
    backend: B,
    ticker: TickTask,
    selected: Option<ElementId>,
    events: Vec<CompositionEvent>,
}

impl<B: MediaBackend> CompositionSurface<B> {
    /// Create an empty surface
    pub fn new(settings: CompositionSettings, backend: B) -> Self {
        let settings = settings.sanitized();
        Self {
            store: ElementStore::new(StoreLimits {
                min_size: settings.min_element_size,
                timeline_duration: settings.timeline_duration,
            }),
            clock: PlaybackClock::new(settings.timeline_duration),
            controller: InteractionController::new(
                settings.min_element_size,
                settings.resume_after_resize,
            ),
            sync: MediaSyncAdapter::new(settings.resync_threshold),
            ticker: TickTask::new(settings.tick_interval()),
            backend,
            selected: None,
            events: Vec::new(),
            settings,
        }
    }

    /// Session settings
    pub fn settings(&self) -> &CompositionSettings {
        &self.settings
    }

    /// Media backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable media backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Playback clock
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Interaction controller
    pub fn interaction(&self) -> &InteractionController {
        &self.controller
    }

    /// Tick task
    pub fn ticker(&self) -> &TickTask {
        &self.ticker
    }

    /// Drain pending notifications
    pub fn take_events(&mut self) -> Vec<CompositionEvent> {
        std::mem::take(&mut self.events)
    }

    // Elements

    /// Add media produced by the backend with the default geometry and window
    pub fn add_media(&mut self, kind: MediaKind, source: SourceHandle, name: impl Into<String>) -> ElementId {
        let element = MediaElement::new(
            kind,
            source,
            name,
            self.settings.default_geometry,
            default_window(kind, &self.settings),
        );
        self.add_element(element)
    }

    /// Add a fully specified element
    pub fn add_element(&mut self, element: MediaElement) -> ElementId {
        tracing::info!("Added {} '{}'", element.kind().name(), element.name);
        let id = self.store.add(element);
        self.events.push(CompositionEvent::ElementAdded(id));
        self.sync_media();
        id
    }

    /// Classify raw file content and add it.
    ///
    /// `load` turns the content into a backend handle; nothing is added if
    /// classification or loading fails.
    pub fn ingest(
        &mut self,
        bytes: &[u8],
        file_name: &str,
        load: impl FnOnce(&mut B, MediaKind, &[u8]) -> Result<SourceHandle>,
    ) -> Result<ElementId> {
        let kind = classify_media(bytes, file_name)?;
        let source = load(&mut self.backend, kind, bytes)?;
        let name = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string();
        Ok(self.add_media(kind, source, name))
    }

    /// Remove an element and release its media
    pub fn remove_element(&mut self, id: ElementId) -> Option<MediaElement> {
        let removed = self.store.remove(id, &mut self.backend)?;
        self.sync.forget(id);
        tracing::info!("Removed {} '{}'", removed.kind().name(), removed.name);
        self.events.push(CompositionEvent::ElementRemoved(id));
        if self.selected == Some(id) {
            self.selected = None;
            self.events.push(CompositionEvent::SelectionChanged(None));
        }
        Some(removed)
    }

    /// Apply a property edit
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> Result<()> {
        self.store.update(id, patch)?;
        self.sync_media();
        Ok(())
    }

    /// Get an element
    pub fn element(&self, id: ElementId) -> Option<&MediaElement> {
        self.store.get(id)
    }

    /// All elements, bottom to top
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &MediaElement> {
        self.store.all()
    }

    /// Number of elements
    pub fn element_count(&self) -> usize {
        self.store.len()
    }

    // Selection

    /// Select an element, or clear the selection
    pub fn select(&mut self, id: Option<ElementId>) -> Result<()> {
        if let Some(id) = id {
            if !self.store.contains(id) {
                return Err(CompositionError::StaleReference(id));
            }
        }
        if self.selected != id {
            self.selected = id;
            self.events.push(CompositionEvent::SelectionChanged(id));
        }
        Ok(())
    }

    /// Selected element ID
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Selected element
    pub fn selected_element(&self) -> Option<&MediaElement> {
        self.selected.and_then(|id| self.store.get(id))
    }

    // Transport

    /// Current clock time
    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    /// Timeline length
    pub fn duration(&self) -> f32 {
        self.clock.duration()
    }

    /// Whether the clock is running
    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Start playback
    pub fn play(&mut self) {
        if self.ticker.is_cancelled() {
            tracing::warn!("Ignoring play after shutdown");
            return;
        }
        if self.clock.start() {
            self.ticker.disarm();
            tracing::info!("Playback started at {:.2}s", self.clock.time());
            self.events.push(CompositionEvent::PlaybackStarted);
            self.sync_media();
        }
    }

    /// Stop playback, keeping the current time
    pub fn pause(&mut self) {
        if self.clock.stop() {
            self.ticker.disarm();
            tracing::info!("Playback stopped at {:.2}s", self.clock.time());
            self.events.push(CompositionEvent::PlaybackStopped);
            self.sync_media();
        }
    }

    /// Toggle playback
    pub fn toggle_playback(&mut self) {
        if self.clock.is_running() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Rewind to zero and stop
    pub fn reset_playback(&mut self) {
        let was_running = self.clock.is_running();
        self.clock.reset();
        self.ticker.disarm();
        if was_running {
            self.events.push(CompositionEvent::PlaybackStopped);
        }
        tracing::info!("Playback reset");
        self.sync_media();
    }

    /// Jump to a time
    pub fn seek(&mut self, time: f32) {
        self.clock.seek(time);
        self.sync_media();
    }

    /// Advance the clock by one scheduler tick
    pub fn tick(&mut self, delta: f32) -> TickOutcome {
        let outcome = self.clock.tick(delta);
        match outcome {
            TickOutcome::Idle => return outcome,
            TickOutcome::Finished => {
                tracing::info!("Reached end of timeline");
                self.ticker.disarm();
                self.events.push(CompositionEvent::PlaybackFinished);
            }
            TickOutcome::Advanced => {}
        }
        self.sync_media();
        outcome
    }

    /// Fire every tick that is due at `now`. Returns the number fired.
    pub fn pump(&mut self, now: Instant) -> u32 {
        if !self.clock.is_running() {
            self.ticker.disarm();
            return 0;
        }

        let due = self.ticker.due(now);
        let delta = self.ticker.interval().as_secs_f32();
        let mut fired = 0;
        for _ in 0..due {
            fired += 1;
            if self.tick(delta) != TickOutcome::Advanced {
                break;
            }
        }
        fired
    }

    /// When the next tick is due, if playing
    pub fn next_tick_deadline(&self) -> Option<Instant> {
        self.ticker.deadline()
    }

    // Pointer

    /// Topmost visible element under a stage point
    pub fn element_at(&self, pointer: [f32; 2]) -> Option<(ElementId, PointerTarget)> {
        let time = self.clock.time();
        let handle = self.settings.resize_handle_size;
        self.store
            .all()
            .rev()
            .filter(|e| e.is_visible_at(time))
            .find_map(|e| hit_target(&e.geometry, pointer, handle).map(|t| (e.id(), t)))
    }

    /// Pointer pressed on the stage. Returns true if a session began.
    pub fn pointer_pressed(&mut self, pointer: [f32; 2]) -> bool {
        if self.controller.is_active() {
            return false;
        }

        let Some((id, target)) = self.element_at(pointer) else {
            if self.selected.is_some() {
                self.selected = None;
                self.events.push(CompositionEvent::SelectionChanged(None));
            }
            return false;
        };
        let Some(element) = self.store.get(id) else {
            return false;
        };

        let started = match target {
            PointerTarget::Body => self.controller.begin_drag(element, pointer),
            PointerTarget::ResizeHandle => {
                self.controller.begin_resize(element, self.clock.is_running())
            }
        };
        if started {
            self.selected = Some(id);
            self.events.push(CompositionEvent::SelectionChanged(Some(id)));
        }
        started
    }

    /// Pointer moved on the stage
    pub fn pointer_moved(&mut self, pointer: [f32; 2]) -> Option<Geometry> {
        self.controller.pointer_moved(pointer)
    }

    /// Pointer released; commits any active session
    pub fn pointer_released(&mut self) -> ReleaseOutcome {
        let outcome = self.controller.release(&mut self.store);
        match outcome {
            ReleaseOutcome::Idle => {}
            ReleaseOutcome::Abandoned(_) => {
                self.events.push(CompositionEvent::SelectionChanged(self.selected));
            }
            ReleaseOutcome::Committed {
                element,
                resume_playback,
                ..
            } => {
                self.events.push(CompositionEvent::GeometryCommitted(element));
                self.events.push(CompositionEvent::SelectionChanged(self.selected));
                if resume_playback {
                    tracing::debug!("Resuming playback after resize");
                    self.play();
                }
            }
        }
        outcome
    }

    /// Abandon any active drag/resize without committing
    pub fn cancel_interaction(&mut self) {
        if let Some(id) = self.controller.cancel() {
            tracing::debug!("Cancelled interaction on {id:?}");
            self.events.push(CompositionEvent::SelectionChanged(self.selected));
        }
    }

    // Rendering

    /// Elements visible at the current time, bottom to top
    pub fn render_list(&self) -> Vec<RenderItem<'_>> {
        let time = self.clock.time();
        self.store
            .all()
            .filter(|e| e.is_visible_at(time))
            .map(|element| {
                let preview = self.controller.preview_for(element.id());
                RenderItem {
                    element,
                    geometry: preview.unwrap_or(element.geometry),
                    selected: self.selected == Some(element.id()),
                    interacting: preview.is_some(),
                }
            })
            .collect()
    }

    fn sync_media(&mut self) {
        self.sync.reconcile_all(
            self.store.all(),
            self.clock.time(),
            self.clock.is_running(),
            &mut self.backend,
        );
    }

    /// Tear the session down: cancel the tick task and release every
    /// element's media. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.ticker.is_cancelled() {
            tracing::info!("Shutting down composition with {} elements", self.store.len());
        }
        self.ticker.cancel();
        self.controller.cancel();
        self.clock.reset();
        self.store.drain_release(&mut self.backend);
        self.sync.clear();
        self.selected = None;
    }
}

impl<B: MediaBackend> Drop for CompositionSurface<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
