// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline-synchronized media compositing for MediaStage Editor.
//!
//! This crate provides the editor core:
//! - Element store for positioned image/video elements
//! - Shared playback clock and visibility windows
//! - Media sync for video players
//! - Drag and resize interaction
//! - egui canvas, transport and timeline widgets
//!
//! ## Architecture
//!
//! The [`CompositionSurface`] owns every piece of state and is driven by
//! discrete events (pointer, transport, ticks). Media decoding lives behind
//! the [`MediaBackend`] trait so the core runs headless in tests.

pub mod clock;
pub mod element;
pub mod error;
pub mod ingest;
pub mod interaction;
pub mod media_sync;
pub mod settings;
pub mod store;
pub mod surface;
pub mod ui;
pub mod visibility;

pub use clock::{ClockState, PlaybackClock, TickOutcome};
pub use element::{ElementId, ElementPatch, Geometry, MediaElement, MediaKind, SourceHandle, TimeWindow};
pub use error::{CompositionError, Result};
pub use ingest::{classify_media, default_window};
pub use interaction::{
    hit_target, DragSession, InteractionController, InteractionState, PointerTarget, ReleaseOutcome,
    ResizeSession,
};
pub use media_sync::{MediaBackend, MediaSyncAdapter, PlaybackError, PlayerCommand, PlayerSurface, SyncReport};
pub use settings::{CompositionSettings, SETTINGS_ENV_VAR, SETTINGS_FILE_NAME};
pub use store::{ElementStore, StoreLimits};
pub use surface::{CompositionEvent, CompositionSurface, RenderItem, TickTask};
pub use ui::{format_time, timeline_ui, transport_ui, CanvasView, StageTextures};
pub use visibility::{is_visible, local_time};
