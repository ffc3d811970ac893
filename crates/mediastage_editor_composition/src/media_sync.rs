// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keeps video player surfaces in step with the playback clock.
//!
//! Each video element is reconciled on every tick and on every transport
//! change:
//! - play when visible and the timeline is running, pause otherwise
//! - seek to the element-local time when the player has drifted past the
//!   resync threshold
//! - leave hidden players where they are

use crate::element::{ElementId, MediaElement, SourceHandle};
use crate::visibility::{is_visible, local_time};
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by a player surface
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlaybackError {
    /// The surface refused the request
    #[error("Playback refused: {0}")]
    Refused(String),

    /// No player exists for the handle
    #[error("No player for source {0:?}")]
    SourceUnavailable(SourceHandle),
}

/// A decoded video the editor can drive
pub trait PlayerSurface {
    /// Start or resume playback
    fn play(&mut self) -> Result<(), PlaybackError>;
    /// Pause playback, keeping the current position
    fn pause(&mut self);
    /// Jump to a position in seconds
    fn seek(&mut self, time: f32);
    /// Current position in seconds
    fn current_time(&self) -> f32;
}

/// Owner of the media content behind [`SourceHandle`]s
pub trait MediaBackend {
    /// Free the content behind a handle. Called exactly once per element.
    fn release(&mut self, handle: SourceHandle);
    /// Player for a video handle, if one exists
    fn player(&mut self, handle: SourceHandle) -> Option<&mut dyn PlayerSurface>;
}

/// Play state last requested from a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// `play()` was requested
    Play,
    /// `pause()` was requested
    Pause,
}

/// What a reconcile pass did to one player
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SyncReport {
    /// Play/pause command issued, if the desired state changed
    pub command: Option<PlayerCommand>,
    /// Position the player was seeked to, if it had drifted
    pub seeked_to: Option<f32>,
}

/// Reconciles video players against the clock
#[derive(Debug)]
pub struct MediaSyncAdapter {
    resync_threshold: f32,
    last_command: HashMap<ElementId, PlayerCommand>,
}

impl MediaSyncAdapter {
    /// Create an adapter with the given resync tolerance in seconds
    pub fn new(resync_threshold: f32) -> Self {
        Self {
            resync_threshold,
            last_command: HashMap::new(),
        }
    }

    /// Resync tolerance in seconds
    pub fn resync_threshold(&self) -> f32 {
        self.resync_threshold
    }

    /// Last command issued for an element
    pub fn last_command(&self, id: ElementId) -> Option<PlayerCommand> {
        self.last_command.get(&id).copied()
    }

    /// Bring one video element's player in line with the clock.
    ///
    /// Image elements are ignored and produce an empty report.
    pub fn reconcile(
        &mut self,
        element: &MediaElement,
        clock_time: f32,
        timeline_running: bool,
        player: &mut dyn PlayerSurface,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        if !element.is_video() {
            return report;
        }

        let visible = is_visible(&element.window, clock_time);
        let desired = if visible && timeline_running {
            PlayerCommand::Play
        } else {
            PlayerCommand::Pause
        };

        if self.last_command.get(&element.id()) != Some(&desired) {
            match desired {
                PlayerCommand::Play => {
                    if let Err(e) = player.play() {
                        tracing::warn!("Player for '{}' refused to start: {e}", element.name);
                    }
                }
                PlayerCommand::Pause => player.pause(),
            }
            // Remembered even on failure so the next retry waits for a state change.
            self.last_command.insert(element.id(), desired);
            report.command = Some(desired);
        }

        if visible {
            let target = local_time(&element.window, clock_time);
            let drift = (player.current_time() - target).abs();
            if drift > self.resync_threshold {
                tracing::debug!(
                    "Resyncing '{}' to {target:.2}s (drift {drift:.2}s)",
                    element.name
                );
                player.seek(target);
                report.seeked_to = Some(target);
            }
        }

        report
    }

    /// Reconcile every video element, looking players up in the backend
    pub fn reconcile_all<'a>(
        &mut self,
        elements: impl Iterator<Item = &'a MediaElement>,
        clock_time: f32,
        timeline_running: bool,
        backend: &mut dyn MediaBackend,
    ) {
        for element in elements.filter(|e| e.is_video()) {
            match backend.player(element.source()) {
                Some(player) => {
                    self.reconcile(element, clock_time, timeline_running, player);
                }
                None => {
                    if self.last_command.insert(element.id(), PlayerCommand::Pause).is_none() {
                        tracing::warn!(
                            "{}",
                            PlaybackError::SourceUnavailable(element.source())
                        );
                    }
                }
            }
        }
    }

    /// Drop remembered state for a removed element
    pub fn forget(&mut self, id: ElementId) {
        self.last_command.remove(&id);
    }

    /// Drop all remembered state
    pub fn clear(&mut self) {
        self.last_command.clear();
    }
}
