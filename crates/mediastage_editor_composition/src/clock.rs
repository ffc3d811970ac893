// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback clock shared by every element on the stage.

/// Clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    /// Not advancing
    #[default]
    Stopped,
    /// Advancing on every tick
    Running,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock was stopped or the delta was unusable
    Idle,
    /// Time moved forward
    Advanced,
    /// End of the timeline was reached; time rewound to zero and the clock stopped
    Finished,
}

/// Single scalar timeline clock bounded to `[0, duration]`.
///
/// Reaching the end never loops: the clock rewinds to zero and stops.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    time: f32,
    state: ClockState,
    duration: f32,
}

impl PlaybackClock {
    /// Create a stopped clock at time zero
    pub fn new(duration: f32) -> Self {
        Self {
            time: 0.0,
            state: ClockState::Stopped,
            duration,
        }
    }

    /// Current time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Timeline length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Current state
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Whether the clock is advancing
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Fraction of the timeline elapsed
    pub fn progress(&self) -> f32 {
        self.time / self.duration
    }

    /// Start advancing. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = ClockState::Running;
        tracing::debug!("Clock started at {:.2}s", self.time);
        true
    }

    /// Stop advancing, keeping the current time. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = ClockState::Stopped;
        tracing::debug!("Clock stopped at {:.2}s", self.time);
        true
    }

    /// Toggle between running and stopped
    pub fn toggle(&mut self) {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Rewind to zero and stop
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.state = ClockState::Stopped;
        tracing::debug!("Clock reset");
    }

    /// Jump to a time, clamped to the timeline. Does not change the state.
    pub fn seek(&mut self, time: f32) {
        if !time.is_finite() {
            tracing::warn!("Ignoring seek to {time}");
            return;
        }
        self.time = time.clamp(0.0, self.duration);
    }

    /// Advance by `delta` seconds while running
    pub fn tick(&mut self, delta: f32) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }
        if !(delta.is_finite() && delta >= 0.0) {
            tracing::warn!("Ignoring tick of {delta}s");
            return TickOutcome::Idle;
        }

        self.time += delta;
        if self.time >= self.duration {
            self.time = 0.0;
            self.state = ClockState::Stopped;
            tracing::debug!("Clock reached end of timeline, rewinding");
            return TickOutcome::Finished;
        }
        TickOutcome::Advanced
    }
}
