// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visibility rule tying elements to the playback clock.

use crate::element::TimeWindow;

/// Whether a window is showing at `time`. Both bounds are inclusive and an
/// inverted window never shows.
pub fn is_visible(window: &TimeWindow, time: f32) -> bool {
    if window.is_inverted() {
        return false;
    }
    time >= window.start_time && time <= window.end_time
}

/// Offset into the element's own media at clock `time`
pub fn local_time(window: &TimeWindow, time: f32) -> f32 {
    (time - window.start_time).max(0.0)
}
