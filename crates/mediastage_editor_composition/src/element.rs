// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media element data model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub Uuid);

impl ElementId {
    /// Create a new random element ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque handle to decodable media owned by the media backend.
///
/// Elements only borrow the content behind it; the store hands the handle
/// back to the backend when the element is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceHandle(pub u64);

/// Kind of media an element displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video with its own playback position
    Video,
}

impl MediaKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
        }
    }

    /// Get the placeholder color used when no texture is available
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Image => [100, 150, 255],
            Self::Video => [200, 100, 255],
        }
    }
}

/// Position and size on the stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width, never below the minimum element size
    pub width: f32,
    /// Height, never below the minimum element size
    pub height: f32,
}

impl Geometry {
    /// Create a new geometry
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Top-left corner
    pub fn origin(&self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Bottom-right corner
    pub fn max(&self) -> [f32; 2] {
        [self.x + self.width, self.y + self.height]
    }

    /// Whether a stage point lies inside (edges inclusive)
    pub fn contains(&self, point: [f32; 2]) -> bool {
        let [max_x, max_y] = self.max();
        point[0] >= self.x && point[0] <= max_x && point[1] >= self.y && point[1] <= max_y
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(100.0, 100.0, 320.0, 180.0)
    }
}

/// Interval of the timeline during which an element may render
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First visible time (inclusive)
    pub start_time: f32,
    /// Last visible time (inclusive)
    pub end_time: f32,
}

impl TimeWindow {
    /// Create a new window
    pub fn new(start_time: f32, end_time: f32) -> Self {
        Self { start_time, end_time }
    }

    /// Length of the window, zero when inverted
    pub fn length(&self) -> f32 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Whether start lies after end
    pub fn is_inverted(&self) -> bool {
        self.start_time > self.end_time
    }
}

/// A positioned, timed piece of media on the stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaElement {
    id: ElementId,
    kind: MediaKind,
    source: SourceHandle,
    /// Display label
    pub name: String,
    /// Position and size
    pub geometry: Geometry,
    /// Visibility window
    pub window: TimeWindow,
}

impl MediaElement {
    /// Create a new element with a fresh ID
    pub fn new(
        kind: MediaKind,
        source: SourceHandle,
        name: impl Into<String>,
        geometry: Geometry,
        window: TimeWindow,
    ) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            source,
            name: name.into(),
            geometry,
            window,
        }
    }

    /// Element ID
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Media kind
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Backend handle for the media content
    pub fn source(&self) -> SourceHandle {
        self.source
    }

    /// Whether this element drives a player surface
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// Whether the element is visible at the given clock time
    pub fn is_visible_at(&self, time: f32) -> bool {
        crate::visibility::is_visible(&self.window, time)
    }
}

/// Partial update for a media element. Unset fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementPatch {
    /// New left edge
    pub x: Option<f32>,
    /// New top edge
    pub y: Option<f32>,
    /// New width
    pub width: Option<f32>,
    /// New height
    pub height: Option<f32>,
    /// New window start
    pub start_time: Option<f32>,
    /// New window end
    pub end_time: Option<f32>,
}

impl ElementPatch {
    /// Patch that moves the element
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    /// Patch that resizes the element
    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    /// Patch that replaces the visibility window
    pub fn window(start_time: f32, end_time: f32) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: Some(end_time),
            ..Default::default()
        }
    }

    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
