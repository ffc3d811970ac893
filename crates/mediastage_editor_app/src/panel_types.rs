// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared panel type definitions.

/// Panel types that can be docked in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelType {
    /// Composition stage
    Stage,
    /// Transport and element windows
    Timeline,
    /// Element property editor
    Inspector,
}

impl PanelType {
    /// Get the display name for this panel type
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stage => "Stage",
            Self::Timeline => "Timeline",
            Self::Inspector => "Inspector",
        }
    }

    /// Get the icon for this panel type
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Stage => "\u{1f5bc}",    // frame
            Self::Timeline => "\u{1f3ac}", // film
            Self::Inspector => "\u{2699}", // cog
        }
    }
}
