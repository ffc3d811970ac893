// SPDX-License-Identifier: MIT OR Apache-2.0
//! Session settings.
//!
//! Settings are stored as RON and cover:
//! - Timeline length
//! - Element size floor and resize handle size
//! - Clock tick interval
//! - Video resync tolerance
//! - Default geometry and visibility windows for new media

use crate::element::Geometry;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings file name looked up in the working directory
pub const SETTINGS_FILE_NAME: &str = "mediastage.ron";

/// Environment variable overriding the settings path
pub const SETTINGS_ENV_VAR: &str = "MEDIASTAGE_SETTINGS";

/// Configuration for one editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionSettings {
    /// Timeline length in seconds
    pub timeline_duration: f32,
    /// Smallest width/height an element may have
    pub min_element_size: f32,
    /// Tolerance in seconds before a video is re-seeked
    pub resync_threshold: f32,
    /// Clock tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Visibility window length for new images
    pub image_window: f32,
    /// Visibility window length for new videos
    pub video_window: f32,
    /// Geometry given to new elements
    pub default_geometry: Geometry,
    /// Side of the bottom-right resize hot-zone
    pub resize_handle_size: f32,
    /// Resume a stopped clock when a resize ends
    pub resume_after_resize: bool,
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            timeline_duration: 60.0,
            min_element_size: 50.0,
            resync_threshold: 0.2,
            tick_interval_ms: 100,
            image_window: 10.0,
            video_window: 30.0,
            default_geometry: Geometry::default(),
            resize_handle_size: 16.0,
            resume_after_resize: true,
        }
    }
}

impl CompositionSettings {
    /// Tick interval as a duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Replace nonsensical values with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(self.timeline_duration.is_finite() && self.timeline_duration > 0.0) {
            tracing::warn!("Invalid timeline duration {}, using default", self.timeline_duration);
            self.timeline_duration = defaults.timeline_duration;
        }
        if !(self.min_element_size.is_finite() && self.min_element_size > 0.0) {
            self.min_element_size = defaults.min_element_size;
        }
        if !(self.resync_threshold.is_finite() && self.resync_threshold >= 0.0) {
            self.resync_threshold = defaults.resync_threshold;
        }
        if self.tick_interval_ms == 0 {
            tracing::warn!("Tick interval of 0ms, using default");
            self.tick_interval_ms = defaults.tick_interval_ms;
        }
        if !(self.image_window.is_finite() && self.image_window >= 0.0) {
            self.image_window = defaults.image_window;
        }
        if !(self.video_window.is_finite() && self.video_window >= 0.0) {
            self.video_window = defaults.video_window;
        }
        if !(self.resize_handle_size.is_finite() && self.resize_handle_size > 0.0) {
            self.resize_handle_size = defaults.resize_handle_size;
        }

        let g = &mut self.default_geometry;
        if ![g.x, g.y, g.width, g.height].iter().all(|v| v.is_finite()) {
            *g = defaults.default_geometry;
        }
        g.width = g.width.max(self.min_element_size);
        g.height = g.height.max(self.min_element_size);

        self
    }

    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        let settings: Self = ron::from_str(text)?;
        Ok(settings.sanitized())
    }

    /// Serialize settings to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Load from `$MEDIASTAGE_SETTINGS` or `./mediastage.ron`, falling back to defaults
    pub fn load_or_default() -> Self {
        let path = std::env::var_os(SETTINGS_ENV_VAR)
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| std::path::PathBuf::from(SETTINGS_FILE_NAME));

        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::error!("Failed to load settings from {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = CompositionSettings::default();
        assert_eq!(settings.min_element_size, 50.0);
        assert_eq!(settings.resync_threshold, 0.2);
        assert_eq!(settings.tick_interval(), Duration::from_millis(100));
        assert_eq!(settings.image_window, 10.0);
        assert_eq!(settings.video_window, 30.0);
        assert!(settings.resume_after_resize);
    }

    #[test]
    fn test_serialization() {
        let settings = CompositionSettings {
            timeline_duration: 90.0,
            ..Default::default()
        };
        let ron_str = settings.to_ron().unwrap();
        let loaded = CompositionSettings::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded = CompositionSettings::from_ron("(timeline_duration: 120.0)").unwrap();
        assert_eq!(loaded.timeline_duration, 120.0);
        assert_eq!(loaded.min_element_size, 50.0);
    }

    #[test]
    fn test_sanitize_invalid_values() {
        let settings = CompositionSettings {
            timeline_duration: -5.0,
            tick_interval_ms: 0,
            default_geometry: Geometry::new(0.0, 0.0, 10.0, 10.0),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.timeline_duration, 60.0);
        assert_eq!(settings.tick_interval_ms, 100);
        assert_eq!(settings.default_geometry.width, 50.0);
        assert_eq!(settings.default_geometry.height, 50.0);
    }

    #[test]
    fn test_malformed_ron_is_error() {
        assert!(CompositionSettings::from_ron("(timeline_duration: \"long\")").is_err());
    }

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("mediastage-{tag}-{}.ron", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_save_load_file() {
        let path = temp_path("roundtrip");
        let settings = CompositionSettings {
            timeline_duration: 45.0,
            resume_after_resize: false,
            ..Default::default()
        };
        settings.save(&path).unwrap();

        let loaded = CompositionSettings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = temp_path("missing");
        assert!(matches!(
            CompositionSettings::load(&path),
            Err(crate::error::CompositionError::Io(_))
        ));
    }

    // Only test that touches the settings env var
    #[test]
    fn test_load_or_default_from_env() {
        let path = temp_path("env");
        std::env::set_var(SETTINGS_ENV_VAR, &path);

        // Missing file
        assert_eq!(CompositionSettings::load_or_default(), CompositionSettings::default());

        // Valid file
        std::fs::write(&path, "(timeline_duration: 75.0)").unwrap();
        assert_eq!(CompositionSettings::load_or_default().timeline_duration, 75.0);

        // Malformed file
        std::fs::write(&path, "(timeline_duration: \"long\"").unwrap();
        assert!(matches!(
            CompositionSettings::load(&path),
            Err(crate::error::CompositionError::Settings(_))
        ));
        assert_eq!(CompositionSettings::load_or_default(), CompositionSettings::default());

        std::env::remove_var(SETTINGS_ENV_VAR);
        std::fs::remove_file(&path).unwrap();
    }
}
