// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media backend for the editor window.
//!
//! Images are decoded once and uploaded as egui textures. Videos get a
//! stopwatch-backed preview player: position advances with wall time while
//! playing, which is all the stage needs to show sync state.

use mediastage_editor_composition::{
    CompositionError, MediaBackend, MediaKind, PlaybackError, PlayerSurface, SourceHandle,
    StageTextures,
};
use std::collections::HashMap;
use std::time::Instant;

/// Stopwatch standing in for a decoded video
#[derive(Debug, Clone, Default)]
pub struct PreviewPlayer {
    /// Position at the last pause/seek
    position: f32,
    /// Set while playing
    playing_since: Option<Instant>,
}

impl PreviewPlayer {
    /// Create a paused player at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the player is advancing
    pub fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }
}

impl PlayerSurface for PreviewPlayer {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.position = self.current_time();
        self.playing_since = None;
    }

    fn seek(&mut self, time: f32) {
        self.position = time.max(0.0);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }

    fn current_time(&self) -> f32 {
        match self.playing_since {
            Some(since) => self.position + since.elapsed().as_secs_f32(),
            None => self.position,
        }
    }
}

/// Owns every texture and player handed to the stage
#[derive(Default)]
pub struct AppMediaBackend {
    next_handle: u64,
    textures: HashMap<SourceHandle, egui::TextureHandle>,
    players: HashMap<SourceHandle, PreviewPlayer>,
}

impl AppMediaBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode content into a new handle
    pub fn load(
        &mut self,
        ctx: &egui::Context,
        kind: MediaKind,
        bytes: &[u8],
        name: &str,
    ) -> Result<SourceHandle, CompositionError> {
        let handle = SourceHandle(self.next_handle);

        match kind {
            MediaKind::Image => {
                let rgba = image::load_from_memory(bytes)?.to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                let texture = ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR);
                tracing::debug!("Uploaded texture for '{}' ({}x{})", name, size[0], size[1]);
                self.textures.insert(handle, texture);
            }
            MediaKind::Video => {
                tracing::debug!("Created preview player for '{}'", name);
                self.players.insert(handle, PreviewPlayer::new());
            }
        }

        self.next_handle += 1;
        Ok(handle)
    }

    /// Number of live handles
    pub fn live_count(&self) -> usize {
        self.textures.len() + self.players.len()
    }

    /// Preview player for a handle
    pub fn preview(&self, handle: SourceHandle) -> Option<&PreviewPlayer> {
        self.players.get(&handle)
    }
}

impl MediaBackend for AppMediaBackend {
    fn release(&mut self, handle: SourceHandle) {
        let freed = self.textures.remove(&handle).is_some() | self.players.remove(&handle).is_some();
        if !freed {
            tracing::warn!("Release of unknown source {:?}", handle);
        }
    }

    fn player(&mut self, handle: SourceHandle) -> Option<&mut dyn PlayerSurface> {
        self.players.get_mut(&handle).map(|p| p as &mut dyn PlayerSurface)
    }
}

impl StageTextures for AppMediaBackend {
    fn texture_for(&self, handle: SourceHandle) -> Option<egui::TextureId> {
        self.textures.get(&handle).map(egui::TextureHandle::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_preview_player_seek_and_pause() {
        let mut player = PreviewPlayer::new();
        player.seek(4.0);
        assert_eq!(player.current_time(), 4.0);

        player.play().unwrap();
        assert!(player.is_playing());
        assert!(player.current_time() >= 4.0);

        player.pause();
        assert!(!player.is_playing());
        let paused_at = player.current_time();
        assert_eq!(player.current_time(), paused_at);

        player.seek(-1.0);
        assert_eq!(player.current_time(), 0.0);
    }

    #[test]
    fn test_load_image_creates_texture() {
        let ctx = egui::Context::default();
        let mut backend = AppMediaBackend::new();
        let handle = backend.load(&ctx, MediaKind::Image, &tiny_png(), "red").unwrap();

        assert!(backend.texture_for(handle).is_some());
        assert!(backend.player(handle).is_none());
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn test_load_video_creates_player() {
        let ctx = egui::Context::default();
        let mut backend = AppMediaBackend::new();
        let first = backend.load(&ctx, MediaKind::Video, b"", "clip").unwrap();
        let second = backend.load(&ctx, MediaKind::Video, b"", "clip2").unwrap();

        assert_ne!(first, second);
        assert!(backend.player(first).is_some());
        assert!(backend.texture_for(first).is_none());
    }

    #[test]
    fn test_corrupt_image_rejected() {
        let ctx = egui::Context::default();
        let mut backend = AppMediaBackend::new();
        let err = backend.load(&ctx, MediaKind::Image, b"\x89PNG\r\n\x1a\ngarbage", "bad").unwrap_err();
        assert!(matches!(err, CompositionError::Decode(_)));
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn test_release_frees_handle() {
        let ctx = egui::Context::default();
        let mut backend = AppMediaBackend::new();
        let image = backend.load(&ctx, MediaKind::Image, &tiny_png(), "red").unwrap();
        let video = backend.load(&ctx, MediaKind::Video, b"", "clip").unwrap();

        backend.release(image);
        backend.release(video);
        assert_eq!(backend.live_count(), 0);
    }
}
