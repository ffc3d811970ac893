// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media type classification and default placement for new media.

use crate::element::{MediaKind, TimeWindow};
use crate::error::{CompositionError, Result};
use crate::settings::CompositionSettings;
use std::path::Path;

/// Video container extensions accepted when content sniffing is inconclusive
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "webm", "mkv", "avi", "ts", "ogv"];

/// Decide whether a file is an image or a video.
///
/// Content is sniffed first; the file name's extension is the fallback.
pub fn classify_media(bytes: &[u8], file_name: &str) -> Result<MediaKind> {
    if image::guess_format(bytes).is_ok() {
        return Ok(MediaKind::Image);
    }
    if is_video_container(bytes) {
        return Ok(MediaKind::Video);
    }

    let path = Path::new(file_name);
    if image::ImageFormat::from_path(path).is_ok() {
        return Ok(MediaKind::Image);
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if let Some(ext) = extension {
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(MediaKind::Video);
        }
    }

    Err(CompositionError::UnsupportedMediaType(file_name.to_string()))
}

/// Check the leading bytes for a known video container signature
fn is_video_container(bytes: &[u8]) -> bool {
    // ISO base media (mp4, mov, m4v): size field then "ftyp"
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return true;
    }
    // Matroska / WebM EBML header
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return true;
    }
    // RIFF AVI
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"AVI " {
        return true;
    }
    // MPEG transport stream: sync byte every 188 bytes
    if bytes.len() >= 377 && bytes[0] == 0x47 && bytes[188] == 0x47 && bytes[376] == 0x47 {
        return true;
    }
    false
}

/// Visibility window for newly added media, anchored at zero
pub fn default_window(kind: MediaKind, settings: &CompositionSettings) -> TimeWindow {
    let length = match kind {
        MediaKind::Image => settings.image_window,
        MediaKind::Video => settings.video_window,
    };
    TimeWindow::new(0.0, length.min(settings.timeline_duration))
}
