// SPDX-License-Identifier: MIT OR Apache-2.0
//! `MediaStage` Editor - timeline-synchronized media compositing
//!
//! A single-window editor featuring:
//! - Stage canvas with drag and resize of image/video elements
//! - Shared playback clock with per-element visibility windows
//! - Video preview players kept in sync with the clock
//! - Inspector for exact geometry and timing
//!
//! ## Usage
//!
//! ```text
//! mediastage_editor [FILES...]
//! ```
//!
//! Files given on the command line or dropped onto the window are added to
//! the stage. Settings are read from `mediastage.ron` in the working
//! directory, or the path in `MEDIASTAGE_SETTINGS`.

mod app;
mod backend;
mod panel_types;
mod panels;
mod renderer;

use app::MediaStageApp;
use mediastage_editor_composition::CompositionSettings;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in [
        "mediastage_editor_app=debug",
        "mediastage_editor_composition=debug",
        "wgpu=warn",
        "naga=warn",
    ] {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Bad log directive '{directive}': {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MediaStage Editor v{}", env!("CARGO_PKG_VERSION"));

    let settings = CompositionSettings::load_or_default();
    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    if let Err(e) = MediaStageApp::run(settings, files) {
        tracing::error!("Editor crashed: {e}");
        std::process::exit(1);
    }
}
