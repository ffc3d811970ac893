// SPDX-License-Identifier: MIT OR Apache-2.0
//! Main editor application setup and event loop.

use crate::backend::AppMediaBackend;
use crate::panel_types::PanelType;
use crate::panels::InspectorPanel;
use crate::renderer::StageRenderer;
use egui_dock::{DockArea, DockState, NodeIndex, Style, TabViewer};
use egui_wgpu::wgpu;
use mediastage_editor_composition::{
    timeline_ui, transport_ui, CanvasView, CompositionError, CompositionEvent, CompositionSettings,
    CompositionSurface, ElementId,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Editor application errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Composition error
    #[error(transparent)]
    Composition(#[from] CompositionError),
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Tab viewer implementation for `egui_dock`
pub struct StageTabViewer<'a> {
    surface: &'a mut CompositionSurface<AppMediaBackend>,
    canvas: &'a mut CanvasView,
    inspector: &'a mut InspectorPanel,
}

impl TabViewer for StageTabViewer<'_> {
    type Tab = PanelType;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        format!("{} {}", tab.icon(), tab.name()).into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut Self::Tab) {
        match tab {
            PanelType::Stage => self.canvas.ui(ui, self.surface),
            PanelType::Timeline => {
                transport_ui(ui, self.surface);
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| timeline_ui(ui, self.surface));
            }
            PanelType::Inspector => self.inspector.ui(ui, self.surface),
        }
    }

    fn closeable(&mut self, _tab: &mut Self::Tab) -> bool {
        false
    }
}

/// Running state of the editor
struct StageRunning {
    window: Arc<Window>,
    renderer: StageRenderer,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    stage: StageInner,
}

/// Composition session and panels
struct StageInner {
    surface: CompositionSurface<AppMediaBackend>,
    dock_state: DockState<PanelType>,
    canvas: CanvasView,
    inspector: InspectorPanel,
    /// Files waiting to be ingested on the next frame
    pending_files: Vec<PathBuf>,
    /// Last user-facing message
    status: Option<String>,
}

impl StageInner {
    fn new(settings: CompositionSettings, files: Vec<PathBuf>) -> Self {
        Self {
            surface: CompositionSurface::new(settings, AppMediaBackend::new()),
            dock_state: Self::create_default_layout(),
            canvas: CanvasView::new(),
            inspector: InspectorPanel::new(),
            pending_files: files,
            status: None,
        }
    }

    fn create_default_layout() -> DockState<PanelType> {
        let mut dock_state = DockState::new(vec![PanelType::Stage]);
        let surface = dock_state.main_surface_mut();

        let [center, _right] = surface.split_right(NodeIndex::root(), 0.75, vec![PanelType::Inspector]);
        let [_top, _bottom] = surface.split_below(center, 0.7, vec![PanelType::Timeline]);

        dock_state
    }

    /// Read a file from disk and add it to the stage
    fn ingest_file(&mut self, ctx: &egui::Context, path: &Path) -> Result<ElementId> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media")
            .to_string();
        let id = self
            .surface
            .ingest(&bytes, &name, |backend, kind, bytes| backend.load(ctx, kind, bytes, &name))?;
        Ok(id)
    }

    fn ingest_pending(&mut self, ctx: &egui::Context) {
        for path in std::mem::take(&mut self.pending_files) {
            match self.ingest_file(ctx, &path) {
                Ok(_) => self.status = Some(format!("Added {}", path.display())),
                Err(e) => {
                    tracing::error!("Could not add {}: {e}", path.display());
                    self.status = Some(format!("Could not add {}: {e}", path.display()));
                }
            }
        }
    }

    fn drain_events(&mut self) {
        for event in self.surface.take_events() {
            match event {
                CompositionEvent::PlaybackFinished => {
                    self.status = Some("Reached end of timeline".to_string());
                }
                CompositionEvent::GeometryCommitted(id) => {
                    if let Some(element) = self.surface.element(id) {
                        let g = element.geometry;
                        tracing::debug!(
                            "'{}' now at ({:.0}, {:.0}) {:.0}x{:.0}",
                            element.name,
                            g.x,
                            g.y,
                            g.width,
                            g.height
                        );
                    }
                }
                other => tracing::trace!("{other:?}"),
            }
        }
    }

    fn update(&mut self, ctx: &egui::Context) {
        self.ingest_pending(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} elements", self.surface.element_count()));
                ui.separator();
                match &self.status {
                    Some(status) => ui.label(status),
                    None => ui.weak("Drop image or video files onto the window"),
                };
            });
        });

        let mut tab_viewer = StageTabViewer {
            surface: &mut self.surface,
            canvas: &mut self.canvas,
            inspector: &mut self.inspector,
        };

        DockArea::new(&mut self.dock_state)
            .style(Style::from_egui(ctx.style().as_ref()))
            .show(ctx, &mut tab_viewer);

        self.drain_events();
    }
}

/// Main editor application
pub struct MediaStageApp {
    running: Option<StageRunning>,
    /// Consumed when the window is first created
    startup: Option<(CompositionSettings, Vec<PathBuf>)>,
    /// Fatal error raised inside the event loop
    error: Option<AppError>,
}

impl MediaStageApp {
    /// Create a new editor application
    pub fn new(settings: CompositionSettings, files: Vec<PathBuf>) -> Self {
        Self {
            running: None,
            startup: Some((settings, files)),
            error: None,
        }
    }

    /// Run the editor until the window closes
    pub fn run(settings: CompositionSettings, files: Vec<PathBuf>) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = MediaStageApp::new(settings, files);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<StageRunning> {
        tracing::info!("Creating editor window...");

        let window_attrs = Window::default_attributes()
            .with_title("MediaStage Editor")
            .with_inner_size(winit::dpi::LogicalSize::new(1400, 860))
            .with_min_inner_size(winit::dpi::LogicalSize::new(800, 600));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| AppError::WindowCreation(e.to_string()))?,
        );

        tracing::info!("Initializing graphics...");
        let renderer = StageRenderer::new(window.clone())?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024),
        );

        let (settings, files) = self.startup.take().unwrap_or_default();
        let stage = StageInner::new(settings, files);

        tracing::info!("Editor initialized, window size {:?}", window.inner_size());

        Ok(StageRunning {
            window,
            renderer,
            egui_ctx,
            egui_state,
            stage,
        })
    }
}

impl ApplicationHandler for MediaStageApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        if let WindowEvent::DroppedFile(path) = &event {
            tracing::debug!("File dropped: {}", path.display());
            running.stage.pending_files.push(path.clone());
            running.window.request_redraw();
        }

        let response = running.egui_state.on_window_event(&running.window, &event);
        if response.repaint {
            running.window.request_redraw();
        }
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                running.renderer.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| {
                    running.stage.update(ctx);
                });

                running
                    .egui_state
                    .handle_platform_output(&running.window, full_output.platform_output.clone());

                let background = running.stage.canvas.background;
                match running.renderer.present(&running.egui_ctx, full_output, background) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        running.renderer.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                if running.egui_ctx.has_requested_repaint() {
                    running.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };

        if running.stage.surface.pump(Instant::now()) > 0 {
            running.window.request_redraw();
        }

        match running.stage.surface.next_tick_deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &mut self.running {
            running.stage.surface.shutdown();
        }
    }
}
