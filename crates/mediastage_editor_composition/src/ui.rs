// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage UI rendering.
//!
//! Features:
//! - Canvas with visible elements, selection outline and resize handle
//! - Pointer routing into drag/resize sessions
//! - Transport bar (play/pause, reset, scrub)
//! - Timeline strip with element windows and a draggable playhead

use crate::element::{MediaElement, SourceHandle};
use crate::media_sync::MediaBackend;
use crate::surface::CompositionSurface;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

const ROW_HEIGHT: f32 = 20.0;
const HEADER_HEIGHT: f32 = 24.0;
const LABEL_WIDTH: f32 = 140.0;
const PLAYHEAD_WIDTH: f32 = 2.0;
const SELECTION_COLOR: Color32 = Color32::from_rgb(255, 200, 60);
const PLAYHEAD_COLOR: Color32 = Color32::from_rgb(255, 100, 100);

/// Texture lookup for image media
pub trait StageTextures {
    /// Texture to draw for a source, if one is loaded
    fn texture_for(&self, handle: SourceHandle) -> Option<egui::TextureId>;
}

/// Canvas that draws the stage and feeds pointer input to the surface
#[derive(Debug, Clone)]
pub struct CanvasView {
    /// Stage background
    pub background: Color32,
    /// Show element names on the canvas
    pub show_labels: bool,
    last_rect: Option<Rect>,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasView {
    /// Create a new canvas view
    pub fn new() -> Self {
        Self {
            background: Color32::from_gray(24),
            show_labels: true,
            last_rect: None,
        }
    }

    /// Screen rect the stage occupied last frame
    pub fn last_rect(&self) -> Option<Rect> {
        self.last_rect
    }

    /// Render the stage and route pointer input
    pub fn ui<B>(&mut self, ui: &mut egui::Ui, surface: &mut CompositionSurface<B>)
    where
        B: MediaBackend + StageTextures,
    {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        self.last_rect = Some(rect);

        self.handle_input(ui, rect, surface);

        painter.rect_filled(rect, 0.0, self.background);

        let handle_size = surface.settings().resize_handle_size;
        for item in surface.render_list() {
            let g = item.geometry;
            let element_rect = Rect::from_min_size(
                rect.min + Vec2::new(g.x, g.y),
                Vec2::new(g.width, g.height),
            );

            match surface.backend().texture_for(item.element.source()) {
                Some(texture) => {
                    painter.image(
                        texture,
                        element_rect,
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                None => {
                    let [red, green, blue] = item.element.kind().color();
                    let fill = Color32::from_rgb(red, green, blue).gamma_multiply(0.6);
                    painter.rect_filled(element_rect, 2.0, fill);
                }
            }

            if self.show_labels {
                painter.text(
                    element_rect.min + Vec2::new(4.0, 4.0),
                    egui::Align2::LEFT_TOP,
                    &item.element.name,
                    egui::FontId::proportional(12.0),
                    Color32::WHITE,
                );
            }

            if item.selected {
                let width = if item.interacting { 2.0 } else { 1.5 };
                painter.rect_stroke(element_rect, 0.0, Stroke::new(width, SELECTION_COLOR));
                let handle_rect = Rect::from_min_max(
                    element_rect.max - Vec2::splat(handle_size),
                    element_rect.max,
                );
                painter.rect_filled(handle_rect, 0.0, SELECTION_COLOR);
            }
        }
    }

    /// Translate raw pointer state into surface events
    fn handle_input<B: MediaBackend>(&self, ui: &egui::Ui, rect: Rect, surface: &mut CompositionSurface<B>) {
        let to_stage = |p: Pos2| [p.x - rect.min.x, p.y - rect.min.y];
        let (pressed, released, press_pos, latest_pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
                i.pointer.latest_pos(),
            )
        });

        if pressed {
            if let Some(pos) = press_pos.filter(|p| rect.contains(*p)) {
                surface.pointer_pressed(to_stage(pos));
            }
        }

        // Keys belong to a focused text field, not the stage
        let key_pressed =
            |key: egui::Key| !ui.ctx().wants_keyboard_input() && ui.input(|i| i.key_pressed(key));

        if surface.interaction().is_active() {
            if let Some(pos) = latest_pos {
                surface.pointer_moved(to_stage(pos));
            }
            if key_pressed(egui::Key::Escape) {
                surface.cancel_interaction();
            }
        } else if key_pressed(egui::Key::Delete) {
            if let Some(id) = surface.selected() {
                surface.remove_element(id);
            }
        }

        if released {
            surface.pointer_released();
        }
    }
}

/// Play/pause, reset and scrub controls
pub fn transport_ui<B: MediaBackend>(ui: &mut egui::Ui, surface: &mut CompositionSurface<B>) {
    ui.horizontal(|ui| {
        let play_label = if surface.is_running() { "⏸ Pause" } else { "▶ Play" };
        if ui.button(play_label).on_hover_text("Play/Pause (Space)").clicked() {
            surface.toggle_playback();
        }

        if ui.button("⏮ Reset").on_hover_text("Rewind and stop").clicked() {
            surface.reset_playback();
        }

        ui.separator();
        ui.monospace(format!(
            "{} / {}",
            format_time(surface.time()),
            format_time(surface.duration())
        ));
        ui.separator();

        let mut time = surface.time();
        let slider = egui::Slider::new(&mut time, 0.0..=surface.duration()).show_value(false);
        if ui.add(slider).changed() {
            surface.seek(time);
        }
    });

    if ui.input(|i| i.key_pressed(egui::Key::Space)) && !ui.ctx().wants_keyboard_input() {
        surface.toggle_playback();
    }
}

/// Timeline strip: one row per element showing its window, plus the playhead
pub fn timeline_ui<B: MediaBackend>(ui: &mut egui::Ui, surface: &mut CompositionSurface<B>) {
    let rows = surface.element_count().max(1) as f32;
    let height = HEADER_HEIGHT + rows * ROW_HEIGHT;
    let (response, painter) =
        ui.allocate_painter(Vec2::new(ui.available_width(), height), Sense::click_and_drag());
    let rect = response.rect;

    painter.rect_filled(rect, 0.0, Color32::from_gray(30));

    let duration = surface.duration();
    let track_width = (rect.width() - LABEL_WIDTH).max(1.0);
    let time_to_x = |t: f32| rect.min.x + LABEL_WIDTH + t / duration * track_width;
    let x_to_time = |x: f32| ((x - rect.min.x - LABEL_WIDTH) / track_width * duration).clamp(0.0, duration);

    // Ruler
    let tick_interval = if duration > 120.0 { 10.0 } else if duration > 30.0 { 5.0 } else { 1.0 };
    let mut t = 0.0;
    while t <= duration {
        let x = time_to_x(t);
        painter.line_segment(
            [Pos2::new(x, rect.min.y + HEADER_HEIGHT - 6.0), Pos2::new(x, rect.min.y + HEADER_HEIGHT)],
            Stroke::new(1.0, Color32::from_gray(120)),
        );
        painter.text(
            Pos2::new(x + 2.0, rect.min.y + 2.0),
            egui::Align2::LEFT_TOP,
            format!("{t:.0}s"),
            egui::FontId::monospace(10.0),
            Color32::from_gray(180),
        );
        t += tick_interval;
    }

    let selected = surface.selected();
    let mut y = rect.min.y + HEADER_HEIGHT;
    for element in surface.elements().rev() {
        let row = Rect::from_min_size(Pos2::new(rect.min.x, y), Vec2::new(rect.width(), ROW_HEIGHT));
        draw_row(&painter, row, element, selected == Some(element.id()), &time_to_x);
        y += ROW_HEIGHT;
    }

    // Playhead
    let playhead_x = time_to_x(surface.time());
    painter.line_segment(
        [Pos2::new(playhead_x, rect.min.y), Pos2::new(playhead_x, rect.max.y)],
        Stroke::new(PLAYHEAD_WIDTH, PLAYHEAD_COLOR),
    );

    if response.dragged() || response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            if pos.x >= rect.min.x + LABEL_WIDTH {
                surface.seek(x_to_time(pos.x));
            }
        }
    }
}

fn draw_row(
    painter: &egui::Painter,
    row: Rect,
    element: &MediaElement,
    selected: bool,
    time_to_x: &dyn Fn(f32) -> f32,
) {
    let label_color = if selected { SELECTION_COLOR } else { Color32::from_gray(200) };
    painter.text(
        Pos2::new(row.min.x + 4.0, row.center().y),
        egui::Align2::LEFT_CENTER,
        format!("{} {}", element.kind().name(), element.name),
        egui::FontId::proportional(11.0),
        label_color,
    );

    if element.window.is_inverted() {
        return;
    }
    let [r, g, b] = element.kind().color();
    let bar = Rect::from_min_max(
        Pos2::new(time_to_x(element.window.start_time), row.min.y + 3.0),
        Pos2::new(time_to_x(element.window.end_time), row.max.y - 3.0),
    );
    painter.rect_filled(bar, 3.0, Color32::from_rgb(r, g, b));
    if selected {
        painter.rect_stroke(bar, 3.0, Stroke::new(1.0, SELECTION_COLOR));
    }
}

/// Format seconds as `mm:ss.t`
pub fn format_time(seconds: f32) -> String {
    // Round to tenths first so 59.96 carries into the minute
    let tenths = (seconds.max(0.0) * 10.0).round() as u32;
    let minutes = tenths / 600;
    let secs = (tenths % 600) as f32 / 10.0;
    format!("{minutes:02}:{secs:04.1}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementId, MediaKind};
    use crate::media_sync::PlayerSurface;
    use crate::settings::CompositionSettings;

    #[derive(Debug, Default)]
    struct NoMedia;

    impl MediaBackend for NoMedia {
        fn release(&mut self, _handle: SourceHandle) {}

        fn player(&mut self, _handle: SourceHandle) -> Option<&mut dyn PlayerSurface> {
            None
        }
    }

    impl StageTextures for NoMedia {
        fn texture_for(&self, _handle: SourceHandle) -> Option<egui::TextureId> {
            None
        }
    }

    fn run_frame(
        ctx: &egui::Context,
        view: &mut CanvasView,
        surface: &mut CompositionSurface<NoMedia>,
        events: Vec<egui::Event>,
    ) {
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(1280.0, 720.0))),
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| view.ui(ui, surface));
        });
    }

    /// Frame with a text field in a side panel next to the canvas
    fn run_frame_with_field(
        ctx: &egui::Context,
        view: &mut CanvasView,
        surface: &mut CompositionSurface<NoMedia>,
        text: &mut String,
        focus: bool,
        events: Vec<egui::Event>,
    ) {
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(1280.0, 720.0))),
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::SidePanel::right("fields").show(ctx, |ui| {
                let response = ui.text_edit_singleline(text);
                if focus {
                    response.request_focus();
                }
            });
            egui::CentralPanel::default().show(ctx, |ui| view.ui(ui, surface));
        });
    }

    fn key(key: egui::Key) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }
    }

    fn button(pos: Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    fn setup() -> (CompositionSurface<NoMedia>, ElementId) {
        let mut surface = CompositionSurface::new(CompositionSettings::default(), NoMedia);
        let id = surface.add_media(MediaKind::Image, SourceHandle(1), "photo");
        (surface, id)
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00.0");
        assert_eq!(format_time(75.24), "01:15.2");
        assert_eq!(format_time(59.96), "01:00.0");
        assert_eq!(format_time(119.99), "02:00.0");
        assert_eq!(format_time(-3.0), "00:00.0");
    }

    #[test]
    fn test_canvas_drag_commits() {
        let ctx = egui::Context::default();
        let mut view = CanvasView::new();
        let (mut surface, id) = setup();

        run_frame(&ctx, &mut view, &mut surface, Vec::new());
        let origin = view.last_rect().unwrap().min;

        let press = origin + Vec2::new(150.0, 150.0);
        run_frame(
            &ctx,
            &mut view,
            &mut surface,
            vec![egui::Event::PointerMoved(press), button(press, true)],
        );
        assert!(surface.interaction().is_active());
        assert_eq!(surface.selected(), Some(id));

        let target = origin + Vec2::new(300.0, 300.0);
        run_frame(&ctx, &mut view, &mut surface, vec![egui::Event::PointerMoved(target)]);
        run_frame(&ctx, &mut view, &mut surface, vec![button(target, false)]);

        let geometry = surface.element(id).unwrap().geometry;
        assert!((geometry.x - 250.0).abs() < 0.5);
        assert!((geometry.y - 250.0).abs() < 0.5);
        assert!(!surface.interaction().is_active());
    }

    #[test]
    fn test_hidden_elements_not_drawn_or_hit() {
        let ctx = egui::Context::default();
        let mut view = CanvasView::new();
        let (mut surface, _) = setup();
        surface.seek(20.0);

        run_frame(&ctx, &mut view, &mut surface, Vec::new());
        let press = view.last_rect().unwrap().min + Vec2::new(150.0, 150.0);
        run_frame(
            &ctx,
            &mut view,
            &mut surface,
            vec![egui::Event::PointerMoved(press), button(press, true)],
        );
        assert!(!surface.interaction().is_active());
        assert_eq!(surface.selected(), None);
    }

    #[test]
    fn test_delete_removes_selection() {
        let ctx = egui::Context::default();
        let mut view = CanvasView::new();
        let (mut surface, id) = setup();
        surface.select(Some(id)).unwrap();

        run_frame(&ctx, &mut view, &mut surface, vec![key(egui::Key::Delete)]);
        assert_eq!(surface.element_count(), 0);
        assert_eq!(surface.selected(), None);
    }

    #[test]
    fn test_delete_in_text_field_keeps_element() {
        let ctx = egui::Context::default();
        let mut view = CanvasView::new();
        let (mut surface, id) = setup();
        surface.select(Some(id)).unwrap();
        let mut text = String::from("120");

        run_frame_with_field(&ctx, &mut view, &mut surface, &mut text, true, Vec::new());
        run_frame_with_field(&ctx, &mut view, &mut surface, &mut text, true, Vec::new());
        assert!(ctx.wants_keyboard_input());

        run_frame_with_field(
            &ctx,
            &mut view,
            &mut surface,
            &mut text,
            true,
            vec![key(egui::Key::Delete)],
        );
        assert_eq!(surface.element_count(), 1);
        assert_eq!(surface.selected(), Some(id));
    }

    #[test]
    fn test_timeline_renders() {
        let ctx = egui::Context::default();
        let (mut surface, _) = setup();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                transport_ui(ui, &mut surface);
                timeline_ui(ui, &mut surface);
            });
        });
        assert_eq!(surface.time(), 0.0);
    }
}
