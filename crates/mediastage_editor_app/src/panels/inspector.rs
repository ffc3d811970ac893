// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inspector panel - element property editor.

use crate::backend::AppMediaBackend;
use mediastage_editor_composition::{
    CompositionSurface, ElementId, ElementPatch, MediaElement, PlayerSurface,
};

/// The inspector panel for editing the selected element
#[derive(Default)]
pub struct InspectorPanel;

impl InspectorPanel {
    /// Create a new inspector panel
    pub fn new() -> Self {
        Self
    }

    /// Render the inspector panel
    pub fn ui(&mut self, ui: &mut egui::Ui, surface: &mut CompositionSurface<AppMediaBackend>) {
        let Some(element) = surface.selected_element().cloned() else {
            ui.centered_and_justified(|ui| {
                ui.label("No element selected");
            });
            return;
        };
        let id = element.id();

        egui::ScrollArea::vertical().show(ui, |ui| {
            if self.header(ui, surface, &element) {
                return;
            }
            ui.separator();

            let mut patch = ElementPatch::default();
            self.geometry_section(ui, &element, &mut patch);
            self.timing_section(ui, surface.duration(), &element, &mut patch);

            if !patch.is_empty() {
                self.commit(surface, id, &patch);
            }
        });
    }

    fn header(
        &mut self,
        ui: &mut egui::Ui,
        surface: &mut CompositionSurface<AppMediaBackend>,
        element: &MediaElement,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.strong(&element.name);
            ui.label(format!("({})", element.kind().name()));
        });

        let visible = element.is_visible_at(surface.time());
        ui.label(if visible { "Visible now" } else { "Hidden now" });

        if let Some(player) = surface.backend().preview(element.source()) {
            let state = if player.is_playing() { "playing" } else { "paused" };
            ui.label(format!("Player: {} at {:.2}s", state, player.current_time()));
        }

        if ui.button("\u{1f5d1} Remove").clicked() {
            return surface.remove_element(element.id()).is_some();
        }
        false
    }

    fn geometry_section(&mut self, ui: &mut egui::Ui, element: &MediaElement, patch: &mut ElementPatch) {
        let g = element.geometry;
        let (mut x, mut y, mut width, mut height) = (g.x, g.y, g.width, g.height);

        egui::CollapsingHeader::new("Geometry")
            .default_open(true)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Position");
                    if ui.add(egui::DragValue::new(&mut x).speed(1.0).prefix("X: ")).changed() {
                        patch.x = Some(x);
                    }
                    if ui.add(egui::DragValue::new(&mut y).speed(1.0).prefix("Y: ")).changed() {
                        patch.y = Some(y);
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Size");
                    if ui.add(egui::DragValue::new(&mut width).speed(1.0).prefix("W: ")).changed() {
                        patch.width = Some(width);
                    }
                    if ui.add(egui::DragValue::new(&mut height).speed(1.0).prefix("H: ")).changed() {
                        patch.height = Some(height);
                    }
                });
            });
    }

    fn timing_section(
        &mut self,
        ui: &mut egui::Ui,
        duration: f32,
        element: &MediaElement,
        patch: &mut ElementPatch,
    ) {
        let mut start = element.window.start_time;
        let mut end = element.window.end_time;

        egui::CollapsingHeader::new("Timing")
            .default_open(true)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Start");
                    let drag = egui::DragValue::new(&mut start).speed(0.1).range(0.0..=duration).suffix("s");
                    if ui.add(drag).changed() {
                        patch.start_time = Some(start);
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("End");
                    let drag = egui::DragValue::new(&mut end).speed(0.1).range(0.0..=duration).suffix("s");
                    if ui.add(drag).changed() {
                        patch.end_time = Some(end);
                    }
                });
                if element.window.is_inverted() {
                    ui.colored_label(egui::Color32::YELLOW, "End is before start; element never shows");
                }
            });
    }

    fn commit(&self, surface: &mut CompositionSurface<AppMediaBackend>, id: ElementId, patch: &ElementPatch) {
        if let Err(e) = surface.update_element(id, patch) {
            tracing::warn!("Property edit dropped: {e}");
        }
    }
}
