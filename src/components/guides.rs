use eframe::egui;

use crate::geometry::{GeometryModel, GuideKind};
use crate::session::Session;
use crate::settings::EditorSettings;

/// Numeric guide inputs plus overlay toggles.
#[derive(Default)]
pub struct GuidesPanel;

impl GuidesPanel {
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` when any guide changed.
    pub fn show(&mut self, ui: &mut egui::Ui, session: &mut Session, settings: &mut EditorSettings) -> bool {
        ui.horizontal(|ui| {
            ui.checkbox(&mut settings.show_patch, "Show patch");
            ui.checkbox(&mut settings.show_content, "Show content");
        });
        ui.separator();

        let Some(geometry) = session.geometry_mut() else {
            ui.weak("No image loaded");
            return false;
        };

        let mut changed = false;
        ui.label(egui::RichText::new("Stretch (px)").strong());
        changed |= guide_row(ui, geometry, GuideKind::StretchX);
        changed |= guide_row(ui, geometry, GuideKind::StretchY);
        ui.add_space(6.0);
        ui.label(egui::RichText::new("Padding / Content (px)").strong());
        changed |= guide_row(ui, geometry, GuideKind::PadX);
        changed |= guide_row(ui, geometry, GuideKind::PadY);
        ui.add_space(6.0);

        if ui.button("Reset guides").clicked() {
            *geometry = GeometryModel::new(geometry.width(), geometry.height());
            changed = true;
        }
        changed
    }
}

fn guide_row(ui: &mut egui::Ui, geometry: &mut GeometryModel, kind: GuideKind) -> bool {
    let guide = geometry.guide(kind);
    let len = geometry.axis_len(kind);
    let (mut start, mut end) = (guide.start, guide.end);

    let mut edited = false;
    ui.horizontal(|ui| {
        ui.label(kind.label());
        edited |= ui
            .add(egui::DragValue::new(&mut start).clamp_range(0..=len).speed(1).prefix("start "))
            .changed();
        edited |= ui
            .add(egui::DragValue::new(&mut end).clamp_range(0..=len).speed(1).prefix("end "))
            .changed();
        let (lo, hi) = guide.insets(len);
        ui.weak(format!("insets {lo} / {hi}"));
    });

    if !edited {
        return false;
    }
    if start != guide.start {
        geometry.set_start(kind, start as i64);
    }
    if end != guide.end {
        geometry.set_end(kind, end as i64);
    }
    geometry.guide(kind) != guide
}
