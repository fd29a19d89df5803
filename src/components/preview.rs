use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use image::RgbaImage;
use std::ops::Range;

use crate::canvas::{self, STRETCH_HANDLE, TextureCache};
use crate::geometry::GeometryModel;
use crate::ops::compositor::{self, Interpolation, middle_target};
use crate::session::Session;
use crate::settings::{EditorSettings, PREVIEW_SCALE_RANGE};

/// Preview zoom slider range, in percent.
pub const PREVIEW_ZOOM_RANGE: (f32, f32) = (20.0, 300.0);

const PATCH_TINT: Color32 = Color32::from_rgba_premultiplied(6, 49, 25, 64);
const FRAME: Color32 = Color32::from_rgba_premultiplied(153, 153, 153, 153);

/// Inputs the composed preview depends on.
#[derive(Clone, Debug, PartialEq)]
struct PreviewKey {
    generation: u64,
    geometry: GeometryModel,
    scale_x: f32,
    scale_y: f32,
    interpolation: Interpolation,
}

/// Stretched preview panel with scale and zoom sliders.
pub struct PreviewPanel {
    pub scale_x: f32,
    pub scale_y: f32,
    /// Display zoom in percent.
    pub zoom_percent: f32,
    key: Option<PreviewKey>,
    composed: Option<RgbaImage>,
    texture: TextureCache,
    revision: u64,
}

impl PreviewPanel {
    pub fn new(settings: &EditorSettings) -> Self {
        Self {
            scale_x: settings.preview_scale_x,
            scale_y: settings.preview_scale_y,
            zoom_percent: 100.0,
            key: None,
            composed: None,
            texture: TextureCache::default(),
            revision: 0,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, session: &Session, settings: &EditorSettings) {
        ui.label(egui::RichText::new("Preview").strong());
        let (lo, hi) = PREVIEW_SCALE_RANGE;
        ui.add(egui::Slider::new(&mut self.scale_x, lo..=hi).text("Horizontal stretch"));
        ui.add(egui::Slider::new(&mut self.scale_y, lo..=hi).text("Vertical stretch"));
        let (zlo, zhi) = PREVIEW_ZOOM_RANGE;
        ui.add(egui::Slider::new(&mut self.zoom_percent, zlo..=zhi).text("Zoom").suffix("%"));

        let size = settings.preview_size;
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(size), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        canvas::draw_checkerboard(&painter, rect, settings.checkerboard_brightness);

        if let (Some(source), Some(geometry)) = (session.source(), session.geometry()) {
            let key = PreviewKey {
                generation: session.generation(),
                geometry: geometry.clone(),
                scale_x: self.scale_x,
                scale_y: self.scale_y,
                interpolation: settings.interpolation,
            };
            if self.key.as_ref() != Some(&key) {
                self.composed = Some(compositor::compose(
                    source,
                    geometry,
                    self.scale_x,
                    self.scale_y,
                    settings.interpolation,
                ));
                self.key = Some(key);
                self.revision = self.revision.wrapping_add(1);
            }

            if let Some(composed) = &self.composed {
                let zoom = self.zoom_percent / 100.0;
                let dims = composed.dimensions();
                let target = preview_rect(rect, dims, zoom);
                let tex = self.texture.get(ui.ctx(), "nine_patch_preview", self.revision, composed, zoom >= 2.0);
                painter.image(
                    tex.id(),
                    target,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );

                if settings.show_patch {
                    let (xs, ys) = stretched_bands(geometry, self.scale_x, self.scale_y);
                    let to = |x: u32, y: u32| target.min + Vec2::new(x as f32 * zoom, y as f32 * zoom);
                    painter.rect_filled(Rect::from_min_max(to(0, ys.start), to(dims.0, ys.end)), 0.0, PATCH_TINT);
                    painter.rect_filled(Rect::from_min_max(to(xs.start, 0), to(xs.end, dims.1)), 0.0, PATCH_TINT);
                    painter.rect_stroke(target, 0.0, Stroke::new(1.0, STRETCH_HANDLE));
                }

                painter.text(
                    rect.left_bottom() + Vec2::new(6.0, -6.0),
                    egui::Align2::LEFT_BOTTOM,
                    format!("{}×{}px", dims.0, dims.1),
                    egui::FontId::proportional(11.0),
                    Color32::from_gray(60),
                );
            }
        } else {
            self.key = None;
            self.composed = None;
            self.texture.clear();
        }

        painter.rect_stroke(rect, 0.0, Stroke::new(2.0, FRAME));
    }
}

/// Where a `size` image at `zoom` lands, centered in `canvas`.
pub fn preview_rect(canvas: Rect, size: (u32, u32), zoom: f32) -> Rect {
    let scaled = Vec2::new(size.0 as f32 * zoom, size.1 as f32 * zoom);
    Rect::from_center_size(canvas.center(), scaled)
}

/// Column and row ranges of the stretched middle bands in composed-image
/// coordinates.
pub fn stretched_bands(geometry: &GeometryModel, scale_x: f32, scale_y: f32) -> (Range<u32>, Range<u32>) {
    let hs = geometry.h_stretch();
    let vs = geometry.v_stretch();
    let xs = hs.start..hs.start + middle_target(hs.len(), scale_x);
    let ys = vs.start..vs.start + middle_target(vs.len(), scale_y);
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_the_stretched_middle() {
        let g = GeometryModel::with_guides(100, 60, (40, 60), (10, 50), (0, 100), (0, 60));
        let (xs, ys) = stretched_bands(&g, 3.0, 0.5);
        assert_eq!(xs, 40..100);
        assert_eq!(ys, 10..30);
    }

    #[test]
    fn preview_is_centered() {
        let canvas = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::splat(300.0));
        let r = preview_rect(canvas, (100, 50), 2.0);
        assert_eq!(r.min, Pos2::new(50.0, 100.0));
        assert_eq!(r.size(), Vec2::new(200.0, 100.0));
    }
}
