use egui::{Color32, ColorImage, Pos2, Rect, Sense, Stroke, TextureFilter, TextureHandle, TextureOptions, Vec2};
use image::RgbaImage;

use crate::drag::PointerEvent;
use crate::session::Session;
use crate::settings::EditorSettings;
use crate::transform::DisplayTransform;

pub const STRETCH_FILL: Color32 = Color32::from_rgba_premultiplied(8, 69, 35, 89);
pub const STRETCH_HANDLE: Color32 = Color32::from_rgba_premultiplied(22, 176, 89, 230);
pub const PAD_STROKE: Color32 = Color32::from_rgba_premultiplied(198, 34, 34, 230);
const CONTENT_FILL: Color32 = Color32::from_rgba_premultiplied(15, 15, 15, 15);
const CONTENT_STROKE: Color32 = Color32::from_rgba_premultiplied(31, 31, 31, 31);
const CAPTION: Color32 = Color32::from_rgba_premultiplied(191, 191, 191, 191);

/// Checker cell edge in points.
const CHECKER_CELL: f32 = 10.0;
/// Thickness of the stretch bands drawn along the top and left edges.
const BAND_THICKNESS: f32 = 10.0;

// ============================================================================
// SHARED PAINT HELPERS
// ============================================================================

/// Convert an RGBA buffer for upload as an egui texture.
pub fn rgba_image_to_color_image(img: &RgbaImage) -> ColorImage {
    let size = [img.width() as usize, img.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, img.as_raw())
}

/// Light/dark checkerboard behind transparent pixels, anchored to `rect.min`.
pub fn draw_checkerboard(painter: &egui::Painter, rect: Rect, brightness: f32) {
    let light = Color32::from_gray((245.0 * brightness).clamp(0.0, 255.0) as u8);
    let dark = Color32::from_gray((220.0 * brightness).clamp(0.0, 255.0) as u8);
    painter.rect_filled(rect, 0.0, light);

    let cols = (rect.width() / CHECKER_CELL).ceil() as i32;
    let rows = (rect.height() / CHECKER_CELL).ceil() as i32;
    for y in 0..rows {
        for x in 0..cols {
            if (x + y) % 2 == 0 {
                continue; // light square, already painted
            }
            let cell = Rect::from_min_size(
                Pos2::new(rect.min.x + x as f32 * CHECKER_CELL, rect.min.y + y as f32 * CHECKER_CELL),
                Vec2::splat(CHECKER_CELL),
            );
            painter.rect_filled(cell.intersect(rect), 0.0, dark);
        }
    }
}

pub fn draw_dashed_line(painter: &egui::Painter, a: Pos2, b: Pos2, dash: f32, gap: f32, stroke: Stroke) {
    let dir = b - a;
    let total = dir.length();
    if total < 0.1 {
        return;
    }
    let unit = dir / total;
    let mut t = 0.0;
    while t < total {
        let seg_end = (t + dash).min(total);
        painter.line_segment([a + unit * t, a + unit * seg_end], stroke);
        t += dash + gap;
    }
}

/// Texture for an image that only changes when `generation` does.
#[derive(Default)]
pub struct TextureCache {
    texture: Option<TextureHandle>,
    key: Option<(u64, bool)>,
}

impl TextureCache {
    pub fn get(
        &mut self,
        ctx: &egui::Context,
        name: &str,
        generation: u64,
        image: &RgbaImage,
        nearest: bool,
    ) -> &TextureHandle {
        let options = if nearest {
            TextureOptions {
                magnification: TextureFilter::Nearest,
                minification: TextureFilter::Linear,
                ..Default::default()
            }
        } else {
            TextureOptions::LINEAR
        };
        if self.key != Some((generation, nearest)) {
            self.key = Some((generation, nearest));
            self.texture = None;
        }
        self.texture
            .get_or_insert_with(|| ctx.load_texture(name, rgba_image_to_color_image(image), options))
    }

    pub fn clear(&mut self) {
        self.texture = None;
        self.key = None;
    }
}

// ============================================================================
// POINTER ROUTING
// ============================================================================

/// What egui reported about the primary pointer this frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerFrame {
    pub pos: Option<Pos2>,
    pub pressed: bool,
    /// Primary button held at the end of the frame.
    pub down: bool,
}

/// Translate one frame of pointer input into drag events in viewport-local
/// coordinates. Leaving the canvas while dragging ends the drag.
pub fn pointer_events(frame: PointerFrame, canvas: Rect, dragging: bool) -> Vec<PointerEvent> {
    let mut events = Vec::new();
    let local = frame
        .pos
        .filter(|p| canvas.contains(*p))
        .map(|p| p - canvas.min);

    if frame.pressed
        && let Some(v) = local
    {
        events.push(PointerEvent::Down { x: v.x, y: v.y });
        if !frame.down {
            events.push(PointerEvent::Up);
        }
        return events;
    }
    if !dragging {
        return events;
    }
    match local {
        Some(v) => events.push(PointerEvent::Move { x: v.x, y: v.y }),
        None => {
            events.push(PointerEvent::Leave);
            return events;
        }
    }
    if !frame.down {
        events.push(PointerEvent::Up);
    }
    events
}

// ============================================================================
// EDITOR CANVAS
// ============================================================================

/// Fixed-size square editor: checkerboard, image, guide overlays, handles.
#[derive(Default)]
pub struct EditorCanvas {
    texture: TextureCache,
}

impl EditorCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the editor and feed pointer input to the session. Returns `true`
    /// when a guide moved this frame.
    pub fn show(&mut self, ui: &mut egui::Ui, session: &mut Session, settings: &EditorSettings) -> bool {
        let viewport = settings.viewport_size;
        let (rect, _response) = ui.allocate_exact_size(Vec2::splat(viewport), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_checkerboard(&painter, rect, settings.checkerboard_brightness);

        let Some(transform) = session.transform(viewport) else {
            self.texture.clear();
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open an image to start",
                egui::FontId::proportional(16.0),
                Color32::from_gray(90),
            );
            return false;
        };

        let frame = ui.input(|i| PointerFrame {
            pos: i.pointer.hover_pos(),
            pressed: i.pointer.primary_pressed(),
            down: i.pointer.primary_down(),
        });
        let mut changed = false;
        for event in pointer_events(frame, rect, session.drag.is_dragging()) {
            changed |= session.pointer(event, viewport);
        }

        let generation = session.generation();
        if let Some(source) = session.source() {
            let nearest = transform.zoom >= 2.0;
            let tex = self.texture.get(ui.ctx(), "editor_source", generation, source, nearest);
            let (x, y, w, h) = transform.display_rect();
            let img_rect = Rect::from_min_size(rect.min + Vec2::new(x, y), Vec2::new(w, h));
            painter.image(
                tex.id(),
                img_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        if let Some(geometry) = session.geometry() {
            draw_guides(&painter, rect.min, &transform, geometry, settings);
        }

        let (iw, ih) = transform.image_size();
        painter.text(
            rect.left_bottom() + Vec2::new(8.0, -8.0),
            egui::Align2::LEFT_BOTTOM,
            format!("{}×{}px (zoom {:.0}%)", iw, ih, transform.zoom * 100.0),
            egui::FontId::proportional(12.0),
            CAPTION,
        );

        if session.drag.is_dragging() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }
        changed
    }
}

fn draw_guides(
    painter: &egui::Painter,
    origin: Pos2,
    t: &DisplayTransform,
    geometry: &crate::geometry::GeometryModel,
    settings: &EditorSettings,
) {
    let (ox, oy, disp_w, disp_h) = t.display_rect();
    let at = |x: f32, y: f32| origin + Vec2::new(x, y);
    let px = |v: u32| t.image_to_display_x(v as f32).round();
    let py = |v: u32| t.image_to_display_y(v as f32).round();

    if settings.show_patch {
        // horizontal stretch: band along the top edge
        let hs = geometry.h_stretch();
        let (x0, x1) = (px(hs.start), px(hs.end));
        painter.rect_filled(Rect::from_min_max(at(x0, oy), at(x1, oy + BAND_THICKNESS)), 0.0, STRETCH_FILL);
        for x in [x0, x1] {
            painter.rect_filled(Rect::from_min_size(at(x - 3.0, oy - 3.0), Vec2::new(6.0, 16.0)), 0.0, STRETCH_HANDLE);
        }

        // vertical stretch: band along the left edge
        let vs = geometry.v_stretch();
        let (y0, y1) = (py(vs.start), py(vs.end));
        painter.rect_filled(Rect::from_min_max(at(ox, y0), at(ox + BAND_THICKNESS, y1)), 0.0, STRETCH_FILL);
        for y in [y0, y1] {
            painter.rect_filled(Rect::from_min_size(at(ox - 3.0, y - 3.0), Vec2::new(16.0, 6.0)), 0.0, STRETCH_HANDLE);
        }

        // padding lanes inside the bottom and right edges
        let stroke = Stroke::new(3.0, PAD_STROKE);
        let lane_y = oy + disp_h - crate::drag::PAD_LANE_INSET;
        let hp = geometry.h_pad();
        let (x0, x1) = (px(hp.start), px(hp.end));
        draw_dashed_line(painter, at(x0, lane_y), at(x1, lane_y), 6.0, 4.0, stroke);
        for x in [x0, x1] {
            painter.rect_filled(Rect::from_min_size(at(x - 3.0, lane_y - 6.0), Vec2::new(6.0, 12.0)), 0.0, PAD_STROKE);
        }

        let lane_x = ox + disp_w - crate::drag::PAD_LANE_INSET;
        let vp = geometry.v_pad();
        let (y0, y1) = (py(vp.start), py(vp.end));
        draw_dashed_line(painter, at(lane_x, y0), at(lane_x, y1), 6.0, 4.0, stroke);
        for y in [y0, y1] {
            painter.rect_filled(Rect::from_min_size(at(lane_x - 6.0, y - 3.0), Vec2::new(12.0, 6.0)), 0.0, PAD_STROKE);
        }
    }

    if settings.show_content {
        let hp = geometry.h_pad();
        let vp = geometry.v_pad();
        let content = Rect::from_min_max(at(px(hp.start), py(vp.start)), at(px(hp.end), py(vp.end)));
        painter.rect_filled(content, 0.0, CONTENT_FILL);
        painter.rect_stroke(content, 0.0, Stroke::new(1.0, CONTENT_STROKE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::new(100.0, 50.0), Vec2::splat(620.0))
    }

    #[test]
    fn press_inside_becomes_local_down() {
        let f = PointerFrame { pos: Some(Pos2::new(110.0, 60.0)), pressed: true, down: true };
        assert_eq!(pointer_events(f, canvas(), false), vec![PointerEvent::Down { x: 10.0, y: 10.0 }]);
    }

    #[test]
    fn press_outside_is_ignored() {
        let f = PointerFrame { pos: Some(Pos2::new(10.0, 10.0)), pressed: true, down: true };
        assert!(pointer_events(f, canvas(), false).is_empty());
    }

    #[test]
    fn hover_without_drag_emits_nothing() {
        let f = PointerFrame { pos: Some(Pos2::new(300.0, 300.0)), ..Default::default() };
        assert!(pointer_events(f, canvas(), false).is_empty());
    }

    #[test]
    fn drag_moves_then_releases() {
        let f = PointerFrame { pos: Some(Pos2::new(300.0, 300.0)), pressed: false, down: false };
        assert_eq!(
            pointer_events(f, canvas(), true),
            vec![PointerEvent::Move { x: 200.0, y: 250.0 }, PointerEvent::Up]
        );
    }

    #[test]
    fn click_within_one_frame_does_not_stick() {
        let f = PointerFrame { pos: Some(Pos2::new(110.0, 60.0)), pressed: true, down: false };
        assert_eq!(
            pointer_events(f, canvas(), false),
            vec![PointerEvent::Down { x: 10.0, y: 10.0 }, PointerEvent::Up]
        );
    }

    #[test]
    fn holding_still_keeps_dragging() {
        let f = PointerFrame { pos: Some(Pos2::new(300.0, 300.0)), pressed: false, down: true };
        assert_eq!(pointer_events(f, canvas(), true), vec![PointerEvent::Move { x: 200.0, y: 250.0 }]);
    }

    #[test]
    fn leaving_the_canvas_releases_the_drag() {
        let outside = PointerFrame { pos: Some(Pos2::new(900.0, 300.0)), pressed: false, down: true };
        assert_eq!(pointer_events(outside, canvas(), true), vec![PointerEvent::Leave]);
        let gone = PointerFrame::default();
        assert_eq!(pointer_events(gone, canvas(), true), vec![PointerEvent::Leave]);
    }
}
