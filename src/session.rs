use image::RgbaImage;
use std::path::{Path, PathBuf};

use crate::drag::{DragController, PointerEvent};
use crate::geometry::GeometryModel;
use crate::io::SaveFormat;
use crate::ops::export::{self, ExportError, ExportMode};
use crate::transform::{self, DisplayTransform};

/// Result of a successful export: encoded bytes and the conventional name.
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Single editing session: one source bitmap and the guides drawn over it.
///
/// A new load replaces everything; there is no history and no multi-image
/// state.
pub struct Session {
    source: Option<RgbaImage>,
    geometry: Option<GeometryModel>,
    pub drag: DragController,
    zoom: f32,
    /// `None` until something is loaded from disk.
    pub path: Option<PathBuf>,
    /// Display name (file name or "Untitled")
    pub name: String,
    /// Bumped on every load so UI caches know to rebuild textures.
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            source: None,
            geometry: None,
            drag: DragController::new(),
            zoom: 1.0,
            path: None,
            name: "Untitled".to_string(),
            generation: 0,
        }
    }

    /// Replace the source. Guides go back to defaults, any drag is dropped and
    /// the zoom is fitted to `viewport`.
    pub fn load(&mut self, image: RgbaImage, path: Option<PathBuf>, viewport: f32) {
        let (w, h) = image.dimensions();
        self.geometry = Some(GeometryModel::new(w, h));
        self.zoom = transform::fit_zoom(w, h, viewport);
        self.drag.reset();
        self.name = path
            .as_deref()
            .and_then(Path::file_name)
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());
        self.path = path;
        self.source = Some(image);
        self.generation = self.generation.wrapping_add(1);
        crate::log_info!("Loaded '{}' ({}x{}), zoom {:.2}", self.name, w, h, self.zoom);
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<&RgbaImage> {
        self.source.as_ref()
    }

    pub fn geometry(&self) -> Option<&GeometryModel> {
        self.geometry.as_ref()
    }

    pub fn geometry_mut(&mut self) -> Option<&mut GeometryModel> {
        self.geometry.as_mut()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = transform::clamp_zoom(zoom);
    }

    pub fn fit_zoom(&mut self, viewport: f32) {
        if let Some(img) = &self.source {
            self.zoom = transform::fit_zoom(img.width(), img.height(), viewport);
        }
    }

    /// Current display mapping, `None` with nothing loaded.
    pub fn transform(&self, viewport: f32) -> Option<DisplayTransform> {
        let img = self.source.as_ref()?;
        Some(DisplayTransform::new(img.width(), img.height(), self.zoom, viewport))
    }

    /// Route a pointer event to the drag controller. Returns `true` when a
    /// guide moved.
    pub fn pointer(&mut self, event: PointerEvent, viewport: f32) -> bool {
        let Some(transform) = self.transform(viewport) else {
            return false;
        };
        match self.geometry.as_mut() {
            Some(geometry) => self.drag.handle_event(event, geometry, &transform),
            None => false,
        }
    }

    /// Name the export would be saved under.
    pub fn export_file_name(&self, mode: ExportMode, format: SaveFormat) -> String {
        let ext = match mode {
            ExportMode::Compiled => SaveFormat::Png.extension(),
            ExportMode::GuideBorder => format.extension(),
        };
        export::nine_patch_file_name(&self.name, ext)
    }

    pub fn export(&self, mode: ExportMode, format: SaveFormat) -> Result<ExportOutput, ExportError> {
        let result = export::export(self.source.as_ref(), self.geometry.as_ref(), mode, format);
        match result {
            Ok(bytes) => {
                let file_name = self.export_file_name(mode, format);
                crate::log_info!("Exported '{}' ({} bytes)", file_name, bytes.len());
                Ok(ExportOutput { bytes, file_name })
            }
            Err(e) => {
                crate::log_err!("Export of '{}' failed: {}", self.name, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragState;
    use crate::geometry::Guide;
    use image::Rgba;

    fn image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255]))
    }

    #[test]
    fn export_without_source_is_missing_input() {
        let s = Session::new();
        assert!(!s.is_loaded());
        assert!(matches!(
            s.export(ExportMode::GuideBorder, SaveFormat::Png),
            Err(ExportError::MissingInput(_))
        ));
    }

    #[test]
    fn load_resets_guides_drag_and_zoom() {
        let mut s = Session::new();
        s.load(image(100, 100), Some(PathBuf::from("dir/button.png")), 620.0);
        assert_eq!(s.name, "button.png");
        assert_eq!(s.zoom(), 1.0);

        // grab the stretch-x start handle and leave it mid-drag
        assert!(!s.pointer(PointerEvent::Down { x: 290.0, y: 262.0 }, 620.0));
        assert!(s.drag.is_dragging());
        s.geometry_mut().unwrap().set_stretch_x(5, 6);

        s.load(image(1240, 310), None, 620.0);
        assert_eq!(s.drag.state(), DragState::Idle);
        assert_eq!(s.name, "Untitled");
        assert!((s.zoom() - 0.5).abs() < 1e-6);
        let g = s.geometry().unwrap();
        assert_eq!((g.width(), g.height()), (1240, 310));
        assert_eq!(g.h_stretch(), Guide { start: 372, end: 868 });
    }

    #[test]
    fn drag_moves_a_guide_through_the_session() {
        let mut s = Session::new();
        s.load(image(100, 100), None, 620.0);
        assert!(!s.pointer(PointerEvent::Down { x: 290.0, y: 262.0 }, 620.0));
        assert!(s.pointer(PointerEvent::Move { x: 280.0, y: 262.0 }, 620.0));
        s.pointer(PointerEvent::Up, 620.0);
        assert_eq!(s.geometry().unwrap().h_stretch().start, 20);
        assert!(!s.drag.is_dragging());
    }

    #[test]
    fn export_uses_nine_patch_names() {
        let mut s = Session::new();
        s.load(image(10, 10), Some(PathBuf::from("panel.jpg")), 620.0);
        let out = s.export(ExportMode::GuideBorder, SaveFormat::Bmp).unwrap();
        assert_eq!(out.file_name, "panel.9.bmp");
        let out = s.export(ExportMode::Compiled, SaveFormat::Bmp).unwrap();
        assert_eq!(out.file_name, "panel.9.png");
        assert!(out.bytes.starts_with(&crate::codec::PNG_SIGNATURE));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut s = Session::new();
        s.set_zoom(50.0);
        assert_eq!(s.zoom(), crate::transform::MAX_ZOOM);
    }
}
