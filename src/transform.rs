// ============================================================================
// DISPLAY TRANSFORM: image pixels <-> editor viewport coordinates
// ============================================================================

/// Lower bound of the editor zoom slider.
pub const MIN_ZOOM: f32 = 0.1;
/// Upper bound of the editor zoom slider.
pub const MAX_ZOOM: f32 = 3.8;

/// Clamp a user-supplied zoom into the slider range.
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}

/// Zoom that fits a `width × height` image inside a square viewport, never
/// above 100%.
pub fn fit_zoom(width: u32, height: u32, viewport: f32) -> f32 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    let fit = (viewport / width as f32)
        .min(viewport / height as f32)
        .min(1.0);
    if fit > 0.0 { fit } else { 1.0 }
}

/// Derived mapping between image pixels and a fixed square viewport with the
/// image centered in it. Pure function of (image size, zoom, viewport size).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayTransform {
    pub zoom: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    width: u32,
    height: u32,
}

impl DisplayTransform {
    pub fn new(width: u32, height: u32, zoom: f32, viewport: f32) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        let disp_w = (width as f32 * zoom).round();
        let disp_h = (height as f32 * zoom).round();
        Self {
            zoom,
            offset_x: ((viewport - disp_w) / 2.0).round(),
            offset_y: ((viewport - disp_h) / 2.0).round(),
            width,
            height,
        }
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the image on screen, rounded to whole display pixels.
    pub fn display_size(&self) -> (f32, f32) {
        (
            (self.width as f32 * self.zoom).round(),
            (self.height as f32 * self.zoom).round(),
        )
    }

    /// `(x, y, w, h)` of the image inside the viewport.
    pub fn display_rect(&self) -> (f32, f32, f32, f32) {
        let (w, h) = self.display_size();
        (self.offset_x, self.offset_y, w, h)
    }

    pub fn image_to_display_x(&self, x: f32) -> f32 {
        self.offset_x + x * self.zoom
    }

    pub fn image_to_display_y(&self, y: f32) -> f32 {
        self.offset_y + y * self.zoom
    }

    /// Nearest image column for a viewport x, clamped to `[0, width]`.
    pub fn display_to_image_x(&self, x: f32) -> u32 {
        to_image(x, self.offset_x, self.zoom, self.width)
    }

    /// Nearest image row for a viewport y, clamped to `[0, height]`.
    pub fn display_to_image_y(&self, y: f32) -> u32 {
        to_image(y, self.offset_y, self.zoom, self.height)
    }
}

fn to_image(p: f32, offset: f32, zoom: f32, axis_len: u32) -> u32 {
    let v = ((p - offset) / zoom).round();
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, axis_len as f32) as u32
}
