// ============================================================================
// ICON TOOLS: square contain-resize, colour tint, icon-on-background, batch
// ============================================================================

use image::{RgbaImage, imageops};

use super::compositor::Interpolation;

/// Edge length of the add-background output.
pub const BACKGROUND_SIZE: u32 = 192;
/// Overlay opacity of the combined batch pipeline.
pub const BATCH_TINT_OPACITY: f32 = 0.4;

/// Scale `img` to fit inside `size × size` keeping its aspect ratio, centered
/// on a transparent square.
pub fn resize_contain(img: &RgbaImage, size: u32, interpolation: Interpolation) -> RgbaImage {
    fit_square(img, size, false, interpolation)
}

/// Scale `img` to fill `size × size` keeping its aspect ratio; the overflow is
/// cropped equally from both sides.
pub fn resize_cover(img: &RgbaImage, size: u32, interpolation: Interpolation) -> RgbaImage {
    fit_square(img, size, true, interpolation)
}

fn fit_square(img: &RgbaImage, size: u32, cover: bool, interpolation: Interpolation) -> RgbaImage {
    let size = size.max(1);
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return RgbaImage::new(size, size);
    }
    let sx = size as f32 / w as f32;
    let sy = size as f32 / h as f32;
    let s = if cover { sx.max(sy) } else { sx.min(sy) };
    let nw = ((w as f32 * s).round() as u32).max(1);
    let nh = ((h as f32 * s).round() as u32).max(1);

    let scaled = if (nw, nh) == (w, h) {
        img.clone()
    } else {
        imageops::resize(img, nw, nh, interpolation.to_filter())
    };

    let mut out = RgbaImage::new(size, size);
    let dx = (size as i64 - nw as i64) / 2;
    let dy = (size as i64 - nh as i64) / 2;
    imageops::replace(&mut out, &scaled, dx, dy);
    out
}

/// Blend a flat colour over the visible content at `opacity` (0..=1).
/// Fully transparent pixels are left alone and alpha is never changed.
pub fn tint(img: &RgbaImage, rgb: [u8; 3], opacity: f32) -> RgbaImage {
    let opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 0.0 };
    let mut out = img.clone();
    for px in out.pixels_mut() {
        let a = px[3];
        if a == 0 {
            continue;
        }
        let t = opacity * (a as f32 / 255.0);
        for c in 0..3 {
            let v = px[c] as f32 * (1.0 - t) + rgb[c] as f32 * t;
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Invert colour channels, keeping alpha.
pub fn invert(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
    }
    out
}

/// Flat colour overlay, see [`tint`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TintOptions {
    pub rgb: [u8; 3],
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundOptions {
    /// Icon size relative to the background; above 1 the icon is cropped.
    pub scale: f32,
    /// Fill the icon square instead of letterboxing into it.
    pub cover: bool,
    pub invert: bool,
    /// Overlay applied to the composited square, masked by its alpha.
    pub tint: Option<TintOptions>,
    pub interpolation: Interpolation,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            cover: false,
            invert: false,
            tint: None,
            interpolation: Interpolation::Bilinear,
        }
    }
}

/// Composite `icon` over `background`, both brought to
/// [`BACKGROUND_SIZE`] squares first.
pub fn add_background(icon: &RgbaImage, background: &RgbaImage, options: &BackgroundOptions) -> RgbaImage {
    let mut base = resize_cover(background, BACKGROUND_SIZE, options.interpolation);

    let scale = if options.scale.is_finite() && options.scale > 0.0 { options.scale } else { 1.0 };
    let icon_size = ((BACKGROUND_SIZE as f32 * scale).round() as u32).max(1);
    let mut sized = fit_square(icon, icon_size, options.cover, options.interpolation);
    if options.invert {
        sized = invert(&sized);
    }

    // smaller icons are centered, larger ones center-cropped; both reduce to
    // the same signed offset
    let offset = (BACKGROUND_SIZE as i64 - icon_size as i64) / 2;
    imageops::overlay(&mut base, &sized, offset, offset);

    match options.tint {
        Some(t) => tint(&base, t.rgb, t.opacity),
        None => base,
    }
}

/// `#rrggbb`, `rrggbb` or `#rgb`.
pub fn parse_hex_color(s: &str) -> Result<[u8; 3], String> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || format!("Invalid colour '{}': expected #rrggbb", s);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }
    match hex.len() {
        6 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
            Ok([byte(0)?, byte(2)?, byte(4)?])
        }
        3 => {
            let nib = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17).map_err(|_| bad());
            Ok([nib(0)?, nib(1)?, nib(2)?])
        }
        _ => Err(bad()),
    }
}
