// ============================================================================
// NINE-SLICE COMPOSITOR: stretch the middle bands, keep the borders exact
// ============================================================================

use image::{RgbaImage, imageops};

use crate::geometry::{GeometryModel, Guide};

/// Resampling filter used for the stretched middle band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl Interpolation {
    pub fn label(&self) -> &'static str {
        match self {
            Interpolation::Nearest  => "Nearest",
            Interpolation::Bilinear => "Bilinear",
            Interpolation::Bicubic  => "Bicubic",
            Interpolation::Lanczos3 => "Lanczos3",
        }
    }

    pub fn all() -> &'static [Interpolation] {
        &[
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Bicubic,
            Interpolation::Lanczos3,
        ]
    }

    /// Settings-file key.
    pub fn key(&self) -> &'static str {
        match self {
            Interpolation::Nearest  => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Bicubic  => "bicubic",
            Interpolation::Lanczos3 => "lanczos3",
        }
    }

    pub fn from_key(s: &str) -> Self {
        match s {
            "nearest"  => Interpolation::Nearest,
            "bicubic"  => Interpolation::Bicubic,
            "lanczos3" => Interpolation::Lanczos3,
            _          => Interpolation::Bilinear,
        }
    }

    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest  => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Bicubic  => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// New length of a middle band scaled by `scale`; at least one pixel.
pub fn middle_target(len: u32, scale: f32) -> u32 {
    let scaled = (len as f32 * scale).round();
    if scaled.is_finite() && scaled >= 1.0 {
        scaled.min(u32::MAX as f32) as u32
    } else {
        1
    }
}

/// Scaled middle band of `guide` on an axis of `axis_len`, capped so the
/// whole axis still fits in a `u32`.
fn band_target(guide: Guide, axis_len: u32, scale: f32) -> u32 {
    let fixed = axis_len - guide.len();
    middle_target(guide.len(), scale).min(u32::MAX - fixed)
}

/// Output size of [`compose`] without doing the work.
pub fn composed_size(geometry: &GeometryModel, scale_x: f32, scale_y: f32) -> (u32, u32) {
    let hs = geometry.h_stretch();
    let vs = geometry.v_stretch();
    let w = geometry.width() - hs.len() + band_target(hs, geometry.width(), scale_x);
    let h = geometry.height() - vs.len() + band_target(vs, geometry.height(), scale_y);
    (w, h)
}

/// Stretch `source` with its middle bands scaled by `(scale_x, scale_y)`.
///
/// Horizontal pass first, then vertical on the intermediate. The outer bands
/// are copied pixel-for-pixel. Deterministic for a given filter.
///
/// `geometry` must describe `source`; guides are clamped to the source size
/// defensively when it does not.
pub fn compose(
    source: &RgbaImage,
    geometry: &GeometryModel,
    scale_x: f32,
    scale_y: f32,
    interpolation: Interpolation,
) -> RgbaImage {
    let (w, h) = source.dimensions();
    if w == 0 || h == 0 {
        return source.clone();
    }
    let hs = fit_guide(geometry.h_stretch(), w);
    let vs = fit_guide(geometry.v_stretch(), h);
    let filter = interpolation.to_filter();

    let wide = stretch_horizontal(source, hs, band_target(hs, w, scale_x), filter);
    stretch_vertical(&wide, vs, band_target(vs, h, scale_y), filter)
}

/// Stretch `source` to exactly `target_w × target_h` where possible.
///
/// The middle band takes whatever is left after the fixed bands, never less
/// than one pixel, so targets smaller than the borders produce an image
/// slightly larger than requested.
pub fn compose_to_size(
    source: &RgbaImage,
    geometry: &GeometryModel,
    target_w: u32,
    target_h: u32,
    interpolation: Interpolation,
) -> RgbaImage {
    let (w, h) = source.dimensions();
    if w == 0 || h == 0 {
        return source.clone();
    }
    let hs = fit_guide(geometry.h_stretch(), w);
    let vs = fit_guide(geometry.v_stretch(), h);
    let mid_w = target_w.saturating_sub(w - hs.len()).max(1);
    let mid_h = target_h.saturating_sub(h - vs.len()).max(1);
    let filter = interpolation.to_filter();

    let wide = stretch_horizontal(source, hs, mid_w, filter);
    stretch_vertical(&wide, vs, mid_h, filter)
}

fn fit_guide(g: Guide, len: u32) -> Guide {
    Guide::clamped(g.start as i64, g.end as i64, len)
}

/// Resize one band, copying instead of resampling when the size is unchanged.
fn resample(band: &RgbaImage, new_w: u32, new_h: u32, filter: imageops::FilterType) -> RgbaImage {
    if band.dimensions() == (new_w, new_h) {
        band.clone()
    } else {
        imageops::resize(band, new_w, new_h, filter)
    }
}

fn stretch_horizontal(
    img: &RgbaImage,
    guide: Guide,
    new_mid: u32,
    filter: imageops::FilterType,
) -> RgbaImage {
    let (w, h) = img.dimensions();
    let left = guide.start;
    let right = w - guide.end;
    let mut out = RgbaImage::new(left + new_mid + right, h);

    if left > 0 {
        let band = imageops::crop_imm(img, 0, 0, left, h).to_image();
        imageops::replace(&mut out, &band, 0, 0);
    }

    let mid = imageops::crop_imm(img, guide.start, 0, guide.len(), h).to_image();
    let mid = resample(&mid, new_mid, h, filter);
    imageops::replace(&mut out, &mid, left as i64, 0);

    if right > 0 {
        let band = imageops::crop_imm(img, guide.end, 0, right, h).to_image();
        imageops::replace(&mut out, &band, (left + new_mid) as i64, 0);
    }
    out
}

fn stretch_vertical(
    img: &RgbaImage,
    guide: Guide,
    new_mid: u32,
    filter: imageops::FilterType,
) -> RgbaImage {
    let (w, h) = img.dimensions();
    let top = guide.start;
    let bottom = h - guide.end;
    let mut out = RgbaImage::new(w, top + new_mid + bottom);

    if top > 0 {
        let band = imageops::crop_imm(img, 0, 0, w, top).to_image();
        imageops::replace(&mut out, &band, 0, 0);
    }

    let mid = imageops::crop_imm(img, 0, guide.start, w, guide.len()).to_image();
    let mid = resample(&mid, w, new_mid, filter);
    imageops::replace(&mut out, &mid, 0, top as i64);

    if bottom > 0 {
        let band = imageops::crop_imm(img, 0, guide.end, w, bottom).to_image();
        imageops::replace(&mut out, &band, 0, (top + new_mid) as i64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Every pixel distinct, so any misplaced copy shows up.
    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    #[test]
    fn identity_when_unscaled_over_full_image() {
        let src = gradient(23, 17);
        let g = GeometryModel::with_guides(23, 17, (0, 23), (0, 17), (0, 23), (0, 17));
        for interp in Interpolation::all() {
            assert_eq!(compose(&src, &g, 1.0, 1.0, *interp), src);
        }
    }

    #[test]
    fn identity_when_unscaled_with_inner_bands() {
        let src = gradient(30, 20);
        let g = GeometryModel::with_guides(30, 20, (5, 25), (3, 9), (0, 30), (0, 20));
        assert_eq!(compose(&src, &g, 1.0, 1.0, Interpolation::Bicubic), src);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let src = gradient(40, 30);
        let g = GeometryModel::new(40, 30);
        let a = compose(&src, &g, 2.3, 0.7, Interpolation::Lanczos3);
        let b = compose(&src, &g, 2.3, 0.7, Interpolation::Lanczos3);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn corners_are_copied_exactly() {
        let src = gradient(40, 30);
        let g = GeometryModel::with_guides(40, 30, (10, 30), (8, 20), (0, 40), (0, 30));
        let out = compose(&src, &g, 3.0, 2.5, Interpolation::Bilinear);
        // 10 + 60 + 10 by 8 + 30 + 10
        assert_eq!(out.dimensions(), (80, 48));
        assert_eq!(composed_size(&g, 3.0, 2.5), (80, 48));

        for y in 0..8 {
            for x in 0..10 {
                assert_eq!(out.get_pixel(x, y), src.get_pixel(x, y));
                assert_eq!(out.get_pixel(70 + x, y), src.get_pixel(30 + x, y));
            }
        }
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(out.get_pixel(x, 38 + y), src.get_pixel(x, 20 + y));
                assert_eq!(out.get_pixel(70 + x, 38 + y), src.get_pixel(30 + x, 20 + y));
            }
        }
    }

    #[test]
    fn stretch_touching_edges_has_no_outer_bands() {
        let src = gradient(12, 12);
        let g = GeometryModel::with_guides(12, 12, (0, 6), (6, 12), (0, 12), (0, 12));
        let out = compose(&src, &g, 2.0, 2.0, Interpolation::Nearest);
        assert_eq!(out.dimensions(), (18, 18));
        // right band (x 6..12) copied verbatim to x 12..18 for the top rows
        for y in 0..6 {
            for x in 0..6 {
                assert_eq!(out.get_pixel(12 + x, y), src.get_pixel(6 + x, y));
            }
        }
    }

    #[test]
    fn middle_band_never_collapses() {
        assert_eq!(middle_target(10, 0.0), 1);
        assert_eq!(middle_target(10, -3.0), 1);
        assert_eq!(middle_target(10, f32::NAN), 1);
        assert_eq!(middle_target(10, 0.04), 1);
        assert_eq!(middle_target(10, 0.26), 3);

        let src = gradient(20, 20);
        let g = GeometryModel::new(20, 20);
        let out = compose(&src, &g, 0.0, 0.0, Interpolation::Bilinear);
        assert_eq!(out.dimensions(), (13, 13));
    }

    #[test]
    fn huge_scales_saturate_instead_of_overflowing() {
        let g = GeometryModel::new(100, 100);
        assert_eq!(composed_size(&g, 1e12, 1.0), (u32::MAX, 100));
        assert_eq!(composed_size(&g, 1.0, 1e30), (100, u32::MAX));
        assert_eq!(band_target(g.h_stretch(), 100, 1e12), u32::MAX - 60);
    }

    #[test]
    fn target_size_smaller_than_borders_clamps_middle() {
        let src = gradient(20, 20);
        let g = GeometryModel::with_guides(20, 20, (8, 12), (8, 12), (0, 20), (0, 20));
        assert_eq!(compose_to_size(&src, &g, 64, 40, Interpolation::Bilinear).dimensions(), (64, 40));
        assert_eq!(compose_to_size(&src, &g, 4, 4, Interpolation::Bilinear).dimensions(), (17, 17));
    }
}
