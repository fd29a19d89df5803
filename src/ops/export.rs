// ============================================================================
// EXPORT: guide-border (.9.png source) and compiled (npTc chunk) variants
// ============================================================================

use std::fmt;

use image::{Rgba, RgbaImage, imageops};

use crate::codec::{self, CodecError};
use crate::geometry::{GeometryModel, Guide};
use crate::io::{self, SaveFormat};

const GUIDE_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Which variant to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportMode {
    /// Source plus a 1-pixel border carrying black guide segments.
    GuideBorder,
    /// Unmodified pixels with an `npTc` chunk before `IEND`.
    Compiled,
}

impl ExportMode {
    pub fn label(&self) -> &'static str {
        match self {
            ExportMode::GuideBorder => "Export .9.png",
            ExportMode::Compiled => "Export Compiled .9.png",
        }
    }
}

/// Error type for export operations. Nothing partial is ever returned.
#[derive(Debug)]
pub enum ExportError {
    /// No source image loaded, or no guides for it.
    MissingInput(&'static str),
    /// Guides were made for a different image size.
    GeometryMismatch { image: (u32, u32), geometry: (u32, u32) },
    /// The container could not be rewritten.
    Format(CodecError),
    /// Pixel encoding failed.
    Encode(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::MissingInput(what) => write!(f, "Image or guides missing: no {}", what),
            ExportError::GeometryMismatch { image, geometry } => write!(
                f,
                "guides are for a {}x{} image but the source is {}x{}",
                geometry.0, geometry.1, image.0, image.1
            ),
            ExportError::Format(e) => write!(f, "Invalid container: {}", e),
            ExportError::Encode(e) => write!(f, "Encoding failed: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<CodecError> for ExportError {
    fn from(e: CodecError) -> Self {
        ExportError::Format(e)
    }
}

fn check_dimensions(source: &RgbaImage, geometry: &GeometryModel) -> Result<(), ExportError> {
    let image = source.dimensions();
    let guides = (geometry.width(), geometry.height());
    if image != guides {
        return Err(ExportError::GeometryMismatch { image, geometry: guides });
    }
    Ok(())
}

/// Source copied into a `(w+2) × (h+2)` canvas at (1,1) with the four guide
/// segments on the border:
/// stretch X on the top row, stretch Y on the left column,
/// padding X on the bottom row, padding Y on the right column.
pub fn guide_border_image(source: &RgbaImage, geometry: &GeometryModel) -> Result<RgbaImage, ExportError> {
    check_dimensions(source, geometry)?;
    let (w, h) = source.dimensions();
    let mut out = RgbaImage::new(w + 2, h + 2);
    imageops::replace(&mut out, source, 1, 1);

    let segment = |g: Guide| (g.start + 1)..(g.end + 1);
    for x in segment(geometry.h_stretch()) {
        out.put_pixel(x, 0, GUIDE_PIXEL);
    }
    for y in segment(geometry.v_stretch()) {
        out.put_pixel(0, y, GUIDE_PIXEL);
    }
    for x in segment(geometry.h_pad()) {
        out.put_pixel(x, h + 1, GUIDE_PIXEL);
    }
    for y in segment(geometry.v_pad()) {
        out.put_pixel(w + 1, y, GUIDE_PIXEL);
    }
    Ok(out)
}

/// Guide-border variant encoded as `format`.
pub fn export_guide_border(
    source: &RgbaImage,
    geometry: &GeometryModel,
    format: SaveFormat,
) -> Result<Vec<u8>, ExportError> {
    let bordered = guide_border_image(source, geometry)?;
    io::encode_image(&bordered, format).map_err(ExportError::Encode)
}

/// Compiled variant: re-encode the unmodified pixels as PNG and insert the
/// `npTc` record before `IEND`.
pub fn export_compiled(source: &RgbaImage, geometry: &GeometryModel) -> Result<Vec<u8>, ExportError> {
    check_dimensions(source, geometry)?;
    let png = io::encode_png(source).map_err(ExportError::Encode)?;
    let chunks = codec::extract_chunks(&png)?;
    let (w, h) = source.dimensions();
    let record = geometry.metadata_block().to_chunk(w, h);
    let chunks = codec::insert_before_terminal(chunks, record)?;
    Ok(codec::encode_chunks(&chunks))
}

/// Export entry point for callers that may not have an image loaded yet.
pub fn export(
    source: Option<&RgbaImage>,
    geometry: Option<&GeometryModel>,
    mode: ExportMode,
    format: SaveFormat,
) -> Result<Vec<u8>, ExportError> {
    let source = source.ok_or(ExportError::MissingInput("source image loaded"))?;
    let geometry = geometry.ok_or(ExportError::MissingInput("guides defined"))?;
    match mode {
        ExportMode::GuideBorder => export_guide_border(source, geometry, format),
        ExportMode::Compiled => export_compiled(source, geometry),
    }
}

/// `button.png` -> `button.9.png`; names already ending in `.9.<ext>` are
/// kept as they are. Empty names become `image.9.<ext>`.
pub fn nine_patch_file_name(name: &str, ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    let suffix = format!(".9.{}", ext);
    if name.to_lowercase().ends_with(&suffix.to_lowercase()) {
        return name.to_string();
    }
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    let stem = stem.strip_suffix(".9").unwrap_or(stem);
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("{}{}", stem, suffix)
}
