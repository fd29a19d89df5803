use image::codecs::bmp::BmpEncoder;
use image::codecs::tga::TgaEncoder;
use image::RgbaImage;
use rfd::FileDialog;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions accepted as editor sources.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "bmp", "tga", "gif", "ico", "tiff", "tif",
];

// ============================================================================
// SAVE FORMATS
// ============================================================================

/// Lossless containers the guide-border export can be written as. Compiled
/// exports are always PNG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Bmp,
    Tga,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaveFormat::Png => "PNG",
            SaveFormat::Bmp => "BMP",
            SaveFormat::Tga => "TGA",
        }
    }

    pub fn all() -> &'static [SaveFormat] {
        &[SaveFormat::Png, SaveFormat::Bmp, SaveFormat::Tga]
    }

    /// Case-insensitive lookup; `None` for anything not lossless-writable.
    pub fn from_extension(ext: &str) -> Option<SaveFormat> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            _ => None,
        }
    }

    /// Format implied by a path's extension, PNG when unknown.
    pub fn from_path(path: &Path) -> SaveFormat {
        path.extension()
            .and_then(|e| SaveFormat::from_extension(&e.to_string_lossy()))
            .unwrap_or_default()
    }
}

// ============================================================================
// DECODE / ENCODE
// ============================================================================

/// Decode any supported raster file into RGBA8.
pub fn load_source(path: &Path) -> Result<RgbaImage, String> {
    let bytes = fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    decode_source(&bytes).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn decode_source(bytes: &[u8]) -> Result<RgbaImage, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("Unsupported image: {}", e))?;
    Ok(img.to_rgba8())
}

/// 8-bit RGBA PNG bytes written with the `png` crate directly, so the chunk
/// layout is plain (IHDR, IDAT..., IEND) for the compiled export to rewrite.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| format!("PNG header write error: {}", e))?;
        writer
            .write_image_data(image.as_raw())
            .map_err(|e| format!("PNG data write error: {}", e))?;
        writer
            .finish()
            .map_err(|e| format!("PNG finish error: {}", e))?;
    }
    Ok(out)
}

/// Encode `image` in one of the lossless save formats.
pub fn encode_image(image: &RgbaImage, format: SaveFormat) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    match format {
        SaveFormat::Png => return encode_png(image),
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut out);
            encoder
                .encode(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)
                .map_err(|e| format!("BMP encode error: {}", e))?;
        }
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(&mut out);
            encoder
                .encode(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)
                .map_err(|e| format!("TGA encode error: {}", e))?;
        }
    }
    Ok(out)
}

/// Write bytes to `path`, creating missing parent directories.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }
    fs::write(path, bytes).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

// ============================================================================
// FILE HANDLER
// ============================================================================

pub struct FileHandler {
    /// Directory of the last opened or exported file
    pub last_dir: Option<PathBuf>,
    /// Last used guide-border format
    pub last_format: SaveFormat,
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            last_dir: None,
            last_format: SaveFormat::Png,
        }
    }

    fn dialog(&self) -> FileDialog {
        let dialog = FileDialog::new();
        match &self.last_dir {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }

    /// Open an image file using native file dialog.
    /// Returns the decoded image and its path on success.
    pub fn open_image(&mut self) -> Option<Result<(RgbaImage, PathBuf), String>> {
        let path = self
            .dialog()
            .add_filter("Images", SOURCE_EXTENSIONS)
            .add_filter("All Files", &["*"])
            .pick_file()?;
        self.last_dir = path.parent().map(Path::to_path_buf);
        Some(load_source(&path).map(|img| (img, path)))
    }

    /// Ask where to save an export; `default_name` is pre-filled.
    pub fn pick_export_path(&mut self, default_name: &str, format: SaveFormat) -> Option<PathBuf> {
        let path = self
            .dialog()
            .set_file_name(default_name)
            .add_filter(format.label(), &[format.extension()])
            .save_file()?;
        self.last_dir = path.parent().map(Path::to_path_buf);
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(5, 3, |x, y| Rgba([x as u8 * 40, y as u8 * 80, 7, 255 - x as u8]))
    }

    #[test]
    fn lossless_formats_decode_to_the_same_pixels() {
        let img = sample();
        for format in SaveFormat::all() {
            let bytes = encode_image(&img, *format).unwrap();
            assert_eq!(decode_source(&bytes).unwrap(), img, "{:?}", format);
        }
    }

    #[test]
    fn png_writer_emits_plain_chunk_layout() {
        let bytes = encode_png(&sample()).unwrap();
        let chunks = crate::codec::extract_chunks(&bytes).unwrap();
        assert_eq!(chunks.first().map(|c| c.name), Some(crate::codec::ChunkType::IHDR));
        assert_eq!(chunks.last().map(|c| c.name), Some(crate::codec::ChunkType::IEND));
        assert_eq!(crate::codec::ihdr_dimensions(&chunks).unwrap(), (5, 3));
    }

    #[test]
    fn format_lookup() {
        assert_eq!(SaveFormat::from_extension("PNG"), Some(SaveFormat::Png));
        assert_eq!(SaveFormat::from_extension(".tga"), Some(SaveFormat::Tga));
        assert_eq!(SaveFormat::from_extension("jpg"), None);
        assert_eq!(SaveFormat::from_path(Path::new("a/b.bmp")), SaveFormat::Bmp);
        assert_eq!(SaveFormat::from_path(Path::new("a/b.webp")), SaveFormat::Png);
    }

    #[test]
    fn garbage_is_not_an_image() {
        assert!(decode_source(b"not an image").is_err());
    }
}
