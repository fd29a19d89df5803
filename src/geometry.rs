// ============================================================================
// GEOMETRY: stretch and padding guides in image-pixel coordinates
// ============================================================================

use crate::codec::MetadataBlock;

/// Default stretch band as fractions of each axis (central 40%).
pub const DEFAULT_STRETCH: (f32, f32) = (0.3, 0.7);
/// Default padding/content band as fractions of each axis (central 80%).
pub const DEFAULT_PADDING: (f32, f32) = (0.1, 0.9);

/// A half-open range `[start, end)` along one image axis.
///
/// Invariant (maintained by every constructor in this module):
/// `start < end <= axis_len`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Guide {
    pub start: u32,
    pub end: u32,
}

impl Guide {
    /// Build a guide from arbitrary (possibly out-of-range) input.
    ///
    /// Never fails: `start` is pulled into `[0, len-1]`, then `end` into
    /// `[start+1, len]`. An axis of length 0 is treated as length 1.
    pub fn clamped(start: i64, end: i64, axis_len: u32) -> Self {
        let len = axis_len.max(1) as i64;
        let s = start.clamp(0, len - 1);
        let e = end.clamp(s + 1, len);
        Self { start: s as u32, end: e as u32 }
    }

    /// Guide covering `[round(len*lo), round(len*hi))`, clamped.
    pub fn from_fractions(axis_len: u32, lo: f32, hi: f32) -> Self {
        let len = axis_len as f32;
        Self::clamped(
            (len * lo).round() as i64,
            (len * hi).round() as i64,
            axis_len,
        )
    }

    /// Guide spanning the whole axis.
    pub fn full(axis_len: u32) -> Self {
        Self::clamped(0, axis_len as i64, axis_len)
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// `(left, right)` insets relative to the axis: `left = start`,
    /// `right = axis_len - end`.
    pub fn insets(&self, axis_len: u32) -> (u32, u32) {
        (self.start, axis_len.saturating_sub(self.end))
    }
}

/// Which of the four guides of a [`GeometryModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuideKind {
    /// X-axis stretch (drawn on the top edge).
    StretchX,
    /// Y-axis stretch (drawn on the left edge).
    StretchY,
    /// X-axis content inset (drawn on the bottom edge).
    PadX,
    /// Y-axis content inset (drawn on the right edge).
    PadY,
}

impl GuideKind {
    pub fn all() -> &'static [GuideKind] {
        &[
            GuideKind::StretchX,
            GuideKind::StretchY,
            GuideKind::PadX,
            GuideKind::PadY,
        ]
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, GuideKind::StretchX | GuideKind::PadX)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GuideKind::StretchX => "Stretch X",
            GuideKind::StretchY => "Stretch Y",
            GuideKind::PadX => "Padding X",
            GuideKind::PadY => "Padding Y",
        }
    }
}

/// The four guides of one image plus the axis lengths they are bound to.
///
/// Every mutator clamps; nothing here returns an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeometryModel {
    width: u32,
    height: u32,
    h_stretch: Guide,
    v_stretch: Guide,
    h_pad: Guide,
    v_pad: Guide,
}

impl GeometryModel {
    /// Default guides for a freshly loaded `width × height` image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_fractions(width, height, DEFAULT_STRETCH, DEFAULT_PADDING)
    }

    pub fn with_fractions(width: u32, height: u32, stretch: (f32, f32), padding: (f32, f32)) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            h_stretch: Guide::from_fractions(width, stretch.0, stretch.1),
            v_stretch: Guide::from_fractions(height, stretch.0, stretch.1),
            h_pad: Guide::from_fractions(width, padding.0, padding.1),
            v_pad: Guide::from_fractions(height, padding.0, padding.1),
        }
    }

    /// Build from explicit `(start, end)` pairs, each clamped to its axis.
    pub fn with_guides(
        width: u32,
        height: u32,
        stretch_x: (i64, i64),
        stretch_y: (i64, i64),
        pad_x: (i64, i64),
        pad_y: (i64, i64),
    ) -> Self {
        let mut g = Self::new(width, height);
        g.set_stretch_x(stretch_x.0, stretch_x.1);
        g.set_stretch_y(stretch_y.0, stretch_y.1);
        g.set_pad_x(pad_x.0, pad_x.1);
        g.set_pad_y(pad_y.0, pad_y.1);
        g
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn h_stretch(&self) -> Guide {
        self.h_stretch
    }

    pub fn v_stretch(&self) -> Guide {
        self.v_stretch
    }

    pub fn h_pad(&self) -> Guide {
        self.h_pad
    }

    pub fn v_pad(&self) -> Guide {
        self.v_pad
    }

    pub fn guide(&self, kind: GuideKind) -> Guide {
        match kind {
            GuideKind::StretchX => self.h_stretch,
            GuideKind::StretchY => self.v_stretch,
            GuideKind::PadX => self.h_pad,
            GuideKind::PadY => self.v_pad,
        }
    }

    /// Length of the axis a guide lives on.
    pub fn axis_len(&self, kind: GuideKind) -> u32 {
        if kind.is_horizontal() { self.width } else { self.height }
    }

    fn slot(&mut self, kind: GuideKind) -> &mut Guide {
        match kind {
            GuideKind::StretchX => &mut self.h_stretch,
            GuideKind::StretchY => &mut self.v_stretch,
            GuideKind::PadX => &mut self.h_pad,
            GuideKind::PadY => &mut self.v_pad,
        }
    }

    /// Replace both endpoints of one guide.
    pub fn set_guide(&mut self, kind: GuideKind, start: i64, end: i64) {
        let len = self.axis_len(kind);
        *self.slot(kind) = Guide::clamped(start, end, len);
    }

    pub fn set_stretch_x(&mut self, start: i64, end: i64) {
        self.set_guide(GuideKind::StretchX, start, end);
    }

    pub fn set_stretch_y(&mut self, start: i64, end: i64) {
        self.set_guide(GuideKind::StretchY, start, end);
    }

    pub fn set_pad_x(&mut self, start: i64, end: i64) {
        self.set_guide(GuideKind::PadX, start, end);
    }

    pub fn set_pad_y(&mut self, start: i64, end: i64) {
        self.set_guide(GuideKind::PadY, start, end);
    }

    /// Move only the start of a guide; it can never reach the live end.
    pub fn set_start(&mut self, kind: GuideKind, value: i64) {
        let guide = self.slot(kind);
        let limit = guide.end as i64 - 1;
        guide.start = value.clamp(0, limit) as u32;
    }

    /// Move only the end of a guide; it can never reach the live start.
    pub fn set_end(&mut self, kind: GuideKind, value: i64) {
        let len = self.axis_len(kind) as i64;
        let guide = self.slot(kind);
        let floor = guide.start as i64 + 1;
        guide.end = value.clamp(floor, len) as u32;
    }

    /// Inset form of the four guides, as stored in the compiled chunk.
    pub fn metadata_block(&self) -> MetadataBlock {
        let (stretch_left, stretch_right) = self.h_stretch.insets(self.width);
        let (stretch_top, stretch_bottom) = self.v_stretch.insets(self.height);
        let (pad_left, pad_right) = self.h_pad.insets(self.width);
        let (pad_top, pad_bottom) = self.v_pad.insets(self.height);
        MetadataBlock {
            stretch_left,
            stretch_right,
            stretch_top,
            stretch_bottom,
            pad_left,
            pad_right,
            pad_top,
            pad_bottom,
        }
    }

    /// Inverse of [`metadata_block`](Self::metadata_block) for a known image size.
    pub fn from_metadata(width: u32, height: u32, block: &MetadataBlock) -> Self {
        let w = width as i64;
        let h = height as i64;
        Self::with_guides(
            width,
            height,
            (block.stretch_left as i64, w - block.stretch_right as i64),
            (block.stretch_top as i64, h - block.stretch_bottom as i64),
            (block.pad_left as i64, w - block.pad_right as i64),
            (block.pad_top as i64, h - block.pad_bottom as i64),
        )
    }
}
