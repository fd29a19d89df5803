// ============================================================================
// PNG CHUNK CODEC: chunk surgery and the compiled nine-patch (npTc) record
// ============================================================================
//
// A PNG file is an 8-byte signature followed by chunks laid out as
// `length:u32be | type:[u8;4] | data | crc:u32be`, where the CRC-32 covers the
// type and the data. `IEND` must be the last chunk. Compiled nine-patch
// images carry their stretch/padding record in an extra `npTc` chunk placed
// just before `IEND`.

use std::fmt;
use std::sync::OnceLock;

/// The fixed 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Size of the serialized `npTc` record.
pub const NINE_PATCH_RECORD_LEN: usize = 68;

const NP_WAS_DESERIALIZED: i32 = 1;
const NP_X_DIVS: i32 = 2;
const NP_Y_DIVS: i32 = 2;
const NP_COLORS: i32 = 9;
const NP_COLOR_PLACEHOLDER: i32 = 1;

/// Four-character chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    pub const IHDR: Self = Self(*b"IHDR");
    pub const IDAT: Self = Self(*b"IDAT");
    pub const IEND: Self = Self(*b"IEND");
    /// Compiled nine-patch record.
    pub const NPTC: Self = Self(*b"npTc");

    pub fn as_str(&self) -> String {
        self.0.iter().map(|&b| b as char).collect()
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One named block of a PNG container. The CRC is recomputed on encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub name: ChunkType,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(name: ChunkType, data: Vec<u8>) -> Self {
        Self { name, data }
    }
}

/// Error type for chunk parsing and `npTc` decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input does not start with the PNG signature.
    BadSignature,
    /// A chunk header or body runs past the end of the buffer.
    Truncated { offset: usize },
    /// Stored CRC does not match the chunk contents.
    CrcMismatch { name: ChunkType },
    /// No `IEND` chunk to insert in front of.
    MissingTerminal,
    /// No `IHDR` chunk, or one too short to hold the dimensions.
    MissingHeader,
    /// A record of the wrong size.
    BadLength { expected: usize, actual: usize },
    /// A count field that does not match what the encoder writes.
    UnexpectedCount { field: &'static str, expected: i32, actual: i32 },
    /// A decoded coordinate outside the image.
    InsetOutOfRange { field: &'static str, value: i32 },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::BadSignature => write!(f, "not a PNG file (bad signature)"),
            CodecError::Truncated { offset } => {
                write!(f, "truncated chunk at byte offset {}", offset)
            }
            CodecError::CrcMismatch { name } => write!(f, "CRC mismatch in {} chunk", name),
            CodecError::MissingTerminal => write!(f, "container has no IEND chunk"),
            CodecError::MissingHeader => write!(f, "container has no valid IHDR chunk"),
            CodecError::BadLength { expected, actual } => write!(
                f,
                "nine-patch record is {} bytes, expected {}",
                actual, expected
            ),
            CodecError::UnexpectedCount { field, expected, actual } => write!(
                f,
                "nine-patch record {} is {}, expected {}",
                field, actual, expected
            ),
            CodecError::InsetOutOfRange { field, value } => {
                write!(f, "nine-patch {} value {} is outside the image", field, value)
            }
        }
    }
}

impl std::error::Error for CodecError {}

// ============================================================================
// CRC-32 (ISO-HDLC, as used by PNG)
// ============================================================================

fn crc_table() -> &'static [u32; 256] {
    static TABLE: OnceLock<[u32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [0u32; 256];
        for n in 0..256u32 {
            let mut c = n;
            for _ in 0..8 {
                c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            }
            t[n as usize] = c;
        }
        t
    })
}

/// CRC-32 over a chunk's type followed by its data.
pub fn chunk_crc(name: &ChunkType, data: &[u8]) -> u32 {
    let table = crc_table();
    let mut c = 0xFFFF_FFFFu32;
    for &b in name.0.iter().chain(data.iter()) {
        c = table[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    c ^ 0xFFFF_FFFF
}

// ============================================================================
// CHUNK SURGERY
// ============================================================================

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Split a PNG byte stream into its chunks, in file order.
///
/// Validates the signature, every length and every CRC. Bytes after `IEND`
/// are ignored.
pub fn extract_chunks(bytes: &[u8]) -> Result<Vec<Chunk>, CodecError> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..8] != PNG_SIGNATURE {
        return Err(CodecError::BadSignature);
    }

    let mut chunks = Vec::new();
    let mut pos = PNG_SIGNATURE.len();
    while pos < bytes.len() {
        let truncated = CodecError::Truncated { offset: pos };
        let len = read_u32(bytes, pos).ok_or(truncated.clone())? as usize;
        let name_bytes = bytes.get(pos + 4..pos + 8).ok_or(truncated.clone())?;
        let name = ChunkType([name_bytes[0], name_bytes[1], name_bytes[2], name_bytes[3]]);
        let data_start = pos + 8;
        let data_end = data_start.checked_add(len).ok_or(truncated.clone())?;
        let data = bytes.get(data_start..data_end).ok_or(truncated.clone())?;
        let stored_crc = read_u32(bytes, data_end).ok_or(truncated)?;
        if stored_crc != chunk_crc(&name, data) {
            return Err(CodecError::CrcMismatch { name });
        }

        chunks.push(Chunk::new(name, data.to_vec()));
        pos = data_end + 4;
        if name == ChunkType::IEND {
            break;
        }
    }
    Ok(chunks)
}

/// Serialize chunks back into a PNG byte stream (signature included).
pub fn encode_chunks(chunks: &[Chunk]) -> Vec<u8> {
    let total: usize = chunks.iter().map(|c| c.data.len() + 12).sum();
    let mut out = Vec::with_capacity(PNG_SIGNATURE.len() + total);
    out.extend_from_slice(&PNG_SIGNATURE);
    for chunk in chunks {
        out.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&chunk.name.0);
        out.extend_from_slice(&chunk.data);
        out.extend_from_slice(&chunk_crc(&chunk.name, &chunk.data).to_be_bytes());
    }
    out
}

/// Insert `chunk` immediately before `IEND`, leaving every other chunk in
/// place and unchanged.
pub fn insert_before_terminal(mut chunks: Vec<Chunk>, chunk: Chunk) -> Result<Vec<Chunk>, CodecError> {
    let at = chunks
        .iter()
        .position(|c| c.name == ChunkType::IEND)
        .ok_or(CodecError::MissingTerminal)?;
    chunks.insert(at, chunk);
    Ok(chunks)
}

/// First chunk with the given name.
pub fn find_chunk<'a>(chunks: &'a [Chunk], name: ChunkType) -> Option<&'a Chunk> {
    chunks.iter().find(|c| c.name == name)
}

/// Drop every chunk with the given name; all others keep their order.
pub fn remove_chunks(chunks: Vec<Chunk>, name: ChunkType) -> Vec<Chunk> {
    chunks.into_iter().filter(|c| c.name != name).collect()
}

/// `(width, height)` from the `IHDR` chunk.
pub fn ihdr_dimensions(chunks: &[Chunk]) -> Result<(u32, u32), CodecError> {
    let ihdr = find_chunk(chunks, ChunkType::IHDR).ok_or(CodecError::MissingHeader)?;
    let w = read_u32(&ihdr.data, 0).ok_or(CodecError::MissingHeader)?;
    let h = read_u32(&ihdr.data, 4).ok_or(CodecError::MissingHeader)?;
    Ok((w, h))
}

// ============================================================================
// NINE-PATCH RECORD
// ============================================================================

/// Stretch and padding insets, in pixels, as stored in a compiled image.
///
/// `*_left/top` are distances from the leading edge, `*_right/bottom` from
/// the trailing edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetadataBlock {
    pub stretch_left: u32,
    pub stretch_right: u32,
    pub stretch_top: u32,
    pub stretch_bottom: u32,
    pub pad_left: u32,
    pub pad_right: u32,
    pub pad_top: u32,
    pub pad_bottom: u32,
}

impl MetadataBlock {
    /// Serialize into the fixed big-endian `npTc` layout.
    ///
    /// The stretch region is written as absolute start/end coordinates, so the
    /// image size is needed to turn the right/bottom insets back into ends.
    pub fn encode(&self, width: u32, height: u32) -> [u8; NINE_PATCH_RECORD_LEN] {
        let fields: [i32; 16] = [
            NP_WAS_DESERIALIZED,
            NP_X_DIVS,
            NP_Y_DIVS,
            NP_COLORS,
            self.pad_left as i32,
            self.pad_right as i32,
            self.pad_top as i32,
            self.pad_bottom as i32,
            self.stretch_left as i32,
            width.saturating_sub(self.stretch_right) as i32,
            self.stretch_top as i32,
            height.saturating_sub(self.stretch_bottom) as i32,
            NP_COLOR_PLACEHOLDER,
            NP_COLOR_PLACEHOLDER,
            NP_COLOR_PLACEHOLDER,
            NP_COLOR_PLACEHOLDER,
        ];
        let mut out = [0u8; NINE_PATCH_RECORD_LEN];
        for (i, v) in fields.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&v.to_be_bytes());
        }
        out
    }

    /// Exact inverse of [`encode`](Self::encode) for the same image size.
    pub fn decode(data: &[u8], width: u32, height: u32) -> Result<Self, CodecError> {
        if data.len() != NINE_PATCH_RECORD_LEN {
            return Err(CodecError::BadLength {
                expected: NINE_PATCH_RECORD_LEN,
                actual: data.len(),
            });
        }
        let field = |i: usize| -> i32 {
            i32::from_be_bytes([data[i * 4], data[i * 4 + 1], data[i * 4 + 2], data[i * 4 + 3]])
        };

        for (idx, name, expected) in [
            (1, "x-divider count", NP_X_DIVS),
            (2, "y-divider count", NP_Y_DIVS),
            (3, "color count", NP_COLORS),
        ] {
            let actual = field(idx);
            if actual != expected {
                return Err(CodecError::UnexpectedCount { field: name, expected, actual });
            }
        }

        let within = |name: &'static str, value: i32, limit: u32| -> Result<u32, CodecError> {
            if value < 0 || value as u32 > limit {
                Err(CodecError::InsetOutOfRange { field: name, value })
            } else {
                Ok(value as u32)
            }
        };

        let pad_left = within("padding left", field(4), width)?;
        let pad_right = within("padding right", field(5), width)?;
        let pad_top = within("padding top", field(6), height)?;
        let pad_bottom = within("padding bottom", field(7), height)?;
        let stretch_x_start = within("stretch x start", field(8), width)?;
        let stretch_x_end = within("stretch x end", field(9), width)?;
        let stretch_y_start = within("stretch y start", field(10), height)?;
        let stretch_y_end = within("stretch y end", field(11), height)?;

        Ok(Self {
            stretch_left: stretch_x_start,
            stretch_right: width - stretch_x_end,
            stretch_top: stretch_y_start,
            stretch_bottom: height - stretch_y_end,
            pad_left,
            pad_right,
            pad_top,
            pad_bottom,
        })
    }

    pub fn to_chunk(&self, width: u32, height: u32) -> Chunk {
        Chunk::new(ChunkType::NPTC, self.encode(width, height).to_vec())
    }
}

/// Add an `npTc` chunk to an encoded PNG, just before `IEND`.
pub fn embed_metadata(png: &[u8], block: &MetadataBlock) -> Result<Vec<u8>, CodecError> {
    let chunks = extract_chunks(png)?;
    let (w, h) = ihdr_dimensions(&chunks)?;
    let chunks = insert_before_terminal(chunks, block.to_chunk(w, h))?;
    Ok(encode_chunks(&chunks))
}

/// Read the `npTc` record from an encoded PNG, if it has one.
pub fn read_metadata(png: &[u8]) -> Result<Option<MetadataBlock>, CodecError> {
    let chunks = extract_chunks(png)?;
    let (w, h) = ihdr_dimensions(&chunks)?;
    match find_chunk(&chunks, ChunkType::NPTC) {
        Some(chunk) => MetadataBlock::decode(&chunk.data, w, h).map(Some),
        None => Ok(None),
    }
}
