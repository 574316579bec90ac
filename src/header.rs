//! PNG signature detection and IHDR probing.
//!
//! This is the only part of the PNG container parsed outside the decode
//! engine. It reads the fixed-size prefix (signature + IHDR) so that bad
//! input and oversized images are rejected before the engine runs.

use crate::ImageInfo;

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes needed to read the signature and a complete IHDR chunk
/// (8 signature + 4 length + 4 type + 13 data + 4 CRC).
pub(crate) const MIN_PROBE_BYTES: usize = 33;

const IHDR_TYPE: &[u8; 4] = b"IHDR";
const IHDR_DATA_LEN: u32 = 13;

/// Whether `data` starts with the PNG signature.
pub fn has_png_signature(data: &[u8]) -> bool {
    data.len() >= PNG_SIGNATURE.len() && data[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// PNG color type as declared in the IHDR chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorType {
    /// Grayscale samples.
    Gray = 0,
    /// Red, green, blue samples.
    Rgb = 2,
    /// Palette indices (PLTE chunk, optional tRNS).
    Indexed = 3,
    /// Grayscale + alpha samples.
    GrayAlpha = 4,
    /// Red, green, blue, alpha samples.
    Rgba = 6,
}

impl ColorType {
    /// Map the IHDR color type byte. Returns `None` for reserved values.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Gray),
            2 => Some(Self::Rgb),
            3 => Some(Self::Indexed),
            4 => Some(Self::GrayAlpha),
            6 => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Whether `depth` is a legal bit depth for this color type.
    pub const fn allows_bit_depth(self, depth: u8) -> bool {
        match self {
            Self::Gray => matches!(depth, 1 | 2 | 4 | 8 | 16),
            Self::Indexed => matches!(depth, 1 | 2 | 4 | 8),
            Self::Rgb | Self::GrayAlpha | Self::Rgba => matches!(depth, 8 | 16),
        }
    }

    /// Whether samples of this color type carry an explicit alpha channel.
    pub const fn has_alpha_channel(self) -> bool {
        matches!(self, Self::GrayAlpha | Self::Rgba)
    }
}

/// Read the IHDR chunk that must directly follow the signature.
///
/// Returns `None` when the signature is missing, the data ends before the
/// IHDR chunk is complete, the first chunk is not a 13-byte IHDR, or the
/// color type / bit depth combination is not one PNG defines. Those cases
/// are reported by the decode engine with its own diagnostics.
///
/// Zero dimensions are returned as-is; rejecting them is the caller's job.
/// The chunk CRC is not verified here.
pub fn probe_ihdr(data: &[u8]) -> Option<ImageInfo> {
    if !has_png_signature(data) || data.len() < MIN_PROBE_BYTES {
        return None;
    }
    let chunk = &data[PNG_SIGNATURE.len()..MIN_PROBE_BYTES];
    if read_u32_be(&chunk[0..4]) != IHDR_DATA_LEN || &chunk[4..8] != IHDR_TYPE {
        return None;
    }
    let body = &chunk[8..21];
    let width = read_u32_be(&body[0..4]);
    let height = read_u32_be(&body[4..8]);
    let bit_depth = body[8];
    let color_type = ColorType::from_u8(body[9])?;
    if !color_type.allows_bit_depth(bit_depth) {
        return None;
    }
    let interlaced = match body[12] {
        0 => false,
        1 => true,
        _ => return None,
    };
    Some(ImageInfo::new(width, height, color_type, bit_depth).with_interlaced(interlaced))
}

/// tRNS color key of a gray or RGB image.
///
/// Pixels whose samples all equal the key are fully transparent. Samples
/// are kept at full 16-bit precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ColorKey {
    samples: [u16; 3],
    channels: usize,
}

impl ColorKey {
    /// Samples per pixel the key applies to (1 for gray, 3 for RGB).
    pub(crate) fn channels(&self) -> usize {
        self.channels
    }

    pub(crate) fn matches(&self, pixel: &[u16]) -> bool {
        pixel == &self.samples[..self.channels]
    }
}

/// Find the tRNS color key of a gray or RGB image.
///
/// Walks the chunks between IHDR and the first IDAT. Returns `None` for
/// other color types, when no well-sized tRNS chunk precedes the image
/// data, or when the stream ends first. CRCs are left to the engine.
pub(crate) fn color_key(data: &[u8], color_type: ColorType) -> Option<ColorKey> {
    let channels = match color_type {
        ColorType::Gray => 1,
        ColorType::Rgb => 3,
        _ => return None,
    };
    let mut pos = MIN_PROBE_BYTES;
    loop {
        let head = data.get(pos..pos.checked_add(8)?)?;
        let len = read_u32_be(&head[0..4]) as usize;
        let kind = &head[4..8];
        if kind == b"IDAT" {
            return None;
        }
        let body_start = pos + 8;
        let body = data.get(body_start..body_start.checked_add(len)?)?;
        if kind == b"tRNS" {
            if body.len() != channels * 2 {
                return None;
            }
            let mut samples = [0u16; 3];
            for (sample, pair) in samples.iter_mut().zip(body.chunks_exact(2)) {
                *sample = u16::from_be_bytes([pair[0], pair[1]]);
            }
            return Some(ColorKey { samples, channels });
        }
        pos = body_start.checked_add(len)?.checked_add(4)?;
    }
}

fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
