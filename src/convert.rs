//! Layout conversion for decoded bitmaps.
//!
//! Widening conversions replicate gray into R, G and B and add an opaque
//! alpha of 255. Dropping alpha composites the pixel over opaque white.
//! Color to gray uses BT.601 luma weights.

use alloc::vec::Vec;

use crate::{Bitmap, ChannelLayout, DecodeError, LimitExceeded};

const WHITE: u8 = 255;

/// Buffer length of a `width` x `height` bitmap in `layout`.
///
/// Sizes that do not fit in `usize` are reported as
/// [`LimitExceeded::Overflow`].
pub(crate) fn output_len(
    width: u32,
    height: u32,
    layout: ChannelLayout,
) -> Result<usize, DecodeError> {
    Bitmap::byte_len(width, height, layout)
        .map_err(|_| DecodeError::ImageTooLarge(LimitExceeded::Overflow))
}

/// Convert `src` to `target`, allocating a new bitmap.
///
/// # Errors
///
/// Returns [`DecodeError::OutOfMemory`] if the output buffer cannot be
/// allocated, and [`DecodeError::ImageTooLarge`] if its size overflows
/// `usize`.
pub fn convert(src: &Bitmap, target: ChannelLayout) -> Result<Bitmap, DecodeError> {
    let from = src.layout();
    if from == target {
        return Ok(src.clone());
    }
    let len = output_len(src.width(), src.height(), target)?;
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| DecodeError::OutOfMemory { bytes: len })?;

    for px in src.as_bytes().chunks_exact(from.bytes_per_pixel()) {
        let (r, g, b, a) = expand(from, px);
        match target {
            ChannelLayout::Gray => out.push(luma(flatten(r, a), flatten(g, a), flatten(b, a))),
            ChannelLayout::GrayAlpha => out.extend_from_slice(&[luma(r, g, b), a]),
            ChannelLayout::Rgb => {
                out.extend_from_slice(&[flatten(r, a), flatten(g, a), flatten(b, a)])
            }
            ChannelLayout::Rgba => out.extend_from_slice(&[r, g, b, a]),
        }
    }

    Ok(Bitmap::from_validated(src.width(), src.height(), target, out))
}

impl Bitmap {
    /// Convert to another channel layout. See [`convert`].
    pub fn to_layout(&self, target: ChannelLayout) -> Result<Bitmap, DecodeError> {
        convert(self, target)
    }
}

/// Widen one pixel to `(r, g, b, a)`.
#[inline]
fn expand(layout: ChannelLayout, px: &[u8]) -> (u8, u8, u8, u8) {
    match layout {
        ChannelLayout::Gray => (px[0], px[0], px[0], 255),
        ChannelLayout::GrayAlpha => (px[0], px[0], px[0], px[1]),
        ChannelLayout::Rgb => (px[0], px[1], px[2], 255),
        ChannelLayout::Rgba => (px[0], px[1], px[2], px[3]),
    }
}

/// Composite `c` with coverage `a` over white.
#[inline]
fn flatten(c: u8, a: u8) -> u8 {
    let (c, a) = (c as u32, a as u32);
    ((c * a + WHITE as u32 * (255 - a) + 127) / 255) as u8
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}
