//! Validated in-memory bitmap.
//!
//! A [`Bitmap`] is a dense, row-major, tightly packed 8-bit pixel buffer
//! tagged with its dimensions and [`ChannelLayout`]. The buffer length
//! always equals `width * height * layout.bytes_per_pixel()`; the public
//! constructor checks it.

use alloc::vec::Vec;
use core::fmt;
use core::slice::ChunksExact;

// ---------------------------------------------------------------------------
// ChannelLayout
// ---------------------------------------------------------------------------

/// Channel layout (number and meaning of channels).
///
/// Every channel is one 8-bit sample, so the channel count is also the
/// number of bytes per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelLayout {
    /// Single luminance channel.
    Gray = 1,
    /// Luminance + alpha.
    GrayAlpha = 2,
    /// Red, green, blue.
    Rgb = 3,
    /// Red, green, blue, alpha.
    Rgba = 4,
}

impl ChannelLayout {
    /// Number of channels in this layout.
    #[inline]
    pub const fn channels(self) -> usize {
        self as usize
    }

    /// Bytes per pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.channels()
    }

    /// Whether this layout includes an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::GrayAlpha | Self::Rgba)
    }

    /// The same color model with an alpha channel.
    #[inline]
    pub const fn with_alpha(self) -> Self {
        match self {
            Self::Gray | Self::GrayAlpha => Self::GrayAlpha,
            Self::Rgb | Self::Rgba => Self::Rgba,
        }
    }

    /// Layout with the given channel count.
    pub const fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(Self::Gray),
            2 => Some(Self::GrayAlpha),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BitmapError
// ---------------------------------------------------------------------------

/// Errors from [`Bitmap`] construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BitmapError {
    /// Width or height is zero.
    InvalidDimensions,
    /// `width * height * bpp` does not fit in `usize`.
    Overflow,
    /// Buffer length does not match the dimensions and layout.
    LengthMismatch {
        /// Length required by the dimensions and layout.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },
}

impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions => write!(f, "width or height is zero"),
            Self::Overflow => write!(f, "bitmap size overflows usize"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "buffer holds {actual} bytes, dimensions need {expected}")
            }
        }
    }
}

impl core::error::Error for BitmapError {}

// ---------------------------------------------------------------------------
// Bitmap
// ---------------------------------------------------------------------------

/// Owned 8-bit pixel buffer with dimensions and layout.
///
/// Rows run top to bottom, pixels left to right, with no padding between
/// rows.
///
/// ```
/// use zenpng_loader::{Bitmap, ChannelLayout};
///
/// let bitmap = Bitmap::new(2, 1, ChannelLayout::Rgb, vec![255, 0, 0, 0, 0, 255]).unwrap();
/// assert_eq!(bitmap.pixel(1, 0), Some(&[0, 0, 255][..]));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bitmap {
    data: Vec<u8>,
    width: u32,
    height: u32,
    layout: ChannelLayout,
}

impl Bitmap {
    /// Wrap `data` as a bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError::InvalidDimensions`] for a zero width or
    /// height, and [`BitmapError::LengthMismatch`] when `data.len()` is not
    /// exactly `width * height * layout.bytes_per_pixel()`.
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        data: Vec<u8>,
    ) -> Result<Self, BitmapError> {
        let expected = Self::byte_len(width, height, layout)?;
        if data.len() != expected {
            return Err(BitmapError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// Assemble a bitmap whose shape the caller has already validated.
    pub(crate) fn from_validated(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        data: Vec<u8>,
    ) -> Self {
        debug_assert_eq!(Self::byte_len(width, height, layout), Ok(data.len()));
        Self {
            data,
            width,
            height,
            layout,
        }
    }

    /// Buffer length a bitmap of this shape requires.
    pub fn byte_len(width: u32, height: u32, layout: ChannelLayout) -> Result<usize, BitmapError> {
        if width == 0 || height == 0 {
            return Err(BitmapError::InvalidDimensions);
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(layout.bytes_per_pixel()))
            .ok_or(BitmapError::Overflow)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel layout.
    #[inline]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    /// The whole pixel buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the bitmap and return the pixel buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Consume the bitmap and return `(data, width, height, layout)`.
    pub fn into_parts(self) -> (Vec<u8>, u32, u32, ChannelLayout) {
        (self.data, self.width, self.height, self.layout)
    }

    /// Pixel bytes for row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> ChunksExact<'_, u8> {
        self.data.chunks_exact(self.stride())
    }

    /// Bytes of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.layout.bytes_per_pixel();
        let start = y as usize * self.stride() + x as usize * bpp;
        self.data.get(start..start + bpp)
    }
}

impl AsRef<[u8]> for Bitmap {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bitmap({}x{}, {:?})",
            self.width, self.height, self.layout
        )
    }
}
