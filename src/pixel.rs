//! Typed pixel views of a [`Bitmap`].
//!
//! Uses `imgref::ImgVec` for 2D pixel data with typed pixels from the `rgb` crate.

use alloc::vec::Vec;
use imgref::ImgVec;
use rgb::alt::GrayAlpha;
use rgb::{Gray, Rgb, Rgba};

use crate::{Bitmap, BitmapError, ChannelLayout};

/// Decoded pixel data in a typed buffer.
///
/// The variant determines the pixel format. Width and height are embedded
/// in the `ImgVec`.
#[non_exhaustive]
pub enum PixelData {
    Gray8(ImgVec<Gray<u8>>),
    GrayA8(ImgVec<GrayAlpha<u8>>),
    Rgb8(ImgVec<Rgb<u8>>),
    Rgba8(ImgVec<Rgba<u8>>),
}

impl PixelData {
    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            PixelData::Gray8(img) => img.width() as u32,
            PixelData::GrayA8(img) => img.width() as u32,
            PixelData::Rgb8(img) => img.width() as u32,
            PixelData::Rgba8(img) => img.width() as u32,
        }
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            PixelData::Gray8(img) => img.height() as u32,
            PixelData::GrayA8(img) => img.height() as u32,
            PixelData::Rgb8(img) => img.height() as u32,
            PixelData::Rgba8(img) => img.height() as u32,
        }
    }

    /// Channel layout of the pixels.
    pub fn layout(&self) -> ChannelLayout {
        match self {
            PixelData::Gray8(_) => ChannelLayout::Gray,
            PixelData::GrayA8(_) => ChannelLayout::GrayAlpha,
            PixelData::Rgb8(_) => ChannelLayout::Rgb,
            PixelData::Rgba8(_) => ChannelLayout::Rgba,
        }
    }

    /// Whether this pixel data has an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.layout().has_alpha()
    }

    /// Convert to RGBA8 by reference, allocating a new buffer.
    ///
    /// Gray is replicated into R, G and B. Missing alpha becomes 255.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        match self {
            PixelData::Rgba8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                ImgVec::new(buf.into_owned(), w, h)
            }
            PixelData::Rgb8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgba: Vec<Rgba<u8>> = buf
                    .iter()
                    .map(|p| Rgba {
                        r: p.r,
                        g: p.g,
                        b: p.b,
                        a: 255,
                    })
                    .collect();
                ImgVec::new(rgba, w, h)
            }
            PixelData::Gray8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgba: Vec<Rgba<u8>> = buf
                    .iter()
                    .map(|p| {
                        let v = p.value();
                        Rgba {
                            r: v,
                            g: v,
                            b: v,
                            a: 255,
                        }
                    })
                    .collect();
                ImgVec::new(rgba, w, h)
            }
            PixelData::GrayA8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgba: Vec<Rgba<u8>> = buf
                    .iter()
                    .map(|p| Rgba {
                        r: p.0,
                        g: p.0,
                        b: p.0,
                        a: p.1,
                    })
                    .collect();
                ImgVec::new(rgba, w, h)
            }
        }
    }

    /// Convert to RGBA8, consuming self.
    ///
    /// Avoids a clone when the data is already Rgba8.
    pub fn into_rgba8(self) -> ImgVec<Rgba<u8>> {
        match self {
            PixelData::Rgba8(img) => img,
            other => other.to_rgba8(),
        }
    }

    /// Flatten back into a [`Bitmap`].
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError::InvalidDimensions`] for an empty image.
    pub fn into_bitmap(self) -> Result<Bitmap, BitmapError> {
        let layout = self.layout();
        let (width, height) = (self.width(), self.height());
        let bytes: Vec<u8> = match self {
            PixelData::Gray8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.iter().map(|p| p.value()).collect()
            }
            PixelData::GrayA8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.iter().flat_map(|p| [p.0, p.1]).collect()
            }
            PixelData::Rgb8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
            }
            PixelData::Rgba8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect()
            }
        };
        Bitmap::new(width, height, layout, bytes)
    }
}

impl Bitmap {
    /// Convert into typed pixels, consuming the bitmap.
    pub fn into_pixels(self) -> PixelData {
        let (data, width, height, layout) = self.into_parts();
        let (w, h) = (width as usize, height as usize);
        match layout {
            ChannelLayout::Gray => {
                let px = data.into_iter().map(Gray::new).collect();
                PixelData::Gray8(ImgVec::new(px, w, h))
            }
            ChannelLayout::GrayAlpha => {
                let px = data
                    .chunks_exact(2)
                    .map(|c| GrayAlpha::new(c[0], c[1]))
                    .collect();
                PixelData::GrayA8(ImgVec::new(px, w, h))
            }
            ChannelLayout::Rgb => {
                let px = data
                    .chunks_exact(3)
                    .map(|c| Rgb {
                        r: c[0],
                        g: c[1],
                        b: c[2],
                    })
                    .collect();
                PixelData::Rgb8(ImgVec::new(px, w, h))
            }
            ChannelLayout::Rgba => {
                let px = data
                    .chunks_exact(4)
                    .map(|c| Rgba {
                        r: c[0],
                        g: c[1],
                        b: c[2],
                        a: c[3],
                    })
                    .collect();
                PixelData::Rgba8(ImgVec::new(px, w, h))
            }
        }
    }
}

impl core::fmt::Debug for PixelData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let variant = match self {
            PixelData::Gray8(_) => "Gray8",
            PixelData::GrayA8(_) => "GrayA8",
            PixelData::Rgb8(_) => "Rgb8",
            PixelData::Rgba8(_) => "Rgba8",
        };
        write!(
            f,
            "PixelData::{}({}x{})",
            variant,
            self.width(),
            self.height()
        )
    }
}
