//! Image metadata obtained from probing.

use crate::ChannelLayout;
use crate::header::ColorType;

/// Header-level facts about a PNG, read from its IHDR chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ImageInfo {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Color type stored in the file.
    pub color_type: ColorType,
    /// Bits per sample stored in the file (1, 2, 4, 8 or 16).
    pub bit_depth: u8,
    /// Whether the pixel data uses Adam7 interlacing.
    ///
    /// Decoded bitmaps are always de-interlaced.
    pub interlaced: bool,
}

impl ImageInfo {
    /// Create a new non-interlaced `ImageInfo`.
    pub fn new(width: u32, height: u32, color_type: ColorType, bit_depth: u8) -> Self {
        Self {
            width,
            height,
            color_type,
            bit_depth,
            interlaced: false,
        }
    }

    /// Set whether the image is interlaced.
    pub fn with_interlaced(mut self, interlaced: bool) -> Self {
        self.interlaced = interlaced;
        self
    }

    /// Total pixel count.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Layout the loader will produce for this image.
    ///
    /// Exact for every color type except [`ColorType::Indexed`], whose
    /// output becomes [`ChannelLayout::Rgba`] when the file carries a tRNS
    /// chunk. The same holds for gray and RGB images with a tRNS color key.
    /// Neither is visible from the IHDR alone.
    pub fn canonical_layout(&self) -> ChannelLayout {
        match self.color_type {
            ColorType::Gray => ChannelLayout::Gray,
            ColorType::GrayAlpha => ChannelLayout::GrayAlpha,
            ColorType::Rgb | ColorType::Indexed => ChannelLayout::Rgb,
            ColorType::Rgba => ChannelLayout::Rgba,
        }
    }

    /// Whether the stored samples include an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.color_type.has_alpha_channel()
    }

    /// Lower bound of the decoded bitmap size in bytes.
    ///
    /// Saturates instead of overflowing.
    pub fn min_output_bytes(&self) -> u64 {
        self.pixel_count()
            .saturating_mul(self.canonical_layout().bytes_per_pixel() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_layouts() {
        let cases = [
            (ColorType::Gray, ChannelLayout::Gray),
            (ColorType::GrayAlpha, ChannelLayout::GrayAlpha),
            (ColorType::Rgb, ChannelLayout::Rgb),
            (ColorType::Indexed, ChannelLayout::Rgb),
            (ColorType::Rgba, ChannelLayout::Rgba),
        ];
        for (color, layout) in cases {
            assert_eq!(ImageInfo::new(1, 1, color, 8).canonical_layout(), layout);
        }
    }

    #[test]
    fn output_bytes_ignores_source_depth() {
        let info = ImageInfo::new(10, 20, ColorType::Rgb, 16);
        assert_eq!(info.pixel_count(), 200);
        assert_eq!(info.min_output_bytes(), 600);
    }

    #[test]
    fn output_bytes_saturates() {
        let info = ImageInfo::new(u32::MAX, u32::MAX, ColorType::Rgba, 8);
        assert_eq!(info.min_output_bytes(), u64::MAX);
    }

    #[test]
    fn interlace_builder() {
        let info = ImageInfo::new(4, 4, ColorType::Gray, 1).with_interlaced(true);
        assert!(info.interlaced);
        assert!(!info.has_alpha());
    }
}
