//! Ceilings a [`PngLoader`](crate::PngLoader) enforces before it commits
//! memory to an image.
//!
//! A PNG declares its size in the 13-byte IHDR chunk, long before any pixel
//! data arrives. The loader reads those fields itself and runs them through
//! [`ResourceLimits`] before the decode engine is started, so a few dozen
//! hostile bytes can never make it reserve gigabytes. The same checks run a
//! second time on the engine's own view of the header, and once more on the
//! exact length of every bitmap buffer (decoded or converted) right before
//! it is reserved. A failed check is reported as a [`LimitExceeded`].

/// Ceilings for one load.
///
/// Each ceiling is optional and inclusive: a 4096-pixel-wide image passes
/// `with_max_width(4096)`. [`PngLoader::new`](crate::PngLoader::new) starts
/// from [`default_decode`](Self::default_decode); [`none`](Self::none)
/// trusts the input completely.
///
/// # Example
///
/// ```
/// use zenpng_loader::{PngLoader, ResourceLimits};
///
/// // thumbnails only: nothing wider than 1024 or larger than 4 MiB decoded
/// let limits = ResourceLimits::none()
///     .with_max_width(1024)
///     .with_max_memory(4 << 20);
/// let loader = PngLoader::new().with_limits(limits);
/// assert_eq!(loader.limits().max_width, Some(1024));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ResourceLimits {
    /// Largest `width * height` accepted from IHDR.
    pub max_pixels: Option<u64>,
    /// Largest 8-bit bitmap buffer, in bytes, the loader will reserve.
    pub max_memory_bytes: Option<u64>,
    /// Largest IHDR width.
    pub max_width: Option<u32>,
    /// Largest IHDR height.
    pub max_height: Option<u32>,
    /// Largest encoded PNG accepted, in bytes.
    pub max_file_size: Option<u64>,
}

impl ResourceLimits {
    /// Pixel ceiling of [`default_decode()`](Self::default_decode).
    pub const DEFAULT_MAX_PIXELS: u64 = 50_000_000;

    /// Bitmap buffer ceiling of [`default_decode()`](Self::default_decode), 1 GiB.
    pub const DEFAULT_MAX_MEMORY: u64 = 1 << 30;

    /// Accept any image the engine can decode.
    pub fn none() -> Self {
        Self::default()
    }

    /// The loader's defaults: 50 megapixels and a 1 GiB bitmap.
    pub fn default_decode() -> Self {
        Self::none()
            .with_max_pixels(Self::DEFAULT_MAX_PIXELS)
            .with_max_memory(Self::DEFAULT_MAX_MEMORY)
    }

    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    /// Caps every buffer the loader reserves, including the one
    /// [`load_as`](crate::PngLoader::load_as) converts into.
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Rejects oversized input before its signature is even looked at.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// `false` only for [`none()`](Self::none).
    pub fn has_any(&self) -> bool {
        self.max_pixels.is_some()
            || self.max_memory_bytes.is_some()
            || self.max_width.is_some()
            || self.max_height.is_some()
            || self.max_file_size.is_some()
    }

    // --- Checks run by the loader ---

    /// Guards against crafted headers that claim huge dimensions.
    ///
    /// Width is checked first, then height, then their product, so the
    /// error names the first ceiling an IHDR breaks.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_width
            && width > max
        {
            return Err(LimitExceeded::Width { actual: width, max });
        }
        if let Some(max) = self.max_height
            && height > max
        {
            return Err(LimitExceeded::Height {
                actual: height,
                max,
            });
        }
        let pixels = u64::from(width) * u64::from(height);
        match self.max_pixels {
            Some(max) if pixels > max => Err(LimitExceeded::Pixels {
                actual: pixels,
                max,
            }),
            _ => Ok(()),
        }
    }

    /// Guards the reservation of a bitmap buffer of `bytes` bytes.
    pub fn check_memory(&self, bytes: u64) -> Result<(), LimitExceeded> {
        match self.max_memory_bytes {
            Some(max) if bytes > max => Err(LimitExceeded::Memory { actual: bytes, max }),
            _ => Ok(()),
        }
    }

    /// Guards against oversized input handed to the loader.
    pub fn check_file_size(&self, bytes: u64) -> Result<(), LimitExceeded> {
        match self.max_file_size {
            Some(max) if bytes > max => Err(LimitExceeded::FileSize { actual: bytes, max }),
            _ => Ok(()),
        }
    }

    /// Guards against a screened IHDR: its dimensions, and the smallest
    /// 8-bit bitmap an image of that color type can decode to.
    pub fn check_image_info(&self, info: &crate::ImageInfo) -> Result<(), LimitExceeded> {
        self.check_dimensions(info.width, info.height)?;
        self.check_memory(info.min_output_bytes())
    }
}

/// The ceiling an image broke, with the value it declared.
///
/// Reaches callers as [`DecodeError::ImageTooLarge`](crate::DecodeError::ImageTooLarge).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LimitExceeded {
    /// IHDR width above `max_width`.
    Width {
        /// Declared width.
        actual: u32,
        /// Ceiling.
        max: u32,
    },
    /// IHDR height above `max_height`.
    Height {
        /// Declared height.
        actual: u32,
        /// Ceiling.
        max: u32,
    },
    /// `width * height` above `max_pixels`.
    Pixels {
        /// Declared pixel count.
        actual: u64,
        /// Ceiling.
        max: u64,
    },
    /// A bitmap buffer larger than `max_memory_bytes`.
    Memory {
        /// Bytes the buffer would need.
        actual: u64,
        /// Ceiling.
        max: u64,
    },
    /// Encoded input larger than `max_file_size`.
    FileSize {
        /// Input length in bytes.
        actual: u64,
        /// Ceiling.
        max: u64,
    },
    /// The bitmap length does not fit in `usize`.
    Overflow,
}

impl core::fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Width { actual, max } => write!(f, "width {actual} exceeds limit {max}"),
            Self::Height { actual, max } => write!(f, "height {actual} exceeds limit {max}"),
            Self::Pixels { actual, max } => {
                write!(f, "pixel count {actual} exceeds limit {max}")
            }
            Self::Memory { actual, max } => {
                write!(f, "memory {actual} bytes exceeds limit {max}")
            }
            Self::FileSize { actual, max } => {
                write!(f, "file size {actual} bytes exceeds limit {max}")
            }
            Self::Overflow => f.write_str("buffer size overflows the address space"),
        }
    }
}

impl core::error::Error for LimitExceeded {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageInfo;
    use crate::header::ColorType;

    #[test]
    fn none_trusts_the_largest_header() {
        let limits = ResourceLimits::none();
        assert!(!limits.has_any());
        assert_eq!(limits.check_dimensions(u32::MAX, u32::MAX), Ok(()));
        assert_eq!(limits.check_memory(u64::MAX), Ok(()));
        assert_eq!(limits.check_file_size(u64::MAX), Ok(()));
    }

    #[test]
    fn loader_defaults_cap_pixels_and_memory_only() {
        let limits = ResourceLimits::default_decode();
        assert!(limits.has_any());
        assert_eq!(limits.max_pixels, Some(50_000_000));
        assert_eq!(limits.max_memory_bytes, Some(1024 * 1024 * 1024));
        assert_eq!((limits.max_width, limits.max_height), (None, None));
        assert_eq!(limits.max_file_size, None);
        // a single ceiling is enough to count as limited
        assert!(ResourceLimits::none().with_max_file_size(1).has_any());
    }

    #[test]
    fn ceilings_are_inclusive() {
        let limits = ResourceLimits::none()
            .with_max_width(640)
            .with_max_height(480)
            .with_max_pixels(640 * 480)
            .with_max_memory(640 * 480 * 4)
            .with_max_file_size(64);
        assert_eq!(limits.check_dimensions(640, 480), Ok(()));
        assert_eq!(limits.check_memory(640 * 480 * 4), Ok(()));
        assert_eq!(limits.check_file_size(64), Ok(()));
        assert_eq!(
            limits.check_file_size(65),
            Err(LimitExceeded::FileSize { actual: 65, max: 64 })
        );
    }

    #[test]
    fn first_broken_ceiling_is_reported() {
        let limits = ResourceLimits::none()
            .with_max_width(256)
            .with_max_height(256)
            .with_max_pixels(1024);
        // breaks all three; width wins
        assert_eq!(
            limits.check_dimensions(300, 300),
            Err(LimitExceeded::Width {
                actual: 300,
                max: 256
            })
        );
        assert_eq!(
            limits.check_dimensions(1, 257),
            Err(LimitExceeded::Height {
                actual: 257,
                max: 256
            })
        );
        // a tall strip fits each side but not the pixel budget
        assert_eq!(
            limits.check_dimensions(200, 6),
            Err(LimitExceeded::Pixels {
                actual: 1200,
                max: 1024
            })
        );
    }

    #[test]
    fn pixel_count_of_a_forged_header_does_not_wrap() {
        let limits = ResourceLimits::default_decode();
        assert_eq!(
            limits.check_dimensions(0x8000_0000, 0x8000_0000),
            Err(LimitExceeded::Pixels {
                actual: 1 << 62,
                max: ResourceLimits::DEFAULT_MAX_PIXELS
            })
        );
    }

    #[test]
    fn screened_header_is_charged_its_smallest_bitmap() {
        // 16-bit RGBA still decodes to 4 bytes per pixel
        let info = ImageInfo::new(1000, 1000, ColorType::Rgba, 16);
        let limits = ResourceLimits::none().with_max_memory(4_000_000);
        assert_eq!(limits.check_image_info(&info), Ok(()));

        let limits = ResourceLimits::none().with_max_memory(3_999_999);
        assert_eq!(
            limits.check_image_info(&info),
            Err(LimitExceeded::Memory {
                actual: 4_000_000,
                max: 3_999_999
            })
        );

        let limits = ResourceLimits::none().with_max_height(999);
        assert!(matches!(
            limits.check_image_info(&info),
            Err(LimitExceeded::Height { .. })
        ));
    }

    #[test]
    fn messages_name_the_value_and_the_ceiling() {
        use alloc::string::ToString;

        let cases = [
            (
                LimitExceeded::Width {
                    actual: 5000,
                    max: 4096,
                },
                "width 5000 exceeds limit 4096",
            ),
            (
                LimitExceeded::Height {
                    actual: 70_000,
                    max: 65_535,
                },
                "height 70000 exceeds limit 65535",
            ),
            (
                LimitExceeded::Pixels {
                    actual: 20_000_000,
                    max: 16_000_000,
                },
                "pixel count 20000000 exceeds limit 16000000",
            ),
            (
                LimitExceeded::Memory {
                    actual: 1024,
                    max: 256,
                },
                "memory 1024 bytes exceeds limit 256",
            ),
            (
                LimitExceeded::FileSize { actual: 9, max: 8 },
                "file size 9 bytes exceeds limit 8",
            ),
            (
                LimitExceeded::Overflow,
                "buffer size overflows the address space",
            ),
        ];
        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn limit_errors_box_as_std_errors() {
        let boxed: alloc::boxed::Box<dyn core::error::Error> = alloc::boxed::Box::new(
            LimitExceeded::Memory {
                actual: 2,
                max: 1,
            },
        );
        assert!(boxed.source().is_none());
    }
}
