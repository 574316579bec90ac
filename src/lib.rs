//! Load PNG images into validated in-memory bitmaps.
//!
//! This crate is a thin, strict adapter around a PNG decode engine:
//!
//! - [`PngLoader`] / [`LoadJob`]: reusable config and per-call load job
//! - [`Bitmap`] / [`ChannelLayout`]: owned 8-bit pixel buffer whose length
//!   always matches its dimensions and layout
//! - [`DecodeError`]: every way a load can fail
//! - [`ResourceLimits`]: caps checked on the header, before pixels are decoded
//! - [`PixelData`]: typed pixel views over `imgref::ImgVec`
//! - [`convert`]: layout conversion between the four channel layouts
//!
//! ```no_run
//! use zenpng_loader::{ChannelLayout, PngLoader};
//!
//! # fn main() -> Result<(), zenpng_loader::DecodeError> {
//! let bytes = std::fs::read("photo.png").unwrap();
//! let bitmap = PngLoader::new().load_as(&bytes, ChannelLayout::Rgba)?;
//! assert_eq!(bitmap.as_bytes().len(), bitmap.width() as usize * bitmap.height() as usize * 4);
//! # Ok(())
//! # }
//! ```
//!
//! Decoding is synchronous and holds no global state; a loader can be
//! shared across threads.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod bitmap;
mod convert;
mod error;
pub mod header;
mod info;
mod limits;
mod loader;
mod pixel;

pub use bitmap::{Bitmap, BitmapError, ChannelLayout};
pub use convert::convert;
pub use error::{DecodeError, DecodeResult};
pub use header::{ColorType, PNG_SIGNATURE, has_png_signature};
pub use info::ImageInfo;
pub use limits::{LimitExceeded, ResourceLimits};
pub use loader::{LoadJob, PngLoader};
pub use pixel::PixelData;

// Re-exports for users of the typed pixel views and stop tokens.
pub use enough::{Stop, StopReason, Unstoppable};
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb;
pub use rgb::alt::GrayAlpha;
pub use rgb::{Gray, Rgb, Rgba};
