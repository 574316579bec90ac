//! Load errors.

use alloc::string::String;
use core::fmt;

use crate::{Bitmap, LimitExceeded};

/// Outcome of a load: the decoded bitmap or the reason there is none.
pub type DecodeResult = Result<Bitmap, DecodeError>;

/// Why a PNG could not be turned into a [`Bitmap`].
///
/// Every failure is terminal for the call that produced it; no partial
/// bitmap accompanies an error.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Input does not begin with the 8-byte PNG signature.
    InvalidSignature,
    /// Declared width or height is zero.
    InvalidDimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
    /// A configured resource ceiling would be exceeded.
    ImageTooLarge(LimitExceeded),
    /// The decode engine rejected the stream (bad CRC, truncated chunk,
    /// unsupported encoding, ...). The message is the engine's diagnostic.
    EngineError(String),
    /// The output buffer could not be allocated.
    OutOfMemory {
        /// Requested allocation size.
        bytes: usize,
    },
    /// The caller's stop token asked the load to end.
    Cancelled,
    /// The input file could not be read.
    #[cfg(feature = "std")]
    Io(String),
}

impl DecodeError {
    /// Wrap an engine diagnostic.
    pub(crate) fn engine(message: impl fmt::Debug) -> Self {
        let mut text = alloc::format!("{message:?}");
        let trimmed = text.trim_end().len();
        text.truncate(trimmed);
        Self::EngineError(text)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignature => f.write_str("input is not a PNG (signature mismatch)"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid image dimensions {width}x{height}")
            }
            Self::ImageTooLarge(limit) => write!(f, "image too large: {limit}"),
            Self::EngineError(message) => write!(f, "png decode failed: {message}"),
            Self::OutOfMemory { bytes } => {
                write!(f, "could not allocate {bytes} bytes for the bitmap")
            }
            Self::Cancelled => f.write_str("load cancelled"),
            #[cfg(feature = "std")]
            Self::Io(message) => write!(f, "could not read input: {message}"),
        }
    }
}

impl core::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::ImageTooLarge(limit) => Some(limit),
            _ => None,
        }
    }
}

impl From<LimitExceeded> for DecodeError {
    fn from(limit: LimitExceeded) -> Self {
        Self::ImageTooLarge(limit)
    }
}

impl From<enough::StopReason> for DecodeError {
    fn from(_: enough::StopReason) -> Self {
        Self::Cancelled
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(alloc::string::ToString::to_string(&err))
    }
}
