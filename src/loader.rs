//! The PNG loader: configuration, per-call jobs and the decode pipeline.
//!
//! [`PngLoader`] is a reusable config value. [`LoadJob`] is created per
//! call and can borrow a stop token or override limits before loading.
//!
//! ```text
//! bytes ─→ signature ─→ IHDR probe + limits ─→ engine headers ─→ limits
//!                                                     │
//!                              Bitmap ←─ copy rows ←─ engine decode
//! ```
//!
//! Everything before the engine runs is O(header): oversized or malformed
//! headers are rejected without touching pixel data.

use alloc::format;
use alloc::vec::Vec;

use enough::{Stop, Unstoppable};
use log::{debug, trace};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_core::result::DecodingResult;
use zune_png::PngDecoder;

use crate::convert::output_len;
use crate::header::{ColorKey, color_key, has_png_signature, probe_ihdr};
use crate::{
    Bitmap, ChannelLayout, DecodeError, DecodeResult, ImageInfo, LimitExceeded, ResourceLimits,
};

// ── PngLoader ────────────────────────────────────────────────────────

/// Loads PNG byte streams into [`Bitmap`]s.
///
/// Config values are reusable (`Clone`), have no lifetimes and hold no
/// mutable state, so one loader can be shared across threads and called
/// concurrently.
///
/// Every decoded bitmap uses 8-bit samples: 16-bit images are reduced to
/// their high byte, palette images are expanded to RGB (RGBA when a tRNS
/// chunk is present), and interlaced images are fully de-interlaced. A
/// tRNS color key on a gray or RGB image adds an alpha channel that is 0
/// where a pixel matches the key.
///
/// # Example
///
/// ```no_run
/// use zenpng_loader::{DecodeError, PngLoader, ResourceLimits};
///
/// let loader = PngLoader::new().with_limits(ResourceLimits::none().with_max_pixels(4096 * 4096));
/// # let bytes: &[u8] = &[];
/// match loader.load(bytes) {
///     Ok(bitmap) => println!("{}x{} {:?}", bitmap.width(), bitmap.height(), bitmap.layout()),
///     Err(DecodeError::InvalidSignature) => eprintln!("not a png"),
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PngLoader {
    limits: ResourceLimits,
    verify_crc: bool,
}

impl Default for PngLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PngLoader {
    /// Loader with [`ResourceLimits::default_decode()`] and CRC checking on.
    pub fn new() -> Self {
        Self {
            limits: ResourceLimits::default_decode(),
            verify_crc: true,
        }
    }

    /// Replace the resource limits.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Whether the engine verifies chunk CRCs (default `true`).
    pub fn with_crc_check(mut self, yes: bool) -> Self {
        self.verify_crc = yes;
        self
    }

    /// Configured resource limits.
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Create a per-call job.
    pub fn job(&self) -> LoadJob<'_> {
        LoadJob {
            loader: self,
            stop: &Unstoppable,
            limits: None,
        }
    }

    /// Decode `data` into a bitmap.
    ///
    /// Empty, truncated, corrupt and non-PNG input all produce a
    /// [`DecodeError`]; no partial bitmap is ever returned.
    pub fn load(&self, data: &[u8]) -> DecodeResult {
        self.job().load(data)
    }

    /// Decode `data` and convert the result to `layout`.
    pub fn load_as(&self, data: &[u8], layout: ChannelLayout) -> DecodeResult {
        self.job().load_as(data, layout)
    }

    /// Read header facts without decoding pixels.
    pub fn probe(&self, data: &[u8]) -> Result<ImageInfo, DecodeError> {
        self.job().probe(data)
    }

    /// Read the file at `path` and decode it.
    ///
    /// Open and read failures are reported as [`DecodeError::Io`].
    #[cfg(feature = "std")]
    pub fn load_path<P: AsRef<std::path::Path>>(&self, path: P) -> DecodeResult {
        let path = path.as_ref();
        trace!("reading {}", path.display());
        let data = std::fs::read(path)?;
        self.load(&data)
    }
}

// ── LoadJob ──────────────────────────────────────────────────────────

/// Per-call load job.
///
/// Created by [`PngLoader::job()`]. Borrows temporary data (stop token)
/// and is consumed by the terminal load methods.
pub struct LoadJob<'a> {
    loader: &'a PngLoader,
    stop: &'a dyn Stop,
    limits: Option<ResourceLimits>,
}

impl<'a> LoadJob<'a> {
    /// Set a cooperative stop token.
    ///
    /// The token is checked before the engine parses headers and again
    /// before it decodes pixel data. The engine itself cannot be
    /// interrupted mid-decode.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = stop;
        self
    }

    /// Override resource limits for this call.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    fn limits(&self) -> &ResourceLimits {
        self.limits.as_ref().unwrap_or(&self.loader.limits)
    }

    /// Read header facts without decoding pixels.
    ///
    /// Applies the same signature, dimension and limit checks as
    /// [`load()`](Self::load).
    pub fn probe(&self, data: &[u8]) -> Result<ImageInfo, DecodeError> {
        if let Some(info) = self.screen(data)? {
            return Ok(info);
        }
        // Let the engine explain what is wrong with the header.
        self.stop.check()?;
        let mut session = EngineSession::open(data, self.loader.verify_crc, true);
        session.read_headers()?;
        Err(DecodeError::EngineError(
            "IHDR chunk missing or malformed".into(),
        ))
    }

    /// Decode `data` into a bitmap.
    pub fn load(self, data: &[u8]) -> DecodeResult {
        let limits = *self.limits();
        let info = self.screen(data)?;
        // The engine drops 16-bit color keys, so those are applied here on
        // unstripped samples.
        let key = info
            .filter(|info| info.bit_depth == 16)
            .and_then(|info| color_key(data, info.color_type));

        self.stop.check()?;
        let mut session = EngineSession::open(data, self.loader.verify_crc, key.is_none());
        let (width, height) = session.read_headers()?;
        check_dimensions(width, height, &limits)?;
        trace!("engine accepted headers for {width}x{height}");

        let layout = match key {
            Some(_) => session.layout().with_alpha(),
            None => session.layout(),
        };
        let out = reserve_output(width, height, layout, &limits)?;

        self.stop.check()?;
        let samples = session.decode()?;
        let bitmap = samples.into_bitmap(width, height, out, key.as_ref(), &limits)?;
        debug!(
            "decoded {}x{} {:?} png",
            bitmap.width(),
            bitmap.height(),
            bitmap.layout()
        );
        Ok(bitmap)
    }

    /// Decode `data` and convert the result to `layout`.
    ///
    /// The converted buffer is held to the same memory ceiling as the
    /// decoded one.
    pub fn load_as(self, data: &[u8], layout: ChannelLayout) -> DecodeResult {
        let limits = *self.limits();
        let bitmap = self.load(data)?;
        if bitmap.layout() == layout {
            return Ok(bitmap);
        }
        let len = output_len(bitmap.width(), bitmap.height(), layout)?;
        limits.check_memory(len as u64)?;
        trace!("converting {:?} to {layout:?}", bitmap.layout());
        bitmap.to_layout(layout)
    }

    /// Checks that run before the engine is involved.
    ///
    /// Returns the probed header when a well-formed IHDR is present.
    fn screen(&self, data: &[u8]) -> Result<Option<ImageInfo>, DecodeError> {
        if !has_png_signature(data) {
            return Err(DecodeError::InvalidSignature);
        }
        let limits = self.limits();
        limits.check_file_size(data.len() as u64)?;

        let info = probe_ihdr(data);
        match &info {
            Some(info) => {
                check_dimensions(info.width, info.height, limits)?;
                limits.check_image_info(info)?;
                trace!(
                    "probed {}x{} {:?} depth {}",
                    info.width, info.height, info.color_type, info.bit_depth
                );
            }
            None => trace!("no well-formed IHDR; deferring to engine"),
        }
        Ok(info)
    }
}

fn check_dimensions(width: u32, height: u32, limits: &ResourceLimits) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }
    limits.check_dimensions(width, height)?;
    Ok(())
}

/// Check the memory ceiling and allocate the bitmap buffer up front.
fn reserve_output(
    width: u32,
    height: u32,
    layout: ChannelLayout,
    limits: &ResourceLimits,
) -> Result<Vec<u8>, DecodeError> {
    let len = output_len(width, height, layout)?;
    limits.check_memory(len as u64)?;
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| DecodeError::OutOfMemory { bytes: len })?;
    trace!("reserved {len} bytes for {layout:?} bitmap");
    Ok(out)
}

// ── Engine session ───────────────────────────────────────────────────

/// Decode engine handle scoped to a single load.
///
/// Borrows the input and is dropped on every exit path of the call that
/// opened it, releasing all engine-internal buffers.
struct EngineSession<'a> {
    decoder: PngDecoder<&'a [u8]>,
    layout: ChannelLayout,
}

impl<'a> EngineSession<'a> {
    fn open(data: &'a [u8], verify_crc: bool, strip_to_8bit: bool) -> Self {
        // Size ceilings are enforced by ResourceLimits, not the engine.
        let options = DecoderOptions::default()
            .set_max_width(usize::MAX)
            .set_max_height(usize::MAX)
            .png_set_strip_to_8bit(strip_to_8bit)
            .png_set_add_alpha_channel(false)
            .png_set_confirm_crc(verify_crc)
            .set_strict_mode(true);
        Self {
            decoder: PngDecoder::new_with_options(data, options),
            layout: ChannelLayout::Rgba,
        }
    }

    /// Parse everything up to the image data; returns the dimensions.
    fn read_headers(&mut self) -> Result<(u32, u32), DecodeError> {
        self.decoder.decode_headers().map_err(DecodeError::engine)?;
        let (width, height) = self
            .decoder
            .get_dimensions()
            .ok_or_else(|| DecodeError::EngineError("engine reported no dimensions".into()))?;
        let width = u32::try_from(width)
            .map_err(|_| DecodeError::EngineError(format!("width {width} out of range")))?;
        let height = u32::try_from(height)
            .map_err(|_| DecodeError::EngineError(format!("height {height} out of range")))?;
        let colorspace = self
            .decoder
            .get_colorspace()
            .ok_or_else(|| DecodeError::EngineError("engine reported no colorspace".into()))?;
        trace!("engine output colorspace {colorspace:?}");
        self.layout = layout_for(colorspace).ok_or_else(|| {
            DecodeError::EngineError(format!("unsupported output colorspace {colorspace:?}"))
        })?;
        Ok((width, height))
    }

    /// Output layout announced by the engine after [`read_headers`](Self::read_headers).
    fn layout(&self) -> ChannelLayout {
        self.layout
    }

    fn decode(&mut self) -> Result<Samples, DecodeError> {
        match self.decoder.decode().map_err(DecodeError::engine)? {
            DecodingResult::U8(data) => Ok(Samples::Eight(data)),
            DecodingResult::U16(data) => Ok(Samples::Sixteen(data)),
            _ => Err(DecodeError::EngineError(
                "engine produced an unsupported sample type".into(),
            )),
        }
    }
}

fn layout_for(colorspace: ColorSpace) -> Option<ChannelLayout> {
    match colorspace {
        ColorSpace::Luma => Some(ChannelLayout::Gray),
        ColorSpace::LumaA => Some(ChannelLayout::GrayAlpha),
        ColorSpace::RGB => Some(ChannelLayout::Rgb),
        ColorSpace::RGBA => Some(ChannelLayout::Rgba),
        _ => None,
    }
}

/// Raw engine output, before it is copied into a bitmap.
enum Samples {
    Eight(Vec<u8>),
    Sixteen(Vec<u16>),
}

impl Samples {
    fn len(&self) -> usize {
        match self {
            Samples::Eight(data) => data.len(),
            Samples::Sixteen(data) => data.len(),
        }
    }

    /// Copy the samples into `out`, reducing 16-bit samples to their high
    /// byte.
    ///
    /// The layout is derived from the sample count; palette images with a
    /// tRNS chunk come back with four channels. A color `key` adds an alpha
    /// channel to unstripped gray or RGB samples, compared at full 16-bit
    /// precision.
    fn into_bitmap(
        self,
        width: u32,
        height: u32,
        mut out: Vec<u8>,
        key: Option<&ColorKey>,
        limits: &ResourceLimits,
    ) -> Result<Bitmap, DecodeError> {
        let pixels = width as usize * height as usize;
        let samples = self.len();
        let decoded = (samples % pixels == 0)
            .then(|| ChannelLayout::from_channels(samples / pixels))
            .flatten()
            .ok_or_else(|| {
                DecodeError::EngineError(format!(
                    "engine produced {samples} samples for {width}x{height} pixels"
                ))
            })?;

        let key = match (&self, key) {
            (Samples::Sixteen(_), Some(key)) if key.channels() == decoded.channels() => Some(key),
            _ => None,
        };
        let layout = match key {
            Some(_) => decoded.with_alpha(),
            None => decoded,
        };

        // The announced layout can be narrower than the decoded one.
        let len = output_len(width, height, layout)?;
        if out.capacity() < len {
            limits.check_memory(len as u64)?;
            out.try_reserve_exact(len)
                .map_err(|_| DecodeError::OutOfMemory { bytes: len })?;
        }

        let stride = width as usize * decoded.channels();
        match self {
            Samples::Eight(data) => {
                for row in data.chunks_exact(stride) {
                    out.extend_from_slice(row);
                }
            }
            Samples::Sixteen(data) => match key {
                Some(key) => {
                    for px in data.chunks_exact(key.channels()) {
                        out.extend(px.iter().map(|&s| (s >> 8) as u8));
                        out.push(if key.matches(px) { 0 } else { 255 });
                    }
                }
                None => {
                    for row in data.chunks_exact(stride) {
                        out.extend(row.iter().map(|&s| (s >> 8) as u8));
                    }
                }
            },
        }

        Bitmap::new(width, height, layout, out).map_err(|err| {
            DecodeError::EngineError(format!("decoded buffer rejected: {err}"))
        })
    }
}
