//! Fixture builders shared by the integration tests.
//!
//! Most fixtures come from the `png` encoder. Streams it cannot produce
//! (Adam7 interlacing, extra or corrupted chunks) are assembled chunk by
//! chunk, with `flate2` for the image data and `crc32fast` for chunk CRCs.

#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Encode `data` with the `png` crate.
pub fn encode(
    width: u32,
    height: u32,
    color: png::ColorType,
    depth: png::BitDepth,
    data: &[u8],
) -> Vec<u8> {
    encode_with(width, height, color, depth, data, |_| {})
}

/// Encode `data`, letting `setup` add palette/tRNS or other settings.
pub fn encode_with(
    width: u32,
    height: u32,
    color: png::ColorType,
    depth: png::BitDepth,
    data: &[u8],
    setup: impl FnOnce(&mut png::Encoder<'_, &mut Vec<u8>>),
) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(depth);
        setup(&mut encoder);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
        writer.finish().unwrap();
    }
    out
}

/// Deterministic pseudo-random bytes (xorshift), so IDAT does not compress away.
pub fn noise(len: usize, mut seed: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed >> 24) as u8
        })
        .collect()
}

/// Byte range of the first chunk of type `kind`: (start of length field, end of CRC).
pub fn find_chunk(png: &[u8], kind: &[u8; 4]) -> Option<(usize, usize)> {
    let mut pos = SIGNATURE.len();
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let end = pos + 12 + len;
        if &png[pos + 4..pos + 8] == kind {
            return Some((pos, end));
        }
        pos = end;
    }
    None
}

// ---------------------------------------------------------------------------
// Hand-assembled streams
// ---------------------------------------------------------------------------

/// zlib stream of `raw`, stored without compression.
pub fn zlib(raw: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::none());
    encoder.write_all(raw).unwrap();
    encoder.finish().unwrap()
}

fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut crc = crc32fast::Hasher::new();
    crc.update(kind);
    crc.update(data);
    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
    out
}

pub fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&chunk(kind, data));
}

/// Insert a chunk right before the first IDAT of an encoded stream.
pub fn insert_before_idat(png: &[u8], kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let (idat, _) = find_chunk(png, b"IDAT").unwrap();
    let mut out = png[..idat].to_vec();
    out.extend_from_slice(&chunk(kind, data));
    out.extend_from_slice(&png[idat..]);
    out
}

/// Signature + IHDR with a correct CRC.
pub fn header(width: u32, height: u32, depth: u8, color: u8, interlace: u8) -> Vec<u8> {
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[depth, color, 0, 0, interlace]);
    let mut out = SIGNATURE.to_vec();
    push_chunk(&mut out, b"IHDR", &ihdr);
    out
}

/// Complete stream from a header and already-filtered scanline data.
pub fn assemble(header: Vec<u8>, filtered: &[u8]) -> Vec<u8> {
    let mut out = header;
    push_chunk(&mut out, b"IDAT", &zlib(filtered));
    push_chunk(&mut out, b"IEND", &[]);
    out
}
