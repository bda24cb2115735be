// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Preview thumbnails: 32-byte block header plus a 16-bit run-length stream.
//!
//! Block layout (Little-Endian):
//! ```text
//! 0   4   width
//! 4   4   height
//! 8   4   image data offset (file-relative)
//! 12  4   image data size
//! 16  16  reserved[4]
//! ```
//!
//! Each encoded dot is a little-endian `u16`:
//! ```text
//! bit 15..11  red   (5 bits)
//! bit 10..6   green (5 bits)
//! bit 5       run flag
//! bit 4..0    blue  (5 bits)
//! ```
//! When the run flag is set, the next two bytes carry a 12-bit repeat count
//! (`b0 | (b1 & 0x0F) << 8`) and the color covers `1 + repeat` pixels.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{PhotonError, Result, Section};

/// Size of the block header preceding the encoded stream.
pub const PREVIEW_BLOCK_SIZE: usize = 32;

const RUN_FLAG: u16 = 0x0020;

/// A 4-byte run dot covers at most 4096 pixels.
const MAX_PIXELS_PER_BYTE: usize = 1024;

/// A decoded preview image. Pixels are `0x00RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    width: u32,
    height: u32,
    reserved: [u32; 4],
    encoded: Vec<u8>,
    pixels: Vec<u32>,
}

impl PreviewImage {
    /// Read the preview block at `offset` and decode its pixels.
    pub fn parse(bytes: &[u8], offset: u32, section: Section) -> Result<Self> {
        let mut r = ByteReader::at(bytes, offset, section)?;
        let width = r.u32()?;
        let height = r.u32()?;
        let image_offset = r.u32()?;
        let data_size = r.u32()?;
        let reserved = r.u32_array::<4>()?;

        let encoded = ByteReader::at(bytes, image_offset, section)?
            .take(data_size as usize)?
            .to_vec();
        let pixels = decode(width, height, &encoded, section)?;
        Ok(Self {
            width,
            height,
            reserved,
            encoded,
            pixels,
        })
    }

    /// An all-black preview of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        let count = pixel_count(width, height);
        Self {
            width,
            height,
            reserved: [0; 4],
            encoded: vec![0; count * 2],
            pixels: vec![0; count],
        }
    }

    /// Encode a rendered image.
    ///
    /// The stored pixels are the decoded form of the encoded stream, so they
    /// reflect the 5-bit quantization.
    pub fn from_pixels(width: u32, height: u32, pixels: &[u32]) -> Result<Self> {
        let expected = pixel_count(width, height);
        if pixels.len() != expected {
            return Err(PhotonError::DimensionMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        let encoded = encode(pixels);
        let pixels = decode(width, height, &encoded, Section::PreviewOne)?;
        Ok(Self {
            width,
            height,
            reserved: [0; 4],
            encoded,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Decoded pixels, `width * height` entries in raster order.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Encoded stream as stored in the file.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Reserved block words.
    pub fn reserved(&self) -> [u32; 4] {
        self.reserved
    }

    /// Serialized size: block header plus encoded stream.
    pub fn byte_size(&self) -> usize {
        PREVIEW_BLOCK_SIZE + self.encoded.len()
    }

    /// Write the block assuming it starts at file offset `start`.
    pub(crate) fn write(&self, w: &mut ByteWriter, start: u32) {
        w.u32(self.width);
        w.u32(self.height);
        w.u32(start + PREVIEW_BLOCK_SIZE as u32);
        w.u32(self.encoded.len() as u32);
        for v in self.reserved {
            w.u32(v);
        }
        w.bytes(&self.encoded);
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    (width as usize).saturating_mul(height as usize)
}

/// Expand a dot's 5-bit channels into a 24-bit color.
#[inline]
pub const fn dot_to_rgb(dot: u16) -> u32 {
    let dot = dot as u32;
    ((dot & 0xF800) << 8) | ((dot & 0x07C0) << 5) | ((dot & 0x001F) << 3)
}

/// Quantize a 24-bit color into a dot with the run flag clear.
#[inline]
pub const fn rgb_to_dot(rgb: u32) -> u16 {
    let r = quantize((rgb >> 16) & 0xFF);
    let g = quantize((rgb >> 8) & 0xFF);
    let b = quantize(rgb & 0xFF);
    ((r << 11) | (g << 6) | b) & !RUN_FLAG
}

#[inline]
const fn quantize(channel: u32) -> u16 {
    let q = (channel + 4) >> 3;
    if q > 0x1F {
        0x1F
    } else {
        q as u16
    }
}

/// Decode an encoded stream into `width * height` pixels.
///
/// Pixels not covered by the stream stay black; a run past the last pixel is
/// a [`PhotonError::MalformedRun`]. Dimensions the stream could never cover
/// are rejected as truncated before anything is allocated.
pub fn decode(width: u32, height: u32, encoded: &[u8], section: Section) -> Result<Vec<u32>> {
    let total = pixel_count(width, height);
    if total > encoded.len().saturating_mul(MAX_PIXELS_PER_BYTE) {
        return Err(PhotonError::TruncatedInput {
            section,
            needed: total.div_ceil(MAX_PIXELS_PER_BYTE),
            available: encoded.len(),
        });
    }
    let mut pixels = vec![0u32; total];
    let mut r = ByteReader::new(encoded, section);
    let mut d = 0usize;

    while r.remaining() > 0 {
        let dot = r.u16()?;
        let color = dot_to_rgb(dot);
        let mut repeat = 1usize;
        if dot & RUN_FLAG != 0 {
            let lo = r.u8()? as usize;
            let hi = (r.u8()? & 0x0F) as usize;
            repeat += lo | (hi << 8);
        }
        if d + repeat > total {
            return Err(PhotonError::MalformedRun {
                section,
                position: d,
                length: repeat,
                limit: total,
            });
        }
        pixels[d..d + repeat].fill(color);
        d += repeat;
    }
    Ok(pixels)
}

/// Encode pixels as one dot per pixel; runs are not coalesced.
pub fn encode(pixels: &[u32]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(pixels.len() * 2);
    for &pixel in pixels {
        w.u16(rgb_to_dot(pixel));
    }
    w.into_inner()
}
