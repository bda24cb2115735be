// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Run-length packing of classified layers.
//!
//! Each run is one or two bytes:
//! ```text
//! short (len < 32):  0 s s l l l l l
//! long:              1 s s h h h h h   l l l l l l l l    (len = h << 8 | l)
//! ```
//! `s` is the [`PixelState`] code, so a long run holds at most 8191 pixels.
//! Runs never cross a row; an empty row is a single `Off` run of full width.

use crate::bitmap::{LayerBitmap, PixelState};
use crate::cursor::ByteReader;
use crate::error::{PhotonError, Result, Section};

/// Longest run a single symbol can hold.
pub const MAX_RUN: u32 = 0x1FFF;

const LONG_FLAG: u8 = 0x80;
const SHORT_LIMIT: u32 = 32;

/// Display color for a state (`0x00RRGGBB`).
pub const fn display_color(state: PixelState) -> u32 {
    match state {
        PixelState::Off => 0x00_00_00,
        PixelState::Supported => 0x00_88_00,
        PixelState::Connected => 0xFF_FF_00,
        PixelState::Island => 0xFF_00_00,
    }
}

/// Append one run, splitting lengths above [`MAX_RUN`].
fn push_run(out: &mut Vec<u8>, state: PixelState, mut length: u32) {
    let code = state.code() << 5;
    loop {
        let chunk = length.min(MAX_RUN);
        if chunk < SHORT_LIMIT {
            out.push(code | chunk as u8);
        } else {
            out.push(LONG_FLAG | code | (chunk >> 8) as u8);
            out.push((chunk & 0xFF) as u8);
        }
        length -= chunk;
        if length == 0 {
            break;
        }
    }
}

/// Pack a classified layer.
pub fn pack(bitmap: &LayerBitmap) -> Vec<u8> {
    let mut out = Vec::new();
    for y in 0..bitmap.height() {
        if bitmap.row_is_empty(y) {
            push_run(&mut out, PixelState::Off, bitmap.width());
            continue;
        }
        let mut current = PixelState::Off;
        let mut length = 0u32;
        for &next in bitmap.row(y) {
            if next == current {
                length += 1;
            } else {
                if length > 0 {
                    push_run(&mut out, current, length);
                }
                current = next;
                length = 1;
            }
        }
        if length > 0 {
            push_run(&mut out, current, length);
        }
    }
    out
}

/// One decoded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Pixel state of the run.
    pub state: PixelState,
    /// Run length in pixels.
    pub length: u32,
}

/// Iterate the symbols of a packed layer.
pub fn runs(packed: &[u8]) -> impl Iterator<Item = Result<Run>> + '_ {
    let mut r = ByteReader::new(packed, Section::LayerData);
    std::iter::from_fn(move || {
        if r.remaining() == 0 {
            return None;
        }
        Some(next_run(&mut r))
    })
}

fn next_run(r: &mut ByteReader<'_>) -> Result<Run> {
    let byte = r.u8()?;
    let state = PixelState::from_code((byte & 0x60) >> 5);
    let mut length = u32::from(byte & 0x1F);
    if byte & LONG_FLAG != 0 {
        length = (length << 8) | u32::from(r.u8()?);
    }
    Ok(Run { state, length })
}

/// A colored span handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSegment {
    /// Pixel state of the span.
    pub state: PixelState,
    /// Display color (see [`display_color`]).
    pub color: u32,
    /// Span length in pixels.
    pub length: u32,
}

/// Decode a packed layer into per-row segment lists for drawing.
///
/// A new row starts once the accumulated x reaches `width - 1` (not
/// `width`), and a trailing empty row is always present. Existing viewers
/// lay out rows this way, so it is kept as is; use [`decode_states`] for
/// exact pixel positions.
pub fn rows(packed: &[u8], width: u32) -> Result<Vec<Vec<RowSegment>>> {
    let boundary = width.saturating_sub(1);
    let mut rows = vec![Vec::new()];
    let mut x = 0u32;
    for run in runs(packed) {
        let Run { state, length } = run?;
        if length > width {
            return Err(PhotonError::MalformedRun {
                section: Section::LayerData,
                position: x as usize,
                length: length as usize,
                limit: width as usize,
            });
        }
        if let Some(row) = rows.last_mut() {
            row.push(RowSegment {
                state,
                color: display_color(state),
                length,
            });
        }
        x += length;
        if x >= boundary {
            rows.push(Vec::new());
            x = 0;
        }
    }
    Ok(rows)
}

/// Decode a packed layer into exactly `width * height` pixel states.
///
/// Runs crossing a row end, or pixels past the last row, are
/// [`PhotonError::MalformedRun`]; a short stream is a
/// [`PhotonError::DimensionMismatch`].
pub fn decode_states(packed: &[u8], width: u32, height: u32) -> Result<Vec<PixelState>> {
    let total = (width as usize).saturating_mul(height as usize);
    let mut states = Vec::with_capacity(total.min(packed.len().saturating_mul(MAX_RUN as usize)));
    let mut x = 0u32;
    for run in runs(packed) {
        let Run { state, length } = run?;
        if x + length > width || states.len() + length as usize > total {
            return Err(PhotonError::MalformedRun {
                section: Section::LayerData,
                position: states.len(),
                length: length as usize,
                limit: if x + length > width {
                    (states.len() - x as usize) + width as usize
                } else {
                    total
                },
            });
        }
        states.extend(std::iter::repeat_n(state, length as usize));
        x += length;
        if x == width {
            x = 0;
        }
    }
    if states.len() != total {
        return Err(PhotonError::DimensionMismatch {
            expected: total,
            actual: states.len(),
        });
    }
    Ok(states)
}

/// Decode a packed layer straight back into a classified bitmap.
pub fn unpack(packed: &[u8], width: u32, height: u32) -> Result<LayerBitmap> {
    let states = decode_states(packed, width, height)?;
    Ok(LayerBitmap::from_states(width, height, &states))
}
