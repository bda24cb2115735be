// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-layer pixel classification grid.
//!
//! The grid is dense and row-major with parallel per-row counters, so marking
//! a pixel never allocates and an empty-row test is a single load. It is a
//! passive container: whoever compares the layer against the one below
//! decides which mark each pixel gets.

/// Support classification of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PixelState {
    /// Not exposed.
    #[default]
    Off = 0,
    /// Exposed and resting on the layer below.
    Supported = 1,
    /// Exposed with no known path to support.
    Island = 2,
    /// Exposed, unsupported below, but reachable from support in this layer.
    Connected = 3,
}

impl PixelState {
    /// Decode a 2-bit packer code.
    pub const fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => Self::Off,
            1 => Self::Supported,
            2 => Self::Island,
            _ => Self::Connected,
        }
    }

    /// 2-bit packer code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether a neighbouring island may attach to this pixel.
    #[inline]
    pub const fn anchors(self) -> bool {
        self as u8 & 0x01 == 0x01
    }
}

/// Per-row counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCounts {
    /// Non-off pixels.
    pub pixels: u32,
    /// Pixels currently in [`PixelState::Island`].
    pub islands: u32,
    /// Pixels marked unsupported.
    pub unsupported: u32,
    /// Pixels marked supported or reconnected by reduction.
    pub supported: u32,
}

/// Classified pixel grid of one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerBitmap {
    width: u32,
    height: u32,
    states: Vec<PixelState>,
    rows: Vec<RowCounts>,
    island_count: u32,
}

impl LayerBitmap {
    /// All-off grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            states: vec![PixelState::Off; width as usize * height as usize],
            rows: vec![RowCounts::default(); height as usize],
            island_count: 0,
        }
    }

    /// Rebuild a grid from a raster-order state sequence.
    ///
    /// `Connected` pixels are re-marked as unsupported; missing trailing
    /// pixels stay off and extra ones are ignored.
    pub fn from_states(width: u32, height: u32, states: &[PixelState]) -> Self {
        let mut bitmap = Self::new(width, height);
        let w = width as usize;
        if w == 0 {
            return bitmap;
        }
        for (i, state) in states.iter().take(bitmap.states.len()).enumerate() {
            let (x, y) = ((i % w) as u32, (i / w) as u32);
            match state {
                PixelState::Off => {}
                PixelState::Supported => bitmap.mark_supported(x, y),
                PixelState::Island => bitmap.mark_island(x, y),
                PixelState::Connected => bitmap.mark_unsupported(x, y),
            }
        }
        bitmap
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset every pixel and counter.
    pub fn clear(&mut self) {
        self.states.fill(PixelState::Off);
        self.rows.fill(RowCounts::default());
        self.island_count = 0;
    }

    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn set(&mut self, x: u32, y: u32, state: PixelState) -> &mut RowCounts {
        let i = self.index(x, y);
        debug_assert_eq!(self.states[i], PixelState::Off, "pixel ({x}, {y}) marked twice");
        self.states[i] = state;
        let row = &mut self.rows[y as usize];
        row.pixels += 1;
        row
    }

    /// Mark a pixel as resting on the layer below.
    pub fn mark_supported(&mut self, x: u32, y: u32) {
        self.set(x, y, PixelState::Supported).supported += 1;
    }

    /// Mark a pixel as unsupported below but already attached in-layer.
    pub fn mark_unsupported(&mut self, x: u32, y: u32) {
        self.set(x, y, PixelState::Connected).unsupported += 1;
    }

    /// Mark a pixel as an island.
    pub fn mark_island(&mut self, x: u32, y: u32) {
        self.set(x, y, PixelState::Island).islands += 1;
        self.island_count += 1;
    }

    /// `Island -> Connected`, keeping the counters in step.
    pub(crate) fn reconnect(&mut self, x: u32, y: u32) {
        let i = self.index(x, y);
        debug_assert_eq!(self.states[i], PixelState::Island);
        self.states[i] = PixelState::Connected;
        let row = &mut self.rows[y as usize];
        row.supported += 1;
        row.islands -= 1;
        self.island_count -= 1;
    }

    /// State of one pixel.
    #[inline]
    pub fn state(&self, x: u32, y: u32) -> PixelState {
        self.states[self.index(x, y)]
    }

    /// All states in raster order.
    pub fn states(&self) -> &[PixelState] {
        &self.states
    }

    /// One row of states.
    pub fn row(&self, y: u32) -> &[PixelState] {
        let start = self.index(0, y);
        &self.states[start..start + self.width as usize]
    }

    /// Counters for row `y`.
    pub fn row_counts(&self, y: u32) -> RowCounts {
        self.rows[y as usize]
    }

    /// Whether row `y` has no exposed pixels.
    #[inline]
    pub fn row_is_empty(&self, y: u32) -> bool {
        self.rows[y as usize].pixels == 0
    }

    /// Islands left in row `y`.
    #[inline]
    pub fn row_islands(&self, y: u32) -> u32 {
        self.rows[y as usize].islands
    }

    /// Islands left in the layer.
    pub fn island_count(&self) -> u32 {
        self.island_count
    }

    /// Exposed pixels in the layer.
    pub fn pixel_count(&self) -> u64 {
        self.rows.iter().map(|r| u64::from(r.pixels)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_update_only_their_counters() {
        let mut b = LayerBitmap::new(4, 2);
        b.mark_supported(0, 0);
        b.mark_unsupported(1, 0);
        b.mark_island(2, 0);
        b.mark_island(3, 1);

        assert_eq!(
            b.row_counts(0),
            RowCounts {
                pixels: 3,
                islands: 1,
                unsupported: 1,
                supported: 1,
            }
        );
        assert_eq!(b.row_counts(1).pixels, 1);
        assert_eq!(b.island_count(), 2);
        assert_eq!(b.state(1, 0), PixelState::Connected);
        assert_eq!(b.pixel_count(), 4);
    }

    #[test]
    fn empty_rows_are_detected() {
        let mut b = LayerBitmap::new(3, 3);
        b.mark_supported(1, 1);
        assert!(b.row_is_empty(0));
        assert!(!b.row_is_empty(1));
        assert!(b.row_is_empty(2));
        b.clear();
        assert!(b.row_is_empty(1));
        assert_eq!(b.state(1, 1), PixelState::Off);
    }

    #[test]
    fn reconnect_moves_island_to_supported_count() {
        let mut b = LayerBitmap::new(2, 1);
        b.mark_island(0, 0);
        b.reconnect(0, 0);
        assert_eq!(b.state(0, 0), PixelState::Connected);
        assert_eq!(b.island_count(), 0);
        assert_eq!(b.row_counts(0).supported, 1);
        assert_eq!(b.row_counts(0).pixels, 1);
    }

    #[test]
    fn from_states_rebuilds_counters() {
        use PixelState::{Connected as C, Island as I, Off as O, Supported as S};
        let b = LayerBitmap::from_states(3, 2, &[S, O, I, C, I, O]);
        assert_eq!(b.island_count(), 2);
        assert_eq!(b.row(1), &[C, I, O]);
        assert_eq!(b.row_counts(1).unsupported, 1);
    }

    #[test]
    fn only_supported_and_connected_anchor() {
        assert!(PixelState::Supported.anchors());
        assert!(PixelState::Connected.anchors());
        assert!(!PixelState::Island.anchors());
        assert!(!PixelState::Off.anchors());
        for code in 0..4 {
            assert_eq!(PixelState::from_code(code).code(), code);
        }
    }
}
