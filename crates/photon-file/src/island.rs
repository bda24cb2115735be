// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Island reduction: reconnect island pixels that touch support in-layer.
//!
//! Two raster passes are made. Whenever an island pixel with a 4-connected
//! `Supported`/`Connected` neighbour is reconnected, the scan chases backward
//! (up first, then left) through island pixels it has already passed, since
//! those may only now have become reachable. Two passes are not a fixpoint:
//! some shapes (e.g. a chain that has to be walked right-to-left and then
//! down) keep islands that a full flood fill would clear. Callers get the
//! remaining count as data.

use crate::bitmap::{LayerBitmap, PixelState};

/// Number of full raster passes.
pub const REDUCTION_PASSES: usize = 2;

/// Result of [`reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reduction {
    /// Island pixels left after reduction.
    pub remaining: u32,
    /// Island pixels reclassified as connected.
    pub reconnected: u32,
}

/// Reduce the islands of `bitmap` in place.
pub fn reduce(bitmap: &mut LayerBitmap) -> Reduction {
    let before = bitmap.island_count();
    let (width, height) = (bitmap.width(), bitmap.height());
    let mut chase = Vec::new();

    for _ in 0..REDUCTION_PASSES {
        if bitmap.island_count() == 0 {
            break;
        }
        for y in 0..height {
            if bitmap.row_islands(y) == 0 {
                continue;
            }
            for x in 0..width {
                if bitmap.state(x, y) == PixelState::Island && touches_support(bitmap, x, y) {
                    bitmap.reconnect(x, y);
                    chase_back(bitmap, x, y, &mut chase);
                    if bitmap.row_islands(y) == 0 {
                        break;
                    }
                }
            }
        }
    }

    let remaining = bitmap.island_count();
    Reduction {
        remaining,
        reconnected: before - remaining,
    }
}

fn touches_support(b: &LayerBitmap, x: u32, y: u32) -> bool {
    (x > 0 && b.state(x - 1, y).anchors())
        || (x + 1 < b.width() && b.state(x + 1, y).anchors())
        || (y > 0 && b.state(x, y - 1).anchors())
        || (y + 1 < b.height() && b.state(x, y + 1).anchors())
}

/// Where a chase frame resumes.
#[derive(Clone, Copy)]
enum Step {
    Up,
    Left,
}

/// Depth-first walk from a freshly reconnected pixel: up first, and only
/// once that branch is exhausted, left. Each frame re-evaluates its left
/// neighbour after the up branch returns, as a recursive walk would.
fn chase_back(b: &mut LayerBitmap, x: u32, y: u32, stack: &mut Vec<(u32, u32, Step)>) {
    stack.clear();
    stack.push((x, y, Step::Up));

    while let Some((x, y, step)) = stack.pop() {
        match step {
            Step::Up => {
                stack.push((x, y, Step::Left));
                if y > 0 && b.row_islands(y - 1) > 0 && b.state(x, y - 1) == PixelState::Island {
                    b.reconnect(x, y - 1);
                    stack.push((x, y - 1, Step::Up));
                }
            }
            Step::Left => {
                if x > 0 && b.row_islands(y) > 0 && b.state(x - 1, y) == PixelState::Island {
                    b.reconnect(x - 1, y);
                    stack.push((x - 1, y, Step::Up));
                }
            }
        }
    }
}

/// Fixed-width bit set marking island columns of one row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowMask {
    words: Vec<u64>,
}

impl RowMask {
    fn with_width(width: u32) -> Self {
        Self {
            words: vec![0; (width as usize).div_ceil(64)],
        }
    }

    fn set(&mut self, x: u32) {
        self.words[x as usize / 64] |= 1 << (x % 64);
    }

    /// Whether column `x` is set.
    pub fn contains(&self, x: u32) -> bool {
        self.words
            .get(x as usize / 64)
            .is_some_and(|w| w & (1 << (x % 64)) != 0)
    }

    /// Number of set columns.
    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Whether no column is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Set columns in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..64u32)
                .filter(move |&bit| word & (1 << bit) != 0)
                .map(move |bit| i as u32 * 64 + bit)
        })
    }
}

/// Still-isolated pixels per row, plus their total.
pub fn island_rows(bitmap: &LayerBitmap) -> (Vec<RowMask>, u32) {
    let mut rows = Vec::with_capacity(bitmap.height() as usize);
    let mut total = 0;
    for y in 0..bitmap.height() {
        let mut mask = RowMask::with_width(bitmap.width());
        let islands = bitmap.row_islands(y);
        if islands > 0 {
            for (x, state) in bitmap.row(y).iter().enumerate() {
                if *state == PixelState::Island {
                    mask.set(x as u32);
                }
            }
        }
        total += islands;
        rows.push(mask);
    }
    (rows, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use PixelState::{Connected as C, Island as I, Off as O, Supported as S};

    fn grid(width: u32, cells: &[PixelState]) -> LayerBitmap {
        LayerBitmap::from_states(width, cells.len() as u32 / width, cells)
    }

    #[test]
    fn cross_around_support_is_fully_connected() {
        let mut b = LayerBitmap::new(5, 5);
        b.mark_supported(2, 2);
        for (x, y) in [(2, 1), (1, 2), (3, 2), (2, 3)] {
            b.mark_island(x, y);
        }
        assert_eq!(b.island_count(), 4);
        let r = reduce(&mut b);
        assert_eq!(r, Reduction { remaining: 0, reconnected: 4 });
        for (x, y) in [(2, 1), (1, 2), (3, 2), (2, 3)] {
            assert_eq!(b.state(x, y), C);
        }
    }

    #[test]
    fn unreachable_islands_stay_islands() {
        #[rustfmt::skip]
        let mut b = grid(7, &[
            I, I, O, O, O, I, I,
            I, O, O, O, O, O, I,
        ]);
        let r = reduce(&mut b);
        assert_eq!(r.remaining, 6);
        assert_eq!(r.reconnected, 0);
        assert!(b.states().iter().all(|s| *s != C));
    }

    #[test]
    fn backward_chase_reaches_earlier_pixels() {
        // The support sits right of a horizontal run; a single pass only
        // connects the run through the left-chase.
        let mut b = grid(5, &[I, I, I, I, S]);
        let r = reduce(&mut b);
        assert_eq!(r.remaining, 0);
        assert_eq!(b.row(0), &[C, C, C, C, S]);
    }

    #[test]
    fn chase_goes_up_before_left() {
        #[rustfmt::skip]
        let mut b = grid(3, &[
            I, I, O,
            I, I, O,
            O, S, O,
        ]);
        let r = reduce(&mut b);
        assert_eq!(r.remaining, 0);
        assert!(b.states().iter().all(|s| *s != I));
    }

    #[test]
    fn two_passes_are_not_a_fixpoint() {
        // Spiral fed from the bottom-left support. Pass one chases up the
        // left column, pass two runs along the top, down the right column
        // and back up the inner column; the inner arm on row 2 needs a
        // third pass and is left as islands.
        #[rustfmt::skip]
        let mut b = grid(9, &[
            I, I, I, I, I, I, I, I, I,
            I, O, O, O, O, O, O, O, I,
            I, O, I, I, I, I, I, O, I,
            I, O, I, O, O, O, O, O, I,
            I, O, I, O, O, O, O, O, I,
            I, O, I, O, O, O, O, O, I,
            I, O, I, I, I, I, I, I, I,
            I, O, O, O, O, O, O, O, O,
            S, O, O, O, O, O, O, O, O,
        ]);
        let r = reduce(&mut b);
        assert_eq!(r, Reduction { remaining: 4, reconnected: 32 });
        assert_eq!(&b.row(2)[2..7], &[C, I, I, I, I]);
    }

    #[test]
    fn island_rows_report_remaining_columns() {
        #[rustfmt::skip]
        let b = grid(4, &[
            I, O, O, I,
            O, O, O, O,
        ]);
        let (rows, total) = island_rows(&b);
        assert_eq!(total, 2);
        assert_eq!(rows[0].iter().collect::<Vec<_>>(), vec![0, 3]);
        assert!(rows[0].contains(3));
        assert!(!rows[0].contains(1));
        assert!(rows[1].is_empty());
        assert_eq!(rows[0].count(), 2);
    }

    #[test]
    fn wide_rows_span_several_words() {
        let mut b = LayerBitmap::new(130, 1);
        b.mark_island(0, 0);
        b.mark_island(64, 0);
        b.mark_island(129, 0);
        let (rows, total) = island_rows(&b);
        assert_eq!(total, 3);
        assert_eq!(rows[0].iter().collect::<Vec<_>>(), vec![0, 64, 129]);
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        // A 1-pixel-wide vertical column of 20k islands sitting on support.
        let height = 20_000;
        let mut b = LayerBitmap::new(1, height);
        for y in 0..height - 1 {
            b.mark_island(0, y);
        }
        b.mark_supported(0, height - 1);
        let r = reduce(&mut b);
        assert_eq!(r.remaining, 0);
    }
}
