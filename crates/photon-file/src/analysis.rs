// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Parallel island reduction and packing across layers.
//!
//! Layers are independent, so each one is claimed by exactly one worker
//! through an atomic counter. A worker holds the only `&mut` to the bitmap it
//! claimed, so marking and counter updates never interleave.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::bitmap::LayerBitmap;
use crate::error::Result;
use crate::file::PhotonFile;
use crate::island::{self, Reduction};
use crate::rle;

/// Outcome for one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerAnalysis {
    /// Layer index in file order.
    pub index: usize,
    /// Island pixels still isolated after reduction.
    pub remaining_islands: u32,
    /// Island pixels reclassified as connected.
    pub reconnected: u32,
    /// Rows that still hold island pixels, ascending.
    pub island_rows: Vec<u32>,
    /// Packed image of the reduced layer.
    pub packed: Vec<u8>,
}

/// Worker count used when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Reduce and pack every bitmap in place on up to `workers` threads.
///
/// Results come back in layer order regardless of scheduling.
#[tracing::instrument(level = "debug", skip(bitmaps), fields(layers = bitmaps.len()))]
pub fn analyze_layers(bitmaps: &mut [LayerBitmap], workers: usize) -> Vec<LayerAnalysis> {
    let workers = workers.clamp(1, bitmaps.len().max(1));
    if workers == 1 {
        return bitmaps
            .iter_mut()
            .enumerate()
            .map(|(index, bitmap)| analyze_one(index, bitmap))
            .collect();
    }

    let slots: Vec<Mutex<&mut LayerBitmap>> = bitmaps.iter_mut().map(Mutex::new).collect();
    let next_layer = AtomicUsize::new(0);

    let mut results: Vec<LayerAnalysis> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let slots = &slots;
                let next_layer = &next_layer;
                s.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let index = next_layer.fetch_add(1, Ordering::Relaxed);
                        let Some(slot) = slots.get(index) else {
                            break;
                        };
                        let mut bitmap = slot.lock().unwrap_or_else(PoisonError::into_inner);
                        done.push(analyze_one(index, &mut **bitmap));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(done) => done,
                Err(e) => std::panic::resume_unwind(e),
            })
            .collect()
    });

    results.sort_unstable_by_key(|r| r.index);
    let remaining: u64 = results.iter().map(|r| u64::from(r.remaining_islands)).sum();
    tracing::debug!(workers, remaining, "layer analysis finished");
    results
}

fn analyze_one(index: usize, bitmap: &mut LayerBitmap) -> LayerAnalysis {
    let Reduction {
        remaining,
        reconnected,
    } = island::reduce(bitmap);
    let island_rows = if remaining == 0 {
        Vec::new()
    } else {
        let (masks, _) = island::island_rows(bitmap);
        (0u32..)
            .zip(&masks)
            .filter(|(_, mask)| !mask.is_empty())
            .map(|(y, _)| y)
            .collect()
    };
    LayerAnalysis {
        index,
        remaining_islands: remaining,
        reconnected,
        island_rows,
        packed: rle::pack(bitmap),
    }
}

/// Decode every base layer of `file` and analyze them.
pub fn analyze_file(file: &PhotonFile, workers: usize) -> Result<Vec<LayerAnalysis>> {
    let mut bitmaps = (0..file.layers().len())
        .filter_map(|i| file.layer_bitmap(i))
        .collect::<Result<Vec<_>>>()?;
    Ok(analyze_layers(&mut bitmaps, workers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::PixelState;

    /// Layer `seed` has an island run of `seed + 1` pixels next to a support
    /// pixel on the right, plus one unreachable island in the corner.
    fn layer(seed: u32) -> LayerBitmap {
        let mut b = LayerBitmap::new(16, 4);
        for x in 0..=seed {
            b.mark_island(x, 1);
        }
        b.mark_supported(seed + 1, 1);
        b.mark_island(15, 3);
        b
    }

    #[test]
    fn results_are_in_layer_order_for_any_worker_count() {
        for workers in [0, 1, 3, 8, 64] {
            let mut bitmaps: Vec<_> = (0..10).map(layer).collect();
            let results = analyze_layers(&mut bitmaps, workers);
            assert_eq!(results.len(), 10);
            for (i, r) in results.iter().enumerate() {
                assert_eq!(r.index, i);
                assert_eq!(r.remaining_islands, 1);
                assert_eq!(r.reconnected, i as u32 + 1);
                assert_eq!(r.island_rows, vec![3]);
                assert_eq!(r.packed, rle::pack(&bitmaps[i]));
            }
            assert_eq!(bitmaps[4].state(0, 1), PixelState::Connected);
        }
    }

    #[test]
    fn parallel_matches_serial() {
        let mut serial: Vec<_> = (0..12).map(layer).collect();
        let mut parallel = serial.clone();
        assert_eq!(
            analyze_layers(&mut serial, 1),
            analyze_layers(&mut parallel, 4)
        );
        assert_eq!(serial, parallel);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(analyze_layers(&mut [], 4).is_empty());
    }

    #[test]
    fn default_workers_is_positive() {
        assert!(default_workers() >= 1);
    }
}
