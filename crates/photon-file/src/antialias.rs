// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Anti-aliasing level management.
//!
//! A file at level `L` stores `L - 1` sub-layers after every base layer.
//! Changing the level trims or pads every chain to match; the sub-layer
//! images are expected to be recomputed afterwards, so padding only copies
//! the base layer.

use crate::error::{PhotonError, Result};
use crate::header::FileHeader;
use crate::layer::LayerRecord;

/// Set the anti-aliasing level of `header` and resize every chain in
/// `layers` to `level - 1` sub-layers.
///
/// Shorter chains are padded with copies of their base layer; longer ones
/// lose their oldest (front) entries. Version 1 files have no sub-layers
/// and are rejected.
pub fn set_level(header: &mut FileHeader, layers: &mut [LayerRecord], level: u32) -> Result<()> {
    if !header.is_v2() {
        return Err(PhotonError::AntiAliasingUnsupported {
            version: header.version(),
        });
    }
    if level == 0 {
        return Err(PhotonError::InvalidAntiAliasingLevel { level });
    }

    let current = header.fields().anti_aliasing_level;
    let target = (level - 1) as usize;
    for layer in layers.iter_mut() {
        let sub = layer.derive_sub_layer();
        let chain = layer.anti_alias_mut();
        if chain.len() > target {
            let excess = chain.len() - target;
            chain.drain(..excess);
        }
        while chain.len() < target {
            chain.push(sub.clone());
        }
    }
    header.fields_mut().anti_aliasing_level = level;
    tracing::debug!(from = current, to = level, layers = layers.len(), "anti-aliasing level set");
    Ok(())
}

/// Effective level: what the header declares, or 1 for version 1.
pub fn levels(header: &FileHeader) -> u32 {
    header.aa_levels()
}
