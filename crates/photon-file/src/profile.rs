// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Printer/job profile used to synthesize headers for newly written files.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Machine and exposure settings applied when a file is built from scratch.
///
/// Defaults describe an Anycubic Photon (1440 × 2560 LCD).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PrintProfile {
    /// File format version to emit (1 or 2).
    pub file_version: u32,
    /// Build plate size in millimeters (x, y, z).
    pub bed_size_mm: [f32; 3],
    /// LCD resolution in pixels (x, y).
    pub resolution: [u32; 2],
    /// Layer height in millimeters.
    pub layer_height_mm: f32,
    /// Normal layer exposure in seconds.
    pub exposure_s: f32,
    /// Bottom layer exposure in seconds.
    pub bottom_exposure_s: f32,
    /// Light-off time between layers in seconds.
    pub off_time_s: f32,
    /// Number of bottom layers.
    pub bottom_layers: u32,
    /// Lift settings written to the version 2 print-parameters block.
    pub motion: MotionProfile,
}

impl Default for PrintProfile {
    fn default() -> Self {
        Self {
            file_version: 2,
            bed_size_mm: [68.04, 120.96, 150.0],
            resolution: [1440, 2560],
            layer_height_mm: 0.05,
            exposure_s: 8.0,
            bottom_exposure_s: 60.0,
            off_time_s: 2.0,
            bottom_layers: 6,
            motion: MotionProfile::default(),
        }
    }
}

/// Z-axis motion settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionProfile {
    /// Lift distance after a bottom layer (mm).
    pub bottom_lift_distance_mm: f32,
    /// Lift speed after a bottom layer (mm/min).
    pub bottom_lift_speed: f32,
    /// Lift distance after a normal layer (mm).
    pub lift_distance_mm: f32,
    /// Lift speed after a normal layer (mm/min).
    pub lift_speed: f32,
    /// Retract speed (mm/min).
    pub retract_speed: f32,
    /// Delay before re-exposing a bottom layer (s).
    pub bottom_light_off_delay_s: f32,
    /// Delay before re-exposing a normal layer (s).
    pub light_off_delay_s: f32,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            bottom_lift_distance_mm: 5.0,
            bottom_lift_speed: 300.0,
            lift_distance_mm: 5.0,
            lift_speed: 300.0,
            retract_speed: 300.0,
            bottom_light_off_delay_s: 0.0,
            light_off_delay_s: 0.0,
        }
    }
}
