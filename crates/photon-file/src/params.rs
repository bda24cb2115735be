// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Version 2 side blocks: print parameters and machine info.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Result, Section};
use crate::profile::MotionProfile;

/// Serialized size of [`PrintParameters`].
pub const PRINT_PARAMETERS_SIZE: usize = 60;

/// Motion and material settings stored after the previews in version 2 files.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintParameters {
    /// Lift distance after a bottom layer (mm).
    pub bottom_lift_distance_mm: f32,
    /// Lift speed after a bottom layer.
    pub bottom_lift_speed: f32,
    /// Lift distance after a normal layer (mm).
    pub lift_distance_mm: f32,
    /// Lift speed after a normal layer.
    pub lift_speed: f32,
    /// Retract speed.
    pub retract_speed: f32,
    /// Resin volume (ml).
    pub volume_ml: f32,
    /// Resin weight (g).
    pub weight_g: f32,
    /// Resin cost.
    pub cost: f32,
    /// Light-off delay for bottom layers (s).
    pub bottom_light_off_delay_s: f32,
    /// Light-off delay for normal layers (s).
    pub light_off_delay_s: f32,
    /// Number of bottom layers.
    pub bottom_layers: u32,
    /// Unknown trailing words.
    pub reserved: [u32; 4],
}

impl PrintParameters {
    /// Defaults for a file promoted from version 1.
    pub fn with_bottom_layers(bottom_layers: u32) -> Self {
        Self::from_motion(&MotionProfile::default(), bottom_layers)
    }

    /// Parameters derived from a motion profile.
    pub fn from_motion(motion: &MotionProfile, bottom_layers: u32) -> Self {
        Self {
            bottom_lift_distance_mm: motion.bottom_lift_distance_mm,
            bottom_lift_speed: motion.bottom_lift_speed,
            lift_distance_mm: motion.lift_distance_mm,
            lift_speed: motion.lift_speed,
            retract_speed: motion.retract_speed,
            volume_ml: 0.0,
            weight_g: 0.0,
            cost: 0.0,
            bottom_light_off_delay_s: motion.bottom_light_off_delay_s,
            light_off_delay_s: motion.light_off_delay_s,
            bottom_layers,
            reserved: [0; 4],
        }
    }

    /// Read the block at `offset`.
    pub fn parse(bytes: &[u8], offset: u32) -> Result<Self> {
        let block =
            ByteReader::at(bytes, offset, Section::PrintParameters)?.take(PRINT_PARAMETERS_SIZE)?;
        let mut r = ByteReader::new(block, Section::PrintParameters);
        Ok(Self {
            bottom_lift_distance_mm: r.f32()?,
            bottom_lift_speed: r.f32()?,
            lift_distance_mm: r.f32()?,
            lift_speed: r.f32()?,
            retract_speed: r.f32()?,
            volume_ml: r.f32()?,
            weight_g: r.f32()?,
            cost: r.f32()?,
            bottom_light_off_delay_s: r.f32()?,
            light_off_delay_s: r.f32()?,
            bottom_layers: r.u32()?,
            reserved: r.u32_array()?,
        })
    }

    /// Append the block.
    pub(crate) fn write(&self, w: &mut ByteWriter) {
        for v in [
            self.bottom_lift_distance_mm,
            self.bottom_lift_speed,
            self.lift_distance_mm,
            self.lift_speed,
            self.retract_speed,
            self.volume_ml,
            self.weight_g,
            self.cost,
            self.bottom_light_off_delay_s,
            self.light_off_delay_s,
        ] {
            w.f32(v);
        }
        w.u32(self.bottom_layers);
        for v in self.reserved {
            w.u32(v);
        }
    }
}

/// Opaque machine description block, kept byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MachineInfo {
    bytes: Vec<u8>,
}

impl MachineInfo {
    /// Wrap raw block bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Read `size` bytes at `offset`.
    pub fn parse(bytes: &[u8], offset: u32, size: u32) -> Result<Self> {
        let data = ByteReader::at(bytes, offset, Section::MachineInfo)?.take(size as usize)?;
        Ok(Self::new(data.to_vec()))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Block size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the block is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
