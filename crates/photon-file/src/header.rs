// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Photon file header codec.
//!
//! Wire format (Little-Endian):
//! ```text
//! offset size  field
//! 0      4     magic = 0x12FD0019
//! 4      4     version
//! 8      12    bed size x/y/z (f32 mm)
//! 20     12    reserved[3] (kept verbatim)
//! 32     4     layer height (f32 mm)
//! 36     4     exposure (f32 s)
//! 40     4     bottom exposure (f32 s)
//! 44     4     off time (f32 s)
//! 48     4     bottom layer count
//! 52     8     resolution x/y (px)
//! 60     4     preview one offset
//! 64     4     layer definition table offset
//! 68     4     layer count
//! 72     4     preview two offset
//! 76     4     print time (s)
//! 80     4     project type (0 = cast, 1 = LCD mirror)
//! 84     4     print parameters offset
//! 88     4     print parameters size
//! 92     4     anti-aliasing level
//! 96     2     light PWM
//! 98     2     bottom light PWM
//! 100    4     reserved (kept verbatim)
//! 104    4     machine info offset
//! 108    4     machine info size              (version >= 2 only)
//! ```
//!
//! Offsets are never trusted on write: [`FileHeader::serialize`] takes the
//! offsets computed by the caller once every other section has been sized.

use std::fmt::Write as _;

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{PhotonError, Result, Section};
use crate::profile::PrintProfile;

/// Header magic constant.
pub const HEADER_MAGIC: u32 = 0x12FD_0019;

/// Header size for format version 1.
pub const HEADER_V1_SIZE: usize = 108;

/// Header size for format version 2 and later.
pub const HEADER_V2_SIZE: usize = HEADER_V1_SIZE + 4;

/// Default PWM value written when a file is promoted to version 2.
pub const FULL_PWM: u16 = 255;

/// How the slice images are projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ProjectType {
    /// Images are projected as stored.
    Cast = 0,
    /// Images are mirrored by the LCD.
    LcdMirror = 1,
}

impl ProjectType {
    /// Decode from the wire code.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::Cast),
            1 => Ok(Self::LcdMirror),
            value => Err(PhotonError::UnknownEnumValue {
                field: "project type",
                value,
            }),
        }
    }

    /// Wire code.
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// File-relative section offsets recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionOffsets {
    /// First preview block.
    pub preview_one: u32,
    /// Second preview block.
    pub preview_two: u32,
    /// Layer definition table.
    pub layer_definitions: u32,
    /// Print-parameters block (0 when absent).
    pub print_parameters: u32,
    /// Machine-info block (0 when absent).
    pub machine_info: u32,
}

/// Fields shared by every header version.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderFields {
    /// Magic constant as read (normally [`HEADER_MAGIC`]).
    pub magic: u32,
    /// Build plate size in millimeters.
    pub bed_size_mm: [f32; 3],
    /// Unknown words between the bed size and layer height.
    pub reserved: [u32; 3],
    /// Layer height in millimeters.
    pub layer_height_mm: f32,
    /// Normal layer exposure in seconds.
    pub exposure_s: f32,
    /// Bottom layer exposure in seconds.
    pub bottom_exposure_s: f32,
    /// Light-off time in seconds.
    pub off_time_s: f32,
    /// Number of bottom layers.
    pub bottom_layers: u32,
    /// LCD resolution in pixels.
    pub resolution: [u32; 2],
    /// Number of printable layers.
    pub layer_count: u32,
    /// Estimated print time in seconds.
    pub print_time_s: u32,
    /// Projection mode.
    pub project_type: ProjectType,
    /// Declared size of the print-parameters block.
    pub print_parameters_size: u32,
    /// Declared anti-aliasing level.
    pub anti_aliasing_level: u32,
    /// Light PWM (meaningful from version 2).
    pub light_pwm: u16,
    /// Bottom light PWM (meaningful from version 2).
    pub bottom_light_pwm: u16,
    /// Unknown word before the machine-info offset.
    pub reserved_tail: u32,
    /// Offsets as read from the file. Ignored on write.
    pub offsets: SectionOffsets,
}

/// Photon file header, tagged by binary shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FileHeader {
    /// Version 0/1 layout (108 bytes).
    V1 {
        /// Raw version number.
        version: u32,
        /// Shared fields.
        fields: HeaderFields,
    },
    /// Version 2+ layout (112 bytes) with a machine-info size.
    V2 {
        /// Raw version number.
        version: u32,
        /// Shared fields.
        fields: HeaderFields,
        /// Size of the machine-info block.
        machine_info_size: u32,
    },
}

impl FileHeader {
    /// Parse a header from the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_V1_SIZE {
            return Err(PhotonError::TruncatedInput {
                section: Section::Header,
                needed: HEADER_V1_SIZE,
                available: bytes.len(),
            });
        }
        let mut r = ByteReader::new(bytes, Section::Header);

        let magic = r.u32()?;
        if magic != HEADER_MAGIC {
            tracing::warn!("unexpected header magic {magic:#010x}");
        }
        let version = r.u32()?;
        let bed_size_mm = [r.f32()?, r.f32()?, r.f32()?];
        let reserved = r.u32_array::<3>()?;
        let layer_height_mm = r.f32()?;
        let exposure_s = r.f32()?;
        let bottom_exposure_s = r.f32()?;
        let off_time_s = r.f32()?;
        let bottom_layers = r.u32()?;
        let resolution = [r.u32()?, r.u32()?];
        let preview_one = r.u32()?;
        let layer_definitions = r.u32()?;
        let layer_count = r.u32()?;
        let preview_two = r.u32()?;
        let print_time_s = r.u32()?;
        let project_type = ProjectType::from_code(r.u32()?)?;
        let print_parameters = r.u32()?;
        let print_parameters_size = r.u32()?;
        let anti_aliasing_level = r.u32()?;
        let light_pwm = r.u16()?;
        let bottom_light_pwm = r.u16()?;
        let reserved_tail = r.u32()?;
        let machine_info = r.u32()?;

        let fields = HeaderFields {
            magic,
            bed_size_mm,
            reserved,
            layer_height_mm,
            exposure_s,
            bottom_exposure_s,
            off_time_s,
            bottom_layers,
            resolution,
            layer_count,
            print_time_s,
            project_type,
            print_parameters_size,
            anti_aliasing_level,
            light_pwm,
            bottom_light_pwm,
            reserved_tail,
            offsets: SectionOffsets {
                preview_one,
                preview_two,
                layer_definitions,
                print_parameters,
                machine_info,
            },
        };

        let header = if version > 1 {
            let machine_info_size = r.u32()?;
            Self::V2 {
                version,
                fields,
                machine_info_size,
            }
        } else {
            Self::V1 { version, fields }
        };
        tracing::debug!(version, layers = layer_count, "parsed header");
        Ok(header)
    }

    /// Serialize with the supplied section offsets.
    pub fn serialize(&self, offsets: &SectionOffsets) -> Vec<u8> {
        let f = self.fields();
        let mut w = ByteWriter::with_capacity(self.byte_size());

        w.u32(f.magic);
        w.u32(self.version());
        for v in f.bed_size_mm {
            w.f32(v);
        }
        for v in f.reserved {
            w.u32(v);
        }
        w.f32(f.layer_height_mm);
        w.f32(f.exposure_s);
        w.f32(f.bottom_exposure_s);
        w.f32(f.off_time_s);
        w.u32(f.bottom_layers);
        w.u32(f.resolution[0]);
        w.u32(f.resolution[1]);
        w.u32(offsets.preview_one);
        w.u32(offsets.layer_definitions);
        w.u32(f.layer_count);
        w.u32(offsets.preview_two);
        w.u32(f.print_time_s);
        w.u32(f.project_type.code());
        w.u32(offsets.print_parameters);
        w.u32(f.print_parameters_size);
        w.u32(f.anti_aliasing_level);
        w.u16(f.light_pwm);
        w.u16(f.bottom_light_pwm);
        w.u32(f.reserved_tail);
        w.u32(offsets.machine_info);
        if let Self::V2 {
            machine_info_size, ..
        } = self
        {
            w.u32(*machine_info_size);
        }

        w.into_inner()
    }

    /// Synthesize a header for a new file from a print profile.
    pub fn from_profile(profile: &PrintProfile, layer_count: u32, print_time_s: u32) -> Self {
        let fields = HeaderFields {
            magic: HEADER_MAGIC,
            bed_size_mm: profile.bed_size_mm,
            reserved: [0; 3],
            layer_height_mm: profile.layer_height_mm,
            exposure_s: profile.exposure_s,
            bottom_exposure_s: profile.bottom_exposure_s,
            off_time_s: profile.off_time_s,
            bottom_layers: profile.bottom_layers,
            resolution: profile.resolution,
            layer_count,
            print_time_s,
            project_type: ProjectType::LcdMirror,
            print_parameters_size: 0,
            anti_aliasing_level: 0,
            light_pwm: 0,
            bottom_light_pwm: 0,
            reserved_tail: 0,
            offsets: SectionOffsets::default(),
        };
        let mut header = Self::V1 {
            version: profile.file_version.min(1),
            fields,
        };
        if profile.file_version > 1 {
            header.upgrade(profile.file_version);
        }
        header
    }

    /// Promote a version 1 header to `version` (>= 2).
    ///
    /// Resets anti-aliasing to level 1 and both PWM values to full power.
    /// Versions <= 1, and headers already at version 2+, are left untouched.
    pub fn upgrade(&mut self, version: u32) {
        if version <= 1 {
            return;
        }
        if let Self::V1 { fields, .. } = self {
            let mut fields = fields.clone();
            fields.anti_aliasing_level = 1;
            fields.light_pwm = FULL_PWM;
            fields.bottom_light_pwm = FULL_PWM;
            *self = Self::V2 {
                version,
                fields,
                machine_info_size: 0,
            };
        }
    }

    /// Raw format version.
    pub fn version(&self) -> u32 {
        match self {
            Self::V1 { version, .. } | Self::V2 { version, .. } => *version,
        }
    }

    /// Shared fields.
    pub fn fields(&self) -> &HeaderFields {
        match self {
            Self::V1 { fields, .. } | Self::V2 { fields, .. } => fields,
        }
    }

    pub(crate) fn fields_mut(&mut self) -> &mut HeaderFields {
        match self {
            Self::V1 { fields, .. } | Self::V2 { fields, .. } => fields,
        }
    }

    /// Serialized size in bytes.
    pub const fn byte_size(&self) -> usize {
        match self {
            Self::V1 { .. } => HEADER_V1_SIZE,
            Self::V2 { .. } => HEADER_V2_SIZE,
        }
    }

    /// Whether this header uses the version 2+ layout.
    pub const fn is_v2(&self) -> bool {
        matches!(self, Self::V2 { .. })
    }

    /// Machine-info block size (always 0 for version 1).
    pub fn machine_info_size(&self) -> u32 {
        match self {
            Self::V1 { .. } => 0,
            Self::V2 {
                machine_info_size, ..
            } => *machine_info_size,
        }
    }

    pub(crate) fn set_machine_info_size(&mut self, size: u32) {
        if let Self::V2 {
            machine_info_size, ..
        } = self
        {
            *machine_info_size = size;
        }
    }

    /// Effective anti-aliasing level: 1 for version 1 files.
    pub fn aa_levels(&self) -> u32 {
        match self {
            Self::V1 { .. } => 1,
            Self::V2 { fields, .. } => fields.anti_aliasing_level.max(1),
        }
    }

    /// Whether layers carry anti-aliasing sub-layers.
    pub fn has_anti_aliasing(&self) -> bool {
        self.aa_levels() > 1
    }

    /// Whether the LCD mirrors the images.
    pub fn is_mirrored(&self) -> bool {
        self.fields().project_type == ProjectType::LcdMirror
    }

    /// Set the normal exposure time.
    pub fn set_exposure_s(&mut self, seconds: f32) {
        self.fields_mut().exposure_s = seconds;
    }

    /// Set the bottom exposure time.
    pub fn set_bottom_exposure_s(&mut self, seconds: f32) {
        self.fields_mut().bottom_exposure_s = seconds;
    }

    /// Set the light-off time.
    pub fn set_off_time_s(&mut self, seconds: f32) {
        self.fields_mut().off_time_s = seconds;
    }

    /// Set the number of bottom layers.
    pub fn set_bottom_layers(&mut self, layers: u32) {
        self.fields_mut().bottom_layers = layers;
    }

    /// Print time from the header's timing: every layer exposes and then
    /// waits for the longer of the off time and `peel_s`.
    pub fn estimated_print_time_s(&self, peel_s: f32) -> u32 {
        let f = self.fields();
        let wait = f.off_time_s.max(peel_s);
        let bottom = f.bottom_layers.min(f.layer_count);
        let top = f.layer_count - bottom;
        let total = bottom as f32 * (f.bottom_exposure_s + wait) + top as f32 * (f.exposure_s + wait);
        total as u32
    }

    /// One-line summary: `T: 0.050, E: 8s, O: 2s, BE: 60s, BL: 6`.
    pub fn summary(&self) -> String {
        let f = self.fields();
        let mut out = format!("T: {:.3}", f.layer_height_mm);
        let _ = write!(
            out,
            ", E: {}, O: {}, BE: {}, BL: {}",
            format_seconds(f.exposure_s),
            format_seconds(f.off_time_s),
            format_seconds(f.bottom_exposure_s),
            f.bottom_layers
        );
        out
    }
}

fn format_seconds(seconds: f32) -> String {
    if seconds.fract() == 0.0 {
        format!("{seconds:.0}s")
    } else {
        format!("{seconds:.1}s")
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn v1_header() -> FileHeader {
        let profile = PrintProfile {
            file_version: 1,
            ..PrintProfile::default()
        };
        FileHeader::from_profile(&profile, 12, 3600)
    }

    #[test]
    fn byte_sizes_per_version() {
        let v1 = v1_header();
        assert_eq!(v1.byte_size(), 108);
        assert_eq!(v1.serialize(&SectionOffsets::default()).len(), 108);

        let v2 = FileHeader::from_profile(&PrintProfile::default(), 12, 3600);
        assert_eq!(v2.byte_size(), 112);
        assert_eq!(v2.serialize(&SectionOffsets::default()).len(), 112);
    }

    #[test]
    fn serialize_uses_supplied_offsets() {
        let header = v1_header();
        let offsets = SectionOffsets {
            preview_one: 108,
            preview_two: 200,
            layer_definitions: 300,
            print_parameters: 0,
            machine_info: 0,
        };
        let bytes = header.serialize(&offsets);
        assert_eq!(&bytes[0..4], &HEADER_MAGIC.to_le_bytes());
        assert_eq!(&bytes[60..64], &108u32.to_le_bytes());
        assert_eq!(&bytes[64..68], &300u32.to_le_bytes());
        assert_eq!(&bytes[68..72], &12u32.to_le_bytes());
        assert_eq!(&bytes[72..76], &200u32.to_le_bytes());

        let parsed = FileHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.fields().offsets, offsets);
    }

    #[test]
    fn v1_round_trip_preserves_fields() {
        let mut header = v1_header();
        if let FileHeader::V1 { fields, .. } = &mut header {
            fields.reserved = [1, 2, 3];
            fields.reserved_tail = 0xDEAD_BEEF;
        }
        let bytes = header.serialize(&SectionOffsets::default());
        let parsed = FileHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.aa_levels(), 1);
        assert!(parsed.is_mirrored());
    }

    #[test]
    fn v2_carries_machine_info_size() {
        let mut header = FileHeader::from_profile(&PrintProfile::default(), 1, 0);
        header.set_machine_info_size(76);
        let bytes = header.serialize(&SectionOffsets::default());
        assert_eq!(&bytes[108..112], &76u32.to_le_bytes());
        let parsed = FileHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.machine_info_size(), 76);
        assert_eq!(parsed.version(), 2);
        assert_eq!(parsed.fields().light_pwm, FULL_PWM);
        assert_eq!(parsed.aa_levels(), 1);
    }

    #[test]
    fn short_buffer_is_truncated() {
        let err = FileHeader::parse(&[0u8; 100]).unwrap_err();
        assert_eq!(
            err,
            PhotonError::TruncatedInput {
                section: Section::Header,
                needed: HEADER_V1_SIZE,
                available: 100,
            }
        );

        let v2 = FileHeader::from_profile(&PrintProfile::default(), 1, 0);
        let bytes = v2.serialize(&SectionOffsets::default());
        let err = FileHeader::parse(&bytes[..110]).unwrap_err();
        assert!(matches!(
            err,
            PhotonError::TruncatedInput { needed: 112, available: 110, .. }
        ));
    }

    #[test]
    fn unknown_project_type_is_rejected() {
        let mut bytes = v1_header().serialize(&SectionOffsets::default());
        bytes[80..84].copy_from_slice(&7u32.to_le_bytes());
        assert_eq!(
            FileHeader::parse(&bytes).unwrap_err(),
            PhotonError::UnknownEnumValue {
                field: "project type",
                value: 7,
            }
        );
    }

    #[test]
    fn upgrade_sets_v2_defaults() {
        let mut header = v1_header();
        header.upgrade(2);
        assert!(header.is_v2());
        assert_eq!(header.fields().anti_aliasing_level, 1);
        assert_eq!(header.fields().bottom_light_pwm, FULL_PWM);
        assert_eq!(header.byte_size(), HEADER_V2_SIZE);
    }

    #[test]
    fn print_time_uses_longer_wait() {
        // 6 bottom layers at 60 + 2, 6 normal at 8 + 2.
        let header = v1_header();
        assert_eq!(header.estimated_print_time_s(0.0), 6 * 62 + 6 * 10);
        // A 5 s peel replaces the 2 s off time.
        assert_eq!(header.estimated_print_time_s(5.0), 6 * 65 + 6 * 13);
    }

    #[test]
    fn summary_formats_times() {
        let mut header = v1_header();
        header.set_exposure_s(8.5);
        assert_eq!(header.summary(), "T: 0.050, E: 8.5s, O: 2s, BE: 60s, BL: 6");
    }
}
