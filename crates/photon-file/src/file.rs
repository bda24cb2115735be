// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Whole-file assembly.
//!
//! File order on write:
//! ```text
//! header | preview one | preview two | [print parameters | machine info]
//!        | layer table (base) | layer table (sub-layer 1) | ...
//!        | image data: layer 0, its sub-layers, layer 1, its sub-layers, ...
//! ```
//! Every section is sized first; offsets are then derived from those sizes
//! and only then is the header serialized.

use bytes::Bytes;

use crate::antialias;
use crate::bitmap::{LayerBitmap, PixelState};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Result, Section};
use crate::header::{FileHeader, SectionOffsets};
use crate::layer::{LayerRecord, LAYER_ENTRY_SIZE};
use crate::params::{MachineInfo, PrintParameters, PRINT_PARAMETERS_SIZE};
use crate::preview::PreviewImage;
use crate::profile::PrintProfile;
use crate::rle;

/// Placement of every section for a given file state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Offsets written into the header.
    pub offsets: SectionOffsets,
    /// Start of the first layer image.
    pub image_data: usize,
    /// Total file size.
    pub total: usize,
}

/// A complete photon print job.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonFile {
    header: FileHeader,
    preview_one: PreviewImage,
    preview_two: PreviewImage,
    print_parameters: Option<PrintParameters>,
    machine_info: Option<MachineInfo>,
    layers: Vec<LayerRecord>,
}

impl PhotonFile {
    /// Assemble a file; the header's layer count follows `layers`.
    ///
    /// Version 2 headers get a default print-parameters block.
    pub fn new(
        mut header: FileHeader,
        preview_one: PreviewImage,
        preview_two: PreviewImage,
        layers: Vec<LayerRecord>,
    ) -> Self {
        header.fields_mut().layer_count = layers.len() as u32;
        let print_parameters = header.is_v2().then(|| {
            header.fields_mut().print_parameters_size = PRINT_PARAMETERS_SIZE as u32;
            PrintParameters::with_bottom_layers(header.fields().bottom_layers)
        });
        Self {
            header,
            preview_one,
            preview_two,
            print_parameters,
            machine_info: None,
            layers,
        }
    }

    /// Build a new file from a profile, previews and classified layers.
    ///
    /// Layer `i` sits at `(i + 1) * layer_height`; the first
    /// `bottom_layers` layers use the bottom exposure.
    pub fn from_profile(
        profile: &PrintProfile,
        preview_one: PreviewImage,
        preview_two: PreviewImage,
        bitmaps: &[LayerBitmap],
    ) -> Self {
        let layers: Vec<_> = bitmaps
            .iter()
            .enumerate()
            .map(|(i, bitmap)| {
                let exposure = if (i as u32) < profile.bottom_layers {
                    profile.bottom_exposure_s
                } else {
                    profile.exposure_s
                };
                let z = (i + 1) as f32 * profile.layer_height_mm;
                LayerRecord::from_bitmap(z, exposure, profile.off_time_s, bitmap)
            })
            .collect();
        let mut header = FileHeader::from_profile(profile, layers.len() as u32, 0);
        header.fields_mut().print_time_s = header.estimated_print_time_s(0.0);
        let mut file = Self::new(header, preview_one, preview_two, layers);
        if let Some(params) = &mut file.print_parameters {
            *params = PrintParameters::from_motion(&profile.motion, profile.bottom_layers);
        }
        file
    }

    /// Parse a complete file.
    ///
    /// The input is copied once; layer images are slices of that copy.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_shared(&Bytes::copy_from_slice(bytes))
    }

    /// Parse a complete file, slicing layer images out of `bytes` without
    /// copying them.
    pub fn parse_shared(bytes: &Bytes) -> Result<Self> {
        let header = FileHeader::parse(bytes)?;
        let offsets = header.fields().offsets;

        let preview_one = PreviewImage::parse(bytes, offsets.preview_one, Section::PreviewOne)?;
        let preview_two = PreviewImage::parse(bytes, offsets.preview_two, Section::PreviewTwo)?;

        let (print_parameters, machine_info) = if header.is_v2() {
            let params = (offsets.print_parameters != 0)
                .then(|| PrintParameters::parse(bytes, offsets.print_parameters))
                .transpose()?;
            let size = header.machine_info_size();
            let machine = (size != 0)
                .then(|| MachineInfo::parse(bytes, offsets.machine_info, size))
                .transpose()?;
            (params, machine)
        } else {
            (None, None)
        };

        let count = header.fields().layer_count as usize;
        let levels = header.aa_levels() as usize;
        let mut table = ByteReader::at(bytes, offsets.layer_definitions, Section::LayerTable)?;
        let mut layers: Vec<LayerRecord> =
            Vec::with_capacity(count.min(table.remaining() / LAYER_ENTRY_SIZE));
        for i in 0..count {
            layers.push(LayerRecord::parse_entry(&mut table, bytes)?);
            tracing::trace!(layer = i, "read layer entry");
        }
        let tables = if layers.is_empty() { 1 } else { levels };
        for _ in 1..tables {
            for layer in &mut layers {
                let sub = LayerRecord::parse_entry(&mut table, bytes)?;
                layer.anti_alias_mut().push(sub);
            }
        }

        tracing::debug!(
            version = header.version(),
            layers = count,
            aa_levels = levels,
            "parsed photon file"
        );
        Ok(Self {
            header,
            preview_one,
            preview_two,
            print_parameters,
            machine_info,
            layers,
        })
    }

    /// Compute where every section will land.
    pub fn layout(&self) -> Layout {
        let preview_one = self.header.byte_size();
        let preview_two = preview_one + self.preview_one.byte_size();
        let mut layer_definitions = preview_two + self.preview_two.byte_size();
        let mut print_parameters = 0;
        let mut machine_info = 0;
        if self.header.is_v2() {
            print_parameters = layer_definitions;
            layer_definitions = print_parameters + PRINT_PARAMETERS_SIZE;
            if let Some(info) = self.machine_info.as_ref().filter(|m| !m.is_empty()) {
                machine_info = layer_definitions;
                layer_definitions = machine_info + info.len();
            }
        }
        let levels = self.header.aa_levels() as usize;
        let image_data = layer_definitions + LAYER_ENTRY_SIZE * self.layers.len() * levels;
        let images: usize = self.layer_images().map(<[u8]>::len).sum();

        Layout {
            offsets: SectionOffsets {
                preview_one: preview_one as u32,
                preview_two: preview_two as u32,
                layer_definitions: layer_definitions as u32,
                print_parameters: print_parameters as u32,
                machine_info: machine_info as u32,
            },
            image_data,
            total: image_data + images,
        }
    }

    /// Image bytes in file order: each layer followed by its sub-layers.
    fn layer_images(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let subs = self.header.aa_levels() as usize - 1;
        self.layers.iter().flat_map(move |layer| {
            std::iter::once(layer.image()).chain((0..subs).map(move |a| sub_layer(layer, a).image()))
        })
    }

    /// Serialize the file with freshly computed offsets.
    pub fn to_bytes(&self) -> Vec<u8> {
        let layout = self.layout();
        let mut header = self.header.clone();
        header.set_machine_info_size(self.machine_info.as_ref().map_or(0, |m| m.len() as u32));
        if header.is_v2() {
            header.fields_mut().print_parameters_size = PRINT_PARAMETERS_SIZE as u32;
        }

        let mut w = ByteWriter::with_capacity(layout.total);
        w.bytes(&header.serialize(&layout.offsets));
        self.preview_one.write(&mut w, layout.offsets.preview_one);
        self.preview_two.write(&mut w, layout.offsets.preview_two);
        if self.header.is_v2() {
            match &self.print_parameters {
                Some(params) => params.write(&mut w),
                None => PrintParameters::with_bottom_layers(self.header.fields().bottom_layers)
                    .write(&mut w),
            }
            if let Some(info) = &self.machine_info {
                w.bytes(info.as_bytes());
            }
        }

        // Image offsets follow file order (layer, then its sub-layers), while
        // the tables list all base layers first, then each sub-layer level.
        let subs = self.header.aa_levels() as usize - 1;
        let mut data_at = layout.image_data as u32;
        let mut placed: Vec<Vec<u32>> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let mut chain = Vec::with_capacity(subs + 1);
            chain.push(data_at);
            data_at += layer.image().len() as u32;
            for a in 0..subs {
                chain.push(data_at);
                data_at += sub_layer(layer, a).image().len() as u32;
            }
            placed.push(chain);
        }
        let tables = if self.layers.is_empty() { 0 } else { subs + 1 };
        for level in 0..tables {
            for (layer, chain) in self.layers.iter().zip(&placed) {
                let record = if level == 0 {
                    layer
                } else {
                    sub_layer(layer, level - 1)
                };
                record.write_entry(&mut w, chain[level]);
            }
        }
        for image in self.layer_images() {
            w.bytes(image);
        }

        debug_assert_eq!(w.position(), layout.total);
        tracing::debug!(
            bytes = layout.total,
            layers = self.layers.len(),
            "serialized photon file"
        );
        w.into_inner()
    }

    /// Header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Header, for the exposure and bottom-layer setters.
    pub fn header_mut(&mut self) -> &mut FileHeader {
        &mut self.header
    }

    /// First (large) preview.
    pub fn preview_one(&self) -> &PreviewImage {
        &self.preview_one
    }

    /// Second (small) preview.
    pub fn preview_two(&self) -> &PreviewImage {
        &self.preview_two
    }

    /// Replace both previews.
    pub fn set_previews(&mut self, preview_one: PreviewImage, preview_two: PreviewImage) {
        self.preview_one = preview_one;
        self.preview_two = preview_two;
    }

    /// Version 2 print parameters.
    pub fn print_parameters(&self) -> Option<&PrintParameters> {
        self.print_parameters.as_ref()
    }

    /// Mutable version 2 print parameters.
    pub fn print_parameters_mut(&mut self) -> Option<&mut PrintParameters> {
        self.print_parameters.as_mut()
    }

    /// Version 2 machine info.
    pub fn machine_info(&self) -> Option<&MachineInfo> {
        self.machine_info.as_ref()
    }

    /// Attach a machine-info block (ignored on write for version 1).
    pub fn set_machine_info(&mut self, info: MachineInfo) {
        self.machine_info = Some(info);
    }

    /// Base layers.
    pub fn layers(&self) -> &[LayerRecord] {
        &self.layers
    }

    /// Base layers, for image or timing edits.
    pub fn layers_mut(&mut self) -> &mut [LayerRecord] {
        &mut self.layers
    }

    /// Decode base layer `index` into a classified bitmap.
    pub fn layer_bitmap(&self, index: usize) -> Option<Result<LayerBitmap>> {
        let [width, height] = self.header.fields().resolution;
        self.layers.get(index).map(|l| l.bitmap(width, height))
    }

    /// Set the bottom-layer count on the header and on the version 2 print
    /// parameters.
    pub fn set_bottom_layers(&mut self, layers: u32) {
        self.header.set_bottom_layers(layers);
        if let Some(params) = &mut self.print_parameters {
            params.bottom_layers = layers;
        }
    }

    /// Copy the header's exposure and off times onto every layer record and
    /// its sub-layers. Layers below the bottom-layer count take the bottom
    /// exposure.
    pub fn apply_header_timing(&mut self) {
        let f = self.header.fields();
        let (exposure, bottom_exposure, off_time) = (f.exposure_s, f.bottom_exposure_s, f.off_time_s);
        let bottom = f.bottom_layers as usize;
        for (i, layer) in self.layers.iter_mut().enumerate() {
            let exposure_s = if i < bottom { bottom_exposure } else { exposure };
            layer.exposure_s = exposure_s;
            layer.off_time_s = off_time;
            for sub in layer.anti_alias_mut() {
                sub.exposure_s = exposure_s;
                sub.off_time_s = off_time;
            }
        }
    }

    /// Lit pixels across all base layers, counted straight from the runs.
    pub fn exposed_pixels(&self) -> Result<u64> {
        let mut total = 0u64;
        for layer in &self.layers {
            for run in rle::runs(layer.image()) {
                let run = run?;
                if run.state != PixelState::Off {
                    total += u64::from(run.length);
                }
            }
        }
        Ok(total)
    }

    /// Resin volume in milliliters for `pixels` lit pixels.
    pub fn volume_ml(&self, pixels: u64) -> f32 {
        let f = self.header.fields();
        let [rx, ry] = f.resolution;
        if rx == 0 || ry == 0 {
            return 0.0;
        }
        let pixel_area_mm2 = (f.bed_size_mm[0] / rx as f32) * (f.bed_size_mm[1] / ry as f32);
        pixel_area_mm2 * f.layer_height_mm * pixels as f32 / 1000.0
    }

    /// Change the anti-aliasing level (version 2+ only).
    pub fn set_anti_aliasing(&mut self, level: u32) -> Result<()> {
        antialias::set_level(&mut self.header, &mut self.layers, level)
    }

    /// Promote a version 1 file to version 2.
    pub fn upgrade(&mut self) {
        if self.header.is_v2() {
            return;
        }
        self.header.upgrade(2);
        self.header.fields_mut().print_parameters_size = PRINT_PARAMETERS_SIZE as u32;
        self.print_parameters = Some(PrintParameters::with_bottom_layers(
            self.header.fields().bottom_layers,
        ));
    }
}

/// Sub-layer `index` of `layer`, or the base layer when the chain is short.
fn sub_layer(layer: &LayerRecord, index: usize) -> &LayerRecord {
    layer.anti_alias().get(index).unwrap_or(layer)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::header::HEADER_V1_SIZE;

    fn bitmap(width: u32, height: u32, fill: u32) -> LayerBitmap {
        let mut b = LayerBitmap::new(width, height);
        for x in 0..fill.min(width) {
            b.mark_supported(x, 0);
        }
        b
    }

    fn sample(version: u32) -> PhotonFile {
        let profile = PrintProfile {
            file_version: version,
            resolution: [16, 4],
            bottom_layers: 1,
            ..PrintProfile::default()
        };
        let bitmaps = [bitmap(16, 4, 3), bitmap(16, 4, 16), bitmap(16, 4, 0)];
        PhotonFile::from_profile(
            &profile,
            PreviewImage::from_pixels(2, 2, &[0xFF_FF_FF, 0, 0x80_80_80, 0x10_20_30]).unwrap(),
            PreviewImage::blank(1, 1),
            &bitmaps,
        )
    }

    #[test]
    fn v1_layout_offsets_match_written_positions() {
        let file = sample(1);
        let bytes = file.to_bytes();
        let layout = file.layout();
        assert_eq!(bytes.len(), layout.total);
        assert_eq!(layout.offsets.preview_one as usize, HEADER_V1_SIZE);
        assert_eq!(layout.offsets.preview_two, 108 + 32 + 8);
        assert_eq!(layout.offsets.layer_definitions, 148 + 32 + 2);
        assert_eq!(layout.offsets.print_parameters, 0);

        let parsed = PhotonFile::parse(&bytes).unwrap();
        assert_eq!(parsed.header().fields().offsets, layout.offsets);
        assert_eq!(parsed.layers(), file.layers());
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn v2_round_trip_is_byte_exact() {
        let mut file = sample(2);
        file.set_machine_info(MachineInfo::new(vec![0x5A; 12]));
        file.set_anti_aliasing(3).unwrap();
        let bytes = file.to_bytes();

        let parsed = PhotonFile::parse(&bytes).unwrap();
        assert_eq!(parsed.header().machine_info_size(), 12);
        assert_eq!(parsed.machine_info().map(MachineInfo::len), Some(12));
        assert_eq!(parsed.print_parameters(), file.print_parameters());
        assert!(parsed.layers().iter().all(|l| l.anti_alias().len() == 2));
        assert_eq!(parsed.to_bytes(), bytes);

        let offsets = parsed.header().fields().offsets;
        assert_eq!(offsets.print_parameters as usize, 112 + 40 + 34);
        assert_eq!(offsets.machine_info, offsets.print_parameters + 60);
        assert_eq!(offsets.layer_definitions, offsets.machine_info + 12);
    }

    #[test]
    fn images_follow_each_layer_with_its_sub_layers() {
        let mut file = sample(2);
        file.set_anti_aliasing(2).unwrap();
        file.layers_mut()[0].anti_alias_mut()[0].set_image(vec![0x0F, 0x21]);
        let bytes = file.to_bytes();
        let parsed = PhotonFile::parse(&bytes).unwrap();

        let start = file.layout().image_data;
        let base0 = file.layers()[0].image();
        assert_eq!(&bytes[start..start + base0.len()], base0);
        let sub_at = start + base0.len();
        assert_eq!(&bytes[sub_at..sub_at + 2], &[0x0F, 0x21]);
        assert_eq!(parsed.layers()[0].anti_alias()[0].image(), &[0x0F, 0x21]);
    }

    #[test]
    fn profile_drives_layer_timing() {
        let file = sample(1);
        let layers = file.layers();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].exposure_s, 60.0);
        assert_eq!(layers[1].exposure_s, 8.0);
        assert!((layers[2].position_z_mm - 0.15).abs() < 1e-6);
        assert_eq!(file.header().fields().layer_count, 3);
        assert_eq!(file.header().fields().print_time_s, 62 + 10 + 10);
    }

    #[test]
    fn layer_bitmaps_decode_at_header_resolution() {
        let file = sample(1);
        let b = file.layer_bitmap(1).unwrap().unwrap();
        assert_eq!(b.row_counts(0).pixels, 16);
        assert!(b.row_is_empty(1));
        assert!(file.layer_bitmap(3).is_none());
    }

    #[test]
    fn exposed_pixels_and_volume() {
        let file = sample(1);
        // Three supported pixels in layer 0, a full row in layer 1.
        assert_eq!(file.exposed_pixels().unwrap(), 3 + 16);
        let mut profile_sized = file.clone();
        let f = profile_sized.header_mut().fields_mut();
        f.resolution = [10, 10];
        f.bed_size_mm = [10.0, 10.0, 100.0];
        f.layer_height_mm = 0.1;
        // 1 mm² pixels, 0.1 mm tall: 10 000 pixels make 1 ml.
        assert!((profile_sized.volume_ml(10_000) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn upgrade_adds_parameters_block() {
        let mut file = sample(1);
        file.upgrade();
        assert!(file.header().is_v2());
        assert_eq!(file.print_parameters().map(|p| p.bottom_layers), Some(1));
        let parsed = PhotonFile::parse(&file.to_bytes()).unwrap();
        assert_eq!(parsed.header().version(), 2);
        assert_eq!(parsed.header().fields().print_parameters_size, 60);
    }

    #[test]
    fn missing_parameters_block_is_written_with_its_size() {
        let mut bytes = sample(2).to_bytes();
        // Clear the print-parameters offset and size words.
        bytes[84..92].fill(0);
        let parsed = PhotonFile::parse(&bytes).unwrap();
        assert!(parsed.print_parameters().is_none());
        assert_eq!(parsed.header().fields().print_parameters_size, 0);

        let rewritten = PhotonFile::parse(&parsed.to_bytes()).unwrap();
        let f = rewritten.header().fields();
        assert_ne!(f.offsets.print_parameters, 0);
        assert_eq!(f.print_parameters_size as usize, PRINT_PARAMETERS_SIZE);
        assert_eq!(rewritten.print_parameters().map(|p| p.bottom_layers), Some(1));
    }

    #[test]
    fn bottom_layers_reach_print_parameters() {
        let mut file = sample(2);
        file.set_bottom_layers(4);
        let parsed = PhotonFile::parse(&file.to_bytes()).unwrap();
        assert_eq!(parsed.header().fields().bottom_layers, 4);
        assert_eq!(parsed.print_parameters().map(|p| p.bottom_layers), Some(4));
    }

    #[test]
    fn header_timing_reaches_layers_and_sub_layers() {
        let mut file = sample(2);
        file.set_anti_aliasing(2).unwrap();
        let h = file.header_mut();
        h.set_exposure_s(7.5);
        h.set_bottom_exposure_s(45.0);
        h.set_off_time_s(3.0);
        file.set_bottom_layers(2);
        file.apply_header_timing();

        let parsed = PhotonFile::parse(&file.to_bytes()).unwrap();
        let expected = [45.0, 45.0, 7.5];
        for (layer, exposure) in parsed.layers().iter().zip(expected) {
            assert_eq!(layer.exposure_s, exposure);
            assert_eq!(layer.off_time_s, 3.0);
            let sub = &layer.anti_alias()[0];
            assert_eq!((sub.exposure_s, sub.off_time_s), (exposure, 3.0));
        }
    }

    #[test]
    fn truncated_layer_table_is_reported() {
        let bytes = sample(1).to_bytes();
        let layout = sample(1).layout();
        let cut = layout.offsets.layer_definitions as usize + 40;
        assert!(PhotonFile::parse(&bytes[..cut]).is_err());
    }
}
