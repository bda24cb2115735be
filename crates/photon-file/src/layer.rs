// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Layer-definition table entries and their image bytes.
//!
//! Entry layout (Little-Endian, 36 bytes):
//! ```text
//! 0   4   z position (f32 mm)
//! 4   4   exposure (f32 s)
//! 8   4   off time (f32 s)
//! 12  4   image data offset
//! 16  4   image data size
//! 20  16  reserved[4]
//! ```
//!
//! Parsed images are slices of the shared input buffer, so table entries that
//! point at the same range share one allocation.

use bytes::Bytes;

use crate::bitmap::LayerBitmap;
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Result, Section};
use crate::rle;

/// Serialized size of one table entry.
pub const LAYER_ENTRY_SIZE: usize = 36;

/// One printable layer, or one anti-aliasing sub-layer of it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    /// Z position of the layer in millimeters.
    pub position_z_mm: f32,
    /// Exposure time in seconds.
    pub exposure_s: f32,
    /// Light-off time in seconds.
    pub off_time_s: f32,
    /// Unknown trailing words.
    pub reserved: [u32; 4],
    image: Bytes,
    anti_alias: Vec<LayerRecord>,
}

impl LayerRecord {
    /// Layer with already packed image bytes.
    pub fn new(
        position_z_mm: f32,
        exposure_s: f32,
        off_time_s: f32,
        image: impl Into<Bytes>,
    ) -> Self {
        Self {
            position_z_mm,
            exposure_s,
            off_time_s,
            reserved: [0; 4],
            image: image.into(),
            anti_alias: Vec::new(),
        }
    }

    /// Layer whose image is the packed form of a classified bitmap.
    pub fn from_bitmap(
        position_z_mm: f32,
        exposure_s: f32,
        off_time_s: f32,
        bitmap: &LayerBitmap,
    ) -> Self {
        Self::new(position_z_mm, exposure_s, off_time_s, rle::pack(bitmap))
    }

    /// Read one table entry and the image bytes it points at.
    pub(crate) fn parse_entry(table: &mut ByteReader<'_>, file: &Bytes) -> Result<Self> {
        let position_z_mm = table.f32()?;
        let exposure_s = table.f32()?;
        let off_time_s = table.f32()?;
        let data_offset = table.u32()?;
        let data_size = table.u32()?;
        let reserved = table.u32_array::<4>()?;
        let range = ByteReader::at(file, data_offset, Section::LayerData)?.take(data_size as usize)?;
        let image = file.slice_ref(range);
        Ok(Self {
            position_z_mm,
            exposure_s,
            off_time_s,
            reserved,
            image,
            anti_alias: Vec::new(),
        })
    }

    /// Write the table entry for image data placed at `data_offset`.
    pub(crate) fn write_entry(&self, w: &mut ByteWriter, data_offset: u32) {
        w.f32(self.position_z_mm);
        w.f32(self.exposure_s);
        w.f32(self.off_time_s);
        w.u32(data_offset);
        w.u32(self.image.len() as u32);
        for v in self.reserved {
            w.u32(v);
        }
    }

    /// Packed image bytes.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Replace the packed image.
    pub fn set_image(&mut self, image: impl Into<Bytes>) {
        self.image = image.into();
    }

    /// Re-pack the image from a classified bitmap.
    pub fn store_bitmap(&mut self, bitmap: &LayerBitmap) {
        self.image = rle::pack(bitmap).into();
    }

    /// Decode the image into a classified bitmap.
    pub fn bitmap(&self, width: u32, height: u32) -> Result<LayerBitmap> {
        rle::unpack(&self.image, width, height)
    }

    /// Anti-aliasing sub-layers, in file order.
    pub fn anti_alias(&self) -> &[LayerRecord] {
        &self.anti_alias
    }

    pub(crate) fn anti_alias_mut(&mut self) -> &mut Vec<LayerRecord> {
        &mut self.anti_alias
    }

    /// A fresh sub-layer copied from this layer's timing and image.
    pub fn derive_sub_layer(&self) -> Self {
        Self {
            position_z_mm: self.position_z_mm,
            exposure_s: self.exposure_s,
            off_time_s: self.off_time_s,
            reserved: self.reserved,
            image: self.image.clone(),
            anti_alias: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PhotonError;

    #[test]
    fn entry_round_trip() {
        let mut layer = LayerRecord::new(0.05, 8.0, 2.0, vec![0x85, 0xA0]);
        layer.reserved = [9, 8, 7, 6];

        let mut w = ByteWriter::default();
        layer.write_entry(&mut w, LAYER_ENTRY_SIZE as u32);
        w.bytes(layer.image());
        let file = Bytes::from(w.into_inner());
        assert_eq!(file.len(), LAYER_ENTRY_SIZE + 2);

        let mut table = ByteReader::new(&file, Section::LayerTable);
        let parsed = LayerRecord::parse_entry(&mut table, &file).unwrap();
        assert_eq!(parsed, layer);
    }

    #[test]
    fn image_outside_file_is_rejected() {
        let layer = LayerRecord::new(0.0, 1.0, 1.0, vec![1, 2, 3]);
        let mut w = ByteWriter::default();
        layer.write_entry(&mut w, 500);
        let file = Bytes::from(w.into_inner());
        let mut table = ByteReader::new(&file, Section::LayerTable);
        assert!(matches!(
            LayerRecord::parse_entry(&mut table, &file),
            Err(PhotonError::InconsistentOffset {
                section: Section::LayerData,
                offset: 500,
                ..
            })
        ));
    }

    #[test]
    fn sub_layer_copies_image_not_chain() {
        let mut base = LayerRecord::new(1.0, 2.0, 3.0, vec![4]);
        let first = base.derive_sub_layer();
        base.anti_alias_mut().push(first);
        let sub = base.derive_sub_layer();
        assert_eq!(sub.image(), &[4]);
        assert!(sub.anti_alias().is_empty());
    }

    #[test]
    fn entries_sharing_a_range_share_memory() {
        let layer = LayerRecord::new(0.0, 1.0, 1.0, vec![7; 64]);
        let table_size = 3 * LAYER_ENTRY_SIZE;
        let mut w = ByteWriter::default();
        for _ in 0..3 {
            layer.write_entry(&mut w, table_size as u32);
        }
        w.bytes(layer.image());
        let file = Bytes::from(w.into_inner());

        let mut table = ByteReader::new(&file, Section::LayerTable);
        let parsed: Vec<_> = (0..3)
            .map(|_| LayerRecord::parse_entry(&mut table, &file).unwrap())
            .collect();
        for record in &parsed {
            assert_eq!(record.image(), layer.image());
            assert_eq!(record.image().as_ptr(), file[table_size..].as_ptr());
        }
    }
}
