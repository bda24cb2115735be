// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Conversion of an [`Sl1Archive`] into a [`PhotonFile`].

use image::ImageFormat;
use photon_file::{
    island, FileHeader, LayerBitmap, LayerRecord, PhotonFile, PreviewImage, PrintParameters,
    PrintProfile,
};
use tracing::{debug, instrument, warn};

use crate::archive::Sl1Archive;
use crate::error::{Result, Sl1Error};

/// Layer pixels with at least this luma are exposed.
pub const LIT_THRESHOLD: u8 = 128;

/// Blank previews written when the archive has no thumbnails.
const LARGE_PREVIEW: (u32, u32) = (400, 300);
const SMALL_PREVIEW: (u32, u32) = (200, 125);

impl Sl1Archive {
    /// Build a photon job from the archive.
    ///
    /// Exposure, layer height, bottom layers, print time and resin figures
    /// come from the archive settings. `machine` supplies the rest: file
    /// version, bed size, off time and lift motion. The resolution is the
    /// size of the layer images.
    #[instrument(skip_all, fields(layers = self.layers().len()))]
    pub fn to_photon(&self, machine: &PrintProfile) -> Result<PhotonFile> {
        let config = self.config();
        let mut profile = machine.clone();
        profile.layer_height_mm = config.layer_height_mm()?;
        profile.exposure_s = config.exposure_s()?;
        profile.bottom_exposure_s = config.bottom_exposure_s()?;
        profile.bottom_layers = config.bottom_layers()?;

        let mut classifier = Classifier::default();
        let mut records = Vec::with_capacity(self.layers().len());
        let mut islands = 0u64;
        for (index, png) in self.layers().iter().enumerate() {
            let bitmap = classifier.next_layer(index, png)?;
            islands += u64::from(bitmap.island_count());
            let exposure = if (index as u32) < profile.bottom_layers {
                profile.bottom_exposure_s
            } else {
                profile.exposure_s
            };
            let z = (index + 1) as f32 * profile.layer_height_mm;
            records.push(LayerRecord::from_bitmap(
                z,
                exposure,
                profile.off_time_s,
                &bitmap,
            ));
        }

        if let Some(size) = classifier.size {
            if size != machine.resolution {
                warn!(
                    layers = ?size,
                    profile = ?machine.resolution,
                    "layer images differ from the profile resolution"
                );
            }
            profile.resolution = size;
        }
        let count = records.len() as u32;
        let print_time = config.print_time_s().unwrap_or_else(|| {
            FileHeader::from_profile(&profile, count, 0).estimated_print_time_s(0.0)
        });
        let header = FileHeader::from_profile(&profile, count, print_time);

        let thumbnails = self.thumbnails();
        let (large, small) = match (thumbnails.last(), thumbnails.first()) {
            (Some(large), Some(small)) => (large.clone(), small.clone()),
            _ => (
                PreviewImage::blank(LARGE_PREVIEW.0, LARGE_PREVIEW.1),
                PreviewImage::blank(SMALL_PREVIEW.0, SMALL_PREVIEW.1),
            ),
        };

        let mut file = PhotonFile::new(header, large, small, records);
        if let Some(params) = file.print_parameters_mut() {
            *params = PrintParameters::from_motion(&profile.motion, profile.bottom_layers);
            params.volume_ml = config.used_material_ml();
            params.weight_g = config.weight_g();
            params.cost = config.cost();
        }
        debug!(islands, print_time, "converted SL1 archive");
        Ok(file)
    }
}

/// Classifies each layer against the lit mask of the layer below.
#[derive(Debug, Default)]
struct Classifier {
    size: Option<[u32; 2]>,
    below: Vec<bool>,
}

impl Classifier {
    fn next_layer(&mut self, index: usize, png: &[u8]) -> Result<LayerBitmap> {
        let luma = image::load_from_memory_with_format(png, ImageFormat::Png)
            .map_err(|source| Sl1Error::LayerImage { index, source })?
            .to_luma8();
        let (width, height) = luma.dimensions();
        let expected = *self.size.get_or_insert([width, height]);
        if expected != [width, height] {
            return Err(Sl1Error::ResolutionMismatch {
                index,
                expected,
                actual: [width, height],
            });
        }

        let lit: Vec<bool> = luma.pixels().map(|p| p.0[0] >= LIT_THRESHOLD).collect();
        let mut bitmap = LayerBitmap::new(width, height);
        let row = width as usize;
        for (i, &on) in lit.iter().enumerate() {
            if !on {
                continue;
            }
            let (x, y) = ((i % row) as u32, (i / row) as u32);
            // The build plate holds up all of layer 0.
            if index == 0 || self.below.get(i) == Some(&true) {
                bitmap.mark_supported(x, y);
            } else {
                bitmap.mark_island(x, y);
            }
        }
        island::reduce(&mut bitmap);
        self.below = lit;
        Ok(bitmap)
    }
}
