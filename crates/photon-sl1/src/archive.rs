// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Zip container: settings, layer PNGs and thumbnails.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use image::ImageFormat;
use photon_file::PreviewImage;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::config::Sl1Config;
use crate::error::{Result, Sl1Error};

/// An SL1 archive read into memory. Layer images stay PNG-compressed until
/// conversion.
#[derive(Debug, Clone)]
pub struct Sl1Archive {
    config: Sl1Config,
    layers: Vec<Vec<u8>>,
    thumbnails: Vec<PreviewImage>,
}

impl Sl1Archive {
    /// Read every entry the importer needs from `reader`.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut zip = ZipArchive::new(reader)?;

        let mut config = Sl1Config::default();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            let name = entry.name().to_owned();
            if let Some(stem) = name.strip_suffix(".ini") {
                let mut text = String::new();
                entry
                    .read_to_string(&mut text)
                    .map_err(|source| Sl1Error::Entry {
                        name: name.clone(),
                        source,
                    })?;
                config.read_ini(stem, &text);
            }
        }
        if !config.is_valid() {
            return Err(Sl1Error::NoLayers);
        }
        let count = config.layer_count()? as usize;
        let job_dir = config.job_dir()?.to_owned();

        let mut found = BTreeMap::new();
        let mut thumbnails = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            let name = entry.name().to_owned();
            let is_thumbnail = thumbnail_size(&name).is_some();
            let index = layer_index(&name, &job_dir);
            if index.is_none() && !is_thumbnail {
                continue;
            }
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|source| Sl1Error::Entry {
                    name: name.clone(),
                    source,
                })?;
            match index {
                Some(index) if index < count => {
                    found.insert(index, data);
                }
                Some(index) => warn!(index, count, "ignoring layer beyond the declared count"),
                None => match decode_thumbnail(&name, &data) {
                    Ok(preview) => thumbnails.push(preview),
                    Err(err) => warn!(%err, name = %name, "skipping unreadable thumbnail"),
                },
            }
        }

        let mut layers = Vec::with_capacity(found.len());
        for index in 0..count {
            layers.push(found.remove(&index).ok_or(Sl1Error::MissingLayer { index })?);
        }
        thumbnails.sort_by_key(|p| u64::from(p.width()) * u64::from(p.height()));
        debug!(layers = count, thumbnails = thumbnails.len(), "read SL1 archive");
        Ok(Self {
            config,
            layers,
            thumbnails,
        })
    }

    /// Merged ini settings.
    pub fn config(&self) -> &Sl1Config {
        &self.config
    }

    /// PNG bytes of each layer, in layer order.
    pub fn layers(&self) -> &[Vec<u8>] {
        &self.layers
    }

    /// Decoded thumbnails, smallest first.
    pub fn thumbnails(&self) -> &[PreviewImage] {
        &self.thumbnails
    }
}

/// Index of a layer image named `<job_dir><digits>.png`.
fn layer_index(name: &str, job_dir: &str) -> Option<usize> {
    let digits = name.strip_prefix(job_dir)?.strip_suffix(".png")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `(width, height)` of a `thumbnail/thumbnail<w>x<h>.png` entry.
fn thumbnail_size(name: &str) -> Option<(u32, u32)> {
    let size = name
        .strip_prefix("thumbnail/thumbnail")?
        .strip_suffix(".png")?;
    let (w, h) = size.split_once('x')?;
    Some((decimal(w)?, decimal(h)?))
}

fn decimal(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn decode_thumbnail(name: &str, data: &[u8]) -> Result<PreviewImage> {
    let rgb = image::load_from_memory_with_format(data, ImageFormat::Png)
        .map_err(|source| Sl1Error::Thumbnail {
            name: name.to_owned(),
            source,
        })?
        .to_rgb8();
    let pixels: Vec<u32> = rgb
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
        })
        .collect();
    Ok(PreviewImage::from_pixels(rgb.width(), rgb.height(), &pixels)?)
}
