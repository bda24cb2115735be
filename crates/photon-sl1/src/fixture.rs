// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory SL1 archives for tests.
#![allow(clippy::unwrap_used)]

use std::io::{Cursor, Write};

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub(crate) fn zip_entries(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// `config.ini` for a job named `cube` with one bottom layer.
pub(crate) fn job_ini(layers: u32) -> String {
    format!(
        "action = print\njobDir = cube\nexpTime = 7\nexpTimeFirst = 40\n\
         layerHeight = 0.05\nnumFade = 1\nnumFast = {layers}\nprintTime = 321\n\
         usedMaterial = 2.5\n"
    )
}

/// Black layer with the given pixels at full brightness.
pub(crate) fn layer_png(width: u32, height: u32, lit: &[(u32, u32)]) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, y| {
        Luma([if lit.contains(&(x, y)) { 255 } else { 0 }])
    });
    encode(&DynamicImage::ImageLuma8(img))
}

pub(crate) fn thumbnail_png(width: u32, height: u32) -> Vec<u8> {
    encode(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb([200, 96, 40]),
    )))
}

fn encode(img: &DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
