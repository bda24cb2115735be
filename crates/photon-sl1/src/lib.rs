// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Prusa SL1 import for photon print jobs.
//!
//! An SL1 archive is a zip holding `*.ini` settings, one grayscale PNG per
//! layer (`<jobDir>00000.png`, ...) and optional
//! `thumbnail/thumbnail<w>x<h>.png` images. [`Sl1Archive::read`] pulls those
//! entries out; [`Sl1Archive::to_photon`] classifies the layers and builds a
//! [`photon_file::PhotonFile`].
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use photon_file::PrintProfile;
//! use photon_sl1::Sl1Archive;
//!
//! let archive = Sl1Archive::read(BufReader::new(File::open("part.sl1")?))?;
//! let job = archive.to_photon(&PrintProfile::default())?;
//! std::fs::write("part.photon", job.to_bytes())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod archive;
pub mod config;
pub mod error;
#[cfg(test)]
mod fixture;
mod import;

pub use archive::Sl1Archive;
pub use config::Sl1Config;
pub use error::{Result, Sl1Error};
pub use import::LIT_THRESHOLD;
