// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reader and writer for photon resin print jobs.
//!
//! A photon file is a versioned little-endian container: a fixed header, two
//! RGB preview images, optional print parameters and machine info (version
//! 2+), one layer-definition table per anti-aliasing level, and the packed
//! layer images those tables point at.
//!
//! The crate also carries the per-layer tooling needed to build those images:
//!
//! - [`LayerBitmap`] classifies every pixel as off, supported, island, or
//!   connected, with per-row counters kept in step with each mark.
//! - [`island::reduce`] reconnects islands that touch support in the layer.
//! - [`rle`] packs classified layers and decodes them for renderers.
//! - [`analysis::analyze_layers`] runs reduction and packing across layers on
//!   scoped worker threads.
//!
//! ```
//! use photon_file::{LayerBitmap, PhotonFile, PreviewImage, PrintProfile};
//!
//! let profile = PrintProfile { resolution: [64, 32], ..PrintProfile::default() };
//! let mut layer = LayerBitmap::new(64, 32);
//! layer.mark_supported(10, 10);
//! let file = PhotonFile::from_profile(
//!     &profile,
//!     PreviewImage::blank(4, 4),
//!     PreviewImage::blank(2, 2),
//!     &[layer],
//! );
//! let bytes = file.to_bytes();
//! let parsed = PhotonFile::parse(&bytes)?;
//! assert_eq!(parsed.layers().len(), 1);
//! # Ok::<(), photon_file::PhotonError>(())
//! ```
//!
//! No I/O happens here; callers hand in and take out byte buffers.

pub mod analysis;
pub mod antialias;
pub mod bitmap;
mod cursor;
pub mod error;
mod file;
pub mod header;
pub mod island;
pub mod layer;
pub mod params;
pub mod preview;
pub mod profile;
pub mod rle;

pub use analysis::{analyze_file, analyze_layers, default_workers, LayerAnalysis};
pub use bitmap::{LayerBitmap, PixelState, RowCounts};
pub use error::{PhotonError, Result, Section};
pub use file::{Layout, PhotonFile};
pub use header::{FileHeader, HeaderFields, ProjectType, SectionOffsets, HEADER_MAGIC};
pub use island::{Reduction, RowMask};
pub use layer::LayerRecord;
pub use params::{MachineInfo, PrintParameters};
pub use preview::PreviewImage;
pub use profile::{MotionProfile, PrintProfile};
pub use rle::RowSegment;
