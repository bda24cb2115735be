// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Failures while reading or converting an SL1 archive.

use photon_file::PhotonError;
use thiserror::Error;

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Sl1Error>;

/// Everything that can stop an SL1 import.
#[derive(Debug, Error)]
pub enum Sl1Error {
    /// The input is not a readable zip archive.
    #[error("not a readable SL1 archive")]
    Archive(#[from] zip::result::ZipError),
    /// An archive entry could not be read.
    #[error("failed to read archive entry `{name}`")]
    Entry {
        /// Entry name inside the archive.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A required settings key is absent.
    #[error("settings key `{key}` is missing")]
    MissingKey {
        /// Qualified key (`<ini stem>.<name>`).
        key: String,
    },
    /// A required settings value is not a number.
    #[error("settings key `{key}` has unusable value `{value}`")]
    BadValue {
        /// Qualified key.
        key: String,
        /// Raw value.
        value: String,
    },
    /// The settings declare no layers.
    #[error("archive declares no layers")]
    NoLayers,
    /// A layer below the declared count has no image.
    #[error("layer {index} is missing from the archive")]
    MissingLayer {
        /// Layer index.
        index: usize,
    },
    /// A layer image is not a decodable PNG.
    #[error("layer {index} image could not be decoded")]
    LayerImage {
        /// Layer index.
        index: usize,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
    /// A thumbnail is not a decodable PNG.
    #[error("thumbnail `{name}` could not be decoded")]
    Thumbnail {
        /// Entry name inside the archive.
        name: String,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
    /// A layer differs in size from the first layer.
    #[error("layer {index} is {actual:?} px but the first layer is {expected:?} px")]
    ResolutionMismatch {
        /// Layer index.
        index: usize,
        /// Size of layer 0.
        expected: [u32; 2],
        /// Size of this layer.
        actual: [u32; 2],
    },
    /// Building the photon side failed.
    #[error(transparent)]
    Photon(#[from] PhotonError),
}
