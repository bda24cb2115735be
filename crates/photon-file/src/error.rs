// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy shared by every photon-file codec.

use std::fmt;

/// File section an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Fixed-layout file header.
    Header,
    /// First (large) preview block.
    PreviewOne,
    /// Second (small) preview block.
    PreviewTwo,
    /// Version 2 print-parameters block.
    PrintParameters,
    /// Version 2 machine-info block.
    MachineInfo,
    /// Layer-definition table.
    LayerTable,
    /// Packed image bytes of a layer.
    LayerData,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::PreviewOne => "preview one",
            Self::PreviewTwo => "preview two",
            Self::PrintParameters => "print parameters",
            Self::MachineInfo => "machine info",
            Self::LayerTable => "layer table",
            Self::LayerData => "layer data",
        };
        f.write_str(name)
    }
}

/// Errors raised while decoding or editing a photon file.
///
/// Every variant is fatal for the section being processed; nothing in this
/// crate downgrades a decode failure to a default value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhotonError {
    /// Buffer ended before the section's declared or required size.
    #[error("truncated {section}: need {needed} bytes, got {available}")]
    TruncatedInput {
        /// Section being read.
        section: Section,
        /// Bytes required from the section start.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// An enumerated field carried a code this crate does not know.
    #[error("unknown {field} value {value}")]
    UnknownEnumValue {
        /// Field name.
        field: &'static str,
        /// Raw code read from the file.
        value: u32,
    },

    /// A run would write pixels past the end of its row or image.
    #[error("malformed run in {section}: {length} pixels at position {position} exceeds limit {limit}")]
    MalformedRun {
        /// Section being decoded.
        section: Section,
        /// Pixel position at which the run starts.
        position: usize,
        /// Run length in pixels.
        length: usize,
        /// Pixel limit the run overflows.
        limit: usize,
    },

    /// A section offset points outside the buffer.
    #[error("{section} offset {offset} lies outside a {len}-byte buffer")]
    InconsistentOffset {
        /// Section the offset refers to.
        section: Section,
        /// Offset value read from the file.
        offset: u32,
        /// Buffer length.
        len: usize,
    },

    /// Pixel data does not match the declared dimensions.
    #[error("dimension mismatch: expected {expected} pixels, got {actual}")]
    DimensionMismatch {
        /// `width * height`.
        expected: usize,
        /// Supplied pixel count.
        actual: usize,
    },

    /// Anti-aliasing cannot be changed on this file version.
    #[error("anti-aliasing requires format version 2 or later (file is version {version})")]
    AntiAliasingUnsupported {
        /// File format version.
        version: u32,
    },

    /// Anti-aliasing level must be at least 1.
    #[error("invalid anti-aliasing level {level}")]
    InvalidAntiAliasingLevel {
        /// Requested level.
        level: u32,
    },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, PhotonError>;
