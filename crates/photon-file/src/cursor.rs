// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sequential little-endian reader/writer over in-memory buffers.

use crate::error::{PhotonError, Result, Section};

/// Checked little-endian reader over a borrowed byte buffer.
///
/// Every read is bounds-checked; an underrun yields
/// [`PhotonError::TruncatedInput`] tagged with the section being decoded and
/// the number of bytes the section needed from its start.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    start: usize,
    pos: usize,
    section: Section,
}

impl<'a> ByteReader<'a> {
    /// Reader positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8], section: Section) -> Self {
        Self {
            bytes,
            start: 0,
            pos: 0,
            section,
        }
    }

    /// Reader positioned at a file-relative `offset`.
    ///
    /// Returns [`PhotonError::InconsistentOffset`] when the offset lies past
    /// the end of the buffer.
    pub fn at(bytes: &'a [u8], offset: u32, section: Section) -> Result<Self> {
        let start = offset as usize;
        if start > bytes.len() {
            return Err(PhotonError::InconsistentOffset {
                section,
                offset,
                len: bytes.len(),
            });
        }
        Ok(Self {
            bytes,
            start,
            pos: start,
            section,
        })
    }

    /// Bytes left after the current position.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            return Err(PhotonError::TruncatedInput {
                section: self.section,
                needed: (self.pos - self.start).saturating_add(n),
                available: self.bytes.len() - self.start,
            });
        };
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read one byte.
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// Read a little-endian `u16`.
    pub fn u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    pub fn u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    /// Read a little-endian IEEE-754 single.
    pub fn f32(&mut self) -> Result<f32> {
        self.array().map(f32::from_le_bytes)
    }

    /// Read `N` consecutive little-endian `u32` values.
    pub fn u32_array<const N: usize>(&mut self) -> Result<[u32; N]> {
        let mut out = [0u32; N];
        for slot in &mut out {
            *slot = self.u32()?;
        }
        Ok(out)
    }
}

/// Append-only little-endian writer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Empty writer with reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Write a little-endian `u16`.
    pub fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian `u32`.
    pub fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian IEEE-754 single.
    pub fn f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write raw bytes.
    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Consume the writer and return the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
