//! Random-access byte sources.
//!
//! The storage engine only ever asks its backing resource for byte ranges,
//! so anything addressable by `(offset, length)` can serve a track file:
//! a memory-mapped local file, an owned buffer, or (outside this crate)
//! a remote resource answering HTTP range requests. Reads that extend past
//! the end of the resource return the available prefix, mirroring range
//! request semantics; exhaustion is detected downstream by the decoders.

use std::fs::File;
use std::path::Path;

use auto_impl::auto_impl;
use memmap2::Mmap;

use crate::error::Result;

/// A resource supporting arbitrary-offset partial reads.
#[auto_impl(&, Box, Arc)]
pub trait ByteSource {
    /// Reads up to `length` bytes starting at `offset`.
    fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>>;

    /// Reads the entire resource.
    fn read_all(&self) -> Result<Vec<u8>>;

    /// Total size of the resource in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn clamped<'a>(buf: &'a [u8], offset: u64, length: usize) -> &'a [u8] {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(buf.len());
    let end = start.saturating_add(length).min(buf.len());
    &buf[start..end]
}

/// A memory-mapped local file.
pub struct MmapSource {
    map: Mmap,
}

impl MmapSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let map = unsafe { Mmap::map(&file) }?;
        Ok(Self { map })
    }
}

impl ByteSource for MmapSource {
    fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        Ok(clamped(&self.map, offset, length).to_vec())
    }

    fn read_all(&self) -> Result<Vec<u8>> {
        Ok(self.map.to_vec())
    }

    fn len(&self) -> u64 {
        self.map.len() as u64
    }
}

/// An owned in-memory buffer.
pub struct BytesSource {
    bytes: Vec<u8>,
}

impl BytesSource {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<Vec<u8>> for BytesSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl ByteSource for BytesSource {
    fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        Ok(clamped(&self.bytes, offset, length).to_vec())
    }

    fn read_all(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }
}
