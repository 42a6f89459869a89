//! # Indexed binary track files
//!
//! Read-only engine for the BigWig/BigBed ("bbi") container: a random-access
//! binary format storing numeric (wig) or annotation (bed) records together
//! with precomputed multi-resolution summaries, indexed by a disk-resident
//! R tree per resolution and a B+ tree chromosome dictionary.
//!
//! ## File structure
//!
//! ```text
//! ┌──────────────────────┐
//! │    Common header     │ 64 bytes, magic selects kind + byte order
//! ├──────────────────────┤
//! │  Zoom level headers  │ 16 bytes each
//! ├──────────────────────┤
//! │  autoSql / summary   │ optional
//! ├──────────────────────┤
//! │  Chromosome B+ tree  │ name <-> id dictionary
//! ├──────────────────────┤
//! │      Data blocks     │ record count u32, then (zlib) blocks
//! ├──────────────────────┤
//! │    R tree (full)     │ 48 byte header + nodes
//! ├──────────────────────┤
//! │  Zoom data + R tree  │ per zoom level
//! └──────────────────────┘
//! ```
//!
//! A query resolves chromosome names through the dictionary, picks an index
//! root by zoom level, collects overlapping leaf blocks from the R tree,
//! fetches the consolidated byte range in one read, and decodes each block
//! independently.

mod chrom;
mod decode;
mod header;
mod reader;
mod rtree;
mod zoom;

pub use chrom::{ChromDict, ChromInfo};
pub use header::{FileKind, Header, TotalSummary, TrackInfo, ZoomLevelHeader};
pub use reader::TrackReader;
pub use rtree::{Bounds, LeafItem, RTreeIndex};
pub use zoom::zoom_level_for_scale;

/// BigWig magic number (as stored in the file's native byte order).
pub(crate) const BIGWIG_MAGIC: u32 = 0x888F_FC26;

/// BigBed magic number.
pub(crate) const BIGBED_MAGIC: u32 = 0x8789_F2EB;

/// Chromosome B+ tree magic number.
pub(crate) const CHROM_TREE_MAGIC: u32 = 0x78CA_8C91;

/// Size of the common header.
pub(crate) const HEADER_SIZE: usize = 64;

/// Size of the R tree header; the root node follows immediately.
pub(crate) const RTREE_HEADER_SIZE: u64 = 48;

/// Size of one R tree leaf item (box + data offset + data size).
pub(crate) const RTREE_LEAF_ITEM_SIZE: usize = 32;

/// Size of one R tree internal item (box + child offset).
pub(crate) const RTREE_CHILD_ITEM_SIZE: usize = 24;

/// Translates an absolute file offset into a position within the metadata
/// region buffer that begins at `region_start`.
pub(crate) fn region_position(offset: u64, region_start: u64) -> crate::error::Result<usize> {
    offset
        .checked_sub(region_start)
        .map(|position| position as usize)
        .ok_or_else(|| crate::error::FormatError::BadOffset(offset).into())
}
