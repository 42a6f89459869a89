//! # bintrack
//!
//! Random-access range queries over indexed binary genomic track formats
//! (BigWig/BigBed), served from any byte-addressable source.
//!
//! The crate is a read-only storage engine: a disk-resident R tree maps
//! genomic intervals to compressed data blocks, a B+ tree maps chromosome
//! names to dense ids, and per-resolution zoom levels bound the cost of
//! low-resolution queries. Decoded feature lists can additionally be held
//! in a [`FeatureCache`] for repeated sub-range queries without rescanning.
//!
//! Open a local file and query a region:
//!
//! ```no_run
//! use bintrack::{MmapSource, TrackReader};
//!
//! # fn main() -> bintrack::Result<()> {
//! let mut reader = TrackReader::new(MmapSource::open("signal.bw")?);
//! for feature in reader.query("chr1", 10_000, 20_000, 1.0)? {
//!     // start-sorted features overlapping [10_000, 20_000)
//! }
//! # Ok(())
//! # }
//! ```

mod bbi;
mod cache;
mod cursor;
mod error;
mod record;
mod source;

pub use bbi::{
    zoom_level_for_scale, Bounds, ChromDict, ChromInfo, FileKind, Header, LeafItem, RTreeIndex,
    TotalSummary, TrackInfo, TrackReader, ZoomLevelHeader,
};
pub use cache::{Entry, FeatureCache, IntervalTree};
pub use cursor::ByteCursor;
pub use error::{Error, FormatError, Result};
pub use record::{
    BedFeature, ChromAliases, Exon, Feature, GenomicInterval, GenomicRange, Strand, WigValue,
    ZoomSummary,
};
pub use source::{ByteSource, BytesSource, MmapSource};
