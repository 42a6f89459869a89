//! Top-level track reader: header caching, index selection and range queries.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{Error, FormatError, Result};
use crate::record::{ChromAliases, Feature, GenomicInterval};
use crate::source::ByteSource;

use super::decode::{decode_bed_block, decode_wig_block, decode_zoom_block};
use super::header::{FileKind, TrackInfo};
use super::rtree::RTreeIndex;
use super::zoom::zoom_level_for_scale;

/// Which record layout the selected index points at.
#[derive(Clone, Copy)]
enum BlockDecoder {
    Wig,
    Bed,
    Zoom,
}

/// A reader over one indexed track file.
///
/// The header and chromosome dictionary load on first use and stay cached;
/// each queried index root keeps its [`RTreeIndex`] (and every node that
/// index has fetched) alive for the reader's lifetime, so repeated queries
/// against the same resolution only pay for their data blocks.
pub struct TrackReader<S> {
    source: S,
    aliases: Option<Box<dyn ChromAliases>>,
    info: Option<TrackInfo>,
    rtree_cache: HashMap<u64, RTreeIndex>,
}

impl<S: ByteSource> TrackReader<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            aliases: None,
            info: None,
            rtree_cache: HashMap::new(),
        }
    }

    /// A reader that canonicalizes chromosome names during dictionary load.
    #[must_use]
    pub fn with_aliases(source: S, aliases: impl ChromAliases + 'static) -> Self {
        Self {
            source,
            aliases: Some(Box::new(aliases)),
            info: None,
            rtree_cache: HashMap::new(),
        }
    }

    /// Loads the header, zoom levels and chromosome dictionary.
    ///
    /// Idempotent: the first call reads the file's metadata region, every
    /// later call returns the cached [`TrackInfo`] without touching I/O.
    pub fn load_header(&mut self) -> Result<&TrackInfo> {
        match &mut self.info {
            Some(info) => Ok(info),
            slot => {
                let info = TrackInfo::read(&self.source, self.aliases.as_deref())?;
                Ok(slot.insert(info))
            }
        }
    }

    /// The cached metadata, if [`load_header`](Self::load_header) has run.
    #[must_use]
    pub fn info(&self) -> Option<&TrackInfo> {
        self.info.as_ref()
    }

    /// Queries `[start, end)` on one chromosome at the given resolution.
    ///
    /// `bp_per_pixel` picks the zoom level: the coarsest level still finer
    /// than the scale, or full-resolution data when none qualifies. An
    /// unknown chromosome or an empty window yields `Ok(vec![])`.
    pub fn query(
        &mut self,
        chrom: &str,
        start: u32,
        end: u32,
        bp_per_pixel: f64,
    ) -> Result<Vec<Feature>> {
        if start >= end {
            return Ok(Vec::new());
        }
        self.query_range(chrom, start, chrom, end, bp_per_pixel)
    }

    /// Queries a range that may span chromosomes, from `chrom1:start` to
    /// `chrom2:end` in the file's chromosome order.
    pub fn query_range(
        &mut self,
        chrom1: &str,
        start: u32,
        chrom2: &str,
        end: u32,
        bp_per_pixel: f64,
    ) -> Result<Vec<Feature>> {
        self.load_header()?;
        let Self {
            source,
            info,
            rtree_cache,
            ..
        } = self;
        let Some(info) = info.as_ref() else {
            return Ok(Vec::new());
        };

        let (tree_offset, decoder) = match zoom_level_for_scale(bp_per_pixel, &info.zoom_headers) {
            Some(zoom) => (zoom.index_offset, BlockDecoder::Zoom),
            None => (
                info.header.full_index_offset,
                match info.kind {
                    FileKind::Wig => BlockDecoder::Wig,
                    FileKind::Bed => BlockDecoder::Bed,
                },
            ),
        };

        let (Some(id1), Some(id2)) = (info.chroms.id(chrom1), info.chroms.id(chrom2)) else {
            return Ok(Vec::new());
        };

        let index = match rtree_cache.entry(tree_offset) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(RTreeIndex::load(&*source, tree_offset, info.little_endian)?)
            }
        };
        let leaves = index.find_overlapping(&*source, id1, start, id2, end)?;
        if leaves.is_empty() {
            return Ok(Vec::new());
        }

        // Consolidate all selected blocks into one read spanning them,
        // then slice each block back out of the fetched range.
        let mut range_start = u64::MAX;
        let mut range_end = 0u64;
        for item in &leaves {
            range_start = range_start.min(item.data_offset);
            range_end = range_end.max(item.data_offset + item.data_size);
        }
        let data = source.read(range_start, (range_end - range_start) as usize)?;

        let compressed = info.header.uncompress_buf_size > 0;
        let mut features = Vec::new();
        for item in &leaves {
            let begin = (item.data_offset - range_start) as usize;
            let stop = begin + item.data_size as usize;
            let Some(block) = data.get(begin..stop) else {
                return Err(FormatError::TruncatedBlock {
                    offset: item.data_offset,
                    size: item.data_size,
                }
                .into());
            };

            let plain;
            let block = if compressed {
                plain = inflate(block, item.data_offset)?;
                plain.as_slice()
            } else {
                block
            };

            match decoder {
                BlockDecoder::Wig => decode_wig_block(
                    block,
                    info.little_endian,
                    id1,
                    start,
                    id2,
                    end,
                    &info.chroms,
                    &mut features,
                )?,
                BlockDecoder::Bed => decode_bed_block(
                    block,
                    info.little_endian,
                    id1,
                    start,
                    id2,
                    end,
                    &info.chroms,
                    &mut features,
                )?,
                BlockDecoder::Zoom => decode_zoom_block(
                    block,
                    info.little_endian,
                    id1,
                    start,
                    id2,
                    end,
                    &info.chroms,
                    &mut features,
                )?,
            }
        }

        features.sort_by_key(GenomicInterval::start);
        Ok(features)
    }
}

fn inflate(block: &[u8], offset: u64) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(block);
    let mut plain = Vec::new();
    decoder
        .read_to_end(&mut plain)
        .map_err(|source| Error::DecompressionError { offset, source })?;
    Ok(plain)
}
