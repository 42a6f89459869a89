//! Common header, zoom level headers and file-wide summary statistics.

use crate::cursor::ByteCursor;
use crate::error::{FormatError, Result};
use crate::record::ChromAliases;
use crate::source::ByteSource;

use super::chrom::ChromDict;
use super::{region_position, BIGBED_MAGIC, BIGWIG_MAGIC, HEADER_SIZE};

/// The kind of track file, determined by the header magic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Numeric signal (BigWig)
    Wig,
    /// Interval annotations (BigBed)
    Bed,
}

/// The fixed 64-byte common header.
#[derive(Clone, Copy, Debug)]
pub struct Header {
    pub version: u16,
    pub zoom_levels: u16,
    pub(crate) chrom_tree_offset: u64,
    pub(crate) full_data_offset: u64,
    pub(crate) full_index_offset: u64,
    pub field_count: u16,
    pub defined_field_count: u16,
    pub(crate) auto_sql_offset: u64,
    pub(crate) total_summary_offset: u64,
    /// Positive when every data block is independently zlib-compressed
    pub uncompress_buf_size: i32,
    pub reserved: u64,
    /// Total record count, stored at the start of the full data section
    pub data_count: u32,
}

/// One zoom level: a precomputed summary of the data at a fixed reduction.
///
/// Zoom number 0 is the coarsest level; the headers are stored on disk in
/// the opposite order and renumbered on load.
#[derive(Clone, Copy, Debug)]
pub struct ZoomLevelHeader {
    pub zoom_number: u32,
    /// Bases summarized per bin
    pub reduction_level: u32,
    pub(crate) data_offset: u64,
    pub(crate) index_offset: u64,
}

/// File-wide summary statistics, present when the header points at them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TotalSummary {
    pub bases_covered: u64,
    pub min_val: f64,
    pub max_val: f64,
    pub sum_data: f64,
    pub sum_squares: f64,
}

impl TotalSummary {
    /// Mean value over covered bases, `0` for an empty file
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.bases_covered == 0 {
            0.0
        } else {
            self.sum_data / self.bases_covered as f64
        }
    }
}

/// Everything learned from a single pass over the file's metadata region.
///
/// Loaded once per open file and cached by the reader.
#[derive(Clone, Debug)]
pub struct TrackInfo {
    pub kind: FileKind,
    pub little_endian: bool,
    pub header: Header,
    /// Zoom levels indexed by zoom number (0 = coarsest)
    pub zoom_headers: Vec<ZoomLevelHeader>,
    /// Minimum data offset across zoom levels, bounding the metadata region
    pub first_zoom_data_offset: Option<u64>,
    pub auto_sql: Option<String>,
    pub total_summary: Option<TotalSummary>,
    pub chroms: ChromDict,
}

impl TrackInfo {
    /// Reads the common header plus the whole metadata region in two reads.
    pub(crate) fn read<S: ByteSource>(
        source: &S,
        aliases: Option<&dyn ChromAliases>,
    ) -> Result<Self> {
        let head = source.read(0, HEADER_SIZE)?;

        // Assume little-endian unless the magic only matches byte-swapped
        let mut little_endian = true;
        let mut cursor = ByteCursor::new(&head, little_endian);
        let magic = cursor.read_u32()?;
        let kind = match Self::kind_for_magic(magic) {
            Some(kind) => kind,
            None => {
                little_endian = false;
                cursor = ByteCursor::new(&head, little_endian);
                let swapped = cursor.read_u32()?;
                Self::kind_for_magic(swapped)
                    .ok_or(FormatError::UnknownMagic(magic))?
            }
        };

        let mut header = Header {
            version: cursor.read_u16()?,
            zoom_levels: cursor.read_u16()?,
            chrom_tree_offset: cursor.read_u64()?,
            full_data_offset: cursor.read_u64()?,
            full_index_offset: cursor.read_u64()?,
            field_count: cursor.read_u16()?,
            defined_field_count: cursor.read_u16()?,
            auto_sql_offset: cursor.read_u64()?,
            total_summary_offset: cursor.read_u64()?,
            uncompress_buf_size: cursor.read_i32()?,
            reserved: cursor.read_u64()?,
            data_count: 0,
        };

        // One consolidated read covers everything between the common header
        // and the start of the data section, including the record count.
        let region_start = HEADER_SIZE as u64;
        let region_len = (header.full_data_offset + 5).saturating_sub(region_start);
        let region = source.read(region_start, region_len as usize)?;
        let mut cursor = ByteCursor::new(&region, little_endian);

        // Stored zoom headers are renumbered so that zoom number 0 is the
        // coarsest level, matching what callers of the selector expect.
        let n_zooms = header.zoom_levels as usize;
        let mut zoom_headers = Vec::with_capacity(n_zooms);
        let mut first_zoom_data_offset: Option<u64> = None;
        for stored in 1..=n_zooms {
            let zoom_number = (n_zooms - stored) as u32;
            let reduction_level = cursor.read_u32()?;
            let _reserved = cursor.read_u32()?;
            let data_offset = cursor.read_u64()?;
            let index_offset = cursor.read_u64()?;
            let zoom = ZoomLevelHeader {
                zoom_number,
                reduction_level,
                data_offset,
                index_offset,
            };
            first_zoom_data_offset = Some(match first_zoom_data_offset {
                Some(offset) => offset.min(zoom.data_offset),
                None => zoom.data_offset,
            });
            zoom_headers.push(zoom);
        }
        zoom_headers.reverse();

        let auto_sql = if header.auto_sql_offset > 0 {
            cursor.set_position(region_position(header.auto_sql_offset, region_start)?);
            Some(cursor.read_string()?)
        } else {
            None
        };

        let total_summary = if header.total_summary_offset > 0 {
            cursor.set_position(region_position(header.total_summary_offset, region_start)?);
            Some(TotalSummary {
                bases_covered: cursor.read_u64()?,
                min_val: cursor.read_f64()?,
                max_val: cursor.read_f64()?,
                sum_data: cursor.read_f64()?,
                sum_squares: cursor.read_f64()?,
            })
        } else {
            None
        };

        if header.chrom_tree_offset == 0 {
            return Err(FormatError::MissingChromTree.into());
        }
        cursor.set_position(region_position(header.chrom_tree_offset, region_start)?);
        let chroms = ChromDict::read(&mut cursor, region_start, aliases)?;

        cursor.set_position(region_position(header.full_data_offset, region_start)?);
        header.data_count = cursor.read_u32()?;

        Ok(Self {
            kind,
            little_endian,
            header,
            zoom_headers,
            first_zoom_data_offset,
            auto_sql,
            total_summary,
            chroms,
        })
    }

    fn kind_for_magic(magic: u32) -> Option<FileKind> {
        match magic {
            BIGWIG_MAGIC => Some(FileKind::Wig),
            BIGBED_MAGIC => Some(FileKind::Bed),
            _ => None,
        }
    }
}
