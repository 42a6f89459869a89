//! Decoded feature types shared by the binary decoders and the feature cache.

use std::fmt;

use auto_impl::auto_impl;

/// A positioned feature on a named chromosome.
///
/// This is the seam between producers (the binary block decoders, external
/// tabular parsers) and consumers (the feature cache): anything exposing a
/// chromosome name and a base-pair span can be cached and range-queried.
pub trait GenomicInterval {
    fn chrom(&self) -> &str;
    fn start(&self) -> u32;
    fn end(&self) -> u32;
}

/// Maps on-disk chromosome names to canonical names (e.g. `1` -> `chr1`).
///
/// Applied while building the chromosome dictionary and while partitioning
/// features into the cache, so queries may use either spelling.
#[auto_impl(&, Box, Arc)]
pub trait ChromAliases {
    fn canonical_name(&self, name: &str) -> String;
}

/// A genomic range with a chromosome name, half-open on the base axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenomicRange {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
}

impl GenomicRange {
    pub fn new(chrom: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// True if `[start, end)` on `chrom` lies entirely within this range
    #[must_use]
    pub fn contains(&self, chrom: &str, start: u32, end: u32) -> bool {
        self.chrom == chrom && self.start <= start && end <= self.end
    }

    #[must_use]
    pub fn contains_range(&self, other: &GenomicRange) -> bool {
        self.contains(&other.chrom, other.start, other.end)
    }
}

/// Strand of a bed feature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unknown,
}

impl Strand {
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "+" => Self::Forward,
            "-" => Self::Reverse,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
            Self::Unknown => write!(f, "."),
        }
    }
}

/// A single value span from a wig data block.
#[derive(Clone, Debug, PartialEq)]
pub struct WigValue {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub value: f32,
}

/// An exon span in absolute coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exon {
    pub start: u32,
    pub end: u32,
}

/// An annotation record from a bed data block.
///
/// Everything past the coordinates is optional; fields are populated from
/// however many tab-separated tokens the record carries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BedFeature {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub name: Option<String>,
    pub score: Option<f32>,
    pub strand: Option<Strand>,
    pub thick_start: Option<u32>,
    pub thick_end: Option<u32>,
    pub color: Option<String>,
    pub exons: Vec<Exon>,
}

/// A precomputed summary bin from a zoom level.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomSummary {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub valid_count: u32,
    pub min_val: f32,
    pub max_val: f32,
    pub sum_data: f32,
    pub sum_squares: f32,
    /// Mean over covered bases, `0` when the bin is empty
    pub value: f32,
}

/// Any feature a query can produce, depending on file kind and zoom level.
#[derive(Clone, Debug, PartialEq)]
pub enum Feature {
    Value(WigValue),
    Bed(BedFeature),
    Summary(ZoomSummary),
}

impl Feature {
    /// The numeric value, where the variant carries one
    #[must_use]
    pub fn value(&self) -> Option<f32> {
        match self {
            Self::Value(v) => Some(v.value),
            Self::Summary(s) => Some(s.value),
            Self::Bed(_) => None,
        }
    }

    /// The feature name, where the variant carries one
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Bed(b) => b.name.as_deref(),
            _ => None,
        }
    }
}

impl GenomicInterval for WigValue {
    fn chrom(&self) -> &str {
        &self.chrom
    }
    fn start(&self) -> u32 {
        self.start
    }
    fn end(&self) -> u32 {
        self.end
    }
}

impl GenomicInterval for BedFeature {
    fn chrom(&self) -> &str {
        &self.chrom
    }
    fn start(&self) -> u32 {
        self.start
    }
    fn end(&self) -> u32 {
        self.end
    }
}

impl GenomicInterval for ZoomSummary {
    fn chrom(&self) -> &str {
        &self.chrom
    }
    fn start(&self) -> u32 {
        self.start
    }
    fn end(&self) -> u32 {
        self.end
    }
}

impl GenomicInterval for Feature {
    fn chrom(&self) -> &str {
        match self {
            Self::Value(v) => &v.chrom,
            Self::Bed(b) => &b.chrom,
            Self::Summary(s) => &s.chrom,
        }
    }

    fn start(&self) -> u32 {
        match self {
            Self::Value(v) => v.start,
            Self::Bed(b) => b.start,
            Self::Summary(s) => s.start,
        }
    }

    fn end(&self) -> u32 {
        match self {
            Self::Value(v) => v.end,
            Self::Bed(b) => b.end,
            Self::Summary(s) => s.end,
        }
    }
}
