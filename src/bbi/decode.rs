//! Block decoders for the three on-disk record layouts.
//!
//! A block is decoded front to back: each record must be read in full to
//! keep the cursor aligned, and only then is it kept, skipped, or used to
//! stop the block early. Records within a block are ordered by start, so
//! once one lands past the upper query bound the rest of the block cannot
//! contribute.

use crate::cursor::ByteCursor;
use crate::error::{FormatError, Result};
use crate::record::{BedFeature, Exon, Feature, Strand, WigValue, ZoomSummary};

use super::chrom::ChromDict;

/// Minimum bytes for a bed record: three coordinates and a NUL
const MIN_BED_RECORD: usize = 3 * 4 + 1;

/// Fixed size of a zoom summary record
const MIN_ZOOM_RECORD: usize = 8 * 4;

/// Decodes a wig data block: a 24-byte sub-header followed by items in one
/// of three encodings (1 = bedGraph, 2 = variable step, 3 = fixed step).
pub(crate) fn decode_wig_block(
    block: &[u8],
    little_endian: bool,
    chrom1: u32,
    bp_start: u32,
    chrom2: u32,
    bp_end: u32,
    chroms: &ChromDict,
    features: &mut Vec<Feature>,
) -> Result<()> {
    let mut cursor = ByteCursor::new(block, little_endian);
    let chrom_id = cursor.read_u32()?;
    let mut position = cursor.read_u32()?;
    let _chrom_end = cursor.read_u32()?;
    let item_step = cursor.read_u32()?;
    let item_span = cursor.read_u32()?;
    let encoding = cursor.read_u8()?;
    let _reserved = cursor.read_u8()?;
    let item_count = cursor.read_u16()?;

    if chrom_id < chrom1 || chrom_id > chrom2 {
        return Ok(());
    }
    let Some(chrom) = chroms.name(chrom_id) else {
        return Ok(());
    };

    for _ in 0..item_count {
        let (start, end, value) = match encoding {
            1 => {
                let start = cursor.read_u32()?;
                let end = cursor.read_u32()?;
                (start, end, cursor.read_f32()?)
            }
            2 => {
                let start = cursor.read_u32()?;
                (start, start + item_span, cursor.read_f32()?)
            }
            3 => {
                let value = cursor.read_f32()?;
                let start = position;
                position += item_step;
                (start, start + item_span, value)
            }
            other => return Err(FormatError::UnknownWigEncoding(other).into()),
        };

        if chrom_id == chrom1 && end < bp_start {
            continue;
        }
        if chrom_id == chrom2 && start >= bp_end {
            break;
        }
        if value.is_finite() {
            features.push(Feature::Value(WigValue {
                chrom: chrom.to_owned(),
                start,
                end,
                value,
            }));
        }
    }
    Ok(())
}

/// Decodes a bed data block: coordinates followed by a NUL-terminated
/// rest-of-line whose tab-separated tokens fill the optional fields.
pub(crate) fn decode_bed_block(
    block: &[u8],
    little_endian: bool,
    chrom1: u32,
    bp_start: u32,
    chrom2: u32,
    bp_end: u32,
    chroms: &ChromDict,
    features: &mut Vec<Feature>,
) -> Result<()> {
    let mut cursor = ByteCursor::new(block, little_endian);

    while cursor.remaining() >= MIN_BED_RECORD {
        let chrom_id = cursor.read_u32()?;
        let start = cursor.read_u32()?;
        let end = cursor.read_u32()?;
        let rest = cursor.read_string()?;

        if chrom_id < chrom1 || (chrom_id == chrom1 && end < bp_start) {
            continue;
        }
        if chrom_id > chrom2 || (chrom_id == chrom2 && start >= bp_end) {
            break;
        }
        let Some(chrom) = chroms.name(chrom_id) else {
            continue;
        };

        let mut feature = BedFeature {
            chrom: chrom.to_owned(),
            start,
            end,
            ..BedFeature::default()
        };

        let tokens: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('\t').collect()
        };
        feature.name = tokens.first().map(|&t| t.to_owned());
        feature.score = tokens.get(1).and_then(|t| t.parse().ok());
        feature.strand = tokens.get(2).map(|t| Strand::from_token(t));
        feature.thick_start = tokens.get(3).and_then(|t| t.parse().ok());
        feature.thick_end = tokens.get(4).and_then(|t| t.parse().ok());
        feature.color = tokens.get(5).map(|&t| t.to_owned());

        if tokens.len() > 8 {
            let exon_count: usize = tokens[6].parse().unwrap_or(0);
            let sizes: Vec<&str> = tokens[7].split(',').collect();
            let starts: Vec<&str> = tokens[8].split(',').collect();
            for i in 0..exon_count {
                let rel: Option<u32> = starts.get(i).and_then(|t| t.parse().ok());
                let size: Option<u32> = sizes.get(i).and_then(|t| t.parse().ok());
                if let (Some(rel), Some(size)) = (rel, size) {
                    let exon_start = start + rel;
                    feature.exons.push(Exon {
                        start: exon_start,
                        end: exon_start + size,
                    });
                }
            }
        }

        features.push(Feature::Bed(feature));
    }
    Ok(())
}

/// Decodes a zoom data block of fixed-size summary records.
pub(crate) fn decode_zoom_block(
    block: &[u8],
    little_endian: bool,
    chrom1: u32,
    bp_start: u32,
    chrom2: u32,
    bp_end: u32,
    chroms: &ChromDict,
    features: &mut Vec<Feature>,
) -> Result<()> {
    let mut cursor = ByteCursor::new(block, little_endian);

    while cursor.remaining() >= MIN_ZOOM_RECORD {
        let chrom_id = cursor.read_u32()?;
        let start = cursor.read_u32()?;
        let end = cursor.read_u32()?;
        let valid_count = cursor.read_u32()?;
        let min_val = cursor.read_f32()?;
        let max_val = cursor.read_f32()?;
        let sum_data = cursor.read_f32()?;
        let sum_squares = cursor.read_f32()?;

        if chrom_id < chrom1 || (chrom_id == chrom1 && end < bp_start) {
            continue;
        }
        if chrom_id > chrom2 || (chrom_id == chrom2 && start >= bp_end) {
            break;
        }
        let Some(chrom) = chroms.name(chrom_id) else {
            continue;
        };

        let value = if valid_count == 0 {
            0.0
        } else {
            sum_data / valid_count as f32
        };
        if value.is_finite() {
            features.push(Feature::Summary(ZoomSummary {
                chrom: chrom.to_owned(),
                start,
                end,
                valid_count,
                min_val,
                max_val,
                sum_data,
                sum_squares,
                value,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use byteorder::{LittleEndian, WriteBytesExt};

    use crate::cursor::ByteCursor;
    use crate::record::GenomicInterval;

    use super::*;

    fn dict(names: &[&str]) -> ChromDict {
        // build through the on-disk form to avoid a test-only constructor
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(super::super::CHROM_TREE_MAGIC)
            .unwrap();
        buf.write_u32::<LittleEndian>(4).unwrap();
        buf.write_u32::<LittleEndian>(8).unwrap(); // key size
        buf.write_u32::<LittleEndian>(8).unwrap();
        buf.write_u64::<LittleEndian>(names.len() as u64).unwrap();
        buf.write_u64::<LittleEndian>(0).unwrap();
        buf.write_u8(1).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u16::<LittleEndian>(names.len() as u16).unwrap();
        for (id, name) in names.iter().enumerate() {
            let mut key = name.as_bytes().to_vec();
            key.resize(8, 0);
            buf.extend_from_slice(&key);
            buf.write_u32::<LittleEndian>(id as u32).unwrap();
            buf.write_u32::<LittleEndian>(1_000_000).unwrap();
        }
        let mut cursor = ByteCursor::new(&buf, true);
        ChromDict::read(&mut cursor, 0, None).unwrap()
    }

    fn wig_header(
        buf: &mut Vec<u8>,
        chrom_id: u32,
        start: u32,
        end: u32,
        step: u32,
        span: u32,
        encoding: u8,
        count: u16,
    ) {
        buf.write_u32::<LittleEndian>(chrom_id).unwrap();
        buf.write_u32::<LittleEndian>(start).unwrap();
        buf.write_u32::<LittleEndian>(end).unwrap();
        buf.write_u32::<LittleEndian>(step).unwrap();
        buf.write_u32::<LittleEndian>(span).unwrap();
        buf.write_u8(encoding).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u16::<LittleEndian>(count).unwrap();
    }

    fn collect_wig(block: &[u8], start: u32, end: u32) -> Vec<Feature> {
        let chroms = dict(&["ctgA"]);
        let mut features = Vec::new();
        decode_wig_block(block, true, 0, start, 0, end, &chroms, &mut features).unwrap();
        features
    }

    #[test]
    fn test_bed_graph_items() {
        let mut block = Vec::new();
        wig_header(&mut block, 0, 0, 30, 0, 0, 1, 3);
        for (s, e, v) in [(0u32, 10u32, 1.0f32), (10, 20, 2.0), (20, 30, 3.0)] {
            block.write_u32::<LittleEndian>(s).unwrap();
            block.write_u32::<LittleEndian>(e).unwrap();
            block.write_f32::<LittleEndian>(v).unwrap();
        }

        let features = collect_wig(&block, 0, 30);
        assert_eq!(features.len(), 3);
        assert_eq!(features[1].start(), 10);
        assert_eq!(features[1].value(), Some(2.0));
    }

    #[test]
    fn test_variable_step_uses_span() {
        let mut block = Vec::new();
        wig_header(&mut block, 0, 0, 100, 0, 5, 2, 2);
        for (s, v) in [(10u32, 1.5f32), (40, 2.5)] {
            block.write_u32::<LittleEndian>(s).unwrap();
            block.write_f32::<LittleEndian>(v).unwrap();
        }

        let features = collect_wig(&block, 0, 100);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].start(), 10);
        assert_eq!(features[0].end(), 15);
        assert_eq!(features[1].start(), 40);
        assert_eq!(features[1].end(), 45);
    }

    #[test]
    fn test_fixed_step_advances_after_each_item() {
        // items at 100, 110, 120 with span 5
        let mut block = Vec::new();
        wig_header(&mut block, 0, 100, 130, 10, 5, 3, 3);
        for v in [1.0f32, 2.0, 3.0] {
            block.write_f32::<LittleEndian>(v).unwrap();
        }

        let features = collect_wig(&block, 0, 1_000);
        assert_eq!(features.len(), 3);
        assert_eq!(
            features
                .iter()
                .map(|f| (f.start(), f.end()))
                .collect::<Vec<_>>(),
            vec![(100, 105), (110, 115), (120, 125)]
        );
    }

    #[test]
    fn test_window_filter_and_early_stop() {
        let mut block = Vec::new();
        wig_header(&mut block, 0, 0, 50, 0, 0, 1, 5);
        for (s, e) in [(0u32, 10u32), (10, 20), (20, 30), (30, 40), (40, 50)] {
            block.write_u32::<LittleEndian>(s).unwrap();
            block.write_u32::<LittleEndian>(e).unwrap();
            block.write_f32::<LittleEndian>(1.0).unwrap();
        }

        // window [15, 35): keeps (10,20), (20,30), (30,40); stops at 40
        let features = collect_wig(&block, 15, 35);
        assert_eq!(
            features.iter().map(GenomicInterval::start).collect::<Vec<_>>(),
            vec![10, 20, 30]
        );
    }

    #[test]
    fn test_non_finite_values_are_dropped() {
        let mut block = Vec::new();
        wig_header(&mut block, 0, 0, 20, 0, 0, 1, 2);
        block.write_u32::<LittleEndian>(0).unwrap();
        block.write_u32::<LittleEndian>(10).unwrap();
        block.write_f32::<LittleEndian>(f32::NAN).unwrap();
        block.write_u32::<LittleEndian>(10).unwrap();
        block.write_u32::<LittleEndian>(20).unwrap();
        block.write_f32::<LittleEndian>(2.0).unwrap();

        let features = collect_wig(&block, 0, 20);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].start(), 10);
    }

    #[test]
    fn test_unknown_encoding_errors() {
        let mut block = Vec::new();
        wig_header(&mut block, 0, 0, 10, 0, 0, 7, 1);
        block.write_f32::<LittleEndian>(1.0).unwrap();
        let chroms = dict(&["ctgA"]);
        let mut features = Vec::new();
        let result = decode_wig_block(&block, true, 0, 0, 0, 10, &chroms, &mut features);
        assert!(result.is_err());
    }

    fn bed_record(buf: &mut Vec<u8>, chrom_id: u32, start: u32, end: u32, rest: &str) {
        buf.write_u32::<LittleEndian>(chrom_id).unwrap();
        buf.write_u32::<LittleEndian>(start).unwrap();
        buf.write_u32::<LittleEndian>(end).unwrap();
        buf.extend_from_slice(rest.as_bytes());
        buf.push(0);
    }

    #[test]
    fn test_bed_optional_fields_and_exons() {
        let mut block = Vec::new();
        bed_record(
            &mut block,
            0,
            100,
            500,
            "geneA\t3.5\t-\t120\t480\t255,0,0\t2\t50,60\t0,340",
        );

        let chroms = dict(&["ctgA"]);
        let mut features = Vec::new();
        decode_bed_block(&block, true, 0, 0, 0, 1_000, &chroms, &mut features).unwrap();

        assert_eq!(features.len(), 1);
        let Feature::Bed(bed) = &features[0] else {
            panic!("expected a bed feature");
        };
        assert_eq!(bed.name.as_deref(), Some("geneA"));
        assert_eq!(bed.score, Some(3.5));
        assert_eq!(bed.strand, Some(Strand::Reverse));
        assert_eq!(bed.thick_start, Some(120));
        assert_eq!(bed.thick_end, Some(480));
        assert_eq!(bed.color.as_deref(), Some("255,0,0"));
        assert_eq!(
            bed.exons,
            vec![
                Exon {
                    start: 100,
                    end: 150
                },
                Exon {
                    start: 440,
                    end: 500
                }
            ]
        );
    }

    #[test]
    fn test_bed_minimal_record() {
        let mut block = Vec::new();
        bed_record(&mut block, 0, 10, 20, "");

        let chroms = dict(&["ctgA"]);
        let mut features = Vec::new();
        decode_bed_block(&block, true, 0, 0, 0, 100, &chroms, &mut features).unwrap();

        assert_eq!(features.len(), 1);
        let Feature::Bed(bed) = &features[0] else {
            panic!("expected a bed feature");
        };
        assert_eq!(bed.name, None);
        assert_eq!(bed.score, None);
        assert!(bed.exons.is_empty());
    }

    #[test]
    fn test_bed_window_early_stop() {
        let mut block = Vec::new();
        bed_record(&mut block, 0, 0, 10, "a");
        bed_record(&mut block, 0, 20, 30, "b");
        bed_record(&mut block, 0, 40, 50, "c");

        let chroms = dict(&["ctgA"]);
        let mut features = Vec::new();
        decode_bed_block(&block, true, 0, 15, 0, 35, &chroms, &mut features).unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].name(), Some("b"));
    }

    fn zoom_record(
        buf: &mut Vec<u8>,
        chrom_id: u32,
        start: u32,
        end: u32,
        valid_count: u32,
        sum_data: f32,
    ) {
        buf.write_u32::<LittleEndian>(chrom_id).unwrap();
        buf.write_u32::<LittleEndian>(start).unwrap();
        buf.write_u32::<LittleEndian>(end).unwrap();
        buf.write_u32::<LittleEndian>(valid_count).unwrap();
        buf.write_f32::<LittleEndian>(0.0).unwrap();
        buf.write_f32::<LittleEndian>(9.0).unwrap();
        buf.write_f32::<LittleEndian>(sum_data).unwrap();
        buf.write_f32::<LittleEndian>(0.0).unwrap();
    }

    #[test]
    fn test_zoom_mean_and_empty_bins() {
        let mut block = Vec::new();
        zoom_record(&mut block, 0, 0, 100, 50, 125.0);
        zoom_record(&mut block, 0, 100, 200, 0, 0.0);

        let chroms = dict(&["ctgA"]);
        let mut features = Vec::new();
        decode_zoom_block(&block, true, 0, 0, 0, 500, &chroms, &mut features).unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].value(), Some(2.5));
        // an empty bin reports zero rather than NaN
        assert_eq!(features[1].value(), Some(0.0));
    }

    #[test]
    fn test_zoom_window_filter() {
        let mut block = Vec::new();
        zoom_record(&mut block, 0, 0, 100, 10, 10.0);
        zoom_record(&mut block, 0, 100, 200, 10, 10.0);
        zoom_record(&mut block, 0, 200, 300, 10, 10.0);

        let chroms = dict(&["ctgA"]);
        let mut features = Vec::new();
        decode_zoom_block(&block, true, 0, 150, 0, 160, &chroms, &mut features).unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].start(), 100);
    }
}
