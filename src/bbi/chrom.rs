//! Chromosome dictionary, loaded from the on-disk B+ tree.
//!
//! The tree is walked once, eagerly, while the file's metadata region is in
//! memory; afterwards every lookup is a plain map access. Page keys guide
//! only the on-disk layout and are never consulted again.

use std::collections::HashMap;

use crate::cursor::ByteCursor;
use crate::error::{FormatError, Result};
use crate::record::ChromAliases;

use super::CHROM_TREE_MAGIC;

/// One chromosome known to the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChromInfo {
    /// Canonical name (after alias resolution, if any)
    pub name: String,
    /// Dense id assigned by file construction order
    pub id: u32,
    /// Chromosome length in bases
    pub length: u32,
}

/// Bidirectional chromosome name <-> id dictionary.
///
/// When an alias resolver is supplied, both the on-disk spelling and the
/// canonical spelling resolve to the id, so callers may query with either.
#[derive(Clone, Debug, Default)]
pub struct ChromDict {
    infos: Vec<ChromInfo>,
    by_name: HashMap<String, u32>,
    index_of: HashMap<u32, usize>,
}

impl ChromDict {
    /// Parses the B+ tree rooted at the cursor's current position.
    ///
    /// `region_start` is the file offset the cursor's buffer begins at;
    /// child page offsets on disk are absolute and are translated through it.
    pub(crate) fn read(
        cursor: &mut ByteCursor<'_>,
        region_start: u64,
        aliases: Option<&dyn ChromAliases>,
    ) -> Result<Self> {
        let magic = cursor.read_u32()?;
        if magic != CHROM_TREE_MAGIC {
            return Err(FormatError::ChromTreeMagic(magic).into());
        }
        let _block_size = cursor.read_u32()?;
        let key_size = cursor.read_u32()? as usize;
        let _val_size = cursor.read_u32()?;
        let _item_count = cursor.read_u64()?;
        let _reserved = cursor.read_u64()?;

        let mut dict = Self::default();
        dict.read_page(cursor, key_size, region_start, aliases)?;
        Ok(dict)
    }

    fn read_page(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        key_size: usize,
        region_start: u64,
        aliases: Option<&dyn ChromAliases>,
    ) -> Result<()> {
        let kind = cursor.read_u8()?;
        let _reserved = cursor.read_u8()?;
        let count = cursor.read_u16()?;

        if kind == 1 {
            for _ in 0..count {
                let raw = cursor.read_key(key_size)?;
                let id = cursor.read_u32()?;
                let length = cursor.read_u32()?;
                self.insert(raw, id, length, aliases);
            }
        } else {
            for _ in 0..count {
                let _key = cursor.read_key(key_size)?;
                let child_offset = cursor.read_u64()?;
                let resume = cursor.position();
                cursor.set_position(super::region_position(child_offset, region_start)?);
                self.read_page(cursor, key_size, region_start, aliases)?;
                cursor.set_position(resume);
            }
        }
        Ok(())
    }

    fn insert(&mut self, raw: String, id: u32, length: u32, aliases: Option<&dyn ChromAliases>) {
        let name = match aliases {
            Some(resolver) => resolver.canonical_name(&raw),
            None => raw.clone(),
        };
        self.by_name.insert(raw, id);
        self.by_name.insert(name.clone(), id);
        self.index_of.insert(id, self.infos.len());
        self.infos.push(ChromInfo { name, id, length });
    }

    /// Resolves a chromosome name (on-disk or canonical) to its id.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Canonical name for an id.
    #[must_use]
    pub fn name(&self, id: u32) -> Option<&str> {
        self.index_of
            .get(&id)
            .map(|&idx| self.infos[idx].name.as_str())
    }

    /// Chromosome length for an id.
    #[must_use]
    pub fn length(&self, id: u32) -> Option<u32> {
        self.index_of.get(&id).map(|&idx| self.infos[idx].length)
    }

    /// Chromosomes in file construction order.
    pub fn iter(&self) -> impl Iterator<Item = &ChromInfo> {
        self.infos.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use byteorder::{LittleEndian, WriteBytesExt};

    use super::*;

    const KEY_SIZE: usize = 6;

    fn write_key(buf: &mut Vec<u8>, name: &str) {
        let mut bytes = name.as_bytes().to_vec();
        bytes.resize(KEY_SIZE, 0);
        buf.extend_from_slice(&bytes);
    }

    fn tree_header(buf: &mut Vec<u8>, item_count: u64) {
        buf.write_u32::<LittleEndian>(CHROM_TREE_MAGIC).unwrap();
        buf.write_u32::<LittleEndian>(4).unwrap(); // block size
        buf.write_u32::<LittleEndian>(KEY_SIZE as u32).unwrap();
        buf.write_u32::<LittleEndian>(8).unwrap(); // val size
        buf.write_u64::<LittleEndian>(item_count).unwrap();
        buf.write_u64::<LittleEndian>(0).unwrap(); // reserved
    }

    fn leaf_page(buf: &mut Vec<u8>, entries: &[(&str, u32, u32)]) {
        buf.write_u8(1).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
        for (name, id, length) in entries {
            write_key(buf, name);
            buf.write_u32::<LittleEndian>(*id).unwrap();
            buf.write_u32::<LittleEndian>(*length).unwrap();
        }
    }

    fn single_leaf_tree(entries: &[(&str, u32, u32)]) -> Vec<u8> {
        let mut buf = Vec::new();
        tree_header(&mut buf, entries.len() as u64);
        leaf_page(&mut buf, entries);
        buf
    }

    #[test]
    fn test_round_trip_names_and_ids() {
        let entries = [("ctgA", 0, 50_001), ("ctgB", 1, 6_079), ("ctgC", 2, 42)];
        let buf = single_leaf_tree(&entries);
        let mut cursor = ByteCursor::new(&buf, true);
        let dict = ChromDict::read(&mut cursor, 0, None).unwrap();

        assert_eq!(dict.len(), 3);
        for (name, id, length) in entries {
            assert_eq!(dict.id(name), Some(id));
            assert_eq!(dict.name(id), Some(name));
            assert_eq!(dict.length(id), Some(length));
        }
        assert_eq!(dict.id("ctgZ"), None);
        assert_eq!(dict.name(9), None);
    }

    #[test]
    fn test_internal_pages_are_followed() {
        // header + internal page with two children, offsets absolute
        // relative to a region starting at file offset 1000
        let region_start = 1000u64;
        let mut buf = Vec::new();
        tree_header(&mut buf, 3);

        let internal_at = buf.len();
        // internal page: type 0, 2 children, each KEY_SIZE + 8 bytes
        let internal_size = 4 + 2 * (KEY_SIZE + 8);
        let child1_at = internal_at + internal_size;
        let child1_size = 4 + 2 * (KEY_SIZE + 8); // 2 leaf entries
        let child2_at = child1_at + child1_size;

        buf.write_u8(0).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u16::<LittleEndian>(2).unwrap();
        write_key(&mut buf, "ctgA");
        buf.write_u64::<LittleEndian>(region_start + child1_at as u64)
            .unwrap();
        write_key(&mut buf, "ctgC");
        buf.write_u64::<LittleEndian>(region_start + child2_at as u64)
            .unwrap();

        leaf_page(&mut buf, &[("ctgA", 0, 100), ("ctgB", 1, 200)]);
        leaf_page(&mut buf, &[("ctgC", 2, 300)]);

        let mut cursor = ByteCursor::new(&buf, true);
        let dict = ChromDict::read(&mut cursor, region_start, None).unwrap();

        assert_eq!(dict.len(), 3);
        assert_eq!(dict.id("ctgB"), Some(1));
        assert_eq!(dict.name(2), Some("ctgC"));
    }

    #[test]
    fn test_alias_resolution_keeps_both_names() {
        struct AddChrPrefix;
        impl ChromAliases for AddChrPrefix {
            fn canonical_name(&self, name: &str) -> String {
                format!("chr{name}")
            }
        }

        let buf = single_leaf_tree(&[("1", 0, 1_000)]);
        let mut cursor = ByteCursor::new(&buf, true);
        let dict = ChromDict::read(&mut cursor, 0, Some(&AddChrPrefix)).unwrap();

        assert_eq!(dict.id("1"), Some(0));
        assert_eq!(dict.id("chr1"), Some(0));
        assert_eq!(dict.name(0), Some("chr1"));
    }

    #[test]
    fn test_bad_magic_is_a_format_error() {
        let mut buf = single_leaf_tree(&[("ctgA", 0, 10)]);
        buf[0] = 0xFF;
        let mut cursor = ByteCursor::new(&buf, true);
        assert!(ChromDict::read(&mut cursor, 0, None).is_err());
    }
}
