//! Disk-resident R tree over (chromosome, base position) intervals.
//!
//! Each resolution of a track file carries one of these indexes, mapping
//! genomic boxes to the compressed data blocks that cover them. Only the
//! root node is fetched up front; the rest of the tree is pulled in
//! node-by-node as queries touch it, into an arena keyed by file offset
//! that lives as long as the index. A repeated query over the same region
//! touches no I/O beyond the data blocks themselves.

use std::collections::{HashMap, VecDeque};

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::source::ByteSource;

use super::{RTREE_CHILD_ITEM_SIZE, RTREE_HEADER_SIZE, RTREE_LEAF_ITEM_SIZE};

/// A bounding box over the ordered (chromosome id, base) key space.
///
/// Ranges may span chromosomes, so containment and overlap are defined on
/// the lexicographic (chrom, base) order rather than per-chromosome spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub start_chrom: u32,
    pub start_base: u32,
    pub end_chrom: u32,
    pub end_base: u32,
}

impl Bounds {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            start_chrom: cursor.read_u32()?,
            start_base: cursor.read_u32()?,
            end_chrom: cursor.read_u32()?,
            end_base: cursor.read_u32()?,
        })
    }

    /// True if `{chrom1:start .. chrom2:end}` overlaps this box
    #[must_use]
    pub fn overlaps(&self, chrom1: u32, start: u32, chrom2: u32, end: u32) -> bool {
        (chrom2 > self.start_chrom || (chrom2 == self.start_chrom && end >= self.start_base))
            && (chrom1 < self.end_chrom || (chrom1 == self.end_chrom && start <= self.end_base))
    }
}

/// A leaf entry: the genomic box covered by one data block, and where that
/// block lives in the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafItem {
    pub bounds: Bounds,
    pub data_offset: u64,
    pub data_size: u64,
}

#[derive(Clone, Copy, Debug)]
struct ChildItem {
    bounds: Bounds,
    child_offset: u64,
}

enum NodeKind {
    Leaf(Vec<LeafItem>),
    Internal(Vec<ChildItem>),
}

struct Node {
    /// Derived on load as the min/max over the node's items
    bounds: Bounds,
    kind: NodeKind,
}

/// One loaded R tree, tied to a tree header offset within the file.
pub struct RTreeIndex {
    root_offset: u64,
    little_endian: bool,
    nodes: HashMap<u64, Node>,
}

impl RTreeIndex {
    /// Loads the root node; the rest of the tree loads on demand.
    pub fn load<S: ByteSource>(source: &S, tree_offset: u64, little_endian: bool) -> Result<Self> {
        let root_offset = tree_offset + RTREE_HEADER_SIZE;
        let mut index = Self {
            root_offset,
            little_endian,
            nodes: HashMap::new(),
        };
        index.fetch_node(source, root_offset)?;
        Ok(index)
    }

    /// Number of nodes currently resident in the arena.
    #[must_use]
    pub fn loaded_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Collects every leaf item whose box overlaps the query range.
    ///
    /// The traversal drains a queue of node offsets: overlapping internal
    /// items enqueue their children, overlapping leaf items land in the
    /// result. It returns only once the queue is exhausted, so visitation
    /// is exhaustive regardless of fetch order.
    pub fn find_overlapping<S: ByteSource>(
        &mut self,
        source: &S,
        chrom1: u32,
        start: u32,
        chrom2: u32,
        end: u32,
    ) -> Result<Vec<LeafItem>> {
        let mut hits = Vec::new();
        let mut pending = VecDeque::new();
        pending.push_back(self.root_offset);

        while let Some(offset) = pending.pop_front() {
            let node = self.fetch_node(source, offset)?;
            if !node.bounds.overlaps(chrom1, start, chrom2, end) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(items) => {
                    for item in items {
                        if item.bounds.overlaps(chrom1, start, chrom2, end) {
                            hits.push(*item);
                        }
                    }
                }
                NodeKind::Internal(items) => {
                    for item in items {
                        if item.bounds.overlaps(chrom1, start, chrom2, end) {
                            pending.push_back(item.child_offset);
                        }
                    }
                }
            }
        }
        Ok(hits)
    }

    fn fetch_node<S: ByteSource>(&mut self, source: &S, offset: u64) -> Result<&Node> {
        if !self.nodes.contains_key(&offset) {
            let node = self.read_node(source, offset)?;
            self.nodes.insert(offset, node);
        }
        Ok(&self.nodes[&offset])
    }

    fn read_node<S: ByteSource>(&self, source: &S, offset: u64) -> Result<Node> {
        let head = source.read(offset, 4)?;
        let mut cursor = ByteCursor::new(&head, self.little_endian);
        let is_leaf = cursor.read_u8()? == 1;
        let _reserved = cursor.read_u8()?;
        let count = cursor.read_u16()? as usize;

        let item_size = if is_leaf {
            RTREE_LEAF_ITEM_SIZE
        } else {
            RTREE_CHILD_ITEM_SIZE
        };
        let body = source.read(offset + 4, count * item_size)?;
        let mut cursor = ByteCursor::new(&body, self.little_endian);

        let kind = if is_leaf {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(LeafItem {
                    bounds: Bounds::read(&mut cursor)?,
                    data_offset: cursor.read_u64()?,
                    data_size: cursor.read_u64()?,
                });
            }
            NodeKind::Leaf(items)
        } else {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(ChildItem {
                    bounds: Bounds::read(&mut cursor)?,
                    child_offset: cursor.read_u64()?,
                });
            }
            NodeKind::Internal(items)
        };

        Ok(Node {
            bounds: derive_bounds(&kind),
            kind,
        })
    }
}

fn derive_bounds(kind: &NodeKind) -> Bounds {
    let mut bounds = Bounds {
        start_chrom: u32::MAX,
        start_base: u32::MAX,
        end_chrom: 0,
        end_base: 0,
    };
    let mut fold = |item: &Bounds| {
        bounds.start_chrom = bounds.start_chrom.min(item.start_chrom);
        bounds.start_base = bounds.start_base.min(item.start_base);
        bounds.end_chrom = bounds.end_chrom.max(item.end_chrom);
        bounds.end_base = bounds.end_base.max(item.end_base);
    };
    match kind {
        NodeKind::Leaf(items) => items.iter().for_each(|i| fold(&i.bounds)),
        NodeKind::Internal(items) => items.iter().for_each(|i| fold(&i.bounds)),
    }
    bounds
}
