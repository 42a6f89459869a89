//! Self-balancing interval tree with subtree min/max augmentation.
//!
//! A red-black tree ordered by interval low endpoint, where every node
//! additionally tracks the minimum and maximum bound over its subtree.
//! Overlap queries prune any subtree whose augmented bounds cannot reach
//! the query interval, giving O(log n + k) lookups over static or growing
//! interval sets.
//!
//! Nodes live in an arena indexed by `usize`; slot 0 is the shared NIL
//! sentinel (always black, with neutral augmented bounds), so the tree
//! needs no ownership cycles and no per-leaf allocations.

const NIL: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug)]
struct Node<T> {
    color: Color,
    parent: usize,
    left: usize,
    right: usize,
    low: u32,
    high: u32,
    /// Minimum low bound across this subtree
    min: u32,
    /// Maximum high bound across this subtree
    max: u32,
    /// `None` only on the sentinel
    value: Option<T>,
}

/// An interval returned from an overlap query.
#[derive(Debug)]
pub struct Entry<'a, T> {
    pub low: u32,
    pub high: u32,
    pub value: &'a T,
}

/// Interval tree over closed intervals `[low, high]` with payloads of `T`.
///
/// ```
/// use bintrack::IntervalTree;
///
/// let mut tree = IntervalTree::new();
/// tree.insert(0, 10, "a");
/// tree.insert(20, 30, "b");
///
/// let hits = tree.find_overlapping(5, 25);
/// assert_eq!(hits.len(), 2);
/// assert_eq!(*hits[0].value, "a");
/// ```
pub struct IntervalTree<T> {
    nodes: Vec<Node<T>>,
    root: usize,
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntervalTree<T> {
    #[must_use]
    pub fn new() -> Self {
        let sentinel = Node {
            color: Color::Black,
            parent: NIL,
            left: NIL,
            right: NIL,
            low: 0,
            high: 0,
            min: u32::MAX,
            max: 0,
            value: None,
        };
        Self {
            nodes: vec![sentinel],
            root: NIL,
        }
    }

    /// Number of intervals stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `[low, high]` with its payload. Equal lows keep stable
    /// ordering by descending to the left on ties.
    pub fn insert(&mut self, low: u32, high: u32, value: T) {
        let x = self.nodes.len();
        self.nodes.push(Node {
            color: Color::Red,
            parent: NIL,
            left: NIL,
            right: NIL,
            low,
            high,
            min: low,
            max: high,
            value: Some(value),
        });
        self.bst_insert(x);
        self.fix_insert(x);
    }

    /// All payloads whose interval overlaps `[low, high]`, ascending by low.
    #[must_use]
    pub fn find_overlapping(&self, low: u32, high: u32) -> Vec<Entry<'_, T>> {
        if self.root == NIL {
            return Vec::new();
        }
        let mut hits = Vec::new();
        self.search(self.root, low, high, &mut hits);
        if hits.len() > 1 {
            hits.sort_by_key(|entry| entry.low);
        }
        hits
    }

    /// Every payload in the tree, in no particular order.
    #[must_use]
    pub fn values(&self) -> Vec<&T> {
        let mut out = Vec::with_capacity(self.len());
        for node in &self.nodes {
            if let Some(value) = &node.value {
                out.push(value);
            }
        }
        out
    }

    fn search<'a>(&'a self, node: usize, low: u32, high: u32, hits: &mut Vec<Entry<'a, T>>) {
        let n = &self.nodes[node];
        if n.low <= high && low <= n.high {
            if let Some(value) = &n.value {
                hits.push(Entry {
                    low: n.low,
                    high: n.high,
                    value,
                });
            }
        }
        if n.left != NIL && self.nodes[n.left].max >= low {
            self.search(n.left, low, high, hits);
        }
        if n.right != NIL && self.nodes[n.right].min <= high {
            self.search(n.right, low, high, hits);
        }
    }

    /// Plain BST insert by low endpoint; balance is restored afterwards.
    fn bst_insert(&mut self, x: usize) {
        let low = self.nodes[x].low;
        let mut node = self.root;
        let mut y = NIL;
        while node != NIL {
            y = node;
            node = if low <= self.nodes[node].low {
                self.nodes[node].left
            } else {
                self.nodes[node].right
            };
        }
        self.nodes[x].parent = y;
        if y == NIL {
            self.root = x;
        } else if low <= self.nodes[y].low {
            self.nodes[y].left = x;
        } else {
            self.nodes[y].right = x;
        }
        self.update_upward(x);
    }

    fn fix_insert(&mut self, mut x: usize) {
        while x != self.root && self.nodes[self.nodes[x].parent].color == Color::Red {
            let parent = self.nodes[x].parent;
            let grand = self.nodes[parent].parent;
            if parent == self.nodes[grand].left {
                let uncle = self.nodes[grand].right;
                if self.nodes[uncle].color == Color::Red {
                    self.nodes[parent].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[grand].color = Color::Red;
                    x = grand;
                } else {
                    if x == self.nodes[parent].right {
                        x = parent;
                        self.rotate_left(x);
                    }
                    let parent = self.nodes[x].parent;
                    let grand = self.nodes[parent].parent;
                    self.nodes[parent].color = Color::Black;
                    self.nodes[grand].color = Color::Red;
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.nodes[grand].left;
                if self.nodes[uncle].color == Color::Red {
                    self.nodes[parent].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[grand].color = Color::Red;
                    x = grand;
                } else {
                    if x == self.nodes[parent].left {
                        x = parent;
                        self.rotate_right(x);
                    }
                    let parent = self.nodes[x].parent;
                    let grand = self.nodes[parent].parent;
                    self.nodes[parent].color = Color::Black;
                    self.nodes[grand].color = Color::Red;
                    self.rotate_left(grand);
                }
            }
        }
        let root = self.root;
        self.nodes[root].color = Color::Black;
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.nodes[x].right;
        let y_left = self.nodes[y].left;
        self.nodes[x].right = y_left;
        if y_left != NIL {
            self.nodes[y_left].parent = x;
        }
        let x_parent = self.nodes[x].parent;
        self.nodes[y].parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.nodes[x_parent].left == x {
            self.nodes[x_parent].left = y;
        } else {
            self.nodes[x_parent].right = y;
        }
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
        // y is an ancestor of x afterwards, so one upward walk covers both
        self.update_upward(x);
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.nodes[x].left;
        let y_right = self.nodes[y].right;
        self.nodes[x].left = y_right;
        if y_right != NIL {
            self.nodes[y_right].parent = x;
        }
        let x_parent = self.nodes[x].parent;
        self.nodes[y].parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.nodes[x_parent].right == x {
            self.nodes[x_parent].right = y;
        } else {
            self.nodes[x_parent].left = y;
        }
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
        self.update_upward(x);
    }

    /// Recomputes the augmented bounds from `node` up to the root.
    fn update_upward(&mut self, mut node: usize) {
        while node != NIL {
            let left = self.nodes[node].left;
            let right = self.nodes[node].right;
            let max = self.nodes[node]
                .high
                .max(self.nodes[left].max)
                .max(self.nodes[right].max);
            let min = self.nodes[node]
                .low
                .min(self.nodes[left].min)
                .min(self.nodes[right].min);
            self.nodes[node].max = max;
            self.nodes[node].min = min;
            node = self.nodes[node].parent;
        }
    }
}
