//! In-memory cache over an already-decoded feature list.
//!
//! Features are partitioned by chromosome and bucketed into an interval
//! tree per chromosome. Buckets hold runs of start-sorted features, so the
//! tree stays small for dense tracks while sub-range queries can still trim
//! inside a bucket without scanning it fully.

use std::collections::HashMap;

use crate::record::{ChromAliases, GenomicInterval, GenomicRange};

use super::interval_tree::IntervalTree;

/// Caches a feature list for efficient (chrom, start, end) sub-range queries.
pub struct FeatureCache<F> {
    trees: HashMap<String, IntervalTree<Vec<F>>>,
    /// The genomic range the cached list covers, when known
    range: Option<GenomicRange>,
}

impl<F: GenomicInterval> FeatureCache<F> {
    /// Builds a cache over `features`, which need not be sorted.
    #[must_use]
    pub fn new(features: Vec<F>, range: Option<GenomicRange>) -> Self {
        Self::build(features, None, range)
    }

    /// Like [`new`](Self::new), but partitions under canonical chromosome
    /// names resolved through `aliases`.
    #[must_use]
    pub fn with_aliases(
        features: Vec<F>,
        aliases: &dyn ChromAliases,
        range: Option<GenomicRange>,
    ) -> Self {
        Self::build(features, Some(aliases), range)
    }

    fn build(
        features: Vec<F>,
        aliases: Option<&dyn ChromAliases>,
        range: Option<GenomicRange>,
    ) -> Self {
        let mut partitions: HashMap<String, Vec<F>> = HashMap::new();
        for feature in features {
            let chrom = match aliases {
                Some(resolver) => resolver.canonical_name(feature.chrom()),
                None => feature.chrom().to_owned(),
            };
            partitions.entry(chrom).or_default().push(feature);
        }

        let mut trees = HashMap::with_capacity(partitions.len());
        for (chrom, mut list) in partitions {
            list.sort_by_key(GenomicInterval::start);
            trees.insert(chrom, bucket_tree(list));
        }
        Self { trees, range }
    }

    /// True when the cache covers `range`: either no bounding range was
    /// supplied (the cache holds everything) or the bounding range
    /// contains it.
    #[must_use]
    pub fn contains_range(&self, range: &GenomicRange) -> bool {
        match &self.range {
            None => true,
            Some(bounds) => bounds.contains_range(range),
        }
    }

    /// All cached features overlapping `[start, end]`, ascending by start.
    #[must_use]
    pub fn query_features(&self, chrom: &str, start: u32, end: u32) -> Vec<&F> {
        let Some(tree) = self.trees.get(chrom) else {
            return Vec::new();
        };
        let buckets = tree.find_overlapping(start, end);
        if buckets.is_empty() {
            return Vec::new();
        }

        // Buckets are start-sorted internally: stop at the first feature
        // past the window, keep the ones reaching back into it.
        let mut features = Vec::new();
        for bucket in buckets {
            for feature in bucket.value {
                if feature.start() > end {
                    break;
                }
                if feature.end() >= start {
                    features.push(feature);
                }
            }
        }
        features.sort_by_key(|feature| feature.start());
        features
    }

    /// Every cached feature, in no particular order.
    #[must_use]
    pub fn all_features(&self) -> Vec<&F> {
        let mut out = Vec::new();
        for tree in self.trees.values() {
            for bucket in tree.values() {
                out.extend(bucket.iter());
            }
        }
        out
    }
}

/// Buckets a start-sorted feature list into chunks of
/// `max(10, round(n / 100))` and indexes each chunk as one interval.
fn bucket_tree<F: GenomicInterval>(features: Vec<F>) -> IntervalTree<Vec<F>> {
    let mut tree = IntervalTree::new();
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let chunk_size = ((features.len() as f64 / 100.0).round() as usize).max(10);

    let mut bucket = Vec::with_capacity(chunk_size);
    for feature in features {
        bucket.push(feature);
        if bucket.len() == chunk_size {
            insert_bucket(&mut tree, std::mem::take(&mut bucket));
        }
    }
    if !bucket.is_empty() {
        insert_bucket(&mut tree, bucket);
    }
    tree
}

fn insert_bucket<F: GenomicInterval>(tree: &mut IntervalTree<Vec<F>>, bucket: Vec<F>) {
    let Some(first) = bucket.first() else { return };
    let low = first.start();
    let high = bucket.iter().map(GenomicInterval::end).max().unwrap_or(low);
    tree.insert(low, high, bucket);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Span {
        chrom: &'static str,
        start: u32,
        end: u32,
    }

    impl GenomicInterval for Span {
        fn chrom(&self) -> &str {
            self.chrom
        }
        fn start(&self) -> u32 {
            self.start
        }
        fn end(&self) -> u32 {
            self.end
        }
    }

    fn span(chrom: &'static str, start: u32, end: u32) -> Span {
        Span { chrom, start, end }
    }

    #[test]
    fn test_query_trims_within_buckets() {
        let features: Vec<Span> = (0..50).map(|i| span("chr1", i * 10, i * 10 + 5)).collect();
        let cache = FeatureCache::new(features, None);

        let hits = cache.query_features("chr1", 95, 125);
        // features (90,95), (100,105), (110,115), (120,125) qualify
        assert_eq!(
            hits.iter().map(|f| f.start).collect::<Vec<_>>(),
            vec![90, 100, 110, 120]
        );
        assert!(hits.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn test_unsorted_input_is_sorted_on_build() {
        let features = vec![
            span("chr1", 300, 310),
            span("chr1", 100, 110),
            span("chr1", 200, 210),
        ];
        let cache = FeatureCache::new(features, None);
        let hits = cache.query_features("chr1", 0, 1_000);
        assert_eq!(
            hits.iter().map(|f| f.start).collect::<Vec<_>>(),
            vec![100, 200, 300]
        );
    }

    #[test]
    fn test_absent_chromosome_is_empty() {
        let cache = FeatureCache::new(vec![span("chr1", 0, 10)], None);
        assert!(cache.query_features("chr2", 0, 100).is_empty());
    }

    #[test]
    fn test_partitioning_by_chromosome() {
        let features = vec![
            span("chr1", 0, 10),
            span("chr2", 0, 10),
            span("chr1", 20, 30),
        ];
        let cache = FeatureCache::new(features, None);
        assert_eq!(cache.query_features("chr1", 0, 100).len(), 2);
        assert_eq!(cache.query_features("chr2", 0, 100).len(), 1);
        assert_eq!(cache.all_features().len(), 3);
    }

    #[test]
    fn test_contains_range() {
        let unbounded = FeatureCache::new(vec![span("chr1", 0, 10)], None);
        assert!(unbounded.contains_range(&GenomicRange::new("chr9", 0, 1 << 30)));

        let bounded = FeatureCache::new(
            vec![span("chr1", 0, 10)],
            Some(GenomicRange::new("chr1", 100, 500)),
        );
        assert!(bounded.contains_range(&GenomicRange::new("chr1", 150, 400)));
        assert!(!bounded.contains_range(&GenomicRange::new("chr1", 50, 400)));
        assert!(!bounded.contains_range(&GenomicRange::new("chr2", 150, 400)));
    }

    #[test]
    fn test_alias_resolution_partitions_canonically() {
        struct AddChr;
        impl ChromAliases for AddChr {
            fn canonical_name(&self, name: &str) -> String {
                if name.starts_with("chr") {
                    name.to_owned()
                } else {
                    format!("chr{name}")
                }
            }
        }

        let features = vec![span("1", 0, 10), span("chr1", 20, 30)];
        let cache = FeatureCache::with_aliases(features, &AddChr, None);
        // both spellings land in the same partition
        assert_eq!(cache.query_features("chr1", 0, 100).len(), 2);
    }

    #[test]
    fn test_bucket_boundaries_do_not_lose_features() {
        // enough features for several buckets of the minimum size 10
        let features: Vec<Span> = (0..95).map(|i| span("chr1", i, i + 1)).collect();
        let cache = FeatureCache::new(features, None);

        for start in [0u32, 9, 10, 11, 49, 90] {
            let hits = cache.query_features("chr1", start, start + 5);
            // features i..i+1 with i+1 >= start and i <= start+5
            let expected = (start.saturating_sub(1)..=(start + 5).min(94)).count();
            assert_eq!(hits.len(), expected, "window at {start}");
        }
    }

    #[test]
    fn test_inclusive_end_semantics() {
        let cache = FeatureCache::new(vec![span("chr1", 10, 20)], None);
        // feature.end >= start keeps a feature touching the window start
        assert_eq!(cache.query_features("chr1", 20, 30).len(), 1);
        // feature.start > end drops a feature past the window
        assert_eq!(cache.query_features("chr1", 0, 9).len(), 0);
        assert_eq!(cache.query_features("chr1", 0, 10).len(), 1);
    }
}
