//! Consumer-side caching of decoded feature lists.
//!
//! Independent of the binary container: anything implementing
//! [`GenomicInterval`](crate::GenomicInterval) can be bucketed into a
//! per-chromosome interval tree and served back by sub-range.

mod feature_cache;
mod interval_tree;

pub use feature_cache::FeatureCache;
pub use interval_tree::{Entry, IntervalTree};
