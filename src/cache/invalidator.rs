//! Tag invalidation after mutations.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, instrument};

use super::keys::Tag;
use super::store::TagAwareStore;

const METRIC_INVALIDATED: &str = "bilemo_cache_invalidated_total";

/// Drops every cached entry carrying a mutated collection's tag.
///
/// Call after the mutation has committed, within the same request.
#[derive(Clone)]
pub struct TagInvalidator {
    store: Arc<dyn TagAwareStore>,
}

impl TagInvalidator {
    pub fn new(store: Arc<dyn TagAwareStore>) -> Self {
        Self { store }
    }

    /// Returns the number of dropped entries. Unknown tags are a no-op.
    #[instrument(skip_all, fields(tags = %join_tags(tags)))]
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let dropped = self.store.invalidate_tags(tags);
        counter!(METRIC_INVALIDATED).increment(dropped as u64);
        info!(dropped, "Cache tags invalidated");
        dropped
    }
}

fn join_tags(tags: &[Tag]) -> String {
    tags.iter().map(Tag::as_str).collect::<Vec<_>>().join(",")
}
