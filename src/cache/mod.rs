//! Tag-invalidated read-through cache for paginated listings.
//!
//! - [`build_key`] derives `"{operation}-{page}-{limit}"` keys.
//! - [`ReadThroughCache`] serves hits from a [`TagAwareStore`] and fills
//!   misses through a compute function, tagging the result.
//! - [`TagInvalidator`] drops every entry carrying a mutated collection's
//!   tag.
//! - [`spawn_sweeper`] purges expired entries in the background.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! default_ttl_seconds = 600
//! max_entries = 10000
//! sweep_interval_seconds = 60
//! ```

mod config;
mod invalidator;
mod keys;
mod lock;
mod read_through;
mod registry;
mod store;
mod sweeper;

pub use config::CacheConfig;
pub use invalidator::TagInvalidator;
pub use keys::{Tag, build_key, scoped_operation};
pub use read_through::{ReadThroughCache, ReadThroughError};
pub use registry::FillTicket;
pub use store::{CacheEntry, InsertOutcome, MemoryTagStore, TagAwareStore};
pub use sweeper::{spawn_sweeper, sweep_once};
