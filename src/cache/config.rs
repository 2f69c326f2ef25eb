//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_TTL_SECONDS: u64 = 600;
const DEFAULT_MAX_ENTRIES: usize = 10_000;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every lookup computes and nothing is stored.
    pub enabled: bool,
    /// Lifetime of listing entries.
    pub default_ttl: Duration,
    /// Upper bound on stored entries; least recently used entries go first.
    pub max_entries: usize,
    /// Period of the expired-entry sweep.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            default_ttl: settings.default_ttl,
            max_entries: settings.max_entries.get(),
            sweep_interval: settings.sweep_interval,
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
