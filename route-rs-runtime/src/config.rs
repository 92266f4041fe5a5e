use std::time::Duration;

pub const DEFAULT_CACHE_CAPACITY: usize = 100;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15);
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_QUEUE_CAP: usize = 32;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables for address resolution. Built with `ArpConfig::new()` (or `default()`) and the
/// chained setters below, e.g. `ArpConfig::new().cache_ttl(Duration::from_secs(30))`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArpConfig {
    /// Most mappings the cache holds before the oldest is evicted.
    pub cache_capacity: usize,
    /// How long a learned mapping is trusted.
    pub cache_ttl: Duration,
    /// Minimum time between requests for the same unresolved address.
    pub retry_interval: Duration,
    /// Requests sent for one address, the initial one included, before giving up on it.
    pub max_attempts: u32,
    /// Packets held per unresolved address. The oldest is dropped past this.
    pub queue_cap: usize,
    /// Period of the maintenance loop.
    pub tick_interval: Duration,
}

impl Default for ArpConfig {
    fn default() -> Self {
        ArpConfig {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            queue_cap: DEFAULT_QUEUE_CAP,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl ArpConfig {
    pub fn new() -> Self {
        ArpConfig::default()
    }

    pub fn cache_capacity(self, cache_capacity: usize) -> Self {
        assert!(cache_capacity > 0, "cache_capacity must be at least 1");
        ArpConfig {
            cache_capacity,
            ..self
        }
    }

    pub fn cache_ttl(self, cache_ttl: Duration) -> Self {
        ArpConfig { cache_ttl, ..self }
    }

    pub fn retry_interval(self, retry_interval: Duration) -> Self {
        ArpConfig {
            retry_interval,
            ..self
        }
    }

    pub fn max_attempts(self, max_attempts: u32) -> Self {
        assert!(max_attempts > 0, "max_attempts must be at least 1");
        ArpConfig {
            max_attempts,
            ..self
        }
    }

    pub fn queue_cap(self, queue_cap: usize) -> Self {
        assert!(queue_cap > 0, "queue_cap must be at least 1");
        ArpConfig { queue_cap, ..self }
    }

    pub fn tick_interval(self, tick_interval: Duration) -> Self {
        assert!(
            tick_interval > Duration::from_secs(0),
            "tick_interval must be non-zero"
        );
        ArpConfig {
            tick_interval,
            ..self
        }
    }
}
