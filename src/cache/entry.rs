//! Cache Entry Module
//!
//! Defines individual response cache entries with TTL and access tracking.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value with its expiration and last access time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant after which the entry is treated as absent
    pub expires_at: Instant,
    /// Instant of the last `set` or successful `get`
    pub last_access: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now + ttl,
            last_access: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration
    /// instant, so a zero TTL is expired immediately.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiry check against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Replace ==
    /// Overwrites value and TTL in place; the old expiration is discarded.
    pub fn replace(&mut self, value: V, ttl: Duration) {
        let now = Instant::now();
        self.value = value;
        self.expires_at = now + ttl;
        self.last_access = now;
    }

    // == Touch ==
    /// Refreshes the access timestamp.
    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value".to_string(), Duration::from_secs(60));

        assert_eq!(entry.value, "test_value");
        assert!(!entry.is_expired());
        assert!(entry.expires_at > entry.last_access);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("test_value".to_string(), Duration::from_millis(50));

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new(1u32, Duration::ZERO);
        assert!(entry.is_expired_at(entry.expires_at));
    }

    #[test]
    fn test_replace_resets_ttl() {
        let mut entry = CacheEntry::new("old".to_string(), Duration::from_millis(10));
        entry.replace("new".to_string(), Duration::from_secs(60));

        assert_eq!(entry.value, "new");
        assert!(entry.expires_at >= entry.last_access + Duration::from_secs(60));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_touch_moves_access_time_forward() {
        let mut entry = CacheEntry::new(0u8, Duration::from_secs(60));
        let first = entry.last_access;
        sleep(Duration::from_millis(5));
        entry.touch();
        assert!(entry.last_access > first);
    }
}
