//! Optional in-process spent-nonce guard.
//!
//! The facilitator is the authority on replay prevention; this guard only
//! short-circuits payloads the gate itself already settled, saving a
//! facilitator round-trip. A recorded nonce means Rejected — an Authorized
//! verdict is never served from here, so a replay can never re-authorize.

use alloy::primitives::FixedBytes;
use dashmap::DashMap;
use std::time::Instant;

/// Nonce storage for the gate's replay guard.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait NonceStore: Send + Sync {
    /// Check if a nonce has already been claimed.
    fn is_used(&self, nonce: &FixedBytes<32>) -> bool;

    /// Atomically claim a nonce. Returns `false` if it was already claimed
    /// (a replay attempt).
    fn try_use(&self, nonce: FixedBytes<32>) -> bool;

    /// Release a claimed nonce, e.g. when settlement did not go through
    /// after the claim. The authorization stays usable for a retry.
    fn release(&self, nonce: &FixedBytes<32>);

    /// Drop nonces older than `max_age_secs`. Returns the number dropped.
    ///
    /// Safe because an old nonce's authorization has expired by
    /// `valid_before` long before it is purged here.
    fn purge_expired(&self, max_age_secs: u64) -> usize;
}

/// In-memory nonce store backed by DashMap. Lost on restart, which is
/// acceptable for a cache whose authority lives in the facilitator.
pub struct InMemoryNonceStore {
    nonces: DashMap<FixedBytes<32>, Instant>,
}

impl InMemoryNonceStore {
    pub fn new() -> Self {
        Self {
            nonces: DashMap::new(),
        }
    }
}

impl Default for InMemoryNonceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceStore for InMemoryNonceStore {
    fn is_used(&self, nonce: &FixedBytes<32>) -> bool {
        self.nonces.contains_key(nonce)
    }

    fn try_use(&self, nonce: FixedBytes<32>) -> bool {
        use dashmap::mapref::entry::Entry;
        // The entry API makes check-and-claim atomic within this process.
        match self.nonces.entry(nonce) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(Instant::now());
                true
            }
        }
    }

    fn release(&self, nonce: &FixedBytes<32>) {
        self.nonces.remove(nonce);
    }

    fn purge_expired(&self, max_age_secs: u64) -> usize {
        let before = self.nonces.len();
        self.nonces
            .retain(|_, claimed| claimed.elapsed().as_secs() < max_age_secs);
        before - self.nonces.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_then_replay_fails() {
        let store = InMemoryNonceStore::new();
        let nonce = FixedBytes::new([0x42; 32]);

        assert!(!store.is_used(&nonce));
        assert!(store.try_use(nonce));
        assert!(store.is_used(&nonce));
        assert!(!store.try_use(nonce));
    }

    #[test]
    fn test_release_makes_nonce_usable_again() {
        let store = InMemoryNonceStore::new();
        let nonce = FixedBytes::new([0x01; 32]);

        assert!(store.try_use(nonce));
        store.release(&nonce);
        assert!(store.try_use(nonce));
    }

    #[test]
    fn test_nonces_are_independent() {
        let store = InMemoryNonceStore::new();
        assert!(store.try_use(FixedBytes::new([0xaa; 32])));
        assert!(!store.is_used(&FixedBytes::new([0xbb; 32])));
    }

    #[test]
    fn test_purge_keeps_fresh_nonces() {
        let store = InMemoryNonceStore::new();
        assert!(store.try_use(FixedBytes::new([0x0f; 32])));
        assert_eq!(store.purge_expired(3600), 0);
        assert!(store.is_used(&FixedBytes::new([0x0f; 32])));
    }

    #[test]
    fn test_purge_drops_aged_nonces() {
        let store = InMemoryNonceStore::new();
        assert!(store.try_use(FixedBytes::new([0x0f; 32])));
        // max age of zero ages out everything immediately
        assert_eq!(store.purge_expired(0), 1);
        assert!(!store.is_used(&FixedBytes::new([0x0f; 32])));
    }
}
