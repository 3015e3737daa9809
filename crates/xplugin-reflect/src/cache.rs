//! Handle Cache
//!
//! Memoizes resolution outcomes per [`MemberDescriptor`]. Both successes and
//! failures are stored: a descriptor that failed once is never resolved
//! again in this process (the running release cannot change).
//!
//! The resolver runs outside any map guard, so it may itself consult the
//! cache. Two threads racing on the same descriptor may both resolve; the
//! first published outcome wins and the other is discarded.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::trace;

use crate::descriptor::MemberDescriptor;
use crate::error::LookupError;
use crate::locator::ResolvedHandle;

/// Outcome stored per descriptor
pub type CachedOutcome = Result<ResolvedHandle, LookupError>;

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Resolver invocations
    pub resolutions: u64,
    /// Descriptors whose stored outcome is a failure
    pub tombstones: usize,
    /// Total stored descriptors
    pub entries: usize,
}

/// Process-lifetime memo of resolved handles
pub struct HandleCache {
    slots: DashMap<MemberDescriptor, CachedOutcome>,
    hits: AtomicU64,
    resolutions: AtomicU64,
}

impl HandleCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            hits: AtomicU64::new(0),
            resolutions: AtomicU64::new(0),
        }
    }

    /// Return the stored outcome for `descriptor`, resolving it first if
    /// this is the first request
    pub fn get_or_resolve<F>(&self, descriptor: &MemberDescriptor, resolver: F) -> CachedOutcome
    where
        F: FnOnce(&MemberDescriptor) -> CachedOutcome,
    {
        if let Some(outcome) = self.get(descriptor) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return outcome;
        }

        self.resolutions.fetch_add(1, Ordering::Relaxed);
        let outcome = resolver(descriptor);
        trace!(member = %descriptor, ok = outcome.is_ok(), "publishing cache slot");

        // First writer wins
        self.slots
            .entry(descriptor.clone())
            .or_insert(outcome)
            .value()
            .clone()
    }

    /// Stored outcome, if any
    pub fn get(&self, descriptor: &MemberDescriptor) -> Option<CachedOutcome> {
        self.slots.get(descriptor).map(|entry| entry.value().clone())
    }

    /// Whether a descriptor has a stored outcome
    pub fn contains(&self, descriptor: &MemberDescriptor) -> bool {
        self.slots.contains_key(descriptor)
    }

    /// Number of stored descriptors
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            tombstones: self.slots.iter().filter(|e| e.value().is_err()).count(),
            entries: self.slots.len(),
        }
    }
}

impl Default for HandleCache {
    fn default() -> Self {
        Self::new()
    }
}
