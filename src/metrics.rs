//! Per-store counters
//!
//! | Counter | Incremented when |
//! |---------|------------------|
//! | `added` / `updated` / `deleted` | once per entity written |
//! | `index_hit` | a probe found a non-empty bucket or entry |
//! | `index_missed` | a probe found nothing |
//! | `index_scan` | no index could serve the lookup, fell back to a full scan |
//! | `foreign_key_added` / `foreign_key_removed` | node store: a cascade edge was created / removed |
//!
//! `count` is not a counter: it is read from the store when a snapshot is
//! taken.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Result class of one index probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLookup {
    Hit,
    Missed,
    Scan,
}

/// Counters for one entity store
#[derive(Debug, Default)]
pub struct StoreMetrics {
    added: AtomicU64,
    updated: AtomicU64,
    deleted: AtomicU64,
    index_hit: AtomicU64,
    index_missed: AtomicU64,
    index_scan: AtomicU64,
    foreign_key_added: AtomicU64,
    foreign_key_removed: AtomicU64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_added(&self) {
        self.added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_updated(&self) {
        self.updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deleted(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup(&self, lookup: IndexLookup) {
        let counter = match lookup {
            IndexLookup::Hit => &self.index_hit,
            IndexLookup::Missed => &self.index_missed,
            IndexLookup::Scan => &self.index_scan,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a probe that found `found` results
    pub fn record_probe(&self, found: bool) {
        self.record_lookup(if found {
            IndexLookup::Hit
        } else {
            IndexLookup::Missed
        });
    }

    pub fn record_foreign_key_added(&self) {
        self.foreign_key_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_foreign_key_removed(&self) {
        self.foreign_key_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold every counter of `other` into `self`
    pub fn absorb(&self, other: &StoreMetrics) {
        add(&self.added, &other.added);
        add(&self.updated, &other.updated);
        add(&self.deleted, &other.deleted);
        add(&self.foreign_key_added, &other.foreign_key_added);
        add(&self.foreign_key_removed, &other.foreign_key_removed);
        self.absorb_lookups(other);
    }

    /// Fold only the hit/miss/scan counters of `other` into `self`
    pub fn absorb_lookups(&self, other: &StoreMetrics) {
        add(&self.index_hit, &other.index_hit);
        add(&self.index_missed, &other.index_missed);
        add(&self.index_scan, &other.index_scan);
    }

    pub fn snapshot(&self, count: usize) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            count: count as u64,
            added: self.added.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            index_hit: self.index_hit.load(Ordering::Relaxed),
            index_missed: self.index_missed.load(Ordering::Relaxed),
            index_scan: self.index_scan.load(Ordering::Relaxed),
            foreign_key_added: self.foreign_key_added.load(Ordering::Relaxed),
            foreign_key_removed: self.foreign_key_removed.load(Ordering::Relaxed),
        }
    }

    /// Independent copy of the current counter values
    pub fn copy(&self) -> Self {
        let copy = Self::new();
        copy.absorb(self);
        copy
    }
}

fn add(target: &AtomicU64, source: &AtomicU64) {
    target.fetch_add(source.load(Ordering::Relaxed), Ordering::Relaxed);
}

/// Counters for a whole graph
#[derive(Debug, Default)]
pub struct GraphMetrics {
    pub nodes: StoreMetrics,
    pub edges: StoreMetrics,
}

impl GraphMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&self, other: &GraphMetrics) {
        self.nodes.absorb(&other.nodes);
        self.edges.absorb(&other.edges);
    }

    pub fn absorb_lookups(&self, other: &GraphMetrics) {
        self.nodes.absorb_lookups(&other.nodes);
        self.edges.absorb_lookups(&other.edges);
    }

    pub fn copy(&self) -> Self {
        Self {
            nodes: self.nodes.copy(),
            edges: self.edges.copy(),
        }
    }

    pub fn snapshot(&self, node_count: usize, edge_count: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            nodes: self.nodes.snapshot(node_count),
            edges: self.edges.snapshot(edge_count),
        }
    }
}

/// Point-in-time values of a `StoreMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetricsSnapshot {
    pub count: u64,
    pub added: u64,
    pub updated: u64,
    pub deleted: u64,
    pub index_hit: u64,
    pub index_missed: u64,
    pub index_scan: u64,
    pub foreign_key_added: u64,
    pub foreign_key_removed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub nodes: StoreMetricsSnapshot,
    pub edges: StoreMetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_counters_are_exclusive() {
        let metrics = StoreMetrics::new();
        metrics.record_probe(true);
        metrics.record_probe(false);
        metrics.record_lookup(IndexLookup::Scan);

        let snapshot = metrics.snapshot(0);
        assert_eq!(snapshot.index_hit, 1);
        assert_eq!(snapshot.index_missed, 1);
        assert_eq!(snapshot.index_scan, 1);
    }

    #[test]
    fn test_absorb_lookups_skips_writes() {
        let authoritative = GraphMetrics::new();
        let batch = GraphMetrics::new();
        batch.nodes.record_added();
        batch.nodes.record_foreign_key_added();
        batch.nodes.record_probe(true);

        authoritative.absorb_lookups(&batch);
        let snapshot = authoritative.snapshot(3, 0);
        assert_eq!(snapshot.nodes.count, 3);
        assert_eq!(snapshot.nodes.added, 0);
        assert_eq!(snapshot.nodes.foreign_key_added, 0);
        assert_eq!(snapshot.nodes.index_hit, 1);

        authoritative.absorb(&batch);
        let snapshot = authoritative.snapshot(3, 0);
        assert_eq!(snapshot.nodes.added, 1);
        assert_eq!(snapshot.nodes.index_hit, 2);
    }

    #[test]
    fn test_copy_is_independent() {
        let metrics = GraphMetrics::new();
        metrics.edges.record_deleted();
        let copy = metrics.copy();
        metrics.edges.record_deleted();

        assert_eq!(copy.snapshot(0, 0).edges.deleted, 1);
        assert_eq!(metrics.snapshot(0, 0).edges.deleted, 2);
    }
}
