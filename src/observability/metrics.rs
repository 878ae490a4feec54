//! Engine counters
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Lock-free; `Relaxed` ordering is enough for counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Kind of refusal, for per-kind denial counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    Create,
    Write,
    Submission,
    Delete,
}

/// Operational counters for one engine instance
#[derive(Debug, Default)]
pub struct EngineMetrics {
    reads: AtomicU64,
    documents_projected: AtomicU64,
    creates: AtomicU64,
    updates: AtomicU64,
    documents_updated: AtomicU64,
    deletes: AtomicU64,
    documents_deleted: AtomicU64,
    create_denials: AtomicU64,
    write_denials: AtomicU64,
    submission_denials: AtomicU64,
    delete_denials: AtomicU64,
    internal_errors: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read that projected `documents` documents
    pub fn record_read(&self, documents: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.documents_projected.fetch_add(documents, Ordering::Relaxed);
    }

    pub fn record_create(&self) {
        self.creates.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an update that touched `documents` documents
    pub fn record_update(&self, documents: u64) {
        self.updates.fetch_add(1, Ordering::Relaxed);
        self.documents_updated.fetch_add(documents, Ordering::Relaxed);
    }

    /// Record a delete that removed `documents` documents
    pub fn record_delete(&self, documents: u64) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.documents_deleted.fetch_add(documents, Ordering::Relaxed);
    }

    pub fn record_denial(&self, kind: DenialKind) {
        let counter = match kind {
            DenialKind::Create => &self.create_denials,
            DenialKind::Write => &self.write_denials,
            DenialKind::Submission => &self.submission_denials,
            DenialKind::Delete => &self.delete_denials,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_internal_error(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            documents_projected: self.documents_projected.load(Ordering::Relaxed),
            creates: self.creates.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            documents_updated: self.documents_updated.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            create_denials: self.create_denials.load(Ordering::Relaxed),
            write_denials: self.write_denials.load(Ordering::Relaxed),
            submission_denials: self.submission_denials.load(Ordering::Relaxed),
            delete_denials: self.delete_denials.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub reads: u64,
    pub documents_projected: u64,
    pub creates: u64,
    pub updates: u64,
    pub documents_updated: u64,
    pub deletes: u64,
    pub documents_deleted: u64,
    pub create_denials: u64,
    pub write_denials: u64,
    pub submission_denials: u64,
    pub delete_denials: u64,
    pub internal_errors: u64,
}

impl MetricsSnapshot {
    pub fn total_denials(&self) -> u64 {
        self.create_denials + self.write_denials + self.submission_denials + self.delete_denials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        assert_eq!(EngineMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_operations() {
        let metrics = EngineMetrics::new();
        metrics.record_read(3);
        metrics.record_read(2);
        metrics.record_update(4);
        metrics.record_delete(1);
        metrics.record_create();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.reads, 2);
        assert_eq!(snapshot.documents_projected, 5);
        assert_eq!(snapshot.updates, 1);
        assert_eq!(snapshot.documents_updated, 4);
        assert_eq!(snapshot.deletes, 1);
        assert_eq!(snapshot.creates, 1);
    }

    #[test]
    fn test_denials_by_kind() {
        let metrics = EngineMetrics::new();
        metrics.record_denial(DenialKind::Write);
        metrics.record_denial(DenialKind::Write);
        metrics.record_denial(DenialKind::Submission);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.write_denials, 2);
        assert_eq!(snapshot.submission_denials, 1);
        assert_eq!(snapshot.total_denials(), 3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = EngineMetrics::new();
        metrics.record_internal_error();

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["internal_errors"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(EngineMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record_read(1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().reads, 800);
    }
}
