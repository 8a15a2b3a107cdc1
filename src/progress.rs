//! Progress-callback trait for per-record build events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::CookbookConfigBuilder::progress_callback`] to receive
//! events as the pipeline decodes each recipe record.
//!
//! # Example
//!
//! ```rust
//! use paprika_cookbook::{ConversionProgressCallback, CookbookConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     parsed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_record_complete(&self, index: usize, total: usize, name: &str) {
//!         self.parsed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {}", index, total, name);
//!     }
//! }
//!
//! let config = CookbookConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { parsed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each recipe record.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Records are decoded one at a time, but photo
/// optimisation runs on blocking worker threads, so implementations must be
/// `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the archive is opened, before any record is read.
    ///
    /// # Arguments
    /// * `total_records` — number of entries carrying the recipe suffix
    fn on_conversion_start(&self, total_records: usize) {
        let _ = total_records;
    }

    /// Called before a record is read from the archive.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in archive order
    /// * `total` — total records
    /// * `entry` — archive entry name
    fn on_record_start(&self, index: usize, total: usize, entry: &str) {
        let _ = (index, total, entry);
    }

    /// Called when a record decoded successfully.
    fn on_record_complete(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a record is skipped because it could not be decoded.
    fn on_record_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every record has been attempted.
    ///
    /// # Arguments
    /// * `total_records` — records attempted
    /// * `success_count` — records that made it into the cookbook
    fn on_conversion_complete(&self, total_records: usize, success_count: usize) {
        let _ = (total_records, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CookbookConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        started_total: AtomicUsize,
        completed_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, total_records: usize) {
            self.started_total.store(total_records, Ordering::SeqCst);
        }

        fn on_record_start(&self, _index: usize, _total: usize, _entry: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_complete(&self, _index: usize, _total: usize, _name: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total_records: usize, success_count: usize) {
            self.completed_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_record_start(1, 5, "a.paprikarecipe");
        cb.on_record_complete(1, 5, "Apple Pie");
        cb.on_record_error(2, 5, "bad json");
        cb.on_conversion_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_conversion_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_record_start(1, 3, "a");
        tracker.on_record_complete(1, 3, "A");
        tracker.on_record_start(2, 3, "b");
        tracker.on_record_complete(2, 3, "B");
        tracker.on_record_start(3, 3, "c");
        tracker.on_record_error(3, 3, "not utf-8");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);

        tracker.on_conversion_complete(3, 2);
        assert_eq!(tracker.completed_total.load(Ordering::SeqCst), 2);
    }
}
