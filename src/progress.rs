//! Observer trait for submission lifecycle events.
//!
//! Inject an [`Arc<dyn SubmissionObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to hear about each
//! submission as it moves through Submitting → Rendered / Failed, and about
//! late responses that the session throws away.
//!
//! # Example
//!
//! ```rust
//! use blockdiagram::{ClientConfig, DiagramKind, SubmissionObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     rendered: AtomicUsize,
//! }
//!
//! impl SubmissionObserver for CountingObserver {
//!     fn on_rendered(&self, request_id: u64, kind: DiagramKind, source_len: usize) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("#{request_id}: {kind} ({source_len} chars)");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { rendered: AtomicUsize::new(0) });
//! let config = ClientConfig::builder()
//!     .observer(observer as Arc<dyn SubmissionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::model::{DiagramKind, InputMode};
use std::sync::Arc;

/// Called by [`crate::session::DiagramSession`] as submissions progress.
///
/// Implementations must be `Send + Sync`: two submissions can be in flight at
/// once and their completions may land on different worker threads. All
/// methods default to no-ops.
pub trait SubmissionObserver: Send + Sync {
    /// A request was issued.
    ///
    /// # Arguments
    /// * `request_id` — token of the new submission
    /// * `mode`       — text or PDF
    fn on_submit_start(&self, request_id: u64, mode: InputMode) {
        let _ = (request_id, mode);
    }

    /// The latest submission produced a rendered diagram.
    ///
    /// # Arguments
    /// * `request_id` — token of the submission
    /// * `kind`       — detected diagram type
    /// * `source_len` — byte length of the diagram source
    fn on_rendered(&self, request_id: u64, kind: DiagramKind, source_len: usize) {
        let _ = (request_id, kind, source_len);
    }

    /// The latest submission failed.
    ///
    /// # Arguments
    /// * `request_id` — token of the submission
    /// * `error`      — human-readable error description
    fn on_failed(&self, request_id: u64, error: &str) {
        let _ = (request_id, error);
    }

    /// A response arrived for a submission that is no longer the latest.
    ///
    /// # Arguments
    /// * `request_id` — token of the stale submission
    /// * `latest_id`  — token of the submission that superseded it
    fn on_discarded(&self, request_id: u64, latest_id: u64) {
        let _ = (request_id, latest_id);
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl SubmissionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ObserverHandle = Arc<dyn SubmissionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    struct TrackingObserver {
        starts: AtomicUsize,
        rendered: AtomicUsize,
        failed: AtomicUsize,
        last_discarded: AtomicU64,
    }

    impl SubmissionObserver for TrackingObserver {
        fn on_submit_start(&self, _request_id: u64, _mode: InputMode) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_rendered(&self, _request_id: u64, _kind: DiagramKind, _source_len: usize) {
            self.rendered.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failed(&self, _request_id: u64, _error: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_discarded(&self, request_id: u64, _latest_id: u64) {
            self.last_discarded.store(request_id, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_submit_start(1, InputMode::Text);
        o.on_rendered(1, DiagramKind::Flowchart, 42);
        o.on_failed(2, "connection refused");
        o.on_discarded(1, 2);
    }

    #[test]
    fn tracking_observer_receives_events() {
        let tracker = TrackingObserver {
            starts: AtomicUsize::new(0),
            rendered: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            last_discarded: AtomicU64::new(0),
        };

        tracker.on_submit_start(1, InputMode::Pdf);
        tracker.on_submit_start(2, InputMode::Text);
        tracker.on_discarded(1, 2);
        tracker.on_rendered(2, DiagramKind::Sequence, 120);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.rendered.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.failed.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.last_discarded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let o: ObserverHandle = Arc::new(NoopObserver);
        o.on_submit_start(7, InputMode::Text);
        o.on_failed(7, "HTTP 500");
    }
}
