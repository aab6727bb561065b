//! Progress-callback trait for per-item pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as each stage works through its images, blocks and recipes.
//!
//! # Example
//!
//! ```rust
//! use recipescan::{PipelineConfig, PipelineProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failed: Arc<AtomicUsize>,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_item_error(&self, stage: Stage, item: &str, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{stage}] {item}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     failed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::Stage;
use std::sync::Arc;

/// Called by the stages as they process each item.
///
/// Items are processed one at a time, but the trait is `Send + Sync` so an
/// implementation can be shared with a terminal renderer thread. All methods
/// have default no-op implementations.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once before the first item of a stage.
    fn on_stage_start(&self, stage: Stage, total_items: usize) {
        let _ = (stage, total_items);
    }

    /// Called before an item (image, block, recipe, document) is processed.
    fn on_item_start(&self, stage: Stage, item: &str) {
        let _ = (stage, item);
    }

    /// Called when an item produced its output.
    fn on_item_complete(&self, stage: Stage, item: &str) {
        let _ = (stage, item);
    }

    /// Called when an item was dropped.
    ///
    /// # Arguments
    /// * `error`: human-readable error description
    fn on_item_error(&self, stage: Stage, item: &str, error: &str) {
        let _ = (stage, item, error);
    }

    /// Called once after every item of a stage has been attempted.
    fn on_stage_complete(&self, stage: Stage, total_items: usize, success_count: usize) {
        let _ = (stage, total_items, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        successes: AtomicUsize,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_item_start(&self, _stage: Stage, _item: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_complete(&self, _stage: Stage, _item: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_error(&self, _stage: Stage, _item: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_complete(&self, _stage: Stage, _total: usize, success_count: usize) {
            self.successes.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Extract, 2);
        cb.on_item_start(Stage::Extract, "a.png");
        cb.on_item_complete(Stage::Extract, "a.png");
        cb.on_item_error(Stage::Extract, "b.png", "unreadable");
        cb.on_stage_complete(Stage::Extract, 2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_item_start(Stage::Split, "a_output.txt#1");
        tracker.on_item_complete(Stage::Split, "a_output.txt#1");
        tracker.on_item_start(Stage::Split, "a_output.txt#2");
        tracker.on_item_error(Stage::Split, "a_output.txt#2", "missing heading");
        tracker.on_stage_complete(Stage::Split, 2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Render, 1);
        cb.on_item_complete(Stage::Render, "Soup_parsed.txt");
    }
}
