//! Progress reporting seam

/// Receives a monotonic count of processed items.
///
/// The CLI renders this as a progress bar; library callers and tests use
/// [`NoProgress`].
pub trait ProgressSink: Send + Sync {
    fn start(&self, total: usize, label: &str);

    /// One more item is done
    fn advance(&self, item: &str);

    fn finish(&self);
}

/// Discards progress
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _total: usize, _label: &str) {}
    fn advance(&self, _item: &str) {}
    fn finish(&self) {}
}
