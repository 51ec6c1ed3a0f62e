//! Percent-complete accounting shared by every branch of a save.

use std::sync::{Mutex, PoisonError};

/// Callback receiving `(message, percent)` with percent in `0..=100`.
pub type ProgressFn<'a> = &'a (dyn Fn(&str, f64) + Sync);

/// Serializes status messages from concurrent branches and stamps each with
/// the percentage of work done before it.
///
/// The counter is held locked while the callback runs so two branches can
/// never report the same percentage or report out of order.
pub struct ProgressTracker<'a> {
    total: usize,
    count: Mutex<usize>,
    sink: ProgressFn<'a>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(total: usize, sink: ProgressFn<'a>) -> Self {
        Self {
            total,
            count: Mutex::new(0),
            sink,
        }
    }

    /// Messages reported so far.
    pub fn reported(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Report `message` at the current percentage, then advance the counter.
    pub fn report(&self, message: &str) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        (self.sink)(message, percent(*count, self.total));
        *count += 1;
    }

    /// Final 100% report once every step has been acknowledged.
    pub fn finish(&self, message: &str) {
        let _count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        (self.sink)(message, 100.0);
    }
}

/// `done / total * 100`, with an empty workload counting as complete.
pub fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}
