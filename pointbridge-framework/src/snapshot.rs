//! Shared buffer between the transform and publish phases of a cycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::PublishedRecord;

/// Mutex-guarded sequence of the records awaiting publish.
///
/// The lock is only taken for in-memory work; it is never held across I/O.
/// A poisoned lock is recovered, since the contents are rebuilt every cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Arc<Mutex<Vec<PublishedRecord>>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PublishedRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the buffer.
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut Vec<PublishedRecord>) -> R) -> R {
        f(&mut self.lock())
    }

    /// Replace the contents wholesale.
    pub fn replace(&self, records: Vec<PublishedRecord>) {
        *self.lock() = records;
    }

    /// Copy of the current contents, in order.
    pub fn records(&self) -> Vec<PublishedRecord> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
