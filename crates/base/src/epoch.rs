use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Generation counter shared between a pipeline and the work it spawns.
///
/// Work records the epoch it started in; once the owner calls `advance()`
/// anything stamped with an older value is stale and must not be
/// published.
#[derive(Clone, Debug)]
pub struct Epoch {
    value: Arc<AtomicU64>,
}

impl Default for Epoch {
    fn default() -> Self {
        Self::new()
    }
}

impl Epoch {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Move to the next epoch and return it.
    pub fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.current()
    }

    /// Wrap `inner` with the current epoch.
    pub fn stamp<T>(&self, inner: T) -> Stamped<T> {
        Stamped {
            epoch: self.current(),
            inner,
        }
    }
}

/// A value tagged with the epoch it was produced in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stamped<T> {
    pub epoch: u64,
    pub inner: T,
}

impl<T> Stamped<T> {
    pub fn is_current(&self, epoch: &Epoch) -> bool {
        epoch.is_current(self.epoch)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Stamped<U> {
        Stamped {
            epoch: self.epoch,
            inner: f(self.inner),
        }
    }
}
