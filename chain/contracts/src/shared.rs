//! Thread-safe bridge handle
//!
//! Every operation runs under one `parking_lot::Mutex`, which is the single
//! serialization point for concurrent callers: two racing requests for the
//! same message yield one record, two racing finalizes yield one payout.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::asset::AssetCapability;
use crate::bridge::Bridge;

/// Cloneable, lock-protected [`Bridge`].
#[derive(Debug)]
pub struct SharedBridge<A: AssetCapability> {
    inner: Arc<Mutex<Bridge<A>>>,
}

impl<A: AssetCapability> Clone for SharedBridge<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: AssetCapability> SharedBridge<A> {
    pub fn new(bridge: Bridge<A>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bridge)),
        }
    }

    /// Run `f` with exclusive access. The whole closure is one atomic step.
    pub fn with<R>(&self, f: impl FnOnce(&mut Bridge<A>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Run `f` under the lock with read-only access.
    pub fn read<R>(&self, f: impl FnOnce(&Bridge<A>) -> R) -> R {
        f(&self.inner.lock())
    }
}
