//! Per-key request coalescing
//!
//! When several tasks miss the cache for the same key at once, only the
//! first one (the leader) runs the upstream work. The others subscribe to a
//! broadcast channel and receive a clone of the leader's result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;

type Pending<T, E> = Mutex<HashMap<String, broadcast::Sender<Result<T, E>>>>;

/// Coalesces concurrent computations that share a key
///
/// The table entry for a key is removed as soon as its leader finishes or is
/// dropped. If a leader is cancelled mid-flight its waiters wake up, race for
/// the key again, and one of them becomes the new leader.
///
/// # Examples
///
/// ```
/// use lodestone_cache::InFlight;
///
/// # #[tokio::main]
/// # async fn main() {
/// let in_flight: InFlight<u32, String> = InFlight::new();
/// let value = in_flight.run("profile:1", || async { Ok(42) }).await;
/// assert_eq!(value, Ok(42));
/// # }
/// ```
#[derive(Debug)]
pub struct InFlight<T, E> {
    pending: Pending<T, E>,
}

impl<T, E> Default for InFlight<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> InFlight<T, E> {
    /// Create an empty coalescer
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys with a computation in progress
    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no computation is in progress
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone, E: Clone> InFlight<T, E> {
    /// Run `work` for `key`, or wait for the computation already running for it
    ///
    /// `work` is only invoked if this caller ends up leading; waiters that
    /// receive a broadcast result return without calling it.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let sender = loop {
            let mut receiver = {
                let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                match pending.get(key) {
                    Some(sender) => sender.subscribe(),
                    None => {
                        let (sender, _) = broadcast::channel(1);
                        pending.insert(key.to_string(), sender.clone());
                        break sender;
                    }
                }
            };

            tracing::debug!(key = %key, "Waiting on in-flight request");
            match receiver.recv().await {
                Ok(result) => return result,
                // Leader dropped without a result; compete to lead
                Err(_) => continue,
            }
        };

        let guard = LeaderGuard {
            pending: &self.pending,
            key,
        };

        let result = work().await;

        drop(guard);
        // Nobody listening is fine
        let _ = sender.send(result.clone());

        result
    }
}

/// Removes the leader's table entry on completion or cancellation
struct LeaderGuard<'a, T, E> {
    pending: &'a Pending<T, E>,
    key: &'a str,
}

impl<T, E> Drop for LeaderGuard<'_, T, E> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.key);
    }
}
