//! Test doubles installed into mocked members.
//!
//! - [`MockCell`]: replay-latest broadcast cell answering selectors and
//!   observers.
//! - [`DispatchSpy`]: recording no-op standing in for a dispatcher.

use crate::store::broadcast_stream;
use futures::stream::{BoxStream, StreamExt};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// Default number of pushes buffered per subscriber.
pub const DEFAULT_CELL_CAPACITY: usize = 64;

/// Replay-latest broadcast cell.
///
/// Holds one current value (or none). Every subscriber first receives the
/// current value, if any, then each value pushed after it subscribed. Clones
/// share the same cell.
///
/// # Example
///
/// ```
/// use futures::StreamExt;
/// use store_service_core::cell::MockCell;
///
/// # tokio_test::block_on(async {
/// let cell = MockCell::new(Some(vec!["Angular".to_string()]));
/// let mut books = cell.subscribe();
///
/// assert_eq!(books.next().await, Some(vec!["Angular".to_string()]));
///
/// cell.next(vec![]);
/// assert_eq!(books.next().await, Some(vec![]));
/// # });
/// ```
pub struct MockCell<T> {
    inner: Arc<CellInner<T>>,
}

struct CellInner<T> {
    current: Mutex<Option<T>>,
    pushes: broadcast::Sender<T>,
}

impl<T> MockCell<T>
where
    T: Clone + Send + 'static,
{
    /// Create a cell seeded with an optional value.
    #[must_use]
    pub fn new(initial: Option<T>) -> Self {
        Self::with_capacity(initial, DEFAULT_CELL_CAPACITY)
    }

    /// Create a cell with a custom per-subscriber buffer.
    #[must_use]
    pub fn with_capacity(initial: Option<T>, capacity: usize) -> Self {
        let (pushes, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(CellInner {
                current: Mutex::new(initial),
                pushes,
            }),
        }
    }

    /// Replace the current value and deliver it to every subscriber.
    pub fn next(&self, value: T) {
        let mut current = self
            .inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Some(value.clone());
        // No subscribers is fine; the value is kept for the next one
        let _ = self.inner.pushes.send(value);
    }

    /// The current value, if any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribe: the current value first, then subsequent pushes.
    #[must_use]
    pub fn subscribe(&self) -> BoxStream<'static, T> {
        // Snapshot and subscribe under the lock so no push falls in between
        let current = self
            .inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let pushes = broadcast_stream(self.inner.pushes.subscribe());
        let replay = futures::stream::iter(current.clone());
        drop(current);

        replay.chain(pushes).boxed()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.pushes.receiver_count()
    }
}

impl<T> Clone for MockCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MockCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self
            .inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MockCell").field("current", &*current).finish()
    }
}

/// Recording no-op standing in for a dispatcher.
///
/// Calls never reach a store; the payloads are kept so tests can assert on
/// them.
pub struct DispatchSpy<P> {
    calls: Arc<Mutex<Vec<P>>>,
}

impl<P> DispatchSpy<P> {
    /// Create an empty spy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record a call.
    pub fn record(&self, props: P) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(props);
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the spy was called at least once.
    #[must_use]
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Recorded payloads, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<P>
    where
        P: Clone,
    {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Payload of the most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<P>
    where
        P: Clone,
    {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Forget all recorded calls.
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<P> Default for DispatchSpy<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for DispatchSpy<P> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<P> fmt::Debug for DispatchSpy<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchSpy")
            .field("calls", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_empty_cell_emits_nothing_until_pushed() {
        let cell = MockCell::<u32>::new(None);
        let mut values = cell.subscribe();

        let pending = tokio::time::timeout(Duration::from_millis(20), values.next()).await;
        assert!(pending.is_err());

        cell.next(7);
        assert_eq!(values.next().await, Some(7));
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_latest_value_only() {
        let cell = MockCell::new(Some(1));
        cell.next(2);
        cell.next(3);

        let mut values = cell.subscribe();
        assert_eq!(values.next().await, Some(3));
        assert_eq!(cell.value(), Some(3));
    }

    #[tokio::test]
    async fn test_dropping_one_subscriber_keeps_others() {
        let cell = MockCell::new(Some("a"));
        let mut kept = cell.subscribe();
        let dropped = cell.subscribe();
        assert_eq!(cell.subscriber_count(), 2);

        drop(dropped);
        cell.next("b");

        assert_eq!(cell.subscriber_count(), 1);
        assert_eq!(kept.next().await, Some("a"));
        assert_eq!(kept.next().await, Some("b"));
    }

    #[test]
    fn test_spy_records_calls_in_order() {
        let spy = DispatchSpy::new();
        assert!(!spy.was_called());

        spy.record("first");
        spy.clone().record("second");

        assert_eq!(spy.calls(), vec!["first", "second"]);
        assert_eq!(spy.last_call(), Some("second"));

        spy.clear();
        assert_eq!(spy.call_count(), 0);
    }
}
