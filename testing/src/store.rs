//! Store-side test doubles.
//!
//! - [`MockStore`]: a store handle with settable state that records dispatched
//!   actions instead of reducing them
//! - [`MockActions`]: an action source tests push into
//! - [`StoreServiceTestBed`]: both, wired into a [`StoreContext`]

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use store_service_core::{
    Action, ActionStream, StateStream, StoreContext, StoreError, StoreHandle, StoreService,
};
use store_service_core::store::watch_stream;
use tokio::sync::{broadcast, watch};

/// Store handle double.
///
/// Selecting runs the real selector against the state set by the test.
/// Dispatching never fails and only appends to the recorded list.
///
/// # Example
///
/// ```
/// use store_service_core::{Action, StoreHandle};
/// use store_service_testing::MockStore;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Ping;
///
/// impl Action for Ping {
///     fn action_type(&self) -> &str {
///         "ping"
///     }
/// }
///
/// let store = MockStore::<u32, Ping>::new(0);
/// store.dispatch(Ping).unwrap();
///
/// assert_eq!(store.dispatched_actions(), vec![Ping]);
/// ```
pub struct MockStore<S, A> {
    inner: Arc<MockStoreInner<S, A>>,
}

struct MockStoreInner<S, A> {
    state: watch::Sender<Arc<S>>,
    dispatched: Mutex<Vec<A>>,
}

impl<S, A> MockStore<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a mock store holding `state`.
    #[must_use]
    pub fn new(state: S) -> Self {
        let (state, _) = watch::channel(Arc::new(state));
        Self {
            inner: Arc::new(MockStoreInner {
                state,
                dispatched: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Replace the state; every state subscriber receives it.
    pub fn set_state(&self, state: S) {
        self.inner.state.send_replace(Arc::new(state));
    }

    /// The current state.
    #[must_use]
    pub fn current_state(&self) -> Arc<S> {
        self.inner.state.borrow().clone()
    }

    /// Every dispatched action, oldest first.
    #[must_use]
    pub fn dispatched_actions(&self) -> Vec<A> {
        self.dispatched().clone()
    }

    /// The most recently dispatched action.
    #[must_use]
    pub fn last_dispatched(&self) -> Option<A> {
        self.dispatched().last().cloned()
    }

    /// Number of dispatched actions.
    #[must_use]
    pub fn dispatch_count(&self) -> usize {
        self.dispatched().len()
    }

    /// Dispatched actions carrying the given type tag.
    #[must_use]
    pub fn dispatched_of_type(&self, action_type: &str) -> Vec<A> {
        self.dispatched()
            .iter()
            .filter(|action| action.action_type() == action_type)
            .cloned()
            .collect()
    }

    /// Forget recorded actions.
    pub fn clear_dispatched(&self) {
        self.dispatched().clear();
    }

    fn dispatched(&self) -> std::sync::MutexGuard<'_, Vec<A>> {
        self.inner
            .dispatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S, A> StoreHandle<S, A> for MockStore<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn state(&self) -> StateStream<S> {
        watch_stream(self.inner.state.subscribe())
    }

    fn dispatch(&self, action: A) -> Result<(), StoreError> {
        tracing::debug!(action_type = action.action_type(), "Recorded dispatched action");
        self.dispatched().push(action);
        Ok(())
    }
}

impl<S, A> Clone for MockStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for MockStore<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dispatched = self
            .inner
            .dispatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("MockStore")
            .field("dispatched", &dispatched)
            .finish_non_exhaustive()
    }
}

/// Action source double: actions pushed here reach every observer built on
/// [`stream`](Self::stream).
pub struct MockActions<A> {
    sender: broadcast::Sender<A>,
}

impl<A: Action> MockActions<A> {
    /// Create an action source with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(store_service_core::cell::DEFAULT_CELL_CAPACITY)
    }

    /// Create an action source buffering `capacity` actions per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Push an action to current subscribers.
    ///
    /// Returns the number of subscribers that will see it.
    pub fn next(&self, action: A) -> usize {
        self.sender.send(action).unwrap_or(0)
    }

    /// Read-only stream for building services.
    #[must_use]
    pub fn stream(&self) -> ActionStream<A> {
        ActionStream::new(&self.sender)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<A: Action> Default for MockActions<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for MockActions<A> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<A> fmt::Debug for MockActions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockActions")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

/// A [`MockStore`] and [`MockActions`] pair for building real services in
/// tests.
///
/// # Example
///
/// ```
/// use store_service_core::Action;
/// use store_service_testing::StoreServiceTestBed;
///
/// #[derive(Clone, Debug)]
/// struct Noop;
///
/// impl Action for Noop {
///     fn action_type(&self) -> &str {
///         "noop"
///     }
/// }
///
/// let bed = StoreServiceTestBed::<Vec<String>, Noop>::with_state(vec!["A".to_string()]);
/// assert_eq!(bed.store().current_state().len(), 1);
/// ```
pub struct StoreServiceTestBed<S, A> {
    store: MockStore<S, A>,
    actions: MockActions<A>,
}

impl<S, A> StoreServiceTestBed<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// A test bed whose store holds `state`.
    #[must_use]
    pub fn with_state(state: S) -> Self {
        Self {
            store: MockStore::new(state),
            actions: MockActions::new(),
        }
    }

    /// Context wired to the mock store and action source.
    #[must_use]
    pub fn context(&self) -> StoreContext<S, A> {
        StoreContext::new(Arc::new(self.store.clone()), self.actions.stream())
    }

    /// Build a real service on the mock collaborators.
    #[must_use]
    pub fn service<T>(&self) -> T
    where
        T: StoreService<State = S, Action = A>,
    {
        self.context().service::<T>()
    }

    /// The mock store.
    #[must_use]
    pub const fn store(&self) -> &MockStore<S, A> {
        &self.store
    }

    /// The action source.
    #[must_use]
    pub const fn actions(&self) -> &MockActions<A> {
        &self.actions
    }
}

impl<S, A> fmt::Debug for StoreServiceTestBed<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreServiceTestBed")
            .field("store", &self.store)
            .field("actions", &self.actions)
            .finish()
    }
}
