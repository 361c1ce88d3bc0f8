//! # Store Service Runtime
//!
//! The concrete store behind store services.
//!
//! [`Store`] owns the state, runs the reducer for every dispatched action,
//! publishes a state snapshot, broadcasts the action and executes the
//! reducer's effects on the ambient tokio runtime. Actions produced by effects
//! are dispatched back into the store.
//!
//! ## Example
//!
//! ```
//! use store_service_core::{Action, SmallVec, effect::Effect, reducer::Reducer, smallvec};
//! use store_service_runtime::Store;
//!
//! #[derive(Clone, Debug)]
//! struct Increment;
//!
//! impl Action for Increment {
//!     fn action_type(&self) -> &str {
//!         "[Counter] Increment"
//!     }
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = u32;
//!     type Action = Increment;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut u32, _: Increment, _: &()) -> SmallVec<[Effect<Increment>; 4]> {
//!         *state += 1;
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let store = Store::new(0, CounterReducer, ());
//! store.dispatch(Increment).unwrap();
//! assert_eq!(store.state(|count| *count), 1);
//! ```

use std::time::Duration;

pub use store::{Store, WeakStore};
pub use store_service_core::error::StoreError;

/// Default number of actions buffered per action-stream subscriber.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 16;

/// Configuration for a [`Store`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use store_service_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Actions buffered per action-stream subscriber before it lags
    pub broadcast_capacity: usize,
    /// Timeout used by [`Store::close`]
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Decrements a shared counter when dropped
struct AtomicCounterGuard(std::sync::Arc<std::sync::atomic::AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{AtomicCounterGuard, StoreConfig};
    use futures::StreamExt;
    use futures::future::{BoxFuture, FutureExt};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, Weak};
    use std::time::Duration;
    use store_service_core::action::Action;
    use store_service_core::effect::Effect;
    use store_service_core::error::StoreError;
    use store_service_core::reducer::Reducer;
    use store_service_core::service::{StoreContext, StoreService};
    use store_service_core::store::{ActionStream, StateStream, StoreHandle, watch_stream};
    use tokio::sync::{broadcast, watch};

    struct StoreInner<S, A, E, R> {
        state: Mutex<S>,
        snapshots: watch::Sender<Arc<S>>,
        action_broadcast: broadcast::Sender<A>,
        reducer: R,
        environment: E,
        shutdown: AtomicBool,
        pending_effects: Arc<AtomicUsize>,
        config: StoreConfig,
    }

    /// The Store - owns state, runs the reducer and executes effects
    ///
    /// Cloning a store is cheap; clones share everything.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer type
    pub struct Store<S, A, E, R> {
        inner: Arc<StoreInner<S, A, E, R>>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        S: Clone + Send + Sync + 'static,
        A: Action,
        E: Send + Sync + 'static,
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    {
        /// Create a new store with the default configuration
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (snapshots, _) = watch::channel(Arc::new(initial_state.clone()));
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                inner: Arc::new(StoreInner {
                    state: Mutex::new(initial_state),
                    snapshots,
                    action_broadcast,
                    reducer,
                    environment,
                    shutdown: AtomicBool::new(false),
                    pending_effects: Arc::new(AtomicUsize::new(0)),
                    config,
                }),
            }
        }

        /// Dispatch an action
        ///
        /// 1. Runs the reducer under the state lock
        /// 2. Publishes the new state snapshot
        /// 3. Broadcasts the action to the action stream, still under the lock
        /// 4. Spawns the returned effects
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`] once shutdown has started
        /// - [`StoreError::StatePoisoned`] if an earlier reducer panicked
        pub fn dispatch(&self, action: A) -> Result<(), StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!(
                    action_type = action.action_type(),
                    "Rejected action: store is shutting down"
                );
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!(action_type = action.action_type(), "Processing action");
            metrics::counter!("store.actions.dispatched").increment(1);

            let broadcast = action.clone();
            let effects = {
                let mut state = self
                    .inner
                    .state
                    .lock()
                    .map_err(|_| StoreError::StatePoisoned)?;

                let start = std::time::Instant::now();
                let effects = self
                    .inner
                    .reducer
                    .reduce(&mut state, action, &self.inner.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                self.inner.snapshots.send_replace(Arc::new(state.clone()));
                // Broadcast while still holding the lock so the action stream
                // sees actions in reduce order. No subscribers is fine.
                let _ = self.inner.action_broadcast.send(broadcast);
                effects
            };

            tracing::trace!("Executing {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect);
            }

            Ok(())
        }

        /// Dispatch an action and wait for the first broadcast action matching
        /// `predicate`
        ///
        /// The subscription is taken before dispatching, so the dispatched
        /// action itself can match.
        ///
        /// # Errors
        ///
        /// - Errors from [`dispatch`](Self::dispatch)
        /// - [`StoreError::Timeout`] if nothing matched in time
        /// - [`StoreError::ChannelClosed`] if the action channel closed
        pub async fn dispatch_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.inner.action_broadcast.subscribe();
            self.dispatch(action)?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                skipped,
                                "Action observer lagged, {} actions skipped",
                                skipped
                            );
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Read a value out of the latest state snapshot
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let snapshot = self.snapshot();
            f(snapshot.as_ref())
        }

        /// The latest state snapshot
        #[must_use]
        pub fn snapshot(&self) -> Arc<S> {
            self.inner.snapshots.borrow().clone()
        }

        /// Subscribe to every dispatched action
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.inner.action_broadcast.subscribe()
        }

        /// Read-only action stream for services
        #[must_use]
        pub fn action_stream(&self) -> ActionStream<A> {
            ActionStream::new(&self.inner.action_broadcast)
        }

        /// Store context for building services on this store
        ///
        /// The context only holds weak references: services built from it do
        /// not keep the store alive, and their streams end once it is dropped.
        #[must_use]
        pub fn context(&self) -> StoreContext<S, A> {
            StoreContext::new(Arc::new(self.downgrade()), self.action_stream())
        }

        /// Weak handle to this store
        #[must_use]
        pub fn downgrade(&self) -> WeakStore<S, A, E, R> {
            WeakStore {
                inner: Arc::downgrade(&self.inner),
            }
        }

        /// Build a service bound to this store
        #[must_use]
        pub fn service<T>(&self) -> T
        where
            T: StoreService<State = S, Action = A>,
        {
            self.context().service::<T>()
        }

        /// Number of effects still running
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.inner.pending_effects.load(Ordering::Acquire)
        }

        /// Whether shutdown has started
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.inner.shutdown.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown
        ///
        /// Rejects new actions, then waits for running effects. Actions
        /// produced by effects after this point are dropped.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.inner.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects();

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running",
                        pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down with the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`shutdown`](Self::shutdown).
        pub async fn close(&self) -> Result<(), StoreError> {
            self.shutdown(self.inner.config.default_shutdown_timeout)
                .await
        }

        fn execute_effect(&self, effect: Effect<A>) {
            if effect.is_none() {
                tracing::trace!("Executing Effect::None (no-op)");
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                return;
            }

            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                tracing::warn!(?effect, "No tokio runtime available, dropping effect");
                return;
            };

            self.inner.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.inner.pending_effects));
            let task = self.run_effect(effect);

            runtime.spawn(async move {
                let _pending_guard = pending_guard;
                task.await;
            });
        }

        fn run_effect(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();
            match effect {
                Effect::None => futures::future::ready(()).boxed(),
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    async move {
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, dispatching");
                            store.feed_back(action);
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    }
                    .boxed()
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action);
                    }
                    .boxed()
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    let tasks: Vec<_> = effects
                        .into_iter()
                        .map(|effect| store.run_effect(effect))
                        .collect();
                    async move {
                        futures::future::join_all(tasks).await;
                    }
                    .boxed()
                },
                Effect::Sequential(effects) => {
                    tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    async move {
                        for effect in effects {
                            store.run_effect(effect).await;
                        }
                    }
                    .boxed()
                },
            }
        }

        fn feed_back(&self, action: A) {
            if let Err(error) = self.dispatch(action) {
                tracing::warn!(%error, "Dropped action produced by an effect");
            }
        }
    }

    impl<S, A, E, R> StoreHandle<S, A> for Store<S, A, E, R>
    where
        S: Clone + Send + Sync + 'static,
        A: Action,
        E: Send + Sync + 'static,
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    {
        fn state(&self) -> StateStream<S> {
            watch_stream(self.inner.snapshots.subscribe())
        }

        fn dispatch(&self, action: A) -> Result<(), StoreError> {
            Store::dispatch(self, action)
        }
    }

    /// Non-owning handle to a [`Store`], used by service contexts
    ///
    /// Once every [`Store`] clone is dropped, its state stream is empty and
    /// dispatch fails with [`StoreError::StoreDropped`].
    pub struct WeakStore<S, A, E, R> {
        inner: Weak<StoreInner<S, A, E, R>>,
    }

    impl<S, A, E, R> WeakStore<S, A, E, R> {
        /// The store, if it is still alive
        #[must_use]
        pub fn upgrade(&self) -> Option<Store<S, A, E, R>> {
            self.inner.upgrade().map(|inner| Store { inner })
        }
    }

    impl<S, A, E, R> Clone for WeakStore<S, A, E, R> {
        fn clone(&self) -> Self {
            Self {
                inner: Weak::clone(&self.inner),
            }
        }
    }

    impl<S, A, E, R> StoreHandle<S, A> for WeakStore<S, A, E, R>
    where
        S: Clone + Send + Sync + 'static,
        A: Action,
        E: Send + Sync + 'static,
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    {
        fn state(&self) -> StateStream<S> {
            match self.upgrade() {
                Some(store) => StoreHandle::state(&store),
                None => futures::stream::empty().boxed(),
            }
        }

        fn dispatch(&self, action: A) -> Result<(), StoreError> {
            let Some(store) = self.upgrade() else {
                tracing::warn!(
                    action_type = action.action_type(),
                    "Rejected action: store was dropped"
                );
                return Err(StoreError::StoreDropped);
            };
            store.dispatch(action)
        }
    }

    impl<S, A, E, R> std::fmt::Debug for WeakStore<S, A, E, R> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("WeakStore")
                .field("alive", &(self.inner.strong_count() > 0))
                .finish()
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("shutdown", &self.inner.shutdown.load(Ordering::Relaxed))
                .field(
                    "pending_effects",
                    &self.inner.pending_effects.load(Ordering::Relaxed),
                )
                .field("config", &self.inner.config)
                .finish_non_exhaustive()
        }
    }

}
