//! The store-handle contract and the read-only action stream.
//!
//! Services never own the store: they hold an `Arc<dyn StoreHandle<S, A>>`
//! and an [`ActionStream<A>`], both supplied by the application. Everything a
//! service does is either a read (select, subscribe) or an append-only
//! dispatch request.

use crate::action::Action;
use crate::error::StoreError;
use crate::selector::Selector;
use async_stream::stream;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Stream of state snapshots, starting with the current one.
pub type StateStream<S> = BoxStream<'static, Arc<S>>;

/// Capability granting read (state) and write (dispatch) access to a store.
///
/// Implemented by the runtime `Store`, by test doubles, and by
/// [`DetachedStore`]. Selecting is provided on top of [`state`](Self::state)
/// by [`StoreHandleExt`].
pub trait StoreHandle<S, A>: Send + Sync {
    /// Subscribe to state snapshots.
    ///
    /// The stream yields the current snapshot first, then one snapshot per
    /// store emission.
    fn state(&self) -> StateStream<S>;

    /// Submit an action to the store.
    ///
    /// # Errors
    ///
    /// Returns the store's own error when it rejects the action.
    fn dispatch(&self, action: A) -> Result<(), StoreError>;
}

/// Selection on top of any [`StoreHandle`].
pub trait StoreHandleExt<S, A>: StoreHandle<S, A> {
    /// Project every state snapshot through a selector.
    ///
    /// Emits exactly once per snapshot of the underlying store.
    fn select<P, R>(&self, selector: &Selector<S, P, R>, props: P) -> BoxStream<'static, R>
    where
        S: Send + Sync + 'static,
        P: Send + 'static,
        R: Send + 'static,
    {
        let selector = selector.clone();
        self.state()
            .map(move |state| selector.project(&state, &props))
            .boxed()
    }
}

impl<S, A, H> StoreHandleExt<S, A> for H where H: StoreHandle<S, A> + ?Sized {}

/// Turn a `watch` receiver into a stream that starts with the current value.
pub fn watch_stream<T>(mut receiver: watch::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + Sync + 'static,
{
    stream! {
        let current = receiver.borrow_and_update().clone();
        yield current;

        while receiver.changed().await.is_ok() {
            let next = receiver.borrow_and_update().clone();
            yield next;
        }
    }
    .boxed()
}

/// Turn a `broadcast` receiver into a stream of received values.
///
/// Lagged receivers skip the dropped values and keep going.
pub fn broadcast_stream<T>(mut receiver: broadcast::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + 'static,
{
    stream! {
        loop {
            match receiver.recv().await {
                Ok(value) => {
                    yield value;
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Subscriber lagged, {} values skipped", skipped);
                },
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    .boxed()
}

/// Read-only view of a store's stream of dispatched actions.
///
/// Multicast and replay-none: a subscriber sees the actions dispatched after
/// it subscribed, in dispatch order. The view holds a weak reference to the
/// channel, so subscriptions end once the owning store is dropped.
pub struct ActionStream<A> {
    source: Option<broadcast::WeakSender<A>>,
}

impl<A: Action> ActionStream<A> {
    /// Create a view over a broadcast channel.
    #[must_use]
    pub fn new(source: &broadcast::Sender<A>) -> Self {
        Self {
            source: Some(source.downgrade()),
        }
    }

    /// An action stream that never emits.
    #[must_use]
    pub const fn detached() -> Self {
        Self { source: None }
    }

    /// Whether this stream is backed by a real action source.
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.source.is_none()
    }

    /// Whether the owning store is still alive.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|source| source.strong_count() > 0)
    }

    /// Subscribe to dispatched actions.
    ///
    /// The subscription is taken immediately, before the returned stream is
    /// first polled, so no action dispatched after this call is missed. The
    /// stream is empty when the owning store is gone.
    #[must_use]
    pub fn subscribe(&self) -> BoxStream<'static, A> {
        match self.source.as_ref().and_then(broadcast::WeakSender::upgrade) {
            Some(source) => broadcast_stream(source.subscribe()),
            None => stream::empty().boxed(),
        }
    }
}

impl<A> Clone for ActionStream<A> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<A> std::fmt::Debug for ActionStream<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionStream")
            .field("detached", &self.source.is_none())
            .finish_non_exhaustive()
    }
}

/// Placeholder store handle for services built without a real store.
///
/// Its state stream is empty and every dispatch fails with
/// [`StoreError::Detached`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedStore;

impl<S, A> StoreHandle<S, A> for DetachedStore
where
    S: Send + Sync + 'static,
{
    fn state(&self) -> StateStream<S> {
        stream::empty().boxed()
    }

    fn dispatch(&self, _action: A) -> Result<(), StoreError> {
        Err(StoreError::Detached)
    }
}
