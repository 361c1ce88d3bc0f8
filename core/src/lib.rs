//! # Store Service Core
//!
//! Declarative accessors that bind a service type to a centralized,
//! reducer-driven store.
//!
//! A *store service* is a plain struct whose fields are bound accessors:
//!
//! - **Selectors** ([`Select`]): read derived state through a [`Selector`]
//! - **Dispatchers** ([`Dispatch`]): build an action and submit it to the store
//! - **Observers** ([`Observe`], [`ActionObservable`]): filter the stream of
//!   dispatched actions by type tag
//!
//! Roles are discovered two ways and freely mixed:
//!
//! - **Manifest**: the type records which fields have which role in a
//!   [`RoleRegistry`] (hand-written [`ServiceShape::describe`] or
//!   `#[derive(ServiceShape)]` with `#[select]`, `#[dispatch]`, `#[observe]`)
//! - **Markers**: each accessor value reports its own role
//!
//! The testing crate uses both to replace every accessor with a controllable
//! test double.
//!
//! ## Example
//!
//! ```
//! use futures::StreamExt;
//! use store_service_core::{
//!     Action, Dispatch, Select, ServiceMember, ServiceShape, StoreContext, StoreService,
//!     create_action, create_selector,
//! };
//!
//! #[derive(Clone, Debug)]
//! struct State {
//!     books: Vec<String>,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum BookAction {
//!     Add(String),
//! }
//!
//! impl Action for BookAction {
//!     fn action_type(&self) -> &str {
//!         "[Books] Add book"
//!     }
//! }
//!
//! struct BookService {
//!     books: Select<(), Vec<String>>,
//!     add_book: Dispatch<String>,
//! }
//!
//! impl ServiceShape for BookService {
//!     fn members_mut(&mut self) -> Vec<(&'static str, &mut dyn ServiceMember)> {
//!         vec![("books", &mut self.books), ("add_book", &mut self.add_book)]
//!     }
//! }
//!
//! impl StoreService for BookService {
//!     type State = State;
//!     type Action = BookAction;
//!
//!     fn from_context(context: &StoreContext<State, BookAction>) -> Self {
//!         Self {
//!             books: context.select(create_selector(|state: &State| state.books.clone())),
//!             add_book: context.dispatch(create_action("[Books] Add book", BookAction::Add)),
//!         }
//!     }
//! }
//!
//! let service = StoreContext::detached().service::<BookService>();
//! assert!(service.add_book.call("Rust".to_string()).is_err());
//! # tokio_test::block_on(async {
//! assert_eq!(service.books.call(()).next().await, None);
//! # });
//! ```

pub use smallvec::{SmallVec, smallvec};

/// Bound accessors stored in service fields
pub mod accessor;

/// Action tags, creators and descriptors
pub mod action;

/// Test doubles installed into mocked members
pub mod cell;

/// Error types
pub mod error;

/// Member role bookkeeping
pub mod registry;

/// Pure selector functions over store state
pub mod selector;

/// Service traits and the store context
pub mod service;

/// Store-handle contract and action stream
pub mod store;

pub use accessor::{ActionObservable, Dispatch, Observe, Select};
pub use action::{
    Action, ActionCreator, ActionDescriptor, ActionFilter, ActionTag, TypedAction, create_action,
};
pub use cell::{DispatchSpy, MockCell};
pub use error::{MockError, StoreError};
pub use registry::{Role, RoleRegistry, Roles};
pub use selector::{Selector, create_selector, create_selector_factory, create_selector_with_props};
pub use service::{
    CallConvention, InitialValue, MockTreatment, ServiceMember, ServiceShape, StoreContext,
    StoreService, discover_roles,
};
pub use store::{ActionStream, DetachedStore, StateStream, StoreHandle, StoreHandleExt};

/// Reducer module - state transitions for the runtime store
///
/// Reducers are pure functions: `(State, Action, Environment) → Effects`.
/// They update state in place and describe, but never perform, side effects.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Example
    ///
    /// ```
    /// use store_service_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
    ///
    /// #[derive(Clone, Debug)]
    /// enum CounterAction {
    ///     Increment,
    /// }
    ///
    /// struct CounterReducer;
    ///
    /// impl Reducer for CounterReducer {
    ///     type State = i64;
    ///     type Action = CounterAction;
    ///     type Environment = ();
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut i64,
    ///         action: CounterAction,
    ///         _env: &(),
    ///     ) -> SmallVec<[Effect<CounterAction>; 4]> {
    ///         match action {
    ///             CounterAction::Increment => *state += 1,
    ///         }
    ///         smallvec![Effect::None]
    ///     }
    /// }
    ///
    /// let mut count = 0;
    /// CounterReducer.reduce(&mut count, CounterAction::Increment, &());
    /// assert_eq!(count, 1);
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Most actions produce zero to four effects, which stay on the stack.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values returned by reducers and executed by the runtime store.
/// Any action an effect produces is dispatched back into the store.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a delay
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after the delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is dispatched
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap a future producing an optional action
        #[must_use]
        pub fn future<F>(future: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(future))
        }

        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}
