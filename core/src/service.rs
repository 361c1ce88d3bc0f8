//! Store services: types whose members are bound accessors.
//!
//! A service type implements two traits:
//!
//! - [`StoreService`] builds the instance from a [`StoreContext`], eagerly
//!   creating every accessor.
//! - [`ServiceShape`] exposes the members to the role registry (the manifest)
//!   and to the mock synthesizer (mutable member access).
//!
//! `ServiceShape` is normally derived with `#[derive(ServiceShape)]` from
//! `store-service-macros`.

use crate::accessor::{ActionObservable, Dispatch, Observe, Select};
use crate::action::{Action, ActionDescriptor, ActionFilter, ActionTag};
use crate::error::MockError;
use crate::registry::{Role, RoleRegistry, Roles};
use crate::selector::Selector;
use crate::store::{ActionStream, DetachedStore, StoreHandle, StoreHandleExt};
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// A type-erased initial value handed to a mocked member.
pub type InitialValue = Box<dyn Any + Send>;

/// How a member is invoked by its callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallConvention {
    /// Invoked as a function (`member.call(..)`)
    Function,

    /// Used as a bare stream property (`member.subscribe()`)
    Property,
}

/// The test double installed into a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockTreatment {
    /// Answer every selector call from a replay-latest cell
    SelectorCell,

    /// Return a replay-latest cell from a zero-arg call
    ObserverFunction,

    /// Expose a replay-latest cell as the stream property itself
    ObserverProperty,

    /// Record calls without reaching any store
    NoOpDispatcher,
}

impl MockTreatment {
    /// The treatment for a member of the given role and call convention.
    #[must_use]
    pub const fn for_member(role: Role, convention: CallConvention) -> Self {
        match (role, convention) {
            (Role::Selector, _) => Self::SelectorCell,
            (Role::Dispatcher, _) => Self::NoOpDispatcher,
            (Role::Observer, CallConvention::Function) => Self::ObserverFunction,
            (Role::Observer, CallConvention::Property) => Self::ObserverProperty,
        }
    }
}

impl fmt::Display for MockTreatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectorCell => write!(f, "selector cell"),
            Self::ObserverFunction => write!(f, "observer function"),
            Self::ObserverProperty => write!(f, "observer property"),
            Self::NoOpDispatcher => write!(f, "no-op dispatcher"),
        }
    }
}

/// A member slot that the mock synthesizer can inspect and replace.
pub trait ServiceMember: Send {
    /// The role this member's value carries, if any.
    ///
    /// Members without a marker are only found through the type's manifest.
    fn role_marker(&self) -> Option<Role>;

    /// How callers invoke this member.
    fn convention(&self) -> CallConvention;

    /// Whether a test double is installed.
    fn is_mocked(&self) -> bool;

    /// Replace the member with the test double for `treatment`.
    ///
    /// Returns `Ok(false)` and leaves the member untouched when the treatment
    /// does not fit its shape.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::InitialValueType`] when `initial` does not hold
    /// the member's value type.
    fn install_mock(
        &mut self,
        member: &str,
        treatment: MockTreatment,
        initial: Option<InitialValue>,
    ) -> Result<bool, MockError>;
}

/// Recover a typed initial value.
///
/// # Errors
///
/// Returns [`MockError::InitialValueType`] when the value is not a `T`.
pub fn downcast_initial<T: 'static>(
    member: &str,
    initial: Option<InitialValue>,
) -> Result<Option<T>, MockError> {
    initial
        .map(|value| {
            value
                .downcast::<T>()
                .map(|value| *value)
                .map_err(|_| MockError::InitialValueType {
                    member: member.to_string(),
                    expected: type_name::<T>(),
                })
        })
        .transpose()
}

/// Member layout of a service type.
pub trait ServiceShape: 'static {
    /// Record this type's manifest: role tags and embedded parents.
    ///
    /// The default manifest is empty, leaving discovery to role markers.
    fn describe(_registry: &mut RoleRegistry) {}

    /// Every member slot, by name.
    fn members_mut(&mut self) -> Vec<(&'static str, &mut dyn ServiceMember)>;
}

/// A service built from a store context.
pub trait StoreService: ServiceShape + Sized {
    /// State of the store the service reads from.
    type State: Send + Sync + 'static;

    /// Actions the service dispatches and observes.
    type Action: Action;

    /// Build the service, creating every accessor eagerly.
    fn from_context(context: &StoreContext<Self::State, Self::Action>) -> Self;
}

/// Roles of one service instance: its type's manifest merged with the role
/// markers of its member values.
///
/// Manifest tags win when both disagree.
pub fn discover_roles<T: ServiceShape>(registry: &RoleRegistry, service: &mut T) -> Roles {
    let mut roles = registry.roles_of::<T>();
    for (name, member) in service.members_mut() {
        if let Some(role) = member.role_marker() {
            roles.tag(name, role);
        }
    }
    roles
}

/// The collaborators a service is constructed with: a store handle and the
/// store's action stream.
///
/// Also the accessor generator: every bound accessor is created here.
///
/// # Example
///
/// ```
/// use store_service_core::action::{Action, create_action};
/// use store_service_core::selector::create_selector;
/// use store_service_core::service::StoreContext;
///
/// #[derive(Clone, Debug)]
/// enum CounterAction {
///     Add(i64),
/// }
///
/// impl Action for CounterAction {
///     fn action_type(&self) -> &str {
///         "[Counter] Add"
///     }
/// }
///
/// let context = StoreContext::<i64, CounterAction>::detached();
/// let count = context.select(create_selector(|count: &i64| *count));
/// let add = context.dispatch(create_action("[Counter] Add", CounterAction::Add));
///
/// assert_eq!(add.action_tag().as_str(), "[Counter] Add");
/// assert!(add.call(1).is_err());
/// # drop(count);
/// ```
pub struct StoreContext<S, A> {
    store: Arc<dyn StoreHandle<S, A>>,
    actions: ActionStream<A>,
}

impl<S, A> StoreContext<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a context from a store handle and its action stream.
    #[must_use]
    pub fn new(store: Arc<dyn StoreHandle<S, A>>, actions: ActionStream<A>) -> Self {
        Self { store, actions }
    }

    /// A context with placeholder collaborators.
    ///
    /// Selectors never emit, observers never emit and dispatch fails with
    /// [`StoreError::Detached`](crate::error::StoreError::Detached).
    #[must_use]
    pub fn detached() -> Self {
        Self {
            store: Arc::new(DetachedStore),
            actions: ActionStream::detached(),
        }
    }

    /// The store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StoreHandle<S, A>> {
        &self.store
    }

    /// The action stream.
    #[must_use]
    pub const fn actions(&self) -> &ActionStream<A> {
        &self.actions
    }

    /// Bind a selector.
    #[must_use]
    pub fn select<P, R>(&self, selector: Selector<S, P, R>) -> Select<P, R>
    where
        P: Send + 'static,
        R: Clone + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        Select::live(move |props| store.select(&selector, props))
    }

    /// Bind a dispatcher to an action creator or action type.
    #[must_use]
    pub fn dispatch<P>(&self, descriptor: impl Into<ActionDescriptor<P, A>>) -> Dispatch<P>
    where
        P: 'static,
    {
        let descriptor = descriptor.into();
        let tag = descriptor.tag();
        let store = Arc::clone(&self.store);
        Dispatch::live(tag, move |props| store.dispatch(descriptor.build(props)))
    }

    /// Bind an observer yielding the matching actions themselves.
    #[must_use]
    pub fn observe<I>(&self, tags: I) -> Observe<A>
    where
        I: IntoIterator,
        I::Item: Into<ActionTag>,
    {
        self.observe_map(tags, Some)
    }

    /// Bind an observer mapping each matching action through `mapper`.
    ///
    /// Matching actions the mapper turns into `None` are skipped.
    #[must_use]
    pub fn observe_map<I, T, F>(&self, tags: I, mapper: F) -> Observe<T>
    where
        I: IntoIterator,
        I::Item: Into<ActionTag>,
        T: Clone + Send + 'static,
        F: Fn(A) -> Option<T> + Send + Sync + 'static,
    {
        let filter = ActionFilter::new(tags);
        let open = filtered_actions(self.actions.clone(), filter.clone(), mapper);
        Observe::live(filter, open)
    }

    /// Bind a stream property over matching actions.
    ///
    /// The result carries no role marker: tag it in the service manifest.
    #[must_use]
    pub fn observable<I, T, F>(&self, tags: I, mapper: F) -> ActionObservable<T>
    where
        I: IntoIterator,
        I::Item: Into<ActionTag>,
        T: Clone + Send + 'static,
        F: Fn(A) -> Option<T> + Send + Sync + 'static,
    {
        let filter = ActionFilter::new(tags);
        let open = filtered_actions(self.actions.clone(), filter.clone(), mapper);
        ActionObservable::live(filter, open)
    }

    /// Build a service on this context.
    #[must_use]
    pub fn service<T>(&self) -> T
    where
        T: StoreService<State = S, Action = A>,
    {
        T::from_context(self)
    }
}

impl<S, A> Clone for StoreContext<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            actions: self.actions.clone(),
        }
    }
}

impl<S, A> fmt::Debug for StoreContext<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

fn filtered_actions<A, T, F>(
    actions: ActionStream<A>,
    filter: ActionFilter,
    mapper: F,
) -> impl Fn() -> BoxStream<'static, T> + Send + Sync + 'static
where
    A: Action,
    T: Send + 'static,
    F: Fn(A) -> Option<T> + Send + Sync + 'static,
{
    let mapper = Arc::new(mapper);
    move || {
        let filter = filter.clone();
        let mapper = Arc::clone(&mapper);
        actions
            .subscribe()
            .filter_map(move |action| {
                let mapped = if filter.matches(&action) {
                    mapper(action)
                } else {
                    None
                };
                future::ready(mapped)
            })
            .boxed()
    }
}
