//! Bound accessors stored in service fields.
//!
//! Each accessor is either *live* (bound to a store handle / action stream at
//! construction) or *mocked* (answering from a test double). All of them
//! implement [`ServiceMember`], which is how the mock synthesizer finds and
//! replaces them.
//!
//! | accessor | role marker | call shape |
//! |---|---|---|
//! | [`Select<P, R>`] | selector | `call(props) -> stream` |
//! | [`Dispatch<P>`] | dispatcher | `call(props) -> Result` |
//! | [`Observe<T>`] | observer | `call() -> stream` |
//! | [`ActionObservable<T>`] | none (manifest only) | `subscribe() -> stream` |

use crate::action::{ActionFilter, ActionTag};
use crate::cell::{DispatchSpy, MockCell};
use crate::error::{MockError, StoreError};
use crate::registry::Role;
use crate::service::{CallConvention, InitialValue, MockTreatment, ServiceMember, downcast_initial};
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;

type StreamFn<T> = Arc<dyn Fn() -> BoxStream<'static, T> + Send + Sync>;

enum Source<T> {
    Live(StreamFn<T>),
    Mock(MockCell<T>),
}

impl<T> Source<T>
where
    T: Clone + Send + 'static,
{
    fn stream(&self) -> BoxStream<'static, T> {
        match self {
            Self::Live(open) => open(),
            Self::Mock(cell) => cell.subscribe(),
        }
    }
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Live(open) => Self::Live(Arc::clone(open)),
            Self::Mock(cell) => Self::Mock(cell.clone()),
        }
    }
}

/// Selector accessor: `call(props)` re-queries the store on every call.
pub struct Select<P, R> {
    inner: SelectInner<P, R>,
}

enum SelectInner<P, R> {
    Live(Arc<dyn Fn(P) -> BoxStream<'static, R> + Send + Sync>),
    Mock(MockCell<R>),
}

impl<P, R> Select<P, R>
where
    R: Clone + Send + 'static,
{
    pub(crate) fn live<F>(open: F) -> Self
    where
        F: Fn(P) -> BoxStream<'static, R> + Send + Sync + 'static,
    {
        Self {
            inner: SelectInner::Live(Arc::new(open)),
        }
    }

    /// A selector answering every call from the given cell.
    #[must_use]
    pub const fn mocked(cell: MockCell<R>) -> Self {
        Self {
            inner: SelectInner::Mock(cell),
        }
    }

    /// Select with the given props.
    ///
    /// A mocked selector ignores the props.
    pub fn call(&self, props: P) -> BoxStream<'static, R> {
        match &self.inner {
            SelectInner::Live(open) => open(props),
            SelectInner::Mock(cell) => cell.subscribe(),
        }
    }

    /// The mock cell, when mocked.
    #[must_use]
    pub const fn mock(&self) -> Option<&MockCell<R>> {
        match &self.inner {
            SelectInner::Live(_) => None,
            SelectInner::Mock(cell) => Some(cell),
        }
    }
}

impl<P, R> Clone for Select<P, R> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            SelectInner::Live(open) => SelectInner::Live(Arc::clone(open)),
            SelectInner::Mock(cell) => SelectInner::Mock(cell.clone()),
        };
        Self { inner }
    }
}

impl<P, R> fmt::Debug for Select<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("mocked", &matches!(self.inner, SelectInner::Mock(_)))
            .finish()
    }
}

impl<P, R> ServiceMember for Select<P, R>
where
    R: Clone + Send + 'static,
{
    fn role_marker(&self) -> Option<Role> {
        Some(Role::Selector)
    }

    fn convention(&self) -> CallConvention {
        CallConvention::Function
    }

    fn is_mocked(&self) -> bool {
        matches!(self.inner, SelectInner::Mock(_))
    }

    fn install_mock(
        &mut self,
        member: &str,
        treatment: MockTreatment,
        initial: Option<InitialValue>,
    ) -> Result<bool, MockError> {
        if treatment != MockTreatment::SelectorCell {
            return Ok(false);
        }
        let initial = downcast_initial::<R>(member, initial)?;
        self.inner = SelectInner::Mock(MockCell::new(initial));
        Ok(true)
    }
}

/// Dispatcher accessor: `call(props)` builds the action and dispatches it.
pub struct Dispatch<P> {
    tag: ActionTag,
    inner: DispatchInner<P>,
}

enum DispatchInner<P> {
    Live(Arc<dyn Fn(P) -> Result<(), StoreError> + Send + Sync>),
    Mock(DispatchSpy<P>),
}

impl<P> Dispatch<P> {
    pub(crate) fn live<F>(tag: ActionTag, dispatch: F) -> Self
    where
        F: Fn(P) -> Result<(), StoreError> + Send + Sync + 'static,
    {
        Self {
            tag,
            inner: DispatchInner::Live(Arc::new(dispatch)),
        }
    }

    /// A dispatcher recording into the given spy instead of dispatching.
    #[must_use]
    pub const fn mocked(tag: ActionTag, spy: DispatchSpy<P>) -> Self {
        Self {
            tag,
            inner: DispatchInner::Mock(spy),
        }
    }

    /// Build the action from `props` and dispatch it.
    ///
    /// # Errors
    ///
    /// Propagates the store handle's error. A mocked dispatcher never fails.
    pub fn call(&self, props: P) -> Result<(), StoreError> {
        match &self.inner {
            DispatchInner::Live(dispatch) => dispatch(props),
            DispatchInner::Mock(spy) => {
                spy.record(props);
                Ok(())
            },
        }
    }

    /// Tag of the actions this dispatcher produces.
    #[must_use]
    pub const fn action_tag(&self) -> &ActionTag {
        &self.tag
    }

    /// The spy, when mocked.
    #[must_use]
    pub const fn spy(&self) -> Option<&DispatchSpy<P>> {
        match &self.inner {
            DispatchInner::Live(_) => None,
            DispatchInner::Mock(spy) => Some(spy),
        }
    }
}

impl<P> Clone for Dispatch<P> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            DispatchInner::Live(dispatch) => DispatchInner::Live(Arc::clone(dispatch)),
            DispatchInner::Mock(spy) => DispatchInner::Mock(spy.clone()),
        };
        Self {
            tag: self.tag.clone(),
            inner,
        }
    }
}

impl<P> fmt::Debug for Dispatch<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("tag", &self.tag)
            .field("mocked", &matches!(self.inner, DispatchInner::Mock(_)))
            .finish()
    }
}

impl<P> ServiceMember for Dispatch<P>
where
    P: Send + 'static,
{
    fn role_marker(&self) -> Option<Role> {
        Some(Role::Dispatcher)
    }

    fn convention(&self) -> CallConvention {
        CallConvention::Function
    }

    fn is_mocked(&self) -> bool {
        matches!(self.inner, DispatchInner::Mock(_))
    }

    fn install_mock(
        &mut self,
        member: &str,
        treatment: MockTreatment,
        initial: Option<InitialValue>,
    ) -> Result<bool, MockError> {
        if treatment != MockTreatment::NoOpDispatcher {
            return Ok(false);
        }
        if initial.is_some() {
            tracing::debug!(member, "Ignoring initial value for dispatcher");
        }
        self.inner = DispatchInner::Mock(DispatchSpy::new());
        Ok(true)
    }
}

/// Observer accessor: `call()` streams matching actions, mapped to `T`.
pub struct Observe<T> {
    filter: ActionFilter,
    source: Source<T>,
}

impl<T> Observe<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn live<F>(filter: ActionFilter, open: F) -> Self
    where
        F: Fn() -> BoxStream<'static, T> + Send + Sync + 'static,
    {
        Self {
            filter,
            source: Source::Live(Arc::new(open)),
        }
    }

    /// An observer answering from the given cell.
    #[must_use]
    pub const fn mocked(filter: ActionFilter, cell: MockCell<T>) -> Self {
        Self {
            filter,
            source: Source::Mock(cell),
        }
    }

    /// Subscribe to matching actions dispatched from now on.
    pub fn call(&self) -> BoxStream<'static, T> {
        self.source.stream()
    }

    /// The tags this observer matches.
    #[must_use]
    pub fn tags(&self) -> &[ActionTag] {
        self.filter.tags()
    }

    /// The mock cell, when mocked.
    #[must_use]
    pub const fn mock(&self) -> Option<&MockCell<T>> {
        match &self.source {
            Source::Live(_) => None,
            Source::Mock(cell) => Some(cell),
        }
    }
}

impl<T> Clone for Observe<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            source: self.source.clone(),
        }
    }
}

impl<T> fmt::Debug for Observe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observe")
            .field("tags", &self.filter.tags())
            .field("mocked", &matches!(self.source, Source::Mock(_)))
            .finish()
    }
}

impl<T> ServiceMember for Observe<T>
where
    T: Clone + Send + 'static,
{
    fn role_marker(&self) -> Option<Role> {
        Some(Role::Observer)
    }

    fn convention(&self) -> CallConvention {
        CallConvention::Function
    }

    fn is_mocked(&self) -> bool {
        matches!(self.source, Source::Mock(_))
    }

    fn install_mock(
        &mut self,
        member: &str,
        treatment: MockTreatment,
        initial: Option<InitialValue>,
    ) -> Result<bool, MockError> {
        if treatment != MockTreatment::ObserverFunction {
            return Ok(false);
        }
        let initial = downcast_initial::<T>(member, initial)?;
        self.source = Source::Mock(MockCell::new(initial));
        Ok(true)
    }
}

/// Observer used as a bare stream property: `subscribe()`.
///
/// Carries no role marker; it is only discovered through a service manifest
/// (`#[observe]` or an explicit registry tag).
pub struct ActionObservable<T> {
    filter: ActionFilter,
    source: Source<T>,
}

impl<T> ActionObservable<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn live<F>(filter: ActionFilter, open: F) -> Self
    where
        F: Fn() -> BoxStream<'static, T> + Send + Sync + 'static,
    {
        Self {
            filter,
            source: Source::Live(Arc::new(open)),
        }
    }

    /// Subscribe to matching actions dispatched from now on.
    pub fn subscribe(&self) -> BoxStream<'static, T> {
        self.source.stream()
    }

    /// The tags this observable matches.
    #[must_use]
    pub fn tags(&self) -> &[ActionTag] {
        self.filter.tags()
    }

    /// The mock cell, when mocked.
    #[must_use]
    pub const fn mock(&self) -> Option<&MockCell<T>> {
        match &self.source {
            Source::Live(_) => None,
            Source::Mock(cell) => Some(cell),
        }
    }
}

impl<T> Clone for ActionObservable<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            source: self.source.clone(),
        }
    }
}

impl<T> fmt::Debug for ActionObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionObservable")
            .field("tags", &self.filter.tags())
            .field("mocked", &matches!(self.source, Source::Mock(_)))
            .finish()
    }
}

impl<T> ServiceMember for ActionObservable<T>
where
    T: Clone + Send + 'static,
{
    fn role_marker(&self) -> Option<Role> {
        None
    }

    fn convention(&self) -> CallConvention {
        CallConvention::Property
    }

    fn is_mocked(&self) -> bool {
        matches!(self.source, Source::Mock(_))
    }

    fn install_mock(
        &mut self,
        member: &str,
        treatment: MockTreatment,
        initial: Option<InitialValue>,
    ) -> Result<bool, MockError> {
        if treatment != MockTreatment::ObserverProperty {
            return Ok(false);
        }
        let initial = downcast_initial::<T>(member, initial)?;
        self.source = Source::Mock(MockCell::new(initial));
        Ok(true)
    }
}
