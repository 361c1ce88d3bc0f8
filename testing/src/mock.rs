//! Mock synthesis for store services.
//!
//! Given a service type, the synthesizer builds an instance on a detached
//! context (or a caller-supplied one) and replaces every tagged member with a
//! test double:
//!
//! | role | double |
//! |---|---|
//! | selector | [`MockCell`](store_service_core::MockCell) answering every call |
//! | observer | [`MockCell`](store_service_core::MockCell), in the member's own call convention |
//! | dispatcher | [`DispatchSpy`](store_service_core::DispatchSpy) recording calls |
//!
//! Manifest tags are applied first, then role markers. A member is treated
//! at most once.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use store_service_core::{
    InitialValue, MockError, MockTreatment, Role, RoleRegistry, ServiceMember, ServiceShape,
    StoreContext, StoreService,
};

type Producer = Arc<dyn Fn() -> InitialValue + Send + Sync>;

/// Initial values for mocked members, by member name.
///
/// Values are cloned into every mock built from this table, so two mocks
/// never share a cell.
///
/// # Example
///
/// ```
/// use store_service_testing::InitialValues;
///
/// let initial = InitialValues::new()
///     .with("get_all_books", Vec::<String>::new())
///     .with("book_count", 0_usize);
///
/// assert_eq!(initial.len(), 2);
/// assert!(initial.contains("get_all_books"));
/// ```
#[derive(Clone, Default)]
pub struct InitialValues {
    values: HashMap<String, Producer>,
}

impl InitialValues {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an initial value for a member.
    #[must_use]
    pub fn with<T>(mut self, member: impl Into<String>, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(member, value);
        self
    }

    /// Set the initial value for a member, replacing any previous one.
    pub fn insert<T>(&mut self, member: impl Into<String>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let producer: Producer = Arc::new(move || Box::new(value.clone()) as InitialValue);
        self.values.insert(member.into(), producer);
    }

    /// Whether a value was supplied for `member`.
    #[must_use]
    pub fn contains(&self, member: &str) -> bool {
        self.values.contains_key(member)
    }

    /// Number of supplied values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Member names with a supplied value.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn produce(&self, member: &str) -> Option<InitialValue> {
        self.values.get(member).map(|producer| producer())
    }
}

impl fmt::Debug for InitialValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut members: Vec<&str> = self.members().collect();
        members.sort_unstable();
        f.debug_struct("InitialValues")
            .field("members", &members)
            .finish()
    }
}

/// A test double installed into a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstalledMock {
    /// Member name
    pub member: &'static str,
    /// Role the member was treated as
    pub role: Role,
    /// Double installed
    pub treatment: MockTreatment,
}

/// Replace the tagged members of `service` with test doubles, in place.
///
/// Returns the installed doubles in installation order: manifest members
/// first, then marker-only members. Members already mocked are left as they
/// are.
///
/// # Errors
///
/// Returns [`MockError::InitialValueType`] when an initial value does not
/// match its member's value type.
pub fn synthesize<T: ServiceShape>(
    registry: &RoleRegistry,
    service: &mut T,
    initial: &InitialValues,
) -> Result<Vec<InstalledMock>, MockError> {
    let manifest = registry.roles_of::<T>();
    let mut members = service.members_mut();
    let mut treated: Vec<&'static str> = Vec::new();
    let mut installed = Vec::new();

    for (name, role) in manifest.iter() {
        let Some((_, member)) = members.iter_mut().find(|(member, _)| *member == name) else {
            tracing::warn!(
                member = name,
                service = type_name::<T>(),
                "Tagged member not found on service"
            );
            continue;
        };
        treated.push(name);
        if !member.is_mocked() {
            install(name, role, &mut **member, initial, &mut installed)?;
        }
    }

    for (name, member) in members.iter_mut() {
        let name: &'static str = *name;
        if treated.contains(&name) || member.is_mocked() {
            continue;
        }
        if let Some(role) = member.role_marker() {
            treated.push(name);
            install(name, role, &mut **member, initial, &mut installed)?;
        }
    }

    for member in initial.members() {
        if !installed.iter().any(|mock| mock.member == member) {
            tracing::warn!(
                member,
                service = type_name::<T>(),
                "Initial value for a member that was not mocked, ignoring it"
            );
        }
    }

    tracing::debug!(
        service = type_name::<T>(),
        mocked = installed.len(),
        "Synthesized store service mock"
    );
    Ok(installed)
}

fn install<'m>(
    name: &'static str,
    role: Role,
    member: &mut (dyn ServiceMember + 'm),
    initial: &InitialValues,
    installed: &mut Vec<InstalledMock>,
) -> Result<(), MockError> {
    let treatment = MockTreatment::for_member(role, member.convention());

    if member.install_mock(name, treatment, initial.produce(name))? {
        tracing::trace!(member = name, %treatment, "Installed mock");
        installed.push(InstalledMock {
            member: name,
            role,
            treatment,
        });
    } else {
        tracing::warn!(
            member = name,
            %role,
            %treatment,
            "Mock treatment does not fit member, leaving it real"
        );
    }
    Ok(())
}

/// Build a mock of `T` on a detached context.
///
/// # Errors
///
/// Returns [`MockError::InitialValueType`] when an initial value does not
/// match its member's value type.
///
/// # Example
///
/// ```
/// use store_service_core::{
///     Action, Select, ServiceMember, ServiceShape, StoreContext, StoreService, create_selector,
/// };
/// use store_service_testing::{InitialValues, create_store_service_mock};
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
/// struct CountService {
///     count: Select<(), u32>,
/// }
///
/// impl ServiceShape for CountService {
///     fn members_mut(&mut self) -> Vec<(&'static str, &mut dyn ServiceMember)> {
///         vec![("count", &mut self.count)]
///     }
/// }
///
/// impl StoreService for CountService {
///     type State = u32;
///     type Action = Noop;
///
///     fn from_context(context: &StoreContext<u32, Noop>) -> Self {
///         Self { count: context.select(create_selector(|count: &u32| *count)) }
///     }
/// }
///
/// let mock: CountService =
///     create_store_service_mock(&InitialValues::new().with("count", 3_u32)).unwrap();
/// let cell = mock.count.mock().unwrap();
/// assert_eq!(cell.value(), Some(3));
/// ```
pub fn create_store_service_mock<T: StoreService>(initial: &InitialValues) -> Result<T, MockError> {
    StoreServiceMockFactory::<T>::new(initial.clone()).create()
}

/// Build a reusable factory producing fresh mocks of `T`.
#[must_use]
pub fn create_store_service_mock_factory<T: StoreService>(
    initial: InitialValues,
) -> StoreServiceMockFactory<T> {
    StoreServiceMockFactory::new(initial)
}

/// Reusable mock factory.
///
/// Every [`create`](Self::create) builds a new instance with new cells, so
/// mocks made by one factory are independent.
pub struct StoreServiceMockFactory<T: StoreService> {
    registry: Arc<RoleRegistry>,
    initial: InitialValues,
    context: Option<StoreContext<T::State, T::Action>>,
}

impl<T: StoreService> StoreServiceMockFactory<T> {
    /// A factory using `T`'s own manifest.
    #[must_use]
    pub fn new(initial: InitialValues) -> Self {
        Self {
            registry: Arc::new(RoleRegistry::for_service::<T>()),
            initial,
            context: None,
        }
    }

    /// Use an explicit registry instead of `T`'s own manifest.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<RoleRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Build instances on a real context instead of a detached one.
    ///
    /// Members left untagged keep talking to this context.
    #[must_use]
    pub fn with_context(mut self, context: StoreContext<T::State, T::Action>) -> Self {
        self.context = Some(context);
        self
    }

    /// Build a fresh mock.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::InitialValueType`] when an initial value does not
    /// match its member's value type.
    pub fn create(&self) -> Result<T, MockError> {
        let mut service = match &self.context {
            Some(context) => T::from_context(context),
            None => T::from_context(&StoreContext::detached()),
        };
        synthesize(&self.registry, &mut service, &self.initial)?;
        Ok(service)
    }

    /// Build a fresh mock on the given context.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn create_with(&self, context: &StoreContext<T::State, T::Action>) -> Result<T, MockError> {
        let mut service = T::from_context(context);
        synthesize(&self.registry, &mut service, &self.initial)?;
        Ok(service)
    }

    /// The initial values this factory applies.
    #[must_use]
    pub const fn initial_values(&self) -> &InitialValues {
        &self.initial
    }
}

impl<T: StoreService> fmt::Debug for StoreServiceMockFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreServiceMockFactory")
            .field("service", &type_name::<T>())
            .field("initial", &self.initial)
            .field("context", &self.context.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use store_service_core::{Select, create_selector};

    struct Counter {
        count: Select<(), u32>,
        label: Select<(), String>,
    }

    impl ServiceShape for Counter {
        fn describe(registry: &mut RoleRegistry) {
            registry.tag::<Self>("label", Role::Selector);
            registry.tag::<Self>("missing", Role::Selector);
        }

        fn members_mut(&mut self) -> Vec<(&'static str, &mut dyn ServiceMember)> {
            vec![("count", &mut self.count), ("label", &mut self.label)]
        }
    }

    fn counter() -> Counter {
        let context = StoreContext::<u32, NoAction>::detached();
        Counter {
            count: context.select(create_selector(|count: &u32| *count)),
            label: context.select(create_selector(|count: &u32| count.to_string())),
        }
    }

    #[derive(Clone, Debug)]
    struct NoAction;

    impl store_service_core::Action for NoAction {
        fn action_type(&self) -> &str {
            "none"
        }
    }

    #[test]
    fn test_manifest_members_come_first_and_once() {
        let registry = RoleRegistry::for_service::<Counter>();
        let mut service = counter();

        let installed = synthesize(&registry, &mut service, &InitialValues::new()).unwrap();

        let names: Vec<_> = installed.iter().map(|mock| mock.member).collect();
        assert_eq!(names, vec!["label", "count"]);
        assert!(installed.iter().all(|mock| mock.treatment == MockTreatment::SelectorCell));
    }

    #[test]
    fn test_already_mocked_members_are_skipped() {
        let registry = RoleRegistry::for_service::<Counter>();
        let mut service = counter();

        synthesize(&registry, &mut service, &InitialValues::new()).unwrap();
        let again = synthesize(&registry, &mut service, &InitialValues::new()).unwrap();

        assert!(again.is_empty());
        assert!(service.count.mock().is_some());
    }

    #[test]
    fn test_initial_values_are_cloned_per_mock() {
        let initial = InitialValues::new().with("count", 4_u32);
        let registry = RoleRegistry::new();
        let mut first = counter();
        let mut second = counter();

        synthesize(&registry, &mut first, &initial).unwrap();
        synthesize(&registry, &mut second, &initial).unwrap();
        first.count.mock().unwrap().next(9);

        assert_eq!(first.count.mock().unwrap().value(), Some(9));
        assert_eq!(second.count.mock().unwrap().value(), Some(4));
    }
}
