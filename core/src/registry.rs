//! Role registry: which members of a service are selectors, dispatchers or
//! observers.
//!
//! The registry is a plain value keyed by type identity. It is filled from
//! each service type's manifest ([`ServiceShape::describe`]) and handed
//! explicitly to whoever needs it, typically the mock synthesizer.
//!
//! [`ServiceShape::describe`]: crate::service::ServiceShape::describe

use crate::service::ServiceShape;
use std::any::{TypeId, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The role of a tagged member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Reads derived state through a selector
    Selector,

    /// Submits actions to the store
    Dispatcher,

    /// Filters the stream of dispatched actions
    Observer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector => write!(f, "selector"),
            Self::Dispatcher => write!(f, "dispatcher"),
            Self::Observer => write!(f, "observer"),
        }
    }
}

/// Member names grouped by role.
///
/// The three lists are mutually exclusive and keep tagging order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    selectors: Vec<&'static str>,
    dispatchers: Vec<&'static str>,
    observers: Vec<&'static str>,
}

impl Roles {
    /// Create an empty role set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selectors: Vec::new(),
            dispatchers: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Tag a member with a role.
    ///
    /// Returns `false` when the member already has a role. Tagging the same
    /// role twice is a no-op; a conflicting role is ignored.
    pub fn tag(&mut self, member: &'static str, role: Role) -> bool {
        match self.role_of(member) {
            None => {
                self.list_mut(role).push(member);
                true
            },
            Some(existing) => {
                if existing != role {
                    tracing::warn!(
                        member,
                        %existing,
                        requested = %role,
                        "Member already tagged with another role, keeping the first"
                    );
                }
                false
            },
        }
    }

    /// The role of a member, if tagged.
    #[must_use]
    pub fn role_of(&self, member: &str) -> Option<Role> {
        if self.selectors.contains(&member) {
            Some(Role::Selector)
        } else if self.dispatchers.contains(&member) {
            Some(Role::Dispatcher)
        } else if self.observers.contains(&member) {
            Some(Role::Observer)
        } else {
            None
        }
    }

    /// Selector member names.
    #[must_use]
    pub fn selectors(&self) -> &[&'static str] {
        &self.selectors
    }

    /// Dispatcher member names.
    #[must_use]
    pub fn dispatchers(&self) -> &[&'static str] {
        &self.dispatchers
    }

    /// Observer member names.
    #[must_use]
    pub fn observers(&self) -> &[&'static str] {
        &self.observers
    }

    /// All tagged members with their role: selectors, then dispatchers, then
    /// observers.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Role)> + '_ {
        let selectors = self.selectors.iter().map(|m| (*m, Role::Selector));
        let dispatchers = self.dispatchers.iter().map(|m| (*m, Role::Dispatcher));
        let observers = self.observers.iter().map(|m| (*m, Role::Observer));
        selectors.chain(dispatchers).chain(observers)
    }

    /// Number of tagged members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len() + self.dispatchers.len() + self.observers.len()
    }

    /// Whether no member is tagged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge another role set into this one, keeping existing roles.
    pub fn merge(&mut self, other: &Self) {
        for (member, role) in other.iter() {
            self.tag(member, role);
        }
    }

    fn list_mut(&mut self, role: Role) -> &mut Vec<&'static str> {
        match role {
            Role::Selector => &mut self.selectors,
            Role::Dispatcher => &mut self.dispatchers,
            Role::Observer => &mut self.observers,
        }
    }
}

#[derive(Debug)]
struct TypeEntry {
    type_name: &'static str,
    roles: Roles,
    parents: Vec<TypeId>,
}

impl TypeEntry {
    const fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            roles: Roles::new(),
            parents: Vec::new(),
        }
    }
}

/// Type-level table of member roles.
///
/// # Example
///
/// ```
/// use store_service_core::registry::{Role, RoleRegistry};
///
/// struct BaseService;
/// struct BookService;
///
/// let mut registry = RoleRegistry::new();
/// registry.tag::<BaseService>("books", Role::Selector);
/// registry.tag::<BookService>("add_book", Role::Dispatcher);
/// registry.inherit::<BookService, BaseService>();
///
/// let roles = registry.roles_of::<BookService>();
/// assert_eq!(roles.selectors(), &["books"]);
/// assert_eq!(roles.dispatchers(), &["add_book"]);
/// ```
#[derive(Debug, Default)]
pub struct RoleRegistry {
    types: HashMap<TypeId, TypeEntry>,
}

impl RoleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding one service type's manifest.
    #[must_use]
    pub fn for_service<T: ServiceShape>() -> Self {
        let mut registry = Self::new();
        registry.register::<T>();
        registry
    }

    /// Record a service type's manifest.
    ///
    /// Registering a type twice is harmless: tags are deduplicated.
    pub fn register<T: ServiceShape>(&mut self) -> &mut Self {
        self.entry::<T>();
        T::describe(self);
        tracing::trace!(service = type_name::<T>(), "Registered service roles");
        self
    }

    /// Tag a member of `T` with a role.
    ///
    /// Infallible: duplicates and conflicting roles are ignored.
    pub fn tag<T: 'static>(&mut self, member: &'static str, role: Role) -> &mut Self {
        self.entry::<T>().roles.tag(member, role);
        self
    }

    /// Declare that `T` embeds the members of `Parent`.
    pub fn inherit<T: 'static, Parent: 'static>(&mut self) -> &mut Self {
        self.entry::<Parent>();
        let parent = TypeId::of::<Parent>();
        let entry = self.entry::<T>();
        if !entry.parents.contains(&parent) {
            entry.parents.push(parent);
        }
        self
    }

    /// Roles of `T`, merged with every declared ancestor.
    ///
    /// Own tags come first; ancestors are walked breadth-first and each type
    /// is visited once.
    #[must_use]
    pub fn roles_of<T: 'static>(&self) -> Roles {
        let mut roles = Roles::new();
        let mut visited = HashSet::new();
        let mut queue = std::collections::VecDeque::from([TypeId::of::<T>()]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(entry) = self.types.get(&id) {
                roles.merge(&entry.roles);
                queue.extend(entry.parents.iter().copied());
            }
        }

        roles
    }

    /// Whether anything was recorded for `T`.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.types.contains_key(&TypeId::of::<T>())
    }

    /// Names of the registered types.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.values().map(|entry| entry.type_name)
    }

    fn entry<T: 'static>(&mut self) -> &mut TypeEntry {
        self.types
            .entry(TypeId::of::<T>())
            .or_insert_with(|| TypeEntry::new(type_name::<T>()))
    }
}
