//! Actions, action type tags and the two supported action shapes.
//!
//! An action is any value that carries a string type tag. Dispatchers can be
//! built from either shape the ecosystem has used over time:
//!
//! - **Creator functions** ([`ActionCreator`]): a tag plus a function turning a
//!   payload into an action value.
//! - **Action types** ([`TypedAction`]): a type with a constant tag that is
//!   constructed from its payload and converted into the store's action type.
//!
//! Both are folded into an [`ActionDescriptor`] once, when the dispatcher is
//! registered.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A value that can be dispatched to a store.
///
/// Actions are cloned into every subscriber of the action stream, so they
/// must be cheap enough to clone and safe to send across tasks.
pub trait Action: Clone + fmt::Debug + Send + Sync + 'static {
    /// The string type tag of this action (e.g. `"[Books] Add book"`).
    fn action_type(&self) -> &str;
}

/// An action type with a statically known tag.
///
/// This is the "action class" shape: a dedicated type per action, built from
/// its payload via `From<P>` and converted into the store action via `Into`.
///
/// # Example
///
/// ```
/// use store_service_core::action::TypedAction;
///
/// struct AddBookAction {
///     title: String,
/// }
///
/// impl TypedAction for AddBookAction {
///     const TYPE: &'static str = "[Books] Add book";
/// }
///
/// assert_eq!(AddBookAction::TYPE, "[Books] Add book");
/// ```
pub trait TypedAction {
    /// The type tag shared by every instance.
    const TYPE: &'static str;
}

/// Normalized action identifier used for matching.
///
/// Observers accept literal strings, creators, descriptors and action types;
/// all of them are reduced to an `ActionTag` before comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionTag(Cow<'static, str>);

impl ActionTag {
    /// Create a tag from a string.
    #[must_use]
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    /// The tag of an action type.
    #[must_use]
    pub const fn of<T: TypedAction>() -> Self {
        Self(Cow::Borrowed(T::TYPE))
    }

    /// Get the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the given action carries this tag.
    #[must_use]
    pub fn matches<A: Action>(&self, action: &A) -> bool {
        self.as_str() == action.action_type()
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ActionTag {
    fn from(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }
}

impl From<String> for ActionTag {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

impl<P, A> From<&ActionCreator<P, A>> for ActionTag {
    fn from(creator: &ActionCreator<P, A>) -> Self {
        creator.tag()
    }
}

impl<P, A> From<&ActionDescriptor<P, A>> for ActionTag {
    fn from(descriptor: &ActionDescriptor<P, A>) -> Self {
        descriptor.tag()
    }
}

/// A tagged function producing an action from a payload.
///
/// # Example
///
/// ```
/// use store_service_core::action::create_action;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum CounterAction {
///     Add { amount: i64 },
/// }
///
/// let add = create_action("[Counter] Add", |amount: i64| CounterAction::Add { amount });
/// assert_eq!(add.tag().as_str(), "[Counter] Add");
/// assert_eq!(add.create(3), CounterAction::Add { amount: 3 });
/// ```
pub struct ActionCreator<P, A> {
    tag: &'static str,
    build: Arc<dyn Fn(P) -> A + Send + Sync>,
}

impl<P, A> ActionCreator<P, A> {
    /// The type tag of the actions this creator produces.
    #[must_use]
    pub const fn tag(&self) -> ActionTag {
        ActionTag(Cow::Borrowed(self.tag))
    }

    /// Build an action from its payload.
    pub fn create(&self, props: P) -> A {
        (self.build)(props)
    }
}

impl<P, A> Clone for ActionCreator<P, A> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag,
            build: Arc::clone(&self.build),
        }
    }
}

impl<P, A> fmt::Debug for ActionCreator<P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator").field("tag", &self.tag).finish()
    }
}

/// Create an [`ActionCreator`] from a tag and a payload-to-action function.
pub fn create_action<P, A, F>(tag: &'static str, build: F) -> ActionCreator<P, A>
where
    F: Fn(P) -> A + Send + Sync + 'static,
{
    ActionCreator {
        tag,
        build: Arc::new(build),
    }
}

/// How a dispatcher builds its action, decided once at registration time.
pub enum ActionDescriptor<P, A> {
    /// Invoke a creator function.
    Creator(ActionCreator<P, A>),

    /// Construct an action type and convert it into the store action.
    Constructor {
        /// The action type's tag
        tag: &'static str,
        /// Monomorphized `P -> T -> A` construction
        construct: fn(P) -> A,
    },
}

impl<P, A> ActionDescriptor<P, A> {
    /// Describe an action type `T` built from payload `P`.
    #[must_use]
    pub fn of_type<T>() -> Self
    where
        T: TypedAction + From<P>,
        A: From<T>,
    {
        Self::Constructor {
            tag: T::TYPE,
            construct: construct_typed::<P, A, T>,
        }
    }

    /// The tag of the actions this descriptor produces.
    #[must_use]
    pub fn tag(&self) -> ActionTag {
        match self {
            Self::Creator(creator) => creator.tag(),
            Self::Constructor { tag, .. } => ActionTag::from(*tag),
        }
    }

    /// Build an action from its payload.
    pub fn build(&self, props: P) -> A {
        match self {
            Self::Creator(creator) => creator.create(props),
            Self::Constructor { construct, .. } => construct(props),
        }
    }
}

impl<P, A> Clone for ActionDescriptor<P, A> {
    fn clone(&self) -> Self {
        match self {
            Self::Creator(creator) => Self::Creator(creator.clone()),
            Self::Constructor { tag, construct } => Self::Constructor {
                tag: *tag,
                construct: *construct,
            },
        }
    }
}

impl<P, A> fmt::Debug for ActionDescriptor<P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creator(creator) => f.debug_tuple("Creator").field(creator).finish(),
            Self::Constructor { tag, .. } => {
                f.debug_struct("Constructor").field("tag", tag).finish()
            },
        }
    }
}

impl<P, A> From<ActionCreator<P, A>> for ActionDescriptor<P, A> {
    fn from(creator: ActionCreator<P, A>) -> Self {
        Self::Creator(creator)
    }
}

impl<P, A> From<&ActionCreator<P, A>> for ActionDescriptor<P, A> {
    fn from(creator: &ActionCreator<P, A>) -> Self {
        Self::Creator(creator.clone())
    }
}

/// A deduplicated set of tags; an action passes if any tag matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionFilter {
    tags: Arc<[ActionTag]>,
}

impl ActionFilter {
    /// Build a filter, dropping repeated tags and keeping first occurrences.
    pub fn new<I>(tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ActionTag>,
    {
        let mut unique: Vec<ActionTag> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        Self {
            tags: Arc::from(unique),
        }
    }

    /// Whether the action carries one of the tags.
    #[must_use]
    pub fn matches<A: Action>(&self, action: &A) -> bool {
        self.tags.iter().any(|tag| tag.matches(action))
    }

    /// The tags, in first-seen order.
    #[must_use]
    pub fn tags(&self) -> &[ActionTag] {
        &self.tags
    }
}

fn construct_typed<P, A, T>(props: P) -> A
where
    T: TypedAction + From<P>,
    A: From<T>,
{
    A::from(T::from(props))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Load,
        Loaded { items: Vec<String> },
        Renamed { name: String },
    }

    impl Action for TestAction {
        fn action_type(&self) -> &str {
            match self {
                Self::Load => "[Test] Load",
                Self::Loaded { .. } => "[Test] Loaded",
                Self::Renamed { .. } => RenameAction::TYPE,
            }
        }
    }

    struct RenameAction {
        name: String,
    }

    impl TypedAction for RenameAction {
        const TYPE: &'static str = "[Test] Renamed";
    }

    impl From<String> for RenameAction {
        fn from(name: String) -> Self {
            Self { name }
        }
    }

    impl From<RenameAction> for TestAction {
        fn from(action: RenameAction) -> Self {
            Self::Renamed { name: action.name }
        }
    }

    #[test]
    fn test_creator_builds_action_with_payload() {
        let loaded = create_action("[Test] Loaded", |items: Vec<String>| TestAction::Loaded {
            items,
        });

        let action = loaded.create(vec!["a".to_string()]);

        assert_eq!(action.action_type(), "[Test] Loaded");
        assert_eq!(
            action,
            TestAction::Loaded {
                items: vec!["a".to_string()]
            }
        );
    }

    #[test]
    fn test_descriptor_from_creator_and_type_agree_on_shape() {
        let creator: ActionDescriptor<(), TestAction> =
            create_action("[Test] Load", |()| TestAction::Load).into();
        let typed: ActionDescriptor<String, TestAction> = ActionDescriptor::of_type::<RenameAction>();

        assert_eq!(creator.tag().as_str(), "[Test] Load");
        assert_eq!(creator.build(()), TestAction::Load);

        assert_eq!(typed.tag(), ActionTag::of::<RenameAction>());
        assert_eq!(
            typed.build("new".to_string()),
            TestAction::Renamed {
                name: "new".to_string()
            }
        );
    }

    #[test]
    fn test_tags_normalize_from_every_source() {
        let creator = create_action("[Test] Load", |()| TestAction::Load);

        let tags = [
            ActionTag::from("[Test] Load"),
            ActionTag::from(&creator),
            ActionTag::from("[Test] Load".to_string()),
        ];

        assert!(tags.iter().all(|tag| tag.matches(&TestAction::Load)));
        assert!(!ActionTag::of::<RenameAction>().matches(&TestAction::Load));
    }

    #[test]
    fn test_filter_dedupes_and_ors_tags() {
        let filter = ActionFilter::new([
            ActionTag::from("[Test] Load"),
            ActionTag::of::<RenameAction>(),
            ActionTag::from("[Test] Load"),
        ]);

        assert_eq!(filter.tags().len(), 2);
        assert!(filter.matches(&TestAction::Load));
        assert!(filter.matches(&TestAction::Renamed {
            name: "x".to_string()
        }));
        assert!(!filter.matches(&TestAction::Loaded { items: vec![] }));
    }
}
