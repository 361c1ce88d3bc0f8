//! Error types shared by accessors, stores and the mock synthesizer.

use thiserror::Error;

/// Errors surfaced when a bound accessor talks to its store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The service was built with placeholder collaborators
    ///
    /// Returned by the detached store used when synthesizing mocks.
    #[error("Store handle is detached")]
    Detached,

    /// Every owner of the store has dropped it
    #[error("Store has been dropped")]
    StoreDropped,

    /// Store is shutting down and not accepting new actions
    #[error("Store is shutting down")]
    ShutdownInProgress,

    /// Shutdown timed out waiting for effects to complete
    #[error("Shutdown timed out with {0} effects still running")]
    ShutdownTimeout(usize),

    /// Timed out waiting for a matching action
    #[error("Timeout waiting for action")]
    Timeout,

    /// The action broadcast channel closed while waiting
    #[error("Action broadcast channel closed")]
    ChannelClosed,

    /// A reducer panicked while holding the state lock
    #[error("Store state lock poisoned")]
    StatePoisoned,
}

/// Errors raised while replacing members with test doubles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    /// The initial value supplied for a member has the wrong type
    #[error("Initial value for `{member}` is not a `{expected}`")]
    InitialValueType {
        /// Member name
        member: String,
        /// Type the member's cell holds
        expected: &'static str,
    },
}
