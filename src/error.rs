//! Errors produced by a [Store](crate::Store) and its reducers.

use thiserror::Error;

/// Failure reported by a [Reducer](crate::Reducer) while computing a
/// partial state update.
#[derive(Error, Debug)]
pub enum ReducerError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("state key not found: {0}")]
    MissingKey(String),

    #[error("failed to decode value: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

/// Errors produced by a [Store](crate::Store).
#[derive(Error, Debug)]
pub enum StoreError {
    /// No reducer was registered for the dispatched action identifier.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The reducer for `action` failed. The state was not modified.
    #[error("reducer for action {action} failed: {source}")]
    Reducer {
        action: String,
        #[source]
        source: ReducerError,
    },

    /// Registration was refused because the store is configured to
    /// reject action identifiers which are already registered.
    #[error("action(s) already registered: {}", .0.join(", "))]
    ActionCollision(Vec<String>),

    /// Initial slice state could not be converted into a state map.
    #[error("slice state must serialize to a map, got: {0}")]
    NotAMap(String),

    #[error("failed to encode slice state: {0}")]
    Encode(#[from] serde_json::Error),

    /// One or more listeners panicked while being notified of the
    /// state produced by `action`. The state change was committed and
    /// every other listener was notified.
    #[error("{count} listener(s) panicked during notification of action {action}")]
    ListenerPanicked { action: String, count: usize },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
