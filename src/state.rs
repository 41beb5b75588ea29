use crate::error::{Result, StoreError};
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Serialize};
use std::rc::Rc;

/// An arbitrary value held under a key of the [GlobalState], and the
/// payload type accepted by [Store::dispatch()](crate::Store::dispatch()).
pub type Value = serde_json::Value;

/// An insertion ordered mapping from state key to [Value]. Used for
/// slice initial state and for the partial state returned by a
/// [Reducer](crate::Reducer).
pub type StateMap = IndexMap<String, Value>;

/// Convert a serializable slice state (usually a struct) into a
/// [StateMap]. The value must serialize to a map/object.
pub fn state_map_from<T: Serialize>(value: &T) -> Result<StateMap> {
    match serde_json::to_value(value)? {
        Value::Object(object) => Ok(object.into_iter().collect()),
        other => Err(StoreError::NotAMap(other.to_string())),
    }
}

/// A snapshot of the state held in a [Store](crate::Store): the union
/// of the state contributed by every slice.
///
/// A `GlobalState` is never modified once it has been handed out by the
/// store. Each dispatch produces a new snapshot (see
/// [GlobalState::merge()]), so a previously obtained `Rc<GlobalState>`
/// keeps describing the state as it was when it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GlobalState {
    entries: StateMap,
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge of this state with `partial`: keys only in `self`
    /// are preserved, keys in `partial` are added or overwritten.
    /// Existing keys keep their original position.
    pub fn merge(&self, partial: &StateMap) -> Self {
        let mut entries = self.entries.clone();
        for (key, value) in partial {
            entries.insert(key.clone(), value.clone());
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Decode the value stored under `key` into `T`. Returns `None` if
    /// the key is absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<serde_json::Result<T>> {
        self.entries
            .get(key)
            .map(|value| T::deserialize(value))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy the entries of this snapshot into a new [StateMap].
    pub fn to_map(&self) -> StateMap {
        self.entries.clone()
    }
}

impl From<StateMap> for GlobalState {
    fn from(entries: StateMap) -> Self {
        Self { entries }
    }
}

/// Owner of the current [GlobalState] snapshot within a
/// [Store](crate::Store).
#[derive(Debug, Default)]
pub(crate) struct StateContainer {
    current: Rc<GlobalState>,
}

impl StateContainer {
    pub fn read(&self) -> Rc<GlobalState> {
        self.current.clone()
    }

    /// Install `{...current, ...partial}` as the current state, and
    /// return it.
    pub fn merge(&mut self, partial: &StateMap) -> Rc<GlobalState> {
        self.current = Rc::new(self.current.merge(partial));
        self.current.clone()
    }
}
