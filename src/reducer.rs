use crate::{
    error::{ReducerError, Result, StoreError},
    GlobalState, StateMap, Value,
};
use indexmap::IndexMap;
use std::{fmt::Debug, rc::Rc};

/// Using the [reduce()](Reducer::reduce()) method, implementors of
/// this trait take the payload of an action submitted to a store via
/// [Store::dispatch()](crate::Store::dispatch()) and produce the
/// subset of the state which the action changes.
pub trait Reducer {
    /// Take the `payload` of a dispatched action and the `state` at
    /// the time of dispatch, and produce a partial state containing
    /// only the keys to be changed. The store merges the partial
    /// state into a new [GlobalState]; `state` itself is never
    /// modified.
    ///
    /// Returning an error aborts the dispatch, leaving the store state
    /// unchanged and the listeners un-notified.
    fn reduce(&self, state: &GlobalState, payload: &Value) -> ReducerResult;
}

/// The result of a [Reducer::reduce()] function.
pub type ReducerResult = std::result::Result<StateMap, ReducerError>;

impl<F> Reducer for F
where
    F: Fn(&GlobalState, &Value) -> ReducerResult,
{
    fn reduce(&self, state: &GlobalState, payload: &Value) -> ReducerResult {
        (self)(state, payload)
    }
}

/// An ordered set of [Reducer]s keyed by action identifier, as
/// contributed by a single slice.
#[derive(Clone, Default)]
pub struct Reducers {
    entries: IndexMap<String, Rc<dyn Reducer>>,
}

impl Reducers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reducer function for the action `identifier`. A later
    /// reducer with the same identifier replaces an earlier one.
    pub fn on<I, F>(self, identifier: I, reducer: F) -> Self
    where
        I: Into<String>,
        F: Fn(&GlobalState, &Value) -> ReducerResult + 'static,
    {
        self.on_reducer(identifier, reducer)
    }

    /// Same as [Reducers::on()], for any [Reducer] implementation.
    pub fn on_reducer<I, R>(mut self, identifier: I, reducer: R) -> Self
    where
        I: Into<String>,
        R: Reducer + 'static,
    {
        self.entries.insert(identifier.into(), Rc::new(reducer));
        self
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Debug for Reducers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// One module's contribution to a [Store](crate::Store): its reducers
/// and (optionally) its initial state.
#[derive(Debug, Clone)]
pub struct Slice {
    pub name: String,
    pub reducers: Reducers,
    pub initial_state: Option<StateMap>,
}

impl Slice {
    pub fn new<N: Into<String>>(name: N, reducers: Reducers) -> Self {
        Self {
            name: name.into(),
            reducers,
            initial_state: None,
        }
    }

    pub fn initial_state(mut self, initial_state: StateMap) -> Self {
        self.initial_state = Some(initial_state);
        self
    }
}

/// The mapping from action identifier to [Reducer] held by a
/// [Store](crate::Store).
#[derive(Default)]
pub(crate) struct ActionTable {
    reducers: IndexMap<String, Rc<dyn Reducer>>,
}

impl ActionTable {
    /// Identifiers in `reducers` which are already registered.
    pub fn collisions(&self, reducers: &Reducers) -> Vec<String> {
        reducers
            .identifiers()
            .filter(|identifier| self.reducers.contains_key(*identifier))
            .map(String::from)
            .collect()
    }

    /// Add all of `reducers`, replacing existing registrations with
    /// the same identifier. Returns the replaced identifiers.
    pub fn register(&mut self, reducers: Reducers) -> Vec<String> {
        let mut replaced = Vec::new();
        for (identifier, reducer) in reducers.entries {
            if self.reducers.insert(identifier.clone(), reducer).is_some() {
                replaced.push(identifier);
            }
        }
        replaced
    }

    pub fn resolve(&self, identifier: &str) -> Result<Rc<dyn Reducer>> {
        self.reducers
            .get(identifier)
            .cloned()
            .ok_or_else(|| StoreError::UnknownAction(identifier.to_string()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.reducers.contains_key(identifier)
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.reducers.keys().cloned().collect()
    }
}
