use crate::{
    binding::{Binding, Dispatcher},
    config::StoreConfig,
    error::{Result, StoreError},
    listener::ListenerRegistry,
    reducer::ActionTable,
    state::StateContainer,
    Callback, GlobalState, Reducers, Slice, StateMap, Subscription, Value,
};
use std::ops::Deref;
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

/// A wrapper for an [Rc] reference to a [Store].
///
/// This is the handle an application passes to its consumers: cloning
/// it is cheap, and every clone refers to the same store.
#[derive(Clone)]
pub struct StoreRef(Rc<Store>);

impl StoreRef {
    pub fn new() -> Self {
        Self(Rc::new(Store::new()))
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self(Rc::new(Store::with_config(config)))
    }

    /// The current state and a [Dispatcher] for this store, without
    /// registering any listener. For consumers which only dispatch, or
    /// which read the state once. Consumers which need to be notified
    /// of changes should use a [Binding] (see [StoreRef::binding()]).
    pub fn bind(&self) -> (Rc<GlobalState>, Dispatcher) {
        (self.state(), Dispatcher::new(self.clone()))
    }

    /// Create a [Binding] for a consumer of this store, which is
    /// notified via `on_update` while listening.
    pub fn binding<C: Into<Callback>>(&self, on_update: C) -> Binding {
        Binding::new(self, on_update)
    }
}

impl Default for StoreRef {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for StoreRef {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for StoreRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// This struct is designed to operate as a central source of truth
/// and global "immutable" state within your application, assembled
/// from any number of independently initialized [Slice]s.
///
/// The current state of this store ([Store::state()]) can only be
/// modified by dispatching an action via [Store::dispatch()]. The
/// [Reducer](crate::Reducer) registered for the action's identifier
/// produces a partial state, which is shallow-merged into a new
/// current state. The previous state is never mutated, and remains
/// valid for any part of your application still holding it.
///
/// Listeners subscribe with [Store::subscribe()] and are notified,
/// synchronously and in subscription order, after every dispatch.
///
/// The store is single threaded. No internal borrow is held while a
/// reducer or listener runs, so these may call back into the store:
/// a listener may subscribe, unsubscribe or dispatch.
pub struct Store {
    config: StoreConfig,
    /// The current state of this store.
    state: RefCell<StateContainer>,
    /// Reducers registered by [Store::init_store()], by action
    /// identifier.
    actions: RefCell<ActionTable>,
    /// The listeners which are notified of changes to the state of
    /// this store during a [Store::dispatch()].
    listeners: ListenerRegistry,
    dispatch_count: Cell<u64>,
}

impl Store {
    /// Create a new, empty [Store] with the default [StoreConfig].
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            state: RefCell::new(StateContainer::default()),
            actions: RefCell::new(ActionTable::default()),
            listeners: ListenerRegistry::default(),
            dispatch_count: Cell::new(0),
        }
    }

    /// Get the current [GlobalState] stored in this store.
    ///
    /// Modifications to this state need to be performed by
    /// dispatching an action to the store using
    /// [dispatch()](Store::dispatch()).
    pub fn state(&self) -> Rc<GlobalState> {
        self.state.borrow().read()
    }

    /// Merge a slice's `initial_state` (if any) into the current
    /// state, and register its `reducers`.
    ///
    /// May be called any number of times, once per slice. Keys and
    /// action identifiers which were already present are overwritten
    /// (with a logged warning), unless the store was configured with
    /// [StoreConfig::reject_collisions()], in which case colliding
    /// reducers fail the whole call before anything is applied.
    ///
    /// Listeners are not notified.
    pub fn init_store(&self, reducers: Reducers, initial_state: Option<StateMap>) -> Result<()> {
        let mut actions = self.actions.borrow_mut();

        let collisions = actions.collisions(&reducers);
        if !collisions.is_empty() {
            if self.config.reject_collisions {
                return Err(StoreError::ActionCollision(collisions));
            }
            log::warn!("replacing reducers for actions: {}", collisions.join(", "));
        }

        if let Some(initial_state) = initial_state {
            let mut state = self.state.borrow_mut();
            let current = state.read();
            let overwritten: Vec<&str> = initial_state
                .keys()
                .map(String::as_str)
                .filter(|key| current.contains_key(key))
                .collect();
            if !overwritten.is_empty() {
                log::warn!("overwriting state keys: {}", overwritten.join(", "));
            }
            state.merge(&initial_state);
        }

        actions.register(reducers);
        Ok(())
    }

    /// [Store::init_store()] for a [Slice].
    pub fn init_slice(&self, slice: Slice) -> Result<()> {
        log::info!(
            "initializing slice {} with actions {:?}",
            slice.name,
            slice.reducers
        );
        self.init_store(slice.reducers, slice.initial_state)
    }

    /// Dispatch the action `identifier` with `payload` to its
    /// registered [Reducer](crate::Reducer), merge the resulting
    /// partial state into the current state, and notify the listeners
    /// with the new state.
    ///
    /// Listeners are notified in subscription order, from a snapshot
    /// of the listeners taken after the merge. Changes to the
    /// subscriptions made by a listener take effect from the next
    /// dispatch. All listeners have been notified when this returns.
    ///
    /// Fails with [StoreError::UnknownAction] or [StoreError::Reducer]
    /// without modifying the state or notifying anyone.
    pub fn dispatch<I, P>(&self, identifier: I, payload: P) -> Result<()>
    where
        I: AsRef<str>,
        P: Into<Value>,
    {
        self.dispatch_impl(identifier.as_ref(), payload.into())
    }

    /// Concrete version of [Store::dispatch()], to avoid generating a
    /// copy of this function per identifier and payload type.
    fn dispatch_impl(&self, identifier: &str, payload: Value) -> Result<()> {
        // the table borrow must end before the reducer runs
        let reducer = self.actions.borrow().resolve(identifier)?;

        let prev_state = self.state();
        let partial = reducer
            .reduce(&prev_state, &payload)
            .map_err(|source| StoreError::Reducer {
                action: identifier.to_string(),
                source,
            })?;

        let log_level = self.config.log_level;
        if log_level.enabled() {
            log_level.log(format!("prev state: {:?}", prev_state));
            log_level.log(format!("action: {} {}", identifier, payload));
        }

        let next_state = self.state.borrow_mut().merge(&partial);
        self.dispatch_count.set(self.dispatch_count.get() + 1);

        if log_level.enabled() {
            log_level.log(format!("next state: {:?}", next_state));
        }

        self.notify_listeners(identifier, &partial, next_state)
    }

    /// Notify a snapshot of the store listeners of the state produced
    /// by the action `identifier`.
    fn notify_listeners(
        &self,
        identifier: &str,
        partial: &StateMap,
        state: Rc<GlobalState>,
    ) -> Result<()> {
        let mut panicked = 0;

        for entry in self.listeners.snapshot() {
            if !entry.is_interested(partial) {
                continue;
            }

            if self.config.isolate_listener_faults {
                let callback = &entry.callback;
                let state = state.clone();
                if panic::catch_unwind(AssertUnwindSafe(|| callback.emit(state))).is_err() {
                    log::error!(
                        "listener {:?} panicked during notification of action {}",
                        callback,
                        identifier
                    );
                    panicked += 1;
                }
            } else {
                entry.callback.emit(state.clone());
            }
        }

        if panicked > 0 {
            Err(StoreError::ListenerPanicked {
                action: identifier.to_string(),
                count: panicked,
            })
        } else {
            Ok(())
        }
    }

    /// Subscribe a [Callback] to changes in the store state, produced
    /// by `Action`s dispatched via [dispatch()](Store::dispatch()).
    ///
    /// The same callback may be subscribed more than once, and is then
    /// notified once per subscription. The listener stays subscribed
    /// until the returned [Subscription] is dropped, or the callback is
    /// removed with [Store::unsubscribe()].
    pub fn subscribe(&self, callback: &Callback) -> Subscription {
        self.listeners.subscribe(callback, None)
    }

    /// Subscribe a [Callback] to changes in the store state, only
    /// notifying it of dispatches whose reducer returned at least one
    /// of the specified state `keys`.
    pub fn subscribe_keys<K, I>(&self, callback: &Callback, keys: I) -> Subscription
    where
        K: Into<String>,
        I: IntoIterator<Item = K>,
    {
        let keys: HashSet<String> = keys.into_iter().map(Into::into).collect();
        self.listeners.subscribe(callback, Some(keys))
    }

    /// Remove every subscription of `callback`, returning how many
    /// were removed.
    pub fn unsubscribe(&self, callback: &Callback) -> usize {
        self.listeners.unsubscribe(callback)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn has_action(&self, identifier: &str) -> bool {
        self.actions.borrow().contains(identifier)
    }

    /// Identifiers of all registered actions, in registration order.
    pub fn actions(&self) -> Vec<String> {
        self.actions.borrow().identifiers()
    }

    /// Number of dispatches which have modified the state.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count.get()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
