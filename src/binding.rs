//! Integration of consumers (usually UI components) with a
//! [Store](crate::Store).
//!
//! A consumer creates one [Binding] when it is created, calls
//! [Binding::bind()] every time it is activated (rendered/updated),
//! and drops the [Binding] when it is destroyed. While listening, the
//! consumer's update callback is registered with the store exactly
//! once, no matter how many times it is bound.

use crate::{error::Result, Callback, GlobalState, StoreRef, Subscription, Value};
use std::{fmt::Debug, rc::Rc};

/// A handle used by consumers to dispatch actions to a
/// [Store](crate::Store).
#[derive(Clone)]
pub struct Dispatcher {
    store: StoreRef,
}

impl Dispatcher {
    pub fn new(store: StoreRef) -> Self {
        Self { store }
    }

    /// See [Store::dispatch()](crate::Store::dispatch()).
    pub fn dispatch<I, P>(&self, identifier: I, payload: P) -> Result<()>
    where
        I: AsRef<str>,
        P: Into<Value>,
    {
        self.store.dispatch(identifier, payload)
    }

    pub fn store(&self) -> &StoreRef {
        &self.store
    }
}

impl PartialEq for Dispatcher {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
    }
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dispatcher(store @ {:p})", &*self.store)
    }
}

/// One consumer's connection to a [Store](crate::Store).
pub struct Binding {
    store: StoreRef,
    on_update: Callback,
    subscription: Option<Subscription>,
}

impl Binding {
    /// Create a binding for a consumer, which will be notified via
    /// `on_update` with the new state after every dispatch while it is
    /// listening. No listener is registered until [Binding::bind()] is
    /// called with `should_listen == true`.
    pub fn new<C: Into<Callback>>(store: &StoreRef, on_update: C) -> Self {
        Self {
            store: store.clone(),
            on_update: on_update.into(),
            subscription: None,
        }
    }

    /// Called on each activation of the consumer. Returns the current
    /// state and a [Dispatcher].
    ///
    /// With `should_listen == true` the update callback is registered
    /// with the store, unless it is already registered by this
    /// binding. With `should_listen == false` any registration made by
    /// a previous activation is removed, and the consumer is not
    /// notified of changes.
    pub fn bind(&mut self, should_listen: bool) -> (Rc<GlobalState>, Dispatcher) {
        if should_listen {
            if !self.is_listening() {
                self.subscription = Some(self.store.subscribe(&self.on_update));
            }
        } else {
            self.subscription = None;
        }

        (self.store.state(), Dispatcher::new(self.store.clone()))
    }

    /// Shorthand for `bind(true)`.
    pub fn activate(&mut self) -> (Rc<GlobalState>, Dispatcher) {
        self.bind(true)
    }

    /// Stop listening, without destroying the binding. Dropping the
    /// binding has the same effect.
    pub fn deactivate(&mut self) {
        self.subscription = None;
    }

    pub fn is_listening(&self) -> bool {
        self.subscription
            .as_ref()
            .map_or(false, Subscription::is_active)
    }

    pub fn callback(&self) -> &Callback {
        &self.on_update
    }

    pub fn store(&self) -> &StoreRef {
        &self.store
    }
}

impl Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("on_update", &self.on_update)
            .field("subscription", &self.subscription)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Binding;
    use crate::{state_map_from, GlobalState, Reducers, StoreRef, Value};
    use serde_json::json;
    use std::{cell::RefCell, rc::Rc};

    fn store() -> StoreRef {
        let store = StoreRef::new();
        store
            .init_store(
                Reducers::new().on("INCREMENT", |state, payload| {
                    let count = state.get("count").and_then(Value::as_i64).unwrap_or(0);
                    let by = payload.as_i64().unwrap_or(1);
                    Ok(state_map_from(&json!({ "count": count + by })).unwrap())
                }),
                Some(state_map_from(&json!({ "count": 0 })).unwrap()),
            )
            .unwrap();
        store
    }

    /// A stand-in for a UI component which re-renders with the latest
    /// state whenever it is notified.
    struct Counter {
        binding: Binding,
        renders: Rc<RefCell<Vec<Option<i64>>>>,
    }

    impl Counter {
        fn new(store: &StoreRef) -> Self {
            let renders = Rc::new(RefCell::new(Vec::new()));
            let renders_copy = renders.clone();
            let binding = store.binding(move |state: Rc<GlobalState>| {
                renders_copy
                    .borrow_mut()
                    .push(state.get("count").and_then(Value::as_i64));
            });
            Self { binding, renders }
        }
    }

    #[test]
    fn bind_listening() {
        let store = store();
        let mut counter = Counter::new(&store);

        let (state, dispatch) = counter.binding.bind(true);
        assert_eq!(state.get("count"), Some(&json!(0)));
        assert!(counter.binding.is_listening());

        dispatch.dispatch("INCREMENT", 5).unwrap();
        assert_eq!(*counter.renders.borrow(), vec![Some(5)]);
    }

    #[test]
    fn rebinding_does_not_duplicate() {
        let store = store();
        let mut counter = Counter::new(&store);

        counter.binding.bind(true);
        counter.binding.bind(true);
        counter.binding.activate();
        assert_eq!(store.listener_count(), 1);

        store.dispatch("INCREMENT", 1).unwrap();
        assert_eq!(counter.renders.borrow().len(), 1);
    }

    #[test]
    fn write_only_binding() {
        let store = store();
        let mut writer = Counter::new(&store);
        let mut reader = Counter::new(&store);
        reader.binding.bind(true);

        let (_, dispatch) = writer.binding.bind(false);
        assert!(!writer.binding.is_listening());
        assert_eq!(store.listener_count(), 1);

        dispatch.dispatch("INCREMENT", 2).unwrap();
        assert!(writer.renders.borrow().is_empty());
        assert_eq!(*reader.renders.borrow(), vec![Some(2)]);

        let (_, store_dispatch) = store.bind();
        assert!(store_dispatch == dispatch);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn stop_listening() {
        let store = store();
        let mut counter = Counter::new(&store);

        counter.binding.bind(true);
        counter.binding.bind(false);
        assert_eq!(store.listener_count(), 0);
        store.dispatch("INCREMENT", 1).unwrap();
        assert!(counter.renders.borrow().is_empty());

        counter.binding.bind(true);
        counter.binding.deactivate();
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn drop_deregisters() {
        let store = store();
        let mut counter = Counter::new(&store);
        counter.binding.bind(true);
        assert_eq!(store.listener_count(), 1);

        drop(counter);
        assert_eq!(store.listener_count(), 0);
        store.dispatch("INCREMENT", 1).unwrap();
    }

    #[test]
    fn drop_parent_owning_child_binding() {
        let store = store();
        let mut child = Counter::new(&store);
        child.binding.bind(true);

        // the parent's update callback owns the child consumer
        let mut parent = store.binding(move |_: Rc<GlobalState>| {
            let _ = &child;
        });
        parent.bind(true);
        assert_eq!(store.listener_count(), 2);

        drop(parent);
        assert_eq!(store.listener_count(), 0);
        store.dispatch("INCREMENT", 1).unwrap();
    }

    #[test]
    fn rebinds_after_external_unsubscribe() {
        let store = store();
        let mut counter = Counter::new(&store);
        counter.binding.bind(true);

        assert_eq!(store.unsubscribe(counter.binding.callback()), 1);
        assert!(!counter.binding.is_listening());

        counter.binding.bind(true);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn deactivate_during_notification() {
        let store = store();
        let counter = Rc::new(RefCell::new(Counter::new(&store)));
        counter.borrow_mut().binding.bind(true);

        // another consumer which destroys the counter's listener when it
        // sees the count reach 1
        let counter_copy = counter.clone();
        let mut closer = store.binding(move |state: Rc<GlobalState>| {
            if state.get("count") == Some(&json!(1)) {
                counter_copy.borrow_mut().binding.deactivate();
            }
        });
        closer.bind(true);

        store.dispatch("INCREMENT", 1).unwrap();
        store.dispatch("INCREMENT", 1).unwrap();
        assert_eq!(*counter.borrow().renders.borrow(), vec![Some(1)]);
    }
}
