use crate::{GlobalState, StateMap};
use std::{
    cell::RefCell,
    collections::HashSet,
    fmt::Debug,
    mem,
    rc::{Rc, Weak},
};

/// A wrapper for a callback which is notified with the new
/// [GlobalState] after every [Store::dispatch()](crate::Store::dispatch()).
///
/// Callbacks are compared by identity: two `Callback`s are equal only
/// if one is a clone of the other, regardless of what the wrapped
/// closures do.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(Rc<GlobalState>)>);

impl Callback {
    pub fn new<C: Fn(Rc<GlobalState>) + 'static>(closure: C) -> Self {
        Callback(Rc::new(closure))
    }

    pub fn emit(&self, state: Rc<GlobalState>) {
        (self.0)(state)
    }

    fn address(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for Callback {}

impl Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callback(@ {:p})", self.address())
    }
}

impl<C> From<C> for Callback
where
    C: Fn(Rc<GlobalState>) + 'static,
{
    fn from(closure: C) -> Self {
        Callback(Rc::new(closure))
    }
}

/// Identifies a single entry in a [ListenerRegistry].
type EntryId = u64;

/// A [Callback] registered with a store, optionally restricted to a
/// set of state keys it is interested in.
#[derive(Clone, Debug)]
pub(crate) struct ListenerEntry {
    id: EntryId,
    pub callback: Callback,
    keys: Option<HashSet<String>>,
}

impl ListenerEntry {
    /// Whether this entry should be notified of a dispatch which
    /// produced the `partial` state.
    pub fn is_interested(&self, partial: &StateMap) -> bool {
        match &self.keys {
            None => true,
            Some(keys) => partial.keys().any(|key| keys.contains(key)),
        }
    }
}

#[derive(Default)]
struct Entries {
    next_id: EntryId,
    entries: Vec<ListenerEntry>,
}

/// The ordered collection of listeners registered with a store.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    inner: Rc<RefCell<Entries>>,
}

impl ListenerRegistry {
    pub fn subscribe(&self, callback: &Callback, keys: Option<HashSet<String>>) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(ListenerEntry {
            id,
            callback: callback.clone(),
            keys,
        });

        Subscription {
            registry: Rc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Remove every entry holding `callback`, returns how many were
    /// removed.
    pub fn unsubscribe(&self, callback: &Callback) -> usize {
        // removed entries are dropped after the borrow ends, dropping a
        // callback may drop subscriptions it owns
        let removed: Vec<ListenerEntry> = {
            let mut inner = self.inner.borrow_mut();
            let (removed, kept) = mem::take(&mut inner.entries)
                .into_iter()
                .partition(|entry| entry.callback == *callback);
            inner.entries = kept;
            removed
        };
        removed.len()
    }

    /// The entries at the time of the call. Later subscribes or
    /// unsubscribes do not affect the returned list.
    pub fn snapshot(&self) -> Vec<ListenerEntry> {
        self.inner.borrow().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// A handle to a single listener registration, returned by
/// [Store::subscribe()](crate::Store::subscribe()).
///
/// Dropping the `Subscription` removes the registration it refers to
/// (and only that one, other registrations of the same [Callback] are
/// kept). A subscription does not keep its store alive.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    registry: Weak<RefCell<Entries>>,
    id: Option<EntryId>,
}

impl Subscription {
    /// Whether the registration still exists in the store.
    pub fn is_active(&self) -> bool {
        match (self.id, self.registry.upgrade()) {
            (Some(id), Some(registry)) => registry
                .borrow()
                .entries
                .iter()
                .any(|entry| entry.id == id),
            _ => false,
        }
    }

    /// Remove the registration now. Same as dropping the subscription.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Give up this handle without removing the registration; the
    /// listener stays registered until removed with
    /// [Store::unsubscribe()](crate::Store::unsubscribe()).
    pub fn detach(mut self) {
        self.id = None;
    }

    fn release(&mut self) {
        if let (Some(id), Some(registry)) = (self.id.take(), self.registry.upgrade()) {
            // a listener may be dropped from inside a callback while the
            // store is mid-notification, the registry is not borrowed then.
            let removed = {
                let mut inner = registry.borrow_mut();
                let index = inner.entries.iter().position(|entry| entry.id == id);
                let removed = index.map(|index| inner.entries.remove(index));
                removed
            };
            // the entry may hold the last clone of its callback, which may
            // own further subscriptions to this registry
            drop(removed);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Callback, ListenerRegistry};
    use crate::{GlobalState, StateMap};
    use serde_json::json;
    use std::{cell::RefCell, collections::HashSet, rc::Rc};

    fn counting_callback() -> (Callback, Rc<RefCell<u32>>) {
        let calls = Rc::new(RefCell::new(0));
        let calls_copy = calls.clone();
        let callback = Callback::new(move |_| {
            *calls_copy.borrow_mut() += 1;
        });
        (callback, calls)
    }

    #[test]
    fn callback_identity() {
        let a = Callback::new(|_| {});
        let b = Callback::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn duplicates_and_unsubscribe() {
        let registry = ListenerRegistry::default();
        let (a, _) = counting_callback();
        let (b, _) = counting_callback();

        registry.subscribe(&a, None).detach();
        registry.subscribe(&b, None).detach();
        registry.subscribe(&a, None).detach();
        assert_eq!(registry.len(), 3);

        assert_eq!(registry.unsubscribe(&a), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].callback, b);
        assert_eq!(registry.unsubscribe(&a), 0);
    }

    #[test]
    fn dropping_subscription_removes_only_its_entry() {
        let registry = ListenerRegistry::default();
        let (a, _) = counting_callback();

        let first = registry.subscribe(&a, None);
        let second = registry.subscribe(&a, None);
        assert!(first.is_active());

        drop(first);
        assert_eq!(registry.len(), 1);
        assert!(second.is_active());

        second.unsubscribe();
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn dropping_callback_owning_subscription() {
        let registry = ListenerRegistry::default();
        let (child, _) = counting_callback();
        let child_subscription = registry.subscribe(&child, None);

        // the registry holds the only clone of the parent callback, which
        // owns the child's subscription
        let parent = registry.subscribe(
            &Callback::new(move |_| {
                let _ = &child_subscription;
            }),
            None,
        );
        assert_eq!(registry.len(), 2);

        drop(parent);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn unsubscribe_callback_owning_subscription() {
        let registry = ListenerRegistry::default();
        let (child, _) = counting_callback();
        let child_subscription = registry.subscribe(&child, None);

        let parent = Callback::new(move |_| {
            let _ = &child_subscription;
        });
        registry.subscribe(&parent, None).detach();

        assert_eq!(registry.unsubscribe(&parent), 1);
        drop(parent);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn subscription_outlives_registry() {
        let registry = ListenerRegistry::default();
        let (a, _) = counting_callback();
        let subscription = registry.subscribe(&a, None);
        drop(registry);
        assert!(!subscription.is_active());
        drop(subscription);
    }

    #[test]
    fn snapshot_is_decoupled() {
        let registry = ListenerRegistry::default();
        let (a, calls) = counting_callback();
        let subscription = registry.subscribe(&a, None);

        let snapshot = registry.snapshot();
        drop(subscription);
        assert_eq!(registry.len(), 0);
        assert_eq!(snapshot.len(), 1);

        snapshot[0].callback.emit(Rc::new(GlobalState::new()));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn interest_keys() {
        let registry = ListenerRegistry::default();
        let (a, _) = counting_callback();
        let keys: HashSet<String> = vec!["count".to_string()].into_iter().collect();
        let _subscription = registry.subscribe(&a, Some(keys));

        let snapshot = registry.snapshot();
        let entry = &snapshot[0];
        let mut partial = StateMap::new();
        partial.insert("other".to_string(), json!(1));
        assert!(!entry.is_interested(&partial));
        partial.insert("count".to_string(), json!(1));
        assert!(entry.is_interested(&partial));
    }
}
