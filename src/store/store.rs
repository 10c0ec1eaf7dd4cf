use crate::error::Result;
use crate::value::State;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback = Box<dyn Fn() -> Result<()> + Send + Sync>;

struct Listener {
    id: u64,
    active: AtomicBool,
    callback: Callback,
}

struct Shared {
    state: RwLock<Arc<State>>,
    listeners: Mutex<Vec<Arc<Listener>>>,
    next_id: AtomicU64,
}

impl Shared {
    fn remove(&self, listener: &Listener) {
        if listener.active.swap(false, Ordering::SeqCst) {
            self.listeners.lock().retain(|l| l.id != listener.id);
            tracing::trace!(listener = listener.id, "unsubscribed");
        }
    }
}

/// A shared, synchronously notifying state container.
///
/// The store owns exactly one [`State`] record at a time. Writes build a new
/// record (the previous `Arc` handed out by [`Store::get_state`] is left
/// untouched) and then call every registered listener, in registration
/// order, before returning.
///
/// Cloning a store yields another handle to the same state and listeners.
///
/// # Examples
///
/// ```
/// use tether::{record, Store};
///
/// let store = Store::new(record! { "msg" => "hello", "count" => 0 });
/// store.set_state(record! { "count" => 1 }).unwrap();
///
/// let state = store.get_state();
/// assert_eq!(state.get("msg").and_then(|v| v.as_str()), Some("hello"));
/// assert_eq!(state.get("count").and_then(|v| v.as_int()), Some(1));
/// ```
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("listeners", &self.shared.listeners.lock().len())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Create a new store seeded with `initial`.
    pub fn new(initial: State) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(Arc::new(initial)),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// The current state. The same `Arc` is returned until the next write.
    pub fn get_state(&self) -> Arc<State> {
        Arc::clone(&self.shared.state.read())
    }

    /// Read state without cloning the handle.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&State) -> R,
    {
        let state = Arc::clone(&self.shared.state.read());
        f(&state)
    }

    /// Shallow-merge `partial` into the state and notify every listener.
    ///
    /// Fields missing from `partial` keep their current values. The first
    /// listener error stops the notification pass and is returned; the state
    /// change itself is not rolled back.
    pub fn set_state(&self, partial: State) -> Result<()> {
        {
            let mut state = self.shared.state.write();
            let next = state.merged(&partial);
            *state = Arc::new(next);
        }
        tracing::debug!(fields = partial.len(), "state merged");
        self.notify()
    }

    /// Replace the whole state and notify every listener.
    pub fn replace_state(&self, state: State) -> Result<()> {
        *self.shared.state.write() = Arc::new(state);
        tracing::debug!("state replaced");
        self.notify()
    }

    /// Register a listener, called with no arguments after every write.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let listener = Arc::new(Listener {
            id,
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });
        self.shared.listeners.lock().push(Arc::clone(&listener));
        tracing::trace!(listener = id, "subscribed");

        Subscription {
            listener,
            store: Arc::downgrade(&self.shared),
        }
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }

    /// Whether two handles point at the same store.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Notify all listeners of a state change.
    ///
    /// Works from a snapshot so listeners may subscribe, unsubscribe or write
    /// to the store while the pass is running. Listeners added mid-pass wait
    /// for the next write; listeners removed mid-pass are skipped if their
    /// turn has not come yet.
    fn notify(&self) -> Result<()> {
        let snapshot: Vec<Arc<Listener>> = self.shared.listeners.lock().clone();
        tracing::trace!(listeners = snapshot.len(), "notifying");
        for listener in snapshot {
            if listener.active.load(Ordering::SeqCst) {
                (listener.callback)()?;
            }
        }
        Ok(())
    }
}

/// Create a store seeded with `initial`.
pub fn create(initial: State) -> Store {
    Store::new(initial)
}

/// Handle to a registered listener.
///
/// Unsubscribing is idempotent; dropping the handle unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    listener: Arc<Listener>,
    store: Weak<Shared>,
}

impl Subscription {
    /// Remove the listener from the store. Further calls do nothing.
    pub fn unsubscribe(&self) {
        match self.store.upgrade() {
            Some(shared) => shared.remove(&self.listener),
            None => self.listener.active.store(false, Ordering::SeqCst),
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.listener.active.load(Ordering::SeqCst)
    }

    /// Keep the listener registered for the lifetime of the store.
    pub fn detach(self) {
        std::mem::forget(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Result<()> + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        (count, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn set_state_merges_shallowly() {
        let store = Store::new(record! { "msg" => "hello", "count" => 0 });

        store.set_state(record! { "msg" => "halo" }).unwrap();

        let state = store.get_state();
        assert_eq!(state.get("msg").and_then(|v| v.as_str()), Some("halo"));
        assert_eq!(state.get("count").and_then(|v| v.as_int()), Some(0));
    }

    #[test]
    fn writes_produce_a_new_state_value() {
        let store = Store::new(record! { "count" => 0 });
        let before = store.get_state();
        assert!(Arc::ptr_eq(&before, &store.get_state()));

        store.set_state(record! { "count" => 1 }).unwrap();

        assert!(!Arc::ptr_eq(&before, &store.get_state()));
        assert_eq!(before.get("count").and_then(|v| v.as_int()), Some(0));
    }

    #[test]
    fn replace_state_drops_missing_fields() {
        let store = Store::new(record! { "a" => 1, "b" => 2 });
        store.replace_state(record! { "a" => 3 }).unwrap();
        assert_eq!(store.read(|s| s.len()), 1);
    }

    #[test]
    fn store_subscribe() {
        let store = Store::new(record! { "count" => 0 });
        let (calls, listener) = counter();
        let _sub = store.subscribe(listener);

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        store.set_state(record! { "count" => 1 }).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        store.set_state(record! { "count" => 2 }).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let store = Store::new(State::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = order.clone();
                store.subscribe(move || {
                    order.lock().push(i);
                    Ok(())
                })
            })
            .collect();

        store.set_state(State::new()).unwrap();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let store = Store::new(State::new());
        let (calls, listener) = counter();
        let sub = store.subscribe(listener);
        let (_other_calls, other) = counter();
        let _other = store.subscribe(other);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(store.subscriber_count(), 1);

        store.set_state(State::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let store = Store::new(State::new());
        let (calls, listener) = counter();
        drop(store.subscribe(listener));

        store.set_state(State::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn detached_listener_stays_registered() {
        let store = Store::new(State::new());
        let (calls, listener) = counter();
        store.subscribe(listener).detach();

        store.set_state(State::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_during_notification_skips_pending_listener() {
        let store = Store::new(State::new());
        let second: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = second.clone();
        let _first = store.subscribe(move || {
            if let Some(sub) = slot.lock().as_ref() {
                sub.unsubscribe();
            }
            Ok(())
        });
        let (calls, listener) = counter();
        *second.lock() = Some(store.subscribe(listener));

        store.set_state(State::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn self_unsubscribe_finishes_running_listener() {
        let store = Store::new(State::new());
        let own: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let runs = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let slot = own.clone();
        let runs_clone = runs.clone();
        let finished_clone = finished.clone();
        *own.lock() = Some(store.subscribe(move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = slot.lock().as_ref() {
                sub.unsubscribe();
            }
            finished_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        let (later_calls, later) = counter();
        let _later = store.subscribe(later);

        store.set_state(State::new()).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 1);

        store.set_state(State::new()).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_added_during_notification_waits_for_next_write() {
        let store = Store::new(State::new());
        let (calls, listener) = counter();
        let listener = Arc::new(listener);
        let added: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

        let inner_store = store.clone();
        let added_clone = added.clone();
        let _adder = store.subscribe(move || {
            let listener = listener.clone();
            if added_clone.lock().is_empty() {
                let sub = inner_store.subscribe(move || (listener.as_ref())());
                added_clone.lock().push(sub);
            }
            Ok(())
        });

        store.set_state(State::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        store.set_state(State::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_set_state_completes_before_outer_pass_continues() {
        let store = Store::new(record! { "n" => 0 });
        let seen = Arc::new(Mutex::new(Vec::new()));

        let writer = store.clone();
        let _first = store.subscribe(move || {
            let n = writer.read(|s| s.get("n").and_then(|v| v.as_int()).unwrap_or(0));
            if n == 1 {
                writer.set_state(record! { "n" => 2 })?;
            }
            Ok(())
        });

        let reader = store.clone();
        let seen_clone = seen.clone();
        let _second = store.subscribe(move || {
            let n = reader.read(|s| s.get("n").and_then(|v| v.as_int()).unwrap_or(0));
            seen_clone.lock().push(n);
            Ok(())
        });

        store.set_state(record! { "n" => 1 }).unwrap();
        assert_eq!(*seen.lock(), vec![2, 2]);
    }

    #[test]
    fn listener_error_aborts_pass_and_reaches_caller() {
        let store = Store::new(State::new());
        let _failing = store.subscribe(|| Err(crate::Error::listener("boom")));
        let (calls, listener) = counter();
        let _after = store.subscribe(listener);

        let err = store.set_state(record! { "x" => 1 }).unwrap_err();
        assert!(matches!(err, crate::Error::Listener(ref m) if m == "boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.read(|s| s.get("x").and_then(|v| v.as_int())), Some(1));
    }
}
