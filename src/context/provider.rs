use crate::error::{Error, Result};
use crate::store::Store;
use std::cell::RefCell;

// Thread-local stack of provided stores; the innermost scope is last.
thread_local! {
    static STORE_STACK: RefCell<Vec<Store>> = const { RefCell::new(Vec::new()) };
}

/// Makes a [`Store`] reachable by every binding mounted inside its scope.
///
/// Providers nest: a binding resolves the innermost enclosing provider, so an
/// inner provider shadows an outer one for the duration of its scope.
///
/// # Examples
///
/// ```
/// use tether::{current_store, record, Provider, Store};
///
/// let store = Store::new(record! { "msg" => "hello" });
/// Provider::new(store.clone()).scope(|| {
///     assert!(current_store().unwrap().ptr_eq(&store));
/// });
/// assert!(current_store().is_err());
/// ```
#[derive(Clone)]
pub struct Provider {
    store: Store,
}

impl Provider {
    /// Wrap `store` so it can be scoped over a subtree.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The store this provider makes reachable.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run `f` with this provider's store as the nearest enclosing store.
    pub fn scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        with_store(self.store.clone(), f)
    }
}

/// Run `f` with `store` pushed onto the provider stack.
///
/// The store is popped again when `f` returns or unwinds.
pub fn with_store<F, R>(store: Store, f: F) -> R
where
    F: FnOnce() -> R,
{
    STORE_STACK.with(|stack| stack.borrow_mut().push(store));
    tracing::trace!(depth = depth(), "provider entered");

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    STORE_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });
    tracing::trace!(depth = depth(), "provider left");

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

/// The store of the innermost enclosing provider.
pub fn current_store() -> Result<Store> {
    try_current_store().ok_or(Error::NoProvider)
}

pub(crate) fn try_current_store() -> Option<Store> {
    STORE_STACK.with(|stack| stack.borrow().last().cloned())
}

fn depth() -> usize {
    STORE_STACK.with(|stack| stack.borrow().len())
}
