//! # Tether
//!
//! A single shared store bound to a tree of components.
//!
//! ## Store
//!
//! - [`Store`] - one state record, shallow-merged on every write
//! - Listeners are notified synchronously, in registration order
//! - [`Subscription`] handles unsubscribe idempotently, and on drop
//!
//! ## Bindings
//!
//! - [`Provider`] - makes a store reachable by everything mounted in its scope
//! - [`connect`] - derives a component's properties from store state with a
//!   [`Projection`], merging them with the component's own properties
//! - [`ConnectedInstance`] - re-renders the wrapped component only when the
//!   merged properties change, and forwards stateful instances
//!
//! ```
//! use tether::{connect, record, Component, Projection, Provider, Store, View};
//!
//! let greeting = Component::stateless("Greeting", |props| {
//!     View::text(props.get("msg").map(ToString::to_string).unwrap_or_default())
//! });
//! let connected = connect(Some(Projection::with_own_props(|state, own| {
//!     let msg = format!("{} {}", state.get("msg").unwrap(), own.get("name").unwrap());
//!     record! { "msg" => msg }
//! })))
//! .bind(greeting);
//!
//! let store = Store::new(record! { "msg" => "hello" });
//! let instance = Provider::new(store)
//!     .scope(|| connected.mount(record! { "name" => "world" }))
//!     .unwrap();
//! assert_eq!(instance.text_content(), "hello world");
//!
//! instance.receive_props(record! { "name" => "there" }).unwrap();
//! assert_eq!(instance.text_content(), "hello there");
//! ```

pub mod component;
pub mod connect;
pub mod context;
mod error;
pub mod store;
pub mod value;

// Re-export main types for convenience
pub use component::{Component, InstanceHandle, Stateful, View};
pub use connect::{connect, Connect, Connected, ConnectedInstance, Phase, Projection};
pub use context::{current_store, with_store, Provider};
pub use error::{Error, Result};
pub use store::{create, Store, Subscription};
pub use value::{Props, Record, State, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        // Basic smoke test
        let store = create(record! { "count" => 0 });
        store.set_state(record! { "count" => 42 }).unwrap();
        assert_eq!(store.read(|s| s.get("count").and_then(Value::as_int)), Some(42));
    }
}
