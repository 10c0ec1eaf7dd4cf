//! Store bindings for components.
//!
//! [`connect`] builds a [`Connect`] factory from an optional [`Projection`].
//! Binding a component yields a [`Connected`] component type; mounting that
//! yields a [`ConnectedInstance`], which subscribes to the store, derives its
//! properties, and re-renders the wrapped component only when the merged
//! properties change.

mod connect;
mod instance;
mod projection;

pub use connect::{connect, Connect, Connected};
pub use instance::{ConnectedInstance, Phase};
pub use projection::Projection;
