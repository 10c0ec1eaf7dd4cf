//! The component model bindings render into.
//!
//! Components are either stateless render functions or stateful instances
//! with lifecycle hooks. Both produce a [`View`].

mod component;
mod view;

pub use component::{AsAny, Component, InstanceHandle, Stateful};
pub(crate) use component::Instance;
pub use view::View;
