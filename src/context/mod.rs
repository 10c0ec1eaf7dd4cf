//! Implicit store propagation.
//!
//! This module hands a [`Store`](crate::Store) down to connected components
//! without threading it through every constructor.

mod provider;

pub use provider::{current_store, with_store, Provider};
pub(crate) use provider::try_current_store;
