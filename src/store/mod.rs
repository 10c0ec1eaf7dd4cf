//! The shared state container.
//!
//! A [`Store`] holds one state record, merges partial updates into it and
//! notifies its listeners synchronously.

mod store;

pub use store::{create, Store, Subscription};
