//! Dynamic records used for store state and component properties.

mod record;
mod value;

pub use record::Record;
pub use value::Value;

/// The shape of a store's state.
pub type State = Record;

/// Properties handed to a component.
pub type Props = Record;
