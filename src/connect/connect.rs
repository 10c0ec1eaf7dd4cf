use super::{ConnectedInstance, Projection};
use crate::component::Component;
use crate::context::try_current_store;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::value::Props;
use std::sync::Arc;

/// Create a binding factory.
///
/// With a projection, every component bound by the returned [`Connect`]
/// subscribes to the store and receives the projected properties merged with
/// its own. Without one, bound components never subscribe and receive their
/// own properties unchanged.
///
/// # Examples
///
/// ```
/// use tether::{connect, record, Component, Projection, Provider, Store, View};
///
/// let app = Component::stateless("App", |props| {
///     View::text(props.get("msg").map(ToString::to_string).unwrap_or_default())
/// });
/// let connected = connect(Some(Projection::state_only(|state| state.clone()))).bind(app);
///
/// let store = Store::new(record! { "msg" => "hello", "count" => 0 });
/// let instance = Provider::new(store.clone())
///     .scope(|| connected.mount(record! {}))
///     .unwrap();
/// assert_eq!(instance.text_content(), "hello");
///
/// store.set_state(record! { "msg" => "halo" }).unwrap();
/// assert_eq!(instance.text_content(), "halo");
/// ```
pub fn connect(projection: Option<Projection>) -> Connect {
    Connect { projection }
}

/// Binds components to the nearest store.
#[derive(Clone, Debug, Default)]
pub struct Connect {
    projection: Option<Projection>,
}

impl Connect {
    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Wrap `component`, producing the component type `Connect(<name>)`.
    pub fn bind(&self, component: Component) -> Connected {
        Connected {
            display_name: format!("Connect({})", component.name()).into(),
            projection: self.projection.clone(),
            wrapped: component,
        }
    }
}

/// A component type wrapping another component with a store binding.
///
/// A `Connected` value is a type, not an instance: every call to
/// [`Connected::mount`] produces a fresh [`ConnectedInstance`].
#[derive(Clone, Debug)]
pub struct Connected {
    display_name: Arc<str>,
    projection: Option<Projection>,
    wrapped: Component,
}

impl Connected {
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn wrapped(&self) -> &Component {
        &self.wrapped
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Mount against the store of the innermost enclosing provider.
    ///
    /// Fails with [`Error::MissingStore`] outside any provider scope.
    pub fn mount(&self, own_props: Props) -> Result<ConnectedInstance> {
        let store = try_current_store().ok_or_else(|| Error::MissingStore {
            component: self.display_name.to_string(),
        })?;
        self.mount_with(store, own_props)
    }

    /// Mount against an explicitly supplied store.
    pub fn mount_with(&self, store: Store, own_props: Props) -> Result<ConnectedInstance> {
        ConnectedInstance::mount(
            Arc::clone(&self.display_name),
            store,
            self.projection.clone(),
            &self.wrapped,
            own_props,
        )
    }
}
