use super::View;
use crate::value::Props;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Upcast helper so stateful instances can be downcast through a handle.
#[doc(hidden)]
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A component that keeps an instance alive between renders.
///
/// Hooks take `&self`; instances that hold mutable state use interior
/// mutability, so a render may safely trigger another render of the same
/// instance.
pub trait Stateful: AsAny + Send + Sync + 'static {
    fn render(&self, props: &Props) -> View;

    /// Called once, after the first render.
    fn mounted(&self, _props: &Props) {}

    /// Called after every re-render.
    fn updated(&self, _props: &Props) {}

    /// Called once, before the instance is discarded.
    fn unmounting(&self) {}
}

type RenderFn = Arc<dyn Fn(&Props) -> View + Send + Sync>;
type Factory = Arc<dyn Fn() -> Arc<dyn Stateful> + Send + Sync>;

#[derive(Clone)]
enum Kind {
    Stateless(RenderFn),
    Stateful(Factory),
}

/// A component type: either a pure render function or a stateful factory.
#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    kind: Kind,
}

impl Component {
    /// A pure function of its properties. It has no instance.
    pub fn stateless<F>(name: impl Into<Arc<str>>, render: F) -> Self
    where
        F: Fn(&Props) -> View + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: Kind::Stateless(Arc::new(render)),
        }
    }

    /// A component built fresh by `construct` for every mount.
    pub fn stateful<T, F>(name: impl Into<Arc<str>>, construct: F) -> Self
    where
        T: Stateful,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(construct()) as Arc<dyn Stateful>);
        Self {
            name: name.into(),
            kind: Kind::Stateful(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stateful(&self) -> bool {
        matches!(self.kind, Kind::Stateful(_))
    }

    pub(crate) fn instantiate(&self) -> Instance {
        match &self.kind {
            Kind::Stateless(render) => Instance::Stateless(Arc::clone(render)),
            Kind::Stateful(construct) => Instance::Stateful(InstanceHandle(construct())),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("stateful", &self.is_stateful())
            .finish()
    }
}

/// A mounted component. Stateless components keep only their render function.
pub(crate) enum Instance {
    Stateless(RenderFn),
    Stateful(InstanceHandle),
}

impl Instance {
    pub(crate) fn render(&self, props: &Props) -> View {
        match self {
            Instance::Stateless(render) => render(props),
            Instance::Stateful(handle) => handle.render(props),
        }
    }

    pub(crate) fn mounted(&self, props: &Props) {
        if let Instance::Stateful(handle) = self {
            handle.0.mounted(props);
        }
    }

    pub(crate) fn updated(&self, props: &Props) {
        if let Instance::Stateful(handle) = self {
            handle.0.updated(props);
        }
    }

    pub(crate) fn unmounting(&self) {
        if let Instance::Stateful(handle) = self {
            handle.0.unmounting();
        }
    }

    pub(crate) fn handle(&self) -> Option<InstanceHandle> {
        match self {
            Instance::Stateless(_) => None,
            Instance::Stateful(handle) => Some(handle.clone()),
        }
    }
}

/// Shared handle to a live stateful instance.
#[derive(Clone)]
pub struct InstanceHandle(Arc<dyn Stateful>);

impl InstanceHandle {
    /// Borrow the instance as its concrete type.
    pub fn downcast_ref<T: Stateful>(&self) -> Option<&T> {
        <dyn Stateful as AsAny>::as_any(&*self.0).downcast_ref::<T>()
    }

    pub fn render(&self, props: &Props) -> View {
        self.0.render(props)
    }

    pub fn ptr_eq(&self, other: &InstanceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceHandle({:p})", Arc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Greeting {
        renders: AtomicUsize,
    }

    impl Stateful for Greeting {
        fn render(&self, props: &Props) -> View {
            self.renders.fetch_add(1, Ordering::SeqCst);
            View::text(props.get("msg").map(ToString::to_string).unwrap_or_default())
        }
    }

    #[test]
    fn stateless_has_no_handle() {
        let component = Component::stateless("Plain", |_| View::Empty);
        assert!(!component.is_stateful());
        assert!(component.instantiate().handle().is_none());
    }

    #[test]
    fn stateful_handle_downcasts() {
        let component = Component::stateful("Greeting", Greeting::default);
        let instance = component.instantiate();
        let view = instance.render(&record! { "msg" => "hi" });
        assert_eq!(view.text_content(), "hi");

        let handle = instance.handle().unwrap();
        let greeting = handle.downcast_ref::<Greeting>().unwrap();
        assert_eq!(greeting.renders.load(Ordering::SeqCst), 1);
        assert!(handle.ptr_eq(&instance.handle().unwrap()));
    }

    #[test]
    fn each_instantiation_is_fresh() {
        let component = Component::stateful("Greeting", Greeting::default);
        let a = component.instantiate().handle().unwrap();
        let b = component.instantiate().handle().unwrap();
        assert!(!a.ptr_eq(&b));
    }
}
