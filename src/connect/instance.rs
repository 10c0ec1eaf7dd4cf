use super::Projection;
use crate::component::{Component, Instance, InstanceHandle, View};
use crate::error::{Error, Result};
use crate::store::{Store, Subscription};
use crate::value::{Props, State};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type RedrawHook = Arc<dyn Fn(&View) + Send + Sync>;

/// Whether a mounted binding listens to its store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Subscribed,
    Unsubscribed,
}

#[derive(Clone, Copy)]
enum Pass {
    Mount,
    Update,
}

struct BindingState {
    own: Props,
    derived: Props,
    merged: Props,
    view: View,
    renders: usize,
    // Bumped per render so a nested render is never overwritten by the
    // outer one that started before it.
    generation: u64,
    mounted: bool,
}

struct Binding {
    name: Arc<str>,
    store: Store,
    projection: Option<Projection>,
    instance: Instance,
    state: Mutex<BindingState>,
    redraw: Mutex<Option<RedrawHook>>,
}

fn evaluate(name: &str, projection: &Projection, state: &State, own: &Props) -> Result<Props> {
    tracing::trace!(component = name, "evaluating projection");
    projection
        .project(state, own)
        .map_err(|source| Error::Projection {
            component: name.to_string(),
            source,
        })
}

impl Binding {
    fn project(&self, projection: &Projection, state: &State, own: &Props) -> Result<Props> {
        evaluate(&self.name, projection, state, own)
    }

    fn on_store_notified(&self) -> Result<()> {
        let Some(projection) = &self.projection else {
            return Ok(());
        };
        let own = {
            let state = self.state.lock();
            if !state.mounted {
                return Ok(());
            }
            state.own.clone()
        };

        let derived = self.project(projection, &self.store.get_state(), &own)?;
        let merged = derived.merged(&own);

        {
            let mut state = self.state.lock();
            state.derived = derived;
            if merged.shallow_eq(&state.merged) {
                tracing::trace!(component = %self.name, "merged props unchanged, skipping render");
                return Ok(());
            }
            state.merged = merged.clone();
        }

        self.render(&merged, Pass::Update);
        Ok(())
    }

    fn receive_props(&self, own: Props) -> Result<()> {
        let derived = match &self.projection {
            Some(projection) if projection.reads_own_props() => {
                Some(self.project(projection, &self.store.get_state(), &own)?)
            }
            _ => None,
        };

        let merged = {
            let mut state = self.state.lock();
            if let Some(derived) = derived {
                state.derived = derived;
            }
            let merged = state.derived.merged(&own);
            state.own = own;
            state.merged = merged.clone();
            merged
        };

        self.render(&merged, Pass::Update);
        Ok(())
    }

    fn render(&self, merged: &Props, pass: Pass) {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };

        let view = self.instance.render(merged);

        let latest = {
            let mut state = self.state.lock();
            state.renders += 1;
            let latest = state.generation == generation;
            if latest {
                state.view = view.clone();
            }
            latest
        };

        match pass {
            Pass::Mount => self.instance.mounted(merged),
            Pass::Update if latest => self.instance.updated(merged),
            // Superseded by a nested render that already ran its hook.
            Pass::Update => return,
        }

        if matches!(pass, Pass::Update) {
            tracing::debug!(component = %self.name, generation, "re-rendered");
            let hook = self.redraw.lock().clone();
            if let Some(hook) = hook {
                hook(&view);
            }
        }
    }
}

/// A mounted connected component.
///
/// Created by [`Connected::mount`](super::Connected::mount). The host engine
/// drives it through [`receive_props`](Self::receive_props) when the parent
/// re-renders and [`unmount`](Self::unmount) when it is removed; store
/// notifications arrive on their own. Dropping the instance unmounts it.
pub struct ConnectedInstance {
    binding: Arc<Binding>,
    subscription: Option<Subscription>,
}

impl ConnectedInstance {
    pub(crate) fn mount(
        name: Arc<str>,
        store: Store,
        projection: Option<Projection>,
        wrapped: &Component,
        own: Props,
    ) -> Result<Self> {
        let derived = match &projection {
            Some(projection) => evaluate(&name, projection, &store.get_state(), &own)?,
            None => Props::new(),
        };
        let merged = derived.merged(&own);

        let binding = Arc::new(Binding {
            name,
            store,
            projection,
            instance: wrapped.instantiate(),
            state: Mutex::new(BindingState {
                own,
                derived,
                merged: merged.clone(),
                view: View::Empty,
                renders: 0,
                generation: 0,
                mounted: true,
            }),
            redraw: Mutex::new(None),
        });

        let subscription = binding.projection.is_some().then(|| {
            let weak = Arc::downgrade(&binding);
            binding.store.subscribe(move || match weak.upgrade() {
                Some(binding) => binding.on_store_notified(),
                None => Ok(()),
            })
        });

        tracing::debug!(
            component = %binding.name,
            subscribed = subscription.is_some(),
            "mounted"
        );

        let mounted = Self {
            binding,
            subscription,
        };
        mounted.binding.render(&merged, Pass::Mount);
        Ok(mounted)
    }

    /// Hand the binding new own properties from its parent.
    ///
    /// Projections that read own properties are re-evaluated; state-only
    /// projections keep their last result. The wrapped component always
    /// re-renders.
    pub fn receive_props(&self, own_props: Props) -> Result<()> {
        self.binding.receive_props(own_props)
    }

    /// Register the engine's redraw trigger, called with each re-rendered view.
    pub fn on_redraw<F>(&self, hook: F)
    where
        F: Fn(&View) + Send + Sync + 'static,
    {
        *self.binding.redraw.lock() = Some(Arc::new(hook));
    }

    /// The wrapped component's instance, if it is stateful.
    pub fn wrapped_instance(&self) -> Option<InstanceHandle> {
        self.binding.instance.handle()
    }

    pub fn display_name(&self) -> &str {
        &self.binding.name
    }

    pub fn store(&self) -> &Store {
        &self.binding.store
    }

    pub fn phase(&self) -> Phase {
        if self.is_subscribed() {
            Phase::Subscribed
        } else {
            Phase::Unsubscribed
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    pub fn own_props(&self) -> Props {
        self.binding.state.lock().own.clone()
    }

    pub fn derived_props(&self) -> Props {
        self.binding.state.lock().derived.clone()
    }

    pub fn merged_props(&self) -> Props {
        self.binding.state.lock().merged.clone()
    }

    /// The most recently rendered view.
    pub fn view(&self) -> View {
        self.binding.state.lock().view.clone()
    }

    pub fn text_content(&self) -> String {
        self.binding.state.lock().view.text_content()
    }

    /// How many times the wrapped component has rendered, the mount included.
    pub fn render_count(&self) -> usize {
        self.binding.state.lock().renders
    }

    /// Unsubscribe and run the wrapped component's unmount hook.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let was_mounted = std::mem::replace(&mut self.binding.state.lock().mounted, false);
        if !was_mounted {
            return;
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.binding.instance.unmounting();
        tracing::debug!(component = %self.binding.name, "unmounted");
    }
}

impl Drop for ConnectedInstance {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for ConnectedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.binding.state.lock();
        f.debug_struct("ConnectedInstance")
            .field("name", &self.binding.name)
            .field("subscribed", &self.is_subscribed())
            .field("merged", &state.merged)
            .field("renders", &state.renders)
            .finish()
    }
}
