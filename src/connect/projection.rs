use crate::error::BoxError;
use crate::value::{Props, State};
use std::fmt;
use std::sync::Arc;

type StateOnlyFn = Arc<dyn Fn(&State) -> Result<Props, BoxError> + Send + Sync>;
type WithOwnPropsFn = Arc<dyn Fn(&State, &Props) -> Result<Props, BoxError> + Send + Sync>;

/// Derives a component's properties from store state.
///
/// The variant declares whether the projection reads the component's own
/// properties. Only [`Projection::WithOwnProps`] is re-evaluated when a parent
/// hands the binding new properties.
#[derive(Clone)]
pub enum Projection {
    StateOnly(StateOnlyFn),
    WithOwnProps(WithOwnPropsFn),
}

impl Projection {
    /// Derive properties from state alone.
    pub fn state_only<F>(f: F) -> Self
    where
        F: Fn(&State) -> Props + Send + Sync + 'static,
    {
        Projection::StateOnly(Arc::new(move |state: &State| -> Result<Props, BoxError> {
            Ok(f(state))
        }))
    }

    /// Derive properties from state and the component's own properties.
    pub fn with_own_props<F>(f: F) -> Self
    where
        F: Fn(&State, &Props) -> Props + Send + Sync + 'static,
    {
        Projection::WithOwnProps(Arc::new(
            move |state: &State, own: &Props| -> Result<Props, BoxError> { Ok(f(state, own)) },
        ))
    }

    /// Fallible form of [`Projection::state_only`].
    pub fn try_state_only<F, E>(f: F) -> Self
    where
        F: Fn(&State) -> Result<Props, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Projection::StateOnly(Arc::new(move |state: &State| -> Result<Props, BoxError> {
            f(state).map_err(Into::into)
        }))
    }

    /// Fallible form of [`Projection::with_own_props`].
    pub fn try_with_own_props<F, E>(f: F) -> Self
    where
        F: Fn(&State, &Props) -> Result<Props, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Projection::WithOwnProps(Arc::new(
            move |state: &State, own: &Props| -> Result<Props, BoxError> {
                f(state, own).map_err(Into::into)
            },
        ))
    }

    /// Whether the result can change when only own properties change.
    pub fn reads_own_props(&self) -> bool {
        matches!(self, Projection::WithOwnProps(_))
    }

    pub(crate) fn project(&self, state: &State, own: &Props) -> Result<Props, BoxError> {
        match self {
            Projection::StateOnly(f) => f(state),
            Projection::WithOwnProps(f) => f(state, own),
        }
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::StateOnly(_) => f.write_str("Projection::StateOnly"),
            Projection::WithOwnProps(_) => f.write_str("Projection::WithOwnProps"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn state_only_ignores_own_props() {
        let projection = Projection::state_only(|state| state.clone());
        assert!(!projection.reads_own_props());

        let state = record! { "msg" => "hello" };
        let derived = projection.project(&state, &record! { "name" => "x" }).unwrap();
        assert!(derived.shallow_eq(&state));
    }

    #[test]
    fn with_own_props_sees_both() {
        let projection = Projection::with_own_props(|state, own| {
            record! {
                "msg" => format!("{} {}", state.get("msg").unwrap(), own.get("name").unwrap()),
            }
        });
        assert!(projection.reads_own_props());

        let derived = projection
            .project(&record! { "msg" => "hello" }, &record! { "name" => "world" })
            .unwrap();
        assert_eq!(derived.get("msg").and_then(|v| v.as_str()), Some("hello world"));
    }

    #[test]
    fn fallible_projection_reports_its_error() {
        let projection = Projection::try_state_only(|state: &State| {
            state
                .get("required")
                .cloned()
                .map(|v| record! { "value" => v })
                .ok_or("missing field")
        });

        let err = projection.project(&record! {}, &record! {}).unwrap_err();
        assert_eq!(err.to_string(), "missing field");
    }
}
