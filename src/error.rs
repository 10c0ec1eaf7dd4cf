use thiserror::Error;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by stores and connected components.
#[derive(Debug, Error)]
pub enum Error {
    /// A connected component was mounted outside of any [`Provider`](crate::Provider).
    #[error("{component} was mounted without a store; wrap it in a Provider scope")]
    MissingStore { component: String },

    /// [`current_store`](crate::current_store) was called with no provider scope active.
    #[error("no Provider scope is active on this thread")]
    NoProvider,

    /// A projection failed while deriving properties.
    #[error("projection for {component} failed: {source}")]
    Projection {
        component: String,
        #[source]
        source: BoxError,
    },

    /// Raised by a user listener.
    #[error("listener failed: {0}")]
    Listener(String),
}

impl Error {
    pub fn listener(message: impl Into<String>) -> Self {
        Error::Listener(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
