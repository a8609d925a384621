//! Transport and middleware configuration.
//!
//! A `Config` can be handed to a `Client` directly. For applications that
//! prefer to wire things once at startup there is also a process-wide slot
//! set by `configure` and read by `Client::global` on every request, so
//! global clients and resources may be built before `configure` runs.
//! Replacing it only affects calls issued afterwards; calls already in
//! flight keep the `Arc<Config>` they started with.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::ApiError;
use crate::middleware::{default_middleware, Middleware};
use crate::transport::Transport;

static GLOBAL: RwLock<Option<Arc<Config>>> = RwLock::new(None);

#[derive(Clone)]
pub struct Config {
    transport: Arc<dyn Transport>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Config {
    /// A config using `transport` and the default middleware chain.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            middleware: default_middleware(),
        }
    }

    /// Replace the whole middleware chain. An empty chain is allowed.
    pub fn with_middleware(mut self, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        self.middleware = middleware;
        self
    }

    /// Append a stage to the end of the chain.
    pub fn push_middleware(mut self, stage: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(stage));
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

/// Install `config` as the process-wide configuration.
pub fn configure(config: Config) {
    let mut slot = GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(Arc::new(config));
}

/// The process-wide configuration.
pub fn current() -> Result<Arc<Config>, ApiError> {
    GLOBAL
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
        .ok_or(ApiError::NotConfigured)
}

/// Remove the process-wide configuration.
pub fn reset() {
    let mut slot = GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = None;
}
