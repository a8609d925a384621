//! Request helpers on top of the transport and the middleware chain.
//!
//! # Design
//! `Client` either owns an `Arc<Config>` or reads the process-wide slot
//! afresh on every request, and carries no mutable state between calls.
//! Every helper builds an `HttpRequest`, hands it to the configured
//! transport, and threads the resulting future through the middleware chain
//! in configuration order.

use std::sync::Arc;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::{self, Config};
use crate::error::ApiError;
use crate::http::{HttpRequest, Payload};
use crate::middleware::{apply_middleware, Reply};
use crate::query::QueryParams;

#[derive(Debug, Clone)]
enum Source {
    Fixed(Arc<Config>),
    Global,
}

#[derive(Debug, Clone)]
pub struct Client {
    source: Source,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self::from_arc(Arc::new(config))
    }

    pub fn from_arc(config: Arc<Config>) -> Self {
        Self {
            source: Source::Fixed(config),
        }
    }

    /// A client that looks up the process-wide configuration on every
    /// request. It may be built before `configure` runs.
    pub fn global() -> Self {
        Self {
            source: Source::Global,
        }
    }

    /// The configuration the next request would use.
    pub fn config(&self) -> Result<Arc<Config>, ApiError> {
        match &self.source {
            Source::Fixed(config) => Ok(Arc::clone(config)),
            Source::Global => config::current(),
        }
    }

    /// Run `request` through the transport and the middleware chain and
    /// return whatever the last stage settles to.
    pub async fn send(&self, request: HttpRequest) -> Result<Reply, ApiError> {
        let config = self.config()?;
        let request = Arc::new(request);
        debug!(method = %request.method, url = %request.url(), "dispatching request");
        let transport = config.transport().send(Arc::clone(&request));
        let initial = async move { transport.await.map(Reply::Response) }.boxed();
        apply_middleware(initial, request, config.middleware()).await
    }

    async fn send_json(&self, request: HttpRequest) -> Result<Value, ApiError> {
        self.send(request).await?.into_json()
    }

    pub async fn get(&self, path: &str, query: Option<QueryParams>) -> Result<Value, ApiError> {
        self.send_json(HttpRequest::get(path).with_query(query)).await
    }

    /// GET `path` and deserialize the decoded JSON into `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<QueryParams>,
    ) -> Result<T, ApiError> {
        let value = self.get(path, query).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post(&self, path: &str, payload: impl Into<Payload>) -> Result<Value, ApiError> {
        self.send_json(HttpRequest::post(path, payload)).await
    }

    pub async fn put(&self, path: &str, payload: impl Into<Payload>) -> Result<Value, ApiError> {
        self.send_json(HttpRequest::put(path, payload)).await
    }

    pub async fn patch(&self, path: &str, payload: impl Into<Payload>) -> Result<Value, ApiError> {
        self.send_json(HttpRequest::patch(path, payload)).await
    }

    /// DELETE `path`. Named `remove` to mirror the resource operation.
    pub async fn remove(&self, path: &str) -> Result<Value, ApiError> {
        self.send_json(HttpRequest::delete(path)).await
    }
}
