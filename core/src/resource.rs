//! CRUD operations for one REST resource.
//!
//! # Design
//! A `Resource<T>` binds a base url, a mapper and a client. The operations
//! themselves live on the `Operations` trait as provided methods, and the
//! resource dispatches every call through an `Arc<dyn Operations<T>>`. To
//! replace or wrap a single operation, implement `Operations` on your own
//! type, override that one method, and call `DefaultOperations` inside it
//! when you want the stock behaviour. The other operations keep their
//! defaults.
//!
//! `save` and `remove` mutate and hand back the caller's own instance.
//! Concurrent `save` calls on the same instance are not possible while the
//! borrow checker holds the `&mut`; callers that clone an entity and save
//! both copies get two independent merges.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::client::Client;
use crate::error::ApiError;
use crate::mapper::{default_mapper, path_id, Entity, Mapper};
use crate::page::Page;
use crate::query::QueryParams;

/// The operations a resource offers. Every method has a default.
pub trait Operations<T: Entity>: Send + Sync {
    /// PUT to `{base}/{id}` when the entity has an id, POST to `{base}`
    /// otherwise, then merge the response onto the entity.
    fn save<'a>(
        &'a self,
        resource: &'a Resource<T>,
        entity: &'a mut T,
    ) -> BoxFuture<'a, Result<&'a mut T, ApiError>> {
        async move {
            let payload = serde_json::to_value(&*entity)
                .map_err(|e| ApiError::Serialization(e.to_string()))?;
            let json = match path_id(entity) {
                Some(id) => resource.client.put(&resource.url_for(&id), payload).await?,
                None => resource.client.post(&resource.base_url, payload).await?,
            };
            entity.merge(json)?;
            Ok(entity)
        }
        .boxed()
    }

    /// DELETE `{base}/{id}` and clear the entity's id. Fails before any
    /// request is made when the entity has no id.
    fn remove<'a>(
        &'a self,
        resource: &'a Resource<T>,
        entity: &'a mut T,
    ) -> BoxFuture<'a, Result<&'a mut T, ApiError>> {
        let Some(id) = path_id(entity) else {
            return future::ready(Err(ApiError::MissingId)).boxed();
        };
        let url = resource.url_for(&id);
        async move {
            resource.client.remove(&url).await?;
            entity.clear_id();
            Ok(entity)
        }
        .boxed()
    }

    /// GET `{base}/{id}` and map the record.
    fn one<'a>(
        &'a self,
        resource: &'a Resource<T>,
        id: String,
        query: Option<QueryParams>,
    ) -> BoxFuture<'a, Result<T, ApiError>> {
        async move {
            let json = resource.client.get(&resource.url_for(&id), query).await?;
            resource.map(json)
        }
        .boxed()
    }

    /// GET `{base}` with `query`. An empty object or an empty array means
    /// nothing matched.
    fn find_one<'a>(
        &'a self,
        resource: &'a Resource<T>,
        query: QueryParams,
    ) -> BoxFuture<'a, Result<Option<T>, ApiError>> {
        async move {
            let json = resource.client.get(&resource.base_url, Some(query)).await?;
            if is_empty_result(&json) {
                return Ok(None);
            }
            resource.map(json).map(Some)
        }
        .boxed()
    }

    /// GET `{base}` and map every element of the returned array, in order.
    fn list<'a>(
        &'a self,
        resource: &'a Resource<T>,
        query: Option<QueryParams>,
    ) -> BoxFuture<'a, Result<Vec<T>, ApiError>> {
        async move {
            let json = resource.client.get(&resource.base_url, query).await?;
            let Value::Array(items) = json else {
                return Err(ApiError::Deserialization(format!(
                    "expected a JSON array from {}",
                    resource.base_url
                )));
            };
            items.into_iter().map(|item| resource.map(item)).collect()
        }
        .boxed()
    }

    /// GET `{base}` and map the content of the returned page envelope.
    fn page<'a>(
        &'a self,
        resource: &'a Resource<T>,
        query: Option<QueryParams>,
    ) -> BoxFuture<'a, Result<Page<T>, ApiError>> {
        async move {
            let json = resource.client.get(&resource.base_url, query).await?;
            let page: Page<Value> = serde_json::from_value(json)?;
            page.try_map(|item| resource.map(item))
        }
        .boxed()
    }
}

/// The stock operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOperations;

impl<T: Entity> Operations<T> for DefaultOperations {}

// Backends disagree on how "no match" looks, so both shapes count.
fn is_empty_result(json: &Value) -> bool {
    match json {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

pub struct Resource<T: Entity> {
    base_url: String,
    mapper: Mapper<T>,
    client: Client,
    operations: Arc<dyn Operations<T>>,
}

impl<T: Entity> Resource<T> {
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            mapper: default_mapper(),
            client,
            operations: Arc::new(DefaultOperations),
        }
    }

    /// A resource that reads the process-wide configuration on every call.
    pub fn global(base_url: &str) -> Self {
        Self::new(base_url, Client::global())
    }

    pub fn with_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(Value) -> Result<T, ApiError> + Send + Sync + 'static,
    {
        self.mapper = Arc::new(mapper);
        self
    }

    pub fn with_operations(mut self, operations: impl Operations<T> + 'static) -> Self {
        self.operations = Arc::new(operations);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The mapper, for other resources that embed this one.
    pub fn mapper(&self) -> Mapper<T> {
        Arc::clone(&self.mapper)
    }

    /// Run the resource's mapper over `json`.
    pub fn map(&self, json: Value) -> Result<T, ApiError> {
        (self.mapper)(json)
    }

    pub fn url_for(&self, id: &str) -> String {
        format!("{}/{id}", self.base_url)
    }

    pub fn save<'a>(&'a self, entity: &'a mut T) -> BoxFuture<'a, Result<&'a mut T, ApiError>> {
        self.operations.save(self, entity)
    }

    pub fn remove<'a>(&'a self, entity: &'a mut T) -> BoxFuture<'a, Result<&'a mut T, ApiError>> {
        self.operations.remove(self, entity)
    }

    /// The id is put into the path exactly as it displays.
    pub fn one(
        &self,
        id: impl fmt::Display,
        query: Option<QueryParams>,
    ) -> BoxFuture<'_, Result<T, ApiError>> {
        self.operations.one(self, id.to_string(), query)
    }

    pub fn find_one(&self, query: QueryParams) -> BoxFuture<'_, Result<Option<T>, ApiError>> {
        self.operations.find_one(self, query)
    }

    pub fn list(&self, query: Option<QueryParams>) -> BoxFuture<'_, Result<Vec<T>, ApiError>> {
        self.operations.list(self, query)
    }

    pub fn page(&self, query: Option<QueryParams>) -> BoxFuture<'_, Result<Page<T>, ApiError>> {
        self.operations.page(self, query)
    }
}

impl<T: Entity> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            mapper: Arc::clone(&self.mapper),
            client: self.client.clone(),
            operations: Arc::clone(&self.operations),
        }
    }
}

impl<T: Entity> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
