//! Client-side data access for paginated REST backends.
//!
//! # Overview
//! A logical call is an `HttpRequest` handed to a `Transport`, whose
//! in-flight result is threaded through an ordered chain of middleware
//! stages. The default chain rejects non-2xx responses with a
//! `ResponseError` and decodes JSON bodies. On top of that, `Resource<T>`
//! offers save/remove/one/find_one/list/page for one REST resource and maps
//! raw JSON into typed entities.
//!
//! # Design
//! - `Config` holds the transport and the middleware chain; pass it to a
//!   `Client` directly or install it process-wide with `configure`.
//! - The request descriptor is shared as `Arc<HttpRequest>` and never
//!   mutated, so every stage sees what produced its input.
//! - Each resource operation is a provided method on `Operations`, so any
//!   one of them can be replaced or wrapped on its own.
//! - `Page<T>` is the Spring page envelope; `number` is zero-based.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mapper;
pub mod middleware;
pub mod page;
pub mod query;
pub mod resource;
pub mod transport;

pub use client::Client;
pub use config::{configure, Config};
pub use error::{ApiError, ResponseError};
pub use http::{Form, HttpMethod, HttpRequest, HttpResponse, Payload};
pub use mapper::{default_mapper, make_instance, merge_json, Entity, Mapper};
pub use middleware::{
    apply_middleware, check_status, default_middleware, parse_json, trace_requests, InFlight,
    Middleware, Reply,
};
pub use page::{empty_page, map_page, page_of, Page};
pub use query::{build_url, QueryParams, QueryValue};
pub use resource::{DefaultOperations, Operations, Resource};
pub use transport::{FnTransport, Transport, UreqTransport};
