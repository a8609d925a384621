//! Error types for the client.
//!
//! # Design
//! One enum covers every failure a call can end in. Status errors keep the
//! whole raw response in `ResponseError` so later middleware and callers can
//! branch on status, headers or body. Decode errors only ever happen on
//! responses that passed status classification. `MissingId` is a contract
//! violation and is raised before any request is issued.

use std::fmt;

use thiserror::Error;

use crate::http::HttpResponse;

pub const NOT_JSON_MESSAGE: &str = "spring-connect: Content-Type is not json, will not parse.";

pub const MISSING_ID_MESSAGE: &str =
    "Cannot remove a Resource which has no id, this is a programmer error.";

/// Errors returned by the pipeline, the request helpers and resources.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The transport failed before a response was obtained.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a status outside [200, 299].
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// A successful response did not declare a JSON content type.
    #[error("{}", NOT_JSON_MESSAGE)]
    NotJson { content_type: Option<String> },

    /// The response body could not be deserialized into the expected type.
    #[error("{0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// `remove` was called on an entity without an id.
    #[error("{}", MISSING_ID_MESSAGE)]
    MissingId,

    /// The middleware chain finished without decoding the response body.
    #[error("response with status {status} was not decoded by the middleware chain")]
    Undecoded { status: u16 },

    /// The process-wide configuration was read before `configure` was called.
    #[error("spring-connect is not configured, call `configure` first")]
    NotConfigured,

    /// A custom mapper rejected its input.
    #[error("mapping failed: {0}")]
    Mapping(String),
}

impl ApiError {
    /// Returns the raw response when this is a status error.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            ApiError::Response(err) => Some(err.response()),
            _ => None,
        }
    }

    /// Returns `true` when this is a status error carrying `status`.
    pub fn is_status(&self, status: u16) -> bool {
        self.response().is_some_and(|r| r.status == status)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}

/// A non-2xx response, displayed as its status text.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseError {
    response: HttpResponse,
}

impl ResponseError {
    pub fn new(response: HttpResponse) -> Self {
        Self { response }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn into_response(self) -> HttpResponse {
        self.response
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response.status_text)
    }
}

impl std::error::Error for ResponseError {}
