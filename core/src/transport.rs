//! Transport adapters: the code that actually performs a request.
//!
//! # Design
//! A `Transport` turns an `HttpRequest` into a future raw `HttpResponse`.
//! It never classifies statuses or decodes bodies; that is the middleware
//! pipeline's job, so a 404 or a 500 is a successful transport outcome.
//! Only failures that leave no response behind become `ApiError::Transport`.
//!
//! `FnTransport` adapts a synchronous closure, which keeps the host-does-IO
//! style available and makes stubbing trivial. `UreqTransport` runs a
//! blocking `ureq` agent on tokio's blocking pool and must therefore be
//! driven from inside a tokio runtime.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Payload};

pub type ResponseFuture = BoxFuture<'static, Result<HttpResponse, ApiError>>;

/// Executes requests. Implementations must be cheap to call concurrently.
pub trait Transport: Send + Sync {
    fn send(&self, request: Arc<HttpRequest>) -> ResponseFuture;
}

/// A transport backed by a synchronous closure.
pub struct FnTransport<F> {
    handler: F,
}

impl<F> FnTransport<F>
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync,
{
    fn send(&self, request: Arc<HttpRequest>) -> ResponseFuture {
        future::ready((self.handler)(&request)).boxed()
    }
}

/// Blocking HTTP via `ureq`, bound to one origin such as
/// `http://localhost:8080`. Request paths are appended to the origin.
#[derive(Clone)]
pub struct UreqTransport {
    origin: String,
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(origin: &str) -> Self {
        // Statuses are classified by the middleware chain, not by ureq.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn execute(agent: &ureq::Agent, url: &str, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url, "sending request");

        let (content_type, body) = match &request.payload {
            None => (None, None),
            Some(Payload::Json(value)) => {
                let bytes =
                    serde_json::to_vec(value).map_err(|e| ApiError::Serialization(e.to_string()))?;
                (Some("application/json".to_string()), Some(bytes))
            }
            Some(Payload::Multipart(form)) => {
                let boundary = format!("spring-connect-{}", Uuid::new_v4().simple());
                (
                    Some(format!("multipart/form-data; boundary={boundary}")),
                    Some(form.encode(&boundary)),
                )
            }
        };

        let result = match request.method {
            HttpMethod::Get => agent.get(url).call(),
            HttpMethod::Delete => agent.delete(url).call(),
            HttpMethod::Post => send_with_body(agent.post(url), content_type, body),
            HttpMethod::Put => send_with_body(agent.put(url), content_type, body),
            HttpMethod::Patch => send_with_body(agent.patch(url), content_type, body),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = decode_body(bytes)?;

        debug!(url, status = status.as_u16(), "received response");
        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

// A body that arrived intact but is not text is a decoding failure.
fn decode_body(bytes: Vec<u8>) -> Result<String, ApiError> {
    String::from_utf8(bytes).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn send_with_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    content_type: Option<String>,
    body: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match (content_type, body) {
        (Some(content_type), Some(body)) => builder.content_type(content_type).send(&body[..]),
        _ => builder.send_empty(),
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: Arc<HttpRequest>) -> ResponseFuture {
        let agent = self.agent.clone();
        let url = format!("{}{}", self.origin, request.url());
        async move {
            tokio::task::spawn_blocking(move || Self::execute(&agent, &url, &request))
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fn_transport_answers_with_the_handler_result() {
        let transport = FnTransport::new(|req: &HttpRequest| {
            Ok(HttpResponse::json(format!(r#"{{"path":"{}"}}"#, req.url())))
        });
        let response = transport
            .send(Arc::new(HttpRequest::get("/api/pokemon/1")))
            .await
            .unwrap();
        assert_eq!(response.body, r#"{"path":"/api/pokemon/1"}"#);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let transport = UreqTransport::new("http://localhost:3000/");
        assert_eq!(transport.origin(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn non_utf8_body_is_a_deserialization_error() {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 512];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            stream
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                      Content-Length: 2\r\nConnection: close\r\n\r\n\xff\xfe",
                )
                .unwrap();
        });

        let transport = UreqTransport::new(&format!("http://127.0.0.1:{port}"));
        let err = transport
            .send(Arc::new(HttpRequest::get("/api/pokemon")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn decode_body_accepts_utf8() {
        assert_eq!(decode_body(b"{}".to_vec()).unwrap(), "{}");
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let transport = UreqTransport::new(&format!("http://127.0.0.1:{port}"));
        let err = transport
            .send(Arc::new(HttpRequest::get("/api/pokemon")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
