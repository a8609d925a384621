//! Middleware pipeline and the default stages.
//!
//! # Design
//! A stage takes the in-flight result of a call plus the request that
//! produced it and returns a new in-flight result. `apply_middleware` folds
//! the configured stages left to right over the transport's future. Every
//! stage receives its input whatever it settles to, so a stage that does
//! not want to handle a failure must hand it on unchanged. A stage recovers
//! by resolving instead.
//!
//! The in-flight value is a `Reply`: the raw response until a decoding
//! stage turns it into JSON.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ApiError, ResponseError};
use crate::http::{HttpRequest, HttpResponse};

/// Value carried between middleware stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Response(HttpResponse),
    Json(Value),
}

impl Reply {
    /// The decoded JSON, or `Undecoded` if no stage decoded the body.
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            Reply::Json(value) => Ok(value),
            Reply::Response(response) => Err(ApiError::Undecoded {
                status: response.status,
            }),
        }
    }
}

/// An in-flight result of one logical call.
pub type InFlight = BoxFuture<'static, Result<Reply, ApiError>>;

/// A composable transform over an in-flight result.
pub trait Middleware: Send + Sync {
    fn apply(&self, in_flight: InFlight, request: Arc<HttpRequest>) -> InFlight;
}

impl<F> Middleware for F
where
    F: Fn(InFlight, Arc<HttpRequest>) -> InFlight + Send + Sync,
{
    fn apply(&self, in_flight: InFlight, request: Arc<HttpRequest>) -> InFlight {
        self(in_flight, request)
    }
}

/// Thread `initial` through `stages` in order. Every stage sees the same
/// request.
pub fn apply_middleware(
    initial: InFlight,
    request: Arc<HttpRequest>,
    stages: &[Arc<dyn Middleware>],
) -> InFlight {
    stages
        .iter()
        .fold(initial, |in_flight, stage| stage.apply(in_flight, Arc::clone(&request)))
}

/// Checking the status and then decoding the body as JSON.
pub fn default_middleware() -> Vec<Arc<dyn Middleware>> {
    let check: Arc<dyn Middleware> = Arc::new(check_status);
    let parse: Arc<dyn Middleware> = Arc::new(parse_json);
    vec![check, parse]
}

/// Resolves 2xx responses unchanged and rejects everything else with a
/// `ResponseError` carrying the raw response.
pub fn check_status(in_flight: InFlight, _request: Arc<HttpRequest>) -> InFlight {
    async move {
        match in_flight.await? {
            Reply::Response(response) if !response.is_success() => {
                Err(ApiError::Response(ResponseError::new(response)))
            }
            reply => Ok(reply),
        }
    }
    .boxed()
}

/// Decodes the response body as JSON.
///
/// A 204 resolves to an empty object without looking at the body. Anything
/// else must declare a content type containing `json`.
pub fn parse_json(in_flight: InFlight, _request: Arc<HttpRequest>) -> InFlight {
    async move {
        let response = match in_flight.await? {
            Reply::Response(response) => response,
            json => return Ok(json),
        };
        if response.status == 204 {
            return Ok(Reply::Json(Value::Object(Map::new())));
        }
        match response.header("Content-Type") {
            Some(content_type) if content_type.contains("json") => {}
            content_type => {
                return Err(ApiError::NotJson {
                    content_type: content_type.map(str::to_string),
                })
            }
        }
        let value: Value = serde_json::from_str(&response.body)?;
        Ok(Reply::Json(value))
    }
    .boxed()
}

/// Logs how each call settled without changing the outcome.
pub fn trace_requests(in_flight: InFlight, request: Arc<HttpRequest>) -> InFlight {
    async move {
        let outcome = in_flight.await;
        match &outcome {
            Ok(Reply::Response(response)) => debug!(
                method = %request.method,
                url = %request.url(),
                status = response.status,
                "request settled"
            ),
            Ok(Reply::Json(_)) => debug!(
                method = %request.method,
                url = %request.url(),
                "request decoded"
            ),
            Err(err) => warn!(
                method = %request.method,
                url = %request.url(),
                error = %err,
                "request failed"
            ),
        }
        outcome
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use futures::future;
    use serde_json::json;

    fn request() -> Arc<HttpRequest> {
        Arc::new(HttpRequest::get("/api/pokemon"))
    }

    fn resolved(response: HttpResponse) -> InFlight {
        future::ready(Ok(Reply::Response(response))).boxed()
    }

    fn status(code: u16) -> HttpResponse {
        HttpResponse::new(code)
            .with_status_text(format!("status {code}"))
            .with_body("ok")
    }

    #[tokio::test]
    async fn check_status_passes_2xx_through_unchanged() {
        for code in [200, 201, 204, 250, 299] {
            let reply = check_status(resolved(status(code)), request()).await.unwrap();
            assert_eq!(reply, Reply::Response(status(code)));
        }
    }

    #[tokio::test]
    async fn check_status_rejects_everything_else() {
        for code in [100, 199, 300, 404, 500] {
            let err = check_status(resolved(status(code)), request()).await.unwrap_err();
            assert_eq!(err.to_string(), format!("status {code}"));
            assert_eq!(err.response(), Some(&status(code)));
        }
    }

    #[tokio::test]
    async fn parse_json_decodes_json_content_types() {
        for content_type in [
            "application/json",
            "application/json;charset=UTF-8",
            "application/vnd.spring-boot.actuator.v1+json",
        ] {
            let response = HttpResponse::new(200)
                .with_header("Content-Type", content_type)
                .with_body(r#"{"name":"bulbasaur"}"#);
            let reply = parse_json(resolved(response), request()).await.unwrap();
            assert_eq!(reply, Reply::Json(json!({ "name": "bulbasaur" })));
        }
    }

    #[tokio::test]
    async fn parse_json_returns_empty_object_for_204() {
        let response = HttpResponse::new(204)
            .with_header("Content-Type", "text/html")
            .with_body("<not json>");
        let reply = parse_json(resolved(response), request()).await.unwrap();
        assert_eq!(reply, Reply::Json(json!({})));
    }

    #[tokio::test]
    async fn parse_json_refuses_non_json_content_type() {
        let response = HttpResponse::new(200)
            .with_header("Content-Type", "text/plain")
            .with_body(r#"{"name":"bulbasaur"}"#);
        let err = parse_json(resolved(response), request()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotJson { content_type: Some(ref ct) } if ct == "text/plain"));
        assert_eq!(
            err.to_string(),
            "spring-connect: Content-Type is not json, will not parse."
        );
    }

    #[tokio::test]
    async fn parse_json_refuses_missing_content_type() {
        let response = HttpResponse::new(200).with_body("{}");
        let err = parse_json(resolved(response), request()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotJson { content_type: None }));
    }

    #[tokio::test]
    async fn parse_json_rejects_malformed_body() {
        let response = HttpResponse::json("{not json");
        let err = parse_json(resolved(response), request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(ref msg) if !msg.is_empty()));
    }

    #[tokio::test]
    async fn default_chain_forks_on_status() {
        let stages = default_middleware();
        let ok = apply_middleware(resolved(HttpResponse::json(r#"[1,2]"#)), request(), &stages)
            .await
            .unwrap();
        assert_eq!(ok, Reply::Json(json!([1, 2])));

        let not_found = HttpResponse::new(404)
            .with_status_text("Not Found")
            .with_header("Content-Type", "application/json")
            .with_body("{}");
        let err = apply_middleware(resolved(not_found), request(), &stages)
            .await
            .unwrap_err();
        assert!(err.is_status(404));
    }

    #[tokio::test]
    async fn stages_run_in_configuration_order_with_the_same_request() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stage = |name: &'static str| -> Arc<dyn Middleware> {
            let seen = Arc::clone(&seen);
            Arc::new(move |in_flight: InFlight, request: Arc<HttpRequest>| -> InFlight {
                let seen = Arc::clone(&seen);
                async move {
                    let reply = in_flight.await;
                    seen.lock().unwrap().push(format!("{name} {}", request.path));
                    reply
                }
                .boxed()
            })
        };
        let stages = vec![stage("first"), stage("second"), stage("third")];

        apply_middleware(resolved(status(200)), request(), &stages)
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first /api/pokemon", "second /api/pokemon", "third /api/pokemon"]
        );
    }

    #[tokio::test]
    async fn failures_flow_through_every_stage_until_recovered() {
        let recover: Arc<dyn Middleware> =
            Arc::new(|in_flight: InFlight, _request: Arc<HttpRequest>| -> InFlight {
                async move {
                    match in_flight.await {
                        Err(err) if err.is_status(500) => Ok(Reply::Json(json!({ "recovered": true }))),
                        other => other,
                    }
                }
                .boxed()
            });
        let mut stages = default_middleware();
        stages.push(recover);

        let reply = apply_middleware(resolved(status(500)), request(), &stages)
            .await
            .unwrap();
        assert_eq!(reply, Reply::Json(json!({ "recovered": true })));
    }

    #[tokio::test]
    async fn empty_chain_leaves_the_raw_response() {
        let reply = apply_middleware(resolved(status(418)), request(), &[])
            .await
            .unwrap();
        assert!(matches!(reply.clone(), Reply::Response(r) if r.status == 418));
        assert!(matches!(reply.into_json(), Err(ApiError::Undecoded { status: 418 })));
    }

    #[tokio::test]
    async fn trace_requests_does_not_alter_the_outcome() {
        let reply = trace_requests(resolved(status(201)), request()).await.unwrap();
        assert_eq!(reply, Reply::Response(status(201)));
    }
}
