//! HTTP request and response types shared by the transport and the pipeline.
//!
//! # Design
//! An `HttpRequest` describes one logical call as plain data: method, path,
//! optional query parameters and an optional payload. It is created once,
//! wrapped in an `Arc`, and handed unchanged to the transport and to every
//! middleware stage, so a stage can always see what produced the value it
//! is looking at.
//!
//! `HttpResponse` is the raw outcome a transport hands back. Status
//! classification and body decoding are left to the middleware pipeline.

use std::fmt;

use serde_json::Value;

use crate::query::{build_url, QueryParams};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a POST, PUT or PATCH request.
///
/// The caller picks the encoding explicitly: JSON documents are sent as
/// `application/json`, forms as `multipart/form-data`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Multipart(Form),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Form> for Payload {
    fn from(form: Form) -> Self {
        Payload::Multipart(form)
    }
}

/// An ordered multipart form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    parts: Vec<FormPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::File {
                filename: filename.into(),
                content_type: content_type.into(),
                bytes,
            },
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Render the form as a `multipart/form-data` body delimited by `boundary`.
    pub fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match &part.value {
                FormValue::Text(text) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            part.name
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(text.as_bytes());
                }
                FormValue::File {
                    filename,
                    content_type,
                    bytes,
                } => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n",
                            part.name
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(bytes);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        out
    }
}

/// Describes one logical call. Never mutated once the call is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Option<QueryParams>,
    pub payload: Option<Payload>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            payload: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self::new(HttpMethod::Post, path).with_payload(payload)
    }

    pub fn put(path: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self::new(HttpMethod::Put, path).with_payload(payload)
    }

    pub fn patch(path: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self::new(HttpMethod::Patch, path).with_payload(payload)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_query(mut self, query: impl Into<Option<QueryParams>>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// The request target: path plus encoded query string.
    pub fn url(&self) -> String {
        build_url(&self.path, self.query.as_ref())
    }
}

/// An HTTP response described as plain data.
///
/// Built by a `Transport` after executing an `HttpRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// A 200 response carrying `body` as `application/json`.
    pub fn json(body: impl Into<String>) -> Self {
        Self::new(200)
            .with_status_text("OK")
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse::new(200).with_header("content-TYPE", "application/json");
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.header("Accept"), None);
    }

    #[test]
    fn success_range_is_inclusive() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(299).is_success());
        assert!(!HttpResponse::new(199).is_success());
        assert!(!HttpResponse::new(300).is_success());
    }

    #[test]
    fn request_url_includes_query() {
        let req = HttpRequest::get("/api/pokemon")
            .with_query(QueryParams::new().with("page", 1).with("name", "pikachu"));
        assert_eq!(req.url(), "/api/pokemon?page=1&name=pikachu");
    }

    #[test]
    fn post_carries_json_payload() {
        let req = HttpRequest::post("/api/pokemon", json!({ "name": "bulbasaur" }));
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.payload, Some(Payload::Json(json!({ "name": "bulbasaur" }))));
    }

    #[test]
    fn form_encodes_text_and_file_parts() {
        let form = Form::new()
            .text("name", "bulbasaur")
            .file("sprite", "b.png", "image/png", vec![1, 2, 3]);
        let body = form.encode("XYZ");
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("--XYZ\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nbulbasaur\r\n"));
        assert!(text.contains("name=\"sprite\"; filename=\"b.png\"\r\nContent-Type: image/png\r\n\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }
}
