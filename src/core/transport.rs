//! Transport abstraction over the tracking backend's REST API
//!
//! The core only ever talks to a [`Transport`]; [`HttpTransport`] is the
//! production implementation on top of reqwest.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::core::error::TrackerError;

/// HTTP verbs used by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        write!(f, "{}", s)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A file carried in a multipart upload
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Request payload
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    /// Files are sent under the `files` field name, followed by plain text fields
    Multipart {
        files: Vec<FilePart>,
        fields: Vec<(String, String)>,
    },
}

/// A single request to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, files: Vec<FilePart>, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Multipart { files, fields };
        self
    }

    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// Raw response: status code plus body bytes
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort human-readable message from an error body
    ///
    /// Looks at the `message` and `error` keys of a JSON body, then the raw
    /// text, and finally falls back to the status code.
    pub fn error_message(&self) -> String {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            for key in ["message", "error"] {
                if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                    if !msg.trim().is_empty() {
                        return msg.trim().to_string();
                    }
                }
            }
        }

        let text = String::from_utf8_lossy(&self.body);
        let text = text.trim();
        if !text.is_empty() && !text.starts_with('{') && text.len() <= 200 {
            return text.to_string();
        }

        format!("Request failed with status {}", self.status)
    }

    /// Turn a non-2xx response into the matching error
    pub fn into_result(self) -> Result<Self, TrackerError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TrackerError::from_status(self.status, self.error_message()))
        }
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TrackerError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Anything that can carry an [`ApiRequest`] to the backend
///
/// Implementations return `Ok` for every HTTP response, success or not;
/// `Err` is reserved for failures to reach the server at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TrackerError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the given server root (e.g. `http://localhost:8080`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Server {
                status: None,
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn unreachable(&self, err: reqwest::Error) -> TrackerError {
        let message = if err.is_timeout() {
            format!("Request to {} timed out", self.base_url)
        } else if err.is_connect() {
            format!("Could not connect to {}", self.base_url)
        } else {
            err.to_string()
        };
        TrackerError::Server {
            status: None,
            message,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TrackerError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, path = %request.path, "sending request");

        let mut builder = self.client.request(request.method.into(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { files, fields } => {
                let mut form = reqwest::multipart::Form::new();
                for file in files {
                    let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
                    form = form.part("files", part);
                }
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await.map_err(|e| self.unreachable(e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.unreachable(e))?;

        debug!(status, bytes = body.len(), "response received");
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

/// In-memory transport for tests: canned responses per route, every request recorded
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    type Route = (Method, String, ApiResponse);

    #[derive(Default)]
    pub struct RecordingTransport {
        routes: Mutex<Vec<Route>>,
        requests: Mutex<Vec<ApiRequest>>,
        offline: bool,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// A transport whose every call fails as if the server were down
        pub fn offline() -> Self {
            Self {
                offline: true,
                ..Self::default()
            }
        }

        /// Register a response; later registrations for the same route win
        pub fn on(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
            self.on_bytes(method, path, status, body.to_string().into_bytes());
        }

        pub fn on_bytes(&self, method: Method, path: &str, status: u16, body: Vec<u8>) {
            self.routes
                .lock()
                .unwrap()
                .push((method, path.to_string(), ApiResponse::new(status, body)));
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.method == method && r.path == path)
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TrackerError> {
            self.requests.lock().unwrap().push(request.clone());

            if self.offline {
                return Err(TrackerError::Server {
                    status: None,
                    message: "Could not connect to test server".to_string(),
                });
            }

            let routes = self.routes.lock().unwrap();
            let found = routes
                .iter()
                .rev()
                .find(|(method, path, _)| *method == request.method && *path == request.path)
                .map(|(_, _, response)| response.clone());

            Ok(found.unwrap_or_else(|| {
                ApiResponse::new(404, serde_json::json!({"message": "no route"}).to_string())
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_json_message() {
        let response = ApiResponse::new(400, json!({"message": "Project not editable"}).to_string());
        assert_eq!(response.error_message(), "Project not editable");

        let response = ApiResponse::new(500, json!({"error": "Internal Server Error"}).to_string());
        assert_eq!(response.error_message(), "Internal Server Error");
    }

    #[test]
    fn test_error_message_plain_text_and_empty() {
        let response = ApiResponse::new(403, "Account is suspended");
        assert_eq!(response.error_message(), "Account is suspended");

        let response = ApiResponse::new(502, Vec::new());
        assert_eq!(response.error_message(), "Request failed with status 502");
    }

    #[test]
    fn test_into_result_maps_status() {
        assert!(ApiResponse::new(204, Vec::new()).into_result().is_ok());

        let err = ApiResponse::new(404, json!({"message": "Project not found"}).to_string())
            .into_result()
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { ref message } if message == "Project not found"));
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::put("/api/projects/7/status")
            .json(json!({"status": "ACCEPTED"}))
            .bearer(Some("tok".to_string()));
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.bearer.as_deref(), Some("tok"));
        assert!(matches!(request.body, RequestBody::Json(_)));
    }

    #[test]
    fn test_http_transport_trims_base_url() {
        let transport = HttpTransport::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_recording_transport_routes() {
        let transport = testing::RecordingTransport::new();
        transport.on(Method::Get, "/api/projects", 200, json!([]));

        let ok = transport.send(ApiRequest::get("/api/projects")).await.unwrap();
        assert_eq!(ok.status, 200);

        let missing = transport.send(ApiRequest::get("/api/nope")).await.unwrap();
        assert_eq!(missing.status, 404);
        assert_eq!(transport.request_count(), 2);
    }
}
