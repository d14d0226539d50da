//! HTTP client for the storyloom backend
//!
//! [`ApiClient`] is a thin wrapper over a [`Transport`]: it attaches the
//! project password header, and normalizes every response into either JSON
//! or a [`LoomError`] carrying the server's message.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::api::stream::{self, StreamHandler};
use crate::core::config::Config;
use crate::core::session::SessionStore;
use crate::error::{LoomError, Result};

/// Header carrying the password of a protected project
pub const PASSWORD_HEADER: &str = "X-Project-Password";

/// Path prefix of every backend route
const API_PREFIX: &str = "/api/v1";

/// Body chunks of a streaming response
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// A request as the client hands it to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Route below `/api/v1`, starting with `/`
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A fully buffered response
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .map(status_text)
            .unwrap_or_else(|_| format!("HTTP {}", status));
        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A response whose body is consumed incrementally
pub struct StreamResponse {
    pub status: u16,
    pub status_text: String,
    pub body: ByteStream,
}

/// Seam between the client and the network
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Send a request and buffer the whole response
    fn send(&self, request: ApiRequest) -> BoxFuture<'static, Result<RawResponse>>;

    /// Send a request and hand back the body as it arrives
    fn open_stream(&self, request: ApiRequest) -> BoxFuture<'static, Result<StreamResponse>>;
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}{}", base, API_PREFIX, path))?)
    }

    fn build(&self, request: &ApiRequest) -> Result<reqwest::RequestBuilder> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url_for(&request.path)?);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'static, Result<RawResponse>> {
        let builder = self.build(&request);
        Box::pin(async move {
            let response = builder?.send().await?;
            let status = response.status();
            let body = response.bytes().await?.to_vec();
            Ok(RawResponse {
                status: status.as_u16(),
                status_text: status_text(status),
                body,
            })
        })
    }

    fn open_stream(&self, request: ApiRequest) -> BoxFuture<'static, Result<StreamResponse>> {
        let builder = self.build(&request);
        Box::pin(async move {
            let response = builder?.send().await?;
            let status = response.status();
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()).map_err(LoomError::from))
                .boxed();
            Ok(StreamResponse {
                status: status.as_u16(),
                status_text: status_text(status),
                body,
            })
        })
    }
}

/// Error body shape used by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Turn a buffered response into JSON or a normalized error
///
/// - 204 resolves to an empty object
/// - other 2xx bodies are parsed as JSON (an empty body also becomes `{}`)
/// - non-2xx with a JSON string `detail` rejects with that message
/// - any other non-2xx rejects with the status text
pub fn normalize_response(raw: RawResponse) -> Result<Value> {
    if raw.status == 204 {
        return Ok(Value::Object(Default::default()));
    }

    if raw.is_success() {
        if raw.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Default::default()));
        }
        return Ok(serde_json::from_slice(&raw.body)?);
    }

    let message = match serde_json::from_slice::<ErrorBody>(&raw.body) {
        Ok(ErrorBody {
            detail: Value::String(detail),
        }) => detail,
        _ => raw.status_text,
    };

    Err(LoomError::Api {
        status: raw.status,
        message,
    })
}

/// Generic acknowledgement returned by delete/reorder endpoints
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Storyloom backend client
///
/// Cheap to clone; clones share the transport and the session store.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client talking HTTP to `config.api_url`
    ///
    /// Callers resolve overrides first with [`Config::apply_overrides`].
    pub fn new(config: &Config, session: SessionStore) -> Result<Self> {
        let transport = HttpTransport::new(&config.api_url, config.request_timeout())?;
        Ok(Self::with_transport(Arc::new(transport), session))
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn prepare(
        &self,
        method: Method,
        path: &str,
        project_id: Option<&str>,
        body: Option<Value>,
    ) -> ApiRequest {
        let mut request = ApiRequest::new(method, path);
        if let Some(password) = project_id.and_then(|id| self.session.password(id)) {
            request = request.with_header(PASSWORD_HEADER, password);
        }
        if let Some(body) = body {
            request = request.with_body(body);
        }
        request
    }

    /// Send a request and return the normalized JSON body
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        project_id: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value> {
        let request = self.prepare(method, path, project_id, body);
        tracing::debug!("{} {}", request.method, request.path);
        let raw = self.transport.send(request).await?;
        normalize_response(raw)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        project_id: Option<&str>,
        body: Option<Value>,
    ) -> Result<T> {
        let value = self.execute(method, path, project_id, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        project_id: Option<&str>,
    ) -> Result<T> {
        self.call(Method::GET, path, project_id, None).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        project_id: Option<&str>,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.call(Method::POST, path, project_id, Some(body)).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        project_id: Option<&str>,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.call(Method::PUT, path, project_id, Some(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        project_id: Option<&str>,
    ) -> Result<T> {
        self.call(Method::DELETE, path, project_id, None).await
    }

    /// POST to a streaming endpoint and feed the `data:` lines to `handler`
    ///
    /// Exactly one of `on_complete` / `on_error` is called.
    pub async fn post_stream<B: Serialize, H: StreamHandler>(
        &self,
        path: &str,
        project_id: Option<&str>,
        body: &B,
        handler: &mut H,
    ) {
        let body = match serde_json::to_value(body) {
            Ok(body) => body,
            Err(e) => return handler.on_error(e.into()),
        };
        let request = self.prepare(Method::POST, path, project_id, Some(body));
        tracing::debug!("{} {} (stream)", request.method, request.path);

        let response = match self.transport.open_stream(request).await {
            Ok(response) => response,
            Err(e) => return handler.on_error(e),
        };

        if !(200..300).contains(&response.status) {
            let body = collect_body(response.body).await;
            let raw = RawResponse {
                status: response.status,
                status_text: response.status_text,
                body,
            };
            let err = match normalize_response(raw) {
                Err(e) => e,
                Ok(_) => LoomError::Stream("unexpected response".to_string()),
            };
            return handler.on_error(err);
        }

        stream::drive(response.body, handler).await;
    }
}

/// Gather whatever body an error response carried; read errors end the body
async fn collect_body(mut body: ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(Ok(chunk)) = body.next().await {
        out.extend_from_slice(&chunk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_with(mock: MockTransport) -> ApiClient {
        ApiClient::with_transport(Arc::new(mock), SessionStore::new())
    }

    #[test]
    fn test_204_resolves_to_empty_object() {
        let value = normalize_response(RawResponse::new(204, Vec::new())).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_success_body_is_parsed() {
        let raw = RawResponse::json(200, &json!({"id": "p1", "name": "Saga"}));
        assert_eq!(normalize_response(raw).unwrap()["name"], "Saga");
    }

    #[test]
    fn test_error_uses_detail_field() {
        let raw = RawResponse::json(404, &json!({"detail": "Project not found"}));
        let err = normalize_response(raw).unwrap_err();
        assert_eq!(err.to_string(), "Project not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_non_json_error_uses_status_text() {
        let raw = RawResponse::new(502, "<html>Bad gateway</html>");
        let err = normalize_response(raw).unwrap_err();
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[test]
    fn test_structured_detail_falls_back_to_status_text() {
        let raw = RawResponse::json(422, &json!({"detail": [{"loc": ["body", "name"]}]}));
        let err = normalize_response(raw).unwrap_err();
        assert_eq!(err.to_string(), "Unprocessable Entity");
    }

    #[test]
    fn test_invalid_success_body_is_json_error() {
        let raw = RawResponse::new(200, "not json");
        assert!(matches!(normalize_response(raw), Err(LoomError::Json(_))));
    }

    #[test]
    fn test_http_transport_joins_api_prefix() {
        let transport =
            HttpTransport::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        let url = transport.url_for("/projects/p1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/projects/p1");
    }

    #[tokio::test]
    async fn test_password_header_attached_from_session() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.path == "/projects/p1" && req.header(PASSWORD_HEADER) == Some("open-sesame")
            })
            .times(1)
            .returning(|_| {
                Box::pin(async { Ok(RawResponse::json(200, &json!({"id": "p1", "name": "Saga"}))) })
            });

        let client = client_with(mock);
        client.session().set_password("p1", "open-sesame");

        let value: Value = client.get("/projects/p1", Some("p1")).await.unwrap();
        assert_eq!(value["id"], "p1");
    }

    #[tokio::test]
    async fn test_no_header_without_cached_password() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.header(PASSWORD_HEADER).is_none())
            .times(1)
            .returning(|_| Box::pin(async { Ok(RawResponse::new(204, Vec::new())) }));

        let client = client_with(mock);
        let ack: Ack = client.delete("/projects/p2", Some("p2")).await.unwrap();
        assert!(ack.message.is_none());
    }

    #[tokio::test]
    async fn test_server_error_surfaces_detail() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| {
            Box::pin(async {
                Ok(RawResponse::json(
                    400,
                    &json!({"detail": "The uncategorized group cannot be deleted."}),
                ))
            })
        });

        let client = client_with(mock);
        let err = client
            .delete::<Ack>("/projects/p1/groups/g0", Some("p1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "The uncategorized group cannot be deleted.");
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.method == Method::POST && req.body == Some(json!({"name": "Villains"})))
            .times(1)
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!({"message": "ok"}))) }));

        let client = client_with(mock);
        let ack: Ack = client
            .post("/projects/p1/groups", Some("p1"), &json!({"name": "Villains"}))
            .await
            .unwrap();
        assert_eq!(ack.message.as_deref(), Some("ok"));
    }
}
