//! HTTP transport capability

use async_trait::async_trait;
use http::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;
use vsync_errors::{VaultError, VaultResult};

use crate::auth::Credential;
use crate::config::ClientSettings;

/// Header carrying the bearer credential on authenticated requests
pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// The request never produced an HTTP response
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A single JSON request against the store
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub token: Option<Credential>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            token: None,
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn with_token(mut self, credential: &Credential) -> Self {
        self.token = Some(credential.clone());
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> VaultResult<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| VaultError::invalid_parameter(format!("request body: {}", e)))?;
        self.body = Some(body);
        Ok(self)
    }
}

/// Status and raw body of a store response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Injected HTTP capability.
///
/// Implementations perform exactly one request per call. Timeouts, TLS and
/// connection reuse are their concern; retries are not performed by anyone.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Build `{base}/v1/{path}`
pub fn api_url(base_url: &Url, path: &str) -> String {
    format!(
        "{}/v1/{}",
        base_url.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `reqwest`-backed HttpClient
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    http: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(settings: &ClientSettings) -> VaultResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| VaultError::invalid_parameter(format!("http client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending store request");

        let mut builder = self.http.request(request.method, &request.url);
        if let Some(ref token) = request.token {
            builder = builder.header(VAULT_TOKEN_HEADER, token.expose());
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(format!("failed to read response body: {}", e)))?;

        debug!(status = status.as_u16(), "store responded");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_api_url_joins_base_and_path() {
        let base = Url::parse("http://127.0.0.1:8200").unwrap();
        assert_eq!(
            api_url(&base, "sys/seal-status"),
            "http://127.0.0.1:8200/v1/sys/seal-status"
        );

        let base = Url::parse("https://vault.local:8200/").unwrap();
        assert_eq!(
            api_url(&base, "/secret/?list=true"),
            "https://vault.local:8200/v1/secret/?list=true"
        );
    }

    #[test]
    fn test_request_debug_hides_token() {
        let request = HttpRequest::get("http://vault/v1/secret/foo")
            .with_token(&Credential::new("s.super-secret"));
        let debug_output = format!("{:?}", request);
        assert!(!debug_output.contains("s.super-secret"));
    }

    #[tokio::test]
    async fn test_reqwest_client_sends_token_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/secret/foo"))
            .and(header(VAULT_TOKEN_HEADER, "tok-123"))
            .and(body_json(json!({"k": "v"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReqwestClient::new(&ClientSettings::default()).unwrap();
        let request = HttpRequest::post(format!("{}/v1/secret/foo", server.uri()))
            .with_token(&Credential::new("tok-123"))
            .with_json(&json!({"k": "v"}))
            .unwrap();

        let response = client.send(request).await.unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_reqwest_client_omits_token_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists(VAULT_TOKEN_HEADER))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/sys/seal-status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sealed": false})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReqwestClient::new(&ClientSettings::default()).unwrap();
        let response = client
            .send(HttpRequest::get(format!("{}/v1/sys/seal-status", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let parsed: serde_json::Value = response.json().unwrap();
        assert_eq!(parsed["sealed"], false);
    }

    #[tokio::test]
    async fn test_reqwest_client_reports_connection_failure() {
        // Nothing listens on port 9 locally.
        let client = ReqwestClient::new(&ClientSettings::default()).unwrap();
        let result = client
            .send(HttpRequest::get("http://127.0.0.1:9/v1/sys/seal-status"))
            .await;
        assert!(result.is_err());
    }
}
