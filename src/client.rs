use reqwest::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::alerts::Alerts;
use crate::endpoint::{Endpoint, Region};
use crate::errors::{DevoError, Result};

/// Header carrying the Alerts API token
///
/// Devo documents it as `standAloneToken`; header names are case-insensitive.
pub const AUTH_HEADER: &str = "standalonetoken";

/// Transport timeout used unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent unless overridden
pub const DEFAULT_USER_AGENT: &str = concat!("devo-alerts/", env!("CARGO_PKG_VERSION"));

/// Client for the Devo Alerts API
///
/// Holds immutable configuration and a pooled transport, so it is cheap to
/// clone and safe to share between tasks.
///
/// # Example
///
/// ```rust,no_run
/// use devo_alerts::{DevoClient, ListRequest, Region};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = DevoClient::builder("my-standalone-token")
///         .region(Region::Eu)
///         .timeout(Duration::from_secs(30))
///         .build()?;
///
///     let alerts = client
///         .alerts()
///         .list(&ListRequest::new().with_name_filter("cpu"))
///         .await?;
///     println!("{} alert definitions", alerts.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DevoClient {
    client: ClientWithMiddleware,
    endpoint: Endpoint,
    token: HeaderValue,
    user_agent: HeaderValue,
}

impl DevoClient {
    /// Create a client for the US region with default settings
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(token: &str) -> Result<Self> {
        Self::builder(token).build()
    }

    /// Start configuring a client
    pub fn builder(token: &str) -> DevoClientBuilder {
        DevoClientBuilder::new(token)
    }

    /// Alert definition operations
    pub fn alerts(&self) -> Alerts<'_> {
        Alerts::new(self)
    }

    /// Get the base API URL
    pub fn endpoint(&self) -> &Url {
        self.endpoint.as_url()
    }

    /// Get the configured user agent
    pub fn user_agent(&self) -> &str {
        self.user_agent.to_str().unwrap_or_default()
    }

    pub(crate) fn resolve(&self, path: &str) -> Result<Url> {
        self.endpoint.resolve(path)
    }

    /// Build a request without a payload
    pub(crate) fn build(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTH_HEADER, self.token.clone())
            .header(USER_AGENT, self.user_agent.clone())
    }

    /// Build a request carrying `body` as JSON
    pub(crate) fn build_with_body<B>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<RequestBuilder>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body).map_err(DevoError::Serialize)?;
        Ok(self
            .build(method, url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload))
    }

    /// Send a request and decode the JSON response body into `T`
    pub(crate) async fn send_decoded<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = self.send_raw(request).await?;
        serde_json::from_slice(&body).map_err(DevoError::Decode)
    }

    /// Send a request and return the response body unparsed
    pub(crate) async fn send_raw(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        debug!(bytes = body.len(), "Received response body");
        Ok(body.to_vec())
    }

    /// Send a request whose response body is not needed
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(DevoError::Request)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "Devo API returned an error status");
            return Err(DevoError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

impl fmt::Debug for DevoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevoClient")
            .field("endpoint", &self.endpoint.as_url().as_str())
            .field("token", &self.token)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Configuration for a [`DevoClient`]
///
/// Everything is validated in [`DevoClientBuilder::build`], so a client that
/// was built never fails on configuration at call time.
pub struct DevoClientBuilder {
    token: String,
    region: Region,
    endpoint: Option<String>,
    user_agent: String,
    timeout: Duration,
    client: Option<ClientWithMiddleware>,
}

impl DevoClientBuilder {
    fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            region: Region::default(),
            endpoint: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: None,
        }
    }

    /// Use the default endpoint of a region (US unless set)
    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Override the endpoint; takes precedence over [`Self::region`]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the `User-Agent` header sent with every request
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Request timeout; ignored when a custom client is supplied
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom reqwest middleware client
    ///
    /// This allows you to add custom middleware (retry, logging, etc.)
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.client = Some(client);
        self
    }

    /// Validate the configuration and build the client
    ///
    /// # Errors
    ///
    /// Returns [`DevoError::Configuration`] for an invalid endpoint override,
    /// token, or user agent, and [`DevoError::BuildHttpClient`] if the HTTP
    /// client cannot be built.
    pub fn build(self) -> Result<DevoClient> {
        let endpoint = match &self.endpoint {
            Some(endpoint) => Endpoint::parse(endpoint)?,
            None => Endpoint::for_region(self.region),
        };

        let mut token = HeaderValue::from_str(&self.token).map_err(|_| {
            DevoError::Configuration("alerts token is not a valid header value".to_string())
        })?;
        token.set_sensitive(true);

        let user_agent = HeaderValue::from_str(&self.user_agent).map_err(|_| {
            DevoError::Configuration(format!(
                "user agent '{}' is not a valid header value",
                self.user_agent
            ))
        })?;

        let client = match self.client {
            Some(client) => client,
            None => {
                let client = Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(DevoError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        match &self.endpoint {
            Some(_) => debug!(endpoint = %endpoint.as_url(), "Built Devo alerts client"),
            None => debug!(
                region = %self.region,
                endpoint = %endpoint.as_url(),
                "Built Devo alerts client"
            ),
        }

        Ok(DevoClient {
            client,
            endpoint,
            token,
            user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{ALERTS_API_EU_DEFAULT_ENDPOINT, ALERTS_API_US_DEFAULT_ENDPOINT};
    use serde::ser::Error as _;
    use serde::{Deserialize, Serializer};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        value: u32,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            Err(S::Error::custom("unsupported value"))
        }
    }

    fn client_for(server: &MockServer) -> DevoClient {
        DevoClient::builder("nothinginparticular")
            .endpoint(server.uri())
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_endpoint_is_us() {
        let client = DevoClient::new("token").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            format!("{ALERTS_API_US_DEFAULT_ENDPOINT}/")
        );
        assert_eq!(client.user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_region_and_override() {
        let client = DevoClient::builder("token").region(Region::Eu).build().unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            format!("{ALERTS_API_EU_DEFAULT_ENDPOINT}/")
        );

        let client = DevoClient::builder("token")
            .region(Region::Eu)
            .endpoint("http://localhost:9000/alerts")
            .build()
            .unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:9000/alerts/");
    }

    #[test]
    fn test_empty_override_is_configuration_error() {
        let result = DevoClient::builder("token").endpoint("").build();
        assert!(matches!(result, Err(DevoError::Configuration(_))));
    }

    #[test]
    fn test_invalid_header_values_rejected_at_build() {
        let result = DevoClient::builder("bad\ntoken").build();
        assert!(matches!(result, Err(DevoError::Configuration(_))));

        let result = DevoClient::builder("token").user_agent("bad\r\nagent").build();
        assert!(matches!(result, Err(DevoError::Configuration(_))));
    }

    #[test]
    fn test_token_hidden_from_debug() {
        let client = DevoClient::new("super-secret-token").unwrap();
        assert!(!format!("{client:?}").contains("super-secret-token"));
    }

    #[test]
    fn test_serialize_failure() {
        let client = DevoClient::new("token").unwrap();
        let url = client.resolve("v1/alertDefinitions").unwrap();
        let result = client.build_with_body(Method::POST, url, &Unserializable);
        assert!(matches!(result, Err(DevoError::Serialize(_))));
    }

    #[tokio::test]
    async fn test_default_user_agent_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/echo"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = client.build(Method::GET, client.resolve("echo").unwrap());
        client.send_empty(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_raw_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/raw"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal server error"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = client.build(Method::GET, client.resolve("raw").unwrap());
        let result = client.send_raw(request).await;

        if let Err(DevoError::Api { status, body }) = result {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal server error");
        } else {
            panic!("Expected Api error");
        }
    }

    #[tokio::test]
    async fn test_request_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("standAloneToken", "nothinginparticular"))
            .and(header("user-agent", "iLikeCake/42.0.0"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": 7}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DevoClient::builder("nothinginparticular")
            .endpoint(mock_server.uri())
            .user_agent("iLikeCake/42.0.0")
            .build()
            .unwrap();

        let url = client.resolve("echo").unwrap();
        let request = client
            .build_with_body(Method::POST, url, &serde_json::json!({ "value": 7 }))
            .unwrap();
        let echo: Echo = client.send_decoded(request).await.unwrap();
        assert_eq!(echo, Echo { value: 7 });
    }

    #[tokio::test]
    async fn test_no_content_type_without_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/echo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = client.build(Method::GET, client.resolve("echo").unwrap());
        client.send_empty(request).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("content-type").is_none());
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_send_raw_returns_body_verbatim() {
        let mock_server = MockServer::start().await;
        let body = "not json at all";

        Mock::given(method("GET"))
            .and(path("/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = client.build(Method::GET, client.resolve("raw").unwrap());
        let raw = client.send_raw(request).await.unwrap();
        assert_eq!(raw, body.as_bytes());
    }

    #[tokio::test]
    async fn test_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/echo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"other": true}"#))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = client.build(Method::GET, client.resolve("echo").unwrap());
        let result = client.send_decoded::<Echo>(request).await;
        assert!(matches!(result, Err(DevoError::Decode(_))));
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/echo"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"bad request"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = client.build(Method::GET, client.resolve("echo").unwrap());
        let result = client.send_decoded::<serde_json::Value>(request).await;

        if let Err(DevoError::Api { status, body }) = result {
            assert_eq!(status, 400);
            assert_eq!(body, r#"{"error":"bad request"}"#);
        } else {
            panic!("Expected Api error");
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service unavailable"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = client.build(Method::GET, client.resolve("echo").unwrap());
        let err = client.send_empty(request).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let client = DevoClient::builder("token")
            .endpoint(mock_server.uri())
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let request = client.build(Method::GET, client.resolve("slow").unwrap());
        let err = client.send_empty(request).await.unwrap_err();
        assert!(matches!(err, DevoError::Request(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_custom_http_client() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("standAloneToken", "token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let http = ClientBuilder::new(Client::new()).build();
        let client = DevoClient::builder("token")
            .endpoint(mock_server.uri())
            .http_client(http)
            .build()
            .unwrap();

        let request = client.build(Method::GET, client.resolve("anything").unwrap());
        client.send_empty(request).await.unwrap();
    }
}
