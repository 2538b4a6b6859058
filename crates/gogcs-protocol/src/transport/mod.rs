//! Transport layer for content system requests
//!
//! The manifest engine talks to the network only through [`ContentFetcher`].
//! [`HttpTransport`] is the reqwest-backed implementation; tests and callers
//! with their own HTTP stack can supply another one.

use async_trait::async_trait;
use bytes::Bytes;
use gogcs_formats::document::inflate;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::sync::{Arc, Once};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{ProtocolError, Result};
use crate::retry::RetryPolicy;

/// Install the process-wide rustls crypto provider
///
/// reqwest is built without a bundled provider; every client constructor
/// calls this first. Installing twice is harmless.
pub fn ensure_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Authenticated fetch operations the engine depends on
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// GET a URL and return the raw body
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes>;

    /// GET a URL and decode the body as UTF-8
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let body = self.fetch_bytes(url).await?;
        Ok(String::from_utf8(body.to_vec())?)
    }

    /// GET a JSON document, zlib-inflating the body first when `compressed`
    async fn fetch_document(&self, url: &str, compressed: bool) -> Result<Bytes> {
        let body = self.fetch_bytes(url).await?;
        if compressed {
            Ok(Bytes::from(inflate(&body)?))
        } else {
            Ok(body)
        }
    }
}

/// HTTP client with connection pooling
///
/// Clones share one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client with custom configuration
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        ensure_crypto_provider();

        let client = ClientBuilder::new()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .tcp_keepalive(config.tcp_keepalive)
            .http2_adaptive_window(true)
            .gzip(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// TCP keep-alive duration
    pub tcp_keepalive: Option<Duration>,

    /// User agent
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for HttpConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(30),
            // Chunk fan-out hits one CDN host hard
            pool_max_idle_per_host: 16,
            timeout: config.request_timeout,
            connect_timeout: config.connect_timeout,
            tcp_keepalive: Some(Duration::from_secs(60)),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// reqwest-backed [`ContentFetcher`] with bearer authentication and retries
pub struct HttpTransport {
    client: HttpClient,
    access_token: Option<String>,
    retry_policy: RetryPolicy,
}

impl HttpTransport {
    /// Create a transport from client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::with_config(&HttpConfig::from(config))?,
            access_token: config.access_token.clone(),
            retry_policy: config.retry_policy.clone(),
        })
    }

    /// Create a transport around an existing client
    ///
    /// Transports built from clones of one [`HttpClient`] share its pool,
    /// e.g. when each carries a different account's token.
    pub fn with_client(
        client: HttpClient,
        access_token: Option<String>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            access_token,
            retry_policy,
        }
    }

    async fn get_once(&self, url: &str) -> Result<Bytes> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.inner().get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.bytes().await?),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse().ok())
                    .map(Duration::from_secs);
                Err(ProtocolError::RateLimited { retry_after })
            }
            StatusCode::SERVICE_UNAVAILABLE => Err(ProtocolError::ServiceUnavailable),
            status if status.is_server_error() => Err(ProtocolError::ServerError(status)),
            status => Err(ProtocolError::HttpStatus(status)),
        }
    }
}

#[async_trait]
impl ContentFetcher for HttpTransport {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        self.retry_policy.execute(|| self.get_once(url)).await
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer, token: Option<&str>, retries: u32) -> HttpTransport {
        let mut config = ClientConfig::default().with_base_url(&server.uri());
        config.access_token = token.map(str::to_string);
        config.retry_policy = RetryPolicy {
            max_attempts: retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            multiplier: 2.0,
            jitter: false,
        };
        HttpTransport::new(&config).expect("Operation should succeed")
    }

    #[tokio::test]
    async fn test_transports_share_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .and(header("authorization", "Bearer first"))
            .respond_with(ResponseTemplate::new(200).set_body_string("one"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .and(header("authorization", "Bearer second"))
            .respond_with(ResponseTemplate::new(200).set_body_string("two"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::with_config(&HttpConfig::default()).expect("Operation should succeed");
        let first = HttpTransport::with_client(client.clone(), Some("first".into()), RetryPolicy::none());
        let second = HttpTransport::with_client(client, Some("second".into()), RetryPolicy::none());
        assert!(Arc::ptr_eq(&first.client.client, &second.client.client));

        let url = format!("{}/doc", server.uri());
        assert_eq!(first.fetch_text(&url).await.unwrap(), "one");
        assert_eq!(second.fetch_text(&url).await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server, Some("secret"), 0);
        let text = transport
            .fetch_text(&format!("{}/doc", server.uri()))
            .await
            .expect("Operation should succeed");
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_fetch_compressed_document() {
        let server = MockServer::start().await;
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(br#"{"version": 2}"#)
            .expect("Operation should succeed");
        let body = encoder.finish().expect("Operation should succeed");

        Mock::given(method("GET"))
            .and(path("/meta/ab/cd/abcd"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;

        let transport = transport(&server, None, 0);
        let doc = transport
            .fetch_document(&format!("{}/meta/ab/cd/abcd", server.uri()), true)
            .await
            .expect("Operation should succeed");
        assert_eq!(&doc[..], br#"{"version": 2}"#);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let transport = transport(&server, None, 0);
        assert!(matches!(
            transport.fetch_bytes(&format!("{}/missing", server.uri())).await,
            Err(ProtocolError::HttpStatus(StatusCode::NOT_FOUND))
        ));

        let err = transport
            .fetch_bytes(&format!("{}/limited", server.uri()))
            .await
            .expect_err("Test operation should fail");
        assert_eq!(err.retry_after_hint(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let transport = transport(&server, None, 2);
        assert!(matches!(
            transport.fetch_bytes(&format!("{}/flaky", server.uri())).await,
            Err(ProtocolError::ServerError(StatusCode::BAD_GATEWAY))
        ));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forbidden"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server, None, 3);
        assert!(transport
            .fetch_bytes(&format!("{}/forbidden", server.uri()))
            .await
            .is_err());
    }
}
