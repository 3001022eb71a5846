use crate::error::{ErrorKind, Result};
use crate::http::{ByteStream, HttpClient, Response};
use async_trait::async_trait;
use futures::TryStreamExt;
use parcel_throttle::{Category, Throttle};
use reqwest::{Method, RequestBuilder, StatusCode, header};
use std::sync::Arc;

/// Production HTTP client: `reqwest` behind a [`Throttle`].
///
/// Every request waits for a slot in its [`Category`] before it is sent.
/// The category is either given explicitly or derived from the request's
/// URL path with [`Category::from_path`].
#[derive(Clone, Debug)]
pub struct ThrottledClient {
    client: reqwest::Client,
    throttle: Arc<Throttle>,
    token: Option<String>,
}

impl ThrottledClient {
    pub fn new(throttle: Arc<Throttle>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ErrorKind::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, throttle))
    }

    pub fn with_client(client: reqwest::Client, throttle: Arc<Throttle>) -> Self {
        Self { client, throttle, token: None }
    }

    /// Send `Authorization: <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Start building a request, with the authorization header applied.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(header::AUTHORIZATION, token),
            None => builder,
        }
    }

    /// Wait for a slot in the request's category, then send it.
    pub async fn send(&self, request: RequestBuilder, category: Option<Category>) -> Result<reqwest::Response> {
        let request = request.build().map_err(|e| ErrorKind::Transport(e.to_string()))?;
        let category = category.unwrap_or_else(|| Category::from_path(request.url().path()));
        self.throttle.acquire(category).await;
        tracing::trace!(%category, method = %request.method(), url = %request.url(), "Sending request");
        Ok(self.client.execute(request).await.map_err(|e| ErrorKind::Transport(e.to_string()))?)
    }
}

#[async_trait]
impl HttpClient for ThrottledClient {
    async fn get(&self, url: &str) -> Result<Response> {
        let response = self.send(self.request(Method::GET, url), Some(Category::Download)).await?;
        let status = response.status();
        let body = match status {
            StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT => None,
            _ => Some(Box::pin(response.bytes_stream().map_err(std::io::Error::other)) as ByteStream),
        };
        Ok(Response::new(status.as_u16(), status.canonical_reason().unwrap_or_default(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RetryConfig, fetch_with_retry};
    use parcel_throttle::RateLimits;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{header as has_header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ThrottledClient {
        ThrottledClient::new(Arc::new(Throttle::new())).unwrap()
    }

    #[tokio::test]
    async fn test_get_streams_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/d/docs/a.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"contents".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let response = client().get(&format!("{}/d/docs/a.txt", server.uri())).await.unwrap();
        assert!(response.is_success());
        let chunks: Vec<bytes::Bytes> = response.body.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"contents");
    }

    #[tokio::test]
    async fn test_get_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let response = client().get(&format!("{}/d/missing", server.uri())).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.reason, "Not Found");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_no_content_has_no_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(204)).mount(&server).await;

        let response = client().get(&format!("{}/d/empty", server.uri())).await.unwrap();
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Nothing listens on port 1.
        let err = client().get("http://127.0.0.1:1/d/a").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Transport(_)));
    }

    #[tokio::test]
    async fn test_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(has_header("authorization", "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let response = client().with_token("secret-token").get(&format!("{}/d/a", server.uri())).await.unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_retries_failing_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).expect(3).mount(&server).await;

        let config = RetryConfig { retries: 2, sleep: Duration::ZERO, exponential: false };
        let client = client();
        let err = fetch_with_retry(&client, &format!("{}/d/a.txt", server.uri()), &config, Some("a.txt"))
            .await
            .err()
            .unwrap();
        assert_eq!((*err).to_string(), "a.txt: HTTP 500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_downloads_are_paced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let throttle = Arc::new(Throttle::with_limits(RateLimits { download: 10, list: 0, search: 0 }));
        let client = ThrottledClient::new(throttle).unwrap();
        let url = format!("{}/d/a", server.uri());
        let start = Instant::now();
        for _ in 0..3 {
            client.get(&url).await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_category_derived_from_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/fs/list"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        // Only listing is limited, and slowly: a derived `download` category
        // would not wait, an explicit `list` tag must.
        let throttle = Arc::new(Throttle::with_limits(RateLimits { download: 0, list: 4, search: 0 }));
        let client = ThrottledClient::new(throttle).unwrap();
        let url = format!("{}/api/fs/list", server.uri());
        let start = Instant::now();
        client.send(client.request(Method::POST, &url), None).await.unwrap();
        client.send(client.request(Method::POST, &url), None).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
