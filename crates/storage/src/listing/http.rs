use super::Listing;
use crate::entry::Entry;
use crate::error::{ErrorKind, Result};
use crate::path::normalize;
use async_trait::async_trait;
use parcel_fetch::ThrottledClient;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Success code inside the store's response envelope.
const CODE_OK: i64 = 200;

#[derive(Serialize)]
struct ListRequest<'a> {
    path: &'a str,
    password: &'a str,
    page: u32,
    /// Zero asks for every entry in one page.
    per_page: u32,
    refresh: bool,
}

#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<ListData>,
}

#[derive(Deserialize)]
struct ListData {
    /// `null` for an empty directory.
    #[serde(default)]
    content: Option<Vec<Entry>>,
}

/// [`Listing`] backed by the file store's `POST /api/fs/list` endpoint.
///
/// Requests go through a [`ThrottledClient`], so they are paced as `list`
/// requests (derived from the endpoint path).
///
/// # Examples
///
/// ```no_run
/// use parcel_fetch::ThrottledClient;
/// use parcel_storage::{HttpListing, Listing};
/// use parcel_throttle::Throttle;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ThrottledClient::new(Arc::new(Throttle::new()))?;
/// let listing = HttpListing::new(client, "http://localhost:5244");
/// for entry in listing.list("/docs", None).await? {
///     println!("{}", entry.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpListing {
    client: ThrottledClient,
    endpoint: String,
}

impl HttpListing {
    pub fn new(client: ThrottledClient, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/fs/list", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl Listing for HttpListing {
    async fn list(&self, path: &str, password: Option<&str>) -> Result<Vec<Entry>> {
        let path = normalize(path)?;
        let body = ListRequest {
            path: &path,
            password: password.unwrap_or_default(),
            page: 1,
            per_page: 0,
            refresh: false,
        };
        let request = self.client.request(Method::POST, &self.endpoint).json(&body);
        let response = self.client.send(request, None).await.map_err(|err| {
            let message = (*err).to_string();
            err.raise(ErrorKind::Network(message))
        })?;

        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Rejected {
                code: i64::from(status.as_u16()),
                message: format!("request failed with status code {}", status.as_u16()),
            });
        }
        let envelope: Envelope = response.json().await.map_err(|e| ErrorKind::Decode(e.to_string()))?;
        if envelope.code != CODE_OK {
            tracing::debug!(%path, code = envelope.code, reason = %envelope.message, "Listing rejected");
            exn::bail!(ErrorKind::Rejected { code: envelope.code, message: envelope.message });
        }
        let entries = envelope.data.and_then(|data| data.content).unwrap_or_default();
        tracing::debug!(%path, entries = entries.len(), "Listed directory");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_throttle::{RateLimits, Throttle};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing(server: &MockServer, limits: RateLimits) -> HttpListing {
        let client = ThrottledClient::new(Arc::new(Throttle::with_limits(limits))).unwrap();
        HttpListing::new(client, &server.uri())
    }

    #[tokio::test]
    async fn test_lists_directory() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/fs/list"))
            .and(body_json(json!({
                "path": "/docs",
                "password": "hunter2",
                "page": 1,
                "per_page": 0,
                "refresh": false,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "message": "success",
                "data": {
                    "content": [
                        {"name": "a.txt", "is_dir": false, "size": 10, "sign": ""},
                        {"name": "sub", "is_dir": true, "size": 0, "sign": ""},
                    ],
                    "total": 2,
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entries = listing(&server, RateLimits::default()).list("docs/", Some("hunter2")).await.unwrap();
        assert_eq!(entries, vec![Entry::file("a.txt", 10), Entry::dir("sub")]);
    }

    #[tokio::test]
    async fn test_null_content_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "message": "success",
                "data": {"content": null, "total": 0},
            })))
            .mount(&server)
            .await;

        let entries = listing(&server, RateLimits::default()).list("/empty", None).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_rejection_keeps_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 403,
                "message": "permission denied",
                "data": null,
            })))
            .mount(&server)
            .await;

        let err = listing(&server, RateLimits::default()).list("/docs", None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Rejected { code: 403, .. }));
        assert_eq!((*err).to_string(), "permission denied");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(502)).mount(&server).await;

        let err = listing(&server, RateLimits::default()).list("/docs", None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Rejected { code: 502, .. }));
    }

    #[tokio::test]
    async fn test_garbage_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = listing(&server, RateLimits::default()).list("/docs", None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let client = ThrottledClient::new(Arc::new(Throttle::new())).unwrap();
        let err = HttpListing::new(client, "http://127.0.0.1:1").list("/", None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Network(_)));
    }

    #[tokio::test]
    async fn test_traversal_never_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let err = listing(&server, RateLimits::default()).list("/docs/../..", None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_token_and_pacing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "message": "", "data": {"content": []}})))
            .expect(3)
            .mount(&server)
            .await;

        let client = ThrottledClient::new(Arc::new(Throttle::with_limits(RateLimits { download: 0, list: 10, search: 0 })))
            .unwrap()
            .with_token("t0ken");
        let listing = HttpListing::new(client, &format!("{}/", server.uri()));
        let start = Instant::now();
        for _ in 0..3 {
            listing.list("/", None).await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
