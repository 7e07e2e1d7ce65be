use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, DNT, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use tracing::debug;

use crate::settings::Settings;

const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{status} returned by {url}")]
    Status { url: String, status: u16 },
}

/// Page and API retrieval. Every call is a single attempt bounded by the
/// configured timeout.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET a page and return its body as text.
    async fn page(&self, url: &str) -> Result<String, FetchError>;

    /// GET a JSON endpoint with query parameters and an optional bearer token.
    async fn json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<serde_json::Value, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        url: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FetchError> {
        let wrap = |source| FetchError::Request { url: url.to_string(), source };
        let resp = req.send().await.map_err(wrap)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(resp)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn page(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "GET page");
        let resp = self.send(url, self.client.get(url)).await?;
        resp.text()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })
    }

    async fn json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<serde_json::Value, FetchError> {
        debug!(url, "GET json");
        let mut req = self.client.get(url).query(query);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        let resp = self.send(url, req).await?;
        resp.json()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })
    }
}

/// In-memory fetcher serving canned pages and API payloads.
#[cfg(test)]
pub mod fixtures {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct FixtureFetcher {
        pages: HashMap<String, String>,
        json: HashMap<String, serde_json::Value>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FixtureFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub fn with_fixture(self, url: &str, name: &str) -> Self {
            let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
            self.with_page(url, &html)
        }

        pub fn with_json(mut self, url: &str, value: serde_json::Value) -> Self {
            self.json.insert(url.to_string(), value);
            self
        }

        pub fn called(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for FixtureFetcher {
        async fn page(&self, url: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status { url: url.to_string(), status: 404 })
        }

        async fn json(
            &self,
            url: &str,
            _query: &[(&str, &str)],
            _bearer: Option<&str>,
        ) -> Result<serde_json::Value, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.json
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status { url: url.to_string(), status: 404 })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Accept one connection, read the request head, answer with `response`
    /// and hand back the request text.
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        });
        (base, handle)
    }

    fn fetcher(timeout_secs: u64) -> HttpFetcher {
        let settings = Settings { http_timeout_secs: timeout_secs, ..Settings::default() };
        HttpFetcher::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let url = format!("{}/page", base);

        let err = fetcher(5).page(&url).await.unwrap_err();
        assert!(
            matches!(&err, FetchError::Status { status: 503, url: u } if *u == url),
            "{err:?}"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn silent_server_times_out_without_retry() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/slow", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
            drop(sock);
            // A retry would show up as a second connection.
            tokio::time::timeout(Duration::from_millis(200), listener.accept())
                .await
                .is_ok()
        });

        let err = fetcher(1).page(&url).await.unwrap_err();
        match &err {
            FetchError::Request { source, .. } => assert!(source.is_timeout(), "{err:?}"),
            other => panic!("expected a timeout, got {other:?}"),
        }
        assert!(!server.await.unwrap(), "request was retried");
    }

    #[tokio::test]
    async fn json_sends_query_and_bearer_token() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\n\
             Connection: close\r\n\r\n{\"ok\":true}",
        )
        .await;
        let url = format!("{}/2/tweets/42", base);

        let value = fetcher(5)
            .json(&url, &[("expansions", "author_id")], Some("secret"))
            .await
            .unwrap();
        assert_eq!(value, json!({ "ok": true }));

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /2/tweets/42?expansions=author_id "), "{request}");
        assert!(request.contains("authorization: bearer secret"), "{request}");
    }
}
