// crates/core/src/content/docmost.rs
//! HTTP client for the internal docmost-fetcher service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::resolver::{ContentResolver, PageContent};
use crate::error::ContentError;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// `GET /get-content` response body.
#[derive(Debug, Deserialize)]
struct GetContentResponse {
    #[serde(default)]
    ok: bool,
    page: Option<GetContentPage>,
}

#[derive(Debug, Deserialize)]
struct GetContentPage {
    title: Option<String>,
    text_content: Option<String>,
}

/// Resolves pages through `GET {base}/get-content?page_id=<id>`.
///
/// The fetcher looks pages up by id alone; `space_id` is accepted for the
/// trait contract but not sent.
pub struct DocmostFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl DocmostFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ContentResolver for DocmostFetcher {
    async fn fetch_page(&self, space_id: Uuid, page_id: Uuid) -> Result<PageContent, ContentError> {
        tracing::debug!(%space_id, %page_id, "fetching page content");

        let resp = self
            .client
            .get(format!("{}/get-content", self.base_url))
            .query(&[("page_id", page_id.to_string())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| ContentError::Transport { page_id, source })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ContentError::NotFound { page_id });
        }
        if !status.is_success() {
            return Err(ContentError::Status {
                page_id,
                status: status.as_u16(),
            });
        }

        let body: GetContentResponse = resp.json().await.map_err(|e| ContentError::Malformed {
            page_id,
            message: e.to_string(),
        })?;

        match (body.ok, body.page) {
            (true, Some(page)) => Ok(PageContent {
                title: page.title,
                text_content: page.text_content.unwrap_or_default(),
            }),
            (false, _) => Err(ContentError::NotFound { page_id }),
            (true, None) => Err(ContentError::Malformed {
                page_id,
                message: "missing `page` object".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_fetch_page_success() {
        let page_id = Uuid::new_v4();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/get-content")
            .match_query(Matcher::UrlEncoded("page_id".into(), page_id.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"page":{"title":"Page X","text_content":"X body"}}"#)
            .create_async()
            .await;

        let fetcher = DocmostFetcher::new(format!("{}/", server.url()));
        let page = fetcher.fetch_page(Uuid::new_v4(), page_id).await.unwrap();

        assert_eq!(page.title.as_deref(), Some("Page X"));
        assert_eq!(page.text_content, "X body");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_page_times_out() {
        // Accepts the connection and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let page_id = Uuid::new_v4();
        let fetcher =
            DocmostFetcher::new(format!("http://{addr}")).with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = fetcher.fetch_page(Uuid::new_v4(), page_id).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            ContentError::Transport { page_id: p, source } => {
                assert_eq!(p, page_id);
                assert!(source.is_timeout());
            }
            other => panic!("expected transport timeout, got {other:?}"),
        }
        hold.abort();
    }

    #[tokio::test]
    async fn test_fetch_page_not_ok_is_not_found() {
        let page_id = Uuid::new_v4();
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/get-content")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":false,"error":"page_not_found"}"#)
            .create_async()
            .await;

        let fetcher = DocmostFetcher::new(server.url());
        let err = fetcher.fetch_page(Uuid::new_v4(), page_id).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { page_id: p } if p == page_id));
    }

    #[tokio::test]
    async fn test_fetch_page_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/get-content")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let fetcher = DocmostFetcher::new(server.url());
        let err = fetcher
            .fetch_page(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_missing_page_object() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/get-content")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let fetcher = DocmostFetcher::new(server.url());
        let err = fetcher
            .fetch_page(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Malformed { .. }));
    }
}
